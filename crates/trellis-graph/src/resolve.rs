//! Pairwise join-path resolution.
//!
//! Given seed tables implicated by a query, resolves the minimal join
//! chains connecting them. Searches prefer the induced subgraph over
//! the seed set — chains that stay among already-relevant tables are
//! more likely semantically correct — and fall back to the full schema
//! graph to discover mediator tables (e.g. an order-line table bridging
//! orders and products).

use crate::diagnostics::Diagnostic;
use crate::edge::JoinTriple;
use crate::graph::{NodeId, SchemaGraph};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// An ordered join path: consecutive tables are connected by a join
/// edge in one direction or the other.
pub type JoinPath = Vec<String>;

/// Result of resolving a seed-table set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PathResolution {
    /// Raw node sequences, one per resolvable seed pair, in
    /// pair-iteration order over the input seed list.
    pub paths: Vec<JoinPath>,

    /// Deduplicated join instructions accumulated across all pairs.
    pub joins: BTreeSet<JoinTriple>,

    /// No-path diagnostics for pairs that could not be connected.
    pub diagnostics: Vec<Diagnostic>,
}

impl PathResolution {
    /// Whether the resolution produced nothing at all.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.joins.is_empty()
    }

    /// Union of all tables appearing in any join triple, sorted.
    /// This is the table set handed to column extraction.
    pub fn filtered_tables(&self) -> BTreeSet<String> {
        let mut tables = BTreeSet::new();
        for join in &self.joins {
            tables.insert(join.source.clone());
            tables.insert(join.target.clone());
        }
        tables
    }

    /// Join descriptions in the form consumed by query generation:
    /// `"<source> refers <target> via the foreign_key: <column>"`.
    pub fn join_descriptions(&self) -> Vec<String> {
        self.joins.iter().map(ToString::to_string).collect()
    }
}

impl SchemaGraph {
    /// Resolves the join paths connecting a set of seed tables.
    ///
    /// Every unordered seed pair is searched, not just adjacent ones,
    /// which makes the result robust to arbitrary seed order. Each
    /// pair is first searched inside the induced subgraph over *all*
    /// seeds, then against the full graph; a pair unreachable in both
    /// is recorded as a diagnostic and resolution continues.
    ///
    /// Fewer than two seeds yields an empty resolution: no join path
    /// is possible or necessary.
    pub fn resolve_join_paths<S: AsRef<str>>(&self, seed_tables: &[S]) -> PathResolution {
        let mut resolution = PathResolution::default();
        if seed_tables.len() < 2 {
            return resolution;
        }

        let seeds: Vec<&str> = seed_tables.iter().map(AsRef::as_ref).collect();
        let subgraph = self.subgraph(&seeds);

        for i in 0..seeds.len() {
            for j in (i + 1)..seeds.len() {
                let (source, target) = (seeds[i], seeds[j]);

                let path = subgraph
                    .shortest_path_undirected(source, target)
                    .or_else(|| {
                        debug!(source, target, "no subgraph path; searching the full graph");
                        self.shortest_path_undirected(source, target)
                    });

                let Some(path) = path else {
                    warn!(
                        source,
                        target, "no path found in either the subgraph or the whole graph"
                    );
                    resolution.diagnostics.push(Diagnostic::NoJoinPath {
                        source: source.to_string(),
                        target: target.to_string(),
                    });
                    continue;
                };

                self.collect_join_triples(&path, &mut resolution.joins);
                resolution.paths.push(path);
            }
        }

        resolution
    }

    /// Re-derives the directed join for each consecutive pair of a
    /// path: the forward edge is checked first, then the reverse. A
    /// pair with no edge in either direction can only come from a
    /// stale subgraph and is skipped.
    fn collect_join_triples(&self, path: &[String], joins: &mut BTreeSet<JoinTriple>) {
        for pair in path.windows(2) {
            let (u, v) = (pair[0].as_str(), pair[1].as_str());
            if let Some(edge) = self.join_between(u, v) {
                joins.insert(JoinTriple::new(u, edge.join_column(), v));
            } else if let Some(edge) = self.join_between(v, u) {
                joins.insert(JoinTriple::new(v, edge.join_column(), u));
            }
        }
    }

    /// BFS shortest path on the undirected projection of the graph.
    ///
    /// Join direction is irrelevant to minimal connectivity; it only
    /// matters when re-deriving the join column afterward. Neighbors
    /// are expanded in ascending table-name order, so the choice among
    /// equal-length paths is stable across runs and graph rebuilds.
    pub fn shortest_path_undirected(&self, source: &str, target: &str) -> Option<JoinPath> {
        let src = self.index_of(source)?;
        let dst = self.index_of(target)?;
        if src == dst {
            return Some(vec![source.to_string()]);
        }

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();

        visited.insert(src);
        queue.push_back(src);

        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors_undirected(current) {
                if !visited.insert(neighbor) {
                    continue;
                }
                parent.insert(neighbor, current);

                if neighbor == dst {
                    return Some(self.reconstruct_path(src, dst, &parent));
                }
                queue.push_back(neighbor);
            }
        }

        None
    }

    /// Walks the parent map back from target to source.
    fn reconstruct_path(
        &self,
        source: NodeId,
        target: NodeId,
        parent: &HashMap<NodeId, NodeId>,
    ) -> JoinPath {
        let mut names = Vec::new();
        let mut current = target;

        while current != source {
            if let Some(name) = self.name_of(current) {
                names.push(name.to_string());
            }
            match parent.get(&current) {
                Some(&prev) => current = prev,
                None => break,
            }
        }
        if let Some(name) = self.name_of(source) {
            names.push(name.to_string());
        }

        names.reverse();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::ForeignKey;

    /// The retail schema from the original pipeline: orders, order
    /// items, products, staff and stock tables.
    fn retail_graph() -> SchemaGraph {
        let mut graph = SchemaGraph::new();
        graph.add_foreign_keys(&[
            ForeignKey::new("orders", "customers", "customer_id"),
            ForeignKey::new("orders", "staffs", "staff_id"),
            ForeignKey::new("orders", "stores", "store_id"),
            ForeignKey::new("order_items", "orders", "order_id"),
            ForeignKey::new("order_items", "products", "product_id"),
            ForeignKey::new("products", "brands", "brand_id"),
            ForeignKey::new("products", "categories", "category_id"),
            ForeignKey::new("staffs", "stores", "store_id"),
            ForeignKey::new("stocks", "stores", "store_id"),
            ForeignKey::new("stocks", "products", "product_id"),
        ]);
        graph
    }

    #[test]
    fn test_fewer_than_two_seeds_is_empty() {
        let graph = retail_graph();
        assert!(graph.resolve_join_paths(&["orders"]).is_empty());
        assert!(graph.resolve_join_paths::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_direct_edge_pair() {
        let graph = retail_graph();
        let resolution = graph.resolve_join_paths(&["orders", "customers"]);

        assert_eq!(resolution.paths, vec![vec!["orders", "customers"]]);
        assert_eq!(
            resolution.joins.iter().collect::<Vec<_>>(),
            vec![&JoinTriple::new("orders", "customer_id", "customers")]
        );
        assert!(resolution.diagnostics.is_empty());
    }

    #[test]
    fn test_mediator_discovery_through_full_graph() {
        let graph = retail_graph();

        // customers and products share no edge; the resolver must pull
        // in orders and order_items as mediators.
        let resolution = graph.resolve_join_paths(&["customers", "products"]);

        assert_eq!(
            resolution.paths,
            vec![vec!["customers", "orders", "order_items", "products"]]
        );

        let expected: BTreeSet<JoinTriple> = [
            JoinTriple::new("orders", "customer_id", "customers"),
            JoinTriple::new("order_items", "order_id", "orders"),
            JoinTriple::new("order_items", "product_id", "products"),
        ]
        .into_iter()
        .collect();
        assert_eq!(resolution.joins, expected);
    }

    #[test]
    fn test_subgraph_path_preferred_over_full_graph() {
        let graph = retail_graph();

        // Seeds {customers, orders, order_items, products} form a chain
        // among themselves; no table outside the seed set may appear.
        let seeds = ["customers", "orders", "order_items", "products"];
        let resolution = graph.resolve_join_paths(&seeds);

        let seed_set: BTreeSet<&str> = seeds.into_iter().collect();
        for table in resolution.filtered_tables() {
            assert!(
                seed_set.contains(table.as_str()),
                "table {} pulled in despite seeds being self-connected",
                table
            );
        }
        assert!(resolution.diagnostics.is_empty());
    }

    #[test]
    fn test_duplicate_joins_collapse() {
        let graph = retail_graph();

        // Every pair among these seeds routes over the same two edges;
        // the triple set must still contain each join once.
        let resolution = graph.resolve_join_paths(&["customers", "orders", "order_items"]);

        assert_eq!(resolution.paths.len(), 3);
        let expected: BTreeSet<JoinTriple> = [
            JoinTriple::new("orders", "customer_id", "customers"),
            JoinTriple::new("order_items", "order_id", "orders"),
        ]
        .into_iter()
        .collect();
        assert_eq!(resolution.joins, expected);
    }

    #[test]
    fn test_unknown_seed_reports_no_path() {
        let graph = retail_graph();
        let resolution = graph.resolve_join_paths(&["customers", "ghost_table"]);

        assert!(resolution.paths.is_empty());
        assert!(resolution.joins.is_empty());
        assert_eq!(
            resolution.diagnostics,
            vec![Diagnostic::NoJoinPath {
                source: "customers".to_string(),
                target: "ghost_table".to_string(),
            }]
        );
    }

    #[test]
    fn test_disconnected_pair_does_not_abort_others() {
        let mut graph = retail_graph();
        graph.add_tables(["island"]);

        let resolution = graph.resolve_join_paths(&["island", "orders", "customers"]);

        // island pairs fail, orders–customers still resolves.
        assert_eq!(resolution.diagnostics.len(), 2);
        assert_eq!(
            resolution.joins.iter().collect::<Vec<_>>(),
            vec![&JoinTriple::new("orders", "customer_id", "customers")]
        );
    }

    #[test]
    fn test_every_triple_maps_to_a_real_edge() {
        let graph = retail_graph();
        let resolution = graph.resolve_join_paths(&["customers", "products", "stores"]);

        for triple in &resolution.joins {
            let edge = graph
                .join_between(&triple.source, &triple.target)
                .expect("triple without a forward edge");
            assert_eq!(edge.join_column(), triple.column);
        }
    }

    #[test]
    fn test_resolution_is_idempotent_and_deterministic() {
        let graph = retail_graph();
        let seeds = ["customers", "products", "staffs"];

        let first = graph.resolve_join_paths(&seeds);
        let second = graph.resolve_join_paths(&seeds);

        assert_eq!(first.joins, second.joins);
        // The lexicographic tie-break makes raw paths repeatable too.
        assert_eq!(first.paths, second.paths);
    }

    #[test]
    fn test_filtered_tables_and_descriptions() {
        let graph = retail_graph();
        let resolution = graph.resolve_join_paths(&["customers", "products"]);

        let expected: BTreeSet<String> = ["customers", "orders", "order_items", "products"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(resolution.filtered_tables(), expected);

        let descriptions = resolution.join_descriptions();
        assert!(descriptions
            .contains(&"orders refers customers via the foreign_key: customer_id".to_string()));
    }

    #[test]
    fn test_duplicate_seed_yields_trivial_path() {
        let graph = retail_graph();
        let resolution = graph.resolve_join_paths(&["orders", "orders"]);

        assert_eq!(resolution.paths, vec![vec!["orders"]]);
        assert!(resolution.joins.is_empty());
    }
}
