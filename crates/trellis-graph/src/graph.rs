//! Core schema graph data structure.
//!
//! The SchemaGraph wraps petgraph and adds a name index for fast
//! lookups. It's the central data structure everything else works
//! with: the builder fills it, the connectivity explorer and path
//! resolver query it read-only.

use crate::diagnostics::Diagnostic;
use crate::edge::{ForeignKey, JoinEdge};
use crate::table::{Attributes, TableNode};
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Unique identifier for a table node in the graph.
pub type NodeId = NodeIndex;

/// The schema knowledge graph.
///
/// Tables are nodes; foreign-key relationships are directed edges from
/// the referencing table to the referenced table. This is a simple
/// directed graph: at most one edge per ordered `(source, target)`
/// pair, with a later insertion overwriting the earlier payload.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SchemaGraph {
    /// The underlying petgraph graph.
    pub(crate) graph: DiGraph<TableNode, JoinEdge>,

    /// Maps table names to graph node indexes.
    name_index: HashMap<String, NodeId>,
}

impl SchemaGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table.
    ///
    /// An empty name is a data-quality signal, not a fatal condition:
    /// the entry is skipped and reported as a `Diagnostic`. Re-adding
    /// an existing table merges the attributes into the existing node
    /// and returns its id.
    pub fn add_table(&mut self, name: &str, attributes: Attributes) -> Result<NodeId, Diagnostic> {
        if name.is_empty() {
            warn!("table name must be a non-empty string; skipping");
            return Err(Diagnostic::EmptyTableName);
        }

        if let Some(&id) = self.name_index.get(name) {
            if let Some(node) = self.graph.node_weight_mut(id) {
                node.attributes.extend(attributes);
            }
            return Ok(id);
        }

        let id = self.graph.add_node(TableNode::with_attributes(name, attributes));
        self.name_index.insert(name.to_string(), id);
        Ok(id)
    }

    /// Registers multiple tables, tolerating bad entries per item.
    pub fn add_tables<I, S>(&mut self, names: I) -> Vec<Diagnostic>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| self.add_table(name.as_ref(), Attributes::new()).err())
            .collect()
    }

    /// Registers a join relationship between two tables.
    ///
    /// Missing endpoints are auto-created (self-healing, so graph
    /// construction keeps progressing on an incomplete table list);
    /// each auto-creation is reported. A repeated `(source, target)`
    /// pair overwrites the existing edge payload.
    pub fn add_join(&mut self, source: &str, target: &str, edge: JoinEdge) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let src = match self.ensure_endpoint(source, &edge.predicate, &mut diagnostics) {
            Some(id) => id,
            None => return diagnostics,
        };
        let dst = match self.ensure_endpoint(target, &edge.predicate, &mut diagnostics) {
            Some(id) => id,
            None => return diagnostics,
        };

        match self.graph.find_edge(src, dst) {
            Some(existing) => {
                if let Some(weight) = self.graph.edge_weight_mut(existing) {
                    *weight = edge;
                }
            }
            None => {
                self.graph.add_edge(src, dst, edge);
            }
        }

        diagnostics
    }

    /// Resolves an edge endpoint, creating the table if absent.
    fn ensure_endpoint(
        &mut self,
        name: &str,
        predicate: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<NodeId> {
        if let Some(&id) = self.name_index.get(name) {
            return Some(id);
        }

        match self.add_table(name, Attributes::new()) {
            Ok(id) => {
                warn!(table = name, predicate, "join endpoint not in graph; adding it");
                diagnostics.push(Diagnostic::MissingJoinEndpoint {
                    table: name.to_string(),
                    predicate: predicate.to_string(),
                });
                Some(id)
            }
            Err(diag) => {
                diagnostics.push(diag);
                None
            }
        }
    }

    /// Registers a batch of foreign-key relationships.
    ///
    /// Each record becomes an edge from the referencing table to the
    /// referenced table with predicate `references_<column>` and
    /// `on_column = column`. Endpoints are registered up front, so the
    /// joins themselves never report missing endpoints.
    pub fn add_foreign_keys(&mut self, foreign_keys: &[ForeignKey]) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for fk in foreign_keys {
            diagnostics.extend(self.add_table(&fk.table, Attributes::new()).err());
            diagnostics.extend(self.add_table(&fk.references, Attributes::new()).err());
            diagnostics.extend(self.add_join(
                &fk.table,
                &fk.references,
                JoinEdge::foreign_key(&fk.column),
            ));
        }
        diagnostics
    }

    /// Whether a table is registered.
    pub fn contains_table(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    /// Gets a table node by name.
    pub fn table(&self, name: &str) -> Option<&TableNode> {
        let id = self.name_index.get(name)?;
        self.graph.node_weight(*id)
    }

    /// All table names, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.name_index.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The directed join edge from `source` to `target`, if one exists.
    pub fn join_between(&self, source: &str, target: &str) -> Option<&JoinEdge> {
        let src = *self.name_index.get(source)?;
        let dst = *self.name_index.get(target)?;
        let edge = self.graph.find_edge(src, dst)?;
        self.graph.edge_weight(edge)
    }

    /// Iterates over all joins as `(source, target, edge)`.
    pub fn joins(&self) -> impl Iterator<Item = (&str, &str, &JoinEdge)> {
        self.graph.edge_references().filter_map(|edge_ref| {
            let source = self.graph.node_weight(edge_ref.source())?;
            let target = self.graph.node_weight(edge_ref.target())?;
            Some((source.name.as_str(), target.name.as_str(), edge_ref.weight()))
        })
    }

    /// Returns the number of tables.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of joins.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the induced subgraph over the given table names: those
    /// nodes and only the joins strictly between them. Unknown names
    /// are skipped.
    pub fn subgraph<S: AsRef<str>>(&self, names: &[S]) -> SchemaGraph {
        let mut sub = SchemaGraph::new();

        for name in names {
            if let Some(node) = self.table(name.as_ref()) {
                let _ = sub.add_table(&node.name, node.attributes.clone());
            }
        }

        for (source, target, edge) in self.joins() {
            if sub.contains_table(source) && sub.contains_table(target) {
                sub.add_join(source, target, edge.clone());
            }
        }

        sub
    }

    /// Gets the node index for a table name.
    pub(crate) fn index_of(&self, name: &str) -> Option<NodeId> {
        self.name_index.get(name).copied()
    }

    /// Gets the table name for a node index.
    pub(crate) fn name_of(&self, id: NodeId) -> Option<&str> {
        self.graph.node_weight(id).map(|node| node.name.as_str())
    }

    /// Undirected neighbors of a node, in ascending table-name order.
    ///
    /// Forward and reverse adjacency are unioned because schema
    /// connectivity is direction-agnostic; the stable ordering is what
    /// makes traversals (and shortest-path tie-breaking) deterministic.
    pub(crate) fn neighbors_undirected(&self, id: NodeId) -> Vec<NodeId> {
        let mut neighbors: Vec<NodeId> = self
            .graph
            .neighbors_directed(id, Direction::Outgoing)
            .chain(self.graph.neighbors_directed(id, Direction::Incoming))
            .collect();
        neighbors.sort_by(|a, b| {
            let a_name = self.name_of(*a).unwrap_or_default();
            let b_name = self.name_of(*b).unwrap_or_default();
            a_name.cmp(b_name)
        });
        neighbors.dedup();
        neighbors
    }

    /// Renders the graph as Graphviz DOT, with table names as node
    /// labels and predicates as edge labels. Diagnostic side channel
    /// for visualization tooling.
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::new(&self.graph))
    }

    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            table_count: self.node_count(),
            join_count: self.edge_count(),
        }
    }
}

/// Graph statistics for the info command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GraphStats {
    pub table_count: usize,
    pub join_count: usize,
}
