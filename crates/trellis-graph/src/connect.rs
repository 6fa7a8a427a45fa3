//! Connectivity queries over the schema graph.
//!
//! Schema connectivity for query purposes is direction-agnostic: a
//! table can be relevant whether it holds the foreign key or the
//! primary key relative to a seed table. Traversal therefore walks
//! joins in both directions.

use crate::diagnostics::Diagnostic;
use crate::graph::{NodeId, SchemaGraph};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::warn;

/// Result of a connectivity query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConnectedTables {
    /// Table names reachable within the depth bound, sorted.
    pub tables: BTreeSet<String>,
    /// Data-quality diagnostics (unknown start tables).
    pub diagnostics: Vec<Diagnostic>,
}

impl SchemaGraph {
    /// Finds all tables reachable from any start table within
    /// `max_depth` hops, walking joins in both directions. `None`
    /// leaves the traversal unbounded (limited only by graph size).
    ///
    /// Unknown start tables are skipped with a diagnostic rather than
    /// aborting the query; partial results for valid starts are still
    /// useful.
    pub fn find_connected_tables<S: AsRef<str>>(
        &self,
        start_tables: &[S],
        max_depth: Option<usize>,
    ) -> ConnectedTables {
        let mut result = ConnectedTables::default();
        let limit = max_depth.unwrap_or(usize::MAX);

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();

        for start in start_tables {
            let name = start.as_ref();
            match self.index_of(name) {
                Some(id) => {
                    if visited.insert(id) {
                        queue.push_back((id, 0));
                    }
                }
                None => {
                    warn!(table = name, "start table not found in the graph; skipping");
                    result.diagnostics.push(Diagnostic::UnknownStartTable {
                        table: name.to_string(),
                    });
                }
            }
        }

        while let Some((current, depth)) = queue.pop_front() {
            if let Some(name) = self.name_of(current) {
                result.tables.insert(name.to_string());
            }

            if depth >= limit {
                continue;
            }

            for neighbor in self.neighbors_undirected(current) {
                if visited.insert(neighbor) {
                    queue.push_back((neighbor, depth + 1));
                }
            }
        }

        result
    }
}
