//! Two-phase construction of schema graphs.
//!
//! The builder accumulates table names and foreign-key relationships
//! and collects every construction diagnostic along the way, so a
//! pipeline can build its graph from loosely-validated inputs and then
//! inspect what degraded.

use crate::diagnostics::Diagnostic;
use crate::edge::ForeignKey;
use crate::graph::SchemaGraph;
use serde::{Deserialize, Serialize};

/// On-disk schema definition consumed by `trellis build`:
/// a table-name list plus foreign-key records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

/// Builds a SchemaGraph from table lists and foreign-key records.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: SchemaGraph,
    diagnostics: Vec<Diagnostic>,
}

impl GraphBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds tables as nodes, tolerating bad entries per item.
    pub fn add_tables<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let diagnostics = self.graph.add_tables(names);
        self.diagnostics.extend(diagnostics);
    }

    /// Adds foreign-key relationships as directed edges.
    pub fn add_foreign_keys(&mut self, foreign_keys: &[ForeignKey]) {
        let diagnostics = self.graph.add_foreign_keys(foreign_keys);
        self.diagnostics.extend(diagnostics);
    }

    /// Finishes building, returning the graph and everything that
    /// degraded during construction.
    pub fn build(self) -> (SchemaGraph, Vec<Diagnostic>) {
        (self.graph, self.diagnostics)
    }

    /// Builds a graph straight from a schema definition.
    pub fn from_definition(definition: &SchemaDefinition) -> (SchemaGraph, Vec<Diagnostic>) {
        let mut builder = Self::new();
        builder.add_tables(&definition.tables);
        builder.add_foreign_keys(&definition.foreign_keys);
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_adds_tables_and_joins() {
        let mut builder = GraphBuilder::new();
        builder.add_tables(["orders", "customers"]);
        builder.add_foreign_keys(&[ForeignKey::new("orders", "customers", "customer_id")]);

        let (graph, diagnostics) = builder.build();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_builder_collects_diagnostics() {
        let mut builder = GraphBuilder::new();
        builder.add_tables(["orders", ""]);

        let (graph, diagnostics) = builder.build();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(diagnostics, vec![Diagnostic::EmptyTableName]);
    }

    #[test]
    fn test_from_definition() {
        let definition = SchemaDefinition {
            tables: vec!["orders".to_string(), "customers".to_string()],
            foreign_keys: vec![ForeignKey::new("orders", "customers", "customer_id")],
        };

        let (graph, diagnostics) = GraphBuilder::from_definition(&definition);
        assert_eq!(graph.stats().table_count, 2);
        assert_eq!(graph.stats().join_count, 1);
        assert!(diagnostics.is_empty());
    }
}
