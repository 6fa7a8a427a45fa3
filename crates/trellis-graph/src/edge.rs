//! Join edges and the triples derived from them.
//!
//! A join edge is directed from the referencing table (the foreign-key
//! holder) to the referenced table (the primary-key holder). Join
//! direction matters when re-deriving the join column, not when
//! searching for connectivity.

use crate::table::Attributes;
use serde::{Deserialize, Serialize};

/// A foreign-key relationship between two tables in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinEdge {
    /// Human-readable relationship label, conventionally
    /// `references_<fk_column>`.
    pub predicate: String,

    /// The foreign-key column on the referencing side.
    pub on_column: Option<String>,

    /// Optional key/value metadata.
    pub attributes: Attributes,
}

impl JoinEdge {
    /// Creates an edge carrying only a predicate label.
    pub fn new(predicate: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            on_column: None,
            attributes: Attributes::new(),
        }
    }

    /// Creates the standard foreign-key edge for a column:
    /// predicate `references_<column>` and `on_column = column`.
    pub fn foreign_key(column: &str) -> Self {
        Self {
            predicate: format!("references_{}", column),
            on_column: Some(column.to_string()),
            attributes: Attributes::new(),
        }
    }

    /// The column to join on: `on_column` when present, otherwise the
    /// predicate label.
    pub fn join_column(&self) -> &str {
        self.on_column.as_deref().unwrap_or(&self.predicate)
    }
}

impl std::fmt::Display for JoinEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.predicate)
    }
}

/// A foreign-key record used for bulk graph construction.
///
/// This is also the serde shape of entries in a schema-definition
/// file: `{ "table": "orders", "references": "customers",
/// "column": "customer_id" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// The referencing table (holds the foreign key).
    pub table: String,
    /// The referenced table (holds the primary key).
    pub references: String,
    /// The foreign-key column on the referencing table.
    pub column: String,
}

impl ForeignKey {
    /// Creates a foreign-key record.
    pub fn new(
        table: impl Into<String>,
        references: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            references: references.into(),
            column: column.into(),
        }
    }
}

/// A canonicalized, direction-aware join instruction.
///
/// Triples are deduplicated across all pairwise path searches of one
/// resolution, so the same join discovered twice counts once.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JoinTriple {
    /// The referencing table.
    pub source: String,
    /// The join column.
    pub column: String,
    /// The referenced table.
    pub target: String,
}

impl JoinTriple {
    /// Creates a join triple.
    pub fn new(
        source: impl Into<String>,
        column: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            column: column.into(),
            target: target.into(),
        }
    }
}

impl std::fmt::Display for JoinTriple {
    /// Renders the join description consumed by query generation.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} refers {} via the foreign_key: {}",
            self.source, self.target, self.column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_key_edge_shape() {
        let edge = JoinEdge::foreign_key("customer_id");
        assert_eq!(edge.predicate, "references_customer_id");
        assert_eq!(edge.join_column(), "customer_id");
    }

    #[test]
    fn test_join_column_falls_back_to_predicate() {
        let edge = JoinEdge::new("references_store_id");
        assert_eq!(edge.join_column(), "references_store_id");
    }

    #[test]
    fn test_triple_description() {
        let triple = JoinTriple::new("orders", "customer_id", "customers");
        assert_eq!(
            triple.to_string(),
            "orders refers customers via the foreign_key: customer_id"
        );
    }
}
