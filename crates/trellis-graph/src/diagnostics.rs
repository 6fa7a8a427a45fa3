//! Structured data-quality and resolution diagnostics.
//!
//! The library never prints. Conditions that degrade gracefully are
//! returned to the caller as `Diagnostic` values (and mirrored to
//! `tracing` for operators), so resolution completeness can be
//! inspected and asserted on without capturing console output.

use serde::{Deserialize, Serialize};

/// A reported-but-recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A table name was empty; the entry was skipped.
    EmptyTableName,

    /// A join referenced a table missing from the graph; the table was
    /// auto-created so construction could keep progressing.
    MissingJoinEndpoint { table: String, predicate: String },

    /// A connectivity query started from a table that is not in the
    /// graph; the start was skipped.
    UnknownStartTable { table: String },

    /// Two seed tables could not be connected in either the seed
    /// subgraph or the full schema graph; the pair was skipped.
    NoJoinPath { source: String, target: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTableName => {
                write!(f, "table name must be a non-empty string; skipped")
            }
            Self::MissingJoinEndpoint { table, predicate } => {
                write!(
                    f,
                    "table '{}' referenced by join '{}' was not in the graph; added it",
                    table, predicate
                )
            }
            Self::UnknownStartTable { table } => {
                write!(f, "start table '{}' not found in the graph; skipped", table)
            }
            Self::NoJoinPath { source, target } => {
                write!(
                    f,
                    "no join path between '{}' and '{}' in either the seed subgraph or the full graph",
                    source, target
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_path_message_names_both_tables() {
        let diag = Diagnostic::NoJoinPath {
            source: "customers".to_string(),
            target: "ghost_table".to_string(),
        };
        let message = diag.to_string();
        assert!(message.contains("customers"));
        assert!(message.contains("ghost_table"));
    }
}
