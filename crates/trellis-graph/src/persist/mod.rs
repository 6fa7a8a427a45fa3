//! Saving and loading schema graphs.
//!
//! Three formats are supported: GML (graph markup text), GraphML
//! (graph XML) and a native bincode encoding. The format is an
//! explicit argument rather than being sniffed from the filename;
//! `GraphFormat::from_path` exists as the conventional mapping for
//! callers that want extension-driven behavior.
//!
//! Loading returns either a complete graph or an error, never partial
//! state.

mod gml;
mod graphml;

use crate::graph::SchemaGraph;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// A persisted-graph encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    /// GML text (`.gml`).
    Gml,
    /// GraphML XML (`.graphml`).
    GraphMl,
    /// Native bincode encoding (`.bin`). Accepted for load but
    /// discouraged for save: the byte layout is tied to this crate's
    /// types and does not interchange with other tooling.
    Binary,
}

impl GraphFormat {
    /// Maps a file extension to its format.
    pub fn from_path(path: &Path) -> Result<Self, PersistError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("gml") => Ok(Self::Gml),
            Some("graphml") => Ok(Self::GraphMl),
            Some("bin") => Ok(Self::Binary),
            _ => Err(PersistError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }
}

impl std::fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Gml => "gml",
            Self::GraphMl => "graphml",
            Self::Binary => "binary",
        };
        write!(f, "{}", name)
    }
}

/// Errors from saving or loading a graph. These are hard failures:
/// unlike data-quality diagnostics, a caller gets no graph at all.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed gml at line {line}: {message}")]
    Gml { line: usize, message: String },

    #[error("malformed graphml: {0}")]
    Xml(String),

    #[error("binary codec error: {0}")]
    Binary(#[from] bincode::Error),

    #[error("unsupported graph format: {0} (use .gml, .graphml or .bin)")]
    UnsupportedFormat(String),
}

/// Writes the graph to `path` in the given format.
pub fn save(graph: &SchemaGraph, path: &Path, format: GraphFormat) -> Result<(), PersistError> {
    let payload = match format {
        GraphFormat::Gml => gml::to_string(graph).into_bytes(),
        GraphFormat::GraphMl => graphml::to_string(graph)?.into_bytes(),
        GraphFormat::Binary => {
            warn!("binary graphs do not interchange with other tooling; prefer gml or graphml");
            bincode::serialize(graph)?
        }
    };
    fs::write(path, payload)?;
    Ok(())
}

/// Reads a graph from `path` in the given format.
pub fn load(path: &Path, format: GraphFormat) -> Result<SchemaGraph, PersistError> {
    match format {
        GraphFormat::Gml => gml::from_str(&fs::read_to_string(path)?),
        GraphFormat::GraphMl => graphml::from_str(&fs::read_to_string(path)?),
        GraphFormat::Binary => Ok(bincode::deserialize(&fs::read(path)?)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::ForeignKey;
    use crate::table::Attributes;
    use std::path::PathBuf;

    fn retail_graph() -> SchemaGraph {
        let mut graph = SchemaGraph::new();
        let mut attrs = Attributes::new();
        attrs.insert("role".to_string(), "fact".into());
        attrs.insert("row_estimate".to_string(), 1500i64.into());
        let _ = graph.add_table("orders", attrs);
        graph.add_foreign_keys(&[
            ForeignKey::new("orders", "customers", "customer_id"),
            ForeignKey::new("order_items", "orders", "order_id"),
            ForeignKey::new("order_items", "products", "product_id"),
        ]);
        graph
    }

    fn assert_graphs_match(left: &SchemaGraph, right: &SchemaGraph) {
        assert_eq!(left.table_names(), right.table_names());
        assert_eq!(left.edge_count(), right.edge_count());
        for (source, target, edge) in left.joins() {
            let other = right
                .join_between(source, target)
                .unwrap_or_else(|| panic!("missing edge {} -> {}", source, target));
            assert_eq!(edge, other);
        }
        for name in left.table_names() {
            assert_eq!(
                left.table(name).map(|t| &t.attributes),
                right.table(name).map(|t| &t.attributes),
            );
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            GraphFormat::from_path(&PathBuf::from("kg.gml")).unwrap(),
            GraphFormat::Gml
        );
        assert_eq!(
            GraphFormat::from_path(&PathBuf::from("kg.graphml")).unwrap(),
            GraphFormat::GraphMl
        );
        assert_eq!(
            GraphFormat::from_path(&PathBuf::from("kg.bin")).unwrap(),
            GraphFormat::Binary
        );
        assert!(matches!(
            GraphFormat::from_path(&PathBuf::from("kg.csv")),
            Err(PersistError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_round_trip_all_formats() {
        let graph = retail_graph();
        let dir = tempfile::tempdir().unwrap();

        for format in [GraphFormat::Gml, GraphFormat::GraphMl, GraphFormat::Binary] {
            let path = dir.path().join(format!("kg.{}", format));
            save(&graph, &path, format).unwrap();
            let loaded = load(&path, format).unwrap();
            assert_graphs_match(&graph, &loaded);
        }
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = load(&PathBuf::from("/nonexistent/kg.gml"), GraphFormat::Gml);
        assert!(matches!(result, Err(PersistError::Io(_))));
    }

    #[test]
    fn test_malformed_binary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kg.bin");
        fs::write(&path, b"not a graph").unwrap();
        assert!(load(&path, GraphFormat::Binary).is_err());
    }
}
