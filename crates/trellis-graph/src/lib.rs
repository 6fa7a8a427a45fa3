//! Trellis Graph - schema knowledge graph and join-path resolution
//!
//! This crate models a database schema's foreign-key topology as a
//! directed graph and resolves the minimal join chains connecting a
//! set of seed tables, for downstream SQL generation.
//!
//! # Architecture
//!
//! The graph uses petgraph internally with a name index for lookups.
//! On top of it sit:
//! - a builder for construction from table lists and foreign keys
//! - a connectivity explorer (depth-bounded, direction-agnostic BFS)
//! - the path resolver (pairwise subgraph-first shortest paths with
//!   full-graph fallback and join-triple deduplication)
//! - persistence in GML, GraphML and a native binary format
//!
//! Data-quality and no-path conditions never abort an operation; they
//! come back as [`Diagnostic`] values alongside the results.
//!
//! # Example
//!
//! ```
//! use trellis_graph::{ForeignKey, SchemaGraph};
//!
//! let mut graph = SchemaGraph::new();
//! graph.add_foreign_keys(&[
//!     ForeignKey::new("orders", "customers", "customer_id"),
//!     ForeignKey::new("order_items", "orders", "order_id"),
//!     ForeignKey::new("order_items", "products", "product_id"),
//! ]);
//!
//! let resolution = graph.resolve_join_paths(&["customers", "products"]);
//! assert_eq!(
//!     resolution.paths,
//!     vec![vec!["customers", "orders", "order_items", "products"]]
//! );
//! ```

mod builder;
mod connect;
mod diagnostics;
mod edge;
mod graph;
mod persist;
mod resolve;
mod table;

pub use builder::{GraphBuilder, SchemaDefinition};
pub use connect::ConnectedTables;
pub use diagnostics::Diagnostic;
pub use edge::{ForeignKey, JoinEdge, JoinTriple};
pub use graph::{GraphStats, NodeId, SchemaGraph};
pub use persist::{load, save, GraphFormat, PersistError};
pub use resolve::{JoinPath, PathResolution};
pub use table::{AttrValue, Attributes, TableNode};
