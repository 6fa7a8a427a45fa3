//! Table nodes and their attribute bags.
//!
//! Tables are identified by name alone. The attribute bag carries
//! optional classification data (e.g. a fact/dimension role) without
//! affecting identity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A primitive value attached to a table or join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// String-keyed attribute map. BTreeMap keeps iteration (and thus
/// serialized output) deterministic.
pub type Attributes = BTreeMap<String, AttrValue>;

/// A table in the schema graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableNode {
    /// Unique table name. Identity is the name; no duplicates exist
    /// in a graph.
    pub name: String,

    /// Optional key/value metadata.
    pub attributes: Attributes,
}

impl TableNode {
    /// Creates a table node with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
        }
    }

    /// Creates a table node carrying attributes.
    pub fn with_attributes(name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }
}

impl std::fmt::Display for TableNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_value_display() {
        assert_eq!(AttrValue::from("fact").to_string(), "fact");
        assert_eq!(AttrValue::from(3i64).to_string(), "3");
        assert_eq!(AttrValue::from(true).to_string(), "true");
    }

    #[test]
    fn test_table_node_display_is_name() {
        let node = TableNode::new("orders");
        assert_eq!(node.to_string(), "orders");
    }
}
