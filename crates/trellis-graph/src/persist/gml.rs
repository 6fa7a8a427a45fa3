//! GML text codec.
//!
//! Writes and reads the classic graph-markup dialect: a single
//! `graph [ ... ]` block containing `node [ id <n> label "<name>" ]`
//! and `edge [ source <n> target <n> ... ]` blocks. Reserved edge keys
//! are `predicate` and `on_column`; every other key round-trips
//! through the attribute maps. Booleans are written as the bare words
//! `true`/`false`, which standard GML lacks but this parser accepts.

use super::PersistError;
use crate::edge::JoinEdge;
use crate::graph::SchemaGraph;
use crate::table::{AttrValue, Attributes};
use std::collections::HashMap;
use std::fmt::Write as _;

pub(super) fn to_string(graph: &SchemaGraph) -> String {
    let names = graph.table_names();
    let ids: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();

    let mut out = String::from("graph [\n  directed 1\n");

    for (id, name) in names.iter().enumerate() {
        let _ = writeln!(out, "  node [");
        let _ = writeln!(out, "    id {}", id);
        let _ = writeln!(out, "    label {}", quote(name));
        if let Some(node) = graph.table(name) {
            write_attributes(&mut out, &node.attributes);
        }
        let _ = writeln!(out, "  ]");
    }

    let mut joins: Vec<_> = graph.joins().collect();
    joins.sort_by_key(|(source, target, _)| (ids[*source], ids[*target]));

    for (source, target, edge) in joins {
        let _ = writeln!(out, "  edge [");
        let _ = writeln!(out, "    source {}", ids[source]);
        let _ = writeln!(out, "    target {}", ids[target]);
        let _ = writeln!(out, "    predicate {}", quote(&edge.predicate));
        if let Some(column) = &edge.on_column {
            let _ = writeln!(out, "    on_column {}", quote(column));
        }
        write_attributes(&mut out, &edge.attributes);
        let _ = writeln!(out, "  ]");
    }

    out.push_str("]\n");
    out
}

fn write_attributes(out: &mut String, attributes: &Attributes) {
    for (key, value) in attributes {
        let _ = writeln!(out, "    {} {}", key, render_value(value));
    }
}

fn render_value(value: &AttrValue) -> String {
    match value {
        AttrValue::Str(v) => quote(v),
        AttrValue::Int(v) => v.to_string(),
        AttrValue::Float(v) => {
            let rendered = v.to_string();
            // Keep a decimal point so the value reads back as a float.
            if rendered.contains('.') || rendered.contains('e') || rendered.contains("inf") {
                rendered
            } else {
                format!("{}.0", rendered)
            }
        }
        AttrValue::Bool(v) => v.to_string(),
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

pub(super) fn from_str(input: &str) -> Result<SchemaGraph, PersistError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };

    let document = parser.parse_entries(0)?;
    let graph_block = document
        .iter()
        .find(|entry| entry.key == "graph")
        .ok_or_else(|| error(1, "missing top-level 'graph' block"))?;

    let GmlValue::Block(entries) = &graph_block.value else {
        return Err(error(graph_block.line, "'graph' must be a block"));
    };

    build_graph(entries)
}

fn build_graph(entries: &[Entry]) -> Result<SchemaGraph, PersistError> {
    let mut graph = SchemaGraph::new();
    let mut labels: HashMap<i64, String> = HashMap::new();

    // First pass: nodes, so edges can resolve ids regardless of order.
    for entry in entries.iter().filter(|e| e.key == "node") {
        let GmlValue::Block(fields) = &entry.value else {
            return Err(error(entry.line, "'node' must be a block"));
        };

        let mut id = None;
        let mut label = None;
        let mut attributes = Attributes::new();
        for field in fields {
            match (field.key.as_str(), &field.value) {
                ("id", GmlValue::Int(v)) => id = Some(*v),
                ("label", GmlValue::Str(v)) => label = Some(v.clone()),
                (_, GmlValue::Block(_)) => {
                    return Err(error(field.line, "unexpected nested block in node"));
                }
                (key, value) => {
                    attributes.insert(key.to_string(), value.to_attr(field.line)?);
                }
            }
        }

        let id = id.ok_or_else(|| error(entry.line, "node without id"))?;
        let label = label.ok_or_else(|| error(entry.line, "node without label"))?;
        if graph.add_table(&label, attributes).is_err() {
            return Err(error(entry.line, "node label must be non-empty"));
        }
        if labels.insert(id, label).is_some() {
            return Err(error(entry.line, "duplicate node id"));
        }
    }

    for entry in entries.iter().filter(|e| e.key == "edge") {
        let GmlValue::Block(fields) = &entry.value else {
            return Err(error(entry.line, "'edge' must be a block"));
        };

        let mut source = None;
        let mut target = None;
        let mut edge = JoinEdge::new("");
        for field in fields {
            match (field.key.as_str(), &field.value) {
                ("source", GmlValue::Int(v)) => source = Some(*v),
                ("target", GmlValue::Int(v)) => target = Some(*v),
                ("predicate", GmlValue::Str(v)) => edge.predicate = v.clone(),
                ("on_column", GmlValue::Str(v)) => edge.on_column = Some(v.clone()),
                (_, GmlValue::Block(_)) => {
                    return Err(error(field.line, "unexpected nested block in edge"));
                }
                (key, value) => {
                    edge.attributes
                        .insert(key.to_string(), value.to_attr(field.line)?);
                }
            }
        }

        let source = source.ok_or_else(|| error(entry.line, "edge without source"))?;
        let target = target.ok_or_else(|| error(entry.line, "edge without target"))?;
        let source = labels
            .get(&source)
            .ok_or_else(|| error(entry.line, "edge source references unknown node id"))?;
        let target = labels
            .get(&target)
            .ok_or_else(|| error(entry.line, "edge target references unknown node id"))?;

        graph.add_join(source, target, edge);
    }

    Ok(graph)
}

fn error(line: usize, message: &str) -> PersistError {
    PersistError::Gml {
        line,
        message: message.to_string(),
    }
}

#[derive(Debug)]
struct Entry {
    key: String,
    value: GmlValue,
    line: usize,
}

#[derive(Debug)]
enum GmlValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Block(Vec<Entry>),
}

impl GmlValue {
    fn to_attr(&self, line: usize) -> Result<AttrValue, PersistError> {
        match self {
            Self::Str(v) => Ok(AttrValue::Str(v.clone())),
            Self::Int(v) => Ok(AttrValue::Int(*v)),
            Self::Float(v) => Ok(AttrValue::Float(*v)),
            Self::Bool(v) => Ok(AttrValue::Bool(*v)),
            Self::Block(_) => Err(error(line, "expected a scalar value")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Ident(String),
    Str(String),
    Num(String),
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, PersistError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                // Comment runs to end of line.
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '[' => {
                tokens.push((Token::Open, line));
                chars.next();
            }
            ']' => {
                tokens.push((Token::Close, line));
                chars.next();
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some(escaped) => value.push(escaped),
                            None => break,
                        },
                        '\n' => {
                            line += 1;
                            value.push(c);
                        }
                        _ => value.push(c),
                    }
                }
                if !closed {
                    return Err(error(line, "unterminated string"));
                }
                tokens.push((Token::Str(value), line));
            }
            c if c == '-' || c == '+' || c.is_ascii_digit() => {
                let mut value = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                        value.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Num(value), line));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut value = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        value.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Ident(value), line));
            }
            _ => return Err(error(line, "unexpected character")),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    /// Parses `key value` entries until the block closes (depth > 0)
    /// or the token stream ends (depth 0).
    fn parse_entries(&mut self, depth: usize) -> Result<Vec<Entry>, PersistError> {
        let mut entries = Vec::new();

        loop {
            match self.next() {
                None if depth == 0 => return Ok(entries),
                None => return Err(error(self.last_line(), "unclosed block")),
                Some((Token::Close, _)) if depth > 0 => return Ok(entries),
                Some((Token::Close, line)) => return Err(error(line, "unmatched ']'")),
                Some((Token::Ident(key), line)) => {
                    let value = self.parse_value(depth)?;
                    entries.push(Entry { key, value, line });
                }
                Some((_, line)) => return Err(error(line, "expected a key")),
            }
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<GmlValue, PersistError> {
        match self.next() {
            Some((Token::Str(v), _)) => Ok(GmlValue::Str(v)),
            Some((Token::Num(v), line)) => parse_number(&v, line),
            Some((Token::Ident(v), line)) => match v.as_str() {
                "true" => Ok(GmlValue::Bool(true)),
                "false" => Ok(GmlValue::Bool(false)),
                _ => Err(error(line, "expected a value")),
            },
            Some((Token::Open, _)) => Ok(GmlValue::Block(self.parse_entries(depth + 1)?)),
            Some((Token::Close, line)) => Err(error(line, "expected a value, found ']'")),
            None => Err(error(self.last_line(), "expected a value, found end of input")),
        }
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn last_line(&self) -> usize {
        self.tokens.last().map(|(_, line)| *line).unwrap_or(1)
    }
}

fn parse_number(text: &str, line: usize) -> Result<GmlValue, PersistError> {
    if text.contains('.') || text.contains('e') || text.contains('E') {
        text.parse::<f64>()
            .map(GmlValue::Float)
            .map_err(|_| error(line, "malformed number"))
    } else {
        text.parse::<i64>()
            .map(GmlValue::Int)
            .map_err(|_| error(line, "malformed number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::ForeignKey;

    fn sample_graph() -> SchemaGraph {
        let mut graph = SchemaGraph::new();
        let mut attrs = Attributes::new();
        attrs.insert("role".to_string(), "fact".into());
        attrs.insert("rows".to_string(), 42i64.into());
        attrs.insert("partitioned".to_string(), true.into());
        let _ = graph.add_table("orders", attrs);
        graph.add_foreign_keys(&[ForeignKey::new("orders", "customers", "customer_id")]);
        graph
    }

    #[test]
    fn test_round_trip_preserves_attributes() {
        let graph = sample_graph();
        let text = to_string(&graph);
        let loaded = from_str(&text).unwrap();

        let orders = loaded.table("orders").unwrap();
        assert_eq!(orders.attributes.get("role"), Some(&"fact".into()));
        assert_eq!(orders.attributes.get("rows"), Some(&AttrValue::Int(42)));
        assert_eq!(
            orders.attributes.get("partitioned"),
            Some(&AttrValue::Bool(true))
        );

        let edge = loaded.join_between("orders", "customers").unwrap();
        assert_eq!(edge.join_column(), "customer_id");
        assert_eq!(edge.predicate, "references_customer_id");
    }

    #[test]
    fn test_reads_networkx_style_output() {
        let text = r#"
graph [
  directed 1
  name "Database Schema Knowledge Graph"
  node [
    id 0
    label "orders"
  ]
  node [
    id 1
    label "customers"
  ]
  edge [
    source 0
    target 1
    predicate "references_customer_id"
    on_column "customer_id"
  ]
]
"#;
        let graph = from_str(text).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(
            graph
                .join_between("orders", "customers")
                .unwrap()
                .join_column(),
            "customer_id"
        );
    }

    #[test]
    fn test_quoted_strings_escape() {
        let mut graph = SchemaGraph::new();
        let mut attrs = Attributes::new();
        attrs.insert("note".to_string(), r#"say "hi" \ bye"#.into());
        let _ = graph.add_table("orders", attrs);

        let loaded = from_str(&to_string(&graph)).unwrap();
        assert_eq!(
            loaded.table("orders").unwrap().attributes.get("note"),
            Some(&r#"say "hi" \ bye"#.into())
        );
    }

    #[test]
    fn test_unclosed_block_fails() {
        let result = from_str("graph [\n  node [\n    id 0\n    label \"orders\"\n");
        assert!(matches!(result, Err(PersistError::Gml { .. })));
    }

    #[test]
    fn test_edge_with_unknown_node_id_fails() {
        let text = r#"
graph [
  node [ id 0 label "orders" ]
  edge [ source 0 target 7 predicate "references_x" ]
]
"#;
        let result = from_str(text);
        assert!(matches!(result, Err(PersistError::Gml { .. })));
    }

    #[test]
    fn test_missing_graph_block_fails() {
        assert!(matches!(
            from_str("digraph { }"),
            Err(PersistError::Gml { .. })
        ));
    }
}
