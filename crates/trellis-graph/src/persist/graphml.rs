//! GraphML XML codec.
//!
//! Table names are node ids. `<key>` declarations carry the attribute
//! names and types; `predicate` and `on_column` are reserved edge keys
//! and everything else round-trips through the attribute maps.

use super::PersistError;
use crate::edge::JoinEdge;
use crate::graph::SchemaGraph;
use crate::table::{AttrValue, Attributes};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;

const XMLNS: &str = "http://graphml.graphdrawing.org/xmlns";

/// Where a declared key applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Domain {
    Node,
    Edge,
}

impl Domain {
    fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Edge => "edge",
        }
    }
}

#[derive(Debug, Clone)]
struct KeyDecl {
    domain: Domain,
    name: String,
    ty: String,
}

fn type_of(value: &AttrValue) -> &'static str {
    match value {
        AttrValue::Str(_) => "string",
        AttrValue::Int(_) => "long",
        AttrValue::Float(_) => "double",
        AttrValue::Bool(_) => "boolean",
    }
}

fn xml_err(e: impl std::fmt::Display) -> PersistError {
    PersistError::Xml(e.to_string())
}

pub(super) fn to_string(graph: &SchemaGraph) -> Result<String, PersistError> {
    // Collect key declarations: reserved edge keys first, then node
    // and edge attribute names with the type of their first occurrence.
    let mut keys: Vec<KeyDecl> = vec![
        KeyDecl {
            domain: Domain::Edge,
            name: "predicate".to_string(),
            ty: "string".to_string(),
        },
        KeyDecl {
            domain: Domain::Edge,
            name: "on_column".to_string(),
            ty: "string".to_string(),
        },
    ];
    let mut key_ids: HashMap<(Domain, String), usize> = HashMap::new();
    key_ids.insert((Domain::Edge, "predicate".to_string()), 0);
    key_ids.insert((Domain::Edge, "on_column".to_string()), 1);

    let names = graph.table_names();
    for name in &names {
        if let Some(node) = graph.table(name) {
            for (attr, value) in &node.attributes {
                key_ids
                    .entry((Domain::Node, attr.clone()))
                    .or_insert_with(|| {
                        keys.push(KeyDecl {
                            domain: Domain::Node,
                            name: attr.clone(),
                            ty: type_of(value).to_string(),
                        });
                        keys.len() - 1
                    });
            }
        }
    }

    let mut joins: Vec<_> = graph.joins().collect();
    joins.sort_by_key(|(source, target, _)| (source.to_string(), target.to_string()));
    for (_, _, edge) in &joins {
        for (attr, value) in &edge.attributes {
            key_ids
                .entry((Domain::Edge, attr.clone()))
                .or_insert_with(|| {
                    keys.push(KeyDecl {
                        domain: Domain::Edge,
                        name: attr.clone(),
                        ty: type_of(value).to_string(),
                    });
                    keys.len() - 1
                });
        }
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(xml_err)?;

    let mut graphml = BytesStart::new("graphml");
    graphml.push_attribute(("xmlns", XMLNS));
    writer.write_event(Event::Start(graphml)).map_err(xml_err)?;

    for (index, decl) in keys.iter().enumerate() {
        let mut key = BytesStart::new("key");
        key.push_attribute(("id", format!("d{}", index).as_str()));
        key.push_attribute(("for", decl.domain.as_str()));
        key.push_attribute(("attr.name", decl.name.as_str()));
        key.push_attribute(("attr.type", decl.ty.as_str()));
        writer.write_event(Event::Empty(key)).map_err(xml_err)?;
    }

    let mut graph_el = BytesStart::new("graph");
    graph_el.push_attribute(("edgedefault", "directed"));
    writer.write_event(Event::Start(graph_el)).map_err(xml_err)?;

    for name in &names {
        let Some(node) = graph.table(name) else {
            continue;
        };
        let mut node_el = BytesStart::new("node");
        node_el.push_attribute(("id", *name));

        if node.attributes.is_empty() {
            writer.write_event(Event::Empty(node_el)).map_err(xml_err)?;
            continue;
        }

        writer.write_event(Event::Start(node_el)).map_err(xml_err)?;
        for (attr, value) in &node.attributes {
            write_data(&mut writer, &key_ids, Domain::Node, attr, &value.to_string())?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("node")))
            .map_err(xml_err)?;
    }

    for (source, target, edge) in &joins {
        let mut edge_el = BytesStart::new("edge");
        edge_el.push_attribute(("source", *source));
        edge_el.push_attribute(("target", *target));
        writer.write_event(Event::Start(edge_el)).map_err(xml_err)?;

        write_data(
            &mut writer,
            &key_ids,
            Domain::Edge,
            "predicate",
            &edge.predicate,
        )?;
        if let Some(column) = &edge.on_column {
            write_data(&mut writer, &key_ids, Domain::Edge, "on_column", column)?;
        }
        for (attr, value) in &edge.attributes {
            write_data(&mut writer, &key_ids, Domain::Edge, attr, &value.to_string())?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("edge")))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("graph")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("graphml")))
        .map_err(xml_err)?;

    String::from_utf8(writer.into_inner()).map_err(xml_err)
}

fn write_data(
    writer: &mut Writer<Vec<u8>>,
    key_ids: &HashMap<(Domain, String), usize>,
    domain: Domain,
    name: &str,
    value: &str,
) -> Result<(), PersistError> {
    let Some(index) = key_ids.get(&(domain, name.to_string())) else {
        return Err(PersistError::Xml(format!("undeclared key '{}'", name)));
    };
    let mut data = BytesStart::new("data");
    data.push_attribute(("key", format!("d{}", index).as_str()));
    writer.write_event(Event::Start(data)).map_err(xml_err)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("data")))
        .map_err(xml_err)?;
    Ok(())
}

/// Parser state for the element currently being filled in.
enum Current {
    None,
    Node {
        name: String,
        attributes: Attributes,
    },
    Edge {
        source: String,
        target: String,
        edge: JoinEdge,
    },
}

pub(super) fn from_str(input: &str) -> Result<SchemaGraph, PersistError> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(true);

    let mut decls: HashMap<String, KeyDecl> = HashMap::new();
    let mut current = Current::None;
    let mut current_key: Option<String> = None;
    let mut current_text = String::new();

    let mut graph = SchemaGraph::new();
    let mut pending_edges: Vec<(String, String, JoinEdge)> = Vec::new();
    let mut closed = false;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(el) | Event::Empty(el) if el.name().as_ref() == b"key" => {
                let mut id = None;
                let mut domain = Domain::Node;
                let mut name = None;
                let mut ty = "string".to_string();
                for attr in el.attributes() {
                    let attr = attr.map_err(xml_err)?;
                    let value = attr.unescape_value().map_err(xml_err)?.into_owned();
                    match attr.key.as_ref() {
                        b"id" => id = Some(value),
                        b"for" => {
                            domain = if value == "edge" {
                                Domain::Edge
                            } else {
                                Domain::Node
                            }
                        }
                        b"attr.name" => name = Some(value),
                        b"attr.type" => ty = value,
                        _ => {}
                    }
                }
                let id = id.ok_or_else(|| PersistError::Xml("key without id".to_string()))?;
                let name =
                    name.ok_or_else(|| PersistError::Xml("key without attr.name".to_string()))?;
                decls.insert(id, KeyDecl { domain, name, ty });
            }

            Event::Empty(el) if el.name().as_ref() == b"node" => {
                let name = required_attr(&el, b"id")?;
                commit_node(&mut graph, name, Attributes::new())?;
            }
            Event::Start(el) if el.name().as_ref() == b"node" => {
                current = Current::Node {
                    name: required_attr(&el, b"id")?,
                    attributes: Attributes::new(),
                };
            }
            Event::End(el) if el.name().as_ref() == b"node" => {
                if let Current::Node { name, attributes } =
                    std::mem::replace(&mut current, Current::None)
                {
                    commit_node(&mut graph, name, attributes)?;
                }
            }

            Event::Empty(el) if el.name().as_ref() == b"edge" => {
                pending_edges.push((
                    required_attr(&el, b"source")?,
                    required_attr(&el, b"target")?,
                    JoinEdge::new(""),
                ));
            }
            Event::Start(el) if el.name().as_ref() == b"edge" => {
                current = Current::Edge {
                    source: required_attr(&el, b"source")?,
                    target: required_attr(&el, b"target")?,
                    edge: JoinEdge::new(""),
                };
            }
            Event::End(el) if el.name().as_ref() == b"edge" => {
                if let Current::Edge {
                    source,
                    target,
                    edge,
                } = std::mem::replace(&mut current, Current::None)
                {
                    pending_edges.push((source, target, edge));
                }
            }

            Event::Start(el) if el.name().as_ref() == b"data" => {
                current_key = Some(required_attr(&el, b"key")?);
                current_text.clear();
            }
            Event::Text(text) => {
                current_text.push_str(&text.unescape().map_err(xml_err)?);
            }
            Event::End(el) if el.name().as_ref() == b"data" => {
                let Some(key) = current_key.take() else {
                    continue;
                };
                apply_data(&decls, &key, &current_text, &mut current)?;
                current_text.clear();
            }

            Event::End(el) if el.name().as_ref() == b"graphml" => {
                closed = true;
            }

            Event::Eof => break,
            _ => {}
        }
    }

    if !closed {
        return Err(PersistError::Xml(
            "truncated document: missing </graphml>".to_string(),
        ));
    }

    for (source, target, edge) in pending_edges {
        if !graph.contains_table(&source) || !graph.contains_table(&target) {
            return Err(PersistError::Xml(format!(
                "edge {} -> {} references an undeclared node",
                source, target
            )));
        }
        graph.add_join(&source, &target, edge);
    }

    Ok(graph)
}

fn commit_node(
    graph: &mut SchemaGraph,
    name: String,
    attributes: Attributes,
) -> Result<(), PersistError> {
    graph
        .add_table(&name, attributes)
        .map_err(|_| PersistError::Xml("node id must be non-empty".to_string()))?;
    Ok(())
}

fn required_attr(el: &BytesStart<'_>, key: &[u8]) -> Result<String, PersistError> {
    for attr in el.attributes() {
        let attr = attr.map_err(xml_err)?;
        if attr.key.as_ref() == key {
            return Ok(attr.unescape_value().map_err(xml_err)?.into_owned());
        }
    }
    Err(PersistError::Xml(format!(
        "missing attribute '{}'",
        String::from_utf8_lossy(key)
    )))
}

/// Routes a `<data>` value to the element being filled in, parsing it
/// per the declared key type. Reserved edge keys go to the edge record
/// itself; unknown keys are treated as string attributes.
fn apply_data(
    decls: &HashMap<String, KeyDecl>,
    key: &str,
    text: &str,
    current: &mut Current,
) -> Result<(), PersistError> {
    let (name, ty) = match decls.get(key) {
        Some(decl) => (decl.name.as_str(), decl.ty.as_str()),
        None => (key, "string"),
    };

    match current {
        Current::Node { attributes, .. } => {
            attributes.insert(name.to_string(), parse_typed(text, ty));
        }
        Current::Edge { edge, .. } => match name {
            "predicate" => edge.predicate = text.to_string(),
            "on_column" => edge.on_column = Some(text.to_string()),
            _ => {
                edge.attributes.insert(name.to_string(), parse_typed(text, ty));
            }
        },
        Current::None => {
            return Err(PersistError::Xml(format!(
                "data element for key '{}' outside a node or edge",
                key
            )));
        }
    }
    Ok(())
}

/// Lenient typed parse: a value that fails its declared type reads
/// back as a string rather than failing the whole load.
fn parse_typed(text: &str, ty: &str) -> AttrValue {
    match ty {
        "int" | "long" => text
            .parse::<i64>()
            .map(AttrValue::Int)
            .unwrap_or_else(|_| AttrValue::Str(text.to_string())),
        "float" | "double" => text
            .parse::<f64>()
            .map(AttrValue::Float)
            .unwrap_or_else(|_| AttrValue::Str(text.to_string())),
        "boolean" => text
            .parse::<bool>()
            .map(AttrValue::Bool)
            .unwrap_or_else(|_| AttrValue::Str(text.to_string())),
        _ => AttrValue::Str(text.to_string()),
    }
}
