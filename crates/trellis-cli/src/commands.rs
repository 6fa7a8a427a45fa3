//! CLI command implementations.

use colored::Colorize;
use std::fs;
use std::path::Path;
use trellis_graph::{
    Diagnostic, GraphBuilder, GraphFormat, SchemaDefinition, SchemaGraph,
};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Build a schema graph from a definition file and persist it.
pub fn build(schema: &Path, output: &Path) -> Result<()> {
    let format = GraphFormat::from_path(output)?;

    let definition: SchemaDefinition = serde_json::from_str(&fs::read_to_string(schema)?)?;
    let (graph, diagnostics) = GraphBuilder::from_definition(&definition);

    print_diagnostics(&diagnostics);

    trellis_graph::save(&graph, output, format)?;

    let stats = graph.stats();
    println!(
        "{} Built graph with {} tables and {} joins, saved to {}",
        "✓".green(),
        stats.table_count.to_string().cyan(),
        stats.join_count.to_string().cyan(),
        output.display()
    );

    Ok(())
}

/// Show statistics for a persisted graph.
pub fn info(path: &Path) -> Result<()> {
    let graph = load_graph(path)?;
    let stats = graph.stats();

    println!("{}", path.display().to_string().cyan());
    println!("  tables: {}", stats.table_count);
    println!("  joins:  {}", stats.join_count);

    for name in graph.table_names() {
        println!("  {}", name);
    }

    Ok(())
}

/// List tables connected to the given start tables.
pub fn connected(path: &Path, tables: &[String], depth: Option<usize>) -> Result<()> {
    let graph = load_graph(path)?;
    let result = graph.find_connected_tables(tables, depth);

    print_diagnostics(&result.diagnostics);

    if result.tables.is_empty() {
        println!("No connected tables found");
        return Ok(());
    }

    for table in &result.tables {
        println!("{}", table);
    }

    Ok(())
}

/// Resolve join paths connecting the seed tables.
pub fn resolve(path: &Path, seeds: &[String], json: bool) -> Result<()> {
    let graph = load_graph(path)?;
    let resolution = graph.resolve_join_paths(seeds);

    if json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        return Ok(());
    }

    print_diagnostics(&resolution.diagnostics);

    if resolution.is_empty() {
        println!("No join paths resolved");
        return Ok(());
    }

    println!("{}", "Join paths:".cyan());
    for path in &resolution.paths {
        println!("  {}", path.join(" - "));
    }

    println!("\n{}", "Joins:".cyan());
    for description in resolution.join_descriptions() {
        println!("  {}", description);
    }

    println!("\n{}", "Tables required:".cyan());
    for table in resolution.filtered_tables() {
        println!("  {}", table);
    }

    Ok(())
}

/// Convert a persisted graph between formats.
pub fn convert(input: &Path, output: &Path) -> Result<()> {
    let graph = load_graph(input)?;
    let format = GraphFormat::from_path(output)?;
    trellis_graph::save(&graph, output, format)?;

    println!(
        "{} Converted {} to {}",
        "✓".green(),
        input.display(),
        output.display()
    );

    Ok(())
}

/// Print a persisted graph as Graphviz DOT.
pub fn dot(path: &Path) -> Result<()> {
    let graph = load_graph(path)?;
    print!("{}", graph.to_dot());
    Ok(())
}

fn load_graph(path: &Path) -> Result<SchemaGraph> {
    let format = GraphFormat::from_path(path)?;
    tracing::debug!(path = %path.display(), %format, "loading graph");
    Ok(trellis_graph::load(path, format)?)
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        println!("{} {}", "⚠".yellow(), diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_graph::ForeignKey;

    #[test]
    fn test_build_then_resolve_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("schema.json");
        let graph_path = dir.path().join("kg.gml");

        let definition = SchemaDefinition {
            tables: vec!["customers".to_string(), "products".to_string()],
            foreign_keys: vec![
                ForeignKey::new("orders", "customers", "customer_id"),
                ForeignKey::new("order_items", "orders", "order_id"),
                ForeignKey::new("order_items", "products", "product_id"),
            ],
        };
        fs::write(&schema_path, serde_json::to_string(&definition).unwrap()).unwrap();

        build(&schema_path, &graph_path).unwrap();

        let graph = load_graph(&graph_path).unwrap();
        let resolution = graph.resolve_join_paths(&["customers", "products"]);
        assert_eq!(
            resolution.paths,
            vec![vec!["customers", "orders", "order_items", "products"]]
        );
    }

    #[test]
    fn test_unsupported_extension_is_an_error() {
        let result = load_graph(Path::new("kg.csv"));
        assert!(result.is_err());
    }
}
