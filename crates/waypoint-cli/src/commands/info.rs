//! Graph info command.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use waypoint_core::graph::{CollectionKind, CollectionStats};

use crate::OutputFormat;
use crate::output::{self, Format};

/// One collection of the graph.
#[derive(Serialize)]
struct CollectionOutput {
    name: String,
    kind: &'static str,
    count: usize,
}

impl From<CollectionStats> for CollectionOutput {
    fn from(stats: CollectionStats) -> Self {
        Self {
            name: stats.name,
            kind: match stats.kind {
                CollectionKind::Vertex => "vertex",
                CollectionKind::Edge => "edge",
            },
            count: stats.count,
        }
    }
}

/// Information about a graph file.
#[derive(Serialize)]
struct GraphInfoOutput {
    path: String,
    vertex_count: usize,
    edge_count: usize,
    collections: Vec<CollectionOutput>,
}

/// Run the info command.
pub fn run(path: &Path, format: OutputFormat, quiet: bool) -> Result<()> {
    let graph = waypoint_engine::load_graph(path)
        .with_context(|| format!("failed to load graph from {}", path.display()))?;

    let output = GraphInfoOutput {
        path: path.display().to_string(),
        vertex_count: graph.vertex_count(),
        edge_count: graph.edge_count(),
        collections: graph.collections().into_iter().map(CollectionOutput::from).collect(),
    };

    let fmt: Format = format.into();
    match fmt {
        Format::Json => {
            if !quiet {
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        Format::Table => {
            output::status(
                &format!(
                    "{}: {} vertices, {} edges",
                    output.path, output.vertex_count, output.edge_count
                ),
                quiet,
            );
            if !quiet {
                let mut table = output::create_table();
                output::add_header(&mut table, &["Collection", "Kind", "Documents"]);
                for collection in &output.collections {
                    table.add_row(vec![
                        collection.name.clone(),
                        collection.kind.to_string(),
                        collection.count.to_string(),
                    ]);
                }
                println!("{table}");
            }
        }
    }

    Ok(())
}
