//! Shortest path command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde::Serialize;
use waypoint_common::Value;
use waypoint_core::{Direction, ShortestPathOptions};
use waypoint_engine::{Config, EndpointRef, ExecutionPlan, Query, QueryResult, ShortestPathNode};

use crate::output::{self, Format};
use crate::{Emit, OutputFormat};

const VERTEX_COLUMN: &str = "vertex";
const EDGE_COLUMN: &str = "edge";

/// Arguments of the path command.
#[derive(Args, Debug)]
pub struct PathArgs {
    /// Path to the graph file
    pub graph: PathBuf,

    /// Start vertex id (collection/key)
    #[arg(long)]
    pub from: String,

    /// Target vertex id (collection/key)
    #[arg(long)]
    pub to: String,

    /// Edge collection to follow, as name[:outbound|inbound|any]
    #[arg(long = "edges", required = true)]
    pub edges: Vec<String>,

    /// Edge attribute holding the weight; unweighted search if absent
    #[arg(long)]
    pub weight: Option<String>,

    /// Weight of edges without a usable weight attribute
    #[arg(long, default_value_t = 1.0)]
    pub default_weight: f64,

    /// Rows pulled per batch (overrides the config file)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Path elements to emit
    #[arg(long, value_enum, default_value_t = Emit::Both)]
    pub emit: Emit,
}

/// A query result as printed in JSON mode.
#[derive(Serialize)]
struct PathOutput<'a> {
    columns: &'a [String],
    rows: &'a [Vec<Value>],
    warnings: Vec<String>,
}

/// Parses `name[:direction]`; the direction defaults to outbound.
fn parse_edge_collection(arg: &str) -> Result<(String, Direction)> {
    let (name, direction) = match arg.split_once(':') {
        Some((name, direction)) => (name, direction.parse::<Direction>()?),
        None => (arg, Direction::Outbound),
    };
    if name.is_empty() {
        bail!("empty edge collection name in '{arg}'");
    }
    Ok((name.to_string(), direction))
}

fn build_plan(args: &PathArgs) -> Result<ExecutionPlan> {
    let mut node = ShortestPathNode::new(
        EndpointRef::Constant(args.from.clone()),
        EndpointRef::Constant(args.to.clone()),
    )
    .with_options(ShortestPathOptions {
        weight_attribute: args.weight.as_deref().map(Into::into),
        default_weight: args.default_weight,
    });
    for arg in &args.edges {
        let (name, direction) = parse_edge_collection(arg)?;
        node = node.with_edge_collection(name, direction);
    }
    if args.emit != Emit::Edges {
        node = node.with_vertex_output(VERTEX_COLUMN);
    }
    if args.emit != Emit::Vertices {
        node = node.with_edge_output(EDGE_COLUMN);
    }
    Ok(ExecutionPlan::new().shortest_path(node))
}

fn load_config(config: Option<&Path>, batch_size: Option<usize>) -> Result<Config> {
    let mut config = match config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(batch_size) = batch_size {
        config = config.with_batch_size(batch_size);
    }
    config.validate()?;
    Ok(config)
}

/// Loads the graph and drains the shortest path query.
fn execute(args: &PathArgs, config: &Config) -> Result<QueryResult> {
    let graph = waypoint_engine::load_graph(&args.graph)
        .with_context(|| format!("failed to load graph from {}", args.graph.display()))?;
    let plan = build_plan(args)?;
    let mut query = Query::new(&plan, Arc::new(graph), config)?;
    Ok(query.execute()?)
}

/// Run the path command.
pub fn run(args: &PathArgs, config: Option<&Path>, format: OutputFormat, quiet: bool) -> Result<()> {
    let config = load_config(config, args.batch_size)?;
    let result = execute(args, &config)?;

    let fmt: Format = format.into();
    match fmt {
        Format::Json => {
            if !quiet {
                let output = PathOutput {
                    columns: &result.columns,
                    rows: &result.rows,
                    warnings: result.warnings.iter().map(ToString::to_string).collect(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        Format::Table => {
            for warning in &result.warnings {
                output::warning(&warning.to_string(), quiet);
            }
            if result.rows.is_empty() {
                output::status(&format!("No path from {} to {}", args.from, args.to), quiet);
                return Ok(());
            }
            if !quiet {
                let mut table = output::create_table();
                let mut headers = vec!["#"];
                headers.extend(result.columns.iter().map(String::as_str));
                output::add_header(&mut table, &headers);
                for (i, row) in result.rows.iter().enumerate() {
                    let mut cells = vec![i.to_string()];
                    cells.extend(row.iter().map(output::cell_text));
                    table.add_row(cells);
                }
                println!("{table}");
            }
            output::status(&format!("{} rows", result.row_count()), quiet);
        }
    }

    Ok(())
}
