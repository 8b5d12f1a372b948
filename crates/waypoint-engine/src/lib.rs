//! # waypoint-engine
//!
//! The main entry point for Waypoint: configuration, execution plans, query
//! instantiation and execution, and graph loading.
//!
//! ## Modules
//!
//! - [`config`] - Configuration options
//! - [`plan`] - Execution plans and register planning
//! - [`query`] - Block chain construction, pulling, and kill handles
//! - [`loader`] - JSON graph loading

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod loader;
pub mod plan;
pub mod query;

pub use config::Config;
pub use loader::{load_graph, load_graph_str};
pub use plan::{EndpointRef, ExecutionPlan, PlanNode, RegisterPlan, ShortestPathNode};
pub use query::{KillHandle, Query, QueryResult};
