//! # waypoint-core
//!
//! Core layer for Waypoint: tuple batches, execution blocks, and the graph
//! primitives the shortest-path block is built from.
//!
//! This crate provides the pull-based execution machinery. It depends only on
//! `waypoint-common`.
//!
//! ## Modules
//!
//! - [`execution`] - Execution primitives (TupleBatch, BatchPool, QueryContext, blocks)
//! - [`graph`] - Graph access, edge collections, path results, and finders

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod execution;
pub mod graph;

// Re-export commonly used types
pub use execution::blocks::{
    BlockError, BlockResult, Endpoint, ExecutionBlock, ShortestPathBlock, ShortestPathParams,
    SingletonBlock, ValuesBlock,
};
pub use execution::{BatchPool, QueryContext, TupleBatch, Warning, WarningCode};
pub use graph::{
    Direction, EdgeCollectionInfo, ExtractionError, GraphAccess, GraphError, MemoryGraph,
    PathResult, ShortestPathFinder, ShortestPathOptions,
};
