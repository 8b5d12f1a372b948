//! Execution blocks.
//!
//! Every block implements the same pull contract:
//!
//! - `initialize_cursor`: rewind the block (and its dependency) to a start row
//! - `get_some`: produce up to `at_most` rows, or `None` at end of stream
//! - `skip_some`: discard up to `at_most` rows without building them
//!
//! Blocks have at most one dependency and pull from it only when their input
//! buffer is empty.
//!
//! - Singleton: the root of a pipeline, yields one row
//! - Values: a fixed table emitted per input row
//! - ShortestPath: streams the vertices/edges of a shortest path per input row

mod input;
mod shortest_path;
mod singleton;
mod values;

pub use input::BlockInput;
pub use shortest_path::{Endpoint, ShortestPathBlock, ShortestPathParams};
pub use singleton::SingletonBlock;
pub use values::ValuesBlock;

use thiserror::Error;

use super::TupleBatch;

/// Result of a `get_some` call.
pub type BlockResult = Result<Option<TupleBatch>, BlockError>;

/// Error during block execution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    /// The query was killed while the block was working.
    #[error("query killed")]
    Killed,
    /// `initialize_cursor` was given a start row outside the start batch.
    #[error("cursor position {pos} out of range for batch of {rows} rows")]
    InvalidCursor {
        /// Requested position.
        pos: usize,
        /// Rows in the start batch.
        rows: usize,
    },
    /// The block was configured inconsistently.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<BlockError> for waypoint_common::Error {
    fn from(err: BlockError) -> Self {
        match err {
            BlockError::Killed => waypoint_common::Error::Killed,
            BlockError::InvalidPlan(msg) => waypoint_common::Error::Plan(msg),
            BlockError::Internal(msg) => waypoint_common::Error::Internal(msg),
            other @ BlockError::InvalidCursor { .. } => {
                waypoint_common::Error::Execution(other.to_string())
            }
        }
    }
}

/// A pull-based pipeline stage.
pub trait ExecutionBlock: Send {
    /// Rewinds the block so iteration starts from `items[pos]`.
    ///
    /// The call is forwarded down the dependency chain; only the root block
    /// interprets `items`. Calling it twice with the same arguments leaves
    /// the block in the same state as calling it once.
    ///
    /// # Errors
    ///
    /// Returns an error if `pos` is outside `items`.
    fn initialize_cursor(&mut self, items: Option<&TupleBatch>, pos: usize) -> Result<(), BlockError>;

    /// Returns up to `at_most` new rows, or `None` once the stream is drained.
    ///
    /// A returned batch always holds at least one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the query was killed or a dependency failed.
    fn get_some(&mut self, at_most: usize) -> BlockResult;

    /// Discards up to `at_most` rows and returns how many were discarded.
    ///
    /// Fewer than `at_most` rows are skipped only at end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the query was killed or a dependency failed.
    fn skip_some(&mut self, at_most: usize) -> Result<usize, BlockError>;

    /// Returns the number of registers of the rows this block produces.
    fn register_count(&self) -> usize;

    /// Returns the name of this block for debugging.
    fn name(&self) -> &'static str;
}
