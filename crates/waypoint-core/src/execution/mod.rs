//! Execution primitives for pull-based query pipelines.
//!
//! A pipeline is a chain of [`ExecutionBlock`](blocks::ExecutionBlock)s. The
//! consumer pulls from the outermost block with `get_some`/`skip_some`; each
//! block pulls from its dependency only when its own input buffer runs dry.
//!
//! - [`TupleBatch`] - Rows x registers table exchanged between blocks
//! - [`BatchPool`] - Recycles batch storage across blocks
//! - [`QueryContext`] - Per-query warnings, kill flag, and pool
//! - [`blocks`] - The block contract and concrete blocks

mod batch;
pub mod blocks;
mod context;
mod pool;

pub use batch::TupleBatch;
pub use context::{QueryContext, Warning, WarningCode};
pub use pool::{BatchPool, PoolStats};

/// Default number of rows a block asks its dependency for.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
