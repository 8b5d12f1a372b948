//! Per-query execution context.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::BatchPool;
use super::blocks::BlockError;

/// Category of a query warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// A row carried a value that cannot be used as an operator parameter.
    BadParameter,
}

impl WarningCode {
    /// Returns the numeric code reported to clients.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            WarningCode::BadParameter => 10,
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningCode::BadParameter => f.write_str("bad parameter"),
        }
    }
}

/// A recoverable problem observed while running a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Warning category.
    pub code: WarningCode,
    /// Human readable description.
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

#[derive(Default)]
struct Warnings {
    list: Vec<Warning>,
    dropped: usize,
}

/// State shared by every block of one query.
///
/// Holds the batch pool, the kill flag polled during long computations, and
/// the warnings registered for rows that could not be processed.
pub struct QueryContext {
    pool: Arc<BatchPool>,
    killed: AtomicBool,
    warnings: Mutex<Warnings>,
    max_warnings: usize,
}

impl QueryContext {
    /// Default cap on stored warnings.
    pub const DEFAULT_MAX_WARNINGS: usize = 100;

    /// Creates a context with a fresh pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pool(Arc::new(BatchPool::default()), Self::DEFAULT_MAX_WARNINGS)
    }

    /// Creates a context over an existing pool.
    #[must_use]
    pub fn with_pool(pool: Arc<BatchPool>, max_warnings: usize) -> Self {
        Self {
            pool,
            killed: AtomicBool::new(false),
            warnings: Mutex::new(Warnings::default()),
            max_warnings,
        }
    }

    /// Returns the batch pool.
    #[must_use]
    pub fn pool(&self) -> &Arc<BatchPool> {
        &self.pool
    }

    // === Warnings ===

    /// Records a warning. Past the cap, warnings are only counted.
    pub fn register_warning(&self, code: WarningCode, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(code = code.code(), "{message}");
        let mut warnings = self.warnings.lock();
        if warnings.list.len() < self.max_warnings {
            warnings.list.push(Warning { code, message });
        } else {
            warnings.dropped += 1;
        }
    }

    /// Returns the stored warnings.
    #[must_use]
    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.lock().list.clone()
    }

    /// Returns the number of warnings registered, stored or not.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        let warnings = self.warnings.lock();
        warnings.list.len() + warnings.dropped
    }

    // === Cancellation ===

    /// Requests the query to stop.
    pub fn kill(&self) {
        tracing::debug!("query killed");
        self.killed.store(true, Ordering::Release);
    }

    /// Returns true once the query has been killed.
    #[must_use]
    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::Acquire)
    }

    /// Fails with [`BlockError::Killed`] once the query has been killed.
    ///
    /// # Errors
    ///
    /// Returns `BlockError::Killed` if a kill was requested.
    pub fn check_killed(&self) -> Result<(), BlockError> {
        if self.is_killed() {
            Err(BlockError::Killed)
        } else {
            Ok(())
        }
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryContext")
            .field("killed", &self.is_killed())
            .field("warnings", &self.warning_count())
            .finish_non_exhaustive()
    }
}
