//! Query execution configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use waypoint_common::utils::error::{Error, Result};
use waypoint_core::execution::{BatchPool, DEFAULT_BATCH_SIZE};
use waypoint_core::QueryContext;

/// Execution settings shared by every query.
///
/// # Examples
///
/// ```
/// use waypoint_engine::Config;
///
/// let config = Config::default().with_batch_size(100).with_max_warnings(10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rows requested per pull; also the ceiling of upstream fetches.
    pub batch_size: usize,
    /// Idle batches kept by the batch pool for reuse.
    pub pool_capacity: usize,
    /// Warnings stored per query; further warnings are only counted.
    pub max_warnings: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            pool_capacity: BatchPool::DEFAULT_CAPACITY,
            max_warnings: QueryContext::DEFAULT_MAX_WARNINGS,
        }
    }
}

impl Config {
    /// Sets the pull size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the number of idle batches kept for reuse.
    #[must_use]
    pub fn with_pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = pool_capacity;
        self
    }

    /// Sets the warning cap.
    #[must_use]
    pub fn with_max_warnings(mut self, max_warnings: usize) -> Self {
        self.max_warnings = max_warnings;
        self
    }

    /// Checks the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Plan("batch_size must be greater than zero".into()));
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the settings are invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
