//! # waypoint-common
//!
//! Foundation layer for Waypoint: identifiers, values, and errors.
//!
//! This crate provides the fundamental building blocks used by all other
//! Waypoint crates. It has no internal dependencies and should be kept minimal.
//!
//! ## Modules
//!
//! - [`types`] - Core type definitions (DocumentId, RegisterId, Value)
//! - [`utils`] - Utility functions and helpers (errors)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod types;
pub mod utils;

// Re-export commonly used types at crate root
pub use types::{DocumentId, IdError, MAX_REGISTERS, RegisterId, Value};
pub use utils::error::{Error, Result};
