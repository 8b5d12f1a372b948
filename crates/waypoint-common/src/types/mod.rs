//! Core type definitions for Waypoint.
//!
//! This module contains the fundamental types exchanged between pipeline stages:
//! - Identifier types ([`DocumentId`], [`RegisterId`])
//! - Value types ([`Value`])

mod id;
mod value;

pub use id::{DocumentId, IdError, MAX_REGISTERS, RegisterId};
pub use value::Value;
