//! # docside-core
//!
//! Core types and abstractions for the Docside SDK.
//!
//! This crate provides the foundational data structures, error types, and
//! shared constants that the other Docside crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
