//! Core types and traits for the switchyard task router.
//!
//! This crate provides the fundamental types, error handling, configuration,
//! and trait definitions shared by every backend adapter and by the routing
//! engine itself.

/// Process-wide configuration: credentials and endpoints.
pub mod config;
/// Error types and result definitions.
pub mod error;
/// Trait definitions for compute backends.
pub mod traits;
/// Core data types for queries, responses, and token accounting.
pub mod types;

pub use config::{ApiKeys, Endpoints, SwitchyardConfig};
pub use error::{Error, Result};
pub use traits::ModelProvider;
pub use types::{Query, Response, TokenUsage};
