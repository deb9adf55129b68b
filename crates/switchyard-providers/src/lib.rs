//! Provider adapters for hosted LLM services.
//!
//! The paid and free hosted tiers share one API surface: free-tier models are
//! ordinary hosted models whose id carries the `:free` suffix and whose usage
//! costs nothing.

/// Mock provider for tests.
pub mod mock;
/// `OpenRouter` hosted provider implementation.
pub mod openrouter;

pub use mock::MockProvider;
pub use openrouter::OpenRouterProvider;
