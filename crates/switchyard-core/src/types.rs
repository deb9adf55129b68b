use serde::{Deserialize, Serialize};

/// A single generation request handed to a compute backend.
///
/// The model is chosen by the routing layer before the query is built, so
/// adapters never have to guess from the text which model to use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// The task text to execute.
    pub text: String,
    /// Model identifier to run against, if the caller has already chosen one.
    /// Adapters fall back to their configured default when absent.
    pub model_id: Option<String>,
}

impl Query {
    /// Creates a query with no model preference.
    pub fn new<T: Into<String>>(text: T) -> Self {
        Self {
            text: text.into(),
            model_id: None,
        }
    }

    /// Pins the query to a specific model.
    #[must_use]
    pub fn with_model<T: Into<String>>(mut self, model_id: T) -> Self {
        self.model_id = Some(model_id.into());
        self
    }
}

/// A backend's answer to a [`Query`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Generated text content.
    pub text: String,
    /// Model that produced the text.
    pub model: String,
    /// Token accounting reported by the backend, zeroed when unavailable.
    pub tokens_used: TokenUsage,
    /// Name of the provider adapter that served the request.
    pub provider: String,
    /// Wall-clock latency of the request.
    pub latency_ms: u64,
}

/// Token accounting for a single request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens billed for the request.
    pub input: u64,
    /// Completion tokens returned by the model.
    pub output: u64,
}

impl TokenUsage {
    /// Total tokens across prompt and completion.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}
