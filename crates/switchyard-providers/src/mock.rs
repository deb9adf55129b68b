//! Mock provider for testing routing and failover behavior.
//!
//! Allows defining canned responses for specific query patterns, scripted
//! failures, and a configurable model listing, enabling end-to-end testing of
//! routing workflows without real API calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use switchyard_core::{Error, ModelProvider, Query, Response, Result, TokenUsage};

/// Response storage type
type ResponseMap = Arc<Mutex<HashMap<String, String>>>;

/// Mock provider that returns pre-defined responses based on query patterns.
#[derive(Clone)]
pub struct MockProvider {
    /// Name reported by this mock
    name: &'static str,
    /// Whether the mock claims to hold a credential
    configured: bool,
    /// Models reported by `list_models`
    models: Arc<Mutex<Vec<String>>>,
    /// Whether `list_models` should fail
    listing_fails: Arc<Mutex<bool>>,
    /// Predefined responses keyed by query substring
    responses: ResponseMap,
    /// Default response if no pattern matches
    default_response: Arc<Mutex<Option<String>>>,
    /// Error message returned by every `generate` call, when set
    failure: Arc<Mutex<Option<String>>>,
    /// Artificial delay applied to `generate`, for timeout tests
    delay: Arc<Mutex<Option<Duration>>>,
    /// Call history for verification
    call_history: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new mock provider with a given static name.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            configured: true,
            models: Arc::new(Mutex::new(vec!["mock-model".to_owned()])),
            listing_fails: Arc::new(Mutex::new(false)),
            responses: Arc::new(Mutex::new(HashMap::new())),
            default_response: Arc::new(Mutex::new(None)),
            failure: Arc::new(Mutex::new(None)),
            delay: Arc::new(Mutex::new(None)),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a pattern-based response to the mock provider.
    #[must_use]
    pub fn with_response(self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        {
            let mut responses = lock(&self.responses);
            responses.insert(pattern.into(), response.into());
        }
        self
    }

    /// Set a default response for queries that don't match any pattern.
    #[must_use]
    pub fn with_default_response(self, response: impl Into<String>) -> Self {
        {
            let mut default = lock(&self.default_response);
            *default = Some(response.into());
        }
        self
    }

    /// Make every `generate` call fail with the given message.
    #[must_use]
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        {
            let mut failure = lock(&self.failure);
            *failure = Some(message.into());
        }
        self
    }

    /// Set the model listing reported by this mock.
    #[must_use]
    pub fn with_models(self, models: Vec<String>) -> Self {
        {
            let mut stored = lock(&self.models);
            *stored = models;
        }
        self
    }

    /// Make `list_models` fail, simulating an unreachable backend.
    #[must_use]
    pub fn with_unreachable_listing(self) -> Self {
        {
            let mut fails = lock(&self.listing_fails);
            *fails = true;
        }
        self
    }

    /// Mark the mock as missing its credential.
    #[must_use]
    pub fn without_credentials(mut self) -> Self {
        self.configured = false;
        self
    }

    /// Delay every `generate` call, for exercising timeout budgets.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        {
            let mut stored = lock(&self.delay);
            *stored = Some(delay);
        }
        self
    }

    /// Stop failing: subsequent `generate` calls succeed again.
    pub fn clear_failure(&self) {
        let mut failure = lock(&self.failure);
        *failure = None;
    }

    /// Get the call history (list of all query texts seen).
    #[must_use]
    pub fn call_history(&self) -> Vec<String> {
        lock(&self.call_history).clone()
    }

    /// Get the number of `generate` calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.call_history).len()
    }

    /// Find a matching response for the given query text.
    fn find_response(&self, query_text: &str) -> Option<String> {
        let responses = lock(&self.responses);

        if let Some(response) = responses.get(query_text) {
            return Some(response.clone());
        }

        responses
            .iter()
            .find(|(pattern, _)| query_text.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
    }
}

/// Locks a mutex, recovering from poisoning: the panic that poisoned the lock
/// is the interesting failure, not the poisoned state itself.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        if *lock(&self.listing_fails) {
            return Err(Error::Provider(format!("{} unreachable", self.name)));
        }
        Ok(lock(&self.models).clone())
    }

    async fn generate(&self, query: &Query) -> Result<Response> {
        {
            let mut history = lock(&self.call_history);
            history.push(query.text.clone());
        }

        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = lock(&self.failure).clone();
        if let Some(message) = failure {
            return Err(Error::Provider(message));
        }

        let text = self.find_response(&query.text).unwrap_or_else(|| {
            let default = lock(&self.default_response);
            default
                .clone()
                .unwrap_or_else(|| format!("Mock response for query: {}", query.text))
        });

        Ok(Response {
            text,
            model: query.model_id.clone().unwrap_or_else(|| "mock-model".to_owned()),
            tokens_used: TokenUsage {
                input: query.text.len() as u64,
                output: 0,
            },
            provider: self.name.to_owned(),
            latency_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_exact_match() {
        let provider = MockProvider::new("test").with_response("hello", "world");

        let query = Query::new("hello");

        let response = provider.generate(&query).await;
        assert!(response.is_ok(), "Failed to generate response");
        if let Ok(resp) = response {
            assert_eq!(resp.text, "world");
        }
    }

    #[tokio::test]
    async fn test_mock_provider_substring_match() {
        let provider =
            MockProvider::new("test").with_response("implement", "I will implement that feature");

        let query = Query::new("Please implement a new login system");

        let response = provider.generate(&query).await;
        assert!(response.is_ok(), "Failed to generate response");
        if let Ok(resp) = response {
            assert_eq!(resp.text, "I will implement that feature");
        }
    }

    #[tokio::test]
    async fn test_mock_provider_default_response() {
        let provider = MockProvider::new("test").with_default_response("Default response");

        let query = Query::new("unmatched query");

        let response = provider.generate(&query).await;
        assert!(response.is_ok(), "Failed to generate response");
        if let Ok(resp) = response {
            assert_eq!(resp.text, "Default response");
        }
    }

    #[tokio::test]
    async fn test_mock_provider_scripted_failure() {
        let provider = MockProvider::new("test").with_failure("backend down");

        let query = Query::new("anything");
        let response = provider.generate(&query).await;
        assert!(response.is_err());

        provider.clear_failure();
        let response = provider.generate(&query).await;
        assert!(response.is_ok());
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_provider_listing() {
        let provider = MockProvider::new("test")
            .with_models(vec!["a".to_owned(), "b:free".to_owned()]);
        let models = provider.list_models().await;
        assert!(models.is_ok());
        if let Ok(models) = models {
            assert_eq!(models.len(), 2);
        }

        let unreachable = MockProvider::new("test").with_unreachable_listing();
        assert!(unreachable.list_models().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_provider_call_history() {
        let provider = MockProvider::new("test");

        let query1 = Query::new("first query");
        let query2 = Query::new("second query");

        let res1 = provider.generate(&query1).await;
        assert!(res1.is_ok(), "Failed to generate first response");
        let res2 = provider.generate(&query2).await;
        assert!(res2.is_ok(), "Failed to generate second response");

        let history = provider.call_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], "first query");
        assert_eq!(history[1], "second query");
    }
}
