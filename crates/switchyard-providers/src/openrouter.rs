use std::env;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use switchyard_core::{Error, ModelProvider, Query, Response, Result, TokenUsage};

/// `OpenRouter` chat completions endpoint URL.
const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
/// `OpenRouter` model listing endpoint URL.
const OPENROUTER_MODELS_URL: &str = "https://openrouter.ai/api/v1/models";
/// Default model for `OpenRouter`.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Env var key for `OpenRouter` API key.
const ENV_OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
/// Suffix marking zero-cost hosted models.
const FREE_SUFFIX: &str = ":free";

/// Provider implementation for the `OpenRouter` API.
///
/// Serves both the paid tier and the free tier: free models are reached
/// through the same endpoint and differ only in their `:free` model-id suffix
/// and zero price.
pub struct OpenRouterProvider {
    /// HTTP client for API requests.
    client: Client,
    /// `OpenRouter` API key.
    api_key: String,
    /// Model name to use when a query does not pin one.
    default_model: String,
}

impl OpenRouterProvider {
    /// Creates a new `OpenRouterProvider` with the given API key.
    ///
    /// # Errors
    /// Returns an error if the provided API key is empty.
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::MissingApiKey(ENV_OPENROUTER_API_KEY.to_owned()));
        }

        Ok(Self {
            client: Client::default(),
            api_key,
            default_model: DEFAULT_MODEL.to_owned(),
        })
    }

    /// Creates a new `OpenRouterProvider` from environment variables.
    ///
    /// # Errors
    /// Returns an error if the env var is missing.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var(ENV_OPENROUTER_API_KEY)
            .map_err(|_| Error::MissingApiKey(ENV_OPENROUTER_API_KEY.to_owned()))?;
        Self::new(api_key)
    }

    /// Creates a new `OpenRouterProvider` from config or environment.
    ///
    /// # Errors
    /// Returns an error if the API key is not provided by either source.
    pub fn from_config_or_env(config_key: Option<String>) -> Result<Self> {
        let api_key = config_key
            .or_else(|| env::var(ENV_OPENROUTER_API_KEY).ok())
            .ok_or_else(|| {
                Error::MissingApiKey(format!(
                    "{ENV_OPENROUTER_API_KEY} or config.toml openrouter_api_key"
                ))
            })?;
        Self::new(api_key)
    }

    /// Sets the default model to use for generation.
    #[must_use]
    pub fn with_default_model(mut self, model: String) -> Self {
        self.default_model = model;
        self
    }

    /// Returns whether a model id names a zero-cost hosted model.
    #[must_use]
    pub fn is_free_model(model_id: &str) -> bool {
        model_id.ends_with(FREE_SUFFIX)
    }

    /// Lists the zero-cost models currently served.
    ///
    /// # Errors
    /// Returns an error if the model listing request fails.
    pub async fn free_models(&self) -> Result<Vec<String>> {
        let models = self.list_models().await?;
        Ok(models
            .into_iter()
            .filter(|id| Self::is_free_model(id))
            .collect())
    }
}

/// Response payload returned by the `OpenRouter` completions API.
#[derive(Deserialize)]
struct OpenRouterResponse {
    /// List of generated choices.
    choices: Vec<Choice>,
    /// Optional token usage statistics returned by the service.
    usage: Option<Usage>,
    /// Model that served the request.
    #[serde(default)]
    model: Option<String>,
}

/// Individual completion choice from `OpenRouter`.
#[derive(Deserialize)]
struct Choice {
    /// Message payload representing the completion text.
    message: Message,
}

/// Message structure containing generated content.
#[derive(Deserialize)]
struct Message {
    /// Text content produced by the model.
    content: String,
}

/// Token accounting information for a response.
#[derive(Deserialize)]
struct Usage {
    /// Number of prompt tokens billed for the request.
    prompt_tokens: u64,
    /// Number of completion tokens returned by the model.
    completion_tokens: u64,
}

/// Response payload returned by the `OpenRouter` models API.
#[derive(Deserialize)]
struct ModelsResponse {
    /// Models currently available through the service.
    data: Vec<ModelEntry>,
}

/// A single model listing entry.
#[derive(Deserialize)]
struct ModelEntry {
    /// Model identifier.
    id: String,
}

#[async_trait]
impl ModelProvider for OpenRouterProvider {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(OPENROUTER_MODELS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|err| Error::Provider(format!("Model listing failed: {err}")))?;

        if !response.status().is_success() {
            return Err(Error::Provider(format!(
                "OpenRouter model listing failed with status {}",
                response.status()
            )));
        }

        let listing: ModelsResponse = response
            .json()
            .await
            .map_err(|err| Error::InvalidResponse(format!("model listing: {err}")))?;

        Ok(listing.data.into_iter().map(|entry| entry.id).collect())
    }

    async fn generate(&self, query: &Query) -> Result<Response> {
        let start = Instant::now();

        let model = query
            .model_id
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let request_body = json!({
            "model": model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are an expert coding assistant. Provide clear, concise, and correct code solutions."
                },
                { "role": "user", "content": query.text }
            ],
            "max_tokens": 4096,
        });

        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|err| Error::Provider(format!("Request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "OpenRouter API request failed with status {status}: {error_text}"
            )));
        }

        let api_response: OpenRouterResponse = response
            .json()
            .await
            .map_err(|err| Error::InvalidResponse(format!("Failed to parse response: {err}")))?;

        let text = api_response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| Error::InvalidResponse("No response from OpenRouter".to_owned()))?;

        let tokens_used = api_response.usage.map_or_else(TokenUsage::default, |usage| {
            TokenUsage {
                input: usage.prompt_tokens,
                output: usage.completion_tokens,
            }
        });

        Ok(Response {
            text,
            model: api_response.model.unwrap_or(model),
            tokens_used,
            provider: self.name().to_owned(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_with_empty_api_key() {
        let result = OpenRouterProvider::new(String::new());
        assert!(result.is_err(), "Empty API key should return an error");

        if let Err(err) = result {
            assert!(
                matches!(err, Error::MissingApiKey(_)),
                "Should be a MissingApiKey error"
            );
        }
    }

    #[test]
    fn test_new_with_valid_api_key() {
        let result = OpenRouterProvider::new("valid_key".to_owned());
        assert!(result.is_ok(), "Valid API key should succeed");

        if let Ok(provider) = result {
            assert_eq!(provider.api_key, "valid_key");
            assert_eq!(provider.default_model, DEFAULT_MODEL);
            assert!(provider.is_configured());
        }
    }

    #[test]
    fn test_with_default_model() {
        let result = OpenRouterProvider::new("test_key".to_owned());
        assert!(result.is_ok());
        if let Ok(provider) = result {
            let provider = provider.with_default_model("custom-model".to_owned());
            assert_eq!(provider.default_model, "custom-model");
        }
    }

    #[test]
    fn test_free_model_detection() {
        assert!(OpenRouterProvider::is_free_model(
            "meta-llama/llama-3.1-8b-instruct:free"
        ));
        assert!(!OpenRouterProvider::is_free_model("gpt-4o"));
        assert!(!OpenRouterProvider::is_free_model("free-form-model"));
    }
}
