use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;

use switchyard_core::{Error as CoreError, ModelProvider, Query, Response, Result, TokenUsage};

use crate::OllamaManager;
use crate::models::{OllamaGenerateRequest, OllamaGenerateResponse};

/// Default model used when a query does not pin one.
const DEFAULT_MODEL: &str = "qwen2.5-coder:7b";

/// Compute backend served by a local Ollama runtime.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    default_model: String,
    manager: OllamaManager,
}

impl OllamaProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:11434".to_owned(),
            default_model: DEFAULT_MODEL.to_owned(),
            manager: OllamaManager::new(),
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: String) -> Self {
        self.base_url.clone_from(&url);
        self.manager = OllamaManager::new().with_url(url);
        self
    }

    #[must_use]
    pub fn with_default_model(mut self, model: String) -> Self {
        self.default_model = model;
        self
    }

    async fn generate_completion(&self, model: &str, prompt: &str) -> Result<OllamaGenerateResponse> {
        let request = OllamaGenerateRequest {
            model: model.to_owned(),
            prompt: prompt.to_owned(),
            system: Some(
                "You are an expert coding assistant. Provide clear, concise, and correct code solutions."
                    .to_owned(),
            ),
            temperature: Some(0.7),
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|err| CoreError::Provider(format!("Ollama request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(CoreError::Provider(format!(
                "Ollama returned error: {}",
                response.status()
            )));
        }

        let ollama_response: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|err| CoreError::InvalidResponse(format!("Ollama response: {err}")))?;

        Ok(ollama_response)
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn is_configured(&self) -> bool {
        // No credential needed for a local runtime.
        true
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let models = self
            .manager
            .list_models()
            .await
            .map_err(|err| CoreError::Provider(err.to_string()))?;
        Ok(models.into_iter().map(|model| model.name).collect())
    }

    async fn generate(&self, query: &Query) -> Result<Response> {
        let start = Instant::now();

        let model = query.model_id.as_deref().unwrap_or(&self.default_model);
        let ollama_response = self.generate_completion(model, &query.text).await?;

        let latency_ms = start.elapsed().as_millis() as u64;

        Ok(Response {
            text: ollama_response.response,
            model: ollama_response.model,
            tokens_used: TokenUsage {
                input: ollama_response.prompt_eval_count as u64,
                output: ollama_response.eval_count as u64,
            },
            provider: self.name().to_owned(),
            latency_ms,
        })
    }
}
