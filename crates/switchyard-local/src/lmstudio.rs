//! LM Studio backend, reached through its OpenAI-compatible local server.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;

use switchyard_core::{Error as CoreError, ModelProvider, Query, Response, Result, TokenUsage};

use crate::models::LmStudioListResponse;
use crate::{LocalError, Result as LocalResult};

/// Manages access to a running LM Studio server.
pub struct LmStudioManager {
    client: Client,
    base_url: String,
}

impl LmStudioManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:1234".to_owned(),
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Check if LM Studio is running and answering requests.
    pub async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/v1/models", self.base_url))
            .send()
            .await
            .is_ok_and(|response| response.status().is_success())
    }

    /// List the models currently loaded by the server.
    ///
    /// # Errors
    ///
    /// Returns an error if LM Studio is not available or the response cannot
    /// be parsed.
    pub async fn list_models(&self) -> LocalResult<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/v1/models", self.base_url))
            .send()
            .await
            .map_err(|err| LocalError::RuntimeUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(LocalError::RuntimeUnavailable(format!(
                "LM Studio returned status {}",
                response.status()
            )));
        }

        let list: LmStudioListResponse = response.json().await?;
        Ok(list.data.into_iter().map(|model| model.id).collect())
    }
}

impl Default for LmStudioManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Chat-completion payload returned by LM Studio.
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Compute backend served by a local LM Studio server.
pub struct LmStudioProvider {
    client: Client,
    base_url: String,
    manager: LmStudioManager,
}

impl LmStudioProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:1234".to_owned(),
            manager: LmStudioManager::new(),
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: String) -> Self {
        self.base_url.clone_from(&url);
        self.manager = LmStudioManager::new().with_url(url);
        self
    }
}

impl Default for LmStudioProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelProvider for LmStudioProvider {
    fn name(&self) -> &'static str {
        "lmstudio"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        self.manager
            .list_models()
            .await
            .map_err(|err| CoreError::Provider(err.to_string()))
    }

    async fn generate(&self, query: &Query) -> Result<Response> {
        let start = Instant::now();

        // LM Studio serves whichever model is loaded; the id is advisory.
        let request_body = json!({
            "model": query.model_id.clone().unwrap_or_default(),
            "messages": [
                {
                    "role": "system",
                    "content": "You are an expert coding assistant. Provide clear, concise, and correct code solutions."
                },
                { "role": "user", "content": query.text }
            ],
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request_body)
            .send()
            .await
            .map_err(|err| CoreError::Provider(format!("LM Studio request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(CoreError::Provider(format!(
                "LM Studio returned error: {}",
                response.status()
            )));
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| CoreError::InvalidResponse(format!("LM Studio response: {err}")))?;

        let text = api_response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| CoreError::InvalidResponse("No choices from LM Studio".to_owned()))?;

        let tokens_used = api_response.usage.map_or_else(TokenUsage::default, |usage| {
            TokenUsage {
                input: usage.prompt_tokens,
                output: usage.completion_tokens,
            }
        });

        Ok(Response {
            text,
            model: api_response.model.unwrap_or_default(),
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
    fn lmstudio_manager_creation() {
        let manager = LmStudioManager::new();
        assert_eq!(manager.base_url, "http://localhost:1234");
    }

    #[test]
    fn lmstudio_provider_configured() {
        let provider = LmStudioProvider::new().with_url("http://custom:9999".to_owned());
        assert_eq!(provider.base_url, "http://custom:9999");
        assert!(provider.is_configured());
    }
}
