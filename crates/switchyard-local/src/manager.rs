use crate::models::{OllamaListResponse, OllamaModel};
use crate::{LocalError, Result};
use reqwest::Client;

/// Manages access to a running Ollama instance.
pub struct OllamaManager {
    /// HTTP client used to interact with the Ollama service.
    client: Client,
    /// Base URL pointing to the Ollama runtime.
    base_url: String,
}

impl OllamaManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:11434".to_owned(),
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Base URL this manager talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if Ollama is running and answering requests.
    pub async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .is_ok_and(|response| response.status().is_success())
    }

    /// List installed models.
    ///
    /// # Errors
    ///
    /// Returns an error if Ollama is not available or if the response cannot
    /// be parsed.
    pub async fn list_models(&self) -> Result<Vec<OllamaModel>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|err| LocalError::RuntimeUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(LocalError::RuntimeUnavailable(format!(
                "Ollama returned status {}",
                response.status()
            )));
        }

        let list: OllamaListResponse = response.json().await?;
        Ok(list.models)
    }

    /// Check if a specific model is installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the model list cannot be retrieved.
    pub async fn has_model(&self, model_name: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models
            .iter()
            .any(|model| model.name.starts_with(model_name)))
    }
}

impl Default for OllamaManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_manager_creation() {
        let manager = OllamaManager::new();
        assert_eq!(manager.base_url, "http://localhost:11434");
    }

    #[test]
    fn custom_url() {
        let manager = OllamaManager::new().with_url("http://custom:8080".to_owned());
        assert_eq!(manager.base_url, "http://custom:8080");
    }
}
