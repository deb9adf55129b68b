use serde::{Deserialize, Serialize};

/// Ollama API response for model list
#[derive(Debug, Deserialize)]
pub struct OllamaListResponse {
    /// List of models installed in Ollama.
    pub models: Vec<OllamaModel>,
}

/// Information about an Ollama model returned from the API.
#[derive(Debug, Deserialize)]
pub struct OllamaModel {
    /// Model identifier.
    pub name: String,
    /// Size of the model in bytes.
    #[serde(default)]
    pub size: u64,
    /// Content digest for the model.
    #[serde(default)]
    pub digest: String,
}

/// Ollama API request for generation
#[derive(Debug, Serialize)]
pub struct OllamaGenerateRequest {
    /// Model to use for generation.
    pub model: String,
    /// Input prompt for the model.
    pub prompt: String,
    /// Optional system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Sampling temperature (0.0 to 1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Whether to stream the response.
    pub stream: bool,
}

/// Ollama API response for generation
#[derive(Debug, Deserialize)]
pub struct OllamaGenerateResponse {
    /// Model that generated the response.
    pub model: String,
    /// Generated text content.
    pub response: String,
    /// Whether generation is complete.
    pub done: bool,
    /// Number of tokens in the prompt.
    #[serde(default)]
    pub prompt_eval_count: usize,
    /// Number of tokens generated.
    #[serde(default)]
    pub eval_count: usize,
}

/// LM Studio model list, OpenAI-compatible shape.
#[derive(Debug, Deserialize)]
pub struct LmStudioListResponse {
    /// Models currently loaded by the server.
    pub data: Vec<LmStudioModel>,
}

/// A single LM Studio model entry.
#[derive(Debug, Deserialize)]
pub struct LmStudioModel {
    /// Model identifier.
    pub id: String,
}
