//! Local compute backends: Ollama and LM Studio.
//!
//! Both runtimes expose a cheap model-listing endpoint that doubles as the
//! health check used by availability probes.

pub mod error;
pub mod inference;
pub mod lmstudio;
pub mod manager;
pub mod models;

pub use error::{LocalError, Result};
pub use inference::OllamaProvider;
pub use lmstudio::{LmStudioManager, LmStudioProvider};
pub use manager::OllamaManager;
pub use models::{OllamaGenerateRequest, OllamaGenerateResponse, OllamaModel};
