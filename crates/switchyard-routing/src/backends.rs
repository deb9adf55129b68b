//! The set of live provider adapters, one per backend kind.

use std::sync::Arc;

use switchyard_core::{ModelProvider, Result as CoreResult, SwitchyardConfig};
use switchyard_local::{LmStudioProvider, OllamaProvider};
use switchyard_providers::OpenRouterProvider;

use crate::types::{BackendChoice, BackendKind};

/// Resolves a backend kind or routing choice to a concrete provider.
///
/// Built once at startup from read-only configuration; the routing core
/// only ever borrows providers out of it.
pub struct BackendSet {
    ollama: Arc<dyn ModelProvider>,
    lmstudio: Arc<dyn ModelProvider>,
    hosted: Arc<dyn ModelProvider>,
}

impl BackendSet {
    #[must_use]
    pub fn new(
        ollama: Arc<dyn ModelProvider>,
        lmstudio: Arc<dyn ModelProvider>,
        hosted: Arc<dyn ModelProvider>,
    ) -> Self {
        Self {
            ollama,
            lmstudio,
            hosted,
        }
    }

    /// Builds the real provider set from process configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the hosted provider's credential is missing from
    /// both the config and the environment.
    pub fn from_config(config: &SwitchyardConfig) -> CoreResult<Self> {
        let ollama = OllamaProvider::new().with_url(config.endpoints.ollama_url.clone());
        let lmstudio = LmStudioProvider::new().with_url(config.endpoints.lmstudio_url.clone());
        let hosted = OpenRouterProvider::from_config_or_env(config.get_api_key("openrouter"))?;

        Ok(Self::new(
            Arc::new(ollama),
            Arc::new(lmstudio),
            Arc::new(hosted),
        ))
    }

    /// Provider for a concrete probe/execution target.
    #[must_use]
    pub fn for_kind(&self, kind: BackendKind) -> &Arc<dyn ModelProvider> {
        match kind {
            BackendKind::Ollama => &self.ollama,
            BackendKind::LmStudio => &self.lmstudio,
            BackendKind::Hosted => &self.hosted,
        }
    }

    /// Provider that serves a routing choice as the primary execution
    /// target. Local work runs on Ollama first; failover may still reach
    /// LM Studio through [`BackendSet::for_kind`].
    #[must_use]
    pub fn primary_for(&self, choice: BackendChoice) -> &Arc<dyn ModelProvider> {
        match choice {
            BackendChoice::Local => &self.ollama,
            BackendChoice::Free | BackendChoice::Paid => &self.hosted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_providers::MockProvider;

    fn mock_set() -> BackendSet {
        BackendSet::new(
            Arc::new(MockProvider::new("ollama")),
            Arc::new(MockProvider::new("lmstudio")),
            Arc::new(MockProvider::new("hosted")),
        )
    }

    #[test]
    fn kind_resolution() {
        let set = mock_set();
        assert_eq!(set.for_kind(BackendKind::Ollama).name(), "ollama");
        assert_eq!(set.for_kind(BackendKind::LmStudio).name(), "lmstudio");
        assert_eq!(set.for_kind(BackendKind::Hosted).name(), "hosted");
    }

    #[test]
    fn free_and_paid_share_the_hosted_provider() {
        let set = mock_set();
        assert_eq!(set.primary_for(BackendChoice::Free).name(), "hosted");
        assert_eq!(set.primary_for(BackendChoice::Paid).name(), "hosted");
        assert_eq!(set.primary_for(BackendChoice::Local).name(), "ollama");
    }
}
