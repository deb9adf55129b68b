//! Lightweight reachability probes, one per backend kind.

use std::sync::Arc;
use std::time::Duration;

use crate::backends::BackendSet;
use crate::types::BackendKind;

/// Answers "is backend X reachable right now?" via each backend's cheap
/// model-listing call, bounded by a short timeout.
pub struct AvailabilityProbe {
    backends: Arc<BackendSet>,
    timeout: Duration,
}

impl AvailabilityProbe {
    #[must_use]
    pub fn new(backends: Arc<BackendSet>, timeout: Duration) -> Self {
        Self { backends, timeout }
    }

    /// Probes one backend kind.
    ///
    /// A probe succeeds iff the listing call returns successfully within
    /// the timeout. The hosted backend additionally requires its credential
    /// to be configured — without one, no network call is attempted — and
    /// at least one listable model (free models count).
    pub async fn check(&self, kind: BackendKind) -> bool {
        let provider = self.backends.for_kind(kind);

        if !provider.is_configured() {
            tracing::debug!(backend = %kind, "probe skipped: not configured");
            return false;
        }

        match tokio::time::timeout(self.timeout, provider.list_models()).await {
            Ok(Ok(models)) => match kind {
                BackendKind::Hosted => {
                    let reachable = !models.is_empty();
                    if !reachable {
                        tracing::debug!(backend = %kind, "probe failed: no models listable");
                    }
                    reachable
                }
                BackendKind::Ollama | BackendKind::LmStudio => true,
            },
            Ok(Err(error)) => {
                tracing::debug!(backend = %kind, %error, "probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(backend = %kind, timeout_ms = self.timeout.as_millis() as u64, "probe timed out");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_providers::MockProvider;

    fn probe_with_hosted(hosted: MockProvider) -> AvailabilityProbe {
        let set = BackendSet::new(
            Arc::new(MockProvider::new("ollama")),
            Arc::new(MockProvider::new("lmstudio")),
            Arc::new(hosted),
        );
        AvailabilityProbe::new(Arc::new(set), Duration::from_millis(100))
    }

    #[tokio::test]
    async fn hosted_probe_requires_credentials() {
        let probe = probe_with_hosted(MockProvider::new("hosted").without_credentials());
        assert!(!probe.check(BackendKind::Hosted).await);
    }

    #[tokio::test]
    async fn hosted_probe_requires_listable_models() {
        let probe = probe_with_hosted(MockProvider::new("hosted").with_models(Vec::new()));
        assert!(!probe.check(BackendKind::Hosted).await);

        let probe = probe_with_hosted(
            MockProvider::new("hosted").with_models(vec!["m:free".to_owned()]),
        );
        assert!(probe.check(BackendKind::Hosted).await);
    }

    #[tokio::test]
    async fn unreachable_backend_fails_probe() {
        let probe = probe_with_hosted(MockProvider::new("hosted").with_unreachable_listing());
        assert!(!probe.check(BackendKind::Hosted).await);
    }

    #[tokio::test]
    async fn local_probe_succeeds_on_any_listing() {
        let set = BackendSet::new(
            Arc::new(MockProvider::new("ollama").with_models(Vec::new())),
            Arc::new(MockProvider::new("lmstudio")),
            Arc::new(MockProvider::new("hosted")),
        );
        let probe = AvailabilityProbe::new(Arc::new(set), Duration::from_millis(100));
        assert!(probe.check(BackendKind::Ollama).await);
    }
}
