use async_trait::async_trait;

use crate::{Query, Response, Result};

/// Trait for compute backends that can execute coding tasks.
///
/// One implementation exists per backend kind (local runtime, hosted API).
/// `list_models` doubles as the health-check call: it is cheap,
/// side-effect-free, and succeeds only when the backend is actually
/// reachable, so availability probes go through it rather than through a
/// dedicated ping endpoint.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Returns the unique identifier for this provider.
    fn name(&self) -> &'static str;

    /// Checks whether this provider is configured well enough to attempt a
    /// request. Hosted providers require a credential; local providers are
    /// always considered configured.
    ///
    /// This is a local check only. Reachability is established by
    /// [`ModelProvider::list_models`].
    fn is_configured(&self) -> bool;

    /// Lists the model identifiers currently served by this backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or answers with a
    /// non-success status.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Generates a response to the given query.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable, the request fails,
    /// or the response cannot be parsed.
    async fn generate(&self, query: &Query) -> Result<Response>;
}
