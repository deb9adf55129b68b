//! Contracts for the external collaborators the router consumes.
//!
//! The routing core never reaches into these systems; it sees only the
//! shapes below. Each trait ships with a small static implementation so the
//! crate is usable (and testable) without wiring a real collaborator.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    BackendChoice, CostEstimate, ModelRef, SearchMatch, TaskBreakdown, UserPreferences,
};

/// Estimates what a task would cost on the local and paid backends.
#[async_trait]
pub trait CostEstimator: Send + Sync {
    /// Produces a cost estimate for the given token volumes.
    ///
    /// # Errors
    ///
    /// Returns an error if the estimate cannot be produced; this is a
    /// mandatory routing step, so the error propagates to the caller.
    async fn estimate(
        &self,
        context_length: u32,
        output_length: u32,
        model: Option<&str>,
    ) -> Result<CostEstimate>;
}

/// Picks concrete models for a backend under task constraints.
#[async_trait]
pub trait ModelSelector: Send + Sync {
    /// Best local model for the given complexity and token volume, if any
    /// qualifies.
    async fn best_local_model(&self, complexity: f64, total_tokens: u32) -> Option<ModelRef>;

    /// Best zero-cost hosted model whose context window covers the token
    /// volume, if any.
    async fn best_free_model(&self, complexity: f64, total_tokens: u32) -> Option<ModelRef>;

    /// Whether any zero-cost hosted models are currently known to exist.
    async fn has_free_models(&self) -> bool;

    /// Largest context window among currently available local models.
    async fn max_local_context_window(&self) -> Option<u32>;
}

/// Optional: breaks a task into subtasks with an execution order.
#[async_trait]
pub trait TaskDecomposer: Send + Sync {
    /// Analyzes the task text.
    ///
    /// # Errors
    ///
    /// Returns an error if analysis fails; the router logs and continues.
    async fn analyze(&self, task: &str) -> Result<TaskBreakdown>;
}

/// Optional: looks for an existing solution before anything is dispatched.
#[async_trait]
pub trait CodeSearch: Send + Sync {
    /// Searches for snippets matching the task text.
    ///
    /// # Errors
    ///
    /// Returns an error if the search fails; the router logs and continues.
    async fn search(&self, task: &str, limit: usize) -> Result<Vec<SearchMatch>>;
}

/// Loads the user's routing preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Loads the current preferences.
    ///
    /// # Errors
    ///
    /// Returns an error if preferences cannot be loaded.
    async fn load(&self) -> Result<UserPreferences>;
}

/// Optional, read-only: how well a backend has historically performed.
#[async_trait]
pub trait PerformanceHistory: Send + Sync {
    /// Score bias for a backend, positive when it has performed well.
    /// `None` when no history exists for that backend.
    async fn backend_bias(&self, backend: BackendChoice) -> Option<f64>;
}

/// Preference store backed by a fixed value.
pub struct StaticPreferences {
    preferences: UserPreferences,
}

impl StaticPreferences {
    #[must_use]
    pub fn new(preferences: UserPreferences) -> Self {
        Self { preferences }
    }
}

impl Default for StaticPreferences {
    fn default() -> Self {
        Self::new(UserPreferences::default())
    }
}

#[async_trait]
impl PreferenceStore for StaticPreferences {
    async fn load(&self) -> Result<UserPreferences> {
        Ok(self.preferences.clone())
    }
}

/// Model selector backed by fixed, priority-ordered model lists.
///
/// The first entry of each list whose context window covers the request
/// wins; complexity is not consulted beyond what the caller already encoded
/// in the list order.
pub struct StaticModelSelector {
    local: Vec<ModelRef>,
    free: Vec<ModelRef>,
}

impl StaticModelSelector {
    #[must_use]
    pub fn new(local: Vec<ModelRef>, free: Vec<ModelRef>) -> Self {
        Self { local, free }
    }

    /// A selector with no models at all: every lookup misses and the engine
    /// falls back to its configured defaults.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    fn first_fitting(models: &[ModelRef], total_tokens: u32) -> Option<ModelRef> {
        models
            .iter()
            .find(|model| model.context_window >= total_tokens)
            .cloned()
    }
}

#[async_trait]
impl ModelSelector for StaticModelSelector {
    async fn best_local_model(&self, _complexity: f64, total_tokens: u32) -> Option<ModelRef> {
        Self::first_fitting(&self.local, total_tokens)
    }

    async fn best_free_model(&self, _complexity: f64, total_tokens: u32) -> Option<ModelRef> {
        Self::first_fitting(&self.free, total_tokens)
    }

    async fn has_free_models(&self) -> bool {
        !self.free.is_empty()
    }

    async fn max_local_context_window(&self) -> Option<u32> {
        self.local.iter().map(|model| model.context_window).max()
    }
}
