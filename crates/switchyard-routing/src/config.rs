//! Configuration for scoring thresholds, execution budgets, and sweeping.

use serde::{Deserialize, Serialize};

/// Complete routing configuration.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Decision-engine thresholds and weights
    pub engine: EngineConfig,
    /// Execution and probing budgets
    pub execution: ExecutionConfig,
    /// Terminal-job sweep cadence and retention
    pub sweep: SweepConfig,
    /// Fallback model identifiers per backend
    pub models: DefaultModels,
}

/// Decision-engine thresholds and weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Complexity at or above which a task counts as complex
    pub complex_threshold: f64,
    /// Complexity at or above which a task counts as medium
    pub medium_threshold: f64,
    /// Complexity at or below which a task counts as simple
    pub simple_threshold: f64,
    /// Total tokens below which a task counts as small
    pub tokens_small: u32,
    /// Total tokens above which a task counts as large
    pub tokens_large: u32,
    /// Fast-path confidence at or above which the full path is skipped
    pub confidence_short_circuit: f64,
    /// Per-signal weights
    pub weights: SignalWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            complex_threshold: 0.7,
            medium_threshold: 0.4,
            simple_threshold: 0.2,
            tokens_small: 1_500,
            tokens_large: 8_000,
            confidence_short_circuit: 0.7,
            weights: SignalWeights::default(),
        }
    }
}

/// Weight applied to each scoring signal, each in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalWeights {
    pub cost: f64,
    pub complexity: f64,
    pub token_volume: f64,
    pub priority: f64,
    pub context_window: f64,
    pub history: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            cost: 1.0,
            complexity: 1.0,
            token_volume: 1.0,
            priority: 1.0,
            context_window: 1.0,
            history: 0.5,
        }
    }
}

/// Execution and probing budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Timeout for a single backend invocation, primary or fallback
    pub task_timeout_ms: u64,
    /// Timeout for one availability probe
    pub health_check_timeout_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            task_timeout_ms: 60_000,
            health_check_timeout_ms: 5_000,
        }
    }
}

/// Terminal-job sweep cadence and retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Seconds between sweep passes
    pub cadence_secs: u64,
    /// Seconds a terminal job is kept before eviction
    pub retention_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            cadence_secs: 3_600,
            retention_secs: 3_600,
        }
    }
}

/// Model identifiers used when the selector offers nothing better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultModels {
    /// Default local model
    pub local: String,
    /// Paid model for complex tasks
    pub paid_premium: String,
    /// Paid model for everything else
    pub paid_standard: String,
    /// Default free hosted model
    pub free: String,
}

impl Default for DefaultModels {
    fn default() -> Self {
        Self {
            local: "qwen2.5-coder:7b".to_owned(),
            paid_premium: "gpt-4o".to_owned(),
            paid_standard: "gpt-4o-mini".to_owned(),
            free: "meta-llama/llama-3.1-8b-instruct:free".to_owned(),
        }
    }
}
