//! Routing-and-dispatch engine for coding tasks.
//!
//! Incoming tasks are scored against three compute backends (a local model
//! runtime, a free hosted tier, and a paid hosted tier), dispatched as
//! observable asynchronous jobs, and failed over to an alternate backend
//! when the chosen one is unreachable or produces no usable output.
//!
//! Every service here is explicitly constructed and takes its collaborators
//! through its constructor; there is no module-level shared state.

/// Live provider adapters, one per backend kind.
pub mod backends;
/// Collaborator contracts consumed by the router.
pub mod collaborators;
/// Routing thresholds, weights, and execution budgets.
pub mod config;
/// Backend scoring and decision making.
pub mod engine;
/// Error types and result definitions.
pub mod error;
/// Failover probing and coordination.
pub mod fallback;
/// Job bookkeeping: registry and background sweeper.
pub mod jobs;
/// Orchestration of a task submission from gate to dispatch.
pub mod router;
/// Core data types for routing decisions and jobs.
pub mod types;

pub use backends::BackendSet;
pub use collaborators::{
    CodeSearch, CostEstimator, ModelSelector, PerformanceHistory, PreferenceStore,
    StaticModelSelector, StaticPreferences, TaskDecomposer,
};
pub use config::{
    DefaultModels, EngineConfig, ExecutionConfig, RoutingConfig, SignalWeights, SweepConfig,
};
pub use engine::DecisionEngine;
pub use error::{Result, RoutingError};
pub use fallback::{AvailabilityProbe, FallbackCoordinator, FallbackOutcome};
pub use jobs::{JobRegistry, JobSweeper};
pub use router::TaskRouter;
pub use types::{
    BackendChoice, BackendKind, CancelJobResponse, CancelOutcome, Cost, CostEstimate,
    ExecutionMode, Factor, FactorName, FallbackContext, FallbackResult, Job, JobId, JobStatus,
    ModelRef, RouteOutcome, RoutingDecision, SearchMatch, Subtask, TaskBreakdown, TaskPriority,
    TaskRoutingParams, UserPreferences, WireBackend,
};
