use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a dispatched job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// What the caller wants optimized when backends conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Speed,
    Cost,
    Quality,
}

/// Immutable input to a routing decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRoutingParams {
    /// The task text to route.
    pub task: String,
    /// Estimated prompt length in tokens.
    pub context_length: u32,
    /// Estimated completion length in tokens.
    pub expected_output_length: u32,
    /// Task complexity in `[0, 1]`.
    pub complexity: f64,
    /// Caller-declared optimization priority.
    pub priority: TaskPriority,
}

impl TaskRoutingParams {
    #[must_use]
    pub fn new(task: impl Into<String>, priority: TaskPriority) -> Self {
        Self {
            task: task.into(),
            context_length: 0,
            expected_output_length: 0,
            complexity: 0.5,
            priority,
        }
    }

    #[must_use]
    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity = complexity.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_context_length(mut self, tokens: u32) -> Self {
        self.context_length = tokens;
        self
    }

    #[must_use]
    pub fn with_expected_output_length(mut self, tokens: u32) -> Self {
        self.expected_output_length = tokens;
        self
    }

    /// Total token volume the task would move through a backend.
    #[must_use]
    pub fn total_tokens(&self) -> u32 {
        self.context_length + self.expected_output_length
    }
}

/// Backend chosen by the decision engine.
///
/// `Free` is a hosted model reached through the same API surface as `Paid`
/// but at zero cost; it collapses to [`WireBackend::Paid`] at the wire level
/// while staying distinguishable for scoring and cost accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    Local,
    Free,
    Paid,
}

impl BackendChoice {
    /// The backend as external callers see it.
    #[must_use]
    pub fn wire(self) -> WireBackend {
        match self {
            Self::Local => WireBackend::Local,
            Self::Free | Self::Paid => WireBackend::Paid,
        }
    }
}

impl Display for BackendChoice {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Local => write!(f, "local"),
            Self::Free => write!(f, "free"),
            Self::Paid => write!(f, "paid"),
        }
    }
}

/// Backend identity at the wire level, as reported to callers and used when
/// picking a failover direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireBackend {
    Local,
    Paid,
}

impl Display for WireBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Local => write!(f, "local"),
            Self::Paid => write!(f, "paid"),
        }
    }
}

/// A concrete probe/execution target. The two local runtimes are separate
/// kinds because failover tries them in a fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Ollama,
    LmStudio,
    Hosted,
}

impl BackendKind {
    /// The wire-level backend this kind belongs to.
    #[must_use]
    pub fn wire(self) -> WireBackend {
        match self {
            Self::Ollama | Self::LmStudio => WireBackend::Local,
            Self::Hosted => WireBackend::Paid,
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::LmStudio => write!(f, "lmstudio"),
            Self::Hosted => write!(f, "hosted"),
        }
    }
}

/// Signals that can move a routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorName {
    Cost,
    Complexity,
    TokenVolume,
    Priority,
    ContextWindow,
    HistoricalPerformance,
}

/// Records whether and how strongly one signal moved a decision.
///
/// Purely explanatory; nothing outside the decision engine branches on it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Factor {
    /// Total score delta this signal applied, summed across backends.
    pub contribution: f64,
    /// Weight the signal carried, in `[0, 1]`.
    pub weight: f64,
    /// Whether the signal fired at all for this decision.
    pub was_applied: bool,
}

/// The decision engine's verdict for one task.
///
/// `confidence` is a heuristic strength-of-preference value: the clamped
/// separation between the winning and runner-up scores. It is not a
/// calibrated probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Chosen backend.
    pub backend: BackendChoice,
    /// Chosen model identifier.
    pub model_id: String,
    /// Score separation between winner and runner-up, clamped to `[0, 1]`.
    pub confidence: f64,
    /// Human-readable account of what drove the decision.
    pub explanation: String,
    /// Per-signal contributions, for explainability.
    pub factors: HashMap<FactorName, Factor>,
    /// Whether this decision came from the I/O-free fast path.
    pub is_preemptive: bool,
}

/// Lifecycle state of a dispatched job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Terminal states never transition out.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A tracked unit of asynchronous work.
///
/// Owned exclusively by the job registry; everything else reads clones or
/// requests mutations through the registry's operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub task: String,
    pub model: String,
    pub status: JobStatus,
    /// Completion percentage, monotonically non-decreasing while running.
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Outputs, in the order they were produced. Populated on completion.
    pub results: Vec<String>,
    /// Failure message. Populated on failure.
    pub error: Option<String>,
}

/// Everything the fallback coordinator needs to retry a failed operation.
#[derive(Debug, Clone)]
pub struct FallbackContext {
    /// Name of the failed operation, for logging.
    pub operation: String,
    /// Wire-level backend the operation originally ran against.
    pub originating_backend: WireBackend,
    /// Whether the caller permits failover at all.
    pub fallback_available: bool,
    /// Task text to re-execute. Absent for pre-flight availability checks.
    pub task: Option<String>,
    /// Model the original operation used.
    pub model_id: Option<String>,
    /// Timeout budget for the retry.
    pub timeout_ms: Option<u64>,
}

impl FallbackContext {
    #[must_use]
    pub fn new(operation: impl Into<String>, originating_backend: WireBackend) -> Self {
        Self {
            operation: operation.into(),
            originating_backend,
            fallback_available: true,
            task: None,
            model_id: None,
            timeout_ms: None,
        }
    }

    #[must_use]
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    #[must_use]
    pub fn without_fallback(mut self) -> Self {
        self.fallback_available = false;
        self
    }
}

/// Outcome of one fallback execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackResult {
    /// Backend the retry ran against.
    pub backend: WireBackend,
    /// Model that served the retry, when known.
    pub model_id: Option<String>,
    /// Whether the retry produced usable output.
    pub succeeded: bool,
    /// Output text on success.
    pub text: Option<String>,
    /// Human-readable account of what happened.
    pub message: String,
}

/// Cost of one request leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cost {
    pub prompt_cost: f64,
    pub completion_cost: f64,
    pub total: f64,
    pub currency: String,
}

impl Cost {
    /// A zero cost in USD.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            prompt_cost: 0.0,
            completion_cost: 0.0,
            total: 0.0,
            currency: "USD".to_owned(),
        }
    }
}

/// Estimated cost of a task on the local and paid backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEstimate {
    pub local: Cost,
    pub paid: Cost,
    /// The estimator's own non-binding suggestion.
    pub recommendation: String,
}

/// A model the selector can offer for a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRef {
    /// Model identifier.
    pub id: String,
    /// Maximum context window in tokens.
    pub context_window: u32,
}

/// A decomposed view of a task, produced by the optional decomposer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskBreakdown {
    pub subtasks: Vec<Subtask>,
    /// Indices into `subtasks` in execution order.
    pub execution_order: Vec<usize>,
}

/// One unit of a decomposed task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub description: String,
    pub complexity: f64,
}

/// A hit returned by the optional code-search collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMatch {
    pub snippet: String,
    pub score: f64,
    pub source: String,
}

/// How much autonomy the user grants the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Route anywhere without asking.
    FullyAutomated,
    /// Paid backends allowed, but expensive dispatches need confirmation.
    PaidWithConfirmation,
    /// Never leave the local machine.
    LocalOnly,
}

impl ExecutionMode {
    /// Whether paid backends may be used at all.
    #[must_use]
    pub fn allows_paid(self) -> bool {
        matches!(self, Self::FullyAutomated | Self::PaidWithConfirmation)
    }

    /// Whether any hosted backend (free or paid) may be used.
    #[must_use]
    pub fn allows_hosted(self) -> bool {
        !matches!(self, Self::LocalOnly)
    }
}

/// User-level routing preferences, loaded through a [`crate::PreferenceStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    pub execution_mode: ExecutionMode,
    /// Paid-cost threshold above which dispatch requires confirmation, in USD.
    pub cost_confirmation_threshold: f64,
    /// Whether to look for an existing solution before dispatching.
    pub prioritize_search_first: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            execution_mode: ExecutionMode::PaidWithConfirmation,
            cost_confirmation_threshold: 0.10,
            prioritize_search_first: false,
        }
    }
}

/// Result of a task submission.
///
/// Confirmation requests are distinguished from dispatches by variant, never
/// by parsing the explanation string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RouteOutcome {
    /// The paid estimate crossed the confirmation threshold; nothing was
    /// dispatched and no job exists.
    ConfirmationRequired {
        estimated_cost: f64,
        threshold: f64,
        message: String,
    },
    /// Code search found an existing solution; nothing was dispatched.
    ExistingSolution { matches: Vec<SearchMatch> },
    /// A job was created and execution is underway.
    Dispatched {
        backend: WireBackend,
        model: String,
        job_id: JobId,
        explanation: String,
        estimated_cost: f64,
    },
}

impl RouteOutcome {
    /// Whether this outcome asks the user to confirm before anything runs.
    #[must_use]
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, Self::ConfirmationRequired { .. })
    }
}

/// Registry-level cancellation verdict. Callers must be able to tell
/// "cancelled" apart from "could not cancel because already done".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The job was running or queued and is now cancelled.
    Cancelled,
    /// The job had already reached the given terminal state; no mutation.
    AlreadyTerminal(JobStatus),
    /// No job with that id exists.
    NotFound,
}

/// User-facing response to a cancellation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelJobResponse {
    pub success: bool,
    /// The job's status after the call, when the job exists.
    pub status: Option<JobStatus>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_collapses_to_paid_on_the_wire() {
        assert_eq!(BackendChoice::Free.wire(), WireBackend::Paid);
        assert_eq!(BackendChoice::Paid.wire(), WireBackend::Paid);
        assert_eq!(BackendChoice::Local.wire(), WireBackend::Local);
    }

    #[test]
    fn backend_kind_wire_mapping() {
        assert_eq!(BackendKind::Ollama.wire(), WireBackend::Local);
        assert_eq!(BackendKind::LmStudio.wire(), WireBackend::Local);
        assert_eq!(BackendKind::Hosted.wire(), WireBackend::Paid);
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
    }

    #[test]
    fn params_builder_clamps_complexity() {
        let params = TaskRoutingParams::new("task", TaskPriority::Quality).with_complexity(1.7);
        assert!((params.complexity - 1.0).abs() < f64::EPSILON);

        let params = TaskRoutingParams::new("task", TaskPriority::Quality)
            .with_context_length(200)
            .with_expected_output_length(100);
        assert_eq!(params.total_tokens(), 300);
    }

    #[test]
    fn execution_mode_gates() {
        assert!(ExecutionMode::FullyAutomated.allows_paid());
        assert!(ExecutionMode::PaidWithConfirmation.allows_paid());
        assert!(!ExecutionMode::LocalOnly.allows_paid());
        assert!(!ExecutionMode::LocalOnly.allows_hosted());
    }

    #[test]
    fn confirmation_flag_is_structural() {
        let outcome = RouteOutcome::ConfirmationRequired {
            estimated_cost: 0.5,
            threshold: 0.1,
            message: String::new(),
        };
        assert!(outcome.requires_confirmation());

        let dispatched = RouteOutcome::Dispatched {
            backend: WireBackend::Local,
            model: "m".to_owned(),
            job_id: JobId::new(),
            explanation: String::new(),
            estimated_cost: 0.0,
        };
        assert!(!dispatched.requires_confirmation());
    }
}
