//! Orchestration of a task submission: preference gating, cost-confirmation
//! admission control, optional decomposition and search, decision making,
//! job creation, and supervised asynchronous execution with failover.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt as _;

use switchyard_core::Query;

use crate::backends::BackendSet;
use crate::collaborators::{
    CodeSearch, CostEstimator, ModelSelector, PreferenceStore, TaskDecomposer,
};
use crate::config::RoutingConfig;
use crate::engine::DecisionEngine;
use crate::error::{Result, RoutingError};
use crate::fallback::FallbackCoordinator;
use crate::jobs::JobRegistry;
use crate::types::{
    BackendChoice, CancelJobResponse, CancelOutcome, FallbackContext, Job, JobId, JobStatus,
    RouteOutcome, RoutingDecision, TaskRoutingParams,
};

/// The only component whose side effects span the others.
///
/// Holds every collaborator by reference; nothing here is global.
pub struct TaskRouter {
    engine: Arc<DecisionEngine>,
    registry: Arc<JobRegistry>,
    fallback: Arc<FallbackCoordinator>,
    backends: Arc<BackendSet>,
    estimator: Arc<dyn CostEstimator>,
    selector: Arc<dyn ModelSelector>,
    preferences: Arc<dyn PreferenceStore>,
    decomposer: Option<Arc<dyn TaskDecomposer>>,
    search: Option<Arc<dyn CodeSearch>>,
    config: RoutingConfig,
}

impl TaskRouter {
    #[must_use]
    #[allow(clippy::too_many_arguments, reason = "explicit wiring beats a bag of options")]
    pub fn new(
        engine: Arc<DecisionEngine>,
        registry: Arc<JobRegistry>,
        fallback: Arc<FallbackCoordinator>,
        backends: Arc<BackendSet>,
        estimator: Arc<dyn CostEstimator>,
        selector: Arc<dyn ModelSelector>,
        preferences: Arc<dyn PreferenceStore>,
        config: RoutingConfig,
    ) -> Self {
        Self {
            engine,
            registry,
            fallback,
            backends,
            estimator,
            selector,
            preferences,
            decomposer: None,
            search: None,
            config,
        }
    }

    /// Attaches the optional task decomposer.
    #[must_use]
    pub fn with_decomposer(mut self, decomposer: Arc<dyn TaskDecomposer>) -> Self {
        self.decomposer = Some(decomposer);
        self
    }

    /// Attaches the optional code-search collaborator.
    #[must_use]
    pub fn with_search(mut self, search: Arc<dyn CodeSearch>) -> Self {
        self.search = Some(search);
        self
    }

    /// Routes one task: admission gate, optional short-circuits, decision,
    /// job creation, and fire-and-forget execution.
    ///
    /// Returns as soon as the job exists; callers poll
    /// [`TaskRouter::get_job`] or [`TaskRouter::list_active_jobs`] for
    /// completion.
    ///
    /// # Errors
    ///
    /// Propagates preference-store, cost-estimator, and decision-engine
    /// failures. Optional-step failures (decomposition, search) are logged
    /// and swallowed.
    pub async fn route_task(&self, params: TaskRoutingParams) -> Result<RouteOutcome> {
        let preferences = self.preferences.load().await?;

        // Keep the engine's fast-path flag current before deciding.
        self.engine
            .set_free_available(self.selector.has_free_models().await);

        // Admission control: expensive paid dispatches need explicit
        // confirmation. This is not a routing decision and no job exists.
        let estimate = self
            .estimator
            .estimate(params.context_length, params.expected_output_length, None)
            .await?;
        let paid_cost = estimate.paid.total;
        if preferences.execution_mode.allows_paid()
            && paid_cost > preferences.cost_confirmation_threshold
        {
            tracing::info!(
                paid_cost,
                threshold = preferences.cost_confirmation_threshold,
                "paid estimate above threshold, confirmation required"
            );
            return Ok(RouteOutcome::ConfirmationRequired {
                estimated_cost: paid_cost,
                threshold: preferences.cost_confirmation_threshold,
                message: format!(
                    "estimated paid cost ${paid_cost:.4} exceeds the ${:.4} confirmation threshold",
                    preferences.cost_confirmation_threshold
                ),
            });
        }

        // Optional decomposition: informative only, never blocks routing.
        let mut subtask_count = 0;
        if preferences.execution_mode.allows_hosted() {
            if let Some(decomposer) = &self.decomposer {
                match decomposer.analyze(&params.task).await {
                    Ok(breakdown) => subtask_count = breakdown.subtasks.len(),
                    Err(error) => {
                        tracing::warn!(%error, "task decomposition failed, continuing");
                    }
                }
            }
        }

        // Optional search-first short-circuit.
        if subtask_count == 0 && preferences.prioritize_search_first {
            if let Some(search) = &self.search {
                match search.search(&params.task, 5).await {
                    Ok(matches) if !matches.is_empty() => {
                        tracing::info!(hits = matches.len(), "existing solution found, no dispatch");
                        return Ok(RouteOutcome::ExistingSolution { matches });
                    }
                    Ok(_) => {}
                    Err(error) => tracing::warn!(%error, "code search failed, continuing"),
                }
            }
        }

        let decision = self.engine.route_task(&params).await?;
        tracing::info!(
            backend = %decision.backend,
            model = %decision.model_id,
            confidence = decision.confidence,
            "routing decision made"
        );

        let job_id = JobId::new();
        self.registry
            .create_job(job_id, &params.task, &decision.model_id)?;

        let chosen_cost = match decision.backend {
            BackendChoice::Local => estimate.local.total,
            BackendChoice::Free => 0.0,
            BackendChoice::Paid => paid_cost,
        };

        self.spawn_execution(job_id, params.task.clone(), decision.clone());

        Ok(RouteOutcome::Dispatched {
            backend: decision.backend.wire(),
            model: decision.model_id,
            job_id,
            explanation: decision.explanation,
            estimated_cost: chosen_cost,
        })
    }

    /// The I/O-free heuristic path; no job is created.
    #[must_use]
    pub fn preemptive_route(&self, params: &TaskRoutingParams) -> RoutingDecision {
        self.engine.preemptive_route(params)
    }

    /// Cooperatively cancels a job. The registry transition is immediate;
    /// the execution unit observes it when it next reports.
    #[must_use]
    pub fn cancel_job(&self, id: JobId) -> CancelJobResponse {
        match self.registry.cancel(id) {
            CancelOutcome::Cancelled => CancelJobResponse {
                success: true,
                status: Some(JobStatus::Cancelled),
                message: format!("job {id} cancelled"),
            },
            CancelOutcome::AlreadyTerminal(status) => CancelJobResponse {
                success: false,
                status: Some(status),
                message: format!("job {id} already {status}"),
            },
            CancelOutcome::NotFound => CancelJobResponse {
                success: false,
                status: None,
                message: format!("job {id} not found"),
            },
        }
    }

    /// Snapshot of one job.
    #[must_use]
    pub fn get_job(&self, id: JobId) -> Option<Job> {
        self.registry.get(id)
    }

    /// Snapshot of all jobs still queued or running.
    #[must_use]
    pub fn list_active_jobs(&self) -> Vec<Job> {
        self.registry.list_active()
    }

    /// Launches the supervised execution unit for a freshly created job.
    ///
    /// The unit owns the job's forward progress: every exit path lands in
    /// `complete` or `fail`, and a panic inside the unit is caught and
    /// converted to `fail`, so no job is ever stranded `InProgress`.
    fn spawn_execution(&self, job_id: JobId, task: String, decision: RoutingDecision) {
        let registry = Arc::clone(&self.registry);
        let fallback = Arc::clone(&self.fallback);
        let backends = Arc::clone(&self.backends);
        let timeout = Duration::from_millis(self.config.execution.task_timeout_ms);

        tokio::spawn(async move {
            let supervised = std::panic::AssertUnwindSafe(run_job(
                Arc::clone(&registry),
                fallback,
                backends,
                job_id,
                task,
                decision,
                timeout,
            ))
            .catch_unwind()
            .await;

            if supervised.is_err() {
                tracing::error!(%job_id, "execution unit panicked");
                registry.fail(job_id, "execution unit panicked");
            }
        });
    }
}

/// One job's execution: primary attempt, then failover, then a terminal
/// registry transition.
async fn run_job(
    registry: Arc<JobRegistry>,
    fallback: Arc<FallbackCoordinator>,
    backends: Arc<BackendSet>,
    job_id: JobId,
    task: String,
    decision: RoutingDecision,
    timeout: Duration,
) {
    registry.update_progress(job_id, 10, None);

    let provider = backends.primary_for(decision.backend);
    let query = Query::new(task.clone()).with_model(decision.model_id.clone());

    let primary = match tokio::time::timeout(timeout, provider.generate(&query)).await {
        Err(_) => Err(RoutingError::Timeout(timeout.as_millis() as u64)),
        Ok(Err(error)) => Err(RoutingError::from(error)),
        Ok(Ok(response)) if response.text.trim().is_empty() => Err(RoutingError::ExecutionFailed(
            "backend produced no usable output".to_owned(),
        )),
        Ok(Ok(response)) => Ok(response),
    };

    match primary {
        Ok(response) => {
            registry.complete(job_id, vec![response.text]);
        }
        Err(error) => {
            let context = FallbackContext::new("task-execution", decision.backend.wire())
                .with_task(task)
                .with_model(decision.model_id)
                .with_timeout_ms(timeout.as_millis() as u64);

            let outcome = fallback.handle_error(&error, &context).await;

            let fallback_text = outcome
                .result
                .and_then(|result| result.text)
                .filter(|_| outcome.succeeded);
            match fallback_text {
                Some(text) => registry.complete(job_id, vec![text]),
                None if outcome.fallback_used => registry.fail(
                    job_id,
                    &format!("primary backend failed: {error}; fallback also failed"),
                ),
                None => registry.fail(
                    job_id,
                    &format!("primary backend failed: {error}; no fallback available"),
                ),
            }
        }
    }
}
