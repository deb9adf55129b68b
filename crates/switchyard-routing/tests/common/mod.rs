//! Shared fakes and wiring helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use switchyard_providers::MockProvider;
use switchyard_routing::{
    BackendSet, CodeSearch, CostEstimator, Cost, CostEstimate, DecisionEngine,
    FallbackCoordinator, JobRegistry, JobStatus, ModelRef, ModelSelector, Result, RoutingConfig,
    RoutingError, SearchMatch, StaticModelSelector, StaticPreferences, TaskBreakdown, TaskDecomposer,
    TaskRouter, UserPreferences, JobId,
};

/// Estimator returning fixed totals.
pub struct FixedEstimator {
    pub local_total: f64,
    pub paid_total: f64,
}

#[async_trait]
impl CostEstimator for FixedEstimator {
    async fn estimate(
        &self,
        _context_length: u32,
        _output_length: u32,
        _model: Option<&str>,
    ) -> Result<CostEstimate> {
        Ok(CostEstimate {
            local: Cost {
                total: self.local_total,
                ..Cost::zero()
            },
            paid: Cost {
                total: self.paid_total,
                ..Cost::zero()
            },
            recommendation: String::new(),
        })
    }
}

/// Search collaborator returning fixed hits.
pub struct FixedSearch {
    pub hits: Vec<SearchMatch>,
}

#[async_trait]
impl CodeSearch for FixedSearch {
    async fn search(&self, _task: &str, _limit: usize) -> Result<Vec<SearchMatch>> {
        Ok(self.hits.clone())
    }
}

/// Decomposer that always errors, for exercising the log-and-continue path.
pub struct BrokenDecomposer;

#[async_trait]
impl TaskDecomposer for BrokenDecomposer {
    async fn analyze(&self, _task: &str) -> Result<TaskBreakdown> {
        Err(RoutingError::Other("decomposer offline".to_owned()))
    }
}

/// Everything a router test needs to observe and drive the system.
pub struct Harness {
    pub router: TaskRouter,
    pub registry: Arc<JobRegistry>,
}

/// Builds a fully wired router over mock providers.
///
/// Timeouts are kept short so failure paths resolve quickly under test.
pub fn build_harness(
    ollama: MockProvider,
    lmstudio: MockProvider,
    hosted: MockProvider,
    estimator: FixedEstimator,
    selector: StaticModelSelector,
    preferences: UserPreferences,
) -> Harness {
    let mut config = RoutingConfig::default();
    config.execution.task_timeout_ms = 500;
    config.execution.health_check_timeout_ms = 100;

    let backends = Arc::new(BackendSet::new(
        Arc::new(ollama),
        Arc::new(lmstudio),
        Arc::new(hosted),
    ));
    let selector: Arc<dyn ModelSelector> = Arc::new(selector);
    let estimator: Arc<dyn CostEstimator> = Arc::new(estimator);

    let engine = Arc::new(DecisionEngine::new(
        Arc::clone(&selector),
        Arc::clone(&estimator),
        &config,
    ));
    let registry = Arc::new(JobRegistry::new());
    let fallback = Arc::new(FallbackCoordinator::new(
        Arc::clone(&backends),
        &config.execution,
    ));

    let router = TaskRouter::new(
        engine,
        Arc::clone(&registry),
        fallback,
        backends,
        estimator,
        selector,
        Arc::new(StaticPreferences::new(preferences)),
        config,
    );

    Harness { router, registry }
}

/// Selector with one local and one free model, both roomy.
pub fn roomy_selector() -> StaticModelSelector {
    StaticModelSelector::new(
        vec![ModelRef {
            id: "qwen2.5-coder:7b".to_owned(),
            context_window: 32_768,
        }],
        vec![ModelRef {
            id: "meta-llama/llama-3.1-8b-instruct:free".to_owned(),
            context_window: 8_192,
        }],
    )
}

/// Polls the registry until the job reaches a terminal state.
///
/// # Panics
///
/// Panics if the job never terminates within the deadline — that is exactly
/// the "stranded `InProgress`" defect the router must rule out.
pub async fn wait_for_terminal(registry: &JobRegistry, id: JobId) -> JobStatus {
    let deadline = Duration::from_secs(5);
    let started = std::time::Instant::now();

    loop {
        if let Some(job) = registry.get(id) {
            if job.status.is_terminal() {
                return job.status;
            }
        } else {
            panic!("job {id} disappeared while awaited");
        }

        assert!(
            started.elapsed() < deadline,
            "job {id} never reached a terminal state"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
