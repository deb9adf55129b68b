//! The decision engine: turns task parameters and external signals into a
//! [`RoutingDecision`].
//!
//! Two entry points share one scoring vocabulary. The fast path is
//! synchronous and I/O-free; the full path re-evaluates with a real cost
//! estimate when the fast path is not decisive.

mod scores;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::collaborators::{CostEstimator, ModelSelector, PerformanceHistory};
use crate::config::{DefaultModels, EngineConfig, RoutingConfig};
use crate::error::Result;
use crate::types::{
    BackendChoice, CostEstimate, FactorName, ModelRef, RoutingDecision, TaskPriority,
    TaskRoutingParams,
};
use scores::{ScoreBoard, Target};

/// Cap on the contribution the real cost-ratio signal may apply.
const COST_RATIO_CAP: f64 = 0.3;
/// Score delta applied when a task cannot fit any local context window.
const CONTEXT_WINDOW_PENALTY: f64 = 0.4;

/// Scores backends and selects models for incoming tasks.
///
/// Explicitly constructed; all collaborators arrive through the
/// constructor, so the engine is trivially testable with fakes.
pub struct DecisionEngine {
    selector: Arc<dyn ModelSelector>,
    estimator: Arc<dyn CostEstimator>,
    history: Option<Arc<dyn PerformanceHistory>>,
    config: EngineConfig,
    models: DefaultModels,
    /// Cached "free backends currently exist" flag, refreshed by the router.
    /// The fast path's only external input.
    free_available: AtomicBool,
}

impl DecisionEngine {
    #[must_use]
    pub fn new(
        selector: Arc<dyn ModelSelector>,
        estimator: Arc<dyn CostEstimator>,
        config: &RoutingConfig,
    ) -> Self {
        Self {
            selector,
            estimator,
            history: None,
            config: config.engine.clone(),
            models: config.models.clone(),
            free_available: AtomicBool::new(false),
        }
    }

    /// Attaches a read-only performance-history signal.
    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn PerformanceHistory>) -> Self {
        self.history = Some(history);
        self
    }

    /// Updates the cached free-backend-existence flag.
    pub fn set_free_available(&self, available: bool) {
        self.free_available.store(available, Ordering::Relaxed);
    }

    /// Reads the cached free-backend-existence flag.
    pub fn free_available(&self) -> bool {
        self.free_available.load(Ordering::Relaxed)
    }

    /// Fast heuristic routing: deterministic, synchronous, and side-effect
    /// free apart from one read of the cached free-backend flag.
    pub fn preemptive_route(&self, params: &TaskRoutingParams) -> RoutingDecision {
        let mut board = ScoreBoard::new(self.free_available());

        self.apply_complexity(&mut board, params);
        self.apply_token_volume(&mut board, params);
        self.apply_priority(&mut board, params);
        // Full-path-only signals, recorded as considered-but-unused.
        board.skip(FactorName::Cost, self.config.weights.cost);
        board.skip(FactorName::ContextWindow, self.config.weights.context_window);
        board.skip(
            FactorName::HistoricalPerformance,
            self.config.weights.history,
        );

        let (choice, confidence) = board.winner();
        if choice == BackendChoice::Free {
            board.note("zero-cost free hosted model fits this task");
        }
        let model_id = self.default_model_for(choice, params.complexity);
        let explanation = board.explanation(choice);

        RoutingDecision {
            backend: choice,
            model_id,
            confidence,
            explanation,
            factors: board.into_factors(),
            is_preemptive: true,
        }
    }

    /// Full routing: runs the fast path first and trusts it when decisive;
    /// otherwise re-scores with a real cost estimate, a context-window
    /// feasibility check, and any historical-performance bias.
    ///
    /// # Errors
    ///
    /// Propagates cost-estimator failures unchanged; never errors for
    /// "no model found".
    pub async fn route_task(&self, params: &TaskRoutingParams) -> Result<RoutingDecision> {
        let fast = self.preemptive_route(params);
        if fast.confidence >= self.config.confidence_short_circuit {
            tracing::debug!(
                confidence = fast.confidence,
                backend = %fast.backend,
                "fast path decisive, skipping full evaluation"
            );
            return Ok(fast);
        }

        tracing::debug!(
            confidence = fast.confidence,
            "fast path inconclusive, running full evaluation"
        );

        let estimate = self
            .estimator
            .estimate(params.context_length, params.expected_output_length, None)
            .await?;

        let free_ref = self
            .selector
            .best_free_model(params.complexity, params.total_tokens())
            .await;
        let free_eligible = self.free_available() && free_ref.is_some();

        let mut board = ScoreBoard::new(free_eligible);
        self.apply_complexity(&mut board, params);
        self.apply_priority(&mut board, params);
        // The real cost ratio replaces the token-volume heuristic.
        board.skip(FactorName::TokenVolume, self.config.weights.token_volume);
        self.apply_cost_ratio(&mut board, &estimate);
        self.apply_context_window(&mut board, params).await;
        self.apply_history(&mut board).await;

        let (choice, confidence) = board.winner();
        if choice == BackendChoice::Free {
            board.note("zero-cost free hosted model fits this task");
        }
        let model_id = self.select_model(choice, params, free_ref).await;
        let explanation = board.explanation(choice);

        Ok(RoutingDecision {
            backend: choice,
            model_id,
            confidence,
            explanation,
            factors: board.into_factors(),
            is_preemptive: false,
        })
    }

    fn apply_complexity(&self, board: &mut ScoreBoard, params: &TaskRoutingParams) {
        let weight = self.config.weights.complexity;
        let complexity = params.complexity;

        if complexity >= self.config.complex_threshold {
            board.apply(FactorName::Complexity, weight, 0.3, &[Target::Paid]);
            board.note(format!("complex task ({complexity:.2}) favors paid"));
        } else if complexity >= self.config.medium_threshold {
            board.apply(
                FactorName::Complexity,
                weight,
                0.15,
                &[Target::Paid, Target::Free],
            );
            board.note(format!("medium complexity ({complexity:.2})"));
        } else if complexity <= self.config.simple_threshold {
            board.apply(
                FactorName::Complexity,
                weight,
                0.3,
                &[Target::Local, Target::Free],
            );
            board.note(format!("simple task ({complexity:.2}) suits local models"));
        } else {
            board.skip(FactorName::Complexity, weight);
        }
    }

    fn apply_token_volume(&self, board: &mut ScoreBoard, params: &TaskRoutingParams) {
        let weight = self.config.weights.token_volume;
        let total = params.total_tokens();

        if total >= self.config.tokens_large {
            board.apply(
                FactorName::TokenVolume,
                weight,
                0.2,
                &[Target::Paid, Target::Free],
            );
            board.note(format!("large token volume ({total})"));
        } else if total <= self.config.tokens_small {
            board.apply(
                FactorName::TokenVolume,
                weight,
                0.2,
                &[Target::Local, Target::Free],
            );
            board.note(format!("small token volume ({total})"));
        } else {
            board.skip(FactorName::TokenVolume, weight);
        }
    }

    fn apply_priority(&self, board: &mut ScoreBoard, params: &TaskRoutingParams) {
        let weight = self.config.weights.priority;

        match params.priority {
            TaskPriority::Speed => {
                board.apply(FactorName::Priority, weight, 0.25, &[Target::Paid]);
                board.note("speed priority favors paid");
            }
            TaskPriority::Cost => {
                board.apply(FactorName::Priority, weight, 0.25, &[Target::Local]);
                board.apply(FactorName::Priority, weight, 0.35, &[Target::Free]);
                board.note("cost priority favors local and free");
            }
            TaskPriority::Quality => {
                // Quality matters less when the task is not actually hard.
                let magnitude = if params.complexity >= self.config.complex_threshold {
                    0.25
                } else {
                    0.15
                };
                board.apply(FactorName::Priority, weight, magnitude, &[Target::Paid]);
                board.note("quality priority favors paid");
            }
        }
    }

    fn apply_cost_ratio(&self, board: &mut ScoreBoard, estimate: &CostEstimate) {
        let weight = self.config.weights.cost;
        let local = estimate.local.total;
        let paid = estimate.paid.total;

        if local <= f64::EPSILON && paid <= f64::EPSILON {
            board.skip(FactorName::Cost, weight);
            return;
        }

        let magnitude = if local <= f64::EPSILON {
            // Local inference is free while paid costs something real.
            COST_RATIO_CAP
        } else {
            ((paid / local).ln() / 10.0).clamp(-COST_RATIO_CAP, COST_RATIO_CAP)
        };

        if magnitude >= 0.0 {
            board.apply(
                FactorName::Cost,
                weight,
                magnitude,
                &[Target::Local, Target::Free],
            );
            board.note(format!(
                "paid estimate ${paid:.4} vs local ${local:.4}"
            ));
        } else {
            board.apply(FactorName::Cost, weight, -magnitude, &[Target::Paid]);
            board.note(format!(
                "paid estimate ${paid:.4} undercuts local ${local:.4}"
            ));
        }
    }

    async fn apply_context_window(&self, board: &mut ScoreBoard, params: &TaskRoutingParams) {
        let weight = self.config.weights.context_window;
        let total = params.total_tokens();

        match self.selector.max_local_context_window().await {
            Some(max_window) if total > max_window => {
                // A feasibility veto expressed as a score delta so the
                // decision stays explainable.
                board.apply(
                    FactorName::ContextWindow,
                    weight,
                    CONTEXT_WINDOW_PENALTY,
                    &[Target::Paid, Target::Free],
                );
                board.note(format!(
                    "task exceeds local context window ({total} > {max_window} tokens)"
                ));
            }
            _ => board.skip(FactorName::ContextWindow, weight),
        }
    }

    async fn apply_history(&self, board: &mut ScoreBoard) {
        let weight = self.config.weights.history;
        board.skip(FactorName::HistoricalPerformance, weight);

        let Some(history) = &self.history else {
            return;
        };

        let backends = [
            (BackendChoice::Local, Target::Local),
            (BackendChoice::Paid, Target::Paid),
            (BackendChoice::Free, Target::Free),
        ];
        for (backend, target) in backends {
            if let Some(bias) = history.backend_bias(backend).await {
                board.apply(FactorName::HistoricalPerformance, weight, bias, &[target]);
            }
        }
    }

    /// Model for a fast-path decision: configured defaults only, no
    /// selector calls.
    fn default_model_for(&self, choice: BackendChoice, complexity: f64) -> String {
        match choice {
            BackendChoice::Local => self.models.local.clone(),
            BackendChoice::Free => self.models.free.clone(),
            BackendChoice::Paid => {
                if complexity >= self.config.complex_threshold {
                    self.models.paid_premium.clone()
                } else {
                    self.models.paid_standard.clone()
                }
            }
        }
    }

    /// Model for a full-path decision: ask the selector, fall back to the
    /// configured defaults. Never fails.
    async fn select_model(
        &self,
        choice: BackendChoice,
        params: &TaskRoutingParams,
        free_ref: Option<ModelRef>,
    ) -> String {
        match choice {
            BackendChoice::Local => self
                .selector
                .best_local_model(params.complexity, params.total_tokens())
                .await
                .map_or_else(|| self.models.local.clone(), |model| model.id),
            BackendChoice::Free => {
                free_ref.map_or_else(|| self.models.free.clone(), |model| model.id)
            }
            BackendChoice::Paid => self.default_model_for(choice, params.complexity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    use crate::collaborators::StaticModelSelector;
    use crate::types::Cost;

    /// Estimator returning a fixed estimate and counting calls.
    struct FixedEstimator {
        local_total: f64,
        paid_total: f64,
        calls: AtomicUsize,
    }

    impl FixedEstimator {
        fn new(local_total: f64, paid_total: f64) -> Self {
            Self {
                local_total,
                paid_total,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CostEstimator for FixedEstimator {
        async fn estimate(
            &self,
            _context_length: u32,
            _output_length: u32,
            _model: Option<&str>,
        ) -> Result<CostEstimate> {
            self.calls.fetch_add(1, Ordering::SeqCst);
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

    fn engine_with(
        selector: StaticModelSelector,
        estimator: Arc<FixedEstimator>,
    ) -> DecisionEngine {
        DecisionEngine::new(Arc::new(selector), estimator, &RoutingConfig::default())
    }

    fn free_selector() -> StaticModelSelector {
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

    #[test]
    fn simple_cost_tasks_never_route_paid() {
        let engine = engine_with(free_selector(), Arc::new(FixedEstimator::new(0.0, 0.1)));
        engine.set_free_available(true);

        for complexity in [0.0, 0.05, 0.1, 0.15, 0.2] {
            let params = TaskRoutingParams::new("tidy imports", TaskPriority::Cost)
                .with_complexity(complexity)
                .with_context_length(500)
                .with_expected_output_length(200);
            let decision = engine.preemptive_route(&params);
            assert_ne!(
                decision.backend,
                BackendChoice::Paid,
                "complexity {complexity} routed paid"
            );
        }
    }

    #[test]
    fn speed_priority_always_pushes_paid() {
        let engine = engine_with(free_selector(), Arc::new(FixedEstimator::new(0.0, 0.1)));

        for complexity in [0.1, 0.3, 0.5, 0.8] {
            let params = TaskRoutingParams::new("urgent fix", TaskPriority::Speed)
                .with_complexity(complexity)
                .with_context_length(3_000)
                .with_expected_output_length(1_000);
            let decision = engine.preemptive_route(&params);
            let priority = &decision.factors[&FactorName::Priority];
            assert!(priority.was_applied);
            assert!(priority.contribution > 0.0);
        }
    }

    #[test]
    fn confidence_always_in_unit_interval() {
        let engine = engine_with(free_selector(), Arc::new(FixedEstimator::new(0.0, 0.1)));
        engine.set_free_available(true);

        for complexity in [0.0, 0.3, 0.6, 0.9] {
            for tokens in [100_u32, 5_000, 50_000] {
                for priority in [TaskPriority::Speed, TaskPriority::Cost, TaskPriority::Quality] {
                    let params = TaskRoutingParams::new("task", priority)
                        .with_complexity(complexity)
                        .with_context_length(tokens);
                    let decision = engine.preemptive_route(&params);
                    assert!(
                        (0.0..=1.0).contains(&decision.confidence),
                        "confidence {} out of range",
                        decision.confidence
                    );
                }
            }
        }
    }

    #[tokio::test]
    async fn decisive_fast_path_skips_estimator() {
        let estimator = Arc::new(FixedEstimator::new(0.0, 0.5));
        let engine = engine_with(StaticModelSelector::empty(), Arc::clone(&estimator));

        // Simple, cheap, cost-driven: the fast path is decisive.
        let params = TaskRoutingParams::new("rename a variable", TaskPriority::Cost)
            .with_complexity(0.1)
            .with_context_length(200)
            .with_expected_output_length(100);

        let decision = engine
            .route_task(&params)
            .await
            .unwrap_or_else(|error| panic!("route_task failed: {error}"));
        assert!(decision.is_preemptive);
        assert_eq!(estimator.call_count(), 0);
    }

    #[tokio::test]
    async fn inconclusive_fast_path_invokes_estimator() {
        let estimator = Arc::new(FixedEstimator::new(0.001, 0.25));
        let engine = engine_with(StaticModelSelector::empty(), Arc::clone(&estimator));

        // Mid-band everything: no heuristic fires strongly.
        let params = TaskRoutingParams::new("refactor module", TaskPriority::Quality)
            .with_complexity(0.3)
            .with_context_length(3_000)
            .with_expected_output_length(1_000);

        let decision = engine
            .route_task(&params)
            .await
            .unwrap_or_else(|error| panic!("route_task failed: {error}"));
        assert!(!decision.is_preemptive);
        assert_eq!(estimator.call_count(), 1);
        assert!(decision.factors[&FactorName::Cost].was_applied);
    }

    #[test]
    fn scenario_local_when_no_free_backends() {
        let engine = engine_with(StaticModelSelector::empty(), Arc::new(FixedEstimator::new(0.0, 0.1)));

        let params = TaskRoutingParams::new("small cheap task", TaskPriority::Cost)
            .with_complexity(0.1)
            .with_context_length(200)
            .with_expected_output_length(100);

        let decision = engine.preemptive_route(&params);
        assert_eq!(decision.backend, BackendChoice::Local);
        assert_eq!(decision.model_id, "qwen2.5-coder:7b");
    }

    #[test]
    fn scenario_free_model_when_available() {
        let engine = engine_with(free_selector(), Arc::new(FixedEstimator::new(0.0, 0.1)));
        engine.set_free_available(true);

        let params = TaskRoutingParams::new("small cheap task", TaskPriority::Cost)
            .with_complexity(0.1)
            .with_context_length(200)
            .with_expected_output_length(100);

        let decision = engine.preemptive_route(&params);
        assert_eq!(decision.backend, BackendChoice::Free);
        // Surfaced as the paid wire backend, with a free model id.
        assert_eq!(decision.backend.wire(), crate::types::WireBackend::Paid);
        assert!(decision.model_id.ends_with(":free"));
        assert!(
            decision.explanation.contains("free"),
            "explanation should mention free-model suitability: {}",
            decision.explanation
        );
    }

    #[tokio::test]
    async fn context_window_overflow_penalizes_local() {
        let estimator = Arc::new(FixedEstimator::new(0.001, 0.002));
        let selector = StaticModelSelector::new(
            vec![ModelRef {
                id: "small-local".to_owned(),
                context_window: 2_048,
            }],
            Vec::new(),
        );
        let engine = engine_with(selector, estimator);

        // Mid-band complexity so the fast path stays inconclusive, with a
        // token volume no local model can hold.
        let params = TaskRoutingParams::new("huge refactor", TaskPriority::Quality)
            .with_complexity(0.3)
            .with_context_length(4_000)
            .with_expected_output_length(500);

        let decision = engine
            .route_task(&params)
            .await
            .unwrap_or_else(|error| panic!("route_task failed: {error}"));
        assert_eq!(decision.backend, BackendChoice::Paid);
        assert!(decision.factors[&FactorName::ContextWindow].was_applied);
    }

    #[tokio::test]
    async fn full_path_never_errors_on_missing_models() {
        let estimator = Arc::new(FixedEstimator::new(0.001, 0.25));
        let engine = engine_with(StaticModelSelector::empty(), estimator);

        let params = TaskRoutingParams::new("task", TaskPriority::Quality)
            .with_complexity(0.3)
            .with_context_length(3_000);

        let decision = engine
            .route_task(&params)
            .await
            .unwrap_or_else(|error| panic!("route_task failed: {error}"));
        assert!(!decision.model_id.is_empty());
    }
}
