//! Failover: when an operation against one backend fails, find and invoke
//! the best alternate backend for the same logical operation, within the
//! same timeout budget.

mod probe;

pub use probe::AvailabilityProbe;

use std::sync::Arc;
use std::time::Duration;

use switchyard_core::Query;

use crate::backends::BackendSet;
use crate::config::ExecutionConfig;
use crate::error::{Result, RoutingError};
use crate::types::{BackendKind, FallbackContext, FallbackResult, WireBackend};

/// Outcome of a fallback attempt.
#[derive(Debug, Clone)]
pub struct FallbackOutcome {
    /// Whether the operation ultimately produced usable output.
    pub succeeded: bool,
    /// Whether an alternate backend was actually invoked.
    pub fallback_used: bool,
    /// Details of the attempt, absent when no fallback was reachable.
    pub result: Option<FallbackResult>,
}

impl FallbackOutcome {
    /// No fallback was available or permitted; nothing was invoked.
    fn unavailable() -> Self {
        Self {
            succeeded: false,
            fallback_used: false,
            result: None,
        }
    }
}

/// Selects and invokes an alternate backend after a failure.
pub struct FallbackCoordinator {
    backends: Arc<BackendSet>,
    probe: AvailabilityProbe,
    default_timeout: Duration,
}

impl FallbackCoordinator {
    #[must_use]
    pub fn new(backends: Arc<BackendSet>, execution: &ExecutionConfig) -> Self {
        let probe = AvailabilityProbe::new(
            Arc::clone(&backends),
            Duration::from_millis(execution.health_check_timeout_ms),
        );
        Self {
            backends,
            probe,
            default_timeout: Duration::from_millis(execution.task_timeout_ms),
        }
    }

    /// Finds the best alternate backend for a failed operation.
    ///
    /// Local failures fail over to the hosted backend when it is reachable
    /// and holds a credential. Hosted failures probe the local runtimes in
    /// fixed priority order — Ollama first, then LM Studio — and take the
    /// first that answers its health check.
    pub async fn get_best_fallback_option(&self, current: WireBackend) -> Option<BackendKind> {
        match current {
            WireBackend::Local => {
                if self.probe.check(BackendKind::Hosted).await {
                    Some(BackendKind::Hosted)
                } else {
                    None
                }
            }
            WireBackend::Paid => {
                if self.probe.check(BackendKind::Ollama).await {
                    return Some(BackendKind::Ollama);
                }
                if self.probe.check(BackendKind::LmStudio).await {
                    return Some(BackendKind::LmStudio);
                }
                None
            }
        }
    }

    /// Handles a failed operation.
    ///
    /// With a task present in the context, the task is re-executed against
    /// the chosen alternate backend under the context's timeout budget.
    /// Without one, the call only reports whether a fallback would be
    /// available (a pre-flight check); nothing is invoked and
    /// `fallback_used` stays false.
    pub async fn handle_error(
        &self,
        error: &RoutingError,
        context: &FallbackContext,
    ) -> FallbackOutcome {
        tracing::warn!(
            operation = %context.operation,
            backend = %context.originating_backend,
            %error,
            "operation failed, evaluating fallback"
        );

        if !context.fallback_available {
            return FallbackOutcome::unavailable();
        }

        let Some(kind) = self
            .get_best_fallback_option(context.originating_backend)
            .await
        else {
            tracing::warn!(operation = %context.operation, "no fallback backend reachable");
            return FallbackOutcome::unavailable();
        };

        let Some(task) = &context.task else {
            // Pre-flight: report availability without executing anything.
            return FallbackOutcome {
                succeeded: false,
                fallback_used: false,
                result: Some(FallbackResult {
                    backend: kind.wire(),
                    model_id: None,
                    succeeded: false,
                    text: None,
                    message: format!("fallback to {kind} available"),
                }),
            };
        };

        match self.execute_fallback(kind, task, context).await {
            Ok(result) => {
                tracing::info!(operation = %context.operation, backend = %kind, "fallback succeeded");
                FallbackOutcome {
                    succeeded: true,
                    fallback_used: true,
                    result: Some(result),
                }
            }
            Err(fallback_error) => {
                tracing::warn!(
                    operation = %context.operation,
                    backend = %kind,
                    error = %fallback_error,
                    "fallback failed"
                );
                FallbackOutcome {
                    succeeded: false,
                    fallback_used: true,
                    result: Some(FallbackResult {
                        backend: kind.wire(),
                        model_id: None,
                        succeeded: false,
                        text: None,
                        message: fallback_error.to_string(),
                    }),
                }
            }
        }
    }

    /// Runs the task on the alternate backend and maps the provider's
    /// response into the common [`FallbackResult`] shape.
    async fn execute_fallback(
        &self,
        kind: BackendKind,
        task: &str,
        context: &FallbackContext,
    ) -> Result<FallbackResult> {
        let provider = self.backends.for_kind(kind);
        let budget = context
            .timeout_ms
            .map_or(self.default_timeout, Duration::from_millis);

        // The original model belongs to the failed backend; the alternate
        // runs its own default.
        let query = Query::new(task);

        let response = match tokio::time::timeout(budget, provider.generate(&query)).await {
            Err(_) => return Err(RoutingError::Timeout(budget.as_millis() as u64)),
            Ok(Err(error)) => return Err(error.into()),
            Ok(Ok(response)) => response,
        };

        if response.text.trim().is_empty() {
            return Err(RoutingError::ExecutionFailed(
                "fallback backend produced no usable output".to_owned(),
            ));
        }

        Ok(FallbackResult {
            backend: kind.wire(),
            model_id: (!response.model.is_empty()).then_some(response.model),
            succeeded: true,
            text: Some(response.text),
            message: format!("fallback to {} succeeded", provider.name()),
        })
    }
}
