//! Deadline enforcement for phase and collaborator calls.
//!
//! A [`TimeBudget`] races an operation against a timer. When the timer wins
//! the operation's future is dropped, so its eventual output is discarded and
//! never reaches pipeline state. Work the operation already handed off to
//! spawned tasks or external processes is not interrupted.

use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Raised when an operation outlives its budget.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "'{label}' exceeded its time budget: {:.1}s elapsed, {:.1}s budget",
    .elapsed.as_secs_f64(),
    .budget.as_secs_f64()
)]
pub struct BudgetExceeded {
    pub label: String,
    pub elapsed: Duration,
    pub budget: Duration,
}

/// A labelled wall-clock allowance for one asynchronous operation.
#[derive(Debug, Clone)]
pub struct TimeBudget {
    label: String,
    budget: Duration,
}

impl TimeBudget {
    pub fn new(label: impl Into<String>, budget: Duration) -> Self {
        Self {
            label: label.into(),
            budget,
        }
    }

    pub fn from_secs(label: impl Into<String>, secs: u64) -> Self {
        Self::new(label, Duration::from_secs(secs))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Run `op` under this budget.
    ///
    /// The operation's own result (success or error) is returned unchanged.
    /// No retries happen here.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<BudgetExceeded>,
    {
        let start = Instant::now();
        tracing::debug!(
            label = %self.label,
            budget_secs = self.budget.as_secs_f64(),
            "time budget started"
        );

        match tokio::time::timeout(self.budget, op()).await {
            Ok(outcome) => {
                let elapsed = start.elapsed();
                tracing::debug!(
                    label = %self.label,
                    elapsed_ms = elapsed.as_millis() as u64,
                    ok = outcome.is_ok(),
                    "time budget settled"
                );
                outcome
            }
            Err(_) => {
                let elapsed = start.elapsed();
                tracing::warn!(
                    label = %self.label,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_secs = self.budget.as_secs_f64(),
                    "time budget exceeded"
                );
                Err(BudgetExceeded {
                    label: self.label.clone(),
                    elapsed,
                    budget: self.budget,
                }
                .into())
            }
        }
    }
}

/// Shorthand for `TimeBudget::from_secs(label, secs).run(op)`.
pub async fn run_with_budget<T, E, F, Fut>(label: &str, budget_secs: u64, op: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<BudgetExceeded>,
{
    TimeBudget::from_secs(label, budget_secs).run(op).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;

    #[tokio::test]
    async fn test_resolves_with_operation_result() {
        let budget = TimeBudget::from_secs("fast", 5);
        let value: Result<u32, PipelineError> = budget.run(|| async { Ok(42) }).await;
        assert_eq!(value.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_propagates_operation_error_unchanged() {
        let budget = TimeBudget::from_secs("failing", 5);
        let result: Result<(), PipelineError> = budget
            .run(|| async { Err(PipelineError::NoIdeasGenerated) })
            .await;
        assert!(matches!(result, Err(PipelineError::NoIdeasGenerated)));
    }

    #[tokio::test]
    async fn test_overrun_reports_label_elapsed_and_budget() {
        let budget = TimeBudget::new("slow-oracle", Duration::from_millis(30));
        let result: Result<(), BudgetExceeded> = budget
            .run(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.label, "slow-oracle");
        assert_eq!(err.budget, Duration::from_millis(30));
        assert!(err.elapsed >= Duration::from_millis(30));
        let msg = err.to_string();
        assert!(msg.contains("slow-oracle"));
        assert!(msg.contains("elapsed"));
        assert!(msg.contains("budget"));
    }

    #[tokio::test]
    async fn test_abandoned_operation_has_no_further_effect() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let budget = TimeBudget::new("abandoned", Duration::from_millis(20));
        let result: Result<(), BudgetExceeded> = budget
            .run(|| async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_run_with_budget_helper() {
        let result: Result<&str, PipelineError> =
            run_with_budget("helper", 1, || async { Ok("done") }).await;
        assert_eq!(result.unwrap(), "done");
    }
}
