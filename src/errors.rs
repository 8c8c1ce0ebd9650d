//! Typed error hierarchy for the Shipyard pipeline.
//!
//! `PipelineError` is the single error type that crosses phase boundaries.
//! Oracle adapters speak `anyhow`; the orchestrator tags their failures with
//! the oracle name so the recorded error says who failed.

use thiserror::Error;

use crate::budget::BudgetExceeded;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Timeout(#[from] BudgetExceeded),

    #[error("No trending repositories found (windows tried: {windows})")]
    NoTrendsFound { windows: String },

    #[error("Generator produced no ideas")]
    NoIdeasGenerated,

    #[error("All ideas rejected after {rounds} judging round(s) ({rejected} rejected in the final round)")]
    JudgingExhausted { rounds: u32, rejected: usize },

    #[error("No idea received a ship recommendation ({researched} researched)")]
    NoShippableIdea { researched: usize },

    #[error("Implementation failed: {reason}")]
    ImplementationFailed { reason: String },

    #[error("Deployment failed: {reason}")]
    DeploymentFailed { reason: String },

    #[error("{oracle} failed: {source:#}")]
    Oracle {
        oracle: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Wrap an adapter failure with the name of the oracle that produced it.
    pub fn oracle(oracle: &'static str, source: anyhow::Error) -> Self {
        Self::Oracle { oracle, source }
    }

    /// Whether this error came from a time budget overrun.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
