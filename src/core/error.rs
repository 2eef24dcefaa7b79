//! Error taxonomy for the estimator core.

use thiserror::Error;

/// Errors surfaced by the pricing and rate components.
///
/// Only `UnknownFormula`, `UnknownCurrency` and `InvalidInput` ever reach a
/// caller. The network variants are produced inside the rate manager and
/// logged there, and `RenderFailure` is swallowed at the controller boundary.
#[derive(Debug, Error)]
pub enum EstimatorError {
    /// Formula identifier outside the registry.
    #[error("Unknown formula: {0}")]
    UnknownFormula(String),

    /// Currency code outside USD/UAH/EUR.
    #[error("Unsupported currency: {0}")]
    UnknownCurrency(String),

    /// Negative or non-finite numeric input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A single rate source failed; the refresh cycle moves on to the next one.
    #[error("Rate source {endpoint} failed: {reason}")]
    NetworkFailure { endpoint: String, reason: String },

    /// Every rate source failed during one refresh cycle.
    #[error("All {0} rate sources failed, using fallback rates")]
    AllSourcesExhausted(usize),

    /// The chart adapter rejected a redraw.
    #[error("Chart rendering failed: {0}")]
    RenderFailure(String),
}

pub type EstimatorResult<T> = Result<T, EstimatorError>;
