//! Core pricing and exchange rate logic

pub mod config;
pub mod currency;
pub mod error;
pub mod estimator;
pub mod format;
pub mod formula;
pub mod log;
pub mod pricing;
pub mod rates;

// Re-export main types for cleaner imports
pub use currency::{Currency, RateSnapshot, RateSource};
pub use error::{EstimatorError, EstimatorResult};
pub use estimator::{ChartAdapter, Estimator, QuoteView};
pub use formula::{FormulaId, FormulaSpec, Param, ParamBounds};
pub use pricing::{CurvePoint, PricingConfig, Quote, compute_quote, sample_price_curve};
pub use rates::{ExchangeRateManager, ExchangeRateState, RatePhase, RefreshOutcome};
