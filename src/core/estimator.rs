//! Controller that owns the estimator state and forwards UI changes.
//!
//! All mutable session state (duration, currency, pricing parameters) lives
//! in one `Estimator` value. The rate manager is shared so its timer can keep
//! refreshing while the estimator is in use, and the chart adapter is fed
//! after every change that moves the curve or the current position.

use crate::core::config::{AppConfig, ChartConfig};
use crate::core::currency::Currency;
use crate::core::error::{EstimatorError, EstimatorResult};
use crate::core::format::CurrencyFormatter;
use crate::core::formula::{FormulaId, Param};
use crate::core::pricing::{self, CurvePoint, PricingConfig, Quote};
use crate::core::rates::{ExchangeRateManager, RefreshOutcome};
use std::sync::Arc;
use tracing::{debug, warn};

/// Receives price samples for display. Implementations own all rendering.
pub trait ChartAdapter: Send {
    fn draw_curve(&mut self, points: &[CurvePoint]) -> anyhow::Result<()>;

    fn draw_marker(&mut self, point: CurvePoint) -> anyhow::Result<()>;
}

/// A quote rendered in the selected currency.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteView {
    pub duration_minutes: f64,
    pub currency: Currency,
    pub quote: Quote,
    pub base_fee: String,
    pub total: String,
    pub processing_cost: String,
    pub rate_per_minute: String,
    pub avg_per_minute: String,
    /// Set when a non-USD amount was converted with fallback constants.
    pub using_fallback_rate: bool,
}

pub struct Estimator {
    duration_minutes: f64,
    currency: Currency,
    pricing: PricingConfig,
    chart: ChartConfig,
    rates: Arc<ExchangeRateManager>,
    formatter: CurrencyFormatter,
    adapter: Option<Box<dyn ChartAdapter>>,
}

impl Estimator {
    pub fn new(
        pricing: PricingConfig,
        duration_minutes: f64,
        currency: Currency,
        chart: ChartConfig,
        rates: Arc<ExchangeRateManager>,
    ) -> EstimatorResult<Self> {
        let formatter = CurrencyFormatter::new(rates.shared());
        let mut estimator = Self {
            duration_minutes: 0.0,
            currency,
            pricing,
            chart,
            rates,
            formatter,
            adapter: None,
        };
        estimator.set_duration(duration_minutes)?;
        Ok(estimator)
    }

    pub fn from_config(config: &AppConfig, rates: Arc<ExchangeRateManager>) -> EstimatorResult<Self> {
        let pricing = PricingConfig::new(config.formula, config.base_fee)?;
        Self::new(
            pricing,
            config.duration_minutes,
            config.currency,
            config.chart.clone(),
            rates,
        )
    }

    /// Attaches a chart and draws the initial curve and marker.
    pub fn with_chart(mut self, adapter: Box<dyn ChartAdapter>) -> Self {
        self.adapter = Some(adapter);
        self.redraw();
        self
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_minutes
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    pub fn rates(&self) -> &Arc<ExchangeRateManager> {
        &self.rates
    }

    pub fn formatter(&self) -> &CurrencyFormatter {
        &self.formatter
    }

    pub fn set_duration(&mut self, minutes: f64) -> EstimatorResult<()> {
        if !minutes.is_finite() || minutes < 0.0 {
            return Err(EstimatorError::InvalidInput(format!(
                "duration must be a non-negative number of minutes, got {minutes}"
            )));
        }
        self.duration_minutes = minutes;
        self.redraw_marker();
        Ok(())
    }

    pub fn set_formula(&mut self, formula: FormulaId) {
        debug!(%formula, "Switching formula");
        self.pricing.set_formula(formula);
        self.redraw();
    }

    /// Stores a parameter clamped to the active formula's bounds and returns
    /// the stored value.
    pub fn set_param(&mut self, param: Param, value: f64) -> EstimatorResult<f64> {
        let stored = self.pricing.set_param(param, value)?;
        if stored != value {
            debug!(?param, requested = value, stored, "Parameter clamped to bounds");
        }
        self.redraw();
        Ok(stored)
    }

    pub fn set_base_fee(&mut self, fee: f64) -> EstimatorResult<()> {
        self.pricing.set_base_fee(fee)?;
        self.redraw();
        Ok(())
    }

    pub fn set_currency(&mut self, currency: Currency) {
        self.currency = currency;
    }

    /// Runs a refresh cycle now. Ignored if one is already in flight.
    pub async fn trigger_manual_refresh(&self) -> RefreshOutcome {
        self.rates.refresh().await
    }

    pub fn quote(&self) -> Quote {
        pricing::compute_quote(self.duration_minutes, &self.pricing)
    }

    pub fn view(&self) -> QuoteView {
        let quote = self.quote();
        let fmt = |amount: f64| self.formatter.format(amount, self.currency);
        QuoteView {
            duration_minutes: self.duration_minutes,
            currency: self.currency,
            base_fee: fmt(self.pricing.base_fee()),
            total: fmt(quote.total),
            processing_cost: fmt(quote.processing_cost),
            rate_per_minute: fmt(quote.rate_per_minute),
            avg_per_minute: fmt(quote.avg_per_minute),
            using_fallback_rate: self.currency != Currency::Usd && self.formatter.is_fallback(),
            quote,
        }
    }

    pub fn curve(&self) -> EstimatorResult<Vec<CurvePoint>> {
        pricing::sample_price_curve(self.chart.max_duration, self.chart.step, &self.pricing)
    }

    pub fn current_point(&self) -> CurvePoint {
        CurvePoint {
            duration: self.duration_minutes,
            total: self.quote().total,
        }
    }

    fn redraw(&mut self) {
        if self.adapter.is_none() {
            return;
        }
        match self.curve() {
            Ok(points) => {
                if let Some(adapter) = self.adapter.as_mut()
                    && let Err(e) = adapter.draw_curve(&points)
                {
                    warn!(error = %EstimatorError::RenderFailure(format!("{e:#}")), "Curve redraw failed");
                }
            }
            Err(e) => warn!(error = %e, "Could not sample price curve"),
        }
        self.redraw_marker();
    }

    fn redraw_marker(&mut self) {
        let point = self.current_point();
        if let Some(adapter) = self.adapter.as_mut()
            && let Err(e) = adapter.draw_marker(point)
        {
            warn!(error = %EstimatorError::RenderFailure(format!("{e:#}")), "Marker redraw failed");
        }
    }
}
