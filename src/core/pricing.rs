//! Quote computation over the formula registry.

use crate::core::error::{EstimatorError, EstimatorResult};
use crate::core::formula::{FormulaId, Param};
use serde::{Deserialize, Serialize};

/// Upper bound on `max_duration / step` accepted by [`sample_price_curve`].
pub const MAX_CURVE_POINTS: f64 = 10_000.0;

/// Pricing inputs edited by the UI layer.
///
/// `param_a` and `param_b` always lie within the bounds of `formula`; the
/// setters below are the only way to change them outside of construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    base_fee: f64,
    formula: FormulaId,
    param_a: f64,
    param_b: f64,
}

impl PricingConfig {
    pub fn new(formula: FormulaId, base_fee: f64) -> EstimatorResult<Self> {
        let spec = formula.spec();
        let mut config = Self {
            base_fee: 0.0,
            formula,
            param_a: spec.a.default,
            param_b: spec.b.default,
        };
        config.set_base_fee(base_fee)?;
        Ok(config)
    }

    pub fn base_fee(&self) -> f64 {
        self.base_fee
    }

    pub fn formula(&self) -> FormulaId {
        self.formula
    }

    pub fn param_a(&self) -> f64 {
        self.param_a
    }

    pub fn param_b(&self) -> f64 {
        self.param_b
    }

    pub fn set_base_fee(&mut self, fee: f64) -> EstimatorResult<()> {
        if !fee.is_finite() || fee < 0.0 {
            return Err(EstimatorError::InvalidInput(format!(
                "base fee must be a non-negative number, got {fee}"
            )));
        }
        self.base_fee = fee;
        Ok(())
    }

    /// Switches the curve and resets both parameters to its defaults.
    /// Parameter ranges differ between formulas, so values never carry over.
    pub fn set_formula(&mut self, formula: FormulaId) {
        let spec = formula.spec();
        self.formula = formula;
        self.param_a = spec.a.default;
        self.param_b = spec.b.default;
    }

    /// Sets a shape parameter, clamped to the active formula's bounds.
    /// Returns the value actually stored.
    pub fn set_param(&mut self, param: Param, value: f64) -> EstimatorResult<f64> {
        if !value.is_finite() {
            return Err(EstimatorError::InvalidInput(format!(
                "parameter {param:?} must be finite, got {value}"
            )));
        }
        let clamped = self.formula.spec().bounds(param).clamp(value);
        match param {
            Param::A => self.param_a = clamped,
            Param::B => self.param_b = clamped,
        }
        Ok(clamped)
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        let spec = FormulaId::Power.spec();
        Self {
            base_fee: 0.0,
            formula: FormulaId::Power,
            param_a: spec.a.default,
            param_b: spec.b.default,
        }
    }
}

/// Pricing breakdown for one duration, in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub total: f64,
    pub processing_cost: f64,
    pub rate_per_minute: f64,
    pub avg_per_minute: f64,
}

/// One sample of the price curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub duration: f64,
    pub total: f64,
}

pub fn compute_quote(duration_minutes: f64, config: &PricingConfig) -> Quote {
    let rate_per_minute = if duration_minutes == 0.0 {
        0.0
    } else {
        config
            .formula
            .spec()
            .rate(duration_minutes, config.param_a, config.param_b)
    };
    let processing_cost = duration_minutes * rate_per_minute;
    let total = config.base_fee + processing_cost;
    let avg_per_minute = if duration_minutes > 0.0 {
        total / duration_minutes
    } else {
        0.0
    };

    Quote {
        total,
        processing_cost,
        rate_per_minute,
        avg_per_minute,
    }
}

/// Samples `(duration, total)` at every multiple of `step` in `[0, max_duration]`.
pub fn sample_price_curve(
    max_duration: f64,
    step: f64,
    config: &PricingConfig,
) -> EstimatorResult<Vec<CurvePoint>> {
    if !step.is_finite() || step <= 0.0 {
        return Err(EstimatorError::InvalidInput(format!(
            "sampling step must be positive, got {step}"
        )));
    }
    if !max_duration.is_finite() || max_duration < 0.0 {
        return Err(EstimatorError::InvalidInput(format!(
            "maximum duration must be a non-negative number, got {max_duration}"
        )));
    }
    if max_duration / step > MAX_CURVE_POINTS {
        return Err(EstimatorError::InvalidInput(format!(
            "sampling {max_duration} minutes every {step} exceeds {MAX_CURVE_POINTS} points"
        )));
    }

    // Tolerate float noise so 5000/50 yields 101 points rather than 100.
    let count = (max_duration / step + 1e-9).floor() as u64;
    Ok((0..=count)
        .map(|i| {
            let duration = i as f64 * step;
            CurvePoint {
                duration,
                total: compute_quote(duration, config).total,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formula::{MIN_LOG_RATE, ParamBounds};

    fn sweep(bounds: &ParamBounds) -> [f64; 3] {
        [bounds.min, bounds.default, bounds.max]
    }

    fn configs(base_fee: f64) -> Vec<PricingConfig> {
        let mut out = Vec::new();
        for id in FormulaId::ALL {
            let spec = id.spec();
            for a in sweep(&spec.a) {
                for b in sweep(&spec.b) {
                    let mut config = PricingConfig::new(id, base_fee).unwrap();
                    config.set_param(Param::A, a).unwrap();
                    config.set_param(Param::B, b).unwrap();
                    out.push(config);
                }
            }
        }
        out
    }

    #[test]
    fn test_total_is_fee_plus_processing() {
        for config in configs(7.5) {
            for minutes in [0.0, 0.5, 1.0, 12.0, 90.0, 720.0, 5000.0] {
                let quote = compute_quote(minutes, &config);
                assert!(quote.total >= config.base_fee());
                assert!(quote.processing_cost >= 0.0);
                assert_eq!(quote.total, config.base_fee() + minutes * quote.rate_per_minute);
                assert_eq!(quote.processing_cost, minutes * quote.rate_per_minute);
            }
        }
    }

    #[test]
    fn test_zero_duration_quote() {
        for config in configs(3.0) {
            let quote = compute_quote(0.0, &config);
            assert_eq!(quote.rate_per_minute, 0.0);
            assert_eq!(quote.processing_cost, 0.0);
            assert_eq!(quote.avg_per_minute, 0.0);
            assert_eq!(quote.total, 3.0);
        }
    }

    #[test]
    fn test_average_per_minute() {
        let config = PricingConfig::new(FormulaId::Hyperbolic, 10.0).unwrap();
        let quote = compute_quote(100.0, &config);
        let expected_rate = 0.10 / (1.0 + 0.001 * 100.0);
        assert!((quote.rate_per_minute - expected_rate).abs() < 1e-12);
        assert!((quote.avg_per_minute - quote.total / 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_logarithmic_never_below_floor() {
        for config in configs(0.0)
            .into_iter()
            .filter(|c| c.formula() == FormulaId::Logarithmic)
        {
            for minutes in [0.01, 1.0, 100.0, 5000.0, 1e7] {
                assert!(compute_quote(minutes, &config).rate_per_minute >= MIN_LOG_RATE);
            }
        }
    }

    #[test]
    fn test_switching_formula_resets_params() {
        let mut config = PricingConfig::new(FormulaId::Power, 1.0).unwrap();
        config.set_param(Param::A, 0.9).unwrap();
        config.set_param(Param::B, 0.7).unwrap();

        config.set_formula(FormulaId::Logarithmic);
        let spec = FormulaId::Logarithmic.spec();
        assert_eq!(config.param_a(), spec.a.default);
        assert_eq!(config.param_b(), spec.b.default);

        // Switching back does not restore the earlier values either
        config.set_formula(FormulaId::Power);
        assert_eq!(config.param_a(), FormulaId::Power.spec().a.default);
        assert_eq!(config.param_b(), FormulaId::Power.spec().b.default);
    }

    #[test]
    fn test_set_param_clamps_to_active_formula() {
        let mut config = PricingConfig::new(FormulaId::Hyperbolic, 0.0).unwrap();
        let stored = config.set_param(Param::B, 0.5).unwrap();
        assert_eq!(stored, FormulaId::Hyperbolic.spec().b.max);
        assert!(config.set_param(Param::A, f64::NAN).is_err());
    }

    #[test]
    fn test_negative_base_fee_rejected() {
        assert!(PricingConfig::new(FormulaId::Power, -1.0).is_err());
        let mut config = PricingConfig::default();
        assert!(config.set_base_fee(f64::INFINITY).is_err());
        assert_eq!(config.base_fee(), 0.0);
    }

    #[test]
    fn test_sample_curve_default_grid() {
        let config = PricingConfig::default();
        let points = sample_price_curve(5000.0, 50.0, &config).unwrap();
        assert_eq!(points.len(), 101);
        assert_eq!(points.first().unwrap().duration, 0.0);
        assert_eq!(points.last().unwrap().duration, 5000.0);
        for (i, pair) in points.windows(2).enumerate() {
            assert!(pair[1].duration > pair[0].duration);
            assert_eq!(pair[1].duration, (i + 1) as f64 * 50.0);
        }
        for point in &points {
            assert_eq!(point.total, compute_quote(point.duration, &config).total);
        }
    }

    #[test]
    fn test_sample_curve_is_idempotent() {
        let config = PricingConfig::new(FormulaId::Logarithmic, 2.0).unwrap();
        let first = sample_price_curve(300.0, 7.0, &config).unwrap();
        let second = sample_price_curve(300.0, 7.0, &config).unwrap();
        assert_eq!(first, second);
        // 300 is not a multiple of 7, so the last sample is 294
        assert_eq!(first.last().unwrap().duration, 294.0);
    }

    #[test]
    fn test_sample_curve_rejects_bad_step() {
        let config = PricingConfig::default();
        assert!(sample_price_curve(100.0, 0.0, &config).is_err());
        assert!(sample_price_curve(100.0, -5.0, &config).is_err());
        assert!(sample_price_curve(f64::NAN, 5.0, &config).is_err());
        assert_eq!(sample_price_curve(0.0, 5.0, &config).unwrap().len(), 1);
    }

    #[test]
    fn test_sample_curve_rejects_oversized_grid() {
        let config = PricingConfig::default();
        let err = sample_price_curve(5000.0, 1e-9, &config).unwrap_err();
        assert!(matches!(err, EstimatorError::InvalidInput(_)));
        assert!(sample_price_curve(f64::MAX, 1.0, &config).is_err());

        // The cap itself is still accepted
        let points = sample_price_curve(MAX_CURVE_POINTS, 1.0, &config).unwrap();
        assert_eq!(points.len(), MAX_CURVE_POINTS as usize + 1);
    }
}
