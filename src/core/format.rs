//! Display strings for USD amounts in the selected currency.

use crate::core::currency::Currency;
use crate::core::rates::SharedRates;

/// Renders USD amounts in the selected display currency.
///
/// Holds a read handle on the rate manager's state and looks the rate up on
/// every call, so a completed refresh shows on the next render.
#[derive(Clone)]
pub struct CurrencyFormatter {
    rates: SharedRates,
}

impl CurrencyFormatter {
    pub fn new(rates: SharedRates) -> Self {
        Self { rates }
    }

    /// Converts a USD amount. EUR divides because the source rate is USD→EUR
    /// and amounts are derived as USD-equivalent ÷ rate.
    pub fn convert(&self, amount_usd: f64, currency: Currency) -> f64 {
        let state = self.rates.read();
        match currency {
            Currency::Usd => amount_usd,
            Currency::Uah => amount_usd * state.uah,
            Currency::Eur => amount_usd / state.eur,
        }
    }

    pub fn format(&self, amount_usd: f64, currency: Currency) -> String {
        format!(
            "{}{:.2}",
            currency.symbol(),
            round_ties_up(self.convert(amount_usd, currency))
        )
    }

    pub fn is_fallback(&self) -> bool {
        self.rates.read().is_fallback
    }
}

/// `{:.2}` breaks exact ties to even; cents are shown with ties rounded away
/// from zero instead. A double sits exactly halfway between two cents only
/// when it is an odd multiple of 1/8 (0.125, 0.375, ...).
fn round_ties_up(value: f64) -> f64 {
    let eighths = value * 8.0;
    if eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
        (value * 100.0).round() / 100.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::{ExchangeRateState, FallbackRates};
    use parking_lot::RwLock;
    use std::sync::Arc;

    fn formatter(uah: f64, eur: f64) -> (CurrencyFormatter, SharedRates) {
        let rates = Arc::new(RwLock::new(ExchangeRateState::fallback(FallbackRates {
            uah,
            eur,
        })));
        (CurrencyFormatter::new(Arc::clone(&rates)), rates)
    }

    #[test]
    fn test_usd_is_identity() {
        let (formatter, _) = formatter(37.0, 0.85);
        assert_eq!(formatter.format(100.0, Currency::Usd), "$100.00");
        assert_eq!(formatter.format(0.126, Currency::Usd), "$0.13");
    }

    #[test]
    fn test_exact_ties_round_up() {
        let (formatter, _) = formatter(5.0, 2.0);
        assert_eq!(formatter.format(0.125, Currency::Usd), "$0.13");
        assert_eq!(formatter.format(10.625, Currency::Usd), "$10.63");
        assert_eq!(formatter.format(0.375, Currency::Usd), "$0.38");
        assert_eq!(formatter.format(-0.125, Currency::Usd), "$-0.13");
        // 0.625 after conversion in both directions
        assert_eq!(formatter.format(0.125, Currency::Uah), "₴0.63");
        assert_eq!(formatter.format(1.25, Currency::Eur), "€0.63");
    }

    #[test]
    fn test_near_ties_keep_exact_rounding() {
        let (formatter, _) = formatter(37.0, 0.85);
        // 1.005 is stored just below the tie
        assert_eq!(formatter.format(1.005, Currency::Usd), "$1.00");
        assert_eq!(formatter.format(0.25, Currency::Usd), "$0.25");
        assert_eq!(formatter.format(2.5, Currency::Usd), "$2.50");
    }

    #[test]
    fn test_uah_multiplies() {
        let (formatter, _) = formatter(41.37, 0.85);
        assert_eq!(formatter.format(100.0, Currency::Uah), "₴4137.00");
    }

    #[test]
    fn test_eur_divides() {
        let (formatter, _) = formatter(37.0, 0.8);
        assert_eq!(formatter.format(100.0, Currency::Eur), "€125.00");
        assert_eq!(formatter.format(1.0, Currency::Eur), "€1.25");
    }

    #[test]
    fn test_reads_latest_rates() {
        let (formatter, rates) = formatter(37.0, 0.85);
        assert_eq!(formatter.format(10.0, Currency::Uah), "₴370.00");
        assert!(formatter.is_fallback());

        {
            let mut state = rates.write();
            state.uah = 40.0;
            state.is_fallback = false;
        }
        assert_eq!(formatter.format(10.0, Currency::Uah), "₴400.00");
        assert!(!formatter.is_fallback());
    }
}
