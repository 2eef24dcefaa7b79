//! Currency codes and the rate source abstraction

use crate::core::error::EstimatorError;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Uah,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Uah, Currency::Eur];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Uah => "UAH",
            Currency::Eur => "EUR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Uah => "₴",
            Currency::Eur => "€",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = EstimatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "UAH" => Ok(Currency::Uah),
            "EUR" => Ok(Currency::Eur),
            _ => Err(EstimatorError::UnknownCurrency(s.to_string())),
        }
    }
}

/// USD-based rates reported by one source. Either field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateSnapshot {
    pub uah: Option<f64>,
    pub eur: Option<f64>,
}

impl RateSnapshot {
    pub fn is_empty(&self) -> bool {
        self.uah.is_none() && self.eur.is_none()
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Fetches the current USD→UAH and USD→EUR rates. An `Ok` snapshot holds
    /// at least one positive rate.
    async fn fetch_rates(&self) -> Result<RateSnapshot>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parsing() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(" UAH ".parse::<Currency>().unwrap(), Currency::Uah);
        assert_eq!("Eur".parse::<Currency>().unwrap(), Currency::Eur);
        assert_eq!(
            "GBP".parse::<Currency>().unwrap_err().to_string(),
            "Unsupported currency: GBP"
        );
    }

    #[test]
    fn test_currency_serde_uses_codes() {
        let yaml = serde_yaml::to_string(&Currency::Uah).unwrap();
        assert_eq!(yaml.trim(), "UAH");
        let parsed: Currency = serde_yaml::from_str("EUR").unwrap();
        assert_eq!(parsed, Currency::Eur);
    }
}
