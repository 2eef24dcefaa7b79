use crate::core::currency::Currency;
use crate::core::formula::FormulaId;
use crate::core::pricing::MAX_CURVE_POINTS;
use crate::core::rates::{DEFAULT_REFRESH_INTERVAL, FallbackRates, RefreshPolicy};
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

pub const DEFAULT_ENDPOINTS: [&str; 2] = [
    "https://open.er-api.com/v6/latest/USD",
    "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest/v1/currencies/usd.json",
];

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    pub max_duration: f64,
    pub step: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            max_duration: 5000.0,
            step: 50.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RatesConfig {
    /// Tried in order on every refresh; the first usable answer wins.
    pub endpoints: Vec<String>,
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub retry_after_failure_secs: Option<u64>,
    pub fallback: FallbackRates,
}

impl Default for RatesConfig {
    fn default() -> Self {
        RatesConfig {
            endpoints: DEFAULT_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL.as_secs(),
            request_timeout_secs: 10,
            retry_after_failure_secs: None,
            fallback: FallbackRates::default(),
        }
    }
}

impl RatesConfig {
    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            interval: Duration::from_secs(self.refresh_interval_secs),
            retry_after_failure: self.retry_after_failure_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub currency: Currency,
    pub base_fee: f64,
    pub formula: FormulaId,
    pub duration_minutes: f64,
    pub chart: ChartConfig,
    pub rates: RatesConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currency: Currency::Usd,
            base_fee: 5.0,
            formula: FormulaId::Power,
            duration_minutes: 60.0,
            chart: ChartConfig::default(),
            rates: RatesConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or built-in defaults if
    /// no file has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "audioquote", "audioquote")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.base_fee.is_finite() || self.base_fee < 0.0 {
            bail!("base_fee must be a non-negative number");
        }
        if !self.duration_minutes.is_finite() || self.duration_minutes < 0.0 {
            bail!("duration_minutes must be a non-negative number");
        }
        if !self.chart.step.is_finite() || self.chart.step <= 0.0 {
            bail!("chart.step must be positive");
        }
        if !self.chart.max_duration.is_finite() || self.chart.max_duration < 0.0 {
            bail!("chart.max_duration must be a non-negative number");
        }
        if self.chart.max_duration / self.chart.step > MAX_CURVE_POINTS {
            bail!("chart.max_duration / chart.step must not exceed {MAX_CURVE_POINTS}");
        }
        if self.rates.refresh_interval_secs == 0 {
            bail!("rates.refresh_interval_secs must be positive");
        }
        if self.rates.retry_after_failure_secs == Some(0) {
            bail!("rates.retry_after_failure_secs must be positive when set");
        }
        let fallback = &self.rates.fallback;
        if !(fallback.uah > 0.0 && fallback.eur > 0.0) {
            bail!("rates.fallback rates must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
currency: "UAH"
base_fee: 2.5
formula: logarithmic
duration_minutes: 90
chart:
  max_duration: 1200
  step: 20
rates:
  endpoints:
    - "http://localhost:9000/latest"
  refresh_interval_secs: 600
  retry_after_failure_secs: 120
  fallback:
    uah: 40.0
    eur: 0.9
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.currency, Currency::Uah);
        assert_eq!(config.base_fee, 2.5);
        assert_eq!(config.formula, FormulaId::Logarithmic);
        assert_eq!(config.duration_minutes, 90.0);
        assert_eq!(config.chart.max_duration, 1200.0);
        assert_eq!(config.chart.step, 20.0);
        assert_eq!(config.rates.endpoints, vec!["http://localhost:9000/latest"]);
        // Omitted keys keep their defaults
        assert_eq!(config.rates.request_timeout_secs, 10);
        assert_eq!(config.rates.fallback.uah, 40.0);

        let policy = config.rates.refresh_policy();
        assert_eq!(policy.interval, Duration::from_secs(600));
        assert_eq!(policy.retry_after_failure, Some(Duration::from_secs(120)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.rates.endpoints.len(), 2);
        assert_eq!(config.rates.refresh_interval_secs, 1800);
        assert_eq!(config.rates.refresh_policy().retry_after_failure, None);
    }

    #[test]
    fn test_unknown_formula_rejected() {
        let result: Result<AppConfig, _> = serde_yaml::from_str("formula: cubic");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = AppConfig {
            base_fee: -1.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        config.base_fee = 1.0;
        config.chart.step = 0.0;
        assert!(config.validate().is_err());

        config.chart.step = 10.0;
        config.rates.fallback.eur = 0.0;
        assert!(config.validate().is_err());

        config.rates.fallback.eur = 0.85;
        assert!(config.validate().is_ok());

        config.chart.step = 1e-9;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chart.step"));
    }

    #[test]
    fn test_load_from_path() -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        fs::write(file.path(), "currency: EUR\nbase_fee: 1.0\n")?;
        let config = AppConfig::load_from_path(file.path())?;
        assert_eq!(config.currency, Currency::Eur);
        assert_eq!(config.base_fee, 1.0);

        fs::write(file.path(), "duration_minutes: -3\n")?;
        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
        Ok(())
    }
}
