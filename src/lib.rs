pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{Currency, Estimator, ExchangeRateManager, FormulaId, Param};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct QuoteOptions {
    pub minutes: Option<f64>,
    pub formula: Option<FormulaId>,
    pub param_a: Option<f64>,
    pub param_b: Option<f64>,
    pub base_fee: Option<f64>,
    pub currency: Option<Currency>,
    /// Skip the network and price with fallback rates.
    pub offline: bool,
}

impl QuoteOptions {
    fn apply_to_config(&self, config: &mut AppConfig) {
        if let Some(minutes) = self.minutes {
            config.duration_minutes = minutes;
        }
        if let Some(formula) = self.formula {
            config.formula = formula;
        }
        if let Some(fee) = self.base_fee {
            config.base_fee = fee;
        }
        if let Some(currency) = self.currency {
            config.currency = currency;
        }
    }

    // Parameters go through the estimator so they are clamped to the formula's bounds.
    fn apply_to_estimator(&self, estimator: &mut Estimator) -> Result<()> {
        if let Some(a) = self.param_a {
            estimator.set_param(Param::A, a)?;
        }
        if let Some(b) = self.param_b {
            estimator.set_param(Param::B, b)?;
        }
        Ok(())
    }
}

pub enum AppCommand {
    Formulas,
    Rates,
    Quote(QuoteOptions),
    Curve {
        options: QuoteOptions,
        max_duration: Option<f64>,
        step: Option<f64>,
    },
    Interactive(QuoteOptions),
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

fn build_rate_manager(config: &AppConfig) -> Result<Arc<ExchangeRateManager>> {
    let sources = providers::sources_from_config(&config.rates)?;
    Ok(Arc::new(ExchangeRateManager::new(
        sources,
        config.rates.fallback,
        config.rates.refresh_policy(),
    )))
}

fn build_estimator(config: &mut AppConfig, options: &QuoteOptions) -> Result<Estimator> {
    options.apply_to_config(config);
    config.validate()?;
    let rates = build_rate_manager(config)?;
    let mut estimator = Estimator::from_config(config, rates)?;
    options.apply_to_estimator(&mut estimator)?;
    Ok(estimator)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Audio quote estimator starting...");

    let mut config = load_config(config_path)?;

    match command {
        AppCommand::Formulas => cli::formulas::run(),
        AppCommand::Rates => {
            let rates = build_rate_manager(&config)?;
            cli::rates::run(&rates).await
        }
        AppCommand::Quote(options) => {
            let estimator = build_estimator(&mut config, &options)?;
            cli::quote::run(&estimator, options.offline).await
        }
        AppCommand::Curve {
            options,
            max_duration,
            step,
        } => {
            if let Some(max_duration) = max_duration {
                config.chart.max_duration = max_duration;
            }
            if let Some(step) = step {
                config.chart.step = step;
            }
            let estimator = build_estimator(&mut config, &options)?;
            cli::curve::run(&estimator, options.offline).await
        }
        AppCommand::Interactive(options) => {
            let estimator = build_estimator(&mut config, &options)?;
            cli::interactive::run(estimator, options.offline).await
        }
    }
}
