//! Line-driven session mapping typed commands onto the estimator's inputs.
//!
//! The rate manager's timer keeps running on the same runtime while the
//! session waits for input.

use super::curve::{TerminalChart, display_curve};
use super::rates::display_rates;
use super::ui;
use crate::core::{Currency, Estimator, FormulaId, Param, RefreshOutcome};
use anyhow::{Context, Result, anyhow, bail};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "\
Commands:
  duration <minutes>     set the audio duration
  formula <id>           hyperbolic | power | logarithmic (resets A and B)
  a <value>, b <value>   set a shape parameter (clamped to the formula's range)
  fee <value>            set the base fee in USD
  currency <code>        USD | UAH | EUR
  refresh                fetch exchange rates now
  rates                  show the current exchange rates
  curve                  print the sampled price curve
  show                   print the current quote
  help                   show this message
  quit                   leave the session";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Duration(f64),
    Formula(FormulaId),
    Param(Param, f64),
    BaseFee(f64),
    Currency(Currency),
    Refresh,
    Rates,
    Curve,
    Show,
    Help,
    Quit,
}

fn number(arg: Option<&str>, what: &str) -> Result<f64> {
    let raw = arg.ok_or_else(|| anyhow!("Missing {what}"))?;
    raw.parse::<f64>()
        .with_context(|| format!("Invalid {what}: {raw}"))
}

pub fn parse_command(line: &str) -> Result<SessionCommand> {
    let mut parts = line.split_whitespace();
    let Some(keyword) = parts.next() else {
        bail!("Empty command");
    };
    let arg = parts.next();
    let command = match keyword.to_lowercase().as_str() {
        "duration" | "d" => SessionCommand::Duration(number(arg, "duration")?),
        "formula" | "f" => {
            let id = arg.ok_or_else(|| anyhow!("Missing formula id"))?;
            SessionCommand::Formula(id.parse::<FormulaId>()?)
        }
        "a" => SessionCommand::Param(Param::A, number(arg, "value for A")?),
        "b" => SessionCommand::Param(Param::B, number(arg, "value for B")?),
        "fee" => SessionCommand::BaseFee(number(arg, "base fee")?),
        "currency" | "c" => {
            let code = arg.ok_or_else(|| anyhow!("Missing currency code"))?;
            SessionCommand::Currency(code.parse::<Currency>()?)
        }
        "refresh" => SessionCommand::Refresh,
        "rates" => SessionCommand::Rates,
        "curve" => SessionCommand::Curve,
        "show" => SessionCommand::Show,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" | "q" => SessionCommand::Quit,
        other => bail!("Unknown command: {other}. Type 'help' for a list."),
    };
    Ok(command)
}

fn summary(estimator: &Estimator) -> String {
    let view = estimator.view();
    let mut line = format!(
        "{:.1} min @ {} → {} {} (fee {}, processing {}, avg {}/min)",
        view.duration_minutes,
        view.rate_per_minute,
        ui::style_text("total", ui::StyleType::TotalLabel),
        ui::style_text(&view.total, ui::StyleType::TotalValue),
        view.base_fee,
        view.processing_cost,
        view.avg_per_minute,
    );
    if view.using_fallback_rate {
        line.push_str(&format!("\n{}", ui::fallback_notice()));
    }
    line
}

/// Applies one command. Returns `false` when the session should end.
pub async fn apply(estimator: &mut Estimator, command: SessionCommand) -> Result<bool> {
    debug!(?command, "Session command");
    match command {
        SessionCommand::Duration(minutes) => estimator.set_duration(minutes)?,
        SessionCommand::Formula(id) => estimator.set_formula(id),
        SessionCommand::Param(param, value) => {
            let stored = estimator.set_param(param, value)?;
            if stored != value {
                println!("{param:?} clamped to {stored}");
            }
        }
        SessionCommand::BaseFee(fee) => estimator.set_base_fee(fee)?,
        SessionCommand::Currency(currency) => estimator.set_currency(currency),
        SessionCommand::Refresh => {
            let outcome = ui::refresh_with_spinner(estimator.rates()).await;
            if matches!(outcome, RefreshOutcome::Skipped) {
                println!("A refresh is already running.");
            }
            println!("{}", display_rates(&estimator.rates().state(), Some(&outcome)));
        }
        SessionCommand::Rates => {
            println!("{}", display_rates(&estimator.rates().state(), None));
            return Ok(true);
        }
        SessionCommand::Curve => {
            let points = estimator.curve()?;
            println!("{}", display_curve(estimator, &points));
            return Ok(true);
        }
        SessionCommand::Show => {}
        SessionCommand::Help => {
            println!("{HELP}");
            return Ok(true);
        }
        SessionCommand::Quit => return Ok(false),
    }
    println!("{}", summary(estimator));
    Ok(true)
}

/// Reads commands until `quit` or end of input.
pub async fn run_session<R>(estimator: &mut Estimator, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", ui::style_text(&format!("{e:#}"), ui::StyleType::Warning));
                continue;
            }
        };
        match apply(estimator, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("{}", ui::style_text(&format!("{e:#}"), ui::StyleType::Warning)),
        }
    }
    Ok(())
}

pub async fn run(estimator: Estimator, offline: bool) -> Result<()> {
    let mut estimator = estimator.with_chart(Box::new(TerminalChart::new()));
    if !offline {
        ui::refresh_with_spinner(estimator.rates()).await;
    }
    println!("{HELP}\n");
    println!("{}", summary(&estimator));

    let stdin = BufReader::new(tokio::io::stdin());
    let result = run_session(&mut estimator, stdin).await;
    estimator.rates().cancel_schedule();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AppConfig;
    use crate::core::rates::{FallbackRates, RefreshPolicy};
    use crate::core::ExchangeRateManager;
    use std::sync::Arc;

    fn estimator() -> Estimator {
        let rates = Arc::new(ExchangeRateManager::new(
            vec![],
            FallbackRates::default(),
            RefreshPolicy::default(),
        ));
        Estimator::from_config(&AppConfig::default(), rates).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_command("duration 90").unwrap(),
            SessionCommand::Duration(90.0)
        );
        assert_eq!(
            parse_command("F logarithmic").unwrap(),
            SessionCommand::Formula(FormulaId::Logarithmic)
        );
        assert_eq!(
            parse_command("b 0.25").unwrap(),
            SessionCommand::Param(Param::B, 0.25)
        );
        assert_eq!(
            parse_command("currency eur").unwrap(),
            SessionCommand::Currency(Currency::Eur)
        );
        assert_eq!(parse_command("  quit ").unwrap(), SessionCommand::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("").is_err());
        assert!(parse_command("duration").is_err());
        assert!(parse_command("duration ten").is_err());
        assert_eq!(
            parse_command("formula cubic").unwrap_err().to_string(),
            "Unknown formula: cubic"
        );
        assert!(parse_command("currency GBP").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[tokio::test]
    async fn test_session_applies_commands() {
        console::set_colors_enabled(false);
        let mut estimator = estimator();
        let script = b"duration 120\nformula hyperbolic\na 5\nfee 1.5\ncurrency uah\nbogus\nquit\nduration 1\n";

        run_session(&mut estimator, &script[..]).await.unwrap();

        assert_eq!(estimator.duration_minutes(), 120.0);
        assert_eq!(estimator.pricing().formula(), FormulaId::Hyperbolic);
        assert_eq!(
            estimator.pricing().param_a(),
            FormulaId::Hyperbolic.spec().a.max
        );
        assert_eq!(estimator.pricing().base_fee(), 1.5);
        assert_eq!(estimator.currency(), Currency::Uah);
    }

    #[tokio::test]
    async fn test_invalid_value_keeps_session_alive() {
        let mut estimator = estimator();
        run_session(&mut estimator, &b"duration -4\nduration 15\n"[..])
            .await
            .unwrap();
        assert_eq!(estimator.duration_minutes(), 15.0);
    }
}
