use super::ui;
use crate::core::{Currency, ExchangeRateManager, ExchangeRateState, RatePhase, RefreshOutcome};
use anyhow::Result;
use comfy_table::Cell;
use std::sync::Arc;

fn phase_label(phase: RatePhase) -> &'static str {
    match phase {
        RatePhase::Fresh => "live",
        RatePhase::Fetching => "fetching",
        RatePhase::Fallback => "fallback",
    }
}

/// Renders the current rate table and refresh status.
pub fn display_rates(state: &ExchangeRateState, outcome: Option<&RefreshOutcome>) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Rate (1 USD =)"),
    ]);
    for currency in Currency::ALL {
        table.add_row(vec![
            Cell::new(format!("{} ({})", currency.code(), currency.symbol())),
            ui::amount_cell(&format!("{:.4}", state.rate(currency))),
        ]);
    }

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Exchange rates", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());

    let updated = state
        .last_updated
        .map_or("never".to_string(), |ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    output.push_str(&format!(
        "\n\nStatus: {}  Last updated: {}",
        phase_label(state.phase),
        ui::style_text(&updated, ui::StyleType::Subtle)
    ));

    match outcome {
        Some(RefreshOutcome::Fresh { source, partial }) => {
            let note = if *partial { " (partial)" } else { "" };
            output.push_str(&format!("\nSource: {source}{note}"));
        }
        Some(RefreshOutcome::Fallback { failures }) => {
            for failure in failures {
                output.push_str(&format!(
                    "\n{}",
                    ui::style_text(&failure.to_string(), ui::StyleType::Subtle)
                ));
            }
        }
        Some(RefreshOutcome::Skipped) | None => {}
    }
    if state.is_fallback {
        output.push_str(&format!("\n{}", ui::fallback_notice()));
    }
    output
}

pub async fn run(rates: &Arc<ExchangeRateManager>) -> Result<()> {
    let outcome = ui::refresh_with_spinner(rates).await;
    println!("{}", display_rates(&rates.state(), Some(&outcome)));
    Ok(())
}
