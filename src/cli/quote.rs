use super::ui;
use crate::core::{Estimator, QuoteView};
use anyhow::Result;
use comfy_table::Cell;

/// Renders a quote breakdown table followed by the total line.
pub fn display_quote(estimator: &Estimator, view: &QuoteView) -> String {
    let pricing = estimator.pricing();
    let spec = pricing.formula().spec();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Item"),
        ui::header_cell(&format!("Amount ({})", view.currency)),
    ]);
    table.add_row(vec![
        Cell::new("Duration"),
        ui::amount_cell(&format!("{:.2} min", view.duration_minutes)),
    ]);
    table.add_row(vec![
        Cell::new("Formula"),
        ui::amount_cell(&format!(
            "{} {}  (A={}, B={})",
            spec.name,
            spec.equation,
            pricing.param_a(),
            pricing.param_b()
        )),
    ]);
    table.add_row(vec![Cell::new("Base fee"), ui::amount_cell(&view.base_fee)]);
    table.add_row(vec![
        Cell::new("Rate per minute"),
        ui::amount_cell(&view.rate_per_minute),
    ]);
    table.add_row(vec![
        Cell::new("Processing cost"),
        ui::amount_cell(&view.processing_cost),
    ]);
    table.add_row(vec![
        Cell::new("Average per minute"),
        ui::amount_cell(&view.avg_per_minute),
    ]);
    table.add_row(vec![Cell::new("Total"), ui::total_cell(&view.total)]);

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Processing quote", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\n{}: {}",
        ui::style_text("Total", ui::StyleType::TotalLabel),
        ui::style_text(&view.total, ui::StyleType::TotalValue)
    ));
    if view.using_fallback_rate {
        output.push_str(&format!("\n{}", ui::fallback_notice()));
    }
    output
}

pub async fn run(estimator: &Estimator, offline: bool) -> Result<()> {
    if !offline {
        ui::refresh_with_spinner(estimator.rates()).await;
    }
    println!("{}", display_quote(estimator, &estimator.view()));
    Ok(())
}
