use super::ui;
use crate::core::formula::{self, ParamBounds};
use anyhow::Result;
use comfy_table::Cell;

fn bounds_label(bounds: &ParamBounds) -> String {
    format!(
        "{} – {} (default {}, step {})",
        bounds.min, bounds.max, bounds.default, bounds.step
    )
}

pub fn display_formulas() -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Name"),
        ui::header_cell("Rate per minute"),
        ui::header_cell("A"),
        ui::header_cell("B"),
    ]);
    for spec in formula::all() {
        table.add_row(vec![
            Cell::new(spec.id.as_str()),
            Cell::new(spec.name),
            Cell::new(spec.equation),
            Cell::new(bounds_label(&spec.a)),
            Cell::new(bounds_label(&spec.b)),
        ]);
    }
    format!(
        "{}\n\n{}",
        ui::style_text("Pricing formulas", ui::StyleType::Title),
        table
    )
}

pub fn run() -> Result<()> {
    println!("{}", display_formulas());
    Ok(())
}
