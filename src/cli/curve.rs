use super::ui;
use crate::core::{ChartAdapter, CurvePoint, Estimator};
use anyhow::{Result, bail};
use comfy_table::Cell;

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const MAX_SPARK_WIDTH: usize = 60;

/// Index of the sample closest to `duration`.
fn nearest_index(points: &[CurvePoint], duration: f64) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (a.duration - duration)
                .abs()
                .total_cmp(&(b.duration - duration).abs())
        })
        .map(|(i, _)| i)
}

/// Renders totals as a one-line bar chart, downsampled to at most `width` columns.
pub fn sparkline(points: &[CurvePoint], width: usize) -> Vec<CurvePoint> {
    if points.is_empty() || width == 0 {
        return Vec::new();
    }
    let stride = points.len().div_ceil(width);
    let mut sampled: Vec<CurvePoint> = points.iter().step_by(stride).copied().collect();
    if let (Some(last), Some(kept)) = (points.last(), sampled.last())
        && kept.duration != last.duration
    {
        sampled.push(*last);
    }
    sampled
}

fn bars(points: &[CurvePoint]) -> String {
    let min = points.iter().map(|p| p.total).fold(f64::INFINITY, f64::min);
    let max = points
        .iter()
        .map(|p| p.total)
        .fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    points
        .iter()
        .map(|p| {
            let level = if span > 0.0 {
                (((p.total - min) / span) * (BARS.len() - 1) as f64).round() as usize
            } else {
                0
            };
            BARS[level.min(BARS.len() - 1)]
        })
        .collect()
}

/// Chart adapter that draws the curve as a sparkline with a caret under the
/// current duration.
#[derive(Default)]
pub struct TerminalChart {
    points: Vec<CurvePoint>,
    last_render: Option<String>,
}

impl TerminalChart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_render(&self) -> Option<&str> {
        self.last_render.as_deref()
    }

    fn render(&self, marker: CurvePoint) -> Option<String> {
        let sampled = sparkline(&self.points, MAX_SPARK_WIDTH);
        let column = nearest_index(&sampled, marker.duration)?;
        Some(format!(
            "{}\n{}^ {:.0} min",
            bars(&sampled),
            " ".repeat(column),
            marker.duration
        ))
    }
}

impl ChartAdapter for TerminalChart {
    fn draw_curve(&mut self, points: &[CurvePoint]) -> Result<()> {
        if points.is_empty() {
            bail!("No samples to draw");
        }
        self.points = points.to_vec();
        Ok(())
    }

    fn draw_marker(&mut self, point: CurvePoint) -> Result<()> {
        let Some(rendered) = self.render(point) else {
            bail!("Marker drawn before the curve");
        };
        println!("{}", ui::style_text(&rendered, ui::StyleType::Subtle));
        self.last_render = Some(rendered);
        Ok(())
    }
}

/// Renders the sampled curve as a table with the current duration highlighted.
pub fn display_curve(estimator: &Estimator, points: &[CurvePoint]) -> String {
    let currency = estimator.currency();
    let formatter = estimator.formatter();
    let marker = nearest_index(points, estimator.duration_minutes());

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Duration (min)"),
        ui::header_cell(&format!("Total ({currency})")),
        ui::header_cell("Per minute"),
    ]);
    for (i, point) in points.iter().enumerate() {
        let total = formatter.format(point.total, currency);
        let per_minute = if point.duration > 0.0 {
            formatter.format(point.total / point.duration, currency)
        } else {
            "-".to_string()
        };
        if Some(i) == marker {
            table.add_row(vec![
                ui::total_cell(&format!("{:.0} ◀", point.duration)),
                ui::total_cell(&total),
                ui::total_cell(&per_minute),
            ]);
        } else {
            table.add_row(vec![
                Cell::new(format!("{:.0}", point.duration)),
                ui::amount_cell(&total),
                ui::amount_cell(&per_minute),
            ]);
        }
    }

    let spec = estimator.pricing().formula().spec();
    let mut output = format!(
        "{} {}\n\n",
        ui::style_text(&format!("Price curve: {}", spec.name), ui::StyleType::Title),
        ui::style_text(spec.equation, ui::StyleType::Subtle)
    );
    output.push_str(&table.to_string());
    if estimator.view().using_fallback_rate {
        output.push_str(&format!("\n{}", ui::fallback_notice()));
    }
    output
}

pub async fn run(estimator: &Estimator, offline: bool) -> Result<()> {
    if !offline {
        ui::refresh_with_spinner(estimator.rates()).await;
    }
    let points = estimator.curve()?;
    println!("{}", display_curve(estimator, &points));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(totals: &[f64]) -> Vec<CurvePoint> {
        totals
            .iter()
            .enumerate()
            .map(|(i, total)| CurvePoint {
                duration: i as f64 * 10.0,
                total: *total,
            })
            .collect()
    }

    #[test]
    fn test_sparkline_downsamples_and_keeps_endpoints() {
        let curve = points(&(0..101).map(f64::from).collect::<Vec<_>>());
        let sampled = sparkline(&curve, 60);
        assert!(sampled.len() <= 61);
        assert_eq!(sampled.first().unwrap().duration, 0.0);
        assert_eq!(sampled.last().unwrap().duration, 1000.0);
    }

    #[test]
    fn test_bars_scale_between_min_and_max() {
        let rendered = bars(&points(&[1.0, 2.0, 3.0]));
        assert_eq!(rendered, "▁▅█");
        assert_eq!(bars(&points(&[4.0, 4.0])), "▁▁");
    }

    #[test]
    fn test_terminal_chart_marks_current_duration() {
        let mut chart = TerminalChart::new();
        assert!(
            chart
                .draw_marker(CurvePoint {
                    duration: 0.0,
                    total: 0.0
                })
                .is_err()
        );

        chart.draw_curve(&points(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        chart
            .draw_marker(CurvePoint {
                duration: 19.0,
                total: 3.0,
            })
            .unwrap();
        let render = chart.last_render().unwrap();
        let mut lines = render.lines();
        assert_eq!(lines.next().unwrap().chars().count(), 4);
        assert_eq!(lines.next().unwrap(), "  ^ 19 min");
    }

    #[test]
    fn test_empty_curve_rejected() {
        let mut chart = TerminalChart::new();
        assert!(chart.draw_curve(&[]).is_err());
    }
}
