//! Price trend report.
//!
//! A read-only consumer of the history table: one line series per
//! product, rendered to an SVG artifact. Rows it cannot interpret
//! (unparseable timestamps, empty price cells) are skipped; legacy rows
//! that only carry the old single `Price` column still plot.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use super::history_store::{HistoryTable, TIMESTAMP_FORMAT};

type Series = BTreeMap<String, Vec<(DateTime<Utc>, f64)>>;

/// Render the per-product price trend chart. An empty or unplottable
/// table produces no artifact and is not an error.
pub fn render_price_trends(table: &HistoryTable, output: &Path) -> Result<()> {
    let series = collect_series(table);
    if series.is_empty() {
        warn!("No plottable price history; skipping report");
        return Ok(());
    }

    let mut x_from = DateTime::<Utc>::MAX_UTC;
    let mut x_to = DateTime::<Utc>::MIN_UTC;
    let mut y_max = 0f64;
    for points in series.values() {
        for (timestamp, price) in points {
            x_from = x_from.min(*timestamp);
            x_to = x_to.max(*timestamp);
            y_max = y_max.max(*price);
        }
    }
    // A single-run history still needs a non-degenerate axis.
    if x_to <= x_from {
        x_to = x_from + Duration::hours(1);
    }
    let y_max = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    let root = SVGBackend::new(output, (1280, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Product Price Trends", ("sans-serif", 32))
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(64)
        .build_cartesian_2d(x_from..x_to, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_label_formatter(&|timestamp| timestamp.format("%Y-%m-%d %H:%M").to_string())
        .x_desc("Date")
        .y_desc("Price (BGN)")
        .draw()?;

    for (index, (product, points)) in series.iter().enumerate() {
        let color = Palette99::pick(index).mix(0.9);
        let line_style = color.stroke_width(2);

        chart
            .draw_series(LineSeries::new(points.iter().copied(), line_style))?
            .label(product.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], line_style));
        chart.draw_series(
            points
                .iter()
                .map(|(timestamp, price)| Circle::new((*timestamp, *price), 3, color.filled())),
        )?;
    }

    let legend_background = WHITE.mix(0.8);
    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&legend_background)
        .draw()?;

    root.present()
        .with_context(|| format!("failed to write report to {:?}", output))?;
    info!("Price trend report written to {:?}", output);
    Ok(())
}

/// Group plottable rows by product, in row (append) order per product.
fn collect_series(table: &HistoryTable) -> Series {
    let Some(timestamp_idx) = table.column_index("Timestamp") else {
        return Series::new();
    };
    let Some(product_idx) = table.column_index("Product") else {
        return Series::new();
    };
    let selling_idx = table.column_index("Selling_Price");
    let legacy_idx = table.column_index("Price");

    let mut series = Series::new();
    for row in &table.rows {
        let Some(product) = cell(row, Some(product_idx)) else {
            continue;
        };
        let Some(timestamp) = cell(row, Some(timestamp_idx)).and_then(parse_timestamp) else {
            debug!("Skipping row with unparseable timestamp for '{}'", product);
            continue;
        };
        let price = cell(row, selling_idx)
            .or_else(|| cell(row, legacy_idx))
            .and_then(|text| text.parse::<f64>().ok());
        let Some(price) = price else {
            debug!("Skipping row without a plottable price for '{}'", product);
            continue;
        };

        series
            .entry(product.to_string())
            .or_default()
            .push((timestamp, price));
    }
    series
}

fn cell(row: &[String], index: Option<usize>) -> Option<&str> {
    index
        .and_then(|i| row.get(i))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> HistoryTable {
        HistoryTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| v.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn renders_an_svg_for_canonical_history() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("price_trends.svg");
        let history = table(
            &["Timestamp", "Product", "Selling_Price", "Buying_Price", "URL"],
            &[
                &["2025-03-13 09:30:00", "Coin X", "120.00", "115.00", ""],
                &["2025-03-14 09:30:00", "Coin X", "125.00", "120.00", ""],
                &["2025-03-14 09:30:00", "Coin Y", "99.00", "", ""],
            ],
        );

        render_price_trends(&history, &output).unwrap();

        let svg = std::fs::read_to_string(&output).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Coin X"));
    }

    #[test]
    fn legacy_price_column_still_plots() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("price_trends.svg");
        let history = table(
            &["Timestamp", "Product", "Price", "URL"],
            &[&["2024-01-01 10:00:00", "Coin X", "110.00", ""]],
        );

        render_price_trends(&history, &output).unwrap();

        assert!(output.exists());
    }

    #[test]
    fn empty_history_produces_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("price_trends.svg");
        let history = HistoryTable::with_canonical_columns();

        render_price_trends(&history, &output).unwrap();

        assert!(!output.exists());
    }

    #[test]
    fn unparseable_rows_are_skipped_not_fatal() {
        let history = table(
            &["Timestamp", "Product", "Selling_Price"],
            &[
                &["not a date", "Coin X", "10.00"],
                &["2025-03-14 09:30:00", "Coin X", "sold"],
                &["2025-03-14 09:30:00", "Coin X", "12.00"],
            ],
        );

        let series = collect_series(&history);
        assert_eq!(series.len(), 1);
        assert_eq!(series["Coin X"].len(), 1);
    }
}
