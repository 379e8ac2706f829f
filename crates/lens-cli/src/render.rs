//! Table rendering for dashboard reports

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use lens_dashboard::engine::DashboardReport;
use lens_dashboard::statements::PLACEHOLDER_TEXT;

/// Print a full report as terminal tables
pub fn print_report(report: &DashboardReport) {
    println!("\n=== {} ===", report.ticker);

    if let Some(snapshot) = &report.snapshot {
        let mut table = new_table();
        table.set_header(vec!["Price", "Prev Close", "Day Range", "Volume", "P/E"]);
        table.add_row(vec![
            format!("{:.2}", snapshot.current_price),
            format!("{:.2}", snapshot.previous_close),
            format!("{:.2} - {:.2}", snapshot.day_low, snapshot.day_high),
            snapshot.volume.to_string(),
            snapshot
                .trailing_pe
                .map(|pe| format!("{pe:.1}"))
                .unwrap_or_else(|| PLACEHOLDER_TEXT.to_string()),
        ]);
        println!("{table}");
    } else {
        println!("Quote: {PLACEHOLDER_TEXT}");
    }

    if let Some(signals) = &report.signals {
        if !signals.signals.is_empty() {
            let described: Vec<String> =
                signals.signals.iter().map(|s| s.describe()).collect();
            println!("Momentum: {}", described.join(" | "));
        }
    }

    print_metrics(report);
    print_insights(report);
    print_extras(report);
}

fn print_metrics(report: &DashboardReport) {
    if report.metric_sections.is_empty() {
        return;
    }

    let mut table = new_table();
    let mut header = vec!["Metric".to_string()];
    header.extend(report.periods.iter().map(|p| p.to_string()));
    header.push("QoQ".to_string());
    header.push("YoY".to_string());
    table.set_header(header);

    for section in &report.metric_sections {
        let mut row = vec![section.name.clone()];
        for index in 0..report.periods.len() {
            row.push(section.cell(index));
        }
        let latest = section.growth.last();
        row.push(format_delta(latest.and_then(|g| g.qoq)));
        row.push(format_delta(latest.and_then(|g| g.yoy)));
        table.add_row(row);
    }
    println!("{table}");
}

fn print_insights(report: &DashboardReport) {
    for section in &report.insight_sections {
        println!("\n--- {} ---", section.kind.title());
        println!("{}", section.text);
    }
}

fn print_extras(report: &DashboardReport) {
    if !report.segments.is_empty() {
        let mut table = new_table();
        table.set_header(vec!["Segment", "Revenue ($B)", "Growth"]);
        for segment in &report.segments {
            table.add_row(vec![
                segment.label.clone(),
                format!("{:.1}", segment.value_billions),
                segment.growth.clone(),
            ]);
        }
        println!("\n{table}");
    }

    if !report.competitors.is_empty() {
        println!("\nCompetitors: {}", report.competitors.join(", "));
    }

    if !report.markets.is_empty() {
        let mut table = new_table();
        table.set_header(vec!["Prediction Market", "YES", "Volume"]);
        for market in &report.markets {
            table.add_row(vec![
                market.title.clone(),
                format!("{:.0}%", market.yes_odds * 100.0),
                format!("{:.0}", market.volume),
            ]);
        }
        println!("\n{table}");
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// "QoQ undefined" renders as a dash, never as 0% or infinity
fn format_delta(delta: Option<f64>) -> String {
    match delta {
        Some(value) => format!("{value:+.1}%"),
        None => "-".to_string(),
    }
}
