use chrono::Utc;

use crate::client::StatsQuery;
use crate::stats::{DailyOrders, StatsSnapshot};

/// Renders a plain-text analysis of one fetched snapshot.
pub fn generate_report(query: &StatsQuery, stats: &StatsSnapshot) -> String {
    let mut report = String::new();

    report.push_str("═══════════════════════════════════════════════════════════════════\n");
    report.push_str("                     Print Shop Analytics Report                     \n");
    report.push_str("═══════════════════════════════════════════════════════════════════\n\n");

    report.push_str(&format!(
        "Generated:      {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!("Lookback:       last {} days\n", query.days));
    report.push_str(&format!("Printer filter: {}\n\n", query.printer));

    // Order Volume
    report.push_str("───────────────────────────────────────────────────────────────────\n");
    report.push_str("                            ORDER VOLUME                             \n");
    report.push_str("───────────────────────────────────────────────────────────────────\n\n");
    let total = total_orders(&stats.orders_per_day);
    report.push_str(&format!("  Total Orders:      {:>8}\n", total));
    if !stats.orders_per_day.is_empty() {
        report.push_str(&format!(
            "  Daily Average:     {:>8.1}\n",
            total as f64 / stats.orders_per_day.len() as f64
        ));
    }
    if let Some(peak) = busiest_day(&stats.orders_per_day) {
        report.push_str(&format!(
            "  Busiest Day:       {:>8} orders on {}\n",
            peak.count, peak.date
        ));
    }
    report.push('\n');

    // Order Status
    report.push_str("───────────────────────────────────────────────────────────────────\n");
    report.push_str("                            ORDER STATUS                             \n");
    report.push_str("───────────────────────────────────────────────────────────────────\n\n");
    if stats.order_status.is_empty() {
        report.push_str("  No orders recorded.\n");
    }
    for status in &stats.order_status {
        report.push_str(&format!("  {:<20} {:>6}\n", status.status, status.count));
    }
    report.push('\n');

    // Filament Usage
    report.push_str("───────────────────────────────────────────────────────────────────\n");
    report.push_str("                           FILAMENT USAGE                            \n");
    report.push_str("───────────────────────────────────────────────────────────────────\n\n");
    let grams_total: f64 = stats.filament_usage.iter().map(|f| f.grams).sum();
    if stats.filament_usage.is_empty() {
        report.push_str("  No filament usage recorded.\n");
    }
    for filament in &stats.filament_usage {
        let share = if grams_total > 0.0 {
            filament.grams / grams_total * 100.0
        } else {
            0.0
        };
        report.push_str(&format!(
            "  {:<12} {:>10.1} g  ({:>5.1}%)\n",
            filament.material, filament.grams, share
        ));
    }
    if grams_total > 0.0 {
        report.push_str(&format!("  {:<12} {:>10.1} g\n", "Total", grams_total));
    }
    report.push('\n');

    // Printer Utilization
    report.push_str("───────────────────────────────────────────────────────────────────\n");
    report.push_str("                         PRINTER UTILIZATION                         \n");
    report.push_str("───────────────────────────────────────────────────────────────────\n\n");
    let jobs_total: u64 = stats.printer_utilization.iter().map(|p| p.jobs).sum();
    if stats.printer_utilization.is_empty() {
        report.push_str("  No printers recorded.\n");
    }
    for printer in &stats.printer_utilization {
        let share = if jobs_total > 0 {
            printer.jobs as f64 / jobs_total as f64 * 100.0
        } else {
            0.0
        };
        report.push_str(&format!(
            "  {:<20} {:>6} jobs  ({:>5.1}%)\n",
            printer.printer, printer.jobs, share
        ));
    }
    report.push('\n');
    report.push_str("═══════════════════════════════════════════════════════════════════\n");

    report
}

fn total_orders(days: &[DailyOrders]) -> u64 {
    days.iter().map(|d| d.count).sum()
}

fn busiest_day(days: &[DailyOrders]) -> Option<&DailyOrders> {
    days.iter().max_by_key(|d| d.count)
}
