use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One aggregated statistics snapshot from the shop backend.
///
/// A snapshot is transient: every fetch produces a whole new one that fully
/// replaces the previous values in the charts. Nothing is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub orders_per_day: Vec<DailyOrders>,
    pub order_status: Vec<StatusCount>,
    pub filament_usage: Vec<FilamentUsage>,
    pub printer_utilization: Vec<PrinterUtilization>,
}

/// Order count for one calendar day. The backend zero-fills missing days and
/// returns the sequence in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyOrders {
    pub date: String,
    pub count: u64,
}

/// Order count for one distinct status value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

/// Estimated grams of filament consumed per material type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilamentUsage {
    pub material: String,
    pub grams: f64,
}

/// Jobs assigned per printer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterUtilization {
    pub printer: String,
    pub jobs: u64,
}

/// Wrapper written by the export command: the snapshot plus the query that
/// produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ExportEnvelope {
    pub exported_at: DateTime<Utc>,
    pub days: u32,
    pub printer_id: String,
    pub stats: StatsSnapshot,
}
