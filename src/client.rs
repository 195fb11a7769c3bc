use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::stats::StatsSnapshot;

/// Wire value meaning "no printer filter".
pub const ALL_PRINTERS: &str = "all";

/// Lookback window the backend assumes when none is given.
pub const DEFAULT_DAYS: u32 = 30;

/// Printer selection: one concrete printer or every printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterFilter {
    All,
    Printer(String),
}

impl PrinterFilter {
    /// The backend treats any non-numeric id as "all printers", so the
    /// sentinel and the empty string both map to [`PrinterFilter::All`].
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_PRINTERS {
            PrinterFilter::All
        } else {
            PrinterFilter::Printer(value.to_string())
        }
    }

    pub fn as_param(&self) -> &str {
        match self {
            PrinterFilter::All => ALL_PRINTERS,
            PrinterFilter::Printer(id) => id,
        }
    }
}

impl fmt::Display for PrinterFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Filter values for one stats request.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsQuery {
    pub days: u32,
    pub printer: PrinterFilter,
}

impl Default for StatsQuery {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            printer: PrinterFilter::All,
        }
    }
}

impl StatsQuery {
    /// Exact wire form. Parameter order is fixed: `days`, then `printer_id`.
    pub fn to_query_string(&self) -> String {
        format!(
            "days={}&printer_id={}",
            self.days,
            urlencoding::encode(self.printer.as_param())
        )
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a usable response: connection refused,
    /// timeout, or an HTTP error status.
    #[error("stats request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The response body was not a valid stats snapshot.
    #[error("stats response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Something that can answer a stats query. The controller only sees this
/// trait, so tests drive it with fakes instead of a live backend.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch(&self, query: &StatsQuery) -> Result<StatsSnapshot, FetchError>;
}

/// Production source: one GET against the shop backend per query.
pub struct HttpStatsClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpStatsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn stats_url(&self, query: &StatsQuery) -> String {
        format!(
            "{}/analytics/api/stats?{}",
            self.base_url,
            query.to_query_string()
        )
    }
}

#[async_trait]
impl StatsSource for HttpStatsClient {
    async fn fetch(&self, query: &StatsQuery) -> Result<StatsSnapshot, FetchError> {
        let url = self.stats_url(query);
        debug!(%url, "requesting stats");

        let response = self.http.get(&url).send().await?.error_for_status()?;
        let body = response.text().await?;
        let snapshot = serde_json::from_str(&body)?;
        Ok(snapshot)
    }
}
