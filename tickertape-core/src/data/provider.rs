//! Market-data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over price sources (Yahoo Finance, CSV
//! import, synthetic) so the enrichment engine can swap implementations and
//! tests can inject failures per symbol.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLCV bar as delivered by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adj_close: f64,
}

/// Structured error types for market-data operations.
///
/// Every variant is per-symbol: the enrichment engine logs it and moves on
/// to the next ticker.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no bars for {symbol} between {start} and {end}")]
    EmptyWindow {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("csv import error: {0}")]
    CsvImport(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<RawBar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

/// Inclusive date range a provider is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LookbackWindow {
    /// The `days`-long window ending on `as_of`.
    pub fn trailing(as_of: NaiveDate, days: u32) -> Self {
        Self {
            start: as_of - Duration::days(i64::from(days)),
            end: as_of,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Trait for market-data providers.
///
/// Implementations return bars sorted by ascending date. Providers may retry
/// transport failures internally; callers never retry within a run.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a symbol over a date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;

    /// Fetch the bars inside `window`.
    fn fetch_window(&self, symbol: &str, window: LookbackWindow) -> Result<FetchResult, DataError> {
        self.fetch(symbol, window.start, window.end)
    }
}
