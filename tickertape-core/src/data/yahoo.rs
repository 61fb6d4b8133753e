//! Yahoo Finance price provider.
//!
//! Daily bars come from the v8 chart endpoint. Transport failures are retried
//! with exponential backoff inside one `fetch`; bans and repeated rate limits
//! trip the shared circuit breaker so the whole worker pool backs off.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const CHART_ENDPOINT: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartSeries>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartSeries {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Vec<Option<f64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Yahoo spells share classes with a dash: `BRK.B` is `BRK-B`.
    fn yahoo_symbol(symbol: &str) -> String {
        symbol.replace(['.', '_'], "-")
    }

    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = (end + chrono::Duration::days(1))
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp()
            - 1;
        format!(
            "{CHART_ENDPOINT}/{}?period1={start_ts}&period2={end_ts}&interval=1d&includeAdjustedClose=true",
            Self::yahoo_symbol(symbol)
        )
    }

    /// Decode a chart response body into ascending, in-window bars.
    fn parse_body(
        symbol: &str,
        body: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, DataError> {
        let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
            DataError::ResponseFormatChanged(format!("decode chart for {symbol}: {e}"))
        })?;

        let series = match (resp.chart.result, resp.chart.error) {
            (Some(result), _) => result
                .into_iter()
                .next()
                .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?,
            (None, Some(err)) if err.code == "Not Found" => {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            }
            (None, Some(err)) => {
                return Err(DataError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                )))
            }
            (None, None) => {
                return Err(DataError::ResponseFormatChanged(
                    "empty result with no error".into(),
                ))
            }
        };

        let timestamps = series.timestamp.unwrap_or_default();
        let quote = series
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;
        let adj = series
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;
            if date < start || date > end {
                continue;
            }

            let at = |col: &Vec<Option<f64>>| col.get(i).copied().flatten();
            let (open, high, low, close) = (at(&quote.open), at(&quote.high), at(&quote.low), at(&quote.close));
            let volume = quote.volume.get(i).copied().flatten();

            // Trading halts and holidays come back as all-null rows.
            let Some(close) = close else { continue };

            bars.push(RawBar {
                date,
                open: open.unwrap_or(close),
                high: high.unwrap_or(close),
                low: low.unwrap_or(close),
                close,
                volume: volume.unwrap_or(0),
                adj_close: adj.as_ref().and_then(|v| at(v)).unwrap_or(close),
            });
        }

        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        if bars.is_empty() {
            return Err(DataError::EmptyWindow {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(bars)
    }

    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, DataError> {
        let url = Self::chart_url(symbol, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying chart request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(DataError::AuthenticationRequired(
                    "Yahoo Finance requires authentication".into(),
                ));
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after_secs = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!(symbol, retry_after_secs, "rate limited by Yahoo");
                last_error = Some(DataError::RateLimited { retry_after_secs });
                continue;
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let body = resp
                .text()
                .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
            let bars = Self::parse_body(symbol, &body, start, end)?;
            self.circuit_breaker.record_success();
            return Ok(bars);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let bars = self.fetch_with_retry(symbol, start, end)?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // 2024-01-02, 2024-01-03 (null row), 2024-01-04 at 14:30 UTC.
    const BODY: &str = r#"{"chart":{"result":[{
        "timestamp":[1704205800,1704292200,1704378600],
        "indicators":{
            "quote":[{"open":[10.0,null,11.0],"high":[10.5,null,11.5],"low":[9.5,null,10.5],
                      "close":[10.2,null,11.2],"volume":[1000,null,1500]}],
            "adjclose":[{"adjclose":[10.1,null,11.1]}]}}],"error":null}}"#;

    #[test]
    fn parses_bars_and_skips_null_rows() {
        let bars = YahooProvider::parse_body("AAPL", BODY, d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, d(2024, 1, 2));
        assert_eq!(bars[1].date, d(2024, 1, 4));
        assert_eq!(bars[1].volume, 1500);
        assert!((bars[0].adj_close - 10.1).abs() < 1e-12);
    }

    #[test]
    fn filters_to_window() {
        let bars = YahooProvider::parse_body("AAPL", BODY, d(2024, 1, 3), d(2024, 1, 31)).unwrap();
        assert_eq!(bars.len(), 1);
        let err = YahooProvider::parse_body("AAPL", BODY, d(2024, 2, 1), d(2024, 2, 28)).unwrap_err();
        assert!(matches!(err, DataError::EmptyWindow { .. }));
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let err = YahooProvider::parse_body("ZZZZ", body, d(2024, 1, 1), d(2024, 1, 31)).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { symbol } if symbol == "ZZZZ"));
    }

    #[test]
    fn garbage_is_a_format_change() {
        let err = YahooProvider::parse_body("AAPL", "<html>", d(2024, 1, 1), d(2024, 1, 31)).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    #[test]
    fn share_class_symbols_use_dash() {
        let url = YahooProvider::chart_url("BRK.B", d(2024, 1, 1), d(2024, 1, 31));
        assert!(url.contains("/chart/BRK-B?"));
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1706745599"));
    }
}
