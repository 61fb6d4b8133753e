//! Deterministic synthetic price provider for offline runs and tests.
//!
//! Each symbol gets its own random walk seeded from a BLAKE3 hash of
//! `(seed, symbol)`, so bars do not depend on fetch order or thread count.

use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, symbol: &str) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        StdRng::seed_from_u64(u64::from_le_bytes(bytes))
    }

    /// Weekday bars from `start` to `end`, inclusive.
    pub fn bars(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<RawBar> {
        let mut rng = self.rng_for(symbol);
        let mut close: f64 = rng.gen_range(20.0..400.0);
        let base_volume: f64 = rng.gen_range(1.0e5..5.0e6);

        let mut bars = Vec::new();
        let mut date = start;
        while date <= end {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                let open = close;
                close = (open * (1.0 + rng.gen_range(-0.03..0.03))).max(0.01);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.02));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.02));
                let volume = (base_volume * rng.gen_range(0.5..1.8)).round() as u64;
                bars.push(RawBar {
                    date,
                    open,
                    high,
                    low,
                    close,
                    volume,
                    adj_close: close,
                });
            }
            date += Duration::days(1);
        }
        bars
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(42)
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let bars = self.bars(symbol, start, end);
        if bars.is_empty() {
            return Err(DataError::EmptyWindow {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Synthetic,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn same_seed_same_bars() {
        let a = SyntheticProvider::new(7).bars("AAPL", d(2024, 1, 1), d(2024, 3, 1));
        let b = SyntheticProvider::new(7).bars("AAPL", d(2024, 1, 1), d(2024, 3, 1));
        assert_eq!(a, b);
    }

    #[test]
    fn symbols_diverge() {
        let p = SyntheticProvider::new(7);
        let a = p.bars("AAPL", d(2024, 1, 1), d(2024, 1, 31));
        let b = p.bars("MSFT", d(2024, 1, 1), d(2024, 1, 31));
        assert_ne!(a, b);
    }

    #[test]
    fn weekdays_only_and_sane_ranges() {
        let bars = SyntheticProvider::default().bars("NVDA", d(2024, 1, 1), d(2024, 1, 14));
        assert_eq!(bars.len(), 10);
        for b in &bars {
            assert!(!matches!(b.date.weekday(), Weekday::Sat | Weekday::Sun));
            assert!(b.low <= b.open.min(b.close));
            assert!(b.high >= b.open.max(b.close));
            assert!(b.volume > 0);
        }
    }

    #[test]
    fn weekend_only_window_is_empty() {
        let err = SyntheticProvider::default()
            .fetch("AAPL", d(2024, 1, 6), d(2024, 1, 7))
            .unwrap_err();
        assert!(matches!(err, DataError::EmptyWindow { .. }));
    }
}
