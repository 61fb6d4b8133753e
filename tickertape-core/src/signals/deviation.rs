//! Deviation buckets.
//!
//! price[t]  = round((close[t] - close[t-1]) / close[t-1] * 100)         t >= 1
//! volume[t] = round((vol[t] - avg(vol[t-3..t])) / avg * 100 / 5)        t >= 3
//! range[t]  = round((high[t] - low[t]) / low[t] * 100)                  all t
//!
//! Days before a formula's lookback is satisfied get bucket 0. Rounding is
//! half-to-even. Zero or non-finite denominators give 0 instead of NaN.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::data::RawBar;
use crate::domain::{MarketSignal, TickerSignal};

/// Trailing days averaged for the volume bucket.
pub const VOLUME_WINDOW: usize = 3;

/// Percentage points per volume bucket.
pub const VOLUME_BUCKET_WIDTH: f64 = 5.0;

/// `round((value - reference) / reference * 100 / width)`, or 0 when undefined.
pub fn bucket(value: f64, reference: f64, width: f64) -> i32 {
    if reference == 0.0 || !reference.is_finite() || !value.is_finite() {
        return 0;
    }
    let pct = (value - reference) / reference * 100.0 / width;
    if !pct.is_finite() {
        return 0;
    }
    // `as` saturates at the i32 bounds.
    pct.round_ties_even() as i32
}

pub fn price_buckets(bars: &[RawBar]) -> Vec<i32> {
    let mut out = vec![0; bars.len()];
    for t in 1..bars.len() {
        out[t] = bucket(bars[t].close, bars[t - 1].close, 1.0);
    }
    out
}

pub fn volume_buckets(bars: &[RawBar]) -> Vec<i32> {
    let mut out = vec![0; bars.len()];
    for t in VOLUME_WINDOW..bars.len() {
        let avg = bars[t - VOLUME_WINDOW..t]
            .iter()
            .map(|b| b.volume as f64)
            .sum::<f64>()
            / VOLUME_WINDOW as f64;
        out[t] = bucket(bars[t].volume as f64, avg, VOLUME_BUCKET_WIDTH);
    }
    out
}

pub fn range_buckets(bars: &[RawBar]) -> Vec<i32> {
    bars.iter().map(|b| bucket(b.high, b.low, 1.0)).collect()
}

/// Per-day signals for a ticker, keyed by trading date.
///
/// `bars` must be date-ascending. A duplicated date keeps its first bar's signal.
pub fn compute_ticker_signals(bars: &[RawBar]) -> BTreeMap<NaiveDate, TickerSignal> {
    let price = price_buckets(bars);
    let volume = volume_buckets(bars);
    let range = range_buckets(bars);

    let mut out = BTreeMap::new();
    for (t, bar) in bars.iter().enumerate() {
        out.entry(bar.date).or_insert(TickerSignal {
            price_bucket: price[t],
            volume_bucket: volume[t],
            range_bucket: range[t],
        });
    }
    out
}

/// Per-day signals for the market index, using the price and volume formulas.
pub fn compute_market_signals(bars: &[RawBar]) -> BTreeMap<NaiveDate, MarketSignal> {
    let price = price_buckets(bars);
    let volume = volume_buckets(bars);

    let mut out = BTreeMap::new();
    for (t, bar) in bars.iter().enumerate() {
        out.entry(bar.date).or_insert(MarketSignal {
            index_price_bucket: price[t],
            index_volume_bucket: volume[t],
        });
    }
    out
}
