//! Deviation signals derived from daily price series.
//!
//! Each trading day is reduced to small integer buckets describing how far
//! the day moved from its recent past: close-to-close change, volume against
//! the trailing three-day average, and intraday range.

pub mod deviation;

pub use deviation::{
    bucket, compute_market_signals, compute_ticker_signals, price_buckets, range_buckets,
    volume_buckets, VOLUME_BUCKET_WIDTH, VOLUME_WINDOW,
};
