//! Market index enrichment.
//!
//! One fetch of the volatility index series serves every record: each date
//! with a bar broadcasts its signal to all records of that date whose market
//! enrichment is still pending, whatever their ticker.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tickertape_core::data::DataProvider;
use tickertape_core::signals::compute_market_signals;
use tickertape_core::store::{SentenceStore, StoreError};

use crate::config::EnrichmentConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketReport {
    pub index_symbol: String,
    /// True when nothing was pending and no fetch was made.
    pub skipped: bool,
    pub fetch_error: Option<String>,
    /// Pending dates that had an index bar.
    pub dates_applied: usize,
    /// Pending dates without an index bar; they stay pending.
    pub dates_deferred: usize,
    pub records_updated: usize,
}

pub fn enrich_market(
    store: &dyn SentenceStore,
    provider: &dyn DataProvider,
    config: &EnrichmentConfig,
) -> Result<MarketReport, StoreError> {
    let index_symbol = config.index_symbol.as_str();
    let mut report = MarketReport {
        index_symbol: index_symbol.to_string(),
        ..MarketReport::default()
    };

    if !store.has_pending_market()? {
        report.skipped = true;
        info!(index = index_symbol, "no pending market enrichment");
        return Ok(report);
    }

    let fetched = match provider.fetch_window(index_symbol, config.window()) {
        Ok(fetched) => fetched,
        Err(e) => {
            warn!(index = index_symbol, error = %e, "index fetch failed; market enrichment deferred");
            report.fetch_error = Some(e.to_string());
            return Ok(report);
        }
    };

    let signals = compute_market_signals(&fetched.bars);
    for date in store.pending_market_dates()? {
        match signals.get(&date) {
            Some(signal) => {
                report.dates_applied += 1;
                report.records_updated += store.apply_market_signal(date, *signal)?;
            }
            None => report.dates_deferred += 1,
        }
    }

    info!(
        index = index_symbol,
        dates = report.dates_applied,
        deferred = report.dates_deferred,
        updated = report.records_updated,
        "market enrichment finished"
    );
    Ok(report)
}
