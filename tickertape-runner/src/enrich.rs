//! Ticker signal enrichment.
//!
//! Each ticker with pending records gets one price fetch over the lookback
//! window; every pending record whose date has a bar receives that day's
//! signal through the store's guarded write. Tickers are split round-robin
//! over a private worker pool. A failed fetch only affects its own ticker:
//! its records stay pending until a later run.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use tickertape_core::data::{DataProvider, LookbackWindow, TickerUniverse};
use tickertape_core::signals::compute_ticker_signals;
use tickertape_core::store::{SentenceStore, StoreError};

use crate::config::EnrichmentConfig;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("sentence store: {0}")]
    Store(#[from] StoreError),

    #[error("build worker pool: {0}")]
    Pool(String),
}

/// What happened to one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickerOutcome {
    /// Nothing pending; no fetch was made.
    NoPending,
    Enriched {
        /// Records this call moved to `Enriched`.
        updated: usize,
        /// Records another writer enriched first.
        lost_races: usize,
        /// Records dated on a day with no bar (weekend, holiday, outside window).
        deferred: usize,
    },
    FetchFailed {
        error: String,
    },
}

/// Enrich every pending record of `ticker`.
pub fn enrich_ticker(
    ticker: &str,
    store: &dyn SentenceStore,
    provider: &dyn DataProvider,
    window: LookbackWindow,
) -> Result<TickerOutcome, StoreError> {
    let pending = store.pending_for_ticker(ticker)?;
    if pending.is_empty() {
        return Ok(TickerOutcome::NoPending);
    }

    let symbol = TickerUniverse::market_symbol(ticker);
    let fetched = match provider.fetch_window(&symbol, window) {
        Ok(fetched) => fetched,
        Err(e) => {
            warn!(ticker, symbol = %symbol, error = %e, "price fetch failed; records stay pending");
            return Ok(TickerOutcome::FetchFailed {
                error: e.to_string(),
            });
        }
    };

    let signals = compute_ticker_signals(&fetched.bars);
    let (mut updated, mut lost_races, mut deferred) = (0, 0, 0);
    for record in &pending {
        let Some(signal) = signals.get(&record.date) else {
            deferred += 1;
            continue;
        };
        if store.apply_ticker_signal(&record.key, *signal)? {
            updated += 1;
        } else {
            lost_races += 1;
        }
    }

    debug!(
        ticker,
        bars = fetched.bars.len(),
        updated,
        lost_races,
        deferred,
        "enriched ticker"
    );
    Ok(TickerOutcome::Enriched {
        updated,
        lost_races,
        deferred,
    })
}

/// Split `tickers` into at most `workers` partitions; ticker `i` goes to `i % workers`.
pub fn partition_round_robin(tickers: &[String], workers: usize) -> Vec<Vec<&str>> {
    let parts = workers.max(1).min(tickers.len());
    let mut out: Vec<Vec<&str>> = vec![Vec::new(); parts];
    for (i, ticker) in tickers.iter().enumerate() {
        out[i % parts].push(ticker.as_str());
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentReport {
    pub tickers: usize,
    pub skipped_no_pending: usize,
    pub enriched_tickers: usize,
    pub records_updated: usize,
    pub lost_races: usize,
    pub deferred: usize,
    /// Tickers whose fetch failed, in universe order.
    pub fetch_failures: Vec<String>,
}

impl EnrichmentReport {
    fn absorb(&mut self, ticker: &str, outcome: &TickerOutcome) {
        self.tickers += 1;
        match outcome {
            TickerOutcome::NoPending => self.skipped_no_pending += 1,
            TickerOutcome::Enriched {
                updated,
                lost_races,
                deferred,
            } => {
                self.enriched_tickers += 1;
                self.records_updated += updated;
                self.lost_races += lost_races;
                self.deferred += deferred;
            }
            TickerOutcome::FetchFailed { .. } => self.fetch_failures.push(ticker.to_string()),
        }
    }
}

/// Enrich every ticker of the universe on a pool of `config.workers` threads.
pub fn run_enrichment(
    universe: &TickerUniverse,
    store: &dyn SentenceStore,
    provider: &dyn DataProvider,
    config: &EnrichmentConfig,
) -> Result<EnrichmentReport, EnrichError> {
    let window = config.window();
    let partitions = partition_round_robin(universe.tickers(), config.workers);
    if partitions.is_empty() {
        return Ok(EnrichmentReport::default());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(partitions.len())
        .thread_name(|i| format!("enrich-{i}"))
        .build()
        .map_err(|e| EnrichError::Pool(e.to_string()))?;

    info!(
        tickers = universe.len(),
        workers = partitions.len(),
        start = %window.start,
        end = %window.end,
        provider = provider.name(),
        "enriching tickers"
    );

    let results: Vec<Result<Vec<(&str, TickerOutcome)>, StoreError>> = pool.install(|| {
        partitions
            .par_iter()
            .map(|part| {
                part.iter()
                    .map(|&ticker| {
                        enrich_ticker(ticker, store, provider, window).map(|o| (ticker, o))
                    })
                    .collect::<Result<Vec<_>, StoreError>>()
            })
            .collect()
    });

    let mut outcomes = Vec::with_capacity(universe.len());
    for part in results {
        outcomes.extend(part?);
    }
    // Report failures in universe order regardless of partitioning.
    let order: std::collections::HashMap<&str, usize> = universe
        .tickers()
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();
    outcomes.sort_by_key(|(t, _)| order.get(t).copied().unwrap_or(usize::MAX));

    let mut report = EnrichmentReport::default();
    for (ticker, outcome) in &outcomes {
        report.absorb(ticker, outcome);
    }

    info!(
        tickers = report.tickers,
        enriched = report.enriched_tickers,
        skipped = report.skipped_no_pending,
        updated = report.records_updated,
        deferred = report.deferred,
        failures = report.fetch_failures.len(),
        "ticker enrichment finished"
    );
    Ok(report)
}
