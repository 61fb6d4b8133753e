//! Full run: ingest every configured source, then enrich tickers, then the
//! market index. Each stage can also be run on its own; all of them resume
//! safely after an interruption.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use tickertape_core::data::{DataProvider, DocumentSource, TickerUniverse};
use tickertape_core::store::{SentenceStore, StoreError, StoreStats};
use tickertape_core::text::Annotator;

use crate::config::PipelineConfig;
use crate::enrich::{run_enrichment, EnrichError, EnrichmentReport};
use crate::ingest::{ingest_source, DocumentTagger, IngestError, IngestReport};
use crate::market::{enrich_market, MarketReport};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("ticker universe is empty")]
    EmptyUniverse,

    #[error("ingest: {0}")]
    Ingest(#[from] IngestError),

    #[error("enrichment: {0}")]
    Enrich(#[from] EnrichError),

    #[error("sentence store: {0}")]
    Store(#[from] StoreError),
}

/// Everything a run needs, borrowed from the caller.
pub struct PipelineContext<'a> {
    pub config: &'a PipelineConfig,
    pub universe: &'a TickerUniverse,
    pub documents: &'a dyn DocumentSource,
    pub annotator: &'a dyn Annotator,
    pub store: &'a dyn SentenceStore,
    pub provider: &'a dyn DataProvider,
}

impl PipelineContext<'_> {
    fn require_universe(&self) -> Result<(), RunError> {
        if self.universe.is_empty() {
            return Err(RunError::EmptyUniverse);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichSummary {
    pub tickers: EnrichmentReport,
    pub market: MarketReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ingest: Vec<IngestReport>,
    pub enrichment: EnrichmentReport,
    pub market: MarketReport,
    pub store: StoreStats,
}

/// Ingest every configured source, in configured order.
pub fn run_ingest(ctx: &PipelineContext<'_>) -> Result<Vec<IngestReport>, RunError> {
    ctx.require_universe()?;
    let tagger = DocumentTagger::new(ctx.annotator, ctx.universe);
    ctx.config
        .sources
        .iter()
        .map(|&source| {
            ingest_source(source, ctx.documents, ctx.store, &tagger).map_err(RunError::from)
        })
        .collect()
}

/// Ticker enrichment followed by market enrichment.
pub fn run_enrich(ctx: &PipelineContext<'_>) -> Result<EnrichSummary, RunError> {
    ctx.require_universe()?;
    let tickers = run_enrichment(ctx.universe, ctx.store, ctx.provider, &ctx.config.enrichment)?;
    let market = enrich_market(ctx.store, ctx.provider, &ctx.config.enrichment)?;
    Ok(EnrichSummary { tickers, market })
}

pub fn run_pipeline(ctx: &PipelineContext<'_>) -> Result<RunSummary, RunError> {
    ctx.require_universe()?;
    info!(
        fund = ctx.universe.fund(),
        tickers = ctx.universe.len(),
        sources = ctx.config.sources.len(),
        "starting pipeline run"
    );

    let ingest = run_ingest(ctx)?;
    let EnrichSummary { tickers, market } = run_enrich(ctx)?;
    let store = ctx.store.stats()?;

    info!(
        records = store.records,
        ticker_pending = store.ticker_pending,
        market_pending = store.market_pending,
        "pipeline run finished"
    );
    Ok(RunSummary {
        ingest,
        enrichment: tickers,
        market,
        store,
    })
}
