//! Tickertape Runner: ingestion and enrichment orchestration.
//!
//! This crate builds on `tickertape-core` to provide:
//! - Pipeline configuration (TOML)
//! - Cursor/scan dedup deciding which documents still need ingesting
//! - The per-document tagging pipeline and its commit loop
//! - Ticker signal enrichment on a round-robin worker pool
//! - Market index enrichment
//! - Full-run orchestration with per-stage reports

pub mod config;
pub mod dedup;
pub mod enrich;
pub mod ingest;
pub mod market;
pub mod pipeline;

pub use config::{ConfigError, EnrichmentConfig, PipelineConfig, ProviderConfig};
pub use dedup::{plan_pending, PendingPlan, ScanStrategy};
pub use enrich::{
    enrich_ticker, partition_round_robin, run_enrichment, EnrichError, EnrichmentReport,
    TickerOutcome,
};
pub use ingest::{ingest_source, DocumentError, DocumentTagger, IngestError, IngestReport};
pub use market::{enrich_market, MarketReport};
pub use pipeline::{
    run_enrich, run_ingest, run_pipeline, EnrichSummary, PipelineContext, RunError, RunSummary,
};
