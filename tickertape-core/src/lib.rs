//! Tickertape Core: news tagging, deviation signals, market data, sentence store.
//!
//! This crate contains the algorithmic heart of the enrichment pipeline:
//! - Domain types (raw documents, tagged sentences, enrichment status, sequence ids)
//! - Text normalization ahead of sentence segmentation
//! - Annotator trait plus a rule-based default annotator
//! - Ticker extraction with carry-forward and backfill
//! - Deviation-bucket math for ticker and index price series
//! - Market-data providers (Yahoo, CSV import, synthetic) behind one trait
//! - Sentence store trait with guarded `Pending -> Enriched` transitions

pub mod data;
pub mod domain;
pub mod signals;
pub mod store;
pub mod text;
