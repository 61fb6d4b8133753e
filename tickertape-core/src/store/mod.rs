//! Sentence store: durable home of tagged sentences and ingestion progress.
//!
//! Every mutation is either a whole-document commit or a guarded
//! `Pending -> Enriched` transition, so re-running any stage is safe.

pub mod jsonl;
pub mod memory;
mod state;

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{MarketSignal, NewsSource, RecordKey, TaggedSentence, TickerSignal};

pub use jsonl::JsonlStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialize store event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{news_source} document {document_id} is already committed")]
    DuplicateDocument {
        news_source: NewsSource,
        document_id: String,
    },

    #[error("record {key} already exists")]
    DuplicateRecord { key: RecordKey },

    #[error("no record with key {key}")]
    UnknownRecord { key: RecordKey },

    #[error("{path} line {line}: {reason}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("store lock poisoned by a panicked writer")]
    Poisoned,
}

/// All records of one document plus the cursor advance, applied as one unit.
///
/// A document that yields no records is still committed so later scans
/// recognize it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentCommit {
    pub source: NewsSource,
    pub document_id: String,
    /// Index of the document in its source's enumeration order.
    pub position: usize,
    pub records: Vec<TaggedSentence>,
}

/// Last committed document of a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCursor {
    pub source: NewsSource,
    pub document_id: String,
    pub position: usize,
}

/// A record still waiting for its ticker signal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PendingRecord {
    pub key: RecordKey,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub documents: usize,
    pub records: usize,
    pub ticker_pending: usize,
    pub ticker_enriched: usize,
    pub market_pending: usize,
    pub market_enriched: usize,
}

/// Persistence contract used by ingestion and enrichment.
///
/// Implementations are shared by reference across enrichment workers. The
/// enrichment check and the write must happen atomically: two workers racing
/// on one record see exactly one `Ok(true)`.
pub trait SentenceStore: Send + Sync {
    fn is_document_committed(&self, source: NewsSource, document_id: &str) -> Result<bool, StoreError>;

    fn cursor(&self, source: NewsSource) -> Result<Option<SourceCursor>, StoreError>;

    /// Insert a document's records and advance the source cursor, all or nothing.
    fn commit_document(&self, commit: DocumentCommit) -> Result<(), StoreError>;

    /// Records of `ticker` whose ticker enrichment is pending, ordered by key.
    fn pending_for_ticker(&self, ticker: &str) -> Result<Vec<PendingRecord>, StoreError>;

    fn has_pending_market(&self) -> Result<bool, StoreError>;

    /// Dates that still have at least one record with pending market enrichment.
    fn pending_market_dates(&self) -> Result<BTreeSet<NaiveDate>, StoreError>;

    /// Set the ticker signal if still pending. `Ok(false)` when already enriched.
    fn apply_ticker_signal(&self, key: &RecordKey, signal: TickerSignal) -> Result<bool, StoreError>;

    /// Set the market signal on every pending record dated `date`. Returns how many changed.
    fn apply_market_signal(&self, date: NaiveDate, signal: MarketSignal) -> Result<usize, StoreError>;

    /// Snapshot of every record, ordered by key.
    fn sentences(&self) -> Result<Vec<TaggedSentence>, StoreError>;

    fn stats(&self) -> Result<StoreStats, StoreError>;
}
