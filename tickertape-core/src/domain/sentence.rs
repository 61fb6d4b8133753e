//! TaggedSentence: the unit of persistence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{RecordKey, SequenceId};
use super::source::NewsSource;

/// Deviation buckets for one ticker on one trading day.
///
/// Price and range use 1-percentage-point buckets, volume uses 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TickerSignal {
    pub price_bucket: i32,
    pub volume_bucket: i32,
    pub range_bucket: i32,
}

/// Deviation buckets for the volatility index on one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MarketSignal {
    pub index_price_bucket: i32,
    pub index_volume_bucket: i32,
}

/// Enrichment status of a record.
///
/// The only legal transition is `Pending -> Enriched`; once enriched, a
/// record keeps its first signal forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "signal", rename_all = "snake_case")]
pub enum Enrichment<T> {
    Pending,
    Enriched(T),
}

impl<T> Default for Enrichment<T> {
    fn default() -> Self {
        Enrichment::Pending
    }
}

impl<T> Enrichment<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Enrichment::Pending)
    }

    pub fn is_enriched(&self) -> bool {
        matches!(self, Enrichment::Enriched(_))
    }

    pub fn signal(&self) -> Option<&T> {
        match self {
            Enrichment::Pending => None,
            Enrichment::Enriched(signal) => Some(signal),
        }
    }

    /// Guarded transition. Returns `false` (and changes nothing) if already enriched.
    pub fn enrich(&mut self, signal: T) -> bool {
        if self.is_enriched() {
            return false;
        }
        *self = Enrichment::Enriched(signal);
        true
    }
}

/// One sentence of one document, attributed to one ticker.
///
/// A sentence mentioning three tickers yields three records. Linguistic
/// fields are fixed at creation; only the two enrichment fields ever change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedSentence {
    pub sequence_id: SequenceId,
    pub source: NewsSource,
    pub document_id: String,
    pub date: NaiveDate,
    pub ticker: String,
    pub sentence_index: usize,
    pub tokens: Vec<String>,
    pub lemmas: Vec<String>,
    pub text: String,
    pub pos_tags: Vec<String>,
    #[serde(default)]
    pub ticker_enrichment: Enrichment<TickerSignal>,
    #[serde(default)]
    pub market_enrichment: Enrichment<MarketSignal>,
}

impl TaggedSentence {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            source: self.source,
            sequence_id: self.sequence_id.clone(),
        }
    }
}
