//! Domain types for Tickertape

pub mod ids;
pub mod sentence;
pub mod source;

pub use ids::{RecordKey, SequenceAssigner, SequenceError, SequenceId};
pub use sentence::{Enrichment, MarketSignal, TaggedSentence, TickerSignal};
pub use source::{DecodeError, DecodedDocument, NewsSource, RawDocument};

/// Ticker symbol in universe form (dots replaced by underscores).
pub type Ticker = String;
