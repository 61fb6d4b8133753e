use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::source::NewsSource;

/// Width of the zero-padded document id segment.
pub const DOCUMENT_ID_WIDTH: usize = 10;

/// Width of the zero-padded per-document emission counter.
pub const COUNTER_WIDTH: usize = 4;

const MAX_COUNTER: u32 = 10u32.pow(COUNTER_WIDTH as u32) - 1;

/// Sortable sentence id: `YYYYMMDD` + padded document id + padded counter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(pub String);

impl SequenceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store key of a tagged sentence. Sequence ids are only unique per source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub source: NewsSource,
    pub sequence_id: SequenceId,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.sequence_id)
    }
}

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("document {document_id} emits more than {max} tagged sentences")]
    CounterOverflow { document_id: String, max: u32 },
}

/// Hands out sequence ids for one document, one per (sentence, ticker) pair.
///
/// Ids are a pure function of (date, document id, emission index), so a
/// re-run over the same document reproduces them byte for byte.
#[derive(Debug, Clone)]
pub struct SequenceAssigner {
    document_id: String,
    prefix: String,
    counter: u32,
}

impl SequenceAssigner {
    pub fn new(date: NaiveDate, document_id: &str) -> Self {
        let prefix = format!(
            "{}{:0>width$}",
            date.format("%Y%m%d"),
            document_id,
            width = DOCUMENT_ID_WIDTH
        );
        Self {
            document_id: document_id.to_string(),
            prefix,
            counter: 0,
        }
    }

    /// Next id in emission order.
    ///
    /// Fails rather than widening the counter, which would break lexicographic order.
    pub fn next_id(&mut self) -> Result<SequenceId, SequenceError> {
        if self.counter > MAX_COUNTER {
            return Err(SequenceError::CounterOverflow {
                document_id: self.document_id.clone(),
                max: MAX_COUNTER + 1,
            });
        }
        let id = format!("{}{:0>width$}", self.prefix, self.counter, width = COUNTER_WIDTH);
        self.counter += 1;
        Ok(SequenceId(id))
    }

    /// Number of ids emitted so far.
    pub fn emitted(&self) -> u32 {
        self.counter
    }
}
