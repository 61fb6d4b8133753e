//! Volatile store for tests and dry runs.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;

use super::state::StoreState;
use super::{DocumentCommit, PendingRecord, SentenceStore, SourceCursor, StoreError, StoreStats};
use crate::domain::{MarketSignal, NewsSource, RecordKey, TaggedSentence, TickerSignal};

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl SentenceStore for MemoryStore {
    fn is_document_committed(&self, source: NewsSource, document_id: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_committed(source, document_id))
    }

    fn cursor(&self, source: NewsSource) -> Result<Option<SourceCursor>, StoreError> {
        Ok(self.lock()?.cursor(source))
    }

    fn commit_document(&self, commit: DocumentCommit) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.check_commit(&commit)?;
        state.apply_commit(commit);
        Ok(())
    }

    fn pending_for_ticker(&self, ticker: &str) -> Result<Vec<PendingRecord>, StoreError> {
        Ok(self.lock()?.pending_for_ticker(ticker))
    }

    fn has_pending_market(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.has_pending_market())
    }

    fn pending_market_dates(&self) -> Result<BTreeSet<NaiveDate>, StoreError> {
        Ok(self.lock()?.pending_market_dates())
    }

    fn apply_ticker_signal(&self, key: &RecordKey, signal: TickerSignal) -> Result<bool, StoreError> {
        self.lock()?.apply_ticker(key, signal)
    }

    fn apply_market_signal(&self, date: NaiveDate, signal: MarketSignal) -> Result<usize, StoreError> {
        let mut state = self.lock()?;
        let keys = state.market_pending_on(date);
        state.apply_market(&keys, signal)
    }

    fn sentences(&self) -> Result<Vec<TaggedSentence>, StoreError> {
        Ok(self.lock()?.sentences())
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        Ok(self.lock()?.stats())
    }
}
