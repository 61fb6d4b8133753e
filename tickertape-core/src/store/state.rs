//! In-memory store state shared by the memory and JSONL stores.
//!
//! Pending indexes mirror the enrichment fields: a key is in
//! `ticker_pending` iff its ticker enrichment is `Pending`, and in
//! `market_pending` iff its market enrichment is `Pending`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use super::{DocumentCommit, PendingRecord, SourceCursor, StoreError, StoreStats};
use crate::domain::{MarketSignal, NewsSource, RecordKey, TaggedSentence, TickerSignal};

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    records: BTreeMap<RecordKey, TaggedSentence>,
    /// Committed documents and their positions.
    committed: HashMap<(NewsSource, String), usize>,
    cursors: BTreeMap<NewsSource, SourceCursor>,
    ticker_pending: HashMap<String, BTreeSet<RecordKey>>,
    market_pending: BTreeMap<NaiveDate, BTreeSet<RecordKey>>,
}

impl StoreState {
    pub fn is_committed(&self, source: NewsSource, document_id: &str) -> bool {
        self.committed
            .contains_key(&(source, document_id.to_string()))
    }

    pub fn cursor(&self, source: NewsSource) -> Option<SourceCursor> {
        self.cursors.get(&source).cloned()
    }

    /// Reject a commit that would duplicate a document or a record key.
    pub fn check_commit(&self, commit: &DocumentCommit) -> Result<(), StoreError> {
        if self.is_committed(commit.source, &commit.document_id) {
            return Err(StoreError::DuplicateDocument {
                news_source: commit.source,
                document_id: commit.document_id.clone(),
            });
        }
        let mut seen = BTreeSet::new();
        for record in &commit.records {
            let key = record.key();
            if self.records.contains_key(&key) || !seen.insert(key.clone()) {
                return Err(StoreError::DuplicateRecord { key });
            }
        }
        Ok(())
    }

    /// Apply a commit already accepted by `check_commit`.
    pub fn apply_commit(&mut self, commit: DocumentCommit) {
        let DocumentCommit {
            source,
            document_id,
            position,
            records,
        } = commit;

        for record in records {
            let key = record.key();
            if record.ticker_enrichment.is_pending() {
                self.ticker_pending
                    .entry(record.ticker.clone())
                    .or_default()
                    .insert(key.clone());
            }
            if record.market_enrichment.is_pending() {
                self.market_pending
                    .entry(record.date)
                    .or_default()
                    .insert(key.clone());
            }
            self.records.insert(key, record);
        }

        let advance = self
            .cursors
            .get(&source)
            .map_or(true, |c| position >= c.position);
        if advance {
            self.cursors.insert(
                source,
                SourceCursor {
                    source,
                    document_id: document_id.clone(),
                    position,
                },
            );
        }
        self.committed.insert((source, document_id), position);
    }

    pub fn pending_for_ticker(&self, ticker: &str) -> Vec<PendingRecord> {
        let Some(keys) = self.ticker_pending.get(ticker) else {
            return Vec::new();
        };
        keys.iter()
            .filter_map(|key| {
                self.records.get(key).map(|r| PendingRecord {
                    key: key.clone(),
                    date: r.date,
                })
            })
            .collect()
    }

    pub fn has_pending_market(&self) -> bool {
        !self.market_pending.is_empty()
    }

    pub fn pending_market_dates(&self) -> BTreeSet<NaiveDate> {
        self.market_pending.keys().copied().collect()
    }

    /// Would `apply_ticker` change anything?
    pub fn ticker_is_pending(&self, key: &RecordKey) -> Result<bool, StoreError> {
        self.records
            .get(key)
            .map(|r| r.ticker_enrichment.is_pending())
            .ok_or_else(|| StoreError::UnknownRecord { key: key.clone() })
    }

    pub fn apply_ticker(&mut self, key: &RecordKey, signal: TickerSignal) -> Result<bool, StoreError> {
        let record = self
            .records
            .get_mut(key)
            .ok_or_else(|| StoreError::UnknownRecord { key: key.clone() })?;
        if !record.ticker_enrichment.enrich(signal) {
            return Ok(false);
        }
        if let Some(keys) = self.ticker_pending.get_mut(&record.ticker) {
            keys.remove(key);
            if keys.is_empty() {
                self.ticker_pending.remove(&record.ticker);
            }
        }
        Ok(true)
    }

    /// Keys on `date` whose market enrichment is still pending.
    pub fn market_pending_on(&self, date: NaiveDate) -> Vec<RecordKey> {
        self.market_pending
            .get(&date)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Guarded market write on specific keys. Returns how many changed.
    pub fn apply_market(&mut self, keys: &[RecordKey], signal: MarketSignal) -> Result<usize, StoreError> {
        let mut changed = 0;
        for key in keys {
            let record = self
                .records
                .get_mut(key)
                .ok_or_else(|| StoreError::UnknownRecord { key: key.clone() })?;
            if !record.market_enrichment.enrich(signal) {
                continue;
            }
            changed += 1;
            if let Some(pending) = self.market_pending.get_mut(&record.date) {
                pending.remove(key);
                if pending.is_empty() {
                    self.market_pending.remove(&record.date);
                }
            }
        }
        Ok(changed)
    }

    pub fn sentences(&self) -> Vec<TaggedSentence> {
        self.records.values().cloned().collect()
    }

    /// Committed documents as commits, by source then position.
    ///
    /// Records keep their current enrichment, so replaying the result
    /// reproduces this state.
    pub fn snapshot_commits(&self) -> Vec<DocumentCommit> {
        let mut by_document: HashMap<(NewsSource, &str), Vec<TaggedSentence>> = HashMap::new();
        for record in self.records.values() {
            by_document
                .entry((record.source, record.document_id.as_str()))
                .or_default()
                .push(record.clone());
        }

        let mut documents: Vec<(&(NewsSource, String), &usize)> = self.committed.iter().collect();
        documents.sort_by(|a, b| (a.0 .0, a.1, &a.0 .1).cmp(&(b.0 .0, b.1, &b.0 .1)));

        documents
            .into_iter()
            .map(|((source, document_id), &position)| DocumentCommit {
                source: *source,
                document_id: document_id.clone(),
                position,
                records: by_document
                    .remove(&(*source, document_id.as_str()))
                    .unwrap_or_default(),
            })
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        let ticker_pending: usize = self.ticker_pending.values().map(BTreeSet::len).sum();
        let market_pending: usize = self.market_pending.values().map(BTreeSet::len).sum();
        StoreStats {
            documents: self.committed.len(),
            records: self.records.len(),
            ticker_pending,
            ticker_enriched: self.records.len() - ticker_pending,
            market_pending,
            market_enriched: self.records.len() - market_pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::{commit, market, signal};

    #[test]
    fn cursor_keeps_highest_position() {
        let mut state = StoreState::default();
        state.apply_commit(commit(NewsSource::Zacks, "b", 5, 4, &[]));
        state.apply_commit(commit(NewsSource::Zacks, "a", 2, 4, &[]));
        let cursor = state.cursor(NewsSource::Zacks).unwrap();
        assert_eq!((cursor.document_id.as_str(), cursor.position), ("b", 5));
    }

    #[test]
    fn duplicate_keys_within_commit_rejected() {
        let state = StoreState::default();
        let mut c = commit(NewsSource::Zacks, "1", 0, 4, &["AAPL"]);
        c.records.push(c.records[0].clone());
        assert!(matches!(
            state.check_commit(&c),
            Err(StoreError::DuplicateRecord { .. })
        ));
    }

    #[test]
    fn indexes_follow_enrichment() {
        let mut state = StoreState::default();
        state.apply_commit(commit(NewsSource::Zacks, "1", 0, 4, &["AAPL", "AAPL"]));
        let keys: Vec<RecordKey> = state
            .pending_for_ticker("AAPL")
            .into_iter()
            .map(|p| p.key)
            .collect();
        assert_eq!(keys.len(), 2);

        assert!(state.apply_ticker(&keys[0], signal(1)).unwrap());
        assert!(state.apply_ticker(&keys[1], signal(1)).unwrap());
        assert!(state.pending_for_ticker("AAPL").is_empty());
        assert!(!state.ticker_pending.contains_key("AAPL"));

        let on_day = state.market_pending_on(state.records[&keys[0]].date);
        assert_eq!(state.apply_market(&on_day, market(3)).unwrap(), 2);
        assert!(!state.has_pending_market());
    }

    #[test]
    fn snapshot_includes_zero_record_documents() {
        let mut state = StoreState::default();
        state.apply_commit(commit(NewsSource::Zacks, "1", 0, 4, &["AAPL"]));
        state.apply_commit(commit(NewsSource::Zacks, "2", 1, 4, &[]));
        state.apply_commit(commit(NewsSource::SeekingAlpha, "9", 0, 4, &["MSFT"]));

        let snap = state.snapshot_commits();
        let ids: Vec<(NewsSource, &str, usize)> = snap
            .iter()
            .map(|c| (c.source, c.document_id.as_str(), c.records.len()))
            .collect();
        assert_eq!(
            ids,
            vec![
                (NewsSource::Zacks, "1", 1),
                (NewsSource::Zacks, "2", 0),
                (NewsSource::SeekingAlpha, "9", 1),
            ]
        );
    }
}
