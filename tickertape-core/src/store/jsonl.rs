//! Durable store backed by an append-only JSONL event log.
//!
//! Each line is one event: a whole-document commit, a ticker enrichment, or
//! a market enrichment naming the keys it changed. Opening the store replays
//! the log through the same guards the live store uses. A write cut short by
//! a crash leaves a torn final line without a newline; it is dropped on open,
//! which loses only the event that never completed.

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::state::StoreState;
use super::{DocumentCommit, PendingRecord, SentenceStore, SourceCursor, StoreError, StoreStats};
use crate::domain::{MarketSignal, NewsSource, RecordKey, TaggedSentence, TickerSignal};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum StoreEvent {
    DocumentCommitted(DocumentCommit),
    TickerEnriched {
        key: RecordKey,
        signal: TickerSignal,
    },
    MarketEnriched {
        date: NaiveDate,
        keys: Vec<RecordKey>,
        signal: MarketSignal,
    },
}

struct Inner {
    state: StoreState,
    log: File,
}

pub struct JsonlStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for JsonlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlStore").field("path", &self.path).finish()
    }
}

impl JsonlStore {
    /// Open (or create) the log at `path` and replay it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut bytes = Vec::new();
        match File::open(&path) {
            Ok(mut f) => {
                f.read_to_end(&mut bytes).map_err(io_err)?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(e)),
        }

        let complete = bytes.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        if complete < bytes.len() {
            warn!(
                path = %path.display(),
                dropped_bytes = bytes.len() - complete,
                "dropping torn trailing line"
            );
            let f = OpenOptions::new().write(true).open(&path).map_err(io_err)?;
            f.set_len(complete as u64).map_err(io_err)?;
        }

        let state = Self::replay(&path, &bytes[..complete])?;
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;

        let stats = state.stats();
        info!(
            path = %path.display(),
            documents = stats.documents,
            records = stats.records,
            "opened sentence store"
        );

        Ok(Self {
            path,
            inner: Mutex::new(Inner { state, log }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn replay(path: &Path, bytes: &[u8]) -> Result<StoreState, StoreError> {
        let corrupt = |line: usize, reason: String| StoreError::Corrupt {
            path: path.to_path_buf(),
            line,
            reason,
        };

        let mut state = StoreState::default();
        for (idx, raw) in bytes.split(|&b| b == b'\n').enumerate() {
            let line = idx + 1;
            let text = std::str::from_utf8(raw).map_err(|e| corrupt(line, e.to_string()))?;
            if text.trim().is_empty() {
                continue;
            }
            let event: StoreEvent =
                serde_json::from_str(text).map_err(|e| corrupt(line, e.to_string()))?;

            match event {
                StoreEvent::DocumentCommitted(commit) => match state.check_commit(&commit) {
                    Ok(()) => state.apply_commit(commit),
                    Err(e) => debug!(line, error = %e, "skipping repeated commit during replay"),
                },
                StoreEvent::TickerEnriched { key, signal } => {
                    state
                        .apply_ticker(&key, signal)
                        .map_err(|e| corrupt(line, e.to_string()))?;
                }
                StoreEvent::MarketEnriched { keys, signal, .. } => {
                    state
                        .apply_market(&keys, signal)
                        .map_err(|e| corrupt(line, e.to_string()))?;
                }
            }
        }
        Ok(state)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    fn append(&self, log: &mut File, event: &StoreEvent) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        append_line(log, &line, |f, bytes| f.write_all(bytes).and_then(|()| f.flush())).map_err(
            |source| StoreError::Io {
                path: self.path.clone(),
                source,
            },
        )
    }

    /// Rewrite the log as one commit per document, folding enrichment events
    /// into the records. Written to a temporary file then renamed over the log.
    pub fn compact(&self) -> Result<usize, StoreError> {
        let mut inner = self.lock()?;
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let tmp = self.path.with_extension("jsonl.tmp");
        let commits = inner.state.snapshot_commits();
        let count = commits.len();
        {
            let mut out = File::create(&tmp).map_err(io_err)?;
            for commit in commits {
                let mut line = serde_json::to_vec(&StoreEvent::DocumentCommitted(commit))?;
                line.push(b'\n');
                out.write_all(&line).map_err(io_err)?;
            }
            out.sync_all().map_err(io_err)?;
        }
        fs::rename(&tmp, &self.path).map_err(io_err)?;

        inner.log = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        info!(path = %self.path.display(), documents = count, "compacted sentence store");
        Ok(count)
    }
}

/// Run `write` for one log line; on failure cut the log back to its prior
/// length so a partial line never sits under the next append.
fn append_line<W>(log: &mut File, line: &[u8], write: W) -> std::io::Result<()>
where
    W: FnOnce(&mut File, &[u8]) -> std::io::Result<()>,
{
    let start = log.metadata()?.len();
    match write(log, line) {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Err(truncate) = log.set_len(start) {
                warn!(error = %truncate, "could not roll back partial log line");
            }
            Err(e)
        }
    }
}

impl SentenceStore for JsonlStore {
    fn is_document_committed(&self, source: NewsSource, document_id: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.state.is_committed(source, document_id))
    }

    fn cursor(&self, source: NewsSource) -> Result<Option<SourceCursor>, StoreError> {
        Ok(self.lock()?.state.cursor(source))
    }

    fn commit_document(&self, commit: DocumentCommit) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        inner.state.check_commit(&commit)?;
        let event = StoreEvent::DocumentCommitted(commit);
        self.append(&mut inner.log, &event)?;
        if let StoreEvent::DocumentCommitted(commit) = event {
            inner.state.apply_commit(commit);
        }
        Ok(())
    }

    fn pending_for_ticker(&self, ticker: &str) -> Result<Vec<PendingRecord>, StoreError> {
        Ok(self.lock()?.state.pending_for_ticker(ticker))
    }

    fn has_pending_market(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.state.has_pending_market())
    }

    fn pending_market_dates(&self) -> Result<BTreeSet<NaiveDate>, StoreError> {
        Ok(self.lock()?.state.pending_market_dates())
    }

    fn apply_ticker_signal(&self, key: &RecordKey, signal: TickerSignal) -> Result<bool, StoreError> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        if !inner.state.ticker_is_pending(key)? {
            return Ok(false);
        }
        self.append(
            &mut inner.log,
            &StoreEvent::TickerEnriched {
                key: key.clone(),
                signal,
            },
        )?;
        inner.state.apply_ticker(key, signal)
    }

    fn apply_market_signal(&self, date: NaiveDate, signal: MarketSignal) -> Result<usize, StoreError> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        let keys = inner.state.market_pending_on(date);
        if keys.is_empty() {
            return Ok(0);
        }
        self.append(
            &mut inner.log,
            &StoreEvent::MarketEnriched {
                date,
                keys: keys.clone(),
                signal,
            },
        )?;
        inner.state.apply_market(&keys, signal)
    }

    fn sentences(&self) -> Result<Vec<TaggedSentence>, StoreError> {
        Ok(self.lock()?.state.sentences())
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        Ok(self.lock()?.state.stats())
    }
}
