//! Decides which documents of a source still need ingesting.
//!
//! Documents are committed oldest-first, so the committed ones always form a
//! prefix of the source's enumeration order. Two ways to find where that
//! prefix ends:
//!
//! - **Cursor**: the store remembers the last committed document and its
//!   position. If the source still has that document at that position,
//!   everything after it is pending. One lookup, no probing.
//! - **Scan**: walk newest-first probing the store, stop at the first
//!   committed document. Used when there is no cursor or the source was
//!   reordered underneath it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tickertape_core::domain::{NewsSource, RawDocument};
use tickertape_core::store::{SentenceStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStrategy {
    Cursor,
    Scan,
}

#[derive(Debug, Clone)]
pub struct PendingPlan<'a> {
    pub strategy: ScanStrategy,
    /// `(position, document)`, oldest first.
    pub pending: Vec<(usize, &'a RawDocument)>,
    /// Documents at or before the committed boundary.
    pub already_committed: usize,
    /// Entries past the boundary whose id was already seen or committed.
    pub duplicates: usize,
}

/// Plan the ingestion of `documents` (oldest first) for `source`.
pub fn plan_pending<'a>(
    source: NewsSource,
    documents: &'a [RawDocument],
    store: &dyn SentenceStore,
) -> Result<PendingPlan<'a>, StoreError> {
    let cursor = store.cursor(source)?;
    let cursor_boundary = cursor.as_ref().and_then(|c| {
        documents
            .get(c.position)
            .filter(|d| d.document_id == c.document_id)
            .map(|_| c.position + 1)
    });

    let (strategy, boundary) = match cursor_boundary {
        Some(b) => (ScanStrategy::Cursor, b),
        None => {
            if let Some(c) = &cursor {
                debug!(
                    source = %source,
                    document_id = %c.document_id,
                    position = c.position,
                    "cursor does not match source, scanning"
                );
            }
            (ScanStrategy::Scan, scan_boundary(source, documents, store)?)
        }
    };

    // A source may repeat an id, including one committed before the boundary.
    let mut seen = HashSet::new();
    let mut duplicates = 0;
    let mut pending = Vec::with_capacity(documents.len() - boundary);
    for (offset, doc) in documents[boundary..].iter().enumerate() {
        if !seen.insert(doc.document_id.as_str())
            || store.is_document_committed(source, &doc.document_id)?
        {
            duplicates += 1;
            continue;
        }
        pending.push((boundary + offset, doc));
    }

    Ok(PendingPlan {
        strategy,
        pending,
        already_committed: boundary,
        duplicates,
    })
}

/// Index just past the newest committed document, or 0.
fn scan_boundary(
    source: NewsSource,
    documents: &[RawDocument],
    store: &dyn SentenceStore,
) -> Result<usize, StoreError> {
    for (position, doc) in documents.iter().enumerate().rev() {
        if store.is_document_committed(source, &doc.document_id)? {
            return Ok(position + 1);
        }
    }
    Ok(0)
}
