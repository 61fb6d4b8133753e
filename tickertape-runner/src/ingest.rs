//! Ingest pipeline: decode, normalize, annotate, extract, assign ids, commit.
//!
//! One source at a time, one document at a time, oldest first. A document
//! that fails to decode or annotate is logged and left uncommitted; store
//! failures stop the source.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use tickertape_core::data::{DocumentSource, SourceError, TickerUniverse};
use tickertape_core::domain::{
    DecodeError, Enrichment, NewsSource, RawDocument, SequenceAssigner, SequenceError,
    TaggedSentence,
};
use tickertape_core::store::{DocumentCommit, SentenceStore, StoreError};
use tickertape_core::text::{extract_tickers, AnnotateError, Annotator, Normalizer};

use crate::dedup::{plan_pending, ScanStrategy};

/// Why a single document could not be tagged. Never fatal to the run.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("annotation failed: {0}")]
    Annotate(#[from] AnnotateError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("document source: {0}")]
    Source(#[from] SourceError),

    #[error("sentence store: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub source: NewsSource,
    pub strategy: ScanStrategy,
    /// Documents the source returned.
    pub scanned: usize,
    /// Documents committed this run, including those with no records.
    pub processed: usize,
    /// Documents skipped as already committed (or repeated ids).
    pub skipped_committed: usize,
    /// Documents that failed to decode or annotate, or whose record keys
    /// collided with stored records.
    pub failed: usize,
    pub records_written: usize,
}

/// Turns raw documents into tagged sentences.
pub struct DocumentTagger<'a> {
    normalizer: Normalizer,
    annotator: &'a dyn Annotator,
    universe: &'a TickerUniverse,
}

impl<'a> DocumentTagger<'a> {
    pub fn new(annotator: &'a dyn Annotator, universe: &'a TickerUniverse) -> Self {
        Self {
            normalizer: Normalizer::with_universe(universe),
            annotator,
            universe,
        }
    }

    /// Every (sentence, ticker) pair of `doc`, in emission order.
    pub fn tag(&self, doc: &RawDocument) -> Result<Vec<TaggedSentence>, DocumentError> {
        let decoded = doc.decode()?;
        let normalized = self.normalizer.normalize(&decoded.text);
        let sentences = self.annotator.annotate(&normalized)?;
        let tickers = extract_tickers(&sentences, self.universe);

        let mut assigner = SequenceAssigner::new(decoded.date, &doc.document_id);
        let mut records = Vec::new();
        for (sentence_index, (sentence, set)) in sentences.iter().zip(&tickers).enumerate() {
            for ticker in set.iter() {
                records.push(TaggedSentence {
                    sequence_id: assigner.next_id()?,
                    source: doc.source,
                    document_id: doc.document_id.clone(),
                    date: decoded.date,
                    ticker: ticker.clone(),
                    sentence_index,
                    tokens: sentence.surface_tokens(),
                    lemmas: sentence.lemmas(),
                    text: sentence.text.clone(),
                    pos_tags: sentence.pos_tags(),
                    ticker_enrichment: Enrichment::Pending,
                    market_enrichment: Enrichment::Pending,
                });
            }
        }
        Ok(records)
    }
}

/// Ingest every pending document of `source`.
pub fn ingest_source(
    source: NewsSource,
    documents: &dyn DocumentSource,
    store: &dyn SentenceStore,
    tagger: &DocumentTagger<'_>,
) -> Result<IngestReport, IngestError> {
    let docs = documents.documents(source)?;
    let plan = plan_pending(source, &docs, store)?;
    debug!(
        source = %source,
        strategy = ?plan.strategy,
        pending = plan.pending.len(),
        "planned ingestion"
    );

    let mut report = IngestReport {
        source,
        strategy: plan.strategy,
        scanned: docs.len(),
        processed: 0,
        skipped_committed: plan.already_committed + plan.duplicates,
        failed: 0,
        records_written: 0,
    };

    for (position, doc) in plan.pending {
        let records = match tagger.tag(doc) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    source = %source,
                    document_id = %doc.document_id,
                    error = %e,
                    "skipping document"
                );
                report.failed += 1;
                continue;
            }
        };

        let written = records.len();
        let commit = DocumentCommit {
            source,
            document_id: doc.document_id.clone(),
            position,
            records,
        };
        match store.commit_document(commit) {
            Ok(()) => {}
            // Ids differing only by leading zeros ("7", "007") share a key prefix.
            Err(e @ StoreError::DuplicateRecord { .. }) => {
                warn!(
                    source = %source,
                    document_id = %doc.document_id,
                    error = %e,
                    "record key collides with a stored record; skipping document"
                );
                report.failed += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        }
        report.processed += 1;
        report.records_written += written;
    }

    info!(
        source = %source,
        scanned = report.scanned,
        processed = report.processed,
        skipped = report.skipped_committed,
        failed = report.failed,
        records = report.records_written,
        "ingested source"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickertape_core::data::MemoryDocumentSource;
    use tickertape_core::store::MemoryStore;
    use tickertape_core::text::RuleAnnotator;

    fn universe() -> TickerUniverse {
        TickerUniverse::new("VOO", ["AAPL", "MSFT", "BRK.B"])
    }

    #[test]
    fn tags_with_carry_forward_and_ordered_ids() {
        let annotator = RuleAnnotator::new();
        let universe = universe();
        let tagger = DocumentTagger::new(&annotator, &universe);
        let doc = RawDocument::new(
            NewsSource::Zacks,
            "42",
            "Markets opened flat. AAPL rose sharply. It gained more. MSFT and BRK.B fell.",
            "04/03/2021",
        );

        let records = tagger.tag(&doc).unwrap();
        let pairs: Vec<(usize, &str)> = records
            .iter()
            .map(|r| (r.sentence_index, r.ticker.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![(0, "AAPL"), (1, "AAPL"), (2, "AAPL"), (3, "MSFT"), (3, "BRK_B")]
        );
        assert_eq!(records[0].sequence_id.as_str(), "2021030400000000420000");
        assert!(records.windows(2).all(|w| w[0].sequence_id < w[1].sequence_id));
        assert!(records.iter().all(|r| r.ticker_enrichment.is_pending()));
        assert_eq!(records[3].tokens.len(), records[3].pos_tags.len());
    }

    #[test]
    fn ingest_commits_zero_record_documents_and_skips_bad_ones() {
        let annotator = RuleAnnotator::new();
        let universe = universe();
        let tagger = DocumentTagger::new(&annotator, &universe);
        let src = MemoryDocumentSource::new()
            .with(RawDocument::new(NewsSource::Zacks, "1", "AAPL rose.", "04/03/2021"))
            .with(RawDocument::new(NewsSource::Zacks, "2", "Rates were flat.", "04/03/2021"))
            .with(RawDocument::new(NewsSource::Zacks, "3", "MSFT fell.", "not a date"))
            .with(RawDocument::new(NewsSource::Zacks, "4", "MSFT fell.", "05/03/2021"));
        let store = MemoryStore::new();

        let report = ingest_source(NewsSource::Zacks, &src, &store, &tagger).unwrap();
        assert_eq!(report.scanned, 4);
        assert_eq!(report.processed, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.records_written, 2);
        assert!(store.is_document_committed(NewsSource::Zacks, "2").unwrap());
        assert!(!store.is_document_committed(NewsSource::Zacks, "3").unwrap());

        let again = ingest_source(NewsSource::Zacks, &src, &store, &tagger).unwrap();
        assert_eq!(again.strategy, ScanStrategy::Cursor);
        assert_eq!(again.processed, 0);
        assert_eq!(again.records_written, 0);
        assert_eq!(store.sentences().unwrap().len(), 2);
    }

    #[test]
    fn zero_padded_id_collision_skips_only_that_document() {
        let annotator = RuleAnnotator::new();
        let universe = universe();
        let tagger = DocumentTagger::new(&annotator, &universe);
        let src = MemoryDocumentSource::new()
            .with(RawDocument::new(NewsSource::Zacks, "7", "AAPL rose.", "04/03/2021"))
            .with(RawDocument::new(NewsSource::Zacks, "007", "MSFT fell.", "04/03/2021"))
            .with(RawDocument::new(NewsSource::Zacks, "8", "AAPL rose.", "05/03/2021"));
        let store = MemoryStore::new();

        let report = ingest_source(NewsSource::Zacks, &src, &store, &tagger).unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert!(store.is_document_committed(NewsSource::Zacks, "7").unwrap());
        assert!(!store.is_document_committed(NewsSource::Zacks, "007").unwrap());
        assert!(store.is_document_committed(NewsSource::Zacks, "8").unwrap());

        // Later runs resume past the colliding document.
        let again = ingest_source(NewsSource::Zacks, &src, &store, &tagger).unwrap();
        assert_eq!(again.processed, 0);
        assert_eq!(store.sentences().unwrap().len(), 2);
    }

    #[test]
    fn annotation_error_skips_only_that_document() {
        let annotator = RuleAnnotator::with_max_chars(20);
        let universe = universe();
        let tagger = DocumentTagger::new(&annotator, &universe);
        let src = MemoryDocumentSource::new()
            .with(RawDocument::new(
                NewsSource::Zacks,
                "1",
                "AAPL rose after a very long and winding earnings call.",
                "04/03/2021",
            ))
            .with(RawDocument::new(NewsSource::Zacks, "2", "AAPL rose.", "05/03/2021"));
        let store = MemoryStore::new();

        let report = ingest_source(NewsSource::Zacks, &src, &store, &tagger).unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.processed, 1);
    }
}
