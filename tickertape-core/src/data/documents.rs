//! News document sources.
//!
//! A source yields a source's documents in insertion order (oldest first).
//! The file-backed implementation reads one JSON object per line from
//! `{dir}/original_{source}.jsonl`:
//!
//! ```text
//! {"news_id": "1234", "content": "...", "date": "04/03/2021"}
//! ```

use crate::domain::{NewsSource, RawDocument};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Supplier of raw documents for a news source.
pub trait DocumentSource: Send + Sync {
    /// All documents of `source`, oldest first.
    fn documents(&self, source: NewsSource) -> Result<Vec<RawDocument>, SourceError>;
}

/// Ids arrive as strings or bare integers depending on the exporter.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NewsId {
    Text(String),
    Number(u64),
}

impl NewsId {
    fn into_string(self) -> String {
        match self {
            NewsId::Text(s) => s,
            NewsId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DocumentLine {
    news_id: NewsId,
    #[serde(default)]
    content: String,
    date: String,
}

/// Reads `original_{source}.jsonl` files from a directory.
#[derive(Debug, Clone)]
pub struct JsonlDocumentSource {
    dir: PathBuf,
}

impl JsonlDocumentSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, source: NewsSource) -> PathBuf {
        self.dir.join(format!("original_{}.jsonl", source.as_str()))
    }

    fn read_file(path: &Path, source: NewsSource) -> Result<Vec<RawDocument>, SourceError> {
        let io_err = |e| SourceError::Io {
            path: path.to_path_buf(),
            source: e,
        };
        let file = std::fs::File::open(path).map_err(io_err)?;

        let mut docs = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: DocumentLine =
                serde_json::from_str(&line).map_err(|e| SourceError::Malformed {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    reason: e.to_string(),
                })?;
            docs.push(RawDocument::new(
                source,
                parsed.news_id.into_string(),
                parsed.content,
                parsed.date,
            ));
        }
        Ok(docs)
    }
}

impl DocumentSource for JsonlDocumentSource {
    fn documents(&self, source: NewsSource) -> Result<Vec<RawDocument>, SourceError> {
        let path = self.path_for(source);
        if !path.exists() {
            return Ok(Vec::new());
        }
        Self::read_file(&path, source)
    }
}

/// In-memory source for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentSource {
    docs: BTreeMap<NewsSource, Vec<RawDocument>>,
}

impl MemoryDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document; its source decides which list it joins.
    pub fn push(&mut self, doc: RawDocument) {
        self.docs.entry(doc.source).or_default().push(doc);
    }

    pub fn with(mut self, doc: RawDocument) -> Self {
        self.push(doc);
        self
    }
}

impl DocumentSource for MemoryDocumentSource {
    fn documents(&self, source: NewsSource) -> Result<Vec<RawDocument>, SourceError> {
        Ok(self.docs.get(&source).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("original_Zacks.jsonl"),
            "{\"news_id\":\"1\",\"content\":\"AAPL rose.\",\"date\":\"04/03/2021\"}\n\
             \n\
             {\"news_id\":2,\"content\":\"MSFT fell.\",\"date\":\"05/03/2021\"}\n",
        )
        .unwrap();

        let docs = JsonlDocumentSource::new(dir.path())
            .documents(NewsSource::Zacks)
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].document_id, "1");
        assert_eq!(docs[1].document_id, "2");
        assert_eq!(docs[1].source, NewsSource::Zacks);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let docs = JsonlDocumentSource::new(dir.path())
            .documents(NewsSource::SeekingAlpha)
            .unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn malformed_line_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("original_Zacks.jsonl"), "{\"news_id\":\"1\"}\n").unwrap();
        let err = JsonlDocumentSource::new(dir.path())
            .documents(NewsSource::Zacks)
            .unwrap_err();
        assert!(matches!(err, SourceError::Malformed { line: 1, .. }));
    }

    #[test]
    fn memory_source_groups_by_source() {
        let src = MemoryDocumentSource::new()
            .with(RawDocument::new(NewsSource::Zacks, "1", "a", "01/01/2021"))
            .with(RawDocument::new(NewsSource::SeekingAlpha, "9", "b", "2021-01-01"))
            .with(RawDocument::new(NewsSource::Zacks, "2", "c", "02/01/2021"));
        let zacks = src.documents(NewsSource::Zacks).unwrap();
        assert_eq!(zacks.iter().map(|d| d.document_id.as_str()).collect::<Vec<_>>(), ["1", "2"]);
        assert_eq!(src.documents(NewsSource::SeekingAlpha).unwrap().len(), 1);
    }
}
