//! News sources and the raw documents they yield.
//!
//! Each source encodes content and dates differently. Decoding turns a
//! `RawDocument` into plain text plus a calendar date; everything after that
//! point is source-agnostic.

use chrono::NaiveDate;
use html2text::render::TrivialDecorator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Wrap width handed to the HTML renderer. Wide enough that it rarely breaks
/// a sentence across lines; line breaks are whitespace to the annotator anyway.
const HTML_WRAP_WIDTH: usize = 400;

/// Origin of a news document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NewsSource {
    /// Plain-text content, `DD/MM/YYYY` dates.
    Zacks,
    /// HTML content, ISO timestamp dates.
    SeekingAlpha,
}

impl NewsSource {
    pub const ALL: [NewsSource; 2] = [NewsSource::SeekingAlpha, NewsSource::Zacks];

    pub fn as_str(&self) -> &'static str {
        match self {
            NewsSource::Zacks => "Zacks",
            NewsSource::SeekingAlpha => "SeekingAlpha",
        }
    }
}

impl fmt::Display for NewsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "zacks" => Ok(NewsSource::Zacks),
            "seekingalpha" => Ok(NewsSource::SeekingAlpha),
            other => Err(format!("unknown news source '{other}'")),
        }
    }
}

/// Failure to decode a raw document's source-specific encoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{news_source} document {document_id}: unparseable date '{raw}'")]
    InvalidDate {
        news_source: NewsSource,
        document_id: String,
        raw: String,
    },

    #[error("{news_source} document {document_id}: unreadable HTML content: {reason}")]
    InvalidHtml {
        news_source: NewsSource,
        document_id: String,
        reason: String,
    },
}

/// One news item exactly as the document source delivered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub source: NewsSource,
    pub document_id: String,
    pub raw_content: String,
    pub raw_date: String,
}

/// A raw document reduced to plain text and a calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDocument {
    pub source: NewsSource,
    pub document_id: String,
    pub date: NaiveDate,
    pub text: String,
}

impl RawDocument {
    pub fn new(
        source: NewsSource,
        document_id: impl Into<String>,
        raw_content: impl Into<String>,
        raw_date: impl Into<String>,
    ) -> Self {
        Self {
            source,
            document_id: document_id.into(),
            raw_content: raw_content.into(),
            raw_date: raw_date.into(),
        }
    }

    /// Decode content and date according to the document's source.
    pub fn decode(&self) -> Result<DecodedDocument, DecodeError> {
        let date = self.decode_date()?;
        let text = match self.source {
            NewsSource::Zacks => self.raw_content.clone(),
            // Plain text only: no link footnotes or emphasis markers.
            NewsSource::SeekingAlpha => html2text::from_read_with_decorator(
                self.raw_content.as_bytes(),
                HTML_WRAP_WIDTH,
                TrivialDecorator::new(),
            )
            .map_err(|e| DecodeError::InvalidHtml {
                news_source: self.source,
                document_id: self.document_id.clone(),
                reason: e.to_string(),
            })?
            .trim()
            .to_string(),
        };

        Ok(DecodedDocument {
            source: self.source,
            document_id: self.document_id.clone(),
            date,
            text,
        })
    }

    fn decode_date(&self) -> Result<NaiveDate, DecodeError> {
        let raw = self.raw_date.trim();
        let parsed = match self.source {
            NewsSource::Zacks => NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok(),
            // Timestamps like `2021-03-04T09:15:00-05:00`: the date is the first 10 chars.
            NewsSource::SeekingAlpha => raw
                .get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        };

        parsed.ok_or_else(|| DecodeError::InvalidDate {
            news_source: self.source,
            document_id: self.document_id.clone(),
            raw: self.raw_date.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zacks_date_is_day_first() {
        let doc = RawDocument::new(NewsSource::Zacks, "42", "Apple rose.", "04/03/2021");
        let decoded = doc.decode().unwrap();
        assert_eq!(decoded.date, NaiveDate::from_ymd_opt(2021, 3, 4).unwrap());
        assert_eq!(decoded.text, "Apple rose.");
    }

    #[test]
    fn seeking_alpha_takes_date_prefix_and_strips_html() {
        let doc = RawDocument::new(
            NewsSource::SeekingAlpha,
            "7",
            "<p>Shares of <b>AAPL</b> rose.</p>",
            "2021-03-04T09:15:00-05:00",
        );
        let decoded = doc.decode().unwrap();
        assert_eq!(decoded.date, NaiveDate::from_ymd_opt(2021, 3, 4).unwrap());
        assert!(decoded.text.contains("AAPL"));
        assert!(!decoded.text.contains("<p>"));
    }

    #[test]
    fn seeking_alpha_links_decode_to_bare_text() {
        let doc = RawDocument::new(
            NewsSource::SeekingAlpha,
            "8",
            r#"<p><b>Apple</b> (<a href="https://seekingalpha.com/symbol/AAPL">AAPL</a>) rose. Analysts cheered.</p>"#,
            "2021-03-04T09:15:00-05:00",
        );
        let decoded = doc.decode().unwrap();
        assert_eq!(decoded.text, "Apple (AAPL) rose. Analysts cheered.");
        assert!(!decoded.text.contains("[1]"));
        assert!(!decoded.text.contains("https://"));
    }

    #[test]
    fn bad_date_is_a_decode_error() {
        let doc = RawDocument::new(NewsSource::Zacks, "1", "text", "2021-03-04");
        let err = doc.decode().unwrap_err();
        assert!(err.to_string().contains("unparseable date"));

        let short = RawDocument::new(NewsSource::SeekingAlpha, "2", "text", "2021");
        assert!(short.decode().is_err());
    }

    #[test]
    fn source_parses_loosely() {
        assert_eq!("zacks".parse::<NewsSource>().unwrap(), NewsSource::Zacks);
        assert_eq!(
            "Seeking_Alpha".parse::<NewsSource>().unwrap(),
            NewsSource::SeekingAlpha
        );
        assert!("reuters".parse::<NewsSource>().is_err());
    }
}
