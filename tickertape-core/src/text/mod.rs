//! Text processing: normalization, annotation, ticker extraction.

pub mod annotate;
pub mod extract;
pub mod lemma;
pub mod normalize;
pub mod tagger;

pub use annotate::{AnnotateError, AnnotatedSentence, AnnotatedToken, Annotator, RuleAnnotator};
pub use extract::{carry_forward, extract_tickers, tickers_in_sentence, TickerSet};
pub use normalize::Normalizer;
