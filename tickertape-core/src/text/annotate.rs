//! Linguistic annotation: sentence split, tokenize, POS-tag, lemmatize.
//!
//! The pipeline consumes annotation through the `Annotator` trait and treats
//! it as a pure function. `RuleAnnotator` is a dependency-free default good
//! enough for ticker tagging: tickers are all-caps tokens, which the rule
//! tagger always marks as proper nouns.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::lemma::lemmatize_verb;
use super::tagger::tag_tokens;

/// One token with its lemma and Penn Treebank POS tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    pub token: String,
    pub lemma: String,
    pub pos: String,
}

/// An annotated sentence: surface text plus ordered token triples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedSentence {
    pub text: String,
    pub tokens: Vec<AnnotatedToken>,
}

impl AnnotatedSentence {
    pub fn surface_tokens(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.token.clone()).collect()
    }

    pub fn lemmas(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.lemma.clone()).collect()
    }

    pub fn pos_tags(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.pos.clone()).collect()
    }
}

/// Input the annotator refuses to process.
#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("input of {len} chars exceeds the annotator limit of {max}")]
    InputTooLarge { len: usize, max: usize },

    #[error("control character U+{code:04X} at byte {offset}")]
    ControlCharacter { code: u32, offset: usize },
}

/// Annotation capability consumed by the ingest pipeline.
pub trait Annotator: Send + Sync {
    /// Human-readable name of this annotator.
    fn name(&self) -> &str;

    /// Split `text` into annotated sentences. Must be deterministic.
    fn annotate(&self, text: &str) -> Result<Vec<AnnotatedSentence>, AnnotateError>;
}

/// Rule-based annotator: punctuation sentence splitter, regex tokenizer,
/// lexicon-plus-suffix POS tagger and verb lemmatizer.
#[derive(Debug, Clone)]
pub struct RuleAnnotator {
    max_chars: usize,
    token_re: Regex,
}

impl Default for RuleAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleAnnotator {
    pub const DEFAULT_MAX_CHARS: usize = 1_000_000;

    pub fn new() -> Self {
        Self::with_max_chars(Self::DEFAULT_MAX_CHARS)
    }

    pub fn with_max_chars(max_chars: usize) -> Self {
        // Numbers (with separators, currency, percent), then words that may
        // carry inner `_ ' ’ / . -` joins (BRK_B, P/E_ratio, U.S), then any
        // other single non-space char.
        let token_re = Regex::new(
            r"\$?\d+(?:[.,]\d+)*%?|[\p{L}\p{N}_]+(?:['’/.\-][\p{L}\p{N}_]+)*|\S",
        )
        .expect("token pattern is valid");
        Self {
            max_chars,
            token_re,
        }
    }

    fn validate(&self, text: &str) -> Result<(), AnnotateError> {
        let len = text.chars().count();
        if len > self.max_chars {
            return Err(AnnotateError::InputTooLarge {
                len,
                max: self.max_chars,
            });
        }
        if let Some((offset, c)) = text
            .char_indices()
            .find(|(_, c)| c.is_control() && !c.is_whitespace())
        {
            return Err(AnnotateError::ControlCharacter {
                code: c as u32,
                offset,
            });
        }
        Ok(())
    }

    /// Tokenize one sentence, splitting possessive `'s` off its stem.
    pub fn tokenize(&self, sentence: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        for m in self.token_re.find_iter(sentence) {
            let tok = m.as_str();
            match split_possessive(tok) {
                Some((stem, suffix)) => {
                    tokens.push(stem.to_string());
                    tokens.push(suffix.to_string());
                }
                None => tokens.push(tok.to_string()),
            }
        }
        tokens
    }
}

impl Annotator for RuleAnnotator {
    fn name(&self) -> &str {
        "rule"
    }

    fn annotate(&self, text: &str) -> Result<Vec<AnnotatedSentence>, AnnotateError> {
        self.validate(text)?;

        let sentences = split_sentences(text)
            .into_iter()
            .filter_map(|sentence| {
                let tokens = self.tokenize(sentence);
                // Stray terminators left by boundary repair carry no words.
                if !tokens.iter().any(|t| t.chars().any(char::is_alphanumeric)) {
                    return None;
                }
                let tags = tag_tokens(&tokens);
                let annotated = tokens
                    .into_iter()
                    .zip(tags)
                    .map(|(token, pos)| AnnotatedToken {
                        lemma: lemmatize_verb(&token),
                        token,
                        pos,
                    })
                    .collect();
                Some(AnnotatedSentence {
                    text: sentence.to_string(),
                    tokens: annotated,
                })
            })
            .collect();

        Ok(sentences)
    }
}

/// `AAPL's` -> (`AAPL`, `'s`). Compounds with text after the apostrophe-s
/// (`Standard_and_Poor's_500`) are left whole.
fn split_possessive(tok: &str) -> Option<(&str, &str)> {
    for suffix in ["'s", "’s", "'S", "’S"] {
        if let Some(stem) = tok.strip_suffix(suffix) {
            if !stem.is_empty() {
                return Some((stem, &tok[stem.len()..]));
            }
        }
    }
    None
}

/// Split text into trimmed sentences.
///
/// A boundary is terminal punctuation (`.`, `!`, `?`) followed by whitespace,
/// unless the next word starts lowercase (`Inc. said`) or with an opening
/// bracket (`Inc. (AAPL)`), or end of text.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let end = i + c.len_utf8();
        let Some(&(_, next)) = chars.peek() else {
            break;
        };
        if !next.is_whitespace() {
            continue;
        }
        let following = text[end..].chars().find(|ch| !ch.is_whitespace());
        if following.is_some_and(|ch| ch.is_lowercase() || matches!(ch, '(' | '[')) {
            continue;
        }
        push_trimmed(&mut sentences, &text[start..end]);
        start = end;
    }

    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, piece: &'a str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}
