//! Pre-segmentation text repair.
//!
//! Two passes, always in this order:
//! 1. Idiom protection: multi-token financial terms containing `.` or `&`
//!    become single underscore-joined tokens so the sentence splitter and
//!    tokenizer cannot break them apart.
//! 2. Boundary repair: a period glued directly to an uppercase word
//!    (`rose.Then`) gets a separating space back.

use crate::data::TickerUniverse;

/// Substitutions applied before anything else. Order matters: `S&P 500`
/// must be rewritten before the bare `&` rule fires.
const DEFAULT_IDIOMS: &[(&str, &str)] = &[
    ("S&P 500", "Standard_and_Poor's_500"),
    ("PEG ratio", "PEG_ratio"),
    ("P/E ratio", "P/E_ratio"),
    ("&", "_and_"),
    ("No. ", "No."),
    ("BRK.B", "BRK_B"),
];

#[derive(Debug, Clone)]
pub struct Normalizer {
    idioms: Vec<(String, String)>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Normalizer with the fixed idiom table.
    pub fn new() -> Self {
        Self {
            idioms: DEFAULT_IDIOMS
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// Fixed idiom table plus protection for every dotted ticker in the universe.
    pub fn with_universe(universe: &TickerUniverse) -> Self {
        let mut normalizer = Self::new();
        for ticker in universe.dotted_tickers() {
            let dotted = TickerUniverse::market_symbol(ticker);
            if !normalizer.idioms.iter().any(|(from, _)| *from == dotted) {
                normalizer.idioms.push((dotted, ticker.to_string()));
            }
        }
        normalizer
    }

    /// Run both passes. Never fails; may return the input unchanged.
    pub fn normalize(&self, text: &str) -> String {
        repair_boundaries(&self.protect_idioms(text))
    }

    /// Pass 1 only.
    pub fn protect_idioms(&self, text: &str) -> String {
        self.idioms
            .iter()
            .fold(text.to_string(), |acc, (from, to)| acc.replace(from.as_str(), to))
    }
}

/// Pass 2: re-join period-separated segments, putting a space in front of any
/// segment that starts with an uppercase letter.
///
/// Empty segments are dropped (`..` collapses), and every kept segment is
/// terminated with a period.
pub fn repair_boundaries(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for segment in text.split('.').filter(|s| !s.is_empty()) {
        if segment.chars().next().is_some_and(char::is_uppercase) {
            out.push(' ');
        }
        out.push_str(segment);
        out.push('.');
    }
    out
}
