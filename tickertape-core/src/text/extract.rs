//! Ticker extraction with carry-forward and backfill.
//!
//! Per sentence, a ticker is any token tagged as a proper noun whose surface
//! form is in the universe. Sentences without a direct mention inherit the
//! tickers of the nearest preceding sentence that had one; sentences before
//! the first mention inherit the first mention's tickers.

use std::sync::Arc;

use super::annotate::AnnotatedSentence;
use crate::data::TickerUniverse;

/// Tickers attributed to one sentence, in first-seen order.
///
/// Carried-forward sentences share the same allocation as the sentence they
/// inherit from, so the list is immutable by construction.
pub type TickerSet = Arc<[String]>;

/// Direct mentions in one sentence: proper-noun tokens that are universe
/// members, deduplicated, first-seen order.
pub fn tickers_in_sentence(sentence: &AnnotatedSentence, universe: &TickerUniverse) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for tok in &sentence.tokens {
        if tok.pos.starts_with("NNP")
            && universe.contains(&tok.token)
            && !found.iter().any(|t| *t == tok.token)
        {
            found.push(tok.token.clone());
        }
    }
    found
}

/// Apply carry-forward then backfill to per-sentence direct mentions.
pub fn carry_forward(per_sentence: Vec<Vec<String>>) -> Vec<TickerSet> {
    let empty: TickerSet = Arc::from(Vec::<String>::new());
    let mut out: Vec<TickerSet> = Vec::with_capacity(per_sentence.len());
    let mut last: Option<TickerSet> = None;

    for direct in per_sentence {
        if direct.is_empty() {
            out.push(last.clone().unwrap_or_else(|| empty.clone()));
        } else {
            let set: TickerSet = Arc::from(direct);
            last = Some(set.clone());
            out.push(set);
        }
    }

    if let Some(first) = out.iter().position(|set| !set.is_empty()) {
        let head = out[first].clone();
        for slot in &mut out[..first] {
            *slot = head.clone();
        }
    }

    out
}

/// Tickers for every sentence of one document. Zero sentences yields an empty result.
pub fn extract_tickers(sentences: &[AnnotatedSentence], universe: &TickerUniverse) -> Vec<TickerSet> {
    if sentences.is_empty() {
        return Vec::new();
    }
    carry_forward(
        sentences
            .iter()
            .map(|s| tickers_in_sentence(s, universe))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::annotate::AnnotatedToken;

    fn sentence(tokens: &[(&str, &str)]) -> AnnotatedSentence {
        AnnotatedSentence {
            text: tokens.iter().map(|(t, _)| *t).collect::<Vec<_>>().join(" "),
            tokens: tokens
                .iter()
                .map(|(t, pos)| AnnotatedToken {
                    token: t.to_string(),
                    lemma: t.to_string(),
                    pos: pos.to_string(),
                })
                .collect(),
        }
    }

    fn universe() -> TickerUniverse {
        TickerUniverse::new("VOO", ["AAPL", "MSFT", "NVDA", "BRK.B"])
    }

    fn as_vecs(sets: &[TickerSet]) -> Vec<Vec<&str>> {
        sets.iter()
            .map(|s| s.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn carry_forward_and_backfill() {
        let doc = vec![
            sentence(&[("Markets", "NNS"), ("opened", "VBD")]),
            sentence(&[("AAPL", "NNP"), ("rose", "VBD")]),
            sentence(&[("It", "PRP"), ("gained", "VBD")]),
            sentence(&[("MSFT", "NNP"), ("fell", "VBD")]),
        ];
        let out = extract_tickers(&doc, &universe());
        assert_eq!(
            as_vecs(&out),
            vec![vec!["AAPL"], vec!["AAPL"], vec!["AAPL"], vec!["MSFT"]]
        );
    }

    #[test]
    fn carried_sets_share_allocation() {
        let out = carry_forward(vec![vec![], vec!["AAPL".into()], vec![]]);
        assert!(Arc::ptr_eq(&out[0], &out[1]));
        assert!(Arc::ptr_eq(&out[1], &out[2]));
    }

    #[test]
    fn no_matches_leaves_all_empty() {
        let doc = vec![
            sentence(&[("Rates", "NNS"), ("rose", "VBD")]),
            sentence(&[("Bonds", "NNS"), ("fell", "VBD")]),
        ];
        let out = extract_tickers(&doc, &universe());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|s| s.is_empty()));
    }

    #[test]
    fn zero_sentences_is_empty() {
        assert!(extract_tickers(&[], &universe()).is_empty());
    }

    #[test]
    fn requires_proper_noun_tag() {
        let doc = vec![sentence(&[("AAPL", "NN"), ("MSFT", "NNPS")])];
        assert_eq!(as_vecs(&extract_tickers(&doc, &universe())), vec![vec!["MSFT"]]);
    }

    #[test]
    fn dedups_in_first_seen_order() {
        let doc = vec![sentence(&[
            ("NVDA", "NNP"),
            ("and", "CC"),
            ("AAPL", "NNP"),
            ("beat", "VBD"),
            ("NVDA", "NNP"),
        ])];
        assert_eq!(
            as_vecs(&extract_tickers(&doc, &universe())),
            vec![vec!["NVDA", "AAPL"]]
        );
    }

    #[test]
    fn dotted_tickers_match_in_underscore_form() {
        let doc = vec![sentence(&[("BRK_B", "NNP")])];
        assert_eq!(as_vecs(&extract_tickers(&doc, &universe())), vec![vec!["BRK_B"]]);
    }

    #[test]
    fn later_mention_replaces_carried_set() {
        let out = carry_forward(vec![
            vec!["AAPL".into(), "MSFT".into()],
            vec![],
            vec!["NVDA".into()],
            vec![],
        ]);
        assert_eq!(
            as_vecs(&out),
            vec![
                vec!["AAPL", "MSFT"],
                vec!["AAPL", "MSFT"],
                vec!["NVDA"],
                vec!["NVDA"]
            ]
        );
    }
}
