//! Property tests for tagging and signal invariants.
//!
//! Uses proptest to verify:
//! 1. Carry-forward: output length matches input, direct mentions survive,
//!    empty sentences inherit, and nothing is empty once any ticker appears
//! 2. Sequence ids are strictly increasing and reproducible
//! 3. Bucket math is total: never panics, zero before the lookback fills
//! 4. Enrichment never overwrites a signal

use proptest::prelude::*;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use tickertape_core::data::RawBar;
use tickertape_core::domain::{Enrichment, SequenceAssigner, TickerSignal};
use tickertape_core::signals::{compute_ticker_signals, price_buckets, volume_buckets};
use tickertape_core::text::carry_forward;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_mentions() -> impl Strategy<Value = Vec<Vec<String>>> {
    let ticker = prop::sample::select(vec!["AAPL", "MSFT", "NVDA", "BRK_B"]);
    let sentence = prop::collection::btree_set(ticker, 0..3)
        .prop_map(|set| set.into_iter().map(String::from).collect::<Vec<_>>());
    // Bias towards empty sentences so carry-forward actually triggers.
    let sentence = prop_oneof![2 => Just(Vec::new()), 1 => sentence];
    prop::collection::vec(sentence, 0..20)
}

fn arb_bars() -> impl Strategy<Value = Vec<RawBar>> {
    prop::collection::vec((0.0..500.0_f64, 0.0..0.1_f64, 0u64..10_000_000), 0..60).prop_map(
        |rows| {
            let base = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
            rows.into_iter()
                .enumerate()
                .map(|(i, (close, spread, volume))| RawBar {
                    date: base + chrono::Duration::days(i as i64),
                    open: close,
                    high: close * (1.0 + spread),
                    low: close,
                    close,
                    volume,
                    adj_close: close,
                })
                .collect()
        },
    )
}

// ── 1. Carry-forward ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn carry_forward_shape(mentions in arb_mentions()) {
        let out = carry_forward(mentions.clone());
        prop_assert_eq!(out.len(), mentions.len());

        let first = mentions.iter().position(|m| !m.is_empty());
        for (i, direct) in mentions.iter().enumerate() {
            if !direct.is_empty() {
                prop_assert_eq!(&out[i][..], &direct[..]);
            } else if first.is_some() {
                prop_assert!(!out[i].is_empty());
            } else {
                prop_assert!(out[i].is_empty());
            }
        }
    }

    #[test]
    fn empty_sentences_inherit_nearest_earlier_mention(mentions in arb_mentions()) {
        let out = carry_forward(mentions.clone());
        let Some(first) = mentions.iter().position(|m| !m.is_empty()) else {
            return Ok(());
        };
        for i in 0..mentions.len() {
            if !mentions[i].is_empty() {
                continue;
            }
            let source = if i < first {
                first
            } else {
                (0..i).rev().find(|&j| !mentions[j].is_empty()).unwrap()
            };
            prop_assert_eq!(&out[i][..], &mentions[source][..]);
        }
    }
}

// ── 2. Sequence ids ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn sequence_ids_increase_and_repeat(
        doc_id in "[0-9]{1,12}",
        n in 1usize..300,
        day in 0i64..3000,
    ) {
        let date = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap() + chrono::Duration::days(day);
        let mut a = SequenceAssigner::new(date, &doc_id);
        let mut b = SequenceAssigner::new(date, &doc_id);
        let ids: Vec<_> = (0..n).map(|_| a.next_id().unwrap()).collect();
        let again: Vec<_> = (0..n).map(|_| b.next_id().unwrap()).collect();

        prop_assert_eq!(&ids, &again);
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        let distinct: BTreeSet<_> = ids.iter().collect();
        prop_assert_eq!(distinct.len(), n);
        prop_assert!(ids[0].as_str().starts_with(&date.format("%Y%m%d").to_string()));
    }
}

// ── 3. Bucket math ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn buckets_cover_every_bar(bars in arb_bars()) {
        let signals = compute_ticker_signals(&bars);
        prop_assert_eq!(signals.len(), bars.len());

        let price = price_buckets(&bars);
        let volume = volume_buckets(&bars);
        if let Some(p) = price.first() {
            prop_assert_eq!(*p, 0);
        }
        for v in volume.iter().take(3) {
            prop_assert_eq!(*v, 0);
        }
        for s in signals.values() {
            prop_assert!(s.range_bucket >= 0);
        }
    }

    #[test]
    fn flat_series_has_zero_buckets(close in 1.0..1000.0_f64, volume in 1u64..1_000_000, n in 0usize..30) {
        let base = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let bars: Vec<RawBar> = (0..n)
            .map(|i| RawBar {
                date: base + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume,
                adj_close: close,
            })
            .collect();
        for s in compute_ticker_signals(&bars).values() {
            prop_assert_eq!(*s, TickerSignal::default());
        }
    }
}

// ── 4. Enrichment is write-once ──────────────────────────────────────

proptest! {
    #[test]
    fn enriched_signal_is_never_overwritten(signals in prop::collection::vec((-50i32..50, -50i32..50, 0i32..50), 1..10)) {
        let mut status: Enrichment<TickerSignal> = Enrichment::Pending;
        let as_signal = |(p, v, r): (i32, i32, i32)| TickerSignal {
            price_bucket: p,
            volume_bucket: v,
            range_bucket: r,
        };
        let first = as_signal(signals[0]);
        for (i, s) in signals.iter().enumerate() {
            prop_assert_eq!(status.enrich(as_signal(*s)), i == 0);
        }
        prop_assert_eq!(status.signal(), Some(&first));
    }
}
