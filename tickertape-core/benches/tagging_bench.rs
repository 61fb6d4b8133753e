//! Criterion benchmarks for the ingest and enrichment hot paths.
//!
//! 1. Normalize + annotate + extract over a synthetic article
//! 2. Ticker extraction alone over pre-annotated sentences
//! 3. Deviation buckets over a year of daily bars

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tickertape_core::data::{RawBar, TickerUniverse};
use tickertape_core::signals::compute_ticker_signals;
use tickertape_core::text::{extract_tickers, Annotator, Normalizer, RuleAnnotator};

// ── Helpers ──────────────────────────────────────────────────────────

fn universe() -> TickerUniverse {
    TickerUniverse::new(
        "VOO",
        ["AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "BRK.B", "JPM", "XOM", "TSLA"],
    )
}

fn article(sentences: usize) -> String {
    let tickers = ["AAPL", "MSFT", "BRK.B", "NVDA"];
    (0..sentences)
        .map(|i| match i % 4 {
            0 => format!("Shares of {} rose 2.5% after the S&P 500 rallied.", tickers[i % tickers.len()]),
            1 => "The company raised its guidance for the quarter.".to_string(),
            2 => "Analysts said the P/E ratio still looks stretched.".to_string(),
            _ => "It closed higher on heavy volume.".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn make_raw_bars(n: usize) -> Vec<RawBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            RawBar {
                date: base_date + chrono::Duration::days(i as i64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000_000 + (i as u64 % 500_000),
                adj_close: close,
            }
        })
        .collect()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_tagging(c: &mut Criterion) {
    let universe = universe();
    let normalizer = Normalizer::with_universe(&universe);
    let annotator = RuleAnnotator::new();

    let mut group = c.benchmark_group("tag_document");
    for sentences in [10usize, 100, 1000] {
        let text = article(sentences);
        group.bench_with_input(BenchmarkId::from_parameter(sentences), &text, |b, text| {
            b.iter(|| {
                let normalized = normalizer.normalize(black_box(text));
                let annotated = annotator.annotate(&normalized).unwrap();
                extract_tickers(&annotated, &universe)
            })
        });
    }
    group.finish();
}

fn bench_extraction(c: &mut Criterion) {
    let universe = universe();
    let normalizer = Normalizer::with_universe(&universe);
    let annotated = RuleAnnotator::new()
        .annotate(&normalizer.normalize(&article(1000)))
        .unwrap();

    c.bench_function("extract_tickers_1000", |b| {
        b.iter(|| extract_tickers(black_box(&annotated), &universe))
    });
}

fn bench_signals(c: &mut Criterion) {
    let bars = make_raw_bars(252);
    c.bench_function("compute_ticker_signals_252", |b| {
        b.iter(|| compute_ticker_signals(black_box(&bars)))
    });
}

criterion_group!(benches, bench_tagging, bench_extraction, bench_signals);
criterion_main!(benches);
