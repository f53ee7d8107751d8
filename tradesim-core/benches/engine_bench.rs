//! Criterion benchmarks for simulation hot paths.
//!
//! Benchmarks:
//! 1. Bar loop (full simulation over a synthetic series)
//! 2. Indicator panel precompute
//! 3. Rule evaluation against a snapshot
//! 4. Reference snapshot recompute from truncated history

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tradesim_core::domain::{Bar, BarSeries, Timeframe};
use tradesim_core::engine::{simulate, EngineConfig, StrategyDefinition};
use tradesim_core::indicators::{compute_snapshot, IndicatorKey, IndicatorPanel};
use tradesim_core::rules::{matches_all, Condition, Operator};
use tradesim_core::sizers::SizingPolicy;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let base = chrono::DateTime::from_timestamp(1_577_923_200, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            Bar::new(
                base + chrono::Duration::days(i as i64),
                open,
                close + 1.5,
                close - 1.5,
                close,
                1_000_000.0 + (i % 500_000) as f64,
            )
        })
        .collect()
}

fn make_strategy() -> StrategyDefinition {
    StrategyDefinition {
        id: "bench".into(),
        name: "EMA cross with RSI filter".into(),
        entry_conditions: vec![
            Condition::new(IndicatorKey::Ema(10), Operator::CrossAbove, IndicatorKey::Sma(50)),
            Condition::new(IndicatorKey::Rsi(14), Operator::LessThan, 70.0),
        ],
        exit_conditions: vec![Condition::new(
            IndicatorKey::Ema(10),
            Operator::CrossBelow,
            IndicatorKey::Sma(50),
        )],
        sizing: SizingPolicy::volatility(),
        stop_loss_pct: Some(5.0),
        take_profit_pct: Some(15.0),
        max_positions: 3,
        commission_pct: 0.1,
        slippage_pct: 0.05,
        initial_capital: 100_000.0,
    }
}

// ── 1. Bar loop ──────────────────────────────────────────────────────

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");
    let strategy = make_strategy();
    let config = EngineConfig::default();

    for &n in &[252usize, 1260, 5040] {
        let series = BarSeries::new("BENCH", Timeframe::Day1, make_bars(n)).unwrap();
        group.bench_with_input(BenchmarkId::new("bars", n), &series, |b, series| {
            b.iter(|| simulate(black_box(series), black_box(&strategy), &config).unwrap());
        });
    }

    group.finish();
}

// ── 2. Indicator panel ───────────────────────────────────────────────

fn bench_panel(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_panel");

    for &n in &[252usize, 1260, 5040] {
        let bars = make_bars(n);
        group.bench_with_input(BenchmarkId::new("catalog", n), &bars, |b, bars| {
            b.iter(|| IndicatorPanel::compute(black_box(bars), &[]));
        });
    }

    group.finish();
}

// ── 3. Rule evaluation ───────────────────────────────────────────────

fn bench_rules(c: &mut Criterion) {
    let bars = make_bars(300);
    let panel = IndicatorPanel::compute(&bars, &[]);
    let previous = panel.snapshot(250);
    let current = panel.snapshot(251);
    let strategy = make_strategy();

    c.bench_function("rules/entry_conditions", |b| {
        b.iter(|| {
            matches_all(
                black_box(&strategy.entry_conditions),
                black_box(&current),
                Some(&previous),
            )
        });
    });
}

// ── 4. Reference snapshot ────────────────────────────────────────────

fn bench_reference_snapshot(c: &mut Criterion) {
    let bars = make_bars(1260);
    c.bench_function("compute_snapshot/1260", |b| {
        b.iter(|| compute_snapshot(black_box(&bars), 1259));
    });
}

criterion_group!(
    benches,
    bench_simulation,
    bench_panel,
    bench_rules,
    bench_reference_snapshot
);
criterion_main!(benches);
