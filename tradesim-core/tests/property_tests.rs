//! Property-based tests for simulation invariants.
//!
//! Uses proptest to generate random price walks and strategy parameters,
//! then verifies structural properties that must hold for every run.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use tradesim_core::domain::{Bar, BarSeries, Timeframe};
use tradesim_core::engine::{simulate, EngineConfig, StrategyDefinition};
use tradesim_core::indicators::{IndicatorKey, IndicatorSnapshot};
use tradesim_core::rules::{evaluate, Comparand, Condition, Operator};
use tradesim_core::sizers::SizingPolicy;

// ── Strategies (proptest generators) ─────────────────────────────────

/// Random walk of daily returns turned into sane OHLC bars.
fn arb_series() -> impl Strategy<Value = BarSeries> {
    (
        prop::collection::vec(-0.04..0.04f64, 220..320),
        prop::collection::vec(0.0..0.02f64, 320),
    )
        .prop_map(|(returns, wicks)| {
            let base = Utc.with_ymd_and_hms(2021, 1, 4, 0, 0, 0).unwrap();
            let mut close = 100.0;
            let bars = returns
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    let open = close;
                    close *= 1.0 + r;
                    let wick = wicks[i] * open;
                    Bar::new(
                        base + Duration::days(i as i64),
                        open,
                        open.max(close) + wick,
                        open.min(close) - wick,
                        close,
                        50_000.0,
                    )
                })
                .collect();
            BarSeries::new("PROP", Timeframe::Day1, bars).unwrap()
        })
}

fn arb_sizing() -> impl Strategy<Value = SizingPolicy> {
    prop_oneof![
        (100.0..20_000.0f64).prop_map(SizingPolicy::fixed),
        (1.0..100.0f64).prop_map(SizingPolicy::percent_capital),
        Just(SizingPolicy::kelly()),
        Just(SizingPolicy::volatility()),
    ]
}

fn arb_strategy() -> impl Strategy<Value = StrategyDefinition> {
    (
        20.0..50.0f64,
        50.0..80.0f64,
        arb_sizing(),
        prop::option::of(1.0..15.0f64),
        prop::option::of(1.0..30.0f64),
        1usize..4,
        0.0..0.5f64,
        0.0..0.5f64,
    )
        .prop_map(|(low, high, sizing, sl, tp, max_positions, commission, slippage)| {
            StrategyDefinition {
                id: "prop".into(),
                name: "prop".into(),
                entry_conditions: vec![Condition::new(IndicatorKey::Rsi(9), Operator::LessThan, low)],
                exit_conditions: vec![Condition::new(IndicatorKey::Rsi(9), Operator::GreaterThan, high)],
                sizing,
                stop_loss_pct: sl,
                take_profit_pct: tp,
                max_positions,
                commission_pct: commission,
                slippage_pct: slippage,
                initial_capital: 10_000.0,
            }
        })
}

fn arb_key() -> impl Strategy<Value = IndicatorKey> {
    prop::sample::select(IndicatorKey::catalog())
}

fn arb_operator() -> impl Strategy<Value = Operator> {
    prop::sample::select(vec![
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::GreaterOrEqual,
        Operator::LessOrEqual,
        Operator::Equal,
        Operator::CrossAbove,
        Operator::CrossBelow,
    ])
}

fn arb_snapshot() -> impl Strategy<Value = IndicatorSnapshot> {
    prop::collection::vec((arb_key(), prop::num::f64::ANY), 0..8).prop_map(|entries| {
        let mut snap = IndicatorSnapshot::new();
        for (key, value) in entries {
            snap.insert(key, value);
        }
        snap
    })
}

// ── Properties ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Final equity equals starting capital plus the sum of net trade P&L.
    #[test]
    fn capital_is_conserved(series in arb_series(), strategy in arb_strategy()) {
        let result = simulate(&series, &strategy, &EngineConfig::default()).unwrap();
        let realized: f64 = result.trades.iter().map(|t| t.net_pnl).sum();
        let expected = strategy.initial_capital + realized;
        prop_assert!(
            (result.final_equity - expected).abs() < 1e-6 * expected.abs().max(1.0),
            "final {} vs ledger {}", result.final_equity, expected
        );
    }

    /// Trades are well-formed and every position is closed by the end.
    #[test]
    fn trades_are_well_formed(series in arb_series(), strategy in arb_strategy()) {
        let result = simulate(&series, &strategy, &EngineConfig::default()).unwrap();
        let last = series.len() - 1;
        for trade in &result.trades {
            prop_assert!(trade.shares > 0.0);
            prop_assert!(trade.entry_bar > result.warmup_index);
            prop_assert!(trade.entry_bar < trade.exit_bar);
            prop_assert!(trade.exit_bar <= last);
            prop_assert!(trade.mae <= trade.mfe);
            prop_assert!(trade.commission >= 0.0);
            prop_assert!((trade.net_pnl - (trade.gross_pnl - trade.commission)).abs() < 1e-9);
        }
        prop_assert_eq!(result.equity_curve.len(), series.len() - result.warmup_index);
        prop_assert!(result.equity_curve.iter().all(|p| p.equity.is_finite() && p.equity >= 0.0));
    }

    /// Identical inputs give identical outputs.
    #[test]
    fn simulation_is_deterministic(series in arb_series(), strategy in arb_strategy()) {
        let a = simulate(&series, &strategy, &EngineConfig::default()).unwrap();
        let b = simulate(&series, &strategy, &EngineConfig::default()).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Rule evaluation is total: any condition over any snapshot yields a bool.
    #[test]
    fn rule_evaluation_is_total(
        key in arb_key(),
        op in arb_operator(),
        other in prop_oneof![
            prop::num::f64::ANY.prop_map(Comparand::Value),
            arb_key().prop_map(Comparand::Indicator),
        ],
        current in arb_snapshot(),
        previous in prop::option::of(arb_snapshot()),
    ) {
        let condition = Condition::new(key, op, other);
        let first = evaluate(&condition, &current, previous.as_ref());
        let second = evaluate(&condition, &current, previous.as_ref());
        prop_assert_eq!(first, second);
        if current.get(key).value().is_none() {
            prop_assert!(!first);
        }
        if op.needs_previous() && previous.is_none() {
            prop_assert!(!first);
        }
    }
}
