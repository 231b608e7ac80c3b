//! Look-ahead contamination tests for the signal and allocation layers.
//!
//! Invariant: no value at bar t may depend on data from bar t+1 or later.
//!
//! Method: compute on a truncated series (bars 0..150) and the full series
//! (bars 0..300), then assert bars 0..150 are identical between both runs.
//! Any difference means future data is leaking into past values.

use chrono::NaiveDate;
use strata_core::allocators::{inverse_volatility_weights, InverseVolParams};
use strata_core::domain::{Bar, Frame, PriceSeries};
use strata_core::indicators::{momentum, rolling_max, rolling_mean, rolling_std, rsi};
use strata_core::strategies::{
    build_strategy, MeanRevParams, StrategyConfig, TrendParams,
};

const FULL_LEN: usize = 300;
const TRUNCATED_LEN: usize = 150;

/// Deterministic pseudo-random close path via a simple LCG.
fn make_closes(n: usize) -> Vec<f64> {
    let mut closes = Vec::with_capacity(n);
    let mut price = 100.0_f64;
    for i in 0..n {
        let seed = (i as u64)
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let change = ((seed >> 33) % 200) as f64 / 100.0 - 1.0; // -1.0 to +1.0
        price = (price + change).max(10.0);
        closes.push(price);
    }
    closes
}

fn make_prices(closes: &[f64]) -> PriceSeries {
    let base = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let bars: Vec<Bar> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: base + chrono::Duration::days(i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1_000,
        })
        .collect();
    PriceSeries::new("TEST", bars).unwrap()
}

/// Equality treating NaN == NaN, with a location message on failure.
fn assert_same_prefix(label: &str, truncated: &[f64], full: &[f64]) {
    assert_eq!(truncated.len(), TRUNCATED_LEN, "{label}: truncated length");
    for i in 0..TRUNCATED_LEN {
        let (a, b) = (truncated[i], full[i]);
        let same = (a.is_nan() && b.is_nan()) || a == b;
        assert!(same, "{label}: leak at bar {i} (truncated={a}, full={b})");
    }
}

#[test]
fn rolling_indicators_have_no_lookahead() {
    let closes = make_closes(FULL_LEN);
    let truncated = &closes[..TRUNCATED_LEN];

    assert_same_prefix(
        "rolling_mean",
        &rolling_mean(truncated, 20),
        &rolling_mean(&closes, 20),
    );
    assert_same_prefix(
        "rolling_std",
        &rolling_std(truncated, 20),
        &rolling_std(&closes, 20),
    );
    assert_same_prefix(
        "rolling_max",
        &rolling_max(truncated, 50),
        &rolling_max(&closes, 50),
    );
    assert_same_prefix("momentum", &momentum(truncated, 60), &momentum(&closes, 60));
    assert_same_prefix("rsi", &rsi(truncated, 14), &rsi(&closes, 14));
}

#[test]
fn strategy_intent_has_no_lookahead() {
    let closes = make_closes(FULL_LEN);
    let full_prices = make_prices(&closes);
    let truncated_prices = make_prices(&closes[..TRUNCATED_LEN]);

    let configs = [
        StrategyConfig::Passthrough,
        StrategyConfig::Trend(TrendParams {
            momentum_lookback: 60,
            sma_short: 10,
            sma_long: 40,
            breakout_period: 60,
            ..TrendParams::default()
        }),
        StrategyConfig::Meanrev(MeanRevParams {
            zscore_lookback: 40,
            ..MeanRevParams::default()
        }),
    ];

    for config in &configs {
        let strategy = build_strategy(config).unwrap();
        let full_intent = strategy.generate_intent(&full_prices);
        let truncated_intent = strategy.generate_intent(&truncated_prices);
        assert_same_prefix(
            strategy.name(),
            truncated_intent.values(),
            full_intent.values(),
        );
    }
}

#[test]
fn inverse_vol_weights_have_no_lookahead() {
    let base = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let dates: Vec<NaiveDate> = (0..FULL_LEN)
        .map(|i| base + chrono::Duration::days(i as i64))
        .collect();

    let closes_a = make_closes(FULL_LEN);
    let closes_b: Vec<f64> = make_closes(FULL_LEN).iter().map(|c| c * 0.5 + 40.0).collect();
    let rets = |closes: &[f64]| -> Vec<f64> {
        let mut out = vec![f64::NAN; closes.len()];
        for i in 1..closes.len() {
            out[i] = closes[i] / closes[i - 1] - 1.0;
        }
        out
    };

    let full = Frame::from_columns(
        dates.clone(),
        vec![
            ("A".to_string(), rets(&closes_a)),
            ("B".to_string(), rets(&closes_b)),
        ],
    )
    .unwrap();
    let truncated = full.slice_rows(0, TRUNCATED_LEN);

    let params = InverseVolParams {
        lookback: 20,
        max_weight: 0.8,
        ..InverseVolParams::default()
    };
    let full_weights = inverse_volatility_weights(&full, &params).unwrap();
    let truncated_weights = inverse_volatility_weights(&truncated, &params).unwrap();

    for col in 0..2 {
        assert_same_prefix(
            "inverse_vol",
            &truncated_weights.column_values(col),
            &full_weights.column_values(col),
        );
    }
}
