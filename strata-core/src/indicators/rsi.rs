//! Relative Strength Index over rolling-mean gains and losses.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss), averages taken as plain
//! rolling means of the one-day gains and losses over `period`.
//! Lookback: period (the first diff consumes one extra bar).
//! Edge cases: avg_loss == 0 -> 100 (fully overbought), avg_gain == 0 -> 0
//! (fully oversold), both zero (flat prices) -> 50 (neutral). All three are
//! defined values, never NaN.

use super::rolling::rolling_mean;

/// RSI over `period` one-day changes. First `period` outputs are NaN.
pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    assert!(period >= 2, "RSI period must be >= 2");
    let n = values.len();
    let mut gains = vec![f64::NAN; n];
    let mut losses = vec![f64::NAN; n];
    for i in 1..n {
        let prev = values[i - 1];
        let curr = values[i];
        if prev.is_nan() || curr.is_nan() {
            continue;
        }
        let change = curr - prev;
        gains[i] = change.max(0.0);
        losses[i] = (-change).max(0.0);
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(&g, &l)| {
            if g.is_nan() || l.is_nan() {
                f64::NAN
            } else if l == 0.0 && g == 0.0 {
                50.0
            } else if l == 0.0 {
                100.0
            } else if g == 0.0 {
                0.0
            } else {
                100.0 - 100.0 / (1.0 + g / l)
            }
        })
        .collect()
}
