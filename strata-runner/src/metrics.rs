//! Performance metrics — pure functions over returns, equity, and weights.
//!
//! Every metric is a pure function: series in, scalar or record out. No
//! dependency on the runner or the engine stages. NaN rows (there should be
//! none after the runner's residual-row drop) are skipped, never counted as
//! zero.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use strata_core::domain::{DateSeries, Frame};
use strata_core::portfolio::TRADING_DAYS_PER_YEAR;

/// Maximum drawdown with its defining dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownInfo {
    /// Deepest peak-to-trough loss as a negative fraction (-0.15 = 15%).
    pub max_drawdown: f64,
    /// Last date the equity stood at the pre-trough peak.
    pub peak_date: Option<NaiveDate>,
    /// Date of the trough.
    pub trough_date: Option<NaiveDate>,
    /// First date equity regained the peak; None if never recovered.
    pub recovery_date: Option<NaiveDate>,
    /// Calendar days from peak to trough.
    pub drawdown_days: i64,
    /// Calendar days from trough to recovery; None if never recovered.
    pub recovery_days: Option<i64>,
}

impl DrawdownInfo {
    fn flat() -> Self {
        Self {
            max_drawdown: 0.0,
            peak_date: None,
            trough_date: None,
            recovery_date: None,
            drawdown_days: 0,
            recovery_days: None,
        }
    }
}

/// One row of the per-year summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRow {
    pub year: i32,
    pub total_return: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub volatility: f64,
}

/// Aggregate metrics for one walk-forward run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub sharpe: f64,
    /// Annualized daily-return volatility.
    pub volatility: f64,
    pub total_return: f64,
    /// Compounded annual growth rate over calendar time.
    pub cagr: f64,
    pub max_drawdown: DrawdownInfo,
    pub avg_daily_turnover: f64,
    pub total_turnover: f64,
    /// Mean L1 norm of the weight rows (1.0 = fully invested, unlevered).
    pub avg_leverage: f64,
    pub yearly: Vec<YearlyRow>,
}

impl MetricsBundle {
    /// Compute the full bundle from aligned outputs.
    pub fn compute(
        returns: &DateSeries,
        equity: &DateSeries,
        weights: &Frame,
        asset_returns: &Frame,
    ) -> Self {
        let turnover = daily_turnover(weights, Some(asset_returns));
        let total_turnover: f64 = turnover.iter().sum();
        let avg_daily_turnover = if turnover.is_empty() {
            0.0
        } else {
            total_turnover / turnover.len() as f64
        };

        Self {
            sharpe: sharpe_ratio(returns.values(), 0.0),
            volatility: annualized_volatility(returns.values()),
            total_return: total_return(equity.values()),
            cagr: cagr(equity),
            max_drawdown: max_drawdown(equity),
            avg_daily_turnover,
            total_turnover,
            avg_leverage: average_leverage(weights),
            yearly: yearly_summary(returns, equity),
        }
    }
}

/// Annualized Sharpe ratio: mean excess daily return over its standard
/// deviation, scaled by sqrt(252). Zero-variance or empty input yields 0.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let clean: Vec<f64> = returns
        .iter()
        .filter(|v| !v.is_nan())
        .map(|r| r - daily_rf)
        .collect();
    if clean.len() < 2 {
        return 0.0;
    }
    let mean = clean.iter().sum::<f64>() / clean.len() as f64;
    let std = sample_std(&clean);
    if std < 1e-15 || std.is_nan() {
        return 0.0;
    }
    mean / std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Annualized volatility of daily returns.
pub fn annualized_volatility(returns: &[f64]) -> f64 {
    let clean: Vec<f64> = returns.iter().copied().filter(|v| !v.is_nan()).collect();
    if clean.len() < 2 {
        return 0.0;
    }
    sample_std(&clean) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Total return over the equity curve: last / first - 1.
pub fn total_return(equity: &[f64]) -> f64 {
    match (equity.first(), equity.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

/// CAGR over calendar time (365.25-day years).
pub fn cagr(equity: &DateSeries) -> f64 {
    if equity.len() < 2 {
        return 0.0;
    }
    let first = equity.get(0);
    let last = equity.get(equity.len() - 1);
    if first <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    let days = (equity.dates()[equity.len() - 1] - equity.dates()[0]).num_days();
    let years = days as f64 / 365.25;
    if years <= 0.0 {
        return 0.0;
    }
    (last / first).powf(1.0 / years) - 1.0
}

/// Maximum drawdown with peak, trough, and recovery dates.
///
/// The peak is the *last* date at the pre-trough high, so the duration is
/// accurate when the peak value repeats.
pub fn max_drawdown(equity: &DateSeries) -> DrawdownInfo {
    let values = equity.values();
    let dates = equity.dates();
    if values.is_empty() {
        return DrawdownInfo::flat();
    }

    let mut running_max = values[0];
    let mut max_dd = 0.0_f64;
    let mut trough_idx = None;
    for (i, &v) in values.iter().enumerate() {
        if v > running_max {
            running_max = v;
        }
        if running_max > 0.0 {
            let dd = (v - running_max) / running_max;
            if dd < max_dd {
                max_dd = dd;
                trough_idx = Some(i);
            }
        }
    }

    let Some(trough_idx) = trough_idx else {
        return DrawdownInfo::flat();
    };

    // Peak: last pre-trough index at the running maximum.
    let peak_value = values[..=trough_idx]
        .iter()
        .fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let peak_idx = (0..=trough_idx)
        .rev()
        .find(|&i| values[i] == peak_value)
        .unwrap_or(0);

    // Recovery: first post-trough date back at or above the peak.
    let recovery_idx = (trough_idx + 1..values.len()).find(|&i| values[i] >= peak_value);

    DrawdownInfo {
        max_drawdown: max_dd,
        peak_date: Some(dates[peak_idx]),
        trough_date: Some(dates[trough_idx]),
        recovery_date: recovery_idx.map(|i| dates[i]),
        drawdown_days: (dates[trough_idx] - dates[peak_idx]).num_days(),
        recovery_days: recovery_idx.map(|i| (dates[i] - dates[trough_idx]).num_days()),
    }
}

/// Daily turnover: half the L1 distance between today's weights and
/// yesterday's weights drifted by asset returns.
///
/// Drifting matters: without it, pure price moves register as trading.
/// The first day has zero turnover.
pub fn daily_turnover(weights: &Frame, asset_returns: Option<&Frame>) -> Vec<f64> {
    let n = weights.nrows();
    let mut turnover = vec![0.0; n];
    for row in 1..n {
        let prev = weights.row(row - 1);
        let curr = weights.row(row);
        if prev.iter().chain(curr.iter()).any(|v| v.is_nan()) {
            continue;
        }

        let mut drifted: Vec<f64> = prev.to_vec();
        if let Some(returns) = asset_returns {
            for (col, w) in drifted.iter_mut().enumerate() {
                let r = returns.get(row, col);
                if !r.is_nan() {
                    *w *= 1.0 + r;
                }
            }
            let sum: f64 = drifted.iter().sum();
            if sum > 0.0 {
                for w in &mut drifted {
                    *w /= sum;
                }
            }
        }

        turnover[row] = curr
            .iter()
            .zip(drifted.iter())
            .map(|(c, d)| (c - d).abs())
            .sum::<f64>()
            / 2.0;
    }
    turnover
}

/// Mean L1 norm of the weight rows.
pub fn average_leverage(weights: &Frame) -> f64 {
    let mut count = 0usize;
    let mut sum = 0.0;
    for row in 0..weights.nrows() {
        if weights.row_has_nan(row) {
            continue;
        }
        sum += weights.row(row).iter().map(|w| w.abs()).sum::<f64>();
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Per-year performance rows, in chronological order.
pub fn yearly_summary(returns: &DateSeries, equity: &DateSeries) -> Vec<YearlyRow> {
    let mut years: Vec<i32> = returns.dates().iter().map(|d| d.year()).collect();
    years.dedup();

    years
        .into_iter()
        .map(|year| {
            let idx: Vec<usize> = returns
                .dates()
                .iter()
                .enumerate()
                .filter(|(_, d)| d.year() == year)
                .map(|(i, _)| i)
                .collect();

            let year_returns: Vec<f64> = idx.iter().map(|&i| returns.get(i)).collect();
            let compounded = year_returns
                .iter()
                .filter(|v| !v.is_nan())
                .fold(1.0, |acc, r| acc * (1.0 + r))
                - 1.0;

            let year_equity_values: Vec<f64> = idx.iter().map(|&i| equity.get(i)).collect();
            let year_equity_dates: Vec<NaiveDate> =
                idx.iter().map(|&i| returns.dates()[i]).collect();
            let year_equity = DateSeries::new(year_equity_dates, year_equity_values)
                .expect("year slice lengths match");

            YearlyRow {
                year,
                total_return: compounded,
                sharpe: sharpe_ratio(&year_returns, 0.0),
                max_drawdown: max_drawdown(&year_equity).max_drawdown,
                volatility: annualized_volatility(&year_returns),
            }
        })
        .collect()
}

/// Equity curve compounding daily returns from a base of 100.
pub fn equity_curve(returns: &DateSeries) -> DateSeries {
    let mut equity = Vec::with_capacity(returns.len());
    let mut level = 100.0;
    for &r in returns.values() {
        if !r.is_nan() {
            level *= 1.0 + r;
        }
        equity.push(level);
    }
    DateSeries::new(returns.dates().to_vec(), equity).expect("equity preserves series length")
}

/// Drawdown series: distance below the running equity maximum, as a
/// non-positive fraction.
pub fn drawdown_series(equity: &DateSeries) -> DateSeries {
    let mut running_max = f64::NEG_INFINITY;
    let values: Vec<f64> = equity
        .values()
        .iter()
        .map(|&v| {
            running_max = running_max.max(v);
            if running_max > 0.0 {
                (v - running_max) / running_max
            } else {
                0.0
            }
        })
        .collect();
    DateSeries::new(equity.dates().to_vec(), values).expect("drawdown preserves series length")
}

fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / (n - 1) as f64;
    var.sqrt()
}
