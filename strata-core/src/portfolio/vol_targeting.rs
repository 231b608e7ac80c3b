//! Volatility targeting — leverage scaling toward a target annualized vol.

use serde::{Deserialize, Serialize};

use crate::domain::{DateSeries, Frame};
use crate::error::{ConfigError, DataError, EngineError};
use crate::indicators::rolling_std;

/// Trading days per year for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolTargetConfig {
    /// Target annualized volatility (0.10 = 10%).
    pub target_vol: f64,
    /// Rolling window for realized portfolio volatility, in trading days.
    pub lookback: usize,
    /// Lower bound on the leverage multiplier.
    pub min_leverage: f64,
    /// Upper bound on the leverage multiplier.
    pub max_leverage: f64,
}

impl Default for VolTargetConfig {
    fn default() -> Self {
        Self {
            target_vol: 0.10,
            lookback: 60,
            min_leverage: 0.0,
            max_leverage: 2.0,
        }
    }
}

impl VolTargetConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.target_vol > 0.0 && self.target_vol.is_finite()) {
            return Err(ConfigError::Parameter {
                name: "target_vol",
                reason: format!("must be > 0, got {}", self.target_vol),
            });
        }
        if self.lookback < 2 {
            return Err(ConfigError::Parameter {
                name: "lookback",
                reason: format!("must be >= 2, got {}", self.lookback),
            });
        }
        if !(self.min_leverage >= 0.0 && self.min_leverage.is_finite()) {
            return Err(ConfigError::Parameter {
                name: "min_leverage",
                reason: format!("must be >= 0, got {}", self.min_leverage),
            });
        }
        if !(self.max_leverage > 0.0 && self.max_leverage.is_finite()) {
            return Err(ConfigError::Parameter {
                name: "max_leverage",
                reason: format!("must be > 0, got {}", self.max_leverage),
            });
        }
        if self.min_leverage > self.max_leverage {
            return Err(ConfigError::Parameter {
                name: "min_leverage",
                reason: format!(
                    "cannot exceed max_leverage ({} > {})",
                    self.min_leverage, self.max_leverage
                ),
            });
        }
        Ok(())
    }
}

/// Rolling annualized portfolio volatility over `lookback` trading days.
pub fn rolling_portfolio_volatility(
    portfolio_returns: &DateSeries,
    lookback: usize,
    annualize: bool,
) -> DateSeries {
    let factor = if annualize {
        TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        1.0
    };
    let vol: Vec<f64> = rolling_std(portfolio_returns.values(), lookback)
        .into_iter()
        .map(|v| v * factor)
        .collect();
    DateSeries::new(portfolio_returns.dates().to_vec(), vol)
        .expect("volatility preserves series length")
}

/// Leverage series for the given returns: `target_vol / realized_vol`,
/// clipped to the configured bounds, defaulting to 1.0 during warmup.
///
/// The realized volatility is shifted one day before use: leverage at date t
/// depends only on returns through t-1, so a return shock first observed at
/// t cannot affect the same day's weights.
pub fn leverage_series(
    portfolio_returns: &DateSeries,
    config: &VolTargetConfig,
) -> Result<DateSeries, EngineError> {
    config.validate()?;

    let vol = rolling_portfolio_volatility(portfolio_returns, config.lookback, true);
    let n = vol.len();
    let mut leverage = vec![1.0; n];
    for t in 0..n {
        // One-day lag: the newest volatility usable at t was computed at t-1.
        let lagged_vol = if t == 0 { f64::NAN } else { vol.get(t - 1) };
        if lagged_vol.is_nan() {
            continue; // warmup: unlevered
        }
        // Zero realized vol sends the raw ratio to infinity; the clamp turns
        // that into max_leverage rather than an undefined weight.
        let raw = if lagged_vol > 0.0 {
            config.target_vol / lagged_vol
        } else {
            f64::INFINITY
        };
        leverage[t] = raw.clamp(config.min_leverage, config.max_leverage);
    }
    DateSeries::new(portfolio_returns.dates().to_vec(), leverage)
        .map_err(|e| EngineError::Data(e))
}

/// Scale every weight row by that date's leverage.
///
/// `portfolio_returns` and `weights` must share the same date index.
pub fn apply_vol_targeting(
    portfolio_returns: &DateSeries,
    weights: &Frame,
    config: &VolTargetConfig,
) -> Result<Frame, EngineError> {
    if portfolio_returns.dates() != weights.dates() {
        return Err(EngineError::Data(DataError::IndexMismatch {
            label: "vol-targeting inputs".into(),
            missing: 0,
            extra: 0,
        }));
    }
    let leverage = leverage_series(portfolio_returns, config)?;

    let mut out = weights.clone();
    for row in 0..out.nrows() {
        let lev = leverage.get(row);
        for col in 0..out.ncols() {
            let w = out.get(row, col);
            out.set(row, col, w * lev);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| base + chrono::Duration::days(i as i64))
            .collect()
    }

    fn series(values: Vec<f64>) -> DateSeries {
        let n = values.len();
        DateSeries::new(dates(n), values).unwrap()
    }

    fn alternating(magnitude: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| if i % 2 == 0 { magnitude } else { -magnitude })
            .collect()
    }

    fn config(lookback: usize) -> VolTargetConfig {
        VolTargetConfig {
            lookback,
            ..VolTargetConfig::default()
        }
    }

    #[test]
    fn warmup_leverage_is_one() {
        let returns = series(alternating(0.01, 20));
        let leverage = leverage_series(&returns, &config(10)).unwrap();
        // Vol first defined at index 9; lagged availability starts at 10.
        for t in 0..10 {
            assert_eq!(leverage.get(t), 1.0, "t={t}");
        }
        assert_ne!(leverage.get(10), 1.0);
    }

    #[test]
    fn leverage_is_target_over_realized() {
        let returns = series(alternating(0.01, 20));
        let cfg = config(10);
        let leverage = leverage_series(&returns, &cfg).unwrap();
        let vol = rolling_portfolio_volatility(&returns, 10, true);
        let expected = (cfg.target_vol / vol.get(9)).clamp(cfg.min_leverage, cfg.max_leverage);
        assert!((leverage.get(10) - expected).abs() < 1e-12);
    }

    #[test]
    fn same_day_shock_does_not_move_leverage() {
        let n = 30;
        let quiet = alternating(0.01, n);
        let mut shocked = quiet.clone();
        let t = 25;
        shocked[t] = -0.15;

        let cfg = config(10);
        let lev_quiet = leverage_series(&series(quiet), &cfg).unwrap();
        let lev_shocked = leverage_series(&series(shocked), &cfg).unwrap();

        // The shock at t is invisible at t...
        assert_eq!(lev_quiet.get(t), lev_shocked.get(t));
        // ...and visible from t+1.
        assert!(lev_shocked.get(t + 1) < lev_quiet.get(t + 1));
    }

    #[test]
    fn leverage_is_clamped() {
        // Tiny realized vol drives the raw ratio far above max_leverage.
        let returns = series(alternating(1e-5, 20));
        let cfg = config(10);
        let leverage = leverage_series(&returns, &cfg).unwrap();
        assert_eq!(leverage.get(12), cfg.max_leverage);
    }

    #[test]
    fn zero_vol_maps_to_max_leverage() {
        let returns = series(vec![0.0; 20]);
        let cfg = config(10);
        let leverage = leverage_series(&returns, &cfg).unwrap();
        assert_eq!(leverage.get(12), cfg.max_leverage);
    }

    #[test]
    fn weights_scale_by_leverage() {
        let returns = series(alternating(0.01, 20));
        let weights = Frame::filled(dates(20), vec!["A".into(), "B".into()], 0.5);
        let cfg = config(10);
        let scaled = apply_vol_targeting(&returns, &weights, &cfg).unwrap();
        let leverage = leverage_series(&returns, &cfg).unwrap();
        for row in 0..20 {
            for col in 0..2 {
                assert!((scaled.get(row, col) - 0.5 * leverage.get(row)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn invalid_params_rejected() {
        let returns = series(alternating(0.01, 10));
        let weights = Frame::filled(dates(10), vec!["A".into()], 1.0);
        for cfg in [
            VolTargetConfig {
                target_vol: 0.0,
                ..VolTargetConfig::default()
            },
            VolTargetConfig {
                lookback: 1,
                ..VolTargetConfig::default()
            },
            VolTargetConfig {
                min_leverage: 3.0,
                max_leverage: 2.0,
                ..VolTargetConfig::default()
            },
        ] {
            assert!(apply_vol_targeting(&returns, &weights, &cfg).is_err());
        }
    }

    #[test]
    fn mismatched_index_rejected() {
        let returns = series(alternating(0.01, 10));
        let weights = Frame::filled(dates(11), vec!["A".into()], 1.0);
        assert!(apply_vol_targeting(&returns, &weights, &config(5)).is_err());
    }
}
