//! Risk-parity meta-allocator — inverse volatility over strategy returns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{DateSeries, Frame};
use crate::error::{ConfigError, EngineError};
use crate::indicators::rolling_std;

use super::MetaAllocator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParityParams {
    /// Rolling window for strategy volatility.
    pub vol_lookback: usize,
    /// Per-strategy weight floor after normalization.
    pub min_weight: f64,
    /// Per-strategy weight ceiling after normalization.
    pub max_weight: f64,
}

impl Default for RiskParityParams {
    fn default() -> Self {
        Self {
            vol_lookback: 60,
            min_weight: 0.0,
            max_weight: 1.0,
        }
    }
}

impl RiskParityParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vol_lookback < 10 || self.vol_lookback > 252 {
            return Err(ConfigError::Parameter {
                name: "vol_lookback",
                reason: format!("must be in [10, 252], got {}", self.vol_lookback),
            });
        }
        if !(self.min_weight >= 0.0 && self.min_weight.is_finite()) {
            return Err(ConfigError::Parameter {
                name: "min_weight",
                reason: format!("must be >= 0, got {}", self.min_weight),
            });
        }
        if !(self.max_weight <= 1.0 && self.max_weight.is_finite()) {
            return Err(ConfigError::Parameter {
                name: "max_weight",
                reason: format!("must be <= 1, got {}", self.max_weight),
            });
        }
        if self.min_weight >= self.max_weight {
            return Err(ConfigError::Parameter {
                name: "min_weight",
                reason: format!(
                    "must be < max_weight ({} >= {})",
                    self.min_weight, self.max_weight
                ),
            });
        }
        Ok(())
    }
}

/// Daily weights inversely proportional to each strategy's rolling realized
/// volatility, clipped to `[min_weight, max_weight]` and renormalized.
///
/// Dates where every strategy shows zero or undefined volatility fall back to
/// equal weight rather than dropping out of the market.
#[derive(Debug, Clone)]
pub struct RiskParityAllocator {
    params: RiskParityParams,
}

impl RiskParityAllocator {
    pub fn new(params: RiskParityParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }
}

impl MetaAllocator for RiskParityAllocator {
    fn name(&self) -> &str {
        "risk_parity"
    }

    fn warmup_period(&self) -> usize {
        self.params.vol_lookback
    }

    fn calculate_weights(
        &self,
        aligned_returns: &BTreeMap<String, DateSeries>,
    ) -> Result<Frame, EngineError> {
        let n_strategies = aligned_returns.len();
        let dates = aligned_returns
            .values()
            .next()
            .expect("allocate() rejects empty input")
            .dates()
            .to_vec();
        let nrows = dates.len();

        // Inverse rolling vol per strategy; zero vol becomes undefined here
        // and is resolved per-row below.
        let inv_vols: Vec<Vec<f64>> = aligned_returns
            .values()
            .map(|series| {
                rolling_std(series.values(), self.params.vol_lookback)
                    .into_iter()
                    .map(|v| {
                        if v.is_nan() || v == 0.0 {
                            f64::NAN
                        } else {
                            1.0 / v
                        }
                    })
                    .collect()
            })
            .collect();

        let mut columns: Vec<(String, Vec<f64>)> = aligned_returns
            .keys()
            .map(|name| (name.clone(), vec![f64::NAN; nrows]))
            .collect();

        let equal = 1.0 / n_strategies as f64;
        for row in 0..nrows {
            let row_inv: Vec<f64> = inv_vols.iter().map(|col| col[row]).collect();
            let defined_sum: f64 = row_inv.iter().filter(|v| !v.is_nan()).sum();
            let any_defined = row_inv.iter().any(|v| !v.is_nan());

            let mut weights: Vec<f64> = if !any_defined {
                // All strategies zero/undefined vol: equal weight fallback.
                vec![equal; n_strategies]
            } else {
                // Normalize defined entries; undefined entries get zero and
                // their share is redistributed by the renormalization.
                row_inv
                    .iter()
                    .map(|&v| if v.is_nan() { 0.0 } else { v / defined_sum })
                    .collect()
            };

            // Clip, then renormalize (soft caps: the second normalization can
            // push a clipped weight slightly past the bound again).
            for w in &mut weights {
                *w = w.clamp(self.params.min_weight, self.params.max_weight);
            }
            let sum: f64 = weights.iter().sum();
            if sum > 0.0 {
                for w in &mut weights {
                    *w /= sum;
                }
            }

            for (col, w) in weights.into_iter().enumerate() {
                columns[col].1[row] = w;
            }
        }

        Frame::from_columns(dates, columns).map_err(EngineError::Data)
    }
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

    fn params(lookback: usize) -> RiskParityParams {
        RiskParityParams {
            vol_lookback: lookback,
            ..RiskParityParams::default()
        }
    }

    #[test]
    fn quieter_strategy_gets_more_weight() {
        // "calm" alternates +/-0.01, "wild" alternates +/-0.04.
        let n = 30;
        let calm: Vec<f64> = (0..n)
            .map(|i| if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();
        let wild: Vec<f64> = (0..n)
            .map(|i| if i % 2 == 0 { 0.04 } else { -0.04 })
            .collect();

        let mut returns = BTreeMap::new();
        returns.insert("calm".to_string(), series(calm));
        returns.insert("wild".to_string(), series(wild));

        let allocator = RiskParityAllocator::new(params(10)).unwrap();
        let weights = allocator.calculate_weights(&returns).unwrap();

        let calm_col = weights.column_index("calm").unwrap();
        let wild_col = weights.column_index("wild").unwrap();
        let last = weights.nrows() - 1;
        let w_calm = weights.get(last, calm_col);
        let w_wild = weights.get(last, wild_col);
        assert!(w_calm > w_wild, "calm={w_calm}, wild={w_wild}");
        assert!((w_calm + w_wild - 1.0).abs() < 1e-9);
        // 4x the vol means a quarter of the inverse-vol mass.
        assert!((w_calm - 0.8).abs() < 1e-6);
    }

    #[test]
    fn zero_vol_everywhere_falls_back_to_equal_weight() {
        let mut returns = BTreeMap::new();
        returns.insert("a".to_string(), series(vec![0.0; 20]));
        returns.insert("b".to_string(), series(vec![0.0; 20]));

        let allocator = RiskParityAllocator::new(params(10)).unwrap();
        let weights = allocator.calculate_weights(&returns).unwrap();
        let last = weights.nrows() - 1;
        assert!((weights.get(last, 0) - 0.5).abs() < 1e-12);
        assert!((weights.get(last, 1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn full_allocation_masks_lookback_rows() {
        let mut returns = BTreeMap::new();
        returns.insert(
            "a".to_string(),
            series((0..25).map(|i| 0.01 * ((i % 3) as f64 - 1.0)).collect()),
        );
        returns.insert(
            "b".to_string(),
            series((0..25).map(|i| 0.02 * ((i % 2) as f64 - 0.5)).collect()),
        );

        let allocator = RiskParityAllocator::new(params(10)).unwrap();
        let result = allocator.allocate(&returns).unwrap();

        // align_idx 0, allocator warmup 10: first 10 combined rows undefined.
        for row in 0..10 {
            assert!(result.combined_returns.get(row).is_nan(), "row {row}");
        }
        assert!(!result.combined_returns.get(10).is_nan());
    }

    #[test]
    fn rejects_bad_bounds() {
        let bad = RiskParityParams {
            min_weight: 0.6,
            max_weight: 0.5,
            ..RiskParityParams::default()
        };
        assert!(RiskParityAllocator::new(bad).is_err());
        let bad_lookback = params(5);
        assert!(RiskParityAllocator::new(bad_lookback).is_err());
    }
}
