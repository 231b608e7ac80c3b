//! Inverse-volatility asset allocator.
//!
//! For each date, weights are proportional to the reciprocal of each asset's
//! rolling return volatility, normalized to sum to 1. An optional per-asset
//! cap is enforced by iterative cap-and-redistribute: offenders are pinned at
//! the cap and the remainder is split proportionally among the uncapped
//! assets until every weight complies.

use serde::{Deserialize, Serialize};

use crate::domain::Frame;
use crate::error::{ConfigError, EngineError, FeasibilityError};
use crate::indicators::rolling_std;

/// Bound on the cap-and-redistribute loop. Convergence is not proven for
/// pathological weight/cap combinations; the bound is a safety valve.
pub const MAX_CAP_ITERATIONS: usize = 100;

/// Tolerance for "within the cap" comparisons.
pub const CAP_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InverseVolParams {
    /// Rolling window for return volatility, in trading days.
    pub lookback: usize,
    /// Per-asset weight cap; 1.0 disables capping.
    pub max_weight: f64,
    /// Volatility floor preventing division by zero on flat assets.
    pub min_vol: f64,
}

impl Default for InverseVolParams {
    fn default() -> Self {
        Self {
            lookback: 20,
            max_weight: 1.0,
            min_vol: 1e-4,
        }
    }
}

impl InverseVolParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback < 2 {
            return Err(ConfigError::Parameter {
                name: "lookback",
                reason: format!("must be >= 2, got {}", self.lookback),
            });
        }
        if !(self.max_weight > 0.0 && self.max_weight <= 1.0) {
            return Err(ConfigError::Parameter {
                name: "max_weight",
                reason: format!("must be in (0, 1], got {}", self.max_weight),
            });
        }
        if !(self.min_vol > 0.0 && self.min_vol.is_finite()) {
            return Err(ConfigError::Parameter {
                name: "min_vol",
                reason: format!("must be > 0, got {}", self.min_vol),
            });
        }
        Ok(())
    }
}

/// Inverse-volatility weights over a wide asset-return table.
///
/// The first `lookback - 1` rows are undefined, as is any later row whose
/// volatility window still contains undefined returns. Rows with a partial
/// set of defined assets are normalized across the defined ones and left for
/// the caller's residual-row handling.
pub fn inverse_volatility_weights(
    returns: &Frame,
    params: &InverseVolParams,
) -> Result<Frame, EngineError> {
    params.validate()?;
    let n_assets = returns.ncols();
    let feasible = params.max_weight * n_assets as f64;
    if feasible < 1.0 {
        return Err(EngineError::Feasibility(FeasibilityError::AssetCap {
            n_assets,
            max_weight: params.max_weight,
            product: feasible,
        }));
    }

    // Rolling vol per asset, floored to keep the reciprocal finite.
    let mut weights = Frame::filled(
        returns.dates().to_vec(),
        returns.columns().to_vec(),
        f64::NAN,
    );
    let inv_vols: Vec<Vec<f64>> = (0..n_assets)
        .map(|col| {
            rolling_std(&returns.column_values(col), params.lookback)
                .into_iter()
                .map(|v| {
                    if v.is_nan() {
                        f64::NAN
                    } else {
                        1.0 / v.max(params.min_vol)
                    }
                })
                .collect()
        })
        .collect();

    for row in 0..returns.nrows() {
        let row_inv: Vec<f64> = inv_vols.iter().map(|col| col[row]).collect();
        let defined_sum: f64 = row_inv.iter().filter(|v| !v.is_nan()).sum();
        if defined_sum <= 0.0 {
            continue; // fully undefined row
        }
        for (col, &inv) in row_inv.iter().enumerate() {
            if !inv.is_nan() {
                weights.set(row, col, inv / defined_sum);
            }
        }
        if params.max_weight < 1.0 && !weights.row_has_nan(row) {
            cap_and_redistribute(weights.row_mut(row), params.max_weight);
        }
    }

    Ok(weights)
}

/// 1/N weights over the same shape as `returns`. Baseline allocator.
pub fn equal_weights(returns: &Frame) -> Frame {
    let n_assets = returns.ncols().max(1);
    Frame::filled(
        returns.dates().to_vec(),
        returns.columns().to_vec(),
        1.0 / n_assets as f64,
    )
}

/// Iteratively cap weights at `max_weight`, redistributing the excess
/// proportionally among uncapped entries until every weight complies or the
/// iteration bound is hit. The row is renormalized to sum to 1.
pub(crate) fn cap_and_redistribute(row: &mut [f64], max_weight: f64) {
    for _ in 0..MAX_CAP_ITERATIONS {
        let exceeds: Vec<bool> = row.iter().map(|&w| w > max_weight + CAP_TOLERANCE).collect();
        if !exceeds.iter().any(|&e| e) {
            break;
        }

        let n_capped = exceeds.iter().filter(|&&e| e).count();
        let total_capped = max_weight * n_capped as f64;
        let total_uncapped: f64 = row
            .iter()
            .zip(exceeds.iter())
            .filter(|(_, &e)| !e)
            .map(|(&w, _)| w)
            .sum();
        let remaining = 1.0 - total_capped;

        for (w, &e) in row.iter_mut().zip(exceeds.iter()) {
            if e {
                *w = max_weight;
            } else if total_uncapped > 0.0 {
                *w = *w / total_uncapped * remaining;
            }
        }
        if total_uncapped <= 0.0 {
            break; // every asset is pinned at the cap
        }
    }
}
