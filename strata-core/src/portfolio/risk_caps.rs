//! Risk-cap engine — concentration constraints on a weight matrix.
//!
//! Constraints apply in a fixed order: per-asset cap, then per-sector cap
//! (if enabled), then the minimum-assets-held floor, renormalizing after
//! each stage. Feasibility is validated before any row is touched, so an
//! impossible configuration fails fast instead of silently producing an
//! under-invested portfolio.
//!
//! Rows containing undefined weights (warmup, data gaps) pass through
//! untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::allocators::inverse_vol::{cap_and_redistribute, CAP_TOLERANCE, MAX_CAP_ITERATIONS};
use crate::domain::Frame;
use crate::error::{ConfigError, EngineError, FeasibilityError};

/// Weight below which an asset counts as "not held".
pub const HOLDING_THRESHOLD: f64 = 1e-6;

/// Maps symbol -> sector label. Symbols absent from the map fall into the
/// "unknown" sector.
pub type SectorMap = BTreeMap<String, String>;

const UNKNOWN_SECTOR: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskCapConfig {
    /// Maximum weight for any single asset, in (0, 1].
    pub max_weight_per_asset: f64,
    /// Maximum combined weight for any sector; None disables sector capping.
    pub max_sector_weight: Option<f64>,
    /// Minimum number of assets carrying non-trivial weight.
    pub min_assets_held: usize,
}

impl Default for RiskCapConfig {
    fn default() -> Self {
        Self {
            max_weight_per_asset: 0.20,
            max_sector_weight: Some(0.40),
            min_assets_held: 1,
        }
    }
}

impl RiskCapConfig {
    /// Validate parameter ranges and feasibility against a universe.
    ///
    /// Feasibility rules:
    /// - `n_assets * max_weight_per_asset >= 1.0`, or no weight vector can
    ///   sum to 1 under the cap;
    /// - `n_sectors * max_sector_weight >= 1.0` for the same reason;
    /// - `min_assets_held <= n_assets`.
    pub fn validate(&self, symbols: &[String], sector_map: &SectorMap) -> Result<(), EngineError> {
        let n_assets = symbols.len();

        if self.min_assets_held < 1 {
            return Err(EngineError::Config(ConfigError::Parameter {
                name: "min_assets_held",
                reason: format!("must be >= 1, got {}", self.min_assets_held),
            }));
        }
        if self.min_assets_held > n_assets {
            return Err(EngineError::Feasibility(
                FeasibilityError::MinAssetsExceedsUniverse {
                    min_assets: self.min_assets_held,
                    n_assets,
                },
            ));
        }
        if !(self.max_weight_per_asset > 0.0 && self.max_weight_per_asset <= 1.0) {
            return Err(EngineError::Config(ConfigError::Parameter {
                name: "max_weight_per_asset",
                reason: format!("must be in (0, 1], got {}", self.max_weight_per_asset),
            }));
        }
        let product = n_assets as f64 * self.max_weight_per_asset;
        if product < 1.0 {
            return Err(EngineError::Feasibility(FeasibilityError::AssetCap {
                n_assets,
                max_weight: self.max_weight_per_asset,
                product,
            }));
        }

        if let Some(max_sector) = self.max_sector_weight {
            if !(max_sector > 0.0 && max_sector <= 1.0) {
                return Err(EngineError::Config(ConfigError::Parameter {
                    name: "max_sector_weight",
                    reason: format!("must be in (0, 1], got {max_sector}"),
                }));
            }
            let n_sectors = sectors_of(symbols, sector_map).len();
            let product = n_sectors as f64 * max_sector;
            if product < 1.0 {
                return Err(EngineError::Feasibility(FeasibilityError::SectorCap {
                    n_sectors,
                    max_sector_weight: max_sector,
                    product,
                }));
            }
        }
        Ok(())
    }
}

/// Apply all risk caps to a weight matrix: per-asset cap, per-sector cap,
/// minimum-assets floor, renormalizing after each stage.
pub fn apply_all_risk_caps(
    weights: &Frame,
    sector_map: &SectorMap,
    config: &RiskCapConfig,
) -> Result<Frame, EngineError> {
    config.validate(weights.columns(), sector_map)?;

    let mut out = apply_per_asset_caps(weights, config.max_weight_per_asset);
    if let Some(max_sector) = config.max_sector_weight {
        out = apply_per_sector_caps(&out, sector_map, max_sector);
    }
    out = apply_min_assets_constraint(&out, config.min_assets_held);
    Ok(out)
}

/// Per-asset cap via iterative cap-and-redistribute (see the allocator's
/// capping loop). Rows that already comply are untouched, preserving any
/// leverage baked into the row sum.
pub fn apply_per_asset_caps(weights: &Frame, max_weight: f64) -> Frame {
    let mut out = weights.clone();
    for row in 0..out.nrows() {
        if out.row_has_nan(row) {
            continue;
        }
        cap_and_redistribute(out.row_mut(row), max_weight);
    }
    out
}

/// Per-sector cap: scale every asset in an over-cap sector by
/// `max_sector_weight / sector_total`, renormalize, and iterate until all
/// sectors comply or the iteration bound is hit.
pub fn apply_per_sector_caps(
    weights: &Frame,
    sector_map: &SectorMap,
    max_sector_weight: f64,
) -> Frame {
    let sectors: Vec<&str> = weights
        .columns()
        .iter()
        .map(|symbol| {
            sector_map
                .get(symbol)
                .map(String::as_str)
                .unwrap_or(UNKNOWN_SECTOR)
        })
        .collect();

    let mut out = weights.clone();
    for row in 0..out.nrows() {
        if out.row_has_nan(row) {
            continue;
        }
        let row_values = out.row_mut(row);
        for _ in 0..MAX_CAP_ITERATIONS {
            let mut sector_totals: BTreeMap<&str, f64> = BTreeMap::new();
            for (col, &sector) in sectors.iter().enumerate() {
                *sector_totals.entry(sector).or_insert(0.0) += row_values[col];
            }
            let over: BTreeMap<&str, f64> = sector_totals
                .into_iter()
                .filter(|(_, total)| *total > max_sector_weight + CAP_TOLERANCE)
                .collect();
            if over.is_empty() {
                break;
            }
            for (col, &sector) in sectors.iter().enumerate() {
                if let Some(&total) = over.get(sector) {
                    row_values[col] *= max_sector_weight / total;
                }
            }
            let sum: f64 = row_values.iter().sum();
            if sum > 0.0 {
                for w in row_values.iter_mut() {
                    *w /= sum;
                }
            }
        }
    }
    out
}

/// Minimum-assets-held floor: if fewer than `min_assets` carry non-trivial
/// weight, keep only the top `min_assets` by weight and renormalize. Weight
/// cannot be manufactured for assets already at zero, so thinly-held rows
/// stay concentrated in whatever the upstream stages produced.
pub fn apply_min_assets_constraint(weights: &Frame, min_assets: usize) -> Frame {
    let mut out = weights.clone();
    for row in 0..out.nrows() {
        if out.row_has_nan(row) {
            continue;
        }
        let row_values = out.row_mut(row);
        let held = row_values
            .iter()
            .filter(|&&w| w > HOLDING_THRESHOLD)
            .count();
        if held >= min_assets {
            continue;
        }

        let mut order: Vec<usize> = (0..row_values.len()).collect();
        order.sort_by(|&a, &b| {
            row_values[b]
                .partial_cmp(&row_values[a])
                .expect("weights are finite in defined rows")
        });
        let keep = &order[..min_assets.min(order.len())];

        let mut kept = vec![0.0; row_values.len()];
        for &col in keep {
            kept[col] = row_values[col];
        }
        let sum: f64 = kept.iter().sum();
        if sum > 0.0 {
            for w in &mut kept {
                *w /= sum;
            }
        }
        row_values.copy_from_slice(&kept);
    }
    out
}

fn sectors_of<'a>(symbols: &'a [String], sector_map: &'a SectorMap) -> Vec<&'a str> {
    let mut sectors: Vec<&str> = symbols
        .iter()
        .map(|s| sector_map.get(s).map(String::as_str).unwrap_or(UNKNOWN_SECTOR))
        .collect();
    sectors.sort_unstable();
    sectors.dedup();
    sectors
}
