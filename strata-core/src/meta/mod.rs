//! Meta-allocator layer — blends multiple strategies' realized returns.
//!
//! Meta-allocators operate at the strategy level, per asset: for one asset,
//! each selected strategy contributes a realized return series, and the
//! meta-allocator combines them into a single blended series with
//! time-varying weights. No timing shift happens here — weights at t use
//! data <= t, and the execution module has already lagged the inputs.

pub mod fixed_weight;
pub mod risk_parity;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{DateSeries, Frame};
use crate::error::{ConfigError, DataError, EngineError};

pub use fixed_weight::FixedWeightAllocator;
pub use risk_parity::{RiskParityAllocator, RiskParityParams};

/// Output of one meta-allocation: the blended series plus diagnostics.
#[derive(Debug, Clone)]
pub struct MetaAllocation {
    /// Blended per-date returns; NaN where all strategy weights are undefined.
    pub combined_returns: DateSeries,
    /// Time-varying strategy weights (date x strategy), warmup rows NaN.
    pub weights: Frame,
    /// Strategy returns aligned to the common start (for fair comparison).
    pub aligned_returns: BTreeMap<String, DateSeries>,
}

/// Combines multiple strategies' realized returns into one series.
pub trait MetaAllocator: Send + Sync {
    /// Registry identifier (e.g. "risk_parity").
    fn name(&self) -> &str;

    /// Trading days the allocator's own rolling computation needs after the
    /// strategies are aligned. Zero for static weights.
    fn warmup_period(&self) -> usize;

    /// Time-varying weights over the aligned returns, one column per
    /// strategy in the map's (sorted) iteration order. Rows must sum to 1.0
    /// wherever defined.
    fn calculate_weights(
        &self,
        aligned_returns: &BTreeMap<String, DateSeries>,
    ) -> Result<Frame, EngineError>;

    /// Full allocation procedure:
    /// 1. Align every strategy to the latest first-valid index, so all
    ///    strategies start contributing on the same date.
    /// 2. Compute weights from the aligned returns.
    /// 3. Mask weights for `warmup_period()` additional rows past alignment.
    /// 4. Combine: weighted sum per date, skipping undefined terms; rows
    ///    where every weight is undefined stay undefined.
    fn allocate(
        &self,
        strategy_returns: &BTreeMap<String, DateSeries>,
    ) -> Result<MetaAllocation, EngineError> {
        if strategy_returns.is_empty() {
            return Err(EngineError::Data(DataError::EmptyUniverse));
        }
        let reference: Vec<chrono::NaiveDate> = strategy_returns
            .values()
            .next()
            .expect("non-empty map")
            .dates()
            .to_vec();
        for (name, series) in strategy_returns {
            if series.dates() != reference.as_slice() {
                return Err(EngineError::Data(DataError::IndexMismatch {
                    label: format!("strategy '{name}' returns"),
                    missing: 0,
                    extra: 0,
                }));
            }
        }

        // Step 1: align to the max first-valid index.
        let align_idx = strategy_returns
            .values()
            .filter_map(|s| s.first_valid_index())
            .max()
            .unwrap_or(0);
        let aligned: BTreeMap<String, DateSeries> = strategy_returns
            .iter()
            .map(|(name, series)| (name.clone(), series.mask_prefix(align_idx)))
            .collect();

        // Step 2: weights from aligned returns.
        let weights = self.calculate_weights(&aligned)?;

        // Step 3: the allocator's own warmup starts after alignment.
        let weights = weights.mask_rows(align_idx + self.warmup_period());

        // Step 4: combine.
        let names: Vec<&String> = aligned.keys().collect();
        let n = reference.len();
        let mut combined = vec![f64::NAN; n];
        for row in 0..n {
            let mut all_nan = true;
            let mut sum = 0.0;
            for (col, name) in names.iter().enumerate() {
                let w = weights.get(row, col);
                if w.is_nan() {
                    continue;
                }
                all_nan = false;
                let r = aligned[*name].get(row);
                if !r.is_nan() {
                    sum += w * r;
                }
            }
            if !all_nan {
                combined[row] = sum;
            }
        }

        Ok(MetaAllocation {
            combined_returns: DateSeries::new(reference, combined)
                .map_err(EngineError::Data)?,
            weights,
            aligned_returns: aligned,
        })
    }
}

/// Serializable meta-allocator selection, tagged by registry identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetaAllocatorConfig {
    /// Static per-strategy weights.
    FixedWeight { weights: BTreeMap<String, f64> },
    /// Inverse-volatility weighting over strategy returns.
    RiskParity(RiskParityParams),
}

impl MetaAllocatorConfig {
    pub fn name(&self) -> &'static str {
        match self {
            MetaAllocatorConfig::FixedWeight { .. } => "fixed_weight",
            MetaAllocatorConfig::RiskParity(_) => "risk_parity",
        }
    }
}

/// Construct a meta-allocator from its config, validating parameters.
pub fn build_meta_allocator(
    config: &MetaAllocatorConfig,
) -> Result<Box<dyn MetaAllocator>, ConfigError> {
    match config {
        MetaAllocatorConfig::FixedWeight { weights } => {
            Ok(Box::new(FixedWeightAllocator::new(weights.clone())?))
        }
        MetaAllocatorConfig::RiskParity(params) => {
            Ok(Box::new(RiskParityAllocator::new(params.clone())?))
        }
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

    #[test]
    fn fixed_weight_round_trip() {
        // 0.6 x 0.01 + 0.4 x 0.02 = 0.014 on every valid date.
        let mut returns = BTreeMap::new();
        returns.insert("trend".to_string(), series(vec![0.01; 6]));
        returns.insert("meanrev".to_string(), series(vec![0.02; 6]));

        let mut weights = BTreeMap::new();
        weights.insert("trend".to_string(), 0.6);
        weights.insert("meanrev".to_string(), 0.4);
        let allocator = FixedWeightAllocator::new(weights).unwrap();

        let result = allocator.allocate(&returns).unwrap();
        for row in 0..6 {
            assert!(
                (result.combined_returns.get(row) - 0.014).abs() < 1e-12,
                "row {row}"
            );
        }
    }

    #[test]
    fn alignment_masks_early_starter() {
        // trend warms up later; meanrev's early rows must be masked too.
        let mut returns = BTreeMap::new();
        returns.insert(
            "trend".to_string(),
            series(vec![f64::NAN, f64::NAN, f64::NAN, 0.01, 0.01, 0.01]),
        );
        returns.insert(
            "meanrev".to_string(),
            series(vec![f64::NAN, 0.02, 0.02, 0.02, 0.02, 0.02]),
        );

        let mut weights = BTreeMap::new();
        weights.insert("trend".to_string(), 0.5);
        weights.insert("meanrev".to_string(), 0.5);
        let allocator = FixedWeightAllocator::new(weights).unwrap();

        let result = allocator.allocate(&returns).unwrap();
        for row in 0..3 {
            assert!(result.combined_returns.get(row).is_nan(), "row {row}");
            assert!(result.aligned_returns["meanrev"].get(row).is_nan());
        }
        assert!((result.combined_returns.get(3) - 0.015).abs() < 1e-12);
    }

    #[test]
    fn mismatched_indices_rejected() {
        let mut returns = BTreeMap::new();
        returns.insert("trend".to_string(), series(vec![0.01; 4]));
        let other = DateSeries::new(dates(5), vec![0.02; 5]).unwrap();
        returns.insert("meanrev".to_string(), other);

        let mut weights = BTreeMap::new();
        weights.insert("trend".to_string(), 0.5);
        weights.insert("meanrev".to_string(), 0.5);
        let allocator = FixedWeightAllocator::new(weights).unwrap();
        assert!(allocator.allocate(&returns).is_err());
    }

    #[test]
    fn registry_builds_both_variants() {
        let mut weights = BTreeMap::new();
        weights.insert("trend".to_string(), 1.0);
        let fixed = build_meta_allocator(&MetaAllocatorConfig::FixedWeight { weights }).unwrap();
        assert_eq!(fixed.name(), "fixed_weight");
        assert_eq!(fixed.warmup_period(), 0);

        let rp = build_meta_allocator(&MetaAllocatorConfig::RiskParity(
            RiskParityParams::default(),
        ))
        .unwrap();
        assert_eq!(rp.name(), "risk_parity");
        assert_eq!(rp.warmup_period(), 60);
    }
}
