//! Fixed-weight meta-allocator — static per-strategy weights.

use std::collections::BTreeMap;

use crate::domain::{DateSeries, Frame};
use crate::error::{ConfigError, EngineError};

use super::MetaAllocator;

/// Combines strategy returns with constant weights.
///
/// Weights must be non-negative and sum to 1.0 within 1e-6, and must cover
/// exactly the set of strategies being combined.
#[derive(Debug, Clone)]
pub struct FixedWeightAllocator {
    weights: BTreeMap<String, f64>,
}

impl FixedWeightAllocator {
    pub fn new(weights: BTreeMap<String, f64>) -> Result<Self, ConfigError> {
        if weights.is_empty() {
            return Err(ConfigError::Parameter {
                name: "weights",
                reason: "must not be empty".into(),
            });
        }
        for (name, &w) in &weights {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::NegativeWeight {
                    context: "fixed-weight meta-allocator",
                    name: name.clone(),
                    value: w,
                });
            }
        }
        let sum: f64 = weights.values().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightSum {
                context: "fixed-weight meta-allocator",
                sum,
            });
        }
        Ok(Self { weights })
    }
}

impl MetaAllocator for FixedWeightAllocator {
    fn name(&self) -> &str {
        "fixed_weight"
    }

    fn warmup_period(&self) -> usize {
        0
    }

    fn calculate_weights(
        &self,
        aligned_returns: &BTreeMap<String, DateSeries>,
    ) -> Result<Frame, EngineError> {
        // Exact coverage both ways: every strategy weighted, no stray weights.
        for name in aligned_returns.keys() {
            if !self.weights.contains_key(name) {
                return Err(EngineError::Config(ConfigError::Parameter {
                    name: "weights",
                    reason: format!("no weight specified for strategy '{name}'"),
                }));
            }
        }
        for name in self.weights.keys() {
            if !aligned_returns.contains_key(name) {
                return Err(EngineError::Config(ConfigError::Parameter {
                    name: "weights",
                    reason: format!("weight specified for unknown strategy '{name}'"),
                }));
            }
        }

        let dates = aligned_returns
            .values()
            .next()
            .expect("allocate() rejects empty input")
            .dates()
            .to_vec();
        let nrows = dates.len();
        let columns = aligned_returns
            .keys()
            .map(|name| (name.clone(), vec![self.weights[name]; nrows]))
            .collect();
        Frame::from_columns(dates, columns).map_err(EngineError::Data)
    }
}
