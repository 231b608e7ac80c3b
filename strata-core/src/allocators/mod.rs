//! Asset allocators — cross-asset target weights from realized returns.

pub mod inverse_vol;

use serde::{Deserialize, Serialize};

use crate::domain::Frame;
use crate::error::EngineError;

pub use inverse_vol::{equal_weights, inverse_volatility_weights, InverseVolParams};

/// Serializable asset-allocator selection, tagged by registry identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllocatorConfig {
    /// Inverse-volatility weighting with iterative capping.
    InverseVol(InverseVolParams),
    /// 1/N baseline.
    EqualWeight,
}

impl AllocatorConfig {
    pub fn name(&self) -> &'static str {
        match self {
            AllocatorConfig::InverseVol(_) => "inverse_vol",
            AllocatorConfig::EqualWeight => "equal_weight",
        }
    }

    /// Trading days of realized returns the allocator needs before its first
    /// valid weight row.
    pub fn warmup_period(&self) -> usize {
        match self {
            AllocatorConfig::InverseVol(params) => params.lookback,
            AllocatorConfig::EqualWeight => 0,
        }
    }

    /// Compute target weights from a wide realized-return table.
    pub fn compute_weights(&self, returns: &Frame) -> Result<Frame, EngineError> {
        match self {
            AllocatorConfig::InverseVol(params) => inverse_volatility_weights(returns, params),
            AllocatorConfig::EqualWeight => Ok(equal_weights(returns)),
        }
    }
}
