//! Strategy signal layer.
//!
//! A strategy turns one asset's price history into an intent series:
//! values in {-1, 0, 1} at decision time t, computed from data <= t only.
//! Strategies never apply a timing shift and never multiply by returns —
//! the execution module owns both (see `execution::timing`).

pub mod combine;
pub mod meanrev;
pub mod passthrough;
pub mod trend;

use serde::{Deserialize, Serialize};

use crate::domain::{DateSeries, PriceSeries};
use crate::error::ConfigError;

pub use combine::CombineMethod;
pub use meanrev::{MeanRevParams, MeanRevStrategy};
pub use passthrough::PassthroughStrategy;
pub use trend::{TrendParams, TrendStrategy};

/// A rules-based signal generator for a single asset.
pub trait Strategy: Send + Sync {
    /// Registry identifier (e.g. "trend").
    fn name(&self) -> &str;

    /// Index of the first valid intent value: the maximum constituent
    /// indicator lookback. The first `signal_warmup` intent values are NaN.
    fn signal_warmup(&self) -> usize;

    /// Trading days before the first valid realized strategy return,
    /// execution lag included. This is the number the warmup calculator
    /// consumes.
    fn warmup_period(&self) -> usize;

    /// Intent at decision time t over the asset's full history.
    fn generate_intent(&self, prices: &PriceSeries) -> DateSeries;
}

/// Serializable strategy selection, tagged by registry identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Always long, zero warmup. Baseline / pipeline-debugging strategy.
    Passthrough,
    /// Multi-indicator trend following.
    Trend(TrendParams),
    /// Multi-indicator mean reversion.
    Meanrev(MeanRevParams),
}

impl StrategyConfig {
    /// Default-parameter config for a bare registry name.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "passthrough" => Ok(StrategyConfig::Passthrough),
            "trend" => Ok(StrategyConfig::Trend(TrendParams::default())),
            "meanrev" => Ok(StrategyConfig::Meanrev(MeanRevParams::default())),
            other => Err(ConfigError::Unknown {
                kind: "strategy",
                name: other.to_string(),
            }),
        }
    }

    /// Registry identifier of this config.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::Passthrough => "passthrough",
            StrategyConfig::Trend(_) => "trend",
            StrategyConfig::Meanrev(_) => "meanrev",
        }
    }
}

/// Construct a strategy from its config, validating parameters.
pub fn build_strategy(config: &StrategyConfig) -> Result<Box<dyn Strategy>, ConfigError> {
    match config {
        StrategyConfig::Passthrough => Ok(Box::new(PassthroughStrategy)),
        StrategyConfig::Trend(params) => Ok(Box::new(TrendStrategy::new(params.clone())?)),
        StrategyConfig::Meanrev(params) => Ok(Box::new(MeanRevStrategy::new(params.clone())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_known_names() {
        for name in ["passthrough", "trend", "meanrev"] {
            let config = StrategyConfig::from_name(name).unwrap();
            assert_eq!(config.name(), name);
            let strategy = build_strategy(&config).unwrap();
            assert_eq!(strategy.name(), name);
        }
    }

    #[test]
    fn unknown_name_rejected() {
        let err = StrategyConfig::from_name("momentum_ml").unwrap_err();
        assert!(matches!(err, ConfigError::Unknown { kind: "strategy", .. }));
    }

    #[test]
    fn config_serde_roundtrip() {
        let config = StrategyConfig::Trend(TrendParams::default());
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"type\":\"trend\""));
        let back: StrategyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
