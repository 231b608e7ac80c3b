//! Serializable system configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use strata_core::allocators::{AllocatorConfig, InverseVolParams};
use strata_core::error::{ConfigError, DataError, EngineError};
use strata_core::execution::ExecutionPolicy;
use strata_core::meta::{build_meta_allocator, MetaAllocatorConfig};
use strata_core::portfolio::{RiskCapConfig, SectorMap, VolTargetConfig};
use strata_core::strategies::{build_strategy, StrategyConfig};
use strata_core::warmup::WarmupPlan;

/// Unique identifier for a run configuration (content-addressable hash).
pub type RunId = String;

/// Which risk-cap stages execute around volatility targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapMode {
    /// Caps before and after leverage scaling.
    Both,
    /// Caps only before leverage; a 25% cap can become 50% at 2x leverage.
    PreLeverage,
    /// Caps only on the final, levered weights.
    PostLeverage,
}

impl Default for CapMode {
    fn default() -> Self {
        CapMode::Both
    }
}

impl CapMode {
    pub fn applies_pre_leverage(&self) -> bool {
        matches!(self, CapMode::Both | CapMode::PreLeverage)
    }

    pub fn applies_post_leverage(&self) -> bool {
        matches!(self, CapMode::Both | CapMode::PostLeverage)
    }
}

impl FromStr for CapMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "both" => Ok(CapMode::Both),
            "pre_leverage" => Ok(CapMode::PreLeverage),
            "post_leverage" => Ok(CapMode::PostLeverage),
            other => Err(ConfigError::Unknown {
                kind: "cap_mode",
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CapMode::Both => "both",
            CapMode::PreLeverage => "pre_leverage",
            CapMode::PostLeverage => "post_leverage",
        };
        f.write_str(s)
    }
}

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Complete configuration for one walk-forward run.
///
/// Serialized with run artifacts for reproducibility; the blake3 hash of the
/// serialized form is the run's identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Human-readable system name.
    pub name: String,
    /// Symbols to trade.
    pub universe: Vec<String>,
    /// Requested backtest start (inclusive). Results begin on the first
    /// trading day on or after this date.
    pub start_date: NaiveDate,
    /// Requested backtest end (inclusive).
    pub end_date: NaiveDate,
    /// Exchange code for the trading calendar.
    #[serde(default = "default_exchange")]
    pub exchange: String,
    /// Selected strategies; more than one requires a meta-allocator.
    pub strategies: Vec<StrategyConfig>,
    /// Blends multiple strategies' returns; ignored for a single strategy.
    #[serde(default)]
    pub meta_allocator: Option<MetaAllocatorConfig>,
    /// Cross-asset allocator.
    #[serde(default = "default_allocator")]
    pub allocator: AllocatorConfig,
    /// Concentration constraints.
    #[serde(default)]
    pub risk_caps: RiskCapConfig,
    /// Which cap stages run around leverage scaling.
    #[serde(default)]
    pub cap_mode: CapMode,
    /// Volatility targeting parameters.
    #[serde(default)]
    pub vol_targeting: VolTargetConfig,
    /// Execution timing rules.
    #[serde(default)]
    pub execution: ExecutionPolicy,
    /// Symbol -> sector mapping for sector caps.
    #[serde(default)]
    pub sector_map: SectorMap,
}

fn default_exchange() -> String {
    "NYSE".to_string()
}

fn default_allocator() -> AllocatorConfig {
    AllocatorConfig::InverseVol(InverseVolParams::default())
}

impl SystemConfig {
    /// Validate every layer's parameters; nothing is computed on failure.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.universe.is_empty() {
            return Err(EngineError::Data(DataError::EmptyUniverse));
        }
        let mut seen = std::collections::BTreeSet::new();
        for symbol in &self.universe {
            if !seen.insert(symbol) {
                return Err(EngineError::Config(ConfigError::Parameter {
                    name: "universe",
                    reason: format!("duplicate symbol '{symbol}'"),
                }));
            }
        }
        if self.start_date >= self.end_date {
            return Err(EngineError::Config(ConfigError::Parameter {
                name: "start_date",
                reason: format!(
                    "must be before end_date ({} >= {})",
                    self.start_date, self.end_date
                ),
            }));
        }
        if self.strategies.is_empty() {
            return Err(EngineError::Config(ConfigError::Parameter {
                name: "strategies",
                reason: "at least one strategy must be selected".into(),
            }));
        }
        if self.strategies.len() > 1 && self.meta_allocator.is_none() {
            return Err(EngineError::Config(ConfigError::MissingMetaAllocator));
        }
        let mut strategy_names = std::collections::BTreeSet::new();
        for strategy in &self.strategies {
            if !strategy_names.insert(strategy.name()) {
                return Err(EngineError::Config(ConfigError::Parameter {
                    name: "strategies",
                    reason: format!("strategy '{}' selected twice", strategy.name()),
                }));
            }
        }

        for strategy in &self.strategies {
            build_strategy(strategy)?;
        }
        if let Some(meta) = &self.meta_allocator {
            build_meta_allocator(meta)?;
        }
        match &self.allocator {
            AllocatorConfig::InverseVol(params) => params.validate()?,
            AllocatorConfig::EqualWeight => {}
        }
        self.risk_caps.validate(&self.universe, &self.sector_map)?;
        self.vol_targeting.validate()?;
        self.execution.validate()?;
        Ok(())
    }

    /// Warmup requirements implied by this configuration.
    pub fn warmup_plan(&self) -> Result<WarmupPlan, EngineError> {
        let strategy_warmups: Vec<usize> = self
            .strategies
            .iter()
            .map(|config| build_strategy(config).map(|s| s.warmup_period()))
            .collect::<Result<_, _>>()?;
        let meta_warmup = match &self.meta_allocator {
            Some(meta) => build_meta_allocator(meta)?.warmup_period(),
            None => 0,
        };
        Ok(WarmupPlan::compute(
            &strategy_warmups,
            meta_warmup,
            self.allocator.warmup_period(),
            self.vol_targeting.lookback,
        ))
    }

    /// Deterministic hash ID: two identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("SystemConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigLoadError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Minimal single-strategy config used as a starting point in tests.
    pub fn passthrough(
        name: &str,
        universe: Vec<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.to_string(),
            universe,
            start_date,
            end_date,
            exchange: default_exchange(),
            strategies: vec![StrategyConfig::Passthrough],
            meta_allocator: None,
            allocator: default_allocator(),
            risk_caps: RiskCapConfig {
                max_weight_per_asset: 1.0,
                max_sector_weight: None,
                min_assets_held: 1,
            },
            cap_mode: CapMode::Both,
            vol_targeting: VolTargetConfig::default(),
            execution: ExecutionPolicy::default(),
            sector_map: BTreeMap::new(),
        }
    }
}
