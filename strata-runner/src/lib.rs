//! Strata Runner — walk-forward orchestration on top of `strata-core`.
//!
//! This crate wires the engine stages into a complete run:
//! - System configuration (TOML-loadable, blake3 run-id for reproducibility)
//! - CSV data loading with per-symbol validation (the market-data stand-in)
//! - Deterministic synthetic data generation for tests and demos
//! - The walk-forward runner state machine
//! - Performance metrics and the result aggregate

pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod result;
pub mod sample_data;
pub mod walkforward;

pub use config::{CapMode, ConfigLoadError, RunId, SystemConfig};
pub use data_loader::{load_symbol_csv, load_universe_csv, LoadError};
pub use metrics::{DrawdownInfo, MetricsBundle, YearlyRow};
pub use result::WalkforwardResult;
pub use sample_data::{synthetic_price_series, synthetic_universe, SyntheticAsset};
pub use walkforward::{run_walkforward, run_walkforward_from_csv, RunError};
