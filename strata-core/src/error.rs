//! Error taxonomy for the engine.
//!
//! Three closed kinds, surfaced at different moments:
//! - [`ConfigError`] — invalid parameter values, rejected at construction time.
//! - [`DataError`] — malformed or insufficient input data, rejected when a
//!   stage first touches the offending table.
//! - [`FeasibilityError`] — parameter combinations that cannot produce a
//!   fully-invested portfolio, rejected before any computation runs.
//!
//! Numerical edge cases (zero volatility, flat prices) are not errors; each
//! stage defines a fallback value for them instead of propagating NaN into
//! valid rows.

use chrono::NaiveDate;
use thiserror::Error;

/// Invalid or out-of-range parameter values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parameter '{name}': {reason}")]
    Parameter { name: &'static str, reason: String },

    #[error("unknown {kind}: '{name}'")]
    Unknown { kind: &'static str, name: String },

    #[error("{context}: weights sum to {sum}, expected 1.0 within 1e-6")]
    WeightSum { context: &'static str, sum: f64 },

    #[error("{context}: weight for '{name}' is {value}, expected a non-negative finite value")]
    NegativeWeight {
        context: &'static str,
        name: String,
        value: f64,
    },

    #[error("multiple strategies selected but no meta-allocator configured")]
    MissingMetaAllocator,
}

/// Malformed, missing, or insufficient input data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("universe is empty")]
    EmptyUniverse,

    #[error("symbol '{symbol}' missing from loaded data")]
    MissingSymbol { symbol: String },

    #[error(
        "insufficient history for '{symbol}': need {required} trading days \
         before {start}, have {available}"
    )]
    InsufficientHistory {
        symbol: String,
        required: usize,
        available: usize,
        start: NaiveDate,
    },

    #[error("{label}: date index is not strictly increasing at position {position}")]
    UnsortedDates { label: String, position: usize },

    #[error("{label}: duplicate date {date} in index")]
    DuplicateDate { label: String, date: NaiveDate },

    #[error("{label}: index does not match reference ({missing} missing, {extra} extra dates)")]
    IndexMismatch {
        label: String,
        missing: usize,
        extra: usize,
    },

    #[error("{label}: length {actual} does not match {expected}")]
    LengthMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },

    #[error("intent keys {intent:?} do not match return keys {returns:?}")]
    KeyMismatch {
        intent: Vec<String>,
        returns: Vec<String>,
    },

    #[error("intent for '{symbol}' has {count} invalid values, expected {expected}")]
    InvalidIntent {
        symbol: String,
        count: usize,
        expected: &'static str,
    },

    #[error("bar {date} for '{symbol}' violates OHLC sanity (high/low/positive-price checks)")]
    InsaneBar { symbol: String, date: NaiveDate },

    #[error("no trading session found within {scanned} calendar days of {date}")]
    NoSession { date: NaiveDate, scanned: i64 },
}

/// Parameter combinations that cannot produce a fully-invested portfolio.
#[derive(Debug, Error)]
pub enum FeasibilityError {
    #[error(
        "infeasible asset cap: {n_assets} assets x max_weight_per_asset {max_weight} \
         = {product:.4} < 1.0"
    )]
    AssetCap {
        n_assets: usize,
        max_weight: f64,
        product: f64,
    },

    #[error(
        "infeasible sector cap: {n_sectors} sector(s) x max_sector_weight {max_sector_weight} \
         = {product:.4} < 1.0"
    )]
    SectorCap {
        n_sectors: usize,
        max_sector_weight: f64,
        product: f64,
    },

    #[error("min_assets_held ({min_assets}) exceeds universe size ({n_assets})")]
    MinAssetsExceedsUniverse { min_assets: usize, n_assets: usize },
}

/// Top-level engine error aggregating the three kinds.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("feasibility error: {0}")]
    Feasibility(#[from] FeasibilityError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feasibility_message_names_the_product() {
        let err = FeasibilityError::AssetCap {
            n_assets: 2,
            max_weight: 0.3,
            product: 0.6,
        };
        let msg = err.to_string();
        assert!(msg.contains("2 assets"));
        assert!(msg.contains("0.6"));
    }

    #[test]
    fn engine_error_wraps_kinds() {
        let err: EngineError = ConfigError::Parameter {
            name: "lookback",
            reason: "must be >= 2, got 1".into(),
        }
        .into();
        assert!(err.to_string().starts_with("configuration error"));
    }
}
