//! Portfolio construction helpers — wide tables and portfolio returns.

use std::collections::BTreeMap;

use crate::domain::{DateSeries, Frame};
use crate::error::DataError;

/// Align per-asset return series into a wide date x asset frame.
///
/// Column order follows `symbols` (the configured universe order). Every
/// series must share the same date index; the engine validates that before
/// calling in here, but the check is repeated cheaply because misalignment
/// at this boundary corrupts every downstream stage.
pub fn align_asset_returns(
    returns_by_asset: &BTreeMap<String, DateSeries>,
    symbols: &[String],
) -> Result<Frame, DataError> {
    if symbols.is_empty() {
        return Err(DataError::EmptyUniverse);
    }
    let first = symbols
        .first()
        .and_then(|s| returns_by_asset.get(s))
        .ok_or_else(|| DataError::MissingSymbol {
            symbol: symbols[0].clone(),
        })?;
    let dates = first.dates().to_vec();

    let mut columns = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let series = returns_by_asset
            .get(symbol)
            .ok_or_else(|| DataError::MissingSymbol {
                symbol: symbol.clone(),
            })?;
        if series.dates() != dates.as_slice() {
            return Err(DataError::IndexMismatch {
                label: format!("returns for '{symbol}'"),
                missing: 0,
                extra: 0,
            });
        }
        columns.push((symbol.clone(), series.values().to_vec()));
    }
    Frame::from_columns(dates, columns)
}

/// Portfolio returns: per-date weighted sum of asset returns.
///
/// Terms where either the weight or the return is undefined are skipped, so
/// a warmup row degenerates to 0.0; callers must mask rows with undefined
/// weights before treating the output as valid (see the engine's warmup
/// masking stage).
pub fn build_portfolio_returns(
    asset_returns: &Frame,
    weights: &Frame,
) -> Result<DateSeries, DataError> {
    if asset_returns.dates() != weights.dates() {
        return Err(DataError::IndexMismatch {
            label: "portfolio weights".into(),
            missing: 0,
            extra: 0,
        });
    }
    if asset_returns.columns() != weights.columns() {
        return Err(DataError::LengthMismatch {
            label: "portfolio weight columns".into(),
            expected: asset_returns.ncols(),
            actual: weights.ncols(),
        });
    }

    let n = asset_returns.nrows();
    let mut values = Vec::with_capacity(n);
    for row in 0..n {
        let mut sum = 0.0;
        for col in 0..asset_returns.ncols() {
            let w = weights.get(row, col);
            let r = asset_returns.get(row, col);
            if !w.is_nan() && !r.is_nan() {
                sum += w * r;
            }
        }
        values.push(sum);
    }
    DateSeries::new(asset_returns.dates().to_vec(), values)
}

/// Replace portfolio returns with NaN wherever `frame`'s row is not fully
/// defined (applied against the weight matrix, and again against the asset
/// returns). Without this, warmup rows read as 0.0 returns and silently
/// deflate realized volatility, driving vol-targeted leverage to its cap.
pub fn mask_returns_where_undefined(
    portfolio_returns: &DateSeries,
    frame: &Frame,
) -> DateSeries {
    let values: Vec<f64> = portfolio_returns
        .values()
        .iter()
        .enumerate()
        .map(|(row, &v)| if frame.row_has_nan(row) { f64::NAN } else { v })
        .collect();
    DateSeries::new(portfolio_returns.dates().to_vec(), values)
        .expect("mask preserves series length")
}
