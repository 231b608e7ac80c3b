//! CSV market-data loading.
//!
//! Stand-in for the market-data collaborator: one CSV per symbol with a
//! `date,open,high,low,close,volume` header, loaded in parallel across
//! symbols. OHLC sanity and date monotonicity are enforced by
//! `PriceSeries` at construction, so malformed files fail with symbol
//! context instead of flowing into the engine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Deserialize;
use thiserror::Error;

use strata_core::domain::{Bar, PriceSeries};
use strata_core::error::DataError;

/// Errors from the data loader.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data file for symbol '{symbol}' at {path:?}")]
    MissingFile { symbol: String, path: PathBuf },
    #[error("failed to parse {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("data error: {0}")]
    Data(#[from] DataError),
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

/// Load `<symbol>.csv` files from `dir` for every symbol in the universe.
///
/// Rows outside `[min_date, max_date]` are dropped when bounds are given, so
/// callers can load exactly the warmup-extended window.
pub fn load_universe_csv(
    dir: &Path,
    universe: &[String],
    min_date: Option<NaiveDate>,
    max_date: Option<NaiveDate>,
) -> Result<BTreeMap<String, PriceSeries>, LoadError> {
    let loaded: Vec<(String, PriceSeries)> = universe
        .par_iter()
        .map(|symbol| {
            let series = load_symbol_csv(dir, symbol, min_date, max_date)?;
            Ok((symbol.clone(), series))
        })
        .collect::<Result<_, LoadError>>()?;
    Ok(loaded.into_iter().collect())
}

/// Load one symbol's CSV file.
pub fn load_symbol_csv(
    dir: &Path,
    symbol: &str,
    min_date: Option<NaiveDate>,
    max_date: Option<NaiveDate>,
) -> Result<PriceSeries, LoadError> {
    let path = dir.join(format!("{symbol}.csv"));
    if !path.exists() {
        return Err(LoadError::MissingFile {
            symbol: symbol.to_string(),
            path,
        });
    }

    let mut reader = csv::Reader::from_path(&path).map_err(|source| LoadError::Csv {
        path: path.clone(),
        source,
    })?;

    let mut bars = Vec::new();
    for record in reader.deserialize::<CsvRow>() {
        let row = record.map_err(|source| LoadError::Csv {
            path: path.clone(),
            source,
        })?;
        if min_date.is_some_and(|min| row.date < min) {
            continue;
        }
        if max_date.is_some_and(|max| row.date > max) {
            continue;
        }
        bars.push(Bar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    if bars.is_empty() {
        eprintln!("warning: no rows for '{symbol}' within the requested window");
    }
    Ok(PriceSeries::new(symbol, bars)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, symbol: &str, rows: &[(&str, f64)]) {
        let mut file = std::fs::File::create(dir.join(format!("{symbol}.csv"))).unwrap();
        writeln!(file, "date,open,high,low,close,volume").unwrap();
        for (date, close) in rows {
            writeln!(
                file,
                "{date},{open},{high},{low},{close},1000",
                open = close,
                high = close * 1.01,
                low = close * 0.99,
            )
            .unwrap();
        }
    }

    #[test]
    fn loads_and_windows_rows() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "SPY",
            &[
                ("2024-01-02", 100.0),
                ("2024-01-03", 101.0),
                ("2024-01-04", 102.0),
            ],
        );

        let min = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let series = load_symbol_csv(dir.path(), "SPY", Some(min), None).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].close, 101.0);
    }

    #[test]
    fn missing_file_names_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_symbol_csv(dir.path(), "GONE", None, None).unwrap_err();
        assert!(matches!(err, LoadError::MissingFile { .. }));
        assert!(err.to_string().contains("GONE"));
    }

    #[test]
    fn unsorted_dates_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "SPY",
            &[("2024-01-04", 102.0), ("2024-01-02", 100.0)],
        );
        let err = load_symbol_csv(dir.path(), "SPY", None, None).unwrap_err();
        assert!(matches!(err, LoadError::Data(DataError::UnsortedDates { .. })));
    }

    #[test]
    fn universe_load_is_keyed_by_symbol() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "SPY", &[("2024-01-02", 100.0)]);
        write_csv(dir.path(), "QQQ", &[("2024-01-02", 350.0)]);

        let data = load_universe_csv(
            dir.path(),
            &["SPY".to_string(), "QQQ".to_string()],
            None,
            None,
        )
        .unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data["QQQ"].bars()[0].close, 350.0);
    }
}
