//! Bar and per-asset price history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// OHLCV bar for a single symbol on a single trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// OHLC sanity check: high >= max(open, close), low <= min(open, close),
    /// all prices strictly positive, no NaN fields.
    pub fn is_sane(&self) -> bool {
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite();
        finite
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
            && self.open > 0.0
            && self.high > 0.0
            && self.low > 0.0
            && self.close > 0.0
    }
}

/// Immutable per-asset price history.
///
/// Validated once at construction: dates strictly increasing and unique,
/// every bar sane. `raw_returns[t] = close[t] / close[t-1] - 1`, with
/// `raw_returns[0] = NaN` (no prior close).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
    raw_returns: Vec<f64>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, DataError> {
        let symbol = symbol.into();
        for (i, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(DataError::InsaneBar {
                    symbol,
                    date: bar.date,
                });
            }
            if i > 0 {
                if bar.date == bars[i - 1].date {
                    return Err(DataError::DuplicateDate {
                        label: symbol,
                        date: bar.date,
                    });
                }
                if bar.date < bars[i - 1].date {
                    return Err(DataError::UnsortedDates {
                        label: symbol,
                        position: i,
                    });
                }
            }
        }

        let mut raw_returns = vec![f64::NAN; bars.len()];
        for i in 1..bars.len() {
            raw_returns[i] = bars[i].close / bars[i - 1].close - 1.0;
        }

        Ok(Self {
            symbol,
            bars,
            raw_returns,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Daily close-to-close returns; index 0 is NaN.
    pub fn raw_returns(&self) -> &[f64] {
        &self.raw_returns
    }
}
