//! Date-indexed numeric series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// A numeric series indexed by trading date. NaN encodes "not yet valid"
/// (warmup); every consumer treats NaN rows as undefined, never as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl DateSeries {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, DataError> {
        if dates.len() != values.len() {
            return Err(DataError::LengthMismatch {
                label: "series values".into(),
                expected: dates.len(),
                actual: values.len(),
            });
        }
        Ok(Self { dates, values })
    }

    /// All-NaN series over the given index.
    pub fn undefined(dates: Vec<NaiveDate>) -> Self {
        let n = dates.len();
        Self {
            dates,
            values: vec![f64::NAN; n],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn get(&self, row: usize) -> f64 {
        self.values[row]
    }

    /// Index of the first non-NaN value, if any.
    pub fn first_valid_index(&self) -> Option<usize> {
        self.values.iter().position(|v| !v.is_nan())
    }

    /// New series with the first `n` values replaced by NaN.
    pub fn mask_prefix(&self, n: usize) -> Self {
        let mut out = self.clone();
        let upto = n.min(out.values.len());
        for v in &mut out.values[..upto] {
            *v = f64::NAN;
        }
        out
    }

    /// New series restricted to rows `[start, end)`.
    pub fn slice_rows(&self, start: usize, end: usize) -> Self {
        Self {
            dates: self.dates[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        }
    }

    /// Elementwise map into a new series over the same index.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            dates: self.dates.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }
}
