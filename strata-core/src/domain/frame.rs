//! Date x asset numeric table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

use super::series::DateSeries;

/// A date x column matrix of f64 values, stored row-major.
///
/// Used for weight matrices and wide return tables. NaN encodes "not yet
/// valid" (warmup); a fully warmed-up weight row sums to 1.0 for unlevered
/// stages, or to the active leverage for vol-targeted stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    values: Vec<f64>,
}

impl Frame {
    /// Build from per-column series; all columns must have `dates.len()` values.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, DataError> {
        let nrows = dates.len();
        let ncols = columns.len();
        for (name, vals) in &columns {
            if vals.len() != nrows {
                return Err(DataError::LengthMismatch {
                    label: format!("column '{name}'"),
                    expected: nrows,
                    actual: vals.len(),
                });
            }
        }
        let mut values = vec![f64::NAN; nrows * ncols];
        for (c, (_, vals)) in columns.iter().enumerate() {
            for (r, &v) in vals.iter().enumerate() {
                values[r * ncols + c] = v;
            }
        }
        Ok(Self {
            dates,
            columns: columns.into_iter().map(|(name, _)| name).collect(),
            values,
        })
    }

    /// A frame filled with a constant value.
    pub fn filled(dates: Vec<NaiveDate>, columns: Vec<String>, value: f64) -> Self {
        let n = dates.len() * columns.len();
        Self {
            dates,
            columns,
            values: vec![value; n],
        }
    }

    pub fn nrows(&self) -> usize {
        self.dates.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.columns.len() + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        let ncols = self.columns.len();
        self.values[row * ncols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let ncols = self.columns.len();
        &self.values[row * ncols..(row + 1) * ncols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let ncols = self.columns.len();
        &mut self.values[row * ncols..(row + 1) * ncols]
    }

    /// Copy one column out as a vector.
    pub fn column_values(&self, col: usize) -> Vec<f64> {
        (0..self.nrows()).map(|r| self.get(r, col)).collect()
    }

    /// Extract one column as a date-indexed series.
    pub fn column_series(&self, col: usize) -> DateSeries {
        DateSeries::new(self.dates.clone(), self.column_values(col))
            .expect("column length matches date index by construction")
    }

    /// True if any value in the row is NaN.
    pub fn row_has_nan(&self, row: usize) -> bool {
        self.row(row).iter().any(|v| v.is_nan())
    }

    /// New frame with the first `n` rows replaced by NaN.
    pub fn mask_rows(&self, n: usize) -> Self {
        let mut out = self.clone();
        let ncols = out.columns.len();
        let upto = n.min(out.dates.len());
        for v in &mut out.values[..upto * ncols] {
            *v = f64::NAN;
        }
        out
    }

    /// New frame restricted to rows `[start, end)`.
    pub fn slice_rows(&self, start: usize, end: usize) -> Self {
        let ncols = self.columns.len();
        Self {
            dates: self.dates[start..end].to_vec(),
            columns: self.columns.clone(),
            values: self.values[start * ncols..end * ncols].to_vec(),
        }
    }

    /// New frame keeping only the rows whose indices are in `keep` (ascending).
    pub fn select_rows(&self, keep: &[usize]) -> Self {
        let ncols = self.columns.len();
        let mut dates = Vec::with_capacity(keep.len());
        let mut values = Vec::with_capacity(keep.len() * ncols);
        for &r in keep {
            dates.push(self.dates[r]);
            values.extend_from_slice(self.row(r));
        }
        Self {
            dates,
            columns: self.columns.clone(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| base + chrono::Duration::days(i as i64))
            .collect()
    }

    fn two_col_frame() -> Frame {
        Frame::from_columns(
            dates(3),
            vec![
                ("A".into(), vec![1.0, 2.0, 3.0]),
                ("B".into(), vec![4.0, 5.0, 6.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn row_major_layout() {
        let f = two_col_frame();
        assert_eq!(f.row(0), &[1.0, 4.0]);
        assert_eq!(f.row(2), &[3.0, 6.0]);
        assert_eq!(f.get(1, 1), 5.0);
    }

    #[test]
    fn column_roundtrip() {
        let f = two_col_frame();
        assert_eq!(f.column_index("B"), Some(1));
        assert_eq!(f.column_values(1), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn mask_and_select() {
        let f = two_col_frame();
        let masked = f.mask_rows(1);
        assert!(masked.row_has_nan(0));
        assert!(!masked.row_has_nan(1));

        let selected = f.select_rows(&[0, 2]);
        assert_eq!(selected.nrows(), 2);
        assert_eq!(selected.row(1), &[3.0, 6.0]);
        assert_eq!(selected.dates()[1], f.dates()[2]);
    }

    #[test]
    fn ragged_columns_rejected() {
        let err = Frame::from_columns(
            dates(3),
            vec![("A".into(), vec![1.0, 2.0, 3.0]), ("B".into(), vec![4.0])],
        )
        .unwrap_err();
        assert!(matches!(err, DataError::LengthMismatch { .. }));
    }
}
