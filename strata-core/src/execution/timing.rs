//! Single enforcement point for execution timing.
//!
//! Design contract:
//! - Strategies emit intent at t using data <= t (no shift).
//! - Meta-allocators combine strategy outputs using data <= t (no shift).
//! - The asset allocator, risk caps, and vol targeting transform weights at t
//!   using data <= t (no shift).
//! - This module alone converts "decided at t" objects into "effective at
//!   t + delay" objects.
//!
//! Consolidating the forward shift here removes the classic per-strategy
//! `shift(1)` duplication where one missed call silently leaks future data.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{DateSeries, Frame};
use crate::error::DataError;

use super::policy::ExecutionPolicy;

/// Kind of intent a strategy emits, for structural validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    /// Values must be in {-1, 0, 1}.
    Discrete,
    /// Values must be finite.
    Continuous,
}

/// Applies the execution delay and validates pipeline inputs.
#[derive(Debug, Clone)]
pub struct ExecutionTiming {
    policy: ExecutionPolicy,
}

impl ExecutionTiming {
    pub fn new(policy: ExecutionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ExecutionPolicy {
        &self.policy
    }

    /// Shift a series forward by `execution_delay_days` trading positions.
    ///
    /// The first `delay` rows become NaN. A zero delay returns the input
    /// unchanged (same-bar execution).
    pub fn apply_delay(&self, series: &DateSeries) -> DateSeries {
        let delay = self.policy.execution_delay_days;
        if delay == 0 {
            return series.clone();
        }
        let n = series.len();
        let mut shifted = vec![f64::NAN; n];
        for i in delay..n {
            shifted[i] = series.get(i - delay);
        }
        DateSeries::new(series.dates().to_vec(), shifted)
            .expect("shifted values preserve series length")
    }

    /// Shift every column of a frame forward by `execution_delay_days`.
    pub fn apply_delay_frame(&self, frame: &Frame) -> Frame {
        let delay = self.policy.execution_delay_days;
        if delay == 0 {
            return frame.clone();
        }
        let mut out = frame.mask_rows(delay.min(frame.nrows()));
        for row in (delay..frame.nrows()).rev() {
            for col in 0..frame.ncols() {
                out.set(row, col, frame.get(row - delay, col));
            }
        }
        out
    }

    /// Per-asset realized strategy returns with the execution lag applied.
    ///
    /// For each asset: optionally map raw intent to exposure, delay via
    /// [`apply_delay`](Self::apply_delay), then multiply elementwise by the
    /// unshifted raw returns. NaN in either operand yields NaN.
    pub fn compute_realized_returns(
        &self,
        intent_by_asset: &BTreeMap<String, DateSeries>,
        raw_returns_by_asset: &BTreeMap<String, DateSeries>,
        exposure_mapper: Option<&dyn Fn(&DateSeries) -> DateSeries>,
    ) -> Result<BTreeMap<String, DateSeries>, DataError> {
        let intent_keys: Vec<String> = intent_by_asset.keys().cloned().collect();
        let return_keys: Vec<String> = raw_returns_by_asset.keys().cloned().collect();
        if intent_keys != return_keys {
            return Err(DataError::KeyMismatch {
                intent: intent_keys,
                returns: return_keys,
            });
        }

        let mut result = BTreeMap::new();
        for (symbol, intent) in intent_by_asset {
            let raw = &raw_returns_by_asset[symbol];
            check_same_index(symbol, intent.dates(), raw.dates())?;

            let mapped;
            let intent = match exposure_mapper {
                Some(mapper) => {
                    mapped = mapper(intent);
                    &mapped
                }
                None => intent,
            };

            let delayed = self.apply_delay(intent);
            let realized: Vec<f64> = delayed
                .values()
                .iter()
                .zip(raw.values().iter())
                .map(|(&held, &ret)| held * ret)
                .collect();
            result.insert(
                symbol.clone(),
                DateSeries::new(raw.dates().to_vec(), realized)?,
            );
        }
        Ok(result)
    }

    /// Assert all objects share the reference date index exactly.
    ///
    /// Checks, for the reference and every object: sorted ascending, no
    /// duplicates, equal to the reference. Catches the silent-misalignment
    /// class of leakage before signals are ever combined with returns.
    /// (Dates are timezone-free `NaiveDate`s, so the original timezone
    /// mismatch failure mode cannot be represented here.)
    pub fn validate_alignment(
        &self,
        reference: &[NaiveDate],
        objects: &[(&str, &[NaiveDate])],
    ) -> Result<(), DataError> {
        check_sorted_unique("reference", reference)?;
        for &(label, dates) in objects {
            check_sorted_unique(label, dates)?;
            check_same_index(label, dates, reference)?;
        }
        Ok(())
    }

    /// Structural validation of strategy output.
    ///
    /// NaN rows (warmup) are exempt; defined rows must satisfy the intent
    /// kind's value constraint.
    pub fn validate_intent(
        &self,
        intent_by_asset: &BTreeMap<String, DateSeries>,
        kind: IntentKind,
    ) -> Result<(), DataError> {
        for (symbol, intent) in intent_by_asset {
            let invalid = intent
                .values()
                .iter()
                .filter(|v| !v.is_nan())
                .filter(|&&v| match kind {
                    IntentKind::Discrete => v != -1.0 && v != 0.0 && v != 1.0,
                    IntentKind::Continuous => !v.is_finite(),
                })
                .count();
            if invalid > 0 {
                return Err(DataError::InvalidIntent {
                    symbol: symbol.clone(),
                    count: invalid,
                    expected: match kind {
                        IntentKind::Discrete => "values in {-1, 0, 1}",
                        IntentKind::Continuous => "finite values",
                    },
                });
            }
        }
        Ok(())
    }
}

fn check_sorted_unique(label: &str, dates: &[NaiveDate]) -> Result<(), DataError> {
    for i in 1..dates.len() {
        if dates[i] == dates[i - 1] {
            return Err(DataError::DuplicateDate {
                label: label.to_string(),
                date: dates[i],
            });
        }
        if dates[i] < dates[i - 1] {
            return Err(DataError::UnsortedDates {
                label: label.to_string(),
                position: i,
            });
        }
    }
    Ok(())
}

fn check_same_index(label: &str, dates: &[NaiveDate], reference: &[NaiveDate]) -> Result<(), DataError> {
    if dates == reference {
        return Ok(());
    }
    let missing = reference.iter().filter(|d| !dates.contains(d)).count();
    let extra = dates.iter().filter(|d| !reference.contains(d)).count();
    Err(DataError::IndexMismatch {
        label: label.to_string(),
        missing,
        extra,
    })
}
