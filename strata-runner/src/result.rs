//! Walk-forward result aggregate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use strata_core::domain::{DateSeries, Frame};
use strata_core::error::DataError;
use strata_core::warmup::WarmupPlan;

use crate::config::{RunId, SystemConfig};
use crate::metrics::MetricsBundle;

/// Complete output of one walk-forward run.
///
/// Invariant, validated at construction: `daily_returns`, `equity_curve`,
/// `drawdown`, and every weight frame share one strictly-increasing, unique
/// date index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkforwardResult {
    /// Content hash of the configuration that produced this result.
    pub run_id: RunId,
    /// Configuration snapshot for reproducibility.
    pub config: SystemConfig,
    /// Warmup breakdown actually used for this run.
    pub warmup: WarmupPlan,
    /// Daily portfolio returns over the trimmed window.
    pub daily_returns: DateSeries,
    /// Equity compounded from 100.
    pub equity_curve: DateSeries,
    /// Distance below the running equity peak (non-positive fractions).
    pub drawdown: DateSeries,
    /// Final held weights (after every configured cap stage).
    pub weights: Frame,
    /// Weights after leverage scaling, before any post-leverage caps.
    pub vol_targeted_weights: Frame,
    /// Weights before vol targeting (after any pre-leverage caps).
    pub raw_weights: Frame,
    /// Allocator output before any risk caps.
    pub allocator_weights: Frame,
    /// Wide per-asset realized returns over the same window.
    pub asset_returns: Frame,
    /// Performance statistics.
    pub metrics: MetricsBundle,
}

impl WalkforwardResult {
    /// Validate the shared-index invariant across all aligned outputs.
    pub(crate) fn validate_alignment(&self) -> Result<(), DataError> {
        let reference = self.daily_returns.dates();
        for i in 1..reference.len() {
            if reference[i] <= reference[i - 1] {
                return Err(DataError::UnsortedDates {
                    label: "result index".into(),
                    position: i,
                });
            }
        }
        let frames: [(&str, &[NaiveDate]); 7] = [
            ("equity_curve", self.equity_curve.dates()),
            ("drawdown", self.drawdown.dates()),
            ("weights", self.weights.dates()),
            ("vol_targeted_weights", self.vol_targeted_weights.dates()),
            ("raw_weights", self.raw_weights.dates()),
            ("allocator_weights", self.allocator_weights.dates()),
            ("asset_returns", self.asset_returns.dates()),
        ];
        for (label, dates) in frames {
            if dates != reference {
                return Err(DataError::IndexMismatch {
                    label: label.into(),
                    missing: 0,
                    extra: 0,
                });
            }
        }
        Ok(())
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.daily_returns.dates().first().copied()
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.daily_returns.dates().last().copied()
    }

    pub fn num_days(&self) -> usize {
        self.daily_returns.len()
    }

    /// Approximate length in trading years.
    pub fn num_years(&self) -> f64 {
        self.num_days() as f64 / 252.0
    }

    pub fn symbols(&self) -> &[String] {
        self.weights.columns()
    }
}
