//! Warmup calculation — how much history a configuration needs.
//!
//! Warmup is counted in exact trading days. The load-bearing composition
//! rule: the strategy and meta-allocator layers are sequential (the
//! meta-allocator consumes strategy output), while the asset allocator runs
//! on raw price returns and warms up in parallel with them. Getting the
//! parallel-vs-sequential split wrong silently injects undefined data into
//! the "valid" output window.
//!
//! Timeline for (strategy 253, risk-parity meta 60, allocator 60, vol 60):
//! days 1-253 strategy warmup, 254-313 meta warmup (allocator long done),
//! day 314 first portfolio return, 315-374 vol-targeting accumulation —
//! 374 trading days total.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{sessions_before, TradingCalendar};
use crate::error::DataError;

/// Immutable breakdown of the warmup a configuration requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmupPlan {
    /// Max over the selected strategies' own warmups.
    pub strategy_warmup: usize,
    /// The meta-allocator's rolling requirement; zero when one strategy runs.
    pub meta_allocator_warmup: usize,
    /// Sequential: strategy feeds the meta-allocator.
    pub signal_warmup: usize,
    /// The asset allocator's lookback, warming up in parallel.
    pub asset_allocator_warmup: usize,
    /// max(signal_warmup, asset_allocator_warmup).
    pub parallel_warmup: usize,
    /// Vol-targeting lookback, fed by realized portfolio returns.
    pub vol_targeting_warmup: usize,
    /// parallel_warmup + 1 (first portfolio return) + vol_targeting_warmup.
    pub total_trading_days: usize,
}

impl WarmupPlan {
    /// Compute the plan from layer requirements.
    ///
    /// `strategy_warmups` holds each selected strategy's own warmup;
    /// `meta_allocator_warmup` is ignored unless more than one strategy is
    /// selected (a single strategy bypasses the meta layer entirely).
    pub fn compute(
        strategy_warmups: &[usize],
        meta_allocator_warmup: usize,
        asset_allocator_warmup: usize,
        vol_targeting_warmup: usize,
    ) -> Self {
        let strategy_warmup = strategy_warmups.iter().copied().max().unwrap_or(0);
        let meta_allocator_warmup = if strategy_warmups.len() > 1 {
            meta_allocator_warmup
        } else {
            0
        };
        let signal_warmup = strategy_warmup + meta_allocator_warmup;
        let parallel_warmup = signal_warmup.max(asset_allocator_warmup);
        let total_trading_days = parallel_warmup + 1 + vol_targeting_warmup;

        Self {
            strategy_warmup,
            meta_allocator_warmup,
            signal_warmup,
            asset_allocator_warmup,
            parallel_warmup,
            vol_targeting_warmup,
            total_trading_days,
        }
    }

    /// Human-readable breakdown for diagnostics.
    pub fn describe(&self) -> String {
        format!(
            "max(strategy {}d + meta {}d, allocator {}d) + first return (1d) + \
             vol targeting {}d = {} trading days",
            self.strategy_warmup,
            self.meta_allocator_warmup,
            self.asset_allocator_warmup,
            self.vol_targeting_warmup,
            self.total_trading_days
        )
    }

    /// Calendar date history must start on: exactly `total_trading_days`
    /// sessions before `start_date` on the given calendar.
    pub fn history_start_date(
        &self,
        calendar: &dyn TradingCalendar,
        start_date: NaiveDate,
    ) -> Result<NaiveDate, DataError> {
        sessions_before(calendar, start_date, self.total_trading_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekdayCalendar;

    #[test]
    fn passthrough_single_strategy() {
        // No strategy warmup, no meta layer: 60 + 1 + 60.
        let plan = WarmupPlan::compute(&[0], 0, 60, 60);
        assert_eq!(plan.signal_warmup, 0);
        assert_eq!(plan.parallel_warmup, 60);
        assert_eq!(plan.total_trading_days, 121);
    }

    #[test]
    fn two_strategies_with_risk_parity() {
        // max(253 + 60, 60) + 1 + 60 = 374.
        let plan = WarmupPlan::compute(&[253, 60], 60, 60, 60);
        assert_eq!(plan.strategy_warmup, 253);
        assert_eq!(plan.meta_allocator_warmup, 60);
        assert_eq!(plan.signal_warmup, 313);
        assert_eq!(plan.parallel_warmup, 313);
        assert_eq!(plan.total_trading_days, 374);
    }

    #[test]
    fn single_strategy_ignores_meta_warmup() {
        let plan = WarmupPlan::compute(&[100], 60, 20, 20);
        assert_eq!(plan.meta_allocator_warmup, 0);
        assert_eq!(plan.signal_warmup, 100);
    }

    #[test]
    fn allocator_dominates_when_signal_is_short() {
        let plan = WarmupPlan::compute(&[10, 10], 5, 120, 20);
        assert_eq!(plan.signal_warmup, 15);
        assert_eq!(plan.parallel_warmup, 120);
        assert_eq!(plan.total_trading_days, 141);
    }

    #[test]
    fn no_strategies_means_zero_strategy_warmup() {
        let plan = WarmupPlan::compute(&[], 0, 20, 20);
        assert_eq!(plan.strategy_warmup, 0);
        assert_eq!(plan.total_trading_days, 41);
    }

    #[test]
    fn history_start_counts_sessions() {
        let plan = WarmupPlan::compute(&[0], 0, 4, 0);
        // total = 5 trading days before Monday 2024-01-08 -> Monday 2024-01-01.
        let start = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let history_start = plan
            .history_start_date(&WeekdayCalendar, start)
            .unwrap();
        assert_eq!(history_start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn describe_mentions_total() {
        let plan = WarmupPlan::compute(&[253], 0, 60, 60);
        assert!(plan.describe().contains("314 trading days"));
    }
}
