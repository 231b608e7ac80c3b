//! Passthrough strategy — always long.
//!
//! The simplest possible strategy: intent is 1 on every bar, so realized
//! returns equal raw buy-and-hold returns after the execution lag. Useful as
//! a baseline and for debugging the allocation layers in isolation.

use crate::domain::{DateSeries, PriceSeries};

use super::Strategy;

#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughStrategy;

impl Strategy for PassthroughStrategy {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn signal_warmup(&self) -> usize {
        0
    }

    fn warmup_period(&self) -> usize {
        0
    }

    fn generate_intent(&self, prices: &PriceSeries) -> DateSeries {
        DateSeries::new(prices.dates(), vec![1.0; prices.len()])
            .expect("intent length matches price history")
    }
}
