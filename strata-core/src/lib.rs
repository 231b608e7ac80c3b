//! Strata Core — walk-forward engine for multi-layer portfolio strategies.
//!
//! This crate contains the computational heart of the system:
//! - Domain types (bars, price histories, date-indexed series and frames)
//! - Trading-calendar lookup with an explicit per-exchange cache
//! - Execution timing: the single enforcement point for the decision-to-
//!   effect lag (everything else computes "as of t using data <= t")
//! - Warmup calculation in exact trading days
//! - Strategy signal layer (passthrough, trend, mean reversion) over a small
//!   rolling-indicator library
//! - Meta-allocator layer (fixed weight, risk parity)
//! - Inverse-volatility asset allocator with iterative capping
//! - Risk-cap engine (per-asset / per-sector / min-holdings)
//! - Volatility targeting
//!
//! The crate performs no I/O and holds no locks: every stage consumes an
//! immutable table and returns a new one, so independent runs are safe to
//! execute concurrently without synchronization.

pub mod allocators;
pub mod calendar;
pub mod domain;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod meta;
pub mod portfolio;
pub mod strategies;
pub mod warmup;

pub use domain::{Bar, DateSeries, Frame, PriceSeries};
pub use error::{ConfigError, DataError, EngineError, FeasibilityError};
pub use warmup::WarmupPlan;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the types that cross the runner's thread
    /// boundary are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::DateSeries>();
        require_sync::<domain::DateSeries>();
        require_send::<domain::Frame>();
        require_sync::<domain::Frame>();

        // Configuration records
        require_send::<execution::ExecutionPolicy>();
        require_sync::<execution::ExecutionPolicy>();
        require_send::<strategies::StrategyConfig>();
        require_sync::<strategies::StrategyConfig>();
        require_send::<meta::MetaAllocatorConfig>();
        require_sync::<meta::MetaAllocatorConfig>();
        require_send::<allocators::AllocatorConfig>();
        require_sync::<allocators::AllocatorConfig>();
        require_send::<portfolio::RiskCapConfig>();
        require_sync::<portfolio::RiskCapConfig>();
        require_send::<portfolio::VolTargetConfig>();
        require_sync::<portfolio::VolTargetConfig>();
        require_send::<WarmupPlan>();
        require_sync::<WarmupPlan>();

        // Trait objects used across the pipeline
        require_send::<Box<dyn strategies::Strategy>>();
        require_sync::<Box<dyn strategies::Strategy>>();
        require_send::<Box<dyn meta::MetaAllocator>>();
        require_sync::<Box<dyn meta::MetaAllocator>>();
    }
}
