//! Execution policy — temporal execution rules.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// When signals are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalTime {
    Close,
}

/// When trades execute after signal computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionTime {
    NextOpen,
    NextClose,
}

/// Which price is used for fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUsed {
    Open,
    Close,
}

/// Temporal execution rules for the pipeline.
///
/// Every component computes "as of t using data <= t". The execution delay is
/// the single canonical lag converting target weights at t into held weights
/// at t + `execution_delay_days`; it is applied only by
/// [`ExecutionTiming`](super::ExecutionTiming).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionPolicy {
    pub signal_time: SignalTime,
    pub execution_time: ExecutionTime,
    pub price_used: PriceUsed,
    /// Trading days between decision and effect. 0 means same-bar execution,
    /// which permits lookahead; test configurations only.
    pub execution_delay_days: usize,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            signal_time: SignalTime::Close,
            execution_time: ExecutionTime::NextOpen,
            price_used: PriceUsed::Open,
            execution_delay_days: 1,
        }
    }
}

impl ExecutionPolicy {
    pub fn with_delay(execution_delay_days: usize) -> Result<Self, ConfigError> {
        let policy = Self {
            execution_delay_days,
            ..Self::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution_delay_days > 10 {
            return Err(ConfigError::Parameter {
                name: "execution_delay_days",
                reason: format!("must be <= 10, got {}", self.execution_delay_days),
            });
        }
        Ok(())
    }
}
