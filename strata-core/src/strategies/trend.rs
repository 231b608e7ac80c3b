//! Multi-indicator trend-following strategy.
//!
//! Combines three complementary trend signals:
//! 1. Momentum — sign of the `momentum_lookback`-day return.
//! 2. Moving-average crossover — short SMA vs long SMA.
//! 3. Breakout — proximity to the rolling high/low (within 1%); when both
//!    high and low proximity hold (narrow range) the signal is neutral.

use serde::{Deserialize, Serialize};

use crate::domain::{DateSeries, PriceSeries};
use crate::error::ConfigError;
use crate::indicators::{momentum, rolling_max, rolling_mean, rolling_min};

use super::combine::CombineMethod;
use super::Strategy;

/// Breakout proximity band: "at the high" means within 1% of the rolling high.
const BREAKOUT_BAND: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendParams {
    pub momentum_lookback: usize,
    pub sma_short: usize,
    pub sma_long: usize,
    pub breakout_period: usize,
    pub combine: CombineMethod,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            momentum_lookback: 252,
            sma_short: 50,
            sma_long: 200,
            breakout_period: 252,
            combine: CombineMethod::Majority,
        }
    }
}

impl TrendParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.momentum_lookback < 1 || self.momentum_lookback > 504 {
            return Err(ConfigError::Parameter {
                name: "momentum_lookback",
                reason: format!("must be in [1, 504], got {}", self.momentum_lookback),
            });
        }
        if self.sma_short < 1 {
            return Err(ConfigError::Parameter {
                name: "sma_short",
                reason: format!("must be >= 1, got {}", self.sma_short),
            });
        }
        if self.sma_long < 1 {
            return Err(ConfigError::Parameter {
                name: "sma_long",
                reason: format!("must be >= 1, got {}", self.sma_long),
            });
        }
        if self.sma_short >= self.sma_long {
            return Err(ConfigError::Parameter {
                name: "sma_short",
                reason: format!(
                    "must be < sma_long ({} >= {})",
                    self.sma_short, self.sma_long
                ),
            });
        }
        if self.breakout_period < 1 || self.breakout_period > 504 {
            return Err(ConfigError::Parameter {
                name: "breakout_period",
                reason: format!("must be in [1, 504], got {}", self.breakout_period),
            });
        }
        self.combine.validate()
    }
}

#[derive(Debug, Clone)]
pub struct TrendStrategy {
    params: TrendParams,
}

impl TrendStrategy {
    pub fn new(params: TrendParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    fn momentum_signal(&self, closes: &[f64]) -> Vec<f64> {
        momentum(closes, self.params.momentum_lookback)
            .into_iter()
            .map(sign_signal)
            .collect()
    }

    fn ma_crossover_signal(&self, closes: &[f64]) -> Vec<f64> {
        let short = rolling_mean(closes, self.params.sma_short);
        let long = rolling_mean(closes, self.params.sma_long);
        short
            .iter()
            .zip(long.iter())
            .map(|(&s, &l)| {
                if s.is_nan() || l.is_nan() {
                    f64::NAN
                } else if s > l {
                    1.0
                } else if s < l {
                    -1.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn breakout_signal(&self, closes: &[f64]) -> Vec<f64> {
        let high = rolling_max(closes, self.params.breakout_period);
        let low = rolling_min(closes, self.params.breakout_period);
        closes
            .iter()
            .zip(high.iter().zip(low.iter()))
            .map(|(&close, (&h, &l))| {
                if close.is_nan() || h.is_nan() || l.is_nan() {
                    return f64::NAN;
                }
                let at_high = close >= h * (1.0 - BREAKOUT_BAND);
                let at_low = close <= l * (1.0 + BREAKOUT_BAND);
                match (at_high, at_low) {
                    // Both at once means a narrow range: stay neutral rather
                    // than pick a side in a sideways market.
                    (true, true) => 0.0,
                    (true, false) => 1.0,
                    (false, true) => -1.0,
                    (false, false) => 0.0,
                }
            })
            .collect()
    }
}

impl Strategy for TrendStrategy {
    fn name(&self) -> &str {
        "trend"
    }

    fn signal_warmup(&self) -> usize {
        self.params
            .momentum_lookback
            .max(self.params.sma_long - 1)
            .max(self.params.breakout_period - 1)
    }

    fn warmup_period(&self) -> usize {
        // Momentum is first valid at index lookback, rolling windows at
        // period - 1, and the realized return needs one more day of lag.
        (self.params.momentum_lookback + 1)
            .max(self.params.sma_long)
            .max(self.params.breakout_period)
    }

    fn generate_intent(&self, prices: &PriceSeries) -> DateSeries {
        let closes = prices.closes();
        let momentum_sig = self.momentum_signal(&closes);
        let ma_sig = self.ma_crossover_signal(&closes);
        let breakout_sig = self.breakout_signal(&closes);
        let combined = self
            .params
            .combine
            .combine(&momentum_sig, &ma_sig, &breakout_sig);

        DateSeries::new(prices.dates(), combined)
            .expect("intent length matches price history")
            .mask_prefix(self.signal_warmup())
    }
}

fn sign_signal(v: f64) -> f64 {
    if v.is_nan() {
        f64::NAN
    } else if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}
