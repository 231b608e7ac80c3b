//! Multi-indicator mean-reversion strategy.
//!
//! Combines three contrarian signals:
//! 1. RSI — long below the oversold threshold, short above overbought.
//! 2. Bollinger position — long below the lower band, short above the upper.
//! 3. Z-score — long below -threshold, short above +threshold.

use serde::{Deserialize, Serialize};

use crate::domain::{DateSeries, PriceSeries};
use crate::error::ConfigError;
use crate::indicators::{rolling_mean, rolling_std, rsi, zscore};

use super::combine::CombineMethod;
use super::Strategy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanRevParams {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub bb_period: usize,
    pub bb_std: f64,
    pub zscore_lookback: usize,
    pub zscore_threshold: f64,
    pub combine: CombineMethod,
}

impl Default for MeanRevParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            bb_period: 20,
            bb_std: 2.0,
            zscore_lookback: 60,
            zscore_threshold: 1.5,
            combine: CombineMethod::Majority,
        }
    }
}

impl MeanRevParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rsi_period < 2 || self.rsi_period > 100 {
            return Err(ConfigError::Parameter {
                name: "rsi_period",
                reason: format!("must be in [2, 100], got {}", self.rsi_period),
            });
        }
        if !(0.0..=100.0).contains(&self.rsi_oversold) {
            return Err(ConfigError::Parameter {
                name: "rsi_oversold",
                reason: format!("must be in [0, 100], got {}", self.rsi_oversold),
            });
        }
        if !(0.0..=100.0).contains(&self.rsi_overbought) {
            return Err(ConfigError::Parameter {
                name: "rsi_overbought",
                reason: format!("must be in [0, 100], got {}", self.rsi_overbought),
            });
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(ConfigError::Parameter {
                name: "rsi_oversold",
                reason: format!(
                    "must be < rsi_overbought ({} >= {})",
                    self.rsi_oversold, self.rsi_overbought
                ),
            });
        }
        if self.bb_period < 2 || self.bb_period > 200 {
            return Err(ConfigError::Parameter {
                name: "bb_period",
                reason: format!("must be in [2, 200], got {}", self.bb_period),
            });
        }
        if !(self.bb_std > 0.0 && self.bb_std <= 5.0) {
            return Err(ConfigError::Parameter {
                name: "bb_std",
                reason: format!("must be in (0, 5], got {}", self.bb_std),
            });
        }
        if self.zscore_lookback < 10 || self.zscore_lookback > 252 {
            return Err(ConfigError::Parameter {
                name: "zscore_lookback",
                reason: format!("must be in [10, 252], got {}", self.zscore_lookback),
            });
        }
        if !(self.zscore_threshold > 0.0 && self.zscore_threshold <= 5.0) {
            return Err(ConfigError::Parameter {
                name: "zscore_threshold",
                reason: format!("must be in (0, 5], got {}", self.zscore_threshold),
            });
        }
        self.combine.validate()
    }
}

#[derive(Debug, Clone)]
pub struct MeanRevStrategy {
    params: MeanRevParams,
}

impl MeanRevStrategy {
    pub fn new(params: MeanRevParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    fn rsi_signal(&self, closes: &[f64]) -> Vec<f64> {
        rsi(closes, self.params.rsi_period)
            .into_iter()
            .map(|v| {
                if v.is_nan() {
                    f64::NAN
                } else if v < self.params.rsi_oversold {
                    1.0
                } else if v > self.params.rsi_overbought {
                    -1.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn bollinger_signal(&self, closes: &[f64]) -> Vec<f64> {
        let mean = rolling_mean(closes, self.params.bb_period);
        let std = rolling_std(closes, self.params.bb_period);
        closes
            .iter()
            .zip(mean.iter().zip(std.iter()))
            .map(|(&close, (&m, &s))| {
                if close.is_nan() || m.is_nan() || s.is_nan() {
                    return f64::NAN;
                }
                let upper = m + self.params.bb_std * s;
                let lower = m - self.params.bb_std * s;
                if close < lower {
                    1.0
                } else if close > upper {
                    -1.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn zscore_signal(&self, closes: &[f64]) -> Vec<f64> {
        let warmup = self.params.zscore_lookback - 1;
        zscore(closes, self.params.zscore_lookback)
            .into_iter()
            .enumerate()
            .map(|(i, z)| {
                if z.is_nan() {
                    // A flat window has zero dispersion, which is "at the
                    // mean", not missing data; inside the warmup it is
                    // genuinely undefined.
                    if i < warmup {
                        f64::NAN
                    } else {
                        0.0
                    }
                } else if z < -self.params.zscore_threshold {
                    1.0
                } else if z > self.params.zscore_threshold {
                    -1.0
                } else {
                    0.0
                }
            })
            .collect()
    }
}

impl Strategy for MeanRevStrategy {
    fn name(&self) -> &str {
        "meanrev"
    }

    fn signal_warmup(&self) -> usize {
        self.params
            .rsi_period
            .max(self.params.bb_period - 1)
            .max(self.params.zscore_lookback - 1)
    }

    fn warmup_period(&self) -> usize {
        (self.params.rsi_period + 1)
            .max(self.params.bb_period)
            .max(self.params.zscore_lookback)
    }

    fn generate_intent(&self, prices: &PriceSeries) -> DateSeries {
        let closes = prices.closes();
        let rsi_sig = self.rsi_signal(&closes);
        let bb_sig = self.bollinger_signal(&closes);
        let z_sig = self.zscore_signal(&closes);
        let combined = self.params.combine.combine(&rsi_sig, &bb_sig, &z_sig);

        DateSeries::new(prices.dates(), combined)
            .expect("intent length matches price history")
            .mask_prefix(self.signal_warmup())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::NaiveDate;

    fn prices(closes: &[f64]) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: base + chrono::Duration::days(i as i64),
                open: close,
                high: close * 1.02,
                low: close * 0.98,
                close,
                volume: 1_000,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    fn small_params() -> MeanRevParams {
        MeanRevParams {
            rsi_period: 3,
            bb_period: 4,
            zscore_lookback: 10,
            zscore_threshold: 1.0,
            combine: CombineMethod::Majority,
            ..MeanRevParams::default()
        }
    }

    #[test]
    fn crash_after_flat_goes_long() {
        // Flat at 100, then a sharp drop: oversold on all three indicators.
        let mut closes = vec![100.0; 15];
        closes.extend_from_slice(&[92.0, 85.0, 80.0]);
        let strategy = MeanRevStrategy::new(small_params()).unwrap();
        let intent = strategy.generate_intent(&prices(&closes));
        let last = closes.len() - 1;
        assert_eq!(intent.get(last), 1.0);
    }

    #[test]
    fn spike_after_flat_goes_short() {
        let mut closes = vec![100.0; 15];
        closes.extend_from_slice(&[109.0, 118.0, 126.0]);
        let strategy = MeanRevStrategy::new(small_params()).unwrap();
        let intent = strategy.generate_intent(&prices(&closes));
        let last = closes.len() - 1;
        assert_eq!(intent.get(last), -1.0);
    }

    #[test]
    fn flat_prices_stay_neutral() {
        // Flat prices: RSI 50, bands collapse to the mean, z-score window
        // has no dispersion. All three map to defined neutral signals.
        let closes = vec![100.0; 20];
        let strategy = MeanRevStrategy::new(small_params()).unwrap();
        let intent = strategy.generate_intent(&prices(&closes));
        let warmup = strategy.signal_warmup();
        for i in warmup..closes.len() {
            assert_eq!(intent.get(i), 0.0, "expected neutral at {i}");
        }
    }

    #[test]
    fn default_warmup_is_zscore_bound() {
        let strategy = MeanRevStrategy::new(MeanRevParams::default()).unwrap();
        assert_eq!(strategy.warmup_period(), 60);
        assert_eq!(strategy.signal_warmup(), 59);
    }

    #[test]
    fn rejects_inverted_rsi_thresholds() {
        let params = MeanRevParams {
            rsi_oversold: 70.0,
            rsi_overbought: 30.0,
            ..MeanRevParams::default()
        };
        assert!(MeanRevStrategy::new(params).is_err());
    }

    #[test]
    fn rejects_small_zscore_lookback() {
        let params = MeanRevParams {
            zscore_lookback: 5,
            ..MeanRevParams::default()
        };
        assert!(MeanRevStrategy::new(params).is_err());
    }
}
