//! Signal combination policies shared by the multi-indicator strategies.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How three constituent indicator signals merge into one intent value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CombineMethod {
    /// Unanimous agreement only; anything else is neutral.
    All,
    /// Signed sum of the three signals >= +2 (long) or <= -2 (short).
    /// Treats 2-vs-1 conflicts as neutral.
    Majority,
    /// Weighted sum against a threshold. Weights must be non-negative and
    /// sum to 1.0 within 1e-6; threshold in [0, 1].
    Weighted { weights: [f64; 3], threshold: f64 },
}

impl Default for CombineMethod {
    fn default() -> Self {
        CombineMethod::Majority
    }
}

impl CombineMethod {
    /// Default weighted combiner: [0.4, 0.3, 0.3] against 0.1.
    pub fn weighted_default() -> Self {
        CombineMethod::Weighted {
            weights: [0.4, 0.3, 0.3],
            threshold: 0.1,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let CombineMethod::Weighted { weights, threshold } = self {
            for (i, &w) in weights.iter().enumerate() {
                if !w.is_finite() || w < 0.0 {
                    return Err(ConfigError::NegativeWeight {
                        context: "combine weights",
                        name: format!("weights[{i}]"),
                        value: w,
                    });
                }
            }
            let sum: f64 = weights.iter().sum();
            if (sum - 1.0).abs() > 1e-6 {
                return Err(ConfigError::WeightSum {
                    context: "combine weights",
                    sum,
                });
            }
            if !(0.0..=1.0).contains(threshold) {
                return Err(ConfigError::Parameter {
                    name: "weighted_threshold",
                    reason: format!("must be in [0, 1], got {threshold}"),
                });
            }
        }
        Ok(())
    }

    /// Combine three aligned signal vectors into one. A NaN in any
    /// constituent makes the combined value NaN for that position.
    pub fn combine(&self, a: &[f64], b: &[f64], c: &[f64]) -> Vec<f64> {
        debug_assert_eq!(a.len(), b.len());
        debug_assert_eq!(a.len(), c.len());
        (0..a.len())
            .map(|i| {
                let (sa, sb, sc) = (a[i], b[i], c[i]);
                if sa.is_nan() || sb.is_nan() || sc.is_nan() {
                    return f64::NAN;
                }
                match self {
                    CombineMethod::All => {
                        if sa == 1.0 && sb == 1.0 && sc == 1.0 {
                            1.0
                        } else if sa == -1.0 && sb == -1.0 && sc == -1.0 {
                            -1.0
                        } else {
                            0.0
                        }
                    }
                    CombineMethod::Majority => {
                        let sum = sa + sb + sc;
                        if sum >= 2.0 {
                            1.0
                        } else if sum <= -2.0 {
                            -1.0
                        } else {
                            0.0
                        }
                    }
                    CombineMethod::Weighted { weights, threshold } => {
                        let sum = weights[0] * sa + weights[1] * sb + weights[2] * sc;
                        if sum > *threshold {
                            1.0
                        } else if sum < -threshold {
                            -1.0
                        } else {
                            0.0
                        }
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_requires_unanimity() {
        let m = CombineMethod::All;
        assert_eq!(m.combine(&[1.0], &[1.0], &[1.0]), vec![1.0]);
        assert_eq!(m.combine(&[-1.0], &[-1.0], &[-1.0]), vec![-1.0]);
        assert_eq!(m.combine(&[1.0], &[1.0], &[0.0]), vec![0.0]);
        assert_eq!(m.combine(&[1.0], &[1.0], &[-1.0]), vec![0.0]);
    }

    #[test]
    fn majority_needs_two_without_conflict() {
        let m = CombineMethod::Majority;
        // two long + one neutral: sum = 2
        assert_eq!(m.combine(&[1.0], &[1.0], &[0.0]), vec![1.0]);
        // two long + one short: sum = 1, conflict treated as neutral
        assert_eq!(m.combine(&[1.0], &[1.0], &[-1.0]), vec![0.0]);
        assert_eq!(m.combine(&[-1.0], &[-1.0], &[0.0]), vec![-1.0]);
    }

    #[test]
    fn weighted_threshold_gate() {
        let m = CombineMethod::Weighted {
            weights: [0.6, 0.2, 0.2],
            threshold: 0.5,
        };
        // 0.6*1 + 0.2*0 + 0.2*0 = 0.6 > 0.5
        assert_eq!(m.combine(&[1.0], &[0.0], &[0.0]), vec![1.0]);
        // 0.6*0 + 0.2*1 + 0.2*1 = 0.4 <= 0.5
        assert_eq!(m.combine(&[0.0], &[1.0], &[1.0]), vec![0.0]);
        assert_eq!(m.combine(&[-1.0], &[-1.0], &[0.0]), vec![-1.0]);
    }

    #[test]
    fn nan_propagates() {
        let m = CombineMethod::Majority;
        let out = m.combine(&[f64::NAN], &[1.0], &[1.0]);
        assert!(out[0].is_nan());
    }

    #[test]
    fn weighted_validation() {
        assert!(CombineMethod::weighted_default().validate().is_ok());
        let bad_sum = CombineMethod::Weighted {
            weights: [0.5, 0.3, 0.3],
            threshold: 0.1,
        };
        assert!(matches!(
            bad_sum.validate(),
            Err(ConfigError::WeightSum { .. })
        ));
        let negative = CombineMethod::Weighted {
            weights: [1.2, -0.1, -0.1],
            threshold: 0.1,
        };
        assert!(matches!(
            negative.validate(),
            Err(ConfigError::NegativeWeight { .. })
        ));
        let bad_threshold = CombineMethod::Weighted {
            weights: [0.4, 0.3, 0.3],
            threshold: 1.5,
        };
        assert!(bad_threshold.validate().is_err());
    }
}
