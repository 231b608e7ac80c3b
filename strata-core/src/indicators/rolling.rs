//! Rolling window statistics over a value slice.

/// Rolling mean over `period` values. First `period - 1` outputs are NaN.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    assert!(period >= 1, "rolling_mean period must be >= 1");
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < period {
        return result;
    }
    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = window.iter().sum::<f64>() / period as f64;
    }
    result
}

/// Rolling sample standard deviation (n - 1 denominator) over `period` values.
/// First `period - 1` outputs are NaN.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    assert!(period >= 2, "rolling_std period must be >= 2");
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < period {
        return result;
    }
    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = window.iter().sum::<f64>() / period as f64;
        let var = window
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / (period - 1) as f64;
        result[i] = var.sqrt();
    }
    result
}

/// Rolling maximum over `period` values. First `period - 1` outputs are NaN.
pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    assert!(period >= 1, "rolling_max period must be >= 1");
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < period {
        return result;
    }
    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = window.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    }
    result
}

/// Rolling minimum over `period` values. First `period - 1` outputs are NaN.
pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    assert!(period >= 1, "rolling_min period must be >= 1");
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < period {
        return result;
    }
    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = window.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    }
    result
}

/// Percentage change over `lookback` positions:
/// `values[t] / values[t - lookback] - 1`. First `lookback` outputs are NaN.
pub fn momentum(values: &[f64], lookback: usize) -> Vec<f64> {
    assert!(lookback >= 1, "momentum lookback must be >= 1");
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    for i in lookback..n {
        let base = values[i - lookback];
        if base.is_nan() || values[i].is_nan() || base == 0.0 {
            continue;
        }
        result[i] = values[i] / base - 1.0;
    }
    result
}

/// Rolling z-score: `(value - rolling_mean) / rolling_std`.
/// NaN where the window is incomplete or the window std is zero.
pub fn zscore(values: &[f64], lookback: usize) -> Vec<f64> {
    assert!(lookback >= 2, "zscore lookback must be >= 2");
    let mean = rolling_mean(values, lookback);
    let std = rolling_std(values, lookback);
    values
        .iter()
        .zip(mean.iter().zip(std.iter()))
        .map(|(&v, (&m, &s))| {
            if v.is_nan() || m.is_nan() || s.is_nan() || s == 0.0 {
                f64::NAN
            } else {
                (v - m) / s
            }
        })
        .collect()
}
