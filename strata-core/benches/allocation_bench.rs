//! Benchmark for the allocation hot path: inverse-vol weighting plus the
//! full risk-cap stack over a multi-year, multi-asset frame.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strata_core::allocators::{inverse_volatility_weights, InverseVolParams};
use strata_core::domain::Frame;
use strata_core::portfolio::risk_caps::{apply_all_risk_caps, RiskCapConfig, SectorMap};

const N_DAYS: usize = 2_520; // ten years
const N_ASSETS: usize = 12;

fn synthetic_returns() -> Frame {
    let base = NaiveDate::from_ymd_opt(2014, 1, 2).unwrap();
    let dates: Vec<NaiveDate> = (0..N_DAYS)
        .map(|i| base + chrono::Duration::days(i as i64))
        .collect();

    let columns: Vec<(String, Vec<f64>)> = (0..N_ASSETS)
        .map(|asset| {
            let values: Vec<f64> = (0..N_DAYS)
                .map(|day| {
                    let seed = ((asset * N_DAYS + day) as u64)
                        .wrapping_mul(6364136223846793005)
                        .wrapping_add(1442695040888963407);
                    let uniform = ((seed >> 33) % 10_000) as f64 / 10_000.0 - 0.5;
                    uniform * 0.02 * (1.0 + asset as f64 / 4.0)
                })
                .collect();
            (format!("A{asset}"), values)
        })
        .collect();

    Frame::from_columns(dates, columns).unwrap()
}

fn sector_map() -> SectorMap {
    (0..N_ASSETS)
        .map(|i| (format!("A{i}"), format!("sector{}", i % 4)))
        .collect()
}

fn bench_allocation(c: &mut Criterion) {
    let returns = synthetic_returns();
    let params = InverseVolParams {
        lookback: 60,
        max_weight: 0.25,
        ..InverseVolParams::default()
    };

    c.bench_function("inverse_vol_10y_12_assets", |b| {
        b.iter(|| inverse_volatility_weights(black_box(&returns), &params).unwrap())
    });

    let weights = inverse_volatility_weights(&returns, &params).unwrap();
    let sectors = sector_map();
    let cap_config = RiskCapConfig {
        max_weight_per_asset: 0.20,
        max_sector_weight: Some(0.40),
        min_assets_held: 6,
    };

    c.bench_function("risk_caps_10y_12_assets", |b| {
        b.iter(|| apply_all_risk_caps(black_box(&weights), &sectors, &cap_config).unwrap())
    });
}

criterion_group!(benches, bench_allocation);
criterion_main!(benches);
