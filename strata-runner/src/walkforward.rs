//! Walk-forward runner — sequences the full pipeline.
//!
//! Stage order: strategy intent -> realized returns (execution lag) ->
//! meta-allocation -> wide return table -> asset allocation -> [risk caps
//! pre] -> raw portfolio returns -> warmup masking -> vol targeting ->
//! [risk caps post] -> final returns -> trim to the requested window ->
//! drop residual undefined rows -> metrics.
//!
//! Every stage consumes complete tables and produces complete tables; a run
//! either finishes deterministically or fails with a typed error. Rerunning
//! with identical config and data produces bit-identical output.

use std::collections::BTreeMap;

use thiserror::Error;

use strata_core::domain::{DateSeries, PriceSeries};
use strata_core::error::{ConfigError, DataError, EngineError, FeasibilityError};
use strata_core::execution::{ExecutionTiming, IntentKind};
use strata_core::meta::build_meta_allocator;
use strata_core::portfolio::{
    align_asset_returns, apply_all_risk_caps, apply_vol_targeting, build_portfolio_returns,
    mask_returns_where_undefined,
};
use strata_core::strategies::build_strategy;

use crate::config::SystemConfig;
use crate::data_loader::{load_universe_csv, LoadError};
use crate::metrics::{self, MetricsBundle};
use crate::result::WalkforwardResult;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("feasibility error: {0}")]
    Feasibility(#[from] FeasibilityError),
    #[error("load error: {0}")]
    Load(#[from] LoadError),
}

impl From<EngineError> for RunError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Config(e) => RunError::Config(e),
            EngineError::Data(e) => RunError::Data(e),
            EngineError::Feasibility(e) => RunError::Feasibility(e),
        }
    }
}

/// Run a walk-forward backtest over pre-loaded, warmup-extended history.
///
/// `data` must cover at least `warmup_plan().total_trading_days` sessions
/// before the configured start date; the collaborator loading the data uses
/// [`WarmupPlan::history_start_date`](strata_core::WarmupPlan::history_start_date)
/// to know where to begin.
pub fn run_walkforward(
    config: &SystemConfig,
    data: &BTreeMap<String, PriceSeries>,
) -> Result<WalkforwardResult, RunError> {
    config.validate()?;
    let warmup = config.warmup_plan()?;
    let timing = ExecutionTiming::new(config.execution.clone());

    // Every configured symbol present, and every history on one index.
    let reference = reference_index(config, data)?;
    for symbol in &config.universe {
        let dates = data[symbol].dates();
        timing.validate_alignment(&reference, &[(symbol.as_str(), dates.as_slice())])?;
    }

    // The data's index positions are trading days: the requested window must
    // start at least `total_trading_days` positions in.
    let trim_idx = reference
        .iter()
        .position(|&d| d >= config.start_date)
        .unwrap_or(reference.len());
    if trim_idx < warmup.total_trading_days {
        let symbol = config.universe[0].clone();
        return Err(RunError::Data(DataError::InsufficientHistory {
            symbol,
            required: warmup.total_trading_days,
            available: trim_idx,
            start: config.start_date,
        }));
    }

    // Raw return series per asset, shared by every strategy.
    let raw_returns: BTreeMap<String, DateSeries> = config
        .universe
        .iter()
        .map(|symbol| {
            let series = &data[symbol];
            let returns = DateSeries::new(series.dates(), series.raw_returns().to_vec())?;
            Ok((symbol.clone(), returns))
        })
        .collect::<Result<_, DataError>>()?;

    // Strategy layer: intent -> validated -> realized returns -> warmup mask.
    let mut realized_by_strategy: BTreeMap<String, BTreeMap<String, DateSeries>> =
        BTreeMap::new();
    for strategy_config in &config.strategies {
        let strategy = build_strategy(strategy_config)?;
        let intent: BTreeMap<String, DateSeries> = config
            .universe
            .iter()
            .map(|symbol| (symbol.clone(), strategy.generate_intent(&data[symbol])))
            .collect();
        timing.validate_intent(&intent, IntentKind::Discrete)?;

        let realized = timing.compute_realized_returns(&intent, &raw_returns, None)?;
        let masked: BTreeMap<String, DateSeries> = realized
            .into_iter()
            .map(|(symbol, series)| (symbol, series.mask_prefix(strategy.warmup_period())))
            .collect();
        realized_by_strategy.insert(strategy.name().to_string(), masked);
    }

    // Meta layer: blend strategies per asset (bypassed for a single strategy).
    let combined_by_asset: BTreeMap<String, DateSeries> = if config.strategies.len() == 1 {
        realized_by_strategy
            .into_values()
            .next()
            .expect("exactly one strategy")
    } else {
        let meta_config = config
            .meta_allocator
            .as_ref()
            .expect("validate() requires a meta-allocator for multiple strategies");
        let meta = build_meta_allocator(meta_config)?;
        let mut combined = BTreeMap::new();
        for symbol in &config.universe {
            let per_strategy: BTreeMap<String, DateSeries> = realized_by_strategy
                .iter()
                .map(|(name, by_asset)| (name.clone(), by_asset[symbol].clone()))
                .collect();
            let allocation = meta.allocate(&per_strategy)?;
            combined.insert(symbol.clone(), allocation.combined_returns);
        }
        combined
    };

    // Wide tables. The allocator sees raw price returns, not strategy
    // output: risk-based sizing is independent of the signal layer, which is
    // what lets its warmup run in parallel with the strategies'.
    let asset_returns = align_asset_returns(&combined_by_asset, &config.universe)?;
    let raw_returns_wide = align_asset_returns(&raw_returns, &config.universe)?;
    let allocator_weights = config.allocator.compute_weights(&raw_returns_wide)?;

    // Pre-leverage caps.
    let capped_weights = if config.cap_mode.applies_pre_leverage() {
        apply_all_risk_caps(&allocator_weights, &config.sector_map, &config.risk_caps)?
    } else {
        allocator_weights.clone()
    };

    // Raw portfolio returns, masked wherever the weights or the strategy
    // returns are still undefined so the vol window never sees artificial
    // zeros from half-warmed rows.
    let raw_portfolio = build_portfolio_returns(&asset_returns, &capped_weights)?;
    let raw_portfolio = mask_returns_where_undefined(&raw_portfolio, &capped_weights);
    let raw_portfolio = mask_returns_where_undefined(&raw_portfolio, &asset_returns);

    // Vol targeting, then post-leverage caps.
    let vol_targeted =
        apply_vol_targeting(&raw_portfolio, &capped_weights, &config.vol_targeting)?;
    let final_weights = if config.cap_mode.applies_post_leverage() {
        apply_all_risk_caps(&vol_targeted, &config.sector_map, &config.risk_caps)?
    } else {
        vol_targeted.clone()
    };

    let final_returns = build_portfolio_returns(&asset_returns, &final_weights)?;
    let final_returns = mask_returns_where_undefined(&final_returns, &final_weights);
    let final_returns = mask_returns_where_undefined(&final_returns, &asset_returns);

    // Trim to [first session >= start_date, end_date], then drop residual
    // rows with undefined weights (warmup slack, data gaps).
    let end_idx = reference
        .iter()
        .position(|&d| d > config.end_date)
        .unwrap_or(reference.len());
    let keep: Vec<usize> = (trim_idx..end_idx)
        .filter(|&row| !final_weights.row_has_nan(row) && !final_returns.get(row).is_nan())
        .collect();

    let daily_returns = select_series(&final_returns, &keep);
    let weights = final_weights.select_rows(&keep);
    let vol_targeted_weights = vol_targeted.select_rows(&keep);
    let raw_weights = capped_weights.select_rows(&keep);
    let allocator_weights = allocator_weights.select_rows(&keep);
    let asset_returns = asset_returns.select_rows(&keep);

    let equity_curve = metrics::equity_curve(&daily_returns);
    let drawdown = metrics::drawdown_series(&equity_curve);
    let bundle = MetricsBundle::compute(&daily_returns, &equity_curve, &weights, &asset_returns);

    let result = WalkforwardResult {
        run_id: config.run_id(),
        config: config.clone(),
        warmup,
        daily_returns,
        equity_curve,
        drawdown,
        weights,
        vol_targeted_weights,
        raw_weights,
        allocator_weights,
        asset_returns,
        metrics: bundle,
    };
    result.validate_alignment()?;
    Ok(result)
}

/// Convenience entry point: load CSV history from `dir`, then run.
pub fn run_walkforward_from_csv(
    config: &SystemConfig,
    dir: &std::path::Path,
) -> Result<WalkforwardResult, RunError> {
    let data = load_universe_csv(dir, &config.universe, None, Some(config.end_date))?;
    run_walkforward(config, &data)
}

fn reference_index(
    config: &SystemConfig,
    data: &BTreeMap<String, PriceSeries>,
) -> Result<Vec<chrono::NaiveDate>, DataError> {
    if config.universe.is_empty() {
        return Err(DataError::EmptyUniverse);
    }
    for symbol in &config.universe {
        if !data.contains_key(symbol) {
            return Err(DataError::MissingSymbol {
                symbol: symbol.clone(),
            });
        }
    }
    Ok(data[&config.universe[0]].dates())
}

fn select_series(series: &DateSeries, keep: &[usize]) -> DateSeries {
    let dates: Vec<chrono::NaiveDate> = keep.iter().map(|&i| series.dates()[i]).collect();
    let values: Vec<f64> = keep.iter().map(|&i| series.get(i)).collect();
    DateSeries::new(dates, values).expect("selection preserves pairing")
}
