//! Portfolio construction — wide tables, risk caps, volatility targeting.

pub mod constructor;
pub mod risk_caps;
pub mod vol_targeting;

pub use constructor::{
    align_asset_returns, build_portfolio_returns, mask_returns_where_undefined,
};
pub use risk_caps::{apply_all_risk_caps, RiskCapConfig, SectorMap, HOLDING_THRESHOLD};
pub use vol_targeting::{
    apply_vol_targeting, leverage_series, rolling_portfolio_volatility, VolTargetConfig,
    TRADING_DAYS_PER_YEAR,
};
