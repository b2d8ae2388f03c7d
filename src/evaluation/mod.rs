//! evaluation — out-of-sample scoring of fitted volatility models.
//!
//! - [`metrics`]: MSE / MAE of variance forecasts, parametric VaR and the
//!   Kupiec proportion-of-failures backtest.
//! - [`distance`]: two-sample Kolmogorov–Smirnov and 1-D Wasserstein
//!   distances between innovation samples.
//! - [`rolling`]: rolling-origin refits through any registered engine.
pub mod distance;
pub mod metrics;
pub mod rolling;

pub use self::distance::{ks_two_sample, wasserstein_1d, KsOutcome};
pub use self::metrics::{
    count_violations, forecast_accuracy, kupiec_pof, realized_variance, value_at_risk,
    var_backtest, ForecastAccuracy, VarBacktest, VAR_LEVELS,
};
pub use self::rolling::{rolling_evaluation, RollingEvaluation, RollingOptions, WindowScore};
