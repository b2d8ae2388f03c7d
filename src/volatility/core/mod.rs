//! core — shared GARCH data, parameters, recursions, forecasts and paths.
//!
//! Purpose
//! -------
//! Collect the building blocks of the volatility stack: validated return
//! series, model descriptors, innovation laws, parameter containers with
//! their θ-space mapping, the variance recursions, and the forecasting and
//! path-simulation routines that reuse them. Estimators in
//! `volatility::models` and the engine facade build on these primitives.
//!
//! Key behaviors
//! -------------
//! - Describe models with [`ModelSpec`] ([`GarchVariant`], [`ModelOrder`],
//!   [`DistributionKind`], [`MeanSpec`]) and hold fitted values in
//!   [`GarchParams`].
//! - Evaluate every variant through one step function ([`Recursion`]) used
//!   by the likelihood filter ([`filter`]), the forecaster
//!   ([`forecast_recursion`]) and the simulator ([`simulate_path`]).
//! - Provide innovation laws ([`Innovation`]) with densities, moments,
//!   quantiles and seeded sampling.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`ReturnSeries`] holds at least 30 finite values.
//! - Successfully constructed [`GarchParams`] satisfy the coefficient
//!   domain of their variant; stationarity is checked separately with
//!   [`GarchParams::is_stationary`].
//! - Non-positive or non-finite variances are never clamped: fitting sees
//!   `VolError::NonPositiveVariance`, forecasting and simulation see
//!   `VolError::NumericalDefect`.
//!
//! Conventions
//! -----------
//! - Indexing is 0-based; lag buffers hold the oldest entry first.
//! - Parameter vectors follow [`ModelSpec::param_names`] order.
//! - This module performs no I/O and no logging.

pub mod data;
pub mod forecasts;
pub mod init;
pub mod innovations;
pub mod options;
pub mod params;
pub mod simulation;
pub mod spec;
pub mod validation;
pub mod variance;

pub use self::data::{ReturnSeries, MIN_OBSERVATIONS};
pub use self::forecasts::{forecast_recursion, ForecastResult};
pub use self::init::VarianceInit;
pub use self::innovations::{Innovation, InnovationMoments};
pub use self::options::{FitOptions, ForecastOptions, InjectionOptions};
pub use self::params::{GarchParams, ThetaScale};
pub use self::simulation::{
    blend_innovations, draw_innovations, hybrid_innovations, simulate_path,
    standardize_innovations, SimulatedPath,
};
pub use self::spec::{DistributionKind, GarchVariant, MeanSpec, ModelOrder, ModelSpec};
pub use self::variance::{filter, log_likelihood, FilterOutput, LagState, Recursion};

pub mod prelude {
    pub use super::{
        DistributionKind, FitOptions, ForecastOptions, ForecastResult, GarchParams, GarchVariant,
        Innovation, MeanSpec, ModelOrder, ModelSpec, ReturnSeries, SimulatedPath, VarianceInit,
    };
}
