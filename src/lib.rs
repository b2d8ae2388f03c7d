//! rust_volatility — GARCH-family volatility estimation, forecasting and
//! simulation behind a back-end-agnostic engine facade.
//!
//! Purpose
//! -------
//! Fit conditional-variance models (sGARCH, GJR-GARCH, eGARCH, TGARCH) to
//! return series by maximum likelihood, produce multi-step volatility
//! forecasts, and simulate return paths driven by either the fitted
//! innovation law or externally supplied innovation sequences.
//!
//! Key behaviors
//! -------------
//! - [`engine::EngineSelector`] routes fit / converged / forecast / path to a
//!   hand-built L-BFGS estimator or a derivative-free reference estimator
//!   (feature `reference-engine`). Results have the same shape either way.
//! - Forecasting and simulation refuse unconverged fits unless explicitly
//!   overridden.
//! - Fits flatten into [`engine::FitRecord`] rows with stable columns for
//!   downstream reporting.
//!
//! Invariants & assumptions
//! ------------------------
//! - Input series are validated once ([`volatility::core::ReturnSeries`]);
//!   missing values are rejected, never imputed.
//! - A fitted model is immutable; every forecast or simulation reads it
//!   without mutation, so independent fits can run on separate threads.
//! - Randomness always flows from an explicit seed.
//!
//! Conventions
//! -----------
//! - Errors are layered: `optimization::errors::OptError` inside the
//!   solvers and `volatility::errors::VolError` everywhere else, with
//!   [`volatility::errors::ErrorKind`] as the caller-facing taxonomy.
//! - Logging goes through `tracing` events; the crate never installs a
//!   subscriber.
//!
//! Downstream usage
//! ----------------
//! ```no_run
//! use rust_volatility::prelude::*;
//! # fn main() -> Result<(), VolError> {
//! # let returns = ndarray::Array1::<f64>::zeros(0);
//! let series = ReturnSeries::new(returns)?;
//! let spec = ModelSpec::garch11(GarchVariant::GjrGarch, DistributionKind::StudentT);
//! let selector = EngineSelector::default();
//!
//! let fit = selector.fit(Engine::HandBuilt, &series, &spec)?;
//! let forecast = selector.forecast(Engine::HandBuilt, &fit, 10, &ForecastOptions::default())?;
//! let path = fit.simulate_seeded(250, 7)?;
//! # let _ = (forecast, path);
//! # Ok(())
//! # }
//! ```
//!
//! Testing notes
//! -------------
//! - Unit tests live next to the code they cover.
//! - `tests/` drives the public API end-to-end on seeded synthetic series,
//!   including the cross-engine log-likelihood check.

pub mod engine;
pub mod evaluation;
pub mod inference;
pub mod optimization;
pub mod volatility;

pub mod prelude {
    pub use crate::engine::{CrossCheck, EngineSelector, FitRecord, VolatilityEngine};
    pub use crate::evaluation::{rolling_evaluation, RollingOptions};
    pub use crate::volatility::prelude::*;
}
