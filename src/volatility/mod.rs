//! volatility — GARCH-family conditional-variance models.
//!
//! Purpose
//! -------
//! Estimate, forecast, and simulate sGARCH, GJR-GARCH, eGARCH and TGARCH
//! models of order `(p, q)` with normal, Student-t, or skewed Student-t
//! innovations.
//!
//! Layout
//! ------
//! - [`core`]: data, specs, innovation laws, parameters, the variance
//!   recursions, forecasting and path simulation.
//! - [`models`]: the hand-built and reference estimators and the
//!   [`FittedModel`](models::FittedModel) they produce.
//! - [`errors`]: [`VolError`](errors::VolError) and its
//!   [`ErrorKind`](errors::ErrorKind) taxonomy.
//!
//! Downstream usage
//! ----------------
//! Most callers go through `crate::engine::EngineSelector`, which picks an
//! estimator by name. Using [`models::GarchModel`] directly is equivalent to
//! selecting the hand-built engine.

pub mod core;
pub mod errors;
pub mod models;

pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::errors::{ErrorKind, VolError, VolResult};
    pub use super::models::prelude::*;
}
