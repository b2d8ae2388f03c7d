//! models — GARCH estimators and the fitted-model record they produce.
//!
//! Purpose
//! -------
//! Sit on top of `volatility::core` and turn a [`ModelSpec`] plus a
//! [`ReturnSeries`] into a [`FittedModel`]. Two estimators are provided:
//!
//! - [`GarchModel`] (hand-built): maximizes the log-likelihood over an
//!   unconstrained θ with L-BFGS and computes standard errors.
//! - [`ReferenceModel`] (feature `reference-engine`): maximizes over the
//!   natural parameters with a derivative-free simplex.
//!
//! Invariants & assumptions
//! ------------------------
//! - Input validation happens when the [`ReturnSeries`] is built, before any
//!   optimization work.
//! - A failed optimizer run is reported as `converged = false` with a `NaN`
//!   log-likelihood, not as an error; only invariant violations after a
//!   claimed convergence surface as `VolError::NumericalDefect`.
//! - Both estimators use the same filter, so their log-likelihoods are
//!   directly comparable.
//!
//! [`ModelSpec`]: crate::volatility::core::spec::ModelSpec
//! [`ReturnSeries`]: crate::volatility::core::data::ReturnSeries

pub mod fitted;
pub mod garch;
#[cfg(feature = "reference-engine")]
pub mod reference;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::fitted::{aic, bic, Engine, FittedModel};
pub use self::garch::GarchModel;
#[cfg(feature = "reference-engine")]
pub use self::reference::ReferenceModel;

pub mod prelude {
    pub use super::fitted::{Engine, FittedModel};
    pub use super::garch::GarchModel;
}
