//! numerical_stability — guarded transforms between θ-space and model space.
//!
//! Purpose
//! -------
//! Collect the numerically stable scalar and vector transforms that the
//! volatility models use to keep optimizer parameters unconstrained while
//! guaranteeing positivity (ω, ν − 2, ξ) and strict stationarity
//! (persistence budgets on a scaled simplex).
//!
//! Conventions
//! -----------
//! - Every function here is pure and allocation-free except
//!   [`softmax_logits`], which builds starting values once per fit.
//! - Margins and floors are module-level constants so model code and tests
//!   agree on the exact boundary.

pub mod transformations;

pub use self::transformations::{
    safe_softmax, safe_softplus, safe_softplus_inv, softmax_logits, EIGEN_EPS,
    MIN_SIMPLEX_WEIGHT, STATIONARITY_MARGIN,
};

pub mod prelude {
    pub use super::transformations::{
        safe_softmax, safe_softplus, safe_softplus_inv, softmax_logits, STATIONARITY_MARGIN,
    };
}
