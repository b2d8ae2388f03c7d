//! loglik_optimizer — argmin-powered log-likelihood maximization.
//!
//! Purpose
//! -------
//! Provide the optimization layer for **maximizing log-likelihoods** `ℓ(θ)`.
//! Callers implement a single trait, [`LogLikelihood`], and invoke either
//! [`maximize`] (L-BFGS with a configurable line search and
//! finite-difference fallbacks) or [`maximize_simplex`] (derivative-free
//! Nelder–Mead that treats inadmissible θ as infinite cost).
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer always maximizes `ℓ(θ)` by minimizing `c(θ) = −ℓ(θ)`;
//!   models implement `ℓ` and optionally `∇ℓ`, never the cost.
//! - [`LogLikelihood::value`] reports invalid θ as an [`OptError`], never a
//!   panic.
//! - An exhausted iteration budget is reported as `converged = false`, not
//!   as an error.
//!
//! Downstream usage
//! ----------------
//! - The hand-built GARCH estimator maps θ through softplus/softmax
//!   transforms and calls [`maximize`].
//! - The reference GARCH estimator works on natural parameters and calls
//!   [`maximize_simplex`].
//! - `inference::hessian` uses [`finite_diff::compute_hessian`].
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover sign conventions, tolerance wiring,
//!   termination mapping, and toy problems for both runners.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{maximize, maximize_simplex};
pub use self::traits::{
    LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, SimplexOptions, Tolerances,
};
pub use self::types::{Cost, FnEvalMap, Grad, Theta, DEFAULT_LBFGS_MEM};

pub mod prelude {
    pub use super::api::{maximize, maximize_simplex};
    pub use super::traits::{
        LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, SimplexOptions, Tolerances,
    };
    pub use super::types::{Cost, Grad, Theta};
}
