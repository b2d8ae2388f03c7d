//! inference — post-estimation uncertainty for fitted volatility models.
//!
//! Purpose
//! -------
//! Compute observed-information covariance matrices and standard errors
//! at a maximum-likelihood estimate, and map them from the optimizer's
//! unconstrained θ-space to natural model parameters.
//!
//! Key behaviors
//! -------------
//! - [`calc_covariance`] / [`calc_standard_errors`]: eigen-based
//!   pseudoinverse of a finite-difference Hessian.
//! - [`jacobian`] / [`delta_method`]: carry a θ-space covariance through a
//!   reparameterization.
//!
//! Conventions
//! -----------
//! - All functions are pure: no logging, no global state. Failures are
//!   reported as `OptError`; the model layer decides whether a failed
//!   standard-error computation is fatal (it is not: it logs and stores
//!   `None`).

pub mod hessian;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::hessian::{
    calc_covariance, calc_standard_errors, delta_method, jacobian, standard_errors,
};

pub mod prelude {
    pub use super::hessian::{calc_covariance, calc_standard_errors, delta_method};
}
