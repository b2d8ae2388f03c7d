//! loglik_optimizer::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types and solver aliases used by the
//! log-likelihood optimizer, so the rest of the crate stays agnostic to
//! `ndarray` and Argmin generics.
//!
//! Conventions
//! -----------
//! - `Theta` and `Grad` are column vectors whose length equals the number
//!   of free parameters of the model being fitted.
//! - `Cost` is the scalar `c(θ) = −ℓ(θ)` handed to Argmin; user-facing
//!   values are always reported as `ℓ`.
//! - `DEFAULT_LBFGS_MEM` is the usual L-BFGS history size; callers may
//!   override it through `MLEOptions::lbfgs_mem`.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    neldermead::NelderMead,
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Parameter vector `θ` for log-likelihood optimization.
pub type Theta = Array1<f64>;

/// Gradient vector `∇ℓ(θ)` or `∇c(θ)`, matching the shape of `Theta`.
pub type Grad = Array1<f64>;

/// Dense `n × n` Hessian for `n = Theta.len()`.
pub type Hessian = Array2<f64>;

/// Scalar objective value used by the optimizer.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver
/// (e.g. `"cost_count"`, `"gradient_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Hager–Zhang line search specialized to this crate’s numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to this crate’s numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

/// Derivative-free simplex solver over `Theta`.
pub type Simplex = NelderMead<Theta, Cost>;
