//! optimization — MLE stack, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer for volatility-model fitting: an
//! Argmin-backed log-likelihood optimizer, numerically stable parameter
//! transforms, and a single error/result surface. Model code implements a
//! log-likelihood, chooses tolerances, and obtains fitted parameters and
//! diagnostics without touching backend solver details.
//!
//! Conventions
//! -----------
//! - All solvers maximize `ℓ(θ)` by minimizing `c(θ) = −ℓ(θ)`; user-facing
//!   values are always expressed as `ℓ`.
//! - Public entrypoints that can fail return `OptResult<T>`; callers never
//!   see raw Argmin errors.
//! - This module does not log; the volatility layer reports progress
//!   through `tracing`, and the optional `obs_slog` feature attaches
//!   Argmin's own terminal observer.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
