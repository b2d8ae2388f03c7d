//! High-level entry points for maximizing a user-provided `LogLikelihood`.
//!
//! - [`maximize`]: L-BFGS with Hager–Zhang or More–Thuente line search over
//!   an [`ArgMinAdapter`]; used by the hand-built volatility estimator.
//! - [`maximize_simplex`]: derivative-free Nelder–Mead over a
//!   [`RejectingAdapter`]; used by the reference estimator.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        adapter::{ArgMinAdapter, RejectingAdapter},
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente, build_simplex},
        run::{run_lbfgs, run_simplex},
        traits::{LineSearcher, LogLikelihood, MLEOptions, SimplexOptions},
        OptimOutcome, Theta,
    },
};

/// Maximize `ℓ(θ)` using L-BFGS with the configured line search.
///
/// # Behavior
/// - Validates the initial guess via `f.check(theta0, data)`.
/// - Minimizes `c(θ) = −ℓ(θ)` and reports results in terms of `ℓ`.
///
/// # Errors
/// - Propagates `f.check`, builder, and runtime errors (e.g. a line search
///   that leaves the admissible region).
///
/// # Example
/// ```
/// use ndarray::{array, Array1};
/// use rust_volatility::optimization::errors::OptResult;
/// use rust_volatility::optimization::loglik_optimizer::{maximize, LogLikelihood, MLEOptions};
///
/// struct Quadratic;
/// impl LogLikelihood for Quadratic {
///     type Data = ();
///     fn value(&self, theta: &Array1<f64>, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Array1<f64>, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Quadratic, array![0.5, -0.3], &(), &MLEOptions::default())?;
/// assert!(out.theta_hat.iter().all(|t| t.abs() < 1e-3));
/// # Ok::<(), rust_volatility::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}

/// Maximize `ℓ(θ)` with a Nelder–Mead simplex started around `theta0`.
///
/// Domain rejections inside the model are treated as `ℓ = −∞`, so the
/// search never needs a gradient and never leaves through an error unless
/// the model fails for a non-domain reason.
pub fn maximize_simplex<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &SimplexOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let solver = build_simplex(&theta0, opts)?;
    run_simplex(opts, RejectingAdapter::new(f, data), solver)
}
