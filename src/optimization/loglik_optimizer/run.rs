//! Execution helpers that run an `argmin` solver on a log-likelihood problem
//! and return a crate-friendly [`OptimOutcome`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        adapter::{ArgMinAdapter, RejectingAdapter},
        types::{Cost, Simplex},
        Grad, LogLikelihood, MLEOptions, OptimOutcome, SimplexOptions, Theta,
    },
};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{Executor, IterState, Solver, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Run an L-BFGS solver on the adapted problem.
///
/// Wires `theta0` and the iteration bound into the executor,
/// attaches a terminal observer when `obs_slog` is enabled and
/// `opts.verbose` is set, and converts the final state into an
/// [`OptimOutcome`] expressed in log-likelihood units.
///
/// # Errors
/// - Any `argmin` runtime error (line-search failure, cost error raised by
///   the model) converted through `From<argmin::core::Error>`.
/// - Validation errors while building the outcome (non-finite `θ̂` or `ℓ`).
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, Grad, (), (), (), Cost>>,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver).configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    let max_iter = opts.tols.max_iter as u64;
    optimizer = optimizer.configure(|state| state.max_iters(max_iter));

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    OptimOutcome::new(
        result.take_best_param(),
        -result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

/// Run a Nelder–Mead simplex on the rejecting adapter.
///
/// The simplex already carries the starting vertices; only the iteration
/// bound is configured here. A best cost of `+∞` (every vertex rejected)
/// surfaces as `OptError::NonFiniteCost`.
pub fn run_simplex<'a, F>(
    opts: &SimplexOptions, problem: RejectingAdapter<'a, F>, solver: Simplex,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
{
    let max_iter = opts.max_iter as u64;
    let mut result = Executor::new(problem, solver)
        .configure(|state| state.max_iters(max_iter))
        .run()?
        .state()
        .clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    OptimOutcome::new(
        result.take_best_param(),
        -result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        None,
    )
}

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: LogLikelihood,
{
    let ll0 = -problem.cost(theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: ell(theta0) = {:.6}{}",
        ll0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}
