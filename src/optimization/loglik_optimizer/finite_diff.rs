//! Finite-difference helpers with error capture and post-hoc validation.
//!
//! - [`run_fd_diff`]: forward-difference gradient of a closure that parks
//!   its first failure in a `RefCell` instead of returning `Result`.
//! - [`central_gradient`]: central-difference gradient with a caller-chosen
//!   step, used where the objective is a sum over many observations and the
//!   default step would drown the derivative in rounding noise.
//! - [`compute_hessian`]: central-difference Hessian of a gradient closure,
//!   falling back to forward differences, symmetrized before return.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        types::Hessian,
        validation::{validate_grad, validate_hessian},
        Grad, Theta,
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Forward-difference gradient of `func` at `theta`.
///
/// Clears `closure_err`, differentiates, then surfaces any error the closure
/// recorded before validating the result.
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

/// Central-difference gradient of `func` at `theta` with step `step`.
///
/// Non-finite function values propagate into the returned gradient; callers
/// validate the result.
pub fn central_gradient<G: Fn(&Theta) -> f64>(theta: &Theta, func: &G, step: f64) -> Grad {
    let mut bumped = theta.clone();
    Grad::from_iter((0..theta.len()).map(|i| {
        let x = theta[i];
        bumped[i] = x + step;
        let up = func(&bumped);
        bumped[i] = x - step;
        let down = func(&bumped);
        bumped[i] = x;
        (up - down) / (2.0 * step)
    }))
}

/// Hessian of a scalar function given its gradient closure `f`.
///
/// Errors
/// ------
/// - `OptError::InvalidHessian` / `HessianDimMismatch` when neither the
///   central nor the forward estimate is a finite `n × n` matrix.
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut hess = theta.central_hessian(f);
    if validate_hessian(&hess, dim).is_err() {
        hess = theta.forward_hessian(f);
        validate_hessian(&hess, dim)?;
    }
    symmetrize_hess(&mut hess);
    Ok(hess)
}

fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptError;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Error propagation out of the FD closure.
    // - Hessian of a known quadratic and its symmetry.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // An error parked by the closure must be returned instead of a NaN
    // gradient.
    //
    // Given
    // -----
    // - A closure that records `OptError::ModelDomain` and yields NaN.
    //
    // Expect
    // ------
    // - `Err(OptError::ModelDomain { .. })`.
    fn run_fd_diff_propagates_closure_error() {
        let theta = array![1.0];
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |_: &Theta| {
            closure_err.replace(Some(OptError::ModelDomain { reason: "x".to_string() }.into()));
            f64::NAN
        };

        let err = run_fd_diff(&theta, &f, &closure_err).expect_err("closure error must surface");

        assert!(matches!(err, OptError::ModelDomain { .. }));
    }

    #[test]
    // Purpose
    // -------
    // `central_gradient` is exact for quadratics up to rounding.
    //
    // Given
    // -----
    // - f(x, y) = x² + 3xy + 2y² at (0.5, −0.2) with step 1e-4.
    //
    // Expect
    // ------
    // - ∇f = (2x + 3y, 3x + 4y) = (0.4, 0.7).
    fn central_gradient_matches_analytic_gradient() {
        let f = |t: &Theta| t[0] * t[0] + 3.0 * t[0] * t[1] + 2.0 * t[1] * t[1];

        let g = central_gradient(&array![0.5, -0.2], &f, 1e-4);

        assert_abs_diff_eq!(g[0], 0.4, epsilon = 1e-9);
        assert_abs_diff_eq!(g[1], 0.7, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // The Hessian of f(x, y) = x² + 3xy + 2y² is [[2, 3], [3, 4]].
    //
    // Given
    // -----
    // - Its analytic gradient closure at (0.5, −0.2).
    //
    // Expect
    // ------
    // - Entries match within FD error; matrix is exactly symmetric.
    fn compute_hessian_matches_quadratic_form() {
        let grad = |t: &Theta| array![2.0 * t[0] + 3.0 * t[1], 3.0 * t[0] + 4.0 * t[1]];

        let h = compute_hessian(&grad, &array![0.5, -0.2]).expect("hessian should be finite");

        assert_abs_diff_eq!(h[[0, 0]], 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(h[[0, 1]], 3.0, epsilon = 1e-5);
        assert_abs_diff_eq!(h[[1, 1]], 4.0, epsilon = 1e-5);
        assert_eq!(h[[0, 1]], h[[1, 0]]);
    }
}
