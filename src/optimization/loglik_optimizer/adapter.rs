//! Adapters that expose a user `LogLikelihood` as an `argmin` problem.
//!
//! Both adapters turn the *maximization* of `ℓ(θ)` into the *minimization*
//! of `c(θ) = −ℓ(θ)`:
//!
//! - [`ArgMinAdapter`] serves gradient-based solvers. A rejected or
//!   non-finite evaluation is an error, which aborts the line search.
//! - [`RejectingAdapter`] serves derivative-free solvers. A domain
//!   rejection becomes `c(θ) = +∞`, so the simplex simply moves away from
//!   the inadmissible region; every other error still propagates.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        finite_diff::run_fd_diff,
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a user `LogLikelihood` to `argmin`'s `CostFunction` and `Gradient`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// `c(θ) = −ℓ(θ)`; a non-finite `ℓ` is reported as `NonFiniteCost`.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(-output)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Gradient of the cost at `θ`.
    ///
    /// - Analytic `∇ℓ` from the model is validated and negated.
    /// - Otherwise central differences of the cost are used, retrying with
    ///   forward differences when a cost evaluation failed or the central
    ///   estimate is not finite.
    ///
    /// The finite-difference closure must return `f64`, so the first error
    /// it meets is parked in `closure_err` and `NaN` is returned instead.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_none() && validate_grad(&fd_grad, dim).is_ok() {
                    return Ok(fd_grad);
                }
                Ok(run_fd_diff(theta, &cost_func, &closure_err)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Cost-only bridge for derivative-free solvers.
#[derive(Debug, Clone)]
pub struct RejectingAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> RejectingAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<'a, F: LogLikelihood> CostFunction for RejectingAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        match self.f.value(theta, self.data) {
            Ok(v) if v.is_finite() => Ok(-v),
            Ok(_) => Ok(f64::INFINITY),
            Err(e) if e.is_domain_rejection() => Ok(f64::INFINITY),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Sign convention of the cost and of finite-difference gradients.
    // - Domain rejections: error for `ArgMinAdapter`, `+∞` for
    //   `RejectingAdapter`.
    //
    // They intentionally DO NOT cover:
    // - Full solver runs (see `api` tests).
    // -------------------------------------------------------------------------

    /// ℓ(θ) = −(θ − 1)ᵀ(θ − 1), rejecting θ₀ < 0.
    struct Bowl;

    impl LogLikelihood for Bowl {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
            if theta[0] < 0.0 {
                return Err(OptError::ModelDomain { reason: "negative".to_string() });
            }
            Ok(-theta.iter().map(|t| (t - 1.0).powi(2)).sum::<f64>())
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // The cost is the negated log-likelihood and the FD gradient is the
    // gradient of the cost.
    //
    // Given
    // -----
    // - `Bowl` at θ = [2, 3].
    //
    // Expect
    // ------
    // - cost = 5, gradient ≈ [2, 4].
    fn cost_and_fd_gradient_follow_minimization_sign() {
        // Arrange
        let adapter = ArgMinAdapter::new(&Bowl, &());
        let theta = array![2.0, 3.0];

        // Act
        let c = adapter.cost(&theta).expect("cost should evaluate");
        let g = adapter.gradient(&theta).expect("gradient should evaluate");

        // Assert
        assert_abs_diff_eq!(c, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(g[0], 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(g[1], 4.0, epsilon = 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // Domain rejections abort gradient-based evaluation but read as `+∞`
    // for derivative-free evaluation.
    //
    // Given
    // -----
    // - θ = [−1, 0] for both adapters.
    //
    // Expect
    // ------
    // - `ArgMinAdapter::cost` errors; `RejectingAdapter::cost` is `+∞`.
    fn rejected_region_is_error_or_infinite_cost() {
        let theta = array![-1.0, 0.0];
        assert!(ArgMinAdapter::new(&Bowl, &()).cost(&theta).is_err());
        let c = RejectingAdapter::new(&Bowl, &()).cost(&theta).expect("rejection is a cost");
        assert!(c.is_infinite() && c > 0.0);
    }
}
