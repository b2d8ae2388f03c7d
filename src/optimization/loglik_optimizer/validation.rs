//! Validation helpers for log-likelihood optimization.
//!
//! - Tolerance checks ([`verify_tol_grad`], [`verify_tol_cost`]).
//! - Shape and finiteness checks for gradients, estimates, objective values
//!   and Hessians.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{types::Hessian, Grad, Theta},
};

fn positive_finite(tol: f64) -> Result<(), &'static str> {
    if !tol.is_finite() {
        Err("Tolerance must be finite.")
    } else if tol <= 0.0 {
        Err("Tolerance must be positive.")
    } else {
        Ok(())
    }
}

pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    match tol {
        Some(tol) => positive_finite(tol).map_err(|reason| OptError::InvalidTolGrad { tol, reason }),
        None => Ok(()),
    }
}

pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    match tol {
        Some(tol) => positive_finite(tol).map_err(|reason| OptError::InvalidTolCost { tol, reason }),
        None => Ok(()),
    }
}

/// Gradient must have length `dim` and only finite entries.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    match grad.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(OptError::InvalidGradient {
            index,
            value: grad[index],
            reason: "Gradient elements must be finite.",
        }),
        None => Ok(()),
    }
}

pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let theta = theta_hat.ok_or(OptError::MissingThetaHat)?;
    if let Some(index) = theta.iter().position(|v| !v.is_finite()) {
        return Err(OptError::InvalidThetaHat {
            index,
            value: theta[index],
            reason: "Parameter estimates must be finite.",
        });
    }
    Ok(theta)
}

pub fn validate_value(value: f64) -> OptResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(OptError::NonFiniteCost { value })
    }
}

pub fn validate_hessian(hessian: &Hessian, dim: usize) -> OptResult<()> {
    if hessian.nrows() != dim || hessian.ncols() != dim {
        return Err(OptError::HessianDimMismatch {
            expected: dim,
            found: (hessian.nrows(), hessian.ncols()),
        });
    }
    for ((row, col), &value) in hessian.indexed_iter() {
        if !value.is_finite() {
            return Err(OptError::InvalidHessian { row, col, value });
        }
    }
    Ok(())
}
