//! loglik_optimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Hide Argmin's generic wiring behind small builders that apply
//! crate-level options: L-BFGS with either line search for the hand-built
//! estimator, and a Nelder–Mead simplex for the reference estimator.
//!
//! Conventions
//! -----------
//! - Builders never set the initial parameter vector of an L-BFGS run or
//!   the iteration bound; the runners in [`super::run`] own those.
//! - The simplex builder does place the initial vertices, because
//!   Nelder–Mead has no other way to receive a starting point.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::{MLEOptions, SimplexOptions},
        types::{
            Cost, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS, Simplex,
            Theta,
        },
    },
};

/// Absolute edge length used for coordinates that start at zero.
const ZERO_COORD_STEP: f64 = 2.5e-4;

pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let lbfgs = LbfgsHagerZhang::new(HagerZhangLS::new(), opts.memory());
    configure_lbfgs(lbfgs, opts)
}

pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let lbfgs = LbfgsMoreThuente::new(MoreThuenteLS::new(), opts.memory());
    configure_lbfgs(lbfgs, opts)
}

/// Apply the optional gradient and cost-change tolerances.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// Nelder–Mead simplex around `theta0`.
///
/// Vertex `i + 1` moves coordinate `i` by `initial_step` relative to its
/// magnitude (or by a small absolute step when the coordinate is zero).
pub fn build_simplex(theta0: &Theta, opts: &SimplexOptions) -> OptResult<Simplex> {
    let vertices = initial_simplex(theta0, opts.initial_step);
    Ok(Simplex::new(vertices).with_sd_tolerance(opts.sd_tolerance)?)
}

fn initial_simplex(theta0: &Theta, step: f64) -> Vec<Theta> {
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());
    for i in 0..theta0.len() {
        let mut v = theta0.clone();
        v[i] = if v[i] != 0.0 { v[i] * (1.0 + step) } else { ZERO_COORD_STEP };
        vertices.push(v);
    }
    vertices
}
