//! simulation — path simulation driven by supplied standardized innovations.
//!
//! Purpose
//! -------
//! Run a fitted recursion forward on a sequence of standardized innovations
//! `z_h`, producing simulated returns `r_h = μ + σ_h·z_h` and volatilities.
//! This is how innovations generated outside the model are spliced into
//! the variance dynamics learned during fitting.
//!
//! Key behaviors
//! -------------
//! - [`simulate_path`] seeds from the last in-sample lags; each step feeds
//!   the previous *simulated* shock `ε = σ·z` back into the recursion.
//! - [`draw_innovations`] produces innovations from a model's own law with
//!   an explicit seed; no process-wide random state is touched, so equal
//!   seeds give identical draws on any thread.
//! - [`standardize_innovations`] and [`blend_innovations`] prepare external
//!   sequences (zero mean, unit variance, hybrid mixing).
//!
//! Invariants & assumptions
//! ------------------------
//! - `innovations.len() >= horizon`; only the first `horizon` are used.
//! - Every simulated σ is finite and strictly positive, otherwise
//!   `VolError::NumericalDefect` is returned.
//! - External innovations are expected to have mean ≈ 0 and variance ≈ 1;
//!   this module does not enforce it unless asked to standardize.
use ndarray::{Array1, ArrayView1};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use crate::volatility::{
    core::{
        innovations::Innovation,
        options::InjectionOptions,
        params::GarchParams,
        validation::validate_innovations,
        variance::{LagState, Recursion},
    },
    errors::{VolError, VolResult},
};

/// Simulated returns and volatilities, one entry per step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatedPath {
    pub returns: Array1<f64>,
    pub sigma: Array1<f64>,
}

impl SimulatedPath {
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

/// Simulate `horizon` steps from the in-sample `tail`.
///
/// Errors
/// ------
/// - `VolError::InvalidHorizon`, `InsufficientInnovations`, or
///   `NonFiniteInnovation` for unusable inputs.
/// - `VolError::LengthMismatch` when `tail` is shorter than `max(p, q)`.
/// - `VolError::NumericalDefect { step, .. }` for a non-positive or
///   non-finite simulated variance.
pub fn simulate_path(
    params: &GarchParams, tail: &[LagState], innovations: ArrayView1<f64>, horizon: usize,
) -> VolResult<SimulatedPath> {
    validate_innovations(innovations, horizon)?;
    let rec = Recursion::new(params)?;
    if tail.len() < rec.max_lag() {
        return Err(VolError::LengthMismatch { expected: rec.max_lag(), found: tail.len() });
    }

    let mut history: Vec<LagState> = Vec::with_capacity(tail.len() + horizon);
    history.extend_from_slice(tail);
    let mut returns = Array1::<f64>::zeros(horizon);
    let mut sigma = Array1::<f64>::zeros(horizon);

    for (k, &z) in innovations.iter().take(horizon).enumerate() {
        let state = rec.next_state(&history);
        let s = rec.sigma(state);
        if !(s.is_finite() && s > 0.0) {
            return Err(VolError::NumericalDefect {
                step: k + 1,
                value: rec.variance(state),
                reason: "simulated variance is not finite and positive",
            });
        }
        let eps = s * z;
        returns[k] = params.mu + eps;
        sigma[k] = s;
        history.push(LagState { eps: Some(eps), state, sigma: s });
    }
    Ok(SimulatedPath { returns, sigma })
}

/// `n` innovations from `law`, reproducible from `seed`.
pub fn draw_innovations(law: &Innovation, n: usize, seed: u64) -> VolResult<Array1<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    law.sample(&mut rng, n)
}

/// Recentre and/or rescale an external innovation sequence.
///
/// Errors
/// ------
/// - `VolError::NonFiniteInnovation` for NaN/Inf entries.
/// - `VolError::InsufficientInnovations` when fewer than two values are
///   supplied and standardization is requested.
/// - `VolError::InvalidOption` when a constant sequence would have to be
///   rescaled.
pub fn standardize_innovations(
    z: ArrayView1<f64>, opts: &InjectionOptions,
) -> VolResult<Array1<f64>> {
    if let Some((index, &value)) = z.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(VolError::NonFiniteInnovation { index, value });
    }
    let mut out = z.to_owned();
    if !(opts.enforce_zero_mean || opts.enforce_unit_variance) {
        return Ok(out);
    }
    if z.len() < 2 {
        return Err(VolError::InsufficientInnovations { needed: 2, found: z.len() });
    }
    let n = z.len() as f64;
    let mean = z.sum() / n;
    if opts.enforce_zero_mean {
        out.mapv_inplace(|v| v - mean);
    }
    if opts.enforce_unit_variance {
        let sd = (z.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        if !(sd > 0.0) {
            return Err(VolError::InvalidOption {
                name: "innovation_sd",
                value: sd,
                reason: "a constant sequence cannot be rescaled to unit variance",
            });
        }
        out.mapv_inplace(|v| v / sd);
    }
    Ok(out)
}

/// Mix external and model innovations: `√w·z_ext + √(1−w)·z_model`.
///
/// For independent unit-variance inputs the blend keeps unit variance.
pub fn blend_innovations(
    external: ArrayView1<f64>, model: ArrayView1<f64>, weight: f64,
) -> VolResult<Array1<f64>> {
    if !(0.0..=1.0).contains(&weight) {
        return Err(VolError::InvalidOption {
            name: "hybrid_weight",
            value: weight,
            reason: "must lie in [0, 1]",
        });
    }
    if external.len() != model.len() {
        return Err(VolError::LengthMismatch { expected: external.len(), found: model.len() });
    }
    let (we, wm) = (weight.sqrt(), (1.0 - weight).sqrt());
    Ok(Array1::from_iter(external.iter().zip(model.iter()).map(|(e, m)| we * e + wm * m)))
}

/// Standardize `external` per `opts`, then blend it with seeded draws from
/// `law` using `opts.hybrid_weight`.
pub fn hybrid_innovations(
    external: ArrayView1<f64>, law: &Innovation, seed: u64, opts: &InjectionOptions,
) -> VolResult<Array1<f64>> {
    let ext = standardize_innovations(external, opts)?;
    let own = draw_innovations(law, ext.len(), seed)?;
    blend_innovations(ext.view(), own.view(), opts.hybrid_weight)
}
