//! variance — the conditional-variance recursions and the likelihood filter.
//!
//! Purpose
//! -------
//! Implement one step of every GARCH variant over a shared lag history and
//! use it to filter a return series into conditional volatilities and a
//! log-likelihood. The same step function drives fitting, forecasting, and
//! path simulation, so the three can never disagree about the dynamics.
//!
//! Key behaviors
//! -------------
//! - Each variant evolves its own state `h_t`: σ²_t (sGARCH, GJR),
//!   ln σ²_t (eGARCH), or σ_t (TGARCH). [`Recursion::sigma`] converts back.
//! - A lag whose shock is known contributes its realized term. A lag whose
//!   shock is unknown (pre-sample or forecast) contributes the conditional
//!   expectation of that term:
//!   - sGARCH: `α·σ²`
//!   - GJR: `(α + γ·E[z²𝟙(z<0)])·σ²`
//!   - eGARCH: `0`
//!   - TGARCH: `(α⁺ + α⁻)·(E|z|/2)·σ`
//! - [`filter`] seeds `max(p, q)` pre-sample lags from the resolved initial
//!   variance, then walks the series.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameters are validated [`GarchParams`]; this module never clamps.
//! - A state whose σ is not finite and strictly positive stops the filter
//!   with `VolError::NonPositiveVariance { index, value }`. The estimators
//!   treat that as a rejected parameter region.
//!
//! Conventions
//! -----------
//! - `ε_t = r_t − μ`, `z_t = ε_t / σ_t`.
//! - Log-likelihood: `ℓ = Σ_t [ln f(z_t) − ln σ_t]` with `f` the
//!   standardized innovation density.
use ndarray::Array1;

use crate::volatility::{
    core::{
        data::ReturnSeries,
        init::VarianceInit,
        innovations::InnovationMoments,
        params::GarchParams,
        spec::GarchVariant,
    },
    errors::{VolError, VolResult},
};

/// One entry of the lag history.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct LagState {
    /// Realized shock `ε`, `None` when only its expectation is known.
    pub eps: Option<f64>,
    /// Recursion state (σ², ln σ², or σ).
    pub state: f64,
    pub sigma: f64,
}

/// Step function bound to one parameter vector.
#[derive(Debug, Clone)]
pub struct Recursion<'a> {
    params: &'a GarchParams,
    moments: InnovationMoments,
}

impl<'a> Recursion<'a> {
    pub fn new(params: &'a GarchParams) -> VolResult<Self> {
        Ok(Recursion { params, moments: params.moments()? })
    }

    pub fn params(&self) -> &GarchParams {
        self.params
    }

    /// Number of lags the step reads.
    pub fn max_lag(&self) -> usize {
        self.params.spec.order.max_lag()
    }

    /// State corresponding to a variance.
    pub fn state_from_variance(&self, variance: f64) -> f64 {
        match self.params.spec.variant {
            GarchVariant::SGarch | GarchVariant::GjrGarch => variance,
            GarchVariant::EGarch => variance.ln(),
            GarchVariant::TGarch => variance.sqrt(),
        }
    }

    /// Variance implied by a state.
    pub fn variance(&self, state: f64) -> f64 {
        match self.params.spec.variant {
            GarchVariant::SGarch | GarchVariant::GjrGarch => state,
            GarchVariant::EGarch => state.exp(),
            GarchVariant::TGarch => state * state,
        }
    }

    /// σ implied by a state; `NaN` when the state has no valid σ.
    pub fn sigma(&self, state: f64) -> f64 {
        match self.params.spec.variant {
            GarchVariant::SGarch | GarchVariant::GjrGarch if state > 0.0 => state.sqrt(),
            GarchVariant::EGarch => (0.5 * state).exp(),
            GarchVariant::TGarch if state > 0.0 => state,
            _ => f64::NAN,
        }
    }

    /// `max(p, q)` lags with unknown shocks at the given variance.
    pub fn presample(&self, variance: f64) -> Vec<LagState> {
        let state = self.state_from_variance(variance);
        let lag = LagState { eps: None, state, sigma: self.sigma(state) };
        vec![lag; self.max_lag()]
    }

    /// Next state from the most recent lags (`history.last()` is lag 1).
    ///
    /// `history` must hold at least [`Recursion::max_lag`] entries.
    pub fn next_state(&self, history: &[LagState]) -> f64 {
        let par = self.params;
        let n = history.len();
        let mut h = par.omega;
        for (i, &a) in par.alpha.iter().enumerate() {
            let g = par.gamma.get(i).copied().unwrap_or(0.0);
            h += self.shock_term(a, g, &history[n - 1 - i]);
        }
        for (j, &b) in par.beta.iter().enumerate() {
            h += b * history[n - 1 - j].state;
        }
        h
    }

    fn shock_term(&self, a: f64, g: f64, lag: &LagState) -> f64 {
        let m = &self.moments;
        match (self.params.spec.variant, lag.eps) {
            (GarchVariant::SGarch, Some(e)) => a * e * e,
            (GarchVariant::SGarch, None) => a * lag.sigma * lag.sigma,
            (GarchVariant::GjrGarch, Some(e)) => (a + if e < 0.0 { g } else { 0.0 }) * e * e,
            (GarchVariant::GjrGarch, None) => (a + g * m.neg_sq_mean) * lag.sigma * lag.sigma,
            (GarchVariant::EGarch, Some(e)) => {
                let z = e / lag.sigma;
                a * (z.abs() - m.abs_mean) + g * z
            }
            (GarchVariant::EGarch, None) => 0.0,
            (GarchVariant::TGarch, Some(e)) => a * e.max(0.0) + g * (-e).max(0.0),
            (GarchVariant::TGarch, None) => (a + g) * 0.5 * m.abs_mean * lag.sigma,
        }
    }
}

/// In-sample output of the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutput {
    pub log_likelihood: f64,
    /// Conditional volatility σ_t.
    pub sigma: Array1<f64>,
    /// Residuals ε_t.
    pub residuals: Array1<f64>,
    /// Standardized residuals z_t.
    pub std_residuals: Array1<f64>,
    /// Last `max(p, q)` lags, oldest first; the starting point for
    /// forecasting and simulation.
    pub tail: Vec<LagState>,
}

/// Filter `series` through the recursion of `params`.
///
/// Errors
/// ------
/// - `VolError::InvalidInitVariance` from the initialization policy.
/// - `VolError::NonPositiveVariance { index, value }` at the first
///   observation whose σ is not finite and positive.
pub fn filter(
    params: &GarchParams, series: &ReturnSeries, init: &VarianceInit,
) -> VolResult<FilterOutput> {
    let rec = Recursion::new(params)?;
    let density = params.innovation.log_density()?;
    let n = series.len();
    let lag = rec.max_lag();

    let mut history = rec.presample(init.resolve(params, series)?);
    history.reserve(n);
    let mut sigma = Array1::<f64>::zeros(n);
    let mut residuals = Array1::<f64>::zeros(n);
    let mut std_residuals = Array1::<f64>::zeros(n);
    let mut log_likelihood = 0.0;

    for (t, &r) in series.values().iter().enumerate() {
        let state = rec.next_state(&history);
        let s = rec.sigma(state);
        if !(s.is_finite() && s > 0.0) {
            return Err(VolError::NonPositiveVariance { index: t, value: rec.variance(state) });
        }
        let eps = r - params.mu;
        let z = eps / s;
        log_likelihood += density.eval(z) - s.ln();
        sigma[t] = s;
        residuals[t] = eps;
        std_residuals[t] = z;
        history.push(LagState { eps: Some(eps), state, sigma: s });
    }

    let tail = history.split_off(history.len() - lag);
    Ok(FilterOutput { log_likelihood, sigma, residuals, std_residuals, tail })
}

/// Log-likelihood `ℓ(params | series)`.
pub fn log_likelihood(
    params: &GarchParams, series: &ReturnSeries, init: &VarianceInit,
) -> VolResult<f64> {
    Ok(filter(params, series, init)?.log_likelihood)
}
