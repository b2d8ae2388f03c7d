//! fitted — immutable results of a GARCH fit and the operations they feed.
//!
//! A [`FittedModel`] is produced once per (series, spec) pair by one of the
//! estimators and never re-fit in place. It carries everything forecasting
//! and simulation need (parameters plus the last in-sample lags), so those
//! operations take `&self` only. AIC and BIC are recomputed from the stored
//! log-likelihood on every call.
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::warn;

use crate::volatility::{
    core::{
        forecasts::{forecast_recursion, ForecastResult},
        options::{ForecastOptions, InjectionOptions},
        params::GarchParams,
        simulation::{draw_innovations, hybrid_innovations, simulate_path, SimulatedPath},
        spec::ModelSpec,
        variance::{FilterOutput, LagState},
    },
    errors::{VolError, VolResult},
};

/// Back-end that produced a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Engine {
    /// θ-space L-BFGS estimator (`models::garch`).
    HandBuilt,
    /// Natural-space simplex estimator (`models::reference`).
    Reference,
}

impl Engine {
    pub const ALL: [Engine; 2] = [Engine::HandBuilt, Engine::Reference];

    pub fn name(self) -> &'static str {
        match self {
            Engine::HandBuilt => "hand-built",
            Engine::Reference => "reference",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Engine {
    type Err = VolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "hand-built" | "handbuilt" | "custom" => Ok(Engine::HandBuilt),
            "reference" | "rugarch" => Ok(Engine::Reference),
            _ => Err(VolError::EngineUnavailable {
                engine: s.to_string(),
                reason: "unknown engine name",
            }),
        }
    }
}

/// Akaike information criterion `−2ℓ + 2k`.
pub fn aic(log_likelihood: f64, k: usize) -> f64 {
    -2.0 * log_likelihood + 2.0 * k as f64
}

/// Bayesian information criterion `−2ℓ + ln(n)·k`.
pub fn bic(log_likelihood: f64, k: usize, n: usize) -> f64 {
    -2.0 * log_likelihood + (n as f64).ln() * k as f64
}

/// Fitted GARCH model.
///
/// Invariants
/// ----------
/// - `converged` implies a finite log-likelihood and stationary parameters.
/// - When the optimizer failed outright, `log_likelihood` is `NaN` and
///   `converged` is false; the starting parameters are kept for diagnostics.
/// - `sigma` and `std_residuals` have length `n_obs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedModel {
    spec: ModelSpec,
    params: GarchParams,
    log_likelihood: f64,
    converged: bool,
    status: String,
    iterations: usize,
    engine: Engine,
    n_obs: usize,
    sigma: Array1<f64>,
    std_residuals: Array1<f64>,
    #[serde(skip)]
    tail: Vec<LagState>,
    std_errors: Option<Array1<f64>>,
}

impl FittedModel {
    /// Assemble a fit from filtered output.
    pub(crate) fn new(
        params: GarchParams, filtered: FilterOutput, converged: bool, status: String,
        iterations: usize, engine: Engine, std_errors: Option<Array1<f64>>,
    ) -> Self {
        FittedModel {
            spec: params.spec,
            log_likelihood: filtered.log_likelihood,
            n_obs: filtered.sigma.len(),
            sigma: filtered.sigma,
            std_residuals: filtered.std_residuals,
            tail: filtered.tail,
            params,
            converged,
            status,
            iterations,
            engine,
            std_errors,
        }
    }

    /// A fit whose optimizer failed: the filtered starting point with its
    /// log-likelihood flagged as `NaN`.
    pub(crate) fn failed(
        params: GarchParams, filtered: FilterOutput, status: String, engine: Engine,
    ) -> Self {
        let mut fit = FittedModel::new(params, filtered, false, status, 0, engine, None);
        fit.log_likelihood = f64::NAN;
        fit
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn params(&self) -> &GarchParams {
        &self.params
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Optimizer termination status or failure message.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// Number of estimated parameters `k`.
    pub fn n_params(&self) -> usize {
        self.spec.n_params()
    }

    pub fn aic(&self) -> f64 {
        aic(self.log_likelihood, self.n_params())
    }

    pub fn bic(&self) -> f64 {
        bic(self.log_likelihood, self.n_params(), self.n_obs)
    }

    /// In-sample conditional volatility σ_t.
    pub fn sigma(&self) -> ArrayView1<'_, f64> {
        self.sigma.view()
    }

    /// In-sample conditional variance σ²_t.
    pub fn conditional_variance(&self) -> Array1<f64> {
        self.sigma.mapv(|s| s * s)
    }

    pub fn std_residuals(&self) -> ArrayView1<'_, f64> {
        self.std_residuals.view()
    }

    /// Last `max(p, q)` in-sample lags, oldest first.
    pub fn tail(&self) -> &[LagState] {
        &self.tail
    }

    /// Standard errors in [`ModelSpec::param_names`] order, when computed.
    pub fn std_errors(&self) -> Option<ArrayView1<'_, f64>> {
        self.std_errors.as_ref().map(|se| se.view())
    }

    /// `(name, estimate, standard error)` triples.
    pub fn coefficients(&self) -> Vec<(String, f64, Option<f64>)> {
        self.params
            .named()
            .into_iter()
            .enumerate()
            .map(|(i, (name, value))| (name, value, self.std_errors.as_ref().map(|se| se[i])))
            .collect()
    }

    /// Forecast `horizon` steps ahead.
    ///
    /// Errors
    /// ------
    /// - `VolError::InvalidHorizon` when `horizon == 0`.
    /// - `VolError::NonConvergence` for an unconverged fit unless
    ///   `opts.allow_unconverged` is set.
    /// - `VolError::NumericalDefect` for a non-positive forecast variance.
    pub fn forecast(&self, horizon: usize, opts: &ForecastOptions) -> VolResult<ForecastResult> {
        self.ensure_usable(opts)?;
        forecast_recursion(&self.params, &self.tail, horizon)
    }

    /// Simulate `horizon` steps driven by supplied standardized innovations.
    ///
    /// Errors
    /// ------
    /// - `VolError::InsufficientInnovations` when
    ///   `innovations.len() < horizon`.
    /// - `VolError::NumericalDefect` for a non-positive simulated variance.
    pub fn simulate(
        &self, innovations: ArrayView1<f64>, horizon: usize,
    ) -> VolResult<SimulatedPath> {
        simulate_path(&self.params, &self.tail, innovations, horizon)
    }

    /// Simulate with innovations drawn from the fitted law itself.
    pub fn simulate_seeded(&self, horizon: usize, seed: u64) -> VolResult<SimulatedPath> {
        let z = draw_innovations(&self.params.innovation, horizon, seed)?;
        self.simulate(z.view(), horizon)
    }

    /// Simulate with external innovations standardized and blended with
    /// seeded draws from the fitted law per `opts`. The horizon is the
    /// length of `external`.
    pub fn simulate_injected(
        &self, external: ArrayView1<f64>, seed: u64, opts: &InjectionOptions,
    ) -> VolResult<SimulatedPath> {
        let z = hybrid_innovations(external, &self.params.innovation, seed, opts)?;
        self.simulate(z.view(), z.len())
    }

    fn ensure_usable(&self, opts: &ForecastOptions) -> VolResult<()> {
        if self.converged {
            return Ok(());
        }
        if !opts.allow_unconverged {
            return Err(VolError::NonConvergence {
                reason: format!(
                    "{} fit by the {} engine did not converge ({}); \
                     set allow_unconverged to forecast anyway",
                    self.spec, self.engine, self.status
                ),
            });
        }
        warn!(
            spec = %self.spec,
            engine = %self.engine,
            status = %self.status,
            "forecasting an unconverged fit"
        );
        Ok(())
    }
}
