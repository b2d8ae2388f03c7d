//! Multi-step forecasting of the conditional mean and volatility.
//!
//! Purpose
//! -------
//! Roll a fitted recursion forward from its last in-sample lags, replacing
//! every unknown future shock by its conditional expectation. The result is
//! a [`ForecastResult`] with one mean and one σ per step.
//!
//! Key behaviors
//! -------------
//! - The first step uses the last realized shock, so the one-step forecast
//!   is exact given the sample.
//! - Later steps use expected shock terms (see `variance`), so for a
//!   stationary model the σ path converges monotonically to the long-run
//!   level returned by `GarchParams::long_run_sigma`.
//! - A forecast variance that is not finite and strictly positive is a
//!   `VolError::NumericalDefect`; values are never floored.
//!
//! Conventions
//! -----------
//! - TGARCH forecasts propagate `E[σ]`; eGARCH forecasts propagate
//!   `E[ln σ²]`. For sGARCH and GJR the propagated state is the variance.
//! - The mean path is the constant `μ` (zero under `MeanSpec::Zero`).
use ndarray::Array1;
use serde::Serialize;

use crate::volatility::{
    core::{
        params::GarchParams,
        validation::validate_horizon,
        variance::{LagState, Recursion},
    },
    errors::{VolError, VolResult},
};

/// ForecastResult — h-step-ahead mean and volatility paths.
///
/// Purpose
/// -------
/// Hold the output of [`forecast_recursion`] in a form that downstream
/// scoring (MSE/MAE, VaR) and reporting can consume without touching the
/// recursion again.
///
/// Fields
/// ------
/// - `horizon`: `usize`
///   Number of forecast steps `H ≥ 1`.
/// - `mean_path`: `Array1<f64>`
///   Conditional mean for steps `1..=H`; constant `μ` for the supported
///   mean specifications.
/// - `sigma_path`: `Array1<f64>`
///   Forecast conditional standard deviation `σ̂_{T+h}` at index `h − 1`.
///
/// Invariants
/// ----------
/// - `mean_path.len() == sigma_path.len() == horizon`.
/// - Every `sigma_path` entry is finite and strictly positive; a value that
///   is not is reported as an error by the producer, never stored.
///
/// Notes
/// -----
/// - For TGARCH and eGARCH, `sigma_path` is derived from the propagated
///   state (`E[σ]` and `E[ln σ²]` respectively), so `σ̂²` is the square of
///   that value rather than an expected variance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub horizon: usize,
    pub mean_path: Array1<f64>,
    pub sigma_path: Array1<f64>,
}

impl ForecastResult {
    /// Forecast variances `σ̂²_h`.
    ///
    /// Returns
    /// -------
    /// Array1<f64>
    ///   Element-wise square of `sigma_path`, length `horizon`.
    pub fn variance_path(&self) -> Array1<f64> {
        self.sigma_path.mapv(|s| s * s)
    }
}

/// Roll the fitted recursion forward `horizon` steps from the sample end.
///
/// Parameters
/// ----------
/// - `params`: `&GarchParams`
///   Fitted model-space parameters. Stationarity is not required here;
///   convergence and stationarity gating happen on `FittedModel::forecast`.
/// - `tail`: `&[LagState]`
///   Last `max(p, q)` in-sample lags, oldest first. Each entry carries the
///   realized shock `ε`, the recursion state, and σ.
/// - `horizon`: `usize`
///   Number of steps `H ≥ 1`.
///
/// Returns
/// -------
/// VolResult<ForecastResult>
///   - `Ok(result)` with mean and σ for steps `1..=H`.
///   - `Err(err)` for invalid inputs or a numerical defect.
///
/// Errors
/// ------
/// - `VolError::InvalidHorizon` when `horizon == 0`.
/// - `VolError::LengthMismatch` when `tail` is shorter than `max(p, q)`.
/// - `VolError::NumericalDefect { step, value, .. }` when a forecast
///   variance is not finite and strictly positive.
///
/// Notes
/// -----
/// - Step 1 uses the realized shocks in `tail`; from step 2 on, each
///   future shock enters through its expectation under the fitted
///   innovation law (`E[z²] = 1`, `E[z²𝟙(z<0)]`, `E|z|`, ...).
/// - The loop appends to a history buffer sized `tail.len() + H` once, so
///   no reallocation happens while rolling forward.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use rust_volatility::volatility::core::{
/// #     forecasts::forecast_recursion,
/// #     params::GarchParams,
/// #     spec::{DistributionKind, GarchVariant, ModelSpec},
/// #     variance::LagState,
/// # };
/// let spec = ModelSpec::garch11(GarchVariant::SGarch, DistributionKind::Normal);
/// let params = GarchParams::from_vector(&spec, array![0.0, 1e-6, 0.1, 0.85].view()).unwrap();
/// let tail = [LagState { eps: Some(0.03), state: 2e-4, sigma: 2e-4f64.sqrt() }];
///
/// let f = forecast_recursion(&params, &tail, 5).unwrap();
/// assert_eq!(f.sigma_path.len(), 5);
/// assert!(f.sigma_path.iter().all(|s| *s > 0.0));
/// ```
pub fn forecast_recursion(
    params: &GarchParams, tail: &[LagState], horizon: usize,
) -> VolResult<ForecastResult> {
    validate_horizon(horizon)?;
    let rec = Recursion::new(params)?;
    if tail.len() < rec.max_lag() {
        return Err(VolError::LengthMismatch { expected: rec.max_lag(), found: tail.len() });
    }

    let mut history: Vec<LagState> = Vec::with_capacity(tail.len() + horizon);
    history.extend_from_slice(tail);
    let mut sigma_path = Array1::<f64>::zeros(horizon);

    for (k, slot) in sigma_path.iter_mut().enumerate() {
        let state = rec.next_state(&history);
        let sigma = rec.sigma(state);
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(VolError::NumericalDefect {
                step: k + 1,
                value: rec.variance(state),
                reason: "forecast variance is not finite and positive",
            });
        }
        *slot = sigma;
        history.push(LagState { eps: None, state, sigma });
    }

    Ok(ForecastResult {
        horizon,
        mean_path: Array1::from_elem(horizon, params.mu),
        sigma_path,
    })
}
