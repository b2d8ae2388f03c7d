//! evaluation::rolling — rolling-origin out-of-sample evaluation.
//!
//! Purpose
//! -------
//! Refit a model on successive windows of a series and score each window's
//! forecast against the observations that follow it. The procedure is the
//! same for every engine because it only talks to an [`EngineSelector`].
//!
//! Key behaviors
//! -------------
//! - Origins start at 0 and advance by `step` while
//!   `origin + window + horizon <= n`.
//! - Each window is fitted independently; a window whose fit does not
//!   converge is recorded with `NaN` scores and excluded from the averages.
//!   No forecast is ever produced from an unconverged window.
//! - Scores are MSE / MAE of `σ̂²_h` against `(r − μ̂)²` plus VaR
//!   violation counts at [`VAR_LEVELS`](super::metrics::VAR_LEVELS),
//!   pooled across windows for a Kupiec test.
use ndarray::s;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    engine::{Engine, EngineSelector},
    evaluation::metrics::{
        count_violations, forecast_accuracy, kupiec_pof, realized_variance, VarBacktest,
        VAR_LEVELS,
    },
    volatility::{
        core::{data::ReturnSeries, options::ForecastOptions, spec::ModelSpec},
        errors::{VolError, VolResult},
    },
};

/// Window geometry for rolling evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RollingOptions {
    pub window: usize,
    pub step: usize,
    pub horizon: usize,
}

impl RollingOptions {
    /// Errors
    /// ------
    /// - `VolError::InvalidOption` when any field is zero.
    pub fn new(window: usize, step: usize, horizon: usize) -> VolResult<Self> {
        for (name, value) in [("window", window), ("step", step), ("horizon", horizon)] {
            if value == 0 {
                return Err(VolError::InvalidOption {
                    name,
                    value: 0.0,
                    reason: "must be at least 1",
                });
            }
        }
        Ok(RollingOptions { window, step, horizon })
    }

    /// Window start indices that leave a full horizon of observations.
    pub fn origins(&self, n: usize) -> Vec<usize> {
        let span = self.window + self.horizon;
        if n < span {
            return Vec::new();
        }
        (0..=n - span).step_by(self.step).collect()
    }
}

impl Default for RollingOptions {
    fn default() -> Self {
        RollingOptions { window: 500, step: 50, horizon: 40 }
    }
}

/// Scores for one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowScore {
    pub origin: usize,
    pub converged: bool,
    pub log_likelihood: f64,
    pub mse: f64,
    pub mae: f64,
    /// VaR violations in the horizon, one entry per level in `VAR_LEVELS`.
    pub violations: [usize; 2],
}

/// Aggregate of a rolling evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingEvaluation {
    pub engine: Engine,
    pub spec: ModelSpec,
    pub options: RollingOptions,
    pub windows: Vec<WindowScore>,
    /// Means over converged windows; `NaN` when none converged.
    pub mean_mse: f64,
    pub mean_mae: f64,
    /// Kupiec tests on violations pooled over converged windows.
    pub var_tests: Vec<VarBacktest>,
}

impl RollingEvaluation {
    pub fn n_converged(&self) -> usize {
        self.windows.iter().filter(|w| w.converged).count()
    }
}

/// Run a rolling-origin evaluation of `spec` on `series` with `engine`.
///
/// Errors
/// ------
/// - `VolError::SeriesTooShort` when not even one window fits.
/// - `VolError::EngineUnavailable` for an unregistered engine.
/// - Other errors raised by a window's fit or forecast, such as numerical
///   defects. Non-convergence is scored, not raised.
pub fn rolling_evaluation(
    selector: &EngineSelector, engine: Engine, series: &ReturnSeries, spec: &ModelSpec,
    opts: &RollingOptions,
) -> VolResult<RollingEvaluation> {
    let origins = opts.origins(series.len());
    if origins.is_empty() {
        return Err(VolError::SeriesTooShort {
            len: series.len(),
            min: opts.window + opts.horizon,
        });
    }
    let backend = selector.select(engine)?;
    debug!(%engine, %spec, windows = origins.len(), "starting rolling evaluation");

    let values = series.values();
    let mut windows = Vec::with_capacity(origins.len());
    for origin in origins {
        let fit = backend.fit(&series.window(origin, opts.window)?, spec)?;
        if !backend.converged(&fit) {
            warn!(%engine, %spec, origin, "window fit did not converge; skipped");
            windows.push(WindowScore {
                origin,
                converged: false,
                log_likelihood: fit.log_likelihood(),
                mse: f64::NAN,
                mae: f64::NAN,
                violations: [0; 2],
            });
            continue;
        }

        let forecast = backend.forecast(&fit, opts.horizon, &ForecastOptions::default())?;
        let start = origin + opts.window;
        let realized = values.slice(s![start..start + opts.horizon]);
        let accuracy = forecast_accuracy(
            forecast.variance_path().view(),
            realized_variance(realized, fit.params().mu).view(),
        )?;

        let mut violations = [0; 2];
        for (slot, level) in violations.iter_mut().zip(VAR_LEVELS) {
            *slot = count_violations(&forecast, &fit.params().innovation, realized, level)?;
        }

        windows.push(WindowScore {
            origin,
            converged: true,
            log_likelihood: fit.log_likelihood(),
            mse: accuracy.mse,
            mae: accuracy.mae,
            violations,
        });
    }

    let scored: Vec<&WindowScore> = windows.iter().filter(|w| w.converged).collect();
    let mean = |f: fn(&WindowScore) -> f64| {
        if scored.is_empty() {
            f64::NAN
        } else {
            scored.iter().map(|w| f(w)).sum::<f64>() / scored.len() as f64
        }
    };
    let mean_mse = mean(|w| w.mse);
    let mean_mae = mean(|w| w.mae);

    let mut var_tests = Vec::with_capacity(VAR_LEVELS.len());
    if !scored.is_empty() {
        let n = scored.len() * opts.horizon;
        for (k, level) in VAR_LEVELS.into_iter().enumerate() {
            let x = scored.iter().map(|w| w.violations[k]).sum();
            var_tests.push(kupiec_pof(x, n, level)?);
        }
    }

    info!(
        %engine,
        %spec,
        windows = windows.len(),
        converged = scored.len(),
        mean_mse,
        "rolling evaluation finished"
    );
    Ok(RollingEvaluation {
        engine,
        spec: *spec,
        options: *opts,
        windows,
        mean_mse,
        mean_mae,
        var_tests,
    })
}
