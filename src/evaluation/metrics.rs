//! evaluation::metrics — forecast accuracy and Value-at-Risk backtests.
//!
//! Purpose
//! -------
//! Score volatility forecasts out of sample. Variance forecasts are compared
//! with realized squared residuals, and return quantiles implied by a
//! forecast are backtested with Kupiec's proportion-of-failures test.
//!
//! Key behaviors
//! -------------
//! - [`forecast_accuracy`] returns MSE and MAE of `σ̂²_h` against
//!   `(r_{t+h} − μ̂)²`.
//! - [`value_at_risk`] is the lower return quantile
//!   `μ + σ·F⁻¹(1 − level)` of the fitted innovation law; a violation is a
//!   realized return strictly below it.
//! - [`kupiec_pof`] computes
//!   `LR = −2 ln[(1−p)^{n−x} p^x] + 2 ln[(1−π̂)^{n−x} π̂^x]`, `p = 1 − level`,
//!   `π̂ = x/n`, with a χ²(1) p-value from `statrs`. Terms of the form
//!   `0·ln 0` are taken as zero.
//!
//! Conventions
//! -----------
//! - `level` is the coverage (0.95, 0.99), not the tail probability.
use ndarray::{Array1, ArrayView1};
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::volatility::{
    core::{forecasts::ForecastResult, innovations::Innovation},
    errors::{VolError, VolResult},
};

/// Coverage levels reported by default.
pub const VAR_LEVELS: [f64; 2] = [0.95, 0.99];

/// Point-forecast accuracy of a variance path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastAccuracy {
    pub n: usize,
    pub mse: f64,
    pub mae: f64,
}

/// MSE and MAE of `forecast` against `realized`.
///
/// Errors
/// ------
/// - `VolError::EmptyInput` for empty input.
/// - `VolError::LengthMismatch` when the lengths differ.
/// - `VolError::NonFiniteInput` for the first NaN/Inf in either argument.
pub fn forecast_accuracy(
    forecast: ArrayView1<f64>, realized: ArrayView1<f64>,
) -> VolResult<ForecastAccuracy> {
    check_values("forecast", forecast)?;
    check_values("realized", realized)?;
    if forecast.len() != realized.len() {
        return Err(VolError::LengthMismatch { expected: forecast.len(), found: realized.len() });
    }
    let n = forecast.len();
    let (sq, abs) = forecast
        .iter()
        .zip(realized.iter())
        .fold((0.0, 0.0), |(sq, abs), (f, r)| (sq + (f - r).powi(2), abs + (f - r).abs()));
    Ok(ForecastAccuracy { n, mse: sq / n as f64, mae: abs / n as f64 })
}

/// Realized variance proxy `(r_t − μ)²` for each return.
pub fn realized_variance(returns: ArrayView1<f64>, mean: f64) -> Array1<f64> {
    returns.mapv(|r| (r - mean).powi(2))
}

/// Lower `1 − level` return quantile for one step.
///
/// Errors
/// ------
/// - `VolError::InvalidOption` unless `0 < level < 1`.
/// - Shape errors from the innovation law.
pub fn value_at_risk(mean: f64, sigma: f64, innovation: &Innovation, level: f64) -> VolResult<f64> {
    Ok(mean + sigma * innovation.quantile(1.0 - level)?)
}

/// Outcome of a Kupiec proportion-of-failures test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VarBacktest {
    pub level: f64,
    pub n: usize,
    pub violations: usize,
    /// Observed violation rate `x / n`.
    pub rate: f64,
    /// Likelihood-ratio statistic, χ²(1) under the null.
    pub lr_stat: f64,
    pub p_value: f64,
}

impl VarBacktest {
    /// Whether the null of correct coverage is rejected at `alpha`.
    pub fn rejects(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Kupiec's unconditional coverage test for `violations` out of `n`.
///
/// Errors
/// ------
/// - `VolError::InvalidOption` for `level` outside `(0, 1)`.
/// - `VolError::EmptyInput` when `n == 0`.
/// - `VolError::LengthMismatch` when `violations > n`.
pub fn kupiec_pof(violations: usize, n: usize, level: f64) -> VolResult<VarBacktest> {
    check_level(level)?;
    if n == 0 {
        return Err(VolError::EmptyInput { name: "backtest sample" });
    }
    if violations > n {
        return Err(VolError::LengthMismatch { expected: n, found: violations });
    }
    let p = 1.0 - level;
    let x = violations as f64;
    let m = (n - violations) as f64;
    let rate = x / n as f64;

    let ll_null = xlogy(m, 1.0 - p) + xlogy(x, p);
    let ll_alt = xlogy(m, 1.0 - rate) + xlogy(x, rate);
    let lr_stat = (-2.0 * (ll_null - ll_alt)).max(0.0);

    let chi2 = ChiSquared::new(1.0).map_err(|_| VolError::InvalidOption {
        name: "degrees of freedom",
        value: 1.0,
        reason: "chi-squared construction failed",
    })?;
    let p_value = 1.0 - chi2.cdf(lr_stat);
    Ok(VarBacktest { level, n, violations, rate, lr_stat, p_value })
}

/// Backtest the VaR implied by `forecast` against `realized` returns.
///
/// Errors
/// ------
/// - `VolError::LengthMismatch` unless `realized.len() == forecast.horizon`.
/// - `VolError::NonFiniteInput` for a non-finite realized return.
/// - Errors from [`value_at_risk`] and [`kupiec_pof`].
pub fn var_backtest(
    forecast: &ForecastResult, innovation: &Innovation, realized: ArrayView1<f64>, level: f64,
) -> VolResult<VarBacktest> {
    let violations = count_violations(forecast, innovation, realized, level)?;
    kupiec_pof(violations, realized.len(), level)
}

/// Number of realized returns strictly below the forecast VaR line.
///
/// Errors
/// ------
/// - As for [`var_backtest`], without the Kupiec step.
pub fn count_violations(
    forecast: &ForecastResult, innovation: &Innovation, realized: ArrayView1<f64>, level: f64,
) -> VolResult<usize> {
    check_level(level)?;
    check_values("realized", realized)?;
    if realized.len() != forecast.horizon {
        return Err(VolError::LengthMismatch { expected: forecast.horizon, found: realized.len() });
    }
    let q = innovation.quantile(1.0 - level)?;
    Ok(realized
        .iter()
        .zip(forecast.mean_path.iter().zip(forecast.sigma_path.iter()))
        .filter(|(r, (m, s))| **r < *m + *s * q)
        .count())
}

fn xlogy(x: f64, y: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x * y.ln()
    }
}

fn check_level(level: f64) -> VolResult<()> {
    if level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(VolError::InvalidOption {
            name: "level",
            value: level,
            reason: "must lie strictly between 0 and 1",
        })
    }
}

pub(crate) fn check_values(name: &'static str, values: ArrayView1<f64>) -> VolResult<()> {
    if values.is_empty() {
        return Err(VolError::EmptyInput { name });
    }
    match values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(VolError::NonFiniteInput { name, index, value }),
        None => Ok(()),
    }
}
