//! Pre-sample variance initialization.
//!
//! Every recursion needs `max(p, q)` lagged states before the first
//! observation. [`VarianceInit`] decides the variance those lags start from;
//! the recursion converts it to its own state scale (σ², ln σ², or σ).
use serde::{Deserialize, Serialize};

use crate::volatility::{
    core::{data::ReturnSeries, params::GarchParams},
    errors::{VolError, VolResult},
};

/// Policy for the pre-sample variance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum VarianceInit {
    /// Mean squared residual `(1/n)·Σ(r_t − μ)²` under the candidate mean.
    #[default]
    SampleVariance,
    /// Long-run variance implied by the candidate parameters; fails for a
    /// non-stationary candidate.
    Unconditional,
    /// Fixed strictly positive value.
    Fixed(f64),
}

impl VarianceInit {
    /// Errors
    /// ------
    /// - `VolError::InvalidInitVariance` unless `value` is finite and `> 0`.
    pub fn fixed(value: f64) -> VolResult<Self> {
        validate_init_variance(value)?;
        Ok(VarianceInit::Fixed(value))
    }

    /// Resolve the policy into a concrete pre-sample variance.
    pub fn resolve(&self, params: &GarchParams, series: &ReturnSeries) -> VolResult<f64> {
        let value = match *self {
            VarianceInit::SampleVariance => {
                let mu = params.mu;
                series.values().iter().map(|r| (r - mu).powi(2)).sum::<f64>() / series.len() as f64
            }
            VarianceInit::Unconditional => params
                .long_run_variance()
                .ok_or(VolError::InvalidInitVariance { value: f64::INFINITY })?,
            VarianceInit::Fixed(v) => v,
        };
        validate_init_variance(value)?;
        Ok(value)
    }
}

fn validate_init_variance(value: f64) -> VolResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(VolError::InvalidInitVariance { value });
    }
    Ok(())
}
