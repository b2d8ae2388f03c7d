//! Options for fitting, forecasting, and innovation injection.
//!
//! Purpose
//! -------
//! Bundle the knobs each public operation accepts into plain structs with
//! `Default` impls, so call sites stay short and every default is written
//! down in exactly one place.
//!
//! Key behaviors
//! -------------
//! - [`FitOptions`]: pre-sample variance policy, L-BFGS options for the
//!   hand-built engine, simplex options for the reference engine, and
//!   whether to compute standard errors.
//! - [`ForecastOptions`]: whether forecasting an unconverged fit is allowed.
//! - [`InjectionOptions`]: how externally supplied innovations are
//!   standardized and blended with model draws.
//!
//! Invariants & assumptions
//! ------------------------
//! - `InjectionOptions::hybrid_weight` lies in `[0, 1]`.
//! - Optimizer options are validated by their own constructors in
//!   `optimization::loglik_optimizer`.
use serde::{Deserialize, Serialize};

use crate::{
    optimization::loglik_optimizer::{MLEOptions, SimplexOptions},
    volatility::{
        core::init::VarianceInit,
        errors::{VolError, VolResult},
    },
};

/// Default share of external innovations in a hybrid blend.
pub const DEFAULT_HYBRID_WEIGHT: f64 = 0.7;

/// Options accepted by both estimators.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub init: VarianceInit,
    pub mle_opts: MLEOptions,
    pub simplex_opts: SimplexOptions,
    /// Compute observed-information standard errors for converged fits.
    pub std_errors: bool,
}

impl FitOptions {
    pub fn new(
        init: VarianceInit, mle_opts: MLEOptions, simplex_opts: SimplexOptions, std_errors: bool,
    ) -> Self {
        FitOptions { init, mle_opts, simplex_opts, std_errors }
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            init: VarianceInit::default(),
            mle_opts: MLEOptions::default(),
            simplex_opts: SimplexOptions::default(),
            std_errors: true,
        }
    }
}

/// Forecast options.
///
/// By default an unconverged model is rejected with
/// `VolError::NonConvergence`; `allow_unconverged` overrides that with a
/// logged warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ForecastOptions {
    pub allow_unconverged: bool,
}

impl ForecastOptions {
    pub fn allow_unconverged() -> Self {
        ForecastOptions { allow_unconverged: true }
    }
}

/// Treatment of externally supplied innovations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InjectionOptions {
    /// Subtract the sample mean before use.
    pub enforce_zero_mean: bool,
    /// Divide by the sample standard deviation before use.
    pub enforce_unit_variance: bool,
    /// Weight `w` in `z = √w·z_ext + √(1−w)·z_model`.
    pub hybrid_weight: f64,
}

impl InjectionOptions {
    /// Errors
    /// ------
    /// - `VolError::InvalidOption` unless `0 ≤ hybrid_weight ≤ 1`.
    pub fn new(
        enforce_zero_mean: bool, enforce_unit_variance: bool, hybrid_weight: f64,
    ) -> VolResult<Self> {
        if !(0.0..=1.0).contains(&hybrid_weight) {
            return Err(VolError::InvalidOption {
                name: "hybrid_weight",
                value: hybrid_weight,
                reason: "must lie in [0, 1]",
            });
        }
        Ok(InjectionOptions { enforce_zero_mean, enforce_unit_variance, hybrid_weight })
    }
}

impl Default for InjectionOptions {
    fn default() -> Self {
        InjectionOptions {
            enforce_zero_mean: true,
            enforce_unit_variance: true,
            hybrid_weight: DEFAULT_HYBRID_WEIGHT,
        }
    }
}
