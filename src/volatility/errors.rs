//! volatility::errors — error surface of the volatility core.
//!
//! Purpose
//! -------
//! One enum, [`VolError`], for every failure raised while validating
//! inputs, filtering variances, fitting, forecasting, simulating, or
//! dispatching to an engine. Each variant belongs to exactly one
//! [`ErrorKind`]:
//!
//! - `InvalidInput`: rejected before any numerical work.
//! - `NonConvergence`: a fit that did not reach a stationary, finite optimum
//!   was used where a converged fit is required.
//! - `EngineUnavailable`: the requested back-end cannot run.
//! - `NumericalDefect`: an internal invariant was violated (non-positive
//!   variance in a forecast or simulation, non-finite likelihood after a
//!   claimed convergence). Always fatal.
//!
//! Conventions
//! -----------
//! - Numeric failures carry `{ index, value }` so callers can locate the
//!   offending observation or step.
//! - `NonPositiveVariance` is raised by the variance filter while fitting;
//!   the estimator treats it as a rejected parameter region. Forecasting and
//!   simulation raise `NumericalDefect` instead.
use thiserror::Error;

use crate::optimization::errors::OptError;

pub type VolResult<T> = Result<T, VolError>;

/// Error categories callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorKind {
    InvalidInput,
    NonConvergence,
    EngineUnavailable,
    NumericalDefect,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VolError {
    // ---- Return series ----
    #[error("Return series has {len} observations; at least {min} are required")]
    SeriesTooShort { len: usize, min: usize },

    #[error("Non-finite return at index {index}: {value}")]
    NonFiniteReturn { index: usize, value: f64 },

    // ---- Model specification ----
    #[error("Invalid model order (p = {p}, q = {q}): {reason}")]
    InvalidOrder { p: usize, q: usize, reason: &'static str },

    #[error("Invalid distribution parameter {name} = {value}: {reason}")]
    InvalidShape { name: &'static str, value: f64, reason: &'static str },

    #[error("Invalid parameter vector: {reason}")]
    InvalidParameters { reason: String },

    #[error("Invalid initial variance {value}: must be finite and > 0")]
    InvalidInitVariance { value: f64 },

    // ---- Forecast / simulation inputs ----
    #[error("Invalid horizon {horizon}: must be at least 1")]
    InvalidHorizon { horizon: usize },

    #[error("Innovation sequence too short: need {needed}, found {found}")]
    InsufficientInnovations { needed: usize, found: usize },

    #[error("Non-finite innovation at index {index}: {value}")]
    NonFiniteInnovation { index: usize, value: f64 },

    #[error("Invalid option {name} = {value}: {reason}")]
    InvalidOption { name: &'static str, value: f64, reason: &'static str },

    #[error("Length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Non-finite {name} at index {index}: {value}")]
    NonFiniteInput { name: &'static str, index: usize, value: f64 },

    #[error("Empty {name}: at least one value is required")]
    EmptyInput { name: &'static str },

    // ---- Convergence ----
    #[error("Model did not converge: {reason}")]
    NonConvergence { reason: String },

    // ---- Engines ----
    #[error("Engine '{engine}' is unavailable: {reason}")]
    EngineUnavailable { engine: String, reason: &'static str },

    // ---- Numerical ----
    #[error("Non-positive or non-finite variance {value} at index {index}")]
    NonPositiveVariance { index: usize, value: f64 },

    #[error("Numerical defect at step {step}: {reason} (value {value})")]
    NumericalDefect { step: usize, value: f64, reason: &'static str },

    // ---- Optimizer / IO ----
    #[error(transparent)]
    Optimization(#[from] OptError),

    #[error("Failed to write table: {text}")]
    Output { text: String },
}

impl VolError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VolError::NonConvergence { .. } | VolError::Optimization(_) => {
                ErrorKind::NonConvergence
            }
            VolError::EngineUnavailable { .. } => ErrorKind::EngineUnavailable,
            VolError::NonPositiveVariance { .. } | VolError::NumericalDefect { .. } => {
                ErrorKind::NumericalDefect
            }
            _ => ErrorKind::InvalidInput,
        }
    }
}

impl From<csv::Error> for VolError {
    fn from(err: csv::Error) -> Self {
        VolError::Output { text: err.to_string() }
    }
}

impl From<std::io::Error> for VolError {
    fn from(err: std::io::Error) -> Self {
        VolError::Output { text: err.to_string() }
    }
}
