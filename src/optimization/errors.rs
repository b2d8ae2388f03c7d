//! optimization::errors — unified error surface for the MLE stack.
//!
//! Purpose
//! -------
//! Collect every failure the optimization layer can report (solver
//! configuration, non-finite objective values, malformed gradients or
//! Hessians, backend solver errors, and model-domain rejections) into a
//! single enum, [`OptError`], with a shared result alias [`OptResult`].
//!
//! Key behaviors
//! -------------
//! - Convert `argmin::core::Error` into [`OptError`] by downcasting: an
//!   `OptError` raised inside a cost/gradient callback round-trips
//!   unchanged, `ArgminError` variants map onto their counterparts, and any
//!   other backend error is preserved as text.
//! - Convert volatility-core errors raised inside a likelihood into
//!   [`OptError::ModelDomain`], so the solver layer never depends on
//!   model-specific enums.
//!
//! Conventions
//! -----------
//! - Variants carry structured context (`index`, `value`, `reason`) rather
//!   than preformatted strings wherever the failing quantity is numeric.
//! - [`OptError::is_domain_rejection`] identifies errors that mean "θ lies
//!   outside the admissible region"; derivative-free solvers treat those as
//!   infinite cost instead of aborting.
use argmin::core::{ArgminError, Error};
use thiserror::Error as ThisError;

use crate::volatility::errors::VolError;

/// Result alias used throughout the optimization layer.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum OptError {
    // ---- Gradient ----
    #[error("Gradient optimization not implemented")]
    GradientNotImplemented,

    #[error("Gradient dimension mismatch: expected {expected}, found {found}")]
    GradientDimMismatch { expected: usize, found: usize },

    #[error("Invalid gradient at index {index}: {value}: {reason}")]
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    // ---- MLEOptions ----
    #[error("Invalid gradient tolerance {tol}: {reason}")]
    InvalidTolGrad { tol: f64, reason: &'static str },

    #[error("Invalid cost function change tolerance {tol}: {reason}")]
    InvalidTolCost { tol: f64, reason: &'static str },

    #[error("Invalid maximum iterations {max_iter}: {reason}")]
    InvalidMaxIter { max_iter: usize, reason: &'static str },

    #[error("Invalid line searcher '{name}': {reason}")]
    InvalidLineSearch { name: String, reason: &'static str },

    #[error("Invalid L-BFGS memory {mem}: {reason}")]
    InvalidLBFGSMem { mem: usize, reason: &'static str },

    #[error("Invalid simplex setting {value}: {reason}")]
    InvalidSimplexOption { value: f64, reason: &'static str },

    // ---- Cost function ----
    #[error("Non-finite cost value: {value}")]
    NonFiniteCost { value: f64 },

    #[error("Parameter vector rejected by the model: {reason}")]
    ModelDomain { reason: String },

    // ---- Optimizer outcome ----
    #[error("Invalid estimated parameter at index {index}: {value}: {reason}")]
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },

    #[error("Missing estimated parameters (theta hat)")]
    MissingThetaHat,

    #[error("Parameter vector length mismatch: expected {expected}, found {found}")]
    ThetaLengthMismatch { expected: usize, found: usize },

    #[error("Non-finite parameter vector entry at index {index}: {value}")]
    InvalidThetaInput { index: usize, value: f64 },

    // ---- Argmin ----
    #[error("Invalid parameter: {text}")]
    InvalidParameter { text: String },

    #[error("Not implemented: {text}")]
    NotImplemented { text: String },

    #[error("Not initialized: {text}")]
    NotInitialized { text: String },

    #[error("Condition violated: {text}")]
    ConditionViolated { text: String },

    #[error("Potential bug: {text}")]
    PotentialBug { text: String },

    #[error("Backend error: {text}")]
    BackendError { text: String },

    // ---- Finite Diffs ----
    #[error("Hessian dimension mismatch: expected ({expected}, {expected}), found {found:?}")]
    HessianDimMismatch { expected: usize, found: (usize, usize) },

    #[error("Invalid Hessian at ({row}, {col}): {value}, must be finite")]
    InvalidHessian { row: usize, col: usize, value: f64 },
}

impl OptError {
    /// True when the error means the candidate θ lies outside the model's
    /// admissible region (or produced a non-finite likelihood there).
    pub fn is_domain_rejection(&self) -> bool {
        matches!(self, OptError::ModelDomain { .. } | OptError::NonFiniteCost { .. })
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast::<ArgminError>() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                other => OptError::BackendError { text: other.to_string() },
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

impl From<VolError> for OptError {
    fn from(err: VolError) -> Self {
        match err {
            VolError::Optimization(inner) => inner,
            other => OptError::ModelDomain { reason: other.to_string() },
        }
    }
}
