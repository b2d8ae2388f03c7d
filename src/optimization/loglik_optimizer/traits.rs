//! Public API surface for log-likelihood maximization.
//!
//! - [`LogLikelihood`]: trait users implement for their model.
//! - [`MLEOptions`] and [`Tolerances`]: configuration for the L-BFGS path.
//! - [`SimplexOptions`]: configuration for the derivative-free path.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`OptimOutcome`]: normalized result returned by both runners.
//!
//! Convention: we *maximize* a user log-likelihood `ℓ(θ)` by minimizing the cost
//! `c(θ) = −ℓ(θ)`. If an analytic gradient is provided, it should be the gradient
//! of the log-likelihood (`∇ℓ(θ)`); the adapter flips the sign as needed.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
        Cost, FnEvalMap, Grad, Theta, DEFAULT_LBFGS_MEM,
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// A model whose log-likelihood can be maximized over an unconstrained `θ`.
///
/// `value` must report inadmissible `θ` as an `Err` (typically
/// [`OptError::ModelDomain`]) instead of panicking or returning a clamped
/// value. `grad` is optional; the adapter falls back to finite differences.
pub trait LogLikelihood {
    type Data;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl LineSearcher {
    /// The other line search, used when a run has to be retried.
    pub fn alternate(self) -> LineSearcher {
        match self {
            LineSearcher::MoreThuente => LineSearcher::HagerZhang,
            LineSearcher::HagerZhang => LineSearcher::MoreThuente,
        }
    }
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Options for the L-BFGS maximizer.
///
/// Fields
/// ------
/// - `tols`: stopping tolerances and the iteration cap.
/// - `line_searcher`: More–Thuente or Hager–Zhang.
/// - `verbose`: attach a terminal observer (feature `obs_slog`).
/// - `lbfgs_mem`: L-BFGS history size, `None` for [`DEFAULT_LBFGS_MEM`].
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl MLEOptions {
    /// Validate and build optimizer options.
    ///
    /// Errors
    /// ------
    /// - `OptError::InvalidLBFGSMem` when `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, line_searcher, verbose: false, lbfgs_mem })
    }

    /// Same options with the executor observer toggled.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn memory(&self) -> usize {
        self.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM)
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::default(),
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Stopping rules for the L-BFGS runner.
///
/// `tol_grad` and `tol_cost` are optional convergence criteria. `max_iter`
/// is always present: it is the hard bound that keeps a pathological fit
/// from running indefinitely, and hitting it reports `converged = false`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: usize,
}

impl Tolerances {
    /// Validate and build stopping rules.
    ///
    /// Parameters
    /// ----------
    /// - `tol_grad`: gradient-norm tolerance, `None` to disable.
    /// - `tol_cost`: cost-change tolerance, `None` to disable.
    /// - `max_iter`: iteration bound, at least one.
    ///
    /// Errors
    /// ------
    /// - `OptError::InvalidTolGrad` / `OptError::InvalidTolCost` for
    ///   non-finite or negative tolerances.
    /// - `OptError::InvalidMaxIter` when `max_iter == 0`.
    pub fn new(tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: usize) -> OptResult<Self> {
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if max_iter == 0 {
            return Err(OptError::InvalidMaxIter {
                max_iter,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { tol_grad: Some(1e-4), tol_cost: Some(1e-9), max_iter: 500 }
    }
}

/// Options for the Nelder–Mead maximizer.
///
/// - `sd_tolerance`: stop once the standard deviation of the simplex costs
///   drops below this value.
/// - `max_iter`: hard iteration bound.
/// - `initial_step`: relative size of the initial simplex edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplexOptions {
    pub sd_tolerance: f64,
    pub max_iter: usize,
    pub initial_step: f64,
}

impl SimplexOptions {
    pub fn new(sd_tolerance: f64, max_iter: usize, initial_step: f64) -> OptResult<Self> {
        if !sd_tolerance.is_finite() || sd_tolerance <= 0.0 {
            return Err(OptError::InvalidSimplexOption {
                value: sd_tolerance,
                reason: "Simplex tolerance must be finite and positive.",
            });
        }
        if max_iter == 0 {
            return Err(OptError::InvalidMaxIter {
                max_iter,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        if !initial_step.is_finite() || initial_step <= 0.0 {
            return Err(OptError::InvalidSimplexOption {
                value: initial_step,
                reason: "Initial simplex step must be finite and positive.",
            });
        }
        Ok(Self { sd_tolerance, max_iter, initial_step })
    }
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self { sd_tolerance: 1e-9, max_iter: 5000, initial_step: 0.05 }
    }
}

/// Normalized optimizer result.
///
/// `value` is the best log-likelihood `ℓ(θ̂)`. `converged` is true only when
/// the solver stopped on its own convergence criterion; an exhausted
/// iteration budget or an external interrupt reports `false`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match &termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => {
                let ok = matches!(
                    reason,
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                );
                (ok, format!("{reason:?}"))
            }
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, converged, status, iterations, fn_evals, grad_norm })
    }
}
