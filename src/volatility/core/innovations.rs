//! innovations — standardized innovation laws for GARCH likelihoods.
//!
//! Purpose
//! -------
//! Represent the distribution of `z_t = ε_t / σ_t` and provide everything
//! the variance library, estimator, forecaster and simulator need from it:
//! log-densities, the moments entering persistence and asymmetric
//! recursions, quantiles for VaR, and seeded sampling.
//!
//! Key behaviors
//! -------------
//! - [`Innovation::Normal`]: standard normal.
//! - [`Innovation::StudentT`]: Student-t with `ν > 2`, rescaled to unit
//!   variance.
//! - [`Innovation::SkewStudentT`]: Fernández–Steel skewed Student-t with
//!   skew `ξ > 0`, recentred and rescaled to zero mean and unit variance
//!   (`ξ = 1` recovers the symmetric law).
//! - [`Innovation::moments`] returns `E|z|` and `E[z² 𝟙(z < 0)]` in closed
//!   form, using partial moments of the Student-t expressed through
//!   `statrs` densities and CDFs.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every law here has `E[z] = 0` and `E[z²] = 1`.
//! - Shape parameters are validated at construction; the hot-path
//!   [`LogDensity::eval`] performs no validation.
//!
//! Conventions
//! -----------
//! - `shape` is `ν`, `skew` is `ξ`, matching the parameter names used in
//!   result tables.
//! - "Standardized t" below means `Y = c·T` with `T ~ t_ν`,
//!   `c = √((ν − 2)/ν)`, density `g`, CDF `G`.
use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Normal, StudentsT};
use statrs::function::gamma::ln_gamma;
use std::f64::consts::PI;

use crate::volatility::{
    core::spec::DistributionKind,
    errors::{VolError, VolResult},
};

/// Lower bound enforced on `ν − 2` by the estimator transforms.
pub const MIN_SHAPE_GAP: f64 = 0.01;
/// Lower bound enforced on `ξ` by the estimator transforms.
pub const MIN_SKEW: f64 = 0.01;
/// Starting value for `ν`.
pub const DEFAULT_SHAPE: f64 = 8.0;

/// Moments of `z` used by the recursions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InnovationMoments {
    /// `E|z|`.
    pub abs_mean: f64,
    /// `E[z² 𝟙(z < 0)]`; one half for symmetric laws.
    pub neg_sq_mean: f64,
}

/// Standardized innovation law with its shape parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Innovation {
    Normal,
    StudentT { nu: f64 },
    SkewStudentT { nu: f64, xi: f64 },
}

impl Innovation {
    /// Errors
    /// ------
    /// - `VolError::InvalidShape` unless `ν` is finite and `> 2`.
    pub fn student_t(nu: f64) -> VolResult<Self> {
        validate_nu(nu)?;
        Ok(Innovation::StudentT { nu })
    }

    /// Errors
    /// ------
    /// - `VolError::InvalidShape` unless `ν > 2` and `ξ > 0`, both finite.
    pub fn skew_student_t(nu: f64, xi: f64) -> VolResult<Self> {
        validate_nu(nu)?;
        if !xi.is_finite() || xi <= 0.0 {
            return Err(VolError::InvalidShape {
                name: "skew",
                value: xi,
                reason: "skew must be finite and > 0",
            });
        }
        Ok(Innovation::SkewStudentT { nu, xi })
    }

    /// Starting law for a distribution family (`ν = 8`, `ξ = 1`).
    pub fn starting(kind: DistributionKind) -> Self {
        match kind {
            DistributionKind::Normal => Innovation::Normal,
            DistributionKind::StudentT => Innovation::StudentT { nu: DEFAULT_SHAPE },
            DistributionKind::SkewStudentT => {
                Innovation::SkewStudentT { nu: DEFAULT_SHAPE, xi: 1.0 }
            }
        }
    }

    /// Rebuild a law from its family and shape values (`[ν]`, `[ν, ξ]`).
    pub fn from_shape(kind: DistributionKind, shape: &[f64]) -> VolResult<Self> {
        if shape.len() != kind.n_shape() {
            return Err(VolError::LengthMismatch { expected: kind.n_shape(), found: shape.len() });
        }
        match kind {
            DistributionKind::Normal => Ok(Innovation::Normal),
            DistributionKind::StudentT => Innovation::student_t(shape[0]),
            DistributionKind::SkewStudentT => Innovation::skew_student_t(shape[0], shape[1]),
        }
    }

    pub fn kind(&self) -> DistributionKind {
        match self {
            Innovation::Normal => DistributionKind::Normal,
            Innovation::StudentT { .. } => DistributionKind::StudentT,
            Innovation::SkewStudentT { .. } => DistributionKind::SkewStudentT,
        }
    }

    /// Shape values in canonical order.
    pub fn shape_params(&self) -> Vec<f64> {
        match *self {
            Innovation::Normal => Vec::new(),
            Innovation::StudentT { nu } => vec![nu],
            Innovation::SkewStudentT { nu, xi } => vec![nu, xi],
        }
    }

    /// Precompute the log-density constants for repeated evaluation.
    pub fn log_density(&self) -> VolResult<LogDensity> {
        Ok(match *self {
            Innovation::Normal => LogDensity::Normal,
            Innovation::StudentT { nu } => {
                validate_nu(nu)?;
                LogDensity::StudentT { nu, k: std_t_log_const(nu) }
            }
            Innovation::SkewStudentT { nu, xi } => {
                let skew = SkewParts::new(nu, xi)?;
                let a = 2.0 / (xi + 1.0 / xi);
                LogDensity::SkewStudentT {
                    nu,
                    xi,
                    m: skew.m,
                    s: skew.s,
                    k: std_t_log_const(nu) + a.ln() + skew.s.ln(),
                }
            }
        })
    }

    /// `ln f(z)` for a single value.
    pub fn log_pdf(&self, z: f64) -> VolResult<f64> {
        Ok(self.log_density()?.eval(z))
    }

    /// `E|z|` and `E[z² 𝟙(z < 0)]`.
    pub fn moments(&self) -> VolResult<InnovationMoments> {
        match *self {
            Innovation::Normal => {
                Ok(InnovationMoments { abs_mean: (2.0 / PI).sqrt(), neg_sq_mean: 0.5 })
            }
            Innovation::StudentT { nu } => {
                let t = StdT::new(nu)?;
                Ok(InnovationMoments { abs_mean: 2.0 * t.upper_first(0.0), neg_sq_mean: 0.5 })
            }
            Innovation::SkewStudentT { nu, xi } => {
                let skew = SkewParts::new(nu, xi)?;
                let (m, s) = (skew.m, skew.s);
                let l0 = skew.lower_moment(0, m);
                let l1 = skew.lower_moment(1, m);
                let l2 = skew.lower_moment(2, m);
                Ok(InnovationMoments {
                    abs_mean: 2.0 * (m * l0 - l1) / s,
                    neg_sq_mean: (l2 - 2.0 * m * l1 + m * m * l0) / (s * s),
                })
            }
        }
    }

    /// Quantile `F⁻¹(p)` of the standardized law.
    ///
    /// Errors
    /// ------
    /// - `VolError::InvalidOption` unless `0 < p < 1`.
    pub fn quantile(&self, p: f64) -> VolResult<f64> {
        if !(p > 0.0 && p < 1.0) {
            return Err(VolError::InvalidOption {
                name: "probability",
                value: p,
                reason: "must lie strictly between 0 and 1",
            });
        }
        match *self {
            Innovation::Normal => {
                let n = Normal::new(0.0, 1.0).map_err(|_| shape_err("normal", 1.0))?;
                Ok(n.inverse_cdf(p))
            }
            Innovation::StudentT { nu } => StdT::new(nu)?.inverse_cdf(p),
            Innovation::SkewStudentT { nu, xi } => {
                let skew = SkewParts::new(nu, xi)?;
                let a = 2.0 / (xi + 1.0 / xi);
                let p0 = 1.0 / (1.0 + xi * xi);
                let x = if p < p0 {
                    skew.t.inverse_cdf(p * xi / a)? / xi
                } else {
                    xi * skew.t.inverse_cdf((p - p0) / (a * xi) + 0.5)?
                };
                Ok((x - skew.m) / skew.s)
            }
        }
    }

    /// Draw `n` independent innovations.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> VolResult<Array1<f64>> {
        match *self {
            Innovation::Normal => {
                Ok(Array1::from_iter((0..n).map(|_| StandardNormal.sample(&mut *rng))))
            }
            Innovation::StudentT { nu } => {
                let c = StdT::new(nu)?.c;
                let t = rand_distr::StudentT::new(nu).map_err(|_| shape_err("shape", nu))?;
                Ok(Array1::from_iter((0..n).map(|_| c * t.sample(&mut *rng))))
            }
            Innovation::SkewStudentT { nu, xi } => {
                let skew = SkewParts::new(nu, xi)?;
                let t = rand_distr::StudentT::new(nu).map_err(|_| shape_err("shape", nu))?;
                let p_pos = xi * xi / (1.0 + xi * xi);
                Ok(Array1::from_iter((0..n).map(|_| {
                    let y = (skew.t.c * t.sample(&mut *rng)).abs();
                    let u: f64 = rng.gen();
                    let x = if u < p_pos { xi * y } else { -y / xi };
                    (x - skew.m) / skew.s
                })))
            }
        }
    }
}

/// Log-density with constants hoisted out of the per-observation loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogDensity {
    Normal,
    StudentT { nu: f64, k: f64 },
    SkewStudentT { nu: f64, xi: f64, m: f64, s: f64, k: f64 },
}

impl LogDensity {
    #[inline]
    pub fn eval(&self, z: f64) -> f64 {
        match *self {
            LogDensity::Normal => -0.5 * (2.0 * PI).ln() - 0.5 * z * z,
            LogDensity::StudentT { nu, k } => k - 0.5 * (nu + 1.0) * (z * z / (nu - 2.0)).ln_1p(),
            LogDensity::SkewStudentT { nu, xi, m, s, k } => {
                let x = s * z + m;
                let y = if x >= 0.0 { x / xi } else { x * xi };
                k - 0.5 * (nu + 1.0) * (y * y / (nu - 2.0)).ln_1p()
            }
        }
    }
}

// ---- Helpers ----

fn validate_nu(nu: f64) -> VolResult<()> {
    if !nu.is_finite() || nu <= 2.0 {
        return Err(VolError::InvalidShape {
            name: "shape",
            value: nu,
            reason: "degrees of freedom must be finite and > 2",
        });
    }
    Ok(())
}

fn shape_err(name: &'static str, value: f64) -> VolError {
    VolError::InvalidShape { name, value, reason: "rejected by the distribution backend" }
}

/// `ln g(0)` for the unit-variance Student-t.
fn std_t_log_const(nu: f64) -> f64 {
    ln_gamma(0.5 * (nu + 1.0)) - ln_gamma(0.5 * nu) - 0.5 * (PI * (nu - 2.0)).ln()
}

/// Unit-variance Student-t helpers (density `g`, CDF `G`, partial moments).
#[derive(Debug, Clone)]
struct StdT {
    nu: f64,
    c: f64,
    t: StudentsT,
    t_minus_two: StudentsT,
}

impl StdT {
    fn new(nu: f64) -> VolResult<Self> {
        validate_nu(nu)?;
        let t = StudentsT::new(0.0, 1.0, nu).map_err(|_| shape_err("shape", nu))?;
        let t_minus_two = StudentsT::new(0.0, 1.0, nu - 2.0).map_err(|_| shape_err("shape", nu))?;
        Ok(StdT { nu, c: ((nu - 2.0) / nu).sqrt(), t, t_minus_two })
    }

    /// `G(b)`.
    fn cdf(&self, b: f64) -> f64 {
        self.t.cdf(b / self.c)
    }

    fn inverse_cdf(&self, p: f64) -> VolResult<f64> {
        if !(p > 0.0 && p < 1.0) {
            return Err(VolError::InvalidOption {
                name: "probability",
                value: p,
                reason: "must lie strictly between 0 and 1",
            });
        }
        Ok(self.c * self.t.inverse_cdf(p))
    }

    /// `∫_b^∞ y g(y) dy`.
    fn upper_first(&self, b: f64) -> f64 {
        let a = b / self.c;
        self.c * (self.nu + a * a) / (self.nu - 1.0) * self.t.pdf(a)
    }

    /// `∫_{−∞}^b y² g(y) dy`.
    fn lower_second(&self, b: f64) -> f64 {
        self.t_minus_two.cdf(b) - b * self.upper_first(b)
    }

    /// `∫_{−∞}^b y^k g(y) dy` for `k ∈ {0, 1, 2}`.
    fn lower(&self, k: u8, b: f64) -> f64 {
        match k {
            0 => self.cdf(b),
            1 => -self.upper_first(b),
            _ => self.lower_second(b),
        }
    }
}

/// Fernández–Steel construction on top of the unit-variance t.
///
/// `X` has density `A·g(x/ξ)` for `x ≥ 0` and `A·g(xξ)` for `x < 0` with
/// `A = 2/(ξ + 1/ξ)`; `z = (X − m)/s` is the standardized innovation.
#[derive(Debug, Clone)]
struct SkewParts {
    xi: f64,
    a: f64,
    m: f64,
    s: f64,
    t: StdT,
}

impl SkewParts {
    fn new(nu: f64, xi: f64) -> VolResult<Self> {
        Innovation::skew_student_t(nu, xi)?;
        let t = StdT::new(nu)?;
        let m = 2.0 * t.upper_first(0.0) * (xi - 1.0 / xi);
        let var = xi * xi + 1.0 / (xi * xi) - 1.0 - m * m;
        if !(var > 0.0) {
            return Err(shape_err("skew", xi));
        }
        Ok(SkewParts { xi, a: 2.0 / (xi + 1.0 / xi), m, s: var.sqrt(), t })
    }

    /// `E[X^k 𝟙(X < x0)]`.
    fn lower_moment(&self, k: u8, x0: f64) -> f64 {
        let xi = self.xi;
        let neg_scale = self.a * xi.powi(-(i32::from(k) + 1));
        if x0 < 0.0 {
            neg_scale * self.t.lower(k, x0 * xi)
        } else {
            let pos_scale = self.a * xi.powi(i32::from(k) + 1);
            let at_zero = self.t.lower(k, 0.0);
            neg_scale * at_zero + pos_scale * (self.t.lower(k, x0 / xi) - at_zero)
        }
    }
}
