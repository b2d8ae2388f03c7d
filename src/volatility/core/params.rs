//! GARCH parameter vector and its optimizer-space mapping.
//!
//! This module provides the **model-space** container [`GarchParams`] and a
//! **numerically stable mapping** to and from an unconstrained optimizer
//! vector θ used by the hand-built estimator.
//!
//! ## Natural layout
//! `[mu? | omega | alpha(1..q) | gamma(1..q)? | beta(1..p) | shape? | skew?]`,
//! identical to [`ModelSpec::param_names`]. `mu` is present only for a
//! constant mean; `gamma` only for asymmetric variants.
//!
//! ## θ mapping ([`ThetaScale`] = sample mean `m` and deviation `s`)
//! - `mu = m + s·θ_mu`.
//! - `ω = s²·softplus(θ_ω)` (sGARCH, GJR), `s·softplus(θ_ω)` (TGARCH), or
//!   `θ_ω` itself (eGARCH, log-variance scale).
//! - Dynamics live on a **scaled simplex** of total mass `1 − margin` with
//!   an implicit slack component whose logit is pinned to zero. Each
//!   simplex weight is one coefficient's contribution to persistence:
//!   - sGARCH: `[α_i | β_j]`
//!   - GJR: `[α_i | γ_i·E[z²𝟙(z<0)] | β_j]`
//!   - TGARCH: `[α_i·E|z|/2 | γ_i·E|z|/2 | β_j]`
//!   - eGARCH: only `β_j` is on the simplex; `α`, `γ` are free.
//! - `ν = 2 + MIN_SHAPE_GAP + softplus(θ_ν)`, `ξ = MIN_SKEW + softplus(θ_ξ)`.
//!
//! The shape block is decoded first because the innovation moments it
//! implies convert simplex weights into GJR/TGARCH coefficients. Every θ
//! therefore maps to a strictly stationary, admissible parameter vector.
use ndarray::{s, Array1, ArrayView1};
use serde::Serialize;

use crate::{
    optimization::numerical_stability::transformations::{
        safe_softmax, safe_softplus, safe_softplus_inv, softmax_logits, STATIONARITY_MARGIN,
    },
    volatility::{
        core::{
            data::ReturnSeries,
            innovations::{Innovation, InnovationMoments, MIN_SHAPE_GAP, MIN_SKEW},
            spec::{DistributionKind, GarchVariant, MeanSpec, ModelSpec},
            validation::validate_coefficients,
        },
        errors::{VolError, VolResult},
    },
};

/// Sample location and scale used to normalize θ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThetaScale {
    pub mean: f64,
    pub sd: f64,
}

impl ThetaScale {
    pub fn from_series(series: &ReturnSeries) -> Self {
        ThetaScale { mean: series.mean(), sd: series.variance().sqrt() }
    }
}

/// Validated model-space parameters.
///
/// Invariants
/// ----------
/// - Block lengths match `spec.order`; every value is finite.
/// - sGARCH, GJR and TGARCH: `ω > 0` and every `α`, `γ`, `β` is `≥ 0`.
/// - eGARCH is exempt from the sign rules on `ω`, `α` and `γ`: its
///   recursion runs on `ln σ²`, so positivity of σ² holds for any real
///   `ω` and a negative `γ` is the usual leverage sign. Only `β ≥ 0` is
///   enforced.
/// - `innovation` matches `spec.distribution`.
///
/// Stationarity is not part of construction; see [`GarchParams::is_stationary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GarchParams {
    pub spec: ModelSpec,
    pub mu: f64,
    pub omega: f64,
    pub alpha: Array1<f64>,
    /// Empty for sGARCH; `α⁻` for TGARCH.
    pub gamma: Array1<f64>,
    pub beta: Array1<f64>,
    pub innovation: Innovation,
}

impl GarchParams {
    /// Create validated parameters.
    ///
    /// Errors
    /// ------
    /// - `VolError::InvalidParameters` for wrong block lengths, non-finite
    ///   values, a non-zero `mu` under a zero mean, or coefficients outside
    ///   the variant's domain.
    /// - `VolError::InvalidShape` if the innovation law does not match
    ///   `spec.distribution` or has invalid shape values.
    pub fn new(
        spec: ModelSpec, mu: f64, omega: f64, alpha: Array1<f64>, gamma: Array1<f64>,
        beta: Array1<f64>, innovation: Innovation,
    ) -> VolResult<Self> {
        validate_coefficients(&spec, mu, omega, alpha.view(), gamma.view(), beta.view())?;
        if innovation.kind() != spec.distribution {
            return Err(VolError::InvalidParameters {
                reason: format!(
                    "innovation law {} does not match distribution {}",
                    innovation.kind().code(),
                    spec.distribution.code()
                ),
            });
        }
        let innovation = Innovation::from_shape(spec.distribution, &innovation.shape_params())?;
        Ok(GarchParams { spec, mu, omega, alpha, gamma, beta, innovation })
    }

    /// Build from a natural-layout vector.
    pub fn from_vector(spec: &ModelSpec, values: ArrayView1<f64>) -> VolResult<Self> {
        if values.len() != spec.n_params() {
            return Err(VolError::LengthMismatch { expected: spec.n_params(), found: values.len() });
        }
        let (q, g, p) = (spec.order.q, spec.n_gamma(), spec.order.p);
        let mut at = 0;
        let mu = if spec.mean == MeanSpec::Constant {
            at = 1;
            values[0]
        } else {
            0.0
        };
        let omega = values[at];
        at += 1;
        let alpha = values.slice(s![at..at + q]).to_owned();
        at += q;
        let gamma = values.slice(s![at..at + g]).to_owned();
        at += g;
        let beta = values.slice(s![at..at + p]).to_owned();
        at += p;
        let shape: Vec<f64> = values.slice(s![at..]).to_vec();
        let innovation = Innovation::from_shape(spec.distribution, &shape)?;
        GarchParams::new(*spec, mu, omega, alpha, gamma, beta, innovation)
    }

    /// Natural-layout vector (see [`ModelSpec::param_names`]).
    pub fn to_vector(&self) -> Array1<f64> {
        let mut out = Vec::with_capacity(self.spec.n_params());
        if self.spec.mean == MeanSpec::Constant {
            out.push(self.mu);
        }
        out.push(self.omega);
        out.extend(self.alpha.iter());
        out.extend(self.gamma.iter());
        out.extend(self.beta.iter());
        out.extend(self.innovation.shape_params());
        Array1::from(out)
    }

    /// `(name, value)` pairs in canonical order.
    pub fn named(&self) -> Vec<(String, f64)> {
        self.spec.param_names().into_iter().zip(self.to_vector().iter().copied()).collect()
    }

    pub fn moments(&self) -> VolResult<InnovationMoments> {
        self.innovation.moments()
    }

    /// Persistence of the recursion.
    ///
    /// - sGARCH: `Σα + Σβ`
    /// - GJR: `Σα + E[z²𝟙(z<0)]·Σγ + Σβ`
    /// - eGARCH: `Σβ`
    /// - TGARCH: `(E|z|/2)·(Σα + Σγ) + Σβ`
    pub fn persistence(&self) -> VolResult<f64> {
        let m = self.moments()?;
        let (sa, sg, sb) = (self.alpha.sum(), self.gamma.sum(), self.beta.sum());
        Ok(match self.spec.variant {
            GarchVariant::SGarch => sa + sb,
            GarchVariant::GjrGarch => sa + m.neg_sq_mean * sg + sb,
            GarchVariant::EGarch => sb,
            GarchVariant::TGarch => 0.5 * m.abs_mean * (sa + sg) + sb,
        })
    }

    /// Strict stationarity: persistence finite and `< 1`.
    pub fn is_stationary(&self) -> bool {
        self.persistence().map(|p| p.is_finite() && p < 1.0).unwrap_or(false)
    }

    /// Long-run volatility level the forecasts revert to, `None` when the
    /// recursion is not stationary.
    ///
    /// sGARCH/GJR: `√(ω/(1−P))`; TGARCH: `ω/(1−P)` (= E[σ]); eGARCH:
    /// `exp(ω / (2(1−Σβ)))`.
    pub fn long_run_sigma(&self) -> Option<f64> {
        if !self.is_stationary() {
            return None;
        }
        let p = self.persistence().ok()?;
        let level = match self.spec.variant {
            GarchVariant::SGarch | GarchVariant::GjrGarch => (self.omega / (1.0 - p)).sqrt(),
            GarchVariant::TGarch => self.omega / (1.0 - p),
            GarchVariant::EGarch => (0.5 * self.omega / (1.0 - p)).exp(),
        };
        Some(level)
    }

    /// Long-run variance `σ̄²`, `None` when not stationary.
    pub fn long_run_variance(&self) -> Option<f64> {
        self.long_run_sigma().map(|s| s * s)
    }

    /// Default starting point for estimation.
    ///
    /// Coefficients start at a persistence near 0.9 and `ω` is chosen so the
    /// long-run level matches the sample variance.
    pub fn starting(spec: &ModelSpec, series: &ReturnSeries) -> VolResult<Self> {
        let (q, p) = (spec.order.q as f64, spec.order.p);
        let innovation = Innovation::starting(spec.distribution);
        let m = innovation.moments()?;
        let var = series.variance();
        let mu = if spec.mean == MeanSpec::Constant { series.mean() } else { 0.0 };

        let beta_total = match (spec.variant, p) {
            (_, 0) => 0.0,
            (GarchVariant::EGarch, _) => 0.9,
            _ => 0.8,
        };
        let beta = Array1::from_elem(p, beta_total / p.max(1) as f64);
        let (alpha_total, gamma_total) = match spec.variant {
            GarchVariant::SGarch => (0.1, 0.0),
            GarchVariant::GjrGarch | GarchVariant::TGarch => (0.05, 0.1),
            GarchVariant::EGarch => (0.1, -0.05),
        };
        let alpha = Array1::from_elem(spec.order.q, alpha_total / q);
        let gamma = Array1::from_elem(spec.n_gamma(), gamma_total / q);

        let persistence = match spec.variant {
            GarchVariant::SGarch => alpha_total + beta_total,
            GarchVariant::GjrGarch => alpha_total + m.neg_sq_mean * gamma_total + beta_total,
            GarchVariant::EGarch => beta_total,
            GarchVariant::TGarch => 0.5 * m.abs_mean * (alpha_total + gamma_total) + beta_total,
        };
        let omega = match spec.variant {
            GarchVariant::SGarch | GarchVariant::GjrGarch => var * (1.0 - persistence),
            GarchVariant::TGarch => var.sqrt() * (1.0 - persistence),
            GarchVariant::EGarch => var.ln() * (1.0 - persistence),
        };
        GarchParams::new(*spec, mu, omega, alpha, gamma, beta, innovation)
    }

    /// Decode an optimizer-space vector.
    ///
    /// Errors
    /// ------
    /// - `VolError::LengthMismatch` if `theta.len() != spec.n_params()`.
    /// - `VolError::InvalidParameters` / `InvalidShape` if the decoded
    ///   values are not finite (θ itself non-finite).
    pub fn from_theta(
        spec: &ModelSpec, theta: ArrayView1<f64>, scale: &ThetaScale,
    ) -> VolResult<Self> {
        if theta.len() != spec.n_params() {
            return Err(VolError::LengthMismatch { expected: spec.n_params(), found: theta.len() });
        }
        let layout = Layout::of(spec);

        let innovation = match spec.distribution {
            DistributionKind::Normal => Innovation::Normal,
            DistributionKind::StudentT => {
                Innovation::student_t(2.0 + MIN_SHAPE_GAP + safe_softplus(theta[layout.shape]))?
            }
            DistributionKind::SkewStudentT => Innovation::skew_student_t(
                2.0 + MIN_SHAPE_GAP + safe_softplus(theta[layout.shape]),
                MIN_SKEW + safe_softplus(theta[layout.shape + 1]),
            )?,
        };
        let m = innovation.moments()?;

        let mu = match spec.mean {
            MeanSpec::Constant => scale.mean + scale.sd * theta[0],
            MeanSpec::Zero => 0.0,
        };
        let t_omega = theta[layout.omega];
        let omega = match spec.variant {
            GarchVariant::SGarch | GarchVariant::GjrGarch => {
                scale.sd * scale.sd * safe_softplus(t_omega)
            }
            GarchVariant::TGarch => scale.sd * safe_softplus(t_omega),
            GarchVariant::EGarch => t_omega,
        };

        let (q, g, p) = (spec.order.q, spec.n_gamma(), spec.order.p);
        let (alpha, gamma, beta) = match spec.variant {
            GarchVariant::EGarch => {
                let alpha = theta.slice(s![layout.alpha..layout.alpha + q]).to_owned();
                let gamma = theta.slice(s![layout.alpha + q..layout.alpha + q + g]).to_owned();
                let w = simplex_weights(theta.slice(s![layout.beta..layout.beta + p]));
                (alpha, gamma, Array1::from(w))
            }
            _ => {
                let w = simplex_weights(theta.slice(s![layout.alpha..layout.beta + p]));
                let (a_scale, g_scale) = match spec.variant {
                    GarchVariant::GjrGarch => (1.0, m.neg_sq_mean),
                    GarchVariant::TGarch => (0.5 * m.abs_mean, 0.5 * m.abs_mean),
                    _ => (1.0, 1.0),
                };
                let alpha = Array1::from_iter(w[..q].iter().map(|v| v / a_scale));
                let gamma = Array1::from_iter(w[q..q + g].iter().map(|v| v / g_scale));
                let beta = Array1::from(w[q + g..].to_vec());
                (alpha, gamma, beta)
            }
        };
        GarchParams::new(*spec, mu, omega, alpha, gamma, beta, innovation)
    }

    /// Encode into optimizer space; inverse of [`GarchParams::from_theta`]
    /// up to the floors applied to boundary values.
    pub fn to_theta(&self, scale: &ThetaScale) -> VolResult<Array1<f64>> {
        let spec = &self.spec;
        let layout = Layout::of(spec);
        let m = self.moments()?;
        let mut theta = Array1::<f64>::zeros(spec.n_params());

        if spec.mean == MeanSpec::Constant {
            theta[0] = (self.mu - scale.mean) / scale.sd;
        }
        theta[layout.omega] = match spec.variant {
            GarchVariant::SGarch | GarchVariant::GjrGarch => {
                safe_softplus_inv(self.omega / (scale.sd * scale.sd))
            }
            GarchVariant::TGarch => safe_softplus_inv(self.omega / scale.sd),
            GarchVariant::EGarch => self.omega,
        };

        let (q, g) = (spec.order.q, spec.n_gamma());
        let weights: Vec<f64> = match spec.variant {
            GarchVariant::EGarch => {
                theta.slice_mut(s![layout.alpha..layout.alpha + q]).assign(&self.alpha);
                theta.slice_mut(s![layout.alpha + q..layout.alpha + q + g]).assign(&self.gamma);
                self.beta.to_vec()
            }
            GarchVariant::SGarch => self.alpha.iter().chain(self.beta.iter()).copied().collect(),
            GarchVariant::GjrGarch => self
                .alpha
                .iter()
                .copied()
                .chain(self.gamma.iter().map(|v| v.max(0.0) * m.neg_sq_mean))
                .chain(self.beta.iter().copied())
                .collect(),
            GarchVariant::TGarch => self
                .alpha
                .iter()
                .chain(self.gamma.iter())
                .map(|v| v * 0.5 * m.abs_mean)
                .chain(self.beta.iter().copied())
                .collect(),
        };
        let logits = simplex_logits(&weights);
        let start = if spec.variant == GarchVariant::EGarch { layout.beta } else { layout.alpha };
        for (slot, v) in theta.slice_mut(s![start..start + logits.len()]).iter_mut().zip(logits) {
            *slot = v;
        }

        match self.innovation {
            Innovation::Normal => {}
            Innovation::StudentT { nu } => {
                theta[layout.shape] = safe_softplus_inv((nu - 2.0 - MIN_SHAPE_GAP).max(1e-8));
            }
            Innovation::SkewStudentT { nu, xi } => {
                theta[layout.shape] = safe_softplus_inv((nu - 2.0 - MIN_SHAPE_GAP).max(1e-8));
                theta[layout.shape + 1] = safe_softplus_inv((xi - MIN_SKEW).max(1e-8));
            }
        }
        Ok(theta)
    }
}

/// Start offsets of each block in the natural / θ layout.
#[derive(Debug, Clone, Copy)]
struct Layout {
    omega: usize,
    alpha: usize,
    beta: usize,
    shape: usize,
}

impl Layout {
    fn of(spec: &ModelSpec) -> Self {
        let omega = usize::from(spec.mean == MeanSpec::Constant);
        let alpha = omega + 1;
        let beta = alpha + spec.order.q + spec.n_gamma();
        Layout { omega, alpha, beta, shape: beta + spec.order.p }
    }
}

/// Scaled-simplex weights for `k` logits with an implicit zero slack logit.
fn simplex_weights(logits: ArrayView1<f64>) -> Vec<f64> {
    let mut full: Vec<f64> = logits.to_vec();
    full.push(0.0);
    let mut out = vec![0.0; full.len()];
    safe_softmax(&full, &mut out);
    out.pop();
    out.iter().map(|w| w * (1.0 - STATIONARITY_MARGIN)).collect()
}

/// Logits (slack dropped) whose [`simplex_weights`] reproduce `weights`.
fn simplex_logits(weights: &[f64]) -> Vec<f64> {
    let mass = 1.0 - STATIONARITY_MARGIN;
    let mut normalized: Vec<f64> = weights.iter().map(|w| w / mass).collect();
    let slack = 1.0 - normalized.iter().sum::<f64>();
    normalized.push(slack);
    let mut logits = softmax_logits(&normalized);
    logits.pop();
    logits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volatility::core::spec::ModelOrder;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Natural-vector layout and validation.
    // - Persistence and long-run levels per variant.
    // - θ ↔ parameter mapping: admissibility for arbitrary θ and recovery of
    //   interior parameter values.
    //
    // They intentionally DO NOT cover:
    // - Likelihood evaluation (see `variance`).
    // -------------------------------------------------------------------------

    fn scale() -> ThetaScale {
        ThetaScale { mean: 1e-4, sd: 0.01 }
    }

    #[test]
    // Purpose
    // -------
    // `from_vector` and `to_vector` use the canonical layout.
    //
    // Given
    // -----
    // - GJR(1,1)-std with mu, omega, alpha, gamma, beta, shape.
    //
    // Expect
    // ------
    // - Named values follow `param_names`.
    fn natural_vector_round_trips_through_named_layout() {
        let spec = ModelSpec::garch11(GarchVariant::GjrGarch, DistributionKind::StudentT);
        let v = array![1e-4, 2e-6, 0.05, 0.1, 0.85, 7.0];

        let params = GarchParams::from_vector(&spec, v.view()).expect("valid vector");

        assert_eq!(params.to_vector(), v);
        let named = params.named();
        assert_eq!(named[3].0, "gamma1");
        assert_eq!(named[5], ("shape".to_string(), 7.0));
    }

    #[test]
    // Purpose
    // -------
    // Persistence and long-run volatility follow the documented formulas.
    //
    // Given
    // -----
    // - sGARCH(1,1)-norm with ω = 1e-6, α = 0.1, β = 0.85.
    // - The same values with β = 0.95 (non-stationary).
    //
    // Expect
    // ------
    // - P = 0.95, σ̄ = √(1e-6 / 0.05); non-stationary gives `None`.
    fn sgarch_persistence_and_long_run_level() {
        let spec = ModelSpec::garch11(GarchVariant::SGarch, DistributionKind::Normal);
        let p = GarchParams::from_vector(&spec, array![0.0, 1e-6, 0.1, 0.85].view())
            .expect("valid");
        assert_abs_diff_eq!(p.persistence().expect("moments"), 0.95, epsilon = 1e-12);
        assert_abs_diff_eq!(
            p.long_run_sigma().expect("stationary"),
            (1e-6f64 / 0.05).sqrt(),
            epsilon = 1e-12
        );

        let np = GarchParams::from_vector(&spec, array![0.0, 1e-6, 0.1, 0.95].view())
            .expect("domain-valid");
        assert!(!np.is_stationary());
        assert!(np.long_run_sigma().is_none());
    }

    #[test]
    // Purpose
    // -------
    // GJR persistence weighs γ by E[z²𝟙(z<0)], which is ½ under the normal.
    //
    // Given
    // -----
    // - α = 0.05, γ = 0.1, β = 0.85.
    //
    // Expect
    // ------
    // - P = 0.05 + 0.05 + 0.85.
    fn gjr_persistence_uses_half_gamma_under_normal() {
        let spec = ModelSpec::garch11(GarchVariant::GjrGarch, DistributionKind::Normal);
        let p = GarchParams::from_vector(&spec, array![0.0, 1e-6, 0.05, 0.1, 0.85].view())
            .expect("valid");
        assert_abs_diff_eq!(p.persistence().expect("moments"), 0.95, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Any finite θ decodes to an admissible, strictly stationary parameter
    // vector for every variant.
    //
    // Given
    // -----
    // - Extreme θ entries (±30) for each variant with skew-t innovations.
    //
    // Expect
    // ------
    // - Decoding succeeds and `is_stationary()` holds.
    fn any_finite_theta_is_admissible_and_stationary() {
        for variant in GarchVariant::ALL {
            let spec = ModelSpec::new(
                variant,
                ModelOrder::new(2, 1).expect("order"),
                DistributionKind::SkewStudentT,
                MeanSpec::Constant,
            );
            for fill in [-30.0, 0.0, 30.0] {
                let theta = Array1::from_elem(spec.n_params(), fill);
                let params =
                    GarchParams::from_theta(&spec, theta.view(), &scale()).expect("admissible");
                assert!(params.is_stationary(), "{variant} with fill {fill}");
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Encoding then decoding recovers interior parameters.
    //
    // Given
    // -----
    // - Starting values for each variant on a ±1% alternating series.
    //
    // Expect
    // ------
    // - `from_theta(to_theta(p)) ≈ p` elementwise.
    fn theta_mapping_recovers_interior_parameters() {
        let data = Array1::from_iter((0..60).map(|i| if i % 3 == 0 { 0.012 } else { -0.007 }));
        let series = ReturnSeries::new(data).expect("series");
        let sc = ThetaScale::from_series(&series);
        for variant in GarchVariant::ALL {
            let spec = ModelSpec::garch11(variant, DistributionKind::SkewStudentT);
            let start = GarchParams::starting(&spec, &series).expect("start");

            let theta = start.to_theta(&sc).expect("encode");
            let back = GarchParams::from_theta(&spec, theta.view(), &sc).expect("decode");

            for (a, b) in start.to_vector().iter().zip(back.to_vector().iter()) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-9 * (1.0 + a.abs()));
            }
        }
    }
}
