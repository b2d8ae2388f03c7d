//! Validation helpers for the volatility core.
//!
//! Each function checks one invariant and reports the first violation as a
//! structured [`VolError`]. Nothing here clamps, floors, or repairs values;
//! callers either propagate the error or, inside an optimizer, treat it as
//! a rejected parameter region.
use ndarray::ArrayView1;

use crate::{
    optimization::errors::{OptError, OptResult},
    volatility::{
        core::spec::{GarchVariant, MeanSpec, ModelSpec},
        errors::{VolError, VolResult},
    },
};

/// Block lengths must match the order `(p, q)` of `spec`.
pub fn validate_block_lengths(
    spec: &ModelSpec, alpha: ArrayView1<f64>, gamma: ArrayView1<f64>, beta: ArrayView1<f64>,
) -> VolResult<()> {
    for (name, found, expected) in [
        ("alpha", alpha.len(), spec.order.q),
        ("gamma", gamma.len(), spec.n_gamma()),
        ("beta", beta.len(), spec.order.p),
    ] {
        if found != expected {
            return Err(VolError::InvalidParameters {
                reason: format!("{name} has length {found}, expected {expected}"),
            });
        }
    }
    Ok(())
}

/// Every coefficient must be finite.
pub fn validate_finite(name: &str, values: ArrayView1<f64>) -> VolResult<()> {
    if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(VolError::InvalidParameters {
            reason: format!("{name}[{}] = {v} is not finite", i + 1),
        });
    }
    Ok(())
}

fn validate_non_negative(name: &str, values: ArrayView1<f64>) -> VolResult<()> {
    if let Some((i, v)) = values.iter().enumerate().find(|(_, &v)| v < 0.0) {
        return Err(VolError::InvalidParameters {
            reason: format!("{name}[{}] = {v} must be non-negative", i + 1),
        });
    }
    Ok(())
}

/// Variant-specific coefficient domains.
///
/// - sGARCH / GJR / TGARCH: `ω > 0`, `α ≥ 0`, `γ ≥ 0`, `β ≥ 0`. This is
///   the region the simplex map in `params` can reach, so both engines
///   search the same set.
/// - eGARCH: `ω`, `α`, `γ` unrestricted, `β ≥ 0`.
pub fn validate_coefficients(
    spec: &ModelSpec, mu: f64, omega: f64, alpha: ArrayView1<f64>, gamma: ArrayView1<f64>,
    beta: ArrayView1<f64>,
) -> VolResult<()> {
    validate_block_lengths(spec, alpha, gamma, beta)?;
    if !mu.is_finite() || !omega.is_finite() {
        return Err(VolError::InvalidParameters {
            reason: format!("mu = {mu} and omega = {omega} must be finite"),
        });
    }
    if spec.mean == MeanSpec::Zero && mu != 0.0 {
        return Err(VolError::InvalidParameters {
            reason: format!("mu = {mu} but the mean is fixed at zero"),
        });
    }
    validate_finite("alpha", alpha)?;
    validate_finite("gamma", gamma)?;
    validate_finite("beta", beta)?;
    validate_non_negative("beta", beta)?;

    match spec.variant {
        GarchVariant::EGarch => Ok(()),
        GarchVariant::SGarch | GarchVariant::GjrGarch | GarchVariant::TGarch => {
            if omega <= 0.0 {
                return Err(VolError::InvalidParameters {
                    reason: format!("omega = {omega} must be > 0"),
                });
            }
            validate_non_negative("alpha", alpha)?;
            validate_non_negative("gamma", gamma)
        }
    }
}

/// Forecast and simulation horizons start at one.
pub fn validate_horizon(horizon: usize) -> VolResult<()> {
    if horizon == 0 {
        return Err(VolError::InvalidHorizon { horizon });
    }
    Ok(())
}

/// An innovation sequence must cover `horizon` steps with finite values.
pub fn validate_innovations(innovations: ArrayView1<f64>, horizon: usize) -> VolResult<()> {
    validate_horizon(horizon)?;
    if innovations.len() < horizon {
        return Err(VolError::InsufficientInnovations { needed: horizon, found: innovations.len() });
    }
    if let Some((index, &value)) =
        innovations.iter().take(horizon).enumerate().find(|(_, v)| !v.is_finite())
    {
        return Err(VolError::NonFiniteInnovation { index, value });
    }
    Ok(())
}

/// Optimizer vectors must have `spec.n_params()` finite entries.
pub fn validate_theta(theta: ArrayView1<f64>, spec: &ModelSpec) -> OptResult<()> {
    let expected = spec.n_params();
    if theta.len() != expected {
        return Err(OptError::ThetaLengthMismatch { expected, found: theta.len() });
    }
    for (index, &value) in theta.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaInput { index, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volatility::core::spec::DistributionKind;
    use ndarray::{array, Array1};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Per-variant coefficient domains.
    // - Innovation sequence checks.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Negative coefficients are rejected for σ²/σ recursions but eGARCH
    // accepts negative ω and γ.
    //
    // Given
    // -----
    // - α = −0.1 for sGARCH; ω = −0.2, γ = −0.1 for eGARCH.
    //
    // Expect
    // ------
    // - sGARCH errors, eGARCH passes.
    fn coefficient_domains_depend_on_variant() {
        let s = ModelSpec::garch11(GarchVariant::SGarch, DistributionKind::Normal);
        let err = validate_coefficients(
            &s,
            0.0,
            1e-6,
            array![-0.1].view(),
            Array1::<f64>::zeros(0).view(),
            array![0.8].view(),
        );
        assert!(matches!(err, Err(VolError::InvalidParameters { .. })));

        let e = ModelSpec::garch11(GarchVariant::EGarch, DistributionKind::Normal);
        validate_coefficients(
            &e,
            0.0,
            -0.2,
            array![0.1].view(),
            array![-0.1].view(),
            array![0.9].view(),
        )
        .expect("eGARCH allows signed omega and gamma");
    }

    #[test]
    // Purpose
    // -------
    // GJR leverage coefficients must be non-negative on their own; a
    // negative γ is rejected even when α + γ stays non-negative.
    //
    // Given
    // -----
    // - (α, γ) = (0.1, 0.05) and (0.1, −0.05).
    //
    // Expect
    // ------
    // - First accepted, second rejected with `InvalidParameters` naming
    //   `gamma[1]`.
    fn gjr_rejects_negative_gamma() {
        let g = ModelSpec::garch11(GarchVariant::GjrGarch, DistributionKind::Normal);
        let ok = validate_coefficients(
            &g,
            0.0,
            1e-6,
            array![0.1].view(),
            array![0.05].view(),
            array![0.8].view(),
        );
        let bad = validate_coefficients(
            &g,
            0.0,
            1e-6,
            array![0.1].view(),
            array![-0.05].view(),
            array![0.8].view(),
        );

        assert!(ok.is_ok());
        match bad {
            Err(VolError::InvalidParameters { reason }) => assert!(reason.contains("gamma[1]")),
            other => panic!("expected InvalidParameters, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Innovation sequences must be long enough and finite.
    //
    // Given
    // -----
    // - Three innovations with horizon 4, and a NaN at index 1.
    //
    // Expect
    // ------
    // - `InsufficientInnovations`, then `NonFiniteInnovation { index: 1 }`.
    fn innovations_are_checked_for_length_and_finiteness() {
        let z = array![0.1, -0.2, 0.3];
        assert_eq!(
            validate_innovations(z.view(), 4),
            Err(VolError::InsufficientInnovations { needed: 4, found: 3 })
        );
        let bad = array![0.1, f64::NAN, 0.3];
        assert!(matches!(
            validate_innovations(bad.view(), 3),
            Err(VolError::NonFiniteInnovation { index: 1, .. })
        ));
        assert_eq!(validate_innovations(z.view(), 0), Err(VolError::InvalidHorizon { horizon: 0 }));
    }

    #[test]
    // Purpose
    // -------
    // Optimizer vectors are checked for length and finiteness.
    //
    // Given
    // -----
    // - sGARCH(1,1) with a constant mean (4 parameters).
    // - θ of length 3, then θ with an infinite entry at index 2.
    //
    // Expect
    // ------
    // - `ThetaLengthMismatch { expected: 4, found: 3 }`, then
    //   `InvalidThetaInput { index: 2, .. }`.
    fn theta_is_checked_for_length_and_finiteness() {
        let spec = ModelSpec::garch11(GarchVariant::SGarch, DistributionKind::Normal);
        assert_eq!(
            validate_theta(array![0.0, 0.0, 0.0].view(), &spec),
            Err(OptError::ThetaLengthMismatch { expected: 4, found: 3 })
        );
        assert!(matches!(
            validate_theta(array![0.0, 0.0, f64::INFINITY, 0.0].view(), &spec),
            Err(OptError::InvalidThetaInput { index: 2, .. })
        ));
        assert!(validate_theta(array![0.1, -2.0, 0.5, 1.0].view(), &spec).is_ok());
    }
}
