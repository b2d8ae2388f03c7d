//! Numerical stability utilities.
//!
//! Provides safe implementations of the nonlinear transforms used to map an
//! unconstrained optimizer vector θ onto constrained volatility parameters.
//! The functions here follow guarded strategies similar to those in major ML
//! libraries, using explicit cutoffs (`x > 20.0`) and max-shifted
//! exponentials to keep `f64` arithmetic in a well-conditioned regime.
//!
//! # Provided items
//! - [`STATIONARITY_MARGIN`]: a small ε buffer (1e-6) that keeps persistence
//!   strictly below one (e.g. ∑α + ∑β < 1 in sGARCH).
//! - [`EIGEN_EPS`]: eigenvalue floor when pseudo-inverting information
//!   matrices.
//! - [`safe_softplus`] / [`safe_softplus_inv`]: ℝ ↔ (0, ∞).
//! - [`safe_softmax`] / [`softmax_logits`]: ℝᵏ ↔ the open probability
//!   simplex, used for persistence budgets.

/// Safety margin for strict stationarity.
///
/// Persistence budgets are scaled to `1 − STATIONARITY_MARGIN`, so the
/// recursion always runs strictly inside the stable region.
pub const STATIONARITY_MARGIN: f64 = 1e-6;

/// Eigenvalues of an information matrix at or below this value are treated
/// as zero when forming a pseudo-inverse.
pub const EIGEN_EPS: f64 = 1e-10;

/// Smallest simplex weight produced when inverting a softmax for starting
/// values; keeps every logit finite.
pub const MIN_SIMPLEX_WEIGHT: f64 = 1e-6;

/// Numerically stable softplus: `softplus(x) = ln(1 + exp(x))`.
///
/// - For sufficiently large `x`, `softplus(x) ≈ x`.
/// - Otherwise, it evaluates `ln1p(exp(x))`, which is accurate for large
///   negative `x`.
///
/// # Parameters
/// - `x`: real input
///
/// # Returns
/// - `softplus(x)` as `f64`, strictly positive for finite `x`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 {
        x
    } else {
        x.exp().ln_1p()
    }
}

/// Stable inverse of softplus on `(0, ∞)`: returns `t = ln(exp(x) − 1)`.
///
/// # Parameters
/// - `x`: a positive real (the softplus output), must be finite and `> 0`.
///
/// # Returns
/// - `t` such that `softplus(t) = x`.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 {
        x
    } else {
        x.exp_m1().ln()
    }
}

/// Max-shifted softmax written into `out`.
///
/// `out[i] = exp(x[i] − max x) / Σ_j exp(x[j] − max x)`. All outputs are in
/// `(0, 1)` and sum to one; `out` must have the same length as `logits`.
pub fn safe_softmax(logits: &[f64], out: &mut [f64]) {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for (o, &l) in out.iter_mut().zip(logits) {
        *o = (l - max).exp();
        total += *o;
    }
    for o in out.iter_mut() {
        *o /= total;
    }
}

/// Logits whose softmax reproduces `weights` after renormalization.
///
/// Weights are floored at [`MIN_SIMPLEX_WEIGHT`] so boundary starting values
/// still map to finite logits. The logits are centred on the last entry,
/// which conventionally holds the slack weight.
pub fn softmax_logits(weights: &[f64]) -> Vec<f64> {
    let floored: Vec<f64> = weights.iter().map(|w| w.max(MIN_SIMPLEX_WEIGHT)).collect();
    let anchor = floored.last().copied().unwrap_or(1.0).ln();
    floored.iter().map(|w| w.ln() - anchor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Softplus / inverse agreement on a moderate grid and in the tails.
    // - Softmax normalization and its inversion through `softmax_logits`.
    //
    // They intentionally DO NOT cover:
    // - How model code partitions the softmax output into coefficients.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // `safe_softplus_inv` must invert `safe_softplus` across regimes.
    //
    // Given
    // -----
    // - Inputs spanning the negative tail, zero, and the linear regime.
    //
    // Expect
    // ------
    // - `softplus_inv(softplus(x)) ≈ x`.
    fn softplus_inverse_recovers_input() {
        for &x in &[-15.0, -2.0, 0.0, 1.5, 25.0] {
            let y = safe_softplus(x);
            assert!(y > 0.0);
            assert_abs_diff_eq!(safe_softplus_inv(y), x, epsilon = 1e-8);
        }
    }

    #[test]
    // Purpose
    // -------
    // Softmax outputs form a probability vector and invert via logits.
    //
    // Given
    // -----
    // - Target weights `[0.1, 0.85, 0.05]`.
    //
    // Expect
    // ------
    // - `safe_softmax(softmax_logits(w)) ≈ w`, entries sum to one.
    fn softmax_of_logits_reproduces_weights() {
        // Arrange
        let w = [0.1, 0.85, 0.05];

        // Act
        let logits = softmax_logits(&w);
        let mut out = [0.0; 3];
        safe_softmax(&logits, &mut out);

        // Assert
        assert_abs_diff_eq!(out.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        for (a, b) in out.iter().zip(w.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Large logits must not overflow.
    //
    // Given
    // -----
    // - Logits `[800.0, 0.0]`.
    //
    // Expect
    // ------
    // - Finite outputs with the first weight ≈ 1.
    fn softmax_is_stable_for_large_logits() {
        let mut out = [0.0; 2];
        safe_softmax(&[800.0, 0.0], &mut out);
        assert!(out.iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(out[0], 1.0, epsilon = 1e-12);
    }
}
