//! Distribution distances between innovation samples.
//!
//! Used to compare externally supplied innovations with draws from a
//! fitted law (or with standardized residuals) before they drive a
//! simulation. Both measures work on the empirical CDFs of the two samples.
use ndarray::ArrayView1;
use serde::Serialize;

use crate::{evaluation::metrics::check_values, volatility::errors::VolResult};

/// Two-sample Kolmogorov–Smirnov result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KsOutcome {
    /// `D = sup_x |F_a(x) − F_b(x)|`.
    pub statistic: f64,
    /// Asymptotic p-value from the Kolmogorov distribution.
    pub p_value: f64,
}

/// Two-sample KS test.
///
/// The p-value uses the effective size `nₑ = n_a·n_b/(n_a+n_b)` with the
/// Stephens small-sample correction `λ = (√nₑ + 0.12 + 0.11/√nₑ)·D`.
///
/// Errors
/// ------
/// - `VolError::EmptyInput` or `VolError::NonFiniteInput` for unusable
///   samples.
pub fn ks_two_sample(a: ArrayView1<f64>, b: ArrayView1<f64>) -> VolResult<KsOutcome> {
    let (a, b) = sorted_pair(a, b)?;
    let (na, nb) = (a.len() as f64, b.len() as f64);

    let mut d: f64 = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / na - j as f64 / nb).abs());
    }

    let ne = (na * nb / (na + nb)).sqrt();
    let lambda = (ne + 0.12 + 0.11 / ne) * d;
    Ok(KsOutcome { statistic: d, p_value: kolmogorov_survival(lambda) })
}

/// First Wasserstein distance `∫ |F_a(x) − F_b(x)| dx`.
///
/// Errors
/// ------
/// - `VolError::EmptyInput` or `VolError::NonFiniteInput` for unusable
///   samples.
pub fn wasserstein_1d(a: ArrayView1<f64>, b: ArrayView1<f64>) -> VolResult<f64> {
    let (a, b) = sorted_pair(a, b)?;
    let (na, nb) = (a.len() as f64, b.len() as f64);

    let mut all: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
    all.sort_by(f64::total_cmp);

    let (mut i, mut j) = (0, 0);
    let mut total = 0.0;
    for w in all.windows(2) {
        while i < a.len() && a[i] <= w[0] {
            i += 1;
        }
        while j < b.len() && b[j] <= w[0] {
            j += 1;
        }
        total += (i as f64 / na - j as f64 / nb).abs() * (w[1] - w[0]);
    }
    Ok(total)
}

fn sorted_pair(a: ArrayView1<f64>, b: ArrayView1<f64>) -> VolResult<(Vec<f64>, Vec<f64>)> {
    check_values("first sample", a)?;
    check_values("second sample", b)?;
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);
    Ok((a, b))
}

/// `Q_KS(λ) = 2 Σ_{k≥1} (−1)^{k−1} e^{−2k²λ²}`, clamped to `[0, 1]`.
fn kolmogorov_survival(lambda: f64) -> f64 {
    if lambda < 1e-3 {
        return 1.0;
    }
    let mut sum = 0.0;
    let mut sign = 1.0;
    for k in 1..=100 {
        let term = (-2.0 * (k * k) as f64 * lambda * lambda).exp();
        sum += sign * term;
        if term < 1e-12 {
            break;
        }
        sign = -sign;
    }
    (2.0 * sum).clamp(0.0, 1.0)
}
