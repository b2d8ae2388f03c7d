//! inference::hessian — observed-information covariance and standard errors.
//!
//! Purpose
//! -------
//! Turn a finite-difference Hessian of a negative log-likelihood into a
//! numerically stable covariance matrix and standard errors, and carry that
//! covariance from the optimizer's unconstrained θ-space to the natural
//! parameter space with the delta method.
//!
//! Key behaviors
//! -------------
//! - Call [`compute_hessian`] on the gradient of the **negative**
//!   log-likelihood to obtain the observed information `J(θ̂)`.
//! - Copy the `ndarray` Hessian into a `nalgebra::DMatrix`
//!   (`fill_dmatrix`) and form the Moore–Penrose pseudoinverse from a
//!   symmetric eigendecomposition.
//! - Build finite-difference Jacobians of parameter maps ([`jacobian`]) and
//!   push covariances through them ([`delta_method`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - [`compute_hessian`] returns a finite, symmetric `n×n` matrix with
//!   `n = θ̂.len()`; this module does not re-symmetrize.
//! - Eigenvalues at most [`EIGEN_EPS`] are treated as zero. Directions the
//!   likelihood does not identify therefore get zero variance rather than a
//!   huge one; callers that care should inspect the spectrum themselves.
//!
//! Conventions
//! -----------
//! - Hessians are on the **summed** log-likelihood scale, so the covariance
//!   is the usual `J⁻¹` without a `1/n` factor.
//! - No explicit matrix inverse is formed.
//! - Errors are reported via [`OptResult<T>`].
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        finite_diff::compute_hessian,
        types::{Grad, Theta},
    },
    numerical_stability::transformations::EIGEN_EPS,
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// calc_covariance — pseudoinverse of the observed information.
///
/// Parameters
/// ----------
/// - `f`: `&F`
///   Gradient map of the negative log-likelihood, `θ ↦ ∇c(θ)`.
/// - `theta_hat`: `&Theta`
///   Point at which the information is evaluated.
///
/// Returns
/// -------
/// `OptResult<Array2<f64>>`
///   Symmetric `n×n` covariance `J(θ̂)⁺`.
///
/// Errors
/// ------
/// - Any error from [`compute_hessian`] (dimension mismatch, non-finite
///   entries).
pub fn calc_covariance<F: Fn(&Theta) -> Grad>(f: &F, theta_hat: &Theta) -> OptResult<Array2<f64>> {
    let obs_info = compute_hessian(f, theta_hat)?;
    let mut obs_info_nalg = DMatrix::<f64>::zeros(obs_info.nrows(), obs_info.ncols());
    fill_dmatrix(&obs_info, &mut obs_info_nalg);
    Ok(pseudo_inverse(obs_info_nalg))
}

/// calc_standard_errors — square roots of the diagonal of [`calc_covariance`].
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use rust_volatility::inference::hessian::calc_standard_errors;
/// // c(θ) = ½ θᵀ A θ with A = diag(4, 1), so ∇c(θ) = A θ.
/// let a = array![[4.0, 0.0], [0.0, 1.0]];
/// let f = |theta: &ndarray::Array1<f64>| a.dot(theta);
///
/// let se = calc_standard_errors(&f, &array![1.0, -1.0])?;
/// assert!((se[0] - 0.5).abs() < 1e-6);
/// assert!((se[1] - 1.0).abs() < 1e-6);
/// # Ok::<(), rust_volatility::optimization::errors::OptError>(())
/// ```
pub fn calc_standard_errors<F: Fn(&Theta) -> Grad>(
    f: &F, theta_hat: &Theta,
) -> OptResult<Array1<f64>> {
    let cov = calc_covariance(f, theta_hat)?;
    Ok(standard_errors(&cov))
}

/// Square roots of a covariance diagonal. Tiny negative values produced by
/// rounding are reported as zero.
pub fn standard_errors(cov: &Array2<f64>) -> Array1<f64> {
    cov.diag().mapv(|v| v.max(0.0).sqrt())
}

/// jacobian — central-difference Jacobian of a vector map.
///
/// Row `i` holds the derivatives of output `i`; column `j` those with
/// respect to `θ_j`. The map may fail (e.g. a model rejecting a bumped
/// point); the first failure is returned.
///
/// Errors
/// ------
/// - Whatever `map` returns.
/// - `OptError::InvalidHessian` when a derivative is not finite.
pub fn jacobian<M>(map: &M, theta: &Theta, step: f64) -> OptResult<Array2<f64>>
where
    M: Fn(&Theta) -> OptResult<Array1<f64>>,
{
    let base = map(theta)?;
    let mut jac = Array2::<f64>::zeros((base.len(), theta.len()));
    let mut bumped = theta.clone();
    for j in 0..theta.len() {
        let x = theta[j];
        bumped[j] = x + step;
        let up = map(&bumped)?;
        bumped[j] = x - step;
        let down = map(&bumped)?;
        bumped[j] = x;
        for i in 0..base.len() {
            let d = (up[i] - down[i]) / (2.0 * step);
            if !d.is_finite() {
                return Err(OptError::InvalidHessian { row: i, col: j, value: d });
            }
            jac[[i, j]] = d;
        }
    }
    Ok(jac)
}

/// delta_method — `G Σ Gᵀ` for a Jacobian `G` and covariance `Σ`.
///
/// Errors
/// ------
/// - `OptError::HessianDimMismatch` when `Σ` is not `k×k` with
///   `k = G.ncols()`.
pub fn delta_method(cov: &Array2<f64>, jac: &Array2<f64>) -> OptResult<Array2<f64>> {
    let k = jac.ncols();
    if cov.dim() != (k, k) {
        return Err(OptError::HessianDimMismatch { expected: k, found: cov.dim() });
    }
    Ok(jac.dot(cov).dot(&jac.t()))
}

// ---- Helper methods ----

/// Copy a square `ndarray` matrix into a preallocated `DMatrix`, column by
/// column.
fn fill_dmatrix(obs_info: &Array2<f64>, obs_info_nalg: &mut DMatrix<f64>) {
    let n = obs_info.ncols();
    for j in 0..n {
        for i in 0..n {
            obs_info_nalg[(i, j)] = obs_info[[i, j]];
        }
    }
}

/// Moore–Penrose pseudoinverse `Σ_{λ_k > EIGEN_EPS} q_k q_kᵀ / λ_k` of a
/// symmetric matrix.
fn pseudo_inverse(obs_info_nalg: DMatrix<f64>) -> Array2<f64> {
    let n = obs_info_nalg.nrows();
    let eigen_decomp = obs_info_nalg.symmetric_eigen();
    let q = eigen_decomp.eigenvectors;
    let eigenvals = eigen_decomp.eigenvalues;
    let mut cov = Array2::<f64>::zeros((n, n));
    for (k, &lambda) in eigenvals.iter().enumerate() {
        if lambda <= EIGEN_EPS {
            continue;
        }
        for i in 0..n {
            let qi = q[(i, k)] / lambda;
            for j in 0..n {
                cov[[i, j]] += qi * q[(j, k)];
            }
        }
    }
    cov
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Copying from `ndarray` into `DMatrix`.
    // - Covariance and SEs for quadratics with known information matrices.
    // - Truncation of non-positive eigen-directions.
    // - Jacobians and the delta method for a simple reparameterization.
    //
    // They intentionally DO NOT cover:
    // - GARCH likelihoods (see `volatility::models`).
    // - Pathological cases where `compute_hessian` itself fails.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // `fill_dmatrix` copies entries without modification.
    //
    // Given
    // -----
    // - A 2×2 matrix with distinct entries.
    //
    // Expect
    // ------
    // - Identical entries at all positions.
    fn fill_dmatrix_copies_ndarray_into_dmatrix_without_modification() {
        // Arrange
        let obs_info: Array2<f64> = array![[2.0, 0.5], [0.5, 1.0]];
        let mut obs_info_nalg = DMatrix::<f64>::zeros(2, 2);

        // Act
        fill_dmatrix(&obs_info, &mut obs_info_nalg);

        // Assert
        assert_eq!(obs_info_nalg[(0, 0)], 2.0);
        assert_eq!(obs_info_nalg[(0, 1)], 0.5);
        assert_eq!(obs_info_nalg[(1, 0)], 0.5);
        assert_eq!(obs_info_nalg[(1, 1)], 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Covariance equals the analytic inverse of a non-diagonal information.
    //
    // Given
    // -----
    // - ∇c(θ) = A θ with A = [[2, 1], [1, 2]], whose inverse is
    //   [[2, −1], [−1, 2]] / 3.
    //
    // Expect
    // ------
    // - `calc_covariance` ≈ A⁻¹ and SEs ≈ √(2/3).
    fn calc_covariance_inverts_non_diagonal_information() {
        // Arrange
        let a = array![[2.0, 1.0], [1.0, 2.0]];
        let f = |theta: &Theta| -> Grad { a.dot(theta) };
        let theta_hat = array![0.3, -0.7];

        // Act
        let cov = calc_covariance(&f, &theta_hat).expect("covariance");
        let se = calc_standard_errors(&f, &theta_hat).expect("standard errors");

        // Assert
        assert_abs_diff_eq!(cov[[0, 0]], 2.0 / 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cov[[0, 1]], -1.0 / 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cov[[1, 0]], -1.0 / 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(se[1], (2.0f64 / 3.0).sqrt(), epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // Flat directions are dropped from the pseudoinverse.
    //
    // Given
    // -----
    // - ∇c(θ) = A θ with A = diag(4, 0).
    //
    // Expect
    // ------
    // - Variance 1/4 for the first parameter and 0 for the second.
    fn singular_information_drops_flat_directions() {
        let a = array![[4.0, 0.0], [0.0, 0.0]];
        let f = |theta: &Theta| -> Grad { a.dot(theta) };

        let cov = calc_covariance(&f, &array![1.0, 1.0]).expect("covariance");

        assert_abs_diff_eq!(cov[[0, 0]], 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(cov[[1, 1]], 0.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The delta method reproduces the textbook variance of exp(θ).
    //
    // Given
    // -----
    // - θ = (ln 2, 0) with covariance diag(0.01, 0.04) and the map
    //   θ ↦ (exp θ₀, 3 θ₁).
    //
    // Expect
    // ------
    // - Jacobian ≈ diag(2, 3); Var = (4·0.01, 9·0.04).
    fn delta_method_maps_covariance_through_jacobian() {
        // Arrange
        let map = |t: &Theta| -> OptResult<Array1<f64>> { Ok(array![t[0].exp(), 3.0 * t[1]]) };
        let theta = array![2.0f64.ln(), 0.0];
        let cov = array![[0.01, 0.0], [0.0, 0.04]];

        // Act
        let jac = jacobian(&map, &theta, 1e-6).expect("jacobian");
        let out = delta_method(&cov, &jac).expect("delta method");

        // Assert
        assert_abs_diff_eq!(jac[[0, 0]], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(jac[[1, 1]], 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out[[0, 0]], 0.04, epsilon = 1e-8);
        assert_abs_diff_eq!(out[[1, 1]], 0.36, epsilon = 1e-8);
        assert_abs_diff_eq!(out[[0, 1]], 0.0, epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Shape mismatches and failing maps surface as errors.
    //
    // Given
    // -----
    // - A 2×3 Jacobian with a 2×2 covariance; a map that always fails.
    //
    // Expect
    // ------
    // - `HessianDimMismatch` and the map's own error respectively.
    fn mismatches_and_map_failures_are_reported() {
        let jac = Array2::<f64>::zeros((2, 3));
        let cov = Array2::<f64>::eye(2);
        assert!(matches!(
            delta_method(&cov, &jac),
            Err(OptError::HessianDimMismatch { expected: 3, .. })
        ));

        let failing = |_: &Theta| -> OptResult<Array1<f64>> {
            Err(OptError::ModelDomain { reason: "outside".to_string() })
        };
        assert!(matches!(
            jacobian(&failing, &array![0.0], 1e-6),
            Err(OptError::ModelDomain { .. })
        ));
    }
}
