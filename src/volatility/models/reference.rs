//! Reference GARCH estimator: natural-space likelihood, Nelder–Mead search.
//!
//! [`ReferenceModel`] shares nothing with the hand-built estimator except
//! the variance filter. It optimizes the natural parameter vector directly
//! (no softplus or simplex reparameterization, no gradients) and rejects
//! inadmissible points, including non-stationary ones, with an infinite
//! cost. Agreement between the two engines' log-likelihoods on the same
//! data is therefore a meaningful check of the θ-space wiring.
//!
//! The simplex is restarted once from its best vertex; the fit counts as
//! converged when that restart terminates on its own tolerance.
use tracing::{debug, info, warn};

use crate::{
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{maximize_simplex, LogLikelihood, OptimOutcome, Theta},
    },
    volatility::{
        core::{
            data::ReturnSeries,
            options::FitOptions,
            params::GarchParams,
            spec::ModelSpec,
            validation::validate_theta,
            variance::{filter, log_likelihood},
        },
        errors::{VolError, VolResult},
        models::fitted::{Engine, FittedModel},
    },
};

/// Derivative-free estimator over natural parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceModel {
    pub spec: ModelSpec,
    pub options: FitOptions,
}

impl ReferenceModel {
    pub fn new(spec: ModelSpec, options: FitOptions) -> Self {
        ReferenceModel { spec, options }
    }

    /// Fit by maximum likelihood with a restarted Nelder–Mead simplex.
    ///
    /// Errors
    /// ------
    /// - Errors from building the starting point.
    /// - `VolError::NumericalDefect` when the search claims convergence but
    ///   the re-evaluated log-likelihood is not finite.
    pub fn fit(&self, series: &ReturnSeries) -> VolResult<FittedModel> {
        let start = GarchParams::starting(&self.spec, series)?;
        debug!(spec = %self.spec, n_obs = series.len(), "fitting with the reference engine");

        match self.search(start.to_vector(), series) {
            Ok(outcome) => self.finish(series, outcome),
            Err(err) => {
                warn!(spec = %self.spec, error = %err, "reference fit failed");
                let filtered = filter(&start, series, &self.options.init)?;
                Ok(FittedModel::failed(start, filtered, err.to_string(), Engine::Reference))
            }
        }
    }

    fn search(&self, x0: Theta, series: &ReturnSeries) -> OptResult<OptimOutcome> {
        let opts = &self.options.simplex_opts;
        let first = maximize_simplex(self, x0, series, opts)?;
        let mut second = maximize_simplex(self, first.theta_hat.clone(), series, opts)?;
        second.iterations += first.iterations;
        if second.value >= first.value {
            return Ok(second);
        }
        Ok(OptimOutcome { converged: second.converged, iterations: second.iterations, ..first })
    }

    fn finish(&self, series: &ReturnSeries, outcome: OptimOutcome) -> VolResult<FittedModel> {
        let params = GarchParams::from_vector(&self.spec, outcome.theta_hat.view())?;
        let filtered = filter(&params, series, &self.options.init)?;
        let loglik = filtered.log_likelihood;
        if outcome.converged && !loglik.is_finite() {
            return Err(VolError::NumericalDefect {
                step: 0,
                value: loglik,
                reason: "log-likelihood is not finite after a converged fit",
            });
        }
        let converged = outcome.converged && loglik.is_finite() && params.is_stationary();
        if converged {
            info!(
                spec = %self.spec,
                loglik,
                iterations = outcome.iterations,
                "reference fit converged"
            );
        } else {
            warn!(
                spec = %self.spec,
                loglik,
                status = %outcome.status,
                "reference fit did not converge"
            );
        }
        Ok(FittedModel::new(
            params,
            filtered,
            converged,
            outcome.status,
            outcome.iterations,
            Engine::Reference,
            None,
        ))
    }
}

impl LogLikelihood for ReferenceModel {
    type Data = ReturnSeries;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64> {
        let params = GarchParams::from_vector(&self.spec, theta.view())?;
        if !params.is_stationary() {
            return Err(OptError::ModelDomain { reason: "non-stationary parameters".to_string() });
        }
        Ok(log_likelihood(&params, data, &self.options.init)?)
    }

    fn check(&self, theta: &Theta, _data: &Self::Data) -> OptResult<()> {
        validate_theta(theta.view(), &self.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volatility::core::spec::{DistributionKind, GarchVariant};
    use ndarray::{array, Array1};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Rejection of non-stationary and invalid natural vectors, including a
    //   negative GJR leverage coefficient.
    // - A reference fit on a short deterministic series.
    //
    // They intentionally DO NOT cover:
    // - Agreement with the hand-built engine (see `tests/`).
    // -------------------------------------------------------------------------

    fn series() -> ReturnSeries {
        let data = Array1::from_iter((0..400).map(|i| {
            let burst = if (i / 50) % 2 == 0 { 1.0 } else { 3.0 };
            burst * 0.004 * ((((i * 37) % 23) as f64) - 11.0) / 11.0
        }));
        ReturnSeries::new(data).expect("series")
    }

    #[test]
    // Purpose
    // -------
    // Infeasible natural vectors are domain rejections.
    //
    // Given
    // -----
    // - α + β = 1.05 and a negative ω for sGARCH.
    //
    // Expect
    // ------
    // - `value` errs with a domain rejection in both cases.
    fn infeasible_points_are_domain_rejections() {
        let spec = ModelSpec::garch11(GarchVariant::SGarch, DistributionKind::Normal);
        let model = ReferenceModel::new(spec, FitOptions::default());
        let s = series();

        let explosive = model.value(&array![0.0, 1e-6, 0.2, 0.85], &s);
        let negative = model.value(&array![0.0, -1e-6, 0.1, 0.85], &s);

        assert!(explosive.is_err_and(|e| e.is_domain_rejection()));
        assert!(negative.is_err_and(|e| e.is_domain_rejection()));
    }

    #[test]
    // Purpose
    // -------
    // The natural-space search cannot step into a negative GJR γ, which the
    // θ-space map of the hand-built engine never reaches either.
    //
    // Given
    // -----
    // - GJR(1,1)-norm points (μ, ω, α, γ, β) with γ = 0.05 and γ = −0.05.
    //
    // Expect
    // ------
    // - The first evaluates to a finite log-likelihood; the second is a
    //   domain rejection.
    fn negative_gjr_gamma_is_a_domain_rejection() {
        let spec = ModelSpec::garch11(GarchVariant::GjrGarch, DistributionKind::Normal);
        let model = ReferenceModel::new(spec, FitOptions::default());
        let s = series();

        let admissible = model.value(&array![0.0, 1e-6, 0.1, 0.05, 0.8], &s);
        let leverage_flipped = model.value(&array![0.0, 1e-6, 0.15, -0.05, 0.8], &s);

        assert!(admissible.is_ok_and(|ll| ll.is_finite()));
        assert!(leverage_flipped.is_err_and(|e| e.is_domain_rejection()));
    }

    #[test]
    // Purpose
    // -------
    // The reference engine improves on its starting point.
    //
    // Given
    // -----
    // - A 400-point series with alternating volatility regimes.
    //
    // Expect
    // ------
    // - A fit tagged with the reference engine whose log-likelihood is at
    //   least that of the starting parameters.
    fn reference_fit_improves_on_start() {
        let spec = ModelSpec::garch11(GarchVariant::SGarch, DistributionKind::Normal);
        let model = ReferenceModel::new(spec, FitOptions::default());
        let s = series();
        let start = GarchParams::starting(&spec, &s).expect("start");
        let ll0 = log_likelihood(&start, &s, &model.options.init).expect("ll0");

        let fit = model.fit(&s).expect("fit");

        assert_eq!(fit.engine(), Engine::Reference);
        assert!(fit.log_likelihood() >= ll0);
        assert!(fit.params().is_stationary());
    }
}
