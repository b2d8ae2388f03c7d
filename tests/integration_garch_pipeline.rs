//! Integration tests for the GARCH volatility pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path: validated return series, fitting through
//!   the engine selector, forecasting, simulation, and flat-record export.
//! - Exercise realistic parameter regimes on seeded synthetic series rather
//!   than toy edge cases only.
//!
//! Coverage
//! --------
//! - `volatility::core`:
//!   - `ReturnSeries` rejection of non-finite input.
//!   - Simulation with supplied, seeded, and injected innovations.
//! - `engine`:
//!   - Dispatch by engine name, the unavailable-engine path, and the
//!     cross-engine log-likelihood check.
//!   - `FitRecord` / `write_fit_table` column stability across engines.
//! - `volatility::models`:
//!   - Convergence gating of forecasts and AIC/BIC identities.
//!   - Coefficient signs and stationarity of converged fits for every
//!     variant and engine, including GJR data whose asymmetry points the
//!     "wrong" way.
//!
//! Exclusions
//! ----------
//! - Hand-computed recursion steps, transforms, and optimizer internals;
//!   these are covered by unit tests.
//! - Exhaustive grids over variants, orders, and sample sizes.
use approx::assert_relative_eq;
use ndarray::Array1;
use rand::{rngs::StdRng, SeedableRng};
use rust_volatility::{
    engine::{write_fit_table, Engine, EngineSelector, FitRecord},
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
    volatility::{
        core::{
            options::{FitOptions, ForecastOptions, InjectionOptions},
            params::GarchParams,
            simulation::simulate_path,
            spec::{DistributionKind, GarchVariant, ModelSpec},
            variance::{LagState, Recursion},
            Innovation, ReturnSeries,
        },
        errors::{ErrorKind, VolError},
        models::FittedModel,
    },
};

/// Purpose
/// -------
/// Simulate a return series from known parameters, starting at the
/// long-run variance.
///
/// Invariants
/// ----------
/// - Panics if `params` is not stationary or the simulation fails; both
///   are test configuration errors.
fn simulate_series(params: &GarchParams, n: usize, seed: u64) -> ReturnSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let z = params.innovation.sample(&mut rng, n).expect("innovation draws");
    let rec = Recursion::new(params).expect("recursion");
    let v0 = params.long_run_variance().expect("stationary parameters");
    let lag = LagState { eps: Some(0.0), state: rec.state_from_variance(v0), sigma: v0.sqrt() };
    let path = simulate_path(params, &vec![lag; rec.max_lag()], z.view(), n).expect("path");
    ReturnSeries::new(path.returns).expect("simulated series is valid")
}

/// Purpose
/// -------
/// sGARCH(1,1) with normal innovations, `ω = 1e-6, α = 0.1, β = 0.85`.
fn sgarch_truth() -> (ModelSpec, GarchParams) {
    let spec = ModelSpec::garch11(GarchVariant::SGarch, DistributionKind::Normal);
    let params = GarchParams::new(
        spec,
        0.0,
        1e-6,
        Array1::from(vec![0.1]),
        Array1::zeros(0),
        Array1::from(vec![0.85]),
        Innovation::Normal,
    )
    .expect("valid sGARCH parameters");
    (spec, params)
}

/// Purpose
/// -------
/// GJR(1,1) with normal innovations where negative shocks dominate:
/// `ω = 1e-6, α = 0.02, γ = 0.13, β = 0.8`.
fn gjr_truth() -> (ModelSpec, GarchParams) {
    let spec = ModelSpec::garch11(GarchVariant::GjrGarch, DistributionKind::Normal);
    let params = GarchParams::new(
        spec,
        0.0,
        1e-6,
        Array1::from(vec![0.02]),
        Array1::from(vec![0.13]),
        Array1::from(vec![0.8]),
        Innovation::Normal,
    )
    .expect("valid GJR parameters");
    (spec, params)
}

/// Purpose
/// -------
/// Assert the sign and stationarity rules every converged fit must meet.
///
/// Invariants
/// ----------
/// - sGARCH, GJR, TGARCH: `ω > 0` and all of `α`, `γ`, `β` are `≥ 0`.
/// - eGARCH: only `β ≥ 0` (log-variance recursion).
fn assert_admissible(fit: &FittedModel) {
    let p = fit.params();
    let label = format!("{} / {}", fit.spec(), fit.engine());
    assert!(p.is_stationary(), "{label}: converged fit is not stationary");
    assert!(p.beta.iter().all(|b| *b >= 0.0), "{label}: beta = {}", p.beta);
    if p.spec.variant != GarchVariant::EGarch {
        assert!(p.omega > 0.0, "{label}: omega = {}", p.omega);
        assert!(p.alpha.iter().all(|a| *a >= 0.0), "{label}: alpha = {}", p.alpha);
        assert!(p.gamma.iter().all(|g| *g >= 0.0), "{label}: gamma = {}", p.gamma);
    }
}

/// Purpose
/// -------
/// Fit the 1000-point sGARCH series with the hand-built engine.
fn fitted_sgarch() -> FittedModel {
    let (spec, truth) = sgarch_truth();
    let series = simulate_series(&truth, 1000, 42);
    EngineSelector::default()
        .fit(Engine::HandBuilt, &series, &spec)
        .expect("hand-built fit should not error on valid data")
}

#[test]
// Purpose
// -------
// A seeded sGARCH series is fitted to a converged, stationary model.
//
// Given
// -----
// - 1000 observations from sGARCH(1,1), ω = 1e-6, α = 0.1, β = 0.85.
//
// Expect
// ------
// - `converged == true`, α + β < 1, finite log-likelihood.
// - Four parameters (μ, ω, α, β) with finite standard errors.
fn sgarch_fit_converges_to_stationary_parameters() {
    let fit = fitted_sgarch();

    assert!(fit.converged(), "status: {}", fit.status());
    assert!(fit.params().alpha[0] + fit.params().beta[0] < 1.0);
    assert!(fit.log_likelihood().is_finite());
    assert_eq!(fit.n_params(), 4);
    let se = fit.std_errors().expect("standard errors for a converged fit");
    assert_eq!(se.len(), 4);
    assert!(se.iter().all(|v| v.is_finite() && *v >= 0.0));
}

#[test]
// Purpose
// -------
// AIC and BIC follow their definitions from the stored log-likelihood.
//
// Given
// -----
// - The fitted sGARCH model (k = 4, n = 1000).
//
// Expect
// ------
// - AIC = −2ℓ + 2k and BIC = −2ℓ + ln(n)·k.
fn information_criteria_match_definitions() {
    let fit = fitted_sgarch();
    let ll = fit.log_likelihood();

    assert_relative_eq!(fit.aic(), -2.0 * ll + 8.0, max_relative = 1e-12);
    assert_relative_eq!(fit.bic(), -2.0 * ll + (1000.0_f64).ln() * 4.0, max_relative = 1e-12);
}

#[test]
// Purpose
// -------
// Series with missing or infinite values are rejected before fitting.
//
// Given
// -----
// - A 7-element series containing NaN and +∞.
//
// Expect
// ------
// - `NonFiniteReturn` at index 2, classified as `InvalidInput`.
fn non_finite_series_is_invalid_input() {
    let data = Array1::from(vec![0.01, -0.02, f64::NAN, 0.005, f64::INFINITY, -0.01, 0.0]);

    let err = ReturnSeries::new(data).expect_err("NaN must be rejected");

    assert!(matches!(err, VolError::NonFiniteReturn { index: 2, .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
// Purpose
// -------
// Forecasts from a converged fit are positive and settle toward the
// long-run level.
//
// Given
// -----
// - The fitted sGARCH model and a 10-step horizon.
//
// Expect
// ------
// - Ten finite, strictly positive σ̂ values.
// - The last step is closer to the long-run σ than the first.
fn forecast_is_positive_and_mean_reverting() {
    let fit = fitted_sgarch();

    let f = fit.forecast(10, &ForecastOptions::default()).expect("forecast");

    assert_eq!(f.sigma_path.len(), 10);
    assert!(f.sigma_path.iter().all(|s| s.is_finite() && *s > 0.0));
    let lr = fit.params().long_run_sigma().expect("stationary fit");
    assert!((f.sigma_path[9] - lr).abs() <= (f.sigma_path[0] - lr).abs() + 1e-12);
}

#[test]
// Purpose
// -------
// Simulated paths are positive and reproducible, and zero innovations give
// returns equal to the mean.
//
// Given
// -----
// - The fitted sGARCH model, a 20-step horizon, seed 11, and zeros.
//
// Expect
// ------
// - Identical seeded paths; all σ finite and positive.
// - With zero innovations every return equals μ̂.
fn simulation_is_seeded_and_respects_zero_innovations() {
    let fit = fitted_sgarch();

    let a = fit.simulate_seeded(20, 11).expect("path");
    let b = fit.simulate_seeded(20, 11).expect("path");
    let zeros = Array1::<f64>::zeros(20);
    let flat = fit.simulate(zeros.view(), 20).expect("flat path");

    assert_eq!(a, b);
    assert_eq!(a.len(), 20);
    assert!(a.sigma.iter().all(|s| s.is_finite() && *s > 0.0));
    let mu = fit.params().mu;
    assert!(flat.returns.iter().all(|r| (*r - mu).abs() < 1e-15));
}

#[test]
// Purpose
// -------
// External innovations can be standardized and blended into a simulation.
//
// Given
// -----
// - 50 heavy-scaled external draws (σ = 3, mean 2) and default injection
//   options (standardize, w = 0.7).
//
// Expect
// ------
// - A 50-step path with finite, positive σ.
fn injected_innovations_drive_simulation() {
    let fit = fitted_sgarch();
    let external = Array1::from_iter((0..50).map(|i| 2.0 + 3.0 * (((i * 7) % 11) as f64 - 5.0)));

    let path =
        fit.simulate_injected(external.view(), 3, &InjectionOptions::default()).expect("path");

    assert_eq!(path.len(), 50);
    assert!(path.sigma.iter().all(|s| s.is_finite() && *s > 0.0));
}

#[test]
// Purpose
// -------
// Forecasting an unconverged fit is refused unless explicitly allowed.
//
// Given
// -----
// - A hand-built fit capped at 2 L-BFGS iterations.
//
// Expect
// ------
// - `converged == false`; the default forecast fails with
//   `NonConvergence`; the override succeeds.
fn unconverged_fit_requires_override_to_forecast() {
    let (spec, truth) = sgarch_truth();
    let series = simulate_series(&truth, 500, 9);
    let tols = Tolerances::new(None, None, 2).expect("tolerances");
    let mle_opts = MLEOptions::new(tols, LineSearcher::MoreThuente, None).expect("options");
    let opts = FitOptions { mle_opts, ..FitOptions::default() };
    let selector = EngineSelector::new(opts);

    let fit = selector.fit(Engine::HandBuilt, &series, &spec).expect("fit");
    let refused = selector.forecast(Engine::HandBuilt, &fit, 5, &ForecastOptions::default());
    let forced =
        selector.forecast(Engine::HandBuilt, &fit, 5, &ForecastOptions::allow_unconverged());

    assert!(!fit.converged());
    assert_eq!(refused.expect_err("refused").kind(), ErrorKind::NonConvergence);
    assert_eq!(forced.expect("forced forecast").sigma_path.len(), 5);
}

#[test]
// Purpose
// -------
// A selector without engines reports them as unavailable.
//
// Given
// -----
// - `EngineSelector::empty()` and an engine name parsed from text.
//
// Expect
// ------
// - `EngineUnavailable` for a registered name; unknown names fail to parse
//   with the same kind.
fn missing_engine_is_reported_unavailable() {
    let (spec, truth) = sgarch_truth();
    let series = simulate_series(&truth, 200, 1);
    let engine: Engine = "reference".parse().expect("known engine name");

    let err = EngineSelector::empty().fit(engine, &series, &spec).expect_err("no engines");
    let unknown = "quantum".parse::<Engine>().expect_err("unknown engine name");

    assert_eq!(err.kind(), ErrorKind::EngineUnavailable);
    assert_eq!(unknown.kind(), ErrorKind::EngineUnavailable);
}

#[cfg(feature = "reference-engine")]
#[test]
// Purpose
// -------
// Both engines reach the same optimum on identical inputs.
//
// Given
// -----
// - The 1000-point sGARCH series and a tolerance of 1.0.
//
// Expect
// ------
// - Both fits converge and `|ℓ_hand − ℓ_ref| < 1.0`.
fn engines_agree_on_log_likelihood() {
    let (spec, truth) = sgarch_truth();
    let series = simulate_series(&truth, 1000, 42);

    let check = EngineSelector::default().cross_check(&series, &spec, 1.0).expect("cross-check");

    assert!(check.agrees(), "gap = {}", check.gap);
    assert_eq!(check.hand_built.engine(), Engine::HandBuilt);
    assert_eq!(check.reference.engine(), Engine::Reference);
}

#[cfg(feature = "reference-engine")]
#[test]
// Purpose
// -------
// Flat records have the same columns whichever engine produced them.
//
// Given
// -----
// - sGARCH fits from both engines written to one CSV table.
//
// Expect
// ------
// - Records share parameter names; the table has a header plus two rows
//   with the same number of fields.
fn fit_table_columns_do_not_depend_on_engine() {
    let (spec, truth) = sgarch_truth();
    let series = simulate_series(&truth, 600, 5);
    let selector = EngineSelector::default();
    let records: Vec<FitRecord> = [Engine::HandBuilt, Engine::Reference]
        .into_iter()
        .map(|e| FitRecord::from(&selector.fit(e, &series, &spec).expect("fit")))
        .collect();
    let mut buf = Vec::new();

    write_fit_table(&records, &mut buf).expect("table");

    let names = |r: &FitRecord| r.params.iter().map(|(n, _)| n.clone()).collect::<Vec<_>>();
    assert_eq!(names(&records[0]), names(&records[1]));
    let text = String::from_utf8(buf).expect("utf8");
    let widths: Vec<usize> = text.lines().map(|l| l.split(',').count()).collect();
    assert_eq!(widths.len(), 3);
    assert!(widths.iter().all(|w| *w == widths[0]));
}

#[cfg(feature = "reference-engine")]
#[test]
// Purpose
// -------
// When positive shocks carry the larger weight, GJR's leverage term sits
// on its lower bound for both engines, and the engines still agree.
//
// Given
// -----
// - 2000 GJR observations (α = 0.02, γ = 0.13, β = 0.8, seed 3) with
//   every return negated, so α⁺ = 0.15 and α⁻ = 0.02.
// - GJR(1,1)-norm fitted by both engines with a tolerance of 1.0.
//
// Expect
// ------
// - Both fits converge with γ ≥ 0 and otherwise admissible coefficients.
// - `|ℓ_hand − ℓ_ref| < 1.0`.
fn gjr_with_reversed_asymmetry_keeps_gamma_non_negative() {
    let (spec, truth) = gjr_truth();
    let simulated = simulate_series(&truth, 2000, 3);
    let flipped = ReturnSeries::new(simulated.values().mapv(|r| -r)).expect("negated series");

    let check = EngineSelector::default().cross_check(&flipped, &spec, 1.0).expect("cross-check");

    for fit in [&check.hand_built, &check.reference] {
        assert!(fit.converged(), "{} did not converge: {}", fit.engine(), fit.status());
        assert_admissible(fit);
    }
    assert!(check.agrees(), "gap = {}", check.gap);
}

#[cfg(feature = "reference-engine")]
#[test]
// Purpose
// -------
// Every converged fit, from either engine and for every variant, has
// admissible coefficient signs and is strictly stationary.
//
// Given
// -----
// - 800 observations of the sGARCH truth (seed 17).
// - `GarchVariant::ALL` × {hand-built, reference}, normal innovations.
//
// Expect
// ------
// - Each converged fit passes the sign and stationarity checks, with the
//   eGARCH exemption for ω, α and γ.
// - At least one fit per engine converges.
fn converged_fits_are_admissible_for_every_variant_and_engine() {
    let (_, truth) = sgarch_truth();
    let series = simulate_series(&truth, 800, 17);
    let selector = EngineSelector::default();

    for engine in [Engine::HandBuilt, Engine::Reference] {
        let mut converged = 0;
        for variant in GarchVariant::ALL {
            let spec = ModelSpec::garch11(variant, DistributionKind::Normal);
            let fit = selector.fit(engine, &series, &spec).expect("fit should not error");
            if fit.converged() {
                converged += 1;
                assert_admissible(&fit);
            }
        }
        assert!(converged > 0, "no {engine} fit converged");
    }
}
