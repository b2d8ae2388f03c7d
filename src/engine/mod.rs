//! engine — uniform fit/converged/forecast/path interface over back-ends.
//!
//! Purpose
//! -------
//! Let calling code swap estimators without branching. Every back-end
//! implements [`VolatilityEngine`]; an [`EngineSelector`] holds the
//! registered implementations and dispatches each operation to the one
//! named by an [`Engine`] tag. Results have the same shape whichever engine
//! produced them.
//!
//! Key behaviors
//! -------------
//! - [`HandBuiltEngine`] wraps `models::GarchModel` (L-BFGS over θ).
//! - [`ReferenceEngine`] wraps `models::ReferenceModel` (Nelder–Mead over
//!   natural parameters); compiled only with the `reference-engine`
//!   feature.
//! - Selecting an engine that is not registered fails with
//!   `VolError::EngineUnavailable` before any work; there is no fallback to
//!   another engine.
//! - [`EngineSelector::cross_check`] fits both engines on the same data and
//!   reports the log-likelihood gap.
//!
//! Invariants & assumptions
//! ------------------------
//! - Engines are stateless apart from their options and are `Send + Sync`,
//!   so one selector can serve fits for many (asset, variant) pairs in
//!   parallel.
//! - `converged`, `forecast` and `path` never re-fit; they read the
//!   immutable [`FittedModel`].

pub mod report;

use ndarray::ArrayView1;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, warn};

#[cfg(feature = "reference-engine")]
use crate::volatility::models::ReferenceModel;
use crate::volatility::{
    core::{
        data::ReturnSeries,
        forecasts::ForecastResult,
        options::{FitOptions, ForecastOptions},
        simulation::SimulatedPath,
        spec::ModelSpec,
    },
    errors::{VolError, VolResult},
    models::{GarchModel, FittedModel},
};

pub use self::report::{write_fit_table, FitRecord};
pub use crate::volatility::models::Engine;

/// Capability set every back-end provides.
///
/// Only [`VolatilityEngine::fit`] is engine-specific; the other operations
/// act on the fitted record and have shared default implementations.
pub trait VolatilityEngine: Send + Sync {
    fn engine(&self) -> Engine;

    fn fit(&self, series: &ReturnSeries, spec: &ModelSpec) -> VolResult<FittedModel>;

    fn converged(&self, fit: &FittedModel) -> bool {
        fit.converged()
    }

    fn forecast(
        &self, fit: &FittedModel, horizon: usize, opts: &ForecastOptions,
    ) -> VolResult<ForecastResult> {
        fit.forecast(horizon, opts)
    }

    fn path(
        &self, fit: &FittedModel, innovations: ArrayView1<f64>, horizon: usize,
    ) -> VolResult<SimulatedPath> {
        fit.simulate(innovations, horizon)
    }
}

/// θ-space L-BFGS back-end.
#[derive(Debug, Clone, Default)]
pub struct HandBuiltEngine {
    pub options: FitOptions,
}

impl HandBuiltEngine {
    pub fn new(options: FitOptions) -> Self {
        HandBuiltEngine { options }
    }
}

impl VolatilityEngine for HandBuiltEngine {
    fn engine(&self) -> Engine {
        Engine::HandBuilt
    }

    fn fit(&self, series: &ReturnSeries, spec: &ModelSpec) -> VolResult<FittedModel> {
        GarchModel::new(*spec, self.options.clone()).fit(series)
    }
}

/// Natural-space Nelder–Mead back-end.
#[cfg(feature = "reference-engine")]
#[derive(Debug, Clone, Default)]
pub struct ReferenceEngine {
    pub options: FitOptions,
}

#[cfg(feature = "reference-engine")]
impl ReferenceEngine {
    pub fn new(options: FitOptions) -> Self {
        ReferenceEngine { options }
    }
}

#[cfg(feature = "reference-engine")]
impl VolatilityEngine for ReferenceEngine {
    fn engine(&self) -> Engine {
        Engine::Reference
    }

    fn fit(&self, series: &ReturnSeries, spec: &ModelSpec) -> VolResult<FittedModel> {
        ReferenceModel::new(*spec, self.options.clone()).fit(series)
    }
}

/// Log-likelihoods of both engines on identical inputs.
#[derive(Debug, Clone)]
pub struct CrossCheck {
    pub hand_built: FittedModel,
    pub reference: FittedModel,
    /// `|ℓ_hand-built − ℓ_reference|`; `NaN` if either fit failed.
    pub gap: f64,
    pub tolerance: f64,
}

impl CrossCheck {
    /// Both fits converged and their log-likelihoods differ by less than
    /// the tolerance.
    pub fn agrees(&self) -> bool {
        self.hand_built.converged() && self.reference.converged() && self.gap < self.tolerance
    }
}

/// Registry of engines keyed by [`Engine`].
#[derive(Clone)]
pub struct EngineSelector {
    engines: HashMap<Engine, Arc<dyn VolatilityEngine>>,
}

impl EngineSelector {
    /// Selector with every engine compiled into this build, all sharing
    /// `options`.
    pub fn new(options: FitOptions) -> Self {
        let selector = EngineSelector::empty()
            .with_engine(Arc::new(HandBuiltEngine::new(options.clone())));
        #[cfg(feature = "reference-engine")]
        let selector = selector.with_engine(Arc::new(ReferenceEngine::new(options)));
        selector
    }

    /// Selector with no engines registered.
    pub fn empty() -> Self {
        EngineSelector { engines: HashMap::new() }
    }

    /// Register (or replace) the implementation for `engine.engine()`.
    pub fn with_engine(mut self, engine: Arc<dyn VolatilityEngine>) -> Self {
        self.engines.insert(engine.engine(), engine);
        self
    }

    pub fn contains(&self, engine: Engine) -> bool {
        self.engines.contains_key(&engine)
    }

    /// Registered engines in a stable order.
    pub fn available(&self) -> Vec<Engine> {
        Engine::ALL.into_iter().filter(|e| self.contains(*e)).collect()
    }

    /// The implementation registered for `engine`.
    ///
    /// Errors
    /// ------
    /// - `VolError::EngineUnavailable` if none is registered.
    pub fn select(&self, engine: Engine) -> VolResult<&dyn VolatilityEngine> {
        match self.engines.get(&engine) {
            Some(e) => Ok(e.as_ref()),
            None => Err(VolError::EngineUnavailable {
                engine: engine.to_string(),
                reason: unavailable_reason(engine),
            }),
        }
    }

    pub fn fit(
        &self, engine: Engine, series: &ReturnSeries, spec: &ModelSpec,
    ) -> VolResult<FittedModel> {
        let backend = self.select(engine)?;
        debug!(%engine, %spec, "dispatching fit");
        backend.fit(series, spec)
    }

    pub fn converged(&self, engine: Engine, fit: &FittedModel) -> VolResult<bool> {
        Ok(self.select(engine)?.converged(fit))
    }

    pub fn forecast(
        &self, engine: Engine, fit: &FittedModel, horizon: usize, opts: &ForecastOptions,
    ) -> VolResult<ForecastResult> {
        self.select(engine)?.forecast(fit, horizon, opts)
    }

    pub fn path(
        &self, engine: Engine, fit: &FittedModel, innovations: ArrayView1<f64>, horizon: usize,
    ) -> VolResult<SimulatedPath> {
        self.select(engine)?.path(fit, innovations, horizon)
    }

    /// Fit `spec` with both engines and compare log-likelihoods.
    ///
    /// Errors
    /// ------
    /// - `VolError::EngineUnavailable` unless both engines are registered.
    /// - `VolError::InvalidOption` for a non-positive or non-finite
    ///   tolerance.
    /// - Any error either fit raises.
    pub fn cross_check(
        &self, series: &ReturnSeries, spec: &ModelSpec, tolerance: f64,
    ) -> VolResult<CrossCheck> {
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(VolError::InvalidOption {
                name: "tolerance",
                value: tolerance,
                reason: "must be finite and positive",
            });
        }
        let hand = self.select(Engine::HandBuilt)?;
        let reference = self.select(Engine::Reference)?;
        let hand_built = hand.fit(series, spec)?;
        let reference = reference.fit(series, spec)?;
        let gap = (hand_built.log_likelihood() - reference.log_likelihood()).abs();
        let check = CrossCheck { hand_built, reference, gap, tolerance };
        if check.agrees() {
            info!(%spec, gap, "engines agree");
        } else {
            warn!(
                %spec,
                gap,
                tolerance,
                hand_built_converged = check.hand_built.converged(),
                reference_converged = check.reference.converged(),
                "engines disagree"
            );
        }
        Ok(check)
    }
}

impl Default for EngineSelector {
    fn default() -> Self {
        EngineSelector::new(FitOptions::default())
    }
}

impl std::fmt::Debug for EngineSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSelector").field("engines", &self.available()).finish()
    }
}

fn unavailable_reason(engine: Engine) -> &'static str {
    match engine {
        #[cfg(not(feature = "reference-engine"))]
        Engine::Reference => "built without the `reference-engine` feature",
        _ => "engine is not registered with this selector",
    }
}
