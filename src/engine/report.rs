//! Flat, engine-independent fit records and their CSV table.
//!
//! A [`FitRecord`] carries one fitted model as a row: descriptive columns,
//! fit statistics, and named parameter values. [`write_fit_table`] writes a
//! batch of records with a header that depends only on the specs present
//! (the union of their parameter names), so rows from either engine line
//! up under the same columns.
use serde::Serialize;
use std::io::Write;

use crate::volatility::{errors::VolResult, models::FittedModel};

/// Fixed leading columns of the fit table.
pub const FIT_COLUMNS: [&str; 11] = [
    "model",
    "submodel",
    "distribution",
    "engine",
    "p",
    "q",
    "n_obs",
    "loglik",
    "aic",
    "bic",
    "converged",
];

/// One fitted model as a flat row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitRecord {
    pub model: String,
    pub submodel: Option<String>,
    pub distribution: String,
    pub engine: String,
    pub p: usize,
    pub q: usize,
    pub n_obs: usize,
    pub loglik: f64,
    pub aic: f64,
    pub bic: f64,
    pub converged: bool,
    /// `(name, value)` in canonical parameter order.
    pub params: Vec<(String, f64)>,
}

impl FitRecord {
    pub fn from_fitted(fit: &FittedModel) -> Self {
        let spec = fit.spec();
        FitRecord {
            model: spec.variant.model_name().to_string(),
            submodel: spec.submodel().map(str::to_string),
            distribution: spec.distribution.code().to_string(),
            engine: fit.engine().name().to_string(),
            p: spec.order.p,
            q: spec.order.q,
            n_obs: fit.n_obs(),
            loglik: fit.log_likelihood(),
            aic: fit.aic(),
            bic: fit.bic(),
            converged: fit.converged(),
            params: fit.params().named(),
        }
    }

    /// Value of the parameter called `name`, if this model has one.
    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    fn fixed_fields(&self) -> [String; 11] {
        [
            self.model.clone(),
            self.submodel.clone().unwrap_or_default(),
            self.distribution.clone(),
            self.engine.clone(),
            self.p.to_string(),
            self.q.to_string(),
            self.n_obs.to_string(),
            self.loglik.to_string(),
            self.aic.to_string(),
            self.bic.to_string(),
            self.converged.to_string(),
        ]
    }
}

impl From<&FittedModel> for FitRecord {
    fn from(fit: &FittedModel) -> Self {
        FitRecord::from_fitted(fit)
    }
}

/// Parameter columns for `records`: first-seen order, no duplicates.
pub fn param_columns(records: &[FitRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for (name, _) in records.iter().flat_map(|r| r.params.iter()) {
        if !columns.iter().any(|c| c == name) {
            columns.push(name.clone());
        }
    }
    columns
}

/// Write `records` as CSV: the fixed columns followed by every parameter
/// column any record uses. Missing parameters are left blank; non-finite
/// statistics are written as `NaN`/`inf`.
///
/// Errors
/// ------
/// - `VolError::Output` when the writer fails.
pub fn write_fit_table<W: Write>(records: &[FitRecord], writer: W) -> VolResult<()> {
    let params = param_columns(records);
    let mut out = csv::Writer::from_writer(writer);

    let header = FIT_COLUMNS.iter().map(|c| c.to_string()).chain(params.iter().cloned());
    out.write_record(header)?;

    for record in records {
        let values = params
            .iter()
            .map(|name| record.param(name).map(|v| v.to_string()).unwrap_or_default());
        let row = record.fixed_fields().into_iter().chain(values);
        out.write_record(row)?;
    }
    out.flush()?;
    Ok(())
}
