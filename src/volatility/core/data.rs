//! data — validated return series.
//!
//! Purpose
//! -------
//! Wrap a time-ordered sequence of log-returns after checking that it can be
//! fitted: at least [`MIN_OBSERVATIONS`] entries and no missing or
//! non-finite values. Missing values are rejected, never imputed.
//!
//! Key behaviors
//! -------------
//! - [`ReturnSeries::new`] is the only constructor; once built, the data is
//!   read-only.
//! - Summary statistics used to seed recursions and scale optimizer
//!   parameters ([`ReturnSeries::mean`], [`ReturnSeries::variance`]) are
//!   computed once at construction.
//! - Optional timestamps travel with the data for downstream reporting but
//!   never enter the likelihood.
use ndarray::{s, Array1, ArrayView1};
use serde::Serialize;

use crate::volatility::errors::{VolError, VolResult};

/// Smallest series length accepted for fitting.
pub const MIN_OBSERVATIONS: usize = 30;

/// Validated, immutable return series.
///
/// Invariants
/// ----------
/// - `data.len() >= MIN_OBSERVATIONS`.
/// - Every element is finite.
/// - `variance() > 0` unless the series is constant, in which case
///   construction fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    data: Array1<f64>,
    timestamps: Option<Vec<i64>>,
    mean: f64,
    variance: f64,
}

impl ReturnSeries {
    /// Validate and wrap a return series.
    ///
    /// Errors
    /// ------
    /// - `VolError::SeriesTooShort` when fewer than [`MIN_OBSERVATIONS`]
    ///   values are supplied (checked after finiteness, so a short series
    ///   with NaN reports the NaN first).
    /// - `VolError::NonFiniteReturn { index, value }` for the first NaN/Inf.
    /// - `VolError::InvalidInitVariance` when every return is identical.
    pub fn new(data: Array1<f64>) -> VolResult<Self> {
        for (index, &value) in data.iter().enumerate() {
            if !value.is_finite() {
                return Err(VolError::NonFiniteReturn { index, value });
            }
        }
        if data.len() < MIN_OBSERVATIONS {
            return Err(VolError::SeriesTooShort { len: data.len(), min: MIN_OBSERVATIONS });
        }
        let n = data.len() as f64;
        let mean = data.sum() / n;
        let variance = data.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        if !(variance > 0.0) {
            return Err(VolError::InvalidInitVariance { value: variance });
        }
        Ok(ReturnSeries { data, timestamps: None, mean, variance })
    }

    /// Attach one timestamp per observation (e.g. Unix seconds).
    pub fn with_timestamps(mut self, timestamps: Vec<i64>) -> VolResult<Self> {
        if timestamps.len() != self.data.len() {
            return Err(VolError::LengthMismatch {
                expected: self.data.len(),
                found: timestamps.len(),
            });
        }
        self.timestamps = Some(timestamps);
        Ok(self)
    }

    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.data.view()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn timestamps(&self) -> Option<&[i64]> {
        self.timestamps.as_deref()
    }

    /// Sample mean.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance around the sample mean.
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Contiguous sub-series `[start, start + len)`, revalidated.
    pub fn window(&self, start: usize, len: usize) -> VolResult<ReturnSeries> {
        let end = start + len;
        if end > self.data.len() {
            return Err(VolError::LengthMismatch { expected: end, found: self.data.len() });
        }
        ReturnSeries::new(self.data.slice(s![start..end]).to_owned())
    }
}
