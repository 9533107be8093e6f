//! User models with explicit parameter descriptors.
//!
//! A [`Model`] pairs a callable with the ordered names of its parameters. The
//! names become the signature of every cost term built on the model; nothing is
//! inferred from the callable itself.

use ns_core::{Describe, Error, Result};
use std::fmt;
use std::sync::Arc;

/// Model output where an array is expected.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    /// One value per input point (the fast path).
    Array(Vec<f64>),
    /// A single value; broadcast with a performance warning.
    Scalar(f64),
}

impl From<Vec<f64>> for Values {
    fn from(v: Vec<f64>) -> Self {
        Values::Array(v)
    }
}

impl From<f64> for Values {
    fn from(v: f64) -> Self {
        Values::Scalar(v)
    }
}

/// Output of a scaled density: the integral over the data range and the
/// density values at the data points.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaled {
    /// Expected total number of events.
    pub total: f64,
    /// Density (or log-density) at every data point.
    pub values: Values,
}

impl<V: Into<Values>> From<(f64, V)> for Scaled {
    fn from((total, values): (f64, V)) -> Self {
        Self { total, values: values.into() }
    }
}

type ModelFn<I, O> = dyn Fn(&I, &[f64]) -> O + Send + Sync;

/// A callable `f(x, params)` with named parameters.
pub struct Model<I: ?Sized, O = Values> {
    names: Vec<String>,
    func: Arc<ModelFn<I, O>>,
}

/// Probability density (or log-density) evaluated at sample points.
pub type Density = Model<[f64], Values>;
/// Density scaled by the expected number of events.
pub type ScaledDensity = Model<[f64], Scaled>;
/// (Scaled) cumulative distribution evaluated at bin edges.
pub type Cdf = Model<[f64], Values>;
/// Regression curve evaluated at explanatory columns `x[dim][point]`.
pub type Curve = Model<[Vec<f64>], Values>;

impl<I: ?Sized + 'static, O: 'static> Model<I, O> {
    /// Wrap `func` with the given parameter names.
    ///
    /// `func` may return anything convertible into the output type, e.g. a
    /// `Vec<f64>` for [`Values`].
    pub fn new<S, F, R>(names: impl IntoIterator<Item = S>, func: F) -> Self
    where
        S: Into<String>,
        F: Fn(&I, &[f64]) -> R + Send + Sync + 'static,
        R: Into<O> + 'static,
    {
        Self::from_parts(names.into_iter().map(Into::into).collect(), func)
    }

    fn from_parts<F, R>(names: Vec<String>, func: F) -> Self
    where
        F: Fn(&I, &[f64]) -> R + Send + Sync + 'static,
        R: Into<O> + 'static,
    {
        Self { names, func: Arc::new(move |x: &I, p: &[f64]| -> O { func(x, p).into() }) }
    }
}

impl<I: ?Sized, O> Model<I, O> {
    /// Evaluate the model.
    pub fn eval(&self, x: &I, params: &[f64]) -> O {
        (self.func)(x, params)
    }
}

impl<I: ?Sized, O> Clone for Model<I, O> {
    fn clone(&self) -> Self {
        Self { names: self.names.clone(), func: Arc::clone(&self.func) }
    }
}

impl<I: ?Sized, O> fmt::Debug for Model<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model").field("parameters", &self.names).finish_non_exhaustive()
    }
}

impl<I: ?Sized, O> Describe for Model<I, O> {
    fn parameter_names(&self) -> &[String] {
        &self.names
    }
}

/// Unpack model output, requiring `n` values.
///
/// A scalar is broadcast to `n` values; this is correct but bypasses vectorized
/// evaluation, so it is reported as a performance warning.
pub(crate) fn expect_len(values: Values, n: usize, what: &str) -> Result<Vec<f64>> {
    match values {
        Values::Array(v) if v.len() == n => Ok(v),
        Values::Array(v) => Err(Error::Computation(format!(
            "{what} returned {} values, expected {n}",
            v.len()
        ))),
        Values::Scalar(s) => {
            log::warn!("{what} should return an array, but returns a scalar (slow path)");
            Ok(vec![s; n])
        }
    }
}
