//! Gaussian penalty terms.

use crate::signature::{check_args, unique_names};
use nalgebra::{DMatrix, DVector};
use ns_core::{Cost, Error, Result};

/// Covariance of a [`NormalConstraint`].
#[derive(Debug, Clone, PartialEq)]
pub enum Covariance {
    /// Independent parameters with these variances.
    Diagonal(Vec<f64>),
    /// Full covariance matrix.
    Full(DMatrix<f64>),
}

impl Covariance {
    /// Number of parameters covered.
    pub fn dim(&self) -> usize {
        match self {
            Covariance::Diagonal(v) => v.len(),
            Covariance::Full(m) => m.nrows(),
        }
    }

    fn inverse(&self) -> Result<Covariance> {
        match self {
            Covariance::Diagonal(var) => {
                if let Some(i) = var.iter().position(|&v| v == 0.0 || !v.is_finite()) {
                    return Err(Error::LinearAlgebra(format!(
                        "covariance is singular: variance {} at position {i}",
                        var[i]
                    )));
                }
                Ok(Covariance::Diagonal(var.iter().map(|v| 1.0 / v).collect()))
            }
            Covariance::Full(m) => {
                if !m.is_square() {
                    return Err(Error::LinearAlgebra(format!(
                        "covariance must be square, got {}x{}",
                        m.nrows(),
                        m.ncols()
                    )));
                }
                m.clone()
                    .try_inverse()
                    .map(Covariance::Full)
                    .ok_or_else(|| Error::LinearAlgebra("covariance matrix is singular".into()))
            }
        }
    }
}

/// Gaussian penalty `(value - p)^T C^-1 (value - p)` on named parameters.
///
/// Use it to include the result of an auxiliary measurement of some
/// parameters in a fit. The inverse covariance is computed once, when the
/// covariance is set.
#[derive(Debug, Clone)]
pub struct NormalConstraint {
    names: Vec<String>,
    value: Vec<f64>,
    covariance: Covariance,
    inverse: Covariance,
    verbose: u8,
}

impl NormalConstraint {
    /// Constrain independent parameters with the given standard deviations.
    pub fn new<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        value: Vec<f64>,
        error: Vec<f64>,
    ) -> Result<Self> {
        let var = error.iter().map(|e| e * e).collect();
        Self::build(names, value, Covariance::Diagonal(var))
    }

    /// Constrain parameters with a full covariance matrix.
    pub fn with_covariance<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        value: Vec<f64>,
        covariance: DMatrix<f64>,
    ) -> Result<Self> {
        Self::build(names, value, Covariance::Full(covariance))
    }

    fn build<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        value: Vec<f64>,
        covariance: Covariance,
    ) -> Result<Self> {
        let names = unique_names(names.into_iter().map(Into::into).collect())?;
        if value.len() != names.len() {
            return Err(Error::Validation(format!(
                "{} values for {} parameters",
                value.len(),
                names.len()
            )));
        }
        if covariance.dim() != names.len() {
            return Err(Error::Validation(format!(
                "covariance of dimension {} for {} parameters",
                covariance.dim(),
                names.len()
            )));
        }
        let inverse = covariance.inverse()?;
        Ok(Self { names, value, covariance, inverse, verbose: 0 })
    }

    /// Expected values.
    pub fn value(&self) -> &[f64] {
        &self.value
    }

    /// Replace the expected values; the length must not change.
    pub fn set_value(&mut self, value: Vec<f64>) -> Result<()> {
        if value.len() != self.value.len() {
            return Err(Error::Validation(format!(
                "cannot assign {} values to {} parameters",
                value.len(),
                self.value.len()
            )));
        }
        self.value = value;
        Ok(())
    }

    /// Covariance.
    pub fn covariance(&self) -> &Covariance {
        &self.covariance
    }

    /// Replace the covariance; kind and dimension must not change.
    ///
    /// On error the previous covariance stays in place.
    pub fn set_covariance(&mut self, covariance: Covariance) -> Result<()> {
        let same_kind = matches!(
            (&self.covariance, &covariance),
            (Covariance::Diagonal(_), Covariance::Diagonal(_))
                | (Covariance::Full(_), Covariance::Full(_))
        );
        if !same_kind || covariance.dim() != self.covariance.dim() {
            return Err(Error::Validation(
                "covariance must keep its kind and dimension".into(),
            ));
        }
        self.inverse = covariance.inverse()?;
        self.covariance = covariance;
        Ok(())
    }
}

impl Cost for NormalConstraint {
    fn parameters(&self) -> &[String] {
        &self.names
    }

    fn ndata(&self) -> f64 {
        self.value.len() as f64
    }

    fn verbose(&self) -> u8 {
        self.verbose
    }

    fn set_verbose(&mut self, level: u8) {
        self.verbose = level;
    }

    fn evaluate(&self, args: &[f64]) -> Result<f64> {
        check_args(args, &self.names)?;
        let delta = self.value.iter().zip(args).map(|(v, a)| v - a);
        Ok(match &self.inverse {
            Covariance::Diagonal(w) => delta.zip(w).map(|(d, w)| d * d * w).sum(),
            Covariance::Full(inv) => {
                let d = DVector::from_iterator(self.value.len(), delta);
                d.dot(&(inv * &d))
            }
        })
    }
}
