//! Least-squares cost with robust losses.

use crate::config::CostOptions;
use crate::data::{MaskedCost, MaskedData, Table};
use crate::model::{Curve, expect_len};
use crate::signature::{check_args, unique_names};
use ns_compute::{KernelTable, cpu};
use ns_core::{Cost, Describe, Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

type LossFn = dyn Fn(&[f64]) -> Vec<f64> + Send + Sync;

/// Loss applied to the squared pulls `z_i^2`.
#[derive(Clone, Default)]
pub enum Loss {
    /// `sum z^2`, the ordinary chi-square.
    #[default]
    Linear,
    /// `sum 2 (sqrt(1 + z^2) - 1)`; grows linearly for large pulls, which
    /// suppresses outliers.
    SoftL1,
    /// Custom transform of the squared pulls; the result is summed.
    Custom(Arc<LossFn>),
}

impl Loss {
    /// Wrap a custom loss.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        Loss::Custom(Arc::new(f))
    }

    /// Name of the loss; `"custom"` for callables.
    pub fn name(&self) -> &'static str {
        match self {
            Loss::Linear => "linear",
            Loss::SoftL1 => "soft_l1",
            Loss::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Loss({})", self.name())
    }
}

impl FromStr for Loss {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(Loss::Linear),
            "soft_l1" => Ok(Loss::SoftL1),
            other => Err(Error::Validation(format!("unknown loss type: {other}"))),
        }
    }
}

/// Uncertainty of the y values.
#[derive(Debug, Clone, PartialEq)]
pub enum Uncertainty {
    /// Same uncertainty for every point.
    Scalar(f64),
    /// One uncertainty per point.
    PerPoint(Vec<f64>),
}

impl From<f64> for Uncertainty {
    fn from(v: f64) -> Self {
        Uncertainty::Scalar(v)
    }
}

impl From<Vec<f64>> for Uncertainty {
    fn from(v: Vec<f64>) -> Self {
        Uncertainty::PerPoint(v)
    }
}

impl Uncertainty {
    fn into_column(self, n: usize) -> Vec<f64> {
        match self {
            Uncertainty::Scalar(v) => vec![v; n],
            Uncertainty::PerPoint(v) => v,
        }
    }
}

/// Explanatory variables.
#[derive(Debug, Clone, PartialEq)]
pub enum Points {
    /// One coordinate per point.
    Univariate(Vec<f64>),
    /// `x[dim][point]`.
    Multivariate(Vec<Vec<f64>>),
}

impl From<Vec<f64>> for Points {
    fn from(x: Vec<f64>) -> Self {
        Points::Univariate(x)
    }
}

impl From<Vec<Vec<f64>>> for Points {
    fn from(x: Vec<Vec<f64>>) -> Self {
        Points::Multivariate(x)
    }
}

impl Points {
    fn into_columns(self) -> Vec<Vec<f64>> {
        match self {
            Points::Univariate(x) => vec![x],
            Points::Multivariate(x) => x,
        }
    }
}

/// Least-squares cost (chi-square) for data `(x, y ± yerror)`.
///
/// `x` may be multi-dimensional; the model receives the active columns as
/// `x[dim][point]` and must return one value per point. Data is stored as one
/// table with columns `x_0 .. x_{D-1}, y, yerror`.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    data: MaskedData,
    ndim: usize,
    model: Curve,
    names: Vec<String>,
    loss: Loss,
    verbose: u8,
    kernels: KernelTable<f64>,
}

impl LeastSquares {
    /// Create the cost with the linear loss.
    pub fn new(
        x: impl Into<Points>,
        y: Vec<f64>,
        yerror: impl Into<Uncertainty>,
        model: Curve,
    ) -> Result<Self> {
        let mut columns = x.into().into_columns();
        let ndim = columns.len();
        if ndim == 0 {
            return Err(Error::Validation("x must have at least one dimension".into()));
        }
        let n = y.len();
        columns.push(y);
        columns.push(yerror.into().into_column(n));
        let table = Table::from_columns(columns)?;
        let names = unique_names(model.parameter_names().to_vec())?;
        Ok(Self {
            data: MaskedData::new(table),
            ndim,
            model,
            names,
            loss: Loss::Linear,
            verbose: 0,
            kernels: CostOptions::default().kernels(),
        })
    }

    /// Use `loss` instead of the linear loss.
    pub fn with_loss(mut self, loss: Loss) -> Self {
        self.loss = loss;
        self
    }

    /// Use the loss with the given name.
    pub fn with_loss_name(self, name: &str) -> Result<Self> {
        Ok(self.with_loss(name.parse()?))
    }

    /// Apply options.
    pub fn with_options(mut self, options: CostOptions) -> Self {
        self.verbose = options.verbose;
        self.kernels = options.kernels();
        self
    }

    /// Dimension of the explanatory variables.
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Explanatory variables, `x[dim][point]`.
    pub fn x(&self) -> &[Vec<f64>] {
        &self.data.data().columns()[..self.ndim]
    }

    /// Observed values.
    pub fn y(&self) -> &[f64] {
        self.data.data().column(self.ndim)
    }

    /// Uncertainties of the observed values.
    pub fn yerror(&self) -> &[f64] {
        self.data.data().column(self.ndim + 1)
    }

    /// Replace the explanatory variables; dimension and length must not change.
    pub fn set_x(&mut self, x: impl Into<Points>) -> Result<()> {
        let mut columns = x.into().into_columns();
        if columns.len() != self.ndim {
            return Err(Error::Validation(format!(
                "x has {} dimensions, expected {}",
                columns.len(),
                self.ndim
            )));
        }
        columns.extend_from_slice(&self.data.data().columns()[self.ndim..]);
        self.data.set_data(Table::from_columns(columns)?)
    }

    /// Replace the observed values.
    pub fn set_y(&mut self, y: Vec<f64>) -> Result<()> {
        self.data.set_column(self.ndim, y)
    }

    /// Replace the uncertainties; a scalar is broadcast to every point.
    pub fn set_yerror(&mut self, yerror: impl Into<Uncertainty>) -> Result<()> {
        let n = self.data.data().n_rows();
        self.data.set_column(self.ndim + 1, yerror.into().into_column(n))
    }

    /// Current loss.
    pub fn loss(&self) -> &Loss {
        &self.loss
    }

    /// Replace the loss.
    pub fn set_loss(&mut self, loss: Loss) {
        self.loss = loss;
    }

    /// The model.
    pub fn model(&self) -> &Curve {
        &self.model
    }
}

impl Cost for LeastSquares {
    fn parameters(&self) -> &[String] {
        &self.names
    }

    fn ndata(&self) -> f64 {
        self.data.n_active() as f64
    }

    fn verbose(&self) -> u8 {
        self.verbose
    }

    fn set_verbose(&mut self, level: u8) {
        self.verbose = level;
    }

    fn evaluate(&self, args: &[f64]) -> Result<f64> {
        check_args(args, &self.names)?;
        let active = self.data.active();
        let columns = active.columns();
        let ym = self.model.eval(&columns[..self.ndim], args);
        let ym = expect_len(ym, active.n_rows(), "model")?;
        let y = &columns[self.ndim];
        let ye = &columns[self.ndim + 1];
        Ok(match &self.loss {
            Loss::Linear => (self.kernels.sum_z_squared)(y, ye, &ym),
            Loss::SoftL1 => (self.kernels.sum_z_squared_soft_l1)(y, ye, &ym),
            Loss::Custom(f) => {
                let rho = f(&cpu::z_squared(y, ye, &ym));
                if rho.len() != y.len() {
                    return Err(Error::Computation(format!(
                        "loss returned {} values, expected {}",
                        rho.len(),
                        y.len()
                    )));
                }
                rho.iter().sum()
            }
        })
    }
}

impl MaskedCost for LeastSquares {
    fn masked_data(&self) -> &MaskedData {
        &self.data
    }

    fn masked_data_mut(&mut self) -> &mut MaskedData {
        &mut self.data
    }
}
