//! Unbinned negative log-likelihoods.
//!
//! Both flavours evaluate the model at every active sample point and reduce the
//! result with the `sum_log_x` kernel. In log mode the model already returns
//! `ln f`, which is numerically preferable for densities that underflow.

use crate::config::CostOptions;
use crate::data::{MaskedCost, MaskedData, Table};
use crate::kind::{Extended, Standard, UnbinnedKind};
use crate::model::{Model, Scaled};
use crate::signature::{check_args, unique_names};
use ns_compute::KernelTable;
use ns_core::{Cost, Describe, Result};
use std::marker::PhantomData;

/// Unbinned likelihood of flavour `K`.
#[derive(Debug, Clone)]
pub struct UnbinnedCost<K: UnbinnedKind> {
    data: MaskedData,
    model: Model<[f64], K::Output>,
    names: Vec<String>,
    log: bool,
    verbose: u8,
    kernels: KernelTable<f64>,
    _kind: PhantomData<K>,
}

/// Unbinned negative log-likelihood.
///
/// Fits the shape of a normalized density to a sample. The cost is
/// `-2 sum ln f(x_i)`.
pub type UnbinnedNLL = UnbinnedCost<Standard>;

/// Unbinned extended negative log-likelihood.
///
/// The model returns the expected number of events in the data range together
/// with the scaled density; the cost is `2 (N - sum ln g(x_i))`.
pub type ExtendedUnbinnedNLL = UnbinnedCost<Extended>;

impl<K: UnbinnedKind> UnbinnedCost<K> {
    fn build(data: Vec<f64>, model: Model<[f64], K::Output>, log: bool) -> Result<Self> {
        let names = unique_names(model.parameter_names().to_vec())?;
        let table = Table::from_columns(vec![data])?;
        Ok(Self {
            data: MaskedData::new(table),
            model,
            names,
            log,
            verbose: 0,
            kernels: CostOptions::default().kernels(),
            _kind: PhantomData,
        })
    }

    /// Create the cost from a sample and a model returning density values.
    pub fn new(data: Vec<f64>, model: Model<[f64], K::Output>) -> Result<Self> {
        Self::build(data, model, false)
    }

    /// Create the cost from a sample and a model returning log-density values.
    pub fn with_log_model(data: Vec<f64>, model: Model<[f64], K::Output>) -> Result<Self> {
        Self::build(data, model, true)
    }

    /// Apply options.
    pub fn with_options(mut self, options: CostOptions) -> Self {
        self.verbose = options.verbose;
        self.kernels = options.kernels();
        self
    }

    /// Whether the model returns log-density values.
    pub fn is_log(&self) -> bool {
        self.log
    }

    /// The full sample, ignoring the mask.
    pub fn data(&self) -> &[f64] {
        self.data.data().column(0)
    }

    /// Replace the sample; the length must not change.
    pub fn set_data(&mut self, data: Vec<f64>) -> Result<()> {
        self.data.set_data(Table::from_columns(vec![data])?)
    }
}

impl UnbinnedNLL {
    /// The probability density (or its logarithm in log mode).
    pub fn pdf(&self) -> &Model<[f64]> {
        &self.model
    }
}

impl ExtendedUnbinnedNLL {
    /// The scaled density (or its logarithm in log mode).
    pub fn scaled_pdf(&self) -> &Model<[f64], Scaled> {
        &self.model
    }
}

impl<K: UnbinnedKind> Cost for UnbinnedCost<K> {
    fn parameters(&self) -> &[String] {
        &self.names
    }

    fn ndata(&self) -> f64 {
        f64::INFINITY
    }

    fn verbose(&self) -> u8 {
        self.verbose
    }

    fn set_verbose(&mut self, level: u8) {
        self.verbose = level;
    }

    fn evaluate(&self, args: &[f64]) -> Result<f64> {
        check_args(args, &self.names)?;
        let x = self.data.active().column(0);
        K::nll(self.model.eval(x, args), x.len(), self.log, &self.kernels)
    }
}

impl<K: UnbinnedKind> MaskedCost for UnbinnedCost<K> {
    fn masked_data(&self) -> &MaskedData {
        &self.data
    }

    fn masked_data_mut(&mut self) -> &mut MaskedData {
        &mut self.data
    }
}
