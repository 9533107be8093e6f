//! Core traits for NextStat cost functions
//!
//! A cost term is a scalar function of named parameters that a minimizer drives.
//! The traits here keep the contract independent of concrete data layouts and
//! compute kernels: `ns-cost` implements them, minimizers only depend on them.

use crate::Result;
use crate::types::CallRecord;

/// Convention-fixed error definition for cost functions built as `-2 ln L` or
/// chi-square: one standard deviation corresponds to an increase of 1.
pub const ERRORDEF: f64 = 1.0;

/// Explicit parameter descriptor attached to a model.
///
/// Names exclude the leading data argument of the model; their order fixes the
/// position of each value in the parameter slice passed to the model.
pub trait Describe {
    /// Ordered parameter names.
    fn parameter_names(&self) -> &[String];
}

/// Return the parameter names of a described object.
///
/// Never fails: an object without parameters yields an empty vector.
pub fn describe<D: Describe + ?Sized>(obj: &D) -> Vec<String> {
    obj.parameter_names().to_vec()
}

/// Cost function trait - the objective handed to a minimizer.
pub trait Cost: Send + Sync {
    /// Ordered, unique parameter names accepted by [`Cost::call`].
    fn parameters(&self) -> &[String];

    /// Number of data points entering the cost.
    ///
    /// `f64::INFINITY` for unbinned likelihoods, which have no meaningful
    /// reduced chi-square.
    fn ndata(&self) -> f64;

    /// Verbosity level; `>= 1` reports every call.
    fn verbose(&self) -> u8;

    /// Set the verbosity level.
    fn set_verbose(&mut self, level: u8);

    /// Evaluate the cost without verbose reporting.
    ///
    /// `args` must have the same length as [`Cost::parameters`].
    fn evaluate(&self, args: &[f64]) -> Result<f64>;

    /// Error definition, always [`ERRORDEF`].
    fn errordef(&self) -> f64 {
        ERRORDEF
    }

    /// Number of parameters.
    fn n_parameters(&self) -> usize {
        self.parameters().len()
    }

    /// Evaluate the cost, reporting arguments and result when verbose.
    fn call(&self, args: &[f64]) -> Result<f64> {
        let value = self.evaluate(args)?;
        if self.verbose() >= 1 {
            log::info!("{}", CallRecord::new(args, value));
        }
        Ok(value)
    }
}
