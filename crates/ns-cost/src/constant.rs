//! Constant cost term.

use crate::signature::check_args;
use ns_core::{Cost, Result};

/// Cost term without parameters that always returns the same value.
///
/// Useful to shift a cost towards O(1) at the minimum, which helps the
/// minimizer's convergence criterion when the raw value is large.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    value: f64,
    verbose: u8,
}

impl Constant {
    /// Create a constant term.
    pub fn new(value: f64) -> Self {
        Self { value, verbose: 0 }
    }

    /// The constant value.
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Cost for Constant {
    fn parameters(&self) -> &[String] {
        &[]
    }

    fn ndata(&self) -> f64 {
        0.0
    }

    fn verbose(&self) -> u8 {
        self.verbose
    }

    fn set_verbose(&mut self, level: u8) {
        self.verbose = level;
    }

    fn evaluate(&self, args: &[f64]) -> Result<f64> {
        check_args(args, &[])?;
        Ok(self.value)
    }
}
