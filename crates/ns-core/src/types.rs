//! Common data types for NextStat cost functions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric precision of an array's elements.
///
/// Used as the key of the kernel dispatch table: only `Single` and `Double` have
/// accelerated kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// 32-bit IEEE float.
    Single,
    /// 64-bit IEEE float.
    Double,
    /// Anything wider than 64 bits (software or platform extended types).
    Extended,
}

/// One cost evaluation: the argument vector and the resulting value.
///
/// Emitted by verbose cost terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Parameter values, in signature order.
    pub args: Vec<f64>,
    /// Cost value.
    pub value: f64,
}

impl CallRecord {
    /// Create a record from an argument slice and a value.
    pub fn new(args: &[f64], value: f64) -> Self {
        Self { args: args.to_vec(), value }
    }
}

impl fmt::Display for CallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, a) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{a}")?;
        }
        write!(f, ") -> {}", self.value)
    }
}
