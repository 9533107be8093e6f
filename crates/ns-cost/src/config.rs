//! Options shared by every cost term.

use ns_compute::{KernelPolicy, KernelTable};
use ns_core::Result;
use serde::{Deserialize, Serialize};

/// Per-term options.
///
/// Missing fields take their defaults when deserialized, so `{}` is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CostOptions {
    /// Verbosity level; `>= 1` logs every call with its arguments and result.
    pub verbose: u8,
    /// Kernel selection policy.
    pub kernels: KernelPolicy,
}

impl CostOptions {
    /// Parse options from a JSON document.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Options with the given verbosity and default kernels.
    pub fn verbose(level: u8) -> Self {
        Self { verbose: level, ..Self::default() }
    }

    /// Double-precision kernel table under this policy.
    pub(crate) fn kernels(&self) -> KernelTable<f64> {
        KernelTable::select(self.kernels)
    }
}
