//! # ns-compute
//!
//! Reduction kernels behind the NextStat cost functions.
//!
//! - [`cpu`]: portable kernels, generic over the element type - always available.
//! - [`simd`]: `wide` vector kernels for `f32` and `f64`.
//! - [`dispatch`]: the precision-keyed [`KernelTable`] choosing between the two.
//!
//! ## Architecture
//!
//! Cost terms (ns-cost) never call a backend directly. They ask
//! [`KernelTable::select`] for a table under their [`KernelPolicy`] and call
//! through it, so accelerated kernels can be disabled without touching results
//! beyond summation-order rounding.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cpu;
pub mod dispatch;
pub mod simd;

pub use dispatch::{
    Backend, Element, KernelPolicy, KernelTable, select_backend, sum_log_poisson,
    sum_log_poisson_part, sum_log_x, sum_z_squared, sum_z_squared_soft_l1,
};
