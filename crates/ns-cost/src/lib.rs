//! # ns-cost
//!
//! Composable cost functions for maximum-likelihood and least-squares fits.
//!
//! Every term implements [`ns_core::Cost`]: it has an ordered list of named
//! parameters, is evaluated with one value per parameter and returns a scalar
//! for a minimizer to drive. Terms are built from data and a [`Model`] that
//! carries its parameter names explicitly.
//!
//! - [`UnbinnedNLL`], [`ExtendedUnbinnedNLL`]: samples of a continuous variable.
//! - [`BinnedNLL`], [`ExtendedBinnedNLL`]: histograms, optionally weighted.
//! - [`LeastSquares`]: `(x, y ± yerror)` data with robust losses.
//! - [`NormalConstraint`]: Gaussian penalty from auxiliary measurements.
//! - [`Constant`]: fixed offset.
//!
//! Terms combine into a [`CostSum`] whose parameters are the union of the
//! parameters of its terms:
//!
//! ```
//! use ns_cost::{CostFunction, Model, NormalConstraint, UnbinnedNLL};
//! use ns_core::Cost;
//!
//! let pdf = Model::new(["mu"], |x: &[f64], p: &[f64]| {
//!     x.iter()
//!         .map(|v| (-0.5 * (v - p[0]).powi(2)).exp() / (2.0 * std::f64::consts::PI).sqrt())
//!         .collect::<Vec<_>>()
//! });
//! let nll = UnbinnedNLL::new(vec![0.1, -0.3, 0.4], pdf).unwrap();
//! let constraint = NormalConstraint::new(["mu"], vec![0.0], vec![1.0]).unwrap();
//! let total = CostFunction::from(nll).combine(constraint);
//! assert_eq!(total.parameters(), &["mu".to_string()]);
//! assert!(total.call(&[0.0]).unwrap().is_finite());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod binned;
pub mod config;
pub mod constant;
pub mod constraint;
pub mod data;
pub mod function;
pub mod kind;
pub mod least_squares;
pub mod model;
pub mod signature;
pub mod sum;
pub mod unbinned;

pub use binned::{BinContents, BinnedCost, BinnedNLL, ExtendedBinnedNLL};
pub use config::CostOptions;
pub use constant::Constant;
pub use constraint::{Covariance, NormalConstraint};
pub use data::{Mask, MaskedCost, MaskedData, Table};
pub use function::CostFunction;
pub use kind::{Extended, Standard};
pub use least_squares::{LeastSquares, Loss, Points, Uncertainty};
pub use model::{Cdf, Curve, Density, Model, Scaled, ScaledDensity, Values};
pub use signature::merge_signatures;
pub use sum::{CostSum, TermMut};
pub use unbinned::{ExtendedUnbinnedNLL, UnbinnedCost, UnbinnedNLL};

#[cfg(test)]
mod tests;
