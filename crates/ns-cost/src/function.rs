//! The closed set of cost terms.

use crate::binned::{BinnedNLL, ExtendedBinnedNLL};
use crate::constant::Constant;
use crate::constraint::NormalConstraint;
use crate::data::MaskedCost;
use crate::least_squares::LeastSquares;
use crate::sum::CostSum;
use crate::unbinned::{ExtendedUnbinnedNLL, UnbinnedNLL};
use ns_core::{Cost, Result};

/// Any cost term.
///
/// Terms are combined with [`CostFunction::combine`] and shifted with
/// [`CostFunction::offset`]; both produce a [`CostSum`].
#[derive(Debug, Clone)]
pub enum CostFunction {
    /// Fixed value without parameters.
    Constant(Constant),
    /// Unbinned negative log-likelihood.
    UnbinnedNLL(UnbinnedNLL),
    /// Unbinned extended negative log-likelihood.
    ExtendedUnbinnedNLL(ExtendedUnbinnedNLL),
    /// Binned negative log-likelihood.
    BinnedNLL(BinnedNLL),
    /// Binned extended negative log-likelihood.
    ExtendedBinnedNLL(ExtendedBinnedNLL),
    /// Least-squares cost.
    LeastSquares(LeastSquares),
    /// Gaussian penalty.
    NormalConstraint(NormalConstraint),
    /// Sum of terms.
    Sum(CostSum),
}

macro_rules! dispatch {
    ($self:expr, $c:ident => $body:expr) => {
        match $self {
            CostFunction::Constant($c) => $body,
            CostFunction::UnbinnedNLL($c) => $body,
            CostFunction::ExtendedUnbinnedNLL($c) => $body,
            CostFunction::BinnedNLL($c) => $body,
            CostFunction::ExtendedBinnedNLL($c) => $body,
            CostFunction::LeastSquares($c) => $body,
            CostFunction::NormalConstraint($c) => $body,
            CostFunction::Sum($c) => $body,
        }
    };
}

impl CostFunction {
    /// The term as a trait object.
    pub fn as_cost(&self) -> &dyn Cost {
        dispatch!(self, c => c)
    }

    /// The term as a mutable trait object.
    pub fn as_cost_mut(&mut self) -> &mut dyn Cost {
        dispatch!(self, c => c)
    }

    /// The term's masked data interface, if it has data.
    pub fn as_masked(&self) -> Option<&dyn MaskedCost> {
        match self {
            CostFunction::UnbinnedNLL(c) => Some(c),
            CostFunction::ExtendedUnbinnedNLL(c) => Some(c),
            CostFunction::BinnedNLL(c) => Some(c),
            CostFunction::ExtendedBinnedNLL(c) => Some(c),
            CostFunction::LeastSquares(c) => Some(c),
            CostFunction::Constant(_)
            | CostFunction::NormalConstraint(_)
            | CostFunction::Sum(_) => None,
        }
    }

    /// Mutable masked data interface, if the term has data.
    pub fn as_masked_mut(&mut self) -> Option<&mut dyn MaskedCost> {
        match self {
            CostFunction::UnbinnedNLL(c) => Some(c),
            CostFunction::ExtendedUnbinnedNLL(c) => Some(c),
            CostFunction::BinnedNLL(c) => Some(c),
            CostFunction::ExtendedBinnedNLL(c) => Some(c),
            CostFunction::LeastSquares(c) => Some(c),
            CostFunction::Constant(_)
            | CostFunction::NormalConstraint(_)
            | CostFunction::Sum(_) => None,
        }
    }

    /// Sum of this term and `rhs`.
    pub fn combine(self, rhs: impl Into<CostFunction>) -> CostSum {
        CostSum::new([self, rhs.into()])
    }

    /// Sum of this term and a constant; a zero offset adds no term.
    pub fn offset(self, value: f64) -> CostSum {
        CostSum::with_offset([self], value)
    }
}

impl Cost for CostFunction {
    fn parameters(&self) -> &[String] {
        dispatch!(self, c => c.parameters())
    }

    fn ndata(&self) -> f64 {
        dispatch!(self, c => c.ndata())
    }

    fn verbose(&self) -> u8 {
        dispatch!(self, c => c.verbose())
    }

    fn set_verbose(&mut self, level: u8) {
        dispatch!(self, c => c.set_verbose(level))
    }

    fn evaluate(&self, args: &[f64]) -> Result<f64> {
        dispatch!(self, c => c.evaluate(args))
    }
}

macro_rules! impl_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for CostFunction {
                fn from(c: $ty) -> Self {
                    CostFunction::$variant(c)
                }
            }
        )*
    };
}

impl_from!(
    Constant(Constant),
    UnbinnedNLL(UnbinnedNLL),
    ExtendedUnbinnedNLL(ExtendedUnbinnedNLL),
    BinnedNLL(BinnedNLL),
    ExtendedBinnedNLL(ExtendedBinnedNLL),
    LeastSquares(LeastSquares),
    NormalConstraint(NormalConstraint),
    Sum(CostSum),
);

impl From<f64> for CostFunction {
    fn from(value: f64) -> Self {
        CostFunction::Constant(Constant::new(value))
    }
}
