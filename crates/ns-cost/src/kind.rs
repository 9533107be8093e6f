//! Likelihood flavours shared by the unbinned and binned terms.
//!
//! [`Standard`] terms fit the shape of a distribution only; [`Extended`] terms
//! also fit the expected number of events.

use crate::model::{Scaled, Values, expect_len};
use ns_compute::KernelTable;
use ns_core::Result;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Standard {}
    impl Sealed for super::Extended {}
}

/// Shape-only likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Standard;

/// Likelihood including the Poisson term of the total yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extended;

/// Unbinned likelihood flavour.
pub trait UnbinnedKind: sealed::Sealed + Send + Sync + 'static {
    /// Model output for this flavour.
    type Output: 'static;
    /// Name of the model in messages.
    const MODEL: &'static str;

    /// `-2 ln L` up to a constant, from the model output at `n` points.
    fn nll(out: Self::Output, n: usize, log: bool, kernels: &KernelTable<f64>) -> Result<f64>;
}

fn sum_log(values: &[f64], log: bool, kernels: &KernelTable<f64>) -> f64 {
    if log { values.iter().sum() } else { (kernels.sum_log_x)(values) }
}

impl UnbinnedKind for Standard {
    type Output = Values;
    const MODEL: &'static str = "pdf";

    fn nll(out: Values, n: usize, log: bool, kernels: &KernelTable<f64>) -> Result<f64> {
        let values = expect_len(out, n, <Self as UnbinnedKind>::MODEL)?;
        Ok(-2.0 * sum_log(&values, log, kernels))
    }
}

impl UnbinnedKind for Extended {
    type Output = Scaled;
    const MODEL: &'static str = "scaled_pdf";

    fn nll(out: Scaled, n: usize, log: bool, kernels: &KernelTable<f64>) -> Result<f64> {
        let values = expect_len(out.values, n, <Self as UnbinnedKind>::MODEL)?;
        Ok(2.0 * (out.total - sum_log(&values, log, kernels)))
    }
}

/// Binned likelihood flavour.
pub trait BinnedKind: sealed::Sealed + Send + Sync + 'static {
    /// Name of the model in messages.
    const MODEL: &'static str;

    /// `-2 ln L` up to a constant.
    ///
    /// `prob` holds the model increments of the active bins, `raw` the counts or
    /// weight sums, `n` the effective counts and `scale` the Bohm–Zech scale
    /// factors of weighted bins.
    fn nll(
        prob: Vec<f64>,
        raw: &[f64],
        n: &[f64],
        scale: Option<&[f64]>,
        masked: bool,
        kernels: &KernelTable<f64>,
    ) -> f64;
}

fn apply_scale(mu: &mut [f64], scale: Option<&[f64]>) {
    if let Some(s) = scale {
        mu.iter_mut().zip(s).for_each(|(m, s)| *m *= s);
    }
}

impl BinnedKind for Standard {
    const MODEL: &'static str = "cdf";

    fn nll(
        mut prob: Vec<f64>,
        raw: &[f64],
        n: &[f64],
        scale: Option<&[f64]>,
        masked: bool,
        kernels: &KernelTable<f64>,
    ) -> f64 {
        if masked {
            let norm: f64 = prob.iter().sum();
            prob.iter_mut().for_each(|p| *p /= norm);
        }
        // sum(mu) is constant once prob is normalized, so only the log part is kept
        let total: f64 = raw.iter().sum();
        let mut mu: Vec<f64> = prob.into_iter().map(|p| p * total).collect();
        apply_scale(&mut mu, scale);
        2.0 * (kernels.sum_log_poisson_part)(n, &mu)
    }
}

impl BinnedKind for Extended {
    const MODEL: &'static str = "scaled_cdf";

    fn nll(
        mut mu: Vec<f64>,
        _raw: &[f64],
        n: &[f64],
        scale: Option<&[f64]>,
        _masked: bool,
        kernels: &KernelTable<f64>,
    ) -> f64 {
        apply_scale(&mut mu, scale);
        2.0 * (kernels.sum_log_poisson)(n, &mu)
    }
}
