//! Kernel dispatch keyed by element precision.
//!
//! A [`KernelTable`] bundles one implementation of every reduction. The portable
//! table exists for every [`Element`]; the accelerated table exists only for
//! single and double precision. Selection is a pure function of the precision,
//! the host SIMD support and the [`KernelPolicy`], so swapping or disabling the
//! accelerated path changes performance, never semantics beyond rounding.

use crate::{cpu, simd};
use ns_core::Precision;
use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Element type accepted by the kernels.
pub trait Element: Float + Debug + Send + Sync + 'static {
    /// Precision used as dispatch key.
    const PRECISION: Precision;

    /// Smallest positive value added inside logarithms.
    fn tiny() -> Self;

    /// Accelerated kernels, if this type has them.
    fn accelerated() -> Option<KernelTable<Self>> {
        None
    }
}

impl Element for f64 {
    const PRECISION: Precision = Precision::Double;

    #[inline(always)]
    fn tiny() -> Self {
        1e-323
    }

    fn accelerated() -> Option<KernelTable<Self>> {
        use simd::f64x4_kernels as k;
        Some(KernelTable {
            backend: Backend::Simd,
            sum_log_x: k::sum_log_x,
            sum_log_poisson_part: k::sum_log_poisson_part,
            sum_log_poisson: k::sum_log_poisson,
            sum_z_squared: k::sum_z_squared,
            sum_z_squared_soft_l1: k::sum_z_squared_soft_l1,
        })
    }
}

impl Element for f32 {
    const PRECISION: Precision = Precision::Single;

    #[inline(always)]
    fn tiny() -> Self {
        1e-45
    }

    fn accelerated() -> Option<KernelTable<Self>> {
        use simd::f32x8_kernels as k;
        Some(KernelTable {
            backend: Backend::Simd,
            sum_log_x: k::sum_log_x,
            sum_log_poisson_part: k::sum_log_poisson_part,
            sum_log_poisson: k::sum_log_poisson,
            sum_z_squared: k::sum_z_squared,
            sum_z_squared_soft_l1: k::sum_z_squared_soft_l1,
        })
    }
}

/// Which implementation family a table holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Generic scalar loops ([`crate::cpu`]).
    Portable,
    /// `wide` vector kernels ([`crate::simd`]).
    Simd,
}

/// User-facing switch for kernel selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelPolicy {
    /// Accelerated kernels whenever the precision and the host support them.
    #[default]
    Auto,
    /// Always the portable kernels.
    Portable,
}

/// Decide the backend for a precision under a policy.
pub fn select_backend(precision: Precision, policy: KernelPolicy) -> Backend {
    match (policy, precision) {
        (KernelPolicy::Portable, _) | (_, Precision::Extended) => Backend::Portable,
        (KernelPolicy::Auto, Precision::Single | Precision::Double) => {
            if simd::simd_available() {
                Backend::Simd
            } else {
                Backend::Portable
            }
        }
    }
}

/// One implementation of every reduction for element type `T`.
#[derive(Debug, Clone, Copy)]
pub struct KernelTable<T> {
    /// Implementation family.
    pub backend: Backend,
    /// `sum ln(x + tiny)`
    pub sum_log_x: fn(&[T]) -> T,
    /// `sum n (ln(n + tiny) - ln(mu + tiny))`
    pub sum_log_poisson_part: fn(&[T], &[T]) -> T,
    /// `sum (mu - n + n (ln(n + tiny) - ln(mu + tiny)))`
    pub sum_log_poisson: fn(&[T], &[T]) -> T,
    /// `sum ((y - ym) / ye)^2`
    pub sum_z_squared: fn(&[T], &[T], &[T]) -> T,
    /// `sum 2 (sqrt(1 + z^2) - 1)`
    pub sum_z_squared_soft_l1: fn(&[T], &[T], &[T]) -> T,
}

impl<T: Element> KernelTable<T> {
    /// The portable table, valid for every element type.
    pub fn portable() -> Self {
        Self {
            backend: Backend::Portable,
            sum_log_x: cpu::sum_log_x::<T>,
            sum_log_poisson_part: cpu::sum_log_poisson_part::<T>,
            sum_log_poisson: cpu::sum_log_poisson::<T>,
            sum_z_squared: cpu::sum_z_squared::<T>,
            sum_z_squared_soft_l1: cpu::sum_z_squared_soft_l1::<T>,
        }
    }

    /// Select the table for `T` under `policy`.
    pub fn select(policy: KernelPolicy) -> Self {
        let table = match select_backend(T::PRECISION, policy) {
            Backend::Simd => T::accelerated().unwrap_or_else(Self::portable),
            Backend::Portable => Self::portable(),
        };
        log::trace!("kernels for {:?} under {:?}: {:?}", T::PRECISION, policy, table.backend);
        table
    }
}

/// `sum ln(x + tiny)` with automatic kernel selection.
pub fn sum_log_x<T: Element>(x: &[T]) -> T {
    (KernelTable::<T>::select(KernelPolicy::Auto).sum_log_x)(x)
}

/// `sum n (ln(n + tiny) - ln(mu + tiny))` with automatic kernel selection.
pub fn sum_log_poisson_part<T: Element>(n: &[T], mu: &[T]) -> T {
    (KernelTable::<T>::select(KernelPolicy::Auto).sum_log_poisson_part)(n, mu)
}

/// `sum (mu - n + n (ln(n + tiny) - ln(mu + tiny)))` with automatic kernel selection.
pub fn sum_log_poisson<T: Element>(n: &[T], mu: &[T]) -> T {
    (KernelTable::<T>::select(KernelPolicy::Auto).sum_log_poisson)(n, mu)
}

/// `sum ((y - ym) / ye)^2` with automatic kernel selection.
pub fn sum_z_squared<T: Element>(y: &[T], ye: &[T], ym: &[T]) -> T {
    (KernelTable::<T>::select(KernelPolicy::Auto).sum_z_squared)(y, ye, ym)
}

/// `sum 2 (sqrt(1 + z^2) - 1)` with automatic kernel selection.
pub fn sum_z_squared_soft_l1<T: Element>(y: &[T], ye: &[T], ym: &[T]) -> T {
    (KernelTable::<T>::select(KernelPolicy::Auto).sum_z_squared_soft_l1)(y, ye, ym)
}
