//! Portable reduction kernels.
//!
//! This is the backend that MUST work everywhere and for every element type,
//! including precisions without accelerated kernels. All functions are generic
//! over [`Element`] and evaluate terms left to right with a single accumulator.
//!
//! Numerical conventions shared with the SIMD kernels:
//! - logarithms are taken of `x + tiny` so that a vanishing density or an empty
//!   bin yields a large finite value instead of `-inf`;
//! - the Poisson sums keep the `n ln n` term (saturated model) so the sum stays
//!   small in magnitude and differences computed by the minimizer do not cancel.

use crate::dispatch::Element;

#[inline(always)]
fn log_poisson_part<T: Element>(n: T, mu: T, tiny: T) -> T {
    n * ((n + tiny).ln() - (mu + tiny).ln())
}

/// Per-point squared pull `((y - ym) / ye)^2`.
#[inline(always)]
pub fn z_squared_one<T: Element>(y: T, ye: T, ym: T) -> T {
    let z = (y - ym) / ye;
    z * z
}

/// `sum_i ln(x_i + tiny)`.
pub fn sum_log_x<T: Element>(x: &[T]) -> T {
    let tiny = T::tiny();
    x.iter().fold(T::zero(), |acc, &v| acc + (v + tiny).ln())
}

/// `sum_i n_i (ln(n_i + tiny) - ln(mu_i + tiny))`.
///
/// # Panics
/// Panics if slice lengths are not equal.
pub fn sum_log_poisson_part<T: Element>(n: &[T], mu: &[T]) -> T {
    assert_eq!(n.len(), mu.len());
    let tiny = T::tiny();
    n.iter().zip(mu).fold(T::zero(), |acc, (&n, &mu)| acc + log_poisson_part(n, mu, tiny))
}

/// `sum_i (mu_i - n_i + n_i (ln(n_i + tiny) - ln(mu_i + tiny)))`.
///
/// Subtracting `n_i` keeps each term close to zero near the optimum.
///
/// # Panics
/// Panics if slice lengths are not equal.
pub fn sum_log_poisson<T: Element>(n: &[T], mu: &[T]) -> T {
    assert_eq!(n.len(), mu.len());
    let tiny = T::tiny();
    n.iter()
        .zip(mu)
        .fold(T::zero(), |acc, (&n, &mu)| acc + (mu - n + log_poisson_part(n, mu, tiny)))
}

/// Squared pulls for every point, the input of custom loss functions.
///
/// # Panics
/// Panics if slice lengths are not equal.
pub fn z_squared<T: Element>(y: &[T], ye: &[T], ym: &[T]) -> Vec<T> {
    assert_eq!(y.len(), ye.len());
    assert_eq!(y.len(), ym.len());
    y.iter().zip(ye).zip(ym).map(|((&y, &ye), &ym)| z_squared_one(y, ye, ym)).collect()
}

/// `sum_i ((y_i - ym_i) / ye_i)^2`.
///
/// # Panics
/// Panics if slice lengths are not equal.
pub fn sum_z_squared<T: Element>(y: &[T], ye: &[T], ym: &[T]) -> T {
    assert_eq!(y.len(), ye.len());
    assert_eq!(y.len(), ym.len());
    y.iter()
        .zip(ye)
        .zip(ym)
        .fold(T::zero(), |acc, ((&y, &ye), &ym)| acc + z_squared_one(y, ye, ym))
}

/// `sum_i 2 (sqrt(1 + z_i^2) - 1)`, the soft-L1 robust loss.
///
/// # Panics
/// Panics if slice lengths are not equal.
pub fn sum_z_squared_soft_l1<T: Element>(y: &[T], ye: &[T], ym: &[T]) -> T {
    assert_eq!(y.len(), ye.len());
    assert_eq!(y.len(), ym.len());
    let one = T::one();
    let two = one + one;
    y.iter().zip(ye).zip(ym).fold(T::zero(), |acc, ((&y, &ye), &ym)| {
        acc + two * ((one + z_squared_one(y, ye, ym)).sqrt() - one)
    })
}
