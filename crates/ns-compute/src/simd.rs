//! SIMD-optimized reduction kernels.
//!
//! Uses `wide::f64x4` (double precision) and `wide::f32x8` (single precision).
//! `wide` dispatches to AVX2 on x86_64 and NEON on aarch64 and degrades to plain
//! lane loops elsewhere, so every function here is safe to call on any target;
//! [`simd_available`] only decides whether it is worth it.
//!
//! Note: `wide`'s vector `ln()` has ~1000 ULP error, so logarithms are computed
//! lane by lane with the scalar `ln()` while the surrounding arithmetic stays in
//! SIMD registers. Remainders (`len % LANES`) go through the portable kernels.

macro_rules! simd_kernels {
    ($(#[$meta:meta])* $name:ident, $t:ty, $v:ident, $lanes:literal) => {
        $(#[$meta])*
        pub mod $name {
            use crate::cpu;
            use crate::dispatch::Element;
            use wide::$v;

            const LANES: usize = $lanes;

            #[inline(always)]
            fn load(s: &[$t]) -> $v {
                let mut arr = [0.0 as $t; LANES];
                arr.copy_from_slice(s);
                <$v>::from(arr)
            }

            /// Accurate lane-by-lane `ln()` using the scalar implementation.
            #[inline(always)]
            fn ln_lanes(v: $v) -> $v {
                let mut arr: [$t; LANES] = v.into();
                for a in arr.iter_mut() {
                    *a = a.ln();
                }
                <$v>::from(arr)
            }

            #[inline(always)]
            fn hsum(v: $v) -> $t {
                let arr: [$t; LANES] = v.into();
                arr.iter().sum()
            }

            /// SIMD version of [`cpu::sum_log_x`].
            pub fn sum_log_x(x: &[$t]) -> $t {
                let tiny = <$v>::splat(<$t as Element>::tiny());
                let chunks = x.chunks_exact(LANES);
                let rem = chunks.remainder();
                let mut acc = <$v>::ZERO;
                for c in chunks {
                    acc += ln_lanes(load(c) + tiny);
                }
                hsum(acc) + cpu::sum_log_x(rem)
            }

            /// SIMD version of [`cpu::sum_log_poisson_part`].
            ///
            /// # Panics
            /// Panics if slice lengths are not equal.
            pub fn sum_log_poisson_part(n: &[$t], mu: &[$t]) -> $t {
                assert_eq!(n.len(), mu.len());
                let tiny = <$v>::splat(<$t as Element>::tiny());
                let split = n.len() - n.len() % LANES;
                let mut acc = <$v>::ZERO;
                let chunks = n[..split].chunks_exact(LANES).zip(mu[..split].chunks_exact(LANES));
                for (nc, mc) in chunks {
                    let nv = load(nc);
                    let mv = load(mc);
                    acc += nv * (ln_lanes(nv + tiny) - ln_lanes(mv + tiny));
                }
                hsum(acc) + cpu::sum_log_poisson_part(&n[split..], &mu[split..])
            }

            /// SIMD version of [`cpu::sum_log_poisson`].
            ///
            /// # Panics
            /// Panics if slice lengths are not equal.
            pub fn sum_log_poisson(n: &[$t], mu: &[$t]) -> $t {
                assert_eq!(n.len(), mu.len());
                let tiny = <$v>::splat(<$t as Element>::tiny());
                let split = n.len() - n.len() % LANES;
                let mut acc = <$v>::ZERO;
                let chunks = n[..split].chunks_exact(LANES).zip(mu[..split].chunks_exact(LANES));
                for (nc, mc) in chunks {
                    let nv = load(nc);
                    let mv = load(mc);
                    acc += mv - nv + nv * (ln_lanes(nv + tiny) - ln_lanes(mv + tiny));
                }
                hsum(acc) + cpu::sum_log_poisson(&n[split..], &mu[split..])
            }

            #[inline(always)]
            fn z_squared_lanes(y: &[$t], ye: &[$t], ym: &[$t]) -> $v {
                let z = (load(y) - load(ym)) / load(ye);
                z * z
            }

            /// SIMD version of [`cpu::sum_z_squared`].
            ///
            /// # Panics
            /// Panics if slice lengths are not equal.
            pub fn sum_z_squared(y: &[$t], ye: &[$t], ym: &[$t]) -> $t {
                assert_eq!(y.len(), ye.len());
                assert_eq!(y.len(), ym.len());
                let split = y.len() - y.len() % LANES;
                let mut acc = <$v>::ZERO;
                for offset in (0..split).step_by(LANES) {
                    let r = offset..offset + LANES;
                    acc += z_squared_lanes(&y[r.clone()], &ye[r.clone()], &ym[r]);
                }
                hsum(acc) + cpu::sum_z_squared(&y[split..], &ye[split..], &ym[split..])
            }

            /// SIMD version of [`cpu::sum_z_squared_soft_l1`].
            ///
            /// # Panics
            /// Panics if slice lengths are not equal.
            pub fn sum_z_squared_soft_l1(y: &[$t], ye: &[$t], ym: &[$t]) -> $t {
                assert_eq!(y.len(), ye.len());
                assert_eq!(y.len(), ym.len());
                let one = <$v>::splat(1.0);
                let two = <$v>::splat(2.0);
                let split = y.len() - y.len() % LANES;
                let mut acc = <$v>::ZERO;
                for offset in (0..split).step_by(LANES) {
                    let r = offset..offset + LANES;
                    let z2 = z_squared_lanes(&y[r.clone()], &ye[r.clone()], &ym[r]);
                    acc += two * ((one + z2).sqrt() - one);
                }
                hsum(acc) + cpu::sum_z_squared_soft_l1(&y[split..], &ye[split..], &ym[split..])
            }
        }
    };
}

simd_kernels!(
    /// Double-precision kernels, 4 lanes.
    f64x4_kernels,
    f64,
    f64x4,
    4
);

simd_kernels!(
    /// Single-precision kernels, 8 lanes.
    f32x8_kernels,
    f32,
    f32x8,
    8
);

/// Check if SIMD should be used on the current platform.
#[inline(always)]
pub fn simd_available() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        is_x86_feature_detected!("avx2")
    }
    #[cfg(target_arch = "aarch64")]
    {
        // NEON is always available on aarch64
        true
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        false
    }
}
