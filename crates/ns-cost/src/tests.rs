use crate::{
    BinContents, BinnedNLL, Cdf, Constant, Curve, CostFunction, CostOptions, CostSum, Density,
    ExtendedBinnedNLL, ExtendedUnbinnedNLL, LeastSquares, Loss, Mask, MaskedCost, Model,
    NormalConstraint, ScaledDensity, UnbinnedNLL, Values,
};
use approx::assert_relative_eq;
use ns_compute::KernelPolicy;
use ns_core::{Cost, Error, describe};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

fn normal_pdf() -> Density {
    Model::new(["mu", "sigma"], |x: &[f64], p: &[f64]| {
        let d = Normal::new(p[0], p[1]).unwrap();
        x.iter().map(|&v| d.pdf(v)).collect::<Vec<_>>()
    })
}

fn normal_logpdf() -> Density {
    Model::new(["mu", "sigma"], |x: &[f64], p: &[f64]| {
        let d = Normal::new(p[0], p[1]).unwrap();
        x.iter().map(|&v| d.ln_pdf(v)).collect::<Vec<_>>()
    })
}

/// CDF on [0, 1] of the density `1 + a (2x - 1)`, linear in `a`.
fn linear_shape_cdf() -> Cdf {
    Model::new(["a"], |x: &[f64], p: &[f64]| {
        x.iter().map(|&v| v + p[0] * (v * v - v)).collect::<Vec<_>>()
    })
}

fn half_cdf() -> Cdf {
    Model::new(Vec::<String>::new(), |x: &[f64], _: &[f64]| {
        x.iter().map(|v| v / 2.0).collect::<Vec<_>>()
    })
}

fn scaled_half_cdf() -> Cdf {
    Model::new(["n"], |x: &[f64], p: &[f64]| x.iter().map(|v| p[0] * v / 2.0).collect::<Vec<_>>())
}

fn line() -> Curve {
    Model::new(["a", "b"], |x: &[Vec<f64>], p: &[f64]| {
        x[0].iter().map(|v| p[0] + p[1] * v).collect::<Vec<_>>()
    })
}

fn edges(n: usize) -> Vec<f64> {
    (0..=n).map(|i| i as f64 / n as f64).collect()
}

// ---------------------------------------------------------------------------
// Summation
// ---------------------------------------------------------------------------

#[test]
fn test_sum_ndata_adds_and_propagates_infinity() {
    let ls = LeastSquares::new(vec![0.0, 1.0, 2.0], vec![0.0; 3], 1.0, line()).unwrap();
    let nc = NormalConstraint::new(["a"], vec![0.0], vec![1.0]).unwrap();
    let sum = CostFunction::from(ls.clone()).combine(nc.clone());
    assert_eq!(sum.ndata(), 4.0);

    let nll = UnbinnedNLL::new(vec![0.0, 1.0], normal_pdf()).unwrap();
    let sum = CostFunction::from(sum).combine(nll);
    assert_eq!(sum.len(), 3);
    assert_eq!(sum.ndata(), f64::INFINITY);
}

#[test]
fn test_zero_offset_adds_no_term() {
    let nc = CostFunction::from(NormalConstraint::new(["a"], vec![0.0], vec![1.0]).unwrap());
    let ls = LeastSquares::new(vec![0.0, 1.0], vec![1.0, 1.0], 1.0, line()).unwrap();
    let base = nc.combine(ls);
    assert_eq!(base.len(), 2);

    let same = CostFunction::from(base.clone()).offset(0.0);
    assert_eq!(same.len(), 2);
    let same = CostFunction::from(base.clone()).combine(Constant::new(0.0));
    assert_eq!(same.len(), 2);

    let shifted = CostFunction::from(base.clone()).offset(3.5);
    assert_eq!(shifted.len(), 3);
    assert_eq!(shifted.ndata(), base.ndata());
    let args = [0.5, 0.25];
    assert_relative_eq!(
        shifted.call(&args).unwrap(),
        base.call(&args).unwrap() + 3.5,
        epsilon = 1e-12
    );
}

#[test]
fn test_signature_merge_gathers_sub_vectors() {
    let nx = NormalConstraint::new(["x"], vec![1.0], vec![1.0]).unwrap();
    let nxy = NormalConstraint::new(["x", "y"], vec![0.0, 2.0], vec![1.0, 0.5]).unwrap();
    let sum = CostFunction::from(nx.clone()).combine(nxy.clone());
    assert_eq!(sum.parameters(), &["x".to_string(), "y".to_string()]);
    assert_eq!(sum.maps(), &[vec![0], vec![0, 1]]);

    let (x, y) = (3.0, -1.0);
    let expected = nx.call(&[x]).unwrap() + nxy.call(&[x, y]).unwrap();
    assert_relative_eq!(sum.call(&[x, y]).unwrap(), expected, epsilon = 1e-12);
}

#[test]
fn test_nested_sums_are_flattened() {
    let a = CostFunction::from(NormalConstraint::new(["a"], vec![0.0], vec![1.0]).unwrap());
    let b = NormalConstraint::new(["b"], vec![0.0], vec![1.0]).unwrap();
    let c = NormalConstraint::new(["a", "c"], vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
    let inner = a.combine(b);
    let outer = CostFunction::from(inner).combine(c);
    assert_eq!(outer.len(), 3);
    assert!(outer.iter().all(|t| !matches!(t, CostFunction::Sum(_))));
    assert_eq!(outer.parameters(), &["a".to_string(), "b".to_string(), "c".to_string()]);
    assert_eq!(outer.maps()[2], vec![0, 2]);
    assert!(matches!(outer[1], CostFunction::NormalConstraint(_)));
    assert!(outer.get(3).is_none());
    assert_eq!((&outer).into_iter().count(), 3);
}

#[test]
fn test_sum_rejects_wrong_argument_count() {
    let sum = CostSum::new([
        CostFunction::from(NormalConstraint::new(["a"], vec![0.0], vec![1.0]).unwrap()),
        CostFunction::from(2.0),
    ]);
    assert!(matches!(sum.call(&[1.0, 2.0]), Err(Error::Validation(_))));
    assert_relative_eq!(sum.call(&[1.0]).unwrap(), 3.0, epsilon = 1e-12);
}

#[test]
fn test_sum_verbose_is_max_of_terms() {
    let quiet = NormalConstraint::new(["a"], vec![0.0], vec![1.0]).unwrap();
    let mut loud = NormalConstraint::new(["b"], vec![0.0], vec![1.0]).unwrap();
    loud.set_verbose(2);
    let mut sum = CostFunction::from(quiet).combine(loud);
    assert_eq!(sum.verbose(), 2);
    let value = sum.call(&[1.0, 1.0]).unwrap();
    assert_relative_eq!(value, 2.0, epsilon = 1e-12);
    sum.set_verbose(0);
    assert_eq!(sum.verbose(), 0);
    assert_eq!(sum.call(&[1.0, 1.0]).unwrap(), value);
}

#[test]
fn test_terms_in_sum_remain_mutable() {
    let nll = UnbinnedNLL::new(vec![0.0, 1.0, 2.0], normal_pdf()).unwrap();
    let nc = NormalConstraint::new(["mu"], vec![0.0], vec![1.0]).unwrap();
    let mut sum = CostFunction::from(nll).combine(nc);
    let before = sum.call(&[1.0, 1.0]).unwrap();
    {
        let mut term = sum.get_mut(0).unwrap();
        term.as_masked_mut().unwrap().set_mask(Some(Mask::Indices(vec![1]))).unwrap();
    }
    let after = sum.call(&[1.0, 1.0]).unwrap();
    assert!(after < before);
    assert_eq!(sum.parameters(), &["mu".to_string(), "sigma".to_string()]);
    assert!(sum.get_mut(1).unwrap().as_masked_mut().is_none());
}

// ---------------------------------------------------------------------------
// Binned
// ---------------------------------------------------------------------------

#[test]
fn test_binned_nll_dense_scan_finds_generating_parameter() {
    let a_true = 0.5;
    let xe = edges(20);
    let cdf = linear_shape_cdf();
    let Values::Array(f) = cdf.eval(&xe, &[a_true]) else { unreachable!() };
    let n: Vec<f64> = f.windows(2).map(|w| 10_000.0 * (w[1] - w[0])).collect();
    let nll = BinnedNLL::new(n, xe, cdf).unwrap();

    let (a_best, _) = (0..=1800)
        .map(|i| -0.9 + i as f64 * 0.001)
        .map(|a| (a, nll.call(&[a]).unwrap()))
        .fold((f64::NAN, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best });
    assert!((a_best - a_true).abs() < 0.015, "a_best = {a_best}");
    assert_eq!(nll.ndata(), 20.0);
}

#[test]
fn test_weighted_histogram_bohm_zech_scaling() {
    let n = vec![[10.0, 4.0], [20.0, 9.0]];
    let xe = vec![0.0, 1.0, 2.0];
    let s: [f64; 2] = [2.5, 20.0 / 9.0];
    let n_eff: [f64; 2] = [10.0 * s[0], 20.0 * s[1]];

    let nll = BinnedNLL::new(n.clone(), xe.clone(), half_cdf()).unwrap();
    // total weight 30 shared equally, then scaled
    let mu: [f64; 2] = [15.0 * s[0], 15.0 * s[1]];
    let expected: f64 =
        2.0 * (0..2).map(|i| n_eff[i] * (n_eff[i].ln() - mu[i].ln())).sum::<f64>();
    assert_relative_eq!(nll.call(&[]).unwrap(), expected, epsilon = 1e-10);

    let ext = ExtendedBinnedNLL::new(n, xe, scaled_half_cdf()).unwrap();
    let expected: f64 = 2.0
        * (0..2)
            .map(|i| mu[i] - n_eff[i] + n_eff[i] * (n_eff[i].ln() - mu[i].ln()))
            .sum::<f64>();
    assert_relative_eq!(ext.call(&[30.0]).unwrap(), expected, epsilon = 1e-10);
}

#[test]
fn test_weighted_with_unit_weights_matches_counts() {
    let counts = vec![3.0, 7.0, 5.0, 1.0];
    let pairs = BinContents::from_sums(&counts, &counts).unwrap();
    let a = BinnedNLL::new(counts, edges(4), linear_shape_cdf()).unwrap();
    let b = BinnedNLL::new(pairs, edges(4), linear_shape_cdf()).unwrap();
    for p in [-0.5, 0.0, 0.3] {
        assert_relative_eq!(a.call(&[p]).unwrap(), b.call(&[p]).unwrap(), epsilon = 1e-9);
    }
}

#[test]
fn test_masked_binned_ndata_and_reset() {
    let mut nll = BinnedNLL::new(vec![1.0, 2.0, 3.0, 4.0], edges(4), linear_shape_cdf()).unwrap();
    nll.set_mask(Some(Mask::Select(vec![true, false, true, true]))).unwrap();
    assert_eq!(nll.ndata(), 3.0);
    nll.set_mask(Some(Mask::Indices(vec![0]))).unwrap();
    assert_eq!(nll.ndata(), 1.0);
    // single renormalized bin reproduces its count exactly
    assert_relative_eq!(nll.call(&[0.2]).unwrap(), 0.0, epsilon = 1e-12);
    nll.set_mask(None).unwrap();
    assert_eq!(nll.ndata(), 4.0);
}

#[test]
fn test_bad_masks_rejected() {
    let mut nll = BinnedNLL::new(vec![1.0, 2.0], edges(2), linear_shape_cdf()).unwrap();
    assert!(matches!(nll.set_mask(Some(Mask::Select(vec![true]))), Err(Error::Validation(_))));
    assert!(matches!(nll.set_mask(Some(Mask::Indices(vec![2]))), Err(Error::Validation(_))));
    assert!(nll.mask().is_none());
}

// ---------------------------------------------------------------------------
// Least squares
// ---------------------------------------------------------------------------

#[test]
fn test_losses_against_explicit_formulas() {
    let x = vec![0.0, 1.0, 2.0, 3.0];
    let y = vec![0.9, 3.2, 4.8, 7.1];
    let ye = vec![0.1, 0.2, 0.2, 0.3];
    let (a, b) = (1.0, 2.0);
    let z: Vec<f64> = (0..4).map(|i| (y[i] - (a + b * x[i])) / ye[i]).collect();

    let mut ls = LeastSquares::new(x, y, ye, line()).unwrap();
    let linear: f64 = z.iter().map(|z| z * z).sum();
    assert_relative_eq!(ls.call(&[a, b]).unwrap(), linear, epsilon = 1e-10);

    ls.set_loss("soft_l1".parse().unwrap());
    let soft: f64 = z.iter().map(|z| 2.0 * ((1.0 + z * z).sqrt() - 1.0)).sum();
    assert_relative_eq!(ls.call(&[a, b]).unwrap(), soft, epsilon = 1e-10);

    ls.set_loss(Loss::custom(|z2: &[f64]| z2.to_vec()));
    assert_relative_eq!(ls.call(&[a, b]).unwrap(), linear, epsilon = 1e-10);
}

#[test]
fn test_soft_l1_agrees_with_linear_for_small_pulls() {
    let x = vec![0.0, 1.0, 2.0];
    let y = vec![1.001, 2.998, 5.002];
    let mut ls = LeastSquares::new(x, y, 1.0, line()).unwrap();
    let linear = ls.call(&[1.0, 2.0]).unwrap();
    ls.set_loss(Loss::SoftL1);
    let soft = ls.call(&[1.0, 2.0]).unwrap();
    assert!(linear > 0.0);
    // 2 (sqrt(1 + z^2) - 1) = z^2 - z^4 / 4 + ...
    assert_relative_eq!(soft, linear, max_relative = 1e-5);
}

#[test]
fn test_unknown_loss_is_construction_error() {
    let ls = LeastSquares::new(vec![0.0], vec![0.0], 1.0, line()).unwrap();
    let err = ls.with_loss_name("arctan").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn test_portable_and_auto_kernels_agree() {
    let x: Vec<f64> = (0..37).map(|i| i as f64 * 0.1).collect();
    let y: Vec<f64> = x.iter().map(|v| 1.0 + 2.0 * v + (v * 7.0).sin() * 0.05).collect();
    let auto = LeastSquares::new(x.clone(), y.clone(), 0.05, line()).unwrap();
    let portable = LeastSquares::new(x, y, 0.05, line())
        .unwrap()
        .with_options(CostOptions { kernels: KernelPolicy::Portable, ..CostOptions::default() });
    for loss in [Loss::Linear, Loss::SoftL1] {
        let a = auto.clone().with_loss(loss.clone());
        let p = portable.clone().with_loss(loss);
        assert_relative_eq!(
            a.call(&[1.0, 2.0]).unwrap(),
            p.call(&[1.0, 2.0]).unwrap(),
            max_relative = 1e-12
        );
    }
}

// ---------------------------------------------------------------------------
// Unbinned
// ---------------------------------------------------------------------------

#[test]
fn test_unbinned_matches_reference_density() {
    let data = vec![-1.2, 0.3, 0.8, 2.4, 1.1];
    let nll = UnbinnedNLL::new(data.clone(), normal_pdf()).unwrap();
    let log_nll = UnbinnedNLL::with_log_model(data.clone(), normal_logpdf()).unwrap();
    let d = Normal::new(0.5, 1.5).unwrap();
    let expected: f64 = -2.0 * data.iter().map(|&x| d.ln_pdf(x)).sum::<f64>();
    assert_relative_eq!(nll.call(&[0.5, 1.5]).unwrap(), expected, epsilon = 1e-10);
    assert_relative_eq!(log_nll.call(&[0.5, 1.5]).unwrap(), expected, epsilon = 1e-10);
    assert_eq!(describe(nll.pdf()), vec!["mu".to_string(), "sigma".to_string()]);
}

#[test]
fn test_extended_unbinned_and_binned_share_yield_term() {
    let data = vec![0.2, 0.5, 0.9];
    let scaled: ScaledDensity = Model::new(["n"], |x: &[f64], p: &[f64]| {
        (p[0], x.iter().map(|_| p[0]).collect::<Vec<_>>())
    });
    let nll = ExtendedUnbinnedNLL::new(data, scaled).unwrap();
    // uniform on [0, 1]: 2 (n - 3 ln n), minimal at n = 3
    let at = |n: f64| nll.call(&[n]).unwrap();
    assert_relative_eq!(at(3.0), 2.0 * (3.0 - 3.0 * 3.0f64.ln()), epsilon = 1e-12);
    assert!(at(3.0) < at(2.9) && at(3.0) < at(3.1));
}

#[test]
fn test_binned_gaussian_shape_minimum() {
    // binned fit of a Gaussian shape against its own expected counts
    let xe: Vec<f64> = (0..=10).map(|i| -2.5 + i as f64 * 0.5).collect();
    let d = Normal::new(0.0, 1.0).unwrap();
    let norm = d.cdf(2.5) - d.cdf(-2.5);
    let n: Vec<f64> = xe.windows(2).map(|w| 1000.0 * (d.cdf(w[1]) - d.cdf(w[0])) / norm).collect();
    let cdf: Cdf = Model::new(["mu"], move |x: &[f64], p: &[f64]| {
        let g = Normal::new(p[0], 1.0).unwrap();
        let lo = g.cdf(-2.5);
        let hi = g.cdf(2.5);
        x.iter().map(|&v| (g.cdf(v) - lo) / (hi - lo)).collect::<Vec<_>>()
    });
    let nll = BinnedNLL::new(n, xe, cdf).unwrap();
    assert_relative_eq!(nll.call(&[0.0]).unwrap(), 0.0, epsilon = 1e-9);
    assert!(nll.call(&[0.1]).unwrap() > 0.0);
    assert!(nll.call(&[-0.1]).unwrap() > 0.0);
}

#[test]
fn test_scalar_model_output_is_broadcast() {
    let flat: Density = Model::new(Vec::<String>::new(), |_: &[f64], _: &[f64]| 0.5);
    let nll = UnbinnedNLL::new(vec![0.1, 0.2, 0.3, 0.4], flat).unwrap();
    assert_relative_eq!(nll.call(&[]).unwrap(), -8.0 * 0.5f64.ln(), epsilon = 1e-12);
}

#[test]
fn test_options_from_json_set_verbosity() {
    let opts = CostOptions::from_json(r#"{"verbose": 1}"#).unwrap();
    let nll = UnbinnedNLL::new(vec![0.0], normal_pdf()).unwrap().with_options(opts);
    assert_eq!(nll.verbose(), 1);
    assert!(nll.call(&[0.0, 1.0]).unwrap().is_finite());
    assert_eq!(nll.errordef(), 1.0);
}
