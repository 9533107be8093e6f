//! Binned negative log-likelihoods.
//!
//! Bin contents are either plain counts or, for weighted histograms, pairs of
//! (sum of weights, sum of squared weights). Weighted contents are stored as
//! four columns `w, w2, w * s, s` with the Bohm–Zech scale `s = w / w2`
//! (NIMA 748 (2014) 1-6): the effective count `w * s` is Poisson distributed
//! with expectation `mu * s`, so the ordinary Poisson kernels apply.

use crate::config::CostOptions;
use crate::data::{MaskedCost, MaskedData, Table};
use crate::kind::{BinnedKind, Extended, Standard};
use crate::model::{Cdf, expect_len};
use crate::signature::{check_args, unique_names};
use ns_compute::{Element, KernelTable};
use ns_core::{Cost, Describe, Error, Result};
use std::marker::PhantomData;

/// Histogram contents.
#[derive(Debug, Clone, PartialEq)]
pub enum BinContents {
    /// Event counts per bin.
    Counts(Vec<f64>),
    /// `[sum of weights, sum of squared weights]` per bin.
    Weighted(Vec<Vec<f64>>),
}

impl From<Vec<f64>> for BinContents {
    fn from(n: Vec<f64>) -> Self {
        BinContents::Counts(n)
    }
}

impl From<Vec<[f64; 2]>> for BinContents {
    fn from(n: Vec<[f64; 2]>) -> Self {
        BinContents::Weighted(n.into_iter().map(Vec::from).collect())
    }
}

impl BinContents {
    /// Weighted contents from separate weight and squared-weight sums.
    pub fn from_sums(sumw: &[f64], sumw2: &[f64]) -> Result<Self> {
        if sumw.len() != sumw2.len() {
            return Err(Error::Validation(format!(
                "sumw and sumw2 have different lengths: {} != {}",
                sumw.len(),
                sumw2.len()
            )));
        }
        Ok(BinContents::Weighted(sumw.iter().zip(sumw2).map(|(&w, &w2)| vec![w, w2]).collect()))
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        match self {
            BinContents::Counts(n) => n.len(),
            BinContents::Weighted(n) => n.len(),
        }
    }

    /// Whether there are no bins.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const W: usize = 0;
const W2: usize = 1;
const N_EFF: usize = 2;
const SCALE: usize = 3;

fn prepare(contents: BinContents) -> Result<Table> {
    match contents {
        BinContents::Counts(n) => Table::from_columns(vec![n]),
        BinContents::Weighted(pairs) => {
            if pairs.iter().any(|p| p.len() != 2) {
                return Err(Error::Validation("n must have shape (..., 2)".into()));
            }
            let tiny = f64::tiny();
            let (w, w2): (Vec<f64>, Vec<f64>) = pairs.iter().map(|p| (p[0], p[1])).unzip();
            let s: Vec<f64> = w.iter().zip(&w2).map(|(w, w2)| w / (w2 + tiny)).collect();
            let n_eff = w.iter().zip(&s).map(|(w, s)| w * s).collect();
            Table::from_columns(vec![w, w2, n_eff, s])
        }
    }
}

/// Binned likelihood of flavour `K`.
#[derive(Debug, Clone)]
pub struct BinnedCost<K: BinnedKind> {
    data: MaskedData,
    edges: Vec<f64>,
    model: Cdf,
    names: Vec<String>,
    verbose: u8,
    kernels: KernelTable<f64>,
    _kind: PhantomData<K>,
}

/// Binned negative log-likelihood.
///
/// Fits the shape of a distribution to a histogram. The model is the
/// cumulative distribution normalized to unity over the edge range.
pub type BinnedNLL = BinnedCost<Standard>;

/// Binned extended negative log-likelihood.
///
/// Fits shape and yield; the model is the cumulative distribution scaled by
/// the expected number of events.
pub type ExtendedBinnedNLL = BinnedCost<Extended>;

impl<K: BinnedKind> BinnedCost<K> {
    /// Create the cost from bin contents, `len(n) + 1` bin edges and a model.
    pub fn new(n: impl Into<BinContents>, edges: Vec<f64>, model: Cdf) -> Result<Self> {
        let table = prepare(n.into())?;
        if table.n_rows() + 1 != edges.len() {
            return Err(Error::Validation("n and xe have incompatible shapes".into()));
        }
        let names = unique_names(model.parameter_names().to_vec())?;
        Ok(Self {
            data: MaskedData::new(table),
            edges,
            model,
            names,
            verbose: 0,
            kernels: CostOptions::default().kernels(),
            _kind: PhantomData,
        })
    }

    /// Apply options.
    pub fn with_options(mut self, options: CostOptions) -> Self {
        self.verbose = options.verbose;
        self.kernels = options.kernels();
        self
    }

    /// Whether the contents are weighted.
    pub fn is_weighted(&self) -> bool {
        self.data.data().n_cols() > 1
    }

    /// Bin contents as given, without the derived columns.
    pub fn contents(&self) -> BinContents {
        let t = self.data.data();
        if self.is_weighted() {
            let pairs = t.column(W).iter().zip(t.column(W2)).map(|(&w, &w2)| vec![w, w2]);
            BinContents::Weighted(pairs.collect())
        } else {
            BinContents::Counts(t.column(W).to_vec())
        }
    }

    /// Counts, or sums of weights for weighted contents.
    pub fn counts(&self) -> &[f64] {
        self.data.data().column(W)
    }

    /// Sums of squared weights, if weighted.
    pub fn sumw2(&self) -> Option<&[f64]> {
        self.is_weighted().then(|| self.data.data().column(W2))
    }

    /// Bohm–Zech scale factors, if weighted.
    pub fn scale(&self) -> Option<&[f64]> {
        self.is_weighted().then(|| self.data.data().column(SCALE))
    }

    /// Replace the contents; the number of bins and the weighting must not change.
    pub fn set_data(&mut self, n: impl Into<BinContents>) -> Result<()> {
        self.data.set_data(prepare(n.into())?)
    }

    /// Bin edges.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Replace the bin edges; the number of edges must not change.
    pub fn set_edges(&mut self, edges: Vec<f64>) -> Result<()> {
        if edges.len() != self.edges.len() {
            return Err(Error::Validation("n and xe have incompatible shapes".into()));
        }
        self.edges = edges;
        Ok(())
    }

    fn increments(&self, args: &[f64]) -> Result<Vec<f64>> {
        let cdf = expect_len(self.model.eval(&self.edges, args), self.edges.len(), K::MODEL)?;
        let diff = cdf.windows(2).map(|w| w[1] - w[0]);
        Ok(match self.data.mask() {
            Some(mask) => {
                let diff: Vec<f64> = diff.collect();
                mask.rows().into_iter().map(|r| diff[r]).collect()
            }
            None => diff.collect(),
        })
    }
}

impl BinnedNLL {
    /// The cumulative distribution.
    pub fn cdf(&self) -> &Cdf {
        &self.model
    }
}

impl ExtendedBinnedNLL {
    /// The scaled cumulative distribution.
    pub fn scaled_cdf(&self) -> &Cdf {
        &self.model
    }
}

impl<K: BinnedKind> Cost for BinnedCost<K> {
    fn parameters(&self) -> &[String] {
        &self.names
    }

    fn ndata(&self) -> f64 {
        self.data.n_active() as f64
    }

    fn verbose(&self) -> u8 {
        self.verbose
    }

    fn set_verbose(&mut self, level: u8) {
        self.verbose = level;
    }

    fn evaluate(&self, args: &[f64]) -> Result<f64> {
        check_args(args, &self.names)?;
        let prob = self.increments(args)?;
        let active = self.data.active();
        let raw = active.column(W);
        let masked = self.data.mask().is_some();
        Ok(if self.is_weighted() {
            K::nll(
                prob,
                raw,
                active.column(N_EFF),
                Some(active.column(SCALE)),
                masked,
                &self.kernels,
            )
        } else {
            K::nll(prob, raw, raw, None, masked, &self.kernels)
        })
    }
}

impl<K: BinnedKind> MaskedCost for BinnedCost<K> {
    fn masked_data(&self) -> &MaskedData {
        &self.data
    }

    fn masked_data_mut(&mut self) -> &mut MaskedData {
        &mut self.data
    }
}
