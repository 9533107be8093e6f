//! Sum of cost terms.

use crate::constant::Constant;
use crate::function::CostFunction;
use crate::signature::{check_args, merge_signatures};
use ns_core::{Cost, Result};
use std::ops::{Deref, DerefMut, Index};

/// Sum of cost terms with merged parameter signatures.
///
/// Nested sums are flattened, so a `CostSum` only ever holds leaf terms. The
/// parameters of the sum are the first-occurrence-ordered union of the
/// parameters of its terms; terms sharing a parameter name share its value.
#[derive(Debug, Clone, Default)]
pub struct CostSum {
    terms: Vec<CostFunction>,
    maps: Vec<Vec<usize>>,
    names: Vec<String>,
}

impl CostSum {
    /// Sum the given terms.
    ///
    /// Zero constants are dropped since they do not change the value.
    pub fn new(terms: impl IntoIterator<Item = CostFunction>) -> Self {
        let mut flat = Vec::new();
        for term in terms {
            match term {
                CostFunction::Sum(sum) => flat.extend(sum.terms),
                CostFunction::Constant(c) if c.value() == 0.0 => {}
                other => flat.push(other),
            }
        }
        let (names, maps) = merge_signatures(flat.iter().map(|t| t.parameters()));
        Self { terms: flat, maps, names }
    }

    /// Sum of `terms` and a constant `value`.
    pub fn with_offset(terms: impl IntoIterator<Item = CostFunction>, value: f64) -> Self {
        Self::new(terms.into_iter().chain([CostFunction::Constant(Constant::new(value))]))
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the sum has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Term `i`.
    pub fn get(&self, i: usize) -> Option<&CostFunction> {
        self.terms.get(i)
    }

    /// Mutable term `i`, e.g. to change its data or mask.
    ///
    /// The sum is flattened and its signature merged again when the returned
    /// guard is dropped, so the term may also be replaced.
    pub fn get_mut(&mut self, i: usize) -> Option<TermMut<'_>> {
        if i < self.terms.len() { Some(TermMut { sum: self, index: i }) } else { None }
    }

    /// Iterate over the terms.
    pub fn iter(&self) -> std::slice::Iter<'_, CostFunction> {
        self.terms.iter()
    }

    /// Position of each parameter of term `i` in the parameters of the sum.
    pub fn maps(&self) -> &[Vec<usize>] {
        &self.maps
    }
}

/// Mutable access to a term of a [`CostSum`], returned by [`CostSum::get_mut`].
#[derive(Debug)]
pub struct TermMut<'a> {
    sum: &'a mut CostSum,
    index: usize,
}

impl Deref for TermMut<'_> {
    type Target = CostFunction;

    fn deref(&self) -> &CostFunction {
        &self.sum.terms[self.index]
    }
}

impl DerefMut for TermMut<'_> {
    fn deref_mut(&mut self) -> &mut CostFunction {
        &mut self.sum.terms[self.index]
    }
}

impl Drop for TermMut<'_> {
    fn drop(&mut self) {
        let terms = std::mem::take(&mut self.sum.terms);
        *self.sum = CostSum::new(terms);
    }
}

impl Index<usize> for CostSum {
    type Output = CostFunction;

    fn index(&self, i: usize) -> &CostFunction {
        &self.terms[i]
    }
}

impl<'a> IntoIterator for &'a CostSum {
    type Item = &'a CostFunction;
    type IntoIter = std::slice::Iter<'a, CostFunction>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}

impl Cost for CostSum {
    fn parameters(&self) -> &[String] {
        &self.names
    }

    fn ndata(&self) -> f64 {
        self.terms.iter().map(Cost::ndata).sum()
    }

    fn verbose(&self) -> u8 {
        self.terms.iter().map(Cost::verbose).max().unwrap_or(0)
    }

    fn set_verbose(&mut self, level: u8) {
        self.terms.iter_mut().for_each(|t| t.set_verbose(level));
    }

    fn evaluate(&self, args: &[f64]) -> Result<f64> {
        check_args(args, &self.names)?;
        let mut sub = Vec::new();
        let mut total = 0.0;
        for (term, map) in self.terms.iter().zip(&self.maps) {
            sub.clear();
            sub.extend(map.iter().map(|&i| args[i]));
            total += term.evaluate(&sub)?;
        }
        Ok(total)
    }
}
