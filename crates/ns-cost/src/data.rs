//! Columnar data storage with masking.
//!
//! Every masked cost term owns one [`Table`] (structure-of-arrays, one `Vec` per
//! column) wrapped in [`MaskedData`]. The mask selects rows; the active table is
//! recomputed by every setter so reads never see a stale view.

use ns_core::{Cost, Error, Result};

/// Row selection applied to a cost term's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mask {
    /// One flag per row; `true` rows are active.
    Select(Vec<bool>),
    /// Indices of active rows, in evaluation order.
    Indices(Vec<usize>),
}

impl From<Vec<bool>> for Mask {
    fn from(v: Vec<bool>) -> Self {
        Mask::Select(v)
    }
}

impl From<Vec<usize>> for Mask {
    fn from(v: Vec<usize>) -> Self {
        Mask::Indices(v)
    }
}

impl Mask {
    /// Number of selected rows.
    pub fn count(&self) -> usize {
        match self {
            Mask::Select(flags) => flags.iter().filter(|&&f| f).count(),
            Mask::Indices(idx) => idx.len(),
        }
    }

    /// Selected row indices.
    pub fn rows(&self) -> Vec<usize> {
        match self {
            Mask::Select(flags) => {
                flags.iter().enumerate().filter_map(|(i, &f)| f.then_some(i)).collect()
            }
            Mask::Indices(idx) => idx.clone(),
        }
    }

    fn validate(&self, n_rows: usize) -> Result<()> {
        match self {
            Mask::Select(flags) if flags.len() != n_rows => Err(Error::Validation(format!(
                "boolean mask has length {}, data has {n_rows} rows",
                flags.len()
            ))),
            Mask::Indices(idx) => match idx.iter().find(|&&i| i >= n_rows) {
                Some(i) => Err(Error::Validation(format!(
                    "mask index {i} out of range for {n_rows} rows"
                ))),
                None => Ok(()),
            },
            Mask::Select(_) => Ok(()),
        }
    }
}

/// Column table: `n_cols` columns of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    n_rows: usize,
    columns: Vec<Vec<f64>>,
}

impl Table {
    /// Build a table from columns of equal length.
    pub fn from_columns(columns: Vec<Vec<f64>>) -> Result<Self> {
        let Some(first) = columns.first() else {
            return Err(Error::Validation("table requires at least one column".into()));
        };
        let n_rows = first.len();
        if let Some((i, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != n_rows) {
            return Err(Error::Validation(format!(
                "column length mismatch for column {i}: expected {n_rows}, got {}",
                col.len()
            )));
        }
        Ok(Self { n_rows, columns })
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column `i`.
    ///
    /// # Panics
    /// Panics if `i >= n_cols()`.
    pub fn column(&self, i: usize) -> &[f64] {
        &self.columns[i]
    }

    /// All columns.
    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    fn select(&self, rows: &[usize]) -> Self {
        let columns = self.columns.iter().map(|c| rows.iter().map(|&r| c[r]).collect()).collect();
        Self { n_rows: rows.len(), columns }
    }
}

/// Data, optional mask and the derived active view.
#[derive(Debug, Clone)]
pub struct MaskedData {
    data: Table,
    mask: Option<Mask>,
    // None when unmasked: the active view is `data` itself.
    masked: Option<Table>,
}

impl MaskedData {
    /// Wrap unmasked data.
    pub fn new(data: Table) -> Self {
        Self { data, mask: None, masked: None }
    }

    /// All stored data, ignoring the mask.
    pub fn data(&self) -> &Table {
        &self.data
    }

    /// Current mask.
    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_ref()
    }

    /// Rows selected by the mask.
    pub fn active(&self) -> &Table {
        self.masked.as_ref().unwrap_or(&self.data)
    }

    /// Number of active rows.
    pub fn n_active(&self) -> usize {
        self.active().n_rows()
    }

    /// Replace all data; the new table must have the same shape.
    pub fn set_data(&mut self, data: Table) -> Result<()> {
        if data.n_rows() != self.data.n_rows() || data.n_cols() != self.data.n_cols() {
            return Err(Error::Validation(format!(
                "cannot assign data of shape ({}, {}) to data of shape ({}, {})",
                data.n_rows(),
                data.n_cols(),
                self.data.n_rows(),
                self.data.n_cols()
            )));
        }
        self.data = data;
        self.refresh();
        Ok(())
    }

    /// Replace one column; `values` must have one entry per row.
    pub fn set_column(&mut self, col: usize, values: Vec<f64>) -> Result<()> {
        if col >= self.data.n_cols() {
            return Err(Error::Validation(format!(
                "column {col} out of range for {} columns",
                self.data.n_cols()
            )));
        }
        if values.len() != self.data.n_rows() {
            return Err(Error::Validation(format!(
                "cannot assign {} values to column of length {}",
                values.len(),
                self.data.n_rows()
            )));
        }
        self.data.columns[col] = values;
        self.refresh();
        Ok(())
    }

    /// Set or clear the mask.
    pub fn set_mask(&mut self, mask: Option<Mask>) -> Result<()> {
        if let Some(m) = &mask {
            m.validate(self.data.n_rows())?;
        }
        self.mask = mask;
        self.refresh();
        Ok(())
    }

    fn refresh(&mut self) {
        self.masked = self.mask.as_ref().map(|m| self.data.select(&m.rows()));
    }
}

/// Cost term backed by masked data.
pub trait MaskedCost: Cost {
    /// Storage of the term.
    fn masked_data(&self) -> &MaskedData;

    /// Mutable storage of the term.
    fn masked_data_mut(&mut self) -> &mut MaskedData;

    /// Current mask.
    fn mask(&self) -> Option<&Mask> {
        self.masked_data().mask()
    }

    /// Set or clear the mask; `None` disables filtering.
    fn set_mask(&mut self, mask: Option<Mask>) -> Result<()> {
        self.masked_data_mut().set_mask(mask)
    }
}
