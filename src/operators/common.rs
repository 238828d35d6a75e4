//! Common utility functions
use crate::geometry::Mesh;
use crate::traits::AssemblyTarget;
use itertools::Itertools;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub(crate) fn equal_meshes(mesh1: &Mesh, mesh2: &Mesh) -> bool {
    std::ptr::eq(mesh1, mesh2)
}

/// Log the operator being assembled
pub(crate) fn message(verbose: bool, operator: &str, meshes: &[&Mesh]) {
    let args = meshes
        .iter()
        .map(|m| format!("mesh {}", m.name()))
        .join(" , ");
    if verbose {
        log::info!("OPERATOR {operator:<2}... (arg : {args} )");
    } else {
        log::debug!("OPERATOR {operator:<2}... (arg : {args} )");
    }
}

/// Data for a sparse matrix
///
/// Entries are kept as triplets; repeated positions are summed when the data is added into a
/// matrix.
#[derive(Debug, Clone)]
pub struct SparseMatrixData {
    /// Data
    pub data: Vec<f64>,
    /// Rows
    pub rows: Vec<usize>,
    /// Columns
    pub cols: Vec<usize>,
    /// Shape of the matrix
    pub shape: [usize; 2],
}

impl SparseMatrixData {
    /// Create new sparse matrix
    pub fn new(shape: [usize; 2]) -> Self {
        Self {
            data: vec![],
            rows: vec![],
            cols: vec![],
            shape,
        }
    }
    /// Create new sparse matrix with a known size
    pub fn new_known_size(shape: [usize; 2], size: usize) -> Self {
        Self {
            data: Vec::with_capacity(size),
            rows: Vec::with_capacity(size),
            cols: Vec::with_capacity(size),
            shape,
        }
    }
    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.data.len()
    }
    /// Whether no entry is stored
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    /// Store an entry
    pub fn push(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.shape[0] && col < self.shape[1]);
        self.rows.push(row);
        self.cols.push(col);
        self.data.push(value);
    }
    /// Add another sparse matrix to this matrix
    pub fn add(&mut self, other: SparseMatrixData) {
        debug_assert!(self.shape[0] == other.shape[0]);
        debug_assert!(self.shape[1] == other.shape[1]);
        self.rows.extend(&other.rows);
        self.cols.extend(&other.cols);
        self.data.extend(&other.data);
    }
    /// Add the entries into a matrix
    pub fn add_into<T: AssemblyTarget + ?Sized>(&self, matrix: &mut T) {
        for ((i, j), value) in self.rows.iter().zip(&self.cols).zip(&self.data) {
            matrix.add_value(*i, *j, *value);
        }
    }
}

/// Collect the entries computed for each of `n` independent items
///
/// The entries are concatenated in item order, so that the result does not depend on how the
/// work is scheduled.
#[cfg(feature = "parallel")]
pub(crate) fn collect_entries<F>(n: usize, shape: [usize; 2], f: F) -> SparseMatrixData
where
    F: Fn(usize) -> SparseMatrixData + Sync + Send,
{
    (0..n).into_par_iter().map(f).reduce(
        || SparseMatrixData::new(shape),
        |mut a, b| {
            a.add(b);
            a
        },
    )
}

/// Collect the entries computed for each of `n` independent items
#[cfg(not(feature = "parallel"))]
pub(crate) fn collect_entries<F>(n: usize, shape: [usize; 2], f: F) -> SparseMatrixData
where
    F: Fn(usize) -> SparseMatrixData + Sync + Send,
{
    (0..n).map(f).fold(SparseMatrixData::new(shape), |mut a, b| {
        a.add(b);
        a
    })
}
