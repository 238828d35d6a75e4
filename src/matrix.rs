//! Dense matrices used as assembly targets and solve inputs
mod block;
mod factorization;
mod symmetric;
mod views;

pub use block::SymmetricBlockMatrix;
pub use factorization::{BunchKaufman, Cholesky};
pub use symmetric::SymMatrix;
pub use views::{Block, SymBlock};

use crate::traits::AssemblyTarget;
use rlst::{rlst_dynamic_array2, DynamicArray, RandomAccessByRef, RandomAccessMut, Shape};

/// General dense matrix
pub type Matrix = DynamicArray<f64, 2>;

/// Create a matrix filled with zeros
pub fn zeros(rows: usize, cols: usize) -> Matrix {
    rlst_dynamic_array2!(f64, [rows, cols])
}

/// Copy a row of a matrix
pub fn row(matrix: &Matrix, i: usize) -> Vec<f64> {
    (0..matrix.shape()[1])
        .map(|j| *matrix.get([i, j]).unwrap())
        .collect()
}

/// Overwrite a row of a matrix
pub fn set_row(matrix: &mut Matrix, i: usize, values: &[f64]) {
    assert_eq!(values.len(), matrix.shape()[1], "Row has wrong length");
    for (j, v) in values.iter().enumerate() {
        *matrix.get_mut([i, j]).unwrap() = *v;
    }
}

impl AssemblyTarget for Matrix {
    fn value(&self, i: usize, j: usize) -> f64 {
        *self.get([i, j]).unwrap()
    }
    fn add_value(&mut self, i: usize, j: usize, value: f64) {
        *self.get_mut([i, j]).unwrap() += value;
    }
    fn dimensions(&self) -> [usize; 2] {
        self.shape()
    }
}
