//! Symmetric matrices in packed storage
use crate::matrix::{zeros, BunchKaufman, Cholesky, Matrix};
use crate::traits::{AssemblyTarget, SymmetricTarget};
use crate::types::{BemError, BemResult};
use blas::dspmv;
use rlst::{
    empty_array, MultIntoResize, RandomAccessByRef, RandomAccessMut, RawAccess, RawAccessMut, Shape,
};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

/// Position of the entry `(i, j)` in the packed upper triangle
#[inline]
pub(crate) fn packed_index(i: usize, j: usize) -> usize {
    if i <= j {
        i + j * (j + 1) / 2
    } else {
        j + i * (i + 1) / 2
    }
}

/// A symmetric matrix storing the `n(n+1)/2` entries of its upper triangle
#[derive(Debug, Clone, PartialEq)]
pub struct SymMatrix {
    size: usize,
    data: Vec<f64>,
}

impl SymMatrix {
    /// Create a matrix filled with zeros
    pub fn new(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * (size + 1) / 2],
        }
    }

    /// Create a matrix from packed upper triangular data
    pub fn from_packed(data: Vec<f64>) -> BemResult<Self> {
        let size = (((1 + 8 * data.len()) as f64).sqrt() as usize - 1) / 2;
        if size * (size + 1) / 2 != data.len() {
            return Err(BemError::DimensionMismatch {
                expected: size * (size + 1) / 2,
                actual: data.len(),
            });
        }
        Ok(Self { size, data })
    }

    /// Create a matrix from the upper triangle of a square matrix
    pub fn from_upper(matrix: &Matrix) -> BemResult<Self> {
        let [rows, cols] = matrix.shape();
        if rows != cols {
            return Err(BemError::DimensionMismatch {
                expected: rows,
                actual: cols,
            });
        }
        let mut result = Self::new(rows);
        for j in 0..rows {
            for i in 0..=j {
                result.set(i, j, *matrix.get([i, j]).unwrap());
            }
        }
        Ok(result)
    }

    /// Identity matrix
    pub fn identity(size: usize) -> Self {
        let mut result = Self::new(size);
        for i in 0..size {
            result.set(i, i, 1.0);
        }
        result
    }

    /// Number of rows (and columns)
    pub fn size(&self) -> usize {
        self.size
    }
    /// Packed data
    pub fn data(&self) -> &[f64] {
        &self.data
    }
    /// Mutable packed data
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Get an entry
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.size && j < self.size);
        self.data[packed_index(i, j)]
    }

    /// Set an entry, and its mirror
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        debug_assert!(i < self.size && j < self.size);
        self.data[packed_index(i, j)] = value;
    }

    /// Mutable reference to an entry
    #[inline]
    pub fn get_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        debug_assert!(i < self.size && j < self.size);
        &mut self.data[packed_index(i, j)]
    }

    /// Set all entries to a value
    pub fn set_all(&mut self, value: f64) {
        self.data.iter_mut().for_each(|d| *d = value);
    }

    /// Copy a row
    pub fn row(&self, i: usize) -> Vec<f64> {
        (0..self.size).map(|j| self.get(i, j)).collect()
    }

    /// Overwrite a row, and therefore the matching column
    pub fn set_row(&mut self, i: usize, values: &[f64]) -> BemResult<()> {
        self.check_size(values.len())?;
        for (j, v) in values.iter().enumerate() {
            self.set(i, j, *v);
        }
        Ok(())
    }

    /// Frobenius norm
    pub fn frobenius_norm(&self) -> f64 {
        let mut sum = 0.0;
        for j in 0..self.size {
            for i in 0..j {
                sum += 2.0 * self.get(i, j).powi(2);
            }
            sum += self.get(j, j).powi(2);
        }
        sum.sqrt()
    }

    /// Square diagonal block of size `size` starting at `start`
    pub fn submat(&self, start: usize, size: usize) -> BemResult<SymMatrix> {
        self.check_range(start, size)?;
        let mut result = Self::new(size);
        for j in 0..size {
            for i in 0..=j {
                result.set(i, j, self.get(start + i, start + j));
            }
        }
        Ok(result)
    }

    /// Rectangular block with `rows` rows from `row_start` and `cols` columns from `col_start`
    pub fn submat_rect(
        &self,
        row_start: usize,
        rows: usize,
        col_start: usize,
        cols: usize,
    ) -> BemResult<Matrix> {
        self.check_range(row_start, rows)?;
        self.check_range(col_start, cols)?;
        let mut result = zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                *result.get_mut([i, j]).unwrap() = self.get(row_start + i, col_start + j);
            }
        }
        Ok(result)
    }

    /// Dense copy
    pub fn to_dense(&self) -> Matrix {
        let mut result = zeros(self.size, self.size);
        for i in 0..self.size {
            for j in 0..self.size {
                *result.get_mut([i, j]).unwrap() = self.get(i, j);
            }
        }
        result
    }

    /// Product with a vector
    pub fn mul_vec(&self, v: &[f64]) -> BemResult<Vec<f64>> {
        self.check_size(v.len())?;
        let mut result = vec![0.0; self.size];
        if self.size > 0 {
            unsafe {
                dspmv(
                    b'U',
                    self.size as i32,
                    1.0,
                    &self.data,
                    v,
                    1,
                    0.0,
                    &mut result,
                    1,
                );
            }
        }
        Ok(result)
    }

    /// Product with a general matrix
    pub fn mul_mat(&self, other: &Matrix) -> BemResult<Matrix> {
        self.check_size(other.shape()[0])?;
        let dense = self.to_dense();
        Ok(empty_array::<f64, 2>().simple_mult_into_resize(dense.view(), other.view()))
    }

    /// Product with another symmetric matrix
    pub fn mul_sym(&self, other: &SymMatrix) -> BemResult<Matrix> {
        self.check_size(other.size)?;
        self.mul_mat(&other.to_dense())
    }

    /// Factorize the matrix as `U D U^T` with Bunch-Kaufman pivoting
    pub fn factorize(&self) -> BemResult<BunchKaufman> {
        BunchKaufman::new(self.clone())
    }

    /// Factorize a positive definite matrix as `U^T U`
    pub fn cholesky(&self) -> BemResult<Cholesky> {
        Cholesky::new(self.clone())
    }

    /// Solve `A x = b`
    pub fn solve(&self, b: &[f64]) -> BemResult<Vec<f64>> {
        self.check_size(b.len())?;
        Ok(self.factorize()?.solve(b))
    }

    /// Solve `A X = B` for every column of `B`
    pub fn solve_matrix(&self, b: &Matrix) -> BemResult<Matrix> {
        let [rows, cols] = b.shape();
        self.check_size(rows)?;
        let factors = self.factorize()?;
        let mut result = zeros(rows, cols);
        result.data_mut().copy_from_slice(b.data());
        factors.solve_matrix_in_place(&mut result);
        Ok(result)
    }

    /// Determinant
    pub fn det(&self) -> BemResult<f64> {
        Ok(self.factorize()?.det())
    }

    /// Inverse
    pub fn inverse(&self) -> BemResult<SymMatrix> {
        Ok(self.factorize()?.inverse())
    }

    /// Replace the matrix by its inverse
    ///
    /// The matrix is left untouched if it cannot be factorized.
    pub fn invert(&mut self) -> BemResult<()> {
        *self = self.factorize()?.inverse();
        Ok(())
    }

    /// Inverse of a positive definite matrix
    pub fn posdef_inverse(&self) -> BemResult<SymMatrix> {
        Ok(self.cholesky()?.inverse())
    }

    /// Log the dimensions and extreme entries of the matrix
    pub fn info(&self) {
        if self.size == 0 {
            log::info!("Matrix Empty");
            return;
        }
        let mut min = (self.get(0, 0), 0, 0);
        let mut max = min;
        for j in 0..self.size {
            for i in 0..=j {
                let v = self.get(i, j);
                if v < min.0 {
                    min = (v, i, j);
                }
                if v > max.0 {
                    max = (v, i, j);
                }
            }
        }
        log::info!("Dimensions : {} x {}", self.size, self.size);
        log::info!("Min Value : {} at ({}, {})", min.0, min.1, min.2);
        log::info!("Max Value : {} at ({}, {})", max.0, max.1, max.2);
    }

    fn check_size(&self, size: usize) -> BemResult<()> {
        if size == self.size {
            Ok(())
        } else {
            Err(BemError::DimensionMismatch {
                expected: self.size,
                actual: size,
            })
        }
    }

    fn check_range(&self, start: usize, size: usize) -> BemResult<()> {
        if start + size <= self.size {
            Ok(())
        } else {
            Err(BemError::DimensionMismatch {
                expected: self.size,
                actual: start + size,
            })
        }
    }
}

impl Default for SymMatrix {
    fn default() -> Self {
        Self::new(0)
    }
}

impl AssemblyTarget for SymMatrix {
    fn value(&self, i: usize, j: usize) -> f64 {
        self.get(i, j)
    }
    fn add_value(&mut self, i: usize, j: usize, value: f64) {
        *self.get_mut(i, j) += value;
    }
    fn dimensions(&self) -> [usize; 2] {
        [self.size, self.size]
    }
}

impl SymmetricTarget for SymMatrix {}

impl AddAssign<&SymMatrix> for SymMatrix {
    fn add_assign(&mut self, rhs: &SymMatrix) {
        assert_eq!(self.size, rhs.size, "Matrices have different sizes");
        for (a, b) in self.data.iter_mut().zip(&rhs.data) {
            *a += b;
        }
    }
}

impl SubAssign<&SymMatrix> for SymMatrix {
    fn sub_assign(&mut self, rhs: &SymMatrix) {
        assert_eq!(self.size, rhs.size, "Matrices have different sizes");
        for (a, b) in self.data.iter_mut().zip(&rhs.data) {
            *a -= b;
        }
    }
}

impl MulAssign<f64> for SymMatrix {
    fn mul_assign(&mut self, rhs: f64) {
        self.data.iter_mut().for_each(|a| *a *= rhs);
    }
}

impl DivAssign<f64> for SymMatrix {
    fn div_assign(&mut self, rhs: f64) {
        *self *= 1.0 / rhs;
    }
}

impl Add<&SymMatrix> for &SymMatrix {
    type Output = SymMatrix;
    fn add(self, rhs: &SymMatrix) -> SymMatrix {
        let mut result = self.clone();
        result += rhs;
        result
    }
}

impl Sub<&SymMatrix> for &SymMatrix {
    type Output = SymMatrix;
    fn sub(self, rhs: &SymMatrix) -> SymMatrix {
        let mut result = self.clone();
        result -= rhs;
        result
    }
}

impl Mul<f64> for &SymMatrix {
    type Output = SymMatrix;
    fn mul(self, rhs: f64) -> SymMatrix {
        let mut result = self.clone();
        result *= rhs;
        result
    }
}

impl Div<f64> for &SymMatrix {
    type Output = SymMatrix;
    fn div(self, rhs: f64) -> SymMatrix {
        self * (1.0 / rhs)
    }
}
