//! Factorizations of symmetric matrices in packed storage
//!
//! Both factorizations work on the upper packed layout of [SymMatrix], which is the `'U'` packed
//! format of LAPACK.
use crate::matrix::{Matrix, SymMatrix};
use crate::types::{BemError, BemResult};
use lapack::{dpptrf, dpptri, dpptrs, dsptrf, dsptri, dsptrs};
use rlst::{RawAccessMut, Shape};

fn check_info(routine: &str, info: i32) {
    assert!(info >= 0, "Illegal argument {} in call to {routine}", -info);
}

/// Symmetric indefinite factorization `A = U D U^T` with Bunch-Kaufman pivoting
///
/// `D` is block diagonal with 1x1 and 2x2 blocks. The factors overwrite the packed data of the
/// matrix, and `ipiv` holds the pivots as returned by `dsptrf`: a 2x2 block covering rows `k` and
/// `k + 1` has negative entries at both positions.
#[derive(Debug, Clone)]
pub struct BunchKaufman {
    factors: SymMatrix,
    ipiv: Vec<i32>,
}

impl BunchKaufman {
    /// Factorize a matrix
    pub fn new(mut a: SymMatrix) -> BemResult<Self> {
        let n = a.size();
        let mut ipiv = vec![0; n];
        let mut info = 0;
        unsafe {
            dsptrf(b'U', n as i32, a.data_mut(), &mut ipiv, &mut info);
        }
        check_info("dsptrf", info);
        if info > 0 {
            return Err(BemError::FactorizationFailure {
                index: info as usize - 1,
            });
        }
        Ok(Self { factors: a, ipiv })
    }

    /// Size of the factorized matrix
    pub fn size(&self) -> usize {
        self.factors.size()
    }

    /// Number of 2x2 blocks of `D`
    pub fn nb_two_by_two_blocks(&self) -> usize {
        self.ipiv.iter().filter(|p| **p < 0).count() / 2
    }

    /// Solve `A X = B` in place, `b` holding the `nrhs` columns of `B` one after the other
    fn solve_columns(&self, b: &mut [f64], nrhs: usize) {
        let n = self.size();
        if n == 0 || nrhs == 0 {
            return;
        }
        let mut info = 0;
        unsafe {
            dsptrs(
                b'U',
                n as i32,
                nrhs as i32,
                self.factors.data(),
                &self.ipiv,
                b,
                n as i32,
                &mut info,
            );
        }
        check_info("dsptrs", info);
    }

    /// Solve `A x = b` in place
    pub fn solve_in_place(&self, x: &mut [f64]) {
        assert_eq!(x.len(), self.size(), "Right hand side has wrong length");
        self.solve_columns(x, 1);
    }

    /// Solve `A x = b`
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let mut x = b.to_vec();
        self.solve_in_place(&mut x);
        x
    }

    /// Solve `A X = B` in place for every column of `B`
    pub fn solve_matrix_in_place(&self, b: &mut Matrix) {
        let [rows, cols] = b.shape();
        assert_eq!(rows, self.size(), "Right hand side has wrong number of rows");
        self.solve_columns(b.data_mut(), cols);
    }

    /// Determinant, as the product of the determinants of the blocks of `D`
    pub fn det(&self) -> f64 {
        let d = &self.factors;
        let mut det = 1.0;
        let mut k = 0;
        while k < self.size() {
            if self.ipiv[k] > 0 {
                det *= d.get(k, k);
                k += 1;
            } else {
                det *= d.get(k, k) * d.get(k + 1, k + 1) - d.get(k, k + 1).powi(2);
                k += 2;
            }
        }
        det
    }

    /// Inverse of the factorized matrix
    pub fn inverse(&self) -> SymMatrix {
        let n = self.size();
        let mut result = self.factors.clone();
        if n == 0 {
            return result;
        }
        let mut work = vec![0.0; n];
        let mut info = 0;
        unsafe {
            dsptri(
                b'U',
                n as i32,
                result.data_mut(),
                &self.ipiv,
                &mut work,
                &mut info,
            );
        }
        check_info("dsptri", info);
        result
    }
}

/// Cholesky factorization `A = U^T U` of a positive definite matrix
#[derive(Debug, Clone)]
pub struct Cholesky {
    factors: SymMatrix,
}

impl Cholesky {
    /// Factorize a matrix
    pub fn new(mut a: SymMatrix) -> BemResult<Self> {
        let n = a.size();
        let mut info = 0;
        unsafe {
            dpptrf(b'U', n as i32, a.data_mut(), &mut info);
        }
        check_info("dpptrf", info);
        if info > 0 {
            return Err(BemError::NotPositiveDefinite {
                index: info as usize - 1,
            });
        }
        Ok(Self { factors: a })
    }

    /// Size of the factorized matrix
    pub fn size(&self) -> usize {
        self.factors.size()
    }

    /// Solve `A x = b` in place
    pub fn solve_in_place(&self, x: &mut [f64]) {
        let n = self.size();
        assert_eq!(x.len(), n, "Right hand side has wrong length");
        if n == 0 {
            return;
        }
        let mut info = 0;
        unsafe {
            dpptrs(
                b'U',
                n as i32,
                1,
                self.factors.data(),
                x,
                n as i32,
                &mut info,
            );
        }
        check_info("dpptrs", info);
    }

    /// Solve `A x = b`
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let mut x = b.to_vec();
        self.solve_in_place(&mut x);
        x
    }

    /// Determinant
    pub fn det(&self) -> f64 {
        (0..self.size())
            .map(|i| self.factors.get(i, i).powi(2))
            .product()
    }

    /// Inverse of the factorized matrix
    pub fn inverse(&self) -> SymMatrix {
        let n = self.size();
        let mut result = self.factors.clone();
        if n == 0 {
            return result;
        }
        let mut info = 0;
        unsafe {
            dpptri(b'U', n as i32, result.data_mut(), &mut info);
        }
        check_info("dpptri", info);
        result
    }
}
