//! Traits
use crate::geometry::Vect3;
use num::Zero;
use std::ops::{Add, AddAssign, Mul, Sub};

/// A matrix that block operators can add entries into
///
/// Operators never clear a target: they only read entries they wrote and add new values.
pub trait AssemblyTarget {
    /// Get the value of an entry
    fn value(&self, i: usize, j: usize) -> f64;

    /// Add a value to an entry
    fn add_value(&mut self, i: usize, j: usize, value: f64);

    /// Numbers of rows and columns
    fn dimensions(&self) -> [usize; 2];
}

/// An [AssemblyTarget] that stores a single value for the entries `(i, j)` and `(j, i)`
pub trait SymmetricTarget: AssemblyTarget {
    /// Number of rows (and columns)
    fn size(&self) -> usize {
        self.dimensions()[0]
    }
}

/// Values that can be integrated over triangles
pub trait Integrand:
    Copy
    + Send
    + Sync
    + Add<Output = Self>
    + AddAssign
    + Sub<Output = Self>
    + Mul<f64, Output = Self>
    + Zero
{
    /// Size of the value, used to control adaptive integration
    fn magnitude(&self) -> f64;
}

impl Integrand for f64 {
    fn magnitude(&self) -> f64 {
        self.abs()
    }
}

impl Integrand for Vect3 {
    fn magnitude(&self) -> f64 {
        self.norm()
    }
}
