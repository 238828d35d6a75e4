//! Headbem
//!
//! Dense assembly of the symmetric boundary element system for the quasi-static forward problem
//! on nested, piecewise-homogeneous conductors.
#![cfg_attr(feature = "strict", deny(warnings))]
#![warn(missing_docs)]

#[macro_use]
extern crate lazy_static;

pub mod analytics;
pub mod assembly;
pub mod geometry;
pub mod matrix;
pub mod operators;
pub mod quadrature;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test {
    extern crate blas_src;
    extern crate lapack_src;
}
