//! Error and result types

use crate::quadrature::types::QuadratureError;

/// Errors raised while building geometries or assembling and solving matrices
#[derive(thiserror::Error, Debug)]
pub enum BemError {
    /// A mesh, domain or point does not fit the geometry it is used with
    #[error("Geometry inconsistency: {0}")]
    GeometryInconsistency(String),
    /// A named domain is not part of the geometry
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),
    /// The pivoted symmetric factorization produced an exactly singular block of `D`
    #[error("Factorization failure: zero pivot at index {index}")]
    FactorizationFailure {
        /// Index of the failing pivot
        index: usize,
    },
    /// A Cholesky factorization met a non-positive pivot
    #[error("Matrix is not positive definite (leading minor {index})")]
    NotPositiveDefinite {
        /// Index of the failing leading minor
        index: usize,
    },
    /// Operands have incompatible shapes
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },
    /// A quadrature rule could not be provided
    #[error(transparent)]
    Quadrature(#[from] QuadratureError),
}

/// Result type
pub type BemResult<T> = std::result::Result<T, BemError>;
