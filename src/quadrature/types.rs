//! Type definitions.

/// Quadrature error
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuadratureError {
    /// Rule not found
    #[error("No triangle quadrature rule with {0} points")]
    RuleNotFound(usize),
    /// Integration order out of range
    #[error("Invalid integration order {0}")]
    InvalidOrder(usize),
}

/// Definition of a numerical quadrature rule.
#[derive(Debug, Clone)]
pub struct NumericalQuadratureDefinition {
    /// The dimension d of a single point.
    pub dim: usize,

    /// The order of the quadrature rule.
    pub order: usize,

    /// The number of points of the quadrature rule.
    pub npoints: usize,

    /// The weights of the quadrature rule.
    pub weights: Vec<f64>,
    /// The point coordinates of the quadrature rule.
    ///
    /// A single point has the coordinates p_1, p_2, ..., p_d,
    /// with d being the dimension of the point.
    /// The vector points stores all points in consecutive order.
    /// Hence, the first point starts at position zero, the second point at
    /// position d, and the third point at position 2d.
    pub points: Vec<f64>,
}
