//! Integration over flat triangles
use crate::geometry::Vect3;
use crate::quadrature::simplex_rules::triangle_rule;
use crate::quadrature::types::{NumericalQuadratureDefinition, QuadratureError};
use crate::traits::Integrand;

/// Number of points of the rule used for each integration order
pub const RULE_SIZES: [usize; 4] = [3, 6, 7, 16];

/// Gauss integrator with optional adaptive refinement
///
/// With `levels > 0`, a triangle is split into four and the integral recomputed on the parts
/// until the relative change falls below the tolerance or `levels` subdivisions were made.
#[derive(Debug, Clone)]
pub struct Integrator {
    order: usize,
    levels: u32,
    tolerance: f64,
    rule: NumericalQuadratureDefinition,
}

impl Integrator {
    /// Create an integrator
    ///
    /// `order` selects a rule in [RULE_SIZES].
    pub fn new(order: usize, levels: u32, tolerance: f64) -> Result<Self, QuadratureError> {
        let npoints = *RULE_SIZES
            .get(order)
            .ok_or(QuadratureError::InvalidOrder(order))?;
        Ok(Self {
            order,
            levels,
            tolerance,
            rule: triangle_rule(npoints)?,
        })
    }

    /// Integration order
    pub fn order(&self) -> usize {
        self.order
    }
    /// Maximum number of adaptive subdivisions
    pub fn levels(&self) -> u32 {
        self.levels
    }
    /// Relative tolerance of adaptive integration
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Integrate a function over a triangle
    pub fn integrate<R: Integrand, F: Fn(&Vect3) -> R>(&self, f: F, triangle: &[Vect3; 3]) -> R {
        let coarse = self.integrate_rule(&f, triangle);
        if self.levels == 0 {
            coarse
        } else {
            self.refine(&f, triangle, coarse, 0)
        }
    }

    fn integrate_rule<R: Integrand, F: Fn(&Vect3) -> R>(&self, f: &F, triangle: &[Vect3; 3]) -> R {
        let [p0, p1, p2] = *triangle;
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let jacobian = e1.cross(&e2).norm();
        let mut sum = R::zero();
        for (i, w) in self.rule.weights.iter().enumerate() {
            let x = p0 + e1 * self.rule.points[2 * i] + e2 * self.rule.points[2 * i + 1];
            sum += f(&x) * *w;
        }
        sum * jacobian
    }

    fn refine<R: Integrand, F: Fn(&Vect3) -> R>(
        &self,
        f: &F,
        triangle: &[Vect3; 3],
        coarse: R,
        depth: u32,
    ) -> R {
        let children = subdivide(triangle);
        let parts = children.map(|c| self.integrate_rule(f, &c));
        let fine = parts.iter().fold(R::zero(), |a, b| a + *b);
        if depth + 1 < self.levels
            && (fine - coarse).magnitude() > self.tolerance * fine.magnitude()
        {
            children
                .iter()
                .zip(parts)
                .fold(R::zero(), |a, (c, p)| a + self.refine(f, c, p, depth + 1))
        } else {
            fine
        }
    }
}

impl Default for Integrator {
    fn default() -> Self {
        // Order 3 always has a rule
        Self::new(3, 0, 0.005).unwrap()
    }
}

/// Split a triangle into four through the midpoints of its edges
fn subdivide(triangle: &[Vect3; 3]) -> [[Vect3; 3]; 4] {
    let [a, b, c] = *triangle;
    let ab = (a + b) * 0.5;
    let bc = (b + c) * 0.5;
    let ca = (c + a) * 0.5;
    [[a, ab, ca], [ab, b, bc], [ca, bc, c], [ab, bc, ca]]
}
