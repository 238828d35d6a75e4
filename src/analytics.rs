//! Closed-form integrals of the Laplace kernels over flat triangles
//!
//! The kernels are taken without the `1/(4 pi)` factor of the Green's function, which is applied
//! by the assemblers.
use crate::geometry::{Mesh, Vect3};

/// Distance below which a point is considered to lie in the plane of a triangle
const PLANE_EPS: f64 = 1e-10;
/// Distance below which a point is considered to lie on the line of an edge
const EDGE_EPS: f64 = 1e-14;

/// Signed solid angle subtended by a triangle at `x`
///
/// Positive when `x` sees the triangle from the side opposite to its normal, so that a closed
/// mesh with outward normals subtends `4 pi` at its interior points.
pub fn solid_angle(x: &Vect3, triangle: &[Vect3; 3]) -> f64 {
    let [a, b, c] = triangle.map(|p| p - *x);
    let (na, nb, nc) = (a.norm(), b.norm(), c.norm());
    let numerator = a.det(&b, &c);
    let denominator = na * nb * nc + a.dot(&b) * nc + a.dot(&c) * nb + b.dot(&c) * na;
    2.0 * numerator.atan2(denominator)
}

struct Edge {
    start: Vect3,
    end: Vect3,
    tangent: Vect3,
    outer_normal: Vect3,
}

/// Single layer potential of a triangle with unit density
///
/// Evaluates `S(x) = int_T 1 / |x - y| dy`.
pub struct AnalyticS {
    points: [Vect3; 3],
    normal: Vect3,
    edges: [Edge; 3],
}

impl AnalyticS {
    /// Create the integral for a triangle
    pub fn new(points: &[Vect3; 3]) -> Self {
        let normal = (points[1] - points[0])
            .cross(&(points[2] - points[0]))
            .normalized();
        let edges = [0, 1, 2].map(|i| {
            let start = points[i];
            let end = points[(i + 1) % 3];
            let tangent = (end - start).normalized();
            Edge {
                start,
                end,
                tangent,
                outer_normal: tangent.cross(&normal),
            }
        });
        Self {
            points: *points,
            normal,
            edges,
        }
    }

    /// Value of the potential at `x`
    pub fn value(&self, x: &Vect3) -> f64 {
        let d = (*x - self.points[0]).dot(&self.normal);
        let mut result = 0.0;
        for edge in &self.edges {
            let p0 = (edge.start - *x).dot(&edge.outer_normal);
            if p0.abs() < EDGE_EPS {
                continue;
            }
            let s_minus = (edge.start - *x).dot(&edge.tangent);
            let s_plus = (edge.end - *x).dot(&edge.tangent);
            let r_minus = (edge.start - *x).norm();
            let r_plus = (edge.end - *x).norm();
            let log = if s_plus + s_minus > 0.0 {
                ((r_plus + s_plus) / (r_minus + s_minus)).ln()
            } else {
                ((r_minus - s_minus) / (r_plus - s_plus)).ln()
            };
            result += p0 * log;
        }
        if d.abs() > PLANE_EPS {
            result += d * solid_angle(x, &self.points);
        }
        result
    }
}

/// Double layer potential of a triangle with linear density
///
/// Evaluates, for each corner `i`, `int_T phi_i(y) (x - y).n / |x - y|^3 dy`, the normal
/// derivative of `1 / |x - y|` at `y` weighted by the hat function `phi_i` of the corner. The
/// three values sum to minus the solid angle of the triangle seen from `x`.
pub struct AnalyticD3 {
    points: [Vect3; 3],
}

impl AnalyticD3 {
    /// Create the integral for a triangle
    pub fn new(points: &[Vect3; 3]) -> Self {
        Self { points: *points }
    }

    /// Values of the three moments at `x`
    pub fn value(&self, x: &Vect3) -> Vect3 {
        let y = self.points.map(|p| p - *x);
        let n = y.map(|v| v.norm());
        let det = y[0].det(&y[1], &y[2]);
        if det.abs() < PLANE_EPS {
            return Vect3::default();
        }

        let omega = 2.0
            * det.atan2(
                n[0] * n[1] * n[2]
                    + n[0] * y[1].dot(&y[2])
                    + n[1] * y[2].dot(&y[0])
                    + n[2] * y[0].dot(&y[1]),
            );
        let z = [y[1].cross(&y[2]), y[2].cross(&y[0]), y[0].cross(&y[1])];
        let dv = [y[1] - y[0], y[2] - y[1], y[0] - y[2]];
        let mut s = Vect3::default();
        for k in 0..3 {
            let length = dv[k].norm();
            let next = (k + 1) % 3;
            let g = -((n[k] * length + dv[k].dot(&y[k]))
                / (n[next] * length + dv[k].dot(&y[next])))
            .ln()
                / length;
            s += dv[k] * g;
        }
        let normal = z[0] + z[1] + z[2];
        let a = normal.norm2();
        -Vect3(
            [0, 1, 2].map(|k| (z[k].dot(&normal) * omega + det * dv[(k + 1) % 3].dot(&s)) / a),
        )
    }
}

/// Double layer density at `x` induced by the hat function of a mesh vertex
///
/// Sums, over the triangles `(V, A, B)` around the vertex, `(A - B) / (2 area)` times the single
/// layer potential of the triangle.
pub fn ferguson(x: &Vect3, mesh: &Mesh, vertex: usize) -> Vect3 {
    let mut result = Vect3::default();
    for triangle in mesh.vertex_triangles(vertex) {
        if let Some(edge) = triangle.opposite_edge(vertex) {
            let s = AnalyticS::new(triangle.points()).value(x);
            result += edge * (s / (2.0 * triangle.area()));
        }
    }
    result
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::shapes::regular_sphere;
    use crate::quadrature::Integrator;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn triangle() -> [Vect3; 3] {
        [
            Vect3::new(0.0, 0.0, 0.0),
            Vect3::new(1.0, 0.0, 0.0),
            Vect3::new(0.0, 1.0, 0.0),
        ]
    }

    fn barycentric(y: &Vect3) -> [f64; 3] {
        [1.0 - y[0] - y[1], y[0], y[1]]
    }

    #[test]
    fn test_s_value() {
        let s = AnalyticS::new(&triangle());
        assert_relative_eq!(
            s.value(&Vect3::new(0.3, 0.3, 1.0)),
            0.4753079871648684,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_d_value() {
        let d = AnalyticD3::new(&triangle());
        let value = d.value(&Vect3::new(0.3, 0.3, 1.0));
        assert_relative_eq!(value[0], 0.149486512561, max_relative = 1e-10);
        assert_relative_eq!(value[1], 0.141199725722, max_relative = 1e-10);
        assert_relative_eq!(value[2], 0.141199725722, max_relative = 1e-10);
    }

    #[test]
    fn test_d_in_plane() {
        let d = AnalyticD3::new(&triangle());
        assert_eq!(d.value(&Vect3::new(2.0, 3.0, 0.0)), Vect3::default());
    }

    #[test]
    fn test_s_on_vertex_is_finite() {
        let s = AnalyticS::new(&triangle());
        let value = s.value(&Vect3::new(0.0, 0.0, 0.0));
        assert!(value.is_finite());
        assert!(value > 0.0);
    }

    #[test]
    fn test_s_matches_refined_quadrature() {
        let t = triangle();
        let integrator = Integrator::new(3, 4, 0.0).unwrap();
        for x in [
            Vect3::new(0.2, 0.1, 0.3),
            Vect3::new(2.0, -1.0, 0.4),
            Vect3::new(0.3, 0.3, -0.5),
        ] {
            let s = AnalyticS::new(&t);
            let numeric = integrator.integrate(|y| 1.0 / (*y - x).norm(), &t);
            assert_relative_eq!(s.value(&x), numeric, max_relative = 1e-8);
        }
    }

    #[test]
    fn test_s_quadrature_convergence() {
        let t = triangle();
        let x = Vect3::new(0.3, 0.3, 1.0);
        let exact = AnalyticS::new(&t).value(&x);
        let errors = [0, 1, 3].map(|order| {
            let integrator = Integrator::new(order, 0, 0.0).unwrap();
            (integrator.integrate(|y| 1.0 / (*y - x).norm(), &t) - exact).abs()
        });
        assert!(errors[0] > errors[1]);
        assert!(errors[1] > errors[2]);
        assert!(errors[2] < 1e-6);
    }

    #[test]
    fn test_d_quadrature_convergence() {
        let t = triangle();
        let x = Vect3::new(0.3, 0.3, 1.0);
        let normal = Vect3::new(0.0, 0.0, 1.0);
        let exact = AnalyticD3::new(&t).value(&x);
        let errors = [0, 1, 2, 3].map(|order| {
            let integrator = Integrator::new(order, 0, 0.0).unwrap();
            let numeric = integrator.integrate(
                |y| {
                    let r = x - *y;
                    let kernel = r.dot(&normal) / r.norm().powi(3);
                    Vect3(barycentric(y)) * kernel
                },
                &t,
            );
            (numeric - exact).norm()
        });
        for k in 1..4 {
            assert!(errors[k] < errors[k - 1]);
        }
        assert!(errors[3] < 1e-5);
    }

    #[test]
    fn test_solid_angle() {
        let t = triangle();
        // Seen from far below, the triangle subtends a vanishing angle.
        assert!(solid_angle(&Vect3::new(0.2, 0.2, -1e6), &t).abs() < 1e-9);
        // Seen from just below its centroid it covers half the sphere.
        assert_relative_eq!(
            solid_angle(&Vect3::new(1.0 / 3.0, 1.0 / 3.0, -1e-9), &t),
            2.0 * PI,
            max_relative = 1e-6
        );
    }

    #[test]
    fn test_ferguson_sums_to_zero() {
        let sphere = regular_sphere("s", 1, 1.0, [0.0; 3]).unwrap();
        let x = Vect3::new(0.1, -0.2, 0.3);
        let mut total = Vect3::default();
        for v in 0..sphere.vertices().len() {
            total += ferguson(&x, &sphere, v);
        }
        assert!(total.norm() < 1e-12);
    }
}
