//! Element-level integrals shared by the block operators
use crate::analytics::{ferguson, AnalyticD3, AnalyticS};
use crate::geometry::{Dipole, Mesh, Triangle, Vect3};
use crate::operators::common::{collect_entries, SparseMatrixData};
use crate::quadrature::Integrator;
use crate::traits::AssemblyTarget;

/// Single layer interaction of two triangles with P0 densities
pub fn single_layer(triangle1: &Triangle, triangle2: &Triangle, integrator: &Integrator) -> f64 {
    let analytic = AnalyticS::new(triangle1.points());
    integrator.integrate(|x| analytic.value(x), triangle2.points())
}

/// Double layer interaction of a P0 test triangle with the three P1 functions of a source triangle
pub fn double_layer(test: &Triangle, source: &Triangle, integrator: &Integrator) -> Vect3 {
    let analytic = AnalyticD3::new(source.points());
    integrator.integrate(|x| analytic.value(x), test.points())
}

/// Hypersingular interaction of two P1 functions, derived from the single layer block `s`
///
/// `s` must hold the single layer interactions of the triangles of `mesh1` with those of
/// `mesh2`, indexed by global triangle indices.
pub fn hypersingular<T: AssemblyTarget + ?Sized>(
    factor: f64,
    mesh1: &Mesh,
    vertex1: usize,
    mesh2: &Mesh,
    vertex2: usize,
    s: &T,
) -> f64 {
    let mut result = 0.0;
    for triangle1 in mesh1.vertex_triangles(vertex1) {
        let Some(edge1) = triangle1.opposite_edge(vertex1) else {
            continue;
        };
        for triangle2 in mesh2.vertex_triangles(vertex2) {
            let Some(edge2) = triangle2.opposite_edge(vertex2) else {
                continue;
            };
            result -= factor * edge1.dot(&edge2) * s.value(triangle1.index(), triangle2.index())
                / (triangle1.area() * triangle2.area());
        }
    }
    result
}

/// Double layer entries of the test triangles of `test` against the vertices of `source`
pub(crate) fn double_layer_entries(
    test: &Mesh,
    source: &Mesh,
    coeff: f64,
    integrator: &Integrator,
    shape: [usize; 2],
) -> SparseMatrixData {
    collect_entries(test.triangles().len(), shape, |i| {
        let triangle1 = &test.triangles()[i];
        let mut entries = SparseMatrixData::new_known_size(shape, 3 * source.triangles().len());
        for triangle2 in source.triangles() {
            let total = double_layer(triangle1, triangle2, integrator);
            for (k, v) in triangle2.vertices().iter().enumerate() {
                entries.push(
                    triangle1.index(),
                    source.vertices()[*v].index(),
                    total[k] * coeff,
                );
            }
        }
        entries
    })
}

/// Add `coeff` times the normal derivative of the potential of a dipole, tested with the P1
/// functions of a mesh, into `rhs` at the vertex indices
pub fn operator_dipole_pot_der(
    dipole: &Dipole,
    mesh: &Mesh,
    coeff: f64,
    integrator: &Integrator,
    rhs: &mut [f64],
) {
    for triangle in mesh.triangles() {
        let normal = *triangle.normal();
        let total = integrator.integrate(
            |x| triangle.barycentric(x) * normal.dot(&dipole.potential_gradient(x)),
            triangle.points(),
        );
        for (k, v) in triangle.vertices().iter().enumerate() {
            rhs[mesh.vertices()[*v].index()] += total[k] * coeff;
        }
    }
}

/// Add `coeff` times the potential of a dipole, tested with the P0 functions of a mesh, into
/// `rhs` at the triangle indices
pub fn operator_dipole_pot(
    dipole: &Dipole,
    mesh: &Mesh,
    coeff: f64,
    integrator: &Integrator,
    rhs: &mut [f64],
) {
    for triangle in mesh.triangles() {
        let total = integrator.integrate(|x| dipole.potential(x), triangle.points());
        rhs[triangle.index()] += total * coeff;
    }
}

/// Add `coeff` times the Ferguson vectors at `x` into rows `row..row + 3`, at the vertex columns
pub fn operator_ferguson<T: AssemblyTarget + ?Sized>(
    x: &Vect3,
    mesh: &Mesh,
    coeff: f64,
    row: usize,
    matrix: &mut T,
) {
    for (local, vertex) in mesh.vertices().iter().enumerate() {
        let value = ferguson(x, mesh, local);
        for k in 0..3 {
            matrix.add_value(row + k, vertex.index(), value[k] * coeff);
        }
    }
}
