use approx::assert_relative_eq;
use headbem::assembly::{deflate, Assembler};
use headbem::geometry::shapes::nested_spheres;
use headbem::geometry::Geometry;
use headbem::quadrature::Integrator;

extern crate blas_src;
extern crate lapack_src;

fn assembler() -> Assembler {
    let mut assembler = Assembler::new();
    assembler.integrator(Integrator::new(1, 0, 0.0).unwrap());
    assembler
}

fn vertex_indices(geo: &Geometry, mesh: usize) -> Vec<usize> {
    geo.mesh(mesh).vertices().iter().map(|v| v.index()).collect()
}

fn triangle_indices(geo: &Geometry, mesh: usize) -> Vec<usize> {
    geo.mesh(mesh).triangles().iter().map(|t| t.index()).collect()
}

#[test]
fn test_single_sphere() {
    let geo = nested_spheres(1, &[(1.0, 1.0)], None).unwrap();
    let h = assembler().head_matrix(&geo).unwrap();
    assert_eq!(h.size(), 18 + 32);
    for t in triangle_indices(&geo, 0) {
        assert!(h.get(t, t) > 0.0);
    }
    assert!(h.data().iter().all(|v| v.is_finite()));
}

#[test]
fn test_deflation_is_not_idempotent() {
    let geo = nested_spheres(1, &[(0.5, 1.0), (1.0, 0.5)], None).unwrap();
    let once = assembler().head_matrix(&geo).unwrap();
    let mut twice = once.clone();
    deflate(&mut twice, &geo);

    let outer = vertex_indices(&geo, 1);
    let first = outer[0];
    let coeff = once.get(first, first) / outer.len() as f64;
    for i in &outer {
        for j in &outer {
            assert_relative_eq!(
                twice.get(*i, *j) - once.get(*i, *j),
                coeff,
                max_relative = 1e-10
            );
        }
    }
    let inner = vertex_indices(&geo, 0);
    for i in inner.iter().chain(&triangle_indices(&geo, 0)) {
        for j in 0..geo.system_size() {
            assert_eq!(twice.get(*i, j), once.get(*i, j));
        }
    }
}

#[test]
fn test_deflation_makes_system_invertible() {
    let geo = nested_spheres(1, &[(0.5, 1.0), (1.0, 0.5)], None).unwrap();
    let h = assembler().head_matrix(&geo).unwrap();
    let x = (0..h.size()).map(|i| (i as f64 * 0.37).sin()).collect::<Vec<_>>();
    let b = h.mul_vec(&x).unwrap();
    let solution = h.solve(&b).unwrap();
    for (s, e) in solution.iter().zip(&x) {
        assert_relative_eq!(s, e, epsilon = 1e-6);
    }
}

#[test]
fn test_non_communicating_meshes() {
    let geo = nested_spheres(0, &[(0.5, 1.0), (0.8, 0.0125), (1.0, 1.0)], None).unwrap();
    let h = assembler().head_matrix(&geo).unwrap();

    let mut rows = vertex_indices(&geo, 0);
    rows.extend(triangle_indices(&geo, 0));
    let mut cols = vertex_indices(&geo, 2);
    cols.extend(triangle_indices(&geo, 2));
    for i in &rows {
        for j in &cols {
            assert_eq!(h.get(*i, *j), 0.0);
        }
    }

    let coupled = rows
        .iter()
        .flat_map(|i| {
            vertex_indices(&geo, 1)
                .into_iter()
                .map(move |j| (*i, j))
        })
        .any(|(i, j)| h.get(i, j) != 0.0);
    assert!(coupled);
}

#[test]
fn test_current_barrier_unknowns() {
    let geo = nested_spheres(1, &[(0.5, 1.0), (1.0, 0.5)], Some(0.0)).unwrap();
    let h = assembler().head_matrix(&geo).unwrap();
    assert_eq!(h.size(), 2 * 18 + 32);
    assert!(geo.mesh(1).first_triangle_index().unwrap() >= h.size());
}

#[test]
fn test_two_nested_spheres() {
    let geo = nested_spheres(1, &[(0.5, 0.33), (1.0, 1.0)], None).unwrap();
    let pairs = geo
        .communicating_mesh_pairs()
        .iter()
        .map(|p| (p.first(), p.second()))
        .collect::<Vec<_>>();
    assert_eq!(pairs, vec![(0, 0), (0, 1), (1, 1)]);

    let h = assembler().head_matrix(&geo).unwrap();
    assert_eq!(h.size(), 2 * (18 + 32));
    let (t0, t1) = (triangle_indices(&geo, 0), triangle_indices(&geo, 1));
    let (v0, v1) = (vertex_indices(&geo, 0), vertex_indices(&geo, 1));
    // Cross single layer and double layer blocks.
    assert!(t0.iter().all(|i| t1.iter().all(|j| h.get(*i, *j) != 0.0)));
    assert!(t0.iter().any(|i| v1.iter().any(|j| h.get(*i, *j) != 0.0)));
    assert!(t1.iter().any(|i| v0.iter().any(|j| h.get(*i, *j) != 0.0)));
    // Only the outer vertices are deflated: the inner vertex block keeps its null space.
    for i in &v0 {
        let sum: f64 = v0.iter().map(|j| h.get(*i, *j)).sum();
        assert!(sum.abs() < 1e-10);
    }
}
