//! Definition of test shapes
use crate::geometry::{
    Boundary, Domain, Geometry, Interface, Mesh, MeshBuilder, OrientedMesh, Vect3,
};
use crate::types::BemResult;
use std::collections::HashMap;

/// Create a regular sphere
///
/// A regular sphere is created by starting with a regular octahedron. The shape is then refined
/// `refinement_level` times. Each time the mesh is refined, each triangle is split into four
/// triangles (by adding lines connecting the midpoints of each edge). The new points are then
/// projected on the sphere of the given radius and center. Normals point outwards.
pub fn regular_sphere(
    name: &str,
    refinement_level: u32,
    radius: f64,
    center: [f64; 3],
) -> BemResult<Mesh> {
    let npoints = 2 + usize::pow(4, refinement_level + 1);
    let ncells = 8 * usize::pow(4, refinement_level);
    let mut b = MeshBuilder::new_with_capacity(name, npoints, ncells);

    let mut points = Vec::<Vect3>::with_capacity(npoints);
    points.push(Vect3::new(0.0, 0.0, 1.0));
    points.push(Vect3::new(1.0, 0.0, 0.0));
    points.push(Vect3::new(0.0, 1.0, 0.0));
    points.push(Vect3::new(-1.0, 0.0, 0.0));
    points.push(Vect3::new(0.0, -1.0, 0.0));
    points.push(Vect3::new(0.0, 0.0, -1.0));

    let mut cells = vec![
        [0, 1, 2],
        [0, 2, 3],
        [0, 3, 4],
        [0, 4, 1],
        [5, 2, 1],
        [5, 3, 2],
        [5, 4, 3],
        [5, 1, 4],
    ];

    for _ in 0..refinement_level {
        let mut edge_points = HashMap::new();
        let mut new_cells = Vec::with_capacity(4 * cells.len());
        for c in &cells {
            let edges = [[1, 2], [0, 2], [0, 1]].map(|[i, j]| {
                let key = (usize::min(c[i], c[j]), usize::max(c[i], c[j]));
                *edge_points.entry(key).or_insert_with(|| {
                    let midpoint = ((points[c[i]] + points[c[j]]) * 0.5).normalized();
                    points.push(midpoint);
                    points.len() - 1
                })
            });
            new_cells.push([c[0], edges[2], edges[1]]);
            new_cells.push([c[1], edges[0], edges[2]]);
            new_cells.push([c[2], edges[1], edges[0]]);
            new_cells.push([edges[0], edges[1], edges[2]]);
        }
        cells = new_cells;
    }

    let center = Vect3(center);
    for (i, v) in points.iter().enumerate() {
        b.add_point(i, (*v * radius + center).0);
    }
    for c in cells {
        b.add_cell(c);
    }
    b.create_mesh()
}

/// Create a geometry of concentric spheres centred at the origin
///
/// `layers` lists, from the innermost sphere outwards, the radius of each sphere and the
/// conductivity of the shell it bounds from outside. Sphere `i` is mesh `i`, interface `i` and
/// the outer boundary of domain `layer{i}`. When `outside` is given, a domain named `outside` with
/// that conductivity surrounds the last sphere.
pub fn nested_spheres(
    refinement_level: u32,
    layers: &[(f64, f64)],
    outside: Option<f64>,
) -> BemResult<Geometry> {
    let mut meshes = Vec::with_capacity(layers.len());
    let mut interfaces = Vec::with_capacity(layers.len());
    let mut domains = Vec::with_capacity(layers.len() + 1);
    for (i, (radius, conductivity)) in layers.iter().enumerate() {
        let name = format!("sphere{i}");
        meshes.push(regular_sphere(&name, refinement_level, *radius, [0.0; 3])?);
        interfaces.push(Interface::new(&name, vec![OrientedMesh::new(i, 1)?]));
        let mut boundaries = vec![Boundary::new(i, true)];
        if i > 0 {
            boundaries.push(Boundary::new(i - 1, false));
        }
        domains.push(Domain::new(&format!("layer{i}"), *conductivity, boundaries));
    }
    if let Some(conductivity) = outside {
        if !layers.is_empty() {
            let last = layers.len() - 1;
            domains.push(Domain::new(
                "outside",
                conductivity,
                vec![Boundary::new(last, false)],
            ));
        }
    }
    Geometry::new(meshes, interfaces, domains)
}
