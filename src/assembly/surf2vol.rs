//! Potential at points inside the conductor
use crate::assembly::{locate_points, Assembler, K};
use crate::geometry::{Geometry, Vect3, Vertex};
use crate::matrix::{zeros, Matrix};
use crate::operators::PartialBlock;

impl Assembler {
    /// Assemble the matrix mapping the surface unknowns to the potential at internal points
    ///
    /// Points outside the conductor or in a non-conductive domain are dropped, so the matrix has
    /// one row per remaining point, in input order.
    pub fn surface_to_volume_matrix(&self, geo: &Geometry, points: &[Vect3]) -> Matrix {
        let mut domain_points = vec![Vec::new(); geo.domains().len()];
        let mut nrows = 0;
        for (point, domain) in points.iter().zip(locate_points(geo, points, "Surf2Vol")) {
            if let Some(domain) = domain {
                domain_points[domain].push(Vertex::new(*point, nrows));
                nrows += 1;
            }
        }

        let mut matrix = zeros(nrows, geo.system_size());
        for (domain, points) in geo.domains().iter().zip(&domain_points) {
            if points.is_empty() {
                continue;
            }
            for boundary in domain.boundaries() {
                for oriented_mesh in geo.interface(boundary.interface()).oriented_meshes() {
                    let mesh = geo.mesh(oriented_mesh.mesh());
                    let mut block = PartialBlock::new(mesh);
                    block.set_verbose(self.options.verbose());
                    let coeff = f64::from(boundary.mesh_orientation(oriented_mesh)) * K;
                    block.add_d(-coeff, points, &mut matrix);
                    if !mesh.current_barrier() {
                        block.s(coeff / domain.conductivity(), points, &mut matrix);
                    }
                }
            }
        }
        matrix
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::shapes::nested_spheres;
    use rlst::{RandomAccessByRef, Shape};

    #[test]
    fn test_dropped_points() {
        let geo = nested_spheres(1, &[(0.5, 1.0), (1.0, 0.5)], Some(0.0)).unwrap();
        let points = [
            Vect3::new(0.0, 0.0, 0.1),
            Vect3::new(0.0, 0.0, 3.0),
            Vect3::new(0.7, 0.0, 0.0),
        ];
        let m = Assembler::new().surface_to_volume_matrix(&geo, &points);
        assert_eq!(m.shape(), [2, geo.system_size()]);
    }

    #[test]
    fn test_constant_potential_is_reproduced() {
        // Constant vertex values with no current are seen unchanged at every internal point.
        let geo = nested_spheres(2, &[(0.5, 1.0), (1.0, 0.25)], None).unwrap();
        let points = [Vect3::new(0.1, -0.1, 0.2), Vect3::new(0.0, 0.75, 0.0)];
        let m = Assembler::new().surface_to_volume_matrix(&geo, &points);
        for row in 0..2 {
            let total: f64 = geo
                .vertices()
                .map(|v| *m.get([row, v.index()]).unwrap())
                .sum();
            assert!((total - 1.0).abs() < 1e-10);
        }
    }
}
