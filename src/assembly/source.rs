//! Right hand sides of the head system
use crate::assembly::{locate_points, Assembler, K};
use crate::geometry::{Dipole, Domain, Geometry, Mesh, Vect3};
use crate::matrix::{zeros, Matrix, SymMatrix};
use crate::operators::kernels::{operator_dipole_pot, operator_dipole_pot_der};
use crate::operators::{collect_entries, DiagonalBlock, NonDiagonalBlock, SparseMatrixData};
use crate::types::{BemError, BemResult};
use rlst::{RandomAccessMut, Shape};

/// A current injection electrode
///
/// The electrode covers a set of triangles of the geometry, given as `(mesh, triangle)` pairs of
/// mesh indices and mesh-local triangle indices.
#[derive(Debug, Clone)]
pub struct Electrode {
    triangles: Vec<(usize, usize)>,
    radius: f64,
    weight: f64,
}

impl Electrode {
    /// Create an electrode
    ///
    /// With a zero radius the injected value is an intensity, spread over each triangle by its
    /// area. Otherwise it is a current density, scaled by `weight`.
    pub fn new(triangles: Vec<(usize, usize)>, radius: f64, weight: f64) -> Self {
        Self {
            triangles,
            radius,
            weight,
        }
    }
    /// Injection triangles
    pub fn triangles(&self) -> &[(usize, usize)] {
        &self.triangles
    }
    /// Radius
    pub fn radius(&self) -> f64 {
        self.radius
    }
    /// Weight
    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl Assembler {
    /// Assemble the source matrix of a distributed source mesh
    ///
    /// The source mesh must lie inside a single domain of the geometry. It is renumbered from zero
    /// and flagged as an outermost current barrier, and the matrix has one column per source
    /// vertex.
    pub fn surf_source_matrix(&self, geo: &Geometry, source_mesh: &mut Mesh) -> BemResult<Matrix> {
        let domain = geo.check(source_mesh)?;
        source_mesh.set_vertex_indices(0);
        source_mesh.set_triangle_indices(0);
        source_mesh.set_outermost(true);
        source_mesh.set_current_barrier(true);
        let source_mesh = &*source_mesh;

        log::info!(
            "Assembling SurfSourceMat with {} source vertices located in domain \"{}\"",
            source_mesh.vertices().len(),
            domain.name()
        );

        let mut matrix = zeros(geo.system_size(), source_mesh.vertices().len());
        if !domain.is_conductive() {
            log::warn!(
                "Source mesh \"{}\" lies in the non-conductive domain \"{}\"",
                source_mesh.name(),
                domain.name()
            );
            return Ok(matrix);
        }

        let l = -1.0 / domain.conductivity();
        let integrator = self.options.integrator();
        for boundary in domain.boundaries() {
            let factor = if boundary.inside() { K } else { -K };
            for oriented_mesh in geo.interface(boundary.interface()).oriented_meshes() {
                let mesh = geo.mesh(oriented_mesh.mesh());
                let mut block = NonDiagonalBlock::new(mesh, source_mesh, integrator);
                block.set_verbose(self.options.verbose());
                let coeff = factor * f64::from(oriented_mesh.orientation());
                block.set_n_block(coeff, &mut matrix);
                if !mesh.current_barrier() {
                    block.d(coeff * l, &mut matrix);
                }
            }
        }
        Ok(matrix)
    }

    /// Assemble the source matrix of a set of current dipoles
    ///
    /// Each dipole lies in `domain_name` when given, otherwise in the domain containing it.
    /// Dipoles in a non-conductive domain get a zero column.
    pub fn dipole_source_matrix(
        &self,
        geo: &Geometry,
        dipoles: &[Dipole],
        domain_name: Option<&str>,
    ) -> BemResult<Matrix> {
        let domains = dipoles
            .iter()
            .map(|d| dipole_domain(geo, d, domain_name))
            .collect::<BemResult<Vec<_>>>()?;

        let size = geo.system_size();
        let shape = [size, dipoles.len()];
        let integrator = self.options.integrator();
        let entries = collect_entries(dipoles.len(), shape, |column| {
            let (dipole, domain) = (&dipoles[column], domains[column]);
            let mut entries = SparseMatrixData::new(shape);
            if !domain.is_conductive() {
                log::warn!(
                    "Dipole at ({}, {}, {}) lies in the non-conductive domain \"{}\". Dipole is dropped.",
                    dipole.position()[0],
                    dipole.position()[1],
                    dipole.position()[2],
                    domain.name()
                );
                return entries;
            }
            let mut rhs = vec![0.0; size];
            for boundary in domain.boundaries() {
                let factor = if boundary.inside() { K } else { -K };
                for oriented_mesh in geo.interface(boundary.interface()).oriented_meshes() {
                    let mesh = geo.mesh(oriented_mesh.mesh());
                    let coeff = factor * f64::from(oriented_mesh.orientation());
                    operator_dipole_pot_der(dipole, mesh, coeff, integrator, &mut rhs);
                    if !mesh.current_barrier() {
                        let coeff = -coeff / domain.conductivity();
                        operator_dipole_pot(dipole, mesh, coeff, integrator, &mut rhs);
                    }
                }
            }
            for (row, value) in rhs.into_iter().enumerate() {
                if value != 0.0 {
                    entries.push(row, column, value);
                }
            }
            entries
        });

        let mut matrix = zeros(size, dipoles.len());
        entries.add_into(&mut matrix);
        Ok(matrix)
    }

    /// Assemble the source matrix of current injection electrodes
    ///
    /// Only the pairs involving a current barrier mesh, on which the electrodes lie, contribute.
    pub fn eit_source_matrix(&self, geo: &Geometry, electrodes: &[Electrode]) -> BemResult<Matrix> {
        for (mesh, triangle) in electrodes.iter().flat_map(|e| e.triangles()) {
            if *mesh >= geo.meshes().len() || *triangle >= geo.mesh(*mesh).triangles().len() {
                return Err(BemError::GeometryInconsistency(format!(
                    "electrode triangle {triangle} of mesh {mesh} is not in the geometry"
                )));
            }
        }

        let integrator = self.options.integrator();
        let mut transfer = SymMatrix::new(geo.nb_parameters());
        for pair in geo.communicating_mesh_pairs() {
            // The barrier mesh, on which the electrodes lie, gives the rows.
            let (m1, m2) = match (pair.first(), pair.second()) {
                (m1, m2) if geo.mesh(m1).current_barrier() => (m1, m2),
                (m1, m2) if geo.mesh(m2).current_barrier() => (m2, m1),
                _ => continue,
            };
            let (mesh1, mesh2) = (geo.mesh(m1), geo.mesh(m2));
            let orientation = f64::from(pair.relative_orientation());
            let mut block = NonDiagonalBlock::new(mesh1, mesh2, integrator);
            block.set_verbose(self.options.verbose());
            block.d(K * orientation, &mut transfer);
            if pair.is_diagonal() {
                let mut block = DiagonalBlock::new(mesh1, integrator);
                block.set_verbose(self.options.verbose());
                block.add_identity(-0.5 * orientation, &mut transfer);
            } else {
                block.s(-K * orientation * geo.sigma_inv(m1, m2), &mut transfer);
            }
        }

        let mut matrix = zeros(geo.system_size(), electrodes.len());
        let nrows = matrix.shape()[0];
        for (column, electrode) in electrodes.iter().enumerate() {
            for (mesh, triangle) in electrode.triangles() {
                let triangle = &geo.mesh(*mesh).triangles()[*triangle];
                let coeff = if electrode.radius().abs() < f64::EPSILON {
                    1.0 / triangle.area()
                } else {
                    electrode.weight()
                };
                for row in 0..nrows {
                    *matrix.get_mut([row, column]).unwrap() +=
                        transfer.get(triangle.index(), row) * coeff;
                }
            }
        }
        Ok(matrix)
    }

    /// Assemble the potential created by dipoles in an infinite medium at internal points
    ///
    /// Points outside the conductor or in a non-conductive domain are dropped. A dipole only
    /// contributes to the points of its own domain.
    pub fn dipole_to_internal_potential(
        &self,
        geo: &Geometry,
        dipoles: &[Dipole],
        points: &[Vect3],
        domain_name: Option<&str>,
    ) -> BemResult<Matrix> {
        let (kept, point_domains): (Vec<_>, Vec<_>) = points
            .iter()
            .zip(locate_points(geo, points, "DipSource2InternalPot"))
            .filter_map(|(p, d)| d.map(|d| (*p, d)))
            .unzip();

        let mut matrix = zeros(kept.len(), dipoles.len());
        for (column, dipole) in dipoles.iter().enumerate() {
            let domain = dipole_domain(geo, dipole, domain_name)?;
            if !domain.is_conductive() {
                continue;
            }
            let coeff = K / domain.conductivity();
            for (row, (point, point_domain)) in kept.iter().zip(&point_domains).enumerate() {
                if std::ptr::eq(&geo.domains()[*point_domain], domain) {
                    *matrix.get_mut([row, column]).unwrap() += coeff * dipole.potential(point);
                }
            }
        }
        Ok(matrix)
    }
}

fn dipole_domain<'a>(
    geo: &'a Geometry,
    dipole: &Dipole,
    domain_name: Option<&str>,
) -> BemResult<&'a Domain> {
    match domain_name {
        Some(name) => geo.domain(name),
        None => geo.domain_containing(dipole.position()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::shapes::{nested_spheres, regular_sphere};
    use crate::quadrature::Integrator;
    use approx::assert_relative_eq;
    use rlst::{RandomAccessByRef, RawAccess};

    #[test]
    fn test_dipole_source_matrix_shape() {
        let geo = nested_spheres(1, &[(0.5, 1.0), (1.0, 0.5)], None).unwrap();
        let dipoles = [
            Dipole::new(Vect3::new(0.0, 0.0, 0.1), Vect3::new(0.0, 0.0, 1.0)),
            Dipole::new(Vect3::new(0.0, 0.7, 0.0), Vect3::new(1.0, 0.0, 0.0)),
        ];
        let m = Assembler::new()
            .dipole_source_matrix(&geo, &dipoles, None)
            .unwrap();
        assert_eq!(m.shape(), [geo.system_size(), 2]);
        for column in 0..2 {
            assert!((0..geo.system_size()).any(|row| *m.get([row, column]).unwrap() != 0.0));
        }
        assert!(Assembler::new()
            .dipole_source_matrix(&geo, &dipoles, Some("missing"))
            .is_err());
    }

    #[test]
    fn test_dipole_in_non_conductive_domain() {
        let geo = nested_spheres(0, &[(0.5, 1.0), (1.0, 0.5)], Some(0.0)).unwrap();
        let dipoles = [Dipole::new(Vect3::new(0.0, 0.0, 2.0), Vect3::new(0.0, 0.0, 1.0))];
        let m = Assembler::new()
            .dipole_source_matrix(&geo, &dipoles, None)
            .unwrap();
        assert!(m.data().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_surf_source_matrix() {
        let geo = nested_spheres(1, &[(0.5, 1.0), (1.0, 0.5)], None).unwrap();
        let mut source = regular_sphere("source", 0, 0.1, [0.0, 0.0, 0.2]).unwrap();
        let m = Assembler::new()
            .surf_source_matrix(&geo, &mut source)
            .unwrap();
        assert_eq!(m.shape(), [geo.system_size(), 6]);
        assert!(source.outermost() && source.current_barrier());
        assert_eq!(source.first_vertex_index(), Some(0));
        assert!(m.data().iter().any(|v| *v != 0.0));

        let mut crossing = regular_sphere("crossing", 0, 0.3, [0.0, 0.0, 0.4]).unwrap();
        assert!(matches!(
            Assembler::new().surf_source_matrix(&geo, &mut crossing),
            Err(BemError::GeometryInconsistency(_))
        ));
    }

    #[test]
    fn test_eit_source_matrix() {
        let geo = nested_spheres(1, &[(0.8, 1.0), (1.0, 0.5)], Some(0.0)).unwrap();
        let intensity = Electrode::new(vec![(1, 0)], 0.0, 1.0);
        let density = Electrode::new(vec![(1, 0), (1, 1)], 0.01, 2.0);
        let m = Assembler::new()
            .eit_source_matrix(&geo, &[intensity, density])
            .unwrap();
        assert_eq!(m.shape(), [geo.system_size(), 2]);

        let outside = Electrode::new(vec![(1, 1000)], 0.0, 1.0);
        assert!(Assembler::new().eit_source_matrix(&geo, &[outside]).is_err());
    }

    #[test]
    fn test_eit_inner_rows() {
        // The barrier reaches the inner mesh through its double and single layers.
        let geo = nested_spheres(1, &[(0.8, 1.0), (1.0, 0.5)], Some(0.0)).unwrap();
        let (inner, outer) = (geo.mesh(0), geo.mesh(1));
        let electrode = &outer.triangles()[0];
        let m = Assembler::new()
            .eit_source_matrix(&geo, &[Electrode::new(vec![(1, 0)], 0.0, 1.0)])
            .unwrap();

        let integrator = Integrator::default();
        let mut expected = SymMatrix::new(geo.nb_parameters());
        let block = NonDiagonalBlock::new(outer, inner, &integrator);
        block.d(-K, &mut expected);
        block.s(K * geo.sigma_inv(0, 1), &mut expected);

        let coeff = 1.0 / electrode.area();
        for v in inner.vertices() {
            let value = *m.get([v.index(), 0]).unwrap();
            assert!(value != 0.0);
            assert_relative_eq!(
                value,
                expected.get(electrode.index(), v.index()) * coeff,
                max_relative = 1e-12,
                epsilon = 1e-14
            );
        }
        for t in inner.triangles() {
            assert_relative_eq!(
                *m.get([t.index(), 0]).unwrap(),
                expected.get(electrode.index(), t.index()) * coeff,
                max_relative = 1e-12,
                epsilon = 1e-14
            );
        }
    }

    #[test]
    fn test_dipole_to_internal_potential() {
        let geo = nested_spheres(1, &[(0.5, 2.0), (1.0, 0.5)], Some(0.0)).unwrap();
        let dipole = Dipole::new(Vect3::new(0.0, 0.0, 0.1), Vect3::new(0.0, 0.0, 1.0));
        let points = [
            Vect3::new(0.0, 0.0, 0.3),
            Vect3::new(0.0, 0.0, 5.0),
            Vect3::new(0.0, 0.8, 0.0),
        ];
        let m = Assembler::new()
            .dipole_to_internal_potential(&geo, &[dipole], &points, None)
            .unwrap();
        assert_eq!(m.shape(), [2, 1]);
        assert_relative_eq!(
            *m.get([0, 0]).unwrap(),
            K / 2.0 * dipole.potential(&points[0]),
            max_relative = 1e-12
        );
        // The second kept point lies in another domain.
        assert_eq!(*m.get([1, 0]).unwrap(), 0.0);
    }
}
