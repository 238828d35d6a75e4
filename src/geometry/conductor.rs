//! Nested piecewise-homogeneous conductors
use crate::geometry::{Domain, Interface, Mesh, Vect3, Vertex};
use crate::types::{BemError, BemResult};
use itertools::Itertools;
use std::f64::consts::PI;

/// Two meshes bounding a common conductive domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshPair {
    meshes: (usize, usize),
    orientation: i32,
}

impl MeshPair {
    /// First mesh of the pair
    pub fn first(&self) -> usize {
        self.meshes.0
    }
    /// Second mesh of the pair
    pub fn second(&self) -> usize {
        self.meshes.1
    }
    /// Product of the orientations of the two meshes with respect to their common domain
    pub fn relative_orientation(&self) -> i32 {
        self.orientation
    }
    /// Whether both meshes are the same
    pub fn is_diagonal(&self) -> bool {
        self.meshes.0 == self.meshes.1
    }
}

/// A conductor made of meshes, interfaces and domains
///
/// Building a geometry flags the meshes and numbers every unknown: all vertices come first, then
/// the triangles of meshes that carry currents, then the triangles of current barriers.
#[derive(Debug)]
pub struct Geometry {
    meshes: Vec<Mesh>,
    interfaces: Vec<Interface>,
    domains: Vec<Domain>,
    pairs: Vec<MeshPair>,
    parts: Vec<Vec<usize>>,
    nb_parameters: usize,
    nb_barrier_triangles: usize,
}

impl Geometry {
    /// Create a geometry
    pub fn new(meshes: Vec<Mesh>, interfaces: Vec<Interface>, domains: Vec<Domain>) -> BemResult<Self> {
        for interface in &interfaces {
            if interface.oriented_meshes().is_empty() {
                return Err(BemError::GeometryInconsistency(format!(
                    "interface \"{}\" has no mesh",
                    interface.name()
                )));
            }
            if let Some(om) = interface
                .oriented_meshes()
                .iter()
                .find(|om| om.mesh() >= meshes.len())
            {
                return Err(BemError::GeometryInconsistency(format!(
                    "interface \"{}\" refers to unknown mesh {}",
                    interface.name(),
                    om.mesh()
                )));
            }
        }
        for domain in &domains {
            if let Some(b) = domain
                .boundaries()
                .iter()
                .find(|b| b.interface() >= interfaces.len())
            {
                return Err(BemError::GeometryInconsistency(format!(
                    "domain \"{}\" refers to unknown interface {}",
                    domain.name(),
                    b.interface()
                )));
            }
        }
        if let Some(name) = domains.iter().map(|d| d.name()).duplicates().next() {
            return Err(BemError::GeometryInconsistency(format!(
                "domain \"{name}\" is defined twice"
            )));
        }

        let mut geometry = Self {
            meshes,
            interfaces,
            domains,
            pairs: vec![],
            parts: vec![],
            nb_parameters: 0,
            nb_barrier_triangles: 0,
        };
        geometry.mark_meshes();
        geometry.generate_indices();
        geometry.pairs = geometry.communicating_pairs();
        geometry.parts = geometry.partition();

        log::debug!(
            "Geometry with {} meshes, {} domains, {} unknowns",
            geometry.meshes.len(),
            geometry.domains.len(),
            geometry.system_size()
        );
        Ok(geometry)
    }

    fn mark_meshes(&mut self) {
        for (index, mesh) in self.meshes.iter_mut().enumerate() {
            let bounding = self
                .domains
                .iter()
                .filter(|d| d.mesh_orientation(&self.interfaces, index).is_some())
                .collect::<Vec<_>>();
            let barrier = bounding.iter().any(|d| !d.is_conductive());
            let enclosed = bounding
                .iter()
                .any(|d| d.is_outside_of(&self.interfaces, index));
            mesh.set_current_barrier(barrier);
            mesh.set_outermost(barrier || !enclosed);
        }
    }

    fn generate_indices(&mut self) {
        let mut index = 0;
        for mesh in self.meshes.iter_mut() {
            mesh.set_vertex_indices(index);
            index += mesh.vertices().len();
        }
        for mesh in self.meshes.iter_mut().filter(|m| !m.current_barrier()) {
            mesh.set_triangle_indices(index);
            index += mesh.triangles().len();
        }
        self.nb_barrier_triangles = 0;
        for mesh in self.meshes.iter_mut().filter(|m| m.current_barrier()) {
            mesh.set_triangle_indices(index);
            index += mesh.triangles().len();
            self.nb_barrier_triangles += mesh.triangles().len();
        }
        self.nb_parameters = index;
    }

    fn communicating_pairs(&self) -> Vec<MeshPair> {
        let mut pairs = vec![];
        for m1 in 0..self.meshes.len() {
            for m2 in m1..self.meshes.len() {
                let common = self.domains.iter().filter(|d| d.is_conductive()).find_map(|d| {
                    let o1 = d.mesh_orientation(&self.interfaces, m1)?;
                    let o2 = d.mesh_orientation(&self.interfaces, m2)?;
                    Some(o1 * o2)
                });
                if let Some(orientation) = common {
                    pairs.push(MeshPair {
                        meshes: (m1, m2),
                        orientation,
                    });
                }
            }
        }
        pairs
    }

    fn partition(&self) -> Vec<Vec<usize>> {
        let n = self.meshes.len();
        let mut parent = (0..n).collect::<Vec<_>>();
        fn root(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        let mut in_conductor = vec![false; n];
        for domain in self.domains.iter().filter(|d| d.is_conductive()) {
            let bounding = (0..n)
                .filter(|m| domain.mesh_orientation(&self.interfaces, *m).is_some())
                .collect::<Vec<_>>();
            for m in &bounding {
                in_conductor[*m] = true;
            }
            for (a, b) in bounding.iter().tuple_windows() {
                let (ra, rb) = (root(&mut parent, *a), root(&mut parent, *b));
                parent[ra] = rb;
            }
        }

        let mut parts: Vec<Vec<usize>> = vec![];
        let mut part_of_root = vec![None::<usize>; n];
        for m in (0..n).filter(|m| in_conductor[*m]) {
            let r = root(&mut parent, m);
            match part_of_root[r] {
                Some(p) => parts[p].push(m),
                None => {
                    part_of_root[r] = Some(parts.len());
                    parts.push(vec![m]);
                }
            }
        }
        parts
    }

    /// Meshes of the geometry
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }
    /// A mesh of the geometry
    pub fn mesh(&self, index: usize) -> &Mesh {
        &self.meshes[index]
    }
    /// Index of the mesh with the given name
    pub fn mesh_index(&self, name: &str) -> Option<usize> {
        self.meshes.iter().position(|m| m.name() == name)
    }
    /// Interfaces of the geometry
    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }
    /// An interface of the geometry
    pub fn interface(&self, index: usize) -> &Interface {
        &self.interfaces[index]
    }
    /// Domains of the geometry
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }
    /// All vertices of the geometry
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> + '_ {
        self.meshes.iter().flat_map(|m| m.vertices().iter())
    }
    /// Number of vertices
    pub fn nb_vertices(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices().len()).sum()
    }
    /// Number of triangles
    pub fn nb_triangles(&self) -> usize {
        self.meshes.iter().map(|m| m.triangles().len()).sum()
    }
    /// Number of triangles belonging to current barriers
    pub fn nb_current_barrier_triangles(&self) -> usize {
        self.nb_barrier_triangles
    }
    /// Number of vertices and triangles
    pub fn nb_parameters(&self) -> usize {
        self.nb_parameters
    }
    /// Number of unknowns of the system: vertices and triangles that are not current barriers
    pub fn system_size(&self) -> usize {
        self.nb_parameters - self.nb_barrier_triangles
    }
    /// Pairs of meshes interacting through a conductive domain, self-pairs included
    pub fn communicating_mesh_pairs(&self) -> &[MeshPair] {
        &self.pairs
    }
    /// Groups of meshes connected through conductive domains
    pub fn isolated_parts(&self) -> &[Vec<usize>] {
        &self.parts
    }

    /// Flag a mesh as current barrier and renumber the unknowns
    pub fn set_current_barrier(&mut self, mesh: usize, current_barrier: bool) {
        self.meshes[mesh].set_current_barrier(current_barrier);
        self.generate_indices();
    }

    /// Flag a mesh as outermost
    pub fn set_outermost(&mut self, mesh: usize, outermost: bool) {
        self.meshes[mesh].set_outermost(outermost);
    }

    fn conductive_common_domains(&self, m1: usize, m2: usize) -> impl Iterator<Item = &Domain> + '_ {
        self.domains.iter().filter(move |d| {
            d.is_conductive()
                && d.mesh_orientation(&self.interfaces, m1).is_some()
                && d.mesh_orientation(&self.interfaces, m2).is_some()
        })
    }

    /// Sum of the conductivities of the domains shared by two meshes
    pub fn sigma(&self, m1: usize, m2: usize) -> f64 {
        self.conductive_common_domains(m1, m2)
            .map(|d| d.conductivity())
            .sum()
    }

    /// Sum of the resistivities of the conductive domains shared by two meshes
    pub fn sigma_inv(&self, m1: usize, m2: usize) -> f64 {
        self.conductive_common_domains(m1, m2)
            .map(|d| 1.0 / d.conductivity())
            .sum()
    }

    /// Number of conductive domains shared by two meshes
    pub fn indicator(&self, m1: usize, m2: usize) -> f64 {
        self.conductive_common_domains(m1, m2).count() as f64
    }

    /// Orientation of a mesh seen from a domain
    pub fn mesh_orientation(&self, domain: &Domain, mesh: usize) -> Option<i32> {
        domain.mesh_orientation(&self.interfaces, mesh)
    }

    /// The domain with the given name
    pub fn domain(&self, name: &str) -> BemResult<&Domain> {
        self.domains
            .iter()
            .find(|d| d.name() == name)
            .ok_or_else(|| BemError::UnknownDomain(name.to_string()))
    }

    fn interface_contains(&self, interface: &Interface, x: &Vect3) -> bool {
        let angle: f64 = interface
            .oriented_meshes()
            .iter()
            .map(|om| f64::from(om.orientation()) * self.meshes[om.mesh()].solid_angle(x))
            .sum();
        angle.abs() > 2.0 * PI
    }

    /// The domain containing a point
    pub fn domain_containing(&self, x: &Vect3) -> BemResult<&Domain> {
        self.domains
            .iter()
            .find(|d| {
                d.boundaries().iter().all(|b| {
                    self.interface_contains(&self.interfaces[b.interface()], x) == b.inside()
                })
            })
            .ok_or_else(|| {
                BemError::GeometryInconsistency(format!(
                    "point ({}, {}, {}) is not in any domain",
                    x[0], x[1], x[2]
                ))
            })
    }

    /// Check that a mesh lies inside a single domain, and return that domain
    ///
    /// Only the vertices are located: a mesh crossing an interface between two of its vertices
    /// goes unnoticed.
    pub fn check(&self, mesh: &Mesh) -> BemResult<&Domain> {
        let mut domains = mesh
            .vertices()
            .iter()
            .map(|v| self.domain_containing(v.position()));
        let first = domains.next().ok_or_else(|| {
            BemError::GeometryInconsistency(format!("mesh \"{}\" has no vertex", mesh.name()))
        })??;
        for domain in domains {
            if !std::ptr::eq(domain?, first) {
                return Err(BemError::GeometryInconsistency(format!(
                    "mesh \"{}\" overlaps the geometry",
                    mesh.name()
                )));
            }
        }
        Ok(first)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::shapes::{nested_spheres, regular_sphere};

    #[test]
    fn test_communicating_pairs() {
        let geo = nested_spheres(0, &[(0.5, 1.0), (0.8, 0.5), (1.0, 2.0)], None).unwrap();
        let pairs = geo
            .communicating_mesh_pairs()
            .iter()
            .map(|p| (p.first(), p.second(), p.relative_orientation()))
            .collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![(0, 0, 1), (0, 1, -1), (1, 1, 1), (1, 2, -1), (2, 2, 1)]
        );
        assert_eq!(geo.sigma(1, 1), 2.5);
        assert_eq!(geo.sigma_inv(0, 1), 2.0);
        assert_eq!(geo.indicator(1, 1), 2.0);
        assert_eq!(geo.indicator(0, 2), 0.0);
    }

    #[test]
    fn test_indices() {
        let geo = nested_spheres(0, &[(0.5, 1.0), (1.0, 1.0)], Some(0.0)).unwrap();
        assert_eq!(geo.mesh(0).first_vertex_index(), Some(0));
        assert_eq!(geo.mesh(1).first_vertex_index(), Some(6));
        assert_eq!(geo.mesh(0).first_triangle_index(), Some(12));
        // Triangles of current barriers come last.
        assert_eq!(geo.mesh(1).first_triangle_index(), Some(20));
        assert_eq!(geo.system_size(), 20);
        assert_eq!(geo.nb_parameters(), 28);
        assert_eq!(geo.nb_current_barrier_triangles(), 8);
    }

    #[test]
    fn test_isolated_parts() {
        let meshes = vec![
            regular_sphere("a", 0, 1.0, [0.0; 3]).unwrap(),
            regular_sphere("b", 0, 1.0, [5.0, 0.0, 0.0]).unwrap(),
        ];
        let interfaces = vec![
            Interface::new("a", vec![crate::geometry::OrientedMesh::new(0, 1).unwrap()]),
            Interface::new("b", vec![crate::geometry::OrientedMesh::new(1, 1).unwrap()]),
        ];
        let domains = vec![
            Domain::new("in_a", 1.0, vec![crate::geometry::Boundary::new(0, true)]),
            Domain::new("in_b", 1.0, vec![crate::geometry::Boundary::new(1, true)]),
        ];
        let geo = Geometry::new(meshes, interfaces, domains).unwrap();
        assert_eq!(geo.isolated_parts(), &[vec![0], vec![1]]);
        assert!(geo.mesh(0).outermost() && geo.mesh(1).outermost());
    }

    #[test]
    fn test_domain_containing() {
        let geo = nested_spheres(1, &[(0.5, 1.0), (1.0, 0.5)], Some(0.0)).unwrap();
        let name = |x: [f64; 3]| geo.domain_containing(&Vect3(x)).unwrap().name().to_string();
        assert_eq!(name([0.0, 0.1, 0.0]), "layer0");
        assert_eq!(name([0.0, 0.0, 0.75]), "layer1");
        assert_eq!(name([2.0, 0.0, 0.0]), "outside");
        assert!(matches!(
            geo.domain("none"),
            Err(BemError::UnknownDomain(_))
        ));
    }

    #[test]
    fn test_invalid_geometry() {
        let meshes = vec![regular_sphere("a", 0, 1.0, [0.0; 3]).unwrap()];
        let interfaces = vec![Interface::new(
            "a",
            vec![crate::geometry::OrientedMesh::new(3, 1).unwrap()],
        )];
        assert!(matches!(
            Geometry::new(meshes, interfaces, vec![]),
            Err(BemError::GeometryInconsistency(_))
        ));
    }
}
