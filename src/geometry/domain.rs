//! Interfaces and conductive domains
use crate::types::{BemError, BemResult};

/// A mesh taken with an orientation inside an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientedMesh {
    mesh: usize,
    orientation: i32,
}

impl OrientedMesh {
    /// Create an oriented mesh
    ///
    /// The orientation is `1` if the mesh normals point out of the interface, `-1` otherwise.
    pub fn new(mesh: usize, orientation: i32) -> BemResult<Self> {
        if orientation != 1 && orientation != -1 {
            return Err(BemError::GeometryInconsistency(format!(
                "invalid orientation {orientation} for mesh {mesh}"
            )));
        }
        Ok(Self { mesh, orientation })
    }
    /// Index of the mesh in the geometry
    pub fn mesh(&self) -> usize {
        self.mesh
    }
    /// Orientation of the mesh
    pub fn orientation(&self) -> i32 {
        self.orientation
    }
}

/// A closed surface made of one or more oriented meshes
#[derive(Debug, Clone)]
pub struct Interface {
    name: String,
    oriented_meshes: Vec<OrientedMesh>,
}

impl Interface {
    /// Create an interface
    pub fn new(name: &str, oriented_meshes: Vec<OrientedMesh>) -> Self {
        Self {
            name: name.to_string(),
            oriented_meshes,
        }
    }
    /// Name of the interface
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Meshes composing the interface
    pub fn oriented_meshes(&self) -> &[OrientedMesh] {
        &self.oriented_meshes
    }
    /// Orientation of a mesh in this interface, if the mesh is part of it
    pub fn mesh_orientation(&self, mesh: usize) -> Option<i32> {
        self.oriented_meshes
            .iter()
            .find(|om| om.mesh == mesh)
            .map(|om| om.orientation)
    }
}

/// One side of an interface, as seen from a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    interface: usize,
    inside: bool,
}

impl Boundary {
    /// Create a boundary. `inside` is true when the domain lies inside the interface.
    pub fn new(interface: usize, inside: bool) -> Self {
        Self { interface, inside }
    }
    /// Index of the interface in the geometry
    pub fn interface(&self) -> usize {
        self.interface
    }
    /// Whether the domain lies inside the interface
    pub fn inside(&self) -> bool {
        self.inside
    }
    /// Orientation of a mesh of the interface as seen from the domain
    pub fn mesh_orientation(&self, oriented_mesh: &OrientedMesh) -> i32 {
        if self.inside {
            oriented_mesh.orientation()
        } else {
            -oriented_mesh.orientation()
        }
    }
}

/// A homogeneous conductive region delimited by interfaces
#[derive(Debug, Clone)]
pub struct Domain {
    name: String,
    conductivity: f64,
    boundaries: Vec<Boundary>,
}

impl Domain {
    /// Create a domain
    pub fn new(name: &str, conductivity: f64, boundaries: Vec<Boundary>) -> Self {
        Self {
            name: name.to_string(),
            conductivity,
            boundaries,
        }
    }
    /// Name of the domain
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Conductivity
    pub fn conductivity(&self) -> f64 {
        self.conductivity
    }
    /// Whether current flows in the domain
    pub fn is_conductive(&self) -> bool {
        self.conductivity != 0.0
    }
    /// Boundaries of the domain
    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// Orientation of a mesh with respect to this domain, or `None` if the mesh does not bound it.
    ///
    /// This is the mesh orientation in its interface, negated when the domain lies outside the
    /// interface.
    pub fn mesh_orientation(&self, interfaces: &[Interface], mesh: usize) -> Option<i32> {
        self.boundaries.iter().find_map(|b| {
            interfaces[b.interface]
                .mesh_orientation(mesh)
                .map(|o| if b.inside { o } else { -o })
        })
    }

    /// Whether the domain lies outside the given mesh
    pub(crate) fn is_outside_of(&self, interfaces: &[Interface], mesh: usize) -> bool {
        self.boundaries
            .iter()
            .any(|b| !b.inside && interfaces[b.interface].mesh_orientation(mesh).is_some())
    }
}
