//! Geometry of the conductor
mod conductor;
mod dipole;
mod domain;
mod mesh;
pub mod shapes;
mod vector;

pub use conductor::{Geometry, MeshPair};
pub use dipole::Dipole;
pub use domain::{Boundary, Domain, Interface, OrientedMesh};
pub use mesh::{Mesh, MeshBuilder, Triangle, Vertex};
pub use vector::Vect3;
