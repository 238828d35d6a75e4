//! Assembly of the symmetric system and of its right hand sides
//!
//! All matrices are built over the unknowns of a [Geometry](crate::geometry::Geometry): the P1
//! potentials at every vertex followed by the P0 normal currents on the triangles of meshes that
//! are not current barriers.
mod head;
mod source;
mod surf2vol;

pub use head::deflate;
pub use source::Electrode;

use crate::geometry::{Geometry, Vect3};
use crate::quadrature::Integrator;
use std::f64::consts::PI;

/// Factor `1 / (4 pi)` of the Laplace Green's function
pub const K: f64 = 1.0 / (4.0 * PI);

/// Options for an assembler
#[derive(Debug, Clone, Default)]
pub struct AssemblerOptions {
    /// Integrator used for the interactions between triangles
    integrator: Integrator,
    /// Log every block operator at info level
    verbose: bool,
}

/// Assembler of the head matrix and of the source matrices
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    options: AssemblerOptions,
}

impl Assembler {
    /// Create an assembler with the default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the integrator
    pub fn integrator(&mut self, integrator: Integrator) {
        self.options.integrator = integrator;
    }

    /// Log every block operator at info level rather than debug level
    pub fn verbose(&mut self, verbose: bool) {
        self.options.verbose = verbose;
    }

    /// The options of the assembler
    pub fn options(&self) -> &AssemblerOptions {
        &self.options
    }
}

/// Index of the conductive domain containing each point
///
/// Points outside every domain, or inside a domain of zero conductivity, are reported and mapped
/// to `None`.
fn locate_points(geo: &Geometry, points: &[Vect3], context: &str) -> Vec<Option<usize>> {
    points
        .iter()
        .map(|p| {
            let Ok(domain) = geo.domain_containing(p) else {
                log::warn!(
                    "{context}: point ({}, {}, {}) is outside the geometry. Point is dropped.",
                    p[0],
                    p[1],
                    p[2]
                );
                return None;
            };
            if !domain.is_conductive() {
                log::warn!(
                    "{context}: point ({}, {}, {}) is inside the non-conductive domain \"{}\". Point is dropped.",
                    p[0],
                    p[1],
                    p[2],
                    domain.name()
                );
                return None;
            }
            geo.domains().iter().position(|d| std::ptr::eq(d, domain))
        })
        .collect()
}

impl AssemblerOptions {
    /// Integrator used for the interactions between triangles
    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }
    /// Whether block operators are logged at info level
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}
