//! Operators evaluated at points away from the meshes
use crate::analytics::{AnalyticD3, AnalyticS};
use crate::geometry::{Mesh, Vertex};
use crate::operators::common::{collect_entries, message, SparseMatrixData};
use crate::traits::AssemblyTarget;

/// Single and double layer potentials of a mesh at a set of points
///
/// Each point is given as a [Vertex] whose index is the row it is written to. The potentials are
/// evaluated in closed form.
pub struct PartialBlock<'a> {
    mesh: &'a Mesh,
    verbose: bool,
}

impl<'a> PartialBlock<'a> {
    /// Create the operators of a mesh
    pub fn new(mesh: &'a Mesh) -> Self {
        Self {
            mesh,
            verbose: false,
        }
    }

    /// Log each operator at info level instead of debug level
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Add the double layer potential of the P1 functions of the mesh
    pub fn add_d<T: AssemblyTarget>(&self, coeff: f64, points: &[Vertex], matrix: &mut T) {
        message(self.verbose, "D", &[self.mesh]);
        let shape = matrix.dimensions();
        let triangles = self.mesh.triangles();
        collect_entries(triangles.len(), shape, |i| {
            let triangle = &triangles[i];
            let analytic = AnalyticD3::new(triangle.points());
            let mut entries = SparseMatrixData::new_known_size(shape, 3 * points.len());
            for point in points {
                let integrals = analytic.value(point.position());
                for (k, v) in triangle.vertices().iter().enumerate() {
                    entries.push(
                        point.index(),
                        self.mesh.vertices()[*v].index(),
                        integrals[k] * coeff,
                    );
                }
            }
            entries
        })
        .add_into(matrix);
    }

    /// Add the single layer potential of the P0 functions of the mesh
    pub fn s<T: AssemblyTarget>(&self, coeff: f64, points: &[Vertex], matrix: &mut T) {
        message(self.verbose, "S", &[self.mesh]);
        let shape = matrix.dimensions();
        let triangles = self.mesh.triangles();
        collect_entries(triangles.len(), shape, |i| {
            let analytic = AnalyticS::new(triangles[i].points());
            let mut entries = SparseMatrixData::new_known_size(shape, points.len());
            for point in points {
                entries.push(
                    point.index(),
                    triangles[i].index(),
                    coeff * analytic.value(point.position()),
                );
            }
            entries
        })
        .add_into(matrix);
    }
}
