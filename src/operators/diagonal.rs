//! Operators coupling a mesh with itself
use crate::geometry::Mesh;
use crate::matrix::SymBlock;
use crate::operators::common::{collect_entries, message, SparseMatrixData};
use crate::operators::kernels::{double_layer_entries, hypersingular, single_layer};
use crate::quadrature::Integrator;
use crate::traits::{AssemblyTarget, SymmetricTarget};

/// Interaction of a mesh with itself
///
/// The single layer and hypersingular blocks are symmetric: only the entries `(i, j)` with
/// `j >= i` (for triangles) or `j <= i` (for vertices) are computed, so the target must be a
/// [SymmetricTarget].
pub struct DiagonalBlock<'a> {
    mesh: &'a Mesh,
    integrator: &'a Integrator,
    verbose: bool,
    s_coeff: Option<f64>,
}

impl<'a> DiagonalBlock<'a> {
    /// Create the operators of a mesh
    pub fn new(mesh: &'a Mesh, integrator: &'a Integrator) -> Self {
        Self {
            mesh,
            integrator,
            verbose: false,
            s_coeff: None,
        }
    }

    /// Log each operator at info level instead of debug level
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Coefficient of the single layer block already added to the target, if any
    pub fn s_coeff(&self) -> Option<f64> {
        self.s_coeff
    }

    /// Add the single layer block, unless the mesh is a current barrier
    ///
    /// The block is remembered, and later used to derive the hypersingular block.
    pub fn set_s_block<T: SymmetricTarget + Sync>(&mut self, coeff: f64, matrix: &mut T) {
        if !self.mesh.current_barrier() {
            self.s(coeff, matrix);
            self.s_coeff = Some(coeff);
        }
    }

    /// Add the hypersingular block
    pub fn set_n_block<T: SymmetricTarget + Sync>(&self, coeff: f64, matrix: &mut T) {
        self.n(coeff, matrix);
    }

    /// Add the double layer block, unless the mesh is a current barrier
    pub fn set_d_block<T: AssemblyTarget>(&self, coeff: f64, matrix: &mut T) {
        if !self.mesh.current_barrier() {
            self.d(coeff, matrix);
        }
    }

    /// The adjoint double layer block of a mesh with itself is the transpose of its double layer
    /// block, which a symmetric target already holds: nothing is added.
    pub fn set_dstar_block<T: AssemblyTarget>(&self, _coeff: f64, _matrix: &mut T) {}

    /// Add `coeff` times the P0-P1 mass matrix
    pub fn add_identity<T: AssemblyTarget>(&self, coeff: f64, matrix: &mut T) {
        message(self.verbose, "Id", &[self.mesh]);
        for triangle in self.mesh.triangles() {
            for v in triangle.vertices() {
                matrix.add_value(
                    triangle.index(),
                    self.mesh.vertices()[*v].index(),
                    coeff * triangle.area() / 3.0,
                );
            }
        }
    }

    /// Add the single layer block
    pub fn s<T: SymmetricTarget>(&self, coeff: f64, matrix: &mut T) {
        message(self.verbose, "S", &[self.mesh, self.mesh]);
        let triangles = self.mesh.triangles();
        let shape = matrix.dimensions();
        let entries = collect_entries(triangles.len(), shape, |i| {
            let mut entries = SparseMatrixData::new_known_size(shape, triangles.len() - i);
            for triangle2 in &triangles[i..] {
                entries.push(
                    triangles[i].index(),
                    triangle2.index(),
                    single_layer(&triangles[i], triangle2, self.integrator) * coeff,
                );
            }
            entries
        });
        entries.add_into(matrix);
    }

    /// Add the hypersingular block
    ///
    /// The single layer block is read back from the target when it was added with a non-zero
    /// coefficient. Otherwise it is computed into a scratch block.
    pub fn n<T: SymmetricTarget + Sync>(&self, coeff: f64, matrix: &mut T) {
        let entries = match self.s_coeff {
            Some(s_coeff) if s_coeff != 0.0 => {
                self.n_entries(coeff / s_coeff, &*matrix, matrix.dimensions())
            }
            _ => {
                let Some(first) = self.mesh.first_triangle_index() else {
                    return;
                };
                let mut block = SymBlock::new(first, self.mesh.triangles().len());
                self.s(1.0, &mut block);
                self.n_entries(coeff, &block, matrix.dimensions())
            }
        };
        entries.add_into(matrix);
    }

    fn n_entries<S: AssemblyTarget + Sync + ?Sized>(
        &self,
        coeff: f64,
        s: &S,
        shape: [usize; 2],
    ) -> SparseMatrixData {
        message(self.verbose, "N", &[self.mesh, self.mesh]);
        let vertices = self.mesh.vertices();
        collect_entries(vertices.len(), shape, |i1| {
            let mut entries = SparseMatrixData::new_known_size(shape, i1 + 1);
            for i2 in 0..=i1 {
                let value = hypersingular(0.25, self.mesh, i1, self.mesh, i2, s);
                entries.push(vertices[i1].index(), vertices[i2].index(), value * coeff);
            }
            entries
        })
    }

    /// Add the double layer block
    pub fn d<T: AssemblyTarget>(&self, coeff: f64, matrix: &mut T) {
        message(self.verbose, "D", &[self.mesh, self.mesh]);
        double_layer_entries(
            self.mesh,
            self.mesh,
            coeff,
            self.integrator,
            matrix.dimensions(),
        )
        .add_into(matrix);
    }

    /// Add the adjoint double layer block, which coincides with the double layer block when
    /// both meshes are the same
    pub fn dstar<T: AssemblyTarget>(&self, coeff: f64, matrix: &mut T) {
        message(self.verbose, "D*", &[self.mesh, self.mesh]);
        double_layer_entries(
            self.mesh,
            self.mesh,
            coeff,
            self.integrator,
            matrix.dimensions(),
        )
        .add_into(matrix);
    }
}
