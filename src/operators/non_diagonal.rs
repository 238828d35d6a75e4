//! Operators coupling two meshes
use crate::geometry::Mesh;
use crate::matrix::Block;
use crate::operators::common::{collect_entries, equal_meshes, message, SparseMatrixData};
use crate::operators::kernels::{double_layer_entries, hypersingular, single_layer};
use crate::quadrature::Integrator;
use crate::traits::AssemblyTarget;

/// Interaction of two meshes
///
/// Blocks are filled as full rectangles, with the rows of the first mesh and the columns of the
/// second one.
pub struct NonDiagonalBlock<'a> {
    mesh1: &'a Mesh,
    mesh2: &'a Mesh,
    integrator: &'a Integrator,
    verbose: bool,
    s_coeff: Option<f64>,
}

impl<'a> NonDiagonalBlock<'a> {
    /// Create the operators coupling two meshes
    pub fn new(mesh1: &'a Mesh, mesh2: &'a Mesh, integrator: &'a Integrator) -> Self {
        Self {
            mesh1,
            mesh2,
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

    /// Add the single layer block, unless one of the meshes is a current barrier
    pub fn set_s_block<T: AssemblyTarget + Sync>(&mut self, coeff: f64, matrix: &mut T) {
        if !self.mesh1.current_barrier() && !self.mesh2.current_barrier() {
            self.s(coeff, matrix);
            self.s_coeff = Some(coeff);
        }
    }

    /// Add the hypersingular block
    pub fn set_n_block<T: AssemblyTarget + Sync>(&self, coeff: f64, matrix: &mut T) {
        self.n(coeff, matrix);
    }

    /// Add the double layer block, unless the first mesh is a current barrier
    pub fn set_d_block<T: AssemblyTarget>(&self, coeff: f64, matrix: &mut T) {
        if !self.mesh1.current_barrier() {
            self.d(coeff, matrix);
        }
    }

    /// Add the adjoint double layer block, for distinct meshes when the second one is not a
    /// current barrier
    pub fn set_dstar_block<T: AssemblyTarget>(&self, coeff: f64, matrix: &mut T) {
        if !equal_meshes(self.mesh1, self.mesh2) && !self.mesh2.current_barrier() {
            self.dstar(coeff, matrix);
        }
    }

    /// Add the single layer block
    pub fn s<T: AssemblyTarget>(&self, coeff: f64, matrix: &mut T) {
        message(self.verbose, "S", &[self.mesh1, self.mesh2]);
        let (triangles1, triangles2) = (self.mesh1.triangles(), self.mesh2.triangles());
        let shape = matrix.dimensions();
        let entries = collect_entries(triangles1.len(), shape, |i| {
            let mut entries = SparseMatrixData::new_known_size(shape, triangles2.len());
            for triangle2 in triangles2 {
                entries.push(
                    triangles1[i].index(),
                    triangle2.index(),
                    single_layer(&triangles1[i], triangle2, self.integrator) * coeff,
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
    pub fn n<T: AssemblyTarget + Sync>(&self, coeff: f64, matrix: &mut T) {
        let entries = match self.s_coeff {
            Some(s_coeff) if s_coeff != 0.0 => {
                self.n_entries(coeff / s_coeff, &*matrix, matrix.dimensions())
            }
            _ => {
                let (Some(row), Some(col)) = (
                    self.mesh1.first_triangle_index(),
                    self.mesh2.first_triangle_index(),
                ) else {
                    return;
                };
                let mut block = Block::new(
                    row,
                    col,
                    self.mesh1.triangles().len(),
                    self.mesh2.triangles().len(),
                );
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
        message(self.verbose, "N", &[self.mesh1, self.mesh2]);
        let same_mesh = equal_meshes(self.mesh1, self.mesh2);
        let (vertices1, vertices2) = (self.mesh1.vertices(), self.mesh2.vertices());
        collect_entries(vertices1.len(), shape, |i1| {
            let mut entries = SparseMatrixData::new_known_size(shape, vertices2.len());
            for (i2, vertex2) in vertices2.iter().enumerate() {
                let factor = if same_mesh && i1 == i2 { 0.5 } else { 0.25 };
                let value = hypersingular(factor, self.mesh1, i1, self.mesh2, i2, s);
                entries.push(vertices1[i1].index(), vertex2.index(), value * coeff);
            }
            entries
        })
    }

    /// Add the double layer block: triangles of the first mesh against vertices of the second
    pub fn d<T: AssemblyTarget>(&self, coeff: f64, matrix: &mut T) {
        message(self.verbose, "D", &[self.mesh1, self.mesh2]);
        double_layer_entries(
            self.mesh1,
            self.mesh2,
            coeff,
            self.integrator,
            matrix.dimensions(),
        )
        .add_into(matrix);
    }

    /// Add the adjoint double layer block: triangles of the second mesh against vertices of the
    /// first
    pub fn dstar<T: AssemblyTarget>(&self, coeff: f64, matrix: &mut T) {
        message(self.verbose, "D*", &[self.mesh1, self.mesh2]);
        double_layer_entries(
            self.mesh2,
            self.mesh1,
            coeff,
            self.integrator,
            matrix.dimensions(),
        )
        .add_into(matrix);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::shapes::regular_sphere;
    use crate::matrix::{zeros, Matrix};
    use approx::assert_relative_eq;
    use rlst::{RandomAccessByRef, RawAccess};

    /// Two concentric spheres numbered as in a geometry: all vertices, then all triangles
    fn setup() -> (Mesh, Mesh, usize) {
        let mut inner = regular_sphere("inner", 1, 0.8, [0.0; 3]).unwrap();
        let mut outer = regular_sphere("outer", 1, 1.0, [0.0; 3]).unwrap();
        let (nv1, nv2) = (inner.vertices().len(), outer.vertices().len());
        let nt = inner.triangles().len();
        inner.set_vertex_indices(0);
        outer.set_vertex_indices(nv1);
        inner.set_triangle_indices(nv1 + nv2);
        outer.set_triangle_indices(nv1 + nv2 + nt);
        let size = nv1 + nv2 + nt + outer.triangles().len();
        (inner, outer, size)
    }

    fn value(m: &Matrix, i: usize, j: usize) -> f64 {
        *m.get([i, j]).unwrap()
    }

    #[test]
    fn test_n_from_cached_s() {
        let (inner, outer, size) = setup();
        let integrator = Integrator::new(1, 0, 0.0).unwrap();

        let mut cached = zeros(size, size);
        let mut block = NonDiagonalBlock::new(&inner, &outer, &integrator);
        block.set_s_block(-0.4, &mut cached);
        block.set_n_block(2.5, &mut cached);

        let mut scratch = zeros(size, size);
        NonDiagonalBlock::new(&inner, &outer, &integrator).n(2.5, &mut scratch);

        for v1 in inner.vertices() {
            for v2 in outer.vertices() {
                assert_relative_eq!(
                    value(&cached, v1.index(), v2.index()),
                    value(&scratch, v1.index(), v2.index()),
                    max_relative = 1e-9,
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_dstar_is_transposed_d() {
        let (inner, outer, size) = setup();
        let integrator = Integrator::new(2, 0, 0.0).unwrap();
        let mut d = zeros(size, size);
        NonDiagonalBlock::new(&outer, &inner, &integrator).set_d_block(1.0, &mut d);
        let mut dstar = zeros(size, size);
        NonDiagonalBlock::new(&inner, &outer, &integrator).set_dstar_block(1.0, &mut dstar);
        for t in outer.triangles() {
            for v in inner.vertices() {
                assert_eq!(value(&d, t.index(), v.index()), value(&dstar, t.index(), v.index()));
            }
        }
        // The double layer of the inner sphere vanishes on the outer one for constant densities.
        for t in outer.triangles() {
            let sum: f64 = inner
                .vertices()
                .iter()
                .map(|v| value(&d, t.index(), v.index()))
                .sum();
            assert!(sum.abs() < 1e-10 * t.area());
        }
    }

    #[test]
    fn test_gating() {
        let (inner, mut outer, size) = setup();
        outer.set_current_barrier(true);
        let integrator = Integrator::new(0, 0, 0.0).unwrap();
        let mut m = zeros(size, size);
        let mut block = NonDiagonalBlock::new(&inner, &outer, &integrator);
        block.set_s_block(1.0, &mut m);
        assert_eq!(block.s_coeff(), None);
        block.set_dstar_block(1.0, &mut m);
        let norm: f64 = m.data().iter().map(|v| v.abs()).sum();
        assert_eq!(norm, 0.0);

        block.set_d_block(1.0, &mut m);
        assert!(value(&m, inner.triangles()[0].index(), outer.vertices()[0].index()) != 0.0);
    }

    #[test]
    fn test_same_mesh_dstar_is_skipped() {
        let (inner, _, size) = setup();
        let integrator = Integrator::new(0, 0, 0.0).unwrap();
        let mut m = zeros(size, size);
        NonDiagonalBlock::new(&inner, &inner, &integrator).set_dstar_block(1.0, &mut m);
        assert!(m.data().iter().all(|v| *v == 0.0));
    }
}
