//! The symmetric head matrix
use crate::assembly::{Assembler, K};
use crate::geometry::Geometry;
use crate::matrix::{set_row, zeros, Matrix, SymMatrix, SymmetricBlockMatrix};
use crate::operators::{DiagonalBlock, NonDiagonalBlock, SparseMatrixData};
use crate::traits::SymmetricTarget;
use crate::types::{BemError, BemResult};
use itertools::Itertools;

impl Assembler {
    /// Assemble the deflated head matrix
    pub fn head_matrix(&self, geo: &Geometry) -> BemResult<SymMatrix> {
        check_parts(geo)?;
        let mut matrix = SymMatrix::new(geo.system_size());
        self.add_head_blocks(geo, &mut matrix, None);
        deflate(&mut matrix, geo);
        Ok(matrix)
    }

    /// Assemble the deflated head matrix into blocks
    ///
    /// The index space is split into the vertices of each mesh and the triangles of each mesh
    /// that is not a current barrier.
    pub fn head_matrix_blocks(&self, geo: &Geometry) -> BemResult<SymmetricBlockMatrix> {
        check_parts(geo)?;
        let mut matrix = SymmetricBlockMatrix::new(geo.system_size());
        let vertex_ranges = geo.meshes().iter().filter_map(|m| {
            let first = m.first_vertex_index()?;
            Some(first..first + m.vertices().len())
        });
        let triangle_ranges = geo
            .meshes()
            .iter()
            .filter(|m| !m.current_barrier())
            .filter_map(|m| {
                let first = m.first_triangle_index()?;
                Some(first..first + m.triangles().len())
            });
        matrix.set_blocks(&vertex_ranges.chain(triangle_ranges).collect::<Vec<_>>())?;
        self.add_head_blocks(geo, &mut matrix, None);
        deflate(&mut matrix, geo);
        Ok(matrix)
    }

    /// Assemble the rows of the head matrix that do not belong to the cortex
    ///
    /// The interaction of the cortex with itself is left out. The rows of the other meshes are
    /// stacked, each mesh contributing its vertices then, unless it is a current barrier, its
    /// triangles. `extension` zero rows are appended.
    pub fn cortical_head_matrix(
        &self,
        geo: &Geometry,
        cortex_interface: &str,
        extension: usize,
    ) -> BemResult<Matrix> {
        let interface = geo
            .interfaces()
            .iter()
            .find(|i| i.name() == cortex_interface)
            .ok_or_else(|| {
                BemError::GeometryInconsistency(format!("unknown interface \"{cortex_interface}\""))
            })?;
        let [oriented_mesh] = interface.oriented_meshes() else {
            return Err(BemError::GeometryInconsistency(format!(
                "cortex interface \"{cortex_interface}\" must be made of a single mesh"
            )));
        };
        let cortex = oriented_mesh.mesh();
        check_parts(geo)?;

        let mut matrix = SymMatrix::new(geo.system_size());
        self.add_head_blocks(geo, &mut matrix, Some(cortex));
        deflate(&mut matrix, geo);

        let cortex_mesh = geo.mesh(cortex);
        let mut cortex_unknowns = cortex_mesh.vertices().len();
        if !cortex_mesh.current_barrier() {
            cortex_unknowns += cortex_mesh.triangles().len();
        }
        let nrows = geo.system_size() - cortex_unknowns + extension;

        let mut result = zeros(nrows, geo.system_size());
        let mut row = 0;
        for (index, mesh) in geo.meshes().iter().enumerate() {
            if index == cortex {
                continue;
            }
            let mut indices = mesh.vertices().iter().map(|v| v.index()).collect::<Vec<_>>();
            if !mesh.current_barrier() {
                indices.extend(mesh.triangles().iter().map(|t| t.index()));
            }
            for i in indices {
                set_row(&mut result, row, &matrix.row(i));
                row += 1;
            }
        }
        Ok(result)
    }

    /// Add the blocks of every pair of communicating meshes, except the self-interaction of
    /// `skip`
    fn add_head_blocks<T: SymmetricTarget + Sync>(
        &self,
        geo: &Geometry,
        matrix: &mut T,
        skip: Option<usize>,
    ) {
        let integrator = self.options.integrator();
        for pair in geo.communicating_mesh_pairs() {
            let (m1, m2) = (pair.first(), pair.second());
            if pair.is_diagonal() && skip == Some(m1) {
                continue;
            }
            let factor = f64::from(pair.relative_orientation()) * K;
            let s_coeff = factor * geo.sigma_inv(m1, m2);
            let n_coeff = factor * geo.sigma(m1, m2);
            let d_coeff = -factor * geo.indicator(m1, m2);

            if pair.is_diagonal() {
                let mut block = DiagonalBlock::new(geo.mesh(m1), integrator);
                block.set_verbose(self.options.verbose());
                block.set_s_block(s_coeff, matrix);
                block.set_n_block(n_coeff, matrix);
                block.set_d_block(d_coeff, matrix);
                block.set_dstar_block(d_coeff, matrix);
            } else {
                let mut block = NonDiagonalBlock::new(geo.mesh(m1), geo.mesh(m2), integrator);
                block.set_verbose(self.options.verbose());
                block.set_s_block(s_coeff, matrix);
                block.set_n_block(n_coeff, matrix);
                block.set_d_block(d_coeff, matrix);
                block.set_dstar_block(d_coeff, matrix);
            }
        }
    }
}

/// Check that every isolated part of the geometry has an outermost vertex to deflate on
fn check_parts(geo: &Geometry) -> BemResult<()> {
    for part in geo.isolated_parts() {
        let has_outer_vertex = part
            .iter()
            .map(|m| geo.mesh(*m))
            .any(|m| m.outermost() && !m.vertices().is_empty());
        if !has_outer_vertex {
            let names = part.iter().map(|m| geo.mesh(*m).name()).join(", ");
            return Err(BemError::GeometryInconsistency(format!(
                "isolated part made of meshes {names} has no outermost vertex"
            )));
        }
    }
    Ok(())
}

/// Remove the constant null space of each isolated part of the geometry
///
/// For each part, `M(i, i) / n` is added to every pair of the `n` vertices of its outermost
/// meshes, where `i` is the first of these vertices. The coefficient is read from the matrix, so
/// deflating twice does not add the same correction twice.
pub fn deflate<T: SymmetricTarget + ?Sized>(matrix: &mut T, geo: &Geometry) {
    let shape = matrix.dimensions();
    for part in geo.isolated_parts() {
        let indices = part
            .iter()
            .map(|m| geo.mesh(*m))
            .filter(|m| m.outermost())
            .flat_map(|m| m.vertices().iter().map(|v| v.index()))
            .collect::<Vec<_>>();
        let Some(first) = indices.first() else {
            continue;
        };
        let coeff = matrix.value(*first, *first) / indices.len() as f64;
        log::debug!(
            "Deflating {} outermost vertices with coefficient {coeff}",
            indices.len()
        );

        let mut entries =
            SparseMatrixData::new_known_size(shape, indices.len() * (indices.len() + 1) / 2);
        for (a, i) in indices.iter().enumerate() {
            for j in &indices[a..] {
                entries.push(*i, *j, coeff);
            }
        }
        entries.add_into(matrix);
    }
}
