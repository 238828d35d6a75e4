//! Block operators
//!
//! Each operator adds the discretisation of a boundary integral operator, scaled by a
//! coefficient, into the rows and columns of a matrix given by the global indices of the triangles
//! (P0 unknowns) and vertices (P1 unknowns) involved. Operators never clear their target.
mod common;
mod diagonal;
pub mod kernels;
mod non_diagonal;
mod partial;

pub use common::SparseMatrixData;
pub use diagonal::DiagonalBlock;
pub use non_diagonal::NonDiagonalBlock;
pub use partial::PartialBlock;

pub(crate) use common::equal_meshes;
pub(crate) use common::collect_entries;
