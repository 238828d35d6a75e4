//! Blocks addressed with the indices of a larger matrix
use crate::matrix::{zeros, Matrix, SymMatrix};
use crate::traits::{AssemblyTarget, SymmetricTarget};
use rlst::{RandomAccessByRef, RandomAccessMut, Shape};

/// A square symmetric block covering the indices `offset..offset + size`
#[derive(Debug, Clone)]
pub struct SymBlock {
    offset: usize,
    matrix: SymMatrix,
}

impl SymBlock {
    /// Create a block filled with zeros
    pub fn new(offset: usize, size: usize) -> Self {
        Self {
            offset,
            matrix: SymMatrix::new(size),
        }
    }
    /// First index covered by the block
    pub fn offset(&self) -> usize {
        self.offset
    }
    /// Entries of the block, with local indices
    pub fn matrix(&self) -> &SymMatrix {
        &self.matrix
    }
    /// Take the entries of the block
    pub fn into_inner(self) -> SymMatrix {
        self.matrix
    }
}

impl AssemblyTarget for SymBlock {
    fn value(&self, i: usize, j: usize) -> f64 {
        self.matrix.get(i - self.offset, j - self.offset)
    }
    fn add_value(&mut self, i: usize, j: usize, value: f64) {
        *self.matrix.get_mut(i - self.offset, j - self.offset) += value;
    }
    fn dimensions(&self) -> [usize; 2] {
        let end = self.offset + self.matrix.size();
        [end, end]
    }
}

impl SymmetricTarget for SymBlock {
    fn size(&self) -> usize {
        self.matrix.size()
    }
}

/// A rectangular block covering rows `row_offset..` and columns `col_offset..`
#[derive(Debug)]
pub struct Block {
    row_offset: usize,
    col_offset: usize,
    matrix: Matrix,
}

impl Block {
    /// Create a block filled with zeros
    pub fn new(row_offset: usize, col_offset: usize, rows: usize, cols: usize) -> Self {
        Self {
            row_offset,
            col_offset,
            matrix: zeros(rows, cols),
        }
    }
    /// First row and first column covered by the block
    pub fn offsets(&self) -> [usize; 2] {
        [self.row_offset, self.col_offset]
    }
    /// Entries of the block, with local indices
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }
    /// Take the entries of the block
    pub fn into_inner(self) -> Matrix {
        self.matrix
    }
}

impl AssemblyTarget for Block {
    fn value(&self, i: usize, j: usize) -> f64 {
        *self
            .matrix
            .get([i - self.row_offset, j - self.col_offset])
            .unwrap()
    }
    fn add_value(&mut self, i: usize, j: usize, value: f64) {
        *self
            .matrix
            .get_mut([i - self.row_offset, j - self.col_offset])
            .unwrap() += value;
    }
    fn dimensions(&self) -> [usize; 2] {
        let [rows, cols] = self.matrix.shape();
        [self.row_offset + rows, self.col_offset + cols]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sym_block_offsets() {
        let mut block = SymBlock::new(5, 3);
        block.add_value(7, 5, 2.0);
        assert_eq!(block.value(5, 7), 2.0);
        assert_eq!(block.matrix().get(0, 2), 2.0);
        assert_eq!(block.dimensions(), [8, 8]);
        assert_eq!(SymmetricTarget::size(&block), 3);
    }

    #[test]
    fn test_block_offsets() {
        let mut block = Block::new(4, 10, 2, 3);
        block.add_value(5, 12, 1.5);
        block.add_value(5, 12, 1.5);
        assert_eq!(block.value(5, 12), 3.0);
        assert_eq!(*block.matrix().get([1, 2]).unwrap(), 3.0);
        assert_eq!(block.dimensions(), [6, 13]);
    }
}
