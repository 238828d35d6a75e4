//! Symmetric matrices stored as a set of dense blocks
use crate::matrix::{zeros, Matrix, SymMatrix};
use crate::traits::{AssemblyTarget, SymmetricTarget};
use crate::types::{BemError, BemResult};
use rlst::{RandomAccessByRef, RandomAccessMut};
use std::collections::HashMap;
use std::ops::Range;

/// A symmetric matrix whose index space is split into ranges
///
/// Only blocks `(r1, r2)` with `r1 <= r2` are stored, and only once a value is added to them.
/// Blocks on the diagonal store their upper triangle. Indices outside every range read as zero.
#[derive(Debug)]
pub struct SymmetricBlockMatrix {
    size: usize,
    ranges: Vec<Range<usize>>,
    blocks: HashMap<(usize, usize), Matrix>,
}

impl SymmetricBlockMatrix {
    /// Create a matrix made of a single range
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ranges: vec![0..size],
            blocks: HashMap::new(),
        }
    }

    /// Replace the ranges of the matrix, discarding every block
    ///
    /// The ranges are sorted; they must not be empty or overlap, and must lie in `0..size`.
    pub fn set_blocks(&mut self, ranges: &[Range<usize>]) -> BemResult<()> {
        let mut ranges = ranges.to_vec();
        ranges.sort_by_key(|r| r.start);
        for r in &ranges {
            if r.is_empty() || r.end > self.size {
                return Err(BemError::DimensionMismatch {
                    expected: self.size,
                    actual: r.end,
                });
            }
        }
        for (a, b) in ranges.iter().zip(ranges.iter().skip(1)) {
            if a.end > b.start {
                return Err(BemError::DimensionMismatch {
                    expected: a.end,
                    actual: b.start,
                });
            }
        }
        self.ranges = ranges;
        self.blocks.clear();
        Ok(())
    }

    /// Number of rows (and columns)
    pub fn size(&self) -> usize {
        self.size
    }
    /// Ranges splitting the index space
    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }
    /// Number of allocated blocks
    pub fn nb_blocks(&self) -> usize {
        self.blocks.len()
    }

    fn range_of(&self, i: usize) -> Option<usize> {
        let r = self.ranges.partition_point(|r| r.end <= i);
        (r < self.ranges.len() && self.ranges[r].contains(&i)).then_some(r)
    }

    /// Block and local position of an entry
    fn locate(&self, i: usize, j: usize) -> Option<((usize, usize), [usize; 2])> {
        let (ri, rj) = (self.range_of(i)?, self.range_of(j)?);
        let (ri, rj, i, j) = if ri < rj || (ri == rj && i <= j) {
            (ri, rj, i, j)
        } else {
            (rj, ri, j, i)
        };
        Some((
            (ri, rj),
            [i - self.ranges[ri].start, j - self.ranges[rj].start],
        ))
    }

    /// Get an entry
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.size && j < self.size, "Index out of range");
        self.locate(i, j)
            .and_then(|(key, local)| self.blocks.get(&key).map(|b| *b.get(local).unwrap()))
            .unwrap_or(0.0)
    }

    /// Add a value to an entry
    ///
    /// Panics if the entry lies outside the ranges of the matrix.
    pub fn add(&mut self, i: usize, j: usize, value: f64) {
        assert!(i < self.size && j < self.size, "Index out of range");
        let (key, local) = self
            .locate(i, j)
            .unwrap_or_else(|| panic!("Entry ({i}, {j}) is not covered by any block"));
        let (rows, cols) = (self.ranges[key.0].len(), self.ranges[key.1].len());
        let block = self.blocks.entry(key).or_insert_with(|| zeros(rows, cols));
        *block.get_mut(local).unwrap() += value;
    }

    /// Copy into packed storage
    pub fn to_sym_matrix(&self) -> SymMatrix {
        let mut result = SymMatrix::new(self.size);
        for ((ri, rj), block) in &self.blocks {
            for (li, i) in self.ranges[*ri].clone().enumerate() {
                for (lj, j) in self.ranges[*rj].clone().enumerate() {
                    if ri != rj || i <= j {
                        result.set(i, j, *block.get([li, lj]).unwrap());
                    }
                }
            }
        }
        result
    }

    /// Log the ranges and allocated blocks
    pub fn info(&self) {
        log::info!("Symmetric block matrix of size {}", self.size);
        for (n, r) in self.ranges.iter().enumerate() {
            log::info!("Range {n} : [{}, {})", r.start, r.end);
        }
        log::info!("{} allocated blocks", self.blocks.len());
    }
}

impl AssemblyTarget for SymmetricBlockMatrix {
    fn value(&self, i: usize, j: usize) -> f64 {
        self.get(i, j)
    }
    fn add_value(&mut self, i: usize, j: usize, value: f64) {
        self.add(i, j, value);
    }
    fn dimensions(&self) -> [usize; 2] {
        [self.size, self.size]
    }
}

impl SymmetricTarget for SymmetricBlockMatrix {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ranges() {
        let mut m = SymmetricBlockMatrix::new(10);
        m.set_blocks(&[7..10, 1..5, 5..7]).unwrap();
        assert_eq!(m.ranges(), &[1..5, 5..7, 7..10]);
        assert_eq!(m.nb_blocks(), 0);

        m.add(2, 8, 1.0);
        m.add(8, 2, 1.0);
        m.add(6, 5, -3.0);
        assert_eq!(m.nb_blocks(), 2);
        assert_eq!(m.get(8, 2), 2.0);
        assert_eq!(m.get(5, 6), -3.0);
        assert_eq!(m.get(1, 1), 0.0);
        // Index 0 lies outside every range.
        assert_eq!(m.get(0, 3), 0.0);
    }

    #[test]
    fn test_invalid_ranges() {
        let mut m = SymmetricBlockMatrix::new(10);
        assert!(m.set_blocks(&[0..5, 4..7]).is_err());
        assert!(m.set_blocks(&[0..11]).is_err());
        assert!(m.set_blocks(&[3..3]).is_err());
    }

    #[test]
    #[should_panic]
    fn test_add_outside_ranges() {
        let mut m = SymmetricBlockMatrix::new(10);
        m.set_blocks(&[1..5]).unwrap();
        m.add(0, 2, 1.0);
    }

    #[test]
    fn test_to_sym_matrix() {
        let mut m = SymmetricBlockMatrix::new(6);
        m.set_blocks(&[0..2, 2..6]).unwrap();
        for i in 0..6 {
            for j in i..6 {
                m.add(i, j, (i * 6 + j) as f64);
            }
        }
        let packed = m.to_sym_matrix();
        for i in 0..6 {
            for j in 0..6 {
                assert_eq!(packed.get(i, j), m.get(i, j));
                assert_eq!(packed.get(i, j), (i.min(j) * 6 + i.max(j)) as f64);
            }
        }
    }
}
