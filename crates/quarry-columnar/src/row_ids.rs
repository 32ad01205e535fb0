use crate::bitmap::BitVec;
use crate::error::{ColumnarError, ColumnarResult};

/// A subset of the rows of a batch, stored as one bit per backing row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowIdSet {
    bits: BitVec,
}

impl RowIdSet {
    /// An empty selection over `universe` backing rows.
    pub fn empty(universe: usize) -> Self {
        Self {
            bits: BitVec::with_len_all_false(universe),
        }
    }

    /// Every row of `universe`.
    pub fn all(universe: usize) -> Self {
        Self {
            bits: BitVec::with_len_all_true(universe),
        }
    }

    pub fn from_row_ids(
        universe: usize,
        rows: impl IntoIterator<Item = usize>,
    ) -> ColumnarResult<Self> {
        let mut set = Self::empty(universe);
        for row in rows {
            set.insert(row)?;
        }
        Ok(set)
    }

    pub fn from_bitmap(bits: BitVec) -> Self {
        Self { bits }
    }

    pub fn insert(&mut self, row: usize) -> ColumnarResult<()> {
        if row >= self.bits.len() {
            return Err(ColumnarError::RowIdOutOfBounds {
                row,
                len: self.bits.len(),
            });
        }
        self.bits.set(row, true);
        Ok(())
    }

    pub fn contains(&self, row: usize) -> bool {
        row < self.bits.len() && self.bits.get(row)
    }

    /// Number of selected rows.
    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.count_ones() == 0
    }

    /// Number of backing rows the selection ranges over.
    pub fn universe(&self) -> usize {
        self.bits.len()
    }

    pub fn intersect(&mut self, other: &RowIdSet) {
        self.bits.and_inplace(&other.bits);
    }

    /// Selected row ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }
}
