use quarry_types::TypedValue;

use crate::batch::ColumnBatch;
use crate::error::{ColumnarError, ColumnarResult};
use crate::row_ids::RowIdSet;

/// Forward-only, single-pass access to rows of one or more column batches.
///
/// A fresh (or restarted) cursor sits before the first row; [`ValueAccessor::advance`] moves to
/// the next row. Values are read from the backing batches in place.
pub trait ValueAccessor<'a> {
    fn num_columns(&self) -> usize;

    /// Rows a full iteration visits.
    fn num_rows(&self) -> usize;

    /// Rows in the backing batches, which may exceed [`Self::num_rows`] under a filter.
    fn backing_rows(&self) -> usize {
        self.num_rows()
    }

    /// Rewind to before the first row.
    fn begin_iteration(&mut self);

    fn has_next(&self) -> bool;

    /// Move to the next row. Returns `false` once the cursor is exhausted.
    fn advance(&mut self) -> bool;

    /// Position on backing row `row`; the next `advance` continues after it.
    fn seek(&mut self, row: usize) -> bool;

    /// Backing row index of the current position.
    fn current_row(&self) -> Option<usize>;

    fn column(&self, attr: usize) -> Option<&'a ColumnBatch>;

    fn value(&self, attr: usize) -> Option<TypedValue<'a>> {
        let row = self.current_row()?;
        self.column(attr)?.value(row)
    }
}

impl<'a, C: ValueAccessor<'a> + ?Sized> ValueAccessor<'a> for &mut C {
    fn num_columns(&self) -> usize {
        (**self).num_columns()
    }

    fn num_rows(&self) -> usize {
        (**self).num_rows()
    }

    fn backing_rows(&self) -> usize {
        (**self).backing_rows()
    }

    fn begin_iteration(&mut self) {
        (**self).begin_iteration()
    }

    fn has_next(&self) -> bool {
        (**self).has_next()
    }

    fn advance(&mut self) -> bool {
        (**self).advance()
    }

    fn seek(&mut self, row: usize) -> bool {
        (**self).seek(row)
    }

    fn current_row(&self) -> Option<usize> {
        (**self).current_row()
    }

    fn column(&self, attr: usize) -> Option<&'a ColumnBatch> {
        (**self).column(attr)
    }
}

/// Cursor over batches that share a row count.
#[derive(Debug, Clone)]
pub struct BatchCursor<'a> {
    columns: &'a [ColumnBatch],
    rows: usize,
    next: usize,
    current: Option<usize>,
}

impl<'a> BatchCursor<'a> {
    pub fn new(columns: &'a [ColumnBatch]) -> ColumnarResult<Self> {
        let rows = columns.first().map(ColumnBatch::len).unwrap_or(0);
        if let Some((column, batch)) = columns
            .iter()
            .enumerate()
            .find(|(_, batch)| batch.len() != rows)
        {
            return Err(ColumnarError::RaggedColumns {
                column,
                expected: rows,
                actual: batch.len(),
            });
        }
        Ok(Self {
            columns,
            rows,
            next: 0,
            current: None,
        })
    }
}

impl<'a> ValueAccessor<'a> for BatchCursor<'a> {
    fn num_columns(&self) -> usize {
        self.columns.len()
    }

    fn num_rows(&self) -> usize {
        self.rows
    }

    fn begin_iteration(&mut self) {
        self.next = 0;
        self.current = None;
    }

    fn has_next(&self) -> bool {
        self.next < self.rows
    }

    fn advance(&mut self) -> bool {
        if self.next < self.rows {
            self.current = Some(self.next);
            self.next += 1;
            true
        } else {
            self.current = None;
            false
        }
    }

    fn seek(&mut self, row: usize) -> bool {
        if row >= self.rows {
            return false;
        }
        self.current = Some(row);
        self.next = row + 1;
        true
    }

    fn current_row(&self) -> Option<usize> {
        self.current
    }

    fn column(&self, attr: usize) -> Option<&'a ColumnBatch> {
        self.columns.get(attr)
    }
}

/// Restricts a cursor to the rows of a [`RowIdSet`], visiting them in ascending order.
///
/// Unselected rows are skipped by seeking; nothing is copied.
#[derive(Debug)]
pub struct RowIdAdapter<C> {
    inner: C,
    rows: Vec<usize>,
    next: usize,
    current: Option<usize>,
}

impl<'a, C: ValueAccessor<'a>> RowIdAdapter<C> {
    pub fn new(inner: C, filter: &RowIdSet) -> ColumnarResult<Self> {
        let len = inner.backing_rows();
        let rows: Vec<usize> = filter.iter().collect();
        if let Some(&row) = rows.iter().find(|row| **row >= len) {
            return Err(ColumnarError::RowIdOutOfBounds { row, len });
        }
        let mut adapter = Self {
            inner,
            rows,
            next: 0,
            current: None,
        };
        adapter.begin_iteration();
        Ok(adapter)
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<'a, C: ValueAccessor<'a>> ValueAccessor<'a> for RowIdAdapter<C> {
    fn num_columns(&self) -> usize {
        self.inner.num_columns()
    }

    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn backing_rows(&self) -> usize {
        self.inner.backing_rows()
    }

    fn begin_iteration(&mut self) {
        self.inner.begin_iteration();
        self.next = 0;
        self.current = None;
    }

    fn has_next(&self) -> bool {
        self.next < self.rows.len()
    }

    fn advance(&mut self) -> bool {
        self.current = self.rows.get(self.next).copied();
        match self.current {
            Some(row) => {
                self.next += 1;
                self.inner.seek(row)
            }
            None => false,
        }
    }

    fn seek(&mut self, row: usize) -> bool {
        match self.rows.binary_search(&row) {
            Ok(idx) => {
                self.next = idx + 1;
                self.current = Some(row);
                self.inner.seek(row)
            }
            Err(_) => false,
        }
    }

    fn current_row(&self) -> Option<usize> {
        self.current
    }

    fn column(&self, attr: usize) -> Option<&'a ColumnBatch> {
        self.inner.column(attr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_types::{TypeDescriptor, TypeId};

    fn columns() -> Vec<ColumnBatch> {
        vec![
            ColumnBatch::from_native(TypeDescriptor::fixed(TypeId::Int, false), vec![10, 20, 30, 40])
                .unwrap(),
            ColumnBatch::from_native(TypeDescriptor::fixed(TypeId::Double, false), vec![0.5, 1.5, 2.5, 3.5])
                .unwrap(),
        ]
    }

    #[test]
    fn cursor_visits_every_row_once() {
        let columns = columns();
        let mut cursor = BatchCursor::new(&columns).unwrap();
        let mut seen = Vec::new();
        while cursor.advance() {
            seen.push((cursor.value(0).unwrap(), cursor.value(1).unwrap()));
        }
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[2], (TypedValue::Int(30), TypedValue::Double(2.5)));
        assert!(!cursor.has_next());
        assert_eq!(cursor.current_row(), None);

        cursor.begin_iteration();
        assert!(cursor.advance());
        assert_eq!(cursor.current_row(), Some(0));
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let mut columns = columns();
        columns.push(
            ColumnBatch::from_native(TypeDescriptor::fixed(TypeId::Int, false), vec![1]).unwrap(),
        );
        assert_eq!(
            BatchCursor::new(&columns).unwrap_err(),
            ColumnarError::RaggedColumns {
                column: 2,
                expected: 4,
                actual: 1
            }
        );
    }

    #[test]
    fn row_id_adapter_skips_unselected_rows() {
        let columns = columns();
        let cursor = BatchCursor::new(&columns).unwrap();
        let filter = RowIdSet::from_row_ids(4, [1, 3]).unwrap();
        let mut filtered = RowIdAdapter::new(cursor, &filter).unwrap();
        assert_eq!(filtered.num_rows(), 2);
        assert_eq!(filtered.current_row(), None);

        let mut rows = Vec::new();
        while filtered.advance() {
            rows.push(filtered.current_row().unwrap());
            assert_eq!(filtered.value(0), columns[0].value(filtered.current_row().unwrap()));
        }
        assert_eq!(rows, vec![1, 3]);
    }

    #[test]
    fn row_id_adapter_checks_bounds() {
        let columns = columns();
        let cursor = BatchCursor::new(&columns).unwrap();
        let filter = RowIdSet::from_row_ids(8, [6]).unwrap();
        assert!(matches!(
            RowIdAdapter::new(cursor, &filter),
            Err(ColumnarError::RowIdOutOfBounds { row: 6, len: 4 })
        ));
    }
}
