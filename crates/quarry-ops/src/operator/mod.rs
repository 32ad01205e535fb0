//! Bound, type-specialized execution units.
//!
//! Every operator exposes three surfaces that agree row for row: a single value, a dense batch,
//! and a cursor (optionally filtered by a [`RowIdSet`]). Each batch or cursor call returns one
//! freshly allocated output batch, or an error if any row faults.

mod binary;
mod substring;
mod unary;

use std::fmt;
use std::sync::Arc;

use quarry_columnar::{BitVec, ColumnBatch, RowIdAdapter, RowIdSet, ValueAccessor};
use quarry_types::{NativeValue, TypeDescriptor, TypedValue};

use crate::error::{ExecError, ExecResult};

pub(crate) use self::binary::make_binary_operator;
pub(crate) use self::substring::make_substring_operator;
pub(crate) use self::unary::make_unary_operator;

pub trait UncheckedUnaryOperator: Send + Sync {
    fn name(&self) -> &str;

    fn result_type(&self) -> &'static TypeDescriptor;

    fn apply_to_value(&self, value: &TypedValue<'_>) -> ExecResult<TypedValue<'static>>;

    fn apply_to_batch(&self, batch: &ColumnBatch) -> ExecResult<ColumnBatch>;

    /// Evaluate column `column` of every row the cursor visits. The cursor is rewound first.
    fn apply_to_cursor<'a>(
        &self,
        cursor: &mut dyn ValueAccessor<'a>,
        column: usize,
        filter: Option<&RowIdSet>,
    ) -> ExecResult<ColumnBatch>;
}

/// One side of a binary operator applied to batches.
#[derive(Debug, Clone, Copy)]
pub enum BatchOperand<'b> {
    Column(&'b ColumnBatch),
    Static(&'b TypedValue<'b>),
}

/// One side of a binary operator applied to a cursor.
#[derive(Debug, Clone, Copy)]
pub enum CursorOperand<'b> {
    Column(usize),
    Static(&'b TypedValue<'b>),
}

pub trait UncheckedBinaryOperator: Send + Sync {
    fn name(&self) -> &str;

    fn result_type(&self) -> &'static TypeDescriptor;

    fn apply_to_values(
        &self,
        left: &TypedValue<'_>,
        right: &TypedValue<'_>,
    ) -> ExecResult<TypedValue<'static>>;

    /// At least one side must be a column; two columns must have equal length.
    fn apply_to_batches(
        &self,
        left: BatchOperand<'_>,
        right: BatchOperand<'_>,
    ) -> ExecResult<ColumnBatch>;

    fn apply_to_cursor<'a>(
        &self,
        cursor: &mut dyn ValueAccessor<'a>,
        left: CursorOperand<'_>,
        right: CursorOperand<'_>,
        filter: Option<&RowIdSet>,
    ) -> ExecResult<ColumnBatch>;
}

/// A validated operator ready for execution. Cheap to clone and shareable across threads.
#[derive(Clone)]
pub enum UncheckedOperator {
    Unary(Arc<dyn UncheckedUnaryOperator>),
    Binary(Arc<dyn UncheckedBinaryOperator>),
}

impl UncheckedOperator {
    pub fn name(&self) -> &str {
        match self {
            UncheckedOperator::Unary(op) => op.name(),
            UncheckedOperator::Binary(op) => op.name(),
        }
    }

    pub fn result_type(&self) -> &'static TypeDescriptor {
        match self {
            UncheckedOperator::Unary(op) => op.result_type(),
            UncheckedOperator::Binary(op) => op.result_type(),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            UncheckedOperator::Unary(_) => 1,
            UncheckedOperator::Binary(_) => 2,
        }
    }

    pub fn as_unary(&self) -> Option<&dyn UncheckedUnaryOperator> {
        match self {
            UncheckedOperator::Unary(op) => Some(op.as_ref()),
            UncheckedOperator::Binary(_) => None,
        }
    }

    pub fn as_binary(&self) -> Option<&dyn UncheckedBinaryOperator> {
        match self {
            UncheckedOperator::Binary(op) => Some(op.as_ref()),
            UncheckedOperator::Unary(_) => None,
        }
    }

    /// Apply to the input columns of one batch, in operand order.
    pub fn apply_to_columns(&self, columns: &[ColumnBatch]) -> ExecResult<ColumnBatch> {
        match (self, columns) {
            (UncheckedOperator::Unary(op), [input]) => op.apply_to_batch(input),
            (UncheckedOperator::Binary(op), [left, right]) => {
                op.apply_to_batches(BatchOperand::Column(left), BatchOperand::Column(right))
            }
            _ => Err(ExecError::Arity {
                expected: self.arity(),
                actual: columns.len(),
            }),
        }
    }
}

impl fmt::Debug for UncheckedOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UncheckedOperator")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("result_type", &self.result_type().to_string())
            .finish()
    }
}

/// Output accumulator for fixed-width results.
pub(crate) struct NativeOutput<O> {
    values: Vec<O>,
    validity: BitVec,
}

impl<O: NativeValue> NativeOutput<O> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            validity: BitVec::with_capacity_bits(capacity),
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, value: Option<O>) {
        self.validity.push(value.is_some());
        self.values.push(value.unwrap_or_default());
    }

    pub(crate) fn finish(self, result: &'static TypeDescriptor) -> ExecResult<ColumnBatch> {
        Ok(ColumnBatch::try_new(
            result,
            O::into_vec(self.values),
            Some(self.validity),
        )?)
    }
}

/// Visit every row of `cursor` (or only the rows of `filter`), passing the backing row index.
pub(crate) fn for_each_cursor_row<'a>(
    cursor: &mut dyn ValueAccessor<'a>,
    filter: Option<&RowIdSet>,
    mut f: impl FnMut(usize) -> ExecResult<()>,
) -> ExecResult<()> {
    match filter {
        Some(filter) => {
            let mut filtered = RowIdAdapter::new(&mut *cursor, filter)?;
            drive(&mut filtered, &mut f)
        }
        None => drive(cursor, &mut f),
    }
}

fn drive<'a>(
    cursor: &mut dyn ValueAccessor<'a>,
    f: &mut dyn FnMut(usize) -> ExecResult<()>,
) -> ExecResult<()> {
    cursor.begin_iteration();
    while cursor.advance() {
        if let Some(row) = cursor.current_row() {
            f(row)?;
        }
    }
    Ok(())
}

pub(crate) fn cursor_column<'a>(
    cursor: &dyn ValueAccessor<'a>,
    attr: usize,
) -> ExecResult<&'a ColumnBatch> {
    cursor.column(attr).ok_or(ExecError::MissingColumn(attr))
}
