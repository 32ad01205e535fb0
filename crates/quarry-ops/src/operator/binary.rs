use std::sync::Arc;

use quarry_columnar::{ColumnBatch, RowIdSet, ValueAccessor};
use quarry_types::{NativeValue, TypeDescriptor, TypedValue};

use super::{
    cursor_column, for_each_cursor_row, BatchOperand, CursorOperand, NativeOutput,
    UncheckedBinaryOperator,
};
use crate::error::{ExecError, ExecResult};
use crate::functor::BinaryFunctor;

/// Applies `F` row by row; each side's nullability is baked in separately.
pub(crate) struct BinaryFunctorOperator<F, const LEFT_NULLABLE: bool, const RIGHT_NULLABLE: bool> {
    functor: F,
    result: &'static TypeDescriptor,
}

pub(crate) fn make_binary_operator<F: BinaryFunctor>(
    functor: F,
    left_nullable: bool,
    right_nullable: bool,
    result: &'static TypeDescriptor,
) -> Arc<dyn UncheckedBinaryOperator> {
    match (left_nullable, right_nullable) {
        (true, true) => Arc::new(BinaryFunctorOperator::<F, true, true> { functor, result }),
        (true, false) => Arc::new(BinaryFunctorOperator::<F, true, false> { functor, result }),
        (false, true) => Arc::new(BinaryFunctorOperator::<F, false, true> { functor, result }),
        (false, false) => Arc::new(BinaryFunctorOperator::<F, false, false> { functor, result }),
    }
}

/// One operand resolved to natives before the row loop.
enum NativeSide<'b, N> {
    Column {
        batch: &'b ColumnBatch,
        values: &'b [N],
        check_nulls: bool,
    },
    /// `None` is a static NULL.
    Static(Option<N>),
}

impl<'b, N: NativeValue> NativeSide<'b, N> {
    fn column(batch: &'b ColumnBatch, check_nulls: bool) -> ExecResult<Self> {
        let values = batch
            .native::<N>()
            .ok_or_else(|| ExecError::type_mismatch(N::TYPE_ID, batch.type_id()))?;
        Ok(NativeSide::Column {
            batch,
            values,
            check_nulls,
        })
    }

    fn constant(value: &TypedValue<'_>, nullable: bool) -> ExecResult<Self> {
        if nullable && value.is_null() {
            return Ok(NativeSide::Static(None));
        }
        N::from_value(value)
            .map(|native| NativeSide::Static(Some(native)))
            .ok_or_else(|| ExecError::type_mismatch(N::TYPE_ID, value.type_id()))
    }

    fn from_batch_operand(operand: BatchOperand<'b>, nullable: bool) -> ExecResult<Self> {
        match operand {
            BatchOperand::Column(batch) => Self::column(batch, nullable),
            BatchOperand::Static(value) => Self::constant(value, nullable),
        }
    }

    fn len(&self) -> Option<usize> {
        match self {
            NativeSide::Column { values, .. } => Some(values.len()),
            NativeSide::Static(_) => None,
        }
    }

    #[inline]
    fn get(&self, row: usize) -> Option<N> {
        match self {
            NativeSide::Column {
                batch,
                values,
                check_nulls,
            } => {
                if *check_nulls && batch.is_null(row) {
                    None
                } else {
                    Some(values[row])
                }
            }
            NativeSide::Static(value) => *value,
        }
    }
}

fn cursor_side<'a, 'b, N: NativeValue>(
    cursor: &dyn ValueAccessor<'a>,
    operand: CursorOperand<'b>,
    nullable: bool,
) -> ExecResult<NativeSide<'a, N>> {
    match operand {
        CursorOperand::Column(attr) => NativeSide::column(cursor_column(cursor, attr)?, nullable),
        CursorOperand::Static(value) => NativeSide::constant(value, nullable),
    }
}

impl<F, const LEFT_NULLABLE: bool, const RIGHT_NULLABLE: bool>
    BinaryFunctorOperator<F, LEFT_NULLABLE, RIGHT_NULLABLE>
where
    F: BinaryFunctor,
{
    #[inline]
    fn apply_row(
        &self,
        left: &NativeSide<'_, F::Left>,
        right: &NativeSide<'_, F::Right>,
        row: usize,
    ) -> ExecResult<Option<F::Output>> {
        match (left.get(row), right.get(row)) {
            (Some(l), Some(r)) => self.functor.apply(l, r).map(Some),
            _ => Ok(None),
        }
    }
}

impl<F, const LEFT_NULLABLE: bool, const RIGHT_NULLABLE: bool> UncheckedBinaryOperator
    for BinaryFunctorOperator<F, LEFT_NULLABLE, RIGHT_NULLABLE>
where
    F: BinaryFunctor,
{
    fn name(&self) -> &str {
        self.functor.name()
    }

    fn result_type(&self) -> &'static TypeDescriptor {
        self.result
    }

    fn apply_to_values(
        &self,
        left: &TypedValue<'_>,
        right: &TypedValue<'_>,
    ) -> ExecResult<TypedValue<'static>> {
        if (LEFT_NULLABLE && left.is_null()) || (RIGHT_NULLABLE && right.is_null()) {
            return Ok(TypedValue::Null(self.result.type_id()));
        }
        let l = F::Left::from_value(left)
            .ok_or_else(|| ExecError::type_mismatch(F::Left::TYPE_ID, left.type_id()))?;
        let r = F::Right::from_value(right)
            .ok_or_else(|| ExecError::type_mismatch(F::Right::TYPE_ID, right.type_id()))?;
        Ok(self.functor.apply(l, r)?.into_value())
    }

    fn apply_to_batches(
        &self,
        left: BatchOperand<'_>,
        right: BatchOperand<'_>,
    ) -> ExecResult<ColumnBatch> {
        let left = NativeSide::<F::Left>::from_batch_operand(left, LEFT_NULLABLE)?;
        let right = NativeSide::<F::Right>::from_batch_operand(right, RIGHT_NULLABLE)?;
        let len = match (left.len(), right.len()) {
            (Some(l), Some(r)) if l != r => {
                return Err(ExecError::LengthMismatch { left: l, right: r })
            }
            (Some(len), _) | (None, Some(len)) => len,
            (None, None) => return Err(ExecError::NoColumnOperand),
        };

        let mut out = NativeOutput::with_capacity(len);
        for row in 0..len {
            out.push(self.apply_row(&left, &right, row)?);
        }
        out.finish(self.result)
    }

    fn apply_to_cursor<'a>(
        &self,
        cursor: &mut dyn ValueAccessor<'a>,
        left: CursorOperand<'_>,
        right: CursorOperand<'_>,
        filter: Option<&RowIdSet>,
    ) -> ExecResult<ColumnBatch> {
        if matches!(
            (left, right),
            (CursorOperand::Static(_), CursorOperand::Static(_))
        ) {
            return Err(ExecError::NoColumnOperand);
        }
        let left = cursor_side::<F::Left>(cursor, left, LEFT_NULLABLE)?;
        let right = cursor_side::<F::Right>(cursor, right, RIGHT_NULLABLE)?;

        let mut out = NativeOutput::with_capacity(cursor.num_rows());
        for_each_cursor_row(cursor, filter, |row| {
            out.push(self.apply_row(&left, &right, row)?);
            Ok(())
        })?;
        out.finish(self.result)
    }
}
