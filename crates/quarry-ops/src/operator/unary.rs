use std::sync::Arc;

use quarry_columnar::{ColumnBatch, RowIdSet, ValueAccessor};
use quarry_types::{NativeValue, TypeDescriptor, TypedValue};

use super::{cursor_column, for_each_cursor_row, NativeOutput, UncheckedUnaryOperator};
use crate::error::{ExecError, ExecResult};
use crate::functor::UnaryFunctor;

/// Applies `F` row by row. With `INPUT_NULLABLE` a NULL input yields NULL without calling the
/// functor; without it the validity mask is never consulted.
pub(crate) struct UnaryFunctorOperator<F, const INPUT_NULLABLE: bool> {
    functor: F,
    result: &'static TypeDescriptor,
}

pub(crate) fn make_unary_operator<F: UnaryFunctor>(
    functor: F,
    input_nullable: bool,
    result: &'static TypeDescriptor,
) -> Arc<dyn UncheckedUnaryOperator> {
    if input_nullable {
        Arc::new(UnaryFunctorOperator::<F, true> { functor, result })
    } else {
        Arc::new(UnaryFunctorOperator::<F, false> { functor, result })
    }
}

impl<F: UnaryFunctor, const INPUT_NULLABLE: bool> UnaryFunctorOperator<F, INPUT_NULLABLE> {
    fn input_slice<'b>(&self, batch: &'b ColumnBatch) -> ExecResult<&'b [F::Input]> {
        batch
            .native::<F::Input>()
            .ok_or_else(|| ExecError::type_mismatch(F::Input::TYPE_ID, batch.type_id()))
    }

    #[inline]
    fn apply_row(&self, batch: &ColumnBatch, values: &[F::Input], row: usize) -> ExecResult<Option<F::Output>> {
        if INPUT_NULLABLE && batch.is_null(row) {
            return Ok(None);
        }
        self.functor.apply(values[row]).map(Some)
    }
}

impl<F: UnaryFunctor, const INPUT_NULLABLE: bool> UncheckedUnaryOperator
    for UnaryFunctorOperator<F, INPUT_NULLABLE>
{
    fn name(&self) -> &str {
        self.functor.name()
    }

    fn result_type(&self) -> &'static TypeDescriptor {
        self.result
    }

    fn apply_to_value(&self, value: &TypedValue<'_>) -> ExecResult<TypedValue<'static>> {
        if INPUT_NULLABLE && value.is_null() {
            return Ok(TypedValue::Null(self.result.type_id()));
        }
        let input = F::Input::from_value(value)
            .ok_or_else(|| ExecError::type_mismatch(F::Input::TYPE_ID, value.type_id()))?;
        Ok(self.functor.apply(input)?.into_value())
    }

    fn apply_to_batch(&self, batch: &ColumnBatch) -> ExecResult<ColumnBatch> {
        let values = self.input_slice(batch)?;
        let mut out = NativeOutput::with_capacity(batch.len());
        for row in 0..batch.len() {
            out.push(self.apply_row(batch, values, row)?);
        }
        out.finish(self.result)
    }

    fn apply_to_cursor<'a>(
        &self,
        cursor: &mut dyn ValueAccessor<'a>,
        column: usize,
        filter: Option<&RowIdSet>,
    ) -> ExecResult<ColumnBatch> {
        let batch = cursor_column(cursor, column)?;
        let values = self.input_slice(batch)?;
        let mut out = NativeOutput::with_capacity(cursor.num_rows());
        for_each_cursor_row(cursor, filter, |row| {
            out.push(self.apply_row(batch, values, row)?);
            Ok(())
        })?;
        out.finish(self.result)
    }
}
