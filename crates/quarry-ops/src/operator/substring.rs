use std::borrow::Cow;
use std::sync::Arc;

use quarry_columnar::{BitVec, ColumnBatch, ColumnarError, RowIdSet, ValueAccessor};
use quarry_types::{until_nul, FixedWidthBytes, NativeVec, TypeDescriptor, TypedValue};

use super::{cursor_column, for_each_cursor_row, UncheckedUnaryOperator};
use crate::error::{ExecError, ExecResult};

/// Copies a fixed window out of each input string.
///
/// The window is resolved once at bind time: `start` is a 0-based byte offset and every output
/// slot is exactly `result.length()` bytes, NUL-padded when the substring is shorter. Reads
/// never look past `max_input_length` bytes of the input slot.
pub(crate) struct SubstringOperator<const INPUT_NULLABLE: bool> {
    start: usize,
    max_input_length: usize,
    result: &'static TypeDescriptor,
}

pub(crate) fn make_substring_operator(
    start: usize,
    input: &'static TypeDescriptor,
    result: &'static TypeDescriptor,
) -> Arc<dyn UncheckedUnaryOperator> {
    let max_input_length = input.maximum_byte_length();
    if input.is_nullable() {
        Arc::new(SubstringOperator::<true> {
            start,
            max_input_length,
            result,
        })
    } else {
        Arc::new(SubstringOperator::<false> {
            start,
            max_input_length,
            result,
        })
    }
}

impl<const INPUT_NULLABLE: bool> SubstringOperator<INPUT_NULLABLE> {
    fn output_width(&self) -> usize {
        self.result.maximum_byte_length()
    }

    /// Write the substring of `input` into the zeroed slot `out`.
    #[inline]
    fn compute_substring(&self, input: &[u8], out: &mut [u8]) {
        let bounded = &input[..input.len().min(self.max_input_length)];
        let string_length = until_nul(bounded).len();
        if self.start >= string_length {
            return;
        }
        let take = (string_length - self.start).min(out.len());
        out[..take].copy_from_slice(&bounded[self.start..self.start + take]);
    }

    fn input_bytes<'b>(&self, batch: &'b ColumnBatch) -> ExecResult<&'b FixedWidthBytes> {
        batch
            .bytes()
            .ok_or_else(|| ExecError::type_mismatch("Char or VarChar", batch.type_id()))
    }

    fn substring_rows(
        &self,
        batch: &ColumnBatch,
        rows: impl FnOnce(&mut dyn FnMut(usize) -> ExecResult<()>) -> ExecResult<()>,
        capacity: usize,
    ) -> ExecResult<ColumnBatch> {
        let input = self.input_bytes(batch)?;
        let width = self.output_width();
        let mut out = FixedWidthBytes::with_capacity(width, capacity);
        let mut validity = BitVec::with_capacity_bits(capacity);
        let mut slot = vec![0u8; width];
        rows(&mut |row| {
            if INPUT_NULLABLE && batch.is_null(row) {
                out.push_zeroed();
                validity.push(false);
                return Ok(());
            }
            let source = input.get(row).ok_or(ColumnarError::RowIdOutOfBounds {
                row,
                len: input.len(),
            })?;
            slot.fill(0);
            self.compute_substring(source, &mut slot);
            out.push(&slot);
            validity.push(true);
            Ok(())
        })?;
        Ok(ColumnBatch::try_new(
            self.result,
            NativeVec::Bytes(out),
            Some(validity),
        )?)
    }
}

impl<const INPUT_NULLABLE: bool> UncheckedUnaryOperator for SubstringOperator<INPUT_NULLABLE> {
    fn name(&self) -> &str {
        "Substring"
    }

    fn result_type(&self) -> &'static TypeDescriptor {
        self.result
    }

    fn apply_to_value(&self, value: &TypedValue<'_>) -> ExecResult<TypedValue<'static>> {
        if INPUT_NULLABLE && value.is_null() {
            return Ok(TypedValue::Null(self.result.type_id()));
        }
        let input = value
            .raw_bytes()
            .ok_or_else(|| ExecError::type_mismatch("Char or VarChar", value.type_id()))?;
        let mut out = vec![0u8; self.output_width()];
        self.compute_substring(input, &mut out);
        Ok(TypedValue::Char(Cow::Owned(out)))
    }

    fn apply_to_batch(&self, batch: &ColumnBatch) -> ExecResult<ColumnBatch> {
        self.substring_rows(
            batch,
            |f| (0..batch.len()).try_for_each(|row| f(row)),
            batch.len(),
        )
    }

    fn apply_to_cursor<'a>(
        &self,
        cursor: &mut dyn ValueAccessor<'a>,
        column: usize,
        filter: Option<&RowIdSet>,
    ) -> ExecResult<ColumnBatch> {
        let batch = cursor_column(cursor, column)?;
        let capacity = cursor.num_rows();
        self.substring_rows(batch, |f| for_each_cursor_row(cursor, filter, f), capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator(start: usize, input_length: usize, output_length: usize) -> SubstringOperator<false> {
        SubstringOperator {
            start,
            max_input_length: input_length,
            result: TypeDescriptor::char(output_length, false),
        }
    }

    #[test]
    fn copies_at_most_the_output_width() {
        let op = operator(0, 5, 3);
        let mut out = vec![0u8; 3];
        op.compute_substring(b"hello", &mut out);
        assert_eq!(out, b"hel");
    }

    #[test]
    fn never_reads_past_the_declared_input_length() {
        // Slot is wider than the declared length and unterminated.
        let op = operator(1, 3, 4);
        let mut out = vec![0u8; 4];
        op.compute_substring(b"abcdefgh", &mut out);
        assert_eq!(out, b"bc\0\0");
    }

    #[test]
    fn start_beyond_the_string_is_empty() {
        let op = operator(7, 10, 3);
        let mut out = vec![0u8; 3];
        op.compute_substring(b"hi\0\0\0\0\0\0\0\0", &mut out);
        assert_eq!(out, b"\0\0\0");
    }
}
