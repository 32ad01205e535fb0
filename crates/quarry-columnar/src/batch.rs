use std::borrow::Cow;

use quarry_types::{
    FixedWidthBytes, NativeValue, NativeVec, TypeDescriptor, TypeId, TypedValue,
};

use crate::bitmap::BitVec;
use crate::error::{ColumnarError, ColumnarResult};

/// A fixed-length run of values of one type with an optional validity mask.
///
/// A set validity bit means the row holds a value. Without a mask every row is valid, except in
/// a NULL-typed column where every row is NULL.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnBatch {
    descriptor: &'static TypeDescriptor,
    data: NativeVec,
    validity: Option<BitVec>,
}

impl ColumnBatch {
    pub fn try_new(
        descriptor: &'static TypeDescriptor,
        data: NativeVec,
        validity: Option<BitVec>,
    ) -> ColumnarResult<Self> {
        if !storage_matches(descriptor, &data) {
            let actual = data.fixed_type_id().unwrap_or(TypeId::VarChar);
            return Err(ColumnarError::storage_mismatch(descriptor, actual));
        }
        if let Some(validity) = &validity {
            if validity.len() != data.len() {
                return Err(ColumnarError::ValidityLength {
                    values: data.len(),
                    validity: validity.len(),
                });
            }
            if !descriptor.is_nullable() && !validity.all_true() {
                return Err(ColumnarError::NullsInNonNullable(descriptor.to_string()));
            }
        }
        let validity = validity.filter(|mask| !mask.all_true());
        Ok(Self {
            descriptor,
            data,
            validity,
        })
    }

    /// A batch without NULLs over already-materialized natives.
    pub fn from_native<N: NativeValue>(
        descriptor: &'static TypeDescriptor,
        values: Vec<N>,
    ) -> ColumnarResult<Self> {
        Self::try_new(descriptor, N::into_vec(values), None)
    }

    pub fn from_values(
        descriptor: &'static TypeDescriptor,
        values: &[TypedValue<'_>],
    ) -> ColumnarResult<Self> {
        let mut builder = ColumnBatchBuilder::new(descriptor, values.len());
        for value in values {
            builder.push(value)?;
        }
        Ok(builder.finish())
    }

    #[inline]
    pub fn descriptor(&self) -> &'static TypeDescriptor {
        self.descriptor
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.descriptor.type_id()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &NativeVec {
        &self.data
    }

    pub fn validity(&self) -> Option<&BitVec> {
        self.validity.as_ref()
    }

    pub fn native<N: NativeValue>(&self) -> Option<&[N]> {
        N::slice(&self.data)
    }

    pub fn bytes(&self) -> Option<&FixedWidthBytes> {
        self.data.bytes()
    }

    #[inline]
    pub fn is_null(&self, row: usize) -> bool {
        if self.type_id() == TypeId::Null {
            return true;
        }
        match &self.validity {
            Some(mask) => !mask.get(row),
            None => false,
        }
    }

    pub fn null_count(&self) -> usize {
        if self.type_id() == TypeId::Null {
            return self.len();
        }
        self.validity
            .as_ref()
            .map(|mask| mask.len() - mask.count_ones())
            .unwrap_or(0)
    }

    /// The value at `row`; string payloads borrow from the batch.
    pub fn value(&self, row: usize) -> Option<TypedValue<'_>> {
        if row >= self.len() {
            return None;
        }
        if self.is_null(row) {
            return Some(TypedValue::Null(self.type_id()));
        }
        let value = match &self.data {
            NativeVec::Int(v) => TypedValue::Int(v[row]),
            NativeVec::Long(v) => TypedValue::Long(v[row]),
            NativeVec::Float(v) => TypedValue::Float(v[row]),
            NativeVec::Double(v) => TypedValue::Double(v[row]),
            NativeVec::Date(v) => TypedValue::Date(v[row]),
            NativeVec::Datetime(v) => TypedValue::Datetime(v[row]),
            NativeVec::DatetimeInterval(v) => TypedValue::DatetimeInterval(v[row]),
            NativeVec::YearMonthInterval(v) => TypedValue::YearMonthInterval(v[row]),
            NativeVec::Bytes(bytes) => {
                TypedValue::string(self.type_id(), Cow::Borrowed(bytes.get(row)?))?
            }
            NativeVec::Null(_) => TypedValue::Null(TypeId::Null),
        };
        Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = TypedValue<'_>> + '_ {
        (0..self.len()).filter_map(move |row| self.value(row))
    }
}

fn storage_matches(descriptor: &TypeDescriptor, data: &NativeVec) -> bool {
    match data {
        NativeVec::Bytes(bytes) => descriptor.length() == Some(bytes.width()),
        other => other.fixed_type_id() == Some(descriptor.type_id()),
    }
}

/// Row-at-a-time construction of a [`ColumnBatch`].
#[derive(Debug)]
pub struct ColumnBatchBuilder {
    descriptor: &'static TypeDescriptor,
    data: NativeVec,
    validity: BitVec,
}

impl ColumnBatchBuilder {
    pub fn new(descriptor: &'static TypeDescriptor, capacity: usize) -> Self {
        Self {
            descriptor,
            data: NativeVec::with_capacity(
                descriptor.type_id(),
                descriptor.maximum_byte_length(),
                capacity,
            ),
            validity: BitVec::with_capacity_bits(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn push_null(&mut self) -> ColumnarResult<()> {
        if !self.descriptor.is_nullable() {
            return Err(ColumnarError::NullsInNonNullable(self.descriptor.to_string()));
        }
        self.data.push_default();
        self.validity.push(false);
        Ok(())
    }

    pub fn push(&mut self, value: &TypedValue<'_>) -> ColumnarResult<()> {
        if value.is_null() {
            return self.push_null();
        }
        if !self.descriptor.admits_value(value) || !self.data.push_value(value) {
            return Err(ColumnarError::ValueMismatch {
                expected: self.descriptor.to_string(),
                actual: value.type_id().to_string(),
            });
        }
        self.validity.push(true);
        Ok(())
    }

    pub fn finish(self) -> ColumnBatch {
        let validity = (!self.validity.all_true()).then_some(self.validity);
        ColumnBatch {
            descriptor: self.descriptor,
            data: self.data,
            validity,
        }
    }
}
