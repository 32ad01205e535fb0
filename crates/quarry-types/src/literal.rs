use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::dispatch::{invoke_on_native_type_id, NativeVisitor};
use crate::error::{TypeError, TypeResult};
use crate::native::NativeValue;
use crate::value::TypedValue;
use crate::TypeId;

/// A static argument as it crosses the planner boundary: a tag plus raw little-endian native
/// bytes, `None` for NULL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScalarLiteral {
    pub type_id: TypeId,
    pub bytes: Option<Vec<u8>>,
}

impl ScalarLiteral {
    pub fn null(type_id: TypeId) -> Self {
        Self {
            type_id,
            bytes: None,
        }
    }

    pub fn int(value: i32) -> Self {
        Self::from_value(&TypedValue::Int(value))
    }

    pub fn long(value: i64) -> Self {
        Self::from_value(&TypedValue::Long(value))
    }

    pub fn from_value(value: &TypedValue<'_>) -> Self {
        let bytes = match value {
            TypedValue::Null(_) => None,
            TypedValue::Char(bytes) | TypedValue::VarChar(bytes) => Some(bytes.to_vec()),
            TypedValue::Int(v) => Some(le_bytes(*v)),
            TypedValue::Long(v) => Some(le_bytes(*v)),
            TypedValue::Float(v) => Some(le_bytes(*v)),
            TypedValue::Double(v) => Some(le_bytes(*v)),
            TypedValue::Date(v) => Some(le_bytes(*v)),
            TypedValue::Datetime(v) => Some(le_bytes(*v)),
            TypedValue::DatetimeInterval(v) => Some(le_bytes(*v)),
            TypedValue::YearMonthInterval(v) => Some(le_bytes(*v)),
        };
        Self {
            type_id: value.type_id(),
            bytes,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.bytes.is_none()
    }

    /// Decode the literal. String payloads are borrowed from `self`.
    pub fn to_value(&self) -> TypeResult<TypedValue<'_>> {
        struct Decode<'b>(&'b [u8]);

        impl NativeVisitor for Decode<'_> {
            type Output = TypeResult<TypedValue<'static>>;

            fn visit<N: NativeValue>(self) -> Self::Output {
                N::read_le(self.0)
                    .map(N::into_value)
                    .ok_or(TypeError::LiteralWidth {
                        type_id: N::TYPE_ID,
                        expected: N::TYPE_ID.fixed_byte_width().unwrap_or_default(),
                        actual: self.0.len(),
                    })
            }
        }

        let Some(bytes) = self.bytes.as_deref() else {
            return Ok(TypedValue::Null(self.type_id));
        };
        match self.type_id {
            TypeId::Char => Ok(TypedValue::Char(Cow::Borrowed(bytes))),
            TypeId::VarChar => Ok(TypedValue::VarChar(Cow::Borrowed(bytes))),
            TypeId::Null => Err(TypeError::LiteralWidth {
                type_id: TypeId::Null,
                expected: 0,
                actual: bytes.len(),
            }),
            fixed => invoke_on_native_type_id(fixed, Decode(bytes)),
        }
    }
}

fn le_bytes<N: NativeValue>(value: N) -> Vec<u8> {
    let mut out = Vec::with_capacity(8);
    value.write_le(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::Date;

    #[test]
    fn literals_decode_to_the_encoded_value() {
        let values = [
            TypedValue::Int(-5),
            TypedValue::Double(0.25),
            TypedValue::Date(Date::from_days_since_epoch(19_000)),
            TypedValue::varchar_borrowed(b"abc"),
            TypedValue::Null(TypeId::Long),
        ];
        for value in values {
            let literal = ScalarLiteral::from_value(&value);
            assert_eq!(literal.to_value().unwrap(), value);
        }
    }

    #[test]
    fn string_literals_decode_without_copying() {
        let literal = ScalarLiteral::from_value(&TypedValue::char_borrowed(b"xy"));
        assert_eq!(
            literal.to_value().unwrap().ownership(),
            crate::Ownership::Borrowed
        );
    }

    #[test]
    fn malformed_widths_are_rejected() {
        let literal = ScalarLiteral {
            type_id: TypeId::Long,
            bytes: Some(vec![1, 2, 3]),
        };
        assert_eq!(
            literal.to_value(),
            Err(TypeError::LiteralWidth {
                type_id: TypeId::Long,
                expected: 8,
                actual: 3
            })
        );
    }

    #[test]
    fn literals_persist_as_json() {
        let literal = ScalarLiteral::long(7);
        let json = serde_json::to_string(&literal).unwrap();
        let back: ScalarLiteral = serde_json::from_str(&json).unwrap();
        assert_eq!(back, literal);
        assert_eq!(back.to_value().unwrap(), TypedValue::Long(7));
    }
}
