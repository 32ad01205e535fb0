use thiserror::Error;

use crate::TypeId;

pub type TypeResult<T> = Result<T, TypeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("unknown type name: {0}")]
    UnknownTypeName(String),

    #[error("{type_id} requires a length parameter")]
    MissingLength { type_id: TypeId },

    #[error("{type_id} does not take a length parameter (got {length})")]
    UnexpectedLength { type_id: TypeId, length: usize },

    #[error("value of type {actual} does not match {expected}")]
    ValueTypeMismatch { expected: TypeId, actual: TypeId },

    #[error("cannot coerce {from} to {to}")]
    NotCoercible { from: String, to: String },

    #[error("NULL is not a valid value for non-nullable {0}")]
    NullNotAllowed(String),

    #[error("failed to parse {input:?} as {type_name}")]
    Parse { type_name: String, input: String },

    #[error("literal of type {type_id} expects {expected} bytes, got {actual}")]
    LiteralWidth {
        type_id: TypeId,
        expected: usize,
        actual: usize,
    },

    #[error("{0} value is outside the supported calendar range")]
    OutOfRange(TypeId),
}
