use quarry_types::{TypeError, TypeId};
use thiserror::Error;

pub type ColumnarResult<T> = Result<T, ColumnarError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnarError {
    #[error("validity mask has {validity} bits but the column has {values} values")]
    ValidityLength { values: usize, validity: usize },

    #[error("storage of type {actual} cannot back a {expected} column")]
    StorageMismatch { expected: String, actual: String },

    #[error("column of non-nullable type {0} contains NULLs")]
    NullsInNonNullable(String),

    #[error("value of type {actual} cannot be stored in a {expected} column")]
    ValueMismatch { expected: String, actual: String },

    #[error("cursor columns disagree on length: column {column} has {actual} rows, expected {expected}")]
    RaggedColumns {
        column: usize,
        expected: usize,
        actual: usize,
    },

    #[error("row id {row} is out of bounds for {len} rows")]
    RowIdOutOfBounds { row: usize, len: usize },

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl ColumnarError {
    pub(crate) fn storage_mismatch(expected: impl ToString, actual: TypeId) -> Self {
        ColumnarError::StorageMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
