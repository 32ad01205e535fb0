use quarry_columnar::ColumnarError;
use quarry_types::{TypeError, TypeId};
use thiserror::Error;

pub type OperationResult<T> = Result<T, OperationError>;
pub type ExecResult<T> = Result<T, ExecError>;

/// Failures while validating or binding an operation, before any row is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("{operation} has no signature accepting ({arguments})")]
    NoMatchingSignature {
        operation: &'static str,
        arguments: String,
    },

    /// The request is well-typed but a static argument is unacceptable.
    #[error("{operation}: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },

    /// Binding was attempted on inputs that validation rejects.
    #[error("{operation} invoked on inputs it cannot apply to: {message}")]
    Contract {
        operation: &'static str,
        message: String,
    },

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl OperationError {
    /// The human-readable reason, without the operation prefix.
    pub fn message(&self) -> String {
        match self {
            OperationError::Rejected { message, .. } | OperationError::Contract { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Failures while applying a bound operator. A failing row aborts the whole call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("division by zero in {operation}")]
    DivisionByZero { operation: &'static str },

    #[error("{operation} produced a {type_id} outside the supported range")]
    OutOfRange {
        operation: &'static str,
        type_id: TypeId,
    },

    #[error("operand of type {actual} reached an operator expecting {expected}")]
    TypeMismatch { expected: String, actual: String },

    #[error("operand batches disagree on length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("cursor has no column {0}")]
    MissingColumn(usize),

    #[error("at least one operand must be a column")]
    NoColumnOperand,

    #[error("operator takes {expected} input columns, got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error(transparent)]
    Columnar(#[from] ColumnarError),
}

impl ExecError {
    pub(crate) fn type_mismatch(expected: impl ToString, actual: TypeId) -> Self {
        ExecError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
