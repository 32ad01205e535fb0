#![forbid(unsafe_code)]

//! Operation catalog and type-specialized, null-aware operators.
//!
//! A planner names an operation and supplies operand descriptors plus static literals; the
//! catalog validates the request, reports the result type, and builds an [`UncheckedOperator`]
//! whose row loops are monomorphized for the bound native types and nullability.
//!
//! ```
//! use quarry_ops::OperationCatalog;
//! use quarry_types::{TypeDescriptor, TypeId, TypedValue};
//!
//! let catalog = OperationCatalog::default();
//! let int = TypeDescriptor::fixed(TypeId::Int, false);
//! let double = TypeDescriptor::fixed(TypeId::Double, true);
//!
//! let bound = catalog.bind("+", &[int, double], &[]).unwrap();
//! assert_eq!(bound.result_type, TypeDescriptor::fixed(TypeId::Double, true));
//!
//! let sum = bound
//!     .operator
//!     .as_binary()
//!     .unwrap()
//!     .apply_to_values(&TypedValue::Int(2), &TypedValue::Double(0.5))
//!     .unwrap();
//! assert_eq!(sum, TypedValue::Double(2.5));
//! ```

mod arithmetic;
mod catalog;
mod error;
pub mod functor;
mod math;
mod operation;
mod operator;
mod parallel;
mod substring;

pub use arithmetic::ArithmeticOperation;
pub use catalog::{BoundOperator, CatalogOptions, OperationCatalog};
pub use error::{ExecError, ExecResult, OperationError, OperationResult};
pub use math::MathOperation;
pub use operation::{
    iter_operation_specs, lookup_operation, lookup_operation_id, Operation, OperationId,
    OperationSignature, OperationSpec,
};
pub use operator::{
    BatchOperand, CursorOperand, UncheckedBinaryOperator, UncheckedOperator,
    UncheckedUnaryOperator,
};
pub use parallel::apply_to_batches_parallel;
pub use substring::SubstringOperation;
