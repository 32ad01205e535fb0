//! Scalar type system for the Quarry query engine.
//!
//! This crate provides:
//! - A closed catalog of scalar kinds ([`TypeId`]) and interned [`TypeDescriptor`]s.
//! - The safe-coercion lattice derived from direct promotion edges ([`coercion`]).
//! - Runtime-tag to monomorphized-code dispatch ([`dispatch`]).
//! - [`TypedValue`] with explicit ownership of out-of-line string bytes.

#![forbid(unsafe_code)]

pub mod coercion;
mod descriptor;
pub mod dispatch;
mod error;
mod literal;
mod native;
mod type_id;
mod value;

pub use crate::coercion::least_common_supertype;
pub use crate::descriptor::{descriptor_for, TypeDescriptor, TypeSpec};
pub use crate::error::{TypeError, TypeResult};
pub use crate::literal::ScalarLiteral;
pub use crate::native::{
    Date, Datetime, DatetimeInterval, FixedWidthBytes, NativeValue, NativeVec, NumericNative,
    YearMonthInterval,
};
pub use crate::type_id::{SuperTypeId, TypeId, NUM_TYPE_IDS, NUMERIC_TYPE_IDS};
pub use crate::value::{until_nul, Ownership, TypedValue};
