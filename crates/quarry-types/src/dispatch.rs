//! Runtime [`TypeId`] → statically specialized code path.
//!
//! Each entry point is a total `match` over the closed tag set that calls a generic visitor
//! method, so the visitor body is monomorphized once per kind. A selector restricts which tags a
//! call site accepts; a tag outside the selector means upstream validation was skipped and the
//! call panics.

use crate::native::{
    Date, Datetime, DatetimeInterval, NativeValue, NumericNative, YearMonthInterval,
};
use crate::TypeId;

/// Compile-time marker for one scalar kind.
pub trait ScalarType: 'static {
    const TYPE_ID: TypeId;
    const PARAMETERIZED: bool;
}

pub struct IntType;
pub struct LongType;
pub struct FloatType;
pub struct DoubleType;
pub struct DateType;
pub struct DatetimeType;
pub struct DatetimeIntervalType;
pub struct YearMonthIntervalType;
pub struct CharType;
pub struct VarCharType;
pub struct NullType;

impl ScalarType for IntType {
    const TYPE_ID: TypeId = TypeId::Int;
    const PARAMETERIZED: bool = false;
}
impl ScalarType for LongType {
    const TYPE_ID: TypeId = TypeId::Long;
    const PARAMETERIZED: bool = false;
}
impl ScalarType for FloatType {
    const TYPE_ID: TypeId = TypeId::Float;
    const PARAMETERIZED: bool = false;
}
impl ScalarType for DoubleType {
    const TYPE_ID: TypeId = TypeId::Double;
    const PARAMETERIZED: bool = false;
}
impl ScalarType for DateType {
    const TYPE_ID: TypeId = TypeId::Date;
    const PARAMETERIZED: bool = false;
}
impl ScalarType for DatetimeType {
    const TYPE_ID: TypeId = TypeId::Datetime;
    const PARAMETERIZED: bool = false;
}
impl ScalarType for DatetimeIntervalType {
    const TYPE_ID: TypeId = TypeId::DatetimeInterval;
    const PARAMETERIZED: bool = false;
}
impl ScalarType for YearMonthIntervalType {
    const TYPE_ID: TypeId = TypeId::YearMonthInterval;
    const PARAMETERIZED: bool = false;
}
impl ScalarType for CharType {
    const TYPE_ID: TypeId = TypeId::Char;
    const PARAMETERIZED: bool = true;
}
impl ScalarType for VarCharType {
    const TYPE_ID: TypeId = TypeId::VarChar;
    const PARAMETERIZED: bool = true;
}
impl ScalarType for NullType {
    const TYPE_ID: TypeId = TypeId::Null;
    const PARAMETERIZED: bool = false;
}

/// Code specialized per scalar kind.
pub trait TypeVisitor {
    type Output;

    fn visit<T: ScalarType>(self) -> Self::Output;
}

/// Code specialized per numeric native (`i32`, `i64`, `f32`, `f64`).
pub trait NumericVisitor {
    type Output;

    fn visit<N: NumericNative>(self) -> Self::Output;
}

/// Code specialized per fixed-width native.
pub trait NativeVisitor {
    type Output;

    fn visit<N: NativeValue>(self) -> Self::Output;
}

/// Which tags a dispatch site accepts.
pub trait TypeSelector {
    fn admits(&self, type_id: TypeId) -> bool;

    fn describe(&self) -> &'static str;
}

pub struct AllTypes;

pub struct ParameterizedOnly;

pub struct NonParameterizedOnly;

/// Admits only the listed tags.
pub struct AllowList(pub &'static [TypeId]);

impl TypeSelector for AllTypes {
    fn admits(&self, _type_id: TypeId) -> bool {
        true
    }

    fn describe(&self) -> &'static str {
        "all-types"
    }
}

impl TypeSelector for ParameterizedOnly {
    fn admits(&self, type_id: TypeId) -> bool {
        matches!(type_id, TypeId::Char | TypeId::VarChar)
    }

    fn describe(&self) -> &'static str {
        "parameterized-only"
    }
}

impl TypeSelector for NonParameterizedOnly {
    fn admits(&self, type_id: TypeId) -> bool {
        !matches!(type_id, TypeId::Char | TypeId::VarChar)
    }

    fn describe(&self) -> &'static str {
        "non-parameterized-only"
    }
}

impl TypeSelector for AllowList {
    fn admits(&self, type_id: TypeId) -> bool {
        self.0.contains(&type_id)
    }

    fn describe(&self) -> &'static str {
        "allow-list"
    }
}

#[cold]
#[inline(never)]
fn excluded_tag(site: &str, type_id: TypeId) -> ! {
    panic!("type dispatch reached {type_id}, which the {site} selector excludes")
}

/// Run `visitor` specialized for `type_id`.
///
/// # Panics
///
/// If `selector` does not admit `type_id`.
pub fn invoke_on_type_id<S, V>(selector: &S, type_id: TypeId, visitor: V) -> V::Output
where
    S: TypeSelector + ?Sized,
    V: TypeVisitor,
{
    if !selector.admits(type_id) {
        excluded_tag(selector.describe(), type_id);
    }
    match type_id {
        TypeId::Int => visitor.visit::<IntType>(),
        TypeId::Long => visitor.visit::<LongType>(),
        TypeId::Float => visitor.visit::<FloatType>(),
        TypeId::Double => visitor.visit::<DoubleType>(),
        TypeId::Date => visitor.visit::<DateType>(),
        TypeId::Datetime => visitor.visit::<DatetimeType>(),
        TypeId::DatetimeInterval => visitor.visit::<DatetimeIntervalType>(),
        TypeId::YearMonthInterval => visitor.visit::<YearMonthIntervalType>(),
        TypeId::Char => visitor.visit::<CharType>(),
        TypeId::VarChar => visitor.visit::<VarCharType>(),
        TypeId::Null => visitor.visit::<NullType>(),
    }
}

/// Run `visitor` specialized for the native of a numeric `type_id`.
///
/// # Panics
///
/// If `type_id` is not Int, Long, Float or Double.
pub fn invoke_on_numeric_type_id<V: NumericVisitor>(type_id: TypeId, visitor: V) -> V::Output {
    match type_id {
        TypeId::Int => visitor.visit::<i32>(),
        TypeId::Long => visitor.visit::<i64>(),
        TypeId::Float => visitor.visit::<f32>(),
        TypeId::Double => visitor.visit::<f64>(),
        other => excluded_tag("numeric", other),
    }
}

/// Run `visitor` specialized for the native of a fixed-width `type_id`.
///
/// # Panics
///
/// If `type_id` is Char, VarChar or Null.
pub fn invoke_on_native_type_id<V: NativeVisitor>(type_id: TypeId, visitor: V) -> V::Output {
    match type_id {
        TypeId::Int => visitor.visit::<i32>(),
        TypeId::Long => visitor.visit::<i64>(),
        TypeId::Float => visitor.visit::<f32>(),
        TypeId::Double => visitor.visit::<f64>(),
        TypeId::Date => visitor.visit::<Date>(),
        TypeId::Datetime => visitor.visit::<Datetime>(),
        TypeId::DatetimeInterval => visitor.visit::<DatetimeInterval>(),
        TypeId::YearMonthInterval => visitor.visit::<YearMonthInterval>(),
        other => excluded_tag("fixed-width", other),
    }
}
