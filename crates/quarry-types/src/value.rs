use std::borrow::Cow;
use std::fmt;

use crate::native::{Date, Datetime, DatetimeInterval, YearMonthInterval};
use crate::TypeId;

/// A single scalar value tagged with its kind.
///
/// Fixed-width kinds are stored inline. Char/VarChar payloads live out of line in a [`Cow`], so
/// whether a value owns its bytes or borrows them from a batch is always visible through
/// [`TypedValue::ownership`].
#[derive(Debug, Clone)]
pub enum TypedValue<'a> {
    Null(TypeId),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Date(Date),
    Datetime(Datetime),
    DatetimeInterval(DatetimeInterval),
    YearMonthInterval(YearMonthInterval),
    Char(Cow<'a, [u8]>),
    VarChar(Cow<'a, [u8]>),
}

/// How a [`TypedValue`] holds its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Fixed-width payload (or NULL), nothing out of line.
    Inline,
    /// Out-of-line bytes allocated for this value, released when it drops.
    Owned,
    /// Out-of-line bytes owned elsewhere, typically a column batch.
    Borrowed,
}

impl<'a> TypedValue<'a> {
    pub fn char_borrowed(bytes: &'a [u8]) -> Self {
        TypedValue::Char(Cow::Borrowed(bytes))
    }

    pub fn varchar_borrowed(bytes: &'a [u8]) -> Self {
        TypedValue::VarChar(Cow::Borrowed(bytes))
    }

    pub fn char_owned(bytes: Vec<u8>) -> TypedValue<'static> {
        TypedValue::Char(Cow::Owned(bytes))
    }

    pub fn varchar_owned(bytes: Vec<u8>) -> TypedValue<'static> {
        TypedValue::VarChar(Cow::Owned(bytes))
    }

    /// Build a string value of `type_id` (Char or VarChar) over `bytes`.
    pub fn string(type_id: TypeId, bytes: Cow<'a, [u8]>) -> Option<Self> {
        match type_id {
            TypeId::Char => Some(TypedValue::Char(bytes)),
            TypeId::VarChar => Some(TypedValue::VarChar(bytes)),
            _ => None,
        }
    }

    pub fn type_id(&self) -> TypeId {
        match self {
            TypedValue::Null(type_id) => *type_id,
            TypedValue::Int(_) => TypeId::Int,
            TypedValue::Long(_) => TypeId::Long,
            TypedValue::Float(_) => TypeId::Float,
            TypedValue::Double(_) => TypeId::Double,
            TypedValue::Date(_) => TypeId::Date,
            TypedValue::Datetime(_) => TypeId::Datetime,
            TypedValue::DatetimeInterval(_) => TypeId::DatetimeInterval,
            TypedValue::YearMonthInterval(_) => TypeId::YearMonthInterval,
            TypedValue::Char(_) => TypeId::Char,
            TypedValue::VarChar(_) => TypeId::VarChar,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null(_))
    }

    pub fn ownership(&self) -> Ownership {
        match self {
            TypedValue::Char(Cow::Owned(_)) | TypedValue::VarChar(Cow::Owned(_)) => Ownership::Owned,
            TypedValue::Char(Cow::Borrowed(_)) | TypedValue::VarChar(Cow::Borrowed(_)) => {
                Ownership::Borrowed
            }
            _ => Ownership::Inline,
        }
    }

    /// The raw out-of-line slot, including any NUL padding.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        match self {
            TypedValue::Char(bytes) | TypedValue::VarChar(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// String contents up to (not including) the first NUL, or the whole slot if unterminated.
    pub fn logical_bytes(&self) -> Option<&[u8]> {
        self.raw_bytes().map(until_nul)
    }

    /// Detach from any borrowed storage, copying out-of-line bytes if needed.
    pub fn into_owned(self) -> TypedValue<'static> {
        match self {
            TypedValue::Null(type_id) => TypedValue::Null(type_id),
            TypedValue::Int(v) => TypedValue::Int(v),
            TypedValue::Long(v) => TypedValue::Long(v),
            TypedValue::Float(v) => TypedValue::Float(v),
            TypedValue::Double(v) => TypedValue::Double(v),
            TypedValue::Date(v) => TypedValue::Date(v),
            TypedValue::Datetime(v) => TypedValue::Datetime(v),
            TypedValue::DatetimeInterval(v) => TypedValue::DatetimeInterval(v),
            TypedValue::YearMonthInterval(v) => TypedValue::YearMonthInterval(v),
            TypedValue::Char(bytes) => TypedValue::Char(Cow::Owned(bytes.into_owned())),
            TypedValue::VarChar(bytes) => TypedValue::VarChar(Cow::Owned(bytes.into_owned())),
        }
    }

    /// A value borrowing from `self` without copying out-of-line bytes.
    pub fn reborrow(&self) -> TypedValue<'_> {
        match self {
            TypedValue::Char(bytes) => TypedValue::Char(Cow::Borrowed(bytes)),
            TypedValue::VarChar(bytes) => TypedValue::VarChar(Cow::Borrowed(bytes)),
            TypedValue::Null(type_id) => TypedValue::Null(*type_id),
            TypedValue::Int(v) => TypedValue::Int(*v),
            TypedValue::Long(v) => TypedValue::Long(*v),
            TypedValue::Float(v) => TypedValue::Float(*v),
            TypedValue::Double(v) => TypedValue::Double(*v),
            TypedValue::Date(v) => TypedValue::Date(*v),
            TypedValue::Datetime(v) => TypedValue::Datetime(*v),
            TypedValue::DatetimeInterval(v) => TypedValue::DatetimeInterval(*v),
            TypedValue::YearMonthInterval(v) => TypedValue::YearMonthInterval(*v),
        }
    }
}

/// Strings compare by their logical contents, so a NUL-padded slot equals its trimmed form.
impl PartialEq for TypedValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypedValue::Null(a), TypedValue::Null(b)) => a == b,
            (TypedValue::Int(a), TypedValue::Int(b)) => a == b,
            (TypedValue::Long(a), TypedValue::Long(b)) => a == b,
            (TypedValue::Float(a), TypedValue::Float(b)) => a == b,
            (TypedValue::Double(a), TypedValue::Double(b)) => a == b,
            (TypedValue::Date(a), TypedValue::Date(b)) => a == b,
            (TypedValue::Datetime(a), TypedValue::Datetime(b)) => a == b,
            (TypedValue::DatetimeInterval(a), TypedValue::DatetimeInterval(b)) => a == b,
            (TypedValue::YearMonthInterval(a), TypedValue::YearMonthInterval(b)) => a == b,
            (TypedValue::Char(a), TypedValue::Char(b))
            | (TypedValue::VarChar(a), TypedValue::VarChar(b)) => until_nul(a) == until_nul(b),
            _ => false,
        }
    }
}

impl fmt::Display for TypedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Null(_) => f.write_str("NULL"),
            TypedValue::Int(v) => write!(f, "{v}"),
            TypedValue::Long(v) => write!(f, "{v}"),
            TypedValue::Float(v) => write!(f, "{v}"),
            TypedValue::Double(v) => write!(f, "{v}"),
            TypedValue::Date(v) => write!(f, "{v}"),
            TypedValue::Datetime(v) => write!(f, "{v}"),
            TypedValue::DatetimeInterval(v) => write!(f, "{v}"),
            TypedValue::YearMonthInterval(v) => write!(f, "{v}"),
            TypedValue::Char(bytes) | TypedValue::VarChar(bytes) => {
                f.write_str(&String::from_utf8_lossy(until_nul(bytes)))
            }
        }
    }
}

impl From<i32> for TypedValue<'static> {
    fn from(value: i32) -> Self {
        TypedValue::Int(value)
    }
}

impl From<i64> for TypedValue<'static> {
    fn from(value: i64) -> Self {
        TypedValue::Long(value)
    }
}

impl From<f32> for TypedValue<'static> {
    fn from(value: f32) -> Self {
        TypedValue::Float(value)
    }
}

impl From<f64> for TypedValue<'static> {
    fn from(value: f64) -> Self {
        TypedValue::Double(value)
    }
}

/// Bytes up to the first NUL; the full slice when there is none.
#[inline]
pub fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|b| *b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_is_explicit() {
        let slot = b"abc\0\0".to_vec();
        let borrowed = TypedValue::char_borrowed(&slot);
        assert_eq!(borrowed.ownership(), Ownership::Borrowed);
        assert_eq!(borrowed.logical_bytes(), Some(&b"abc"[..]));

        let owned = borrowed.clone().into_owned();
        assert_eq!(owned.ownership(), Ownership::Owned);
        assert_eq!(owned, borrowed);
        assert_eq!(owned.reborrow().ownership(), Ownership::Borrowed);

        assert_eq!(TypedValue::Int(1).ownership(), Ownership::Inline);
        assert_eq!(TypedValue::Null(TypeId::VarChar).ownership(), Ownership::Inline);
    }

    #[test]
    fn strings_compare_by_logical_contents() {
        assert_eq!(
            TypedValue::char_owned(b"hi\0\0".to_vec()),
            TypedValue::char_borrowed(b"hi")
        );
        assert_ne!(TypedValue::char_borrowed(b"hi"), TypedValue::varchar_borrowed(b"hi"));
        assert_ne!(TypedValue::Null(TypeId::Int), TypedValue::Null(TypeId::Long));
    }

    #[test]
    fn display_trims_padding() {
        assert_eq!(TypedValue::varchar_borrowed(b"lo\0\0").to_string(), "lo");
        assert_eq!(TypedValue::Null(TypeId::Int).to_string(), "NULL");
        assert_eq!(TypedValue::from(2.5f64).to_string(), "2.5");
    }
}
