//! Interned type descriptors and the per-type value services.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{OnceLock, PoisonError, RwLock};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::dispatch::{invoke_on_numeric_type_id, NumericVisitor};
use crate::error::{TypeError, TypeResult};
use crate::native::{
    Date, Datetime, DatetimeInterval, NumericNative, YearMonthInterval,
};
use crate::value::{until_nul, TypedValue};
use crate::{TypeId, NUM_TYPE_IDS};

/// Canonical description of one scalar type variant.
///
/// Descriptors are interned: every `(type_id, nullable, length)` triple has exactly one
/// `&'static TypeDescriptor` for the life of the process, so two descriptors are the same type iff
/// they are the same reference. Equality on the fields agrees with identity.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    type_id: TypeId,
    nullable: bool,
    length: Option<usize>,
}

type ParameterizedKey = (TypeId, bool, usize);

fn fixed_descriptors() -> &'static [[TypeDescriptor; 2]; NUM_TYPE_IDS] {
    static TABLE: OnceLock<[[TypeDescriptor; 2]; NUM_TYPE_IDS]> = OnceLock::new();
    TABLE.get_or_init(|| {
        std::array::from_fn(|ordinal| {
            let type_id = TypeId::ALL[ordinal];
            [false, true].map(|nullable| TypeDescriptor {
                type_id,
                nullable,
                length: None,
            })
        })
    })
}

fn parameterized_descriptors() -> &'static RwLock<HashMap<ParameterizedKey, &'static TypeDescriptor>> {
    static INTERNED: OnceLock<RwLock<HashMap<ParameterizedKey, &'static TypeDescriptor>>> =
        OnceLock::new();
    INTERNED.get_or_init(|| RwLock::new(HashMap::new()))
}

fn intern_parameterized(type_id: TypeId, nullable: bool, length: usize) -> &'static TypeDescriptor {
    let key = (type_id, nullable, length);
    let table = parameterized_descriptors();
    if let Some(found) = table
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return found;
    }
    let mut guard = table.write().unwrap_or_else(PoisonError::into_inner);
    guard.entry(key).or_insert_with(|| {
        log::trace!("interning descriptor {type_id}({length}) nullable={nullable}");
        Box::leak(Box::new(TypeDescriptor {
            type_id,
            nullable,
            length: Some(length),
        }))
    })
}

/// Look up the canonical descriptor for `(type_id, nullable, length)`.
///
/// Char/VarChar require a length (zero is allowed); every other kind rejects one. The NULL type
/// is nullable by definition, so its descriptor is always the nullable one.
pub fn descriptor_for(
    type_id: TypeId,
    nullable: bool,
    length: Option<usize>,
) -> TypeResult<&'static TypeDescriptor> {
    match (type_id, length) {
        (TypeId::Char | TypeId::VarChar, Some(length)) => {
            Ok(intern_parameterized(type_id, nullable, length))
        }
        (TypeId::Char | TypeId::VarChar, None) => Err(TypeError::MissingLength { type_id }),
        (_, Some(length)) => Err(TypeError::UnexpectedLength { type_id, length }),
        (TypeId::Null, None) => Ok(&fixed_descriptors()[TypeId::Null.ordinal()][1]),
        (_, None) => Ok(&fixed_descriptors()[type_id.ordinal()][usize::from(nullable)]),
    }
}

impl TypeDescriptor {
    /// Descriptor of a non-parameterized kind.
    ///
    /// # Panics
    ///
    /// If `type_id` is Char or VarChar.
    pub fn fixed(type_id: TypeId, nullable: bool) -> &'static TypeDescriptor {
        match descriptor_for(type_id, nullable, None) {
            Ok(descriptor) => descriptor,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn char(length: usize, nullable: bool) -> &'static TypeDescriptor {
        intern_parameterized(TypeId::Char, nullable, length)
    }

    pub fn varchar(length: usize, nullable: bool) -> &'static TypeDescriptor {
        intern_parameterized(TypeId::VarChar, nullable, length)
    }

    pub fn null() -> &'static TypeDescriptor {
        Self::fixed(TypeId::Null, true)
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Byte-length bound of a Char/VarChar descriptor.
    #[inline]
    pub fn length(&self) -> Option<usize> {
        self.length
    }

    pub fn with_nullability(&self, nullable: bool) -> &'static TypeDescriptor {
        match self.length {
            Some(length) => intern_parameterized(self.type_id, nullable, length),
            None if self.type_id == TypeId::Null => Self::null(),
            None => &fixed_descriptors()[self.type_id.ordinal()][usize::from(nullable)],
        }
    }

    pub fn nullable_version(&self) -> &'static TypeDescriptor {
        self.with_nullability(true)
    }

    pub fn non_nullable_version(&self) -> &'static TypeDescriptor {
        self.with_nullability(false)
    }

    /// Storage slot width in bytes: the fixed native width, or the length bound for strings.
    pub fn maximum_byte_length(&self) -> usize {
        self.type_id
            .fixed_byte_width()
            .or(self.length)
            .unwrap_or_default()
    }

    /// `Int`, `VarChar(20)`; nullability is left to `Display`.
    pub fn name(&self) -> String {
        match self.length {
            Some(length) => format!("{}({length})", self.type_id),
            None => self.type_id.name().to_string(),
        }
    }

    pub fn spec(&self) -> TypeSpec {
        TypeSpec {
            type_id: self.type_id,
            nullable: self.nullable,
            length: self.length,
        }
    }

    /// Additive identity for numeric kinds.
    pub fn zero_value(&self) -> Option<TypedValue<'static>> {
        struct Zero;

        impl NumericVisitor for Zero {
            type Output = TypedValue<'static>;

            fn visit<N: NumericNative>(self) -> TypedValue<'static> {
                N::default().into_value()
            }
        }

        self.type_id
            .is_numeric()
            .then(|| invoke_on_numeric_type_id(self.type_id, Zero))
    }

    /// Whether `value` is a legal instance of this descriptor without conversion.
    pub fn admits_value(&self, value: &TypedValue<'_>) -> bool {
        if value.is_null() {
            return self.nullable;
        }
        if value.type_id() != self.type_id {
            return false;
        }
        match (value.logical_bytes(), self.length) {
            (Some(bytes), Some(length)) => bytes.len() <= length,
            _ => true,
        }
    }

    /// Convert `value` into an instance of this type.
    ///
    /// Numeric kinds convert with `as`-style casts (lossy narrowing allowed), strings are
    /// truncated to this type's length, and NULL converts to any nullable type.
    pub fn coerce_value<'a>(&self, value: TypedValue<'a>) -> TypeResult<TypedValue<'a>> {
        if value.is_null() {
            return if self.nullable {
                Ok(TypedValue::Null(self.type_id))
            } else {
                Err(TypeError::NullNotAllowed(self.to_string()))
            };
        }
        let source = value.type_id();
        if source.is_numeric() && self.type_id.is_numeric() {
            return Ok(cast_numeric(&value, self.type_id));
        }
        match (value, self.length) {
            (TypedValue::Char(bytes) | TypedValue::VarChar(bytes), Some(length)) => {
                let keep = until_nul(&bytes).len().min(length);
                let truncated = match bytes {
                    Cow::Borrowed(slice) => Cow::Borrowed(&slice[..keep]),
                    Cow::Owned(mut vec) => {
                        vec.truncate(keep);
                        Cow::Owned(vec)
                    }
                };
                TypedValue::string(self.type_id, truncated).ok_or_else(|| self.not_coercible(source))
            }
            (value, _) if source == self.type_id => Ok(value),
            _ => Err(self.not_coercible(source)),
        }
    }

    fn not_coercible(&self, source: TypeId) -> TypeError {
        TypeError::NotCoercible {
            from: source.to_string(),
            to: self.to_string(),
        }
    }

    /// Parse the textual form produced by [`Self::print_value`].
    pub fn parse_value(&self, text: &str) -> TypeResult<TypedValue<'static>> {
        let parse_error = || TypeError::Parse {
            type_name: self.name(),
            input: text.to_string(),
        };
        let trimmed = text.trim();
        let value = match self.type_id {
            TypeId::Int => TypedValue::Int(trimmed.parse().map_err(|_| parse_error())?),
            TypeId::Long => TypedValue::Long(trimmed.parse().map_err(|_| parse_error())?),
            TypeId::Float => TypedValue::Float(trimmed.parse().map_err(|_| parse_error())?),
            TypeId::Double => TypedValue::Double(trimmed.parse().map_err(|_| parse_error())?),
            TypeId::Date => {
                let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| parse_error())?;
                TypedValue::Date(Date::from_naive(date))
            }
            TypeId::Datetime => {
                let datetime = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
                    .map_err(|_| parse_error())?;
                TypedValue::Datetime(
                    Datetime::from_naive(datetime).ok_or(TypeError::OutOfRange(TypeId::Datetime))?,
                )
            }
            TypeId::DatetimeInterval => TypedValue::DatetimeInterval(DatetimeInterval::from_micros(
                parse_interval(trimmed, day_time_unit).ok_or_else(parse_error)?,
            )),
            TypeId::YearMonthInterval => {
                TypedValue::YearMonthInterval(YearMonthInterval::from_months(
                    parse_interval(trimmed, year_month_unit).ok_or_else(parse_error)?,
                ))
            }
            TypeId::Char | TypeId::VarChar => {
                let length = self.length.unwrap_or_default();
                if text.len() > length {
                    return Err(parse_error());
                }
                let bytes = Cow::Owned(text.as_bytes().to_vec());
                TypedValue::string(self.type_id, bytes).ok_or_else(parse_error)?
            }
            TypeId::Null => return Err(parse_error()),
        };
        Ok(value)
    }

    /// Render `value`, which must be an instance of this type (or NULL if nullable).
    pub fn print_value(&self, value: &TypedValue<'_>) -> TypeResult<String> {
        if !value.is_null() && value.type_id() != self.type_id {
            return Err(TypeError::ValueTypeMismatch {
                expected: self.type_id,
                actual: value.type_id(),
            });
        }
        if value.is_null() && !self.nullable {
            return Err(TypeError::NullNotAllowed(self.to_string()));
        }
        Ok(value.to_string())
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())?;
        if self.nullable && self.type_id != TypeId::Null {
            f.write_str(" NULL")?;
        }
        Ok(())
    }
}

/// Plain `(type_id, nullable, length)` triple used to persist a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeSpec {
    pub type_id: TypeId,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

impl TypeSpec {
    pub fn resolve(&self) -> TypeResult<&'static TypeDescriptor> {
        descriptor_for(self.type_id, self.nullable, self.length)
    }
}

fn cast_numeric(value: &TypedValue<'_>, target: TypeId) -> TypedValue<'static> {
    enum Source {
        Integral(i64),
        Floating(f64),
    }

    struct Cast(Source);

    impl NumericVisitor for Cast {
        type Output = TypedValue<'static>;

        fn visit<N: NumericNative>(self) -> TypedValue<'static> {
            let native = match self.0 {
                Source::Integral(v) => N::from_i64(v),
                Source::Floating(v) => N::from_f64(v),
            };
            native.into_value()
        }
    }

    let source = match value {
        TypedValue::Int(v) => Source::Integral(i64::from(*v)),
        TypedValue::Long(v) => Source::Integral(*v),
        TypedValue::Float(v) => Source::Floating(f64::from(*v)),
        TypedValue::Double(v) => Source::Floating(*v),
        other => return other.clone().into_owned(),
    };
    invoke_on_numeric_type_id(target, Cast(source))
}

fn day_time_unit(unit: &str) -> Option<i64> {
    const SECOND: i64 = 1_000_000;
    Some(match unit {
        "us" | "microsecond" | "microseconds" => 1,
        "ms" | "millisecond" | "milliseconds" => 1_000,
        "s" | "second" | "seconds" => SECOND,
        "minute" | "minutes" => 60 * SECOND,
        "hour" | "hours" => 3_600 * SECOND,
        "day" | "days" => 86_400 * SECOND,
        "week" | "weeks" => 7 * 86_400 * SECOND,
        _ => return None,
    })
}

fn year_month_unit(unit: &str) -> Option<i64> {
    Some(match unit {
        "mon" | "mons" | "month" | "months" => 1,
        "year" | "years" => 12,
        _ => return None,
    })
}

/// Parse `[-]<int> <unit> [<int> <unit> ...] [HH:MM:SS[.ffffff]]` into a count of base units.
///
/// A leading minus negates the whole interval. The clock component is only meaningful for
/// day-time intervals, where the base unit is a microsecond.
fn parse_interval(text: &str, unit_scale: fn(&str) -> Option<i64>) -> Option<i64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let mut tokens = body.split_whitespace().peekable();
    tokens.peek()?;
    let mut total: i64 = 0;
    while let Some(token) = tokens.next() {
        if token.contains(':') {
            unit_scale("s")?;
            total = total.checked_add(parse_clock(token)?)?;
            continue;
        }
        let count: i64 = token.parse().ok()?;
        let scale = unit_scale(&tokens.next()?.to_ascii_lowercase())?;
        total = total.checked_add(count.checked_mul(scale)?)?;
    }
    Some(if negative { total.checked_neg()? } else { total })
}

/// `HH:MM:SS[.ffffff]` as microseconds.
fn parse_clock(token: &str) -> Option<i64> {
    let (clock, fraction) = match token.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (token, None),
    };
    let mut parts = clock.split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    let micros = match fraction {
        Some(digits) if !digits.is_empty() && digits.len() <= 6 => {
            let value: i64 = digits.parse().ok()?;
            value * 10_i64.pow(6 - digits.len() as u32)
        }
        Some(_) => return None,
        None => 0,
    };
    hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1_000_000)?
        .checked_add(micros)
}
