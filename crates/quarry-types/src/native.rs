//! Fixed-width native representations backing each scalar kind.
//!
//! Every fixed-width [`TypeId`] maps to exactly one Rust type implementing [`NativeValue`]
//! (`Int` → `i32`, `Date` → [`Date`], ...). Kernels are written generically over these natives
//! and monomorphized per kind through [`crate::dispatch`].

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::value::TypedValue;
use crate::TypeId;

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;
const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;

/// Calendar date stored as days since 1970-01-01.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Date(i32);

impl Date {
    pub const fn from_days_since_epoch(days: i32) -> Self {
        Self(days)
    }

    pub const fn days_since_epoch(self) -> i32 {
        self.0
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self::from_naive)
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
    }

    /// `None` when the day count falls outside chrono's supported calendar.
    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_num_days_from_ce_opt(self.0.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_naive() {
            Some(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            None => write!(f, "<date {} days>", self.0),
        }
    }
}

/// Timestamp stored as microseconds since 1970-01-01 00:00:00.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Datetime(i64);

impl Datetime {
    pub const fn from_micros_since_epoch(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn micros_since_epoch(self) -> i64 {
        self.0
    }

    pub fn from_naive(datetime: NaiveDateTime) -> Option<Self> {
        let days = i64::from(Date::from_naive(datetime.date()).days_since_epoch());
        let time = datetime.time();
        let micros_of_day = i64::from(time.num_seconds_from_midnight()) * MICROS_PER_SECOND
            + i64::from(time.nanosecond() / 1_000);
        days.checked_mul(MICROS_PER_DAY)?
            .checked_add(micros_of_day)
            .map(Self)
    }

    pub fn to_naive(self) -> Option<NaiveDateTime> {
        let days = i32::try_from(self.0.div_euclid(MICROS_PER_DAY)).ok()?;
        let micros_of_day = self.0.rem_euclid(MICROS_PER_DAY);
        let seconds = u32::try_from(micros_of_day / MICROS_PER_SECOND).ok()?;
        let nanos = u32::try_from((micros_of_day % MICROS_PER_SECOND) * 1_000).ok()?;
        let date = Date::from_days_since_epoch(days).to_naive()?;
        let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos)?;
        Some(NaiveDateTime::new(date, time))
    }
}

impl fmt::Display for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(datetime) = self.to_naive() else {
            return write!(f, "<datetime {} us>", self.0);
        };
        write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S"))?;
        let fraction = self.0.rem_euclid(MICROS_PER_SECOND);
        if fraction != 0 {
            write!(f, ".{fraction:06}")?;
        }
        Ok(())
    }
}

/// Day-time interval stored as a signed microsecond count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatetimeInterval(i64);

impl DatetimeInterval {
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn micros(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DatetimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let total = self.0.unsigned_abs();
        let micros_per_day = MICROS_PER_DAY.unsigned_abs();
        let micros_per_second = MICROS_PER_SECOND.unsigned_abs();
        let days = total / micros_per_day;
        let rem = total % micros_per_day;
        let seconds = rem / micros_per_second;
        let fraction = rem % micros_per_second;
        write!(
            f,
            "{sign}{days} days {:02}:{:02}:{:02}",
            seconds / 3_600,
            (seconds / 60) % 60,
            seconds % 60
        )?;
        if fraction != 0 {
            write!(f, ".{fraction:06}")?;
        }
        Ok(())
    }
}

/// Year-month interval stored as a signed month count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonthInterval(i64);

impl YearMonthInterval {
    pub const fn from_months(months: i64) -> Self {
        Self(months)
    }

    pub const fn months(self) -> i64 {
        self.0
    }
}

impl fmt::Display for YearMonthInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let total = self.0.unsigned_abs();
        let years = total / 12;
        let months = total % 12;
        let year_unit = if years == 1 { "year" } else { "years" };
        let month_unit = if months == 1 { "mon" } else { "mons" };
        match (years, months) {
            (0, m) => write!(f, "{sign}{m} {month_unit}"),
            (y, 0) => write!(f, "{sign}{y} {year_unit}"),
            (y, m) => write!(f, "{sign}{y} {year_unit} {m} {month_unit}"),
        }
    }
}

/// A fixed-width native backing one fixed-width [`TypeId`].
pub trait NativeValue: Copy + Default + fmt::Debug + PartialEq + Send + Sync + 'static {
    const TYPE_ID: TypeId;

    fn from_value(value: &TypedValue<'_>) -> Option<Self>;
    fn into_value(self) -> TypedValue<'static>;

    fn slice(data: &NativeVec) -> Option<&[Self]>;
    fn into_vec(values: Vec<Self>) -> NativeVec;

    /// Little-endian encoding used by persisted literals.
    fn write_le(self, out: &mut Vec<u8>);
    fn read_le(bytes: &[u8]) -> Option<Self>;
}

/// Numeric natives with the arithmetic the default kernels rely on.
///
/// Integer arithmetic wraps; float arithmetic follows IEEE-754. Integer division and remainder
/// by zero are the only operations reported as faults (`None`).
pub trait NumericNative: NativeValue + PartialOrd {
    const IS_INTEGRAL: bool;

    fn to_i64(self) -> i64;
    fn to_f64(self) -> f64;
    fn from_i64(value: i64) -> Self;
    fn from_f64(value: f64) -> Self;

    /// Convert between numeric natives. Widening conversions along the safe-coercion lattice
    /// are exact; anything else is an `as`-style cast.
    #[inline]
    fn cast_from<S: NumericNative>(source: S) -> Self {
        if S::IS_INTEGRAL && Self::IS_INTEGRAL {
            Self::from_i64(source.to_i64())
        } else {
            Self::from_f64(source.to_f64())
        }
    }

    fn add_wrapping(self, rhs: Self) -> Self;
    fn sub_wrapping(self, rhs: Self) -> Self;
    fn mul_wrapping(self, rhs: Self) -> Self;
    fn div_checked(self, rhs: Self) -> Option<Self>;
    fn rem_checked(self, rhs: Self) -> Option<Self>;
    fn neg_wrapping(self) -> Self;
    fn abs_wrapping(self) -> Self;
}

macro_rules! impl_native_value {
    ($native:ty, $variant:ident, $width:expr, |$v:ident| $to_le:expr, |$b:ident| $from_le:expr) => {
        impl NativeValue for $native {
            const TYPE_ID: TypeId = TypeId::$variant;

            #[inline]
            fn from_value(value: &TypedValue<'_>) -> Option<Self> {
                match value {
                    TypedValue::$variant(inner) => Some(*inner),
                    _ => None,
                }
            }

            #[inline]
            fn into_value(self) -> TypedValue<'static> {
                TypedValue::$variant(self)
            }

            #[inline]
            fn slice(data: &NativeVec) -> Option<&[Self]> {
                match data {
                    NativeVec::$variant(values) => Some(values),
                    _ => None,
                }
            }

            #[inline]
            fn into_vec(values: Vec<Self>) -> NativeVec {
                NativeVec::$variant(values)
            }

            fn write_le(self, out: &mut Vec<u8>) {
                let $v = self;
                out.extend_from_slice(&$to_le);
            }

            fn read_le(bytes: &[u8]) -> Option<Self> {
                let $b: [u8; $width] = bytes.try_into().ok()?;
                Some($from_le)
            }
        }
    };
}

impl_native_value!(i32, Int, 4, |v| v.to_le_bytes(), |b| i32::from_le_bytes(b));
impl_native_value!(i64, Long, 8, |v| v.to_le_bytes(), |b| i64::from_le_bytes(b));
impl_native_value!(f32, Float, 4, |v| v.to_le_bytes(), |b| f32::from_le_bytes(b));
impl_native_value!(f64, Double, 8, |v| v.to_le_bytes(), |b| f64::from_le_bytes(b));
impl_native_value!(Date, Date, 4, |v| v.0.to_le_bytes(), |b| Date(i32::from_le_bytes(b)));
impl_native_value!(Datetime, Datetime, 8, |v| v.0.to_le_bytes(), |b| Datetime(
    i64::from_le_bytes(b)
));
impl_native_value!(
    DatetimeInterval,
    DatetimeInterval,
    8,
    |v| v.0.to_le_bytes(),
    |b| DatetimeInterval(i64::from_le_bytes(b))
);
impl_native_value!(
    YearMonthInterval,
    YearMonthInterval,
    8,
    |v| v.0.to_le_bytes(),
    |b| YearMonthInterval(i64::from_le_bytes(b))
);

impl NumericNative for i32 {
    const IS_INTEGRAL: bool = true;

    #[inline]
    fn to_i64(self) -> i64 {
        i64::from(self)
    }
    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
    #[inline]
    fn from_i64(value: i64) -> Self {
        value as i32
    }
    #[inline]
    fn from_f64(value: f64) -> Self {
        value as i32
    }
    #[inline]
    fn add_wrapping(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }
    #[inline]
    fn sub_wrapping(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }
    #[inline]
    fn mul_wrapping(self, rhs: Self) -> Self {
        self.wrapping_mul(rhs)
    }
    #[inline]
    fn div_checked(self, rhs: Self) -> Option<Self> {
        (rhs != 0).then(|| self.wrapping_div(rhs))
    }
    #[inline]
    fn rem_checked(self, rhs: Self) -> Option<Self> {
        (rhs != 0).then(|| self.wrapping_rem(rhs))
    }
    #[inline]
    fn neg_wrapping(self) -> Self {
        self.wrapping_neg()
    }
    #[inline]
    fn abs_wrapping(self) -> Self {
        self.wrapping_abs()
    }
}

impl NumericNative for i64 {
    const IS_INTEGRAL: bool = true;

    #[inline]
    fn to_i64(self) -> i64 {
        self
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
    #[inline]
    fn from_i64(value: i64) -> Self {
        value
    }
    #[inline]
    fn from_f64(value: f64) -> Self {
        value as i64
    }
    #[inline]
    fn add_wrapping(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }
    #[inline]
    fn sub_wrapping(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }
    #[inline]
    fn mul_wrapping(self, rhs: Self) -> Self {
        self.wrapping_mul(rhs)
    }
    #[inline]
    fn div_checked(self, rhs: Self) -> Option<Self> {
        (rhs != 0).then(|| self.wrapping_div(rhs))
    }
    #[inline]
    fn rem_checked(self, rhs: Self) -> Option<Self> {
        (rhs != 0).then(|| self.wrapping_rem(rhs))
    }
    #[inline]
    fn neg_wrapping(self) -> Self {
        self.wrapping_neg()
    }
    #[inline]
    fn abs_wrapping(self) -> Self {
        self.wrapping_abs()
    }
}

impl NumericNative for f32 {
    const IS_INTEGRAL: bool = false;

    #[inline]
    fn to_i64(self) -> i64 {
        self as i64
    }
    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
    #[inline]
    fn from_i64(value: i64) -> Self {
        value as f32
    }
    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
    #[inline]
    fn add_wrapping(self, rhs: Self) -> Self {
        self + rhs
    }
    #[inline]
    fn sub_wrapping(self, rhs: Self) -> Self {
        self - rhs
    }
    #[inline]
    fn mul_wrapping(self, rhs: Self) -> Self {
        self * rhs
    }
    #[inline]
    fn div_checked(self, rhs: Self) -> Option<Self> {
        Some(self / rhs)
    }
    #[inline]
    fn rem_checked(self, rhs: Self) -> Option<Self> {
        Some(self % rhs)
    }
    #[inline]
    fn neg_wrapping(self) -> Self {
        -self
    }
    #[inline]
    fn abs_wrapping(self) -> Self {
        self.abs()
    }
}

impl NumericNative for f64 {
    const IS_INTEGRAL: bool = false;

    #[inline]
    fn to_i64(self) -> i64 {
        self as i64
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
    #[inline]
    fn from_i64(value: i64) -> Self {
        value as f64
    }
    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
    #[inline]
    fn add_wrapping(self, rhs: Self) -> Self {
        self + rhs
    }
    #[inline]
    fn sub_wrapping(self, rhs: Self) -> Self {
        self - rhs
    }
    #[inline]
    fn mul_wrapping(self, rhs: Self) -> Self {
        self * rhs
    }
    #[inline]
    fn div_checked(self, rhs: Self) -> Option<Self> {
        Some(self / rhs)
    }
    #[inline]
    fn rem_checked(self, rhs: Self) -> Option<Self> {
        Some(self % rhs)
    }
    #[inline]
    fn neg_wrapping(self) -> Self {
        -self
    }
    #[inline]
    fn abs_wrapping(self) -> Self {
        self.abs()
    }
}

/// Fixed-width slots for Char/VarChar data.
///
/// Each slot is exactly `width` bytes; strings shorter than the slot are NUL-terminated and
/// zero-padded, strings of exactly `width` bytes are not terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedWidthBytes {
    width: usize,
    len: usize,
    bytes: Vec<u8>,
}

impl FixedWidthBytes {
    pub fn with_capacity(width: usize, capacity: usize) -> Self {
        Self {
            width,
            len: 0,
            bytes: Vec::with_capacity(width.saturating_mul(capacity)),
        }
    }

    /// `len` zero-filled slots, ready for in-place writes through [`Self::slot_mut`].
    pub fn zeroed(width: usize, len: usize) -> Self {
        Self {
            width,
            len,
            bytes: vec![0u8; width.saturating_mul(len)],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, row: usize) -> Option<&[u8]> {
        if row >= self.len {
            return None;
        }
        let start = row * self.width;
        self.bytes.get(start..start + self.width)
    }

    pub fn slot_mut(&mut self, row: usize) -> Option<&mut [u8]> {
        if row >= self.len {
            return None;
        }
        let start = row * self.width;
        self.bytes.get_mut(start..start + self.width)
    }

    /// Append one string, truncated to the slot width and zero-padded.
    pub fn push(&mut self, value: &[u8]) {
        let take = value.len().min(self.width);
        self.bytes.extend_from_slice(&value[..take]);
        self.bytes.resize(self.bytes.len() + (self.width - take), 0);
        self.len += 1;
    }

    pub fn push_zeroed(&mut self) {
        self.bytes.resize(self.bytes.len() + self.width, 0);
        self.len += 1;
    }
}

/// Dense storage for one column of natives.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeVec {
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Date(Vec<Date>),
    Datetime(Vec<Datetime>),
    DatetimeInterval(Vec<DatetimeInterval>),
    YearMonthInterval(Vec<YearMonthInterval>),
    Bytes(FixedWidthBytes),
    /// A column of the NULL type only records its length.
    Null(usize),
}

impl NativeVec {
    /// Empty storage for `type_id`. `width` is only consulted for Char/VarChar.
    pub fn with_capacity(type_id: TypeId, width: usize, capacity: usize) -> Self {
        match type_id {
            TypeId::Int => NativeVec::Int(Vec::with_capacity(capacity)),
            TypeId::Long => NativeVec::Long(Vec::with_capacity(capacity)),
            TypeId::Float => NativeVec::Float(Vec::with_capacity(capacity)),
            TypeId::Double => NativeVec::Double(Vec::with_capacity(capacity)),
            TypeId::Date => NativeVec::Date(Vec::with_capacity(capacity)),
            TypeId::Datetime => NativeVec::Datetime(Vec::with_capacity(capacity)),
            TypeId::DatetimeInterval => NativeVec::DatetimeInterval(Vec::with_capacity(capacity)),
            TypeId::YearMonthInterval => NativeVec::YearMonthInterval(Vec::with_capacity(capacity)),
            TypeId::Char | TypeId::VarChar => {
                NativeVec::Bytes(FixedWidthBytes::with_capacity(width, capacity))
            }
            TypeId::Null => NativeVec::Null(0),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            NativeVec::Int(v) => v.len(),
            NativeVec::Long(v) => v.len(),
            NativeVec::Float(v) => v.len(),
            NativeVec::Double(v) => v.len(),
            NativeVec::Date(v) => v.len(),
            NativeVec::Datetime(v) => v.len(),
            NativeVec::DatetimeInterval(v) => v.len(),
            NativeVec::YearMonthInterval(v) => v.len(),
            NativeVec::Bytes(v) => v.len(),
            NativeVec::Null(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a placeholder slot, used under a cleared validity bit.
    pub fn push_default(&mut self) {
        match self {
            NativeVec::Int(v) => v.push(0),
            NativeVec::Long(v) => v.push(0),
            NativeVec::Float(v) => v.push(0.0),
            NativeVec::Double(v) => v.push(0.0),
            NativeVec::Date(v) => v.push(Date::default()),
            NativeVec::Datetime(v) => v.push(Datetime::default()),
            NativeVec::DatetimeInterval(v) => v.push(DatetimeInterval::default()),
            NativeVec::YearMonthInterval(v) => v.push(YearMonthInterval::default()),
            NativeVec::Bytes(v) => v.push_zeroed(),
            NativeVec::Null(len) => *len += 1,
        }
    }

    /// Append a non-NULL value. Returns `false`, leaving storage untouched, when the value's
    /// kind does not match this storage.
    pub fn push_value(&mut self, value: &TypedValue<'_>) -> bool {
        match (self, value) {
            (NativeVec::Int(v), TypedValue::Int(x)) => v.push(*x),
            (NativeVec::Long(v), TypedValue::Long(x)) => v.push(*x),
            (NativeVec::Float(v), TypedValue::Float(x)) => v.push(*x),
            (NativeVec::Double(v), TypedValue::Double(x)) => v.push(*x),
            (NativeVec::Date(v), TypedValue::Date(x)) => v.push(*x),
            (NativeVec::Datetime(v), TypedValue::Datetime(x)) => v.push(*x),
            (NativeVec::DatetimeInterval(v), TypedValue::DatetimeInterval(x)) => v.push(*x),
            (NativeVec::YearMonthInterval(v), TypedValue::YearMonthInterval(x)) => v.push(*x),
            (NativeVec::Bytes(v), TypedValue::Char(s) | TypedValue::VarChar(s)) => {
                v.push(crate::value::until_nul(s))
            }
            _ => return false,
        }
        true
    }

    /// The kind of value this storage holds; `None` for string slots, which back both Char and
    /// VarChar.
    pub fn fixed_type_id(&self) -> Option<TypeId> {
        Some(match self {
            NativeVec::Int(_) => TypeId::Int,
            NativeVec::Long(_) => TypeId::Long,
            NativeVec::Float(_) => TypeId::Float,
            NativeVec::Double(_) => TypeId::Double,
            NativeVec::Date(_) => TypeId::Date,
            NativeVec::Datetime(_) => TypeId::Datetime,
            NativeVec::DatetimeInterval(_) => TypeId::DatetimeInterval,
            NativeVec::YearMonthInterval(_) => TypeId::YearMonthInterval,
            NativeVec::Null(_) => TypeId::Null,
            NativeVec::Bytes(_) => return None,
        })
    }

    pub fn bytes(&self) -> Option<&FixedWidthBytes> {
        match self {
            NativeVec::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn bytes_mut(&mut self) -> Option<&mut FixedWidthBytes> {
        match self {
            NativeVec::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}
