use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dispatch::{invoke_on_type_id, AllTypes, ScalarType, TypeVisitor};
use crate::error::TypeError;

/// Number of scalar kinds in the closed catalog.
pub const NUM_TYPE_IDS: usize = 11;

/// Closed tag identifying one scalar kind.
///
/// The discriminant doubles as the dense dispatch ordinal, so the declaration order is part of
/// the persisted plan format and must not be rearranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum TypeId {
    Int = 0,
    Long = 1,
    Float = 2,
    Double = 3,
    Date = 4,
    Datetime = 5,
    DatetimeInterval = 6,
    YearMonthInterval = 7,
    Char = 8,
    VarChar = 9,
    Null = 10,
}

/// Coarse grouping used by the lossy `is_coercible_from` rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuperTypeId {
    Numeric,
    AsciiString,
    Other,
}

/// The four numeric kinds, in promotion order.
pub const NUMERIC_TYPE_IDS: [TypeId; 4] = [TypeId::Int, TypeId::Long, TypeId::Float, TypeId::Double];

impl TypeId {
    pub const ALL: [TypeId; NUM_TYPE_IDS] = [
        TypeId::Int,
        TypeId::Long,
        TypeId::Float,
        TypeId::Double,
        TypeId::Date,
        TypeId::Datetime,
        TypeId::DatetimeInterval,
        TypeId::YearMonthInterval,
        TypeId::Char,
        TypeId::VarChar,
        TypeId::Null,
    ];

    #[inline]
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            TypeId::Int => "Int",
            TypeId::Long => "Long",
            TypeId::Float => "Float",
            TypeId::Double => "Double",
            TypeId::Date => "Date",
            TypeId::Datetime => "Datetime",
            TypeId::DatetimeInterval => "DatetimeInterval",
            TypeId::YearMonthInterval => "YearMonthInterval",
            TypeId::Char => "Char",
            TypeId::VarChar => "VarChar",
            TypeId::Null => "NullType",
        }
    }

    pub const fn super_type(self) -> SuperTypeId {
        match self {
            TypeId::Int | TypeId::Long | TypeId::Float | TypeId::Double => SuperTypeId::Numeric,
            TypeId::Char | TypeId::VarChar => SuperTypeId::AsciiString,
            _ => SuperTypeId::Other,
        }
    }

    #[inline]
    pub const fn is_numeric(self) -> bool {
        matches!(self.super_type(), SuperTypeId::Numeric)
    }

    /// Whether descriptors of this kind carry a byte-length parameter.
    pub fn is_parameterized(self) -> bool {
        struct Parameterized;

        impl TypeVisitor for Parameterized {
            type Output = bool;

            fn visit<T: ScalarType>(self) -> bool {
                T::PARAMETERIZED
            }
        }

        invoke_on_type_id(&AllTypes, self, Parameterized)
    }

    /// Native width in bytes for fixed-width kinds; `None` for Char/VarChar.
    pub const fn fixed_byte_width(self) -> Option<usize> {
        match self {
            TypeId::Int | TypeId::Float | TypeId::Date => Some(4),
            TypeId::Long
            | TypeId::Double
            | TypeId::Datetime
            | TypeId::DatetimeInterval
            | TypeId::YearMonthInterval => Some(8),
            TypeId::Null => Some(0),
            TypeId::Char | TypeId::VarChar => None,
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TypeId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeId::ALL
            .iter()
            .copied()
            .find(|id| id.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypeError::UnknownTypeName(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_are_dense_and_round_trip() {
        for (idx, id) in TypeId::ALL.iter().enumerate() {
            assert_eq!(id.ordinal(), idx);
            assert_eq!(TypeId::from_ordinal(idx), Some(*id));
        }
        assert_eq!(TypeId::from_ordinal(NUM_TYPE_IDS), None);
    }

    #[test]
    fn only_string_kinds_are_parameterized() {
        let parameterized: Vec<TypeId> = TypeId::ALL
            .iter()
            .copied()
            .filter(|id| id.is_parameterized())
            .collect();
        assert_eq!(parameterized, vec![TypeId::Char, TypeId::VarChar]);
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("varchar".parse::<TypeId>().unwrap(), TypeId::VarChar);
        assert_eq!("NULLTYPE".parse::<TypeId>().unwrap(), TypeId::Null);
        assert!("Decimal".parse::<TypeId>().is_err());
    }
}
