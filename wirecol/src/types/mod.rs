//! The logical data types a column can hold.
//!
//! A [DataType] is the type descriptor of a column, it carries the type name
//! along with any parameters (fixed width, precision, scale, nested types).
//! Two columns are interchangeable for `save`/`load`, `swap` and `append_column`
//! if and only if their data types compare equal.
//!
//! The [Display] and [FromStr] implementations use the canonical server type
//! names, e.g. `Array(Nullable(String))` or `DateTime64(3, 'UTC')`.

mod parser;

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::ColumnError;

/// The maximum precision of a decimal type.
pub const MAX_DECIMAL_PRECISION: u8 = 38;
/// The maximum sub-second precision of a `DateTime64` type.
pub const MAX_DATETIME64_PRECISION: u8 = 9;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// A single `name = code` entry of an enum type.
pub struct EnumItem {
    pub name: String,
    pub value: i16,
}

impl EnumItem {
    /// Creates a new enum item.
    pub fn new(name: impl Into<String>, value: i16) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// The type descriptor of a column.
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    Float32,
    Float64,
    String,
    /// A string of exactly `N` bytes.
    FixedString(usize),
    /// Days since the unix epoch stored as a `u16`.
    Date,
    /// Days since the unix epoch stored as an `i32`.
    Date32,
    /// Seconds since the unix epoch stored as a `u32`.
    DateTime { timezone: Option<String> },
    /// Ticks since the unix epoch stored as an `i64`, with `10^precision`
    /// ticks per second.
    DateTime64 {
        precision: u8,
        timezone: Option<String>,
    },
    /// A fixed point number stored as a scaled integer.
    Decimal { precision: u8, scale: u8 },
    Uuid,
    IPv4,
    IPv6,
    Enum8(Vec<EnumItem>),
    Enum16(Vec<EnumItem>),
    Nullable(Box<DataType>),
    Array(Box<DataType>),
    Tuple(Vec<DataType>),
    LowCardinality(Box<DataType>),
}

impl DataType {
    /// Creates a `DateTime64(precision)` type.
    pub fn datetime64(precision: u8) -> Result<Self, ColumnError> {
        Self::datetime64_with_timezone(precision, None)
    }

    /// Creates a `DateTime64(precision, 'timezone')` type.
    pub fn datetime64_with_timezone(
        precision: u8,
        timezone: Option<String>,
    ) -> Result<Self, ColumnError> {
        if precision > MAX_DATETIME64_PRECISION {
            return Err(ColumnError::InvalidTypeName(format!("DateTime64({precision})")));
        }
        Ok(Self::DateTime64 {
            precision,
            timezone,
        })
    }

    /// Creates a `Decimal(precision, scale)` type.
    ///
    /// The precision must be within `1..=38` and the scale cannot exceed
    /// the precision.
    pub fn decimal(precision: u8, scale: u8) -> Result<Self, ColumnError> {
        if precision == 0 || precision > MAX_DECIMAL_PRECISION || scale > precision {
            return Err(ColumnError::InvalidTypeName(format!(
                "Decimal({precision}, {scale})"
            )));
        }
        Ok(Self::Decimal { precision, scale })
    }

    /// Creates a `FixedString(width)` type, the width must be non-zero.
    pub fn fixed_string(width: usize) -> Result<Self, ColumnError> {
        if width == 0 {
            return Err(ColumnError::InvalidTypeName(format!("FixedString({width})")));
        }
        Ok(Self::FixedString(width))
    }

    /// Creates an `Enum8` type from the given items.
    ///
    /// Codes must fit within an `i8` and both names and codes must be unique.
    pub fn enum8(items: Vec<EnumItem>) -> Result<Self, ColumnError> {
        validate_enum_items("Enum8", &items, i8::MIN as i16, i8::MAX as i16)?;
        Ok(Self::Enum8(items))
    }

    /// Creates an `Enum16` type from the given items.
    pub fn enum16(items: Vec<EnumItem>) -> Result<Self, ColumnError> {
        validate_enum_items("Enum16", &items, i16::MIN, i16::MAX)?;
        Ok(Self::Enum16(items))
    }

    /// Wraps the type in `Nullable(..)`.
    pub fn nullable(inner: DataType) -> Self {
        Self::Nullable(Box::new(inner))
    }

    /// Wraps the type in `Array(..)`.
    pub fn array(inner: DataType) -> Self {
        Self::Array(Box::new(inner))
    }

    /// Wraps the type in `LowCardinality(..)`.
    pub fn low_cardinality(inner: DataType) -> Self {
        Self::LowCardinality(Box::new(inner))
    }

    /// Returns the base name of the type without any parameters.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Int128 => "Int128",
            Self::UInt8 => "UInt8",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::UInt128 => "UInt128",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::String => "String",
            Self::FixedString(_) => "FixedString",
            Self::Date => "Date",
            Self::Date32 => "Date32",
            Self::DateTime { .. } => "DateTime",
            Self::DateTime64 { .. } => "DateTime64",
            Self::Decimal { .. } => "Decimal",
            Self::Uuid => "UUID",
            Self::IPv4 => "IPv4",
            Self::IPv6 => "IPv6",
            Self::Enum8(_) => "Enum8",
            Self::Enum16(_) => "Enum16",
            Self::Nullable(_) => "Nullable",
            Self::Array(_) => "Array",
            Self::Tuple(_) => "Tuple",
            Self::LowCardinality(_) => "LowCardinality",
        }
    }

    /// Returns the enum items if the type is `Enum8` or `Enum16`.
    pub fn enum_items(&self) -> Option<&[EnumItem]> {
        match self {
            Self::Enum8(items) | Self::Enum16(items) => Some(items),
            _ => None,
        }
    }
}

fn validate_enum_items(
    type_name: &str,
    items: &[EnumItem],
    min: i16,
    max: i16,
) -> Result<(), ColumnError> {
    for (i, item) in items.iter().enumerate() {
        let duplicate = items[..i]
            .iter()
            .any(|other| other.name == item.name || other.value == item.value);

        if item.value < min || item.value > max || duplicate {
            return Err(ColumnError::InvalidTypeName(format!(
                "{type_name}('{}' = {})",
                item.name, item.value
            )));
        }
    }
    Ok(())
}

fn write_quoted(f: &mut Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("'")
}

fn write_enum(f: &mut Formatter<'_>, name: &str, items: &[EnumItem]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_quoted(f, &item.name)?;
        write!(f, " = {}", item.value)?;
    }
    f.write_str(")")
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixedString(width) => write!(f, "FixedString({width})"),
            Self::DateTime { timezone: None } => f.write_str("DateTime"),
            Self::DateTime {
                timezone: Some(tz),
            } => {
                f.write_str("DateTime(")?;
                write_quoted(f, tz)?;
                f.write_str(")")
            },
            Self::DateTime64 {
                precision,
                timezone: None,
            } => write!(f, "DateTime64({precision})"),
            Self::DateTime64 {
                precision,
                timezone: Some(tz),
            } => {
                write!(f, "DateTime64({precision}, ")?;
                write_quoted(f, tz)?;
                f.write_str(")")
            },
            Self::Decimal { precision, scale } => write!(f, "Decimal({precision}, {scale})"),
            Self::Enum8(items) => write_enum(f, "Enum8", items),
            Self::Enum16(items) => write_enum(f, "Enum16", items),
            Self::Nullable(inner) => write!(f, "Nullable({inner})"),
            Self::Array(inner) => write!(f, "Array({inner})"),
            Self::LowCardinality(inner) => write!(f, "LowCardinality({inner})"),
            Self::Tuple(items) => {
                f.write_str("Tuple(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            },
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for DataType {
    type Err = ColumnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parser::parse_type(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parameterized_types() {
        assert_eq!(DataType::fixed_string(12).unwrap().to_string(), "FixedString(12)");
        assert_eq!(DataType::datetime64(3).unwrap().to_string(), "DateTime64(3)");
        assert_eq!(
            DataType::datetime64_with_timezone(6, Some("UTC".into()))
                .unwrap()
                .to_string(),
            "DateTime64(6, 'UTC')"
        );
        assert_eq!(DataType::decimal(10, 5).unwrap().to_string(), "Decimal(10, 5)");
        assert_eq!(
            DataType::nullable(DataType::array(DataType::String)).to_string(),
            "Nullable(Array(String))"
        );
        assert_eq!(
            DataType::Tuple(vec![DataType::UInt8, DataType::low_cardinality(DataType::String)])
                .to_string(),
            "Tuple(UInt8, LowCardinality(String))"
        );
    }

    #[test]
    fn test_display_enum_escapes_quotes() {
        let ty = DataType::enum8(vec![EnumItem::new("it's", 1), EnumItem::new("b", -2)])
            .unwrap();
        assert_eq!(ty.to_string(), r"Enum8('it\'s' = 1, 'b' = -2)");
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(DataType::decimal(0, 0).is_err());
        assert!(DataType::decimal(39, 2).is_err());
        assert!(DataType::decimal(5, 6).is_err());
        assert!(DataType::datetime64(10).is_err());
        assert!(DataType::enum8(vec![EnumItem::new("a", 200)]).is_err());
        assert!(DataType::enum16(vec![EnumItem::new("a", 1), EnumItem::new("a", 2)]).is_err());
        assert!(DataType::enum16(vec![EnumItem::new("a", 1), EnumItem::new("b", 1)]).is_err());
    }

    #[test]
    fn test_parameters_participate_in_equality() {
        assert_ne!(DataType::datetime64(3).unwrap(), DataType::datetime64(6).unwrap());
        assert_ne!(DataType::fixed_string(4).unwrap(), DataType::fixed_string(8).unwrap());
        assert!(DataType::fixed_string(0).is_err());
        assert_eq!(DataType::decimal(10, 5).unwrap(), DataType::decimal(10, 5).unwrap());
    }
}
