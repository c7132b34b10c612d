//! Dynamically typed values exchanged with the polymorphic column API.

use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::mem;
use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::Bytes;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// A 128-bit UUID stored as its two 64-bit halves.
///
/// The halves are kept exactly as they appear on the wire, high half first.
pub struct Uuid {
    pub high: u64,
    pub low: u64,
}

impl Uuid {
    /// Creates a new UUID from its two halves.
    pub const fn new(high: u64, low: u64) -> Self {
        Self { high, low }
    }

    /// Returns the UUID as a single 128-bit integer.
    pub const fn as_u128(&self) -> u128 {
        ((self.high as u128) << 64) | self.low as u128
    }
}

impl From<u128> for Uuid {
    fn from(value: u128) -> Self {
        Self {
            high: (value >> 64) as u64,
            low: value as u64,
        }
    }
}

impl Display for Uuid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let v = self.as_u128();
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xFFFF_FFFF_FFFF,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A single, dynamically typed value held by a column.
///
/// This is the currency of the polymorphic column API: `append_value` accepts
/// exactly the variant matching the column's data type and `value_at` returns it.
pub enum Value {
    /// The absence of a value in a `Nullable` or `LowCardinality(Nullable)` column.
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    UInt128(u128),
    Float32(f32),
    Float64(f64),
    String(Bytes),
    FixedString(Bytes),
    /// Days since the unix epoch.
    Date(u16),
    /// Days since the unix epoch, may be negative.
    Date32(i32),
    /// Seconds since the unix epoch.
    DateTime(u32),
    /// Ticks since the unix epoch, the tick size is defined by the column precision.
    DateTime64(i64),
    /// The raw scaled integer of a decimal, the scale is defined by the column.
    Decimal(i128),
    Uuid(Uuid),
    IPv4(Ipv4Addr),
    IPv6(Ipv6Addr),
    /// An `Enum8` code.
    Enum8(i8),
    /// An `Enum16` code.
    Enum16(i16),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    /// Returns the name of the value variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Int8(_) => "Int8",
            Self::Int16(_) => "Int16",
            Self::Int32(_) => "Int32",
            Self::Int64(_) => "Int64",
            Self::Int128(_) => "Int128",
            Self::UInt8(_) => "UInt8",
            Self::UInt16(_) => "UInt16",
            Self::UInt32(_) => "UInt32",
            Self::UInt64(_) => "UInt64",
            Self::UInt128(_) => "UInt128",
            Self::Float32(_) => "Float32",
            Self::Float64(_) => "Float64",
            Self::String(_) => "String",
            Self::FixedString(_) => "FixedString",
            Self::Date(_) => "Date",
            Self::Date32(_) => "Date32",
            Self::DateTime(_) => "DateTime",
            Self::DateTime64(_) => "DateTime64",
            Self::Decimal(_) => "Decimal",
            Self::Uuid(_) => "UUID",
            Self::IPv4(_) => "IPv4",
            Self::IPv6(_) => "IPv6",
            Self::Enum8(_) => "Enum8",
            Self::Enum16(_) => "Enum16",
            Self::Array(_) => "Array",
            Self::Tuple(_) => "Tuple",
        }
    }

    #[inline]
    /// Returns if the value is [Value::Null].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

macro_rules! impl_from {
    ($t:ty, $variant:ident) => {
        impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Self::$variant(value)
            }
        }
    };
}

impl_from!(i8, Int8);
impl_from!(i16, Int16);
impl_from!(i32, Int32);
impl_from!(i64, Int64);
impl_from!(i128, Int128);
impl_from!(u8, UInt8);
impl_from!(u16, UInt16);
impl_from!(u32, UInt32);
impl_from!(u64, UInt64);
impl_from!(u128, UInt128);
impl_from!(f32, Float32);
impl_from!(f64, Float64);
impl_from!(Bytes, String);
impl_from!(Uuid, Uuid);
impl_from!(Ipv4Addr, IPv4);
impl_from!(Ipv6Addr, IPv6);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(Bytes::from(value))
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::String(Bytes::copy_from_slice(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// A [Value] wrapper with bitwise equality and hashing, suitable as a map key.
///
/// Floats compare by their bit pattern so `NaN` values are deduplicated.
#[derive(Debug, Clone)]
pub(crate) struct HashableValue(pub Value);

impl PartialEq for HashableValue {
    fn eq(&self, other: &Self) -> bool {
        values_identical(&self.0, &other.0)
    }
}

impl Eq for HashableValue {}

impl Hash for HashableValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(&self.0, state)
    }
}

fn values_identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
        (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
        (Value::Array(a), Value::Array(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| values_identical(a, b))
        },
        (a, b) => a == b,
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    mem::discriminant(value).hash(state);
    match value {
        Value::Null => {},
        Value::Int8(v) => v.hash(state),
        Value::Int16(v) => v.hash(state),
        Value::Int32(v) => v.hash(state),
        Value::Int64(v) => v.hash(state),
        Value::Int128(v) => v.hash(state),
        Value::UInt8(v) => v.hash(state),
        Value::UInt16(v) => v.hash(state),
        Value::UInt32(v) => v.hash(state),
        Value::UInt64(v) => v.hash(state),
        Value::UInt128(v) => v.hash(state),
        Value::Float32(v) => v.to_bits().hash(state),
        Value::Float64(v) => v.to_bits().hash(state),
        Value::String(v) | Value::FixedString(v) => v.hash(state),
        Value::Date(v) => v.hash(state),
        Value::Date32(v) => v.hash(state),
        Value::DateTime(v) => v.hash(state),
        Value::DateTime64(v) => v.hash(state),
        Value::Decimal(v) => v.hash(state),
        Value::Uuid(v) => v.hash(state),
        Value::IPv4(v) => v.hash(state),
        Value::IPv6(v) => v.hash(state),
        Value::Enum8(v) => v.hash(state),
        Value::Enum16(v) => v.hash(state),
        Value::Array(items) | Value::Tuple(items) => {
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_display() {
        let uuid = Uuid::new(0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210);
        assert_eq!(uuid.to_string(), "01234567-89ab-cdef-fedc-ba9876543210");
        assert_eq!(Uuid::from(uuid.as_u128()), uuid);
    }

    #[test]
    fn test_hashable_value_nan() {
        let a = HashableValue(Value::Float64(f64::NAN));
        let b = HashableValue(Value::Float64(f64::NAN));
        assert_eq!(a, b, "NaN keys should be identical bitwise");

        let mut set = ahash::HashSet::default();
        set.insert(a);
        set.insert(b);
        set.insert(HashableValue(Value::from("a")));
        set.insert(HashableValue(Value::from("a")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::from(None::<u8>), Value::Null);
        assert_eq!(Value::from(Some(4u8)), Value::UInt8(4));
    }
}
