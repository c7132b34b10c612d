//! Columns of fixed width values.
//!
//! This covers every type whose values are plain old data of a constant size,
//! i.e. integers, floats, dates, UUIDs and IP addresses. Values are kept in a
//! single contiguous buffer which is also the exact wire layout:
//! `size() * size_of::<Native>()` little-endian bytes with no framing.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::net::{Ipv4Addr, Ipv6Addr};

use bytemuck::Pod;
use tracing::debug;
use wirecol_io::{InputStream, OutputStream, SinkError, WireRead, WireWrite};

use super::{check_index, check_slice, impl_any_methods, same_column, swap_columns};
use crate::{Column, ColumnError, ColumnRef, DataType, Uuid, Value};

/// Describes how a fixed width column stores and exposes its values.
pub trait FixedKind: Debug + Clone + Send + Sync + 'static {
    /// The in-memory and on-wire representation of a value.
    type Native: Pod + Default + Debug + Send + Sync;
    /// The user facing representation of a value.
    type Item: Debug + Clone + PartialEq;

    /// Converts a user facing value into its stored form.
    fn to_native(item: Self::Item) -> Self::Native;

    /// Converts a stored value into its user facing form.
    fn from_native(native: Self::Native) -> Self::Item;

    /// Wraps the user facing value in a [Value].
    fn into_value(item: Self::Item) -> Value;

    /// Unwraps a [Value], returning the value back if it is the wrong variant.
    fn from_value(value: Value) -> Result<Self::Item, Value>;
}

#[derive(Debug, Clone)]
/// A column of fixed width values described by `K`.
pub struct ColumnVector<K: FixedKind> {
    data_type: DataType,
    data: Vec<K::Native>,
    _kind: PhantomData<K>,
}

impl<K: FixedKind> ColumnVector<K> {
    pub(crate) fn with_type(data_type: DataType) -> Self {
        Self {
            data_type,
            data: Vec::new(),
            _kind: PhantomData,
        }
    }

    #[inline]
    /// Appends a value to the column.
    pub fn append(&mut self, item: K::Item) {
        self.data.push(K::to_native(item));
    }

    /// Returns the value at the given row.
    pub fn at(&self, index: usize) -> Result<K::Item, ColumnError> {
        check_index(index, self.data.len())?;
        Ok(K::from_native(self.data[index]))
    }

    #[inline]
    /// Returns the value at the given row if it exists.
    pub fn get(&self, index: usize) -> Option<K::Item> {
        self.data.get(index).copied().map(K::from_native)
    }

    /// Returns an iterator over all values in the column.
    pub fn iter(&self) -> impl Iterator<Item = K::Item> + '_ {
        self.data.iter().copied().map(K::from_native)
    }

    #[inline]
    /// Returns the stored values as a slice.
    pub fn as_slice(&self) -> &[K::Native] {
        &self.data
    }

    #[inline]
    pub(crate) fn push_native(&mut self, native: K::Native) {
        self.data.push(native);
    }

    #[inline]
    pub(crate) fn native_at(&self, index: usize) -> Result<K::Native, ColumnError> {
        check_index(index, self.data.len())?;
        Ok(self.data[index])
    }
}

impl<K: FixedKind> Extend<K::Item> for ColumnVector<K> {
    fn extend<I: IntoIterator<Item = K::Item>>(&mut self, iter: I) {
        self.data.extend(iter.into_iter().map(K::to_native));
    }
}

impl<K: FixedKind> Column for ColumnVector<K> {
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn size(&self) -> usize {
        self.data.len()
    }

    fn value_at(&self, index: usize) -> Result<Value, ColumnError> {
        self.at(index).map(K::into_value)
    }

    fn append_value(&mut self, value: Value) -> Result<(), ColumnError> {
        let item = K::from_value(value)
            .map_err(|value| ColumnError::type_mismatch(&self.data_type, value.kind()))?;
        self.append(item);
        Ok(())
    }

    fn append_default(&mut self) {
        self.data.push(K::Native::default());
    }

    fn append_column(&mut self, other: &dyn Column) -> Result<(), ColumnError> {
        let other = same_column(self, other)?;
        self.data.extend_from_slice(&other.data);
        Ok(())
    }

    fn slice(&self, offset: usize, length: usize) -> Result<ColumnRef, ColumnError> {
        check_slice(offset, length, self.data.len())?;
        Ok(Box::new(Self {
            data_type: self.data_type.clone(),
            data: self.data[offset..offset + length].to_vec(),
            _kind: PhantomData,
        }))
    }

    fn clone_empty(&self) -> ColumnRef {
        Box::new(Self::with_type(self.data_type.clone()))
    }

    fn clear(&mut self) {
        self.data.clear();
    }

    fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional);
    }

    fn swap(&mut self, other: &mut dyn Column) -> Result<(), ColumnError> {
        swap_columns(self, other)
    }

    fn save_body(&self, output: &mut dyn OutputStream) -> Result<(), SinkError> {
        output.write_slice(&self.data)
    }

    fn load_body(&mut self, input: &mut dyn InputStream, rows: usize) -> bool {
        if !input.read_extend(&mut self.data, rows) {
            debug!(data_type = %self.data_type, rows, "Input exhausted before column was loaded");
            return false;
        }
        true
    }

    impl_any_methods!();
}

macro_rules! primitive_kind {
    ($t:ty, $variant:ident, $alias:ident) => {
        impl FixedKind for $t {
            type Native = $t;
            type Item = $t;

            #[inline]
            fn to_native(item: Self::Item) -> Self::Native {
                item
            }

            #[inline]
            fn from_native(native: Self::Native) -> Self::Item {
                native
            }

            #[inline]
            fn into_value(item: Self::Item) -> Value {
                Value::$variant(item)
            }

            #[inline]
            fn from_value(value: Value) -> Result<Self::Item, Value> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }
        }

        #[doc = concat!("A column of `", stringify!($variant), "` values.")]
        pub type $alias = ColumnVector<$t>;

        impl ColumnVector<$t> {
            /// Creates a new, empty column.
            pub fn new() -> Self {
                Self::with_type(DataType::$variant)
            }
        }

        impl Default for ColumnVector<$t> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl FromIterator<$t> for ColumnVector<$t> {
            fn from_iter<I: IntoIterator<Item = $t>>(iter: I) -> Self {
                let mut column = Self::new();
                column.extend(iter);
                column
            }
        }
    };
}

primitive_kind!(i8, Int8, ColumnInt8);
primitive_kind!(i16, Int16, ColumnInt16);
primitive_kind!(i32, Int32, ColumnInt32);
primitive_kind!(i64, Int64, ColumnInt64);
primitive_kind!(i128, Int128, ColumnInt128);
primitive_kind!(u8, UInt8, ColumnUInt8);
primitive_kind!(u16, UInt16, ColumnUInt16);
primitive_kind!(u32, UInt32, ColumnUInt32);
primitive_kind!(u64, UInt64, ColumnUInt64);
primitive_kind!(u128, UInt128, ColumnUInt128);
primitive_kind!(f32, Float32, ColumnFloat32);
primitive_kind!(f64, Float64, ColumnFloat64);

#[derive(Debug, Clone)]
/// UUIDs stored as two little-endian `u64` halves, high half first.
pub struct UuidKind;

impl FixedKind for UuidKind {
    type Native = [u64; 2];
    type Item = Uuid;

    fn to_native(item: Self::Item) -> Self::Native {
        [item.high, item.low]
    }

    fn from_native(native: Self::Native) -> Self::Item {
        Uuid::new(native[0], native[1])
    }

    fn into_value(item: Self::Item) -> Value {
        Value::Uuid(item)
    }

    fn from_value(value: Value) -> Result<Self::Item, Value> {
        match value {
            Value::Uuid(v) => Ok(v),
            other => Err(other),
        }
    }
}

/// A column of `UUID` values.
pub type ColumnUuid = ColumnVector<UuidKind>;

impl ColumnUuid {
    /// Creates a new, empty column.
    pub fn new() -> Self {
        Self::with_type(DataType::Uuid)
    }
}

impl Default for ColumnUuid {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
/// IPv4 addresses stored as the little-endian `u32` of the numeric address.
pub struct IPv4Kind;

impl FixedKind for IPv4Kind {
    type Native = u32;
    type Item = Ipv4Addr;

    fn to_native(item: Self::Item) -> Self::Native {
        u32::from(item)
    }

    fn from_native(native: Self::Native) -> Self::Item {
        Ipv4Addr::from(native)
    }

    fn into_value(item: Self::Item) -> Value {
        Value::IPv4(item)
    }

    fn from_value(value: Value) -> Result<Self::Item, Value> {
        match value {
            Value::IPv4(v) => Ok(v),
            other => Err(other),
        }
    }
}

/// A column of `IPv4` addresses.
pub type ColumnIPv4 = ColumnVector<IPv4Kind>;

impl ColumnIPv4 {
    /// Creates a new, empty column.
    pub fn new() -> Self {
        Self::with_type(DataType::IPv4)
    }
}

impl Default for ColumnIPv4 {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
/// IPv6 addresses stored as their 16 octets in network byte order.
pub struct IPv6Kind;

impl FixedKind for IPv6Kind {
    type Native = [u8; 16];
    type Item = Ipv6Addr;

    fn to_native(item: Self::Item) -> Self::Native {
        item.octets()
    }

    fn from_native(native: Self::Native) -> Self::Item {
        Ipv6Addr::from(native)
    }

    fn into_value(item: Self::Item) -> Value {
        Value::IPv6(item)
    }

    fn from_value(value: Value) -> Result<Self::Item, Value> {
        match value {
            Value::IPv6(v) => Ok(v),
            other => Err(other),
        }
    }
}

/// A column of `IPv6` addresses.
pub type ColumnIPv6 = ColumnVector<IPv6Kind>;

impl ColumnIPv6 {
    /// Creates a new, empty column.
    pub fn new() -> Self {
        Self::with_type(DataType::IPv6)
    }
}

impl Default for ColumnIPv6 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use wirecol_io::{ArrayInput, BufferOutput};

    use super::*;

    #[test]
    fn test_uint32_save_load() {
        let column: ColumnUInt32 = [1, 2, 3].into_iter().collect();

        let mut output = BufferOutput::new();
        column.save(&mut output).expect("Save should succeed");
        assert_eq!(output.as_slice(), &[1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]);

        let mut loaded = ColumnUInt32::new();
        let mut input = ArrayInput::new(output.as_slice());
        assert!(loaded.load(&mut input, 3));
        assert_eq!(loaded.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_short_load_leaves_column_unchanged() {
        let mut column = ColumnInt64::new();
        column.append(-5);

        let bytes = [0u8; 12];
        let mut input = ArrayInput::new(&bytes);
        assert!(!column.load(&mut input, 2), "12 bytes cannot hold two Int64 values");
        assert_eq!(column.as_slice(), &[-5]);
    }

    #[test]
    fn test_append_value_type_mismatch() {
        let mut column = ColumnUInt8::new();
        let err = column
            .append_value(Value::UInt16(1))
            .expect_err("Mismatched value should be rejected");
        assert!(matches!(err, ColumnError::TypeMismatch { .. }));
        assert_eq!(column.size(), 0);
    }

    #[test]
    fn test_ipv4_wire_layout() {
        let mut column = ColumnIPv4::new();
        column.append(Ipv4Addr::new(127, 0, 0, 1));

        let mut output = BufferOutput::new();
        column.save(&mut output).unwrap();
        assert_eq!(output.as_slice(), &[1, 0, 0, 127]);
        assert_eq!(column.at(0).unwrap(), Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn test_ipv6_wire_layout() {
        let mut column = ColumnIPv6::new();
        column.append(Ipv6Addr::LOCALHOST);

        let mut output = BufferOutput::new();
        column.save(&mut output).unwrap();
        let mut expected = [0u8; 16];
        expected[15] = 1;
        assert_eq!(output.as_slice(), &expected);
    }

    #[test]
    fn test_uuid_wire_layout() {
        let mut column = ColumnUuid::new();
        column.append(Uuid::new(1, 2));

        let mut output = BufferOutput::new();
        column.save(&mut output).unwrap();
        assert_eq!(
            output.as_slice(),
            &[1, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_swap_requires_same_type() {
        let mut a: ColumnUInt32 = [1, 2].into_iter().collect();
        let mut b = ColumnInt32::new();
        assert!(a.swap(&mut b).is_err());
        assert_eq!(a.size(), 2);
    }

    #[test]
    fn test_load_huge_row_count_fails_cleanly() {
        let mut column: ColumnUInt64 = [5].into_iter().collect();
        assert!(!column.load(&mut ArrayInput::new(&[0; 8]), usize::MAX));
        assert_eq!(column.iter().collect::<Vec<_>>(), vec![5]);
    }
}
