//! Fixed point decimal columns.
//!
//! Values are stored as scaled integers whose width follows the precision:
//! `i32` up to 9 digits, `i64` up to 18 and `i128` up to 38.

use tracing::debug;
use wirecol_io::{InputStream, OutputStream, SinkError, WireRead, WireWrite};

use super::{check_slice, impl_any_methods, same_column, swap_columns};
use crate::{Column, ColumnError, ColumnRef, DataType, Value};

/// The widest precision stored in an `i32`.
const MAX_PRECISION_32: u8 = 9;
/// The widest precision stored in an `i64`.
const MAX_PRECISION_64: u8 = 18;

#[derive(Debug, Clone)]
enum DecimalStorage {
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Int128(Vec<i128>),
}

macro_rules! dispatch {
    ($storage:expr, $data:ident => $body:expr) => {
        match $storage {
            DecimalStorage::Int32($data) => $body,
            DecimalStorage::Int64($data) => $body,
            DecimalStorage::Int128($data) => $body,
        }
    };
}

impl DecimalStorage {
    fn for_precision(precision: u8) -> Self {
        if precision <= MAX_PRECISION_32 {
            Self::Int32(Vec::new())
        } else if precision <= MAX_PRECISION_64 {
            Self::Int64(Vec::new())
        } else {
            Self::Int128(Vec::new())
        }
    }

    fn empty_like(&self) -> Self {
        match self {
            Self::Int32(_) => Self::Int32(Vec::new()),
            Self::Int64(_) => Self::Int64(Vec::new()),
            Self::Int128(_) => Self::Int128(Vec::new()),
        }
    }

    fn len(&self) -> usize {
        dispatch!(self, data => data.len())
    }

    fn get(&self, index: usize) -> Option<i128> {
        dispatch!(self, data => data.get(index).map(|v| i128::from(*v)))
    }

    /// Pushes the value if it fits the storage width.
    fn push(&mut self, value: i128) -> bool {
        match self {
            Self::Int32(data) => i32::try_from(value).map(|v| data.push(v)).is_ok(),
            Self::Int64(data) => i64::try_from(value).map(|v| data.push(v)).is_ok(),
            Self::Int128(data) => {
                data.push(value);
                true
            },
        }
    }
}

#[derive(Debug, Clone)]
/// A column of fixed point decimals.
///
/// Values are the raw scaled integers, i.e. `123.45` in a `Decimal(10, 2)`
/// column is stored as `12345`. The storage width is picked from the
/// precision: `i32` up to 9 digits, `i64` up to 18 digits and `i128` above.
pub struct ColumnDecimal {
    data_type: DataType,
    storage: DecimalStorage,
}

impl ColumnDecimal {
    /// Creates a new, empty `Decimal(precision, scale)` column.
    ///
    /// Returns [ColumnError::InvalidTypeName] if the precision is outside of
    /// `1..=38` or the scale exceeds the precision.
    pub fn new(precision: u8, scale: u8) -> Result<Self, ColumnError> {
        let data_type = DataType::decimal(precision, scale)?;
        Ok(Self {
            data_type,
            storage: DecimalStorage::for_precision(precision),
        })
    }

    /// The total number of significant digits.
    pub fn precision(&self) -> u8 {
        match self.data_type {
            DataType::Decimal { precision, .. } => precision,
            _ => 0,
        }
    }

    /// The number of digits after the decimal point.
    pub fn scale(&self) -> u8 {
        match self.data_type {
            DataType::Decimal { scale, .. } => scale,
            _ => 0,
        }
    }

    /// Appends a raw scaled value.
    ///
    /// Returns [ColumnError::ValueOutOfRange] if the value does not fit the
    /// storage width of the column.
    pub fn append(&mut self, value: i128) -> Result<(), ColumnError> {
        if !self.storage.push(value) {
            return Err(ColumnError::out_of_range(value, &self.data_type));
        }
        Ok(())
    }

    /// Returns the raw scaled value at the given row.
    pub fn at(&self, index: usize) -> Result<i128, ColumnError> {
        self.storage
            .get(index)
            .ok_or(ColumnError::IndexOutOfBounds {
                index,
                size: self.storage.len(),
            })
    }

    /// Returns the raw scaled value at the given row if it exists.
    pub fn get(&self, index: usize) -> Option<i128> {
        self.storage.get(index)
    }

    /// Returns an iterator over the raw scaled values.
    pub fn iter(&self) -> impl Iterator<Item = i128> + '_ {
        (0..self.storage.len()).filter_map(|index| self.storage.get(index))
    }
}

impl Column for ColumnDecimal {
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn size(&self) -> usize {
        self.storage.len()
    }

    fn value_at(&self, index: usize) -> Result<Value, ColumnError> {
        self.at(index).map(Value::Decimal)
    }

    fn append_value(&mut self, value: Value) -> Result<(), ColumnError> {
        match value {
            Value::Decimal(value) => self.append(value),
            other => Err(ColumnError::type_mismatch(&self.data_type, other.kind())),
        }
    }

    fn append_default(&mut self) {
        self.storage.push(0);
    }

    fn append_column(&mut self, other: &dyn Column) -> Result<(), ColumnError> {
        let other = same_column(self, other)?;
        match (&mut self.storage, &other.storage) {
            (DecimalStorage::Int32(a), DecimalStorage::Int32(b)) => a.extend_from_slice(b),
            (DecimalStorage::Int64(a), DecimalStorage::Int64(b)) => a.extend_from_slice(b),
            (DecimalStorage::Int128(a), DecimalStorage::Int128(b)) => a.extend_from_slice(b),
            _ => return Err(ColumnError::type_mismatch(&self.data_type, &other.data_type)),
        }
        Ok(())
    }

    fn slice(&self, offset: usize, length: usize) -> Result<ColumnRef, ColumnError> {
        check_slice(offset, length, self.storage.len())?;
        let storage = match &self.storage {
            DecimalStorage::Int32(data) => DecimalStorage::Int32(data[offset..offset + length].to_vec()),
            DecimalStorage::Int64(data) => DecimalStorage::Int64(data[offset..offset + length].to_vec()),
            DecimalStorage::Int128(data) => DecimalStorage::Int128(data[offset..offset + length].to_vec()),
        };
        Ok(Box::new(Self {
            data_type: self.data_type.clone(),
            storage,
        }))
    }

    fn clone_empty(&self) -> ColumnRef {
        Box::new(Self {
            data_type: self.data_type.clone(),
            storage: self.storage.empty_like(),
        })
    }

    fn clear(&mut self) {
        dispatch!(&mut self.storage, data => data.clear())
    }

    fn truncate(&mut self, len: usize) {
        dispatch!(&mut self.storage, data => data.truncate(len))
    }

    fn reserve(&mut self, additional: usize) {
        dispatch!(&mut self.storage, data => data.reserve(additional))
    }

    fn swap(&mut self, other: &mut dyn Column) -> Result<(), ColumnError> {
        swap_columns(self, other)
    }

    fn save_body(&self, output: &mut dyn OutputStream) -> Result<(), SinkError> {
        dispatch!(&self.storage, data => output.write_slice(data))
    }

    fn load_body(&mut self, input: &mut dyn InputStream, rows: usize) -> bool {
        let loaded = dispatch!(&mut self.storage, data => input.read_extend(data, rows));

        if !loaded {
            debug!(data_type = %self.data_type, rows, "Input exhausted before column was loaded");
        }
        loaded
    }

    impl_any_methods!();
}

#[cfg(test)]
mod tests {
    use wirecol_io::{ArrayInput, BufferOutput};

    use super::*;

    #[rstest::rstest]
    #[case(9, 4)]
    #[case(18, 8)]
    #[case(19, 16)]
    #[case(38, 16)]
    fn test_storage_width(#[case] precision: u8, #[case] width: usize) {
        let mut column = ColumnDecimal::new(precision, 0).unwrap();
        column.append(-42).unwrap();

        let mut output = BufferOutput::new();
        column.save(&mut output).unwrap();
        assert_eq!(output.len(), width);

        let mut loaded = column.clone_empty();
        let mut input = ArrayInput::new(output.as_slice());
        assert!(loaded.load(&mut input, 1));
        assert_eq!(loaded.value_at(0).unwrap(), Value::Decimal(-42));
    }

    #[test]
    fn test_out_of_range_append() {
        let mut column = ColumnDecimal::new(9, 2).unwrap();
        column.append(i32::MAX as i128).unwrap();
        let err = column
            .append(i32::MAX as i128 + 1)
            .expect_err("Value should not fit an i32 backed decimal");
        assert!(matches!(err, ColumnError::ValueOutOfRange { .. }));
        assert_eq!(column.size(), 1);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(ColumnDecimal::new(0, 0).is_err());
        assert!(ColumnDecimal::new(39, 0).is_err());
        assert!(ColumnDecimal::new(5, 6).is_err());
    }

    #[test]
    fn test_scale_in_type() {
        let mut a = ColumnDecimal::new(10, 5).unwrap();
        let mut b = ColumnDecimal::new(10, 4).unwrap();
        assert_eq!(a.precision(), 10);
        assert_eq!(a.scale(), 5);
        assert_eq!(a.data_type().to_string(), "Decimal(10, 5)");
        assert!(a.swap(&mut b).is_err());
    }
}
