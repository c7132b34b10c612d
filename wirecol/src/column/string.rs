//! Variable and fixed length string columns.
//!
//! Strings are arbitrary byte sequences, no encoding is enforced.

use bytes::Bytes;
use tracing::{debug, warn};
use wirecol_io::{InputStream, OutputStream, SinkError, WireRead, WireWrite};

use super::{check_index, check_slice, impl_any_methods, same_column, swap_columns};
use crate::{Column, ColumnError, ColumnRef, DataType, LoadLimits, Value};

#[derive(Debug, Clone)]
/// A column of variable length strings.
///
/// On the wire every value is a LEB128 length prefix followed by the raw bytes.
pub struct ColumnString {
    data_type: DataType,
    /// All values concatenated.
    data: Vec<u8>,
    /// The end position of each value within `data`.
    offsets: Vec<usize>,
    limits: LoadLimits,
}

impl Default for ColumnString {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnString {
    /// Creates a new, empty column.
    pub fn new() -> Self {
        Self {
            data_type: DataType::String,
            data: Vec::new(),
            offsets: Vec::new(),
            limits: LoadLimits::default(),
        }
    }

    /// Sets the limits applied when loading values.
    pub fn with_limits(mut self, limits: LoadLimits) -> Self {
        self.limits = limits;
        self
    }

    #[inline]
    fn bounds(&self, index: usize) -> (usize, usize) {
        let start = if index == 0 { 0 } else { self.offsets[index - 1] };
        (start, self.offsets[index])
    }

    /// Appends a value to the column.
    pub fn append(&mut self, value: impl AsRef<[u8]>) {
        self.data.extend_from_slice(value.as_ref());
        self.offsets.push(self.data.len());
    }

    /// Returns the value at the given row.
    pub fn at(&self, index: usize) -> Result<&[u8], ColumnError> {
        check_index(index, self.offsets.len())?;
        let (start, end) = self.bounds(index);
        Ok(&self.data[start..end])
    }

    /// Returns the value at the given row if it exists.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.at(index).ok()
    }

    /// Returns an iterator over all values in the column.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.offsets.len()).map(|index| {
            let (start, end) = self.bounds(index);
            &self.data[start..end]
        })
    }

    fn read_value(&mut self, input: &mut dyn InputStream) -> bool {
        let Some(len) = input.read_varint() else { return false };
        if len > self.limits.max_string_size as u64 {
            warn!(
                len,
                max_string_size = self.limits.max_string_size,
                "String length prefix exceeds the configured limit"
            );
            return false;
        }

        if !input.read_extend(&mut self.data, len as usize) {
            return false;
        }

        self.offsets.push(self.data.len());
        true
    }
}

impl<S: AsRef<[u8]>> FromIterator<S> for ColumnString {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut column = Self::new();
        for value in iter {
            column.append(value);
        }
        column
    }
}

impl Column for ColumnString {
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn size(&self) -> usize {
        self.offsets.len()
    }

    fn value_at(&self, index: usize) -> Result<Value, ColumnError> {
        self.at(index)
            .map(|value| Value::String(Bytes::copy_from_slice(value)))
    }

    fn append_value(&mut self, value: Value) -> Result<(), ColumnError> {
        match value {
            Value::String(value) => {
                self.append(value);
                Ok(())
            },
            other => Err(ColumnError::type_mismatch(&self.data_type, other.kind())),
        }
    }

    fn append_default(&mut self) {
        self.offsets.push(self.data.len());
    }

    fn append_column(&mut self, other: &dyn Column) -> Result<(), ColumnError> {
        let other = same_column(self, other)?;
        let base = self.data.len();
        self.data.extend_from_slice(&other.data);
        self.offsets
            .extend(other.offsets.iter().map(|offset| offset + base));
        Ok(())
    }

    fn slice(&self, offset: usize, length: usize) -> Result<ColumnRef, ColumnError> {
        check_slice(offset, length, self.offsets.len())?;

        let mut column = Self::new().with_limits(self.limits);
        for value in self.iter().skip(offset).take(length) {
            column.append(value);
        }
        Ok(Box::new(column))
    }

    fn clone_empty(&self) -> ColumnRef {
        Box::new(Self::new().with_limits(self.limits))
    }

    fn clear(&mut self) {
        self.data.clear();
        self.offsets.clear();
    }

    fn truncate(&mut self, len: usize) {
        if len >= self.offsets.len() {
            return;
        }
        self.offsets.truncate(len);
        self.data.truncate(self.offsets.last().copied().unwrap_or(0));
    }

    fn reserve(&mut self, additional: usize) {
        self.offsets.reserve(additional);
    }

    fn swap(&mut self, other: &mut dyn Column) -> Result<(), ColumnError> {
        swap_columns(self, other)
    }

    fn save_body(&self, output: &mut dyn OutputStream) -> Result<(), SinkError> {
        for value in self.iter() {
            output.write_string(value)?;
        }
        Ok(())
    }

    fn load_body(&mut self, input: &mut dyn InputStream, rows: usize) -> bool {
        let start_rows = self.offsets.len();
        let start_bytes = self.data.len();

        for _ in 0..rows {
            if !self.read_value(input) {
                debug!(rows, loaded = self.offsets.len() - start_rows, "String column load incomplete");
                self.offsets.truncate(start_rows);
                self.data.truncate(start_bytes);
                return false;
            }
        }
        true
    }

    impl_any_methods!();
}

#[derive(Debug, Clone)]
/// A column of strings which are all exactly `width` bytes.
///
/// Shorter values are padded with zero bytes, longer values are rejected
/// with [ColumnError::ValueTooLong]. On the wire the column is
/// `size() * width` bytes with no framing.
pub struct ColumnFixedString {
    data_type: DataType,
    width: usize,
    rows: usize,
    data: Vec<u8>,
}

impl ColumnFixedString {
    /// Creates a new, empty column of `width` byte strings.
    ///
    /// Returns [ColumnError::InvalidTypeName] if the width is zero.
    pub fn new(width: usize) -> Result<Self, ColumnError> {
        Ok(Self {
            data_type: DataType::fixed_string(width)?,
            width,
            rows: 0,
            data: Vec::new(),
        })
    }

    #[inline]
    /// The width in bytes of every value.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Appends a value to the column, padding it with zeros up to the column width.
    pub fn append(&mut self, value: impl AsRef<[u8]>) -> Result<(), ColumnError> {
        let value = value.as_ref();
        if value.len() > self.width {
            return Err(ColumnError::ValueTooLong {
                width: self.width,
                len: value.len(),
            });
        }

        self.data.extend_from_slice(value);
        self.data.resize(self.data.len() + self.width - value.len(), 0);
        self.rows += 1;
        Ok(())
    }

    /// Returns the padded value at the given row.
    pub fn at(&self, index: usize) -> Result<&[u8], ColumnError> {
        check_index(index, self.rows)?;
        let start = index * self.width;
        Ok(&self.data[start..start + self.width])
    }

    /// Returns the padded value at the given row if it exists.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.at(index).ok()
    }

    /// Returns an iterator over all padded values in the column.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.rows).map(|index| {
            let start = index * self.width;
            &self.data[start..start + self.width]
        })
    }
}

impl Column for ColumnFixedString {
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn size(&self) -> usize {
        self.rows
    }

    fn value_at(&self, index: usize) -> Result<Value, ColumnError> {
        self.at(index)
            .map(|value| Value::FixedString(Bytes::copy_from_slice(value)))
    }

    fn append_value(&mut self, value: Value) -> Result<(), ColumnError> {
        match value {
            Value::FixedString(value) | Value::String(value) => self.append(value),
            other => Err(ColumnError::type_mismatch(&self.data_type, other.kind())),
        }
    }

    fn append_default(&mut self) {
        self.data.resize(self.data.len() + self.width, 0);
        self.rows += 1;
    }

    fn append_column(&mut self, other: &dyn Column) -> Result<(), ColumnError> {
        let other = same_column(self, other)?;
        self.data.extend_from_slice(&other.data);
        self.rows += other.rows;
        Ok(())
    }

    fn slice(&self, offset: usize, length: usize) -> Result<ColumnRef, ColumnError> {
        check_slice(offset, length, self.rows)?;
        let start = offset * self.width;
        let end = (offset + length) * self.width;
        Ok(Box::new(Self {
            data_type: self.data_type.clone(),
            width: self.width,
            rows: length,
            data: self.data[start..end].to_vec(),
        }))
    }

    fn clone_empty(&self) -> ColumnRef {
        Box::new(Self {
            data_type: self.data_type.clone(),
            width: self.width,
            rows: 0,
            data: Vec::new(),
        })
    }

    fn clear(&mut self) {
        self.data.clear();
        self.rows = 0;
    }

    fn truncate(&mut self, len: usize) {
        if len < self.rows {
            self.rows = len;
            self.data.truncate(len * self.width);
        }
    }

    fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional * self.width);
    }

    fn swap(&mut self, other: &mut dyn Column) -> Result<(), ColumnError> {
        swap_columns(self, other)
    }

    fn save_body(&self, output: &mut dyn OutputStream) -> Result<(), SinkError> {
        output.write_bytes(&self.data)
    }

    fn load_body(&mut self, input: &mut dyn InputStream, rows: usize) -> bool {
        let Some(len) = rows.checked_mul(self.width) else {
            warn!(width = self.width, rows, "Fixed string column size overflows");
            return false;
        };
        if !input.read_extend(&mut self.data, len) {
            debug!(width = self.width, rows, "Input exhausted before column was loaded");
            return false;
        }

        self.rows += rows;
        true
    }

    impl_any_methods!();
}

#[cfg(test)]
mod tests {
    use wirecol_io::{ArrayInput, BufferOutput};

    use super::*;

    #[test]
    fn test_string_wire_layout() {
        let column: ColumnString = ["foo", "", "barbaz"].into_iter().collect();

        let mut output = BufferOutput::new();
        column.save(&mut output).unwrap();
        assert_eq!(output.as_slice(), b"\x03foo\x00\x06barbaz");
    }

    #[test]
    fn test_string_truncated_load_is_unchanged() {
        let mut column = ColumnString::new();
        column.append("keep");

        let mut input = ArrayInput::new(b"\x03foo\x06bar");
        assert!(!column.load(&mut input, 2));
        assert_eq!(column.size(), 1);
        assert_eq!(column.at(0).unwrap(), b"keep");
    }

    #[test]
    fn test_string_limit_rejects_load() {
        let limits = LoadLimits::builder().max_string_size(2).build();
        let mut column = ColumnString::new().with_limits(limits);

        let mut input = ArrayInput::new(b"\x03foo");
        assert!(!column.load(&mut input, 1));
        assert!(column.is_empty());
    }

    #[test]
    fn test_string_truncate() {
        let mut column: ColumnString = ["a", "bb", "ccc"].into_iter().collect();
        column.truncate(2);
        assert_eq!(column.size(), 2);
        assert_eq!(column.at(1).unwrap(), b"bb");
        column.append("d");
        assert_eq!(column.at(2).unwrap(), b"d");
    }

    #[test]
    fn test_fixed_string_padding() {
        let mut column = ColumnFixedString::new(12).unwrap();
        column.append("foobar").unwrap();

        let expected = b"foobar\0\0\0\0\0\0";
        assert_eq!(column.at(0).unwrap(), expected);

        let mut output = BufferOutput::new();
        column.save(&mut output).unwrap();
        assert_eq!(output.as_slice(), expected);
    }

    #[test]
    fn test_fixed_string_rejects_long_values() {
        let mut column = ColumnFixedString::new(3).unwrap();
        let err = column.append("abcd").expect_err("Value should be too long");
        assert!(matches!(err, ColumnError::ValueTooLong { width: 3, len: 4 }));
        assert!(column.is_empty());

        column.append("abc").expect("Value of exact width should fit");
        assert_eq!(column.size(), 1);
    }

    #[test]
    fn test_fixed_string_width_in_type() {
        let mut a = ColumnFixedString::new(4).unwrap();
        let mut b = ColumnFixedString::new(5).unwrap();
        assert!(a.swap(&mut b).is_err());
        assert!(a.append_column(&b).is_err());
    }

    #[test]
    fn test_fixed_string_zero_width_rejected() {
        assert!(matches!(
            ColumnFixedString::new(0),
            Err(ColumnError::InvalidTypeName(_))
        ));
    }

    #[rstest::rstest]
    #[case(usize::MAX / 4)]
    #[case(usize::MAX)]
    fn test_fixed_string_huge_row_count(#[case] rows: usize) {
        let mut column = ColumnFixedString::new(12).unwrap();
        column.append("kept").unwrap();
        assert!(!column.load(&mut ArrayInput::new(&[0; 24]), rows));
        assert_eq!(column.size(), 1);
        assert_eq!(&column.at(0).unwrap()[..4], b"kept");
    }

    #[test]
    fn test_string_huge_length_prefix() {
        let mut output = BufferOutput::new();
        output.write_varint(1 << 30).unwrap();
        output.write_bytes(b"short").unwrap();

        let mut column = ColumnString::new();
        assert!(!column.load(&mut ArrayInput::new(output.as_slice()), 1));
        assert!(column.is_empty());
        assert!(!column.load(&mut ArrayInput::new(&[]), usize::MAX));
    }
}
