//! Array columns.
//!
//! Body layout: one cumulative `u64` end offset per row, followed by the body
//! of the nested column holding the elements of every array back to back.

use tracing::{debug, warn};
use wirecol_io::{InputStream, OutputStream, SinkError, WireRead, WireWrite};

use super::{check_index, check_slice, impl_any_methods, same_column, swap_columns};
use crate::{Column, ColumnError, ColumnRef, DataType, LoadLimits, Value};

#[derive(Debug)]
/// A column of variable length arrays.
///
/// All elements are flattened into a single nested column, each row stores
/// the cumulative end offset of its elements. On the wire the offsets are
/// written as one little-endian `u64` per row followed by the nested body.
pub struct ColumnArray {
    data_type: DataType,
    offsets: Vec<u64>,
    nested: ColumnRef,
    limits: LoadLimits,
}

impl ColumnArray {
    /// Creates a new, empty array column with elements of the nested column type.
    ///
    /// Any rows already held by the nested column are discarded.
    pub fn new(mut nested: ColumnRef) -> Self {
        nested.clear();
        Self {
            data_type: DataType::array(nested.data_type().clone()),
            offsets: Vec::new(),
            nested,
            limits: LoadLimits::default(),
        }
    }

    /// Sets the limits applied when loading arrays.
    pub fn with_limits(mut self, limits: LoadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the flattened elements of every array.
    pub fn nested(&self) -> &dyn Column {
        self.nested.as_ref()
    }

    /// Returns the cumulative end offset of every row.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    #[inline]
    fn bounds(&self, index: usize) -> (usize, usize) {
        let start = if index == 0 { 0 } else { self.offsets[index - 1] };
        (start as usize, self.offsets[index] as usize)
    }

    #[inline]
    fn last_offset(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Appends every row of `items` as a single array.
    ///
    /// The items must have the same type as the nested column.
    pub fn append_array(&mut self, items: &dyn Column) -> Result<(), ColumnError> {
        self.nested.append_column(items)?;
        self.offsets.push(self.nested.size() as u64);
        Ok(())
    }

    /// Returns the number of elements in the array at the given row.
    pub fn array_len(&self, index: usize) -> Result<usize, ColumnError> {
        check_index(index, self.offsets.len())?;
        let (start, end) = self.bounds(index);
        Ok(end - start)
    }

    /// Returns a copy of the array at the given row as its own column.
    pub fn at_array(&self, index: usize) -> Result<ColumnRef, ColumnError> {
        check_index(index, self.offsets.len())?;
        let (start, end) = self.bounds(index);
        self.nested.slice(start, end - start)
    }

    fn read_offsets(&self, input: &mut dyn InputStream, rows: usize) -> Option<Vec<u64>> {
        let mut offsets = Vec::new();
        if !input.read_extend(&mut offsets, rows) {
            debug!(rows, "Input exhausted before array offsets were loaded");
            return None;
        }

        let mut previous = 0;
        for &offset in &offsets {
            if offset < previous {
                warn!(offset, previous, "Array offsets are not monotonic");
                return None;
            }
            if offset - previous > self.limits.max_array_size as u64 {
                warn!(
                    len = offset - previous,
                    max_array_size = self.limits.max_array_size,
                    "Array length exceeds the configured limit"
                );
                return None;
            }
            previous = offset;
        }

        Some(offsets)
    }
}

impl Column for ColumnArray {
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn size(&self) -> usize {
        self.offsets.len()
    }

    fn value_at(&self, index: usize) -> Result<Value, ColumnError> {
        check_index(index, self.offsets.len())?;
        let (start, end) = self.bounds(index);
        let items = (start..end)
            .map(|i| self.nested.value_at(i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Array(items))
    }

    fn append_value(&mut self, value: Value) -> Result<(), ColumnError> {
        let items = match value {
            Value::Array(items) => items,
            other => return Err(ColumnError::type_mismatch(&self.data_type, other.kind())),
        };

        let before = self.nested.size();
        self.nested.reserve(items.len());
        for item in items {
            if let Err(e) = self.nested.append_value(item) {
                self.nested.truncate(before);
                return Err(e);
            }
        }

        self.offsets.push(self.nested.size() as u64);
        Ok(())
    }

    fn append_default(&mut self) {
        let end = self.last_offset();
        self.offsets.push(end);
    }

    fn append_column(&mut self, other: &dyn Column) -> Result<(), ColumnError> {
        let other = same_column(self, other)?;
        let base = self.last_offset();
        self.nested.append_column(other.nested.as_ref())?;
        self.offsets
            .extend(other.offsets.iter().map(|offset| offset + base));
        Ok(())
    }

    fn slice(&self, offset: usize, length: usize) -> Result<ColumnRef, ColumnError> {
        check_slice(offset, length, self.offsets.len())?;

        let base = if offset == 0 { 0 } else { self.offsets[offset - 1] };
        let end = if length == 0 { base } else { self.offsets[offset + length - 1] };
        let offsets = self.offsets[offset..offset + length]
            .iter()
            .map(|o| o - base)
            .collect();

        Ok(Box::new(Self {
            data_type: self.data_type.clone(),
            offsets,
            nested: self.nested.slice(base as usize, (end - base) as usize)?,
            limits: self.limits,
        }))
    }

    fn clone_empty(&self) -> ColumnRef {
        Box::new(Self {
            data_type: self.data_type.clone(),
            offsets: Vec::new(),
            nested: self.nested.clone_empty(),
            limits: self.limits,
        })
    }

    fn clear(&mut self) {
        self.offsets.clear();
        self.nested.clear();
    }

    fn truncate(&mut self, len: usize) {
        if len < self.offsets.len() {
            self.offsets.truncate(len);
            let elements = self.last_offset() as usize;
            self.nested.truncate(elements);
        }
    }

    fn reserve(&mut self, additional: usize) {
        self.offsets.reserve(additional);
    }

    fn swap(&mut self, other: &mut dyn Column) -> Result<(), ColumnError> {
        swap_columns(self, other)
    }

    fn save_prefix(&self, output: &mut dyn OutputStream) -> Result<(), SinkError> {
        self.nested.save_prefix(output)
    }

    fn save_body(&self, output: &mut dyn OutputStream) -> Result<(), SinkError> {
        output.write_slice(&self.offsets)?;
        self.nested.save_body(output)
    }

    fn load_prefix(&mut self, input: &mut dyn InputStream, rows: usize) -> bool {
        self.nested.load_prefix(input, rows)
    }

    fn load_body(&mut self, input: &mut dyn InputStream, rows: usize) -> bool {
        let Some(offsets) = self.read_offsets(input, rows) else {
            return false;
        };

        let elements = offsets.last().copied().unwrap_or(0);
        let base = self.last_offset();
        let (Ok(elements), Some(_)) = (usize::try_from(elements), base.checked_add(elements)) else {
            warn!(elements, base, "Array element count overflows");
            return false;
        };

        if !self.nested.load_body(input, elements) {
            return false;
        }

        self.offsets
            .extend(offsets.into_iter().map(|offset| offset + base));
        true
    }

    impl_any_methods!();
}

#[cfg(test)]
mod tests {
    use wirecol_io::{ArrayInput, BufferOutput, WireWrite};

    use super::*;
    use crate::{ColumnString, ColumnUInt64};

    fn numbers(values: &[u64]) -> ColumnUInt64 {
        values.iter().copied().collect()
    }

    #[test]
    fn test_append_and_read_arrays() {
        let mut column = ColumnArray::new(Box::new(ColumnUInt64::new()));
        column.append_array(&numbers(&[1, 2, 3])).unwrap();
        column.append_default();
        column.append_array(&numbers(&[4])).unwrap();

        assert_eq!(column.size(), 3);
        assert_eq!(column.offsets(), &[3, 3, 4]);
        assert_eq!(column.array_len(1).unwrap(), 0);

        let first = column.at_array(0).unwrap();
        let first = first.as_strict::<ColumnUInt64>().unwrap();
        assert_eq!(first.as_slice(), &[1, 2, 3]);

        assert_eq!(
            column.value_at(2).unwrap(),
            Value::Array(vec![Value::UInt64(4)])
        );
    }

    #[test]
    fn test_append_value_rolls_back() {
        let mut column = ColumnArray::new(Box::new(ColumnUInt64::new()));
        let bad = Value::Array(vec![Value::UInt64(1), Value::from("nope")]);
        assert!(column.append_value(bad).is_err());
        assert!(column.is_empty());
        assert!(column.nested().is_empty());
    }

    #[test]
    fn test_slice_rebases_offsets() {
        let mut column = ColumnArray::new(Box::new(ColumnUInt64::new()));
        column.append_array(&numbers(&[1, 2])).unwrap();
        column.append_array(&numbers(&[3, 4, 5])).unwrap();
        column.append_array(&numbers(&[6])).unwrap();

        let slice = column.slice(1, 2).unwrap();
        let slice = slice.as_strict::<ColumnArray>().unwrap();
        assert_eq!(slice.offsets(), &[3, 4]);
        assert_eq!(slice.nested().size(), 4);
        assert_eq!(slice.value_at(1).unwrap(), Value::Array(vec![Value::UInt64(6)]));
    }

    #[test]
    fn test_wire_layout_and_load_onto_existing_rows() {
        let mut column = ColumnArray::new(Box::new(ColumnString::new()));
        column
            .append_value(Value::Array(vec![Value::from("a"), Value::from("b")]))
            .unwrap();

        let mut output = BufferOutput::new();
        column.save(&mut output).unwrap();
        assert_eq!(output.as_slice(), b"\x02\0\0\0\0\0\0\0\x01a\x01b");

        assert!(column.load(&mut ArrayInput::new(output.as_slice()), 1));
        assert_eq!(column.offsets(), &[2, 4]);
        assert_eq!(column.value_at(1).unwrap(), column.value_at(0).unwrap());
    }

    #[test]
    fn test_non_monotonic_offsets_rejected() {
        let mut output = BufferOutput::new();
        output.write_slice(&[3u64, 1]).unwrap();
        output.write_slice(&[0u64; 3]).unwrap();

        let mut column = ColumnArray::new(Box::new(ColumnUInt64::new()));
        assert!(!column.load(&mut ArrayInput::new(output.as_slice()), 2));
        assert!(column.is_empty());
    }

    #[test]
    fn test_array_size_limit() {
        let limits = LoadLimits::builder().max_array_size(2).build();
        let mut column = ColumnArray::new(Box::new(ColumnUInt64::new())).with_limits(limits);

        let mut output = BufferOutput::new();
        output.write_fixed(3u64).unwrap();
        output.write_slice(&[7u64; 3]).unwrap();
        assert!(!column.load(&mut ArrayInput::new(output.as_slice()), 1));
        assert!(column.is_empty());
    }

    #[test]
    fn test_oversized_offset_fails_without_allocating() {
        let mut output = BufferOutput::new();
        output.write_fixed(1u64 << 30).unwrap();
        output.write_fixed(0u64).unwrap();

        let mut column = ColumnArray::new(Box::new(ColumnUInt64::new()));
        assert!(!column.load(&mut ArrayInput::new(output.as_slice()), 1));
        assert!(column.is_empty());
        assert!(column.nested().is_empty());
    }

    #[test]
    fn test_huge_row_count_fails_cleanly() {
        let mut column = ColumnArray::new(Box::new(ColumnUInt64::new()));
        column.append_array(&numbers(&[1])).unwrap();
        assert!(!column.load(&mut ArrayInput::new(&[0; 16]), usize::MAX));
        assert_eq!(column.offsets(), &[1]);
    }
}
