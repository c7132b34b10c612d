//! Nullable columns.
//!
//! Body layout: one byte per row (`1` for null) followed by the body of the
//! nested column, which holds the default value in every null row.

use tracing::debug;
use wirecol_io::{InputStream, OutputStream, SinkError, WireRead, WireWrite};

use super::{check_index, check_slice, impl_any_methods, same_column, swap_columns};
use crate::{Column, ColumnError, ColumnRef, DataType, Value};

#[derive(Debug)]
/// A column which can additionally hold nulls.
///
/// Every row has an entry in the null map and a (default) value in the nested
/// column, so both always have the same size. On the wire the null map comes
/// first as one byte per row (`1` for null) followed by the nested column body.
pub struct ColumnNullable {
    data_type: DataType,
    nulls: Vec<u8>,
    nested: ColumnRef,
}

impl ColumnNullable {
    /// Wraps the nested column, any existing rows are marked as not null.
    pub fn new(nested: ColumnRef) -> Self {
        let data_type = DataType::nullable(nested.data_type().clone());
        let nulls = vec![0; nested.size()];
        Self {
            data_type,
            nulls,
            nested,
        }
    }

    /// Returns if the value at the given row is null.
    pub fn is_null(&self, index: usize) -> Result<bool, ColumnError> {
        check_index(index, self.nulls.len())?;
        Ok(self.nulls[index] != 0)
    }

    /// Returns the nested column holding the non-null values.
    pub fn nested(&self) -> &dyn Column {
        self.nested.as_ref()
    }

    /// Returns the null map, one byte per row.
    pub fn null_map(&self) -> &[u8] {
        &self.nulls
    }

    /// Appends a null row.
    pub fn append_null(&mut self) {
        self.nested.append_default();
        self.nulls.push(1);
    }
}

impl Column for ColumnNullable {
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn size(&self) -> usize {
        self.nulls.len()
    }

    fn value_at(&self, index: usize) -> Result<Value, ColumnError> {
        if self.is_null(index)? {
            return Ok(Value::Null);
        }
        self.nested.value_at(index)
    }

    fn append_value(&mut self, value: Value) -> Result<(), ColumnError> {
        if value.is_null() {
            self.append_null();
            return Ok(());
        }

        self.nested.append_value(value)?;
        self.nulls.push(0);
        Ok(())
    }

    fn append_default(&mut self) {
        self.append_null();
    }

    fn append_column(&mut self, other: &dyn Column) -> Result<(), ColumnError> {
        let other = same_column(self, other)?;
        self.nested.append_column(other.nested.as_ref())?;
        self.nulls.extend_from_slice(&other.nulls);
        Ok(())
    }

    fn slice(&self, offset: usize, length: usize) -> Result<ColumnRef, ColumnError> {
        check_slice(offset, length, self.nulls.len())?;
        Ok(Box::new(Self {
            data_type: self.data_type.clone(),
            nulls: self.nulls[offset..offset + length].to_vec(),
            nested: self.nested.slice(offset, length)?,
        }))
    }

    fn clone_empty(&self) -> ColumnRef {
        Box::new(Self {
            data_type: self.data_type.clone(),
            nulls: Vec::new(),
            nested: self.nested.clone_empty(),
        })
    }

    fn clear(&mut self) {
        self.nulls.clear();
        self.nested.clear();
    }

    fn truncate(&mut self, len: usize) {
        self.nulls.truncate(len);
        self.nested.truncate(len);
    }

    fn reserve(&mut self, additional: usize) {
        self.nulls.reserve(additional);
        self.nested.reserve(additional);
    }

    fn swap(&mut self, other: &mut dyn Column) -> Result<(), ColumnError> {
        swap_columns(self, other)
    }

    fn save_prefix(&self, output: &mut dyn OutputStream) -> Result<(), SinkError> {
        self.nested.save_prefix(output)
    }

    fn save_body(&self, output: &mut dyn OutputStream) -> Result<(), SinkError> {
        output.write_bytes(&self.nulls)?;
        self.nested.save_body(output)
    }

    fn load_prefix(&mut self, input: &mut dyn InputStream, rows: usize) -> bool {
        self.nested.load_prefix(input, rows)
    }

    fn load_body(&mut self, input: &mut dyn InputStream, rows: usize) -> bool {
        let start = self.nulls.len();
        if !input.read_extend(&mut self.nulls, rows) {
            debug!(rows, "Input exhausted before null map was loaded");
            return false;
        }

        if !self.nested.load_body(input, rows) {
            self.nulls.truncate(start);
            return false;
        }
        true
    }

    impl_any_methods!();
}

#[cfg(test)]
mod tests {
    use wirecol_io::{ArrayInput, BufferOutput};

    use super::*;
    use crate::{ColumnString, ColumnUInt32};

    #[test]
    fn test_nulls_and_values() {
        let mut column = ColumnNullable::new(Box::new(ColumnUInt32::new()));
        column.append_value(Value::UInt32(5)).unwrap();
        column.append_value(Value::Null).unwrap();
        column.append_value(Some(7u32).into()).unwrap();

        assert_eq!(column.size(), 3);
        assert_eq!(column.nested().size(), 3);
        assert_eq!(column.value_at(1).unwrap(), Value::Null);
        assert_eq!(column.value_at(2).unwrap(), Value::UInt32(7));
        assert!(column.is_null(1).unwrap());
        assert_eq!(column.data_type().to_string(), "Nullable(UInt32)");
    }

    #[test]
    fn test_wrapping_existing_rows() {
        let nested: ColumnUInt32 = [1, 2].into_iter().collect();
        let column = ColumnNullable::new(Box::new(nested));
        assert_eq!(column.null_map(), &[0, 0]);
    }

    #[test]
    fn test_wire_layout() {
        let mut column = ColumnNullable::new(Box::new(ColumnString::new()));
        column.append_value(Value::from("ab")).unwrap();
        column.append_value(Value::Null).unwrap();

        let mut output = BufferOutput::new();
        column.save(&mut output).unwrap();
        assert_eq!(output.as_slice(), b"\x00\x01\x02ab\x00");

        let mut loaded = column.clone_empty();
        assert!(loaded.load(&mut ArrayInput::new(output.as_slice()), 2));
        assert_eq!(loaded.value_at(0).unwrap(), Value::from("ab"));
        assert_eq!(loaded.value_at(1).unwrap(), Value::Null);
    }

    #[test]
    fn test_failed_nested_load_is_unchanged() {
        let mut column = ColumnNullable::new(Box::new(ColumnString::new()));
        assert!(!column.load(&mut ArrayInput::new(b"\x00\x00\x02ab"), 2));
        assert!(column.is_empty());
        assert!(column.nested().is_empty());
    }
}
