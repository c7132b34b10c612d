//! Tuple columns, one nested column per element, saved one after another.

use tracing::debug;
use wirecol_io::{InputStream, OutputStream, SinkError};

use super::{check_index, check_slice, impl_any_methods, same_column, swap_columns};
use crate::{Column, ColumnError, ColumnRef, DataType, Value};

#[derive(Debug)]
/// A column of fixed arity tuples, stored as one column per element.
///
/// On the wire the element columns are written back to back.
pub struct ColumnTuple {
    data_type: DataType,
    columns: Vec<ColumnRef>,
}

impl ColumnTuple {
    /// Creates a tuple column from its element columns.
    ///
    /// Returns [ColumnError::RowCountMismatch] if the columns differ in size.
    pub fn new(columns: Vec<ColumnRef>) -> Result<Self, ColumnError> {
        let expected = columns.first().map(|c| c.size()).unwrap_or(0);
        if let Some(column) = columns.iter().find(|c| c.size() != expected) {
            return Err(ColumnError::RowCountMismatch {
                expected,
                actual: column.size(),
            });
        }

        let data_type = DataType::Tuple(columns.iter().map(|c| c.data_type().clone()).collect());
        Ok(Self { data_type, columns })
    }

    /// Returns the number of elements in each tuple.
    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    /// Returns the column holding the element at `index` of every tuple.
    pub fn column(&self, index: usize) -> Option<&dyn Column> {
        self.columns.get(index).map(|c| c.as_ref())
    }

    fn truncate_all(&mut self, len: usize) {
        for column in self.columns.iter_mut() {
            column.truncate(len);
        }
    }
}

impl Column for ColumnTuple {
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn size(&self) -> usize {
        self.columns.first().map(|c| c.size()).unwrap_or(0)
    }

    fn value_at(&self, index: usize) -> Result<Value, ColumnError> {
        check_index(index, self.size())?;
        let items = self
            .columns
            .iter()
            .map(|c| c.value_at(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Tuple(items))
    }

    fn append_value(&mut self, value: Value) -> Result<(), ColumnError> {
        let items = match value {
            Value::Tuple(items) if items.len() == self.columns.len() => items,
            other => return Err(ColumnError::type_mismatch(&self.data_type, other.kind())),
        };

        let before = self.size();
        let failed = self
            .columns
            .iter_mut()
            .zip(items)
            .find_map(|(column, item)| column.append_value(item).err());

        if let Some(e) = failed {
            self.truncate_all(before);
            return Err(e);
        }
        Ok(())
    }

    fn append_default(&mut self) {
        for column in self.columns.iter_mut() {
            column.append_default();
        }
    }

    fn append_column(&mut self, other: &dyn Column) -> Result<(), ColumnError> {
        let other = same_column(self, other)?;
        let before = self.size();
        let failed = self
            .columns
            .iter_mut()
            .zip(&other.columns)
            .find_map(|(column, source)| column.append_column(source.as_ref()).err());

        if let Some(e) = failed {
            self.truncate_all(before);
            return Err(e);
        }
        Ok(())
    }

    fn slice(&self, offset: usize, length: usize) -> Result<ColumnRef, ColumnError> {
        check_slice(offset, length, self.size())?;
        let columns = self
            .columns
            .iter()
            .map(|c| c.slice(offset, length))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Box::new(Self {
            data_type: self.data_type.clone(),
            columns,
        }))
    }

    fn clone_empty(&self) -> ColumnRef {
        Box::new(Self {
            data_type: self.data_type.clone(),
            columns: self.columns.iter().map(|c| c.clone_empty()).collect(),
        })
    }

    fn clear(&mut self) {
        for column in self.columns.iter_mut() {
            column.clear();
        }
    }

    fn truncate(&mut self, len: usize) {
        self.truncate_all(len);
    }

    fn reserve(&mut self, additional: usize) {
        for column in self.columns.iter_mut() {
            column.reserve(additional);
        }
    }

    fn swap(&mut self, other: &mut dyn Column) -> Result<(), ColumnError> {
        swap_columns(self, other)
    }

    fn save_prefix(&self, output: &mut dyn OutputStream) -> Result<(), SinkError> {
        for column in self.columns.iter() {
            column.save_prefix(output)?;
        }
        Ok(())
    }

    fn save_body(&self, output: &mut dyn OutputStream) -> Result<(), SinkError> {
        for column in self.columns.iter() {
            column.save_body(output)?;
        }
        Ok(())
    }

    fn load_prefix(&mut self, input: &mut dyn InputStream, rows: usize) -> bool {
        self.columns
            .iter_mut()
            .all(|column| column.load_prefix(input, rows))
    }

    fn load_body(&mut self, input: &mut dyn InputStream, rows: usize) -> bool {
        let before = self.size();
        let failed = self
            .columns
            .iter_mut()
            .position(|column| !column.load_body(input, rows));

        if let Some(element) = failed {
            debug!(element, rows, "Tuple element failed to load");
            self.truncate_all(before);
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
    use crate::{ColumnString, ColumnUInt8};

    fn pair() -> ColumnTuple {
        let columns: Vec<ColumnRef> = vec![Box::new(ColumnUInt8::new()), Box::new(ColumnString::new())];
        ColumnTuple::new(columns)
            .expect("Empty columns should form a tuple")
    }

    #[test]
    fn test_append_and_read() {
        let mut column = pair();
        column
            .append_value(Value::Tuple(vec![Value::UInt8(1), Value::from("one")]))
            .unwrap();

        assert_eq!(column.arity(), 2);
        assert_eq!(column.size(), 1);
        assert_eq!(column.data_type().to_string(), "Tuple(UInt8, String)");
        assert_eq!(
            column.value_at(0).unwrap(),
            Value::Tuple(vec![Value::UInt8(1), Value::from("one")])
        );
    }

    #[test]
    fn test_partial_append_rolled_back() {
        let mut column = pair();
        let err = column
            .append_value(Value::Tuple(vec![Value::UInt8(1), Value::UInt8(2)]))
            .expect_err("Second element should not match");
        assert!(matches!(err, ColumnError::TypeMismatch { .. }));
        assert!(column.is_empty());
        assert!(column.column(0).unwrap().is_empty());

        assert!(column
            .append_value(Value::Tuple(vec![Value::UInt8(1)]))
            .is_err());
    }

    #[test]
    fn test_mismatched_sizes_rejected() {
        let first: ColumnUInt8 = [1, 2].into_iter().collect();
        let columns: Vec<ColumnRef> = vec![Box::new(first), Box::new(ColumnString::new())];
        let result = ColumnTuple::new(columns);
        assert!(matches!(
            result,
            Err(ColumnError::RowCountMismatch {
                expected: 2,
                actual: 0
            })
        ));
    }

    #[test]
    fn test_wire_layout() {
        let mut column = pair();
        column
            .append_value(Value::Tuple(vec![Value::UInt8(7), Value::from("x")]))
            .unwrap();
        column.append_default();

        let mut output = BufferOutput::new();
        column.save(&mut output).unwrap();
        assert_eq!(output.as_slice(), b"\x07\x00\x01x\x00");

        let mut loaded = pair();
        assert!(loaded.load(&mut ArrayInput::new(output.as_slice()), 2));
        assert_eq!(loaded.value_at(0).unwrap(), column.value_at(0).unwrap());

        assert!(!loaded.load(&mut ArrayInput::new(b"\x01\x02\x01y"), 2));
        assert_eq!(loaded.size(), 2);
        assert_eq!(loaded.column(0).unwrap().size(), 2);
    }
}
