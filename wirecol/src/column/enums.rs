//! Enum columns storing `i8` or `i16` codes with a name mapping.

use std::fmt::Debug;

use ahash::HashMap;
use bytemuck::Pod;
use tracing::debug;
use wirecol_io::{InputStream, OutputStream, SinkError, WireRead, WireWrite};

use super::{check_index, check_slice, impl_any_methods, same_column, swap_columns};
use crate::{Column, ColumnError, ColumnRef, DataType, EnumItem, Value};

/// The integer code type of an enum column.
pub trait EnumCode: Pod + Default + Debug + Send + Sync + 'static {
    /// Builds the data type for the given items.
    fn data_type(items: Vec<EnumItem>) -> Result<DataType, ColumnError>;

    /// Narrows a stored item code, returning `None` if it does not fit.
    fn from_i16(code: i16) -> Option<Self>;

    /// Widens the code to the common item code type.
    fn to_i16(self) -> i16;

    /// Wraps the code in its value variant.
    fn into_value(self) -> Value;

    /// Extracts a code from a matching value variant.
    fn from_value(value: &Value) -> Option<Self>;
}

impl EnumCode for i8 {
    fn data_type(items: Vec<EnumItem>) -> Result<DataType, ColumnError> {
        DataType::enum8(items)
    }

    fn from_i16(code: i16) -> Option<Self> {
        i8::try_from(code).ok()
    }

    fn to_i16(self) -> i16 {
        i16::from(self)
    }

    fn into_value(self) -> Value {
        Value::Enum8(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Enum8(code) => Some(*code),
            _ => None,
        }
    }
}

impl EnumCode for i16 {
    fn data_type(items: Vec<EnumItem>) -> Result<DataType, ColumnError> {
        DataType::enum16(items)
    }

    fn from_i16(code: i16) -> Option<Self> {
        Some(code)
    }

    fn to_i16(self) -> i16 {
        self
    }

    fn into_value(self) -> Value {
        Value::Enum16(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Enum16(code) => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
/// A column of enum codes with a fixed `name = code` mapping.
///
/// Only codes present in the mapping can be appended. The wire layout is the
/// same as the underlying integer column.
pub struct ColumnEnum<T: EnumCode> {
    data_type: DataType,
    by_name: HashMap<String, T>,
    data: Vec<T>,
}

/// An `Enum8` column.
pub type ColumnEnum8 = ColumnEnum<i8>;
/// An `Enum16` column.
pub type ColumnEnum16 = ColumnEnum<i16>;

impl<T: EnumCode> ColumnEnum<T> {
    /// Creates a new, empty column with the given mapping.
    ///
    /// Returns [ColumnError::InvalidTypeName] if a code does not fit within `T`
    /// or a name or code is repeated.
    pub fn new(items: Vec<EnumItem>) -> Result<Self, ColumnError> {
        let data_type = T::data_type(items)?;
        let mut by_name = HashMap::default();
        for item in data_type.enum_items().unwrap_or_default() {
            let code = T::from_i16(item.value)
                .ok_or_else(|| ColumnError::InvalidTypeName(data_type.to_string()))?;
            by_name.insert(item.name.clone(), code);
        }

        Ok(Self {
            data_type,
            by_name,
            data: Vec::new(),
        })
    }

    /// Returns the `name = code` mapping of the column.
    pub fn items(&self) -> &[EnumItem] {
        self.data_type.enum_items().unwrap_or_default()
    }

    /// Returns if the code is part of the mapping.
    pub fn has_code(&self, code: T) -> bool {
        self.by_name.values().any(|known| known.to_i16() == code.to_i16())
    }

    /// Returns the name mapped to the given code.
    pub fn name_of(&self, code: T) -> Option<&str> {
        self.items()
            .iter()
            .find(|item| item.value == code.to_i16())
            .map(|item| item.name.as_str())
    }

    /// Appends a code to the column.
    ///
    /// Returns [ColumnError::UnknownEnumValue] if the code is not mapped.
    pub fn append(&mut self, code: T) -> Result<(), ColumnError> {
        if !self.has_code(code) {
            return Err(ColumnError::UnknownEnumValue(code.to_i16().to_string()));
        }
        self.data.push(code);
        Ok(())
    }

    /// Appends the code mapped to the given name.
    pub fn append_name(&mut self, name: &str) -> Result<(), ColumnError> {
        let code = *self
            .by_name
            .get(name)
            .ok_or_else(|| ColumnError::UnknownEnumValue(name.to_string()))?;
        self.data.push(code);
        Ok(())
    }

    /// Returns the code at the given row.
    pub fn at(&self, index: usize) -> Result<T, ColumnError> {
        check_index(index, self.data.len())?;
        Ok(self.data[index])
    }

    /// Returns the code at the given row if it exists.
    pub fn get(&self, index: usize) -> Option<T> {
        self.data.get(index).copied()
    }

    /// Returns the name of the value at the given row.
    pub fn name_at(&self, index: usize) -> Result<&str, ColumnError> {
        let code = self.at(index)?;
        self.name_of(code)
            .ok_or_else(|| ColumnError::UnknownEnumValue(code.to_i16().to_string()))
    }

    /// Returns an iterator over all codes in the column.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.data.iter().copied()
    }

    fn default_code(&self) -> T {
        self.items()
            .first()
            .and_then(|item| T::from_i16(item.value))
            .unwrap_or_default()
    }
}

impl<T: EnumCode> Column for ColumnEnum<T> {
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn size(&self) -> usize {
        self.data.len()
    }

    fn value_at(&self, index: usize) -> Result<Value, ColumnError> {
        self.at(index).map(T::into_value)
    }

    fn append_value(&mut self, value: Value) -> Result<(), ColumnError> {
        if let Some(code) = T::from_value(&value) {
            return self.append(code);
        }

        match value {
            Value::String(name) => {
                let name = String::from_utf8_lossy(&name);
                self.append_name(&name)
            },
            other => Err(ColumnError::type_mismatch(&self.data_type, other.kind())),
        }
    }

    fn append_default(&mut self) {
        let code = self.default_code();
        self.data.push(code);
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
            by_name: self.by_name.clone(),
            data: self.data[offset..offset + length].to_vec(),
        }))
    }

    fn clone_empty(&self) -> ColumnRef {
        Box::new(Self {
            data_type: self.data_type.clone(),
            by_name: self.by_name.clone(),
            data: Vec::new(),
        })
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
