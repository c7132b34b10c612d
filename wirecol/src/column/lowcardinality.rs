//! Dictionary encoded columns.
//!
//! Wire layout, after the `u64` key serialization version prefix:
//!
//! ```text
//! u64   serialization flags (index width code | HAS_ADDITIONAL_KEYS)
//! u64   number of dictionary keys
//! ...   dictionary body
//! u64   number of rows
//! ...   one index per row, `u8`, `u16`, `u32` or `u64` wide
//! ```

use ahash::HashMap;
use bytemuck::Pod;
use tracing::{debug, warn};
use wirecol_io::{InputStream, OutputStream, SinkError, WireRead, WireWrite};

use super::{check_index, check_slice, impl_any_methods, swap_columns};
use crate::value::HashableValue;
use crate::{Column, ColumnError, ColumnNullable, ColumnRef, DataType, LoadLimits, Value};

/// The only supported key serialization version, shared dictionaries with additional keys.
const KEYS_SERIALIZATION_VERSION: u64 = 1;

const INDEX_WIDTH_MASK: u64 = 0xFF;
const NEED_GLOBAL_DICTIONARY: u64 = 1 << 8;
const HAS_ADDITIONAL_KEYS: u64 = 1 << 9;

const INDEX_U8: u64 = 0;
const INDEX_U16: u64 = 1;
const INDEX_U32: u64 = 2;
const INDEX_U64: u64 = 3;

/// The slot of the null value in a nullable dictionary.
const NULL_INDEX: u64 = 0;

#[derive(Debug)]
/// A column which stores each distinct value once in a dictionary and
/// a dictionary index per row.
///
/// The dictionary always starts with the default value of the inner type.
/// When the inner type is `Nullable` the dictionary holds values of the
/// non-nullable type and slot `0` is reserved for null, followed by the default.
pub struct ColumnLowCardinality {
    data_type: DataType,
    nullable: bool,
    dictionary: ColumnRef,
    lookup: HashMap<HashableValue, u64>,
    indexes: Vec<u64>,
    limits: LoadLimits,
}

fn supports_dictionary(data_type: &DataType) -> bool {
    match data_type {
        DataType::Nullable(inner) => supports_dictionary(inner),
        DataType::Array(_) | DataType::Tuple(_) | DataType::LowCardinality(_) => false,
        _ => true,
    }
}

impl ColumnLowCardinality {
    /// Creates a new, empty dictionary encoded column of the inner column type.
    ///
    /// Only the type of `inner` is used, its rows are ignored. Returns
    /// [ColumnError::TypeMismatch] if the type cannot be dictionary encoded.
    pub fn new(inner: ColumnRef) -> Result<Self, ColumnError> {
        let inner_type = inner.data_type().clone();
        if !supports_dictionary(&inner_type) {
            return Err(ColumnError::type_mismatch(
                "a dictionary encodable type",
                &inner_type,
            ));
        }

        let (nullable, dictionary) = match inner_type {
            DataType::Nullable(_) => {
                let inner = inner.as_strict::<ColumnNullable>()?;
                (true, inner.nested().clone_empty())
            },
            _ => (false, inner.clone_empty()),
        };

        let mut column = Self {
            data_type: DataType::low_cardinality(inner_type),
            nullable,
            dictionary,
            lookup: HashMap::default(),
            indexes: Vec::new(),
            limits: LoadLimits::default(),
        };
        column.reset_dictionary()?;
        Ok(column)
    }

    /// Sets the limits applied when loading the dictionary.
    pub fn with_limits(mut self, limits: LoadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns if the column can hold nulls.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the dictionary of distinct values.
    pub fn dictionary(&self) -> &dyn Column {
        self.dictionary.as_ref()
    }

    /// Returns the dictionary index of every row.
    pub fn indexes(&self) -> &[u64] {
        &self.indexes
    }

    /// Returns the dictionary index of the given row.
    pub fn index_at(&self, index: usize) -> Result<u64, ColumnError> {
        check_index(index, self.indexes.len())?;
        Ok(self.indexes[index])
    }

    /// The number of dictionary slots which always exist, the default and optional null.
    fn base_dictionary_size(&self) -> usize {
        if self.nullable {
            2
        } else {
            1
        }
    }

    fn reset_dictionary(&mut self) -> Result<(), ColumnError> {
        self.dictionary.clear();
        self.lookup.clear();

        if self.nullable {
            self.dictionary.append_default();
        }
        self.dictionary.append_default();

        let default_index = self.dictionary.size() - 1;
        let default = self.dictionary.value_at(default_index)?;
        self.lookup
            .insert(HashableValue(default), default_index as u64);
        Ok(())
    }

    /// Returns the dictionary index of the value, adding it if it is new.
    fn intern(&mut self, value: Value) -> Result<u64, ColumnError> {
        if value.is_null() {
            if self.nullable {
                return Ok(NULL_INDEX);
            }
            return Err(ColumnError::type_mismatch(&self.data_type, value.kind()));
        }

        let key = HashableValue(value);
        if let Some(&index) = self.lookup.get(&key) {
            return Ok(index);
        }

        // Values are keyed by their stored form, i.e. padded fixed strings.
        self.dictionary.append_value(key.0)?;
        let last = self.dictionary.size() - 1;
        let stored = HashableValue(self.dictionary.value_at(last)?);
        if let Some(&index) = self.lookup.get(&stored) {
            self.dictionary.truncate(last);
            return Ok(index);
        }

        self.lookup.insert(stored, last as u64);
        Ok(last as u64)
    }

    fn index_width_code(&self) -> u64 {
        let size = self.dictionary.size() as u64;
        if size <= 1 << 8 {
            INDEX_U8
        } else if size <= 1 << 16 {
            INDEX_U16
        } else if size <= 1 << 32 {
            INDEX_U32
        } else {
            INDEX_U64
        }
    }

    fn read_header(&self, input: &mut dyn InputStream) -> Option<(u64, usize)> {
        let Some(flags) = input.read_fixed::<u64>() else {
            debug!("Input exhausted before dictionary flags were loaded");
            return None;
        };
        if flags & NEED_GLOBAL_DICTIONARY != 0 {
            warn!(flags, "Dictionary requires a global dictionary which is not supported");
            return None;
        }
        if flags & HAS_ADDITIONAL_KEYS == 0 {
            warn!(flags, "Dictionary is missing its additional keys");
            return None;
        }

        let width = flags & INDEX_WIDTH_MASK;
        if width > INDEX_U64 {
            warn!(flags, "Unknown dictionary index width");
            return None;
        }

        let Some(keys) = input.read_fixed::<u64>() else {
            debug!("Input exhausted before dictionary size was loaded");
            return None;
        };
        if keys > self.limits.max_array_size as u64 {
            warn!(
                keys,
                max_array_size = self.limits.max_array_size,
                "Dictionary size exceeds the configured limit"
            );
            return None;
        }

        Some((width, keys as usize))
    }
}

fn read_indexes_as<T: Pod + Into<u64>>(
    input: &mut dyn InputStream,
    rows: usize,
) -> Option<Vec<u64>> {
    let mut raw: Vec<T> = Vec::new();
    if !input.read_extend(&mut raw, rows) {
        return None;
    }
    Some(raw.into_iter().map(Into::into).collect())
}

fn read_indexes(input: &mut dyn InputStream, width: u64, rows: usize) -> Option<Vec<u64>> {
    match width {
        INDEX_U8 => read_indexes_as::<u8>(input, rows),
        INDEX_U16 => read_indexes_as::<u16>(input, rows),
        INDEX_U32 => read_indexes_as::<u32>(input, rows),
        _ => read_indexes_as::<u64>(input, rows),
    }
}

impl Column for ColumnLowCardinality {
    fn data_type(&self) -> &DataType {
        &self.data_type
    }

    fn size(&self) -> usize {
        self.indexes.len()
    }

    fn value_at(&self, index: usize) -> Result<Value, ColumnError> {
        let key = self.index_at(index)?;
        if self.nullable && key == NULL_INDEX {
            return Ok(Value::Null);
        }
        self.dictionary.value_at(key as usize)
    }

    fn append_value(&mut self, value: Value) -> Result<(), ColumnError> {
        let index = self.intern(value)?;
        self.indexes.push(index);
        Ok(())
    }

    fn append_default(&mut self) {
        // Slot zero is either null or the default value.
        self.indexes.push(0);
    }

    fn append_column(&mut self, other: &dyn Column) -> Result<(), ColumnError> {
        super::append_values(self, other)
    }

    fn slice(&self, offset: usize, length: usize) -> Result<ColumnRef, ColumnError> {
        check_slice(offset, length, self.indexes.len())?;

        let mut column = self.clone_empty();
        column.reserve(length);
        for index in offset..offset + length {
            column.append_value(self.value_at(index)?)?;
        }
        Ok(column)
    }

    fn clone_empty(&self) -> ColumnRef {
        let base = self.base_dictionary_size();
        let dictionary = self
            .dictionary
            .slice(0, base)
            .unwrap_or_else(|_| self.dictionary.clone_empty());
        let lookup = self
            .lookup
            .iter()
            .filter(|(_, &index)| index < base as u64)
            .map(|(value, &index)| (value.clone(), index))
            .collect();

        Box::new(Self {
            data_type: self.data_type.clone(),
            nullable: self.nullable,
            dictionary,
            lookup,
            indexes: Vec::new(),
            limits: self.limits,
        })
    }

    fn clear(&mut self) {
        self.indexes.clear();
        let base = self.base_dictionary_size();
        self.dictionary.truncate(base);
        self.lookup.retain(|_, index| *index < base as u64);
    }

    fn truncate(&mut self, len: usize) {
        self.indexes.truncate(len);
    }

    fn reserve(&mut self, additional: usize) {
        self.indexes.reserve(additional);
    }

    fn swap(&mut self, other: &mut dyn Column) -> Result<(), ColumnError> {
        swap_columns(self, other)
    }

    fn save_prefix(&self, output: &mut dyn OutputStream) -> Result<(), SinkError> {
        output.write_fixed(KEYS_SERIALIZATION_VERSION)
    }

    fn save_body(&self, output: &mut dyn OutputStream) -> Result<(), SinkError> {
        let width = self.index_width_code();
        output.write_fixed(width | HAS_ADDITIONAL_KEYS)?;
        output.write_fixed(self.dictionary.size() as u64)?;
        self.dictionary.save_body(output)?;
        output.write_fixed(self.indexes.len() as u64)?;

        match width {
            INDEX_U8 => {
                let raw: Vec<u8> = self.indexes.iter().map(|&i| i as u8).collect();
                output.write_slice(&raw)
            },
            INDEX_U16 => {
                let raw: Vec<u16> = self.indexes.iter().map(|&i| i as u16).collect();
                output.write_slice(&raw)
            },
            INDEX_U32 => {
                let raw: Vec<u32> = self.indexes.iter().map(|&i| i as u32).collect();
                output.write_slice(&raw)
            },
            _ => output.write_slice(&self.indexes),
        }
    }

    fn load_prefix(&mut self, input: &mut dyn InputStream, _rows: usize) -> bool {
        match input.read_fixed::<u64>() {
            Some(KEYS_SERIALIZATION_VERSION) => true,
            Some(version) => {
                warn!(version, "Unsupported dictionary key serialization version");
                false
            },
            None => {
                debug!("Input exhausted before dictionary version was loaded");
                false
            },
        }
    }

    fn load_body(&mut self, input: &mut dyn InputStream, rows: usize) -> bool {
        let Some((width, keys)) = self.read_header(input) else {
            return false;
        };

        let mut dictionary = self.dictionary.clone_empty();
        if !dictionary.load_body(input, keys) {
            return false;
        }

        match input.read_fixed::<u64>() {
            Some(count) if count == rows as u64 => {},
            Some(count) => {
                warn!(count, rows, "Dictionary row count does not match the requested rows");
                return false;
            },
            None => {
                debug!("Input exhausted before dictionary row count was loaded");
                return false;
            },
        }

        let Some(indexes) = read_indexes(input, width, rows) else {
            debug!(rows, "Input exhausted before dictionary indexes were loaded");
            return false;
        };
        if let Some(&index) = indexes.iter().find(|&&index| index >= keys as u64) {
            warn!(index, keys, "Dictionary index out of bounds");
            return false;
        }

        // Map every received key onto the local dictionary before touching any rows.
        let mut mapping = Vec::with_capacity(keys);
        for key in 0..keys {
            let local = if self.nullable && key as u64 == NULL_INDEX {
                Ok(NULL_INDEX)
            } else {
                dictionary
                    .value_at(key)
                    .and_then(|value| self.intern(value))
            };

            match local {
                Ok(local) => mapping.push(local),
                Err(e) => {
                    warn!(error = ?e, key, "Failed to map dictionary key");
                    return false;
                },
            }
        }

        self.indexes
            .extend(indexes.into_iter().map(|index| mapping[index as usize]));
        true
    }

    impl_any_methods!();
}
