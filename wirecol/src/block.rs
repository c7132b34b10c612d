//! Blocks of named columns sharing a row count.

use tracing::{debug, instrument, warn};
use wirecol_io::{InputStream, OutputStream, WireRead, WireWrite};

use crate::{create_column, Column, ColumnError, ColumnRef, DataType, LoadLimits};

#[derive(Debug, Default)]
/// An ordered set of named columns which all have the same number of rows.
///
/// On the wire a block is written as:
///
/// ```text
/// varint  number of columns
/// varint  number of rows
/// per column:
///   string  column name
///   string  type name, e.g. `Nullable(String)`
///   ...     column prefix and body
/// ```
pub struct Block {
    columns: Vec<(String, ColumnRef)>,
    rows: usize,
}

impl Block {
    /// Creates a new, empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column to the end of the block.
    ///
    /// Returns [ColumnError::RowCountMismatch] if the block already holds
    /// columns with a different number of rows.
    pub fn append_column(
        &mut self,
        name: impl Into<String>,
        column: ColumnRef,
    ) -> Result<(), ColumnError> {
        if !self.columns.is_empty() && column.size() != self.rows {
            return Err(ColumnError::RowCountMismatch {
                expected: self.rows,
                actual: column.size(),
            });
        }

        self.rows = column.size();
        self.columns.push((name.into(), column));
        Ok(())
    }

    #[inline]
    /// The number of columns in the block.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    /// The number of rows shared by every column.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Returns the column at the given position.
    pub fn column(&self, index: usize) -> Option<&dyn Column> {
        self.columns.get(index).map(|(_, column)| column.as_ref())
    }

    /// Returns the first column with the given name.
    pub fn column_by_name(&self, name: &str) -> Option<&dyn Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, column)| column.as_ref())
    }

    /// Returns an iterator over every column and its name in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Column)> + '_ {
        self.columns
            .iter()
            .map(|(name, column)| (name.as_str(), column.as_ref()))
    }

    /// Removes every row from every column, keeping the columns.
    pub fn clear(&mut self) {
        for (_, column) in self.columns.iter_mut() {
            column.clear();
        }
        self.rows = 0;
    }

    #[instrument(level = "trace", skip_all, fields(columns = self.columns.len(), rows = self.rows))]
    /// Writes the block to the output.
    pub fn save(&self, output: &mut dyn OutputStream) -> Result<(), ColumnError> {
        output.write_varint(self.columns.len() as u64)?;
        output.write_varint(self.rows as u64)?;

        for (name, column) in self.columns.iter() {
            output.write_string(name.as_bytes())?;
            output.write_string(column.data_type().to_string().as_bytes())?;
            column.save(output)?;
        }
        Ok(())
    }

    #[instrument(level = "trace", skip_all)]
    /// Reads a block from the input, creating the columns from their type names.
    ///
    /// Returns `Ok(None)` if the input is exhausted before the block is read
    /// or the data is malformed, and an error if a type name is invalid.
    pub fn load(
        input: &mut dyn InputStream,
        limits: &LoadLimits,
    ) -> Result<Option<Self>, ColumnError> {
        let Some((columns, rows)) = read_header(input, limits) else {
            return Ok(None);
        };

        let mut block = Self {
            columns: Vec::with_capacity(columns.min(1024)),
            rows,
        };

        for _ in 0..columns {
            let Some(name) = input.read_string(limits.max_string_size) else {
                debug!("Input exhausted before column name was loaded");
                return Ok(None);
            };
            let Some(type_name) = input.read_string(limits.max_string_size) else {
                debug!("Input exhausted before column type was loaded");
                return Ok(None);
            };

            let type_name = String::from_utf8(type_name)
                .map_err(|e| ColumnError::InvalidTypeName(String::from_utf8_lossy(e.as_bytes()).into_owned()))?;
            let data_type: DataType = type_name.parse()?;
            let mut column = create_column(&data_type, limits)?;

            if !column.load(input, rows) {
                debug!(%data_type, rows, "Input exhausted before column data was loaded");
                return Ok(None);
            }

            let name = String::from_utf8_lossy(&name).into_owned();
            block.columns.push((name, column));
        }

        Ok(Some(block))
    }
}

fn read_header(input: &mut dyn InputStream, limits: &LoadLimits) -> Option<(usize, usize)> {
    let columns = input.read_varint()?;
    let rows = input.read_varint()?;

    if rows > limits.max_array_size as u64 {
        warn!(
            rows,
            max_array_size = limits.max_array_size,
            "Block row count exceeds the configured limit"
        );
        return None;
    }

    Some((columns as usize, rows as usize))
}
