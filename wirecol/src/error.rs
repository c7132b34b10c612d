use wirecol_io::SinkError;

#[derive(Debug, thiserror::Error)]
/// An error that can occur when operating on a column.
///
/// All errors are local to the operation that triggered them, the column
/// remains valid and unchanged afterward.
pub enum ColumnError {
    #[error("Index {index} out of bounds for column of size {size}")]
    /// A row was accessed past the end of the column.
    IndexOutOfBounds { index: usize, size: usize },
    #[error("Slice {offset}..{offset}+{length} out of bounds for column of size {size}")]
    /// A slice was requested which does not fit within the column.
    SliceOutOfBounds {
        offset: usize,
        length: usize,
        size: usize,
    },
    #[error("Type mismatch: expected {expected}, got {actual}")]
    /// A value, column or narrowing target does not match the column type.
    TypeMismatch { expected: String, actual: String },
    #[error("Value of {len} bytes exceeds the fixed width of {width} bytes")]
    /// A fixed width value was appended which is longer than the column width.
    ///
    /// Values are never truncated.
    ValueTooLong { width: usize, len: usize },
    #[error("Value {value} out of range for {type_name}")]
    /// A value does not fit within the storage of the column.
    ValueOutOfRange { value: String, type_name: String },
    #[error("Unknown enum value: {0}")]
    /// An enum code or name which is not part of the enum mapping.
    UnknownEnumValue(String),
    #[error("Invalid type name: {0:?}")]
    /// The type name could not be parsed into a data type.
    InvalidTypeName(String),
    #[error("Row count mismatch: expected {expected}, got {actual}")]
    /// A column was added to a block with a different number of rows.
    RowCountMismatch { expected: usize, actual: usize },
    #[error("Sink Error: {0}")]
    /// The output sink rejected the write.
    SinkError(#[from] SinkError),
}

impl ColumnError {
    pub(crate) fn type_mismatch(
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn out_of_range(value: impl ToString, type_name: impl ToString) -> Self {
        Self::ValueOutOfRange {
            value: value.to_string(),
            type_name: type_name.to_string(),
        }
    }
}
