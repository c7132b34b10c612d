//! The polymorphic column contract and all concrete column types.
//!
//! Every column is a homogeneous, insertion ordered sequence of values of one
//! [DataType]. Callers interact with columns through [Column] (usually behind a
//! [ColumnRef]) and only recover the concrete type through the checked
//! [as_strict](trait.Column.html#method.as_strict) family of methods.

mod array;
mod date;
mod decimal;
mod enums;
mod fixed;
mod lowcardinality;
mod nullable;
mod string;
mod tuple;

use std::any::{self, Any};
use std::fmt::Debug;
use std::mem;

use wirecol_io::{InputStream, OutputStream, SinkError};

pub use self::array::ColumnArray;
pub use self::date::{ColumnDate, ColumnDate32, ColumnDateTime, ColumnDateTime64};
pub use self::decimal::ColumnDecimal;
pub use self::enums::{ColumnEnum, ColumnEnum16, ColumnEnum8, EnumCode};
pub use self::fixed::{
    ColumnFloat32,
    ColumnFloat64,
    ColumnIPv4,
    ColumnIPv6,
    ColumnInt128,
    ColumnInt16,
    ColumnInt32,
    ColumnInt64,
    ColumnInt8,
    ColumnUInt128,
    ColumnUInt16,
    ColumnUInt32,
    ColumnUInt64,
    ColumnUInt8,
    ColumnUuid,
    ColumnVector,
    FixedKind,
};
pub use self::lowcardinality::ColumnLowCardinality;
pub use self::nullable::ColumnNullable;
pub use self::string::{ColumnFixedString, ColumnString};
pub use self::tuple::ColumnTuple;
use crate::{ColumnError, DataType, Value};

/// An owned, type erased column.
pub type ColumnRef = Box<dyn Column>;

/// The uniform interface implemented by every column.
///
/// A column exclusively owns its storage. Compound columns own their inner
/// columns by composition and forward the relevant operations to them.
///
/// Columns are single writer: no operation may be called concurrently on the
/// same column without external synchronization, but distinct columns can be
/// used from different threads freely.
pub trait Column: Any + Debug + Send + Sync {
    /// Returns the type descriptor of the column.
    ///
    /// This never changes for the lifetime of the column.
    fn data_type(&self) -> &DataType;

    /// Returns the number of rows in the column.
    fn size(&self) -> usize;

    #[inline]
    /// Returns if the column has no rows.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns the value at the given row.
    ///
    /// Returns [ColumnError::IndexOutOfBounds] if `index >= size()`.
    fn value_at(&self, index: usize) -> Result<Value, ColumnError>;

    /// Appends a single value to the end of the column.
    ///
    /// The value must match the data type of the column, otherwise a
    /// [ColumnError::TypeMismatch] is returned and the column is unchanged.
    fn append_value(&mut self, value: Value) -> Result<(), ColumnError>;

    /// Appends the default (zero) value of the column type.
    fn append_default(&mut self);

    /// Appends every row of another column with an identical data type.
    fn append_column(&mut self, other: &dyn Column) -> Result<(), ColumnError>;

    /// Returns a new, independently owned column containing a copy of
    /// the rows in `offset..offset + length`.
    ///
    /// A zero length slice at `offset == size()` is valid and produces an
    /// empty column.
    fn slice(&self, offset: usize, length: usize) -> Result<ColumnRef, ColumnError>;

    /// Returns a new, empty column with the same data type.
    fn clone_empty(&self) -> ColumnRef;

    /// Removes all rows from the column.
    fn clear(&mut self);

    /// Shortens the column to `len` rows.
    ///
    /// Has no effect if `len` is greater than the current size.
    fn truncate(&mut self, len: usize);

    /// Reserves capacity for at least `additional` more rows.
    fn reserve(&mut self, additional: usize);

    /// Exchanges the contents of this column with another column.
    ///
    /// Both columns must be the same concrete type with equal data types,
    /// otherwise a [ColumnError::TypeMismatch] is returned and neither
    /// column is modified.
    fn swap(&mut self, other: &mut dyn Column) -> Result<(), ColumnError>;

    /// Writes any state that must precede the column data on the wire.
    fn save_prefix(&self, _output: &mut dyn OutputStream) -> Result<(), SinkError> {
        Ok(())
    }

    /// Writes every value currently held in index order.
    fn save_body(&self, output: &mut dyn OutputStream) -> Result<(), SinkError>;

    /// Writes the column prefix followed by the column body.
    fn save(&self, output: &mut dyn OutputStream) -> Result<(), SinkError> {
        self.save_prefix(output)?;
        self.save_body(output)
    }

    /// Reads any state that precedes the column data on the wire.
    ///
    /// Returns `false` if the input is exhausted or malformed.
    fn load_prefix(&mut self, _input: &mut dyn InputStream, _rows: usize) -> bool {
        true
    }

    /// Appends exactly `rows` values read from the input.
    ///
    /// Returns `false` if the input is exhausted before all rows are read
    /// or the data is malformed, in which case the column is left unchanged.
    fn load_body(&mut self, input: &mut dyn InputStream, rows: usize) -> bool;

    /// Reads the column prefix followed by `rows` values.
    ///
    /// Returns `false` if the input is exhausted before all rows are read,
    /// in which case the column is left unchanged.
    fn load(&mut self, input: &mut dyn InputStream, rows: usize) -> bool {
        self.load_prefix(input, rows) && self.load_body(input, rows)
    }

    /// Upcasts the column to [Any].
    fn as_any(&self) -> &dyn Any;

    /// Upcasts the column to a mutable [Any].
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Upcasts the boxed column to a boxed [Any].
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl dyn Column {
    /// Narrows the column to its concrete type.
    ///
    /// Returns a [ColumnError::TypeMismatch] if the column is not a `T`.
    pub fn as_strict<T: Column>(&self) -> Result<&T, ColumnError> {
        self.as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| ColumnError::type_mismatch(any::type_name::<T>(), self.data_type()))
    }

    /// Narrows the column to its concrete type mutably.
    pub fn as_strict_mut<T: Column>(&mut self) -> Result<&mut T, ColumnError> {
        let actual = self.data_type().to_string();
        self.as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| ColumnError::type_mismatch(any::type_name::<T>(), actual))
    }

    /// Narrows the boxed column to its concrete type.
    pub fn into_strict<T: Column>(self: Box<Self>) -> Result<Box<T>, ColumnError> {
        let actual = self.data_type().to_string();
        self.into_any()
            .downcast::<T>()
            .map_err(|_| ColumnError::type_mismatch(any::type_name::<T>(), actual))
    }
}

macro_rules! impl_any_methods {
    () => {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }

        fn into_any(self: Box<Self>) -> Box<dyn std::any::Any> {
            self
        }
    };
}
pub(crate) use impl_any_methods;

#[inline]
pub(crate) fn check_index(index: usize, size: usize) -> Result<(), ColumnError> {
    if index >= size {
        return Err(ColumnError::IndexOutOfBounds { index, size });
    }
    Ok(())
}

#[inline]
pub(crate) fn check_slice(offset: usize, length: usize, size: usize) -> Result<(), ColumnError> {
    match offset.checked_add(length) {
        Some(end) if end <= size => Ok(()),
        _ => Err(ColumnError::SliceOutOfBounds {
            offset,
            length,
            size,
        }),
    }
}

/// Downcasts `other` to the same concrete type and data type as `this`.
pub(crate) fn same_column<'a, T: Column>(
    this: &T,
    other: &'a dyn Column,
) -> Result<&'a T, ColumnError> {
    match other.as_any().downcast_ref::<T>() {
        Some(other) if other.data_type() == this.data_type() => Ok(other),
        _ => Err(ColumnError::type_mismatch(this.data_type(), other.data_type())),
    }
}

/// Swaps `this` with `other` if they are the same concrete type and data type.
pub(crate) fn swap_columns<T: Column>(
    this: &mut T,
    other: &mut dyn Column,
) -> Result<(), ColumnError> {
    let actual = other.data_type().to_string();
    match other.as_any_mut().downcast_mut::<T>() {
        Some(other) if other.data_type() == this.data_type() => {
            mem::swap(this, other);
            Ok(())
        },
        _ => Err(ColumnError::type_mismatch(this.data_type(), actual)),
    }
}

/// Appends every row of `other` to `this` through the dynamic value API.
///
/// Used by columns where a bulk copy would need to re-encode values anyway.
pub(crate) fn append_values(
    this: &mut dyn Column,
    other: &dyn Column,
) -> Result<(), ColumnError> {
    if this.data_type() != other.data_type() {
        return Err(ColumnError::type_mismatch(this.data_type(), other.data_type()));
    }

    let before = this.size();
    this.reserve(other.size());
    for index in 0..other.size() {
        let result = other
            .value_at(index)
            .and_then(|value| this.append_value(value));

        if let Err(e) = result {
            this.truncate(before);
            return Err(e);
        }
    }
    Ok(())
}
