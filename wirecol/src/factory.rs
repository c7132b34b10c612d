//! Creating columns from data types and type names.

use tracing::trace;

use crate::column::*;
use crate::{ColumnError, DataType, LoadLimits};

/// Creates a new, empty column for the given data type.
///
/// The limits are applied to every column created, including nested ones.
pub fn create_column(data_type: &DataType, limits: &LoadLimits) -> Result<ColumnRef, ColumnError> {
    trace!(%data_type, "Creating column");

    let column: ColumnRef = match data_type {
        DataType::Int8 => Box::new(ColumnInt8::new()),
        DataType::Int16 => Box::new(ColumnInt16::new()),
        DataType::Int32 => Box::new(ColumnInt32::new()),
        DataType::Int64 => Box::new(ColumnInt64::new()),
        DataType::Int128 => Box::new(ColumnInt128::new()),
        DataType::UInt8 => Box::new(ColumnUInt8::new()),
        DataType::UInt16 => Box::new(ColumnUInt16::new()),
        DataType::UInt32 => Box::new(ColumnUInt32::new()),
        DataType::UInt64 => Box::new(ColumnUInt64::new()),
        DataType::UInt128 => Box::new(ColumnUInt128::new()),
        DataType::Float32 => Box::new(ColumnFloat32::new()),
        DataType::Float64 => Box::new(ColumnFloat64::new()),
        DataType::String => Box::new(ColumnString::new().with_limits(*limits)),
        DataType::FixedString(width) => Box::new(ColumnFixedString::new(*width)?),
        DataType::Date => Box::new(ColumnDate::new()),
        DataType::Date32 => Box::new(ColumnDate32::new()),
        DataType::DateTime { timezone: None } => Box::new(ColumnDateTime::new()),
        DataType::DateTime {
            timezone: Some(timezone),
        } => Box::new(ColumnDateTime::with_timezone(timezone.as_str())),
        DataType::DateTime64 {
            precision,
            timezone: None,
        } => Box::new(ColumnDateTime64::new(*precision)?),
        DataType::DateTime64 {
            precision,
            timezone: Some(timezone),
        } => Box::new(ColumnDateTime64::with_timezone(*precision, timezone.as_str())?),
        DataType::Decimal { precision, scale } => Box::new(ColumnDecimal::new(*precision, *scale)?),
        DataType::Uuid => Box::new(ColumnUuid::new()),
        DataType::IPv4 => Box::new(ColumnIPv4::new()),
        DataType::IPv6 => Box::new(ColumnIPv6::new()),
        DataType::Enum8(items) => Box::new(ColumnEnum8::new(items.clone())?),
        DataType::Enum16(items) => Box::new(ColumnEnum16::new(items.clone())?),
        DataType::Nullable(inner) => Box::new(ColumnNullable::new(create_column(inner, limits)?)),
        DataType::Array(inner) => {
            Box::new(ColumnArray::new(create_column(inner, limits)?).with_limits(*limits))
        },
        DataType::Tuple(items) => {
            let columns = items
                .iter()
                .map(|item| create_column(item, limits))
                .collect::<Result<Vec<_>, _>>()?;
            Box::new(ColumnTuple::new(columns)?)
        },
        DataType::LowCardinality(inner) => Box::new(
            ColumnLowCardinality::new(create_column(inner, limits)?)?.with_limits(*limits),
        ),
    };

    Ok(column)
}

/// Parses the type name and creates a new, empty column for it with default limits.
///
/// ```
/// use wirecol::create_column_by_name;
///
/// let column = create_column_by_name("Array(Nullable(String))").unwrap();
/// assert_eq!(column.data_type().to_string(), "Array(Nullable(String))");
/// ```
pub fn create_column_by_name(name: &str) -> Result<ColumnRef, ColumnError> {
    let data_type: DataType = name.parse()?;
    create_column(&data_type, &LoadLimits::default())
}
