//! Temporal columns.
//!
//! All temporal values are stored as integer counts since the unix epoch,
//! the raw counts are exposed through the [ColumnVector] API and the `chrono`
//! helpers convert to and from calendar types.

use chrono::{DateTime, Days, NaiveDate, Utc};

use super::fixed::{ColumnVector, FixedKind};
use crate::{Column, ColumnError, DataType, Value};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

fn unix_epoch() -> NaiveDate {
    NaiveDate::default()
}

fn days_since_epoch(date: NaiveDate) -> i64 {
    date.signed_duration_since(unix_epoch()).num_days()
}

fn date_from_days(days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        unix_epoch().checked_add_days(Days::new(days as u64))
    } else {
        unix_epoch().checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

macro_rules! temporal_kind {
    ($kind:ident, $native:ty, $variant:ident, $doc:literal) => {
        #[derive(Debug, Clone)]
        #[doc = $doc]
        pub struct $kind;

        impl FixedKind for $kind {
            type Native = $native;
            type Item = $native;

            #[inline]
            fn to_native(item: Self::Item) -> Self::Native {
                item
            }

            #[inline]
            fn from_native(native: Self::Native) -> Self::Item {
                native
            }

            #[inline]
            fn into_value(item: Self::Item) -> Value {
                Value::$variant(item)
            }

            #[inline]
            fn from_value(value: Value) -> Result<Self::Item, Value> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }
        }
    };
}

temporal_kind!(DateKind, u16, Date, "Days since the unix epoch as a `u16`.");
temporal_kind!(Date32Kind, i32, Date32, "Days since the unix epoch as an `i32`.");
temporal_kind!(DateTimeKind, u32, DateTime, "Seconds since the unix epoch as a `u32`.");
temporal_kind!(DateTime64Kind, i64, DateTime64, "Sub-second ticks since the unix epoch as an `i64`.");

/// A column of `Date` values.
pub type ColumnDate = ColumnVector<DateKind>;
/// A column of `Date32` values.
pub type ColumnDate32 = ColumnVector<Date32Kind>;
/// A column of `DateTime` values.
pub type ColumnDateTime = ColumnVector<DateTimeKind>;
/// A column of `DateTime64(precision)` values.
pub type ColumnDateTime64 = ColumnVector<DateTime64Kind>;

impl ColumnDate {
    /// Creates a new, empty column.
    pub fn new() -> Self {
        Self::with_type(DataType::Date)
    }

    /// Appends a calendar date.
    ///
    /// Returns [ColumnError::ValueOutOfRange] for dates outside of `1970-01-01..=2149-06-06`.
    pub fn append_date(&mut self, date: NaiveDate) -> Result<(), ColumnError> {
        let days = u16::try_from(days_since_epoch(date))
            .map_err(|_| ColumnError::out_of_range(date, DataType::Date))?;
        self.append(days);
        Ok(())
    }

    /// Returns the calendar date at the given row.
    pub fn date_at(&self, index: usize) -> Result<NaiveDate, ColumnError> {
        let days = self.at(index)?;
        date_from_days(i64::from(days))
            .ok_or_else(|| ColumnError::out_of_range(days, DataType::Date))
    }
}

impl Default for ColumnDate {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnDate32 {
    /// Creates a new, empty column.
    pub fn new() -> Self {
        Self::with_type(DataType::Date32)
    }

    /// Appends a calendar date.
    pub fn append_date(&mut self, date: NaiveDate) -> Result<(), ColumnError> {
        let days = i32::try_from(days_since_epoch(date))
            .map_err(|_| ColumnError::out_of_range(date, DataType::Date32))?;
        self.append(days);
        Ok(())
    }

    /// Returns the calendar date at the given row.
    pub fn date_at(&self, index: usize) -> Result<NaiveDate, ColumnError> {
        let days = self.at(index)?;
        date_from_days(i64::from(days))
            .ok_or_else(|| ColumnError::out_of_range(days, DataType::Date32))
    }
}

impl Default for ColumnDate32 {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnDateTime {
    /// Creates a new, empty column without an explicit timezone.
    pub fn new() -> Self {
        Self::with_type(DataType::DateTime { timezone: None })
    }

    /// Creates a new, empty column with the given timezone.
    ///
    /// The timezone only affects the data type, values are always stored
    /// as seconds since the unix epoch.
    pub fn with_timezone(timezone: impl Into<String>) -> Self {
        Self::with_type(DataType::DateTime {
            timezone: Some(timezone.into()),
        })
    }

    /// Returns the timezone of the column if set.
    pub fn timezone(&self) -> Option<&str> {
        match self.data_type() {
            DataType::DateTime { timezone } => timezone.as_deref(),
            _ => None,
        }
    }

    /// Appends a point in time, sub-second precision is discarded.
    pub fn append_datetime(&mut self, datetime: DateTime<Utc>) -> Result<(), ColumnError> {
        let seconds = u32::try_from(datetime.timestamp())
            .map_err(|_| ColumnError::out_of_range(datetime, self.data_type()))?;
        self.append(seconds);
        Ok(())
    }

    /// Returns the point in time at the given row.
    pub fn datetime_at(&self, index: usize) -> Result<DateTime<Utc>, ColumnError> {
        let seconds = self.at(index)?;
        DateTime::from_timestamp(i64::from(seconds), 0)
            .ok_or_else(|| ColumnError::out_of_range(seconds, self.data_type()))
    }
}

impl Default for ColumnDateTime {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnDateTime64 {
    /// Creates a new, empty column with `10^precision` ticks per second.
    ///
    /// Returns [ColumnError::InvalidTypeName] if the precision exceeds 9.
    pub fn new(precision: u8) -> Result<Self, ColumnError> {
        DataType::datetime64(precision).map(Self::with_type)
    }

    /// Creates a new, empty column with the given precision and timezone.
    pub fn with_timezone(
        precision: u8,
        timezone: impl Into<String>,
    ) -> Result<Self, ColumnError> {
        DataType::datetime64_with_timezone(precision, Some(timezone.into()))
            .map(Self::with_type)
    }

    /// Returns the sub-second precision of the column.
    pub fn precision(&self) -> u8 {
        match self.data_type() {
            DataType::DateTime64 { precision, .. } => *precision,
            _ => 0,
        }
    }

    /// Returns the timezone of the column if set.
    pub fn timezone(&self) -> Option<&str> {
        match self.data_type() {
            DataType::DateTime64 { timezone, .. } => timezone.as_deref(),
            _ => None,
        }
    }

    fn ticks_per_second(&self) -> i64 {
        10i64.pow(u32::from(self.precision()))
    }

    /// Appends a point in time truncated to the column precision.
    pub fn append_datetime(&mut self, datetime: DateTime<Utc>) -> Result<(), ColumnError> {
        let nanos_per_tick = NANOS_PER_SECOND / self.ticks_per_second();
        let ticks = datetime
            .timestamp()
            .checked_mul(self.ticks_per_second())
            .and_then(|ticks| {
                ticks.checked_add(i64::from(datetime.timestamp_subsec_nanos()) / nanos_per_tick)
            })
            .ok_or_else(|| ColumnError::out_of_range(datetime, self.data_type()))?;
        self.append(ticks);
        Ok(())
    }

    /// Returns the point in time at the given row.
    pub fn datetime_at(&self, index: usize) -> Result<DateTime<Utc>, ColumnError> {
        let ticks = self.at(index)?;
        let ticks_per_second = self.ticks_per_second();
        let seconds = ticks.div_euclid(ticks_per_second);
        let nanos = ticks.rem_euclid(ticks_per_second) * (NANOS_PER_SECOND / ticks_per_second);
        DateTime::from_timestamp(seconds, nanos as u32)
            .ok_or_else(|| ColumnError::out_of_range(ticks, self.data_type()))
    }
}

#[cfg(test)]
mod tests {
    use wirecol_io::BufferOutput;

    use super::*;

    #[test]
    fn test_date_round_trip() {
        let mut column = ColumnDate::new();
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        column.append_date(date).unwrap();
        assert_eq!(column.at(0).unwrap(), 19782);
        assert_eq!(column.date_at(0).unwrap(), date);

        let before_epoch = NaiveDate::from_ymd_opt(1969, 12, 31).unwrap();
        assert!(matches!(
            column.append_date(before_epoch),
            Err(ColumnError::ValueOutOfRange { .. })
        ));
        assert_eq!(column.size(), 1);
    }

    #[test]
    fn test_date32_before_epoch() {
        let mut column = ColumnDate32::new();
        let date = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        column.append_date(date).unwrap();
        assert_eq!(column.at(0).unwrap(), -25567);
        assert_eq!(column.date_at(0).unwrap(), date);
    }

    #[test]
    fn test_datetime_timezone_in_type() {
        let column = ColumnDateTime::with_timezone("UTC");
        assert_eq!(column.timezone(), Some("UTC"));
        assert_eq!(column.data_type().to_string(), "DateTime('UTC')");
        assert_ne!(column.data_type(), ColumnDateTime::new().data_type());
    }

    #[test]
    fn test_datetime64_precision() {
        let mut column = ColumnDateTime64::new(3).unwrap();
        let datetime = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        column.append_datetime(datetime).unwrap();
        assert_eq!(column.at(0).unwrap(), 1_700_000_000_123);
        assert_eq!(
            column.datetime_at(0).unwrap(),
            DateTime::from_timestamp(1_700_000_000, 123_000_000).unwrap()
        );

        let mut output = BufferOutput::new();
        column.save(&mut output).unwrap();
        assert_eq!(output.len(), 8);
    }

    #[test]
    fn test_datetime64_negative_ticks() {
        let mut column = ColumnDateTime64::new(3).unwrap();
        column.append(-1);
        assert_eq!(
            column.datetime_at(0).unwrap(),
            DateTime::from_timestamp(-1, 999_000_000).unwrap()
        );
    }

    #[test]
    fn test_datetime64_swap_requires_same_precision() {
        let mut a = ColumnDateTime64::new(3).unwrap();
        a.append(1);
        let mut b = ColumnDateTime64::new(6).unwrap();
        assert!(matches!(a.swap(&mut b), Err(ColumnError::TypeMismatch { .. })));
        assert_eq!(a.size(), 1);
        assert_eq!(b.size(), 0);
    }
}
