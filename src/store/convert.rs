//! Value conversion between polars frames and SQLite columns.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use rusqlite::types::{Value, ValueRef};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Declared SQLite column type. DATE and TIMESTAMP hold ISO-8601 text so
/// SQLite's date functions (`julianday`, `strftime`) work on them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
    Date,
    Timestamp,
}

impl SqlType {
    pub fn for_dtype(dtype: &DataType) -> Option<Self> {
        match dtype {
            DataType::Boolean => Some(SqlType::Integer),
            DataType::Int32 | DataType::Int64 | DataType::UInt32 | DataType::UInt64 => {
                Some(SqlType::Integer)
            }
            d if d.is_float() => Some(SqlType::Real),
            DataType::String | DataType::Null => Some(SqlType::Text),
            DataType::Date => Some(SqlType::Date),
            DataType::Datetime(_, _) => Some(SqlType::Timestamp),
            _ => None,
        }
    }

    /// Maps a declared column type back, using SQLite's affinity rules for
    /// anything this crate did not write itself.
    pub fn from_decl(decl: &str) -> Self {
        let decl = decl.to_ascii_uppercase();
        if decl.contains("INT") {
            SqlType::Integer
        } else if decl.contains("TIMESTAMP") || decl.contains("DATETIME") {
            SqlType::Timestamp
        } else if decl.contains("DATE") {
            SqlType::Date
        } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
            SqlType::Real
        } else {
            SqlType::Text
        }
    }

    pub fn decl(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
            SqlType::Date => "DATE",
            SqlType::Timestamp => "TIMESTAMP",
        }
    }
}

fn epoch_date() -> NaiveDate {
    NaiveDate::default()
}

fn epoch_datetime() -> NaiveDateTime {
    NaiveDateTime::default()
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    epoch_date().checked_add_signed(Duration::days(days as i64))
}

pub fn date_to_days(date: NaiveDate) -> i32 {
    (date - epoch_date()).num_days() as i32
}

pub fn micros_to_datetime(micros: i64) -> Option<NaiveDateTime> {
    epoch_datetime().checked_add_signed(Duration::microseconds(micros))
}

pub fn datetime_to_micros(datetime: NaiveDateTime) -> Option<i64> {
    (datetime - epoch_datetime()).num_microseconds()
}

fn to_micros(value: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => value / 1_000,
        TimeUnit::Microseconds => value,
        TimeUnit::Milliseconds => value.saturating_mul(1_000),
    }
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(text).map(|dt| dt.date()))
}

pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Converts one polars cell into a SQLite value.
pub fn to_sql_value(value: AnyValue<'_>) -> Result<Value, String> {
    let converted = match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Integer(b as i64),
        AnyValue::Int32(i) => Value::Integer(i as i64),
        AnyValue::Int64(i) => Value::Integer(i),
        AnyValue::UInt32(u) => Value::Integer(u as i64),
        AnyValue::UInt64(u) => {
            Value::Integer(i64::try_from(u).map_err(|_| format!("value {} overflows INTEGER", u))?)
        }
        AnyValue::Float32(f) => Value::Real(f as f64),
        AnyValue::Float64(f) => Value::Real(f),
        AnyValue::String(s) => Value::Text(s.to_string()),
        AnyValue::StringOwned(s) => Value::Text(s.to_string()),
        AnyValue::Date(days) => match days_to_date(days) {
            Some(date) => Value::Text(date.format(DATE_FORMAT).to_string()),
            None => Value::Null,
        },
        AnyValue::Datetime(v, unit, _) => match micros_to_datetime(to_micros(v, unit)) {
            Some(dt) => Value::Text(dt.format(TIMESTAMP_FORMAT).to_string()),
            None => Value::Null,
        },
        other => return Err(format!("unsupported value {:?}", other)),
    };
    Ok(converted)
}

/// Column accumulator used when a stored table is read back into a frame.
pub enum ColumnBuffer {
    Integer(Vec<Option<i64>>),
    Real(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Date(Vec<Option<i32>>),
    Timestamp(Vec<Option<i64>>),
}

impl ColumnBuffer {
    pub fn new(sql_type: SqlType) -> Self {
        match sql_type {
            SqlType::Integer => ColumnBuffer::Integer(Vec::new()),
            SqlType::Real => ColumnBuffer::Real(Vec::new()),
            SqlType::Text => ColumnBuffer::Text(Vec::new()),
            SqlType::Date => ColumnBuffer::Date(Vec::new()),
            SqlType::Timestamp => ColumnBuffer::Timestamp(Vec::new()),
        }
    }

    pub fn push(&mut self, value: ValueRef<'_>) {
        match self {
            ColumnBuffer::Integer(values) => values.push(match value {
                ValueRef::Integer(i) => Some(i),
                ValueRef::Real(f) => Some(f as i64),
                ValueRef::Text(t) => std::str::from_utf8(t).ok().and_then(|s| s.trim().parse().ok()),
                _ => None,
            }),
            ColumnBuffer::Real(values) => values.push(match value {
                ValueRef::Integer(i) => Some(i as f64),
                ValueRef::Real(f) => Some(f),
                ValueRef::Text(t) => std::str::from_utf8(t).ok().and_then(|s| s.trim().parse().ok()),
                _ => None,
            }),
            ColumnBuffer::Text(values) => values.push(match value {
                ValueRef::Integer(i) => Some(i.to_string()),
                ValueRef::Real(f) => Some(f.to_string()),
                ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
                _ => None,
            }),
            ColumnBuffer::Date(values) => values.push(match value {
                ValueRef::Text(t) => std::str::from_utf8(t)
                    .ok()
                    .and_then(parse_date)
                    .map(date_to_days),
                _ => None,
            }),
            ColumnBuffer::Timestamp(values) => values.push(match value {
                ValueRef::Text(t) => std::str::from_utf8(t)
                    .ok()
                    .and_then(parse_timestamp)
                    .and_then(datetime_to_micros),
                _ => None,
            }),
        }
    }

    pub fn into_series(self, name: &str) -> PolarsResult<Series> {
        match self {
            ColumnBuffer::Integer(values) => Ok(Series::new(name, values)),
            ColumnBuffer::Real(values) => Ok(Series::new(name, values)),
            ColumnBuffer::Text(values) => Ok(Series::new(name, values)),
            ColumnBuffer::Date(values) => Series::new(name, values).cast(&DataType::Date),
            ColumnBuffer::Timestamp(values) => Series::new(name, values)
                .cast(&DataType::Datetime(TimeUnit::Microseconds, None)),
        }
    }
}
