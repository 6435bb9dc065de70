//! Dynamically typed rows read back from views.
//!
//! Analytical views are compared against literal fixtures, so rows are read
//! into [`Record`]s instead of typed structs.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tokio_postgres::Row;

use crate::{Error, Result};

/// One row: column name to value, in select-list order.
///
/// Equality ignores column order.
pub type Record = IndexMap<String, Value>;

/// Build a [`Record`] literal.
///
/// ```
/// use spotcheck::{Value, record};
///
/// let row = record! { "artista" => "Walter Phoenix", "seguidores" => 3 };
/// assert_eq!(row["seguidores"], Value::Int(3));
/// ```
#[macro_export]
macro_rules! record {
    ($($column:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut record = $crate::Record::new();
        $(record.insert(::std::string::String::from($column), $crate::Value::from($value));)*
        record
    }};
}

/// A scalar read from a result column.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    /// Any integer width, widened.
    Int(i64),
    Float(f64),
    /// `NUMERIC`
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            // COUNT(*) is bigint, but SUM() over it is numeric
            (Value::Int(i), Value::Decimal(d)) | (Value::Decimal(d), Value::Int(i)) => {
                d.fract().is_zero() && d.to_i64() == Some(*i)
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::TimestampTz(a), Value::TimestampTz(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Timestamp(ts) => write!(f, "{ts}"),
            Value::TimestampTz(ts) => write!(f, "{ts}"),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v $(as $cast)?)
            }
        })*
    };
}

impl_from! {
    bool => Bool,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int,
    f32 => Float as f64,
    f64 => Float,
    Decimal => Decimal,
    String => Text,
    NaiveDate => Date,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Read every column of `row` into a [`Record`].
pub fn from_row(row: &Row) -> Result<Record> {
    let mut record = Record::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let type_name = column.type_().name();
        let value = match type_name {
            "bool" => get::<bool>(row, idx)?,
            "int2" => get::<i16>(row, idx)?,
            "int4" => get::<i32>(row, idx)?,
            "int8" => get::<i64>(row, idx)?,
            "float4" => get::<f32>(row, idx)?,
            "float8" => get::<f64>(row, idx)?,
            "numeric" => get::<Decimal>(row, idx)?,
            "text" | "varchar" | "bpchar" | "name" => get::<String>(row, idx)?,
            "date" => get::<NaiveDate>(row, idx)?,
            "timestamp" => get::<NaiveDateTime>(row, idx)?,
            "timestamptz" => get::<DateTime<Utc>>(row, idx)?,
            _ => {
                return Err(Error::UnsupportedType {
                    column: name.to_string(),
                    type_name: type_name.to_string(),
                });
            }
        };
        record.insert(name.to_string(), value);
    }
    Ok(record)
}

fn get<'a, T>(row: &'a Row, idx: usize) -> Result<Value>
where
    T: tokio_postgres::types::FromSql<'a> + Into<Value>,
{
    Ok(row.try_get::<_, Option<T>>(idx)?.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_widths_compare_equal() {
        assert_eq!(Value::from(18i32), Value::from(18i64));
        assert_eq!(Value::from(3i16), Value::Int(3));
    }

    #[test]
    fn integer_equals_whole_decimal() {
        assert_eq!(Value::Int(5), Value::Decimal(Decimal::new(500, 2)));
        assert_ne!(Value::Int(5), Value::Decimal(Decimal::new(501, 2)));
    }

    #[test]
    fn text_is_not_a_number() {
        assert_ne!(Value::from("3"), Value::Int(3));
    }

    #[test]
    fn null_from_none() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_ne!(Value::Null, Value::Int(0));
    }

    #[test]
    fn record_macro_keeps_order() {
        let row = record! { "cancoes" => 18, "artistas" => 4, "albuns" => 5 };
        let columns: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(columns, ["cancoes", "artistas", "albuns"]);
    }

    #[test]
    fn record_equality_ignores_column_order() {
        let a = record! { "artista" => "Lance Day", "seguidores" => 2 };
        let b = record! { "seguidores" => 2, "artista" => "Lance Day" };
        assert_eq!(a, b);
    }
}
