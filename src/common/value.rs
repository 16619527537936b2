// Scalar Value Implementation
//
// This module defines the typed cell stored in records and produced by operators.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{Column, DataType};
use crate::query::executor::result::{QueryError, QueryResult};

/// Canonical storage and display format of dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Decimals kept when rendering floats, before trailing zeros are trimmed
pub const DEFAULT_FLOAT_PRECISION: usize = 2;

/// A typed scalar cell.
///
/// Integers and floats compare with each other through numeric widening,
/// text and dates compare byte-wise with each other. The `Ord` implementation
/// is a total order (numeric kinds sort before string kinds) so values can be
/// used as index keys; predicate evaluation goes through [`Value::compare`],
/// which rejects numeric-versus-string comparisons instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Integer(i32),
    Float(f64),
    Text(String),
    /// Fixed-width `YYYY-MM-DD` string
    Date(String),
}

impl Value {
    /// Build a text value
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Build a date value, validating and normalising the input
    pub fn date(s: &str) -> QueryResult<Self> {
        let parsed = NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map_err(|e| QueryError::InvalidArgument(format!("invalid date '{}': {}", s, e)))?;
        Ok(Value::Date(parsed.format(DATE_FORMAT).to_string()))
    }

    /// The catalog type this value naturally belongs to
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::Text(_) => DataType::Text,
            Value::Date(_) => DataType::Date,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Numeric view of the value, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(f64::from(*i)),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Date(s) => Some(s),
            _ => None,
        }
    }

    /// Type-aware comparison used by predicates and aggregates.
    pub fn compare(&self, other: &Value) -> QueryResult<Ordering> {
        if self.is_numeric() != other.is_numeric() {
            return Err(QueryError::TypeError(format!(
                "cannot compare {} with {}",
                self.data_type(),
                other.data_type()
            )));
        }
        Ok(self.cmp(other))
    }

    /// Convert the value for storage into `column`, applying the same
    /// rules to inserted and updated values.
    pub fn coerce_to(self, column: &Column) -> QueryResult<Value> {
        let coerced = match (column.data_type(), self) {
            (DataType::Integer, v @ Value::Integer(_)) => v,
            (DataType::Float, Value::Integer(i)) => Value::Float(f64::from(i)),
            (DataType::Float, v @ Value::Float(_)) => v,
            (DataType::Text, Value::Text(s)) => {
                if s.len() > column.length() {
                    return Err(QueryError::InvalidArgument(format!(
                        "value of length {} exceeds column '{}' length {}",
                        s.len(),
                        column.name(),
                        column.length()
                    )));
                }
                Value::Text(s)
            }
            (DataType::Date, Value::Text(s)) | (DataType::Date, Value::Date(s)) => Value::date(&s)?,
            (expected, v) => {
                return Err(QueryError::InvalidArgument(format!(
                    "column '{}' expects {}, got {}",
                    column.name(),
                    expected,
                    v.data_type()
                )));
            }
        };
        Ok(coerced)
    }

    /// Render with a custom float precision
    pub fn to_display_string(&self, float_precision: usize) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format_float(*f, float_precision),
            Value::Text(s) | Value::Date(s) => s.clone(),
        }
    }
}

/// Fixed precision, then trailing zeros and a dangling point trimmed.
pub fn format_float(value: f64, precision: usize) -> String {
    let mut s = format!("{:.*}", precision, value);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string(DEFAULT_FLOAT_PRECISION))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        if let (Value::Integer(a), Value::Integer(b)) = (self, other) {
            return a.cmp(b);
        }
        match (self.as_f64(), other.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or_else(|| x.total_cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => match (self.as_str(), other.as_str()) {
                (Some(x), Some(y)) => x.as_bytes().cmp(y.as_bytes()),
                _ => Ordering::Equal,
            },
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}
