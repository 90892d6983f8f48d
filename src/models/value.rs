//! Column values returned by the clinical source
//!
//! The source returns rows as name → value mappings. The creation path only
//! interprets a handful of columns and coerces them with the helpers below.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::DateFormatConfig;
use crate::error::{CohortError, Result};
use crate::utils::date_utils::parse_date_string;

/// A single value in a source row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

/// A source row keyed by column name
pub type Row = FxHashMap<String, Value>;

impl Value {
    /// Whether the value is SQL NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Coerce to an integer the way a subject identifier is read
    ///
    /// Integers pass through, finite floats are truncated and text must parse as
    /// an integer.
    pub fn to_i64(&self, column: &str) -> Result<i64> {
        match self {
            Self::Int(v) => Ok(*v),
            Self::Float(v) if v.is_finite() => Ok(v.trunc() as i64),
            Self::Text(s) => s.trim().parse::<i64>().map_err(|e| CohortError::InvalidValue {
                column: column.to_string(),
                message: format!("'{s}' is not an integer: {e}"),
            }),
            other => Err(CohortError::InvalidValue {
                column: column.to_string(),
                message: format!("cannot convert {other:?} to an integer"),
            }),
        }
    }

    /// Coerce to a date, parsing text with the configured formats
    pub fn to_date(&self, column: &str, config: &DateFormatConfig) -> Result<NaiveDate> {
        match self {
            Self::Date(d) => Ok(*d),
            Self::Text(s) => {
                parse_date_string(s.trim(), config).ok_or_else(|| CohortError::InvalidValue {
                    column: column.to_string(),
                    message: format!("'{s}' is not a recognised date"),
                })
            }
            other => Err(CohortError::InvalidValue {
                column: column.to_string(),
                message: format!("cannot convert {other:?} to a date"),
            }),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
