//! Cell values moved between Firebird servers.
//!
//! Rows are ordered sequences of [`FbValue`]. Values are carried opaquely
//! from the source to the target; the engine never coerces them against the
//! target column type.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Error raised when a cell does not hold the kind of value a reader expects.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValueError {
    #[error("expected {expected} value, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("integer value {0} is out of range")]
    OutOfRange(i64),
}

/// A single tagged cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FbValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Binary(Vec<u8>),
    Boolean(bool),
}

impl FbValue {
    /// Name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FbValue::Null => "null",
            FbValue::Integer(_) => "integer",
            FbValue::Float(_) => "float",
            FbValue::Text(_) => "text",
            FbValue::Timestamp(_) => "timestamp",
            FbValue::Binary(_) => "binary",
            FbValue::Boolean(_) => "boolean",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FbValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FbValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FbValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text content with surrounding whitespace removed.
    ///
    /// Catalog names are blank-padded `CHAR` columns. `Null` reads as an
    /// empty string so callers can skip it with a single emptiness check.
    pub fn to_trimmed_text(&self) -> Result<String, ValueError> {
        match self {
            FbValue::Text(s) => Ok(s.trim().to_string()),
            FbValue::Binary(b) => Ok(String::from_utf8_lossy(b).trim().to_string()),
            FbValue::Null => Ok(String::new()),
            other => Err(ValueError::UnexpectedType {
                expected: "text",
                found: other.kind(),
            }),
        }
    }

    /// Optional 32-bit integer, where `Null` means absent.
    pub fn to_opt_i32(&self) -> Result<Option<i32>, ValueError> {
        match self {
            FbValue::Null => Ok(None),
            FbValue::Integer(i) => i32::try_from(*i)
                .map(Some)
                .map_err(|_| ValueError::OutOfRange(*i)),
            other => Err(ValueError::UnexpectedType {
                expected: "integer",
                found: other.kind(),
            }),
        }
    }
}

impl From<i64> for FbValue {
    fn from(value: i64) -> Self {
        FbValue::Integer(value)
    }
}

impl From<i32> for FbValue {
    fn from(value: i32) -> Self {
        FbValue::Integer(value as i64)
    }
}

impl From<f64> for FbValue {
    fn from(value: f64) -> Self {
        FbValue::Float(value)
    }
}

impl From<&str> for FbValue {
    fn from(value: &str) -> Self {
        FbValue::Text(value.to_string())
    }
}

impl From<String> for FbValue {
    fn from(value: String) -> Self {
        FbValue::Text(value)
    }
}

impl From<bool> for FbValue {
    fn from(value: bool) -> Self {
        FbValue::Boolean(value)
    }
}

impl From<NaiveDateTime> for FbValue {
    fn from(value: NaiveDateTime) -> Self {
        FbValue::Timestamp(value)
    }
}

impl From<Vec<u8>> for FbValue {
    fn from(value: Vec<u8>) -> Self {
        FbValue::Binary(value)
    }
}

impl<T: Into<FbValue>> From<Option<T>> for FbValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FbValue::Null)
    }
}
