use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A single column value as returned by the engine driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Text(CompactString),
    Integer(i64),
    Null,
}

impl Value {
    pub fn text(value: impl Into<CompactString>) -> Self {
        Value::Text(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

/// Positional result row; column order follows the SELECT list of the query
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn from_values(values: Vec<Value>) -> Self {
        Self { values }
    }
}

/// Named bind parameter for a catalog query (`:name` placeholders).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bind {
    pub name: &'static str,
    pub value: Value,
}

impl Bind {
    pub fn text(name: &'static str, value: impl Into<CompactString>) -> Self {
        Self {
            name,
            value: Value::Text(value.into()),
        }
    }
}

pub trait TryFromRow: Sized {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowDecodeError {
    #[error("missing column '{column}' at index {index}")]
    MissingColumn { column: String, index: usize },
    #[error("column '{column}' type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },
}

pub fn decode_rows<T: TryFromRow>(rows: Vec<Row>) -> Result<Vec<T>, RowDecodeError> {
    rows.into_iter().map(T::try_from_row).collect()
}

pub fn text_at<'a>(row: &'a Row, index: usize, column: &str) -> Result<&'a str, RowDecodeError> {
    match row.values.get(index) {
        Some(Value::Text(v)) => Ok(v.as_str()),
        Some(other) => Err(RowDecodeError::TypeMismatch {
            column: column.to_string(),
            expected: "Text",
            actual: value_kind(other),
        }),
        None => Err(RowDecodeError::MissingColumn {
            column: column.to_string(),
            index,
        }),
    }
}

/// Like [`text_at`], but a NULL column decodes as `None`.
pub fn opt_text_at<'a>(
    row: &'a Row,
    index: usize,
    column: &str,
) -> Result<Option<&'a str>, RowDecodeError> {
    match row.values.get(index) {
        Some(Value::Null) => Ok(None),
        _ => text_at(row, index, column).map(Some),
    }
}

pub fn i64_at(row: &Row, index: usize, column: &str) -> Result<i64, RowDecodeError> {
    match row.values.get(index) {
        Some(Value::Integer(v)) => Ok(*v),
        Some(other) => Err(RowDecodeError::TypeMismatch {
            column: column.to_string(),
            expected: "Integer",
            actual: value_kind(other),
        }),
        None => Err(RowDecodeError::MissingColumn {
            column: column.to_string(),
            index,
        }),
    }
}

/// Decodes the catalog's `YES`/`NO` and `Y`/`N` flag columns.
pub fn flag_at(row: &Row, index: usize, column: &str) -> Result<bool, RowDecodeError> {
    match text_at(row, index, column)? {
        "YES" | "Y" => Ok(true),
        "NO" | "N" => Ok(false),
        _ => Err(RowDecodeError::TypeMismatch {
            column: column.to_string(),
            expected: "YES/NO flag",
            actual: "Text",
        }),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Text(_) => "Text",
        Value::Integer(_) => "Integer",
        Value::Null => "Null",
    }
}
