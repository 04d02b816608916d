//! Row decoding: driver-native cells to a canonical representation.
//!
//! Downstream reducers work on printable, comparable scalars, so the decode
//! pass coerces byte-sequence cells to text and maps everything else to its
//! JSON counterpart. One decode pass produces a [`DecodedRow`] that is
//! consumed immediately by a reducer.

use serde_json::Value;
use sqlx::any::AnyRow;
use sqlx::{Column, Row, TypeInfo};

/// A driver-native cell value, prior to normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

/// One result row after the decode pass: ordered column-to-value pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRow {
    cells: Vec<(String, Value)>,
}

impl DecodedRow {
    /// Number of columns in this row.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The ordered column-to-value pairs.
    pub fn cells(&self) -> &[(String, Value)] {
        &self.cells
    }

    /// Look up a cell by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Decode a driver row into its canonical representation.
    ///
    /// Columns are read by their driver type name the same way the values
    /// will be consumed: booleans, integers, floats, and blobs directly,
    /// everything else as text. A cell that fails to decode becomes null.
    pub fn from_any_row(row: &AnyRow) -> Self {
        let mut cells = Vec::with_capacity(row.columns().len());

        for (i, column) in row.columns().iter().enumerate() {
            let name = column.name().to_string();
            let raw = match column.type_info().name() {
                "BOOL" | "BOOLEAN" => row
                    .try_get::<bool, _>(i)
                    .map(RawValue::Bool)
                    .unwrap_or(RawValue::Null),
                "INT2" | "INT4" | "INT8" | "INTEGER" | "BIGINT" | "SMALLINT" => row
                    .try_get::<i64, _>(i)
                    .map(RawValue::Int)
                    .unwrap_or(RawValue::Null),
                "FLOAT4" | "FLOAT8" | "REAL" | "DOUBLE" => row
                    .try_get::<f64, _>(i)
                    .map(RawValue::Float)
                    .unwrap_or(RawValue::Null),
                "BYTEA" | "BLOB" | "BINARY" | "VARBINARY" => row
                    .try_get::<Vec<u8>, _>(i)
                    .map(RawValue::Bytes)
                    .unwrap_or(RawValue::Null),
                _ => row
                    .try_get::<String, _>(i)
                    .map(RawValue::Text)
                    .unwrap_or(RawValue::Null),
            };
            cells.push((name, raw));
        }

        decode_row(cells)
    }
}

/// Normalize raw cells into a [`DecodedRow`].
///
/// Byte sequences are coerced to text (lossy UTF-8); null and scalar values
/// pass through unchanged.
pub fn decode_row(cells: Vec<(String, RawValue)>) -> DecodedRow {
    DecodedRow {
        cells: cells
            .into_iter()
            .map(|(name, raw)| (name, decode_cell(raw)))
            .collect(),
    }
}

fn decode_cell(raw: RawValue) -> Value {
    match raw {
        RawValue::Null => Value::Null,
        RawValue::Bool(v) => Value::Bool(v),
        RawValue::Int(v) => Value::Number(v.into()),
        RawValue::Float(v) => serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        RawValue::Text(v) => Value::String(v),
        RawValue::Bytes(v) => Value::String(String::from_utf8_lossy(&v).into_owned()),
    }
}

// From impls so callers can hand literals to decode_row.
impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Int(v as i64)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(v: Vec<u8>) -> Self {
        RawValue::Bytes(v)
    }
}
