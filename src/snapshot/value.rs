//! Scalar values carried in snapshot rows
//!
//! JSON mapping:
//!
//! ```text
//! null              → Null
//! true / false      → Bool
//! 42                → Integer
//! 4.5               → Real
//! "text"            → Text   (timestamps are normalized text)
//! {"$base64": "…"}  → Blob
//! {"$text": "…"}    → Literal
//! ```
//!
//! `Literal` is text that must be restored as-is even though it looks
//! like a normalized timestamp.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::catalog::ColumnKind;

/// Base64 wrapper so binary data survives a JSON round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlobValue {
    #[serde(rename = "$base64")]
    pub data: String,
}

impl BlobValue {
    /// Decode the base64 payload
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// Text exempt from timestamp conversion on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LiteralText {
    #[serde(rename = "$text")]
    pub text: String,
}

/// One column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(BlobValue),
    Literal(LiteralText),
}

/// Hashable, comparable form of a non-null value, used to match foreign
/// keys against referenced keys.
///
/// Booleans and integral reals collapse onto integers, matching how the
/// values compare once stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    Integer(i64),
    Real(u64),
    Text(String),
    Blob(String),
}

impl Value {
    /// Wrap raw bytes
    pub fn blob(bytes: &[u8]) -> Self {
        Value::Blob(BlobValue {
            data: STANDARD.encode(bytes),
        })
    }

    /// Text value
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Text that restore must not reinterpret
    pub fn literal(s: impl Into<String>) -> Self {
        Value::Literal(LiteralText { text: s.into() })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Decode blob bytes; `None` for non-blobs
    pub fn blob_bytes(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        match self {
            Value::Blob(blob) => Some(blob.decode()),
            _ => None,
        }
    }

    /// Key form for reference matching; `None` for nulls
    pub fn key(&self) -> Option<KeyValue> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(KeyValue::Integer(i64::from(*b))),
            Value::Integer(i) => Some(KeyValue::Integer(*i)),
            Value::Real(r) => {
                if r.fract() == 0.0 && *r >= i64::MIN as f64 && *r <= i64::MAX as f64 {
                    Some(KeyValue::Integer(*r as i64))
                } else {
                    Some(KeyValue::Real(r.to_bits()))
                }
            }
            Value::Text(s) => Some(KeyValue::Text(s.clone())),
            Value::Literal(literal) => Some(KeyValue::Text(literal.text.clone())),
            Value::Blob(blob) => Some(KeyValue::Blob(blob.data.clone())),
        }
    }

    /// The value as a column of `kind` would hold it once stored.
    ///
    /// TEXT affinity turns numbers into text. Numeric affinities turn
    /// well-formed numeric text into numbers. Blobs, nulls and columns
    /// without affinity are left alone.
    pub fn with_affinity(&self, kind: ColumnKind) -> Value {
        match (kind, self) {
            (_, Value::Null) | (_, Value::Blob(_)) | (ColumnKind::Blob, _) => self.clone(),
            (_, Value::Literal(literal)) => Value::Text(literal.text.clone()).with_affinity(kind),
            (ColumnKind::Text, Value::Bool(b)) => Value::Text(i64::from(*b).to_string()),
            (ColumnKind::Text, Value::Integer(i)) => Value::Text(i.to_string()),
            (ColumnKind::Text, Value::Real(r)) => Value::Text(real_text(*r)),
            (ColumnKind::Text, Value::Text(_)) => self.clone(),
            (_, Value::Text(s)) => numeric_text(s).unwrap_or_else(|| self.clone()),
            _ => self.clone(),
        }
    }
}

/// SQLite's text rendering of a real: integral values keep a `.0`
fn real_text(r: f64) -> String {
    if r.is_finite() && r.fract() == 0.0 && r.abs() < 1e15 {
        format!("{:.1}", r)
    } else {
        r.to_string()
    }
}

/// Number held in `s`, if SQLite would read it as one
fn numeric_text(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if !trimmed.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    // Rust also accepts "inf" and "NaN"; the digit check above rules them out
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
        .map(Value::Real)
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Literal(literal) => write!(f, "{:?}", literal.text),
            Value::Blob(blob) => write!(f, "<blob {}>", blob.data),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
