//! Ordered column → value mapping
//!
//! Serialized as a JSON object whose keys keep live column order.
//! Duplicate keys are rejected on read.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::value::Value;

/// One table row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a column value
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, value.into());
        self
    }

    /// Append a column value, replacing an earlier value for the same column
    pub fn push(&mut self, column: &str, value: Value) {
        match self.entries.iter_mut().find(|(name, _)| name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column.to_string(), value)),
        }
    }

    /// Value for a column, if present
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in row order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.push(&column, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, value) in &self.entries {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of column values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
        let mut entries: Vec<(String, Value)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((column, value)) = access.next_entry::<String, Value>()? {
            if entries.iter().any(|(name, _)| *name == column) {
                return Err(serde::de::Error::custom(format!(
                    "duplicate column '{}'",
                    column
                )));
            }
            entries.push((column, value));
        }
        Ok(Row { entries })
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RowVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_order_preserved() {
        let row = Row::new()
            .with("id", 1)
            .with("name", "ann")
            .with("email", "a@x")
            .with("groupId", Some(1));

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"id":1,"name":"ann","email":"a@x","groupId":1}"#);

        let parsed: Row = serde_json::from_str(&json).unwrap();
        let columns: Vec<&str> = parsed.columns().collect();
        assert_eq!(columns, vec!["id", "name", "email", "groupId"]);
        assert_eq!(parsed, row);
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = serde_json::from_str::<Row>(r#"{"id": 1, "id": 2}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_push_replaces() {
        let mut row = Row::new().with("id", 1);
        row.push("id", Value::Integer(2));
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("id"), Some(&Value::Integer(2)));
    }
}
