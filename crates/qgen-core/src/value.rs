//! Values and rows exchanged with the database.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// A single cell value as returned by (or sent to) the database.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Borrow the value as text when it is textual.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            SqlValue::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// NULL, empty text and empty bytes carry no usable value.
    pub fn is_empty(&self) -> bool {
        match self {
            SqlValue::Null => true,
            SqlValue::Text(s) => s.is_empty(),
            SqlValue::Bytes(b) => b.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Int(v) => write!(f, "{v}"),
            SqlValue::UInt(v) => write!(f, "{v}"),
            SqlValue::Float(v) => write!(f, "{v}"),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

/// A result row: column names paired with values, in result-set order.
///
/// Serializes as a JSON object keyed by column name, like a dictionary cursor row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new(cells: Vec<(String, SqlValue)>) -> Self {
        Self { cells }
    }

    /// Value at position `index`.
    pub fn value(&self, index: usize) -> Option<&SqlValue> {
        self.cells.get(index).map(|(_, v)| v)
    }

    /// Value of the column named `name` (ASCII case-insensitive).
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.cells
            .iter()
            .find(|(column, _)| column.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_renders_sql_text() {
        assert_eq!(SqlValue::Null.to_string(), "NULL");
        assert_eq!(SqlValue::Int(-7).to_string(), "-7");
        assert_eq!(SqlValue::UInt(42).to_string(), "42");
        assert_eq!(SqlValue::Float(0.5).to_string(), "0.5");
        assert_eq!(SqlValue::from("abc").to_string(), "abc");
        assert_eq!(SqlValue::Bytes(b"xyz".to_vec()).to_string(), "xyz");
    }

    #[test]
    fn test_is_empty() {
        assert!(SqlValue::Null.is_empty());
        assert!(SqlValue::Text(String::new()).is_empty());
        assert!(SqlValue::Bytes(Vec::new()).is_empty());
        assert!(!SqlValue::Int(0).is_empty());
        assert!(!SqlValue::from("a").is_empty());
    }

    #[test]
    fn test_row_lookup_and_json() {
        let row = Row::new(vec![
            ("id".to_string(), SqlValue::Int(1)),
            ("name".to_string(), SqlValue::from("ann")),
        ]);

        assert_eq!(row.len(), 2);
        assert_eq!(row.value(1), Some(&SqlValue::from("ann")));
        assert_eq!(row.get("ID"), Some(&SqlValue::Int(1)));
        assert_eq!(row.get("missing"), None);

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, serde_json::json!({"id": 1, "name": "ann"}));
    }
}
