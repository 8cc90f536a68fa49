//! Primary Key Helpers
//!
//! Keys keep their type: the number `7` and the string `"7"` are different
//! keys, as they are in IndexedDB.

use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    /// Decimal rendering of a numeric key
    Number(String),
    Text(String),
}

impl RecordKey {
    /// Key used to look up `raw`. Numeric strings are numbers only in
    /// tables whose keys are generated.
    pub fn lookup(raw: &str, numeric: bool) -> Self {
        match raw.parse::<f64>() {
            Ok(n) if numeric && n.is_finite() => RecordKey::Number(Value::from(n).to_string()),
            _ => RecordKey::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RecordKey::Number(n) => n.parse().ok(),
            RecordKey::Text(_) => None,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Number(n) => f.write_str(n),
            RecordKey::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Read the primary-key value of a record.
///
/// Strings and numbers are keys. Anything else (missing field, null,
/// nested value) has no key.
pub fn record_key(record: &Value, primary_key: &str) -> Option<RecordKey> {
    match record.get(primary_key)? {
        Value::String(s) => Some(RecordKey::Text(s.clone())),
        Value::Number(n) => n
            .as_f64()
            .map(|f| RecordKey::Number(Value::from(f).to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_key() {
        assert_eq!(
            record_key(&json!({"date": "2024-3-5"}), "date"),
            Some(RecordKey::Text("2024-3-5".to_string()))
        );
        assert_eq!(record_key(&json!({"id": null}), "id"), None);
        assert_eq!(record_key(&json!({"other": 1}), "id"), None);
        assert_eq!(record_key(&json!([1, 2]), "id"), None);
    }

    #[test]
    fn test_number_and_string_keys_differ() {
        let num = record_key(&json!({"k": 7}), "k").unwrap();
        let text = record_key(&json!({"k": "7"}), "k").unwrap();
        assert_ne!(num, text);
    }

    #[test]
    fn test_integer_and_float_forms_agree() {
        assert_eq!(
            record_key(&json!({"k": 2}), "k"),
            record_key(&json!({"k": 2.0}), "k")
        );
    }

    #[test]
    fn test_lookup() {
        assert_eq!(RecordKey::lookup("2", true), record_key(&json!({"id": 2}), "id").unwrap());
        assert_eq!(RecordKey::lookup("2", false), RecordKey::Text("2".to_string()));
        assert_eq!(RecordKey::lookup("abc", true), RecordKey::Text("abc".to_string()));
        assert_eq!(RecordKey::lookup("2", true).as_f64(), Some(2.0));
    }
}
