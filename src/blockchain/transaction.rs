use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur during transaction operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Transaction record must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Represents a transaction record awaiting inclusion in a block
///
/// A transaction is an arbitrary key-value record; the pool performs no
/// semantic validation (no balances, no signatures). The record is stored as a
/// `serde_json` map, which keeps its keys sorted and therefore serializes
/// canonically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transaction {
    fields: Map<String, Value>,
}

impl Transaction {
    /// Builds a transaction from an already-canonicalized JSON value
    ///
    /// # Arguments
    ///
    /// * `value` - The serialized form of the caller's record
    ///
    /// # Returns
    ///
    /// Result with the transaction, or `NotAnObject` when the value is not a
    /// key-value mapping
    pub fn from_value(value: Value) -> Result<Self, TransactionError> {
        match value {
            Value::Object(fields) => Ok(Transaction { fields }),
            other => Err(TransactionError::NotAnObject(json_type_name(&other))),
        }
    }

    /// Gets a field of the record by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Gets the full key-value mapping
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Stamps the arrival time (unix milliseconds) unless the caller already
    /// supplied a `timestamp` field.
    pub(crate) fn stamp_arrival(&mut self, timestamp_millis: i64) {
        self.fields
            .entry("timestamp")
            .or_insert_with(|| Value::from(timestamp_millis));
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.fields).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Human-readable name of a JSON value's type, for error messages
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_accepts_object() {
        let tx =
            Transaction::from_value(json!({"from": "Alice", "to": "Bob", "amount": 50})).unwrap();

        assert_eq!(tx.get("from"), Some(&json!("Alice")));
        assert_eq!(tx.get("to"), Some(&json!("Bob")));
        assert_eq!(tx.get("amount"), Some(&json!(50)));
        assert_eq!(tx.get("missing"), None);
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        let err = Transaction::from_value(json!("just a string")).unwrap_err();
        assert!(err.to_string().contains("a string"));

        let err = Transaction::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_stamp_arrival_only_when_missing() {
        let mut tx = Transaction::from_value(json!({"amount": 1})).unwrap();
        tx.stamp_arrival(1_600_000_000_000);
        assert_eq!(tx.get("timestamp"), Some(&json!(1_600_000_000_000i64)));

        let mut tx = Transaction::from_value(json!({"amount": 1, "timestamp": 42})).unwrap();
        tx.stamp_arrival(1_600_000_000_000);
        assert_eq!(tx.get("timestamp"), Some(&json!(42)));
    }

    #[test]
    fn test_display_is_sorted_compact_json() {
        let tx = Transaction::from_value(json!({"to": "Bob", "from": "Alice"})).unwrap();
        assert_eq!(tx.to_string(), r#"{"from":"Alice","to":"Bob"}"#);
    }

    #[test]
    fn test_serialization_round_trip() {
        let tx = Transaction::from_value(json!({"from": "Alice", "amount": 50})).unwrap();

        let json = serde_json::to_string(&tx).unwrap();
        let deserialized: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, deserialized);
    }
}
