//! Free-form nested values carried by contexts and service outputs.
//!
//! `DataValue` is externally tagged so it survives both the JSON and the
//! bincode session encodings (bincode cannot decode self-describing values).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A nested, serializable value.
///
/// # Example
///
/// ```rust
/// use ussd_flow::core::DataValue;
///
/// let output = DataValue::success();
/// assert!(output.is_success());
/// assert_eq!(output.get("success").and_then(DataValue::as_bool), Some(true));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<DataValue>),
    Map(BTreeMap<String, DataValue>),
}

impl DataValue {
    /// The conventional `{ success: true }` service output.
    pub fn success() -> Self {
        let mut map = BTreeMap::new();
        map.insert("success".to_string(), DataValue::Bool(true));
        DataValue::Map(map)
    }

    /// True when this is a map whose `success` entry is `true`.
    pub fn is_success(&self) -> bool {
        self.get("success").and_then(DataValue::as_bool) == Some(true)
    }

    /// Look up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<&DataValue> {
        match self {
            DataValue::Map(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            DataValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Int(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Text(value)
    }
}

impl<V: Into<DataValue>> From<Vec<V>> for DataValue {
    fn from(values: Vec<V>) -> Self {
        DataValue::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_output_is_recognized() {
        assert!(DataValue::success().is_success());
        assert!(!DataValue::Null.is_success());
        assert!(!DataValue::Bool(true).is_success());
    }

    #[test]
    fn get_only_reads_maps() {
        let mut map = BTreeMap::new();
        map.insert("count".to_string(), DataValue::Int(3));
        let value = DataValue::Map(map);

        assert_eq!(value.get("count").and_then(DataValue::as_int), Some(3));
        assert!(value.get("missing").is_none());
        assert!(DataValue::from("text").get("count").is_none());
    }

    #[test]
    fn nested_value_survives_bincode() {
        let mut inner = BTreeMap::new();
        inner.insert("given_names".to_string(), DataValue::from("John"));
        inner.insert("tags".to_string(), DataValue::from(vec!["a", "b"]));
        let value = DataValue::Map(inner);

        let bytes = bincode::serialize(&value).unwrap();
        let decoded: DataValue = bincode::deserialize(&bytes).unwrap();

        assert_eq!(value, decoded);
    }
}
