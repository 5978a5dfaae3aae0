use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered mapping of query-parameter name to value, e.g.
/// `{region: "eu", realm: "gilneas"}`.
///
/// Used both as a lookup key and to test whether a record answers to it.
pub type ParamGroup = BTreeMap<String, Value>;

/// A dynamically typed value as it arrives from callers and backends.
///
/// Serializes externally tagged so that stored blobs keep the distinction
/// between text, raw bytes and numbers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Wraps raw bytes (image payloads and similar).
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(data.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::Str(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// "Empty" in the loose sense used for parameter merging: null, `false`,
    /// zero, `""`, `"0"` and empty containers.
    pub fn is_empty(&self) -> bool {
        !self.truthy()
    }

    /// Whether this value is a collection of elements rather than a single
    /// scalar or record-like mapping.
    ///
    /// A non-empty list is a collection. A non-empty map is a collection only
    /// when its keys are exactly the canonical integers `0..n`. Empty
    /// containers are never collections.
    pub fn is_collection(&self) -> bool {
        match self {
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty() && (0..map.len()).all(|i| map.contains_key(&i.to_string())),
            _ => false,
        }
    }

    /// Splits a collection into its elements in index order. Any other value
    /// becomes a single-element vector.
    pub fn into_elements(self) -> Vec<Value> {
        if !self.is_collection() {
            return vec![self];
        }
        match self {
            Value::List(items) => items,
            Value::Map(mut map) => (0..map.len())
                .filter_map(|i| map.remove(&i.to_string()))
                .collect(),
            other => vec![other],
        }
    }

    /// Renders the value as plain JSON. Bytes become base64 text and
    /// non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Str(s) => Json::String(s.clone()),
            Value::Bytes(b) => Json::String(BASE64.encode(b)),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Parses a plain JSON document (as returned by remote APIs).
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Ok(Value::from(json))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<const N: usize> From<[(&str, Value); N]> for Value {
    fn from(pairs: [(&str, Value); N]) -> Self {
        Value::Map(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
