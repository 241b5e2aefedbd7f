use std::fmt::Write;

use hashbrown::HashMap as FastMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::json;

use crate::err::{SerializationError, SerializationResult};

/// Map payload behind [`Value::Dict`], also used by the attribute stores.
pub type ValueMap = FastMap<String, Value, ahash::RandomState>;

/// A single attribute value.
///
/// The variant set is closed: strings, 64-bit signed integers, booleans, raw
/// byte strings, string-keyed dicts and sequences. There is deliberately no
/// floating point variant; floats reaching the [`serde_json`] bridge are
/// rejected instead of coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Integer(i64),
    Boolean(bool),
    /// Opaque binary payload, rendered as uppercase hex in JSON output.
    Bytes(Vec<u8>),
    Dict(ValueMap),
    Array(Vec<Value>),
}

impl Value {
    /// Human readable variant name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::Bytes(_) => "bytes",
            Value::Dict(_) => "dict",
            Value::Array(_) => "array",
        }
    }

    /// Whether this is an empty string, byte string, dict or array.
    ///
    /// Integers and booleans are never empty, so `0` and `false` survive the
    /// codec's empty-value drop.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::String(s) => s.is_empty(),
            Value::Bytes(bytes) => bytes.is_empty(),
            Value::Dict(entries) => entries.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Integer(_) | Value::Boolean(_) => false,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Builds a [`Value::Dict`] from name and value pairs.
    pub fn dict<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = ValueMap::default();
        for (name, value) in entries {
            map.insert(name.into(), value.into());
        }
        Value::Dict(map)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Bytes(bytes.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<ValueMap> for Value {
    fn from(entries: ValueMap) -> Self {
        Value::Dict(entries)
    }
}

pub(crate) fn hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, &b| {
            write!(acc, "{:02X}", b).unwrap();
            acc
        })
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => json!(s),
            Value::Integer(n) => json!(n),
            Value::Boolean(b) => json!(b),
            Value::Bytes(bytes) => json!(hex_string(bytes)),
            Value::Dict(entries) => {
                let mut names: Vec<&String> = entries.keys().collect();
                names.sort_unstable();

                let mut map = serde_json::Map::with_capacity(names.len());
                for name in names {
                    map.insert(name.clone(), serde_json::Value::from(&entries[name]));
                }
                serde_json::Value::Object(map)
            }
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        serde_json::Value::from(&value)
    }
}

impl TryFrom<&serde_json::Value> for Value {
    type Error = SerializationError;

    fn try_from(value: &serde_json::Value) -> SerializationResult<Self> {
        match value {
            serde_json::Value::Null => {
                Err(SerializationError::UnsupportedJsonValue { kind: "null" })
            }
            serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(v) => Ok(Value::Integer(v)),
                None => Err(SerializationError::UnsupportedJsonValue {
                    kind: if n.is_f64() {
                        "float"
                    } else {
                        "out-of-range integer"
                    },
                }),
            },
            serde_json::Value::String(s) => Ok(Value::String(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Value::try_from)
                .collect::<SerializationResult<Vec<Value>>>()
                .map(Value::Array),
            serde_json::Value::Object(entries) => {
                let mut map = ValueMap::default();
                for (name, item) in entries {
                    map.insert(name.clone(), Value::try_from(item)?);
                }
                Ok(Value::Dict(map))
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Bytes(bytes) => serializer.serialize_str(&hex_string(bytes)),
            Value::Dict(entries) => {
                let mut names: Vec<&String> = entries.keys().collect();
                names.sort_unstable();

                let mut map = serializer.serialize_map(Some(names.len()))?;
                for name in names {
                    map.serialize_entry(name, &entries[name])?;
                }
                map.end()
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}
