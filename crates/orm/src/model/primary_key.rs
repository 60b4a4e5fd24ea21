//! Primary Key System - Identifier values for records and foreign keys
//!
//! Supports integer, UUID and text identifiers, with conversion to and from
//! the JSON values records store their attributes as. The conversion is
//! lossless: a key read back from its attribute value has the same variant
//! it was written with.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ModelError;

/// Attribute form of a text key that would otherwise read back as a UUID
const TEXT_TAG: &str = "text";

/// Primary key types supported by the association layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Value", try_from = "Value")]
pub enum PrimaryKey {
    /// Auto-incrementing integer primary key
    Integer(i64),
    /// UUID primary key
    Uuid(Uuid),
    /// Natural text key
    Text(String),
}

impl std::fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimaryKey::Integer(id) => write!(f, "{}", id),
            PrimaryKey::Uuid(id) => write!(f, "{}", id),
            PrimaryKey::Text(id) => write!(f, "{}", id),
        }
    }
}

impl PrimaryKey {
    /// Extract as i64 if this is an Integer primary key
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PrimaryKey::Integer(id) => Some(*id),
            _ => None,
        }
    }

    /// Extract as UUID if this is a UUID primary key
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            PrimaryKey::Uuid(id) => Some(*id),
            _ => None,
        }
    }

    /// Check if this is a valid (non-default) primary key
    pub fn is_valid(&self) -> bool {
        match self {
            PrimaryKey::Integer(id) => *id > 0,
            PrimaryKey::Uuid(uuid) => !uuid.is_nil(),
            PrimaryKey::Text(text) => !text.is_empty(),
        }
    }

    /// Convert to the JSON value stored in a foreign key attribute.
    /// Text keys that parse as a UUID are written as `{"text": "..."}`.
    pub fn to_value(&self) -> Value {
        match self {
            PrimaryKey::Integer(id) => Value::from(*id),
            PrimaryKey::Uuid(id) => Value::String(id.to_string()),
            PrimaryKey::Text(id) if Uuid::parse_str(id).is_ok() => {
                let mut tagged = serde_json::Map::new();
                tagged.insert(TEXT_TAG.to_string(), Value::String(id.clone()));
                Value::Object(tagged)
            }
            PrimaryKey::Text(id) => Value::String(id.clone()),
        }
    }

    /// Read a key back from an attribute value. `null` and other values
    /// carry no key.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(PrimaryKey::Integer),
            Value::String(s) => Some(
                Uuid::parse_str(s)
                    .map(PrimaryKey::Uuid)
                    .unwrap_or_else(|_| PrimaryKey::Text(s.clone())),
            ),
            Value::Object(tagged) if tagged.len() == 1 => tagged
                .get(TEXT_TAG)
                .and_then(Value::as_str)
                .map(|text| PrimaryKey::Text(text.to_string())),
            _ => None,
        }
    }
}

impl From<PrimaryKey> for Value {
    fn from(key: PrimaryKey) -> Self {
        key.to_value()
    }
}

impl TryFrom<Value> for PrimaryKey {
    type Error = ModelError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        PrimaryKey::from_value(&value)
            .ok_or_else(|| ModelError::Serialization(format!("Not a primary key: {}", value)))
    }
}

impl From<i64> for PrimaryKey {
    fn from(id: i64) -> Self {
        PrimaryKey::Integer(id)
    }
}

impl From<i32> for PrimaryKey {
    fn from(id: i32) -> Self {
        PrimaryKey::Integer(i64::from(id))
    }
}

impl From<Uuid> for PrimaryKey {
    fn from(id: Uuid) -> Self {
        PrimaryKey::Uuid(id)
    }
}

impl From<&str> for PrimaryKey {
    fn from(id: &str) -> Self {
        PrimaryKey::Text(id.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(id: String) -> Self {
        PrimaryKey::Text(id)
    }
}
