//! Core Model Trait - Typed structs on top of dynamic records
//!
//! Application structs implement `Model` to move between their own fields
//! and the `Record` form the association layer and entity store work with.
//! Conversion goes through `serde_json`, so any struct that serializes to a
//! JSON object qualifies.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ModelError, ModelResult};

use super::primary_key::PrimaryKey;
use super::record::{Attributes, Record};

/// Core trait for typed models
pub trait Model: Sized + Serialize + DeserializeOwned {
    /// Model kind as stored on records
    fn model_name() -> &'static str;

    /// Primary key field name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Convert this model into a record. A missing, null or zero primary
    /// key yields an unsaved record.
    fn to_record(&self) -> ModelResult<Record> {
        let Value::Object(fields) = serde_json::to_value(self)? else {
            return Err(ModelError::Serialization(format!(
                "{} must serialize to an object",
                Self::model_name()
            )));
        };

        let mut attributes: Attributes = fields.into_iter().collect();
        let id = attributes
            .remove(Self::primary_key_name())
            .and_then(|value| PrimaryKey::from_value(&value))
            .filter(PrimaryKey::is_valid);

        let mut record = Record::new(Self::model_name(), attributes);
        if let Some(id) = id {
            record.set_id(id);
        }
        Ok(record)
    }

    /// Build this model from a record of the same kind
    fn from_record(record: &Record) -> ModelResult<Self> {
        if record.model() != Self::model_name() {
            return Err(ModelError::TypeMismatch {
                expected: Self::model_name().to_string(),
                actual: record.model().to_string(),
            });
        }

        let mut fields: serde_json::Map<String, Value> = record
            .attributes()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        if let Some(id) = record.id() {
            fields.insert(Self::primary_key_name().to_string(), id.to_value());
        }

        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}
