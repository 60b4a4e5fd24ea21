//! Records - Dynamic entity instances exchanged with the entity store
//!
//! A `Record` carries its model kind, an optional identifier (absent while
//! the record is unsaved) and a map of attribute values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::primary_key::PrimaryKey;

/// Attribute name to value map
pub type Attributes = HashMap<String, Value>;

/// An entity instance of some model kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    model: String,
    #[serde(default)]
    id: Option<PrimaryKey>,
    #[serde(default)]
    attributes: Attributes,
    #[serde(default)]
    readonly: bool,
}

impl Record {
    /// Create an unsaved record
    pub fn new(model: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            model: model.into(),
            id: None,
            attributes,
            readonly: false,
        }
    }

    /// Create a record that already has a durable identifier
    pub fn persisted(
        model: impl Into<String>,
        id: impl Into<PrimaryKey>,
        attributes: Attributes,
    ) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::new(model, attributes)
        }
    }

    /// Model kind of this record
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn id(&self) -> Option<&PrimaryKey> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: impl Into<PrimaryKey>) {
        self.id = Some(id.into());
    }

    /// True until the store assigns an identifier
    pub fn is_new_record(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn mark_readonly(&mut self) {
        self.readonly = true;
    }

    /// Get an attribute value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Set an attribute value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Attribute names in sorted order
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All attribute values, including the identifier under `id` when the
    /// record is persisted
    pub fn attribute_values(&self) -> Attributes {
        let mut values = self.attributes.clone();
        if let Some(id) = &self.id {
            values.insert("id".to_string(), id.to_value());
        }
        values
    }

    /// Copy attribute values from another record, skipping `exclude`.
    /// The identifier and model kind are left alone.
    pub fn copy_attributes_from(&mut self, other: &Record, exclude: &[&str]) {
        for (name, value) in &other.attributes {
            if !exclude.contains(&name.as_str()) {
                self.attributes.insert(name.clone(), value.clone());
            }
        }
    }
}
