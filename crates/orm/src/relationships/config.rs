//! Belongs-To Configuration - Definition of a single belongs-to association

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::store::{Condition, ConditionOperator, FindOptions};

/// Configuration of a belongs-to association
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BelongsToConfig {
    /// Name of the association (field name on the owner)
    pub name: String,

    /// Model kind of the target
    pub target_model: String,

    /// Other model kinds accepted on assignment (subtypes of the target)
    #[serde(default)]
    pub compatible_models: Vec<String>,

    /// Owner attribute holding the target identifier, `<name>_id` when empty
    #[serde(default)]
    pub foreign_key: String,

    /// Counter attribute on the target kind counting its owners
    #[serde(default)]
    pub counter_cache: Option<String>,

    /// Scoping conditions applied when loading the target
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Associations of the target to eager load with it
    #[serde(default)]
    pub include: Vec<String>,

    /// Load the target read-only
    #[serde(default)]
    pub readonly: bool,

    /// Fail with `NotFound` when the foreign key points at nothing
    #[serde(default)]
    pub required: bool,
}

impl BelongsToConfig {
    /// Create a configuration with the derived `<name>_id` foreign key
    pub fn new(name: &str, target_model: &str) -> Self {
        Self {
            name: name.to_string(),
            target_model: target_model.to_string(),
            compatible_models: Vec::new(),
            foreign_key: format!("{}_id", name),
            counter_cache: None,
            conditions: Vec::new(),
            include: Vec::new(),
            readonly: false,
            required: false,
        }
    }

    /// Parse a configuration from JSON, deriving the foreign key if omitted
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Set the foreign key attribute
    pub fn with_foreign_key(mut self, foreign_key: &str) -> Self {
        self.foreign_key = foreign_key.to_string();
        self
    }

    /// Accept records of another (sub)kind on assignment
    pub fn with_compatible_model(mut self, model: &str) -> Self {
        self.compatible_models.push(model.to_string());
        self
    }

    /// Maintain `column` on the target kind
    pub fn with_counter_cache(mut self, column: &str) -> Self {
        self.counter_cache = Some(column.to_string());
        self
    }

    /// Maintain the conventional `<owner_table>_count` column
    pub fn with_default_counter_cache(self, owner_table: &str) -> Self {
        let column = format!("{}_count", owner_table);
        self.with_counter_cache(&column)
    }

    /// Add a scoping condition
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Eager load an association of the target
    pub fn with_include(mut self, association: &str) -> Self {
        self.include.push(association.to_string());
        self
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Fill in defaults left empty by deserialization
    pub fn normalized(mut self) -> Self {
        if self.foreign_key.is_empty() && !self.name.is_empty() {
            self.foreign_key = format!("{}_id", self.name);
        }
        self
    }

    /// Whether a record of `model` may be assigned to this association
    pub fn accepts(&self, model: &str) -> bool {
        self.target_model == model || self.compatible_models.iter().any(|m| m == model)
    }

    /// Options to find the target with
    pub fn find_options(&self) -> FindOptions {
        FindOptions {
            conditions: self.conditions.clone(),
            include: self.include.clone(),
            readonly: self.readonly,
        }
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> ModelResult<()> {
        if self.name.is_empty() {
            return Err(ModelError::Configuration(
                "Association name cannot be empty".to_string()
            ));
        }

        if self.target_model.is_empty() {
            return Err(ModelError::Configuration(format!(
                "Association '{}' must name a target model",
                self.name
            )));
        }

        if self.foreign_key.is_empty() {
            return Err(ModelError::Configuration(format!(
                "Association '{}' must have a foreign key",
                self.name
            )));
        }

        if matches!(self.counter_cache.as_deref(), Some("")) {
            return Err(ModelError::Configuration(format!(
                "Counter cache column of association '{}' cannot be empty",
                self.name
            )));
        }

        for condition in &self.conditions {
            let needs_value = matches!(
                condition.operator,
                ConditionOperator::Equal | ConditionOperator::NotEqual
            );
            if needs_value && condition.value.is_none() {
                return Err(ModelError::Configuration(format!(
                    "Condition on '{}' in association '{}' requires a value",
                    condition.column, self.name
                )));
            }
        }

        Ok(())
    }
}
