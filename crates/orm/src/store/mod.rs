//! Entity Store - The persistence collaborator consumed by associations
//!
//! The association layer never talks to a database directly. It calls an
//! `EntityStore` to create, build and find records and to maintain counter
//! caches. `MemoryStore` is an in-process implementation of the contract.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelResult;
use crate::model::{Attributes, PrimaryKey, Record};

pub use memory::{MemoryStore, StoreCall};

/// Persistence operations the association layer relies on
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Persist a new record of `model` and return it with its identifier
    async fn create(&self, model: &str, attributes: Attributes) -> ModelResult<Record>;

    /// Instantiate an unsaved record of `model`
    fn build(&self, model: &str, attributes: Attributes) -> ModelResult<Record> {
        Ok(Record::new(model, attributes))
    }

    /// Find the record of `model` with identifier `id` that satisfies
    /// `options`; `None` when there is no match
    async fn find_by_id(
        &self,
        model: &str,
        id: &PrimaryKey,
        options: &FindOptions,
    ) -> ModelResult<Option<Record>>;

    /// Add one to `counter` on the record of `model` with identifier `id`
    async fn increment_counter(&self, model: &str, counter: &str, id: &PrimaryKey) -> ModelResult<()>;

    /// Subtract one from `counter` on the record of `model` with identifier `id`
    async fn decrement_counter(&self, model: &str, counter: &str, id: &PrimaryKey) -> ModelResult<()>;
}

/// Condition operators understood by finders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equal,
    NotEqual,
    IsNull,
    IsNotNull,
}

impl std::fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionOperator::Equal => write!(f, "="),
            ConditionOperator::NotEqual => write!(f, "!="),
            ConditionOperator::IsNull => write!(f, "IS NULL"),
            ConditionOperator::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

/// Scoping condition applied when an association loads its target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Option<Value>,
}

impl Condition {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self {
            column: column.to_string(),
            operator: ConditionOperator::Equal,
            value: Some(value.into()),
        }
    }

    pub fn ne(column: &str, value: impl Into<Value>) -> Self {
        Self {
            column: column.to_string(),
            operator: ConditionOperator::NotEqual,
            value: Some(value.into()),
        }
    }

    pub fn is_null(column: &str) -> Self {
        Self {
            column: column.to_string(),
            operator: ConditionOperator::IsNull,
            value: None,
        }
    }

    pub fn is_not_null(column: &str) -> Self {
        Self {
            column: column.to_string(),
            operator: ConditionOperator::IsNotNull,
            value: None,
        }
    }

    /// Whether `record` satisfies this condition. The `id` column reads
    /// the record identifier; missing attributes compare as null.
    pub fn matches(&self, record: &Record) -> bool {
        let actual = if self.column == "id" {
            record.id().map(PrimaryKey::to_value).unwrap_or(Value::Null)
        } else {
            record.get(&self.column).cloned().unwrap_or(Value::Null)
        };
        let expected = self.value.as_ref().unwrap_or(&Value::Null);

        match self.operator {
            ConditionOperator::Equal => &actual == expected,
            ConditionOperator::NotEqual => &actual != expected,
            ConditionOperator::IsNull => actual.is_null(),
            ConditionOperator::IsNotNull => !actual.is_null(),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {} {}", self.column, self.operator, value),
            None => write!(f, "{} {}", self.column, self.operator),
        }
    }
}

/// Options passed along with a find-by-identifier lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Extra scoping conditions the record must satisfy
    pub conditions: Vec<Condition>,
    /// Associations of the target to eager load
    pub include: Vec<String>,
    /// Mark the returned record read-only
    pub readonly: bool,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_include(mut self, association: &str) -> Self {
        self.include.push(association.to_string());
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    /// Whether `record` satisfies every condition
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|condition| condition.matches(record))
    }
}
