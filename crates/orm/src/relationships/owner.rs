//! Owner access - How a reference slot reads and writes its owner's key

use serde_json::Value;

use crate::model::{PrimaryKey, Record};

/// Accessor interface over the owning entity's attribute storage
pub trait ForeignKeyAccess: Send + Sync {
    /// Current value of the foreign key attribute
    fn foreign_key(&self, attribute: &str) -> Option<PrimaryKey>;

    /// Write (or clear, with `None`) the foreign key attribute
    fn set_foreign_key(&mut self, attribute: &str, value: Option<PrimaryKey>);

    /// Whether the owner has not been persisted yet
    fn is_new_record(&self) -> bool;
}

impl ForeignKeyAccess for Record {
    fn foreign_key(&self, attribute: &str) -> Option<PrimaryKey> {
        self.get(attribute).and_then(PrimaryKey::from_value)
    }

    fn set_foreign_key(&mut self, attribute: &str, value: Option<PrimaryKey>) {
        let value = value.map(|key| key.to_value()).unwrap_or(Value::Null);
        self.set(attribute, value);
    }

    fn is_new_record(&self) -> bool {
        Record::is_new_record(self)
    }
}
