//! Assignable values - What a reference slot accepts on replacement
//!
//! A slot can be handed either a plain record or a handle to a target that
//! another association already resolved. Both collapse to the underlying
//! record before the slot does anything with them.

use crate::model::Record;

/// A resolved target taken from an association
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceHandle {
    association: String,
    target: Record,
}

impl ReferenceHandle {
    pub fn new(association: impl Into<String>, target: Record) -> Self {
        Self {
            association: association.into(),
            target,
        }
    }

    /// Name of the association the target was resolved through
    pub fn association(&self) -> &str {
        &self.association
    }

    pub fn target(&self) -> &Record {
        &self.target
    }

    pub fn into_target(self) -> Record {
        self.target
    }
}

/// Candidate for `BelongsTo::replace`
#[derive(Debug, Clone, PartialEq)]
pub enum Assignable {
    Record(Record),
    Handle(ReferenceHandle),
}

impl Assignable {
    /// The record this candidate stands for
    pub fn record(&self) -> &Record {
        match self {
            Assignable::Record(record) => record,
            Assignable::Handle(handle) => handle.target(),
        }
    }

    /// Unwrap to the underlying record
    pub fn into_record(self) -> Record {
        match self {
            Assignable::Record(record) => record,
            Assignable::Handle(handle) => handle.into_target(),
        }
    }
}

impl From<Record> for Assignable {
    fn from(record: Record) -> Self {
        Assignable::Record(record)
    }
}

impl From<ReferenceHandle> for Assignable {
    fn from(handle: ReferenceHandle) -> Self {
        Assignable::Handle(handle)
    }
}
