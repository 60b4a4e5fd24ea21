//! In-Memory Entity Store
//!
//! Keeps records per model kind in concurrent maps and journals every call
//! made against it, so callers can inspect exactly which round-trips an
//! association performed and in which order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{ModelError, ModelResult};
use crate::model::{Attributes, PrimaryKey, Record};

use super::{EntityStore, FindOptions};

/// A call received by a `MemoryStore`
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Create {
        model: String,
        attributes: Attributes,
    },
    Build {
        model: String,
    },
    Find {
        model: String,
        id: PrimaryKey,
        options: FindOptions,
    },
    Increment {
        model: String,
        counter: String,
        id: PrimaryKey,
    },
    Decrement {
        model: String,
        counter: String,
        id: PrimaryKey,
    },
}

/// Entity store holding records in process memory
pub struct MemoryStore {
    tables: DashMap<String, HashMap<PrimaryKey, Record>>,
    next_id: AtomicI64,
    journal: Mutex<Vec<StoreCall>>,
    fail_next_decrement: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            next_id: AtomicI64::new(1),
            journal: Mutex::new(Vec::new()),
            fail_next_decrement: AtomicBool::new(false),
        }
    }

    /// Store a record directly, bypassing the journal. Unsaved records get
    /// the next integer identifier.
    pub fn insert(&self, mut record: Record) -> Record {
        let id = match record.id() {
            Some(id) => id.clone(),
            None => {
                let id = PrimaryKey::Integer(self.allocate_id());
                record.set_id(id.clone());
                id
            }
        };
        if let PrimaryKey::Integer(n) = &id {
            self.next_id.fetch_max(n.saturating_add(1), Ordering::SeqCst);
        }
        self.tables
            .entry(record.model().to_string())
            .or_default()
            .insert(id, record.clone());
        record
    }

    /// Current state of a stored record
    pub fn get(&self, model: &str, id: &PrimaryKey) -> Option<Record> {
        self.tables.get(model).and_then(|table| table.get(id).cloned())
    }

    /// Current value of a counter attribute; absent counters read as zero
    pub fn counter(&self, model: &str, counter: &str, id: &PrimaryKey) -> Option<i64> {
        self.get(model, id)
            .map(|record| record.get(counter).and_then(|v| v.as_i64()).unwrap_or(0))
    }

    /// Number of records stored for `model`
    pub fn count(&self, model: &str) -> usize {
        self.tables.get(model).map(|table| table.len()).unwrap_or(0)
    }

    /// Snapshot of the call journal
    pub fn calls(&self) -> Vec<StoreCall> {
        self.journal.lock().clone()
    }

    /// Number of find calls received
    pub fn find_count(&self) -> usize {
        self.journal
            .lock()
            .iter()
            .filter(|call| matches!(call, StoreCall::Find { .. }))
            .count()
    }

    pub fn clear_calls(&self) {
        self.journal.lock().clear();
    }

    /// Make the next decrement fail with a store error after journaling it
    pub fn fail_next_decrement(&self) {
        self.fail_next_decrement.store(true, Ordering::SeqCst);
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn record_call(&self, call: StoreCall) {
        trace!("MemoryStore call: {:?}", call);
        self.journal.lock().push(call);
    }

    fn adjust_counter(&self, model: &str, counter: &str, id: &PrimaryKey, delta: i64) {
        let Some(mut table) = self.tables.get_mut(model) else {
            debug!("Counter {} not adjusted: no {} records stored", counter, model);
            return;
        };
        match table.get_mut(id) {
            Some(record) => {
                let current = record.get(counter).and_then(|v| v.as_i64()).unwrap_or(0);
                record.set(counter, current + delta);
            }
            // Same outcome as an UPDATE matching no rows
            None => debug!("Counter {} not adjusted: {}({}) does not exist", counter, model, id),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create(&self, model: &str, attributes: Attributes) -> ModelResult<Record> {
        let start = Instant::now();
        self.record_call(StoreCall::Create {
            model: model.to_string(),
            attributes: attributes.clone(),
        });

        let record = self.insert(Record::new(model, attributes));
        debug!(
            "Created {}({:?}) in {:?}",
            model,
            record.id(),
            start.elapsed()
        );
        Ok(record)
    }

    fn build(&self, model: &str, attributes: Attributes) -> ModelResult<Record> {
        self.record_call(StoreCall::Build {
            model: model.to_string(),
        });
        Ok(Record::new(model, attributes))
    }

    async fn find_by_id(
        &self,
        model: &str,
        id: &PrimaryKey,
        options: &FindOptions,
    ) -> ModelResult<Option<Record>> {
        let start = Instant::now();
        self.record_call(StoreCall::Find {
            model: model.to_string(),
            id: id.clone(),
            options: options.clone(),
        });

        if !options.include.is_empty() {
            trace!("MemoryStore does not eager load {:?}", options.include);
        }

        let found = self
            .get(model, id)
            .filter(|record| options.matches(record))
            .map(|mut record| {
                if options.readonly {
                    record.mark_readonly();
                }
                record
            });

        debug!(
            "Find {}({}) returned {} in {:?}",
            model,
            id,
            if found.is_some() { "a record" } else { "nothing" },
            start.elapsed()
        );
        Ok(found)
    }

    async fn increment_counter(&self, model: &str, counter: &str, id: &PrimaryKey) -> ModelResult<()> {
        self.record_call(StoreCall::Increment {
            model: model.to_string(),
            counter: counter.to_string(),
            id: id.clone(),
        });
        self.adjust_counter(model, counter, id, 1);
        Ok(())
    }

    async fn decrement_counter(&self, model: &str, counter: &str, id: &PrimaryKey) -> ModelResult<()> {
        self.record_call(StoreCall::Decrement {
            model: model.to_string(),
            counter: counter.to_string(),
            id: id.clone(),
        });

        if self.fail_next_decrement.swap(false, Ordering::SeqCst) {
            return Err(ModelError::Store(format!(
                "decrement of {} on {}({}) failed",
                counter, model, id
            )));
        }

        self.adjust_counter(model, counter, id, -1);
        Ok(())
    }
}
