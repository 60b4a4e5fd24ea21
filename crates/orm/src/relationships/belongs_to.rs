//! BelongsTo Relationship - Lazily resolved reference from an owner to one target
//!
//! The owner stores the target's identifier in a foreign key attribute. The
//! slot loads the target on first read, replaces it on assignment and keeps
//! an optional counter cache on the target kind in step with the reference.

use tracing::{debug, warn};

use crate::error::{ModelError, ModelResult};
use crate::model::{Attributes, Model, PrimaryKey, Record};
use crate::store::EntityStore;

use super::config::BelongsToConfig;
use super::handle::{Assignable, ReferenceHandle};
use super::owner::ForeignKeyAccess;

/// BelongsTo relationship - owner model belongs to a target model
#[derive(Debug)]
pub struct BelongsTo<O>
where
    O: ForeignKeyAccess,
{
    owner: O,
    config: BelongsToConfig,
    target: Option<Record>,
    loaded: bool,
    updated: bool,
}

impl<O> BelongsTo<O>
where
    O: ForeignKeyAccess,
{
    /// Create a new, not yet loaded, BelongsTo relationship
    pub fn new(owner: O, config: BelongsToConfig) -> ModelResult<Self> {
        let config = config.normalized();
        config.validate()?;

        Ok(Self {
            owner,
            config,
            target: None,
            loaded: false,
            updated: false,
        })
    }

    pub fn config(&self) -> &BelongsToConfig {
        &self.config
    }

    pub fn owner(&self) -> &O {
        &self.owner
    }

    /// Mutable access to the owner. Writing the foreign key through it does
    /// not invalidate an already loaded target.
    pub fn owner_mut(&mut self) -> &mut O {
        &mut self.owner
    }

    /// Give the owner back, dropping the slot
    pub fn into_owner(self) -> O {
        self.owner
    }

    /// Check if the relationship has been loaded
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether the target was explicitly assigned during this slot's lifetime
    pub fn updated(&self) -> bool {
        self.updated
    }

    /// Get the target if loaded, without contacting the store
    pub fn target(&self) -> Option<&Record> {
        self.target.as_ref()
    }

    /// Typed view of the loaded target
    pub fn target_as<M: Model>(&self) -> ModelResult<Option<M>> {
        self.target.as_ref().map(M::from_record).transpose()
    }

    /// Handle to the loaded target, assignable to another slot
    pub fn handle(&self) -> Option<ReferenceHandle> {
        self.target
            .as_ref()
            .map(|target| ReferenceHandle::new(self.config.name.as_str(), target.clone()))
    }

    /// Get the foreign key value from the owner
    pub fn foreign_key_value(&self) -> Option<PrimaryKey> {
        self.owner.foreign_key(&self.config.foreign_key)
    }

    /// Check if the owner holds a foreign key value
    pub fn foreign_key_present(&self) -> bool {
        self.foreign_key_value().is_some()
    }

    /// Get the target, loading it from the store on first access
    pub async fn resolve<S>(&mut self, store: &S) -> ModelResult<Option<&Record>>
    where
        S: EntityStore + ?Sized,
    {
        if !self.loaded {
            let found = self.find_target(store).await;
            self.loaded = true;
            self.target = found?;
        }
        Ok(self.target.as_ref())
    }

    /// Query the store again for the current foreign key
    pub async fn reload<S>(&mut self, store: &S) -> ModelResult<Option<&Record>>
    where
        S: EntityStore + ?Sized,
    {
        let found = self.find_target(store).await;
        self.target = None;
        self.loaded = true;
        self.target = found?;
        Ok(self.target.as_ref())
    }

    /// Create the target in the store and assign it
    pub async fn create<S>(&mut self, store: &S, attributes: Attributes) -> ModelResult<Record>
    where
        S: EntityStore + ?Sized,
    {
        let created = store.create(&self.config.target_model, attributes).await?;
        self.replace(store, Some(created.clone().into())).await?;
        Ok(created)
    }

    /// Build an unsaved target and assign it
    pub async fn build<S>(&mut self, store: &S, attributes: Attributes) -> ModelResult<Record>
    where
        S: EntityStore + ?Sized,
    {
        let built = store.build(&self.config.target_model, attributes)?;
        self.replace(store, Some(built.clone().into())).await?;
        Ok(built)
    }

    /// Clear the reference
    pub async fn clear<S>(&mut self, store: &S) -> ModelResult<()>
    where
        S: EntityStore + ?Sized,
    {
        self.replace(store, None).await.map(|_| ())
    }

    /// Replace the target with `candidate`, or clear it with `None`.
    ///
    /// With a counter cache configured and a persisted owner, the new
    /// target's counter is incremented before the previous one is
    /// decremented. The two calls are not atomic: if the decrement fails the
    /// error is returned, the slot is left unchanged and the new target stays
    /// over-counted until the counters are recomputed.
    /// Re-assigning the current target increments and decrements the same
    /// counter, netting to zero.
    pub async fn replace<S>(
        &mut self,
        store: &S,
        candidate: Option<Assignable>,
    ) -> ModelResult<Option<&Record>>
    where
        S: EntityStore + ?Sized,
    {
        let candidate = candidate.map(Assignable::into_record);
        let previous = self.foreign_key_value();

        match candidate {
            None => {
                if let (Some(counter), Some(old)) = (self.counter_cache(), previous.as_ref()) {
                    debug!(
                        "Association '{}': decrementing {}.{} for {}",
                        self.config.name, self.config.target_model, counter, old
                    );
                    store
                        .decrement_counter(&self.config.target_model, counter, old)
                        .await?;
                }

                self.target = None;
                self.owner.set_foreign_key(&self.config.foreign_key, None);
                debug!("Association '{}' cleared", self.config.name);
            }
            Some(record) => {
                self.check_type(&record)?;

                if let Some(counter) = self.counter_cache() {
                    if let Some(new_id) = record.id() {
                        store
                            .increment_counter(&self.config.target_model, counter, new_id)
                            .await?;
                    }
                    if let Some(old) = previous.as_ref() {
                        if let Err(err) = store
                            .decrement_counter(&self.config.target_model, counter, old)
                            .await
                        {
                            warn!(
                                "Association '{}': {}.{} incremented for {:?} but decrement for {} failed: {}",
                                self.config.name,
                                self.config.target_model,
                                counter,
                                record.id(),
                                old,
                                err
                            );
                            return Err(err);
                        }
                    }
                }

                if let Some(id) = record.id() {
                    self.owner
                        .set_foreign_key(&self.config.foreign_key, Some(id.clone()));
                }
                debug!(
                    "Association '{}' now targets {}({:?})",
                    self.config.name,
                    record.model(),
                    record.id()
                );
                self.target = Some(record);
                self.updated = true;
            }
        }

        self.loaded = true;
        Ok(self.target.as_ref())
    }

    async fn find_target<S>(&self, store: &S) -> ModelResult<Option<Record>>
    where
        S: EntityStore + ?Sized,
    {
        let Some(id) = self.foreign_key_value() else {
            return Ok(None);
        };

        debug!(
            "Association '{}': loading {}({})",
            self.config.name, self.config.target_model, id
        );
        let options = self.config.find_options();
        match store
            .find_by_id(&self.config.target_model, &id, &options)
            .await?
        {
            Some(record) => Ok(Some(record)),
            None if self.config.required => Err(ModelError::NotFound(format!(
                "{}({})",
                self.config.target_model, id
            ))),
            None => Ok(None),
        }
    }

    fn check_type(&self, record: &Record) -> ModelResult<()> {
        if self.config.accepts(record.model()) {
            Ok(())
        } else {
            Err(ModelError::TypeMismatch {
                expected: self.config.target_model.clone(),
                actual: record.model().to_string(),
            })
        }
    }

    /// Counter cache column, when it applies to this owner
    fn counter_cache(&self) -> Option<&str> {
        self.config
            .counter_cache
            .as_deref()
            .filter(|_| !self.owner.is_new_record())
    }
}
