use chrono::Utc;
use log::debug;
use serde_json::json;
use std::sync::Arc;

use crate::core::{Result, SoftStoreError};
use crate::observer::TransitionObserverRegistry;
use crate::record::{ActorRef, SoftRecord, timestamp_value};
use crate::schema::{FIELD_DELETED, FIELD_DELETED_AT, FIELD_DELETED_BY};
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Active,
    SoftDeleted,
    /// Terminal: the record no longer exists in the store. There is no
    /// transition out of Removed.
    Removed,
}

/// The soft-delete state machine over a record store.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use softstore::{
///     FieldDef, FieldType, MemoryStore, RecordTypeDef, SoftDeleteConfig, SoftDeleteLifecycle,
///     SoftRecord, extend,
/// };
///
/// # async fn demo() -> softstore::Result<()> {
/// let definition = Arc::new(extend(
///     &RecordTypeDef::new("Article").with_field(FieldDef::new("title", FieldType::Text)),
///     &SoftDeleteConfig::new(),
/// ));
///
/// let lifecycle = SoftDeleteLifecycle::new(Arc::new(MemoryStore::new()));
/// let mut article = SoftRecord::new(definition);
///
/// lifecycle.soft_delete(&mut article, true, None).await?;
/// assert!(article.is_soft_deleted());
///
/// // A second delete request escalates to permanent removal.
/// lifecycle.soft_delete(&mut article, true, None).await?;
/// # Ok(())
/// # }
/// ```
pub struct SoftDeleteLifecycle {
    store: Arc<dyn RecordStore>,
    observers: TransitionObserverRegistry,
}

impl SoftDeleteLifecycle {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            observers: TransitionObserverRegistry::new(),
        }
    }

    pub fn with_observers(mut self, observers: TransitionObserverRegistry) -> Self {
        self.observers = observers;
        self
    }

    pub fn observers(&self) -> &TransitionObserverRegistry {
        &self.observers
    }

    pub fn observers_mut(&mut self) -> &mut TransitionObserverRegistry {
        &mut self.observers
    }

    /// Apply a deletion-state transition and commit the outcome.
    ///
    /// A delete request on an already soft-deleted record escalates to
    /// permanent removal. Store and observer errors propagate unmodified; no
    /// retry is attempted and in-memory field mutations applied before a
    /// failed commit are left in place.
    pub async fn soft_delete(
        &self,
        record: &mut SoftRecord,
        should_delete: bool,
        actor: Option<ActorRef>,
    ) -> Result<()> {
        match (record.lifecycle_state(), should_delete) {
            (LifecycleState::Removed, _) => {
                Err(SoftStoreError::RecordRemoved(record.record_id().to_string()))
            }

            // Already soft deleted, so the request is to completely remove.
            // Bypasses the audit-field update and the observer commit path.
            (LifecycleState::SoftDeleted, true) => {
                debug!(
                    "escalating soft delete to permanent removal: type='{}' id='{}'",
                    record.type_name(),
                    record.record_id()
                );
                self.store.remove(record).await?;
                record.mark_removed();
                Ok(())
            }

            (LifecycleState::Active, true) => {
                record.set(FIELD_DELETED, json!(true));
                record.set(FIELD_DELETED_AT, timestamp_value(Utc::now()));
                if let Some(actor) = actor {
                    // Written only when the type was configured with the
                    // audit field; otherwise the actor is ignored.
                    if record.definition().has_field(FIELD_DELETED_BY) {
                        record.set(FIELD_DELETED_BY, actor.stored_value());
                    }
                }
                self.commit_with_observers(record).await
            }

            // Restore, or a no-op save of an active record. Audit fields are
            // not cleared; they retain the last delete's values.
            (LifecycleState::Active, false) | (LifecycleState::SoftDeleted, false) => {
                record.set(FIELD_DELETED, json!(false));
                self.commit_with_observers(record).await
            }
        }
    }

    async fn commit_with_observers(&self, record: &mut SoftRecord) -> Result<()> {
        if record.is_modified(FIELD_DELETED) {
            let observers = self.observers.observers_for(record.type_name());
            debug!(
                "firing {} transition observers: type='{}' id='{}'",
                observers.len(),
                record.type_name(),
                record.record_id()
            );
            for observer in observers {
                observer.on_transition(record).await?;
            }
        }

        self.store.commit(record).await?;
        record.mark_synced();
        Ok(())
    }
}
