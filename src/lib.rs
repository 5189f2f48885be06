// ============================================================================
// SoftStore Library
// ============================================================================

pub mod core;
pub mod lifecycle;
pub mod observer;
pub mod record;
pub mod schema;
pub mod store;

// Re-export main types for convenience
pub use core::{Result, SoftStoreError};
pub use lifecycle::{LifecycleState, SoftDeleteLifecycle};
pub use observer::{TransitionObserver, TransitionObserverRegistry};
pub use record::{ACTOR_IDENTITY_FIELD, ActorRef, SoftRecord, new_record_id};
pub use schema::{
    FIELD_DELETED, FIELD_DELETED_AT, FIELD_DELETED_BY, FieldDef, FieldDefault, FieldOverride,
    FieldType, RecordTypeDef, SoftDeleteConfig, extend,
};
pub use store::{MemoryStore, RecordStore};
