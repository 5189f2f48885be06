use async_trait::async_trait;

use crate::core::Result;
use crate::record::SoftRecord;

mod memory;

pub use memory::MemoryStore;

/// Persistence collaborator the lifecycle commits through.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Durably persist the record's current field values.
    async fn commit(&self, record: &SoftRecord) -> Result<()>;

    /// Durably and permanently delete the record.
    async fn remove(&self, record: &SoftRecord) -> Result<()>;
}
