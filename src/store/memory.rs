use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::RecordStore;
use crate::core::Result;
use crate::record::SoftRecord;
use crate::schema::RecordTypeDef;

/// Reference store keeping committed rows in per-type maps.
///
/// Commits persist definition fields only and are last-write-wins; there is
/// no version check, so concurrent writers against independently loaded
/// copies of the same record race.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, HashMap<String, Map<String, Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn find_by_id(&self, type_name: &str, record_id: &str) -> Option<Map<String, Value>> {
        let rows = self.rows.lock().await;
        rows.get(type_name)
            .and_then(|table| table.get(record_id))
            .cloned()
    }

    pub async fn contains(&self, type_name: &str, record_id: &str) -> bool {
        self.find_by_id(type_name, record_id).await.is_some()
    }

    pub async fn count(&self, type_name: &str) -> usize {
        let rows = self.rows.lock().await;
        rows.get(type_name).map(HashMap::len).unwrap_or(0)
    }

    /// Rebuild a record from its committed row, if present.
    pub async fn load(
        &self,
        definition: Arc<RecordTypeDef>,
        record_id: &str,
    ) -> Option<SoftRecord> {
        let values = self
            .find_by_id(definition.type_name(), record_id)
            .await?;
        Some(SoftRecord::from_loaded(definition, record_id, values))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn commit(&self, record: &SoftRecord) -> Result<()> {
        let mut row = Map::new();
        for field in record.definition().fields() {
            if let Some(value) = record.get(&field.name) {
                row.insert(field.name.clone(), value.clone());
            }
        }

        let mut rows = self.rows.lock().await;
        rows.entry(record.type_name().to_string())
            .or_default()
            .insert(record.record_id().to_string(), row);
        Ok(())
    }

    async fn remove(&self, record: &SoftRecord) -> Result<()> {
        let mut rows = self.rows.lock().await;
        if let Some(table) = rows.get_mut(record.type_name()) {
            table.remove(record.record_id());
        }
        Ok(())
    }
}
