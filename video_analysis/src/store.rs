use common::models::AnalysisRecord;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("recording {0} not found")]
    NotFound(Uuid),
}

/// The record-store interface the engine calls through. Records live in an
/// in-process map; the storage collaborator owning durable persistence is
/// free to replace this wholesale as long as create/get/list/update keep
/// their meaning.
#[derive(Debug, Default)]
pub struct RecordStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<Uuid, AnalysisRecord>,
    // Insertion order, newest first.
    order: Vec<Uuid>,
}

impl RecordStore {
    pub fn new() -> Self {
        Default::default()
    }

    pub async fn create(&self, record: AnalysisRecord) {
        let mut inner = self.inner.lock().await;
        inner.order.insert(0, record.id);
        inner.records.insert(record.id, record);
    }

    pub async fn get(&self, id: Uuid) -> Option<AnalysisRecord> {
        self.inner.lock().await.records.get(&id).cloned()
    }

    pub async fn list(&self) -> Vec<AnalysisRecord> {
        let inner = self.inner.lock().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id).cloned())
            .collect()
    }

    pub async fn update(&self, record: AnalysisRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(StoreError::NotFound(record.id)),
        }
    }
}
