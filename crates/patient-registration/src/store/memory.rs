//! In-memory record store with per-record locks.

use super::{ensure_same_id, CasOutcome, RecordStore, StoreError, Versioned};
use crate::registration::RegistrationRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

type Entry = Arc<Mutex<Versioned<RegistrationRecord>>>;

/// In-memory registration store.
///
/// The outer map lock is only held long enough to find or create an entry.
/// Reads and swaps then run under the record's own mutex, so traffic on
/// different ids does not contend.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, id: &str) -> Option<Entry> {
        self.records.read().await.get(id).cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Versioned<RegistrationRecord>>, StoreError> {
        match self.entry(id).await {
            Some(entry) => Ok(Some(entry.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn insert(&self, record: RegistrationRecord) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id));
        }

        let id = record.id.clone();
        records.insert(
            id.clone(),
            Arc::new(Mutex::new(Versioned {
                version: 1,
                value: record,
            })),
        );

        debug!(registration_id = %id, "Inserted record");
        Ok(1)
    }

    async fn compare_and_swap(
        &self,
        id: &str,
        expected_version: u64,
        record: RegistrationRecord,
    ) -> Result<CasOutcome, StoreError> {
        ensure_same_id(id, &record)?;

        let Some(entry) = self.entry(id).await else {
            return Ok(CasOutcome::Missing);
        };

        let mut current = entry.lock().await;
        if current.version != expected_version {
            debug!(
                registration_id = %id,
                expected_version,
                actual_version = current.version,
                "Version conflict"
            );
            return Ok(CasOutcome::Conflict {
                current: current.clone(),
            });
        }

        current.version += 1;
        current.value = record;
        Ok(CasOutcome::Swapped {
            version: current.version,
        })
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().await.len())
    }
}
