//! File-backed record store.

use super::{ensure_same_id, CasOutcome, RecordStore, StoreError, Versioned};
use crate::registration::RegistrationRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Data version for schema migrations.
const DATA_VERSION: u32 = 1;

/// On-disk snapshot layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    records: HashMap<String, Versioned<RegistrationRecord>>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: DATA_VERSION,
            records: HashMap::new(),
        }
    }
}

/// Record store persisted as a JSON snapshot.
///
/// Every mutation rewrites the snapshot (temp file + rename) before it is
/// acknowledged. If the write fails the in-memory change is rolled back.
///
/// The whole snapshot sits behind one lock that mutations hold across the
/// disk write. Reads and swaps on different ids therefore wait on each
/// other while a save is in flight. Use [`MemoryStore`](super::MemoryStore)
/// where per-record independence matters more than durability.
pub struct FileStore {
    data: RwLock<Snapshot>,
    storage_path: PathBuf,
}

impl FileStore {
    /// Open the store, loading an existing snapshot if present.
    pub async fn open(storage_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let storage_path = storage_path.into();
        let snapshot = load(&storage_path).await?;

        Ok(Self {
            data: RwLock::new(snapshot),
            storage_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(snapshot)?;

        // Ensure parent directory exists
        if let Some(parent) = self.storage_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write atomically using temp file + rename
        let temp_path = self.storage_path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.storage_path).await?;

        debug!(
            "Saved {} records ({} bytes) to {:?}",
            snapshot.records.len(),
            data.len(),
            self.storage_path
        );
        Ok(())
    }
}

async fn load(path: &Path) -> Result<Snapshot, StoreError> {
    if !fs::try_exists(path).await? {
        info!("Store file not found at {:?}, starting empty", path);
        return Ok(Snapshot::default());
    }

    let data = fs::read(path).await?;
    let snapshot: Snapshot = serde_json::from_slice(&data)?;

    if snapshot.version != DATA_VERSION {
        warn!(
            found = snapshot.version,
            expected = DATA_VERSION,
            "Store file has a different data version"
        );
    }

    info!(
        "Loaded {} records from {:?}",
        snapshot.records.len(),
        path
    );
    Ok(snapshot)
}

#[async_trait]
impl RecordStore for FileStore {
    async fn get(&self, id: &str) -> Result<Option<Versioned<RegistrationRecord>>, StoreError> {
        Ok(self.data.read().await.records.get(id).cloned())
    }

    async fn insert(&self, record: RegistrationRecord) -> Result<u64, StoreError> {
        let mut data = self.data.write().await;
        if data.records.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id));
        }

        let id = record.id.clone();
        data.records.insert(
            id.clone(),
            Versioned {
                version: 1,
                value: record,
            },
        );

        if let Err(e) = self.save(&data).await {
            data.records.remove(&id);
            return Err(e);
        }

        Ok(1)
    }

    async fn compare_and_swap(
        &self,
        id: &str,
        expected_version: u64,
        record: RegistrationRecord,
    ) -> Result<CasOutcome, StoreError> {
        ensure_same_id(id, &record)?;

        let mut data = self.data.write().await;

        let previous = match data.records.get(id) {
            None => return Ok(CasOutcome::Missing),
            Some(current) if current.version != expected_version => {
                return Ok(CasOutcome::Conflict {
                    current: current.clone(),
                });
            }
            Some(current) => current.clone(),
        };

        let version = previous.version + 1;
        data.records.insert(
            id.to_string(),
            Versioned {
                version,
                value: record,
            },
        );

        if let Err(e) = self.save(&data).await {
            data.records.insert(id.to_string(), previous);
            return Err(e);
        }

        Ok(CasOutcome::Swapped { version })
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.data.read().await.records.len())
    }

    async fn health_check(&self) -> bool {
        match self.storage_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::try_exists(parent).await.unwrap_or(false)
            }
            _ => true,
        }
    }
}
