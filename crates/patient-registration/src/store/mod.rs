//! Record storage with per-record compare-and-swap.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::registration::RegistrationRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Record {record_id} cannot be stored under id {key}")]
    IdMismatch { key: String, record_id: String },
}

/// Reject a swap that would file a record under someone else's id.
fn ensure_same_id(key: &str, record: &RegistrationRecord) -> Result<(), StoreError> {
    if record.id == key {
        Ok(())
    } else {
        Err(StoreError::IdMismatch {
            key: key.to_string(),
            record_id: record.id.clone(),
        })
    }
}

/// A value together with its store-assigned revision.
///
/// Versions start at 1 on insert and grow by 1 on every successful swap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

/// Result of a conditional update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    /// Write applied; carries the new version.
    Swapped { version: u64 },
    /// Someone else wrote first; carries the current state.
    Conflict {
        current: Versioned<RegistrationRecord>,
    },
    /// No record under that id.
    Missing,
}

/// Durable keyed storage for registration records.
///
/// A single call is atomic for its key. Calls on different keys must not
/// serialize behind one another beyond map bookkeeping.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record and its current version.
    async fn get(&self, id: &str) -> Result<Option<Versioned<RegistrationRecord>>, StoreError>;

    /// Store a new record. Fails if the id is already taken.
    async fn insert(&self, record: RegistrationRecord) -> Result<u64, StoreError>;

    /// Replace the record only if its version still equals `expected_version`.
    ///
    /// `record.id` must equal `id`; ids never change once inserted.
    async fn compare_and_swap(
        &self,
        id: &str,
        expected_version: u64,
        record: RegistrationRecord,
    ) -> Result<CasOutcome, StoreError>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize, StoreError>;

    /// Cheap liveness probe.
    async fn health_check(&self) -> bool {
        true
    }
}
