//! Case storage.
//!
//! The registry talks to storage only through [`CaseStore`], so a real
//! database can replace [`InMemoryCaseStore`] without touching the registry
//! or the pipeline.

use std::collections::HashMap;

use async_trait::async_trait;
use fakesense_case_models::{CaseId, CaseRecord};
use tokio::sync::RwLock;

/// Errors returned by a [`CaseStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record with this id already exists.
    #[error("Case {case_id} already exists")]
    Duplicate {
        /// The conflicting id.
        case_id: CaseId,
    },

    /// No record with this id exists.
    #[error("Case {case_id} not found")]
    NotFound {
        /// The missing id.
        case_id: CaseId,
    },

    /// The stored record changed since it was read.
    #[error("Case {case_id} is at version {actual}, expected {expected}")]
    VersionConflict {
        /// The contested id.
        case_id: CaseId,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// The storage backend failed.
    #[error("Storage backend error: {message}")]
    Backend {
        /// Description of what went wrong.
        message: String,
    },
}

/// Storage for case records.
///
/// Implementations must keep insertion order for [`CaseStore::recent`] and
/// make [`CaseStore::replace`] an atomic compare-and-swap on
/// [`CaseRecord::version`].
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if the id is already stored.
    async fn insert(&self, record: CaseRecord) -> Result<(), StoreError>;

    /// Fetches a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    async fn get(&self, case_id: &CaseId) -> Result<Option<CaseRecord>, StoreError>;

    /// Returns up to `limit` records, most recently inserted first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    async fn recent(&self, limit: usize) -> Result<Vec<CaseRecord>, StoreError>;

    /// Replaces a record if its stored version is still `expected_version`.
    ///
    /// The stored copy (and the returned one) has `version` set to
    /// `expected_version + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id is not stored, or
    /// [`StoreError::VersionConflict`] if another write got there first.
    async fn replace(
        &self,
        record: CaseRecord,
        expected_version: u64,
    ) -> Result<CaseRecord, StoreError>;

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    async fn len(&self) -> Result<usize, StoreError>;

    /// Removes every record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend fails.
    async fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Default)]
struct Inner {
    records: Vec<CaseRecord>,
    index: HashMap<CaseId, usize>,
}

/// Process-memory [`CaseStore`]. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryCaseStore {
    inner: RwLock<Inner>,
}

impl InMemoryCaseStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CaseStore for InMemoryCaseStore {
    async fn insert(&self, record: CaseRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.index.contains_key(&record.case_id) {
            return Err(StoreError::Duplicate {
                case_id: record.case_id,
            });
        }

        let position = inner.records.len();
        inner.index.insert(record.case_id.clone(), position);
        inner.records.push(record);
        drop(inner);
        Ok(())
    }

    async fn get(&self, case_id: &CaseId) -> Result<Option<CaseRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .index
            .get(case_id)
            .map(|&position| inner.records[position].clone()))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<CaseRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.records.iter().rev().take(limit).cloned().collect())
    }

    async fn replace(
        &self,
        mut record: CaseRecord,
        expected_version: u64,
    ) -> Result<CaseRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(&position) = inner.index.get(&record.case_id) else {
            return Err(StoreError::NotFound {
                case_id: record.case_id,
            });
        };

        let stored = &mut inner.records[position];
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                case_id: record.case_id,
                expected: expected_version,
                actual: stored.version,
            });
        }

        record.version = expected_version + 1;
        stored.clone_from(&record);
        drop(inner);
        Ok(record)
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.records.len())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.records.clear();
        inner.index.clear();
        drop(inner);
        Ok(())
    }
}
