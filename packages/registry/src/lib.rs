#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Case registry for reported pages.
//!
//! Holds every case in an injected [`CaseStore`], validates new
//! submissions, hands out unique [`CaseId`]s, and applies manual review
//! overrides. All writes go through a compare-and-swap on
//! [`CaseRecord::version`], so a writer working from an outdated copy is
//! told instead of silently clobbering a newer one.

pub mod id;
pub mod query;
pub mod store;
pub mod url;

use std::sync::Arc;

use chrono::Utc;
use fakesense_case_models::{CaseId, CaseRecord, NewCase, ReviewRequest};

pub use id::CaseIdGenerator;
pub use query::{CaseFilter, CasePage, CaseStats};
pub use store::{CaseStore, InMemoryCaseStore, StoreError};

/// How many fresh ids `create` tries before giving up on collisions.
const MAX_ID_ATTEMPTS: u32 = 5;

/// How many times a review re-reads the case after losing a write race.
const MAX_REVIEW_ATTEMPTS: u32 = 8;

/// Errors returned by [`CaseRegistry`] operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The submission is missing a field or has a malformed URL.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable reason.
        message: String,
    },

    /// No case with this id exists.
    #[error("Case not found: {case_id}")]
    NotFound {
        /// The unknown id.
        case_id: CaseId,
    },

    /// The case changed since the caller read it.
    #[error("Stale write to {case_id}: expected version {expected}, found {actual}")]
    Stale {
        /// The contested id.
        case_id: CaseId,
        /// Version the caller read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// The underlying store failed.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { case_id } => Self::NotFound { case_id },
            StoreError::VersionConflict {
                case_id,
                expected,
                actual,
            } => Self::Stale {
                case_id,
                expected,
                actual,
            },
            other => Self::Store(other),
        }
    }
}

/// Ordered collection of cases keyed by [`CaseId`].
pub struct CaseRegistry {
    store: Arc<dyn CaseStore>,
    ids: CaseIdGenerator,
}

impl CaseRegistry {
    /// Creates a registry over `store` with an entropy-seeded id generator.
    #[must_use]
    pub fn new(store: Arc<dyn CaseStore>) -> Self {
        Self::with_id_generator(store, CaseIdGenerator::new())
    }

    /// Creates a registry over `store` using `ids` for new case ids.
    #[must_use]
    pub fn with_id_generator(store: Arc<dyn CaseStore>, ids: CaseIdGenerator) -> Self {
        Self { store, ids }
    }

    /// Validates `input` and stores it as a new `submitted` case at
    /// version 0.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::Validation`] if the URL is blank or not a Facebook
    ///   page. Nothing is stored.
    /// * [`RegistryError::Store`] if the store fails or every generated id
    ///   collided.
    pub async fn create(&self, input: NewCase) -> Result<CaseId, RegistryError> {
        url::validate_page_url(&input.url)?;

        let mut attempt = 1;
        loop {
            let case_id = self.ids.next_id();
            let record = CaseRecord::submitted(case_id.clone(), input.clone(), Utc::now());

            match self.store.insert(record).await {
                Ok(()) => {
                    log::info!("Created case {case_id} for {}", input.url);
                    return Ok(case_id);
                }
                Err(StoreError::Duplicate { case_id }) if attempt < MAX_ID_ATTEMPTS => {
                    log::warn!("Generated duplicate case id {case_id}, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(RegistryError::Store(e)),
            }
        }
    }

    /// Returns the current state of a case.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no such case exists.
    pub async fn get(&self, case_id: &CaseId) -> Result<CaseRecord, RegistryError> {
        self.store
            .get(case_id)
            .await?
            .ok_or_else(|| RegistryError::NotFound {
                case_id: case_id.clone(),
            })
    }

    /// Returns up to `limit` cases, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] if the store fails.
    pub async fn list(&self, limit: usize) -> Result<Vec<CaseRecord>, RegistryError> {
        Ok(self.store.recent(limit).await?)
    }

    /// Returns one page of the cases matching `filter`, newest first,
    /// skipping the first `offset` matches.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] if the store fails.
    pub async fn query(
        &self,
        filter: &CaseFilter,
        offset: usize,
        limit: usize,
    ) -> Result<CasePage, RegistryError> {
        let matching: Vec<CaseRecord> = self
            .store
            .recent(usize::MAX)
            .await?
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect();

        Ok(CasePage {
            matching: matching.len(),
            records: matching.into_iter().skip(offset).take(limit).collect(),
            offset,
            limit,
        })
    }

    /// Summarizes every case in the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] if the store fails.
    pub async fn stats(&self) -> Result<CaseStats, RegistryError> {
        let records = self.store.recent(usize::MAX).await?;
        Ok(CaseStats::from_records(&records))
    }

    /// Number of cases in the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] if the store fails.
    pub async fn count(&self) -> Result<usize, RegistryError> {
        Ok(self.store.len().await?)
    }

    /// Removes every case.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] if the store fails.
    pub async fn clear(&self) -> Result<(), RegistryError> {
        Ok(self.store.clear().await?)
    }

    /// Applies `mutate` to a case if it is still at `expected_version`,
    /// stamping `updated_at`.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::NotFound`] if the case does not exist.
    /// * [`RegistryError::Stale`] if the case has been written since
    ///   `expected_version`.
    pub async fn update<F>(
        &self,
        case_id: &CaseId,
        expected_version: u64,
        mutate: F,
    ) -> Result<CaseRecord, RegistryError>
    where
        F: FnOnce(&mut CaseRecord) + Send,
    {
        let mut record = self.get(case_id).await?;
        if record.version != expected_version {
            return Err(RegistryError::Stale {
                case_id: case_id.clone(),
                expected: expected_version,
                actual: record.version,
            });
        }

        mutate(&mut record);
        record.case_id = case_id.clone();
        record.updated_at = Utc::now();

        Ok(self.store.replace(record, expected_version).await?)
    }

    /// Forces a reviewer's decision onto a case, whatever its status.
    ///
    /// Concurrent writes are retried against the latest version, so a
    /// review of an existing case only fails if the store itself fails.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::NotFound`] if the case does not exist.
    /// * [`RegistryError::Stale`] if the case kept changing for every retry.
    pub async fn review(
        &self,
        case_id: &CaseId,
        request: &ReviewRequest,
    ) -> Result<CaseRecord, RegistryError> {
        let mut attempt = 1;
        loop {
            let mut record = self.get(case_id).await?;
            let expected = record.version;
            record.apply_review(request, Utc::now());

            match self.store.replace(record, expected).await {
                Ok(updated) => {
                    log::info!(
                        "Case {case_id} reviewed by {}: {} -> {}",
                        request.reviewer,
                        request.decision,
                        updated.status
                    );
                    return Ok(updated);
                }
                Err(StoreError::VersionConflict { .. }) if attempt < MAX_REVIEW_ATTEMPTS => {
                    log::debug!("Review of {case_id} lost a write race, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
