#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Simulated analysis pipeline for reported pages.
//!
//! Each submitted case moves through delayed stages:
//!
//! 1. **Intake** (`intake_delay` after submission): `submitted → analyzing`.
//! 2. **Risk scoring** (`analysis_delay` later): a random score decides
//!    `analyzed` (terminal) or `high-risk`.
//! 3. **Decoy start** (`decoy_start_delay` later, high-risk only):
//!    `high-risk → ai-decoy-active`.
//! 4. **Decoy finish** (`decoy_delay` later): decoy evidence is attached and
//!    the case becomes `ready-for-review`.
//!
//! Every stage is scheduled against the case version its predecessor
//! wrote. If anything else writes the case in between (a manual review, or
//! the case disappearing), the stage is dropped. Stages of different cases
//! are independent and may interleave in any order.

pub mod analysis;
pub mod randomness;
pub mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use fakesense_case_models::{
    CaseId, CaseRecord, CaseStatus, NewCase, ReviewDecision, ReviewRequest, RiskLevel,
};
use fakesense_registry::{CaseRegistry, RegistryError};

use crate::randomness::Randomness;
use crate::scheduler::Scheduler;

/// Delays between pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Submission to the start of analysis.
    pub intake_delay: Duration,
    /// Start of analysis to the risk score.
    pub analysis_delay: Duration,
    /// High-risk verdict to the start of the decoy interaction.
    pub decoy_start_delay: Duration,
    /// Length of the decoy interaction.
    pub decoy_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            intake_delay: Duration::from_secs(2),
            analysis_delay: Duration::from_secs(3),
            decoy_start_delay: Duration::ZERO,
            decoy_delay: Duration::from_secs(8),
        }
    }
}

impl PipelineConfig {
    /// Time from submission until a high-risk case is ready for review,
    /// assuming nothing interferes.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.intake_delay + self.analysis_delay + self.decoy_start_delay + self.decoy_delay
    }
}

/// Drives cases through the analysis stages.
///
/// Cheap to clone; clones share the registry, scheduler and randomness.
#[derive(Clone)]
pub struct AnalysisPipeline {
    registry: Arc<CaseRegistry>,
    scheduler: Arc<dyn Scheduler>,
    randomness: Arc<dyn Randomness>,
    config: PipelineConfig,
}

impl AnalysisPipeline {
    /// Creates a pipeline.
    #[must_use]
    pub fn new(
        registry: Arc<CaseRegistry>,
        scheduler: Arc<dyn Scheduler>,
        randomness: Arc<dyn Randomness>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            registry,
            scheduler,
            randomness,
            config,
        }
    }

    /// The registry this pipeline writes to.
    #[must_use]
    pub const fn registry(&self) -> &Arc<CaseRegistry> {
        &self.registry
    }

    /// Stage delays.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Creates a case and schedules its analysis. Returns as soon as the
    /// case is stored.
    ///
    /// # Errors
    ///
    /// Propagates [`CaseRegistry::create`] errors; nothing is scheduled in
    /// that case.
    pub async fn submit(&self, input: NewCase) -> Result<CaseId, RegistryError> {
        let case_id = self.registry.create(input).await?;
        self.schedule_intake(case_id.clone(), 0);
        Ok(case_id)
    }

    /// Applies a manual review. Pending stages for the case become stale;
    /// a [`ReviewDecision::Reprocess`] schedules a fresh risk scoring.
    ///
    /// # Errors
    ///
    /// Propagates [`CaseRegistry::review`] errors.
    pub async fn review(
        &self,
        case_id: &CaseId,
        request: &ReviewRequest,
    ) -> Result<CaseRecord, RegistryError> {
        let record = self.registry.review(case_id, request).await?;
        if request.decision == ReviewDecision::Reprocess {
            self.schedule_scoring(record.case_id.clone(), record.version);
        }
        Ok(record)
    }

    fn schedule_intake(&self, case_id: CaseId, version: u64) {
        let this = self.clone();
        self.scheduler.schedule_after(
            self.config.intake_delay,
            Box::pin(async move { this.start_analysis(case_id, version).await }),
        );
    }

    fn schedule_scoring(&self, case_id: CaseId, version: u64) {
        let this = self.clone();
        self.scheduler.schedule_after(
            self.config.analysis_delay,
            Box::pin(async move { this.score_risk(case_id, version).await }),
        );
    }

    fn schedule_decoy_start(&self, case_id: CaseId, version: u64) {
        let this = self.clone();
        self.scheduler.schedule_after(
            self.config.decoy_start_delay,
            Box::pin(async move { this.start_decoy(case_id, version).await }),
        );
    }

    fn schedule_decoy_finish(&self, case_id: CaseId, version: u64) {
        let this = self.clone();
        self.scheduler.schedule_after(
            self.config.decoy_delay,
            Box::pin(async move { this.finish_decoy(case_id, version).await }),
        );
    }

    async fn start_analysis(&self, case_id: CaseId, version: u64) {
        if let Some(updated) = self
            .transition("intake", &case_id, version, CaseStatus::Analyzing, |_| {})
            .await
        {
            self.schedule_scoring(case_id, updated.version);
        }
    }

    async fn score_risk(&self, case_id: CaseId, version: u64) {
        let assessment = analysis::assess_risk(self.randomness.as_ref());
        let next = if assessment.level == RiskLevel::High {
            CaseStatus::HighRisk
        } else {
            CaseStatus::Analyzed
        };
        let score = assessment.score;

        let updated = self
            .transition("risk scoring", &case_id, version, next, move |record| {
                record.risk_score = Some(assessment.score);
                record.risk_level = Some(assessment.level);
                record.ai_analysis = Some(assessment.analysis);
            })
            .await;

        if let Some(updated) = updated {
            log::info!("Case {case_id} scored {score}");
            if updated.status == CaseStatus::HighRisk {
                self.schedule_decoy_start(case_id, updated.version);
            }
        }
    }

    async fn start_decoy(&self, case_id: CaseId, version: u64) {
        if let Some(updated) = self
            .transition(
                "decoy start",
                &case_id,
                version,
                CaseStatus::AiDecoyActive,
                |_| {},
            )
            .await
        {
            self.schedule_decoy_finish(case_id, updated.version);
        }
    }

    async fn finish_decoy(&self, case_id: CaseId, version: u64) {
        self.transition(
            "decoy finish",
            &case_id,
            version,
            CaseStatus::ReadyForReview,
            |record| record.decoy_results = Some(analysis::decoy_results()),
        )
        .await;
    }

    /// Moves a case to `next` if it is still at `version` and the move is a
    /// legal pipeline edge. Returns the written record, or `None` if the
    /// stage was dropped.
    async fn transition<F>(
        &self,
        stage: &str,
        case_id: &CaseId,
        version: u64,
        next: CaseStatus,
        mutate: F,
    ) -> Option<CaseRecord>
    where
        F: FnOnce(&mut CaseRecord) + Send,
    {
        let current = match self.registry.get(case_id).await {
            Ok(record) => record,
            Err(RegistryError::NotFound { .. }) => {
                log::debug!("Dropping {stage} for {case_id}: case no longer exists");
                return None;
            }
            Err(e) => {
                log::warn!("Dropping {stage} for {case_id}: {e}");
                return None;
            }
        };

        if current.version != version {
            log::debug!(
                "Dropping {stage} for {case_id}: scheduled at version {version}, now {}",
                current.version
            );
            return None;
        }

        if !current.status.can_advance_to(next) {
            log::debug!(
                "Dropping {stage} for {case_id}: cannot move {} -> {next}",
                current.status
            );
            return None;
        }

        match self
            .registry
            .update(case_id, version, |record| {
                mutate(record);
                record.status = next;
            })
            .await
        {
            Ok(updated) => {
                log::info!("Case {case_id}: {} -> {}", current.status, updated.status);
                Some(updated)
            }
            Err(e @ (RegistryError::NotFound { .. } | RegistryError::Stale { .. })) => {
                log::debug!("Dropping {stage} for {case_id}: {e}");
                None
            }
            Err(e) => {
                log::warn!("Dropping {stage} for {case_id}: {e}");
                None
            }
        }
    }
}
