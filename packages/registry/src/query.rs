//! Filtered, paged views of the registry and summary statistics.

use chrono::{DateTime, Utc};
use fakesense_case_models::{CaseRecord, CaseStatus, RiskLevel};

/// Restricts which cases a query returns. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseFilter {
    /// Only cases in this status.
    pub status: Option<CaseStatus>,
    /// Only cases scored into this band. Unscored cases never match.
    pub risk_level: Option<RiskLevel>,
}

impl CaseFilter {
    /// Returns whether `record` passes the filter.
    #[must_use]
    pub fn matches(&self, record: &CaseRecord) -> bool {
        self.status.is_none_or(|status| record.status == status)
            && self
                .risk_level
                .is_none_or(|level| record.risk_level == Some(level))
    }
}

/// One page of a filtered listing, newest first.
#[derive(Debug, Clone)]
pub struct CasePage {
    /// Cases on this page.
    pub records: Vec<CaseRecord>,
    /// Cases matching the filter across all pages.
    pub matching: usize,
    /// Matching cases skipped before this page.
    pub offset: usize,
    /// Requested page size.
    pub limit: usize,
}

impl CasePage {
    /// Returns whether matching cases remain after this page.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.offset.saturating_add(self.limit) < self.matching
    }
}

/// Counts over every case in the registry, ignoring any filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseStats {
    /// Number of cases.
    pub total: usize,
    /// Case count per status, in [`CaseStatus::ALL`] order.
    pub by_status: Vec<(CaseStatus, usize)>,
    /// Cases scored high.
    pub high_risk: usize,
    /// Cases scored medium.
    pub medium_risk: usize,
    /// Cases scored low.
    pub low_risk: usize,
    /// Mean risk score of scored cases, rounded half up. `None` if no case
    /// has been scored.
    pub average_risk_score: Option<u8>,
    /// Most recent `updated_at` of any case.
    pub last_updated: Option<DateTime<Utc>>,
}

impl CaseStats {
    /// Summarizes `records`.
    #[must_use]
    pub fn from_records(records: &[CaseRecord]) -> Self {
        let by_status = CaseStatus::ALL
            .into_iter()
            .map(|status| {
                let count = records.iter().filter(|r| r.status == status).count();
                (status, count)
            })
            .collect();
        let risk_count =
            |level: RiskLevel| records.iter().filter(|r| r.risk_level == Some(level)).count();

        let scores: Vec<u64> = records
            .iter()
            .filter_map(|r| r.risk_score.map(u64::from))
            .collect();
        let average_risk_score = u64::try_from(scores.len())
            .ok()
            .filter(|&n| n > 0)
            .and_then(|n| u8::try_from((scores.iter().sum::<u64>() + n / 2) / n).ok());

        Self {
            total: records.len(),
            by_status,
            high_risk: risk_count(RiskLevel::High),
            medium_risk: risk_count(RiskLevel::Medium),
            low_risk: risk_count(RiskLevel::Low),
            average_risk_score,
            last_updated: records.iter().map(|r| r.updated_at).max(),
        }
    }

    /// Case count for one status.
    #[must_use]
    pub fn count_of(&self, status: CaseStatus) -> usize {
        self.by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, count)| *count)
    }
}
