#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Case record, status lifecycle, risk and review types.
//!
//! A case tracks one reported Facebook page from submission through the
//! simulated analysis pipeline and, optionally, a manual review. These types
//! are shared by the registry, the pipeline, and the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Reporter name used when a submission does not provide one.
pub const ANONYMOUS_REPORTER: &str = "Anonymous";

/// Risk scores above this value are classified as [`RiskLevel::High`].
pub const HIGH_RISK_THRESHOLD: u8 = 70;

/// Risk scores above this value (and not above [`HIGH_RISK_THRESHOLD`]) are
/// classified as [`RiskLevel::Medium`].
pub const MEDIUM_RISK_THRESHOLD: u8 = 40;

/// Maximum risk score kept on a case rejected as a false positive.
pub const FALSE_POSITIVE_SCORE_CAP: u8 = 30;

/// Unique case identifier, e.g. `CASE-1720000000000-k3j9x0a2b`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    /// Prefix shared by every generated case id.
    pub const PREFIX: &'static str = "CASE";

    /// Builds a case id from a millisecond timestamp and a random suffix.
    #[must_use]
    pub fn from_parts(millis: i64, suffix: &str) -> Self {
        Self(format!("{}-{millis}-{suffix}", Self::PREFIX))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CaseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CaseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for CaseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle status of a case.
///
/// The automatic pipeline walks
/// `submitted → analyzing → analyzed | high-risk`, and high-risk cases
/// continue `→ ai-decoy-active → ready-for-review`. The remaining variants
/// are only reached through a manual review.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CaseStatus {
    /// Accepted, waiting for analysis to start.
    Submitted,
    /// Risk scoring in progress.
    Analyzing,
    /// Scored at or below the high-risk threshold. Terminal for the pipeline.
    Analyzed,
    /// Scored above the high-risk threshold.
    HighRisk,
    /// Simulated decoy interaction in progress.
    AiDecoyActive,
    /// Decoy evidence attached. Terminal for the pipeline.
    ReadyForReview,
    /// A reviewer approved the case.
    Approved,
    /// A reviewer rejected the case as a false positive.
    Rejected,
    /// A reviewer escalated the case for specialist review.
    UnderReview,
}

impl CaseStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 9] = [
        Self::Submitted,
        Self::Analyzing,
        Self::Analyzed,
        Self::HighRisk,
        Self::AiDecoyActive,
        Self::ReadyForReview,
        Self::Approved,
        Self::Rejected,
        Self::UnderReview,
    ];

    /// Returns whether a case report can be exported in this status.
    #[must_use]
    pub const fn is_exportable(self) -> bool {
        matches!(self, Self::ReadyForReview | Self::Approved)
    }

    /// Returns whether the automatic pipeline may move a case from `self`
    /// to `next`. Reprocessing re-enters `analyzing` through a manual
    /// review, not through this table.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Submitted, Self::Analyzing)
                | (Self::Analyzing, Self::Analyzed | Self::HighRisk)
                | (Self::HighRisk, Self::AiDecoyActive)
                | (Self::AiDecoyActive, Self::ReadyForReview)
        )
    }
}

/// Risk band derived from a risk score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    /// Score at or below [`MEDIUM_RISK_THRESHOLD`].
    Low,
    /// Score above [`MEDIUM_RISK_THRESHOLD`], at or below [`HIGH_RISK_THRESHOLD`].
    Medium,
    /// Score above [`HIGH_RISK_THRESHOLD`].
    High,
}

impl RiskLevel {
    /// Classifies a risk score.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        if score > HIGH_RISK_THRESHOLD {
            Self::High
        } else if score > MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Synthetic result of the risk-scoring stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    /// Suspicious patterns found on the page.
    pub suspicious_patterns: Vec<String>,
    /// Suggested next step.
    pub recommendation: String,
    /// Confidence percentage, 70-99.
    pub confidence: u8,
}

/// Synthetic evidence gathered by the decoy interaction stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecoyResults {
    /// Bank account numbers the page asked the decoy to pay into.
    pub account_numbers: Vec<String>,
    /// Messages from the page flagged as suspicious.
    pub suspicious_messages: Vec<String>,
    /// File names of captured chat screenshots.
    pub evidence_screenshots: Vec<String>,
}

impl DecoyResults {
    /// Returns whether no evidence was gathered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.account_numbers.is_empty()
            && self.suspicious_messages.is_empty()
            && self.evidence_screenshots.is_empty()
    }
}

/// A reviewer's decision on a case.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReviewDecision {
    /// Confirm the case as fraudulent.
    Approve,
    /// Reject the case as a false positive.
    Reject,
    /// Send the case to a specialist and raise its risk level.
    Escalate,
    /// Discard previous results and rerun risk scoring.
    Reprocess,
}

impl ReviewDecision {
    /// Status a case is forced into by this decision.
    #[must_use]
    pub const fn target_status(self) -> CaseStatus {
        match self {
            Self::Approve => CaseStatus::Approved,
            Self::Reject => CaseStatus::Rejected,
            Self::Escalate => CaseStatus::UnderReview,
            Self::Reprocess => CaseStatus::Analyzing,
        }
    }

    /// Notes recorded when the reviewer leaves none.
    #[must_use]
    pub const fn default_notes(self) -> &'static str {
        match self {
            Self::Approve => "Approved for enforcement action",
            Self::Reject => "Rejected as a false positive",
            Self::Escalate => "Escalated for specialist review",
            Self::Reprocess => "Analysis restarted",
        }
    }
}

/// File format of an exported case report.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    /// Printable report.
    #[default]
    Pdf,
    /// Machine-readable report.
    Json,
    /// Spreadsheet rows.
    Csv,
}

/// Input for creating a case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCase {
    /// Page URL being reported.
    pub url: String,
    /// Reporter's name, if given.
    pub reporter_name: Option<String>,
    /// Free-text description, if given.
    pub description: Option<String>,
    /// Names of attached evidence files.
    pub evidence_files: Vec<String>,
}

impl NewCase {
    /// Creates a submission for `url` with no other details.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// A manual review request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    /// What the reviewer decided.
    pub decision: ReviewDecision,
    /// Who reviewed the case.
    pub reviewer: String,
    /// Free-text notes. Falls back to [`ReviewDecision::default_notes`].
    pub notes: Option<String>,
}

/// A tracked case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    /// Unique case id. Never changes after creation.
    pub case_id: CaseId,
    /// Reported page URL.
    pub url: String,
    /// Reporter's name.
    pub reporter_name: String,
    /// Free-text description.
    pub description: String,
    /// Names of attached evidence files.
    pub evidence_files: Vec<String>,
    /// Current lifecycle status.
    pub status: CaseStatus,
    /// Risk score (0-100), set by risk scoring.
    pub risk_score: Option<u8>,
    /// Risk band, set by risk scoring.
    pub risk_level: Option<RiskLevel>,
    /// Risk scoring output.
    pub ai_analysis: Option<AiAnalysis>,
    /// Decoy interaction output.
    pub decoy_results: Option<DecoyResults>,
    /// Latest manual review decision.
    pub review_decision: Option<ReviewDecision>,
    /// Latest reviewer.
    pub reviewed_by: Option<String>,
    /// When the latest review happened.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Notes from the latest review.
    pub reviewer_notes: Option<String>,
    /// When the case was created.
    pub created_at: DateTime<Utc>,
    /// When the case last changed.
    pub updated_at: DateTime<Utc>,
    /// Write counter used for compare-and-swap updates.
    pub version: u64,
}

impl CaseRecord {
    /// Builds a freshly submitted record from `input`.
    ///
    /// The URL is stored exactly as submitted. Blank reporter names become
    /// [`ANONYMOUS_REPORTER`].
    #[must_use]
    pub fn submitted(case_id: CaseId, input: NewCase, now: DateTime<Utc>) -> Self {
        let reporter_name = input
            .reporter_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| ANONYMOUS_REPORTER.to_string());

        Self {
            case_id,
            url: input.url,
            reporter_name,
            description: input.description.unwrap_or_default(),
            evidence_files: input.evidence_files,
            status: CaseStatus::Submitted,
            risk_score: None,
            risk_level: None,
            ai_analysis: None,
            decoy_results: None,
            review_decision: None,
            reviewed_by: None,
            reviewed_at: None,
            reviewer_notes: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Applies a manual review in place.
    ///
    /// Any status accepts any decision. Rejecting a scored case caps its
    /// score at [`FALSE_POSITIVE_SCORE_CAP`] and lowers it to
    /// [`RiskLevel::Low`]; escalating raises it to [`RiskLevel::High`];
    /// reprocessing clears every pipeline result.
    pub fn apply_review(&mut self, request: &ReviewRequest, now: DateTime<Utc>) {
        let decision = request.decision;
        self.status = decision.target_status();

        match decision {
            ReviewDecision::Approve => {}
            ReviewDecision::Reject => {
                if let Some(score) = self.risk_score {
                    let capped = score.min(FALSE_POSITIVE_SCORE_CAP);
                    self.risk_score = Some(capped);
                    self.risk_level = Some(RiskLevel::Low);
                }
            }
            ReviewDecision::Escalate => {
                self.risk_level = Some(RiskLevel::High);
            }
            ReviewDecision::Reprocess => {
                self.risk_score = None;
                self.risk_level = None;
                self.ai_analysis = None;
                self.decoy_results = None;
            }
        }

        self.review_decision = Some(decision);
        self.reviewed_by = Some(request.reviewer.clone());
        self.reviewed_at = Some(now);
        self.reviewer_notes = Some(
            request
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|notes| !notes.is_empty())
                .unwrap_or_else(|| decision.default_notes())
                .to_string(),
        );
        self.updated_at = now;
    }
}
