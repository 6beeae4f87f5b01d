#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the FakeSense server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from [`CaseRecord`] so that storage details (such as the write version)
//! stay out of the API contract.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fakesense_case_models::{
    AiAnalysis, CaseRecord, CaseStatus, DecoyResults, ExportFormat, ReviewDecision, RiskLevel,
};
use serde::{Deserialize, Serialize};

/// Default number of cases returned by the list endpoint.
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// A case as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCase {
    /// Case id.
    pub case_id: String,
    /// Reported page URL.
    pub url: String,
    /// Reporter's name.
    pub reporter_name: String,
    /// Free-text description.
    pub description: String,
    /// Names of attached evidence files.
    pub evidence_files: Vec<String>,
    /// Lifecycle status.
    pub status: CaseStatus,
    /// Risk score (0-100), once scored.
    pub risk_score: Option<u8>,
    /// Risk band, once scored.
    pub risk_level: Option<RiskLevel>,
    /// Risk scoring output.
    pub ai_analysis: Option<AiAnalysis>,
    /// Decoy interaction output.
    pub decoy_results: Option<DecoyResults>,
    /// Latest review decision.
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
}

impl From<CaseRecord> for ApiCase {
    fn from(record: CaseRecord) -> Self {
        Self {
            case_id: record.case_id.to_string(),
            url: record.url,
            reporter_name: record.reporter_name,
            description: record.description,
            evidence_files: record.evidence_files,
            status: record.status,
            risk_score: record.risk_score,
            risk_level: record.risk_level,
            ai_analysis: record.ai_analysis,
            decoy_results: record.decoy_results,
            review_decision: record.review_decision,
            reviewed_by: record.reviewed_by,
            reviewed_at: record.reviewed_at,
            reviewer_notes: record.reviewer_notes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Body of `POST /api/submissions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCaseRequest {
    /// Page URL to report.
    pub url: Option<String>,
    /// Reporter's name.
    pub reporter_name: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Names of attached evidence files.
    pub evidence_files: Option<Vec<String>>,
}

/// Response to a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCaseResponse {
    /// Always `true`.
    pub success: bool,
    /// Id of the new case.
    pub case_id: String,
    /// Always [`CaseStatus::Submitted`].
    pub status: CaseStatus,
    /// Human-readable acknowledgement.
    pub message: String,
    /// Rough time until the analysis finishes.
    pub estimated_time: String,
}

/// Query parameters for `GET /api/submissions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCasesParams {
    /// Maximum number of cases to return.
    pub limit: Option<usize>,
    /// Matching cases to skip.
    pub offset: Option<usize>,
    /// Status to filter by, or `all`.
    pub status: Option<String>,
    /// Risk level to filter by, or `all`.
    pub risk_level: Option<String>,
}

/// Response of `GET /api/submissions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCaseList {
    /// Number of cases in the registry.
    pub total: usize,
    /// Requested page of matching cases, newest first.
    pub submissions: Vec<ApiCase>,
    /// Counts over the whole registry.
    pub stats: ApiCaseStats,
    /// Where this page sits among the matching cases.
    pub pagination: ApiPagination,
}

/// Registry-wide counts returned with every listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCaseStats {
    /// Number of cases.
    pub total: usize,
    /// Case count keyed by status, including zero counts.
    pub by_status: BTreeMap<String, usize>,
    /// Cases scored high.
    pub high_risk: usize,
    /// Cases scored medium.
    pub medium_risk: usize,
    /// Cases scored low.
    pub low_risk: usize,
    /// Rounded mean risk score of scored cases.
    pub average_risk_score: Option<u8>,
    /// Latest change to any case.
    pub last_updated: Option<DateTime<Utc>>,
}

/// Paging metadata for a listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPagination {
    /// Cases matching the filters.
    pub total: usize,
    /// Page size.
    pub limit: usize,
    /// Matching cases skipped.
    pub offset: usize,
    /// Whether more matching cases follow this page.
    pub has_more: bool,
}

/// Body of `PUT /api/cases/{caseId}/export`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportCaseRequest {
    /// `pdf` (default), `json` or `csv`.
    pub export_format: Option<String>,
}

/// Response to a successful export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiExportResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable acknowledgement.
    pub message: String,
    /// Where the generated report can be downloaded.
    pub export_url: String,
    /// Format of the report.
    pub format: ExportFormat,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
}

/// Body of `POST /api/cases/{caseId}/review`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCaseRequest {
    /// `approve`, `reject`, `escalate` or `reprocess`.
    pub decision: Option<String>,
    /// Reviewer notes.
    pub notes: Option<String>,
    /// Reviewer name.
    pub reviewer: Option<String>,
}

/// Response to a successful review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReviewResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable acknowledgement.
    pub message: String,
    /// The case after the review.
    pub case: ApiCase,
}

/// Body of `POST /api/scans`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// URL to scan.
    pub url: Option<String>,
}

/// Body of `POST /api/scans/auto`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScanRequest {
    /// Keywords to discover pages by.
    pub keywords: Option<Vec<String>>,
}

/// Response of `GET /api/scans`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiScannerInfo {
    /// Service name.
    pub message: String,
    /// Service version.
    pub version: String,
    /// Service status.
    pub status: String,
    /// What the scanner does.
    pub description: String,
}

/// Response of `GET /api/scans/auto`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAutoScanInfo {
    /// Service name.
    pub message: String,
    /// Service version.
    pub version: String,
    /// Service status.
    pub status: String,
    /// What the auto-scan does.
    pub description: String,
    /// Capabilities of the auto-scan.
    pub features: Vec<String>,
    /// Keywords with known page mappings.
    pub supported_keywords: Vec<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// What went wrong.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
