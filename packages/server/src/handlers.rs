//! HTTP handler functions for the FakeSense API.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use fakesense_case_models::{
    CaseId, CaseStatus, ExportFormat, NewCase, ReviewDecision, ReviewRequest, RiskLevel,
};
use fakesense_registry::{CaseFilter, CaseStats, RegistryError};
use fakesense_scanner::{ScanError, ScanType};
use fakesense_server_models::{
    ApiAutoScanInfo, ApiCase, ApiCaseList, ApiCaseStats, ApiError, ApiExportResponse, ApiHealth,
    ApiPagination, ApiReviewResponse, ApiScannerInfo, AutoScanRequest, ExportCaseRequest,
    ListCasesParams, ReviewCaseRequest, ScanRequest, SubmitCaseRequest, SubmitCaseResponse,
};

use crate::{AppState, form};

/// Reviewer recorded when the request names none.
const DEFAULT_REVIEWER: &str = "system reviewer";

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/submissions` with a JSON body
///
/// Creates a case and starts its analysis in the background.
pub async fn submit_case(
    state: web::Data<AppState>,
    body: web::Json<SubmitCaseRequest>,
) -> HttpResponse {
    submit(&state, body.into_inner()).await
}

/// `POST /api/submissions` with a `multipart/form-data` body
#[allow(clippy::future_not_send)]
pub async fn submit_case_form(state: web::Data<AppState>, payload: Multipart) -> HttpResponse {
    match form::read_submission(payload).await {
        Ok(body) => submit(&state, body).await,
        Err(e) => {
            log::debug!("Rejected submission form: {e}");
            HttpResponse::BadRequest().json(ApiError::new(e.to_string()))
        }
    }
}

async fn submit(state: &AppState, body: SubmitCaseRequest) -> HttpResponse {
    let input = NewCase {
        url: body.url.unwrap_or_default(),
        reporter_name: body.reporter_name,
        description: body.description,
        evidence_files: body.evidence_files.unwrap_or_default(),
    };

    match state.pipeline.submit(input).await {
        Ok(case_id) => {
            let secs = state.pipeline.config().total_duration().as_secs();
            HttpResponse::Ok().json(SubmitCaseResponse {
                success: true,
                case_id: case_id.to_string(),
                status: CaseStatus::Submitted,
                message: "Report received, analysis has started".to_string(),
                estimated_time: format!("about {secs} seconds"),
            })
        }
        Err(e) => registry_error("submit case", &e),
    }
}

/// `GET /api/submissions/{case_id}`
pub async fn get_case(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let case_id = CaseId::from(path.into_inner());

    match state.pipeline.registry().get(&case_id).await {
        Ok(record) => HttpResponse::Ok().json(ApiCase::from(record)),
        Err(e) => registry_error("get case", &e),
    }
}

/// `GET /api/submissions`
///
/// Lists cases newest first, optionally filtered by `status` and
/// `riskLevel` (`all` disables a filter) and paged with `offset` and
/// `limit`. Stats always cover the whole registry.
pub async fn list_cases(
    state: web::Data<AppState>,
    params: web::Query<ListCasesParams>,
) -> HttpResponse {
    let params = params.into_inner();
    let filter = match list_filter(&params) {
        Ok(filter) => filter,
        Err(message) => return HttpResponse::BadRequest().json(ApiError::new(message)),
    };
    let limit = params.limit.unwrap_or(state.default_list_limit);
    let offset = params.offset.unwrap_or(0);
    let registry = state.pipeline.registry();

    let page = match registry.query(&filter, offset, limit).await {
        Ok(page) => page,
        Err(e) => return registry_error("list cases", &e),
    };
    let stats = match registry.stats().await {
        Ok(stats) => stats,
        Err(e) => return registry_error("summarize cases", &e),
    };

    let pagination = ApiPagination {
        total: page.matching,
        limit: page.limit,
        offset: page.offset,
        has_more: page.has_more(),
    };

    HttpResponse::Ok().json(ApiCaseList {
        total: stats.total,
        submissions: page.records.into_iter().map(ApiCase::from).collect(),
        stats: api_stats(stats),
        pagination,
    })
}

fn list_filter(params: &ListCasesParams) -> Result<CaseFilter, String> {
    fn parse<T: std::str::FromStr>(value: Option<&str>, what: &str) -> Result<Option<T>, String> {
        match value.map(str::trim) {
            None | Some("" | "all") => Ok(None),
            Some(value) => value
                .to_ascii_lowercase()
                .parse()
                .map(Some)
                .map_err(|_| format!("Unknown {what}: {value}")),
        }
    }

    Ok(CaseFilter {
        status: parse::<CaseStatus>(params.status.as_deref(), "status")?,
        risk_level: parse::<RiskLevel>(params.risk_level.as_deref(), "risk level")?,
    })
}

fn api_stats(stats: CaseStats) -> ApiCaseStats {
    ApiCaseStats {
        total: stats.total,
        by_status: stats
            .by_status
            .iter()
            .map(|(status, count)| (status.to_string(), *count))
            .collect(),
        high_risk: stats.high_risk,
        medium_risk: stats.medium_risk,
        low_risk: stats.low_risk,
        average_risk_score: stats.average_risk_score,
        last_updated: stats.last_updated,
    }
}

/// `POST /api/cases/{case_id}/review`
///
/// Applies a manual review decision, overriding whatever the pipeline is
/// doing with the case.
pub async fn review_case(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ReviewCaseRequest>,
) -> HttpResponse {
    let case_id = CaseId::from(path.into_inner());
    let body = body.into_inner();
    let Some(decision) = body
        .decision
        .as_deref()
        .and_then(|d| d.trim().parse::<ReviewDecision>().ok())
    else {
        return HttpResponse::BadRequest().json(ApiError::new(
            "Decision must be one of approve, reject, escalate or reprocess",
        ));
    };

    let request = ReviewRequest {
        decision,
        reviewer: body
            .reviewer
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REVIEWER.to_string()),
        notes: body.notes.filter(|n| !n.trim().is_empty()),
    };

    match state.pipeline.review(&case_id, &request).await {
        Ok(record) => HttpResponse::Ok().json(ApiReviewResponse {
            success: true,
            message: format!("Case {decision} recorded"),
            case: ApiCase::from(record),
        }),
        Err(e) => registry_error("review case", &e),
    }
}

/// `PUT /api/cases/{case_id}/export`
///
/// Returns a download link for the case report. Only cases that are ready
/// for review or approved can be exported.
pub async fn export_case(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ExportCaseRequest>,
) -> HttpResponse {
    let case_id = CaseId::from(path.into_inner());
    let format = match body.into_inner().export_format.as_deref().map(str::trim) {
        None | Some("") => ExportFormat::default(),
        Some(format) => match format.parse::<ExportFormat>() {
            Ok(format) => format,
            Err(_) => {
                return HttpResponse::BadRequest().json(ApiError::new(format!(
                    "Unsupported export format: {format}"
                )));
            }
        },
    };

    let record = match state.pipeline.registry().get(&case_id).await {
        Ok(record) => record,
        Err(e) => return registry_error("export case", &e),
    };
    if !record.status.is_exportable() {
        return HttpResponse::BadRequest().json(ApiError::new("Case not ready for export"));
    }

    log::info!("Exported case {case_id} as {format}");
    HttpResponse::Ok().json(ApiExportResponse {
        success: true,
        message: "Report generated".to_string(),
        export_url: format!("{}/{case_id}.{format}", state.export_base_url),
        format,
        generated_at: Utc::now(),
    })
}

/// `GET /api/scans`
pub async fn scanner_info() -> HttpResponse {
    HttpResponse::Ok().json(ApiScannerInfo {
        message: "FakeSense Scanner API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "active".to_string(),
        description: "Keyword-based risk scans of Facebook pages".to_string(),
    })
}

/// `POST /api/scans`
pub async fn scan(state: web::Data<AppState>, body: web::Json<ScanRequest>) -> HttpResponse {
    let url = body.into_inner().url.unwrap_or_default();

    match fakesense_scanner::scan_page(&url, ScanType::Manual, state.randomness.as_ref()) {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => scan_error(&e),
    }
}

/// `GET /api/scans/auto`
pub async fn auto_scan_info() -> HttpResponse {
    HttpResponse::Ok().json(ApiAutoScanInfo {
        message: "FakeSense Auto Scan Engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "active".to_string(),
        description: "Finds suspicious pages by keyword and scans them".to_string(),
        features: [
            "Keyword-based page discovery",
            "Automated risk assessment",
            "Suspicious pattern detection",
        ]
        .into_iter()
        .map(ToString::to_string)
        .collect(),
        supported_keywords: fakesense_scanner::SUPPORTED_KEYWORDS
            .iter()
            .map(ToString::to_string)
            .collect(),
    })
}

/// `POST /api/scans/auto`
///
/// Discovers pages by keyword and scans each of them.
pub async fn auto_scan(
    state: web::Data<AppState>,
    body: web::Json<AutoScanRequest>,
) -> HttpResponse {
    let keywords = body.into_inner().keywords.unwrap_or_default();

    match fakesense_scanner::auto_scan(&keywords, state.randomness.as_ref()) {
        Ok(results) => HttpResponse::Ok().json(results),
        Err(e) => scan_error(&e),
    }
}

fn registry_error(action: &str, err: &RegistryError) -> HttpResponse {
    match err {
        RegistryError::Validation { message } => {
            HttpResponse::BadRequest().json(ApiError::new(message.as_str()))
        }
        RegistryError::NotFound { .. } => {
            HttpResponse::NotFound().json(ApiError::new(err.to_string()))
        }
        RegistryError::Stale { .. } => {
            log::warn!("Failed to {action}: {err}");
            HttpResponse::Conflict().json(ApiError::new(err.to_string()))
        }
        RegistryError::Store(_) => {
            log::error!("Failed to {action}: {err}");
            HttpResponse::InternalServerError().json(ApiError::new("Internal server error"))
        }
    }
}

fn scan_error(err: &ScanError) -> HttpResponse {
    log::debug!("Rejected scan: {err}");
    HttpResponse::BadRequest().json(ApiError::new(err.to_string()))
}
