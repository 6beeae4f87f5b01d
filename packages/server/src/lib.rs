#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the FakeSense case service.
//!
//! Accepts reports of suspected fake Facebook pages, tracks each report as a
//! case that moves through a simulated analysis pipeline in the background,
//! and lets reviewers override the outcome. Quick stateless scans are served
//! from `/api/scans`. All state lives in memory and is lost on restart.

pub mod config;
pub mod form;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error, guard, middleware, web};
use fakesense_pipeline::AnalysisPipeline;
use fakesense_pipeline::randomness::{Randomness, SeededRandomness};
use fakesense_pipeline::scheduler::{Scheduler, TokioScheduler};
use fakesense_registry::{CaseIdGenerator, CaseRegistry, CaseStore, InMemoryCaseStore};
use fakesense_server_models::ApiError;

pub use config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Case pipeline, which also owns the case registry.
    pub pipeline: AnalysisPipeline,
    /// Randomness for page scans.
    pub randomness: Arc<dyn Randomness>,
    /// Cases returned by the list endpoint when no limit is given.
    pub default_list_limit: usize,
    /// Prefix of generated report links.
    pub export_base_url: String,
}

impl AppState {
    /// Builds an in-memory registry and a pipeline running on `scheduler`.
    ///
    /// With a fixed seed in `config`, case ids, pipeline scores and scan
    /// results are reproducible.
    #[must_use]
    pub fn new(config: &ServerConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_store(config, Arc::new(InMemoryCaseStore::new()), scheduler)
    }

    /// Like [`AppState::new`], but keeps cases in `store`.
    #[must_use]
    pub fn with_store(
        config: &ServerConfig,
        store: Arc<dyn CaseStore>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let (ids, pipeline_randomness, scan_randomness) = match config.random_seed {
            Some(seed) => (
                CaseIdGenerator::seeded(seed),
                SeededRandomness::from_seed(seed.wrapping_add(1)),
                SeededRandomness::from_seed(seed.wrapping_add(2)),
            ),
            None => (
                CaseIdGenerator::new(),
                SeededRandomness::from_entropy(),
                SeededRandomness::from_entropy(),
            ),
        };

        let registry = Arc::new(CaseRegistry::with_id_generator(store, ids));
        let pipeline = AnalysisPipeline::new(
            registry,
            scheduler,
            Arc::new(pipeline_randomness),
            config.pipeline,
        );

        Self {
            pipeline,
            randomness: Arc::new(scan_randomness),
            default_list_limit: config.default_list_limit,
            export_base_url: config.export_base_url.clone(),
        }
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .app_data(query_config())
            .route("/health", web::get().to(handlers::health))
            .route(
                "/submissions",
                web::post()
                    .guard(guard::fn_guard(form::is_multipart))
                    .to(handlers::submit_case_form),
            )
            .route("/submissions", web::post().to(handlers::submit_case))
            .route("/submissions", web::get().to(handlers::list_cases))
            .route("/submissions/{case_id}", web::get().to(handlers::get_case))
            .route(
                "/cases/{case_id}/review",
                web::post().to(handlers::review_case),
            )
            .route(
                "/cases/{case_id}/export",
                web::put().to(handlers::export_case),
            )
            .route("/scans", web::get().to(handlers::scanner_info))
            .route("/scans", web::post().to(handlers::scan))
            .route("/scans/auto", web::get().to(handlers::auto_scan_info))
            .route("/scans/auto", web::post().to(handlers::auto_scan)),
    );
}

/// Malformed JSON bodies get a 400 with an [`ApiError`] body.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::debug!("Rejected request body: {err}");
        let response = HttpResponse::BadRequest().json(ApiError::new(err.to_string()));
        error::InternalError::from_response(err, response).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ApiError::new(err.to_string()));
        error::InternalError::from_response(err, response).into()
    })
}

/// Starts the FakeSense API server.
///
/// Reads [`ServerConfig`] from the environment, builds the in-memory
/// application state, and starts the Actix-Web HTTP server. Pipeline stages
/// are spawned on the caller's tokio runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if no tokio runtime is running, or if
/// the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();
    log::info!(
        "Pipeline delays: intake {:?}, analysis {:?}, decoy start {:?}, decoy {:?}",
        config.pipeline.intake_delay,
        config.pipeline.analysis_delay,
        config.pipeline.decoy_start_delay,
        config.pipeline.decoy_delay,
    );
    if let Some(seed) = config.random_seed {
        log::info!("Using fixed random seed {seed}");
    }

    let scheduler = TokioScheduler::current().map_err(std::io::Error::other)?;
    let state = web::Data::new(AppState::new(&config, Arc::new(scheduler)));

    let ServerConfig {
        bind_addr, port, ..
    } = config;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::{App, http::StatusCode, test};
    use fakesense_case_models::{CaseId, CaseRecord};
    use fakesense_pipeline::PipelineConfig;
    use fakesense_pipeline::randomness::SequenceRandomness;
    use fakesense_pipeline::scheduler::ManualScheduler;
    use fakesense_registry::StoreError;
    use regex::Regex;
    use serde_json::{Value, json};

    use super::*;

    fn state(scheduler: Arc<ManualScheduler>, pipeline_values: &[u32]) -> web::Data<AppState> {
        let registry = Arc::new(CaseRegistry::with_id_generator(
            Arc::new(InMemoryCaseStore::new()),
            CaseIdGenerator::seeded(3),
        ));
        let pipeline = AnalysisPipeline::new(
            registry,
            scheduler,
            Arc::new(SequenceRandomness::new(pipeline_values.to_vec())),
            PipelineConfig::default(),
        );
        web::Data::new(AppState {
            pipeline,
            randomness: Arc::new(SequenceRandomness::new(vec![10, 3])),
            default_list_limit: 10,
            export_base_url: "https://reports.test/export".to_string(),
        })
    }

    /// Loses every compare-and-swap, as if another writer always got there
    /// first.
    struct AlwaysConflictingStore {
        inner: InMemoryCaseStore,
    }

    #[async_trait::async_trait]
    impl CaseStore for AlwaysConflictingStore {
        async fn insert(&self, record: CaseRecord) -> Result<(), StoreError> {
            self.inner.insert(record).await
        }

        async fn get(&self, case_id: &CaseId) -> Result<Option<CaseRecord>, StoreError> {
            self.inner.get(case_id).await
        }

        async fn recent(&self, limit: usize) -> Result<Vec<CaseRecord>, StoreError> {
            self.inner.recent(limit).await
        }

        async fn replace(
            &self,
            record: CaseRecord,
            expected_version: u64,
        ) -> Result<CaseRecord, StoreError> {
            Err(StoreError::VersionConflict {
                case_id: record.case_id,
                expected: expected_version,
                actual: expected_version + 1,
            })
        }

        async fn len(&self) -> Result<usize, StoreError> {
            self.inner.len().await
        }

        async fn clear(&self) -> Result<(), StoreError> {
            self.inner.clear().await
        }
    }

    const BOUNDARY: &str = "fakesense-test-boundary";

    /// Builds a `multipart/form-data` body from text fields and
    /// `(field, file name, contents)` files.
    fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &str)]) -> String {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        for (name, file_name, contents) in files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n{contents}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn multipart_request(body: String) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/submissions")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(configure)).await
        };
    }

    macro_rules! submit {
        ($app:expr, $url:expr) => {{
            let req = test::TestRequest::post()
                .uri("/api/submissions")
                .set_json(json!({ "url": $url, "reporterName": "Ann" }))
                .to_request();
            let body: Value = test::call_and_read_body_json(&$app, req).await;
            body["caseId"].as_str().unwrap().to_string()
        }};
    }

    #[actix_web::test]
    async fn health_is_ok() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["healthy"], true);
    }

    #[actix_web::test]
    async fn submit_returns_case_id() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/submissions")
            .set_json(json!({ "url": "https://www.facebook.com/some-page" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "submitted");
        assert_eq!(body["estimatedTime"], "about 13 seconds");

        let case_id = body["caseId"].as_str().unwrap();
        let pattern = Regex::new(r"^CASE-\d+-[a-z0-9]+$").unwrap();
        assert!(pattern.is_match(case_id), "unexpected case id {case_id}");
    }

    #[actix_web::test]
    async fn invalid_submissions_are_rejected() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);

        for body in [
            json!({}),
            json!({ "url": "" }),
            json!({ "url": "https://twitter.com/someone" }),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/submissions")
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert!(body["error"].is_string());
        }

        assert_eq!(state.pipeline.registry().count().await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn malformed_json_is_bad_request() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/submissions")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn unknown_case_is_not_found() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/submissions/CASE-0-missing")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn polling_shows_pipeline_progress() {
        let scheduler = Arc::new(ManualScheduler::new());
        let state = state(scheduler.clone(), &[50]);
        let app = app!(state);

        let case_id = submit!(app, "https://facebook.com/suspicious-page");
        let uri = format!("/api/submissions/{case_id}");

        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request())
                .await;
        assert_eq!(body["status"], "submitted");
        assert!(body["riskScore"].is_null());

        scheduler.advance(Duration::from_secs(6)).await;

        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request())
                .await;
        assert_eq!(body["status"], "analyzed");
        assert_eq!(body["riskScore"], 50);
        assert_eq!(body["riskLevel"], "medium");
        assert_eq!(body["reporterName"], "Ann");
    }

    #[actix_web::test]
    async fn list_is_newest_first_and_limited() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);

        let mut ids = Vec::new();
        for i in 0..3 {
            ids.push(submit!(app, format!("https://facebook.com/page-{i}")));
        }

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/api/submissions?limit=2")
                .to_request(),
        )
        .await;
        assert_eq!(body["total"], 3);
        let listed: Vec<&str> = body["submissions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["caseId"].as_str().unwrap())
            .collect();
        assert_eq!(listed, vec![ids[2].as_str(), ids[1].as_str()]);
    }

    #[actix_web::test]
    async fn review_overrides_pipeline() {
        let scheduler = Arc::new(ManualScheduler::new());
        let state = state(scheduler.clone(), &[90]);
        let app = app!(state);

        let case_id = submit!(app, "https://facebook.com/promo-page");

        let req = test::TestRequest::post()
            .uri(&format!("/api/cases/{case_id}/review"))
            .set_json(json!({ "decision": "approve", "reviewer": "Bo" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["case"]["status"], "approved");
        assert_eq!(body["case"]["reviewedBy"], "Bo");

        scheduler.advance(Duration::from_secs(20)).await;

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/submissions/{case_id}"))
                .to_request(),
        )
        .await;
        assert_eq!(body["status"], "approved");
    }

    #[actix_web::test]
    async fn review_without_reviewer_uses_default() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);
        let case_id = submit!(app, "https://facebook.com/page");

        let req = test::TestRequest::post()
            .uri(&format!("/api/cases/{case_id}/review"))
            .set_json(json!({ "decision": "reject" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["case"]["status"], "rejected");
        assert_eq!(body["case"]["reviewedBy"], "system reviewer");
    }

    #[actix_web::test]
    async fn review_rejects_bad_input() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);
        let case_id = submit!(app, "https://facebook.com/page");

        for body in [json!({}), json!({ "decision": "delete" })] {
            let req = test::TestRequest::post()
                .uri(&format!("/api/cases/{case_id}/review"))
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }

        let req = test::TestRequest::post()
            .uri("/api/cases/CASE-0-missing/review")
            .set_json(json!({ "decision": "approve" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn scan_endpoints() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);

        let info: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/scans").to_request(),
        )
        .await;
        assert_eq!(info["status"], "active");

        let req = test::TestRequest::post()
            .uri("/api/scans")
            .set_json(json!({ "url": "https://facebook.com/promo-winner" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["riskLevel"], "high");
        assert_eq!(body["scanType"], "manual");

        let req = test::TestRequest::post()
            .uri("/api/scans")
            .set_json(json!({ "url": "https://example.com/page" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn auto_scan_requires_keywords() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/scans/auto")
            .set_json(json!({ "keywords": [] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/scans/auto")
            .set_json(json!({ "keywords": ["money"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        for result in body.as_array().unwrap() {
            assert_eq!(result["scanType"], "auto");
            assert!(result["url"].as_str().unwrap().contains("money"));
        }
    }

    #[actix_web::test]
    async fn form_submission_keeps_evidence_file_names() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);

        let body = multipart_body(
            &[
                ("url", "https://facebook.com/lottery-winner"),
                ("reporterName", "Ann"),
                ("description", "Asked me to pay a fee"),
                ("unrelated", "ignored"),
            ],
            &[
                ("evidence_0", "chat.png", "first image bytes"),
                ("evidence_1", "receipt.png", "second image bytes"),
                ("attachment", "other.png", "not evidence"),
            ],
        );
        let resp = test::call_service(&app, multipart_request(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let case_id = body["caseId"].as_str().unwrap();

        let case: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/submissions/{case_id}"))
                .to_request(),
        )
        .await;
        assert_eq!(case["url"], "https://facebook.com/lottery-winner");
        assert_eq!(case["reporterName"], "Ann");
        assert_eq!(case["description"], "Asked me to pay a fee");
        assert_eq!(case["evidenceFiles"], json!(["chat.png", "receipt.png"]));
    }

    #[actix_web::test]
    async fn form_submission_is_validated_like_json() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);

        let body = multipart_body(
            &[("url", "https://twitter.com/someone")],
            &[("evidence_0", "chat.png", "bytes")],
        );
        let resp = test::call_service(&app, multipart_request(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(&app, multipart_request("garbage".to_string()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert_eq!(state.pipeline.registry().count().await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn blank_case_id_is_not_found() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/submissions/%20")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );

        let req = test::TestRequest::post()
            .uri("/api/cases/%20/review")
            .set_json(json!({ "decision": "approve" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn list_filters_pages_and_summarizes() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);

        let first = submit!(app, "https://facebook.com/page-0");
        let second = submit!(app, "https://facebook.com/page-1");
        let req = test::TestRequest::post()
            .uri(&format!("/api/cases/{first}/review"))
            .set_json(json!({ "decision": "approve" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let list = |uri: &'static str| test::TestRequest::get().uri(uri).to_request();

        let body: Value =
            test::call_and_read_body_json(&app, list("/api/submissions?status=approved")).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["submissions"].as_array().unwrap().len(), 1);
        assert_eq!(body["submissions"][0]["caseId"], first.as_str());
        assert_eq!(body["pagination"]["total"], 1);
        assert_eq!(body["stats"]["byStatus"]["approved"], 1);
        assert_eq!(body["stats"]["byStatus"]["submitted"], 1);
        assert_eq!(body["stats"]["byStatus"]["high-risk"], 0);
        assert!(body["stats"]["averageRiskScore"].is_null());

        let body: Value = test::call_and_read_body_json(
            &app,
            list("/api/submissions?status=all&riskLevel=all&limit=1"),
        )
        .await;
        assert_eq!(body["submissions"][0]["caseId"], second.as_str());
        assert_eq!(
            body["pagination"],
            json!({ "total": 2, "limit": 1, "offset": 0, "hasMore": true })
        );

        let body: Value = test::call_and_read_body_json(
            &app,
            list("/api/submissions?status=high-risk&offset=5"),
        )
        .await;
        assert_eq!(body["submissions"], json!([]));
        assert_eq!(
            body["pagination"],
            json!({ "total": 0, "limit": 10, "offset": 5, "hasMore": false })
        );
        assert_eq!(body["stats"]["total"], 2);

        for uri in [
            "/api/submissions?status=deleted",
            "/api/submissions?riskLevel=extreme",
            "/api/submissions?offset=-1",
        ] {
            let resp = test::call_service(&app, list(uri)).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[actix_web::test]
    async fn export_requires_reviewable_case() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);
        let case_id = submit!(app, "https://facebook.com/page");
        let export = |format: Value| {
            test::TestRequest::put()
                .uri(&format!("/api/cases/{case_id}/export"))
                .set_json(json!({ "exportFormat": format }))
                .to_request()
        };

        let resp = test::call_service(&app, export(Value::Null)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Case not ready for export");

        let req = test::TestRequest::post()
            .uri(&format!("/api/cases/{case_id}/review"))
            .set_json(json!({ "decision": "approve" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let body: Value = test::call_and_read_body_json(&app, export(Value::Null)).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["format"], "pdf");
        assert_eq!(
            body["exportUrl"],
            format!("https://reports.test/export/{case_id}.pdf")
        );
        assert!(body["generatedAt"].is_string());

        let body: Value = test::call_and_read_body_json(&app, export(json!("CSV"))).await;
        assert_eq!(body["format"], "csv");

        let resp = test::call_service(&app, export(json!("docx"))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri("/api/cases/CASE-0-missing/export")
            .set_json(json!({}))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn review_losing_every_race_is_conflict() {
        let config = ServerConfig {
            random_seed: Some(1),
            ..ServerConfig::default()
        };
        let state = web::Data::new(AppState::with_store(
            &config,
            Arc::new(AlwaysConflictingStore {
                inner: InMemoryCaseStore::new(),
            }),
            Arc::new(ManualScheduler::new()),
        ));
        let app = app!(state);
        let case_id = submit!(app, "https://facebook.com/page");

        let req = test::TestRequest::post()
            .uri(&format!("/api/cases/{case_id}/review"))
            .set_json(json!({ "decision": "approve" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains(&case_id));
    }

    #[actix_web::test]
    async fn auto_scan_info_lists_keywords() {
        let state = state(Arc::new(ManualScheduler::new()), &[50]);
        let app = app!(state);

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/scans/auto").to_request(),
        )
        .await;
        assert_eq!(body["status"], "active");
        assert_eq!(body["features"].as_array().unwrap().len(), 3);
        let keywords = body["supportedKeywords"].as_array().unwrap();
        assert_eq!(keywords.len(), 6);
        assert!(keywords.contains(&json!("ลงทุน")));
    }

    #[actix_web::test]
    async fn seeded_state_builds() {
        let config = ServerConfig {
            random_seed: Some(7),
            ..ServerConfig::default()
        };
        let state = AppState::new(&config, Arc::new(ManualScheduler::new()));
        assert_eq!(state.default_list_limit, 10);
        assert_eq!(state.pipeline.config(), &PipelineConfig::default());
    }
}
