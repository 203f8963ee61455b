//! HTTP server for pdfqa.
//!
//! Provides endpoints for uploading PDF documents and asking questions about
//! them. Type and size checks happen here, before the core is invoked.

mod error;
mod handlers;

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use pdfqa_core::control::QaControlPlane;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

pub use error::ApiError;
pub use handlers::{QuestionResponse, UploadResponse};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct QaServerConfig {
    pub addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub request_timeout: Duration,
    pub cors_origins: Vec<String>,
}

impl QaServerConfig {
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            max_upload_bytes: 10 * 1024 * 1024,
            request_timeout: Duration::from_secs(60),
            cors_origins: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    #[must_use]
    pub fn with_cors_origins(mut self, cors_origins: Vec<String>) -> Self {
        self.cors_origins = cors_origins;
        self
    }
}

impl Default for QaServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], 8000)))
    }
}

/// HTTP server wrapper.
pub struct QaServer {
    config: QaServerConfig,
    state: AppState,
}

impl QaServer {
    #[must_use]
    pub fn new(control: QaControlPlane, config: QaServerConfig) -> Self {
        let state = AppState {
            control,
            request_timeout: config.request_timeout,
            max_upload_bytes: config.max_upload_bytes,
        };
        Self { config, state }
    }

    /// Runs the HTTP server until `shutdown` resolves.
    ///
    /// # Errors
    /// Returns any listener or server error.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.addr;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let app = build_router(self.state, &self.config);

        info!("pdfqa listening on {addr}");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("pdfqa stopped");
        Ok(())
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) control: QaControlPlane,
    pub(crate) request_timeout: Duration,
    pub(crate) max_upload_bytes: usize,
}

fn build_router(state: AppState, config: &QaServerConfig) -> Router {
    let body_limit = config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/api", get(handlers::root))
        .route("/api/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .route("/api/upload", post(handlers::upload))
        .route("/api/ask", post(handlers::ask))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use pdfqa_core::answer::{
        AnswerError,
        AnswerFuture,
        AnswerRequest,
        AnsweringEngine,
        AnsweringStrategy,
    };
    use pdfqa_core::parsers::{PageExtractor, PdfParseError};
    use pdfqa_core::store::{DocStoreConfig, MemoryDocStore};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const BOUNDARY: &str = "pdfqa-test-boundary";

    /// Treats the upload as UTF-8 text on a single page.
    struct TextExtractor;

    impl PageExtractor for TextExtractor {
        fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, PdfParseError> {
            let text = std::str::from_utf8(bytes)
                .map_err(|err| PdfParseError::new(err.to_string()))?;
            if text.starts_with("corrupt") {
                return Err(PdfParseError::new("xref table missing"));
            }
            Ok(vec![text.to_string()])
        }
    }

    struct OfflineStrategy;

    impl AnsweringStrategy for OfflineStrategy {
        fn name(&self) -> &'static str {
            "offline"
        }

        fn answer<'a>(&'a self, _request: AnswerRequest<'a>) -> AnswerFuture<'a> {
            Box::pin(async { Err(AnswerError::backend_unavailable("offline", "connection refused")) })
        }
    }

    async fn test_router(dir: &Path, engine: AnsweringEngine, max_upload_bytes: usize) -> Router {
        let store = MemoryDocStore::open_with_extractor(DocStoreConfig::new(dir), Arc::new(TextExtractor))
            .await
            .expect("store should open");
        let config = QaServerConfig::default()
            .with_max_upload_bytes(max_upload_bytes)
            .with_cors_origins(vec!["http://localhost:5173".to_string()]);
        let state = AppState {
            control: QaControlPlane::new(store, engine),
            request_timeout: config.request_timeout,
            max_upload_bytes: config.max_upload_bytes,
        };
        build_router(state, &config)
    }

    fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .expect("valid upload request")
    }

    fn ask_request(document_id: &str, question: &str) -> Request<Body> {
        let payload = serde_json::json!({ "document_id": document_id, "question": question });
        Request::builder()
            .method("POST")
            .uri("/api/ask")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("valid ask request")
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_and_root_respond() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = test_router(dir.path(), AnsweringEngine::default(), 1024).await;

        let health = Request::get("/api/health").body(Body::empty()).expect("request");
        let (status, body) = send(&router, health).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["documents"], 0);

        let root = Request::get("/api/").body(Body::empty()).expect("request");
        let (status, body) = send(&router, root).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["endpoints"]["upload"], "/api/upload");
        assert_eq!(body["endpoints"]["ask"], "/api/ask");
    }

    #[tokio::test]
    async fn upload_then_ask() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = test_router(dir.path(), AnsweringEngine::default(), 1024).await;

        let (status, uploaded) = send(
            &router,
            upload_request("atlas.pdf", b"Paris is the capital. Lyon is a city."),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(uploaded["filename"], "atlas.pdf");
        assert_eq!(uploaded["page_count"], 1);
        assert_eq!(uploaded["text_length"], 38);
        assert_eq!(uploaded["message"], "PDF uploaded and processed successfully");

        let document_id = uploaded["document_id"].as_str().expect("document id").to_string();
        let (status, answered) = send(&router, ask_request(&document_id, "What is the capital?")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(answered["question"], "What is the capital?");
        assert_eq!(answered["document_id"], document_id.as_str());
        assert_eq!(
            answered["answer"],
            "Based on the document: Paris is the capital. (Note: This is a stub response. Integrate an LLM for better answers.)"
        );
        assert_eq!(answered["context_used"], "Paris is the capital. Lyon is a city.\n");
    }

    #[tokio::test]
    async fn upload_rejects_non_pdf_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = test_router(dir.path(), AnsweringEngine::default(), 1024).await;

        let (status, body) = send(&router, upload_request("notes.txt", b"plain text")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Only PDF files are supported");
    }

    #[tokio::test]
    async fn upload_rejects_oversized_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = test_router(dir.path(), AnsweringEngine::default(), 16).await;

        let (status, body) = send(&router, upload_request("big.pdf", &[b'a'; 32])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "File size exceeds maximum allowed size of 16 bytes");
        assert_eq!(std::fs::read_dir(dir.path()).expect("dir").count(), 0);
    }

    #[tokio::test]
    async fn upload_hides_processing_cause() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = test_router(dir.path(), AnsweringEngine::default(), 1024).await;

        let (status, body) = send(&router, upload_request("broken.pdf", b"corrupt bytes")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Error processing PDF");
    }

    #[tokio::test]
    async fn ask_unknown_document_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = test_router(dir.path(), AnsweringEngine::default(), 1024).await;

        let (status, body) = send(&router, ask_request("nope", "What is here?")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Document with ID nope not found");
    }

    #[tokio::test]
    async fn ask_rejects_blank_question() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = test_router(dir.path(), AnsweringEngine::default(), 1024).await;

        let (status, _) = send(&router, ask_request("nope", "")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ask_with_missing_field_reports_detail() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = test_router(dir.path(), AnsweringEngine::default(), 1024).await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/ask")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"document_id":"x"}"#))
            .expect("valid ask request");

        let (status, body) = send(&router, request).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(
            body["detail"].as_str().is_some_and(|detail| detail.contains("question")),
            "unexpected body: {body}"
        );
    }

    #[tokio::test]
    async fn upload_without_multipart_reports_detail() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = test_router(dir.path(), AnsweringEngine::default(), 1024).await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .expect("valid upload request");

        let (status, body) = send(&router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string(), "unexpected body: {body}");
    }

    #[tokio::test]
    async fn backend_failure_is_service_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = AnsweringEngine::new(Arc::new(OfflineStrategy));
        let router = test_router(dir.path(), engine, 1024).await;

        let (_, uploaded) = send(&router, upload_request("doc.pdf", b"Some text.")).await;
        let document_id = uploaded["document_id"].as_str().expect("document id").to_string();
        let (status, body) = send(&router, ask_request(&document_id, "What text?")).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["detail"], "Answering backend unavailable");
    }
}
