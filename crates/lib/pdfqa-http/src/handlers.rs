use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Multipart, State};
use pdfqa_core::control::{AskReport, AskRequest, DocumentIngestRequest};
use pdfqa_store::models::DocumentSummary;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::AppState;
use crate::error::ApiError;

const UPLOAD_FIELD: &str = "file";
const ALLOWED_EXTENSION: &str = ".pdf";

/// Response body for a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub document_id: String,
    pub filename: String,
    pub page_count: usize,
    pub text_length: usize,
    pub message: String,
}

impl From<DocumentSummary> for UploadResponse {
    fn from(summary: DocumentSummary) -> Self {
        Self {
            document_id: summary.document_id,
            filename: summary.filename,
            page_count: summary.page_count,
            text_length: summary.text_length,
            message: "PDF uploaded and processed successfully".to_string(),
        }
    }
}

/// Response body for an answered question.
pub type QuestionResponse = AskReport;

pub(crate) async fn root() -> Json<Value> {
    Json(json!({
        "message": "AI-Driven PDF Question Answering API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "/api/upload",
            "ask": "/api/ask",
        },
    }))
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<Value> {
    let documents = state.control.store().len().await;
    Json(json!({ "status": "healthy", "documents": documents }))
}

pub(crate) async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string).unwrap_or_default();
        let content = field.bytes().await?;
        upload = Some((filename, content));
        break;
    }

    let Some((filename, content)) = upload else {
        return Err(ApiError::bad_request("file field is required"));
    };
    if !filename.ends_with(ALLOWED_EXTENSION) {
        return Err(ApiError::bad_request("Only PDF files are supported"));
    }
    if content.len() > state.max_upload_bytes {
        return Err(ApiError::bad_request(format!(
            "File size exceeds maximum allowed size of {} bytes",
            state.max_upload_bytes
        )));
    }

    let summary = tokio::time::timeout(
        state.request_timeout,
        state.control.ingest_document(DocumentIngestRequest {
            filename,
            content: content.to_vec(),
        }),
    )
    .await
    .map_err(|_| ApiError::timeout())??;

    Ok(Json(UploadResponse::from(summary)))
}

pub(crate) async fn ask(
    State(state): State<AppState>,
    request: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let Json(request) = request?;
    let report = tokio::time::timeout(state.request_timeout, state.control.ask(request))
        .await
        .map_err(|_| ApiError::timeout())??;

    Ok(Json(report))
}
