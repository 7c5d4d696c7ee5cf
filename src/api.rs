//! REST API server for the analytics agent backend
//!
//! Exposes the request orchestrator over HTTP for the frontend.
//! Every failure path answers with well-formed JSON carrying an `error`
//! field; nothing here returns an empty body or an HTML error page.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{AnalysisError, INTERNAL_MESSAGE};
use crate::models::{AnalysisRequest, AnalysisResult, ResultStatus};
use crate::orchestrator::RequestOrchestrator;
use crate::Result;

/// Upload cap for the multipart body.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// =============================
/// Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<RequestOrchestrator>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Backend API is running".to_string(),
    })
}

/// =============================
/// Analyze Endpoint
/// =============================

async fn analyze(State(state): State<ApiState>, multipart: Multipart) -> Response {
    let request = match parse_analyze_multipart(multipart).await {
        Ok(request) => request,
        Err(error) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: error.user_message(),
                }),
            )
                .into_response();
        }
    };

    info!(
        request_id = %request.request_id,
        filename = %request.filename,
        "Received analysis request"
    );

    let result = state.orchestrator.handle(request).await;
    response_for(result)
}

/// Pull the `file` upload and `question` text out of the form body.
async fn parse_analyze_multipart(mut multipart: Multipart) -> Result<AnalysisRequest> {
    let mut filename = String::new();
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut question: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AnalysisError::BadUpload(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AnalysisError::BadUpload(e.to_string()))?;
                file_bytes = Some(data.to_vec());
            }
            "question" => {
                question = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AnalysisError::BadUpload(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let file_bytes =
        file_bytes.ok_or_else(|| AnalysisError::MissingField("file".to_string()))?;
    let question = question.ok_or_else(|| AnalysisError::MissingField("question".to_string()))?;

    Ok(AnalysisRequest::new(filename, file_bytes, question))
}

/// Map a terminal result onto the HTTP contract.
fn response_for(result: AnalysisResult) -> Response {
    match result.status {
        ResultStatus::Success => (
            StatusCode::OK,
            Json(AnswerResponse {
                answer: result.answer.unwrap_or_default(),
            }),
        )
            .into_response(),
        ResultStatus::ClientError => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: result
                    .error_detail
                    .unwrap_or_else(|| INTERNAL_MESSAGE.to_string()),
            }),
        )
            .into_response(),
        ResultStatus::ProviderError | ResultStatus::InternalError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: result
                    .error_detail
                    .unwrap_or_else(|| INTERNAL_MESSAGE.to_string()),
            }),
        )
            .into_response(),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<RequestOrchestrator>) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/", get(health))
        .route("/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    orchestrator: Arc<RequestOrchestrator>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
