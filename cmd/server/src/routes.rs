//! HTTP routes and error mapping.
//!
//! API endpoints:
//! - POST /predict      - multipart upload, field "audio"
//! - POST /predict-live - same pipeline for live-captured audio
//! - GET  /healthz      - model info
//!
//! Success body: {"result": "Truth"|"Lie", "truth_probability": p,
//! "lie_probability": q}. Every failure body: {"error": msg} with no
//! prediction fields.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use uuid::Uuid;

use candor_detect::DetectError;

use crate::AppState;

type SharedState = Arc<AppState>;

/// Maximum accepted upload body.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/predict-live", post(predict_live))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// A failure response: HTTP status plus an error body.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<DetectError> for ApiError {
    fn from(e: DetectError) -> Self {
        match e {
            // Undecodable/empty uploads are the client's problem.
            DetectError::Decode(_) => ApiError::bad_request(e.to_string()),
            DetectError::Schema(_) | DetectError::Inference(_) => {
                ApiError::internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({"error": self.message}))).into_response()
    }
}

async fn healthz(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "model": state.model_path.display().to_string(),
        "features": state.detector.schema().len(),
    }))
}

async fn predict(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    handle_upload(state, multipart, false).await
}

async fn predict_live(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    handle_upload(state, multipart, true).await
}

async fn handle_upload(
    state: SharedState,
    mut multipart: Multipart,
    live: bool,
) -> Result<Response, ApiError> {
    let (filename, data) = read_audio_field(&mut multipart).await?;
    if data.is_empty() {
        return Err(ApiError::bad_request("empty file"));
    }

    // Per-request unique name: concurrent uploads never collide.
    let ext = Path::new(&filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("wav");
    let name = if live {
        format!("live_{}.{ext}", Uuid::new_v4())
    } else {
        format!("{}.{ext}", Uuid::new_v4())
    };
    let path = state.uploads_dir.join(name);

    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| ApiError::internal(format!("saving upload: {e}")))?;
    info!(upload = %path.display(), bytes = data.len(), live, "upload saved");

    // The pipeline is CPU-bound and synchronous; keep it off the runtime.
    let worker_state = state.clone();
    let worker_path = path.clone();
    let verdict = tokio::task::spawn_blocking(move || {
        let aligned = worker_state.detector.extract_and_align(&worker_path)?;
        worker_state.detector.infer(&aligned)
    })
    .await
    .map_err(|e| {
        error!("prediction task panicked: {e}");
        ApiError::internal("prediction task failed")
    })??;

    info!(upload = %path.display(), result = %verdict.label, "classified");
    Ok(Json(verdict).into_response())
}

/// Pulls the "audio" multipart field.
async fn read_audio_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(ApiError::bad_request("empty file"));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("reading upload: {e}")))?;
        return Ok((filename, data.to_vec()));
    }
    Err(ApiError::bad_request("no audio file uploaded"))
}
