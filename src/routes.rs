use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::any::Any as PanicPayload;
use thiserror::Error;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    models::{EnhancementRequest, EnhancementResult, ErrorBody},
    openai::preview,
    orchestrator::{EnhanceError, Orchestrator},
};

pub const MAX_BODY_BYTES: usize = 15 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
}

/// Everything `POST /generate` can answer with besides a success body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing imageUrl")]
    MissingImageUrl,
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("request body too large")]
    PayloadTooLarge,
    #[error("malformed JSON body: {0}")]
    MalformedBody(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EnhanceError> for ApiError {
    fn from(err: EnhanceError) -> Self {
        match err {
            EnhanceError::MissingImageUrl => Self::MissingImageUrl,
            EnhanceError::Rejected { reason } => Self::InvalidImage(reason),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::MissingImageUrl => (StatusCode::BAD_REQUEST, ErrorBody::new("Missing imageUrl in body.")),
            Self::InvalidImage(reason) => (StatusCode::BAD_REQUEST, ErrorBody::with_detail("Invalid image", reason)),
            Self::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, ErrorBody::new("Request body too large.")),
            Self::MalformedBody(_) => (StatusCode::BAD_REQUEST, ErrorBody::new("Malformed JSON body.")),
            Self::Internal(detail) => {
                error!("💥 Error in /generate: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new("Internal AI server error."))
            }
        };
        (status, Json(body)).into_response()
    }
}

fn handle_panic(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    ApiError::Internal(format!("panic: {detail}")).into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

// A non-JSON content type, an empty body or a non-object JSON value reads as `{}`,
// the same as a body without imageUrl.
fn read_body(headers: &HeaderMap, body: Result<Bytes, BytesRejection>) -> Result<EnhancementRequest, ApiError> {
    let bytes = match body {
        Ok(bytes) => bytes,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => return Err(ApiError::PayloadTooLarge),
        Err(rejection) => return Err(ApiError::MalformedBody(rejection.body_text())),
    };
    if !is_json(headers) || bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(EnhancementRequest::default());
    }
    match serde_json::from_slice::<Value>(&bytes).map_err(|e| ApiError::MalformedBody(e.to_string()))? {
        value @ Value::Object(_) => {
            EnhancementRequest::deserialize(value).map_err(|e| ApiError::MalformedBody(e.to_string()))
        }
        _ => Ok(EnhancementRequest::default()),
    }
}

pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<EnhancementResult>, ApiError> {
    let request_id = Uuid::new_v4();
    async move {
        let request = read_body(&headers, body).inspect_err(|e| warn!("⚠️ Rejected request body: {}", e))?;
        info!("🚀 Enhancement requested for image: {}", request.image_url.as_deref().map(preview).unwrap_or_default());
        let result = state.orchestrator.enhance(request).await?;
        info!("✅ Enhancement finished");
        Ok::<_, ApiError>(Json(result))
    }
    .instrument(info_span!("generate", %request_id))
    .await
}
