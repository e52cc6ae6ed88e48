//! HTTP surface: the static landing page and the single relay endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{error, info};

use crate::backend::ImageBackend;
use crate::normalize;
use crate::types::{GenerateRequest, GenerateResponse, ImageRef};
use crate::{PictorError, Result};

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared handler state. The backend is injected at startup and stays
/// read-only afterwards; `None` means initialization failed and every
/// generation request is refused up front.
#[derive(Clone, Default)]
pub struct RelayState {
    backend: Option<Arc<dyn ImageBackend>>,
}

impl RelayState {
    pub fn new(backend: impl ImageBackend + 'static) -> Self {
        Self {
            backend: Some(Arc::new(backend)),
        }
    }

    pub fn empty() -> Self {
        Self { backend: None }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/generate", post(handle_generate))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn handle_generate(
    State(state): State<RelayState>,
    Json(payload): Json<GenerateRequest>,
) -> std::result::Result<Json<GenerateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(backend) = state.backend.as_ref() else {
        return Err(error_response(&PictorError::BackendNotInitialized));
    };

    if payload.prompt.is_empty() {
        return Err(error_response(&PictorError::NoPrompt));
    }

    info!(space = backend.space_id(), prompt = %payload.prompt, "generating image");

    let image = generate(backend.as_ref(), &payload.prompt)
        .await
        .map_err(|err| {
            error!(error = %err, "generation failed");
            error_response(&err)
        })?;

    Ok(Json(GenerateResponse {
        image_url: image.into_image_url(),
    }))
}

async fn generate(backend: &dyn ImageBackend, prompt: &str) -> Result<ImageRef> {
    let handle = backend.infer(prompt).await?;
    normalize::resolve(handle).await
}

fn error_response(err: &PictorError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        PictorError::NoPrompt => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
