//! Admin HTTP API
//!
//! Thin axum surface over the pipeline server:
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/pipelines` | List loaded pipelines |
//! | GET | `/pipelines/{id}` | One pipeline's summary |
//! | POST | `/pipelines/{id}/start` | Build and start |
//! | POST | `/pipelines/{id}/stop` | Cancel and drain |
//!
//! State conflicts map to 409, unknown ids to 404, build failures
//! to 422.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::error;

use neptunus_pipeline::{PipelineServer, ServerError};

pub fn router(server: Arc<PipelineServer>) -> Router {
    Router::new()
        .route("/pipelines", get(list_pipelines))
        .route("/pipelines/{id}", get(get_pipeline))
        .route("/pipelines/{id}/start", post(start_pipeline))
        .route("/pipelines/{id}/stop", post(stop_pipeline))
        .with_state(server)
}

/// Serve the admin API until the daemon exits
pub async fn serve(address: String, server: Arc<PipelineServer>) {
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(address = %address, error = %err, "admin api bind failed");
            return;
        }
    };
    if let Err(err) = axum::serve(listener, router(server)).await {
        error!(error = %err, "admin api server failed");
    }
}

async fn list_pipelines(State(server): State<Arc<PipelineServer>>) -> Response {
    Json(server.list().await).into_response()
}

async fn get_pipeline(
    State(server): State<Arc<PipelineServer>>,
    Path(id): Path<String>,
) -> Response {
    match server.info(&id).await {
        Ok(info) => Json(info).into_response(),
        Err(err) => error_response(err),
    }
}

async fn start_pipeline(
    State(server): State<Arc<PipelineServer>>,
    Path(id): Path<String>,
) -> Response {
    match server.start(&id).await {
        Ok(()) => Json(json!({"status": "started"})).into_response(),
        Err(err) => error_response(err),
    }
}

async fn stop_pipeline(
    State(server): State<Arc<PipelineServer>>,
    Path(id): Path<String>,
) -> Response {
    match server.stop(&id).await {
        Ok(()) => Json(json!({"status": "stopped"})).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: ServerError) -> Response {
    let status = match &err {
        ServerError::UnknownPipeline { .. } => StatusCode::NOT_FOUND,
        ServerError::AlreadyRunning { .. } | ServerError::NotRunning { .. } => {
            StatusCode::CONFLICT
        }
        ServerError::DuplicatePipeline { .. } => StatusCode::CONFLICT,
        ServerError::Build(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(json!({"error": err.to_string()}))).into_response()
}
