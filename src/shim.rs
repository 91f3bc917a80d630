//! Invocation shim (spec.md §6): the public entry point accepting
//! `{ database, query }` and returning `{ statusCode, body }` or
//! `{ statusCode, error }`. Exposed both as a pure function (`handle`) and
//! as an `axum` HTTP route, the way the teacher wires its query endpoints.

use crate::codec;
use crate::connector::{self, StorageOptions};
use crate::engine;
use crate::error::EngineError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::post;
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub database: String,
    pub query: String,
    #[serde(default)]
    pub storage_options: StorageOptions,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SelectResponse {
    Success {
        #[serde(rename = "statusCode")]
        status_code: u16,
        body: String,
    },
    Failure {
        #[serde(rename = "statusCode")]
        status_code: u16,
        error: String,
    },
}

impl SelectResponse {
    pub fn status_code(&self) -> u16 {
        match self {
            SelectResponse::Success { status_code, .. } => *status_code,
            SelectResponse::Failure { status_code, .. } => *status_code,
        }
    }
}

/// Runs one `{database, query}` request end to end, never panicking: every
/// failure mode is captured into a tagged `SelectResponse`.
pub fn handle(req: &SelectRequest) -> SelectResponse {
    match run(req) {
        Ok(body) => SelectResponse::Success { status_code: 200, body },
        Err(err) => {
            error!(target: "morganadb::shim", "query failed: {err}");
            SelectResponse::Failure { status_code: err.http_status(), error: err.to_string() }
        }
    }
}

fn run(req: &SelectRequest) -> Result<String, EngineError> {
    let conn = connector::connect(&req.database, req.storage_options.clone())?;
    let mut result = engine::select(conn.as_ref(), &req.query)?;
    info!(
        target: "morganadb::shim",
        "query resolved, read {} file(s)", result.files_read.len()
    );
    let bytes = codec::write_default(&mut result.data)?;
    Ok(BASE64.encode(bytes))
}

async fn select_handler(Json(req): Json<SelectRequest>) -> impl IntoResponse {
    let response = handle(&req);
    (StatusCode::from_u16(response.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), Json(response))
}

/// State is a placeholder today (connections are built per-request from the
/// request body), kept as a seam for a future connection-pool cache.
#[derive(Clone, Default)]
pub struct AppState;

pub fn router() -> Router {
    Router::new().route("/query", post(select_handler)).with_state(Arc::new(AppState))
}
