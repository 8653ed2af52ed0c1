//! File handlers for Web API.

use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, Path, Query, State},
    http::header,
    response::Response,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::store::FileStore;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Query parameters for copy and move.
///
/// Both are optional at the extractor level so a missing parameter is
/// reported by the store as such instead of as a query parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct TransferQuery {
    pub source: Option<String>,
    pub destination: Option<String>,
}

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters, double quotes and backslashes are replaced in the
/// ASCII fallback; the RFC 5987 `filename*` parameter carries the exact name.
fn content_disposition_header(filename: &str) -> String {
    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            _ => c,
        })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// Run a store operation on the blocking thread pool.
async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&FileStore) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| {
            tracing::error!("Storage task failed: {}", e);
            ApiError::internal("Storage unavailable")
        })?
        .map_err(ApiError::from)
}

/// GET /api/files - List stored file names.
pub async fn list_files(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    let names = run_blocking(&state, |store| store.list()).await?;
    Ok(Json(names))
}

/// GET /api/files/:name - Download a file.
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let content = {
        let name = name.clone();
        run_blocking(&state, move |store| store.get(&name)).await?
    };

    Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&name),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// PUT /api/files/:name - Create or replace a file with the request body.
pub async fn put_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<String, ApiError> {
    let body = body?;
    let message = format!("File {name} created/updated");
    run_blocking(&state, move |store| store.put(&name, &body)).await?;
    Ok(message)
}

/// POST /api/files/:name - Append the request body to a file.
pub async fn append_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<String, ApiError> {
    let body = body?;
    let message = format!("Data appended to {name}");
    run_blocking(&state, move |store| store.append(&name, &body)).await?;
    Ok(message)
}

/// DELETE /api/files/:name - Delete a file.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<String, ApiError> {
    let message = format!("File {name} deleted");
    run_blocking(&state, move |store| store.delete(&name)).await?;
    Ok(message)
}

/// POST /api/files/copy?source=&destination= - Copy a file.
pub async fn copy_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TransferQuery>,
) -> Result<String, ApiError> {
    let source = query.source.unwrap_or_default();
    let destination = query.destination.unwrap_or_default();
    let message = format!("File {source} copied to {destination}");
    run_blocking(&state, move |store| store.copy(&source, &destination)).await?;
    Ok(message)
}

/// POST /api/files/move?source=&destination= - Move a file.
pub async fn move_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TransferQuery>,
) -> Result<String, ApiError> {
    let source = query.source.unwrap_or_default();
    let destination = query.destination.unwrap_or_default();
    let message = format!("File {source} moved to {destination}");
    run_blocking(&state, move |store| store.rename(&source, &destination)).await?;
    Ok(message)
}
