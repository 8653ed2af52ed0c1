//! Router configuration for Web API.
//!
//! The file routes are generated from [`ROUTES`], so the route table in the
//! store module stays the single definition of the wire contract.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, on, MethodFilter, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    append_file, copy_file, delete_file, get_file, list_files, move_file, put_file, AppState,
};
use super::middleware::{create_cors_layer, security_headers};
use crate::store::{routes::NAME_PARAM, Operation, Route, Verb, ROUTES};

/// Prefix under which the file routes are mounted.
pub const API_PREFIX: &str = "/api";

fn method_filter(verb: Verb) -> MethodFilter {
    match verb {
        Verb::Get => MethodFilter::GET,
        Verb::Put => MethodFilter::PUT,
        Verb::Post => MethodFilter::POST,
        Verb::Delete => MethodFilter::DELETE,
    }
}

/// Route pattern in axum's capture syntax.
fn axum_path(route: &Route) -> String {
    route.path.replace(NAME_PARAM, ":name")
}

fn method_router(route: &Route) -> MethodRouter<Arc<AppState>> {
    let filter = method_filter(route.verb);
    match route.operation {
        Operation::List => on(filter, list_files),
        Operation::Get => on(filter, get_file),
        Operation::Put => on(filter, put_file),
        Operation::Append => on(filter, append_file),
        Operation::Delete => on(filter, delete_file),
        Operation::Copy => on(filter, copy_file),
        Operation::Move => on(filter, move_file),
    }
}

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    cors_origins: &[String],
    max_upload_bytes: usize,
) -> Router {
    // Routes sharing a path are merged into one method router by axum
    let file_routes = ROUTES.iter().fold(Router::new(), |router, route| {
        router.route(&axum_path(route), method_router(route))
    });

    Router::new()
        .nest(API_PREFIX, file_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers))
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
