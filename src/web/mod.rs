//! Web API module.
//!
//! This module exposes the file store over HTTP. The route table lives in
//! [`crate::store::routes`]; this module binds it to axum handlers.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::{create_health_router, create_router, API_PREFIX};
pub use server::WebServer;
