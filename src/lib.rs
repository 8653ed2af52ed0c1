//! FileStore - flat file storage over HTTP.
//!
//! A single storage directory exposed through list, fetch, upload, append,
//! delete, copy and move operations.

pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod web;

pub use config::Config;
pub use error::{Result, StoreError};
pub use store::{FileName, FileStore, LocalDirectory, Operation, StorageBackend, Verb, ROUTES};
pub use web::WebServer;
