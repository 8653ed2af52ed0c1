//! API handlers.

pub mod file;

use std::sync::Arc;

use crate::store::FileStore;

pub use file::*;

/// Shared file store.
pub type SharedStore = Arc<FileStore>;

/// Application state shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The file store behind every route.
    pub store: SharedStore,
}

impl AppState {
    /// Create a new application state.
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}
