//! Flat file store.
//!
//! [`FileStore`] maps the seven store operations onto a single storage root:
//! - Name validation before any storage access
//! - Create-or-replace and append writes
//! - Copy and atomic move between two names
//!
//! The store itself is synchronous; callers on an async runtime run it on the
//! blocking thread pool.

mod backend;
mod name;
pub mod routes;

use std::io;
use std::path::{Path, PathBuf};

pub use backend::{LocalDirectory, StorageBackend};
pub use name::{FileName, MAX_NAME_LENGTH, RESERVED_NAMES};
pub use routes::{Operation, Route, Verb, ROUTES};

use crate::{Result, StoreError};

/// File store bound to one storage backend.
#[derive(Debug, Clone)]
pub struct FileStore<B = LocalDirectory> {
    backend: B,
}

impl FileStore<LocalDirectory> {
    /// Open a store on a local directory, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let backend = LocalDirectory::open(root).map_err(StoreError::StorageUnavailable)?;
        Ok(Self { backend })
    }

    /// Absolute path of the storage root.
    pub fn root(&self) -> &Path {
        self.backend.root()
    }
}

impl<B: StorageBackend> FileStore<B> {
    /// Create a store over an arbitrary backend.
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Names of all stored files.
    pub fn list(&self) -> Result<Vec<String>> {
        self.backend.list().map_err(StoreError::StorageUnavailable)
    }

    /// Full content of a file.
    pub fn get(&self, name: &str) -> Result<Vec<u8>> {
        let name = parse_name(name)?;
        self.backend
            .read(&name)
            .map_err(|e| lookup_error(e, || format!("File {name}")))
    }

    /// Create a file or replace its content.
    pub fn put(&self, name: &str, content: &[u8]) -> Result<()> {
        let name = parse_name(name)?;
        self.backend
            .write(&name, content)
            .map_err(|e| write_error(e, &name))?;
        tracing::info!(name = %name, bytes = content.len(), "File stored");
        Ok(())
    }

    /// Append to a file, creating it if absent.
    pub fn append(&self, name: &str, content: &[u8]) -> Result<()> {
        let name = parse_name(name)?;
        self.backend
            .append(&name, content)
            .map_err(|e| write_error(e, &name))?;
        tracing::info!(name = %name, bytes = content.len(), "Data appended");
        Ok(())
    }

    /// Remove a file.
    pub fn delete(&self, name: &str) -> Result<()> {
        let name = parse_name(name)?;
        self.backend
            .remove(&name)
            .map_err(|e| lookup_error(e, || format!("File {name}")))?;
        tracing::info!(name = %name, "File deleted");
        Ok(())
    }

    /// Replace `destination` with the content of `source`.
    ///
    /// An empty source or destination is a missing parameter.
    pub fn copy(&self, source: &str, destination: &str) -> Result<()> {
        let (source, destination) = parse_transfer(source, destination)?;
        self.backend
            .copy(&source, &destination)
            .map_err(|e| lookup_error(e, || format!("Source file {source}")))?;
        tracing::info!(source = %source, destination = %destination, "File copied");
        Ok(())
    }

    /// Rename `source` to `destination`, replacing any existing destination.
    ///
    /// An empty source or destination is a missing parameter.
    pub fn rename(&self, source: &str, destination: &str) -> Result<()> {
        let (source, destination) = parse_transfer(source, destination)?;
        self.backend
            .rename(&source, &destination)
            .map_err(|e| lookup_error(e, || format!("Source file {source}")))?;
        tracing::info!(source = %source, destination = %destination, "File moved");
        Ok(())
    }
}

fn parse_name(raw: &str) -> Result<FileName> {
    FileName::parse(raw).inspect_err(|e| {
        tracing::warn!(name = raw, "Rejected file name: {}", e);
    })
}

fn parse_transfer(source: &str, destination: &str) -> Result<(FileName, FileName)> {
    if source.is_empty() || destination.is_empty() {
        return Err(StoreError::MissingParameter);
    }
    Ok((parse_name(source)?, parse_name(destination)?))
}

/// Map a backend error for an operation whose target must exist.
fn lookup_error(e: io::Error, subject: impl FnOnce() -> String) -> StoreError {
    match e.kind() {
        io::ErrorKind::NotFound => StoreError::NotFound(subject()),
        io::ErrorKind::InvalidInput => not_regular(e),
        _ => {
            tracing::error!(error = %e, "Storage operation failed");
            StoreError::StorageUnavailable(e)
        }
    }
}

/// Map a backend error for an operation that creates its target.
fn write_error(e: io::Error, name: &FileName) -> StoreError {
    match e.kind() {
        io::ErrorKind::InvalidInput => not_regular(e),
        _ => {
            tracing::error!(name = %name, error = %e, "Storage write failed");
            StoreError::StorageUnavailable(e)
        }
    }
}

/// A target that exists but is not a regular file.
fn not_regular(e: io::Error) -> StoreError {
    tracing::warn!(error = %e, "Refused to replace a non-regular entry");
    StoreError::InvalidName(e.to_string())
}
