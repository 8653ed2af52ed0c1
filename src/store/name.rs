//! Validated file names.
//!
//! A [`FileName`] can only be built through [`FileName::parse`], and every
//! [`StorageBackend`](super::StorageBackend) method takes `&FileName`. A name
//! that fails validation therefore never reaches storage.

use std::fmt;

use crate::{Result, StoreError};

/// Maximum length of a file name in bytes.
pub const MAX_NAME_LENGTH: usize = 255;

/// Names claimed by the copy/move routes.
pub const RESERVED_NAMES: &[&str] = &["copy", "move"];

/// A name that resolves to a direct child of the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileName(String);

impl FileName {
    /// Validate a caller-supplied name.
    ///
    /// Characters are constrained rather than transformed: the on-disk name is
    /// always exactly the requested name.
    pub fn parse(raw: &str) -> Result<Self> {
        match check(raw) {
            Ok(()) => Ok(Self(raw.to_string())),
            Err(reason) => Err(StoreError::InvalidName(reason.to_string())),
        }
    }

    /// The name as stored on disk.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn check(raw: &str) -> std::result::Result<(), &'static str> {
    if raw.trim().is_empty() {
        return Err("name must not be empty");
    }
    if raw.len() > MAX_NAME_LENGTH {
        return Err("name is too long");
    }
    if raw.contains("..") {
        return Err("name must not contain '..'");
    }
    if raw.starts_with('.') {
        return Err("name must not start with '.'");
    }
    if raw.chars().any(|c| matches!(c, '/' | '\\' | ':')) {
        return Err("name must not contain path separators or drive prefixes");
    }
    if raw.chars().any(char::is_control) {
        return Err("name must not contain control characters");
    }
    if RESERVED_NAMES.contains(&raw) {
        return Err("name is reserved");
    }
    Ok(())
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
