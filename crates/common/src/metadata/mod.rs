//! # Web app manifest
//!
//! The manifest is the root metadata structure for a published directory.
//! It contains:
//!
//! - **Routing hints**: ordered fallback paths (`tryFiles`) and optional
//!   per-status error pages
//! - **Content**: a map from relative file paths to their content
//!   identifier, MIME type, and size
//!
//! # Serialization
//!
//! Manifests are serialized using DAG-CBOR and uploaded as a single
//! content-addressed object; the manifest's own identifier (re-tagged as
//! [`CidKind::MetadataWebApp`](crate::linked_data::CidKind)) is what gets
//! handed to operators and published to the registry. `paths` and
//! `errorPages` are `BTreeMap`s, so the same content always serializes to
//! the same bytes.

mod content_type;

use std::collections::BTreeMap;

use ipld_core::ipld::Ipld;
use serde::{Deserialize, Serialize};

use crate::linked_data::{BlockEncoded, Cid};

pub use content_type::content_type_for_path;

/// Fixed type tag carried by every web app manifest
pub const WEB_APP_TYPE: &str = "web_app";

/// Default fallback chain served when a requested path is absent
pub const TRY_FILES_DEFAULT: &[&str] = &["index.html"];

/// Maximum length of a path key in bytes
pub const MAX_PATH_LENGTH: usize = 255;

/// Errors that can occur while assembling a manifest
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("path exceeds {MAX_PATH_LENGTH} bytes: {0}")]
    PathTooLong(String),
    #[error("duplicate path: {0}")]
    DuplicatePath(String),
    #[error("invalid error page status code: {0}")]
    InvalidStatusCode(String),
}

/// Per-path entry in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathContent {
    cid: Cid,
    content_type: String,
    size: u64,
}

impl PathContent {
    pub fn new(cid: Cid, content_type: String, size: u64) -> Self {
        Self {
            cid,
            content_type,
            size,
        }
    }

    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// The root metadata structure for a published web app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAppMetadata {
    /// Fixed type tag, always [`WEB_APP_TYPE`].
    #[serde(rename = "type")]
    kind: String,
    /// Optional human-readable name for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    /// Ordered fallback paths tried when a request misses.
    try_files: Vec<String>,
    /// Map of 3-digit status codes to the page served for them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_pages: Option<BTreeMap<String, String>>,
    /// Map of relative file paths to their content.
    paths: BTreeMap<String, PathContent>,
    /// Opaque application-defined metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extra_metadata: Option<Ipld>,
}

impl BlockEncoded for WebAppMetadata {}

impl Default for WebAppMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl WebAppMetadata {
    /// Create an empty manifest with the default fallback chain.
    pub fn new() -> Self {
        Self {
            kind: WEB_APP_TYPE.to_string(),
            name: None,
            try_files: TRY_FILES_DEFAULT.iter().map(|s| s.to_string()).collect(),
            error_pages: None,
            paths: BTreeMap::new(),
            extra_metadata: None,
        }
    }

    /// Insert a path entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the path key exceeds [`MAX_PATH_LENGTH`] bytes
    /// or is already present.
    pub fn insert_path(&mut self, path: String, content: PathContent) -> Result<(), MetadataError> {
        if path.len() > MAX_PATH_LENGTH {
            return Err(MetadataError::PathTooLong(path));
        }
        if self.paths.contains_key(&path) {
            return Err(MetadataError::DuplicatePath(path));
        }
        self.paths.insert(path, content);
        Ok(())
    }

    /// Set an error page mapping.
    ///
    /// # Errors
    ///
    /// Returns an error unless `code` is exactly three ASCII digits.
    pub fn set_error_page(&mut self, code: String, path: String) -> Result<(), MetadataError> {
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MetadataError::InvalidStatusCode(code));
        }
        self.error_pages
            .get_or_insert_with(BTreeMap::new)
            .insert(code, path);
        Ok(())
    }

    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub fn set_extra_metadata(&mut self, value: Ipld) {
        self.extra_metadata = Some(value);
    }

    /// Get the fixed type tag.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn try_files(&self) -> &[String] {
        &self.try_files
    }

    pub fn error_pages(&self) -> Option<&BTreeMap<String, String>> {
        self.error_pages.as_ref()
    }

    pub fn paths(&self) -> &BTreeMap<String, PathContent> {
        &self.paths
    }
}
