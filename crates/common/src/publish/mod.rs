//! # Publish pipeline
//!
//! Turns a directory tree into a published web app in three steps:
//!
//! 1. **Upload**: walk the tree and stream every regular file to the
//!    storage backend, at most [`Publisher::parallelism`] uploads in
//!    flight at once. The first failure aborts the run.
//! 2. **Assemble**: sort the upload records by relative path and build the
//!    deterministic [`WebAppMetadata`] manifest.
//! 3. **Publish**: upload the DAG-CBOR encoded manifest as one object and
//!    re-tag its identifier as web app metadata. That identifier is the
//!    published handle for the whole app.

mod uploader;
pub mod walker;

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::stream::{self, StreamExt};

use crate::linked_data::{BlockEncoded, Cid, CidKind, CodecError};
use crate::metadata::{
    content_type_for_path, MetadataError, PathContent, WebAppMetadata,
};
use crate::storage::{ObjectStore, StorageError};

pub use uploader::UploadedFile;

/// Default ceiling on concurrent uploads
pub const PARALLEL_UPLOADS_DEFAULT: usize = 10;

/// Errors that can occur while publishing a directory
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("filesystem error: {0}")]
    Filesystem(#[from] walkdir::Error),
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("file escapes the publish root: {0}")]
    OutsideRoot(PathBuf),
    #[error("failed to upload {path}: {source}")]
    Upload { path: String, source: StorageError },
    #[error("failed to publish manifest: {0}")]
    Manifest(StorageError),
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// App-level knobs recorded in the manifest.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Optional display name.
    pub name: Option<String>,
    /// Status code to page mappings, e.g. `("404", "/404.html")`.
    pub error_pages: Vec<(String, String)>,
}

/// Outcome of a successful publish.
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// The published identifier, tagged as web app metadata.
    pub manifest_cid: Cid,
    /// The manifest as published.
    pub manifest: WebAppMetadata,
    /// Every file uploaded in this run, in manifest (path) order.
    pub files: Vec<UploadedFile>,
}

/// Publishes directory trees through an [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct Publisher<S> {
    store: S,
    parallelism: usize,
}

impl<S: ObjectStore> Publisher<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            parallelism: PARALLEL_UPLOADS_DEFAULT,
        }
    }

    /// Set the ceiling on concurrent uploads. Clamped to at least one.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the full pipeline: upload the tree, assemble the manifest,
    /// publish it.
    pub async fn publish(
        &self,
        root: &Path,
        options: &PublishOptions,
    ) -> Result<PublishReport, PublishError> {
        let mut files = self.upload_dir(root).await?;
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let manifest = build_manifest(&files, options)?;
        let manifest_cid = self.publish_manifest(&manifest).await?;

        tracing::info!(
            "published {} paths as {}",
            manifest.paths().len(),
            manifest_cid
        );
        Ok(PublishReport {
            manifest_cid,
            manifest,
            files,
        })
    }

    /// Upload every regular file under `root` with bounded parallelism.
    ///
    /// Completion order is unspecified; the returned records are unsorted.
    /// The first failure aborts the run: pending uploads are not started,
    /// in-flight ones are dropped and their results discarded.
    pub async fn upload_dir(&self, root: &Path) -> Result<Vec<UploadedFile>, PublishError> {
        if !root.is_dir() {
            return Err(PublishError::NotADirectory(root.to_path_buf()));
        }

        // Materialize the listing up front: a directory we cannot read
        // fails the run before the first byte is uploaded.
        let paths = walker::files(root).collect::<Result<Vec<_>, _>>()?;
        tracing::info!(
            "uploading {} files from {} ({} in flight)",
            paths.len(),
            root.display(),
            self.parallelism
        );

        let futures = paths
            .iter()
            .map(|path| uploader::upload_file(&self.store, root, path))
            .collect::<Vec<_>>();
        let mut uploads = stream::iter(futures).buffer_unordered(self.parallelism);

        let mut uploaded = Vec::with_capacity(paths.len());
        while let Some(result) = uploads.next().await {
            // Dropping the stream on error cancels whatever is in flight.
            uploaded.push(result?);
        }
        Ok(uploaded)
    }

    /// Serialize and upload a manifest, returning its identifier re-tagged
    /// as web app metadata.
    pub async fn publish_manifest(
        &self,
        manifest: &WebAppMetadata,
    ) -> Result<Cid, PublishError> {
        let encoded = manifest.encode()?;
        let cid = self
            .store
            .put(Bytes::from(encoded))
            .await
            .map_err(PublishError::Manifest)?;
        Ok(cid.with_kind(CidKind::MetadataWebApp))
    }
}

/// Assemble the manifest from upload records. Pure: no network or
/// filesystem access; identical inputs produce identical manifests.
pub fn build_manifest(
    files: &[UploadedFile],
    options: &PublishOptions,
) -> Result<WebAppMetadata, PublishError> {
    let mut metadata = WebAppMetadata::new();
    if let Some(name) = &options.name {
        metadata.set_name(name.clone());
    }
    for (code, page) in &options.error_pages {
        metadata.set_error_page(code.clone(), page.clone())?;
    }
    for file in files {
        let content_type = content_type_for_path(Path::new(&file.path));
        metadata.insert_path(
            file.path.clone(),
            PathContent::new(file.cid, content_type, file.size),
        )?;
    }
    Ok(metadata)
}
