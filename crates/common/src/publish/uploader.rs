use std::path::Path;

use tokio::fs::File;

use crate::linked_data::Cid;
use crate::storage::ObjectStore;

use super::{walker, PublishError};

/// Record of one successfully uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Identifier assigned by the storage backend.
    pub cid: Cid,
    /// Manifest key: relative, forward-slash path under the publish root.
    pub path: String,
    /// Byte length at upload time.
    pub size: u64,
}

/// Upload a single file: open it, stat it for its length, and stream it to
/// the backend. Backend errors surface verbatim, tagged with the path.
pub(super) async fn upload_file<S: ObjectStore>(
    store: &S,
    root: &Path,
    path: &Path,
) -> Result<UploadedFile, PublishError> {
    let relative = walker::relative_path(root, path)?;

    let file = File::open(path).await.map_err(|source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let size = file
        .metadata()
        .await
        .map_err(|source| PublishError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    tracing::debug!("uploading {} ({} bytes)", relative, size);
    let cid = store
        .put_file(file, size)
        .await
        .map_err(|source| PublishError::Upload {
            path: relative.clone(),
            source,
        })?;

    Ok(UploadedFile {
        cid,
        path: relative,
        size,
    })
}
