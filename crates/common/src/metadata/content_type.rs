use std::path::Path;

/// Infer the MIME type for a file from its extension.
///
/// Unknown or missing extensions fall back to `application/octet-stream`.
pub fn content_type_for_path(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
        .to_string()
}
