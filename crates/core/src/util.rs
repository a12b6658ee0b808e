use crate::error::{IndexError, Result};
use std::path::{Path, PathBuf};
use url::Url;

/// `file://` URI for an absolute path.
pub fn path_to_uri(path: &Path) -> Result<String> {
    Url::from_file_path(path)
        .map(String::from)
        .map_err(|()| IndexError::InvalidPath(path.to_path_buf()))
}

/// Filesystem path behind a `file://` URI. Other schemes yield `None`.
pub fn uri_to_path(uri: &str) -> Option<PathBuf> {
    Url::parse(uri).ok().and_then(|u| u.to_file_path().ok())
}
