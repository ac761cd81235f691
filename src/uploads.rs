use metrics::counter;
use std::path::{Component, Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::forms::UploadedFile;

/// Writes dashboard uploads below the static directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    static_dir: PathBuf,
    upload_dir: PathBuf,
}

impl ImageStore {
    /// `upload_dir` is relative to `static_dir`.
    pub fn new(static_dir: impl Into<PathBuf>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            static_dir: static_dir.into(),
            upload_dir: upload_dir.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.static_dir, &config.upload_dir)
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    /// Stores `file` and returns its path relative to the static directory
    /// (`upload/shoe.png`), or `None` for an empty file part.
    #[instrument(skip(self, file), fields(file_name = %file.file_name))]
    pub async fn save(&self, file: &UploadedFile) -> Result<Option<String>, ServiceError> {
        let Some(name) = sanitize_file_name(&file.file_name) else {
            return Ok(None);
        };

        let dir = self.static_dir.join(&self.upload_dir);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), &file.bytes).await?;

        let relative = posix_path(&self.upload_dir.join(&name));
        counter!("catalog_uploads.stored", 1);
        info!(path = %relative, bytes = file.bytes.len(), "upload stored");
        Ok(Some(relative))
    }

    /// Deletes an upload by its static-relative path. Failures are only logged.
    pub async fn remove(&self, relative: &str) {
        let path = self.static_dir.join(relative);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!(path = %relative, "upload removed"),
            Err(e) => warn!(path = %relative, error = %e, "failed to remove upload"),
        }
    }
}

/// Final path component of a client-supplied file name.
fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

fn posix_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
