//! Document upload: store the file, queue ingestion, acknowledge immediately.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;
use ragqa_ingest::FileType;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/upload", post(upload))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub job_id: String,
}

/// POST /upload: multipart with one `.pdf` or `.txt` file.
async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let filename = match field.file_name() {
            Some(name) => sanitize_filename(name),
            None => continue,
        };

        let supported = Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(FileType::from_extension)
            .is_some();
        if !supported {
            return Err(ApiError::BadRequest(
                "Only PDF and TXT files are allowed".into(),
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let path = unique_upload_path(&state.config.data_paths.uploads, &filename);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ApiError::Core(e.into()))?;

        let stored_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&filename)
            .to_string();
        info!("Stored upload {} ({} bytes)", stored_name, bytes.len());

        let job_id = state.enqueue(stored_name.clone(), path.to_string_lossy().to_string())?;

        return Ok(Json(UploadResponse {
            message: "File uploaded successfully".into(),
            filename: stored_name,
            job_id,
        }));
    }

    Err(ApiError::BadRequest("No file uploaded".into()))
}

/// Avoid clobbering an earlier upload of the same name.
fn unique_upload_path(dir: &Path, filename: &str) -> PathBuf {
    let path = dir.join(filename);
    if !path.exists() {
        return path;
    }
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let ts = chrono::Utc::now().format("%Y%m%d%H%M%S%3f");
    dir.join(format!("{}_{}.{}", stem, ts, ext))
}

fn sanitize_filename(name: &str) -> String {
    let name = name.replace(['/', '\\'], "").replace("..", "");
    Path::new(&name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd.txt"), "etcpasswd.txt");
        assert_eq!(sanitize_filename("C:\\docs\\a.pdf"), "C:docsa.pdf");
        assert_eq!(sanitize_filename("notes.txt"), "notes.txt");
    }

    #[test]
    fn test_unique_upload_path_renames_existing() {
        let dir = TempDir::new().unwrap();
        let first = unique_upload_path(dir.path(), "a.txt");
        assert_eq!(first, dir.path().join("a.txt"));

        std::fs::write(&first, "x").unwrap();
        let second = unique_upload_path(dir.path(), "a.txt");
        assert_ne!(second, first);
        assert_eq!(second.extension().unwrap(), "txt");
    }
}
