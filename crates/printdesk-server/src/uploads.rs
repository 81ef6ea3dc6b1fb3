//! Upload storage: validated multipart batches persisted to a flat
//! directory under collision-resistant stored names.
//!
//! A batch is all-or-nothing: every file is validated before the first byte
//! hits disk, and a write failure partway through removes the files already
//! written for that batch. Individual stored files are never deleted; the
//! only destructive operation is [`UploadStore::clear_all`], which spares
//! the `.gitkeep` sentinel so the directory itself survives.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use printdesk_store::FileRef;

use crate::error::ApiError;

/// Reserved directory entry excluded from bulk deletion.
pub const SENTINEL: &str = ".gitkeep";

/// Declared MIME types accepted for upload: PDF and Word documents.
const ALLOWED_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// One file extracted from a multipart request, fully buffered.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A single entry that could not be deleted during a bulk clear.
#[derive(Debug, Clone, Serialize)]
pub struct ClearFailure {
    pub name: String,
    pub reason: String,
}

/// Aggregate result of a best-effort bulk clear.
#[derive(Debug, Clone, Serialize)]
pub struct ClearOutcome {
    pub deleted: usize,
    pub failures: Vec<ClearFailure>,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_file_size: usize,
}

impl UploadStore {
    /// Open (or create) the upload directory, making sure the sentinel
    /// entry exists.
    pub async fn new(dir: PathBuf, max_file_size: usize) -> Result<Self, ApiError> {
        fs::create_dir_all(&dir).await.map_err(|e| {
            ApiError::Storage(format!(
                "failed to create upload directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let sentinel = dir.join(SENTINEL);
        if !sentinel.exists() {
            fs::write(&sentinel, b"").await.map_err(|e| {
                ApiError::Storage(format!("failed to create sentinel entry: {}", e))
            })?;
        }

        info!(path = %dir.display(), "upload store initialized");
        Ok(Self { dir, max_file_size })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a batch of files atomically.
    ///
    /// The whole batch is rejected if any file has a disallowed type or
    /// exceeds the size limit; nothing is written in that case. Returns one
    /// [`FileRef`] per input file, in submission order.
    pub async fn store_batch(&self, files: Vec<IncomingFile>) -> Result<Vec<FileRef>, ApiError> {
        if files.is_empty() {
            return Err(ApiError::Validation("No files uploaded".to_string()));
        }

        for file in &files {
            self.validate(file)?;
        }

        let mut refs = Vec::with_capacity(files.len());
        let mut written: Vec<PathBuf> = Vec::with_capacity(files.len());

        for file in &files {
            let stored = stored_name(&file.name);
            let path = self.dir.join(&stored);

            match self.write_new(&path, &file.data).await {
                Ok(()) => {
                    debug!(name = %file.name, stored = %stored, size = file.data.len(), "stored upload");
                    written.push(path);
                    refs.push(FileRef {
                        name: file.name.clone(),
                        size: file.data.len() as u64,
                        content_type: file.content_type.clone(),
                        path: format!("/uploads/{}", stored),
                    });
                }
                Err(e) => {
                    // Roll back the partial batch before reporting.
                    for path in &written {
                        if let Err(cleanup) = fs::remove_file(path).await {
                            warn!(path = %path.display(), error = %cleanup, "failed to roll back partial upload");
                        }
                    }
                    return Err(e);
                }
            }
        }

        info!(count = refs.len(), "upload batch stored");
        Ok(refs)
    }

    /// Read a stored file back for download.
    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, ApiError> {
        let path = self.safe_path(filename)?;

        if !path.exists() {
            return Err(ApiError::NotFound(format!("File not found: {}", filename)));
        }

        fs::read(&path)
            .await
            .map_err(|e| ApiError::Storage(format!("failed to read '{}': {}", filename, e)))
    }

    /// Delete every entry except the sentinel, continuing past individual
    /// failures and reporting them in the aggregate outcome.
    pub async fn clear_all(&self) -> Result<ClearOutcome, ApiError> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(|e| {
            ApiError::Storage(format!(
                "failed to list upload directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut outcome = ClearOutcome {
            deleted: 0,
            failures: Vec::new(),
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(ApiError::Storage(format!(
                        "failed to read upload directory entry: {}",
                        e
                    )));
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            if name == SENTINEL {
                continue;
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => outcome.deleted += 1,
                Err(e) => {
                    warn!(name = %name, error = %e, "failed to delete upload");
                    outcome.failures.push(ClearFailure {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            deleted = outcome.deleted,
            failed = outcome.failures.len(),
            "upload directory cleared"
        );
        Ok(outcome)
    }

    fn validate(&self, file: &IncomingFile) -> Result<(), ApiError> {
        if !ALLOWED_TYPES.contains(&file.content_type.as_str()) {
            return Err(ApiError::Validation(format!(
                "Invalid file type '{}' for '{}'. Only PDF and Word documents are allowed.",
                file.content_type, file.name
            )));
        }
        if file.data.len() > self.max_file_size {
            return Err(ApiError::Validation(format!(
                "File '{}' exceeds the size limit: {} > {} bytes",
                file.name,
                file.data.len(),
                self.max_file_size
            )));
        }
        Ok(())
    }

    /// Create-and-write, failing hard if the stored name already exists.
    /// A collision means the timestamp + random disambiguator repeated,
    /// which must never silently overwrite another upload.
    async fn write_new(&self, path: &Path, data: &[u8]) -> Result<(), ApiError> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    ApiError::Storage(format!(
                        "stored filename collision: '{}'",
                        path.display()
                    ))
                } else {
                    ApiError::Storage(format!("failed to write '{}': {}", path.display(), e))
                }
            })?;

        file.write_all(data)
            .await
            .map_err(|e| ApiError::Storage(format!("failed to write '{}': {}", path.display(), e)))?;
        file.flush()
            .await
            .map_err(|e| ApiError::Storage(format!("failed to flush '{}': {}", path.display(), e)))?;
        Ok(())
    }

    /// Resolve a client-supplied filename inside the upload directory,
    /// rejecting anything that could escape it.
    fn safe_path(&self, filename: &str) -> Result<PathBuf, ApiError> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(ApiError::Validation("Path traversal detected".to_string()));
        }
        Ok(self.dir.join(filename))
    }
}

/// Stored filename: `<millis>-<random>-<sanitized original name>`.
///
/// Keeps the original name visible for display while the prefix makes the
/// name unique with overwhelming probability.
fn stored_name(original: &str) -> String {
    let suffix: u32 = rand::random::<u32>() % 1_000_000_000;
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        suffix,
        sanitize(original)
    )
}

/// Reduce an original filename to a safe final path component.
fn sanitize(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.chars().all(|c| c == '.' || c == ' ') || cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Content type for a stored filename, derived from its extension.
/// Only types the upload allowlist admits are mapped precisely.
pub fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}
