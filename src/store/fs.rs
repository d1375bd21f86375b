use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ExportStore, SessionStore, is_safe_id};
use crate::config::Config;
use crate::io::PdfWriter;
use crate::kind::FileKind;
use crate::model::{ExportResult, SessionState, UploadSession, UploadedFile};
use crate::{Error, Result};

const INDEX_FILE: &str = "index.json";

/// Upload sessions as directories under the upload root.
///
/// Each session lives in `<upload_root>/<session_id>/` next to an
/// `index.json` describing its files and state.
#[derive(Debug)]
pub struct FsSessionStore {
    upload_root: PathBuf,
    max_file_size: u64,
    index_lock: Mutex<()>,
}

impl FsSessionStore {
    /// Create a store rooted at `upload_root` accepting files up to
    /// `max_file_size` bytes.
    pub fn new(upload_root: impl Into<PathBuf>, max_file_size: u64) -> Self {
        Self {
            upload_root: upload_root.into(),
            max_file_size,
            index_lock: Mutex::new(()),
        }
    }

    /// Store under the configured upload root and size limit.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.upload_root, config.max_file_size)
    }

    fn session_dir(&self, session_id: &str) -> PathBuf {
        self.upload_root.join(session_id)
    }

    /// Ingest local files into a new session.
    ///
    /// Files are copied into the session directory, classified by extension
    /// and recorded in the index. Nothing is kept if any file is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    ///
    /// * `paths` is empty.
    /// * A file is larger than the configured limit.
    /// * A file cannot be read or copied.
    pub async fn create(&self, paths: &[PathBuf]) -> Result<UploadSession> {
        if paths.is_empty() {
            return Err(Error::validation(vec!["No files provided".to_string()]));
        }

        let session_id = Uuid::new_v4().to_string();
        let dir = self.session_dir(&session_id);
        tokio::fs::create_dir_all(&dir).await?;

        match self.ingest(&dir, paths).await {
            Ok(files) => {
                let session = UploadSession {
                    session_id,
                    files,
                    state: SessionState::Pending,
                    created_at: Utc::now(),
                };
                write_json(&dir.join(INDEX_FILE), &session).await?;

                info!(
                    session_id = %session.session_id,
                    files = session.files.len(),
                    "Upload session created"
                );
                Ok(session)
            }
            Err(err) => {
                let _ = tokio::fs::remove_dir_all(&dir).await;
                Err(err)
            }
        }
    }

    async fn ingest(&self, dir: &Path, paths: &[PathBuf]) -> Result<Vec<UploadedFile>> {
        let mut files = Vec::with_capacity(paths.len());

        for path in paths {
            let original_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("not a file: {}", path.display()),
                    )
                })?;

            let size = tokio::fs::metadata(path).await?.len();
            if size > self.max_file_size {
                return Err(Error::FileTooLarge {
                    name: original_name,
                    limit_mb: self.max_file_size / (1024 * 1024),
                });
            }

            let id = Uuid::new_v4().to_string();
            let stored = dir.join(format!("{id}_{original_name}"));
            tokio::fs::copy(path, &stored).await?;

            let kind = FileKind::from_name(&original_name);
            debug!(file_id = %id, name = %original_name, %kind, size, "File stored");

            files.push(UploadedFile {
                id,
                original_name,
                kind,
                path: stored,
                size,
            });
        }

        Ok(files)
    }
}

#[async_trait]
impl SessionStore for FsSessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<UploadSession>> {
        if !is_safe_id(session_id) {
            return Ok(None);
        }
        read_json(&self.session_dir(session_id).join(INDEX_FILE)).await
    }

    async fn set_state(&self, session_id: &str, state: SessionState) -> Result<()> {
        let _guard = self.index_lock.lock().await;

        let mut session = self
            .load(session_id)
            .await?
            .ok_or_else(|| Error::session_not_found(session_id))?;
        session.state = state;

        write_json(&self.session_dir(session_id).join(INDEX_FILE), &session).await
    }
}

/// Export results as JSON sidecars next to the merged PDFs.
#[derive(Debug)]
pub struct FsExportStore {
    export_root: PathBuf,
}

impl FsExportStore {
    /// Create a store writing sidecars into `export_root`.
    pub fn new(export_root: impl Into<PathBuf>) -> Self {
        Self {
            export_root: export_root.into(),
        }
    }

    /// Store under the configured export root.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.export_root)
    }

    /// `<export_root>/export_<id>.json`
    pub fn sidecar_path(&self, export_id: &str) -> PathBuf {
        self.export_root.join(format!("export_{export_id}.json"))
    }
}

#[async_trait]
impl ExportStore for FsExportStore {
    async fn put(&self, result: &ExportResult) -> Result<()> {
        if !is_safe_id(&result.export_id) {
            return Err(Error::store(format!("invalid export id '{}'", result.export_id)));
        }
        write_json(&self.sidecar_path(&result.export_id), result).await
    }

    async fn get(&self, export_id: &str) -> Result<Option<ExportResult>> {
        if !is_safe_id(export_id) {
            return Ok(None);
        }
        read_json(&self.sidecar_path(export_id)).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Write pretty JSON through a temp sibling so readers never see a partial file.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_vec_pretty(value)?;
    let tmp = PdfWriter::temp_path(path);
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
