//! Export orchestration.
//!
//! [`ExportPipeline::prepare`] turns an upload session and a requested
//! order into one merged PDF:
//!
//! 1. Validate the whole request. Any error stops the export before a
//!    single file is converted.
//! 2. Convert every order position to PDF over a bounded worker pool.
//!    Results are put back into request order through a slot per position.
//!    One failed conversion fails the export.
//! 3. Merge the converted files in order. Unreadable members are skipped;
//!    only an empty merge fails.
//! 4. Persist the [`ExportResult`] and return it.
//!
//! Intermediate files live in `<export_root>/work_<export_id>/` and are
//! removed whether or not the export succeeds.

mod state;

pub use self::state::ExportState;

use chrono::{Datelike, Utc};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use uuid::Uuid;

use self::state::StateTracker;
use crate::config::{Config, DEFAULT_WORKERS};
use crate::convert::Converter;
use crate::error::ConversionError;
use crate::kind::FileKind;
use crate::merge::Merger;
use crate::model::{ExportRequest, ExportResult, SessionState, UploadSession, UploadedFile};
use crate::store::{ExportStore, SessionStore};
use crate::validation;
use crate::{Error, Result};

/// `<export_root>/export_<export_id>.pdf`
pub fn export_pdf_path(export_root: &Path, export_id: &str) -> PathBuf {
    export_root.join(format!("export_{export_id}.pdf"))
}

/// Prepares merged exports from upload sessions.
pub struct ExportPipeline {
    sessions: Arc<dyn SessionStore>,
    exports: Arc<dyn ExportStore>,
    converter: Arc<Converter>,
    export_root: PathBuf,
    workers: usize,
}

impl ExportPipeline {
    /// Create a pipeline with the default worker count.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        exports: Arc<dyn ExportStore>,
        converter: Converter,
        export_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sessions,
            exports,
            converter: Arc::new(converter),
            export_root: export_root.into(),
            workers: DEFAULT_WORKERS,
        }
    }

    /// Create a pipeline whose converter, paths and pool size come from
    /// `config`.
    pub fn from_config(
        config: &Config,
        sessions: Arc<dyn SessionStore>,
        exports: Arc<dyn ExportStore>,
    ) -> Self {
        Self::new(
            sessions,
            exports,
            Converter::from_config(config),
            &config.export_root,
        )
        .with_workers(config.workers)
    }

    /// Set the number of concurrent conversions (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Validate, convert and merge the files of a session.
    ///
    /// The session is marked `processing` while the export runs and
    /// `completed` or `failed` afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    ///
    /// * The session does not exist ([`Error::SessionNotFound`]).
    /// * Validation raised at least one error ([`Error::Validation`], carrying
    ///   every error found).
    /// * Any position could not be converted ([`Error::Conversion`]).
    /// * No converted file could be merged ([`Error::Merge`]).
    /// * The result could not be persisted.
    pub async fn prepare(&self, request: ExportRequest) -> Result<ExportResult> {
        let session = self
            .sessions
            .load(&request.session_id)
            .await?
            .ok_or_else(|| Error::session_not_found(&request.session_id))?;

        self.sessions
            .set_state(&session.session_id, SessionState::Processing)
            .await?;

        let outcome = self.run(&session, request).await;

        let final_state = if outcome.is_ok() {
            SessionState::Completed
        } else {
            SessionState::Failed
        };
        if let Err(err) = self.sessions.set_state(&session.session_id, final_state).await {
            warn!(session_id = %session.session_id, error = %err, "Failed to record session state");
        }

        outcome
    }

    async fn run(&self, session: &UploadSession, request: ExportRequest) -> Result<ExportResult> {
        let export_id = Uuid::new_v4().to_string();
        let mut state = StateTracker::new(&export_id);

        let findings = validation::validate_request(
            &session.files,
            &request.order,
            &request.metadata,
            i64::from(Utc::now().year()),
        );
        for warning in &findings.warnings {
            info!(export_id = %export_id, %warning, "Validation warning");
        }
        if findings.has_errors() {
            state.fail();
            return Err(Error::validation(findings.errors));
        }
        state.advance(ExportState::Validated);

        // Validation guarantees every id resolves
        let by_id = session.files_by_id();
        let ordered: Vec<&UploadedFile> = request
            .order
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).copied())
            .collect();

        let work_dir = self.export_root.join(format!("work_{export_id}"));
        state.advance(ExportState::Converting);

        let converted = match self.convert_all(&ordered, &work_dir).await {
            Ok(paths) => paths,
            Err(err) => {
                remove_work_dir(&work_dir).await;
                state.fail();
                return Err(err);
            }
        };

        let output = export_pdf_path(&self.export_root, &export_id);
        let merged = {
            let (output, meta) = (output.clone(), request.metadata.clone());
            tokio::task::spawn_blocking(move || Merger::merge(&converted, &output, &meta)).await
        };
        remove_work_dir(&work_dir).await;

        let summary = match merged {
            Ok(Ok(summary)) => summary,
            Ok(Err(err)) => {
                state.fail();
                return Err(err.into());
            }
            Err(err) => {
                state.fail();
                return Err(err.into());
            }
        };
        state.advance(ExportState::Merged);

        let result = ExportResult {
            export_id: export_id.clone(),
            session_id: session.session_id.clone(),
            pdf_path: summary.output,
            warnings: findings.warnings,
            metadata: request.metadata,
            files: ordered.iter().map(|f| f.original_name.clone()).collect(),
            created_at: Utc::now(),
        };

        if let Err(err) = self.exports.put(&result).await {
            // A PDF without its record is unreachable
            if let Err(remove_err) = tokio::fs::remove_file(&result.pdf_path).await {
                warn!(path = %result.pdf_path.display(), error = %remove_err, "Failed to remove unrecorded export");
            }
            state.fail();
            return Err(err);
        }
        state.advance(ExportState::Done);

        info!(
            export_id = %export_id,
            session_id = %session.session_id,
            pages = summary.total_pages,
            skipped = summary.skipped,
            warnings = result.warnings.len(),
            "Export prepared"
        );

        Ok(result)
    }

    /// Convert every position concurrently and return the PDFs in order.
    ///
    /// After the first failure no further conversion starts, but those
    /// already running are awaited, so nothing writes into `work_dir` once
    /// this returns.
    async fn convert_all(&self, ordered: &[&UploadedFile], work_dir: &Path) -> Result<Vec<PathBuf>> {
        // Owned per-position jobs keep the stream free of borrowed closure arguments
        let jobs: Vec<(usize, UploadedFile, PathBuf)> = ordered
            .iter()
            .enumerate()
            .map(|(pos, &file)| {
                // Unique per position, so duplicate ids never share an output
                let output = work_dir.join(format!("{pos}_{}.pdf", file.id));
                (pos, file.clone(), output)
            })
            .collect();

        let converter = Arc::clone(&self.converter);
        let aborted = Arc::new(AtomicBool::new(false));
        let mut results = stream::iter(jobs)
            .map(|(pos, file, output)| {
                let (converter, aborted) = (Arc::clone(&converter), Arc::clone(&aborted));
                async move {
                    if aborted.load(Ordering::Relaxed) {
                        return (pos, None);
                    }
                    let result = convert_file(&converter, &file, &output).await;
                    if result.is_err() {
                        aborted.store(true, Ordering::Relaxed);
                    }
                    (pos, Some(result))
                }
            })
            .buffer_unordered(self.workers);

        let mut slots: Vec<Option<PathBuf>> = vec![None; ordered.len()];
        let mut failure: Option<ConversionError> = None;

        while let Some((pos, result)) = results.next().await {
            match result {
                Some(Ok(path)) => slots[pos] = Some(path),
                Some(Err(err)) => {
                    warn!(position = pos, error = %err, "Conversion failed, aborting export");
                    failure.get_or_insert(err);
                }
                None => debug!(position = pos, "Conversion skipped after earlier failure"),
            }
        }

        match failure {
            Some(err) => Err(err.into()),
            None => Ok(slots.into_iter().flatten().collect()),
        }
    }
}

async fn convert_file(
    converter: &Converter,
    file: &UploadedFile,
    output: &Path,
) -> std::result::Result<PathBuf, ConversionError> {
    debug!(file_id = %file.id, name = %file.original_name, kind = %file.kind, "Converting");

    match file.kind {
        FileKind::Pdf => Ok(file.path.clone()),
        FileKind::Docx => converter.docx_to_pdf(&file.path, output).await,
        FileKind::Image => converter.image_to_pdf(&file.path, output).await,
        FileKind::Unknown => Err(ConversionError::UnsupportedKind {
            name: file.original_name.clone(),
            kind: file.kind,
        }),
    }
}

async fn remove_work_dir(work_dir: &Path) {
    match tokio::fs::remove_dir_all(work_dir).await {
        Ok(()) => debug!(path = %work_dir.display(), "Work directory removed"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %work_dir.display(), error = %err, "Failed to remove work directory"),
    }
}
