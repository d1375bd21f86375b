//! Conversion of non-PDF inputs to PDF.
//!
//! - DOCX goes through a [`DocxConverter`]: an ordered pair of
//!   [`DocxStrategy`] implementations, the external office suite first and
//!   the in-process text renderer second.
//! - Images are re-encoded as a single-page PDF by [`image_to_pdf`].
//!
//! Every conversion creates the output's parent directory and overwrites an
//! existing output, so repeating it with the same output path is harmless.

mod fallback;
mod office;
mod raster;

pub use self::fallback::TextFallbackConverter;
pub use self::office::OfficeConverter;
pub use self::raster::{PRINT_DPI, image_to_pdf};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ConversionError;
use crate::io::PdfWriter;

/// Why a single DOCX strategy did not produce a PDF.
#[derive(Debug, thiserror::Error)]
pub enum StrategyFailure {
    /// The external process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that was launched.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The external process exited unsuccessfully.
    #[error("exited with {status}: {stderr}")]
    ExitStatus {
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The strategy reported success but no usable file was produced.
    #[error("PDF file was not created: {}", .0.display())]
    MissingOutput(PathBuf),

    /// The strategy ran past its time limit.
    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    /// The document could not be read or rendered.
    #[error("{0}")]
    Render(String),

    /// File system error around the conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One way of turning a DOCX file into a PDF.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocxStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Convert `input` and leave the PDF at exactly `output`.
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), StrategyFailure>;
}

/// DOCX conversion with a primary strategy and a fallback.
///
/// The fallback only runs when the primary fails. Each strategy enforces its
/// own time limit. If both fail, leftovers at the output path are removed and
/// the error carries both causes.
pub struct DocxConverter {
    primary: Box<dyn DocxStrategy>,
    fallback: Box<dyn DocxStrategy>,
}

impl DocxConverter {
    /// Create a converter from two strategies tried in order.
    pub fn new(primary: Box<dyn DocxStrategy>, fallback: Box<dyn DocxStrategy>) -> Self {
        Self { primary, fallback }
    }

    /// Office suite first, text renderer second, with the configured limits.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Box::new(OfficeConverter::new(&config.office_bin, config.office_timeout)),
            Box::new(TextFallbackConverter::new(config.fallback_timeout)),
        )
    }

    /// Convert `input` to a PDF at `output`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Docx`] when both strategies fail, or
    /// [`ConversionError::Io`] when the output directory cannot be created.
    pub async fn convert(&self, input: &Path, output: &Path) -> Result<PathBuf, ConversionError> {
        ensure_parent_dir(output).await?;

        let primary = match attempt(self.primary.as_ref(), input, output).await {
            Ok(()) => {
                debug!(input = %input.display(), strategy = self.primary.name(), "DOCX converted");
                return Ok(output.to_path_buf());
            }
            Err(err) => {
                warn!(
                    input = %input.display(),
                    strategy = self.primary.name(),
                    error = %err,
                    "Primary DOCX conversion failed, trying fallback"
                );
                err
            }
        };

        match attempt(self.fallback.as_ref(), input, output).await {
            Ok(()) => {
                info!(input = %input.display(), strategy = self.fallback.name(), "DOCX converted by fallback");
                Ok(output.to_path_buf())
            }
            Err(fallback) => {
                remove_leftovers(output).await;
                Err(ConversionError::Docx {
                    path: input.to_path_buf(),
                    primary: format!("{}: {primary}", self.primary.name()),
                    fallback: format!("{}: {fallback}", self.fallback.name()),
                })
            }
        }
    }
}

/// Run one strategy and check that it left a non-empty file behind.
async fn attempt(
    strategy: &dyn DocxStrategy,
    input: &Path,
    output: &Path,
) -> Result<(), StrategyFailure> {
    strategy.convert(input, output).await?;

    match tokio::fs::metadata(output).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(StrategyFailure::MissingOutput(output.to_path_buf())),
    }
}

/// Delete a partially written output and its temp sibling, if any.
async fn remove_leftovers(output: &Path) {
    for path in [output.to_path_buf(), PdfWriter::temp_path(output)] {
        if tokio::fs::remove_file(&path).await.is_ok() {
            debug!(path = %path.display(), "Removed partial conversion output");
        }
    }
}

async fn ensure_parent_dir(output: &Path) -> Result<(), ConversionError> {
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| ConversionError::io(output.to_path_buf(), err))?;
    }
    Ok(())
}

/// Converts uploaded files to PDF, one strategy per kind.
pub struct Converter {
    docx: DocxConverter,
}

impl Converter {
    /// Create a converter around a DOCX strategy chain.
    pub fn new(docx: DocxConverter) -> Self {
        Self { docx }
    }

    /// Build the production converter from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(DocxConverter::from_config(config))
    }

    /// Convert a DOCX document to PDF at `output`.
    pub async fn docx_to_pdf(&self, input: &Path, output: &Path) -> Result<PathBuf, ConversionError> {
        self.docx.convert(input, output).await
    }

    /// Convert a JPEG/PNG image to a single-page PDF at `output`.
    ///
    /// Decoding runs on the blocking pool.
    pub async fn image_to_pdf(&self, input: &Path, output: &Path) -> Result<PathBuf, ConversionError> {
        let (task_input, task_output) = (input.to_path_buf(), output.to_path_buf());

        tokio::task::spawn_blocking(move || image_to_pdf(&task_input, &task_output))
            .await
            .map_err(|err| ConversionError::image(input.to_path_buf(), err.to_string()))??;

        Ok(output.to_path_buf())
    }
}
