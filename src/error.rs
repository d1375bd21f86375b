//! Error types for vkrpack.
//!
//! Errors fall into the categories the export pipeline distinguishes:
//!
//! - **Validation errors**: blocking, user-correctable findings (missing metadata,
//!   unknown file ids). Surfaced verbatim, never retried.
//! - **Conversion errors**: an external tool or codec failed. Terminal for the file
//!   and therefore for the whole export.
//! - **Merge errors**: nothing usable survived the merge.
//! - **Plumbing errors**: sessions, stores, configuration and I/O.

use std::io;
use std::path::PathBuf;

use crate::kind::FileKind;

/// Result type alias for vkrpack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vkrpack operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more blocking validation findings.
    #[error("Validation failed:\n  - {}", .errors.join("\n  - "))]
    Validation {
        /// Every error reported by the inventory, metadata and ordering checks.
        errors: Vec<String>,
    },

    /// The requested upload session does not exist.
    #[error("Session not found: {session_id}")]
    SessionNotFound {
        /// Session id that was looked up.
        session_id: String,
    },

    /// The requested export does not exist.
    #[error("Export not found: {export_id}")]
    ExportNotFound {
        /// Export id that was looked up.
        export_id: String,
    },

    /// A file could not be converted to PDF.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The merge produced no usable output.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// An uploaded file exceeds the configured size limit.
    #[error("File {name} exceeds size limit of {limit_mb}MB")]
    FileTooLarge {
        /// Original file name.
        name: String,
        /// Limit in mebibytes.
        limit_mb: u64,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// A session or export store failed.
    #[error("Store error: {message}")]
    Store {
        /// Details about the failure.
        message: String,
    },

    /// A background task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to turn a single input into a PDF.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Both DOCX strategies failed.
    #[error("DOCX conversion failed for {}: {primary}; fallback: {fallback}", .path.display())]
    Docx {
        /// Input document.
        path: PathBuf,
        /// Why the primary strategy failed.
        primary: String,
        /// Why the fallback strategy failed.
        fallback: String,
    },

    /// The image could not be decoded or re-encoded.
    #[error("Image conversion failed for {}: {reason}", .path.display())]
    Image {
        /// Input image.
        path: PathBuf,
        /// Underlying codec error.
        reason: String,
    },

    /// The file kind has no conversion strategy.
    #[error("Unsupported file type '{kind}' for {name}")]
    UnsupportedKind {
        /// Original file name.
        name: String,
        /// Classified kind.
        kind: FileKind,
    },

    /// I/O failure while preparing or cleaning up output.
    #[error("I/O error during conversion of {}: {source}", .path.display())]
    Io {
        /// File being converted.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// Failure of the merge stage.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Every member was missing, unreadable or empty.
    #[error("No readable PDF among {attempted} input(s)")]
    NothingToMerge {
        /// Number of members that were attempted.
        attempted: usize,
    },

    /// The merged file was not written or is zero bytes.
    #[error("Merged PDF is empty: {}", .path.display())]
    EmptyOutput {
        /// Output path.
        path: PathBuf,
    },

    /// Structural failure while assembling the document.
    #[error("PDF merging failed: {reason}")]
    Pdf {
        /// Details about the failure.
        reason: String,
    },
}

impl From<lopdf::Error> for MergeError {
    fn from(err: lopdf::Error) -> Self {
        Self::Pdf {
            reason: err.to_string(),
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Self::Merge(err.into())
    }
}

impl Error {
    /// Create a Validation error.
    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation { errors }
    }

    /// Create a SessionNotFound error.
    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }

    /// Create an ExportNotFound error.
    pub fn export_not_found(export_id: impl Into<String>) -> Self {
        Self::ExportNotFound {
            export_id: export_id.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a Store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::SessionNotFound { .. }
                | Self::ExportNotFound { .. }
                | Self::FileTooLarge { .. }
                | Self::InvalidConfig { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::FileTooLarge { .. } => 1,
            Self::SessionNotFound { .. } => 2,
            Self::ExportNotFound { .. } => 2,
            Self::Conversion(_) => 3,
            Self::Merge(_) => 4,
            Self::Store { .. } => 5,
            Self::Io(_) => 5,
            Self::Json(_) => 5,
            Self::Task(_) => 6,
        }
    }
}

impl ConversionError {
    /// Create an Image error.
    pub fn image(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::Image {
            path,
            reason: reason.into(),
        }
    }

    /// Create an Io error for the given path.
    pub fn io(path: PathBuf, source: io::Error) -> Self {
        Self::Io { path, source }
    }
}
