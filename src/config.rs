//! Configuration module for vkrpack.
//!
//! Turns CLI arguments (and their environment variable fallbacks) into a
//! validated configuration that drives the stores, the converters and the
//! export pipeline. It handles:
//! - Application of defaults
//! - Derivation of the upload and export directories from the data root
//! - Validation of option combinations

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default number of concurrent conversion workers.
pub const DEFAULT_WORKERS: usize = 3;

/// Default timeout for the external office process.
pub const DEFAULT_OFFICE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for the in-process DOCX fallback.
pub const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default upload size limit per file (100 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Default office binary.
pub const DEFAULT_OFFICE_BIN: &str = "soffice";

/// Complete configuration for vkrpack.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of all persisted data.
    pub data_root: PathBuf,

    /// Directory holding one subdirectory per upload session.
    pub upload_root: PathBuf,

    /// Directory holding merged PDFs and their sidecars.
    pub export_root: PathBuf,

    /// Size of the conversion worker pool.
    pub workers: usize,

    /// Office suite binary used for DOCX conversion.
    pub office_bin: PathBuf,

    /// Time limit for one office conversion.
    pub office_timeout: Duration,

    /// Time limit for one fallback conversion.
    pub fallback_timeout: Duration,

    /// Largest accepted upload, in bytes.
    pub max_file_size: u64,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,
}

impl Config {
    /// Create a configuration rooted at `data_root` with default settings.
    pub fn with_data_root(data_root: impl Into<PathBuf>) -> Self {
        let data_root = data_root.into();
        Self {
            upload_root: data_root.join("uploads"),
            export_root: data_root.join("exports"),
            data_root,
            workers: DEFAULT_WORKERS,
            office_bin: PathBuf::from(DEFAULT_OFFICE_BIN),
            office_timeout: DEFAULT_OFFICE_TIMEOUT,
            fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            verbose: false,
            quiet: false,
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The worker count is zero
    /// - A timeout is zero
    /// - The fallback timeout is longer than the office timeout
    /// - The size limit is zero
    /// - Verbose and quiet modes are both enabled
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::invalid_config("Number of workers must be at least 1"));
        }

        if self.office_timeout.is_zero() || self.fallback_timeout.is_zero() {
            return Err(Error::invalid_config("Timeouts must be greater than zero"));
        }

        if self.fallback_timeout > self.office_timeout {
            return Err(Error::invalid_config(format!(
                "Fallback timeout ({}s) must not exceed office timeout ({}s)",
                self.fallback_timeout.as_secs(),
                self.office_timeout.as_secs()
            )));
        }

        if self.max_file_size == 0 {
            return Err(Error::invalid_config("Maximum file size must be greater than zero"));
        }

        if self.verbose && self.quiet {
            return Err(Error::invalid_config("Cannot use both --verbose and --quiet"));
        }

        Ok(())
    }

    /// Default log filter directive for this configuration.
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "warn,vkrpack=debug"
        } else if self.quiet {
            "error"
        } else {
            "warn,vkrpack=info"
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_data_root("data")
    }
}
