//! CLI argument parsing for vkrpack.
//!
//! This module defines the command-line interface structure using `clap`.
//! Every global option can also be supplied through a `VKRPACK_*`
//! environment variable.
//!
//! # Examples
//!
//! ```text
//! vkrpack upload titul.pdf thesis.docx scans/*.png
//! vkrpack files <SESSION>
//! vkrpack prepare <SESSION> --order <ID>,<ID>,<ID> \
//!     --title "Consensus protocols" --author "Ivan Petrov" --year 2024
//! vkrpack show <EXPORT_ID>
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    Config, DEFAULT_FALLBACK_TIMEOUT, DEFAULT_MAX_FILE_SIZE, DEFAULT_OFFICE_BIN,
    DEFAULT_OFFICE_TIMEOUT, DEFAULT_WORKERS,
};
use crate::error::{Error, Result};
use crate::model::{ExportMetadata, ExportRequest};

const MIB: u64 = 1024 * 1024;

/// Validate, convert and merge thesis documents into a single PDF.
///
/// Files are first uploaded into a session. An export then validates the
/// session against the requested order and metadata, converts DOCX files
/// and images to PDF and merges everything in order.
#[derive(Parser, Debug)]
#[command(name = "vkrpack")]
#[command(version)]
#[command(about = "Validate, convert and merge thesis documents into a single PDF", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Operation to run
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding uploads and exports
    #[arg(long, global = true, value_name = "DIR", env = "VKRPACK_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Number of files converted concurrently
    #[arg(short, long, global = true, value_name = "N", env = "VKRPACK_WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Office suite binary used for DOCX conversion
    #[arg(long, global = true, value_name = "PATH", env = "VKRPACK_OFFICE_BIN", default_value = DEFAULT_OFFICE_BIN)]
    pub office_bin: PathBuf,

    /// Time limit for one office conversion, in seconds
    #[arg(long, global = true, value_name = "SECS", env = "VKRPACK_OFFICE_TIMEOUT", default_value_t = DEFAULT_OFFICE_TIMEOUT.as_secs())]
    pub office_timeout: u64,

    /// Time limit for one fallback DOCX conversion, in seconds
    #[arg(long, global = true, value_name = "SECS", env = "VKRPACK_FALLBACK_TIMEOUT", default_value_t = DEFAULT_FALLBACK_TIMEOUT.as_secs())]
    pub fallback_timeout: u64,

    /// Largest accepted upload, in MiB
    #[arg(long, global = true, value_name = "MIB", env = "VKRPACK_MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE / MIB)]
    pub max_file_size: u64,

    /// Verbose output - log every conversion step
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Operations on sessions and exports.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an upload session from local files
    ///
    /// Accepts paths and glob patterns. PDF, DOCX, JPEG and PNG files are
    /// recognised; anything else is stored but cannot be exported.
    Upload {
        /// Files or glob patterns to upload
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<String>,
    },

    /// List the files of an upload session
    Files {
        /// Session id printed by `upload`
        session: String,
    },

    /// Validate, convert and merge a session into one PDF
    Prepare(PrepareArgs),

    /// Show a finished export
    Show {
        /// Export id printed by `prepare`
        export_id: String,
    },
}

/// Arguments of `prepare`.
#[derive(Args, Debug, Clone)]
pub struct PrepareArgs {
    /// Session id printed by `upload`
    pub session: String,

    /// File ids in merge order, comma separated (ids may repeat)
    #[arg(long, required = true, value_delimiter = ',', value_name = "ID,...")]
    pub order: Vec<String>,

    /// Title of the work
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub title: String,

    /// Author's full name
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub author: String,

    /// Year of defence
    #[arg(long, value_name = "YEAR", default_value = "")]
    pub year: String,

    /// Scientific supervisor
    #[arg(long, value_name = "TEXT")]
    pub supervisor: Option<String>,

    /// Faculty or department
    #[arg(long, value_name = "TEXT")]
    pub faculty: Option<String>,

    /// Form of study
    #[arg(long, value_name = "TEXT")]
    pub form: Option<String>,
}

impl PrepareArgs {
    /// Build the export request these arguments describe.
    pub fn to_request(&self) -> ExportRequest {
        ExportRequest {
            session_id: self.session.clone(),
            order: self.order.clone(),
            metadata: ExportMetadata {
                title: self.title.clone(),
                author: self.author.clone(),
                supervisor: self.supervisor.clone(),
                year: self.year.clone(),
                faculty: self.faculty.clone(),
                form: self.form.clone(),
            },
        }
    }
}

impl Cli {
    /// Convert CLI arguments into a validated Config.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration fails validation.
    pub fn to_config(&self) -> Result<Config> {
        let config = Config {
            workers: self.workers,
            office_bin: self.office_bin.clone(),
            office_timeout: Duration::from_secs(self.office_timeout),
            fallback_timeout: Duration::from_secs(self.fallback_timeout),
            max_file_size: self.max_file_size.saturating_mul(MIB),
            verbose: self.verbose,
            quiet: self.quiet,
            ..Config::with_data_root(&self.data_dir)
        };

        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<&Cli> for Config {
    type Error = Error;

    fn try_from(cli: &Cli) -> Result<Self> {
        cli.to_config()
    }
}
