//! vkrpack - Validate, convert and merge thesis documents into a single PDF.
//!
//! A thesis bundle arrives as a set of loosely named files: a title page,
//! the main text as DOCX or PDF, scanned attachments as images and an
//! anti-plagiarism report. This library:
//!
//! - Stores uploads as sessions ([`store`])
//! - Classifies files by extension ([`kind`])
//! - Checks the bundle, the requested order and the metadata ([`validation`])
//! - Converts DOCX and images to PDF, with a fallback for DOCX ([`convert`])
//! - Merges the PDFs in the requested order ([`merge`])
//! - Orchestrates all of the above per export ([`export`])
//!
//! # Examples
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use vkrpack::config::Config;
//! use vkrpack::export::ExportPipeline;
//! use vkrpack::model::{ExportMetadata, ExportRequest};
//! use vkrpack::store::{FsExportStore, FsSessionStore};
//!
//! # async fn example() -> vkrpack::Result<()> {
//! let config = Config::with_data_root("data");
//! let sessions = Arc::new(FsSessionStore::from_config(&config));
//! let files = vec![PathBuf::from("titul.pdf"), PathBuf::from("thesis.docx")];
//! let session = sessions.create(&files).await?;
//!
//! let pipeline = ExportPipeline::from_config(
//!     &config,
//!     sessions,
//!     Arc::new(FsExportStore::from_config(&config)),
//! );
//! let result = pipeline
//!     .prepare(ExportRequest {
//!         session_id: session.session_id.clone(),
//!         order: session.files.iter().map(|f| f.id.clone()).collect(),
//!         metadata: ExportMetadata {
//!             title: "Consensus protocols".into(),
//!             author: "Ivan Petrov".into(),
//!             year: "2024".into(),
//!             ..Default::default()
//!         },
//!     })
//!     .await?;
//! println!("{}", result.pdf_path.display());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod io;
pub mod kind;
pub mod merge;
pub mod model;
pub mod output;
pub mod store;
pub mod utils;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use tracing::info;

use crate::cli::Command;
use crate::export::ExportPipeline;
use crate::output::{OutputFormatter, display_export, display_session};
use crate::store::{ExportStore, FsExportStore, FsSessionStore, SessionStore};

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Execute one CLI command against the file-system stores.
///
/// # Errors
///
/// Returns whatever the command's underlying operation returns; see
/// [`Error::exit_code`] for how errors map to process exit codes.
pub async fn run(command: Command, config: Config) -> Result<()> {
    let formatter = OutputFormatter::from_config(&config);
    let sessions = Arc::new(FsSessionStore::from_config(&config));
    let exports = Arc::new(FsExportStore::from_config(&config));

    match command {
        Command::Upload { inputs } => {
            let paths = utils::collect_paths_for_patterns(&inputs)?;
            formatter.info(&format!("Uploading {} file(s)...", paths.len()));
            for path in &paths {
                formatter.debug(&path.display().to_string());
            }

            let session = sessions.create(&paths).await?;
            formatter.success(&format!("Created session {}", session.session_id));
            display_session(&formatter, &session);
        }

        Command::Files { session } => {
            let session = sessions
                .load(&session)
                .await?
                .ok_or_else(|| Error::session_not_found(&session))?;
            display_session(&formatter, &session);
        }

        Command::Prepare(args) => {
            let request = args.to_request();
            info!(session_id = %request.session_id, files = request.order.len(), "Preparing export");
            formatter.info(&format!(
                "Preparing export of {} file(s) from session {}...",
                request.order.len(),
                request.session_id
            ));
            for (position, file_id) in request.order.iter().enumerate() {
                formatter.debug(&format!("{}. {file_id}", position + 1));
            }

            let pipeline = ExportPipeline::from_config(&config, sessions, exports);
            let result = pipeline.prepare(request).await?;
            display_export(&formatter, &result);
        }

        Command::Show { export_id } => {
            let result = exports
                .get(&export_id)
                .await?
                .ok_or_else(|| Error::export_not_found(&export_id))?;
            display_export(&formatter, &result);
        }
    }

    Ok(())
}
