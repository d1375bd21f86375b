//! Output formatting and display for vkrpack.
//!
//! This module handles all user-facing console output:
//! - Formatted status messages
//! - Session listings
//! - Export summaries with their warnings
//! - Quiet and verbose modes
//!
//! # Examples
//!
//! ```no_run
//! use vkrpack::output::OutputFormatter;
//! use vkrpack::config::Config;
//!
//! # fn example(config: Config) {
//! let formatter = OutputFormatter::from_config(&config);
//! formatter.info("Converting files...");
//! formatter.success("Export prepared");
//! # }
//! ```

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use crate::model::{ExportResult, UploadSession};

/// Print the files of a session, one numbered line per file.
pub fn display_session(formatter: &OutputFormatter, session: &UploadSession) {
    formatter.section(&format!("Session {}", session.session_id));
    formatter.detail("State", state_label(session));
    formatter.detail("Created", &session.created_at.to_rfc3339());

    formatter.section("Files");
    for (idx, file) in session.files.iter().enumerate() {
        formatter.list_item(
            idx + 1,
            &format!(
                "{}  {} ({}, {})",
                file.id,
                file.original_name,
                file.kind,
                format_size(file.size)
            ),
        );
    }
}

/// Print an export's location, merged files and warnings.
pub fn display_export(formatter: &OutputFormatter, result: &ExportResult) {
    formatter.success(&format!("Export {} prepared", result.export_id));
    formatter.detail("PDF", &result.pdf_path.display().to_string());
    formatter.detail("Session", &result.session_id);
    formatter.detail("Title", &result.metadata.title);
    formatter.detail("Author", &result.metadata.author);
    formatter.detail("Year", &result.metadata.year);

    formatter.section("Merged files");
    for (idx, name) in result.files.iter().enumerate() {
        formatter.list_item(idx + 1, name);
    }

    if !result.warnings.is_empty() {
        formatter.section("Warnings");
        for warning in &result.warnings {
            formatter.warning(warning);
        }
    }
}

fn state_label(session: &UploadSession) -> &'static str {
    use crate::model::SessionState;

    match session.state {
        SessionState::Pending => "pending",
        SessionState::Processing => "processing",
        SessionState::Completed => "completed",
        SessionState::Failed => "failed",
    }
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
