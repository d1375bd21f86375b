//! Validation of an export request.
//!
//! Three independent checks run against every request:
//!
//! - [`check_inventory`] looks at the uploaded set as a whole
//! - [`check_metadata`] looks at the bibliographic metadata
//! - [`check_order`] looks at the requested merge order
//!
//! Each returns [`Findings`]. Anything that would make the exported content
//! wrong is an error and blocks the merge; anything that only affects
//! presentation is a warning and travels with the successful result.
//!
//! # Examples
//!
//! ```
//! use vkrpack::model::ExportMetadata;
//! use vkrpack::validation::check_metadata;
//!
//! let meta = ExportMetadata {
//!     title: "Distributed storage engines".to_string(),
//!     author: "Ivan Petrov".to_string(),
//!     year: "abc".to_string(),
//!     ..Default::default()
//! };
//! let findings = check_metadata(&meta, 2025);
//! assert!(findings.has_errors());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::{ExportMetadata, UploadedFile};

/// Name fragments that mark a title page, used for the inventory check.
pub const TITLE_PAGE_KEYWORDS: &[&str] = &["titul", "титул", "title", "титулник"];

/// Name fragments accepted for the "title page first" ordering hint.
pub const TITLE_FIRST_KEYWORDS: &[&str] = &["titul", "титул", "title"];

/// Name fragments that mark an anti-plagiarism report.
pub const ANTIPLAGIARISM_KEYWORDS: &[&str] = &["plag", "antiplag", "антиплаг", "plagiarism"];

/// Earliest year that is not flagged as unusual.
pub const EARLIEST_PLAUSIBLE_YEAR: i64 = 2000;

/// Warnings and errors produced by one check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Findings {
    /// Advisory findings.
    pub warnings: Vec<String>,
    /// Blocking findings.
    pub errors: Vec<String>,
}

impl Findings {
    /// Whether any blocking finding was raised.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Append another check's findings, keeping insertion order.
    pub fn extend(&mut self, other: Findings) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Whether a lowercased name contains any of the keywords.
fn name_matches(name: &str, keywords: &[&str]) -> bool {
    let name = name.to_lowercase();
    keywords.iter().any(|keyword| name.contains(keyword))
}

/// Whether a file name looks like a title page.
pub fn looks_like_title_page(name: &str) -> bool {
    name_matches(name, TITLE_PAGE_KEYWORDS)
}

/// Check the uploaded set for the documents a complete bundle should contain.
///
/// Missing pieces only produce warnings. An empty set is the one blocking case.
pub fn check_inventory(files: &[UploadedFile]) -> Findings {
    let mut findings = Findings::default();

    if files.is_empty() {
        findings.error("No files uploaded");
        return findings;
    }

    let has_document = files.iter().any(|f| f.kind.is_document());
    let has_title_page = files.iter().any(|f| looks_like_title_page(&f.original_name));
    let has_antiplagiarism = files
        .iter()
        .any(|f| name_matches(&f.original_name, ANTIPLAGIARISM_KEYWORDS));

    if !has_document {
        findings.warn("No document file found (docx/pdf)");
    }

    if !has_title_page {
        findings.warn(
            "No title page detected (look for files with 'titul', 'титул', 'title' in name)",
        );
    }

    if !has_antiplagiarism {
        findings.warn(
            "No antiplagiarism report found (look for files with 'plag', 'antiplag' in name)",
        );
    }

    findings
}

/// Check required fields and style of the export metadata.
///
/// `current_year` bounds the plausible year range
/// `[EARLIEST_PLAUSIBLE_YEAR, current_year + 1]`.
pub fn check_metadata(metadata: &ExportMetadata, current_year: i64) -> Findings {
    let mut findings = Findings::default();

    let title = metadata.title.trim();
    let author = metadata.author.trim();
    let year = metadata.year.trim();

    if title.is_empty() {
        findings.error("Title is required");
    }

    if author.is_empty() {
        findings.error("Author is required");
    }

    if year.is_empty() {
        findings.error("Year is required");
    } else {
        match year.parse::<i64>() {
            Ok(year) => {
                let latest = current_year + 1;
                if year < EARLIEST_PLAUSIBLE_YEAR || year > latest {
                    findings.warn(format!(
                        "Year {year} seems unusual (expected {EARLIEST_PLAUSIBLE_YEAR}-{latest})"
                    ));
                }
            }
            Err(_) => findings.error("Year must be a valid number"),
        }
    }

    if is_all_caps(title) {
        findings.warn("Title is in all caps - consider using proper case");
    }

    if !author.is_empty() && author.split_whitespace().count() < 2 {
        findings.warn("Author name should include first and last name");
    }

    findings
}

/// True when the text has cased letters and all of them are uppercase.
fn is_all_caps(text: &str) -> bool {
    let mut cased = text.chars().filter(|c| c.is_lowercase() || c.is_uppercase());
    let mut any = false;
    let all_upper = cased.all(|c| {
        any = true;
        c.is_uppercase()
    });
    any && all_upper
}

/// Check the requested order against the uploaded set.
///
/// Every unknown id produces its own error; checking never stops at the
/// first one.
pub fn check_order(order: &[String], files: &[UploadedFile]) -> Findings {
    let mut findings = Findings::default();

    if order.is_empty() {
        findings.error("No file order specified");
        return findings;
    }

    let available: HashSet<&str> = files.iter().map(|f| f.id.as_str()).collect();

    for file_id in order {
        if !available.contains(file_id.as_str()) {
            findings.error(format!("File ID {file_id} not found in uploaded files"));
        }
    }

    let first = files.iter().find(|f| f.id == order[0]);
    if let Some(first) = first
        && !name_matches(&first.original_name, TITLE_FIRST_KEYWORDS)
    {
        findings.warn("Consider placing title page first in the order");
    }

    findings
}

/// Run all three checks and concatenate their findings.
///
/// Order of findings: inventory, then metadata, then ordering.
pub fn validate_request(
    files: &[UploadedFile],
    order: &[String],
    metadata: &ExportMetadata,
    current_year: i64,
) -> Findings {
    let mut findings = check_inventory(files);
    findings.extend(check_metadata(metadata, current_year));
    findings.extend(check_order(order, files));
    findings
}
