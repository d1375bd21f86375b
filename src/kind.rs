//! File kind classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The classified type of an uploaded file.
///
/// Classification looks only at the lowercased extension. Unrecognised
/// extensions become [`FileKind::Unknown`] instead of failing; such files are
/// accepted at upload time and rejected when an export tries to convert them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Already a PDF, merged as-is.
    Pdf,
    /// Word document, converted through the office/fallback chain.
    Docx,
    /// JPEG or PNG raster image.
    Image,
    /// Anything else.
    Unknown,
}

impl FileKind {
    /// Classify a file by its name.
    ///
    /// # Examples
    ///
    /// ```
    /// use vkrpack::kind::FileKind;
    ///
    /// assert_eq!(FileKind::from_name("Thesis.DOCX"), FileKind::Docx);
    /// assert_eq!(FileKind::from_name("scan.jpeg"), FileKind::Image);
    /// assert_eq!(FileKind::from_name("notes.txt"), FileKind::Unknown);
    /// ```
    pub fn from_name(name: impl AsRef<Path>) -> Self {
        let extension = name
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("pdf") => Self::Pdf,
            Some("docx") => Self::Docx,
            Some("jpg" | "jpeg" | "png") => Self::Image,
            _ => Self::Unknown,
        }
    }

    /// Whether this kind counts as a document (as opposed to a scan or attachment).
    pub fn is_document(&self) -> bool {
        matches!(self, Self::Pdf | Self::Docx)
    }

    /// Lowercase name used in indexes and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Image => "image",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
