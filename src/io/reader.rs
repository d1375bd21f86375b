use lopdf::Document;
use std::fmt;
use std::path::{Path, PathBuf};

/// A loaded PDF document with its page count.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,
}

/// Why a file could not be used as a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadIssue {
    /// Nothing exists at the path.
    Missing,
    /// The path exists but is a directory.
    NotAFile,
    /// The file could not be parsed.
    Unreadable(String),
    /// The document parsed but has no pages.
    NoPages,
}

impl fmt::Display for ReadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "file does not exist"),
            Self::NotAFile => write!(f, "not a file"),
            Self::Unreadable(reason) => write!(f, "unreadable PDF: {reason}"),
            Self::NoPages => write!(f, "PDF has no pages"),
        }
    }
}

/// Loads PDFs from disk.
pub struct PdfReader;

impl PdfReader {
    /// Load a PDF and make sure it has at least one page.
    ///
    /// # Errors
    ///
    /// Returns a [`ReadIssue`] describing why the file is unusable.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<LoadedPdf, ReadIssue> {
        let path = path.as_ref();
        Self::check_path_exists(path)?;

        let document =
            Document::load(path).map_err(|err| ReadIssue::Unreadable(err.to_string()))?;

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(ReadIssue::NoPages);
        }

        Ok(LoadedPdf {
            document,
            path: path.to_path_buf(),
            page_count,
        })
    }

    /// Page count of a PDF, or zero when it cannot be read.
    pub fn page_count<P: AsRef<Path>>(path: P) -> usize {
        Self::read(path).map(|loaded| loaded.page_count).unwrap_or(0)
    }

    /// Check that a path exists and is a regular file.
    pub fn check_path_exists<P: AsRef<Path>>(path: P) -> Result<(), ReadIssue> {
        let path = path.as_ref();
        match path.try_exists() {
            Ok(true) => {}
            Ok(false) => return Err(ReadIssue::Missing),
            Err(err) => return Err(ReadIssue::Unreadable(err.to_string())),
        }

        if path.is_dir() {
            return Err(ReadIssue::NotAFile);
        }

        Ok(())
    }
}
