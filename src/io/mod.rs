//! PDF reading and writing.
//!
//! - [`PdfReader`] loads a PDF and classifies why a file is unusable
//! - [`PdfWriter`] serializes documents atomically, creating directories as needed

mod reader;
mod writer;

pub use reader::{LoadedPdf, PdfReader, ReadIssue};
pub use writer::PdfWriter;
