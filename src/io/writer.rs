use lopdf::Document;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Serializes PDF documents to disk.
pub struct PdfWriter;

impl PdfWriter {
    /// Write the given [`Document`] to `path` and return the written size.
    ///
    /// Missing parent directories are created. The document is first written
    /// to a sibling temp file and then renamed into place, so readers never
    /// observe a half-written PDF.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    ///
    /// * The parent directories cannot be created.
    /// * The temp file cannot be created, written or flushed.
    /// * The rename into place fails.
    pub fn write<P: AsRef<Path>>(doc: &mut Document, path: P) -> io::Result<u64> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = Self::temp_path(path);
        let result = Self::write_unchecked(doc, &tmp_path)
            .and_then(|()| std::fs::rename(&tmp_path, path));

        if result.is_err() {
            let _ = std::fs::remove_file(&tmp_path);
        }
        result?;

        Ok(std::fs::metadata(path)?.len())
    }

    fn write_unchecked(doc: &mut Document, path: &Path) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);

        doc.save_to(&mut writer)
            .map_err(|err| io::Error::other(err.to_string()))?;

        writer.flush()
    }

    /// Sibling path used while a document is being written.
    pub fn temp_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        path.with_file_name(name)
    }
}
