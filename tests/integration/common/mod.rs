//! Shared helpers for the integration tests.
//!
//! Every test works in its own temp directory: input files are generated on
//! the fly (PDFs with `lopdf`, images with `image`, DOCX archives with `zip`)
//! and uploaded through the file-system session store.

#![allow(dead_code)]

use async_trait::async_trait;
use lopdf::{Document, Object, Stream, dictionary};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

use vkrpack::config::Config;
use vkrpack::convert::{Converter, DocxConverter, DocxStrategy, StrategyFailure};
use vkrpack::export::ExportPipeline;
use vkrpack::model::{ExportMetadata, ExportRequest, UploadSession};
use vkrpack::store::{FsExportStore, FsSessionStore};

/// Page dictionary key identifying where a page came from.
const MARKER_KEY: &[u8] = b"VkrMarker";

/// Write a PDF whose pages carry `<marker>-<n>` markers.
pub fn write_marked_pdf(path: &Path, marker: &str, pages: usize) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..pages)
        .map(|n| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET".to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Contents" => content_id,
                "VkrMarker" => Object::string_literal(format!("{marker}-{n}")),
            });
            page_id.into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut file = std::fs::File::create(path).unwrap();
    doc.save_to(&mut file).unwrap();
    file.flush().unwrap();
}

/// Markers of every page in `path`, in page order. Unmarked pages yield
/// an empty string.
pub fn page_markers(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| {
            doc.get_dictionary(id)
                .ok()
                .and_then(|page| page.get(MARKER_KEY).ok())
                .and_then(|marker| marker.as_str().ok())
                .map(|marker| String::from_utf8_lossy(marker).into_owned())
                .unwrap_or_default()
        })
        .collect()
}

pub fn page_count(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}

/// Write a solid RGB JPEG.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_pixel(width, height, image::Rgb([20, 120, 200]))
        .save(path)
        .unwrap();
}

/// Write a minimal DOCX archive holding the given paragraphs.
pub fn write_docx(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}</w:body></w:document>"
    );

    let mut zip = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
    let options: zip::write::FileOptions<'_, ()> = zip::write::FileOptions::default();
    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.finish().unwrap();
}

/// Complete metadata that passes validation without warnings.
pub fn metadata() -> ExportMetadata {
    ExportMetadata {
        title: "Consensus protocols in practice".to_string(),
        author: "Ivan Petrov".to_string(),
        year: "2024".to_string(),
        ..ExportMetadata::default()
    }
}

/// What a [`ScriptedStrategy`] does when asked to convert.
#[derive(Clone, Copy)]
pub enum Script {
    /// Fail without producing anything.
    Fail,
    /// Write a one-page PDF marked with the input's original file stem.
    Succeed,
    /// Sleep, then succeed.
    SlowSucceed(Duration),
}

/// A DOCX strategy that counts its invocations.
pub struct ScriptedStrategy {
    name: &'static str,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ScriptedStrategy {
    pub fn new(name: &'static str, script: Script) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                name,
                script,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl DocxStrategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn convert(&self, input: &Path, output: &Path) -> Result<(), StrategyFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        // Uploaded files are stored as `<file id>_<original name>`
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let marker = stem.split_once('_').map_or(stem.as_str(), |(_, name)| name).to_string();
        match self.script {
            Script::Fail => Err(StrategyFailure::Render(format!("{} refused", self.name))),
            Script::Succeed => {
                write_marked_pdf(output, &marker, 1);
                Ok(())
            }
            Script::SlowSucceed(delay) => {
                tokio::time::sleep(delay).await;
                write_marked_pdf(output, &marker, 1);
                Ok(())
            }
        }
    }
}

/// Invocation counters of a scripted converter.
pub struct Calls {
    pub primary: Arc<AtomicUsize>,
    pub fallback: Arc<AtomicUsize>,
}

impl Calls {
    pub fn primary(&self) -> usize {
        self.primary.load(Ordering::SeqCst)
    }

    pub fn fallback(&self) -> usize {
        self.fallback.load(Ordering::SeqCst)
    }
}

/// A converter whose DOCX strategies follow the given scripts.
pub fn scripted_converter(primary: Script, fallback: Script) -> (Converter, Calls) {
    let (primary, primary_calls) = ScriptedStrategy::new("office", primary);
    let (fallback, fallback_calls) = ScriptedStrategy::new("text", fallback);
    (
        Converter::new(DocxConverter::new(Box::new(primary), Box::new(fallback))),
        Calls {
            primary: primary_calls,
            fallback: fallback_calls,
        },
    )
}

/// A scratch data directory with file-system stores.
pub struct TestEnv {
    pub dir: TempDir,
    pub config: Config,
    pub sessions: Arc<FsSessionStore>,
    pub exports: Arc<FsExportStore>,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_data_root(dir.path().join("data"));
        Self {
            sessions: Arc::new(FsSessionStore::from_config(&config)),
            exports: Arc::new(FsExportStore::from_config(&config)),
            config,
            dir,
        }
    }

    /// Directory where input files are generated before upload.
    pub fn inbox(&self) -> PathBuf {
        let inbox = self.dir.path().join("inbox");
        std::fs::create_dir_all(&inbox).unwrap();
        inbox
    }

    /// Generate inputs by name and upload them as one session.
    ///
    /// `.pdf` files get a one-page PDF marked with the file stem, `.docx`
    /// files one paragraph, images a small JPEG; anything else plain text.
    pub async fn upload(&self, names: &[&str]) -> UploadSession {
        let inbox = self.inbox();
        let paths: Vec<PathBuf> = names
            .iter()
            .map(|name| {
                let path = inbox.join(name);
                let stem = path.file_stem().unwrap().to_string_lossy().into_owned();
                match path.extension().and_then(|e| e.to_str()) {
                    Some("pdf") => write_marked_pdf(&path, &stem, 1),
                    Some("docx") => write_docx(&path, &[&format!("Text of {stem}")]),
                    Some("jpg") => write_jpeg(&path, 60, 90),
                    _ => std::fs::write(&path, b"plain text").unwrap(),
                }
                path
            })
            .collect();

        self.sessions.create(&paths).await.unwrap()
    }

    pub fn pipeline(&self, converter: Converter) -> ExportPipeline {
        ExportPipeline::new(
            self.sessions.clone(),
            self.exports.clone(),
            converter,
            &self.config.export_root,
        )
    }

    /// Names of everything in the export root.
    pub fn export_root_entries(&self) -> Vec<String> {
        match std::fs::read_dir(&self.config.export_root) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Ids of the session's files named `names`, in the order given.
pub fn ids(session: &UploadSession, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|name| {
            session
                .files
                .iter()
                .find(|f| f.original_name == *name)
                .map(|f| f.id.clone())
                .unwrap_or_else(|| panic!("no uploaded file named {name}"))
        })
        .collect()
}

pub fn request(session: &UploadSession, order: Vec<String>) -> ExportRequest {
    ExportRequest {
        session_id: session.session_id.clone(),
        order,
        metadata: metadata(),
    }
}
