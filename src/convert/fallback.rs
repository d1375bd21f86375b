//! In-process DOCX rendering used when the office suite is unavailable.
//!
//! Only the text of `word/document.xml` survives: paragraphs, tabs and line
//! breaks. Styling, tables and embedded media are dropped. Text is
//! transliterated to ASCII so it can be set in the standard Helvetica font
//! without embedding anything.

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::{DocxStrategy, StrategyFailure};
use crate::io::PdfWriter;

const DOCUMENT_PART: &str = "word/document.xml";

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 56;
const FONT_SIZE: i64 = 11;
const LEADING: i64 = 14;
const LINE_WIDTH: usize = 88;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

/// Renders the plain text of a DOCX file into a paginated PDF.
pub struct TextFallbackConverter {
    timeout: Duration,
}

impl TextFallbackConverter {
    /// Create a renderer that gives up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl DocxStrategy for TextFallbackConverter {
    fn name(&self) -> &'static str {
        "text"
    }

    async fn convert(&self, input: &Path, output: &Path) -> Result<(), StrategyFailure> {
        // Set on timeout, and also when this future is dropped mid-flight
        let cancel = CancelOnDrop(Arc::new(AtomicBool::new(false)));
        let mut task = {
            let (input, output) = (input.to_path_buf(), output.to_path_buf());
            let cancelled = Arc::clone(&cancel.0);
            tokio::task::spawn_blocking(move || render(&input, &output, &cancelled))
        };

        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => joined.map_err(|err| StrategyFailure::Render(err.to_string()))?,
            Err(_) => {
                cancel.0.store(true, Ordering::Relaxed);
                // The renderer stops at its next check; after that nothing touches `output`
                if let Ok(Ok(())) = task.await {
                    warn!(output = %output.display(), "Renderer finished after its deadline");
                    let _ = tokio::fs::remove_file(output).await;
                }
                Err(StrategyFailure::TimedOut(self.timeout))
            }
        }
    }
}

/// Tells the blocking renderer to stop once nobody waits for it.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

fn cancelled_error() -> StrategyFailure {
    StrategyFailure::Render("cancelled".to_string())
}

fn render(input: &Path, output: &Path, cancelled: &AtomicBool) -> Result<(), StrategyFailure> {
    let xml = read_document_xml(input)?;
    let paragraphs = extract_paragraphs(&xml, cancelled)?;
    let lines: Vec<String> = paragraphs.iter().flat_map(|p| wrap(p, LINE_WIDTH)).collect();

    debug!(
        input = %input.display(),
        paragraphs = paragraphs.len(),
        lines = lines.len(),
        "Rendering DOCX text"
    );

    let mut doc = text_document(&lines, cancelled)?;

    if cancelled.load(Ordering::Relaxed) {
        return Err(cancelled_error());
    }
    PdfWriter::write(&mut doc, output)?;
    Ok(())
}

fn read_document_xml(input: &Path) -> Result<String, StrategyFailure> {
    let file = std::fs::File::open(input)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|err| StrategyFailure::Render(format!("not a DOCX archive: {err}")))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|err| StrategyFailure::Render(format!("{DOCUMENT_PART}: {err}")))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Pull paragraph text out of WordprocessingML.
///
/// Elements are matched by local name, so any namespace prefix works. Text
/// is taken only from `t` runs; `tab` becomes a space (tab stop definitions
/// under `tabs` are ignored) and `br`/`cr` start a new paragraph.
///
/// A document without a single paragraph element is rejected rather than
/// rendered as a blank page.
fn extract_paragraphs(xml: &str, cancelled: &AtomicBool) -> Result<Vec<String>, StrategyFailure> {
    let malformed =
        |err: quick_xml::Error| StrategyFailure::Render(format!("malformed {DOCUMENT_PART}: {err}"));

    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut in_tab_stops = false;
    let mut saw_paragraph = false;

    loop {
        if cancelled.load(Ordering::Relaxed) {
            return Err(cancelled_error());
        }

        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => saw_paragraph = true,
                b"t" => in_text = true,
                b"tabs" => in_tab_stops = true,
                b"tab" if !in_tab_stops => current.push(' '),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" => {
                    saw_paragraph = true;
                    paragraphs.push(std::mem::take(&mut current));
                }
                b"tab" if !in_tab_stops => current.push(' '),
                b"br" | b"cr" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                b"tabs" => in_tab_stops = false,
                _ => {}
            },
            Event::Text(e) if in_text => current.push_str(&e.unescape().map_err(malformed)?),
            Event::CData(e) if in_text => current.push_str(&String::from_utf8_lossy(&e)),
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_paragraph {
        return Err(StrategyFailure::Render(format!(
            "{DOCUMENT_PART} contains no paragraphs"
        )));
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    Ok(paragraphs
        .into_iter()
        .map(|p| deunicode::deunicode(&p).trim_end().to_string())
        .collect())
}

/// Greedy word wrap. An empty paragraph yields one blank line.
fn wrap(paragraph: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in paragraph.split_whitespace() {
        let mut word = word;
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let (head, tail) = word.split_at(width);
            lines.push(head.to_string());
            word = tail;
        }
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }

    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

fn text_document(lines: &[String], cancelled: &AtomicBool) -> Result<Document, StrategyFailure> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut chunks: Vec<&[String]> = lines.chunks(LINES_PER_PAGE).collect();
    if chunks.is_empty() {
        chunks.push(&[]);
    }

    let mut kids = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if cancelled.load(Ordering::Relaxed) {
            return Err(cancelled_error());
        }

        let content = page_content(chunk)
            .encode()
            .map_err(|err| StrategyFailure::Render(err.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    Ok(doc)
}

fn page_content(lines: &[String]) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
        Operation::new("TL", vec![LEADING.into()]),
        Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN).into()]),
    ];
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}
