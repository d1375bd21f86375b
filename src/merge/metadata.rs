//! Info dictionary of the merged document.

use chrono::{DateTime, Utc};
use lopdf::{Dictionary, Document, Object, StringFormat};

use crate::model::ExportMetadata;

const PRODUCER: &str = concat!("vkrpack ", env!("CARGO_PKG_VERSION"));

/// Write title, author and timestamps from `meta` into the document's
/// Info dictionary, replacing any Info the base document carried.
pub fn apply(doc: &mut Document, meta: &ExportMetadata) {
    let mut info = Dictionary::new();

    if !meta.title.trim().is_empty() {
        info.set("Title", text_string(meta.title.trim()));
    }
    if !meta.author.trim().is_empty() {
        info.set("Author", text_string(meta.author.trim()));
    }
    if let Some(subject) = subject(meta) {
        info.set("Subject", text_string(&subject));
    }
    info.set("Creator", text_string("vkrpack"));
    info.set("Producer", text_string(PRODUCER));

    let now = pdf_date(Utc::now());
    info.set("CreationDate", Object::string_literal(now.clone()));
    info.set("ModDate", Object::string_literal(now));

    let info_id = doc.add_object(info);
    doc.trailer.set("Info", info_id);
}

/// Supervisor, faculty and year joined for the Subject entry.
fn subject(meta: &ExportMetadata) -> Option<String> {
    let parts: Vec<&str> = [
        meta.supervisor.as_deref(),
        meta.faculty.as_deref(),
        Some(meta.year.as_str()),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .collect();

    (!parts.is_empty()).then(|| parts.join(", "))
}

/// Encode a PDF text string: plain bytes for ASCII, UTF-16BE with a byte
/// order mark otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }

    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// PDF date format: `D:YYYYMMDDHHmmSSZ`.
fn pdf_date(time: DateTime<Utc>) -> String {
    time.format("D:%Y%m%d%H%M%SZ").to_string()
}
