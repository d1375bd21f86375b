//! Fixtures shared by unit tests.

use lopdf::{Document, Object, Stream, dictionary};
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;

/// Page dictionary key carrying a test marker.
pub const MARKER_KEY: &[u8] = b"VkrMarker";

/// Build a document whose pages carry `<marker>-<n>` in [`MARKER_KEY`].
pub fn marked_document(marker: &str, pages: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for n in 0..pages {
        let content = Stream::new(dictionary! {}, b"BT ET".to_vec());
        let content_id = doc.add_object(content);
        let page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Contents" => content_id,
            "VkrMarker" => Object::string_literal(format!("{marker}-{n}")),
        };
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => pages as i64,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Write a marked document to `path`.
pub fn write_marked_pdf(path: &Path, marker: &str, pages: usize) {
    let mut doc = marked_document(marker, pages);
    let mut file = std::fs::File::create(path).unwrap();
    doc.save_to(&mut file).unwrap();
    file.flush().unwrap();
}

/// Markers of every page in `path`, in page order.
pub fn page_markers(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| {
            let page = doc.get_object(id).and_then(Object::as_dict).unwrap();
            let marker = page.get(MARKER_KEY).and_then(Object::as_str).unwrap();
            String::from_utf8_lossy(marker).into_owned()
        })
        .collect()
}

/// Write a solid-colour RGBA PNG.
pub fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 30, 128]))
        .save(path)
        .unwrap();
}

/// Write a minimal DOCX whose body holds the given paragraphs.
pub fn write_docx(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"))
        .collect();
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}</w:body></w:document>"
    );

    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options: FileOptions<'_, ()> = FileOptions::default();
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.finish().unwrap();
}
