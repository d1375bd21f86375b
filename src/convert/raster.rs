//! Image to PDF conversion.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::path::Path;
use tracing::info;

use crate::error::ConversionError;
use crate::io::PdfWriter;

/// Resolution the image is laid out at.
pub const PRINT_DPI: f32 = 300.0;

const POINTS_PER_INCH: f32 = 72.0;

/// Convert a raster image to a single-page PDF at `output`.
///
/// The image is forced to 8-bit RGB and embedded as a Flate-compressed
/// `DeviceRGB` XObject. The page is sized so the image prints at
/// [`PRINT_DPI`]. Returns the size of the written PDF.
///
/// # Errors
///
/// Returns [`ConversionError::Image`] if the image cannot be decoded or the
/// PDF cannot be assembled, and [`ConversionError::Io`] if writing fails.
pub fn image_to_pdf(input: &Path, output: &Path) -> Result<u64, ConversionError> {
    let fail = |reason: String| ConversionError::image(input.to_path_buf(), reason);

    let decoded = ::image::open(input).map_err(|err| fail(err.to_string()))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut doc = rgb_page_document(width, height, rgb.into_raw()).map_err(|err| fail(err.to_string()))?;

    let size = PdfWriter::write(&mut doc, output)
        .map_err(|err| ConversionError::io(output.to_path_buf(), err))?;

    info!(
        input = %input.display(),
        output = %output.display(),
        width,
        height,
        "Image converted to PDF"
    );

    Ok(size)
}

/// Page dimensions in points for an image of `pixels` at [`PRINT_DPI`].
fn to_points(pixels: u32) -> f32 {
    pixels as f32 * POINTS_PER_INCH / PRINT_DPI
}

fn rgb_page_document(width: u32, height: u32, pixels: Vec<u8>) -> lopdf::Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        pixels,
    );
    image.compress()?;
    let image_id = doc.add_object(image);

    let (page_width, page_height) = (to_points(width), to_points(height));
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    page_width.into(),
                    0.into(),
                    0.into(),
                    page_height.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), page_width.into(), page_height.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}
