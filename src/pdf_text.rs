// src/pdf_text.rs

use lopdf::{Dictionary, Document, Object};
use tracing::{info, warn};

/// What came out of trying to read a remittance PDF.
#[derive(Debug)]
pub enum PdfContent {
    /// A text layer was present; this is the blob the claim scanner takes.
    Text(String),
    /// Image-only pages — the report was scanned and we do no OCR.
    ScannedImage,
    /// The bytes could not be parsed as a PDF at all.
    Error(String),
}

/// Anything below this many non-whitespace characters is not a real
/// remittance text layer.
const MIN_TEXT_CHARS: usize = 30;

/// Fraction of image-only pages at which the whole document counts
/// as scanned.
const SCANNED_PAGE_RATIO: f64 = 0.8;

/// Classify a PDF and pull its text layer.
pub fn extract_text(pdf_bytes: &[u8]) -> PdfContent {
    let doc = match Document::load_mem(pdf_bytes) {
        Ok(d) => d,
        Err(e) => return PdfContent::Error(format!("Failed to parse PDF: {e}")),
    };

    if looks_like_scanned(&doc) {
        info!("structural check: image-only pages, treating as scanned");
        return PdfContent::ScannedImage;
    }

    match pdf_extract::extract_text_from_mem(pdf_bytes) {
        Ok(text) => {
            let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
            if meaningful < MIN_TEXT_CHARS {
                info!(chars = meaningful, "text layer too thin, treating as scanned");
                PdfContent::ScannedImage
            } else {
                info!(chars = meaningful, "text layer extracted");
                PdfContent::Text(text)
            }
        }
        Err(e) => {
            warn!(error = %e, "text extraction failed, treating as scanned");
            PdfContent::ScannedImage
        }
    }
}

/// A page with image XObjects but no Font resources is almost certainly a
/// scan. If enough pages look like that, the whole document does.
fn looks_like_scanned(doc: &Document) -> bool {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return false;
    }

    let image_only = pages
        .values()
        .filter(|object_id| {
            let Some(page) = doc
                .get_object(**object_id)
                .ok()
                .and_then(|obj| obj.as_dict().ok())
            else {
                return false;
            };
            let has_fonts = resource_entry(doc, page, b"Font").is_some_and(|d| !d.is_empty());
            let has_images = resource_entry(doc, page, b"XObject").is_some_and(|d| !d.is_empty());
            has_images && !has_fonts
        })
        .count();

    let ratio = image_only as f64 / pages.len() as f64;
    info!(
        total_pages = pages.len(),
        image_only,
        ratio = format!("{ratio:.2}"),
        "scanned-page analysis"
    );
    ratio >= SCANNED_PAGE_RATIO
}

/// Resolve `Resources[key]` on a page dictionary, following indirect refs.
fn resource_entry<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    let resolve = |obj: &'a Object| -> Option<&'a Dictionary> {
        doc.dereference(obj).ok().and_then(|(_, o)| o.as_dict().ok())
    };
    let resources = resolve(page.get(b"Resources").ok()?)?;
    resolve(resources.get(key).ok()?)
}
