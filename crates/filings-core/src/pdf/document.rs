//! PDF loading, page images and embedded text using lopdf and pdf-extract.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Document, Object, ObjectId, Stream};
use tracing::{debug, trace};

use super::{PdfProcessor, Result};
use crate::error::{DocumentError, PdfError};

/// Page tree nesting deeper than this is treated as broken.
const MAX_TREE_DEPTH: usize = 32;

const POINTS_PER_INCH: f64 = 72.0;

/// Upper bound on rendered page pixels. A letter page at 600 dpi is about
/// 34 million.
const MAX_RENDER_PIXELS: f64 = 100_000_000.0;

/// A loaded PDF document.
pub struct PdfDocument {
    document: Document,
    raw_data: Vec<u8>,
}

impl PdfDocument {
    /// Open a PDF from disk. Failures here are document-level.
    pub fn open(path: &Path) -> std::result::Result<Self, DocumentError> {
        if !path.exists() {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }

        let unreadable = |reason: String| DocumentError::Unreadable {
            path: path.to_path_buf(),
            reason,
        };

        let data = std::fs::read(path).map_err(|e| unreadable(e.to_string()))?;
        Self::from_bytes(&data).map_err(|e| unreadable(e.to_string()))
    }

    /// Load a PDF from bytes, decrypting it when it only has an empty user password.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract reads the bytes, so keep the decrypted form.
            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self { document, raw_data })
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    /// Image XObject streams referenced from a page's resources.
    fn page_image_streams(&self, page_id: ObjectId) -> Vec<&Stream> {
        let doc = &self.document;
        let Some(Object::Dictionary(resources)) = inherited_attribute(doc, page_id, b"Resources") else {
            return Vec::new();
        };
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Vec::new();
        };
        let Ok((_, Object::Dictionary(xobjects))) = doc.dereference(xobjects) else {
            return Vec::new();
        };

        xobjects
            .iter()
            .filter_map(|(_, obj)| match doc.dereference(obj) {
                Ok((_, Object::Stream(stream))) if is_image(stream) => Some(stream),
                _ => None,
            })
            .collect()
    }

    /// Page size in points, from the (possibly inherited) MediaBox.
    fn page_size(&self, page_id: ObjectId) -> Option<(f32, f32)> {
        let Object::Array(bounds) = inherited_attribute(&self.document, page_id, b"MediaBox")? else {
            return None;
        };
        let numbers: Vec<f32> = bounds
            .iter()
            .filter_map(|obj| match self.document.dereference(obj) {
                Ok((_, value)) => number(value),
                Err(_) => None,
            })
            .collect();
        match numbers.as_slice() {
            [x1, y1, x2, y2] => Some(((x2 - x1).abs(), (y2 - y1).abs())),
            _ => None,
        }
    }
}

impl PdfProcessor for PdfDocument {
    fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    fn has_images(&self) -> bool {
        self.document
            .get_pages()
            .values()
            .any(|id| !self.page_image_streams(*id).is_empty())
    }

    fn embedded_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Rasterize a page by taking its largest image and scaling it to the
    /// page size at `dpi`. Scanned filings are one image per page, which is
    /// all this handles.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        let page_id = self.page_id(page)?;

        let image = self
            .page_image_streams(page_id)
            .into_iter()
            .filter_map(|stream| decode_image(&self.document, stream))
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or(PdfError::NoPageImage(page))?;

        let Some((width_pt, height_pt)) = self.page_size(page_id) else {
            trace!("Page {} has no MediaBox, using native image size", page);
            return Ok(image);
        };

        let scale = f64::from(dpi) / POINTS_PER_INCH;
        let width_px = (f64::from(width_pt) * scale).round().max(1.0);
        let height_px = (f64::from(height_pt) * scale).round().max(1.0);
        if width_px * height_px > MAX_RENDER_PIXELS {
            return Err(PdfError::PageTooLarge {
                page,
                width: width_px as u64,
                height: height_px as u64,
            });
        }
        let (target_w, target_h) = (width_px as u32, height_px as u32);

        if (target_w, target_h) == (image.width(), image.height()) {
            return Ok(image);
        }

        debug!(
            "Page {}: scaling {}x{} image to {}x{} at {} dpi",
            page,
            image.width(),
            image.height(),
            target_w,
            target_h,
            dpi
        );
        Ok(image.resize_exact(target_w, target_h, FilterType::Triangle))
    }
}

/// Look up a page attribute, following the Parent chain for inherited keys.
fn inherited_attribute<'d>(doc: &'d Document, page_id: ObjectId, key: &[u8]) -> Option<&'d Object> {
    let mut node = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return doc.dereference(value).ok().map(|(_, obj)| obj);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_object(parent).ok()?.as_dict().ok()?;
    }
    None
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn is_image(stream: &Stream) -> bool {
    matches!(
        stream.dict.get(b"Subtype").and_then(Object::as_name),
        Ok(name) if name == b"Image"
    )
}

fn filter_name(stream: &Stream) -> Option<&[u8]> {
    match stream.dict.get(b"Filter").ok()? {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(filters) => filters.last().and_then(|o| o.as_name().ok()),
        _ => None,
    }
}

fn decode_image(doc: &Document, stream: &Stream) -> Option<DynamicImage> {
    let dict = &stream.dict;
    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;

    match filter_name(stream) {
        Some(b"DCTDecode") => {
            trace!("Decoding JPEG page image {}x{}", width, height);
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg).ok();
        }
        Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            trace!("Unsupported image filter on {}x{} image", width, height);
            return None;
        }
        _ => {}
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        trace!("Unsupported bits per component: {}", bits);
        return None;
    }

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match doc.dereference(o) {
            Ok((_, Object::Name(name))) => Some(name.as_slice()),
            Ok((_, Object::Array(arr))) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    let pixels = width as usize * height as usize;

    match color_space {
        b"DeviceGray" | b"G" | b"CalGray" => {
            let bytes = data.get(..pixels)?.to_vec();
            GrayImage::from_raw(width, height, bytes).map(DynamicImage::ImageLuma8)
        }
        b"DeviceRGB" | b"RGB" | b"CalRGB" => {
            let bytes = data.get(..pixels * 3)?.to_vec();
            RgbImage::from_raw(width, height, bytes).map(DynamicImage::ImageRgb8)
        }
        other => {
            trace!("Unsupported color space {:?}", String::from_utf8_lossy(other));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// A one-page PDF holding a single gray image, MediaBox on the page tree root.
    fn scanned_pdf(width: i64, height: i64, media_pt: i64) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let pixels = vec![200u8; (width * height) as usize];
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            pixels,
        ));
        let resources_id = doc.add_object(dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(media_pt),
                Object::Integer(media_pt),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_render_page_scales_to_dpi() {
        let pdf = PdfDocument::from_bytes(&scanned_pdf(50, 50, 72)).unwrap();

        assert_eq!(pdf.page_count(), 1);
        assert!(pdf.has_images());

        let image = pdf.render_page(1, 100).unwrap();
        assert_eq!((image.width(), image.height()), (100, 100));
    }

    #[test]
    fn test_render_page_keeps_native_size_when_matching() {
        let pdf = PdfDocument::from_bytes(&scanned_pdf(144, 144, 72)).unwrap();
        let image = pdf.render_page(1, 144).unwrap();
        assert_eq!((image.width(), image.height()), (144, 144));
    }

    #[test]
    fn test_oversized_media_box_is_rejected() {
        // 14.4M points square at 300 dpi would need a 60 million pixel wide canvas.
        let pdf = PdfDocument::from_bytes(&scanned_pdf(10, 10, 14_400_000)).unwrap();

        match pdf.render_page(1, 300) {
            Err(PdfError::PageTooLarge { page, width, height }) => {
                assert_eq!(page, 1);
                assert_eq!((width, height), (60_000_000, 60_000_000));
            }
            other => panic!("expected PageTooLarge, got {:?}", other.map(|i| (i.width(), i.height()))),
        }
    }

    #[test]
    fn test_invalid_page() {
        let pdf = PdfDocument::from_bytes(&scanned_pdf(10, 10, 72)).unwrap();
        assert!(matches!(pdf.render_page(2, 300), Err(PdfError::InvalidPage(2))));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(
            PdfDocument::from_bytes(b"definitely not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = PdfDocument::open(&dir.path().join("missing.pdf"));
        assert!(matches!(result, Err(DocumentError::NotFound(_))));
    }
}
