//! Document loading for bills supplied as PDFs or raster images.
//!
//! Bills arrive in two shapes: text PDFs exported by DISCOM portals and
//! scans or photos. Text PDFs short-circuit straight to their embedded
//! text; everything else yields raster pages for OCR. Image PDFs are
//! handled by pulling the embedded image objects out of the file rather
//! than rendering pages, which covers the usual one-scan-per-page case
//! without a renderer dependency.

pub mod preprocess;
pub mod text;

pub use preprocess::{clean_page, encode_png};
pub use text::clean_ocr_text;

use std::path::Path;

use image::DynamicImage;
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace};

use crate::Result;
use crate::error::InputError;

/// A loaded bill document, ready for the pipeline.
#[derive(Debug)]
pub enum LoadedDocument {
    /// Embedded text was good enough; OCR is not needed.
    Text(String),

    /// Raster pages that need OCR, first page first.
    Pages(Vec<DynamicImage>),
}

/// File extensions accepted by [`load_document`].
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["pdf", "jpg", "jpeg", "png"];

/// Whether a path looks like a loadable bill document.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Load a bill document from disk.
///
/// PDFs with at least `min_text_length` characters of embedded text
/// short-circuit to [`LoadedDocument::Text`] when `prefer_embedded_text`
/// is set; everything else comes back as raster pages.
pub fn load_document(
    path: &Path,
    prefer_embedded_text: bool,
    min_text_length: usize,
) -> Result<LoadedDocument> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()).into());
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => load_pdf(path, prefer_embedded_text, min_text_length),
        "jpg" | "jpeg" | "png" => load_image(path),
        other => Err(InputError::UnsupportedFormat(other.to_string()).into()),
    }
}

fn load_image(path: &Path) -> Result<LoadedDocument> {
    let image = image::open(path)
        .map_err(|e| InputError::ImageDecode(format!("{}: {e}", path.display())))?;
    debug!(
        width = image.width(),
        height = image.height(),
        "loaded image document"
    );
    Ok(LoadedDocument::Pages(vec![image]))
}

fn load_pdf(
    path: &Path,
    prefer_embedded_text: bool,
    min_text_length: usize,
) -> Result<LoadedDocument> {
    let data = std::fs::read(path)?;
    let mut doc = Document::load_mem(&data).map_err(|e| InputError::PdfParse(e.to_string()))?;

    // Portal PDFs are sometimes "protected" with an empty owner password.
    let data = if doc.is_encrypted() {
        if doc.decrypt("").is_err() {
            return Err(InputError::Encrypted.into());
        }
        debug!("decrypted PDF with empty password");
        let mut decrypted = Vec::new();
        doc.save_to(&mut decrypted)
            .map_err(|e| InputError::PdfParse(e.to_string()))?;
        decrypted
    } else {
        data
    };

    if doc.get_pages().is_empty() {
        return Err(InputError::EmptyDocument.into());
    }

    if prefer_embedded_text {
        if let Some(text) = embedded_text(&data, min_text_length) {
            debug!(chars = text.len(), "using embedded PDF text");
            return Ok(LoadedDocument::Text(text));
        }
    }

    let pages = embedded_images(&doc);
    if pages.is_empty() {
        return Err(InputError::EmptyDocument.into());
    }
    debug!(pages = pages.len(), "using embedded PDF images");
    Ok(LoadedDocument::Pages(pages))
}

/// Embedded text, when there is enough of it to skip OCR.
fn embedded_text(data: &[u8], min_text_length: usize) -> Option<String> {
    match pdf_extract::extract_text_from_mem(data) {
        Ok(text) if text.trim().len() >= min_text_length => Some(text),
        Ok(text) => {
            trace!(chars = text.trim().len(), "embedded text below threshold");
            None
        }
        Err(error) => {
            debug!(%error, "embedded text extraction failed");
            None
        }
    }
}

/// Image XObjects reachable from the first page, with a whole-document
/// scan as fallback for PDFs that hide the raster elsewhere.
fn embedded_images(doc: &Document) -> Vec<DynamicImage> {
    let mut images = Vec::new();

    if let Some(page_id) = doc.get_pages().get(&1).copied() {
        if let Some(resources) = page_resources(doc, page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobjects))) = doc.dereference(xobjects) {
                    for (_name, reference) in xobjects.iter() {
                        if let Ok((_, object)) = doc.dereference(reference) {
                            if let Some(image) = image_from_object(doc, object) {
                                images.push(image);
                            }
                        }
                    }
                }
            }
        }
    }

    if images.is_empty() {
        trace!("no first-page XObject images, scanning all objects");
        for (_id, object) in doc.objects.iter() {
            if let Some(image) = image_from_object(doc, object) {
                images.push(image);
            }
        }
    }

    images
}

/// Resources dictionary for a page, walking up the page tree for
/// inherited entries.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<lopdf::Dictionary> {
    let mut node_id = page_id;
    loop {
        let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
            return None;
        };
        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(resources))) = doc.dereference(resources) {
                return Some(resources.clone());
            }
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => node_id = *parent,
            _ => return None,
        }
    }
}

/// Decode one image XObject, if it uses a codec we can handle.
fn image_from_object(doc: &Document, object: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = object else {
        return None;
    };
    let dict = &stream.dict;
    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!(width, height, "found image object");

    if let Ok(filter) = dict.get(b"Filter") {
        let name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(filters) => filters.first().and_then(|f| f.as_name().ok()),
            _ => None,
        };
        match name {
            Some(b"DCTDecode") => {
                // JPEG scan data is stored as-is in the stream.
                return image::load_from_memory_with_format(
                    &stream.content,
                    image::ImageFormat::Jpeg,
                )
                .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("unsupported image codec in PDF");
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space: &[u8] = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|object| match object {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(parts) => parts.first().and_then(|p| p.as_name().ok()),
            Object::Reference(id) => doc.get_object(*id).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    raw_image(&data, width, height, color_space, bits)
}

/// Build an image from an uncompressed sample stream.
fn raw_image(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits: i64,
) -> Option<DynamicImage> {
    if bits != 8 {
        trace!(bits, "unsupported bits per component");
        return None;
    }

    let pixels = (width as usize) * (height as usize);
    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            image::ImageBuffer::<image::Rgb<u8>, _>::from_raw(
                width,
                height,
                data[..pixels * 3].to_vec(),
            )
            .map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            image::ImageBuffer::<image::Luma<u8>, _>::from_raw(
                width,
                height,
                data[..pixels].to_vec(),
            )
            .map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                len = data.len(),
                space = %String::from_utf8_lossy(color_space),
                "could not decode raw image samples"
            );
            None
        }
    }
}
