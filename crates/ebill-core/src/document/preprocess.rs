//! Image preparation for OCR.
//!
//! The OCR service does its own binarization and layout analysis, so
//! preparation stays light: grayscale to cut payload size, a cap on the
//! longer side, and PNG encoding.

use std::io::Cursor;

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::debug;

use crate::Result;

/// Prepare one page for OCR.
pub fn clean_page(page: &DynamicImage, max_size: u32) -> DynamicImage {
    let gray = page.grayscale();
    let (width, height) = capped_dimensions(gray.width(), gray.height(), max_size);
    if (width, height) == (gray.width(), gray.height()) {
        return gray;
    }
    debug!(
        from = format!("{}x{}", gray.width(), gray.height()),
        to = format!("{width}x{height}"),
        "downscaling page for OCR"
    );
    gray.resize(width, height, FilterType::Lanczos3)
}

/// Encode a page as PNG for the OCR request body.
pub fn encode_png(page: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    page.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
    Ok(buffer)
}

/// Dimensions after capping the longer side, preserving aspect ratio.
fn capped_dimensions(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    let longer = width.max(height);
    if max_size == 0 || longer <= max_size {
        return (width, height);
    }

    let scale = max_size as f32 / longer as f32;
    let new_width = ((width as f32 * scale) as u32).max(1);
    let new_height = ((height as f32 * scale) as u32).max(1);
    (new_width, new_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_small_images_keep_their_size() {
        assert_eq!(capped_dimensions(500, 300, 2048), (500, 300));
        assert_eq!(capped_dimensions(2048, 100, 2048), (2048, 100));
    }

    #[test]
    fn test_longer_side_is_capped() {
        assert_eq!(capped_dimensions(4096, 2048, 2048), (2048, 1024));
        assert_eq!(capped_dimensions(1000, 4000, 2000), (500, 2000));
    }

    #[test]
    fn test_tiny_dimensions_never_collapse_to_zero() {
        assert_eq!(capped_dimensions(8192, 1, 64), (64, 1));
    }

    #[test]
    fn test_zero_cap_disables_resizing() {
        assert_eq!(capped_dimensions(4096, 4096, 0), (4096, 4096));
    }

    #[test]
    fn test_clean_page_converts_to_grayscale_and_caps() {
        let page = DynamicImage::new_rgb8(4096, 2048);
        let cleaned = clean_page(&page, 2048);
        assert_eq!(cleaned.width(), 2048);
        assert_eq!(cleaned.height(), 1024);
        assert_eq!(cleaned.color().channel_count(), 1);
    }

    #[test]
    fn test_encode_png_produces_a_png_header() {
        let page = DynamicImage::new_luma8(8, 8);
        let bytes = encode_png(&page).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
