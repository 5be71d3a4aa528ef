//! Document OCR contract.

pub mod google;

use crate::Result;

/// Trait for document OCR services.
///
/// Implementations take one encoded raster image and return the plain
/// text recognized in it, in reading order. Layout detail beyond reading
/// order (bounding boxes, confidence maps) is not part of the contract.
#[async_trait::async_trait]
pub trait DocumentOcr: Send + Sync {
    /// Recognize the text in an encoded image (PNG or JPEG bytes).
    ///
    /// An image with no recognizable text is an empty string, not an
    /// error.
    async fn recognize(&self, image: &[u8]) -> Result<String>;
}
