//! Error types for the ebill-core library.

use thiserror::Error;

/// Main error type for the ebill library.
#[derive(Error, Debug)]
pub enum EbillError {
    /// Document loading error.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// External service error (OCR or text model).
    #[error("service error: {0}")]
    Service(#[from] ebill_services::ServiceError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to loading input documents.
#[derive(Error, Debug)]
pub enum InputError {
    /// The input file does not exist.
    #[error("file not found: {0}")]
    NotFound(std::path::PathBuf),

    /// The file extension is not a supported input format.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    PdfParse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The document carries neither text nor page images.
    #[error("document has no extractable content")]
    EmptyDocument,

    /// Failed to decode a raster image file.
    #[error("failed to decode image: {0}")]
    ImageDecode(String),
}

/// Invalid or incomplete configuration.
///
/// Collects every problem at once so the caller can report them all
/// instead of failing on the first.
#[derive(Error, Debug)]
#[error("invalid configuration: {}", reasons.join("; "))]
pub struct ConfigError {
    /// One human-readable reason per missing or invalid item.
    pub reasons: Vec<String>,
}

/// Result type for the ebill library.
pub type Result<T> = std::result::Result<T, EbillError>;
