//! Data models shared by every pipeline stage.

pub mod bill;
pub mod config;

pub use bill::{BillField, FieldSet};
pub use config::{EbillConfig, ExtractionConfig, OcrConfig, PdfConfig, ServicesConfig};
