//! Encoders for rendering planned documents to output formats

mod docx;
mod typst_pdf;

pub use docx::{DocxEncoder, PageSetup};
pub use typst_pdf::{PageConfig, TypstPdfEncoder};

use crate::error::ConversionError;
use crate::export::Document;
use std::io::Write;

/// Trait for encoding documents to output formats
pub trait Encoder: Send + Sync {
    /// Encode a document to a writer
    fn encode(&self, document: &Document, writer: &mut dyn Write) -> Result<(), ConversionError>;

    /// Format name (e.g., "DOCX", "Typst")
    fn format_name(&self) -> &str;

    /// File extension for this format
    fn file_extension(&self) -> &str;

    /// MIME type for this format
    fn mime_type(&self) -> &str;

    /// Book frontmatter key holding the export settings
    fn settings_key(&self) -> &str;
}

/// Get an encoder by format name
pub fn encoder_for_format(format: &str) -> Option<Box<dyn Encoder>> {
    match format.to_lowercase().as_str() {
        "docx" => Some(Box::new(DocxEncoder::new())),
        "pdf" | "typ" | "typst" => Some(Box::new(TypstPdfEncoder::new())),
        _ => None,
    }
}
