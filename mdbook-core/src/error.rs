//! Error types for mdbook core

use thiserror::Error;

/// Result type alias using MdbookError
pub type Result<T> = std::result::Result<T, MdbookError>;

/// Top-level error type for all mdbook operations
#[derive(Debug, Error)]
pub enum MdbookError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Book error: {0}")]
    Book(#[from] BookError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while reading Markdown files
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid frontmatter in {path}: {message}")]
    Frontmatter { path: String, message: String },

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    #[error("Malformed content: {0}")]
    MalformedContent(String),
}

/// Errors from operations on the book hierarchy
#[derive(Debug, Error)]
pub enum BookError {
    #[error("No such book '{0}'")]
    NoSuchBook(String),

    #[error("No such item '{0}'")]
    NoSuchItem(String),

    #[error("No such reference '{0}'")]
    NoSuchReference(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("The name '{0}' is already in use")]
    NameInUse(String),

    #[error("Cannot move item; name collision with existing '{0}'")]
    Collision(String),

    #[error("Cannot delete non-empty {0}")]
    NotEmpty(String),

    #[error("Operation not allowed for {0}")]
    WrongKind(String),

    #[error("Invalid status value '{0}'")]
    InvalidStatus(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Could not form copy name; too many copies of '{0}'")]
    TooManyCopies(String),

    #[error("Integrity check failed: {0}")]
    Integrity(String),
}

/// Errors that occur during export
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid export settings: {0}")]
    InvalidSettings(String),
}

impl From<zip::result::ZipError> for ConversionError {
    fn from(e: zip::result::ZipError) -> Self {
        ConversionError::EncodingFailed(e.to_string())
    }
}

impl From<quick_xml::Error> for ConversionError {
    fn from(e: quick_xml::Error) -> Self {
        ConversionError::EncodingFailed(e.to_string())
    }
}

impl From<std::io::Error> for ConversionError {
    fn from(e: std::io::Error) -> Self {
        ConversionError::EncodingFailed(e.to_string())
    }
}
