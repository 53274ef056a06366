//! mdbook Core Library
//!
//! This crate provides the data model and export logic for mdbook: books
//! of nested sections and texts stored as Markdown files with YAML
//! frontmatter, a shared references collection, a term index, and export
//! of a book or one of its items to DOCX and Typst (for PDF).

pub mod book;
pub mod encoder;
pub mod error;
pub mod export;
pub mod index;
pub mod library;
pub mod markdown;
pub mod names;
pub mod references;
pub mod types;

pub use book::{Book, DanglingFootnote, Item, ItemKind};
pub use error::{BookError, ConversionError, MdbookError, ParseError, Result};
pub use export::{Document, ExportSettings, Part};
pub use index::TermIndex;
pub use library::Library;
pub use names::nameify;
pub use references::{Reference, ReferenceType, References};
pub use types::{Block, Frontmatter, Inline, Status, TableCell, TableData};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_creation() {
        let tmp = tempfile::TempDir::new().unwrap();
        let book = Book::create(tmp.path(), "Test Book").unwrap();
        assert_eq!(book.bid, "test-book");
        assert_eq!(book.title(), "Test Book");
        assert_eq!(book.status(), Status::Started);
    }
}
