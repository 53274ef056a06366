//! CLI command implementations

mod archive;
mod batch;
mod export;
mod index;
mod info;
mod search;
mod validate;

pub use archive::archive;
pub use batch::batch;
pub use export::export;
pub use index::index;
pub use info::info;
pub use search::search;
pub use validate::validate;

use anyhow::{Context, Result};
use mdbook_core::references::REFERENCES_DIR;
use mdbook_core::{Book, References};
use std::path::Path;

/// Read the book in a directory
fn open_book(dir: &str) -> Result<Book> {
    Book::read(Path::new(dir)).with_context(|| format!("Failed to read book: {}", dir))
}

/// References of the library holding the book, when the library has them
fn open_references(book: &Book) -> Result<Option<References>> {
    let Some(library_dir) = book.abspath.parent() else {
        return Ok(None);
    };
    if !library_dir.join(REFERENCES_DIR).is_dir() || book.bid == REFERENCES_DIR {
        return Ok(None);
    }
    let references = References::open(library_dir)
        .with_context(|| format!("Failed to read references in {}", library_dir.display()))?;
    Ok(Some(references))
}
