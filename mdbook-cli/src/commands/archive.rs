//! Archive command implementation

use super::open_book;
use anyhow::{Context, Result};
use std::fs;

/// Write the book directory as a zip archive
pub fn archive(book: &str, output: &str) -> Result<()> {
    let book = open_book(book)?;
    let data = book.archive()?;
    fs::write(output, &data)
        .with_context(|| format!("Failed to write archive: {}", output))?;

    println!("Archived '{}' ({} bytes) -> {}", book.title(), data.len(), output);
    Ok(())
}
