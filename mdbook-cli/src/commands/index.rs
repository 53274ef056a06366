//! Index command implementation

use super::open_book;
use anyhow::Result;
use mdbook_core::TermIndex;

/// Print each indexed term with the headings where it is used
pub fn index(book: &str) -> Result<()> {
    let book = open_book(book)?;
    let index = TermIndex::build(&book);

    for entry in &index.entries {
        let headings: Vec<&str> = entry
            .locations
            .iter()
            .map(|location| location.heading.as_str())
            .collect();
        println!("{}: {}", entry.term, headings.join("; "));
    }
    tracing::debug!("{} terms in '{}'", index.len(), book.bid);
    Ok(())
}
