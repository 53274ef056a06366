//! Search command implementation

use super::open_book;
use anyhow::Result;

/// Print the items whose content matches the term
pub fn search(book: &str, term: &str, case_sensitive: bool) -> Result<()> {
    let book = open_book(book)?;
    let paths = book.search(term, !case_sensitive)?;

    if paths.is_empty() {
        println!("No matches for '{}'", term);
    }
    for path in paths {
        match book.get(&path) {
            Some(item) if !path.is_empty() => println!("{}  {}", item.heading(), path),
            _ => println!("{}", book.title()),
        }
    }
    Ok(())
}
