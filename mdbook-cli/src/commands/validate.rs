//! Validate command implementation

use super::{open_book, open_references};
use anyhow::{bail, Result};

/// Validate a book directory
pub fn validate(book: &str, strict: bool) -> Result<()> {
    let book = open_book(book)?;

    if let Err(e) = book.check_integrity() {
        eprintln!("Invalid book '{}': {}", book.bid, e);
        bail!("Validation failed for {}", book.bid);
    }

    let mut problems = Vec::new();
    if strict {
        match open_references(&book)? {
            Some(references) => {
                for id in book.unresolved_references(&references) {
                    problems.push(format!("Reference '{}' is not in the references", id));
                }
            }
            None if !book.references().is_empty() => {
                problems.push("Book cites references but the library has none".to_string());
            }
            None => {}
        }
        for footnote in book.dangling_footnotes() {
            let problem = if footnote.defined {
                "is never referenced"
            } else {
                "has no definition"
            };
            problems.push(format!(
                "Footnote [^{}] in '{}' {}",
                footnote.label, footnote.path, problem
            ));
        }
    }

    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("  {}", problem);
        }
        bail!("Validation found {} problems in {}", problems.len(), book.bid);
    }

    println!("Valid book '{}'", book.title());
    println!("  Items: {}", book.all_items().len());
    Ok(())
}
