//! All books of a library directory

use crate::book::Book;
use crate::error::{BookError, Result};
use crate::references::{References, REFERENCES_DIR};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the software in state snapshots
pub const SOFTWARE: &str = "mdbook";

/// Books and references under one directory
#[derive(Debug, Clone)]
pub struct Library {
    dir: PathBuf,
    books: BTreeMap<String, Book>,
    references: References,
}

/// A text citing a reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub bid: String,
    pub path: String,
}

/// Summary of a book in the site state
#[derive(Debug, Clone, Serialize)]
pub struct BookSummary {
    pub title: String,
    pub modified: DateTime<Utc>,
    pub sum_characters: usize,
    pub digest: String,
}

/// Snapshot of the whole library
#[derive(Debug, Clone, Serialize)]
pub struct SiteState {
    pub software: String,
    pub version: String,
    pub now: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub books: BTreeMap<String, BookSummary>,
}

impl Library {
    /// Read every book in the directory; books that fail to read are skipped
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("library directory {} not found", dir.display()),
            )
            .into());
        }

        let mut books = BTreeMap::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name == REFERENCES_DIR || name.starts_with('.') {
                continue;
            }
            match Book::read(entry.path()) {
                Ok(book) => {
                    books.insert(book.bid.clone(), book);
                }
                Err(e) => tracing::warn!("Skipping book '{}': {}", name, e),
            }
        }
        let references = References::open(&dir)?;

        tracing::info!("Opened library {} with {} books", dir.display(), books.len());
        Ok(Self {
            dir,
            books,
            references,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Books with the most recently modified first
    pub fn books(&self) -> Vec<&Book> {
        let mut books: Vec<&Book> = self.books.values().collect();
        books.sort_by(|a, b| b.modified.cmp(&a.modified));
        books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, bid: &str) -> Option<&Book> {
        self.books.get(bid)
    }

    /// Book by identifier, or `BookError::NoSuchBook`
    pub fn book(&self, bid: &str) -> Result<&Book> {
        self.books
            .get(bid)
            .ok_or_else(|| BookError::NoSuchBook(bid.to_string()).into())
    }

    pub fn book_mut(&mut self, bid: &str) -> Result<&mut Book> {
        self.books
            .get_mut(bid)
            .ok_or_else(|| BookError::NoSuchBook(bid.to_string()).into())
    }

    pub fn create_book(&mut self, title: &str) -> Result<&Book> {
        if crate::names::slug(title) == REFERENCES_DIR {
            return Err(BookError::NameInUse(REFERENCES_DIR.to_string()).into());
        }
        let book = Book::create(&self.dir, title)?;
        Ok(self.insert(book))
    }

    pub fn copy_book(&mut self, bid: &str, owner: Option<&str>) -> Result<&Book> {
        let copy = self.book(bid)?.copy_book(owner)?;
        Ok(self.insert(copy))
    }

    pub fn delete_book(&mut self, bid: &str, force: bool) -> Result<()> {
        let book = self
            .books
            .remove(bid)
            .ok_or_else(|| BookError::NoSuchBook(bid.to_string()))?;
        if let Err(e) = book.clone().delete(force) {
            self.books.insert(bid.to_string(), book);
            return Err(e);
        }
        Ok(())
    }

    /// Re-read a book from disk
    pub fn reload_book(&mut self, bid: &str) -> Result<&Book> {
        let book = self.book_mut(bid)?;
        book.reload()?;
        Ok(book)
    }

    pub fn references(&self) -> &References {
        &self.references
    }

    pub fn references_mut(&mut self) -> &mut References {
        &mut self.references
    }

    /// Texts in all books citing the reference
    pub fn citations(&self, refid: &str) -> Vec<Citation> {
        let mut result = Vec::new();
        for book in self.books.values() {
            if let Some(paths) = book.references().get(refid) {
                result.extend(paths.iter().map(|path| Citation {
                    bid: book.bid.clone(),
                    path: path.clone(),
                }));
            }
        }
        result
    }

    /// Snapshot of all books and the references
    pub fn state(&self) -> SiteState {
        let summary = |book: &Book| BookSummary {
            title: book.title(),
            modified: book.modified,
            sum_characters: book.sum_characters(),
            digest: book.digest(),
        };
        let mut books: BTreeMap<String, BookSummary> = self
            .books
            .values()
            .map(|book| (book.bid.clone(), summary(book)))
            .collect();
        let references = self.references.book();
        books.insert(references.bid.clone(), summary(references));

        SiteState {
            software: SOFTWARE.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            now: Utc::now(),
            kind: "site".to_string(),
            books,
        }
    }

    fn insert(&mut self, book: Book) -> &Book {
        let bid = book.bid.clone();
        self.books.insert(bid.clone(), book);
        &self.books[&bid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_references() {
        let tmp = TempDir::new().unwrap();
        let library = Library::open(tmp.path()).unwrap();
        assert!(library.is_empty());
        assert!(tmp.path().join(REFERENCES_DIR).join("index.md").exists());
        assert!(library.get(REFERENCES_DIR).is_none());
    }

    #[test]
    fn test_books_and_state() {
        let tmp = TempDir::new().unwrap();
        let mut library = Library::open(tmp.path()).unwrap();
        library.create_book("First").unwrap();
        library.create_book("Second").unwrap();
        assert!(library.create_book("First").is_err());
        assert!(library.create_book("References").is_err());

        let reopened = Library::open(tmp.path()).unwrap();
        assert_eq!(reopened.len(), 2);

        let state = reopened.state();
        assert_eq!(state.kind, "site");
        assert!(state.books.contains_key("first"));
        assert!(state.books.contains_key(REFERENCES_DIR));
    }

    #[test]
    fn test_skips_unreadable_book() {
        let tmp = TempDir::new().unwrap();
        let bad = tmp.path().join("bad");
        fs::create_dir(&bad).unwrap();
        fs::write(bad.join("index.md"), "---\n: [oops\n---\n").unwrap();
        let library = Library::open(tmp.path()).unwrap();
        assert!(library.get("bad").is_none());
    }

    #[test]
    fn test_delete_book_requires_force() {
        let tmp = TempDir::new().unwrap();
        let mut library = Library::open(tmp.path()).unwrap();
        library.create_book("Doomed").unwrap();
        library
            .book_mut("doomed")
            .unwrap()
            .create_text("t", None)
            .unwrap();
        assert!(library.delete_book("doomed", false).is_err());
        assert!(library.get("doomed").is_some());
        library.delete_book("doomed", true).unwrap();
        assert!(library.get("doomed").is_none());
    }

    #[test]
    fn test_citations() {
        let tmp = TempDir::new().unwrap();
        let mut library = Library::open(tmp.path()).unwrap();
        library.create_book("Cites").unwrap();
        let book = library.book_mut("cites").unwrap();
        book.create_text("t", None).unwrap();
        book.write_content("t", "As [@Darwin 1859] said.").unwrap();

        assert_eq!(
            library.citations("darwin-1859"),
            vec![Citation {
                bid: "cites".to_string(),
                path: "t".to_string()
            }]
        );
    }
}
