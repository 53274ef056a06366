//! Read-only checks and queries over a book

use super::{Book, ItemKind, INDEX_FILE};
use crate::error::{BookError, ConversionError, ParseError, Result};
use crate::references::References;
use crate::types::{visit_inlines, Block, Inline};
use regex::RegexBuilder;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::io::{Cursor, Read, Write};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Footnote label used without a definition, or defined without use
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingFootnote {
    pub path: String,
    pub label: String,
    pub defined: bool,
}

/// Lock files and anything inside hidden directories are left out of archives
fn skipped(name: &str, is_dir: bool) -> bool {
    let parts: Vec<&str> = name.split('/').collect();
    parts.iter().enumerate().any(|(i, part)| {
        let directory = i + 1 < parts.len() || is_dir;
        part.starts_with(".#") || (directory && part.starts_with('.'))
    })
}

impl Book {
    /// Paths whose own content matches the regular expression; the book itself is the empty path
    pub fn search(&self, term: &str, ignore_case: bool) -> Result<Vec<String>> {
        let pattern = RegexBuilder::new(term)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| ParseError::InvalidPattern(e.to_string()))?;

        let mut result = Vec::new();
        if pattern.is_match(&self.content) {
            result.push(String::new());
        }
        for item in self.all_items() {
            if pattern.is_match(&item.content) {
                result.push(item.path.clone());
            }
        }
        Ok(result)
    }

    /// Zip archive of `index.md` and all items, as stored on disk
    pub fn archive(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in WalkDir::new(&self.abspath).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let Ok(relative) = entry.path().strip_prefix(&self.abspath) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if name.is_empty() || skipped(&name, entry.file_type().is_dir()) {
                continue;
            }
            if entry.file_type().is_dir() {
                zip.add_directory(name, options)
                    .map_err(ConversionError::from)?;
            } else {
                let mut data = Vec::new();
                std::fs::File::open(entry.path())?.read_to_end(&mut data)?;
                zip.start_file(name, options).map_err(ConversionError::from)?;
                zip.write_all(&data)?;
            }
        }

        let cursor = zip.finish().map_err(ConversionError::from)?;
        tracing::debug!("Archived book '{}'", self.bid);
        Ok(cursor.into_inner())
    }

    /// Verify that the in-memory tree agrees with the filesystem
    pub fn check_integrity(&self) -> Result<()> {
        if !self.abspath.is_dir() {
            return Err(integrity(format!("{} is not a directory", self.abspath.display())));
        }
        if !self.abspath.join(INDEX_FILE).is_file() {
            return Err(integrity(format!("{} has no {}", self.bid, INDEX_FILE)));
        }

        let items = self.all_items();
        let lookup: HashMap<&str, _> = items.iter().map(|i| (i.path.as_str(), *i)).collect();
        if lookup.len() != items.len() {
            return Err(integrity(format!(
                "{} paths for {} items",
                lookup.len(),
                items.len()
            )));
        }

        for item in items {
            let path = item.abspath(&self.abspath);
            let ok = match item.kind {
                ItemKind::Section => path.is_dir() && path.join(INDEX_FILE).is_file(),
                ItemKind::Text => path.is_file(),
            };
            if !ok {
                return Err(integrity(format!(
                    "{} '{}' does not match {}",
                    item.kind.as_str(),
                    item.path,
                    path.display()
                )));
            }
            if item.is_text() && !item.items.is_empty() {
                return Err(integrity(format!("text '{}' has sub-items", item.path)));
            }
        }
        Ok(())
    }

    /// Cited reference ids missing from the references collection
    pub fn unresolved_references(&self, references: &References) -> Vec<String> {
        self.references()
            .keys()
            .filter(|id| !references.contains(id))
            .cloned()
            .collect()
    }

    /// Footnote labels referenced but not defined, or defined but not referenced, per text
    pub fn dangling_footnotes(&self) -> Vec<DanglingFootnote> {
        let mut result = Vec::new();
        for item in self.all_items() {
            let (used, defined) = footnote_labels(&item.ast);
            for label in used.difference(&defined) {
                result.push(DanglingFootnote {
                    path: item.path.clone(),
                    label: label.clone(),
                    defined: false,
                });
            }
            for label in defined.difference(&used) {
                result.push(DanglingFootnote {
                    path: item.path.clone(),
                    label: label.clone(),
                    defined: true,
                });
            }
        }
        result
    }
}

fn integrity(message: String) -> crate::error::MdbookError {
    BookError::Integrity(message).into()
}

fn footnote_labels(ast: &[Block]) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut used = BTreeSet::new();
    visit_inlines(ast, &mut |inline| {
        if let Inline::FootnoteRef { id } = inline {
            used.insert(id.clone());
        }
    });
    let defined = ast
        .iter()
        .filter_map(|block| match block {
            Block::Footnote { id, .. } => Some(id.clone()),
            _ => None,
        })
        .collect();
    (used, defined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn book_with_texts() -> (TempDir, Book) {
        let tmp = TempDir::new().unwrap();
        let mut book = Book::create(tmp.path(), "Searchable").unwrap();
        book.create_text("alpha", None).unwrap();
        book.create_text("beta", None).unwrap();
        book.write_content("alpha", "The Red planet[^1].\n\n[^1]: Used.\n\n[^2]: Unused.")
            .unwrap();
        book.write_content("beta", "A blue sky.").unwrap();
        (tmp, book)
    }

    #[test]
    fn test_search() {
        let (_tmp, book) = book_with_texts();
        assert_eq!(book.search("red", true).unwrap(), vec!["alpha"]);
        assert!(book.search("red", false).unwrap().is_empty());
        assert_eq!(book.search("(blue|Red)", false).unwrap(), vec!["alpha", "beta"]);
        assert!(book.search("(unclosed", false).is_err());
    }

    #[test]
    fn test_archive_contains_files() {
        let (_tmp, book) = book_with_texts();
        let data = book.archive().unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["alpha.md", "beta.md", "index.md"]);

        let mut beta = String::new();
        archive.by_name("beta.md").unwrap().read_to_string(&mut beta).unwrap();
        assert!(beta.ends_with("A blue sky."));
    }

    #[test]
    fn test_archive_skips_lock_files_and_hidden_dirs() {
        assert!(skipped(".#alpha.md", false));
        assert!(skipped(".git", true));
        assert!(skipped(".git/HEAD", false));
        assert!(!skipped(".notes.md", false));
        assert!(!skipped("part/inner.md", false));
    }

    #[test]
    fn test_integrity() {
        let (_tmp, book) = book_with_texts();
        book.check_integrity().unwrap();

        fs::remove_file(book.abspath.join("beta.md")).unwrap();
        assert!(matches!(
            book.check_integrity(),
            Err(crate::MdbookError::Book(BookError::Integrity(_)))
        ));
    }

    #[test]
    fn test_dangling_footnotes() {
        let (_tmp, book) = book_with_texts();
        let dangling = book.dangling_footnotes();
        assert_eq!(
            dangling,
            vec![DanglingFootnote {
                path: "alpha".to_string(),
                label: "2".to_string(),
                defined: true
            }]
        );
    }
}
