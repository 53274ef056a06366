//! Index of terms over a book

use crate::book::Book;
use serde::Serialize;

/// Where a term is used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Item path; empty for the book itself
    pub path: String,
    pub heading: String,
    pub fulltitle: String,
    pub ordinal: Vec<usize>,
}

/// A canonical term and its locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub term: String,
    pub locations: Vec<Location>,
}

/// Terms sorted case-insensitively, each with locations in book order
#[derive(Debug, Clone, Default, Serialize)]
pub struct TermIndex {
    pub entries: Vec<IndexEntry>,
}

impl TermIndex {
    pub fn build(book: &Book) -> Self {
        let mut entries: Vec<IndexEntry> = book
            .indexed()
            .iter()
            .map(|(term, paths)| {
                let mut locations: Vec<Location> = paths
                    .iter()
                    .map(|path| location(book, path))
                    .collect();
                locations.sort_by(|a, b| a.ordinal.cmp(&b.ordinal));
                IndexEntry {
                    term: term.clone(),
                    locations,
                }
            })
            .collect();
        entries.sort_by(|a, b| {
            a.term
                .to_lowercase()
                .cmp(&b.term.to_lowercase())
                .then_with(|| a.term.cmp(&b.term))
        });
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.term == term)
    }
}

fn location(book: &Book, path: &str) -> Location {
    match book.get(path) {
        Some(item) => Location {
            path: path.to_string(),
            heading: item.heading(),
            fulltitle: book.fulltitle(path),
            ordinal: item.ordinal.clone(),
        },
        None => Location {
            path: String::new(),
            heading: book.title(),
            fulltitle: book.title(),
            ordinal: Vec::new(),
        },
    }
}
