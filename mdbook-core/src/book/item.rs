//! Sections and texts of a book

use crate::types::{Block, Frontmatter, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Kind of a book item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Directory with an `index.md` and further items
    Section,
    /// Markdown file
    Text,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Section => "section",
            ItemKind::Text => "text",
        }
    }
}

/// A section or text within a book
#[derive(Debug, Clone)]
pub struct Item {
    pub kind: ItemKind,

    /// File stem or directory name
    pub name: String,

    /// Names from the book root joined by `/`
    pub path: String,

    /// 1-based positions among siblings, from the top level down
    pub ordinal: Vec<usize>,

    pub frontmatter: Frontmatter,

    /// Markdown content without frontmatter
    pub content: String,

    pub ast: Vec<Block>,

    /// Sub-items; always empty for texts
    pub items: Vec<Item>,

    pub modified: DateTime<Utc>,
}

impl Item {
    pub fn is_section(&self) -> bool {
        self.kind == ItemKind::Section
    }

    pub fn is_text(&self) -> bool {
        self.kind == ItemKind::Text
    }

    pub fn title(&self) -> String {
        self.frontmatter.title().unwrap_or_else(|| self.name.clone())
    }

    /// Depth in the book; top-level items are level 1
    pub fn level(&self) -> usize {
        self.ordinal.len()
    }

    /// Title preceded by the ordinal, e.g. `1.2. Title`
    pub fn heading(&self) -> String {
        let ordinal: Vec<String> = self.ordinal.iter().map(|o| o.to_string()).collect();
        format!("{}. {}", ordinal.join("."), self.title())
    }

    /// Path of the containing section; empty for top-level items
    pub fn parent_path(&self) -> &str {
        parent_of(&self.path)
    }

    /// Text status from frontmatter; sections take the lowest of their items
    pub fn status(&self) -> Status {
        match self.kind {
            ItemKind::Text => self.frontmatter.status().unwrap_or_default(),
            ItemKind::Section => self
                .items
                .iter()
                .map(Item::status)
                .min()
                .unwrap_or_default(),
        }
    }

    pub fn n_words(&self) -> usize {
        self.content.split_whitespace().count()
    }

    pub fn n_characters(&self) -> usize {
        self.content.chars().count()
    }

    pub fn sum_words(&self) -> usize {
        self.n_words() + self.items.iter().map(Item::sum_words).sum::<usize>()
    }

    pub fn sum_characters(&self) -> usize {
        self.n_characters() + self.items.iter().map(Item::sum_characters).sum::<usize>()
    }

    /// All sub-items depth first; self not included
    pub fn all_items(&self) -> Vec<&Item> {
        let mut result = Vec::new();
        collect_items(&self.items, &mut result);
        result
    }

    /// All texts at or below this item; self included when a text
    pub fn all_texts(&self) -> Vec<&Item> {
        if self.is_text() {
            return vec![self];
        }
        self.all_items().into_iter().filter(|i| i.is_text()).collect()
    }

    /// File or directory of the item under the book root
    pub fn abspath(&self, root: &Path) -> PathBuf {
        match self.kind {
            ItemKind::Text => root.join(format!("{}.md", self.path)),
            ItemKind::Section => root.join(&self.path),
        }
    }

    /// File holding the frontmatter and content
    pub fn content_path(&self, root: &Path) -> PathBuf {
        match self.kind {
            ItemKind::Text => self.abspath(root),
            ItemKind::Section => root.join(&self.path).join("index.md"),
        }
    }

    /// SHA-256 hex digest of the item's own frontmatter and content
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hash_content(&mut hasher, &self.frontmatter, &self.content);
        hex::encode(hasher.finalize())
    }
}

pub(crate) fn collect_items<'a>(items: &'a [Item], result: &mut Vec<&'a Item>) {
    for item in items {
        result.push(item);
        collect_items(&item.items, result);
    }
}

pub(crate) fn hash_content(hasher: &mut Sha256, frontmatter: &Frontmatter, content: &str) {
    let mut frontmatter = frontmatter.clone();
    frontmatter.remove("digest");
    hasher.update(frontmatter.to_yaml().unwrap_or_default().as_bytes());
    hasher.update(content.as_bytes());
}

/// Parent part of an item path; empty at top level
pub fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

/// Last part of an item path
pub fn name_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, name)| name).unwrap_or(path)
}

/// Join a parent path and a name
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(name: &str, status: Option<&str>, content: &str) -> Item {
        let mut frontmatter = Frontmatter::new();
        if let Some(status) = status {
            frontmatter.set("status", status);
        }
        Item {
            kind: ItemKind::Text,
            name: name.to_string(),
            path: name.to_string(),
            ordinal: vec![1],
            frontmatter,
            content: content.to_string(),
            ast: Vec::new(),
            items: Vec::new(),
            modified: Utc::now(),
        }
    }

    #[test]
    fn test_section_status_is_minimum() {
        let section = Item {
            kind: ItemKind::Section,
            name: "part".to_string(),
            path: "part".to_string(),
            ordinal: vec![2],
            frontmatter: Frontmatter::new(),
            content: String::new(),
            ast: Vec::new(),
            items: vec![text("a", Some("final"), ""), text("b", Some("draft"), "")],
            modified: Utc::now(),
        };
        assert_eq!(section.status(), Status::Draft);
        assert_eq!(section.heading(), "2. part");
    }

    #[test]
    fn test_counts() {
        let item = text("a", None, "Tre små ord");
        assert_eq!(item.status(), Status::Started);
        assert_eq!(item.n_words(), 3);
        assert_eq!(item.n_characters(), 11);
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(parent_of("a/b/c"), "a/b");
        assert_eq!(parent_of("a"), "");
        assert_eq!(name_of("a/b/c"), "c");
        assert_eq!(join_path("", "x"), "x");
        assert_eq!(join_path("a", "x"), "a/x");
    }

    #[test]
    fn test_digest_ignores_digest_key() {
        let mut a = text("a", Some("draft"), "Body");
        let before = a.digest();
        a.frontmatter.set("digest", "abc");
        assert_eq!(a.digest(), before);
        a.content.push('!');
        assert_ne!(a.digest(), before);
    }
}
