//! File-backed books of sections and texts
//!
//! A book is a directory holding an `index.md` and any number of texts
//! (`*.md` files) and sections (subdirectories with their own `index.md`).
//! The order of items is stored in the `items` frontmatter of the book's
//! `index.md`; entries not listed there follow in sorted name order.

mod inspect;
mod item;
mod ops;

pub use inspect::DanglingFootnote;
pub use item::{join_path, name_of, parent_of, Item, ItemKind};

use crate::error::{BookError, Result};
use crate::markdown;
use crate::types::{
    join_frontmatter, split_frontmatter, visit_inlines, Block, Frontmatter, Inline, ItemOrder,
    Status,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the file holding frontmatter and content of books and sections
pub const INDEX_FILE: &str = "index.md";

/// Extension of text files
pub const MARKDOWN_EXT: &str = "md";

/// A book read from its directory
#[derive(Debug, Clone)]
pub struct Book {
    /// Identifier; the directory name
    pub bid: String,

    pub abspath: PathBuf,

    /// Frontmatter of the book's `index.md`
    pub frontmatter: Frontmatter,

    /// Content of the book's `index.md`
    pub content: String,

    pub ast: Vec<Block>,

    /// Top-level items in order
    pub items: Vec<Item>,

    /// Most recent modification of any file in the book
    pub modified: DateTime<Utc>,

    indexed: BTreeMap<String, BTreeSet<String>>,
    references: BTreeMap<String, BTreeSet<String>>,
}

impl Book {
    /// Read the book in the given directory.
    ///
    /// The `index.md` file is created when missing, and rewritten when the
    /// item order or the derived frontmatter has changed.
    pub fn read(abspath: impl AsRef<Path>) -> Result<Self> {
        let abspath = abspath.as_ref().to_path_buf();
        if !abspath.is_dir() {
            return Err(BookError::NoSuchBook(abspath.display().to_string()).into());
        }
        let bid = abspath
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| BookError::InvalidName(abspath.display().to_string()))?;

        let index_path = abspath.join(INDEX_FILE);
        if !index_path.exists() {
            fs::write(&index_path, "")?;
        }
        let (frontmatter, content, mut modified) = read_markdown(&index_path)?;

        let mut items = read_items(&abspath, "")?;
        apply_order(&mut items, &frontmatter.items_order());
        assign_ordinals(&mut items, &[]);
        for item in &items {
            modified = modified.max(latest_modified(item));
        }

        let ast = markdown::parse(&content);
        let mut book = Self {
            bid,
            abspath,
            frontmatter,
            content,
            ast,
            items,
            modified,
            indexed: BTreeMap::new(),
            references: BTreeMap::new(),
        };
        book.collect_terms();
        book.update_index()?;

        tracing::debug!("Read book '{}' with {} items", book.bid, book.all_items().len());
        Ok(book)
    }

    /// Re-read the book from disk
    pub fn reload(&mut self) -> Result<()> {
        *self = Self::read(&self.abspath)?;
        Ok(())
    }

    pub fn title(&self) -> String {
        self.frontmatter.title().unwrap_or_else(|| self.bid.clone())
    }

    pub fn subtitle(&self) -> Option<String> {
        self.frontmatter.get_string("subtitle").filter(|s| !s.is_empty())
    }

    pub fn authors(&self) -> Vec<String> {
        self.frontmatter.get_strings("authors")
    }

    pub fn language(&self) -> Option<String> {
        self.frontmatter.get_string("language").filter(|s| !s.is_empty())
    }

    pub fn owner(&self) -> Option<String> {
        self.frontmatter.get_string("owner")
    }

    /// `book` when it has items, otherwise `article`
    pub fn kind_name(&self) -> &'static str {
        if self.items.is_empty() {
            "article"
        } else {
            "book"
        }
    }

    /// Lowest status of the items, or the book's own status when it has none
    pub fn status(&self) -> Status {
        self.items
            .iter()
            .map(Item::status)
            .min()
            .unwrap_or_else(|| self.frontmatter.status().unwrap_or_default())
    }

    pub fn get(&self, path: &str) -> Option<&Item> {
        let mut items = &self.items;
        let mut found = None;
        for name in path.split('/') {
            let item = items.iter().find(|i| i.name == name)?;
            items = &item.items;
            found = Some(item);
        }
        found
    }

    /// Item at the path, or `BookError::NoSuchItem`
    pub fn item(&self, path: &str) -> Result<&Item> {
        self.get(path)
            .ok_or_else(|| BookError::NoSuchItem(path.to_string()).into())
    }

    /// All items depth first
    pub fn all_items(&self) -> Vec<&Item> {
        let mut result = Vec::new();
        item::collect_items(&self.items, &mut result);
        result
    }

    pub fn all_texts(&self) -> Vec<&Item> {
        self.all_items().into_iter().filter(|i| i.is_text()).collect()
    }

    /// Items sharing the parent of the given path, including itself
    pub fn siblings(&self, path: &str) -> &[Item] {
        let parent = parent_of(path);
        if parent.is_empty() {
            &self.items
        } else {
            self.get(parent).map(|p| p.items.as_slice()).unwrap_or(&[])
        }
    }

    fn sibling_index(&self, path: &str) -> Option<usize> {
        let name = name_of(path);
        self.siblings(path).iter().position(|i| i.name == name)
    }

    pub fn prev(&self, path: &str) -> Option<&Item> {
        let index = self.sibling_index(path)?;
        index.checked_sub(1).and_then(|i| self.siblings(path).get(i))
    }

    pub fn next(&self, path: &str) -> Option<&Item> {
        let index = self.sibling_index(path)?;
        self.siblings(path).get(index + 1)
    }

    /// Closest preceding sibling that is a section
    pub fn prev_section(&self, path: &str) -> Option<&Item> {
        let index = self.sibling_index(path)?;
        self.siblings(path)[..index].iter().rev().find(|i| i.is_section())
    }

    /// Top-level ancestor of the item, possibly itself
    pub fn chapter(&self, path: &str) -> Option<&Item> {
        let top = path.split('/').next()?;
        self.items.iter().find(|i| i.name == top)
    }

    /// Titles from the top level down to the item, joined by `; `
    pub fn fulltitle(&self, path: &str) -> String {
        let mut titles = Vec::new();
        let mut items = &self.items;
        for name in path.split('/') {
            let Some(item) = items.iter().find(|i| i.name == name) else {
                break;
            };
            titles.push(item.title());
            items = &item.items;
        }
        titles.join("; ")
    }

    pub fn n_words(&self) -> usize {
        self.content.split_whitespace().count()
    }

    pub fn sum_words(&self) -> usize {
        self.n_words() + self.items.iter().map(Item::sum_words).sum::<usize>()
    }

    pub fn sum_characters(&self) -> usize {
        self.content.chars().count() + self.items.iter().map(Item::sum_characters).sum::<usize>()
    }

    pub fn max_level(&self) -> usize {
        self.all_items().iter().map(|i| i.level()).max().unwrap_or(0)
    }

    /// SHA-256 hex digest of the book's frontmatter, content and all items in order
    pub fn digest(&self) -> String {
        digest_of(&self.frontmatter, &self.content, &self.items)
    }

    /// Canonical indexed terms and the paths of the items using them
    pub fn indexed(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.indexed
    }

    /// Cited reference ids and the paths of the items citing them
    pub fn references(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.references
    }

    /// Export settings mapping for the format, e.g. `docx` or `pdf`
    pub fn export_settings(&self, format: &str) -> Option<&serde_yaml::Mapping> {
        self.frontmatter.get_mapping(format)
    }

    /// Write the book's `index.md` with the current frontmatter and content
    pub(crate) fn write_index(&self) -> Result<()> {
        let output = join_frontmatter(&self.frontmatter, &self.content)?;
        fs::write(self.abspath.join(INDEX_FILE), output)?;
        Ok(())
    }

    /// Store derived values in the frontmatter; write `index.md` if any changed
    fn update_index(&mut self) -> Result<()> {
        let mut derived = self.frontmatter.clone();
        derived.set_items_order(&order_of(&self.items));
        derived.set("type", self.kind_name());
        if !self.items.is_empty() {
            derived.set("status", self.status().name());
        }
        derived.insert("sum_characters", self.sum_characters() as u64);
        derived.remove("digest");
        let digest = digest_of(&derived, &self.content, &self.items);
        derived.insert("digest", digest);

        if derived != self.frontmatter {
            self.frontmatter = derived;
            self.write_index()?;
            tracing::debug!("Updated index of book '{}'", self.bid);
        }
        Ok(())
    }

    fn collect_terms(&mut self) {
        let mut indexed = BTreeMap::new();
        let mut references = BTreeMap::new();

        record_terms("", &self.frontmatter, &self.ast, &mut indexed, &mut references);
        for item in self.all_items() {
            record_terms(
                &item.path,
                &item.frontmatter,
                &item.ast,
                &mut indexed,
                &mut references,
            );
        }

        self.indexed = indexed;
        self.references = references;
    }

    /// JSON-serializable snapshot of the book and its items
    pub fn state(&self) -> BookState {
        BookState {
            bid: self.bid.clone(),
            title: self.title(),
            subtitle: self.subtitle(),
            authors: self.authors(),
            language: self.language(),
            owner: self.owner(),
            kind: self.kind_name().to_string(),
            status: self.status(),
            modified: self.modified,
            sum_words: self.sum_words(),
            sum_characters: self.sum_characters(),
            digest: self.digest(),
            items: self.items.iter().map(ItemState::from).collect(),
        }
    }

    /// Item state with content, frontmatter and its neighbours
    pub fn item_detail(&self, path: &str) -> Result<ItemDetail> {
        let item = self.item(path)?;
        Ok(ItemDetail {
            state: ItemState::from(item),
            fulltitle: self.fulltitle(path),
            parent: item.parent_path().to_string(),
            chapter: self.chapter(path).map(|i| i.path.clone()),
            prev: self.prev(path).map(|i| i.path.clone()),
            next: self.next(path).map(|i| i.path.clone()),
            prev_section: self.prev_section(path).map(|i| i.path.clone()),
            frontmatter: item.frontmatter.sorted(),
            content: item.content.clone(),
        })
    }
}

/// Snapshot of a book
#[derive(Debug, Clone, Serialize)]
pub struct BookState {
    pub bid: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Status,
    pub modified: DateTime<Utc>,
    pub sum_words: usize,
    pub sum_characters: usize,
    pub digest: String,
    pub items: Vec<ItemState>,
}

/// Snapshot of an item
#[derive(Debug, Clone, Serialize)]
pub struct ItemState {
    pub name: String,
    pub path: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub status: Status,
    pub heading: String,
    pub ordinal: Vec<usize>,
    pub level: usize,
    pub n_words: usize,
    pub n_characters: usize,
    pub sum_characters: usize,
    pub digest: String,
    pub modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemState>,
}

impl From<&Item> for ItemState {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            path: item.path.clone(),
            title: item.title(),
            kind: item.kind,
            status: item.status(),
            heading: item.heading(),
            ordinal: item.ordinal.clone(),
            level: item.level(),
            n_words: item.n_words(),
            n_characters: item.n_characters(),
            sum_characters: item.sum_characters(),
            digest: item.digest(),
            modified: item.modified,
            items: item.items.iter().map(ItemState::from).collect(),
        }
    }
}

/// Item snapshot with its content and position in the book
#[derive(Debug, Clone, Serialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub state: ItemState,
    pub fulltitle: String,
    pub parent: String,
    pub chapter: Option<String>,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub prev_section: Option<String>,
    pub frontmatter: BTreeMap<String, serde_yaml::Value>,
    pub content: String,
}

fn digest_of(frontmatter: &Frontmatter, content: &str, items: &[Item]) -> String {
    let mut hasher = Sha256::new();
    item::hash_content(&mut hasher, frontmatter, content);
    let mut all = Vec::new();
    item::collect_items(items, &mut all);
    for item in all {
        hasher.update(item.digest().as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn record_terms(
    path: &str,
    frontmatter: &Frontmatter,
    ast: &[Block],
    indexed: &mut BTreeMap<String, BTreeSet<String>>,
    references: &mut BTreeMap<String, BTreeSet<String>>,
) {
    for keyword in frontmatter.get_strings("keywords") {
        indexed.entry(keyword).or_default().insert(path.to_string());
    }
    visit_inlines(ast, &mut |inline| match inline {
        Inline::Indexed { canonical, .. } => {
            indexed
                .entry(canonical.clone())
                .or_default()
                .insert(path.to_string());
        }
        Inline::Reference { id, .. } if !id.is_empty() => {
            references
                .entry(id.clone())
                .or_default()
                .insert(path.to_string());
        }
        _ => {}
    });
}

/// Read frontmatter, content and modification time of a Markdown file
pub(crate) fn read_markdown(path: &Path) -> Result<(Frontmatter, String, DateTime<Utc>)> {
    let text = fs::read_to_string(path)?;
    let (frontmatter, content) = split_frontmatter(&text, &path.display().to_string())?;
    let modified = fs::metadata(path)?.modified()?.into();
    Ok((frontmatter, content, modified))
}

fn read_items(root: &Path, parent: &str) -> Result<Vec<Item>> {
    let dir = if parent.is_empty() {
        root.to_path_buf()
    } else {
        root.join(parent)
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let is_dir = entry.file_type()?.is_dir();
        // Editor lock files, and hidden directories such as `.git`
        if name.starts_with(".#") || (is_dir && name.starts_with('.')) || name == INDEX_FILE {
            continue;
        }
        entries.push((name, is_dir));
    }
    entries.sort();

    let mut items = Vec::new();
    for (name, is_dir) in entries {
        if is_dir {
            let path = join_path(parent, &name);
            let index_path = dir.join(&name).join(INDEX_FILE);
            if !index_path.exists() {
                fs::write(&index_path, "")?;
            }
            let (frontmatter, content, modified) = read_markdown(&index_path)?;
            let ast = markdown::parse(&content);
            let children = read_items(root, &path)?;
            items.push(Item {
                kind: ItemKind::Section,
                name,
                path,
                ordinal: Vec::new(),
                frontmatter,
                content,
                ast,
                items: children,
                modified,
            });
        } else if let Some(stem) = name.strip_suffix(".md") {
            let (frontmatter, content, modified) = read_markdown(&dir.join(&name))?;
            if parent.is_empty() && frontmatter.get_bool("exclude") {
                continue;
            }
            let ast = markdown::parse(&content);
            items.push(Item {
                kind: ItemKind::Text,
                name: stem.to_string(),
                path: join_path(parent, stem),
                ordinal: Vec::new(),
                frontmatter,
                content,
                ast,
                items: Vec::new(),
                modified,
            });
        }
    }
    Ok(items)
}

/// Reorder items by the explicit order; unlisted items keep their order after listed ones
fn apply_order(items: &mut Vec<Item>, order: &[ItemOrder]) {
    let mut remaining = std::mem::take(items);
    for entry in order {
        if let Some(pos) = remaining.iter().position(|i| i.name == entry.name) {
            let mut item = remaining.remove(pos);
            if item.is_section() {
                apply_order(&mut item.items, &entry.items);
            }
            items.push(item);
        }
    }
    items.extend(remaining);
}

fn assign_ordinals(items: &mut [Item], prefix: &[usize]) {
    for (index, item) in items.iter_mut().enumerate() {
        let mut ordinal = prefix.to_vec();
        ordinal.push(index + 1);
        assign_ordinals(&mut item.items, &ordinal);
        item.ordinal = ordinal;
    }
}

fn latest_modified(item: &Item) -> DateTime<Utc> {
    item.items
        .iter()
        .map(latest_modified)
        .fold(item.modified, |latest, m| latest.max(m))
}

/// Explicit order of the items, as stored in the book frontmatter
pub(crate) fn order_of(items: &[Item]) -> Vec<ItemOrder> {
    items
        .iter()
        .map(|item| ItemOrder {
            name: item.name.clone(),
            title: Some(item.title()),
            items: order_of(&item.items),
        })
        .collect()
}
