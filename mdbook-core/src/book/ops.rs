//! Operations that change a book on disk

use super::{join_path, name_of, order_of, parent_of, read_markdown, Book, Item, ItemKind, INDEX_FILE};
use crate::error::{BookError, Result};
use crate::names::nameify;
use crate::types::{cleanup_content, join_frontmatter, Frontmatter, ItemOrder, Status};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Maximum number of copies of one item
pub const MAX_COPIES: usize = 20;

impl Book {
    /// Create a new, empty book in the library directory
    pub fn create(library_dir: &Path, title: &str) -> Result<Book> {
        let name = nameify(title)?;
        let dir = library_dir.join(&name);
        if dir.exists() {
            return Err(BookError::NameInUse(name).into());
        }
        fs::create_dir(&dir)?;

        let mut frontmatter = Frontmatter::new();
        frontmatter.set("title", title.trim());
        fs::write(dir.join(INDEX_FILE), join_frontmatter(&frontmatter, "")?)?;

        tracing::info!("Created book '{}'", name);
        Book::read(&dir)
    }

    /// Copy the whole book into a new directory of the library
    pub fn copy_book(&self, owner: Option<&str>) -> Result<Book> {
        let library_dir = self
            .abspath
            .parent()
            .ok_or_else(|| BookError::NoSuchBook(self.bid.clone()))?;
        let (name, number) = copy_name(library_dir, &self.bid)?;
        let dir = library_dir.join(&name);
        copy_tree(&self.abspath, &dir)?;

        let index_path = dir.join(INDEX_FILE);
        let (mut frontmatter, content, _) = read_markdown(&index_path)?;
        frontmatter.set("title", format!("{}{}", self.title(), copy_suffix(number)));
        if let Some(owner) = owner {
            frontmatter.set("owner", owner);
        }
        fs::write(&index_path, join_frontmatter(&frontmatter, &content)?)?;

        tracing::info!("Copied book '{}' to '{}'", self.bid, name);
        Book::read(&dir)
    }

    /// Remove the book directory; a book with items requires `force`
    pub fn delete(self, force: bool) -> Result<()> {
        if !self.items.is_empty() && !force {
            return Err(BookError::NotEmpty(format!("book '{}'", self.bid)).into());
        }
        fs::remove_dir_all(&self.abspath)?;
        tracing::info!("Deleted book '{}'", self.bid);
        Ok(())
    }

    /// Create an empty text last in the parent section; returns its path
    pub fn create_text(&mut self, title: &str, parent: Option<&str>) -> Result<String> {
        let parent = self.section_path(parent)?;
        let name = nameify(title)?;
        let dir = self.dir_of(&parent);
        if name_in_use(&dir, &name) {
            return Err(BookError::NameInUse(name).into());
        }

        let mut frontmatter = Frontmatter::new();
        if name != title.trim() {
            frontmatter.set("title", title.trim());
        }
        frontmatter.set("status", Status::Started.name());
        fs::write(dir.join(format!("{}.md", name)), join_frontmatter(&frontmatter, "")?)?;

        self.append_entry(&parent, &name)?;
        Ok(join_path(&parent, &name))
    }

    /// Create an empty section last in the parent section; returns its path
    pub fn create_section(&mut self, title: &str, parent: Option<&str>) -> Result<String> {
        let parent = self.section_path(parent)?;
        let name = nameify(title)?;
        let dir = self.dir_of(&parent);
        if name_in_use(&dir, &name) {
            return Err(BookError::NameInUse(name).into());
        }

        fs::create_dir(dir.join(&name))?;
        let mut frontmatter = Frontmatter::new();
        if name != title.trim() {
            frontmatter.set("title", title.trim());
        }
        fs::write(
            dir.join(&name).join(INDEX_FILE),
            join_frontmatter(&frontmatter, "")?,
        )?;

        self.append_entry(&parent, &name)?;
        Ok(join_path(&parent, &name))
    }

    /// Replace the Markdown content of the book (empty path) or an item
    pub fn write_content(&mut self, path: &str, content: &str) -> Result<()> {
        let content = cleanup_content(content);
        self.update_file(path, |_, current| *current = content)
    }

    /// Set the status of a text
    pub fn set_status(&mut self, path: &str, status: Status) -> Result<()> {
        if self.item(path)?.is_section() {
            return Err(BookError::WrongKind(format!("section '{}'", path)).into());
        }
        self.update_file(path, |frontmatter, _| {
            frontmatter.set("status", status.name())
        })
    }

    /// Set the display title of the book (empty path) or an item; empty reverts to the name
    pub fn set_title(&mut self, path: &str, title: &str) -> Result<()> {
        let title = title.trim().to_string();
        self.update_file(path, |frontmatter, _| frontmatter.set("title", title))
    }

    /// Set an arbitrary frontmatter value of the book (empty path) or an item
    pub fn set_frontmatter(
        &mut self,
        path: &str,
        key: &str,
        value: serde_yaml::Value,
    ) -> Result<()> {
        self.update_file(path, |frontmatter, _| frontmatter.set(key, value))
    }

    /// Give the item a new name; returns the new path
    pub fn rename(&mut self, path: &str, new_name: &str) -> Result<String> {
        let item = self.item(path)?;
        let name = nameify(new_name)?;
        if name == item.name {
            return Ok(path.to_string());
        }
        let parent = parent_of(path).to_string();
        let dir = self.dir_of(&parent);
        if name_in_use(&dir, &name) {
            return Err(BookError::NameInUse(name).into());
        }
        fs::rename(item.abspath(&self.abspath), target_path(&dir, &name, item.kind))?;

        let mut order = order_of(&self.items);
        let siblings = container_mut(&mut order, &parent)?;
        let index = position(siblings, name_of(path))?;
        siblings[index].name = name.clone();
        self.save_order(order)?;
        Ok(join_path(&parent, &name))
    }

    /// Move the item one step later among its siblings; the last wraps to first
    pub fn move_forward(&mut self, path: &str) -> Result<()> {
        self.item(path)?;
        let mut order = order_of(&self.items);
        let siblings = container_mut(&mut order, parent_of(path))?;
        let index = position(siblings, name_of(path))?;
        let entry = siblings.remove(index);
        if index == siblings.len() {
            siblings.insert(0, entry);
        } else {
            siblings.insert(index + 1, entry);
        }
        self.save_order(order)
    }

    /// Move the item one step earlier among its siblings; the first wraps to last
    pub fn move_backward(&mut self, path: &str) -> Result<()> {
        self.item(path)?;
        let mut order = order_of(&self.items);
        let siblings = container_mut(&mut order, parent_of(path))?;
        let index = position(siblings, name_of(path))?;
        let entry = siblings.remove(index);
        if index == 0 {
            siblings.push(entry);
        } else {
            siblings.insert(index - 1, entry);
        }
        self.save_order(order)
    }

    /// Move the item out of its section, placing it right after the section.
    /// No change at top level. Returns the new path.
    pub fn move_outof(&mut self, path: &str) -> Result<String> {
        let item = self.item(path)?;
        let parent = parent_of(path).to_string();
        if parent.is_empty() {
            return Ok(path.to_string());
        }
        let grandparent = parent_of(&parent).to_string();
        let name = item.name.clone();
        let dir = self.dir_of(&grandparent);
        if name_in_use(&dir, &name) {
            return Err(BookError::Collision(join_path(&grandparent, &name)).into());
        }
        fs::rename(item.abspath(&self.abspath), target_path(&dir, &name, item.kind))?;

        let mut order = order_of(&self.items);
        let entry = {
            let siblings = container_mut(&mut order, &parent)?;
            let index = position(siblings, &name)?;
            siblings.remove(index)
        };
        let container = container_mut(&mut order, &grandparent)?;
        let index = position(container, name_of(&parent))?;
        container.insert(index + 1, entry);
        self.save_order(order)?;
        Ok(join_path(&grandparent, &name))
    }

    /// Move the item into the closest preceding sibling section, as its last item.
    /// No change without such a section. Returns the new path.
    pub fn move_into(&mut self, path: &str) -> Result<String> {
        let item = self.item(path)?;
        let Some(target) = self.prev_section(path) else {
            return Ok(path.to_string());
        };
        let target = target.path.clone();
        let name = item.name.clone();
        let dir = self.dir_of(&target);
        if name_in_use(&dir, &name) {
            return Err(BookError::Collision(join_path(&target, &name)).into());
        }
        fs::rename(item.abspath(&self.abspath), target_path(&dir, &name, item.kind))?;

        let mut order = order_of(&self.items);
        let entry = {
            let siblings = container_mut(&mut order, parent_of(path))?;
            let index = position(siblings, &name)?;
            siblings.remove(index)
        };
        container_mut(&mut order, &target)?.push(entry);
        self.save_order(order)?;
        Ok(join_path(&target, &name))
    }

    /// Copy the item next to itself as `<name>_copy`, `<name>_copy_2`, ...
    /// Returns the path of the copy.
    pub fn copy_item(&mut self, path: &str) -> Result<String> {
        let item = self.item(path)?.clone();
        let parent = parent_of(path).to_string();
        let dir = self.dir_of(&parent);
        let (name, number) = copy_name(&dir, &item.name)?;
        let title = format!("{}{}", item.title(), copy_suffix(number));

        match item.kind {
            ItemKind::Text => {
                let mut frontmatter = item.frontmatter.clone();
                frontmatter.set("title", title.as_str());
                fs::write(
                    dir.join(format!("{}.md", name)),
                    join_frontmatter(&frontmatter, &item.content)?,
                )?;
            }
            ItemKind::Section => {
                copy_tree(&item.abspath(&self.abspath), &dir.join(&name))?;
                let index_path = dir.join(&name).join(INDEX_FILE);
                let mut frontmatter = item.frontmatter.clone();
                frontmatter.set("title", title.as_str());
                fs::write(&index_path, join_frontmatter(&frontmatter, &item.content)?)?;
            }
        }

        let mut order = order_of(&self.items);
        let siblings = container_mut(&mut order, &parent)?;
        let index = position(siblings, &item.name)?;
        let mut entry = siblings[index].clone();
        entry.name = name.clone();
        entry.title = Some(title);
        siblings.insert(index + 1, entry);
        self.save_order(order)?;

        tracing::debug!("Copied '{}' to '{}' in book '{}'", path, name, self.bid);
        Ok(join_path(&parent, &name))
    }

    /// Convert a text into a section of the same name holding the text.
    /// Returns the new path of the text.
    pub fn to_section(&mut self, path: &str) -> Result<String> {
        let item = self.item(path)?;
        if item.is_section() {
            return Err(BookError::WrongKind(format!("section '{}'", path)).into());
        }
        let parent = parent_of(path).to_string();
        let name = item.name.clone();
        let section_dir = self.dir_of(&parent).join(&name);
        if section_dir.exists() {
            return Err(BookError::NameInUse(name).into());
        }

        let mut frontmatter = Frontmatter::new();
        if let Some(title) = item.frontmatter.title() {
            frontmatter.set("title", title);
        }
        let text_path = item.abspath(&self.abspath);
        fs::create_dir(&section_dir)?;
        fs::rename(text_path, section_dir.join(format!("{}.md", name)))?;
        fs::write(section_dir.join(INDEX_FILE), join_frontmatter(&frontmatter, "")?)?;

        let mut order = order_of(&self.items);
        let siblings = container_mut(&mut order, &parent)?;
        let index = position(siblings, &name)?;
        let text_entry = siblings[index].clone();
        siblings[index] = ItemOrder {
            name: name.clone(),
            title: text_entry.title.clone(),
            items: vec![text_entry],
        };
        self.save_order(order)?;
        Ok(join_path(path, &name))
    }

    /// Delete the item; a section with items requires `force`
    pub fn delete_item(&mut self, path: &str, force: bool) -> Result<()> {
        let item = self.item(path)?;
        match item.kind {
            ItemKind::Section => {
                if !item.items.is_empty() && !force {
                    return Err(BookError::NotEmpty(format!("section '{}'", path)).into());
                }
                fs::remove_dir_all(item.abspath(&self.abspath))?;
            }
            ItemKind::Text => fs::remove_file(item.abspath(&self.abspath))?,
        }

        let mut order = order_of(&self.items);
        let siblings = container_mut(&mut order, parent_of(path))?;
        let index = position(siblings, name_of(path))?;
        siblings.remove(index);
        self.save_order(order)?;

        tracing::info!("Deleted '{}' from book '{}'", path, self.bid);
        Ok(())
    }

    /// Directory of the book (empty path) or a section
    fn dir_of(&self, section: &str) -> PathBuf {
        if section.is_empty() {
            self.abspath.clone()
        } else {
            self.abspath.join(section)
        }
    }

    /// Validate an optional parent; it must be a section
    fn section_path(&self, parent: Option<&str>) -> Result<String> {
        match parent.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
            None => Ok(String::new()),
            Some(path) => {
                if self.item(path)?.is_section() {
                    Ok(path.to_string())
                } else {
                    Err(BookError::WrongKind(format!("text '{}'", path)).into())
                }
            }
        }
    }

    fn append_entry(&mut self, parent: &str, name: &str) -> Result<()> {
        let mut order = order_of(&self.items);
        container_mut(&mut order, parent)?.push(ItemOrder {
            name: name.to_string(),
            title: None,
            items: Vec::new(),
        });
        self.save_order(order)
    }

    /// Store the order in the book frontmatter, write it and re-read the book
    fn save_order(&mut self, order: Vec<ItemOrder>) -> Result<()> {
        self.frontmatter.set_items_order(&order);
        self.write_index()?;
        self.reload()
    }

    /// Modify frontmatter and content of the book (empty path) or an item, then re-read
    fn update_file(
        &mut self,
        path: &str,
        update: impl FnOnce(&mut Frontmatter, &mut String),
    ) -> Result<()> {
        if path.is_empty() {
            update(&mut self.frontmatter, &mut self.content);
            self.write_index()?;
            return self.reload();
        }
        let item: &Item = self.item(path)?;
        let mut frontmatter = item.frontmatter.clone();
        let mut content = item.content.clone();
        let file = item.content_path(&self.abspath);
        update(&mut frontmatter, &mut content);
        fs::write(file, join_frontmatter(&frontmatter, &content)?)?;
        self.reload()
    }
}

/// Whether a text or section of the name exists in the directory
fn name_in_use(dir: &Path, name: &str) -> bool {
    dir.join(name).exists() || dir.join(format!("{}.md", name)).exists()
}

fn target_path(dir: &Path, name: &str, kind: ItemKind) -> PathBuf {
    match kind {
        ItemKind::Text => dir.join(format!("{}.md", name)),
        ItemKind::Section => dir.join(name),
    }
}

/// First free copy name and its number
fn copy_name(dir: &Path, name: &str) -> Result<(String, usize)> {
    for number in 1..=MAX_COPIES {
        let candidate = if number == 1 {
            format!("{}_copy", name)
        } else {
            format!("{}_copy_{}", name, number)
        };
        if !name_in_use(dir, &candidate) {
            return Ok((candidate, number));
        }
    }
    Err(BookError::TooManyCopies(name.to_string()).into())
}

fn copy_suffix(number: usize) -> String {
    if number == 1 {
        " (copy)".to_string()
    } else {
        format!(" (copy {})", number)
    }
}

/// Items of the book (empty path) or the section in the order tree
fn container_mut<'a>(order: &'a mut Vec<ItemOrder>, section: &str) -> Result<&'a mut Vec<ItemOrder>> {
    let mut current = order;
    if section.is_empty() {
        return Ok(current);
    }
    for name in section.split('/') {
        current = &mut current
            .iter_mut()
            .find(|entry| entry.name == name)
            .ok_or_else(|| BookError::NoSuchItem(section.to_string()))?
            .items;
    }
    Ok(current)
}

fn position(entries: &[ItemOrder], name: &str) -> Result<usize> {
    entries
        .iter()
        .position(|entry| entry.name == name)
        .ok_or_else(|| BookError::NoSuchItem(name.to_string()).into())
}

/// Recursively copy a directory
pub(crate) fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let destination = target.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_book() -> (TempDir, Book) {
        let tmp = TempDir::new().unwrap();
        let book = Book::create(tmp.path(), "Test Book").unwrap();
        (tmp, book)
    }

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_create_items() {
        let (_tmp, mut book) = new_book();
        assert_eq!(book.bid, "test-book");
        assert_eq!(book.title(), "Test Book");

        let part = book.create_section("Part One", None).unwrap();
        let text = book.create_text("Opening", Some(&part)).unwrap();
        assert_eq!(text, "part-one/opening");

        let item = book.item(&text).unwrap();
        assert_eq!(item.title(), "Opening");
        assert_eq!(item.status(), Status::Started);
        assert!(book.abspath.join("part-one/opening.md").is_file());

        let err = book.create_text("opening", Some(&part)).unwrap_err();
        assert!(matches!(
            err,
            crate::MdbookError::Book(BookError::NameInUse(_))
        ));
    }

    #[test]
    fn test_forward_backward_wrap() {
        let (_tmp, mut book) = new_book();
        for title in ["a", "b", "c"] {
            book.create_text(title, None).unwrap();
        }
        book.move_forward("a").unwrap();
        assert_eq!(names(&book.items), vec!["b", "a", "c"]);
        book.move_forward("c").unwrap();
        assert_eq!(names(&book.items), vec!["c", "b", "a"]);
        book.move_backward("c").unwrap();
        assert_eq!(names(&book.items), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_into_and_outof() {
        let (_tmp, mut book) = new_book();
        book.create_section("s", None).unwrap();
        book.create_text("t", None).unwrap();

        let inside = book.move_into("t").unwrap();
        assert_eq!(inside, "s/t");
        assert!(book.abspath.join("s/t.md").is_file());
        assert_eq!(names(&book.item("s").unwrap().items), vec!["t"]);

        let outside = book.move_outof("s/t").unwrap();
        assert_eq!(outside, "t");
        assert_eq!(names(&book.items), vec!["s", "t"]);

        // No preceding section: unchanged
        book.move_backward("t").unwrap();
        assert_eq!(book.move_into("t").unwrap(), "t");
    }

    #[test]
    fn test_outof_collision() {
        let (_tmp, mut book) = new_book();
        book.create_section("s", None).unwrap();
        book.create_text("t", Some("s")).unwrap();
        book.create_text("t", None).unwrap();
        let err = book.move_outof("s/t").unwrap_err();
        assert!(matches!(err, crate::MdbookError::Book(BookError::Collision(_))));
    }

    #[test]
    fn test_copy_item_names() {
        let (_tmp, mut book) = new_book();
        book.create_text("Draft Text", None).unwrap();
        let first = book.copy_item("draft-text").unwrap();
        let second = book.copy_item("draft-text").unwrap();
        assert_eq!(first, "draft-text_copy");
        assert_eq!(second, "draft-text_copy_2");
        assert_eq!(book.item(&first).unwrap().title(), "Draft Text (copy)");
        assert_eq!(book.item(&second).unwrap().title(), "Draft Text (copy 2)");
        assert_eq!(
            names(&book.items),
            vec!["draft-text", "draft-text_copy_2", "draft-text_copy"]
        );
    }

    #[test]
    fn test_copy_item_limit() {
        let (_tmp, mut book) = new_book();
        book.create_text("Note", None).unwrap();
        for _ in 0..MAX_COPIES {
            book.copy_item("note").unwrap();
        }
        assert!(book.item("note_copy_20").is_ok());
        assert!(matches!(
            book.copy_item("note"),
            Err(crate::MdbookError::Book(BookError::TooManyCopies(_)))
        ));
        assert_eq!(book.items.len(), MAX_COPIES + 1);
    }

    #[test]
    fn test_to_section_and_delete() {
        let (_tmp, mut book) = new_book();
        book.create_text("chapter", None).unwrap();
        book.write_content("chapter", "Some text.   \n\n\n\nMore.").unwrap();

        let text = book.to_section("chapter").unwrap();
        assert_eq!(text, "chapter/chapter");
        assert_eq!(book.item(&text).unwrap().content, "Some text.\n\nMore.");
        assert!(book.item("chapter").unwrap().is_section());

        let err = book.delete_item("chapter", false).unwrap_err();
        assert!(matches!(err, crate::MdbookError::Book(BookError::NotEmpty(_))));
        book.delete_item("chapter", true).unwrap();
        assert!(book.items.is_empty());
        assert!(!book.abspath.join("chapter").exists());
    }

    #[test]
    fn test_rename_and_status() {
        let (_tmp, mut book) = new_book();
        book.create_text("old", None).unwrap();
        book.set_status("old", Status::Revised).unwrap();
        let path = book.rename("old", "New Name").unwrap();
        assert_eq!(path, "new-name");
        assert_eq!(book.item(&path).unwrap().status(), Status::Revised);
        assert!(book.get("old").is_none());
    }

    #[test]
    fn test_copy_and_delete_book() {
        let (tmp, mut book) = new_book();
        book.create_text("x", None).unwrap();
        let copy = book.copy_book(Some("admin")).unwrap();
        assert_eq!(copy.bid, "test-book_copy");
        assert_eq!(copy.title(), "Test Book (copy)");
        assert_eq!(copy.owner().as_deref(), Some("admin"));
        assert!(copy.get("x").is_some());

        assert!(book.clone().delete(false).is_err());
        book.delete(true).unwrap();
        assert!(!tmp.path().join("test-book").exists());
    }
}
