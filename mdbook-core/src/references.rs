//! Shared collection of references cited by books
//!
//! The references are texts of a book in the `references` directory of the
//! library. Each text's frontmatter holds the bibliographic fields; its
//! content holds free-form notes.

use crate::book::{Book, Item, INDEX_FILE};
use crate::error::{BookError, Result};
use crate::names::nameify;
use crate::types::{join_frontmatter, Frontmatter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Directory name of the references book within the library
pub const REFERENCES_DIR: &str = "references";

/// Number of authors shown before the list is cut short
pub const REFERENCE_MAX_AUTHORS: usize = 5;

pub const DOI_URL: &str = "https://doi.org/{value}";
pub const PUBMED_URL: &str = "https://pubmed.ncbi.nlm.nih.gov/{value}";
pub const ISBN_URL: &str = "https://isbnsearch.org/isbn/{value}";

/// Kind of publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceType {
    #[default]
    Article,
    Book,
    Link,
}

impl ReferenceType {
    pub fn name(&self) -> &'static str {
        match self {
            ReferenceType::Article => "article",
            ReferenceType::Book => "book",
            ReferenceType::Link => "link",
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReferenceType {
    type Err = BookError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "article" => Ok(ReferenceType::Article),
            "book" => Ok(ReferenceType::Book),
            "link" => Ok(ReferenceType::Link),
            other => Err(BookError::InvalidReference(format!(
                "unknown reference type '{}'",
                other
            ))),
        }
    }
}

/// A bibliographic reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    /// File name; `nameify` of the name
    pub id: String,

    /// Citation label, e.g. `Darwin 1859`
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ReferenceType,

    pub authors: Vec<String>,
    pub title: String,
    pub year: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition_published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessed: Option<String>,

    /// Free-form notes; the text content
    pub notes: String,
}

impl Reference {
    /// Read a reference from a text of the references book
    pub fn from_item(item: &Item) -> Self {
        let fm = &item.frontmatter;
        let opt = |key: &str| fm.get_string(key).filter(|s| !s.is_empty());
        Self {
            id: item.name.clone(),
            name: fm.get_string("name").unwrap_or_else(|| item.name.clone()),
            kind: opt("type")
                .and_then(|t| t.parse().ok())
                .unwrap_or_default(),
            authors: fm.get_strings("authors"),
            title: fm.get_string("title").unwrap_or_default(),
            year: fm.get_string("year").unwrap_or_default(),
            subtitle: opt("subtitle"),
            edition_published: opt("edition_published"),
            date: opt("date"),
            journal: opt("journal"),
            volume: opt("volume"),
            number: opt("number"),
            pages: opt("pages"),
            language: opt("language"),
            publisher: opt("publisher"),
            keywords: fm.get_strings("keywords"),
            issn: opt("issn"),
            isbn: opt("isbn"),
            pmid: opt("pmid"),
            doi: opt("doi"),
            url: opt("url"),
            accessed: opt("accessed"),
            notes: item.content.clone(),
        }
    }

    /// Frontmatter holding all fields except the notes
    pub fn to_frontmatter(&self) -> Frontmatter {
        let mut fm = Frontmatter::new();
        fm.set("id", self.id.as_str());
        fm.set("name", self.name.as_str());
        fm.set("type", self.kind.name());
        fm.set("authors", self.authors.clone());
        fm.set("title", self.title.as_str());
        fm.set("year", self.year.as_str());
        fm.set("keywords", self.keywords.clone());
        let optional = [
            ("subtitle", &self.subtitle),
            ("edition_published", &self.edition_published),
            ("date", &self.date),
            ("journal", &self.journal),
            ("volume", &self.volume),
            ("number", &self.number),
            ("pages", &self.pages),
            ("language", &self.language),
            ("publisher", &self.publisher),
            ("issn", &self.issn),
            ("isbn", &self.isbn),
            ("pmid", &self.pmid),
            ("doi", &self.doi),
            ("url", &self.url),
            ("accessed", &self.accessed),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                fm.set(key, value.as_str());
            }
        }
        fm
    }

    /// Title with subtitle, if any
    pub fn full_title(&self) -> String {
        match &self.subtitle {
            Some(subtitle) => format!("{}: {}", self.title, subtitle),
            None => self.title.clone(),
        }
    }

    /// Page range with `--` normalized to `-`
    pub fn pages_display(&self) -> Option<String> {
        self.pages.as_ref().map(|p| p.replace("--", "-"))
    }

    /// External links as (label, url): the URL, then DOI, PubMed and ISBN
    pub fn links(&self) -> Vec<(String, String)> {
        let mut links = Vec::new();
        if let Some(url) = &self.url {
            links.push((url.clone(), url.clone()));
        }
        let templated = [
            ("DOI", &self.doi, DOI_URL),
            ("PubMed", &self.pmid, PUBMED_URL),
            ("ISBN", &self.isbn, ISBN_URL),
        ];
        for (label, value, template) in templated {
            if let Some(value) = value {
                links.push((
                    format!("{}:{}", label, value),
                    template.replace("{value}", value),
                ));
            }
        }
        links
    }

    /// Family name of the first author
    fn first_family_name(&self) -> Option<String> {
        let first = self.authors.first()?;
        let family = match first.split_once(',') {
            Some((family, _)) => family.trim(),
            None => first.split_whitespace().last().unwrap_or_default(),
        };
        Some(family.to_string()).filter(|f| !f.is_empty())
    }
}

/// Person name in short form, given names as initials: `Kraulis, P.J.`
pub fn short_name(name: &str) -> String {
    let mut parts: Vec<String> = name.split(',').map(|p| p.trim().to_string()).collect();
    if parts.len() == 1 {
        return name.to_string();
    }
    let given = parts.pop().unwrap_or_default();
    let initials: String = given
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .map(|initial| format!("{}.", initial))
        .collect();
    parts.push(initials);
    parts.join(", ")
}

/// Author names in short form joined by `, ` with ` & ` before the last;
/// when `max` is given, longer lists are cut with `...`
pub fn format_authors(authors: &[String], max: Option<usize>) -> String {
    let shown: Vec<String> = authors
        .iter()
        .take(max.unwrap_or(usize::MAX))
        .map(|a| short_name(a))
        .collect();
    if shown.len() < authors.len() {
        return format!("{} ...", shown.join(", "));
    }
    match shown.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} & {}", rest.join(", "), last),
    }
}

/// The references book of a library
#[derive(Debug, Clone)]
pub struct References {
    book: Book,
}

impl References {
    /// Open the references book in the library directory, creating it when missing
    pub fn open(library_dir: &Path) -> Result<Self> {
        let dir = library_dir.join(REFERENCES_DIR);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            let mut frontmatter = Frontmatter::new();
            frontmatter.set("title", "References");
            fs::write(dir.join(INDEX_FILE), join_frontmatter(&frontmatter, "")?)?;
            tracing::info!("Created references book in {}", dir.display());
        }
        Ok(Self {
            book: Book::read(&dir)?,
        })
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn reload(&mut self) -> Result<()> {
        self.book.reload()
    }

    pub fn len(&self) -> usize {
        self.book.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.book.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.book.items.iter().any(|i| i.is_text() && i.name == id)
    }

    pub fn get(&self, id: &str) -> Option<Reference> {
        self.book
            .items
            .iter()
            .find(|i| i.is_text() && i.name == id)
            .map(Reference::from_item)
    }

    /// All references sorted by id
    pub fn all(&self) -> Vec<Reference> {
        let mut all: Vec<Reference> = self
            .book
            .items
            .iter()
            .filter(|i| i.is_text())
            .map(Reference::from_item)
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Add a reference; its name and id are formed from the first author's
    /// family name and the year, with a suffix `a`..`z` when already in use.
    pub fn create(&mut self, mut reference: Reference) -> Result<Reference> {
        if reference.authors.iter().all(|a| a.trim().is_empty()) {
            return Err(BookError::InvalidReference("at least one author is required".into()).into());
        }
        if reference.title.trim().is_empty() {
            return Err(BookError::InvalidReference("title is required".into()).into());
        }
        if reference.year.trim().is_empty() {
            return Err(BookError::InvalidReference("year is required".into()).into());
        }
        let family = reference
            .first_family_name()
            .ok_or_else(|| BookError::InvalidReference("invalid first author".into()))?;

        let base = format!("{} {}", family, reference.year.trim());
        let suffixes = std::iter::once(String::new()).chain(('a'..='z').map(String::from));
        let mut chosen = None;
        for suffix in suffixes {
            let name = format!("{}{}", base, suffix);
            let id = nameify(&name)?;
            if !self.contains(&id) && !self.book.abspath.join(format!("{}.md", id)).exists() {
                chosen = Some((name, id));
                break;
            }
        }
        let (name, id) = chosen.ok_or_else(|| BookError::NameInUse(base.clone()))?;

        reference.name = name;
        reference.id = id;
        reference.authors.retain(|a| !a.trim().is_empty());
        let content = join_frontmatter(&reference.to_frontmatter(), &reference.notes)?;
        fs::write(self.book.abspath.join(format!("{}.md", reference.id)), content)?;
        self.book.reload()?;

        tracing::info!("Created reference '{}'", reference.name);
        Ok(reference)
    }

    /// Remove a reference
    pub fn delete(&mut self, id: &str) -> Result<()> {
        if !self.contains(id) {
            return Err(BookError::NoSuchReference(id.to_string()).into());
        }
        self.book.delete_item(id, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn darwin() -> Reference {
        Reference {
            kind: ReferenceType::Book,
            authors: vec!["Darwin, Charles Robert".to_string()],
            title: "On the Origin of Species".to_string(),
            year: "1859".to_string(),
            isbn: Some("9780451529060".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("Kraulis, Per Johan"), "Kraulis, P.J.");
        assert_eq!(short_name("Plato"), "Plato");
    }

    #[test]
    fn test_format_authors() {
        let authors: Vec<String> = ["Watson, James", "Crick, Francis"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(format_authors(&authors, None), "Watson, J. & Crick, F.");

        let many: Vec<String> = (1..=7).map(|i| format!("A{}, B", i)).collect();
        assert_eq!(
            format_authors(&many, Some(REFERENCE_MAX_AUTHORS)),
            "A1, B., A2, B., A3, B., A4, B., A5, B. ..."
        );
    }

    #[test]
    fn test_links() {
        let reference = Reference {
            doi: Some("10.1038/171737a0".to_string()),
            pmid: Some("13054692".to_string()),
            ..Default::default()
        };
        assert_eq!(
            reference.links(),
            vec![
                (
                    "DOI:10.1038/171737a0".to_string(),
                    "https://doi.org/10.1038/171737a0".to_string()
                ),
                (
                    "PubMed:13054692".to_string(),
                    "https://pubmed.ncbi.nlm.nih.gov/13054692".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_create_with_suffixes() {
        let tmp = TempDir::new().unwrap();
        let mut references = References::open(tmp.path()).unwrap();
        assert!(references.is_empty());

        let first = references.create(darwin()).unwrap();
        assert_eq!(first.name, "Darwin 1859");
        assert_eq!(first.id, "darwin-1859");

        let second = references.create(darwin()).unwrap();
        assert_eq!(second.name, "Darwin 1859a");

        let stored = references.get("darwin-1859").unwrap();
        assert_eq!(stored.kind, ReferenceType::Book);
        assert_eq!(stored.isbn.as_deref(), Some("9780451529060"));
        assert_eq!(references.all().len(), 2);

        references.delete("darwin-1859a").unwrap();
        assert!(!references.contains("darwin-1859a"));
        assert!(references.delete("darwin-1859a").is_err());
    }

    #[test]
    fn test_create_requires_fields() {
        let tmp = TempDir::new().unwrap();
        let mut references = References::open(tmp.path()).unwrap();
        let mut missing_year = darwin();
        missing_year.year.clear();
        assert!(matches!(
            references.create(missing_year),
            Err(crate::MdbookError::Book(BookError::InvalidReference(_)))
        ));
    }

    #[test]
    fn test_type_parse() {
        assert_eq!("Link".parse::<ReferenceType>().unwrap(), ReferenceType::Link);
        assert!("poem".parse::<ReferenceType>().is_err());
    }
}
