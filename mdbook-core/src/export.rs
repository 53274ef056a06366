//! Export planning
//!
//! A book, or one item of it, is laid out as a [`Document`]: an ordered
//! list of [`Part`]s with footnotes renumbered per scope and the
//! references and index parts collected. Encoders only render parts.

use crate::book::{Book, Item};
use crate::encoder::encoder_for_format;
use crate::error::{ConversionError, Result};
use crate::references::{format_authors, Reference, References};
use crate::types::{visit_inlines, visit_inlines_mut, Block, Inline, Status};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Write;

/// Deepest heading level encoders render
pub const MAX_HEADING_LEVEL: usize = 6;

/// Where footnote bodies are placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FootnotesLocation {
    #[serde(rename = "after each text")]
    AfterEachText,
    #[default]
    #[serde(rename = "after each chapter")]
    AfterEachChapter,
    #[serde(rename = "at end of book")]
    AtEndOfBook,
}

/// Character style for indexed terms and citations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Italic,
    Bold,
    Underline,
}

/// What the index lists for each location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexXref {
    #[default]
    Heading,
    Ordinal,
}

/// Export settings, read from the `docx` or `pdf` mapping of the book frontmatter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Status and creation time on the title page
    pub title_page_metadata: bool,
    /// Page break before items at this level or shallower
    pub page_break_level: usize,
    pub footnotes_location: FootnotesLocation,
    pub indexed_font: Option<FontStyle>,
    pub reference_font: Option<FontStyle>,
    /// Table of contents after the title page
    pub contents_pages: bool,
    pub contents_level: usize,
    pub indexed_xref: IndexXref,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            title_page_metadata: true,
            page_break_level: 1,
            footnotes_location: FootnotesLocation::default(),
            indexed_font: None,
            reference_font: None,
            contents_pages: true,
            contents_level: 1,
            indexed_xref: IndexXref::default(),
        }
    }
}

impl ExportSettings {
    /// Settings from a frontmatter mapping; missing keys take their defaults
    pub fn from_mapping(mapping: &serde_yaml::Mapping) -> std::result::Result<Self, ConversionError> {
        serde_yaml::from_value(serde_yaml::Value::Mapping(mapping.clone()))
            .map_err(|e| ConversionError::InvalidSettings(e.to_string()))
    }

    /// Settings stored in the book under the key, e.g. `docx`
    pub fn for_book(book: &Book, key: &str) -> std::result::Result<Self, ConversionError> {
        match book.export_settings(key) {
            Some(mapping) => Self::from_mapping(mapping),
            None => Ok(Self::default()),
        }
    }
}

/// Title page of a whole-book export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitlePage {
    pub title: String,
    pub subtitle: Option<String>,
    pub authors: Vec<String>,
    /// The book's own content
    pub body: Vec<Block>,
    pub status: Option<Status>,
    /// Local time as `YYYY-MM-DD HH:MM:SS`
    pub created: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentsEntry {
    pub level: usize,
    pub text: String,
}

/// A footnote body with its number within the scope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Footnote {
    pub number: usize,
    pub content: Vec<Block>,
}

/// A canonical term and where it is used
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexLine {
    pub term: String,
    pub locations: Vec<String>,
}

/// One element of an exported document, in output order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Part {
    TitlePage(TitlePage),
    /// Document title of a single-item export
    Title(String),
    Contents(Vec<ContentsEntry>),
    PageBreak,
    Heading {
        level: usize,
        text: String,
        /// Listed in the table of contents
        outlined: bool,
    },
    /// Content with footnote definitions removed and references renumbered
    Body(Vec<Block>),
    Footnotes(Vec<Footnote>),
    References(Vec<Reference>),
    Index(Vec<IndexLine>),
}

/// A book or item laid out for an encoder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub title: String,
    pub subtitle: Option<String>,
    pub authors: Vec<String>,
    pub language: Option<String>,
    pub settings: ExportSettings,
    pub parts: Vec<Part>,
}

impl Document {
    /// Headings of the given parts, for tests and summaries
    pub fn headings(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Heading { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Lay out the whole book, or the item at `path`
pub fn plan(
    book: &Book,
    references: Option<&References>,
    path: Option<&str>,
    settings: &ExportSettings,
) -> Result<Document> {
    let mut planner = Planner::new(book, settings);

    match path {
        None => {
            planner.title_page();
            if settings.contents_pages && !book.items.is_empty() {
                planner.contents();
            }
            for item in &book.items {
                planner.item(item);
                planner.end_chapter(item);
            }
        }
        Some(path) => {
            let item = book.item(path)?;
            planner.parts.push(Part::Title(item.title()));
            let chapter = book.chapter(path).unwrap_or(item);
            if item.is_section() {
                for child in &item.items {
                    planner.item(child);
                }
            } else {
                planner.item(item);
            }
            planner.end_chapter(chapter);
        }
    }

    planner.end_book();
    if let Some(references) = references {
        planner.references(references);
    }
    planner.index();

    tracing::debug!(
        "Planned export of '{}' with {} parts",
        book.bid,
        planner.parts.len()
    );
    Ok(Document {
        title: book.title(),
        subtitle: book.subtitle(),
        authors: book.authors(),
        language: book.language(),
        settings: settings.clone(),
        parts: planner.parts,
    })
}

/// Plan and encode in one step; the format names the encoder
pub fn export(
    book: &Book,
    references: Option<&References>,
    path: Option<&str>,
    format: &str,
    writer: &mut dyn Write,
) -> Result<()> {
    let encoder = encoder_for_format(format)
        .ok_or_else(|| ConversionError::UnsupportedFormat(format.to_string()))?;
    let settings = ExportSettings::for_book(book, encoder.settings_key())?;
    let document = plan(book, references, path, &settings)?;
    encoder.encode(&document, writer)?;
    tracing::info!(
        "Exported '{}' as {}",
        path.unwrap_or(book.bid.as_str()),
        encoder.format_name()
    );
    Ok(())
}

/// Runs of a references entry: the bold name, the authors, the
/// type-specific description and the external links
pub fn reference_inlines(reference: &Reference) -> Vec<Inline> {
    use crate::references::ReferenceType;

    let mut inlines = vec![
        Inline::bold(vec![Inline::text(&reference.name)]),
        Inline::text("  "),
    ];
    let authors = format_authors(&reference.authors, None);
    if !authors.is_empty() {
        inlines.push(Inline::text(format!("{} ", authors)));
    }

    match reference.kind {
        ReferenceType::Article => {
            inlines.push(Inline::text(format!(
                "({}) {}. ",
                reference.year,
                reference.full_title()
            )));
            if let Some(journal) = &reference.journal {
                inlines.push(Inline::italic(vec![Inline::text(format!("{} ", journal))]));
            }
            if let Some(volume) = &reference.volume {
                inlines.push(Inline::text(format!("{} ", volume)));
                if let Some(number) = &reference.number {
                    inlines.push(Inline::text(format!("({})", number)));
                }
            }
            if let Some(pages) = reference.pages_display() {
                inlines.push(Inline::text(format!(": pp. {}.", pages)));
            }
        }
        ReferenceType::Book => {
            inlines.push(Inline::text(format!("({}). ", reference.year)));
            inlines.push(Inline::italic(vec![Inline::text(format!(
                "{}. ",
                reference.full_title()
            ))]));
            if let Some(publisher) = &reference.publisher {
                inlines.push(Inline::text(format!("{}. ", publisher)));
            }
        }
        ReferenceType::Link => {
            inlines.push(Inline::text(format!("({}). ", reference.year)));
            let title = reference.full_title();
            match &reference.url {
                Some(url) => inlines.push(Inline::link(vec![Inline::text(title)], url)),
                None => inlines.push(Inline::text(title)),
            }
            if let Some(accessed) = &reference.accessed {
                inlines.push(Inline::text(format!(" Accessed {}.", accessed)));
            }
        }
    }

    for (position, (label, url)) in reference.links().into_iter().enumerate() {
        inlines.push(Inline::text(if position == 0 { "  " } else { ", " }));
        inlines.push(Inline::link(vec![Inline::text(label)], url));
    }
    inlines
}

struct Planner<'a> {
    book: &'a Book,
    settings: &'a ExportSettings,
    parts: Vec<Part>,
    /// Footnotes of the current scope, numbered from 1
    notes: Vec<Footnote>,
    numbers: HashMap<(String, String), usize>,
    /// Chapter heading and notes, collected for the end of the book
    chapter_notes: Vec<(String, Vec<Footnote>)>,
    referenced: BTreeSet<String>,
    indexed: BTreeMap<String, BTreeSet<(Vec<usize>, String)>>,
}

impl<'a> Planner<'a> {
    fn new(book: &'a Book, settings: &'a ExportSettings) -> Self {
        Self {
            book,
            settings,
            parts: Vec::new(),
            notes: Vec::new(),
            numbers: HashMap::new(),
            chapter_notes: Vec::new(),
            referenced: BTreeSet::new(),
            indexed: BTreeMap::new(),
        }
    }

    fn title_page(&mut self) {
        let book = self.book;
        let (status, created) = if self.settings.title_page_metadata {
            let status = book
                .all_texts()
                .iter()
                .map(|t| t.status())
                .min()
                .unwrap_or(Status::Final);
            let created = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            (Some(status), Some(created))
        } else {
            (None, None)
        };

        let title = book.title();
        let body = self.body("", &[], &title, &book.ast);
        self.parts.push(Part::TitlePage(TitlePage {
            title,
            subtitle: book.subtitle(),
            authors: book.authors(),
            body,
            status,
            created,
        }));
        // Notes of the book's own content follow the title page
        self.end_text();
    }

    fn contents(&mut self) {
        let level = self.settings.contents_level;
        let entries = self
            .book
            .all_items()
            .into_iter()
            .filter(|item| item.level() <= level)
            .map(|item| ContentsEntry {
                level: item.level(),
                text: item.heading(),
            })
            .collect();
        self.parts.push(Part::Contents(entries));
        self.parts.push(Part::PageBreak);
    }

    fn page_break(&mut self) {
        match self.parts.last() {
            None | Some(Part::PageBreak) | Some(Part::Title(_)) => {}
            Some(_) => self.parts.push(Part::PageBreak),
        }
    }

    fn item(&mut self, item: &Item) {
        let level = item.level();
        if level <= self.settings.page_break_level {
            self.page_break();
        }
        if !(item.is_text() && item.frontmatter.get_bool("suppress_title")) {
            self.parts.push(Part::Heading {
                level: level.clamp(1, MAX_HEADING_LEVEL),
                text: item.heading(),
                outlined: true,
            });
        }

        if item.is_text() {
            let body = self.body(&item.path, &item.ordinal, &item.heading(), &item.ast);
            if !body.is_empty() {
                self.parts.push(Part::Body(body));
            }
            if self.settings.footnotes_location == FootnotesLocation::AfterEachText {
                self.end_text();
            }
        } else {
            for child in &item.items {
                self.item(child);
            }
        }
    }

    /// Content with terms recorded and footnotes renumbered; the book itself has the empty path
    fn body(&mut self, path: &str, ordinal: &[usize], heading: &str, ast: &[Block]) -> Vec<Block> {
        let mut definitions: HashMap<&str, &[Block]> = HashMap::new();
        let mut blocks = Vec::new();
        for block in ast {
            match block {
                Block::Footnote { id, content } => {
                    definitions.insert(id.as_str(), content.as_slice());
                }
                other => blocks.push(other.clone()),
            }
        }

        let location = match self.settings.indexed_xref {
            IndexXref::Heading => heading.to_string(),
            IndexXref::Ordinal => ordinal_text(ordinal),
        };
        visit_inlines(ast, &mut |inline| match inline {
            Inline::Reference { id, .. } => {
                self.referenced.insert(id.clone());
            }
            Inline::Indexed { canonical, .. } => {
                self.indexed
                    .entry(canonical.clone())
                    .or_default()
                    .insert((ordinal.to_vec(), location.clone()));
            }
            _ => {}
        });

        visit_inlines_mut(&mut blocks, &mut |inline| {
            if let Inline::FootnoteRef { id } = inline {
                let key = (path.to_string(), id.clone());
                let number = match self.numbers.get(&key) {
                    Some(number) => *number,
                    None => {
                        let number = self.notes.len() + 1;
                        self.notes.push(Footnote {
                            number,
                            content: definitions
                                .get(id.as_str())
                                .map(|c| c.to_vec())
                                .unwrap_or_default(),
                        });
                        self.numbers.insert(key, number);
                        number
                    }
                };
                *id = number.to_string();
            }
        });
        blocks
    }

    fn take_notes(&mut self) -> Vec<Footnote> {
        self.numbers.clear();
        std::mem::take(&mut self.notes)
    }

    fn end_text(&mut self) {
        let notes = self.take_notes();
        if !notes.is_empty() {
            self.parts.push(Part::Heading {
                level: 6,
                text: "Footnotes".to_string(),
                outlined: false,
            });
            self.parts.push(Part::Footnotes(notes));
        }
    }

    fn end_chapter(&mut self, chapter: &Item) {
        match self.settings.footnotes_location {
            FootnotesLocation::AfterEachText => {}
            FootnotesLocation::AfterEachChapter => {
                let notes = self.take_notes();
                if !notes.is_empty() {
                    self.page_break();
                    self.parts.push(Part::Heading {
                        level: 4,
                        text: "Footnotes".to_string(),
                        outlined: false,
                    });
                    self.parts.push(Part::Footnotes(notes));
                }
            }
            FootnotesLocation::AtEndOfBook => {
                let notes = self.take_notes();
                if !notes.is_empty() {
                    self.chapter_notes.push((chapter.heading(), notes));
                }
            }
        }
    }

    fn end_book(&mut self) {
        if self.chapter_notes.is_empty() {
            return;
        }
        self.page_break();
        self.parts.push(Part::Heading {
            level: 1,
            text: "Footnotes".to_string(),
            outlined: true,
        });
        for (heading, notes) in std::mem::take(&mut self.chapter_notes) {
            self.parts.push(Part::Heading {
                level: 2,
                text: heading,
                outlined: false,
            });
            self.parts.push(Part::Footnotes(notes));
        }
    }

    fn references(&mut self, references: &References) {
        let entries: Vec<Reference> = self
            .referenced
            .iter()
            .filter_map(|id| references.get(id))
            .collect();
        if entries.is_empty() {
            return;
        }
        self.page_break();
        self.parts.push(Part::Heading {
            level: 1,
            text: "References".to_string(),
            outlined: true,
        });
        self.parts.push(Part::References(entries));
    }

    fn index(&mut self) {
        if self.indexed.is_empty() {
            return;
        }
        let mut lines: Vec<IndexLine> = std::mem::take(&mut self.indexed)
            .into_iter()
            .map(|(term, locations)| IndexLine {
                term,
                locations: locations.into_iter().map(|(_, label)| label).collect(),
            })
            .collect();
        lines.sort_by_key(|line| line.term.to_lowercase());

        self.page_break();
        self.parts.push(Part::Heading {
            level: 1,
            text: "Index".to_string(),
            outlined: true,
        });
        self.parts.push(Part::Index(lines));
    }
}

fn ordinal_text(ordinal: &[usize]) -> String {
    ordinal
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join(".")
}
