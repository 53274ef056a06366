//! Typst-based PDF encoder
//!
//! This encoder writes a planned document as Typst markup. The output is
//! compiled to PDF with the `typst` CLI:
//!
//! ```text
//! typst compile book.typ book.pdf
//! ```

use crate::error::ConversionError;
use crate::export::{reference_inlines, Document, FontStyle, Footnote, IndexLine, Part, TitlePage};
use crate::types::{Block, Inline};
use std::io::Write;

/// PDF encoder using Typst
///
/// Outputs Typst source markup (.typ files).
pub struct TypstPdfEncoder {
    /// Page configuration
    pub page_config: PageConfig,
}

/// Page configuration for PDF output
#[derive(Debug, Clone)]
pub struct PageConfig {
    /// Page width (e.g., "210mm" for A4)
    pub width: String,
    /// Page height (e.g., "297mm" for A4)
    pub height: String,
    /// Margin on all sides
    pub margin: String,
    /// Base font size
    pub font_size: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width: "210mm".to_string(),
            height: "297mm".to_string(),
            margin: "25.4mm".to_string(),
            font_size: "12pt".to_string(),
        }
    }
}

impl TypstPdfEncoder {
    pub fn new() -> Self {
        Self {
            page_config: PageConfig::default(),
        }
    }

    /// Set page configuration
    pub fn with_page_config(mut self, config: PageConfig) -> Self {
        self.page_config = config;
        self
    }

    /// Convert a planned document to Typst markup
    pub fn document_to_typst(&self, document: &Document) -> String {
        let mut typst = String::new();

        let authors: Vec<String> = document
            .authors
            .iter()
            .map(|a| typst_string(a))
            .collect();
        typst.push_str(&format!(
            "#set document(title: {}, author: ({}))\n",
            typst_string(&document.title),
            authors.iter().map(|a| format!("{},", a)).collect::<String>()
        ));

        // Page number right-aligned in the header
        typst.push_str(&format!(
            r#"#set page(
  width: {},
  height: {},
  margin: {},
  header: context align(right, counter(page).display()),
)

#set text(size: {}, lang: {})

"#,
            self.page_config.width,
            self.page_config.height,
            self.page_config.margin,
            self.page_config.font_size,
            typst_string(&language_code(document.language.as_deref())),
        ));

        let writer = PartWriter { document };
        for part in &document.parts {
            typst.push_str(&writer.part(part));
        }
        typst
    }
}

impl Default for TypstPdfEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl super::Encoder for TypstPdfEncoder {
    fn encode(&self, document: &Document, writer: &mut dyn Write) -> Result<(), ConversionError> {
        let typst_source = self.document_to_typst(document);

        // Users can compile to PDF using: typst compile output.typ output.pdf
        writer
            .write_all(typst_source.as_bytes())
            .map_err(|e| ConversionError::EncodingFailed(e.to_string()))?;

        Ok(())
    }

    fn format_name(&self) -> &str {
        "Typst"
    }

    fn file_extension(&self) -> &str {
        "typ"
    }

    fn mime_type(&self) -> &str {
        "text/x-typst"
    }

    fn settings_key(&self) -> &str {
        "pdf"
    }
}

struct PartWriter<'a> {
    document: &'a Document,
}

impl PartWriter<'_> {
    fn part(&self, part: &Part) -> String {
        match part {
            Part::TitlePage(page) => self.title_page(page),
            Part::Title(title) => format!(
                "#align(center, text(size: 20pt, weight: \"bold\")[{}])\n\n",
                escape_typst(title)
            ),
            Part::Contents(_) => format!(
                "#outline(title: [Contents], depth: {})\n\n",
                self.document.settings.contents_level.max(1)
            ),
            Part::PageBreak => "#pagebreak(weak: true)\n\n".to_string(),
            Part::Heading {
                level,
                text,
                outlined,
            } => {
                if *outlined {
                    format!("{} {}\n\n", "=".repeat(*level), escape_typst(text))
                } else {
                    format!(
                        "#heading(level: {}, outlined: false)[{}]\n\n",
                        level,
                        escape_typst(text)
                    )
                }
            }
            Part::Body(blocks) => self.blocks_to_typst(blocks),
            Part::Footnotes(notes) => notes.iter().map(|n| self.footnote(n)).collect(),
            Part::References(references) => references
                .iter()
                .map(|r| format!("{}\n\n", self.inlines_to_typst(&reference_inlines(r))))
                .collect(),
            Part::Index(lines) => lines.iter().map(index_line).collect(),
        }
    }

    fn title_page(&self, page: &TitlePage) -> String {
        let mut typst = format!(
            "#align(center)[\n  #v(20%)\n  #text(size: 24pt, weight: \"bold\")[{}]\n",
            escape_typst(&page.title)
        );
        if let Some(subtitle) = &page.subtitle {
            typst.push_str(&format!(
                "  #v(0.5em)\n  #text(size: 16pt, style: \"italic\")[{}]\n",
                escape_typst(subtitle)
            ));
        }
        typst.push_str("  #v(1em)\n");
        for author in &page.authors {
            typst.push_str(&format!("  #text(size: 14pt)[{}]\n\n", escape_typst(author)));
        }
        typst.push_str("]\n\n");

        typst.push_str(&self.blocks_to_typst(&page.body));
        if let Some(status) = page.status {
            typst.push_str(&format!("Status: {}\n\n", status));
        }
        if let Some(created) = &page.created {
            typst.push_str(&format!("Created: {}\n\n", escape_typst(created)));
        }
        typst
    }

    fn footnote(&self, note: &Footnote) -> String {
        let content = self.blocks_to_typst(&note.content);
        format!("#super[*{}*] {}\n\n", note.number, content.trim())
    }

    /// Convert blocks to Typst
    fn blocks_to_typst(&self, blocks: &[Block]) -> String {
        let mut typst = String::new();
        for block in blocks {
            typst.push_str(&self.block_to_typst(block));
            typst.push('\n');
        }
        typst
    }

    /// Convert a single Block to Typst
    fn block_to_typst(&self, block: &Block) -> String {
        match block {
            Block::Header {
                level,
                content,
                anchor,
            } => {
                let prefix = "=".repeat((*level as usize).clamp(1, 6));
                let label = anchor
                    .as_ref()
                    .map(|a| format!(" <{}>", a))
                    .unwrap_or_default();
                format!("{} {}{}\n", prefix, self.inlines_to_typst(content), label)
            }
            Block::Paragraph(inlines) => {
                format!("{}\n", self.inlines_to_typst(inlines))
            }
            Block::List { items, ordered } => {
                let mut typst = String::new();
                for (i, item) in items.iter().enumerate() {
                    let marker = if *ordered {
                        format!("{}. ", i + 1)
                    } else {
                        "- ".to_string()
                    };
                    // Continuation lines are indented to stay inside the item
                    let content = self.blocks_to_typst(item).trim().replace('\n', "\n  ");
                    typst.push_str(&format!("{}{}\n", marker, content));
                }
                typst
            }
            Block::Image { url, alt } => {
                let label = if alt.is_empty() { url } else { alt };
                format!(
                    "#align(center)[#link({})[{}]]\n",
                    typst_string(url),
                    escape_typst(label)
                )
            }
            Block::CodeBlock { lang, code } => {
                let lang_str = lang.as_deref().unwrap_or("");
                // Use Typst raw block if code contains backticks
                if code.contains("```") {
                    if lang_str.is_empty() {
                        format!("#raw(block: true, {})\n", typst_string(code))
                    } else {
                        format!(
                            "#raw(block: true, lang: {}, {})\n",
                            typst_string(lang_str),
                            typst_string(code)
                        )
                    }
                } else {
                    format!("```{}\n{}\n```\n", lang_str, code.trim_end_matches('\n'))
                }
            }
            Block::Blockquote(blocks) => {
                let content = self.blocks_to_typst(blocks);
                format!("#quote(block: true)[\n{}\n]\n", content.trim_end())
            }
            Block::ThematicBreak => "#align(center)[\u{2014}\u{2014}\u{2014}]\n".to_string(),
            Block::Table(table) => {
                let cols = table
                    .headers
                    .len()
                    .max(table.rows.first().map(|r| r.len()).unwrap_or(0));
                let mut typst = format!("#table(\n  columns: {},\n", cols);

                for cell in &table.headers {
                    typst.push_str(&format!(
                        "  [*{}*],\n",
                        self.inlines_to_typst(&cell.content)
                    ));
                }

                for row in &table.rows {
                    for cell in row {
                        typst.push_str(&format!("  [{}],\n", self.inlines_to_typst(&cell.content)));
                    }
                }

                typst.push_str(")\n");
                typst
            }
            // Definitions are moved to footnotes parts when planning
            Block::Footnote { .. } => String::new(),
        }
    }

    /// Convert inlines to Typst
    fn inlines_to_typst(&self, inlines: &[Inline]) -> String {
        let mut typst = String::new();
        for inline in inlines {
            typst.push_str(&self.inline_to_typst(inline));
        }
        typst
    }

    /// Convert a single Inline to Typst
    fn inline_to_typst(&self, inline: &Inline) -> String {
        let settings = &self.document.settings;
        match inline {
            Inline::Text(s) => escape_typst(s),
            Inline::Bold(children) => {
                format!("#strong[{}]", self.inlines_to_typst(children))
            }
            Inline::Italic(children) => {
                format!("#emph[{}]", self.inlines_to_typst(children))
            }
            Inline::Code(s) => format!("#raw({})", typst_string(s)),
            Inline::Link { children, url } => {
                format!("#link({})[{}]", typst_string(url), self.inlines_to_typst(children))
            }
            Inline::Superscript(children) => {
                format!("#super[{}]", self.inlines_to_typst(children))
            }
            Inline::Subscript(children) => {
                format!("#sub[{}]", self.inlines_to_typst(children))
            }
            Inline::FootnoteRef { id } => {
                format!("#super[#strong[{}]]", escape_typst(id))
            }
            Inline::Indexed { term, .. } => styled(&escape_typst(term), settings.indexed_font),
            Inline::Reference { name, .. } => {
                styled(&escape_typst(name), settings.reference_font)
            }
            Inline::Break => "\\\n".to_string(),
        }
    }
}

fn index_line(line: &IndexLine) -> String {
    let locations: Vec<String> = line.locations.iter().map(|l| escape_typst(l)).collect();
    format!(
        "#strong[{}]  {}\n\n",
        escape_typst(&line.term),
        locations.join(", ")
    )
}

fn styled(markup: &str, font: Option<FontStyle>) -> String {
    match font {
        Some(FontStyle::Italic) => format!("#emph[{}]", markup),
        Some(FontStyle::Bold) => format!("#strong[{}]", markup),
        Some(FontStyle::Underline) => format!("#underline[{}]", markup),
        None => markup.to_string(),
    }
}

/// Primary language subtag, as Typst expects it
fn language_code(language: Option<&str>) -> String {
    language
        .and_then(|l| l.split(['-', '_']).next())
        .filter(|l| !l.is_empty())
        .unwrap_or("en")
        .to_lowercase()
}

/// Typst string literal
fn typst_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Escape special Typst characters
fn escape_typst(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('#', "\\#")
        .replace('*', "\\*")
        .replace('_', "\\_")
        .replace('@', "\\@")
        .replace('$', "\\$")
        .replace('<', "\\<")
        .replace('[', "\\[")
        .replace(']', "\\]")
        .replace('`', "\\`")
        .replace('=', "\\=")
        .replace('/', "\\/")
        .replace('~', "\\~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportSettings;

    fn document(parts: Vec<Part>) -> Document {
        Document {
            title: "Test Book".to_string(),
            subtitle: None,
            authors: vec!["Per Kraulis".to_string()],
            language: Some("sv-SE".to_string()),
            settings: ExportSettings::default(),
            parts,
        }
    }

    #[test]
    fn test_paragraph_to_typst() {
        let doc = document(Vec::new());
        let writer = PartWriter { document: &doc };
        let block = Block::Paragraph(vec![
            Inline::Text("Hello ".to_string()),
            Inline::Bold(vec![Inline::Text("world".to_string())]),
        ]);

        let typst = writer.block_to_typst(&block);
        assert_eq!(typst, "Hello #strong[world]\n");
    }

    #[test]
    fn test_escape_typst() {
        assert_eq!(escape_typst("Hello #world"), "Hello \\#world");
        assert_eq!(escape_typst("*bold*"), "\\*bold\\*");
        // Comment markers and the non-breaking space shorthand stay literal.
        assert_eq!(
            escape_typst("a // b /* c */ x~y"),
            "a \\/\\/ b \\/\\* c \\*\\/ x\\~y"
        );
        assert_eq!(typst_string("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_document_to_typst() {
        let encoder = TypstPdfEncoder::new();
        let doc = document(vec![
            Part::Contents(Vec::new()),
            Part::PageBreak,
            Part::Heading {
                level: 1,
                text: "1. Start".to_string(),
                outlined: true,
            },
            Part::Heading {
                level: 4,
                text: "Footnotes".to_string(),
                outlined: false,
            },
        ]);
        let typst = encoder.document_to_typst(&doc);

        assert!(typst.contains("#set document(title: \"Test Book\", author: (\"Per Kraulis\",))"));
        assert!(typst.contains("width: 210mm"));
        assert!(typst.contains("lang: \"sv\""));
        assert!(typst.contains("#outline(title: [Contents], depth: 1)"));
        assert!(typst.contains("#pagebreak(weak: true)"));
        assert!(typst.contains("\n= 1. Start\n"));
        assert!(typst.contains("#heading(level: 4, outlined: false)[Footnotes]"));
    }

    #[test]
    fn test_footnotes_and_fonts() {
        let mut doc = document(Vec::new());
        doc.settings.reference_font = Some(FontStyle::Bold);
        let writer = PartWriter { document: &doc };

        let note = Footnote {
            number: 2,
            content: vec![Block::Paragraph(vec![Inline::text("See it.")])],
        };
        assert_eq!(writer.footnote(&note), "#super[*2*] See it.\n\n");

        let reference = Inline::Reference {
            name: "Darwin 1859".to_string(),
            id: "darwin-1859".to_string(),
        };
        assert_eq!(writer.inline_to_typst(&reference), "#strong[Darwin 1859]");
        assert_eq!(
            writer.inline_to_typst(&Inline::FootnoteRef { id: "2".to_string() }),
            "#super[#strong[2]]"
        );
    }

    #[test]
    fn test_nested_list_indented() {
        let doc = document(Vec::new());
        let writer = PartWriter { document: &doc };
        let inner = Block::List {
            items: vec![vec![Block::paragraph(vec![Inline::text("b")])]],
            ordered: false,
        };
        let list = Block::List {
            items: vec![vec![Block::paragraph(vec![Inline::text("a")]), inner]],
            ordered: true,
        };
        assert_eq!(writer.block_to_typst(&list), "1. a\n  \n  - b\n");
    }
}
