//! DOCX encoder
//!
//! Writes an OOXML package with quick-xml: the main document, styles, a
//! page-number header, core properties and the relationships for
//! external hyperlinks. Images are not embedded; they appear as links.

use crate::error::ConversionError;
use crate::export::{
    reference_inlines, ContentsEntry, Document, FontStyle, Footnote, IndexLine, Part, TitlePage,
};
use crate::types::{Block, Inline, TableData};
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

/// Relationship ids below this are reserved for styles and header
const FIRST_LINK_ID: usize = 10;

/// Page geometry in twentieths of a point
#[derive(Debug, Clone)]
pub struct PageSetup {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub header: u32,
}

impl Default for PageSetup {
    /// A4 with 25.4 mm margins and the header 12.7 mm from the edge
    fn default() -> Self {
        Self {
            width: 11906,
            height: 16838,
            margin: 1440,
            header: 720,
        }
    }
}

/// DOCX encoder
pub struct DocxEncoder {
    pub page: PageSetup,
}

impl DocxEncoder {
    pub fn new() -> Self {
        Self {
            page: PageSetup::default(),
        }
    }

    pub fn with_page_setup(mut self, page: PageSetup) -> Self {
        self.page = page;
        self
    }

    /// The `word/document.xml` part and the hyperlink targets it refers to
    pub fn document_xml(&self, document: &Document) -> Result<(Vec<u8>, Vec<String>), ConversionError> {
        let mut body = BodyWriter::new(document);
        body.start_document()?;
        for part in &document.parts {
            body.part(part)?;
        }
        body.section_properties(&self.page)?;
        body.end_document()?;
        Ok((body.xml.into_inner(), body.links))
    }

    fn package(&self, document: &Document) -> Result<Vec<u8>, ConversionError> {
        let (main, links) = self.document_xml(document)?;
        let language = document.language.as_deref().unwrap_or("en");

        let files: Vec<(&str, Vec<u8>)> = vec![
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes().to_vec()),
            ("_rels/.rels", ROOT_RELS.as_bytes().to_vec()),
            ("docProps/core.xml", core_xml(document)?),
            ("word/document.xml", main),
            ("word/styles.xml", styles_xml(language).into_bytes()),
            ("word/header1.xml", HEADER.as_bytes().to_vec()),
            ("word/_rels/document.xml.rels", document_rels(&links)?),
        ];

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in files {
            zip.start_file(name, options)?;
            zip.write_all(&data)?;
        }
        Ok(zip.finish()?.into_inner())
    }
}

impl Default for DocxEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl super::Encoder for DocxEncoder {
    fn encode(&self, document: &Document, writer: &mut dyn Write) -> Result<(), ConversionError> {
        let data = self.package(document)?;
        writer.write_all(&data)?;
        Ok(())
    }

    fn format_name(&self) -> &str {
        "DOCX"
    }

    fn file_extension(&self) -> &str {
        "docx"
    }

    fn mime_type(&self) -> &str {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    }

    fn settings_key(&self) -> &str {
        "docx"
    }
}

/// Character formatting of a run
#[derive(Debug, Clone, Copy, Default)]
struct RunStyle {
    bold: bool,
    italic: bool,
    underline: bool,
    superscript: bool,
    subscript: bool,
    code: bool,
    link: bool,
}

impl RunStyle {
    fn with_font(mut self, font: Option<FontStyle>) -> Self {
        match font {
            Some(FontStyle::Bold) => self.bold = true,
            Some(FontStyle::Italic) => self.italic = true,
            Some(FontStyle::Underline) => self.underline = true,
            None => {}
        }
        self
    }

    fn is_plain(&self) -> bool {
        !(self.bold
            || self.italic
            || self.underline
            || self.superscript
            || self.subscript
            || self.code
            || self.link)
    }
}

/// Paragraph properties
#[derive(Debug, Clone, Default)]
struct Para {
    style: Option<String>,
    indent: Option<u32>,
    centered: bool,
}

impl Para {
    fn styled(style: impl Into<String>) -> Self {
        Self {
            style: Some(style.into()),
            ..Default::default()
        }
    }
}

struct BodyWriter<'a> {
    document: &'a Document,
    xml: Writer<Vec<u8>>,
    links: Vec<String>,
}

impl<'a> BodyWriter<'a> {
    fn new(document: &'a Document) -> Self {
        Self {
            document,
            xml: Writer::new(Vec::new()),
            links: Vec::new(),
        }
    }

    fn start_document(&mut self) -> Result<(), ConversionError> {
        self.xml
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        let root = BytesStart::new("w:document")
            .with_attributes([("xmlns:w", NS_W), ("xmlns:r", NS_R)]);
        self.xml.write_event(Event::Start(root))?;
        self.start("w:body")
    }

    fn end_document(&mut self) -> Result<(), ConversionError> {
        self.end("w:body")?;
        self.end("w:document")
    }

    fn start(&mut self, name: &str) -> Result<(), ConversionError> {
        self.xml.write_event(Event::Start(BytesStart::new(name)))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), ConversionError> {
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), ConversionError> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.xml.write_event(Event::Empty(element))?;
        Ok(())
    }

    fn part(&mut self, part: &Part) -> Result<(), ConversionError> {
        match part {
            Part::TitlePage(page) => self.title_page(page),
            Part::Title(title) => self.text_paragraph(Para::styled("Title"), title),
            Part::Contents(entries) => self.contents(entries),
            Part::PageBreak => {
                self.start("w:p")?;
                self.start("w:r")?;
                self.empty("w:br", &[("w:type", "page")])?;
                self.end("w:r")?;
                self.end("w:p")
            }
            Part::Heading { level, text, .. } => {
                self.text_paragraph(Para::styled(format!("Heading{}", level)), text)
            }
            Part::Body(blocks) => self.blocks(blocks, false, 0),
            Part::Footnotes(notes) => {
                for note in notes {
                    self.footnote(note)?;
                }
                Ok(())
            }
            Part::References(references) => {
                for reference in references {
                    self.start_paragraph(&Para::default())?;
                    self.inlines(&reference_inlines(reference), RunStyle::default())?;
                    self.end("w:p")?;
                }
                Ok(())
            }
            Part::Index(lines) => {
                for line in lines {
                    self.index_line(line)?;
                }
                Ok(())
            }
        }
    }

    fn title_page(&mut self, page: &TitlePage) -> Result<(), ConversionError> {
        self.text_paragraph(Para::styled("Title"), &page.title)?;
        if let Some(subtitle) = &page.subtitle {
            self.text_paragraph(Para::styled("Subtitle"), subtitle)?;
        }
        for author in &page.authors {
            self.text_paragraph(Para::styled("Author"), author)?;
        }
        self.blocks(&page.body, false, 0)?;
        if let Some(status) = page.status {
            self.text_paragraph(Para::default(), &format!("Status: {}", status))?;
        }
        if let Some(created) = &page.created {
            self.text_paragraph(Para::default(), &format!("Created: {}", created))?;
        }
        Ok(())
    }

    fn contents(&mut self, entries: &[ContentsEntry]) -> Result<(), ConversionError> {
        self.text_paragraph(Para::styled("TOCHeading"), "Contents")?;
        for entry in entries {
            let style = format!("TOC{}", entry.level.clamp(1, 6));
            self.text_paragraph(Para::styled(style), &entry.text)?;
        }
        Ok(())
    }

    fn footnote(&mut self, note: &Footnote) -> Result<(), ConversionError> {
        let number = RunStyle {
            bold: true,
            superscript: true,
            ..Default::default()
        };
        self.start_paragraph(&Para::default())?;
        self.run(&note.number.to_string(), number)?;
        self.run(" ", RunStyle::default())?;
        match note.content.split_first() {
            Some((Block::Paragraph(inlines), rest)) => {
                self.inlines(inlines, RunStyle::default())?;
                self.end("w:p")?;
                self.blocks(rest, false, 0)
            }
            _ => {
                self.end("w:p")?;
                self.blocks(&note.content, false, 0)
            }
        }
    }

    fn index_line(&mut self, line: &IndexLine) -> Result<(), ConversionError> {
        self.start_paragraph(&Para::default())?;
        self.run(
            &line.term,
            RunStyle {
                bold: true,
                ..Default::default()
            },
        )?;
        self.run("  ", RunStyle::default())?;
        self.run(&line.locations.join(", "), RunStyle::default())?;
        self.end("w:p")
    }

    fn start_paragraph(&mut self, para: &Para) -> Result<(), ConversionError> {
        self.start("w:p")?;
        if para.style.is_none() && para.indent.is_none() && !para.centered {
            return Ok(());
        }
        self.start("w:pPr")?;
        if let Some(style) = &para.style {
            self.empty("w:pStyle", &[("w:val", style.as_str())])?;
        }
        if let Some(indent) = para.indent {
            self.empty("w:ind", &[("w:left", indent.to_string().as_str())])?;
        }
        if para.centered {
            self.empty("w:jc", &[("w:val", "center")])?;
        }
        self.end("w:pPr")
    }

    fn text_paragraph(&mut self, para: Para, text: &str) -> Result<(), ConversionError> {
        self.start_paragraph(&para)?;
        self.run(text, RunStyle::default())?;
        self.end("w:p")
    }

    fn blocks(&mut self, blocks: &[Block], quote: bool, depth: usize) -> Result<(), ConversionError> {
        for block in blocks {
            self.block(block, quote, depth)?;
        }
        Ok(())
    }

    fn block(&mut self, block: &Block, quote: bool, depth: usize) -> Result<(), ConversionError> {
        let base = || {
            if quote {
                Para::styled("Quote")
            } else {
                Para::default()
            }
        };
        match block {
            Block::Header { level, content, .. } => {
                self.start_paragraph(&Para::styled(format!("Heading{}", (*level).clamp(1, 6))))?;
                self.inlines(content, RunStyle::default())?;
                self.end("w:p")
            }
            Block::Paragraph(inlines) => {
                self.start_paragraph(&base())?;
                self.inlines(inlines, RunStyle::default())?;
                self.end("w:p")
            }
            Block::List { items, ordered } => {
                for (index, item) in items.iter().enumerate() {
                    let marker = if *ordered {
                        format!("{}. ", index + 1)
                    } else {
                        "\u{2022} ".to_string()
                    };
                    let para = Para {
                        style: Some("ListParagraph".to_string()),
                        indent: Some(360 * (depth as u32 + 1)),
                        centered: false,
                    };
                    self.start_paragraph(&para)?;
                    self.run(&marker, RunStyle::default())?;
                    let rest = match item.split_first() {
                        Some((Block::Paragraph(inlines), rest)) => {
                            self.inlines(inlines, RunStyle::default())?;
                            rest
                        }
                        _ => item.as_slice(),
                    };
                    self.end("w:p")?;
                    self.blocks(rest, quote, depth + 1)?;
                }
                Ok(())
            }
            Block::Image { url, alt } => {
                let label = if alt.is_empty() { url } else { alt };
                self.start_paragraph(&Para {
                    centered: true,
                    ..base()
                })?;
                self.inlines(&[Inline::link(vec![Inline::text(label)], url)], RunStyle::default())?;
                self.end("w:p")
            }
            Block::CodeBlock { code, .. } => {
                self.start_paragraph(&Para::styled("Code"))?;
                for (index, line) in code.trim_end_matches('\n').lines().enumerate() {
                    if index > 0 {
                        self.start("w:r")?;
                        self.empty("w:br", &[])?;
                        self.end("w:r")?;
                    }
                    self.run(line, RunStyle::default())?;
                }
                self.end("w:p")
            }
            Block::Blockquote(blocks) => self.blocks(blocks, true, depth),
            Block::ThematicBreak => self.text_paragraph(
                Para {
                    centered: true,
                    ..Default::default()
                },
                "\u{2014}\u{2014}\u{2014}",
            ),
            Block::Table(table) => self.table(table),
            Block::Footnote { .. } => Ok(()),
        }
    }

    fn table(&mut self, table: &TableData) -> Result<(), ConversionError> {
        self.start("w:tbl")?;
        self.start("w:tblPr")?;
        self.empty("w:tblStyle", &[("w:val", "TableGrid")])?;
        self.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
        self.end("w:tblPr")?;

        let header = RunStyle {
            bold: true,
            ..Default::default()
        };
        let rows = std::iter::once((&table.headers, header))
            .filter(|(cells, _)| !cells.is_empty())
            .chain(table.rows.iter().map(|row| (row, RunStyle::default())));
        for (cells, style) in rows {
            self.start("w:tr")?;
            for cell in cells {
                self.start("w:tc")?;
                self.start("w:p")?;
                self.inlines(&cell.content, style)?;
                self.end("w:p")?;
                self.end("w:tc")?;
            }
            self.end("w:tr")?;
        }
        self.end("w:tbl")?;
        // A table may not end a cell or the body; an empty paragraph follows.
        self.empty("w:p", &[])
    }

    fn inlines(&mut self, inlines: &[Inline], style: RunStyle) -> Result<(), ConversionError> {
        for inline in inlines {
            self.inline(inline, style)?;
        }
        Ok(())
    }

    fn inline(&mut self, inline: &Inline, style: RunStyle) -> Result<(), ConversionError> {
        let document = self.document;
        let settings = &document.settings;
        match inline {
            Inline::Text(text) => self.run(text, style),
            Inline::Bold(children) => self.inlines(children, RunStyle { bold: true, ..style }),
            Inline::Italic(children) => self.inlines(children, RunStyle { italic: true, ..style }),
            Inline::Superscript(children) => self.inlines(
                children,
                RunStyle {
                    superscript: true,
                    ..style
                },
            ),
            Inline::Subscript(children) => self.inlines(
                children,
                RunStyle {
                    subscript: true,
                    ..style
                },
            ),
            Inline::Code(code) => self.run(code, RunStyle { code: true, ..style }),
            Inline::Link { children, url } => {
                self.links.push(url.clone());
                let id = format!("rId{}", FIRST_LINK_ID + self.links.len() - 1);
                let element = BytesStart::new("w:hyperlink").with_attributes([("r:id", id.as_str())]);
                self.xml.write_event(Event::Start(element))?;
                self.inlines(children, RunStyle { link: true, ..style })?;
                self.end("w:hyperlink")
            }
            Inline::FootnoteRef { id } => self.run(
                id,
                RunStyle {
                    bold: true,
                    superscript: true,
                    ..style
                },
            ),
            Inline::Indexed { term, .. } => self.run(term, style.with_font(settings.indexed_font)),
            Inline::Reference { name, .. } => {
                self.run(name, style.with_font(settings.reference_font))
            }
            Inline::Break => {
                self.start("w:r")?;
                self.empty("w:br", &[])?;
                self.end("w:r")
            }
        }
    }

    fn run(&mut self, text: &str, style: RunStyle) -> Result<(), ConversionError> {
        if text.is_empty() {
            return Ok(());
        }
        self.start("w:r")?;
        if !style.is_plain() {
            self.start("w:rPr")?;
            if style.link {
                self.empty("w:rStyle", &[("w:val", "Hyperlink")])?;
            } else if style.code {
                self.empty("w:rStyle", &[("w:val", "CodeChar")])?;
            }
            if style.bold {
                self.empty("w:b", &[])?;
            }
            if style.italic {
                self.empty("w:i", &[])?;
            }
            if style.underline {
                self.empty("w:u", &[("w:val", "single")])?;
            }
            if style.superscript {
                self.empty("w:vertAlign", &[("w:val", "superscript")])?;
            } else if style.subscript {
                self.empty("w:vertAlign", &[("w:val", "subscript")])?;
            }
            self.end("w:rPr")?;
        }
        let element = BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]);
        self.xml.write_event(Event::Start(element))?;
        self.xml.write_event(Event::Text(BytesText::new(text)))?;
        self.end("w:t")?;
        self.end("w:r")
    }

    fn section_properties(&mut self, page: &PageSetup) -> Result<(), ConversionError> {
        let margin = page.margin.to_string();
        let header = page.header.to_string();
        self.start("w:sectPr")?;
        self.empty("w:headerReference", &[("w:type", "default"), ("r:id", "rId2")])?;
        self.empty(
            "w:pgSz",
            &[
                ("w:w", page.width.to_string().as_str()),
                ("w:h", page.height.to_string().as_str()),
            ],
        )?;
        self.empty(
            "w:pgMar",
            &[
                ("w:top", margin.as_str()),
                ("w:right", margin.as_str()),
                ("w:bottom", margin.as_str()),
                ("w:left", margin.as_str()),
                ("w:header", header.as_str()),
                ("w:footer", header.as_str()),
                ("w:gutter", "0"),
            ],
        )?;
        self.end("w:sectPr")
    }
}

fn core_xml(document: &Document) -> Result<Vec<u8>, ConversionError> {
    let mut xml = Writer::new(Vec::new());
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    let root = BytesStart::new("cp:coreProperties").with_attributes([
        (
            "xmlns:cp",
            "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
        ),
        ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
        ("xmlns:dcterms", "http://purl.org/dc/terms/"),
        ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
    ]);
    xml.write_event(Event::Start(root))?;

    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let mut fields = vec![("dc:title", document.title.clone())];
    if !document.authors.is_empty() {
        fields.push(("dc:creator", document.authors.join("; ")));
    }
    if let Some(language) = &document.language {
        fields.push(("dc:language", language.clone()));
    }
    for (name, value) in fields {
        xml.write_event(Event::Start(BytesStart::new(name)))?;
        xml.write_event(Event::Text(BytesText::new(&value)))?;
        xml.write_event(Event::End(BytesEnd::new(name)))?;
    }
    for name in ["dcterms:created", "dcterms:modified"] {
        let element = BytesStart::new(name).with_attributes([("xsi:type", "dcterms:W3CDTF")]);
        xml.write_event(Event::Start(element))?;
        xml.write_event(Event::Text(BytesText::new(&now)))?;
        xml.write_event(Event::End(BytesEnd::new(name)))?;
    }
    xml.write_event(Event::End(BytesEnd::new("cp:coreProperties")))?;
    Ok(xml.into_inner())
}

fn document_rels(links: &[String]) -> Result<Vec<u8>, ConversionError> {
    let mut xml = Writer::new(Vec::new());
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    let root = BytesStart::new("Relationships").with_attributes([(
        "xmlns",
        "http://schemas.openxmlformats.org/package/2006/relationships",
    )]);
    xml.write_event(Event::Start(root))?;

    let fixed = [
        (
            "rId1",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles",
            "styles.xml",
        ),
        (
            "rId2",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header",
            "header1.xml",
        ),
    ];
    for (id, kind, target) in fixed {
        let element = BytesStart::new("Relationship").with_attributes([
            ("Id", id),
            ("Type", kind),
            ("Target", target),
        ]);
        xml.write_event(Event::Empty(element))?;
    }
    for (index, url) in links.iter().enumerate() {
        let id = format!("rId{}", FIRST_LINK_ID + index);
        let element = BytesStart::new("Relationship").with_attributes([
            ("Id", id.as_str()),
            ("Type", REL_HYPERLINK),
            ("Target", url.as_str()),
            ("TargetMode", "External"),
        ]);
        xml.write_event(Event::Empty(element))?;
    }
    xml.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(xml.into_inner())
}

fn styles_xml(language: &str) -> String {
    let mut styles = String::new();
    let paragraph = |id: &str, name: &str, ppr: &str, rpr: &str| {
        format!(
            r#"<w:style w:type="paragraph" w:styleId="{id}"><w:name w:val="{name}"/><w:basedOn w:val="Normal"/><w:qFormat/><w:pPr>{ppr}</w:pPr><w:rPr>{rpr}</w:rPr></w:style>"#
        )
    };
    styles.push_str(&paragraph("Title", "Title", r#"<w:spacing w:after="240"/>"#, r#"<w:b/><w:sz w:val="56"/>"#));
    styles.push_str(&paragraph("Subtitle", "Subtitle", r#"<w:spacing w:after="240"/>"#, r#"<w:i/><w:sz w:val="36"/>"#));
    styles.push_str(&paragraph("Author", "Author", r#"<w:spacing w:after="120"/>"#, r#"<w:sz w:val="28"/>"#));
    for level in 1..=6u32 {
        let size = 36 - (level - 1) * 4;
        styles.push_str(&paragraph(
            &format!("Heading{}", level),
            &format!("heading {}", level),
            &format!(
                r#"<w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="{}"/>"#,
                level - 1
            ),
            &format!(r#"<w:b/><w:sz w:val="{}"/>"#, size),
        ));
    }
    styles.push_str(&paragraph("TOCHeading", "TOC Heading", r#"<w:spacing w:after="240"/>"#, r#"<w:b/><w:sz w:val="32"/>"#));
    for level in 1..=6u32 {
        styles.push_str(&paragraph(
            &format!("TOC{}", level),
            &format!("toc {}", level),
            &format!(r#"<w:ind w:left="{}"/>"#, (level - 1) * 240),
            "",
        ));
    }
    styles.push_str(&paragraph("Quote", "Quote", r#"<w:ind w:left="720" w:right="720"/>"#, "<w:i/>"));
    styles.push_str(&paragraph(
        "Code",
        "Code",
        r#"<w:ind w:left="360"/>"#,
        r#"<w:rFonts w:ascii="Courier New" w:hAnsi="Courier New"/><w:sz w:val="20"/>"#,
    ));
    styles.push_str(&paragraph("ListParagraph", "List Paragraph", r#"<w:spacing w:after="60"/>"#, ""));

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{NS_W}"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman"/><w:sz w:val="24"/><w:lang w:val="{language}"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>{styles}<w:style w:type="character" w:styleId="Hyperlink"><w:name w:val="Hyperlink"/><w:rPr><w:color w:val="0563C1"/><w:u w:val="single"/></w:rPr></w:style><w:style w:type="character" w:styleId="CodeChar"><w:name w:val="Code Char"/><w:rPr><w:rFonts w:ascii="Courier New" w:hAnsi="Courier New"/></w:rPr></w:style><w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4"/><w:left w:val="single" w:sz="4"/><w:bottom w:val="single" w:sz="4"/><w:right w:val="single" w:sz="4"/><w:insideH w:val="single" w:sz="4"/><w:insideV w:val="single" w:sz="4"/></w:tblBorders></w:tblPr></w:style></w:styles>"#,
        language = escape(language),
    )
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

/// Right-aligned page number
const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p><w:pPr><w:jc w:val="right"/></w:pPr><w:r><w:fldChar w:fldCharType="begin"/></w:r><w:r><w:instrText xml:space="preserve"> PAGE </w:instrText></w:r><w:r><w:fldChar w:fldCharType="separate"/></w:r><w:r><w:t>1</w:t></w:r><w:r><w:fldChar w:fldCharType="end"/></w:r></w:p></w:hdr>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;
    use crate::export::ExportSettings;
    use std::io::Read;

    fn document(parts: Vec<Part>) -> Document {
        Document {
            title: "Stars & Planets".to_string(),
            subtitle: None,
            authors: vec!["Per Kraulis".to_string()],
            language: Some("sv".to_string()),
            settings: ExportSettings::default(),
            parts,
        }
    }

    fn main_xml(document: &Document) -> String {
        let (xml, _) = DocxEncoder::new().document_xml(document).unwrap();
        String::from_utf8(xml).unwrap()
    }

    #[test]
    fn test_package_parts() {
        let doc = document(vec![Part::Title("Stars".to_string())]);
        let mut output = Vec::new();
        DocxEncoder::new().encode(&doc, &mut output).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(output)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "docProps/core.xml",
                "word/_rels/document.xml.rels",
                "word/document.xml",
                "word/header1.xml",
                "word/styles.xml",
            ]
        );

        let mut core = String::new();
        archive
            .by_name("docProps/core.xml")
            .unwrap()
            .read_to_string(&mut core)
            .unwrap();
        assert!(core.contains("<dc:title>Stars &amp; Planets</dc:title>"));

        let mut styles = String::new();
        archive
            .by_name("word/styles.xml")
            .unwrap()
            .read_to_string(&mut styles)
            .unwrap();
        assert!(styles.contains(r#"<w:lang w:val="sv"/>"#));
    }

    #[test]
    fn test_page_setup_and_header() {
        let xml = main_xml(&document(Vec::new()));
        assert!(xml.contains(r#"<w:pgSz w:w="11906" w:h="16838"/>"#));
        assert!(xml.contains(r#"w:top="1440""#));
        assert!(xml.contains(r#"w:header="720""#));
        assert!(HEADER.contains(" PAGE "));
    }

    #[test]
    fn test_footnote_number_superscript_bold() {
        let doc = document(vec![Part::Footnotes(vec![Footnote {
            number: 3,
            content: vec![Block::Paragraph(vec![Inline::text("A note.")])],
        }])]);
        let xml = main_xml(&doc);
        assert!(xml.contains(
            r#"<w:r><w:rPr><w:b/><w:vertAlign w:val="superscript"/></w:rPr><w:t xml:space="preserve">3</w:t></w:r>"#
        ));
        assert!(xml.contains("A note."));
    }

    #[test]
    fn test_hyperlinks_get_relationships() {
        let doc = document(vec![Part::Body(vec![Block::Paragraph(vec![Inline::link(
            vec![Inline::text("site")],
            "https://example.com/?a=1&b=2",
        )])])]);
        let (xml, links) = DocxEncoder::new().document_xml(&doc).unwrap();
        assert_eq!(links, vec!["https://example.com/?a=1&b=2"]);
        assert!(String::from_utf8(xml).unwrap().contains(r#"<w:hyperlink r:id="rId10">"#));

        let rels = String::from_utf8(document_rels(&links).unwrap()).unwrap();
        assert!(rels.contains(r#"Target="https://example.com/?a=1&amp;b=2""#));
        assert!(rels.contains(r#"TargetMode="External""#));
    }

    #[test]
    fn test_indexed_font() {
        let mut doc = document(vec![Part::Body(vec![Block::Paragraph(vec![
            Inline::Indexed {
                term: "Mars".to_string(),
                canonical: "Mars".to_string(),
            },
        ])])]);
        doc.settings.indexed_font = Some(FontStyle::Underline);
        let xml = main_xml(&doc);
        assert!(xml.contains(r#"<w:u w:val="single"/></w:rPr><w:t xml:space="preserve">Mars</w:t>"#));
    }

    #[test]
    fn test_heading_and_page_break() {
        let doc = document(vec![
            Part::PageBreak,
            Part::Heading {
                level: 2,
                text: "1.1. Inner".to_string(),
                outlined: true,
            },
        ]);
        let xml = main_xml(&doc);
        assert!(xml.contains(r#"<w:br w:type="page"/>"#));
        assert!(xml.contains(r#"<w:pStyle w:val="Heading2"/>"#));
        assert!(xml.contains("1.1. Inner"));
    }
}
