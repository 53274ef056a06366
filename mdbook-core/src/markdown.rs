//! Markdown parser for book texts
//!
//! CommonMark with tables, heading attributes and footnotes, plus the book
//! inline extensions: `~sub~`, `^sup^`, `---` as em dash, `[#term|canonical]`
//! indexed terms and `[@Name Year]` references.

use crate::names::slug;
use crate::types::{inlines_to_text, Block, Inline, TableCell, TableData};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Em dash character
pub const EM_DASH: &str = "\u{2014}";

fn extensions_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"\[#(?P<term>[^\]|]+?)(?:\|(?P<canonical>[^\]]+?))?\]",
            r"|\[@(?P<reference>[^\]]+?)\]",
            r"|~(?P<sub>[^~]+)~",
            r"|\^(?P<sup>[^\^]+)\^",
            r"|(?P<dash>-{3,})",
        ))
        .expect("valid extensions regex")
    })
}

/// Parser for book Markdown
pub struct MarkdownParser {
    /// Whether to enable tables extension
    enable_tables: bool,
    /// Whether to enable footnotes extension
    enable_footnotes: bool,
    /// Whether to apply the book inline extensions
    enable_extensions: bool,
}

impl MarkdownParser {
    pub fn new() -> Self {
        Self {
            enable_tables: true,
            enable_footnotes: true,
            enable_extensions: true,
        }
    }

    /// Enable or disable tables parsing
    pub fn with_tables(mut self, enable: bool) -> Self {
        self.enable_tables = enable;
        self
    }

    /// Enable or disable footnotes parsing
    pub fn with_footnotes(mut self, enable: bool) -> Self {
        self.enable_footnotes = enable;
        self
    }

    /// Enable or disable the book inline extensions
    pub fn with_extensions(mut self, enable: bool) -> Self {
        self.enable_extensions = enable;
        self
    }

    fn get_parser_options(&self) -> Options {
        // Strikethrough stays off: `~text~` is subscript.
        let mut options = Options::empty();
        if self.enable_tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.enable_footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        options
    }

    /// Parse markdown content into blocks
    pub fn parse(&self, content: &str) -> Vec<Block> {
        let parser = Parser::new_ext(content, self.get_parser_options());
        let events: Vec<Event> = parser.collect();

        let mut state = ParserState::new();
        self.process_events(&events, &mut state);
        state.blocks
    }

    fn process_events(&self, events: &[Event], state: &mut ParserState) {
        let mut i = 0;
        while i < events.len() {
            i = self.process_event(events, i, state);
        }
    }

    /// Process a single event, returning the next index to process
    fn process_event(&self, events: &[Event], start: usize, state: &mut ParserState) -> usize {
        match &events[start] {
            Event::Start(tag) => return self.handle_start_tag(events, start, tag.clone(), state),
            Event::Text(text) => state.push_text(text.to_string()),
            Event::Code(code) => state.push_inline(Inline::Code(code.to_string())),
            Event::InlineHtml(html) => state.push_text(html.to_string()),
            Event::FootnoteReference(label) => state.push_inline(Inline::FootnoteRef {
                id: label.to_string(),
            }),
            Event::SoftBreak => state.push_text(" ".to_string()),
            Event::HardBreak => state.push_inline(Inline::Break),
            Event::Rule => state.blocks.push(Block::ThematicBreak),
            _ => {}
        }
        start + 1
    }

    fn handle_start_tag(
        &self,
        events: &[Event],
        start: usize,
        tag: Tag,
        state: &mut ParserState,
    ) -> usize {
        match tag {
            Tag::Heading { level, id, .. } => {
                self.process_heading(events, start, level, id.as_deref(), state)
            }
            Tag::Paragraph => self.process_paragraph(events, start, state),
            Tag::BlockQuote => self.process_blockquote(events, start, state),
            Tag::CodeBlock(kind) => self.process_code_block(events, start, kind, state),
            Tag::List(start_num) => self.process_list(events, start, start_num, state),
            Tag::Item => self.process_list_item(events, start, state),
            Tag::Table(_) => self.process_table(events, start, state),
            Tag::TableHead => self.process_table_head(events, start, state),
            Tag::TableRow => self.process_table_row(events, start, state),
            Tag::TableCell => self.process_table_cell(events, start, state),
            Tag::Emphasis => {
                let (inlines, next) = self.process_span(events, start, &TagEnd::Emphasis);
                state.push_inline(Inline::Italic(inlines));
                next
            }
            Tag::Strong => {
                let (inlines, next) = self.process_span(events, start, &TagEnd::Strong);
                state.push_inline(Inline::Bold(inlines));
                next
            }
            Tag::Link { dest_url, .. } => {
                let (children, next) = self.process_span(events, start, &TagEnd::Link);
                state.push_inline(Inline::Link {
                    children,
                    url: dest_url.to_string(),
                });
                next
            }
            Tag::Image { dest_url, .. } => {
                let end = self.find_end_tag(events, start, &TagEnd::Image);
                let alt = inlines_to_text(&self.collect_inlines(events, start + 1, end));
                state.blocks.push(Block::Image {
                    url: dest_url.to_string(),
                    alt,
                });
                end + 1
            }
            Tag::FootnoteDefinition(label) => {
                let end = self.find_end_tag(events, start, &TagEnd::FootnoteDefinition);
                let mut inner_state = ParserState::new();
                self.process_events(&events[start + 1..end], &mut inner_state);
                state.blocks.push(Block::Footnote {
                    id: label.to_string(),
                    content: inner_state.blocks,
                });
                end + 1
            }
            _ => start + 1,
        }
    }

    /// Find the matching end tag for a start tag
    fn find_end_tag(&self, events: &[Event], start: usize, expected_end: &TagEnd) -> usize {
        let mut depth = 0;
        for (i, event) in events.iter().enumerate().skip(start) {
            match event {
                Event::Start(_) => depth += 1,
                Event::End(end) => {
                    depth -= 1;
                    if depth == 0 && end == expected_end {
                        return i;
                    }
                }
                _ => {}
            }
        }
        events.len()
    }

    fn process_heading(
        &self,
        events: &[Event],
        start: usize,
        level: HeadingLevel,
        id: Option<&str>,
        state: &mut ParserState,
    ) -> usize {
        let end = self.find_end_tag(events, start, &TagEnd::Heading(level));
        let content = self.collect_inlines(events, start + 1, end);

        let level = match level {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
            HeadingLevel::H5 => 5,
            HeadingLevel::H6 => 6,
        };

        state.blocks.push(Block::Header {
            level,
            content,
            anchor: id.map(|s| s.to_string()),
        });
        end + 1
    }

    fn process_paragraph(&self, events: &[Event], start: usize, state: &mut ParserState) -> usize {
        let end = self.find_end_tag(events, start, &TagEnd::Paragraph);

        let mut inner_state = ParserState::new();
        self.process_events(&events[start + 1..end], &mut inner_state);
        let inlines = self.finish_inlines(inner_state.inlines);

        if !inlines.is_empty() {
            state.blocks.push(Block::Paragraph(inlines));
        }
        // Images inside the paragraph
        state.blocks.extend(inner_state.blocks);
        end + 1
    }

    fn process_blockquote(&self, events: &[Event], start: usize, state: &mut ParserState) -> usize {
        let end = self.find_end_tag(events, start, &TagEnd::BlockQuote);

        let mut inner_state = ParserState::new();
        self.process_events(&events[start + 1..end], &mut inner_state);

        state.blocks.push(Block::Blockquote(inner_state.blocks));
        end + 1
    }

    fn process_code_block(
        &self,
        events: &[Event],
        start: usize,
        kind: CodeBlockKind,
        state: &mut ParserState,
    ) -> usize {
        let lang = match &kind {
            CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
            _ => None,
        };
        let end = self.find_end_tag(events, start, &TagEnd::CodeBlock);

        let mut code = String::new();
        for event in &events[start + 1..end] {
            if let Event::Text(text) = event {
                code.push_str(text);
            }
        }

        state.blocks.push(Block::CodeBlock { lang, code });
        end + 1
    }

    fn process_list(
        &self,
        events: &[Event],
        start: usize,
        start_num: Option<u64>,
        state: &mut ParserState,
    ) -> usize {
        let ordered = start_num.is_some();
        let end = self.find_end_tag(events, start, &TagEnd::List(ordered));

        let mut items: Vec<Vec<Block>> = Vec::new();
        let mut i = start + 1;
        while i < end {
            if let Event::Start(Tag::Item) = &events[i] {
                let item_end = self.find_end_tag(events, i, &TagEnd::Item);

                let mut item_state = ParserState::new();
                self.process_events(&events[i + 1..item_end], &mut item_state);
                // Tight lists yield bare inlines without a paragraph
                let mut blocks = item_state.blocks;
                if !item_state.inlines.is_empty() {
                    let inlines = self.finish_inlines(item_state.inlines);
                    blocks.insert(0, Block::Paragraph(inlines));
                }
                items.push(blocks);

                i = item_end + 1;
            } else {
                i += 1;
            }
        }

        state.blocks.push(Block::List { items, ordered });
        end + 1
    }

    /// List item outside a list; its blocks join the parent
    fn process_list_item(&self, events: &[Event], start: usize, state: &mut ParserState) -> usize {
        let end = self.find_end_tag(events, start, &TagEnd::Item);

        let mut item_state = ParserState::new();
        self.process_events(&events[start + 1..end], &mut item_state);
        state.blocks.extend(item_state.blocks);
        end + 1
    }

    fn process_table(&self, events: &[Event], start: usize, state: &mut ParserState) -> usize {
        let end = self.find_end_tag(events, start, &TagEnd::Table);

        state.table_headers.clear();
        state.table_rows.clear();
        self.process_events(&events[start + 1..end], state);

        let table = TableData {
            headers: std::mem::take(&mut state.table_headers),
            rows: std::mem::take(&mut state.table_rows),
        };
        state.blocks.push(Block::Table(table));
        end + 1
    }

    fn process_table_head(&self, events: &[Event], start: usize, state: &mut ParserState) -> usize {
        let end = self.find_end_tag(events, start, &TagEnd::TableHead);

        state.current_row.clear();
        self.process_events(&events[start + 1..end], state);
        state.table_headers = std::mem::take(&mut state.current_row);
        end + 1
    }

    fn process_table_row(&self, events: &[Event], start: usize, state: &mut ParserState) -> usize {
        let end = self.find_end_tag(events, start, &TagEnd::TableRow);

        state.current_row.clear();
        self.process_events(&events[start + 1..end], state);
        if !state.current_row.is_empty() {
            state.table_rows.push(std::mem::take(&mut state.current_row));
        }
        end + 1
    }

    fn process_table_cell(&self, events: &[Event], start: usize, state: &mut ParserState) -> usize {
        let end = self.find_end_tag(events, start, &TagEnd::TableCell);
        let inlines = self.collect_inlines(events, start + 1, end);
        state.current_row.push(TableCell::new(inlines));
        end + 1
    }

    /// Inline span up to its end tag; returns the children and the next index
    fn process_span(&self, events: &[Event], start: usize, end_tag: &TagEnd) -> (Vec<Inline>, usize) {
        let end = self.find_end_tag(events, start, end_tag);
        (self.collect_inlines(events, start + 1, end), end + 1)
    }

    /// Collect inline elements from events
    fn collect_inlines(&self, events: &[Event], start: usize, end: usize) -> Vec<Inline> {
        let mut state = ParserState::new();
        self.process_events(&events[start..end], &mut state);
        self.finish_inlines(state.inlines)
    }

    /// Merge adjacent text runs, then apply the inline extensions
    fn finish_inlines(&self, inlines: Vec<Inline>) -> Vec<Inline> {
        let merged = merge_text(inlines);
        if !self.enable_extensions {
            return merged;
        }
        let mut result = Vec::with_capacity(merged.len());
        for inline in merged {
            match inline {
                Inline::Text(text) => result.extend(expand_extensions(&text)),
                other => result.push(other),
            }
        }
        result
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse book Markdown with all extensions enabled
pub fn parse(content: &str) -> Vec<Block> {
    MarkdownParser::new().parse(content)
}

/// Parser state for tracking context during parsing
struct ParserState {
    blocks: Vec<Block>,
    inlines: Vec<Inline>,
    // Table state
    table_headers: Vec<TableCell>,
    table_rows: Vec<Vec<TableCell>>,
    current_row: Vec<TableCell>,
}

impl ParserState {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            inlines: Vec::new(),
            table_headers: Vec::new(),
            table_rows: Vec::new(),
            current_row: Vec::new(),
        }
    }

    fn push_text(&mut self, text: String) {
        if !text.is_empty() {
            self.inlines.push(Inline::Text(text));
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        self.inlines.push(inline);
    }
}

fn merge_text(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut result: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines {
        if let (Some(Inline::Text(prev)), Inline::Text(text)) = (result.last_mut(), &inline) {
            prev.push_str(text);
            continue;
        }
        result.push(inline);
    }
    result
}

/// Split a text run into plain text and extension inlines
pub fn expand_extensions(text: &str) -> Vec<Inline> {
    let mut result = Vec::new();
    let mut plain = String::new();
    let mut last = 0;

    for caps in extensions_regex().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        plain.push_str(&text[last..whole.start()]);
        last = whole.end();

        match extension_inline(&caps) {
            Some(Extension::Inline(inline)) => {
                if !plain.is_empty() {
                    result.push(Inline::Text(std::mem::take(&mut plain)));
                }
                result.push(inline);
            }
            Some(Extension::Text(s)) => plain.push_str(&s),
            None => plain.push_str(whole.as_str()),
        }
    }
    plain.push_str(&text[last..]);
    if !plain.is_empty() {
        result.push(Inline::Text(plain));
    }
    result
}

enum Extension {
    Inline(Inline),
    Text(String),
}

fn extension_inline(caps: &Captures) -> Option<Extension> {
    if let Some(term) = caps.name("term") {
        let term = term.as_str().trim().to_string();
        let canonical = caps
            .name("canonical")
            .map(|c| c.as_str().trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| term.clone());
        return Some(Extension::Inline(Inline::Indexed { term, canonical }));
    }
    if let Some(reference) = caps.name("reference") {
        let name = reference.as_str().trim().to_string();
        let id = slug(&name);
        return Some(Extension::Inline(Inline::Reference { name, id }));
    }
    if let Some(sub) = caps.name("sub") {
        return Some(Extension::Inline(Inline::Subscript(expand_extensions(sub.as_str()))));
    }
    if let Some(sup) = caps.name("sup") {
        return Some(Extension::Inline(Inline::Superscript(expand_extensions(sup.as_str()))));
    }
    match caps.name("dash") {
        Some(dash) if dash.as_str().len() == 3 => Some(Extension::Text(EM_DASH.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(markdown: &str) -> Vec<Inline> {
        match parse(markdown).into_iter().next() {
            Some(Block::Paragraph(inlines)) => inlines,
            other => panic!("Expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_markdown() {
        let blocks = parse("# Hello World\n\nThis is a paragraph.");

        assert_eq!(blocks.len(), 2);
        match &blocks[0] {
            Block::Header { level, content, .. } => {
                assert_eq!(*level, 1);
                assert_eq!(content, &vec![Inline::text("Hello World")]);
            }
            _ => panic!("Expected header"),
        }
    }

    #[test]
    fn test_parse_formatting() {
        let inlines = paragraph("This is **bold** and *italic* text.");
        assert!(inlines.iter().any(|i| matches!(i, Inline::Bold(_))));
        assert!(inlines.iter().any(|i| matches!(i, Inline::Italic(_))));
    }

    #[test]
    fn test_parse_list() {
        let blocks = parse("- Item 1\n- Item 2\n- Item 3");

        assert_eq!(blocks.len(), 1);
        if let Block::List { items, ordered } = &blocks[0] {
            assert!(!ordered);
            assert_eq!(items.len(), 3);
            assert_eq!(items[0], vec![Block::Paragraph(vec![Inline::text("Item 1")])]);
        } else {
            panic!("Expected list");
        }
    }

    #[test]
    fn test_parse_code_block() {
        let blocks = parse("```rust\nfn main() {}\n```");

        if let Block::CodeBlock { lang, code } = &blocks[0] {
            assert_eq!(lang.as_deref(), Some("rust"));
            assert!(code.contains("fn main()"));
        } else {
            panic!("Expected code block");
        }
    }

    #[test]
    fn test_parse_table() {
        let blocks = parse("| A | B |\n|---|---|\n| 1 | 2 |");

        if let Block::Table(table) = &blocks[0] {
            assert_eq!(table.headers.len(), 2);
            assert_eq!(table.rows.len(), 1);
        } else {
            panic!("Expected table");
        }
    }

    #[test]
    fn test_subscript_and_superscript() {
        let inlines = paragraph("H~2~O and E = mc^2^");
        assert_eq!(
            inlines,
            vec![
                Inline::text("H"),
                Inline::Subscript(vec![Inline::text("2")]),
                Inline::text("O and E = mc"),
                Inline::Superscript(vec![Inline::text("2")]),
            ]
        );
    }

    #[test]
    fn test_em_dash() {
        let inlines = paragraph("word---word and ----");
        assert_eq!(inlines, vec![Inline::text("word\u{2014}word and ----")]);
    }

    #[test]
    fn test_indexed_terms() {
        let inlines = paragraph("The [#red planet|Mars] and [#Venus].");
        assert_eq!(
            inlines,
            vec![
                Inline::text("The "),
                Inline::Indexed {
                    term: "red planet".to_string(),
                    canonical: "Mars".to_string()
                },
                Inline::text(" and "),
                Inline::Indexed {
                    term: "Venus".to_string(),
                    canonical: "Venus".to_string()
                },
                Inline::text("."),
            ]
        );
    }

    #[test]
    fn test_reference() {
        let inlines = paragraph("As shown [@Darwin 1859].");
        assert_eq!(
            inlines[1],
            Inline::Reference {
                name: "Darwin 1859".to_string(),
                id: "darwin-1859".to_string()
            }
        );
    }

    #[test]
    fn test_code_not_rewritten() {
        let inlines = paragraph("Use `a---b` here");
        assert!(inlines.contains(&Inline::Code("a---b".to_string())));
    }

    #[test]
    fn test_footnotes() {
        let blocks = parse("Text[^1].\n\n[^1]: The note.\n");
        let Block::Paragraph(inlines) = &blocks[0] else {
            panic!("Expected paragraph");
        };
        assert!(inlines.contains(&Inline::FootnoteRef { id: "1".to_string() }));
        assert!(blocks
            .iter()
            .any(|b| matches!(b, Block::Footnote { id, .. } if id == "1")));
    }

    #[test]
    fn test_extensions_disabled() {
        let blocks = MarkdownParser::new().with_extensions(false).parse("[#Mars]");
        assert_eq!(blocks, vec![Block::Paragraph(vec![Inline::text("[#Mars]")])]);
    }
}
