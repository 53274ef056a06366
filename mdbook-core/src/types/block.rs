//! Semantic AST types for Markdown content

use serde::{Deserialize, Serialize};

/// Block-level content element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Block {
    /// Heading (h1-h6)
    Header {
        level: u8,
        content: Vec<Inline>,
        anchor: Option<String>,
    },

    /// Paragraph of text
    Paragraph(Vec<Inline>),

    /// Ordered or unordered list
    List {
        items: Vec<Vec<Block>>,
        ordered: bool,
    },

    /// Image reference
    Image { url: String, alt: String },

    /// Code block with optional language
    CodeBlock { lang: Option<String>, code: String },

    /// Block quote
    Blockquote(Vec<Block>),

    /// Horizontal rule / thematic break
    ThematicBreak,

    /// Table
    Table(TableData),

    /// Footnote definition
    Footnote { id: String, content: Vec<Block> },
}

/// Inline content element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Inline {
    /// Plain text
    Text(String),

    /// Bold/strong text
    Bold(Vec<Inline>),

    /// Italic/emphasized text
    Italic(Vec<Inline>),

    /// Inline code
    Code(String),

    /// Hyperlink
    Link { children: Vec<Inline>, url: String },

    /// Superscript text, `^text^`
    Superscript(Vec<Inline>),

    /// Subscript text, `~text~`
    Subscript(Vec<Inline>),

    /// Footnote reference, `[^label]`
    FootnoteRef { id: String },

    /// Indexed term, `[#term|canonical]`
    Indexed { term: String, canonical: String },

    /// Citation of an entry in the references book, `[@Name Year]`
    Reference { name: String, id: String },

    /// Line break
    Break,
}

impl Inline {
    /// Create a plain text inline
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }

    /// Create a bold inline
    pub fn bold(children: Vec<Inline>) -> Self {
        Inline::Bold(children)
    }

    /// Create an italic inline
    pub fn italic(children: Vec<Inline>) -> Self {
        Inline::Italic(children)
    }

    /// Create a link inline
    pub fn link(children: Vec<Inline>, url: impl Into<String>) -> Self {
        Inline::Link {
            children,
            url: url.into(),
        }
    }

    /// Nested inline children, if any
    pub fn children(&self) -> &[Inline] {
        match self {
            Inline::Bold(c)
            | Inline::Italic(c)
            | Inline::Superscript(c)
            | Inline::Subscript(c)
            | Inline::Link { children: c, .. } => c,
            _ => &[],
        }
    }
}

impl Block {
    /// Create a paragraph from inline elements
    pub fn paragraph(content: Vec<Inline>) -> Self {
        Block::Paragraph(content)
    }

    /// Create a header
    pub fn header(level: u8, content: Vec<Inline>) -> Self {
        Block::Header {
            level: level.clamp(1, 6),
            content,
            anchor: None,
        }
    }

    /// Create a code block
    pub fn code_block(code: impl Into<String>, lang: Option<String>) -> Self {
        Block::CodeBlock {
            lang,
            code: code.into(),
        }
    }
}

/// Table data structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableData {
    /// Table header row
    pub headers: Vec<TableCell>,

    /// Table body rows
    pub rows: Vec<Vec<TableCell>>,
}

/// Single table cell
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableCell {
    /// Cell content
    pub content: Vec<Inline>,
}

impl TableCell {
    pub fn new(content: Vec<Inline>) -> Self {
        Self { content }
    }
}

/// Visit every inline in the blocks, depth first, including footnote bodies
pub fn visit_inlines<'a>(blocks: &'a [Block], f: &mut impl FnMut(&'a Inline)) {
    for block in blocks {
        match block {
            Block::Header { content, .. } | Block::Paragraph(content) => visit_inline_list(content, f),
            Block::List { items, .. } => {
                for item in items {
                    visit_inlines(item, f);
                }
            }
            Block::Blockquote(blocks) | Block::Footnote { content: blocks, .. } => {
                visit_inlines(blocks, f)
            }
            Block::Table(table) => {
                for cell in table.headers.iter().chain(table.rows.iter().flatten()) {
                    visit_inline_list(&cell.content, f);
                }
            }
            Block::Image { .. } | Block::CodeBlock { .. } | Block::ThematicBreak => {}
        }
    }
}

fn visit_inline_list<'a>(inlines: &'a [Inline], f: &mut impl FnMut(&'a Inline)) {
    for inline in inlines {
        f(inline);
        visit_inline_list(inline.children(), f);
    }
}

/// Mutable counterpart of [`visit_inlines`]
pub fn visit_inlines_mut(blocks: &mut [Block], f: &mut impl FnMut(&mut Inline)) {
    for block in blocks {
        match block {
            Block::Header { content, .. } | Block::Paragraph(content) => {
                visit_inline_list_mut(content, f)
            }
            Block::List { items, .. } => {
                for item in items {
                    visit_inlines_mut(item, f);
                }
            }
            Block::Blockquote(blocks) | Block::Footnote { content: blocks, .. } => {
                visit_inlines_mut(blocks, f)
            }
            Block::Table(table) => {
                for cell in table.headers.iter_mut().chain(table.rows.iter_mut().flatten()) {
                    visit_inline_list_mut(&mut cell.content, f);
                }
            }
            Block::Image { .. } | Block::CodeBlock { .. } | Block::ThematicBreak => {}
        }
    }
}

fn visit_inline_list_mut(inlines: &mut [Inline], f: &mut impl FnMut(&mut Inline)) {
    for inline in inlines {
        f(inline);
        match inline {
            Inline::Bold(c)
            | Inline::Italic(c)
            | Inline::Superscript(c)
            | Inline::Subscript(c)
            | Inline::Link { children: c, .. } => visit_inline_list_mut(c, f),
            _ => {}
        }
    }
}

/// Convert inline elements to plain text
pub fn inlines_to_text(inlines: &[Inline]) -> String {
    inlines
        .iter()
        .map(|i| match i {
            Inline::Text(s) | Inline::Code(s) => s.clone(),
            Inline::Bold(children)
            | Inline::Italic(children)
            | Inline::Superscript(children)
            | Inline::Subscript(children)
            | Inline::Link { children, .. } => inlines_to_text(children),
            Inline::FootnoteRef { id } => format!("[{}]", id),
            Inline::Indexed { term, .. } => term.clone(),
            Inline::Reference { name, .. } => name.clone(),
            Inline::Break => " ".to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_reaches_nested_inlines() {
        let blocks = vec![
            Block::Paragraph(vec![Inline::bold(vec![Inline::Indexed {
                term: "Mars".to_string(),
                canonical: "Mars".to_string(),
            }])]),
            Block::List {
                items: vec![vec![Block::paragraph(vec![Inline::FootnoteRef {
                    id: "1".to_string(),
                }])]],
                ordered: false,
            },
        ];

        let mut seen = Vec::new();
        visit_inlines(&blocks, &mut |inline| {
            if let Inline::Indexed { canonical, .. } = inline {
                seen.push(canonical.clone());
            }
            if let Inline::FootnoteRef { id } = inline {
                seen.push(id.clone());
            }
        });
        assert_eq!(seen, vec!["Mars", "1"]);
    }

    #[test]
    fn test_inlines_to_text() {
        let inlines = vec![
            Inline::text("See "),
            Inline::Reference {
                name: "Darwin 1859".to_string(),
                id: "darwin-1859".to_string(),
            },
            Inline::text(" on "),
            Inline::italic(vec![Inline::text("species")]),
        ];
        assert_eq!(inlines_to_text(&inlines), "See Darwin 1859 on species");
    }
}
