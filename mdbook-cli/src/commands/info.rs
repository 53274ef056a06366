//! Info command implementation

use super::open_book;
use anyhow::Result;
use mdbook_core::{Book, Status};
use serde::Serialize;

/// Book info output
#[derive(Serialize)]
struct BookInfo {
    bid: String,
    title: String,
    subtitle: Option<String>,
    authors: Vec<String>,
    language: Option<String>,
    status: Status,
    sections: usize,
    texts: usize,
    words: usize,
    characters: usize,
    indexed_terms: usize,
    cited_references: usize,
}

impl From<&Book> for BookInfo {
    fn from(book: &Book) -> Self {
        let items = book.all_items();
        let texts = items.iter().filter(|item| item.is_text()).count();
        Self {
            bid: book.bid.clone(),
            title: book.title(),
            subtitle: book.subtitle(),
            authors: book.authors(),
            language: book.language(),
            status: book.status(),
            sections: items.len() - texts,
            texts,
            words: book.sum_words(),
            characters: book.sum_characters(),
            indexed_terms: book.indexed().len(),
            cited_references: book.references().len(),
        }
    }
}

/// Display information about a book
pub fn info(book: &str, json: bool) -> Result<()> {
    let book = open_book(book)?;
    let info = BookInfo::from(&book);

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("Title:       {}", info.title);
        if let Some(subtitle) = &info.subtitle {
            println!("Subtitle:    {}", subtitle);
        }
        if !info.authors.is_empty() {
            println!("Authors:     {}", info.authors.join(", "));
        }
        if let Some(language) = &info.language {
            println!("Language:    {}", language);
        }
        println!("Status:      {}", info.status);
        println!("Sections:    {}", info.sections);
        println!("Texts:       {}", info.texts);
        println!("Words:       {}", info.words);
        println!("Characters:  {}", info.characters);
        println!("Indexed:     {}", info.indexed_terms);
        println!("References:  {}", info.cited_references);
    }

    Ok(())
}
