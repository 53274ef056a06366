//! Export command implementation

use super::{open_book, open_references};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use mdbook_core::encoder::encoder_for_format;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Duration;

/// Export a book, or one item of it, to a file
pub fn export(book: &str, output: &str, format: &str, item: Option<&str>) -> Result<()> {
    let encoder = encoder_for_format(format)
        .with_context(|| format!("No encoder available for {} format", format))?;

    // Set up progress bar with animation
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message("Reading book...");
    let book = open_book(book)?;
    let references = open_references(&book)?;
    tracing::info!(
        "Read '{}' with {} items",
        book.title(),
        book.all_items().len()
    );

    pb.set_message(format!("Exporting to {}...", encoder.format_name()));
    let file = File::create(output)
        .with_context(|| format!("Failed to create output file: {}", output))?;
    let mut writer = BufWriter::new(file);
    mdbook_core::export::export(&book, references.as_ref(), item, format, &mut writer)
        .with_context(|| format!("Failed to export to {}", format))?;
    writer.flush()?;

    pb.finish_with_message(format!(
        "Exported '{}' to {} -> {}",
        book.title(),
        encoder.format_name(),
        output
    ));

    Ok(())
}
