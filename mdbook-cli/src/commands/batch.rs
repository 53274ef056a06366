//! Batch export command implementation

use super::open_references;
use anyhow::{bail, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mdbook_core::book::INDEX_FILE;
use mdbook_core::encoder::encoder_for_format;
use mdbook_core::references::{References, REFERENCES_DIR};
use mdbook_core::Book;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Book directories of a library; hidden directories and the references are skipped
fn book_dirs(library: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(library)
        .with_context(|| format!("Failed to read library: {}", library.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir() && p.join(INDEX_FILE).is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|name| !name.starts_with('.') && name != REFERENCES_DIR)
                .unwrap_or(false)
        })
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Export every book of a library directory
pub fn batch(library: &str, output_dir: &str, format: &str, jobs: usize) -> Result<()> {
    let library_path = Path::new(library);
    let output_path = Path::new(output_dir);

    let encoder = encoder_for_format(format)
        .with_context(|| format!("No encoder available for {} format", format))?;

    let dirs = book_dirs(library_path)?;
    if dirs.is_empty() {
        println!("No books found in {}", library);
        return Ok(());
    }

    // Ensure output directory exists
    fs::create_dir_all(output_path)?;

    println!("Found {} books to export", dirs.len());

    // Set up progress tracking
    let multi_progress = MultiProgress::new();
    let overall_pb = multi_progress.add(ProgressBar::new(dirs.len() as u64));
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")?
            .progress_chars("##-"),
    );

    let success_count = AtomicUsize::new(0);
    let error_count = AtomicUsize::new(0);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to start worker threads")?;

    pool.install(|| {
        dirs.par_iter().for_each(|dir| {
            match export_book(dir, output_path, format, encoder.file_extension()) {
                Ok(_) => {
                    success_count.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    error_count.fetch_add(1, Ordering::Relaxed);
                    tracing::error!("Failed to export {:?}: {:#}", dir, e);
                }
            }

            overall_pb.inc(1);
        });
    });

    overall_pb.finish();

    let success = success_count.load(Ordering::Relaxed);
    let errors = error_count.load(Ordering::Relaxed);

    println!("\nBatch export complete:");
    println!("  Success: {}", success);
    println!("  Errors:  {}", errors);

    if errors > 0 {
        bail!("Batch export completed with {} errors", errors);
    }

    Ok(())
}

fn export_book(dir: &Path, output_dir: &Path, format: &str, extension: &str) -> Result<()> {
    let book = Book::read(dir)?;
    let references: Option<References> = open_references(&book)?;

    let output_file = output_dir.join(format!("{}.{}", book.bid, extension));
    let mut writer = BufWriter::new(File::create(&output_file)?);
    mdbook_core::export::export(&book, references.as_ref(), None, format, &mut writer)?;
    writer.flush()?;

    tracing::info!("Exported {:?} -> {:?}", dir, output_file);
    Ok(())
}
