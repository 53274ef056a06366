//! mdbook CLI - Command-line interface for books in Markdown

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parse and validate jobs argument (must be at least 1)
fn parse_jobs(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if n < 1 {
        Err("jobs must be at least 1".to_string())
    } else {
        Ok(n)
    }
}

#[derive(Parser)]
#[command(name = "mdbook")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a book, or one of its items, to DOCX or PDF (Typst)
    Export {
        /// Book directory
        book: String,

        /// Output file path
        #[arg(short, long)]
        output: String,

        /// Output format (docx, pdf)
        #[arg(short, long, default_value = "docx")]
        format: String,

        /// Path of the item to export; the whole book when absent
        #[arg(long)]
        item: Option<String>,
    },

    /// Display information about a book
    Info {
        /// Book directory
        book: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the structure of a book
    Validate {
        /// Book directory
        book: String,

        /// Also check references and footnotes
        #[arg(long)]
        strict: bool,
    },

    /// List the indexed terms of a book
    Index {
        /// Book directory
        book: String,
    },

    /// Search the contents of a book with a regular expression
    Search {
        /// Book directory
        book: String,

        /// Regular expression
        term: String,

        #[arg(long)]
        case_sensitive: bool,
    },

    /// Write a zip archive of a book
    Archive {
        /// Book directory
        book: String,

        /// Output file path
        #[arg(short, long)]
        output: String,
    },

    /// Batch export all books of a library directory
    Batch {
        /// Library directory
        library: String,

        /// Output directory
        #[arg(short, long)]
        output_dir: String,

        /// Output format (docx, pdf)
        #[arg(short, long, default_value = "docx")]
        format: String,

        /// Number of parallel jobs (must be at least 1)
        #[arg(short, long, default_value = "4", value_parser = parse_jobs)]
        jobs: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "mdbook_cli=debug,mdbook_core=debug"
    } else {
        "mdbook_cli=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Export {
            book,
            output,
            format,
            item,
        } => commands::export(&book, &output, &format, item.as_deref()),

        Commands::Info { book, json } => commands::info(&book, json),

        Commands::Validate { book, strict } => commands::validate(&book, strict),

        Commands::Index { book } => commands::index(&book),

        Commands::Search {
            book,
            term,
            case_sensitive,
        } => commands::search(&book, &term, case_sensitive),

        Commands::Archive { book, output } => commands::archive(&book, &output),

        Commands::Batch {
            library,
            output_dir,
            format,
            jobs,
        } => commands::batch(&library, &output_dir, &format, jobs),
    }
}
