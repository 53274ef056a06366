//! Export download handler

use super::{attachment, sanitize_filename};
use crate::error::ApiError;
use crate::state::{AppState, ServerEvent};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use mdbook_core::encoder::encoder_for_format;
use mdbook_core::export::export;
use mdbook_core::MdbookError;
use serde::Deserialize;

/// Query parameters for download
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// Output format: docx or pdf
    #[serde(default = "default_format")]
    pub format: String,

    /// Path of the item to export; the whole book when absent
    pub item: Option<String>,
}

fn default_format() -> String {
    "docx".to_string()
}

/// Export a book, or one of its items, in the requested format
pub async fn download_book(
    State(state): State<AppState>,
    Path(bid): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let encoder = encoder_for_format(&query.format)
        .ok_or_else(|| ApiError::bad_request(format!("Unsupported format: {}", query.format)))?;

    let (book, references) = {
        let library = state.library.read().await;
        let book = library.book(&bid)?.clone();
        if let Some(path) = &query.item {
            book.item(path)?;
        }
        (book, library.references().clone())
    };

    let filename = match &query.item {
        Some(path) => format!("{}-{}", bid, path.replace('/', "-")),
        None => bid.clone(),
    };
    let filename = format!(
        "{}.{}",
        sanitize_filename(&filename, 80),
        encoder.file_extension()
    );
    let mime_type = encoder.mime_type().to_string();

    // Export in a blocking task (CPU-intensive operation)
    let item = query.item.clone();
    let format = query.format.to_lowercase();
    let output = tokio::task::spawn_blocking(move || {
        let mut output = Vec::new();
        export(
            &book,
            Some(&references),
            item.as_deref(),
            &format,
            &mut output,
        )?;
        Ok::<_, MdbookError>(output)
    })
    .await
    .map_err(|e| ApiError::internal(e.to_string()))??;

    tracing::info!("Exported '{}' as {} ({} bytes)", filename, query.format, output.len());
    state.broadcast(ServerEvent::ExportComplete {
        bid,
        format: query.format,
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type)
        .header(header::CONTENT_DISPOSITION, attachment(&filename))
        .body(output.into())
        .map_err(|e| ApiError::internal(e.to_string()))
}
