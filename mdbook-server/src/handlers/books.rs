//! Library and book handlers

use super::{attachment, sanitize_filename};
use crate::error::ApiError;
use crate::state::{AppState, ServerEvent};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use mdbook_core::book::BookState;
use mdbook_core::library::SiteState;
use mdbook_core::{Book, Status, TermIndex};
use serde::{Deserialize, Serialize};

/// Query parameters for listing books
#[derive(Debug, Deserialize)]
pub struct ListBooksQuery {
    /// Page number (1-indexed, 0 treated as 1)
    #[serde(default = "default_page")]
    pub page: u32,

    /// Items per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Search query over titles and authors
    pub search: Option<String>,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    20
}

/// Book summary for list response
#[derive(Debug, Serialize)]
pub struct BookListEntry {
    pub bid: String,
    pub title: String,
    pub authors: Vec<String>,
    pub status: Status,
    pub modified: DateTime<Utc>,
    pub sum_characters: usize,
}

impl From<&Book> for BookListEntry {
    fn from(book: &Book) -> Self {
        Self {
            bid: book.bid.clone(),
            title: book.title(),
            authors: book.authors(),
            status: book.status(),
            modified: book.modified,
            sum_characters: book.sum_characters(),
        }
    }
}

/// List response with pagination
#[derive(Debug, Serialize)]
pub struct ListBooksResponse {
    pub books: Vec<BookListEntry>,
    pub total: u32,
    pub page: u32,
    pub per_page: u32,
}

/// Snapshot of all books in the library
pub async fn site_state(State(state): State<AppState>) -> Json<SiteState> {
    Json(state.library.read().await.state())
}

/// List books, most recently modified first
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListBooksQuery>,
) -> Json<ListBooksResponse> {
    let library = state.library.read().await;

    let search = query.search.as_deref().map(str::to_lowercase);
    let mut books: Vec<BookListEntry> = library
        .books()
        .into_iter()
        .map(BookListEntry::from)
        .filter(|entry| match &search {
            Some(search) => {
                entry.title.to_lowercase().contains(search)
                    || entry
                        .authors
                        .iter()
                        .any(|a| a.to_lowercase().contains(search))
            }
            None => true,
        })
        .collect();
    books.sort_by(|a, b| b.modified.cmp(&a.modified));

    let total = books.len() as u32;
    let page = query.page.max(1);
    let start = ((page - 1) * query.per_page) as usize;
    let books = books
        .into_iter()
        .skip(start)
        .take(query.per_page as usize)
        .collect();

    Json(ListBooksResponse {
        books,
        total,
        page,
        per_page: query.per_page,
    })
}

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
}

/// Create an empty book
pub async fn create_book(
    State(state): State<AppState>,
    Json(request): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookState>), ApiError> {
    let mut library = state.library.write().await;
    let book = library.create_book(&request.title)?;
    tracing::info!("Created book '{}'", book.bid);

    state.broadcast(ServerEvent::BookCreated {
        bid: book.bid.clone(),
        title: book.title(),
    });
    Ok((StatusCode::CREATED, Json(book.state())))
}

/// Tree and statistics of a book
pub async fn get_book(
    State(state): State<AppState>,
    Path(bid): Path<String>,
) -> Result<Json<BookState>, ApiError> {
    let library = state.library.read().await;
    Ok(Json(library.book(&bid)?.state()))
}

#[derive(Debug, Default, Deserialize)]
pub struct ForceQuery {
    #[serde(default)]
    pub force: bool,
}

/// Delete a book; a non-empty book needs `force`
pub async fn delete_book(
    State(state): State<AppState>,
    Path(bid): Path<String>,
    Query(query): Query<ForceQuery>,
) -> Result<StatusCode, ApiError> {
    state
        .library
        .write()
        .await
        .delete_book(&bid, query.force)?;
    tracing::info!("Deleted book '{}'", bid);

    state.broadcast(ServerEvent::BookDeleted { bid });
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CopyBookQuery {
    pub owner: Option<String>,
}

/// Copy a whole book
pub async fn copy_book(
    State(state): State<AppState>,
    Path(bid): Path<String>,
    Query(query): Query<CopyBookQuery>,
) -> Result<(StatusCode, Json<BookState>), ApiError> {
    let mut library = state.library.write().await;
    let copy = library.copy_book(&bid, query.owner.as_deref())?;

    state.broadcast(ServerEvent::BookCreated {
        bid: copy.bid.clone(),
        title: copy.title(),
    });
    Ok((StatusCode::CREATED, Json(copy.state())))
}

/// Re-read a book edited outside the server
pub async fn reload_book(
    State(state): State<AppState>,
    Path(bid): Path<String>,
) -> Result<Json<BookState>, ApiError> {
    let mut library = state.library.write().await;
    let book = library.reload_book(&bid)?;

    state.broadcast(ServerEvent::BookUpdated {
        bid: book.bid.clone(),
        digest: book.digest(),
    });
    Ok(Json(book.state()))
}

/// Index of the terms in a book
pub async fn term_index(
    State(state): State<AppState>,
    Path(bid): Path<String>,
) -> Result<Json<TermIndex>, ApiError> {
    let library = state.library.read().await;
    Ok(Json(TermIndex::build(library.book(&bid)?)))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub term: String,

    #[serde(default)]
    pub ignorecase: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub heading: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub term: String,
    pub hits: Vec<SearchHit>,
}

/// Items whose content matches a regular expression
pub async fn search_book(
    State(state): State<AppState>,
    Path(bid): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let library = state.library.read().await;
    let book = library.book(&bid)?;

    let hits = book
        .search(&query.term, query.ignorecase)?
        .into_iter()
        .map(|path| {
            let heading = match book.get(&path) {
                Some(item) if !path.is_empty() => item.heading(),
                _ => book.title(),
            };
            SearchHit { path, heading }
        })
        .collect();

    Ok(Json(SearchResponse {
        term: query.term,
        hits,
    }))
}

/// Zip archive of the book directory
pub async fn archive_book(
    State(state): State<AppState>,
    Path(bid): Path<String>,
) -> Result<Response, ApiError> {
    let book = state.library.read().await.book(&bid)?.clone();

    let data = tokio::task::spawn_blocking(move || book.archive())
        .await
        .map_err(|e| ApiError::internal(e.to_string()))??;

    let filename = format!("{}.zip", sanitize_filename(&bid, 50));
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, attachment(&filename)),
        ],
        data,
    )
        .into_response())
}
