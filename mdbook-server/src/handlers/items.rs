//! Section and text handlers

use super::books::ForceQuery;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use mdbook_core::book::ItemDetail;
use mdbook_core::Status;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub title: String,

    /// Path of the parent section; the book itself when absent
    pub parent: Option<String>,
}

/// Create a section last in its parent
pub async fn create_section(
    State(state): State<AppState>,
    Path(bid): Path<String>,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemDetail>), ApiError> {
    let detail = state
        .update_book(&bid, |book| {
            let path = book.create_section(&request.title, request.parent.as_deref())?;
            book.item_detail(&path)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Create a text last in its parent
pub async fn create_text(
    State(state): State<AppState>,
    Path(bid): Path<String>,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemDetail>), ApiError> {
    let detail = state
        .update_book(&bid, |book| {
            let path = book.create_text(&request.title, request.parent.as_deref())?;
            book.item_detail(&path)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Item with its content and neighbours
pub async fn get_item(
    State(state): State<AppState>,
    Path((bid, path)): Path<(String, String)>,
) -> Result<Json<ItemDetail>, ApiError> {
    let library = state.library.read().await;
    Ok(Json(library.book(&bid)?.item_detail(&path)?))
}

/// Fields to change; absent fields are left as they are
#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub status: Option<String>,
    pub content: Option<String>,
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((bid, path)): Path<(String, String)>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<ItemDetail>, ApiError> {
    let status = request
        .status
        .as_deref()
        .map(str::parse::<Status>)
        .transpose()?;

    let detail = state
        .update_book(&bid, |book| {
            if let Some(title) = &request.title {
                book.set_title(&path, title)?;
            }
            if let Some(status) = status {
                book.set_status(&path, status)?;
            }
            if let Some(content) = &request.content {
                book.write_content(&path, content)?;
            }
            book.item_detail(&path)
        })
        .await?;
    Ok(Json(detail))
}

/// Delete an item; a non-empty section needs `force`
pub async fn delete_item(
    State(state): State<AppState>,
    Path((bid, path)): Path<(String, String)>,
    Query(query): Query<ForceQuery>,
) -> Result<StatusCode, ApiError> {
    state
        .update_book(&bid, |book| book.delete_item(&path, query.force))
        .await?;
    tracing::info!("Deleted '{}' in book '{}'", path, bid);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
    Outof,
    Into,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: Direction,
}

/// New location of a moved or created item
#[derive(Debug, Serialize)]
pub struct PathResponse {
    pub path: String,
}

/// Move an item among its siblings, out of its section, or into the preceding section
pub async fn move_item(
    State(state): State<AppState>,
    Path((bid, path)): Path<(String, String)>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<PathResponse>, ApiError> {
    let moved = state
        .update_book(&bid, |book| match request.direction {
            Direction::Forward => book.move_forward(&path).map(|()| path.clone()),
            Direction::Backward => book.move_backward(&path).map(|()| path.clone()),
            Direction::Outof => book.move_outof(&path),
            Direction::Into => book.move_into(&path),
        })
        .await?;
    Ok(Json(PathResponse { path: moved }))
}

/// Copy an item to a new name right after it
pub async fn copy_item(
    State(state): State<AppState>,
    Path((bid, path)): Path<(String, String)>,
) -> Result<(StatusCode, Json<ItemDetail>), ApiError> {
    let detail = state
        .update_book(&bid, |book| {
            let copy = book.copy_item(&path)?;
            book.item_detail(&copy)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Turn a text into a section holding it
pub async fn to_section(
    State(state): State<AppState>,
    Path((bid, path)): Path<(String, String)>,
) -> Result<Json<ItemDetail>, ApiError> {
    let detail = state
        .update_book(&bid, |book| {
            book.to_section(&path)?;
            book.item_detail(&path)
        })
        .await?;
    Ok(Json(detail))
}
