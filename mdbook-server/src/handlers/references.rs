//! Reference handlers

use crate::error::ApiError;
use crate::state::{AppState, ServerEvent};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mdbook_core::library::Citation;
use mdbook_core::{BookError, Reference};
use serde::Serialize;

/// All references sorted by id
pub async fn list_references(State(state): State<AppState>) -> Json<Vec<Reference>> {
    Json(state.library.read().await.references().all())
}

/// Add a reference; its id is derived from the name
pub async fn create_reference(
    State(state): State<AppState>,
    Json(reference): Json<Reference>,
) -> Result<(StatusCode, Json<Reference>), ApiError> {
    let created = state
        .library
        .write()
        .await
        .references_mut()
        .create(reference)?;
    tracing::info!("Created reference '{}'", created.id);

    state.broadcast(ServerEvent::ReferencesUpdated {
        id: created.id.clone(),
    });
    Ok((StatusCode::CREATED, Json(created)))
}

/// Reference with the texts citing it
#[derive(Debug, Serialize)]
pub struct ReferenceDetail {
    #[serde(flatten)]
    pub reference: Reference,
    pub citations: Vec<Citation>,
}

pub async fn get_reference(
    State(state): State<AppState>,
    Path(refid): Path<String>,
) -> Result<Json<ReferenceDetail>, ApiError> {
    let library = state.library.read().await;
    let reference = library
        .references()
        .get(&refid)
        .ok_or_else(|| BookError::NoSuchReference(refid.clone()))?;

    Ok(Json(ReferenceDetail {
        reference,
        citations: library.citations(&refid),
    }))
}

pub async fn delete_reference(
    State(state): State<AppState>,
    Path(refid): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .library
        .write()
        .await
        .references_mut()
        .delete(&refid)?;
    tracing::info!("Deleted reference '{}'", refid);

    state.broadcast(ServerEvent::ReferencesUpdated { id: refid });
    Ok(StatusCode::NO_CONTENT)
}
