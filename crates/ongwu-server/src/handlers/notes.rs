//! Note endpoints.
//!
//! El GET de listado es cache-aside: cache primero, store en el miss,
//! insert del payload serializado. Toda mutacion invalida el namespace
//! de notas del usuario antes de responder.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::auth::CurrentUser;
use crate::cache::{CacheKey, ResourceKind};
use crate::error::AppError;
use crate::handlers::response::{MessageResponse, NoteResponse, NotesResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePayload {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /api/notes
#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn list_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = CacheKey::notes(user.user_id);

    if let Some(entry) = state.cache().get(&key).await {
        return Ok(Json(entry.payload().clone()));
    }

    let notes = state.store().notes_for_user(user.user_id).await?;
    let payload = serde_json::to_value(NotesResponse {
        success: true,
        notes,
    })
    .map_err(|e| AppError::Internal(e.to_string()))?;

    state.cache().insert(key, payload.clone()).await;

    Ok(Json(payload))
}

/// POST /api/notes
#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn create_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<NotePayload>,
) -> Result<Json<NoteResponse>, AppError> {
    let title = body.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title cannot be empty".to_string()));
    }
    let content = body.content.unwrap_or_default();

    let note = state
        .store()
        .create_note(title, &content, body.category_id, user.user_id)
        .await?;

    state
        .cache()
        .invalidate_resource(ResourceKind::Notes, user.user_id)
        .await;

    Ok(Json(NoteResponse {
        success: true,
        note,
    }))
}

/// PUT /api/notes/{id}
#[instrument(skip_all, fields(user_id = user.user_id, note_id = id))]
pub async fn update_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<NotePayload>,
) -> Result<Json<NoteResponse>, AppError> {
    let title = body.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title cannot be empty".to_string()));
    }
    let content = body.content.unwrap_or_default();

    let note = state
        .store()
        .update_note(id, title, &content, body.category_id, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Note not found".to_string()))?;

    state
        .cache()
        .invalidate_resource(ResourceKind::Notes, user.user_id)
        .await;

    Ok(Json(NoteResponse {
        success: true,
        note,
    }))
}

/// DELETE /api/notes/{id}
#[instrument(skip_all, fields(user_id = user.user_id, note_id = id))]
pub async fn delete_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store().delete_note(id, user.user_id).await? {
        return Err(AppError::NotFound("Note not found".to_string()));
    }

    state
        .cache()
        .invalidate_resource(ResourceKind::Notes, user.user_id)
        .await;

    Ok(Json(MessageResponse::ok("Note deleted")))
}

/// GET /api/notes/search?q=
///
/// La busqueda nunca se cachea: cada query es distinta y el resultado
/// caduca con la siguiente mutacion de todas formas.
#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn search_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<NotesResponse>, AppError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(AppError::BadRequest(
            "Search query cannot be empty".to_string(),
        ));
    }

    let notes = state.store().search_notes(q, user.user_id).await?;

    Ok(Json(NotesResponse {
        success: true,
        notes,
    }))
}
