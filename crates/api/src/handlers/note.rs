//! Handlers for the `/notes` resource.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use notes_core::note_query::NoteQuery;
use notes_core::types::DbId;
use notes_core::validation::{msg_missing_reference, FieldErrors};
use notes_db::models::note::{Note, NotePatch, NotePayload};
use notes_db::repositories::{CategoryRepo, NoteRepo, UserRepo};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::state::AppState;

/// GET /api/v1/notes
///
/// Query parameters: `date_after`, `date_before`, `title`, `category`,
/// `is_favorite`, `ordering`. Unknown parameters are ignored.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Vec<Note>>> {
    let query = NoteQuery::from_params(&params)?;
    tracing::debug!(filter = ?query.filter, ordering = ?query.ordering, "Listing notes");

    let notes = NoteRepo::list(&state.pool, &query).await?;
    Ok(Json(notes))
}

/// POST /api/v1/notes
pub async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<NotePayload>,
) -> AppResult<(StatusCode, Json<Note>)> {
    let mut errors = check_references(&state.pool, input.category, input.author).await?;
    let new_note = match input.validate() {
        Ok(new_note) => errors.into_result(new_note)?,
        Err(invalid) => {
            errors.merge(invalid);
            return Err(errors.into());
        }
    };

    let note = NoteRepo::create(&state.pool, &new_note).await?;
    tracing::info!(note_id = note.id, author_id = note.author, "Note created");

    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /api/v1/notes/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Note>> {
    let note = NoteRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Note", id))?;
    Ok(Json(note))
}

/// PUT /api/v1/notes/{id}
///
/// Full replacement: the body has the same shape and requirements as create.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    JsonBody(input): JsonBody<NotePayload>,
) -> AppResult<Json<Note>> {
    ensure_exists(&state.pool, id).await?;

    let mut errors = check_references(&state.pool, input.category, input.author).await?;
    let replacement = match input.validate() {
        Ok(replacement) => errors.into_result(replacement)?,
        Err(invalid) => {
            errors.merge(invalid);
            return Err(errors.into());
        }
    };

    let note = NoteRepo::update(&state.pool, id, &replacement)
        .await?
        .ok_or(AppError::not_found("Note", id))?;
    tracing::info!(note_id = id, "Note updated");

    Ok(Json(note))
}

/// PATCH /api/v1/notes/{id}
pub async fn partial_update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    JsonBody(patch): JsonBody<NotePatch>,
) -> AppResult<Json<Note>> {
    ensure_exists(&state.pool, id).await?;

    let mut errors = check_references(&state.pool, patch.category, patch.author).await?;
    if let Err(invalid) = patch.validate() {
        errors.merge(invalid);
    }
    errors.into_result(())?;

    let note = NoteRepo::patch(&state.pool, id, &patch)
        .await?
        .ok_or(AppError::not_found("Note", id))?;
    tracing::info!(note_id = id, "Note partially updated");

    Ok(Json(note))
}

/// DELETE /api/v1/notes/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    let deleted = NoteRepo::delete(&state.pool, id).await?;
    if deleted {
        tracing::info!(note_id = id, "Note deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Note", id))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_exists(pool: &PgPool, id: DbId) -> AppResult<()> {
    NoteRepo::find_by_id(pool, id)
        .await?
        .map(|_| ())
        .ok_or(AppError::not_found("Note", id))
}

/// Field errors for any supplied `category` / `author` id that does not exist.
async fn check_references(
    pool: &PgPool,
    category: Option<DbId>,
    author: Option<DbId>,
) -> AppResult<FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Some(category_id) = category {
        if !CategoryRepo::exists(pool, category_id).await? {
            errors.add("category", msg_missing_reference(category_id));
        }
    }
    if let Some(author_id) = author {
        if !UserRepo::exists(pool, author_id).await? {
            errors.add("author", msg_missing_reference(author_id));
        }
    }
    Ok(errors)
}
