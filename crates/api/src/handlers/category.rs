//! Handlers for the `/categories` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use notes_core::error::CoreError;
use notes_core::types::DbId;
use notes_db::models::category::{Category, CategoryPayload};
use notes_db::repositories::CategoryRepo;

use crate::error::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::state::AppState;

/// POST /api/v1/categories
pub async fn create(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CategoryPayload>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let name = input.validate()?;
    let category = CategoryRepo::create(&state.pool, &name).await?;
    tracing::info!(category_id = category.id, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/v1/categories
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let categories = CategoryRepo::list(&state.pool).await?;
    Ok(Json(categories))
}

/// GET /api/v1/categories/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Category>> {
    let category = CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Category", id))?;
    Ok(Json(category))
}

/// PUT /api/v1/categories/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    JsonBody(input): JsonBody<CategoryPayload>,
) -> AppResult<Json<Category>> {
    let name = input.validate()?;
    let category = CategoryRepo::update(&state.pool, id, &name)
        .await?
        .ok_or(AppError::not_found("Category", id))?;
    Ok(Json(category))
}

/// DELETE /api/v1/categories/{id}
///
/// Rejected with 409 while any note still references the category.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    match CategoryRepo::delete(&state.pool, id).await {
        Ok(true) => {
            tracing::info!(category_id = id, "Category deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err(AppError::not_found("Category", id)),
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23503") => {
            tracing::warn!(category_id = id, "Refused to delete referenced category");
            Err(AppError::Core(CoreError::Conflict(format!(
                "Category {id} is still referenced by one or more notes"
            ))))
        }
        Err(err) => Err(err.into()),
    }
}
