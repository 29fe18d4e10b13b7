pub mod category;
pub mod health;
pub mod note;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /notes                 list (filter + ordering), create
/// /notes/{id}            get, update, partial update, delete
///
/// /categories            list, create
/// /categories/{id}       get, rename, delete (409 while referenced)
///
/// /users                 list, create
/// /users/{id}            get, delete (cascades to notes)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/notes", note::router())
        .nest("/categories", category::router())
        .nest("/users", user::router())
}
