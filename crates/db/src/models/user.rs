//! User entity model and DTOs.
//!
//! Users exist only as note owners: no credentials or sessions.

use notes_core::types::{DbId, Timestamp};
use notes_core::validation::{check_text, require, FieldErrors, USERNAME_MAX_LEN};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub created_at: Timestamp,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUser {
    pub username: Option<String>,
}

impl CreateUser {
    /// Returns the trimmed username.
    pub fn validate(self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        match require(&mut errors, "username", self.username) {
            Some(username) => {
                let username = username.trim().to_string();
                check_text(&mut errors, "username", &username, Some(USERNAME_MAX_LEN));
                errors.into_result(username)
            }
            None => Err(errors),
        }
    }
}
