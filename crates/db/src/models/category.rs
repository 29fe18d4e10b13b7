//! Category entity model and DTOs.

use notes_core::types::DbId;
use notes_core::validation::{check_text, require, FieldErrors, CATEGORY_NAME_MAX_LEN};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
}

/// Body of `POST /categories` and `PUT /categories/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPayload {
    pub name: Option<String>,
}

impl CategoryPayload {
    /// Returns the checked name. Names are not required to be unique.
    pub fn validate(self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = require(&mut errors, "name", self.name);
        match name {
            Some(name) => {
                check_text(&mut errors, "name", &name, Some(CATEGORY_NAME_MAX_LEN));
                errors.into_result(name)
            }
            None => Err(errors),
        }
    }
}
