//! Note entity model and DTOs.

use notes_core::types::{DbId, Timestamp};
use notes_core::validation::{
    check_max_len, check_text, require, FieldErrors, PUBLIC_LINK_MAX_LEN, TITLE_MAX_LEN,
};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `notes` table.
///
/// Serialized flat: `category` and `author` are the raw reference ids.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Note {
    pub id: DbId,
    pub title: String,
    pub content: String,
    #[sqlx(rename = "category_id")]
    pub category: DbId,
    #[sqlx(rename = "author_id")]
    pub author: DbId,
    pub date_created: Timestamp,
    pub date_updated: Timestamp,
    pub is_favorite: bool,
    pub is_public: bool,
    pub public_link: Option<String>,
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /notes` and `PUT /notes/{id}`.
///
/// Every field is optional at the wire level so a missing field becomes a
/// field error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotePayload {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<DbId>,
    pub author: Option<DbId>,
    pub is_favorite: Option<bool>,
    pub is_public: Option<bool>,
    pub public_link: Option<String>,
}

/// A fully validated note, ready to insert or to replace an existing row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub category_id: DbId,
    pub author_id: DbId,
    pub is_favorite: bool,
    pub is_public: bool,
    pub public_link: Option<String>,
}

impl NotePayload {
    /// Check required fields and lengths. Flags default to `false`.
    pub fn validate(self) -> Result<NewNote, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = require(&mut errors, "title", self.title);
        if let Some(title) = &title {
            check_text(&mut errors, "title", title, Some(TITLE_MAX_LEN));
        }
        let content = require(&mut errors, "content", self.content);
        if let Some(content) = &content {
            check_text(&mut errors, "content", content, None);
        }
        let category_id = require(&mut errors, "category", self.category);
        let author_id = require(&mut errors, "author", self.author);
        if let Some(link) = &self.public_link {
            check_max_len(&mut errors, "public_link", link, PUBLIC_LINK_MAX_LEN);
        }

        match (title, content, category_id, author_id) {
            (Some(title), Some(content), Some(category_id), Some(author_id))
                if errors.is_empty() =>
            {
                Ok(NewNote {
                    title,
                    content,
                    category_id,
                    author_id,
                    is_favorite: self.is_favorite.unwrap_or(false),
                    is_public: self.is_public.unwrap_or(false),
                    public_link: self.public_link,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Body of `PATCH /notes/{id}`. Only present fields are applied.
///
/// `public_link` distinguishes "absent" (`None`) from an explicit `null`
/// (`Some(None)`), which clears the link.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<DbId>,
    pub author: Option<DbId>,
    pub is_favorite: Option<bool>,
    pub is_public: Option<bool>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub public_link: Option<Option<String>>,
}

impl NotePatch {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(title) = &self.title {
            check_text(&mut errors, "title", title, Some(TITLE_MAX_LEN));
        }
        if let Some(content) = &self.content {
            check_text(&mut errors, "content", content, None);
        }
        if let Some(Some(link)) = &self.public_link {
            check_max_len(&mut errors, "public_link", link, PUBLIC_LINK_MAX_LEN);
        }
        errors.into_result(())
    }
}

/// Wraps any present value (including `null`) in `Some`; combined with
/// `#[serde(default)]` an absent field stays `None`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
