//! Field-level validation for request payloads and query parameters.
//!
//! Checks accumulate into a [`FieldErrors`] map so a caller sees every
//! offending field at once instead of only the first.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Column limits
// ---------------------------------------------------------------------------

pub const TITLE_MAX_LEN: usize = 255;
pub const PUBLIC_LINK_MAX_LEN: usize = 150;
pub const CATEGORY_NAME_MAX_LEN: usize = 155;
pub const USERNAME_MAX_LEN: usize = 150;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_BLANK: &str = "This field may not be blank.";

pub fn msg_max_len(max_len: usize) -> String {
    format!("Ensure this field has no more than {max_len} characters.")
}

pub fn msg_missing_reference(id: i64) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

// ---------------------------------------------------------------------------
// FieldErrors
// ---------------------------------------------------------------------------

/// Field name -> human-readable messages. Serializes as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Append every message from `other`.
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Record a "required" error when `value` is `None`; pass the value through.
pub fn require<T>(errors: &mut FieldErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        errors.add(field, MSG_REQUIRED);
    }
    value
}

/// Reject blank text and, when `max_len` is given, text longer than it
/// (counted in characters, not bytes).
pub fn check_text(errors: &mut FieldErrors, field: &str, value: &str, max_len: Option<usize>) {
    if value.trim().is_empty() {
        errors.add(field, MSG_BLANK);
        return;
    }
    if let Some(max_len) = max_len {
        check_max_len(errors, field, value, max_len);
    }
}

/// Length-only check for fields where blank is allowed.
pub fn check_max_len(errors: &mut FieldErrors, field: &str, value: &str, max_len: usize) {
    if value.chars().count() > max_len {
        errors.add(field, msg_max_len(max_len));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_errors_pass_value_through() {
        let errors = FieldErrors::new();
        assert_eq!(errors.into_result(7), Ok(7));
    }

    #[test]
    fn messages_accumulate_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("title", "first");
        errors.add("title", "second");
        errors.add("content", "third");

        assert_eq!(errors.get("title").unwrap(), ["first", "second"]);
        assert!(errors.contains("content"));
        assert_eq!(
            errors.to_string(),
            "content: third; title: first; title: second"
        );
    }

    #[test]
    fn merge_keeps_both_sides() {
        let mut errors = FieldErrors::new();
        errors.add("category", "a");
        let mut other = FieldErrors::new();
        other.add("category", "b");
        other.add("title", "c");

        errors.merge(other);
        assert_eq!(errors.get("category").unwrap(), ["a", "b"]);
        assert_eq!(errors.get("title").unwrap(), ["c"]);
    }

    #[test]
    fn require_records_missing_value() {
        let mut errors = FieldErrors::new();
        assert_eq!(require::<i64>(&mut errors, "author", None), None);
        assert_eq!(require(&mut errors, "category", Some(1)), Some(1));
        assert_eq!(errors.get("author").unwrap(), [MSG_REQUIRED]);
        assert!(!errors.contains("category"));
    }

    #[test]
    fn blank_text_is_rejected() {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "title", "   ", Some(TITLE_MAX_LEN));
        assert_eq!(errors.get("title").unwrap(), [MSG_BLANK]);
    }

    #[test]
    fn length_counts_characters() {
        let mut errors = FieldErrors::new();
        let exactly = "é".repeat(PUBLIC_LINK_MAX_LEN);
        check_max_len(&mut errors, "public_link", &exactly, PUBLIC_LINK_MAX_LEN);
        assert!(errors.is_empty());

        check_text(&mut errors, "title", &"x".repeat(256), Some(TITLE_MAX_LEN));
        assert_eq!(errors.get("title").unwrap(), [msg_max_len(255)]);
    }
}
