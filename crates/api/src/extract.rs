//! Request extractors that report failures as [`AppError`].

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use notes_core::validation::FieldErrors;

use crate::error::AppError;

/// Key for errors that cannot be pinned to one field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// `Json<T>` with the API's error body.
///
/// A well-formed body whose values have the wrong type (`"is_favorite":
/// "yes"`) becomes a 400 with that field in `fields`, like any other field
/// error. A body that is not JSON at all, or is sent without a JSON content
/// type, is a plain 400 `BAD_REQUEST`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let (field, message) = split_data_error(&err.body_text());
            tracing::debug!(%field, %message, "Rejected JSON body with wrong-typed value");
            let mut errors = FieldErrors::new();
            errors.add(&field, message);
            errors.into()
        }
        other => {
            tracing::debug!(error = %other.body_text(), "Rejected unreadable JSON body");
            AppError::BadRequest(other.body_text())
        }
    }
}

/// Split a serde data error into the offending field path and its message.
///
/// The text looks like `<prefix>is_favorite: invalid type: ... at line 1
/// column 22`. Errors at the document root carry no path and land under
/// [`NON_FIELD_ERRORS`].
fn split_data_error(body_text: &str) -> (String, String) {
    let detail = body_text
        .strip_prefix(DATA_ERROR_PREFIX)
        .unwrap_or(body_text);
    let detail = strip_position(detail);

    match detail.split_once(": ") {
        Some((path, message)) if !path.is_empty() && !path.contains(' ') => {
            (path.to_string(), message.to_string())
        }
        _ => (NON_FIELD_ERRORS.to_string(), detail.to_string()),
    }
}

/// Drop serde_json's trailing ` at line N column M`.
fn strip_position(detail: &str) -> &str {
    let Some((head, tail)) = detail.rsplit_once(" at line ") else {
        return detail;
    };
    let is_position = tail
        .split_once(" column ")
        .is_some_and(|(line, column)| {
            !line.is_empty()
                && !column.is_empty()
                && line.bytes().all(|b| b.is_ascii_digit())
                && column.bytes().all(|b| b.is_ascii_digit())
        });
    if is_position {
        head
    } else {
        detail
    }
}
