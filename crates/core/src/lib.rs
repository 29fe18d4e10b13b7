//! Domain logic for the notes service.
//!
//! Everything here is pure: no database, no HTTP. The `db` and `api` crates
//! build on these types.

pub mod error;
pub mod note_query;
pub mod types;
pub mod validation;
