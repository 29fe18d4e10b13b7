//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` request DTOs whose `validate` turns them into checked inputs

pub mod category;
pub mod note;
pub mod user;
