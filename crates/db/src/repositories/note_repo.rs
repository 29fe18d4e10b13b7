//! Repository for the `notes` table.

use notes_core::note_query::{escape_like, Direction, NoteQuery, OrderField, OrderTerm};
use notes_core::types::DbId;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::note::{NewNote, Note, NotePatch};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, content, category_id, author_id, \
     date_created, date_updated, is_favorite, is_public, public_link";

/// Same columns qualified for the list query, which joins `categories`.
const COLUMNS_QUALIFIED: &str = "n.id, n.title, n.content, n.category_id, n.author_id, \
     n.date_created, n.date_updated, n.is_favorite, n.is_public, n.public_link";

/// Provides CRUD and filtered listing for notes.
pub struct NoteRepo;

impl NoteRepo {
    /// Insert a new note, returning the created row. Both timestamps are set
    /// to the insert time.
    pub async fn create(pool: &PgPool, input: &NewNote) -> Result<Note, sqlx::Error> {
        let query = format!(
            "INSERT INTO notes \
                (title, content, category_id, author_id, is_favorite, is_public, public_link) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(&input.title)
            .bind(&input.content)
            .bind(input.category_id)
            .bind(input.author_id)
            .bind(input.is_favorite)
            .bind(input.is_public)
            .bind(&input.public_link)
            .fetch_one(pool)
            .await
    }

    /// Find a note by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Note>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notes WHERE id = $1");
        sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List notes matching `query.filter`, sorted by `query.ordering` with
    /// ascending id as the final tie-breaker.
    pub async fn list(pool: &PgPool, query: &NoteQuery) -> Result<Vec<Note>, sqlx::Error> {
        let mut builder = list_query(query);
        builder.build_query_as::<Note>().fetch_all(pool).await
    }

    /// Replace every writable field. `date_created` is left untouched and
    /// `date_updated` is refreshed.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &NewNote,
    ) -> Result<Option<Note>, sqlx::Error> {
        let query = format!(
            "UPDATE notes SET \
                title = $2, \
                content = $3, \
                category_id = $4, \
                author_id = $5, \
                is_favorite = $6, \
                is_public = $7, \
                public_link = $8, \
                date_updated = clock_timestamp() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(input.category_id)
            .bind(input.author_id)
            .bind(input.is_favorite)
            .bind(input.is_public)
            .bind(&input.public_link)
            .fetch_optional(pool)
            .await
    }

    /// Apply only the fields present in `patch`; `date_updated` is refreshed
    /// even when the patch is empty.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn patch(
        pool: &PgPool,
        id: DbId,
        patch: &NotePatch,
    ) -> Result<Option<Note>, sqlx::Error> {
        let query = format!(
            "UPDATE notes SET \
                title = COALESCE($2, title), \
                content = COALESCE($3, content), \
                category_id = COALESCE($4, category_id), \
                author_id = COALESCE($5, author_id), \
                is_favorite = COALESCE($6, is_favorite), \
                is_public = COALESCE($7, is_public), \
                public_link = CASE WHEN $8 THEN $9 ELSE public_link END, \
                date_updated = clock_timestamp() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .bind(&patch.title)
            .bind(&patch.content)
            .bind(patch.category)
            .bind(patch.author)
            .bind(patch.is_favorite)
            .bind(patch.is_public)
            .bind(patch.public_link.is_some())
            .bind(patch.public_link.clone().flatten())
            .fetch_optional(pool)
            .await
    }

    /// Delete a note by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count notes owned by a user.
    pub async fn count_by_author(pool: &PgPool, author_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(pool)
            .await
    }
}

/// Build the `SELECT` for [`NoteRepo::list`].
fn list_query(query: &NoteQuery) -> QueryBuilder<'static, Postgres> {
    let filter = &query.filter;
    let mut builder = QueryBuilder::new(format!(
        "SELECT {COLUMNS_QUALIFIED} FROM notes n \
         JOIN categories c ON c.id = n.category_id \
         WHERE TRUE"
    ));

    if let Some(after) = filter.date_after {
        builder.push(" AND n.date_updated >= ").push_bind(after);
    }
    if let Some(before) = filter.date_before {
        builder.push(" AND n.date_updated <= ").push_bind(before);
    }
    if let Some(title) = &filter.title {
        builder
            .push(" AND n.title ILIKE ")
            .push_bind(format!("%{}%", escape_like(title)));
    }
    if let Some(category) = &filter.category {
        builder
            .push(" AND LOWER(c.name) = LOWER(")
            .push_bind(category.clone())
            .push(")");
    }
    if let Some(is_favorite) = filter.is_favorite {
        builder.push(" AND n.is_favorite = ").push_bind(is_favorite);
    }

    builder.push(" ORDER BY ");
    for term in &query.ordering {
        builder.push(order_expr(*term)).push(", ");
    }
    builder.push("n.id ASC");

    builder
}

fn order_expr(term: OrderTerm) -> &'static str {
    match (term.field, term.direction) {
        (OrderField::DateUpdated, Direction::Asc) => "n.date_updated ASC",
        (OrderField::DateUpdated, Direction::Desc) => "n.date_updated DESC",
        (OrderField::Category, Direction::Asc) => "n.category_id ASC",
        (OrderField::Category, Direction::Desc) => "n.category_id DESC",
        (OrderField::IsFavorite, Direction::Asc) => "n.is_favorite ASC",
        (OrderField::IsFavorite, Direction::Desc) => "n.is_favorite DESC",
    }
}
