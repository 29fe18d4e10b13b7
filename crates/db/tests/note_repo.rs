//! Integration tests for the note, category and user repositories.
//!
//! Exercises the repository layer against a real database:
//! - Timestamp behaviour on create / update / patch
//! - Filtered and ordered listing, cross-checked against the in-memory resolver
//! - Restrictive category delete and cascading user delete

use std::collections::HashMap;

use chrono::{Duration, TimeZone, Utc};
use notes_core::note_query::{NoteQuery, QueryableNote};
use notes_core::types::{DbId, Timestamp};
use notes_db::models::note::{NewNote, Note, NotePatch};
use notes_db::repositories::{CategoryRepo, NoteRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_note(title: &str, category_id: DbId, author_id: DbId, is_favorite: bool) -> NewNote {
    NewNote {
        title: title.to_string(),
        content: "some content".to_string(),
        category_id,
        author_id,
        is_favorite,
        is_public: false,
        public_link: None,
    }
}

async fn set_date_updated(pool: &PgPool, id: DbId, at: Timestamp) {
    sqlx::query("UPDATE notes SET date_updated = $2 WHERE id = $1")
        .bind(id)
        .bind(at)
        .execute(pool)
        .await
        .unwrap();
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn titles(notes: &[Note]) -> Vec<&str> {
    notes.iter().map(|n| n.title.as_str()).collect()
}

struct Seeded {
    learn: Note,
    guitar: Note,
    test_category: DbId,
    author: DbId,
}

/// "Learn DRF" (category Test, 12:00) and "Play guitar" (favorite, category
/// Todo, 13:00), both by one user.
async fn seed(pool: &PgPool) -> Seeded {
    let user = UserRepo::create(pool, "test_name").await.unwrap();
    let test = CategoryRepo::create(pool, "Test").await.unwrap();
    let todo = CategoryRepo::create(pool, "Todo").await.unwrap();

    let learn = NoteRepo::create(pool, &new_note("Learn DRF", test.id, user.id, false))
        .await
        .unwrap();
    let guitar = NoteRepo::create(pool, &new_note("Play guitar", todo.id, user.id, true))
        .await
        .unwrap();

    let noon = Utc.with_ymd_and_hms(2021, 7, 2, 12, 0, 0).unwrap();
    set_date_updated(pool, learn.id, noon).await;
    set_date_updated(pool, guitar.id, noon + Duration::hours(1)).await;

    Seeded {
        learn: NoteRepo::find_by_id(pool, learn.id).await.unwrap().unwrap(),
        guitar: NoteRepo::find_by_id(pool, guitar.id).await.unwrap().unwrap(),
        test_category: test.id,
        author: user.id,
    }
}

async fn list(pool: &PgPool, pairs: &[(&str, &str)]) -> Vec<Note> {
    let query = NoteQuery::from_params(&params(pairs)).unwrap();
    NoteRepo::list(pool, &query).await.unwrap()
}

/// A note paired with its category name, for the in-memory resolver.
struct NamedNote {
    note: Note,
    category_name: String,
}

impl QueryableNote for NamedNote {
    fn id(&self) -> DbId {
        self.note.id
    }
    fn title(&self) -> &str {
        &self.note.title
    }
    fn category_id(&self) -> DbId {
        self.note.category
    }
    fn category_name(&self) -> &str {
        &self.category_name
    }
    fn is_favorite(&self) -> bool {
        self.note.is_favorite
    }
    fn date_updated(&self) -> Timestamp {
        self.note.date_updated
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn create_sets_both_timestamps_and_defaults(pool: PgPool) {
    let user = UserRepo::create(&pool, "alice").await.unwrap();
    let category = CategoryRepo::create(&pool, "Inbox").await.unwrap();

    let note = NoteRepo::create(&pool, &new_note("Draft", category.id, user.id, false))
        .await
        .unwrap();

    assert_eq!(note.date_created, note.date_updated);
    assert!(!note.is_favorite);
    assert!(!note.is_public);
    assert_eq!(note.public_link, None);
    assert_eq!(note.category, category.id);
    assert_eq!(note.author, user.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn update_refreshes_date_updated_only(pool: PgPool) {
    let seeded = seed(&pool).await;
    let before = seeded.learn;

    let mut replacement = new_note("Learn axum", before.category, before.author, true);
    replacement.public_link = Some("abc123".to_string());
    let updated = NoteRepo::update(&pool, before.id, &replacement)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.title, "Learn axum");
    assert!(updated.is_favorite);
    assert_eq!(updated.public_link.as_deref(), Some("abc123"));
    assert_eq!(updated.date_created, before.date_created);
    assert!(updated.date_updated > before.date_updated);
}

#[sqlx::test(migrations = "./migrations")]
async fn patch_applies_present_fields_and_refreshes_date_updated(pool: PgPool) {
    let seeded = seed(&pool).await;
    let before = seeded.guitar;

    let patch = NotePatch {
        is_favorite: Some(false),
        public_link: Some(Some("link".to_string())),
        ..Default::default()
    };
    let patched = NoteRepo::patch(&pool, before.id, &patch)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(patched.title, before.title);
    assert!(!patched.is_favorite);
    assert_eq!(patched.public_link.as_deref(), Some("link"));
    assert_eq!(patched.date_created, before.date_created);
    assert!(patched.date_updated > before.date_updated);

    let clear = NotePatch {
        public_link: Some(None),
        ..Default::default()
    };
    let cleared = NoteRepo::patch(&pool, before.id, &clear)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cleared.public_link, None);
    assert!(cleared.date_updated > patched.date_updated);
}

#[sqlx::test(migrations = "./migrations")]
async fn update_missing_note_returns_none(pool: PgPool) {
    let seeded = seed(&pool).await;
    let input = new_note("x", seeded.test_category, seeded.author, false);
    assert!(NoteRepo::update(&pool, 999_999, &input).await.unwrap().is_none());
    assert!(NoteRepo::patch(&pool, 999_999, &NotePatch::default())
        .await
        .unwrap()
        .is_none());
    assert!(!NoteRepo::delete(&pool, 999_999).await.unwrap());
}

// ---------------------------------------------------------------------------
// Filtering and ordering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn filters_match_scenario(pool: PgPool) {
    seed(&pool).await;

    assert_eq!(titles(&list(&pool, &[("is_favorite", "true")]).await), ["Play guitar"]);
    assert_eq!(titles(&list(&pool, &[("is_favorite", "false")]).await), ["Learn DRF"]);
    assert_eq!(titles(&list(&pool, &[("category", "test")]).await), ["Learn DRF"]);
    assert!(list(&pool, &[("category", "Something")]).await.is_empty());
    assert_eq!(titles(&list(&pool, &[("title", "LEARN")]).await), ["Learn DRF"]);
    assert!(list(&pool, &[("title", "%")]).await.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn date_bounds_are_inclusive(pool: PgPool) {
    seed(&pool).await;

    let exact = "2021-07-02T13:00:00Z";
    assert_eq!(titles(&list(&pool, &[("date_after", exact)]).await), ["Play guitar"]);
    assert_eq!(
        titles(&list(&pool, &[("date_before", exact)]).await),
        ["Play guitar", "Learn DRF"]
    );
    assert!(list(&pool, &[("date_before", "2021-07-02")]).await.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn ordering_directions_are_reversed(pool: PgPool) {
    seed(&pool).await;

    assert_eq!(titles(&list(&pool, &[]).await), ["Play guitar", "Learn DRF"]);

    let asc = list(&pool, &[("ordering", "date_updated")]).await;
    let mut desc = list(&pool, &[("ordering", "-date_updated")]).await;
    desc.reverse();
    assert_eq!(titles(&asc), titles(&desc));
}

#[sqlx::test(migrations = "./migrations")]
async fn sql_listing_agrees_with_in_memory_resolver(pool: PgPool) {
    let seeded = seed(&pool).await;
    let extra_category = CategoryRepo::create(&pool, "TEST").await.unwrap();
    for (i, title) in ["learn rust", "Groceries", "Learn piano"].iter().enumerate() {
        let note = NoteRepo::create(
            &pool,
            &new_note(title, extra_category.id, seeded.author, i % 2 == 0),
        )
        .await
        .unwrap();
        // Same timestamp as "Learn DRF" so ties fall through to the id.
        set_date_updated(&pool, note.id, seeded.learn.date_updated).await;
    }

    let categories: HashMap<DbId, String> = CategoryRepo::list(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let everything = list(&pool, &[("ordering", "category")]).await;

    let cases: &[&[(&str, &str)]] = &[
        &[],
        &[("category", "test")],
        &[("title", "learn"), ("ordering", "-is_favorite,date_updated")],
        &[("is_favorite", "true"), ("ordering", "-category")],
        &[("date_before", "2021-07-02T12:00:00Z"), ("ordering", "is_favorite")],
    ];
    for pairs in cases {
        let query = NoteQuery::from_params(&params(pairs)).unwrap();
        let expected: Vec<DbId> = query
            .apply(everything.iter().cloned().map(|note| NamedNote {
                category_name: categories[&note.category].clone(),
                note,
            }))
            .iter()
            .map(|n| n.note.id)
            .collect();
        let actual: Vec<DbId> = NoteRepo::list(&pool, &query)
            .await
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(actual, expected, "params {pairs:?}");
    }
}

// ---------------------------------------------------------------------------
// Reference policies
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn referenced_category_cannot_be_deleted(pool: PgPool) {
    let seeded = seed(&pool).await;

    let err = CategoryRepo::delete(&pool, seeded.test_category)
        .await
        .unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.code().as_deref(), Some("23503"));
    assert!(CategoryRepo::exists(&pool, seeded.test_category).await.unwrap());

    NoteRepo::delete(&pool, seeded.learn.id).await.unwrap();
    assert!(CategoryRepo::delete(&pool, seeded.test_category).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_user_deletes_their_notes(pool: PgPool) {
    let seeded = seed(&pool).await;
    let other = UserRepo::create(&pool, "other").await.unwrap();
    let kept = NoteRepo::create(&pool, &new_note("Keep me", seeded.test_category, other.id, false))
        .await
        .unwrap();

    assert_eq!(NoteRepo::count_by_author(&pool, seeded.author).await.unwrap(), 2);
    assert!(UserRepo::delete(&pool, seeded.author).await.unwrap());

    assert_eq!(NoteRepo::count_by_author(&pool, seeded.author).await.unwrap(), 0);
    assert!(NoteRepo::find_by_id(&pool, seeded.learn.id).await.unwrap().is_none());
    assert!(NoteRepo::find_by_id(&pool, kept.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_username_violates_unique_constraint(pool: PgPool) {
    UserRepo::create(&pool, "alice").await.unwrap();
    let err = UserRepo::create(&pool, "alice").await.unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.code().as_deref(), Some("23505"));
    assert_eq!(db_err.constraint(), Some("uq_users_username"));
}
