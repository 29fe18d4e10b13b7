//! Note list query resolution.
//!
//! Turns raw query-string parameters into a validated [`NoteQuery`]: a
//! [`NoteFilter`] (all constraints AND-ed together) and an ordering. The
//! repository layer renders it to SQL; [`NoteQuery::apply`] evaluates the
//! same semantics in memory.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};
use crate::validation::FieldErrors;

// ---------------------------------------------------------------------------
// Parameter names
// ---------------------------------------------------------------------------

pub const PARAM_DATE_AFTER: &str = "date_after";
pub const PARAM_DATE_BEFORE: &str = "date_before";
pub const PARAM_TITLE: &str = "title";
pub const PARAM_CATEGORY: &str = "category";
pub const PARAM_IS_FAVORITE: &str = "is_favorite";
pub const PARAM_ORDERING: &str = "ordering";

pub const MSG_INVALID_DATETIME: &str = "Enter a valid date/time.";
pub const MSG_INVALID_BOOLEAN: &str = "Enter a valid boolean: 'true' or 'false'.";

/// Naive forms accepted besides RFC 3339. Interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// chrono's `%Y` accepts short years ("02-07-21" would parse as year 2), so
/// a four-digit year is enforced up front.
static FOUR_DIGIT_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}").expect("valid regex"));

/// Fractional seconds; PostgreSQL stores at most microseconds.
static FRACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\d{2}\.(\d+)").expect("valid regex"));

const MAX_FRACTION_DIGITS: usize = 6;

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Fields a client may sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    DateUpdated,
    /// Sorts by the category reference id, not the category name.
    Category,
    IsFavorite,
}

impl OrderField {
    pub const ALL: [OrderField; 3] = [
        OrderField::DateUpdated,
        OrderField::Category,
        OrderField::IsFavorite,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderField::DateUpdated => "date_updated",
            OrderField::Category => "category",
            OrderField::IsFavorite => "is_favorite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: OrderField,
    pub direction: Direction,
}

impl OrderTerm {
    pub const fn asc(field: OrderField) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub const fn desc(field: OrderField) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }

    /// Parse one `ordering` term such as `date_updated` or `-is_favorite`.
    pub fn parse(term: &str) -> Option<Self> {
        let term = term.trim();
        match term.strip_prefix('-') {
            Some(name) => OrderField::parse(name).map(Self::desc),
            None => OrderField::parse(term).map(Self::asc),
        }
    }
}

/// Newest edits first when the client does not ask for an order.
pub const DEFAULT_ORDERING: OrderTerm = OrderTerm::desc(OrderField::DateUpdated);

/// Parse a comma-separated `ordering` value. Unknown fields are dropped; if
/// nothing valid remains the default ordering is used.
pub fn parse_ordering(value: Option<&str>) -> Vec<OrderTerm> {
    let terms: Vec<OrderTerm> = value
        .unwrap_or_default()
        .split(',')
        .filter_map(OrderTerm::parse)
        .collect();

    if terms.is_empty() {
        vec![DEFAULT_ORDERING]
    } else {
        terms
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Constraints on the note list. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteFilter {
    /// Inclusive lower bound on `date_updated`.
    pub date_after: Option<Timestamp>,
    /// Inclusive upper bound on `date_updated`.
    pub date_before: Option<Timestamp>,
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Case-insensitive exact category name.
    pub category: Option<String>,
    pub is_favorite: Option<bool>,
}

impl NoteFilter {
    pub fn is_empty(&self) -> bool {
        *self == NoteFilter::default()
    }

    pub fn matches<N: QueryableNote + ?Sized>(&self, note: &N) -> bool {
        if let Some(after) = self.date_after {
            if note.date_updated() < after {
                return false;
            }
        }
        if let Some(before) = self.date_before {
            if note.date_updated() > before {
                return false;
            }
        }
        if let Some(title) = &self.title {
            if !note.title().to_lowercase().contains(&title.to_lowercase()) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if note.category_name().to_lowercase() != category.to_lowercase() {
                return false;
            }
        }
        if let Some(is_favorite) = self.is_favorite {
            if note.is_favorite() != is_favorite {
                return false;
            }
        }
        true
    }
}

/// The fields of a note the resolver reads.
pub trait QueryableNote {
    fn id(&self) -> DbId;
    fn title(&self) -> &str;
    fn category_id(&self) -> DbId;
    fn category_name(&self) -> &str;
    fn is_favorite(&self) -> bool;
    fn date_updated(&self) -> Timestamp;
}

// ---------------------------------------------------------------------------
// NoteQuery
// ---------------------------------------------------------------------------

/// A validated list query: filter plus a non-empty ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteQuery {
    pub filter: NoteFilter,
    pub ordering: Vec<OrderTerm>,
}

impl Default for NoteQuery {
    fn default() -> Self {
        Self {
            filter: NoteFilter::default(),
            ordering: vec![DEFAULT_ORDERING],
        }
    }
}

impl NoteQuery {
    /// Resolve query-string parameters.
    ///
    /// Unrecognized names are ignored and empty values count as absent.
    /// Every malformed value is reported in one [`CoreError::InvalidFields`].
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, CoreError> {
        let value = |name: &str| {
            params
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let mut errors = FieldErrors::new();

        let date_after = value(PARAM_DATE_AFTER).and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                errors.add(PARAM_DATE_AFTER, MSG_INVALID_DATETIME);
            }
            parsed
        });
        let date_before = value(PARAM_DATE_BEFORE).and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                errors.add(PARAM_DATE_BEFORE, MSG_INVALID_DATETIME);
            }
            parsed
        });
        let is_favorite = value(PARAM_IS_FAVORITE).and_then(|raw| {
            let parsed = parse_bool(raw);
            if parsed.is_none() {
                errors.add(PARAM_IS_FAVORITE, MSG_INVALID_BOOLEAN);
            }
            parsed
        });

        let filter = NoteFilter {
            date_after,
            date_before,
            title: value(PARAM_TITLE).map(str::to_string),
            category: value(PARAM_CATEGORY).map(str::to_string),
            is_favorite,
        };

        let query = NoteQuery {
            filter,
            ordering: parse_ordering(value(PARAM_ORDERING)),
        };
        errors.into_result(query).map_err(CoreError::from)
    }

    /// Compare two notes under this ordering, ties broken by ascending id.
    pub fn compare<N: QueryableNote + ?Sized>(&self, a: &N, b: &N) -> Ordering {
        self.ordering
            .iter()
            .map(|term| {
                let ord = match term.field {
                    OrderField::DateUpdated => a.date_updated().cmp(&b.date_updated()),
                    OrderField::Category => a.category_id().cmp(&b.category_id()),
                    OrderField::IsFavorite => a.is_favorite().cmp(&b.is_favorite()),
                };
                match term.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            })
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| a.id().cmp(&b.id()))
    }

    /// Filter and sort notes in memory.
    pub fn apply<N: QueryableNote>(&self, notes: impl IntoIterator<Item = N>) -> Vec<N> {
        let mut selected: Vec<N> = notes
            .into_iter()
            .filter(|n| self.filter.matches(n))
            .collect();
        selected.sort_by(|a, b| self.compare(a, b));
        selected
    }
}

// ---------------------------------------------------------------------------
// Value parsing
// ---------------------------------------------------------------------------

/// Parse an ISO-like timestamp.
///
/// Accepts RFC 3339, naive `YYYY-MM-DD[T| ]HH:MM[:SS[.fff]]` (as UTC) and a
/// bare `YYYY-MM-DD` (midnight UTC). More than six fractional digits is
/// rejected: the database could not compare at that precision.
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let value = value.trim();
    if !FOUR_DIGIT_YEAR_RE.is_match(value) {
        return None;
    }
    if let Some(fraction) = FRACTION_RE.captures(value).and_then(|c| c.get(1)) {
        if fraction.as_str().len() > MAX_FRACTION_DIGITS {
            return None;
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Case-insensitive `true` / `false`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Escape `LIKE` / `ILIKE` wildcards so user input matches literally.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
