//! Parameterized SQL per entity. Every function takes a borrowed connection
//! (or transaction, which derefs to one) and never opens its own transaction.

mod availability;
mod bookings;
mod categories;
mod chats;
mod disputes;
mod reviews;
mod services;
mod stats;
mod users;

pub use availability::*;
pub use bookings::*;
pub use categories::*;
pub use chats::*;
pub use disputes::*;
pub use reviews::*;
pub use services::*;
pub use stats::*;
pub use users::*;

use rusqlite::types::{ToSql, Type};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE: i64 = 1_000_000;

/// One-based page request, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Accumulates `WHERE` clauses with positional parameters.
#[derive(Default)]
pub(crate) struct Filter {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl Filter {
    pub(crate) fn eq<T: ToSql + 'static>(&mut self, column: &str, value: T) {
        self.params.push(Box::new(value));
        self.clauses
            .push(format!("{column} = ?{}", self.params.len()));
    }

    /// Case-insensitive substring match against any of `columns`. LIKE
    /// wildcards in `needle` match literally.
    pub(crate) fn contains_any(&mut self, columns: &[&str], needle: &str) {
        let needle = needle.trim();
        if needle.is_empty() {
            return;
        }
        self.params.push(Box::new(format!("%{}%", escape_like(needle))));
        let idx = self.params.len();
        let ors = columns
            .iter()
            .map(|c| format!("{c} LIKE ?{idx} ESCAPE '\\'"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.clauses.push(format!("({ors})"));
    }

    pub(crate) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// `LIMIT/OFFSET` suffix numbered after the filter's own parameters.
    pub(crate) fn page_sql(&self) -> String {
        let n = self.params.len();
        format!("LIMIT ?{} OFFSET ?{}", n + 1, n + 2)
    }

    pub(crate) fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub(crate) fn enum_column<T>(
    row: &rusqlite::Row,
    idx: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value: {raw}").into(),
        )
    })
}

/// True when `err` is a UNIQUE constraint failure.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
