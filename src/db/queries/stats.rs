use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::db::TIMESTAMP_FORMAT;
use crate::models::Role;

pub fn count_users_with_role(conn: &Connection, role: Role) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = ?1",
        params![role.as_str()],
        |row| row.get(0),
    )
}

pub fn count_services(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM services", [], |row| row.get(0))
}

pub fn booking_counts_by_status(conn: &Connection) -> rusqlite::Result<BTreeMap<String, i64>> {
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM bookings GROUP BY status")?;
    let counts = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
    Ok(counts)
}

pub fn completed_revenue(conn: &Connection) -> rusqlite::Result<f64> {
    conn.query_row(
        "SELECT COALESCE(SUM(amount), 0.0) FROM bookings WHERE status = 'completed'",
        [],
        |row| row.get(0),
    )
}

/// Rows of `table` created in `[start, end)`. `table` must be a trusted identifier.
pub fn count_created_between(
    conn: &Connection,
    table: &str,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE created_at >= ?1 AND created_at < ?2"),
        params![
            start.format(TIMESTAMP_FORMAT).to_string(),
            end.format(TIMESTAMP_FORMAT).to_string(),
        ],
        |row| row.get(0),
    )
}
