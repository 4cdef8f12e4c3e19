use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{enum_column, Filter, Page};
use crate::db::{now_timestamp, parse_timestamp, TIMESTAMP_FORMAT};
use crate::models::{Dispute, DisputeStatus};

const DISPUTE_COLUMNS: &str =
    "id, booking_id, user_id, reason, status, resolution, created_at, resolved_at";

fn dispute_from_row(row: &Row) -> rusqlite::Result<Dispute> {
    let created_at: String = row.get(6)?;
    let resolved_at: Option<String> = row.get(7)?;
    Ok(Dispute {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        user_id: row.get(2)?,
        reason: row.get(3)?,
        status: enum_column(row, 4, DisputeStatus::parse)?,
        resolution: row.get(5)?,
        created_at: parse_timestamp(&created_at),
        resolved_at: resolved_at.as_deref().map(parse_timestamp),
    })
}

pub fn insert_dispute(conn: &Connection, dispute: &Dispute) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO dispute (id, booking_id, user_id, reason, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            dispute.id,
            dispute.booking_id,
            dispute.user_id,
            dispute.reason,
            dispute.status.as_str(),
            dispute.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_dispute(conn: &Connection, id: &str) -> rusqlite::Result<Option<Dispute>> {
    conn.query_row(
        &format!("SELECT {DISPUTE_COLUMNS} FROM dispute WHERE id = ?1"),
        params![id],
        dispute_from_row,
    )
    .optional()
}

pub fn has_open_dispute(conn: &Connection, booking_id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM dispute WHERE booking_id = ?1 AND status = 'open'",
        params![booking_id],
        |row| row.get(0),
    )
}

pub fn list_disputes(
    conn: &Connection,
    user_id: Option<&str>,
    status: Option<DisputeStatus>,
    page: Page,
) -> rusqlite::Result<(Vec<Dispute>, i64)> {
    let mut filter = Filter::default();
    if let Some(user_id) = user_id {
        filter.eq("user_id", user_id.to_string());
    }
    if let Some(status) = status {
        filter.eq("status", status.as_str().to_string());
    }
    let where_sql = filter.where_sql();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM dispute {where_sql}"),
        filter.params().as_slice(),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {DISPUTE_COLUMNS} FROM dispute {where_sql} ORDER BY created_at DESC, id {}",
        filter.page_sql()
    );
    let (limit, offset) = (page.limit, page.offset());
    let mut params = filter.params();
    params.push(&limit);
    params.push(&offset);

    let mut stmt = conn.prepare(&sql)?;
    let disputes = stmt
        .query_map(params.as_slice(), dispute_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok((disputes, total))
}

pub fn resolve_dispute(conn: &Connection, id: &str, resolution: &str) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE dispute SET status = 'resolved', resolution = ?1, resolved_at = ?2
         WHERE id = ?3 AND status = 'open'",
        params![resolution, now_timestamp(), id],
    )?;
    Ok(count > 0)
}
