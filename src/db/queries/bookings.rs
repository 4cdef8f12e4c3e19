use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{enum_column, Filter, Page};
use crate::db::{now_timestamp, parse_timestamp, TIMESTAMP_FORMAT};
use crate::models::{Booking, BookingDetails, BookingStatus};

const BOOKING_COLUMNS: &str = "b.id, b.user_id, b.vendor_id, b.service_id, b.booking_date, b.amount, \
     b.status, b.address, b.postal_code, b.city, b.notes, b.created_at, b.updated_at";

fn booking_from_row(row: &Row) -> rusqlite::Result<Booking> {
    let booking_date: String = row.get(4)?;
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;
    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        vendor_id: row.get(2)?,
        service_id: row.get(3)?,
        booking_date: parse_timestamp(&booking_date),
        amount: row.get(5)?,
        status: enum_column(row, 6, BookingStatus::parse)?,
        address: row.get(7)?,
        postal_code: row.get(8)?,
        city: row.get(9)?,
        notes: row.get(10)?,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

fn details_from_row(row: &Row) -> rusqlite::Result<BookingDetails> {
    Ok(BookingDetails {
        booking: booking_from_row(row)?,
        service_name: row.get(13)?,
        user_name: row.get(14)?,
        vendor_name: row.get(15)?,
    })
}

fn details_select() -> String {
    format!(
        "SELECT {BOOKING_COLUMNS}, COALESCE(s.name, ''), COALESCE(u.name, ''), COALESCE(v.name, '')
         FROM bookings b
         LEFT JOIN services s ON s.id = b.service_id
         LEFT JOIN users u ON u.id = b.user_id
         LEFT JOIN users v ON v.id = b.vendor_id"
    )
}

pub fn insert_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, user_id, vendor_id, service_id, booking_date, amount, status,
             address, postal_code, city, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            booking.id,
            booking.user_id,
            booking.vendor_id,
            booking.service_id,
            booking.booking_date.format(TIMESTAMP_FORMAT).to_string(),
            booking.amount,
            booking.status.as_str(),
            booking.address,
            booking.postal_code,
            booking.city,
            booking.notes,
            booking.created_at.format(TIMESTAMP_FORMAT).to_string(),
            booking.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?1"),
        params![id],
        booking_from_row,
    );

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn get_booking_details(conn: &Connection, id: &str) -> rusqlite::Result<Option<BookingDetails>> {
    conn.query_row(
        &format!("{} WHERE b.id = ?1", details_select()),
        params![id],
        details_from_row,
    )
    .optional()
}

/// The booking currently holding `service_id`, ignoring `exclude_id`.
pub fn find_accepted_booking(
    conn: &Connection,
    service_id: &str,
    exclude_id: Option<&str>,
) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b
             WHERE b.service_id = ?1 AND b.status = 'accepted' AND (?2 IS NULL OR b.id != ?2)
             LIMIT 1"
        ),
        params![service_id, exclude_id],
        booking_from_row,
    )
    .optional()
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now_timestamp(), id],
    )?;
    Ok(count > 0)
}

/// Rejects every pending booking on `service_id` other than `keep_id` and
/// returns the bookings it rejected.
pub fn reject_competing_pending(
    conn: &Connection,
    service_id: &str,
    keep_id: &str,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings b
         WHERE b.service_id = ?1 AND b.status = 'pending' AND b.id != ?2"
    ))?;
    let mut rejected = stmt
        .query_map(params![service_id, keep_id], booking_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if rejected.is_empty() {
        return Ok(rejected);
    }

    let now = now_timestamp();
    conn.execute(
        "UPDATE bookings SET status = 'rejected', updated_at = ?1
         WHERE service_id = ?2 AND status = 'pending' AND id != ?3",
        params![now, service_id, keep_id],
    )?;

    let updated_at = parse_timestamp(&now);
    for booking in &mut rejected {
        booking.status = BookingStatus::Rejected;
        booking.updated_at = updated_at;
    }
    Ok(rejected)
}

#[derive(Debug, Default, Clone)]
pub struct BookingQuery<'a> {
    pub user_id: Option<&'a str>,
    pub vendor_id: Option<&'a str>,
    pub service_id: Option<&'a str>,
    pub status: Option<BookingStatus>,
}

pub fn list_bookings(
    conn: &Connection,
    query: &BookingQuery,
    page: Page,
) -> rusqlite::Result<(Vec<BookingDetails>, i64)> {
    let mut filter = Filter::default();
    if let Some(user_id) = query.user_id {
        filter.eq("b.user_id", user_id.to_string());
    }
    if let Some(vendor_id) = query.vendor_id {
        filter.eq("b.vendor_id", vendor_id.to_string());
    }
    if let Some(service_id) = query.service_id {
        filter.eq("b.service_id", service_id.to_string());
    }
    if let Some(status) = query.status {
        filter.eq("b.status", status.as_str().to_string());
    }
    let where_sql = filter.where_sql();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM bookings b {where_sql}"),
        filter.params().as_slice(),
        |row| row.get(0),
    )?;

    let sql = format!(
        "{} {where_sql} ORDER BY b.created_at DESC, b.id {}",
        details_select(),
        filter.page_sql()
    );
    let (limit, offset) = (page.limit, page.offset());
    let mut params = filter.params();
    params.push(&limit);
    params.push(&offset);

    let mut stmt = conn.prepare(&sql)?;
    let bookings = stmt
        .query_map(params.as_slice(), details_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok((bookings, total))
}

pub fn count_bookings_for_service(conn: &Connection, service_id: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE service_id = ?1",
        params![service_id],
        |row| row.get(0),
    )
}

pub fn count_accepted_for_service(conn: &Connection, service_id: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE service_id = ?1 AND status = 'accepted'",
        params![service_id],
        |row| row.get(0),
    )
}
