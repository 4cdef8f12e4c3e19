use rusqlite::{params, Connection, OptionalExtension, Row};

use super::Page;
use crate::db::{parse_timestamp, TIMESTAMP_FORMAT};
use crate::models::{Review, ReviewWithAuthor};

const REVIEW_SELECT: &str = "SELECT r.id, r.user_id, r.service_id, r.booking_id, r.rating, r.comment, \
     r.created_at, COALESCE(u.name, ''), COALESCE(s.name, '') \
     FROM reviews r \
     LEFT JOIN users u ON u.id = r.user_id \
     LEFT JOIN services s ON s.id = r.service_id";

fn review_from_row(row: &Row) -> rusqlite::Result<Review> {
    let created_at: String = row.get(6)?;
    Ok(Review {
        id: row.get(0)?,
        user_id: row.get(1)?,
        service_id: row.get(2)?,
        booking_id: row.get(3)?,
        rating: row.get(4)?,
        comment: row.get(5)?,
        created_at: parse_timestamp(&created_at),
    })
}

fn review_with_author_from_row(row: &Row) -> rusqlite::Result<ReviewWithAuthor> {
    Ok(ReviewWithAuthor {
        review: review_from_row(row)?,
        user_name: row.get(7)?,
        service_name: row.get(8)?,
    })
}

pub fn insert_review(conn: &Connection, review: &Review) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO reviews (id, user_id, service_id, booking_id, rating, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            review.id,
            review.user_id,
            review.service_id,
            review.booking_id,
            review.rating,
            review.comment,
            review.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_review(conn: &Connection, id: &str) -> rusqlite::Result<Option<Review>> {
    conn.query_row(
        &format!("{REVIEW_SELECT} WHERE r.id = ?1"),
        params![id],
        review_from_row,
    )
    .optional()
}

pub fn review_exists_for_booking(conn: &Connection, booking_id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM reviews WHERE booking_id = ?1",
        params![booking_id],
        |row| row.get(0),
    )
}

/// Reviews for one service, or all reviews when `service_id` is `None`.
pub fn list_reviews(
    conn: &Connection,
    service_id: Option<&str>,
    page: Page,
) -> rusqlite::Result<(Vec<ReviewWithAuthor>, i64)> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM reviews WHERE ?1 IS NULL OR service_id = ?1",
        params![service_id],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "{REVIEW_SELECT} WHERE ?1 IS NULL OR r.service_id = ?1
         ORDER BY r.created_at DESC, r.id LIMIT ?2 OFFSET ?3"
    ))?;
    let reviews = stmt
        .query_map(
            params![service_id, page.limit, page.offset()],
            review_with_author_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok((reviews, total))
}

pub fn delete_review(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM reviews WHERE id = ?1", params![id])?;
    Ok(count > 0)
}
