use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use super::{enum_column, Filter, Page};
use crate::db::{now_timestamp, parse_timestamp, TIMESTAMP_FORMAT};
use crate::models::{Role, TempUser, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, phone, created_at, updated_at";

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: enum_column(row, 4, Role::parse)?,
        phone: row.get(5)?,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

// ── Users ──

pub fn insert_user(conn: &Connection, user: &User) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, role, phone, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id,
            user.name,
            user.email,
            user.password_hash,
            user.role.as_str(),
            user.phone,
            user.created_at.format(TIMESTAMP_FORMAT).to_string(),
            user.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        user_from_row,
    )
    .optional()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 COLLATE NOCASE"),
        params![email],
        user_from_row,
    )
    .optional()
}

pub fn update_password(conn: &Connection, id: &str, password_hash: &str) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
        params![password_hash, now_timestamp(), id],
    )?;
    Ok(count > 0)
}

pub fn update_user_role(conn: &Connection, id: &str, role: Role) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3",
        params![role.as_str(), now_timestamp(), id],
    )?;
    Ok(count > 0)
}

pub fn list_users(
    conn: &Connection,
    search: Option<&str>,
    role: Option<Role>,
    page: Page,
) -> rusqlite::Result<(Vec<User>, i64)> {
    let mut filter = Filter::default();
    if let Some(role) = role {
        filter.eq("role", role.as_str().to_string());
    }
    if let Some(q) = search {
        filter.contains_any(&["name", "email"], q);
    }
    let where_sql = filter.where_sql();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM users {where_sql}"),
        filter.params().as_slice(),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users {where_sql} ORDER BY created_at DESC, id {}",
        filter.page_sql()
    );
    let (limit, offset) = (page.limit, page.offset());
    let mut params = filter.params();
    params.push(&limit);
    params.push(&offset);

    let mut stmt = conn.prepare(&sql)?;
    let users = stmt
        .query_map(params.as_slice(), user_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok((users, total))
}

// ── Vendors ──

#[derive(Debug, Clone, Serialize)]
pub struct VendorSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service_count: i64,
}

pub fn list_vendors(
    conn: &Connection,
    search: Option<&str>,
    page: Page,
) -> rusqlite::Result<(Vec<VendorSummary>, i64)> {
    let mut filter = Filter::default();
    filter.eq("u.role", Role::Vendor.as_str().to_string());
    if let Some(q) = search {
        filter.contains_any(&["u.name", "u.email"], q);
    }
    let where_sql = filter.where_sql();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM users u {where_sql}"),
        filter.params().as_slice(),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT u.id, u.name, u.email, u.phone,
                (SELECT COUNT(*) FROM services s WHERE s.vendor_id = u.id AND s.status = 'active')
         FROM users u {where_sql}
         ORDER BY u.name ASC {}",
        filter.page_sql()
    );
    let (limit, offset) = (page.limit, page.offset());
    let mut params = filter.params();
    params.push(&limit);
    params.push(&offset);

    let mut stmt = conn.prepare(&sql)?;
    let vendors = stmt
        .query_map(params.as_slice(), |row| {
            Ok(VendorSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                phone: row.get(3)?,
                service_count: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok((vendors, total))
}

// ── Pending signups ──

pub fn upsert_temp_user(conn: &Connection, temp: &TempUser) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO temp_users (id, name, email, password_hash, role, phone, code, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(email) DO UPDATE SET
           name = excluded.name,
           password_hash = excluded.password_hash,
           role = excluded.role,
           phone = excluded.phone,
           code = excluded.code,
           expires_at = excluded.expires_at",
        params![
            temp.id,
            temp.name,
            temp.email,
            temp.password_hash,
            temp.role.as_str(),
            temp.phone,
            temp.code,
            temp.expires_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_temp_user_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<TempUser>> {
    conn.query_row(
        "SELECT id, name, email, password_hash, role, phone, code, expires_at
         FROM temp_users WHERE email = ?1 COLLATE NOCASE",
        params![email],
        |row| {
            let expires_at: String = row.get(7)?;
            Ok(TempUser {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                password_hash: row.get(3)?,
                role: enum_column(row, 4, Role::parse)?,
                phone: row.get(5)?,
                code: row.get(6)?,
                expires_at: parse_timestamp(&expires_at),
            })
        },
    )
    .optional()
}

pub fn delete_temp_user(conn: &Connection, email: &str) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM temp_users WHERE email = ?1 COLLATE NOCASE",
        params![email],
    )?;
    Ok(())
}
