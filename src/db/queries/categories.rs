use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{parse_timestamp, TIMESTAMP_FORMAT};
use crate::models::Category;

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    let created_at: String = row.get(3)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_timestamp(&created_at),
    })
}

pub fn insert_category(conn: &Connection, category: &Category) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO categories (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            category.id,
            category.name,
            category.description,
            category.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn list_categories(conn: &Connection) -> rusqlite::Result<Vec<Category>> {
    let mut stmt =
        conn.prepare("SELECT id, name, description, created_at FROM categories ORDER BY name ASC")?;
    let categories = stmt
        .query_map([], category_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(categories)
}

pub fn get_category(conn: &Connection, id: &str) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        "SELECT id, name, description, created_at FROM categories WHERE id = ?1",
        params![id],
        category_from_row,
    )
    .optional()
}

pub fn update_category(conn: &Connection, category: &Category) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE categories SET name = ?1, description = ?2 WHERE id = ?3",
        params![category.name, category.description, category.id],
    )?;
    Ok(count > 0)
}

pub fn delete_category(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn count_services_in_category(conn: &Connection, id: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM services WHERE category_id = ?1",
        params![id],
        |row| row.get(0),
    )
}
