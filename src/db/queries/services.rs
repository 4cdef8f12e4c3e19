use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{enum_column, Filter, Page};
use crate::db::{parse_timestamp, TIMESTAMP_FORMAT};
use crate::models::{Service, ServiceListing, ServiceStatus};

const SERVICE_COLUMNS: &str = "s.id, s.name, s.description, s.category_id, s.vendor_id, s.price, \
     s.location, s.status, s.created_at, s.updated_at";

const LISTING_SELECT: &str = "SELECT s.id, s.name, s.description, s.category_id, s.vendor_id, \
     s.price, s.location, s.status, s.created_at, s.updated_at, \
     COALESCE(c.name, ''), COALESCE(u.name, ''), \
     (SELECT AVG(r.rating) FROM reviews r WHERE r.service_id = s.id), \
     (SELECT COUNT(*) FROM reviews r WHERE r.service_id = s.id) \
     FROM services s \
     LEFT JOIN categories c ON c.id = s.category_id \
     LEFT JOIN users u ON u.id = s.vendor_id";

fn service_from_row(row: &Row) -> rusqlite::Result<Service> {
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category_id: row.get(3)?,
        vendor_id: row.get(4)?,
        price: row.get(5)?,
        location: row.get(6)?,
        status: enum_column(row, 7, ServiceStatus::parse)?,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

fn listing_from_row(row: &Row) -> rusqlite::Result<ServiceListing> {
    Ok(ServiceListing {
        service: service_from_row(row)?,
        category_name: row.get(10)?,
        vendor_name: row.get(11)?,
        average_rating: row.get(12)?,
        review_count: row.get(13)?,
    })
}

pub fn insert_service(conn: &Connection, service: &Service) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO services (id, name, description, category_id, vendor_id, price, location, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            service.id,
            service.name,
            service.description,
            service.category_id,
            service.vendor_id,
            service.price,
            service.location,
            service.status.as_str(),
            service.created_at.format(TIMESTAMP_FORMAT).to_string(),
            service.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &str) -> rusqlite::Result<Option<Service>> {
    conn.query_row(
        &format!("SELECT {SERVICE_COLUMNS} FROM services s WHERE s.id = ?1"),
        params![id],
        service_from_row,
    )
    .optional()
}

pub fn get_service_listing(conn: &Connection, id: &str) -> rusqlite::Result<Option<ServiceListing>> {
    conn.query_row(
        &format!("{LISTING_SELECT} WHERE s.id = ?1"),
        params![id],
        listing_from_row,
    )
    .optional()
}

#[derive(Debug, Default, Clone)]
pub struct ServiceQuery<'a> {
    pub search: Option<&'a str>,
    pub category_id: Option<&'a str>,
    pub vendor_id: Option<&'a str>,
    pub status: Option<ServiceStatus>,
}

pub fn list_services(
    conn: &Connection,
    query: &ServiceQuery,
    page: Page,
) -> rusqlite::Result<(Vec<ServiceListing>, i64)> {
    let mut filter = Filter::default();
    if let Some(status) = query.status {
        filter.eq("s.status", status.as_str().to_string());
    }
    if let Some(category_id) = query.category_id {
        filter.eq("s.category_id", category_id.to_string());
    }
    if let Some(vendor_id) = query.vendor_id {
        filter.eq("s.vendor_id", vendor_id.to_string());
    }
    if let Some(q) = query.search {
        filter.contains_any(&["s.name", "s.description", "s.location"], q);
    }
    let where_sql = filter.where_sql();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM services s {where_sql}"),
        filter.params().as_slice(),
        |row| row.get(0),
    )?;

    let sql = format!(
        "{LISTING_SELECT} {where_sql} ORDER BY s.created_at DESC, s.id {}",
        filter.page_sql()
    );
    let (limit, offset) = (page.limit, page.offset());
    let mut params = filter.params();
    params.push(&limit);
    params.push(&offset);

    let mut stmt = conn.prepare(&sql)?;
    let services = stmt
        .query_map(params.as_slice(), listing_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok((services, total))
}

pub fn update_service(conn: &Connection, service: &Service) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET name = ?1, description = ?2, category_id = ?3, price = ?4,
             location = ?5, status = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            service.name,
            service.description,
            service.category_id,
            service.price,
            service.location,
            service.status.as_str(),
            service.updated_at.format(TIMESTAMP_FORMAT).to_string(),
            service.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_service(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
    Ok(count > 0)
}
