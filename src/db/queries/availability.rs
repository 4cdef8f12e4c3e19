use rusqlite::{params, Connection, OptionalExtension};

use crate::db::now_timestamp;
use crate::models::VendorAvailability;

pub fn get_vendor_availability(
    conn: &Connection,
    vendor_id: &str,
) -> anyhow::Result<Option<VendorAvailability>> {
    let slots: Option<String> = conn
        .query_row(
            "SELECT slots FROM vendor_availability WHERE vendor_id = ?1",
            params![vendor_id],
            |row| row.get(0),
        )
        .optional()?;

    match slots {
        Some(json) => Ok(Some(VendorAvailability::from_json(&json)?)),
        None => Ok(None),
    }
}

pub fn save_vendor_availability(
    conn: &Connection,
    vendor_id: &str,
    availability: &VendorAvailability,
) -> anyhow::Result<()> {
    let json = serde_json::to_string(availability)?;
    conn.execute(
        "INSERT INTO vendor_availability (vendor_id, slots, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(vendor_id) DO UPDATE SET slots = excluded.slots, updated_at = excluded.updated_at",
        params![vendor_id, json, now_timestamp()],
    )?;
    Ok(())
}
