//! Booking lifecycle: creation, vendor status updates, user cancellation and
//! the per-service availability check.
//!
//! A service may hold at most one `accepted` booking. Every mutation below
//! runs its check-then-write inside an immediate transaction, which takes the
//! database write lock before the check, and the schema backs the rule with a
//! partial unique index. Notification is the caller's job, after commit.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, ServiceStatus};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("booking not found")]
    NotFound,

    #[error("service not found")]
    ServiceNotFound,

    #[error("user account not found")]
    UnknownUser,

    #[error("you do not have permission to modify this booking")]
    Forbidden,

    #[error("cannot change booking status from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("service is unavailable: it already has an accepted booking")]
    ServiceUnavailable,

    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for BookingError {
    fn from(e: rusqlite::Error) -> Self {
        // The only unique index a booking write can trip is the one-accepted index.
        if queries::is_unique_violation(&e) {
            BookingError::ServiceUnavailable
        } else {
            BookingError::Database(e)
        }
    }
}

impl From<BookingError> for AppError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::Validation(msg) => AppError::Validation(msg),
            BookingError::InvalidTransition { .. } => AppError::Validation(e.to_string()),
            BookingError::NotFound | BookingError::ServiceNotFound => {
                AppError::NotFound(e.to_string())
            }
            BookingError::UnknownUser => AppError::Unauthorized(e.to_string()),
            BookingError::Forbidden => AppError::Forbidden(e.to_string()),
            BookingError::ServiceUnavailable => AppError::Conflict(e.to_string()),
            BookingError::Database(e) => AppError::Database(e),
            BookingError::Other(e) => AppError::Internal(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub service_id: String,
    pub vendor_id: String,
    pub booking_date: NaiveDateTime,
    pub amount: f64,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub booking: Booking,
    /// False when the booking already had the requested status.
    pub changed: bool,
    /// Pending bookings on the same service rejected by an accept.
    pub superseded: Vec<Booking>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceAvailability {
    pub service_id: String,
    pub available: bool,
    pub blocking_booking: Option<Booking>,
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` and the ISO `T` forms.
pub fn parse_booking_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    let raw = raw.strip_suffix('Z').unwrap_or(raw);
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn require_present(value: &str, field: &str) -> Result<(), BookingError> {
    if value.trim().is_empty() {
        return Err(BookingError::Validation(format!("{field} is required")));
    }
    Ok(())
}

pub fn create_booking(
    conn: &mut Connection,
    user_id: &str,
    input: NewBooking,
) -> Result<Booking, BookingError> {
    require_present(&input.address, "address")?;
    require_present(&input.postal_code, "postal code")?;
    require_present(&input.city, "city")?;
    if !input.amount.is_finite() || input.amount < 0.0 {
        return Err(BookingError::Validation(
            "amount must be a non-negative number".to_string(),
        ));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if queries::get_user_by_id(&tx, user_id)?.is_none() {
        return Err(BookingError::UnknownUser);
    }

    let service = queries::get_service(&tx, &input.service_id)?
        .ok_or(BookingError::ServiceNotFound)?;
    if service.vendor_id != input.vendor_id {
        return Err(BookingError::Validation(
            "vendor does not offer this service".to_string(),
        ));
    }
    if service.status != ServiceStatus::Active {
        return Err(BookingError::Validation(
            "service is not accepting bookings".to_string(),
        ));
    }

    if let Some(hours) = queries::get_vendor_availability(&tx, &service.vendor_id)? {
        if !hours.slots.is_empty() && !hours.is_available(&input.booking_date) {
            return Err(BookingError::Validation(format!(
                "vendor is not available at that time. Working hours: {}",
                hours.to_human_readable()
            )));
        }
    }

    if let Some(blocking) = queries::find_accepted_booking(&tx, &service.id, None)? {
        tracing::info!(
            service_id = %service.id,
            blocking_booking_id = %blocking.id,
            "booking rejected: service already has an accepted booking"
        );
        return Err(BookingError::ServiceUnavailable);
    }

    let now = chrono::Utc::now().naive_utc();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        vendor_id: service.vendor_id,
        service_id: service.id,
        booking_date: input.booking_date,
        amount: input.amount,
        status: BookingStatus::Pending,
        address: input.address.trim().to_string(),
        postal_code: input.postal_code.trim().to_string(),
        city: input.city.trim().to_string(),
        notes: input.notes.filter(|n| !n.trim().is_empty()),
        created_at: now,
        updated_at: now,
    };
    queries::insert_booking(&tx, &booking)?;
    tx.commit()?;

    tracing::info!(booking_id = %booking.id, service_id = %booking.service_id, "booking created");
    Ok(booking)
}

pub fn update_status(
    conn: &mut Connection,
    booking_id: &str,
    vendor_id: &str,
    target: BookingStatus,
) -> Result<StatusUpdate, BookingError> {
    if !target.is_vendor_target() {
        return Err(BookingError::Validation(
            "status must be one of: accepted, rejected, completed".to_string(),
        ));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    // Someone else's booking is reported as missing.
    let booking = queries::get_booking_by_id(&tx, booking_id)?
        .filter(|b| b.vendor_id == vendor_id)
        .ok_or(BookingError::NotFound)?;

    if matches!(
        booking.status,
        BookingStatus::Cancelled | BookingStatus::Completed
    ) {
        return Err(BookingError::InvalidTransition {
            from: booking.status,
            to: target,
        });
    }

    if booking.status == target {
        return Ok(StatusUpdate {
            booking,
            changed: false,
            superseded: Vec::new(),
        });
    }

    // A held service is a conflict regardless of the booking's own status.
    if target == BookingStatus::Accepted {
        if let Some(holder) =
            queries::find_accepted_booking(&tx, &booking.service_id, Some(booking.id.as_str()))?
        {
            tracing::info!(
                booking_id = %booking.id,
                holder_id = %holder.id,
                "accept rejected: service already has an accepted booking"
            );
            return Err(BookingError::ServiceUnavailable);
        }
    }

    if !booking.status.vendor_can_transition(target) {
        return Err(BookingError::InvalidTransition {
            from: booking.status,
            to: target,
        });
    }

    queries::update_booking_status(&tx, &booking.id, target)?;

    let superseded = if target == BookingStatus::Accepted {
        queries::reject_competing_pending(&tx, &booking.service_id, &booking.id)?
    } else {
        Vec::new()
    };

    let updated = queries::get_booking_by_id(&tx, &booking.id)?.ok_or(BookingError::NotFound)?;
    tx.commit()?;

    tracing::info!(
        booking_id = %updated.id,
        from = %booking.status,
        to = %updated.status,
        superseded = superseded.len(),
        "booking status updated"
    );

    Ok(StatusUpdate {
        booking: updated,
        changed: true,
        superseded,
    })
}

pub fn cancel_booking(
    conn: &mut Connection,
    booking_id: &str,
    user_id: &str,
) -> Result<Booking, BookingError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let booking = queries::get_booking_by_id(&tx, booking_id)?.ok_or(BookingError::NotFound)?;
    if booking.user_id != user_id {
        return Err(BookingError::Forbidden);
    }
    if booking.status != BookingStatus::Pending {
        return Err(BookingError::InvalidTransition {
            from: booking.status,
            to: BookingStatus::Cancelled,
        });
    }

    queries::update_booking_status(&tx, &booking.id, BookingStatus::Cancelled)?;
    let updated = queries::get_booking_by_id(&tx, &booking.id)?.ok_or(BookingError::NotFound)?;
    tx.commit()?;

    tracing::info!(booking_id = %updated.id, "booking cancelled by user");
    Ok(updated)
}

pub fn check_availability(
    conn: &Connection,
    service_id: &str,
) -> Result<ServiceAvailability, BookingError> {
    if queries::get_service(conn, service_id)?.is_none() {
        return Err(BookingError::ServiceNotFound);
    }
    let blocking_booking = queries::find_accepted_booking(conn, service_id, None)?;
    Ok(ServiceAvailability {
        service_id: service_id.to_string(),
        available: blocking_booking.is_none(),
        blocking_booking,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Category, Role, Service, User, VendorAvailability};

    pub(crate) fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    pub(crate) fn seed_user(conn: &Connection, id: &str, role: Role) {
        let now = chrono::Utc::now().naive_utc();
        queries::insert_user(
            conn,
            &User {
                id: id.to_string(),
                name: format!("{id} name"),
                email: format!("{id}@example.com"),
                password_hash: "x".to_string(),
                role,
                phone: None,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
    }

    /// Seeds vendor `v1`, users `u1..u4`, category `c1` and active service `s1`.
    pub(crate) fn seed_marketplace(conn: &Connection) {
        seed_user(conn, "v1", Role::Vendor);
        for id in ["u1", "u2", "u3", "u4"] {
            seed_user(conn, id, Role::User);
        }
        let now = chrono::Utc::now().naive_utc();
        queries::insert_category(
            conn,
            &Category {
                id: "c1".to_string(),
                name: "Plumbing".to_string(),
                description: None,
                created_at: now,
            },
        )
        .unwrap();
        seed_service(conn, "s1");
    }

    pub(crate) fn seed_service(conn: &Connection, id: &str) {
        let now = chrono::Utc::now().naive_utc();
        queries::insert_service(
            conn,
            &Service {
                id: id.to_string(),
                name: format!("Service {id}"),
                description: None,
                category_id: "c1".to_string(),
                vendor_id: "v1".to_string(),
                price: 50.0,
                location: Some("Springfield".to_string()),
                status: ServiceStatus::Active,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
    }

    pub(crate) fn new_booking(service_id: &str) -> NewBooking {
        NewBooking {
            service_id: service_id.to_string(),
            vendor_id: "v1".to_string(),
            booking_date: parse_booking_date("2025-06-16 10:00").unwrap(),
            amount: 50.0,
            address: "1 Main St".to_string(),
            postal_code: "10001".to_string(),
            city: "Springfield".to_string(),
            notes: Some("ring twice".to_string()),
        }
    }

    fn status_of(conn: &Connection, id: &str) -> BookingStatus {
        queries::get_booking_by_id(conn, id).unwrap().unwrap().status
    }

    fn accepted_count(conn: &Connection, service_id: &str) -> i64 {
        queries::count_accepted_for_service(conn, service_id).unwrap()
    }

    #[test]
    fn test_create_booking_starts_pending() {
        let mut conn = setup_db();
        seed_marketplace(&conn);

        let booking = create_booking(&mut conn, "u1", new_booking("s1")).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.vendor_id, "v1");
        assert_eq!(status_of(&conn, &booking.id), BookingStatus::Pending);
    }

    #[test]
    fn test_create_booking_requires_address_fields() {
        let mut conn = setup_db();
        seed_marketplace(&conn);

        for field in ["address", "postal_code", "city"] {
            let mut input = new_booking("s1");
            match field {
                "address" => input.address = "  ".to_string(),
                "postal_code" => input.postal_code = String::new(),
                _ => input.city = String::new(),
            }
            let err = create_booking(&mut conn, "u1", input).unwrap_err();
            assert!(matches!(err, BookingError::Validation(_)), "{field}");
        }
    }

    #[test]
    fn test_create_booking_unknown_service_and_vendor_mismatch() {
        let mut conn = setup_db();
        seed_marketplace(&conn);

        let err = create_booking(&mut conn, "u1", new_booking("nope")).unwrap_err();
        assert!(matches!(err, BookingError::ServiceNotFound));

        let mut input = new_booking("s1");
        input.vendor_id = "u2".to_string();
        let err = create_booking(&mut conn, "u1", input).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        let err = create_booking(&mut conn, "ghost", new_booking("s1")).unwrap_err();
        assert!(matches!(err, BookingError::UnknownUser));
    }

    #[test]
    fn test_create_booking_on_held_service_conflicts_without_insert() {
        let mut conn = setup_db();
        seed_marketplace(&conn);

        let b1 = create_booking(&mut conn, "u1", new_booking("s1")).unwrap();
        update_status(&mut conn, &b1.id, "v1", BookingStatus::Accepted).unwrap();

        let err = create_booking(&mut conn, "u2", new_booking("s1")).unwrap_err();
        assert!(matches!(err, BookingError::ServiceUnavailable));

        let total = queries::count_bookings_for_service(&conn, "s1").unwrap();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_create_booking_respects_vendor_hours() {
        let mut conn = setup_db();
        seed_marketplace(&conn);
        let hours = VendorAvailability::from_json(
            r#"{"slots":[{"day":"mon","start":"09:00","end":"12:00"}]}"#,
        )
        .unwrap();
        queries::save_vendor_availability(&conn, "v1", &hours).unwrap();

        // 2025-06-16 is a Monday
        assert!(create_booking(&mut conn, "u1", new_booking("s1")).is_ok());

        let mut late = new_booking("s1");
        late.booking_date = parse_booking_date("2025-06-16 15:00").unwrap();
        let err = create_booking(&mut conn, "u2", late).unwrap_err();
        assert!(matches!(err, BookingError::Validation(msg) if msg.contains("Mon: 09:00-12:00")));
    }

    #[test]
    fn test_inactive_service_rejects_bookings() {
        let mut conn = setup_db();
        seed_marketplace(&conn);
        let mut service = queries::get_service(&conn, "s1").unwrap().unwrap();
        service.status = ServiceStatus::Inactive;
        queries::update_service(&conn, &service).unwrap();

        let err = create_booking(&mut conn, "u1", new_booking("s1")).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[test]
    fn test_accept_rejects_competing_pending() {
        let mut conn = setup_db();
        seed_marketplace(&conn);

        let b1 = create_booking(&mut conn, "u1", new_booking("s1")).unwrap();
        let b2 = create_booking(&mut conn, "u2", new_booking("s1")).unwrap();

        let update = update_status(&mut conn, &b1.id, "v1", BookingStatus::Accepted).unwrap();
        assert!(update.changed);
        assert_eq!(update.booking.status, BookingStatus::Accepted);
        assert_eq!(update.superseded.len(), 1);
        assert_eq!(update.superseded[0].id, b2.id);

        assert_eq!(status_of(&conn, &b1.id), BookingStatus::Accepted);
        assert_eq!(status_of(&conn, &b2.id), BookingStatus::Rejected);

        let err = update_status(&mut conn, &b2.id, "v1", BookingStatus::Accepted).unwrap_err();
        assert!(matches!(err, BookingError::ServiceUnavailable));
        assert_eq!(status_of(&conn, &b2.id), BookingStatus::Rejected);
        assert_eq!(accepted_count(&conn, "s1"), 1);
    }

    #[test]
    fn test_accept_conflicts_when_service_already_held() {
        let mut conn = setup_db();
        seed_marketplace(&conn);

        let b1 = create_booking(&mut conn, "u1", new_booking("s1")).unwrap();
        let b2 = create_booking(&mut conn, "u2", new_booking("s1")).unwrap();

        // Simulate a competitor that slipped past the cascade.
        conn.execute(
            "UPDATE bookings SET status = 'accepted' WHERE id = ?1",
            [&b1.id],
        )
        .unwrap();

        let err = update_status(&mut conn, &b2.id, "v1", BookingStatus::Accepted).unwrap_err();
        assert!(matches!(err, BookingError::ServiceUnavailable));
        assert_eq!(status_of(&conn, &b2.id), BookingStatus::Pending);
        assert_eq!(accepted_count(&conn, "s1"), 1);
    }

    #[test]
    fn test_unique_index_backs_the_invariant() {
        let mut conn = setup_db();
        seed_marketplace(&conn);

        let b1 = create_booking(&mut conn, "u1", new_booking("s1")).unwrap();
        let b2 = create_booking(&mut conn, "u2", new_booking("s1")).unwrap();
        update_status(&mut conn, &b1.id, "v1", BookingStatus::Accepted).unwrap();

        let err = queries::update_booking_status(&conn, &b2.id, BookingStatus::Accepted)
            .unwrap_err();
        assert!(queries::is_unique_violation(&err));
        assert!(matches!(BookingError::from(err), BookingError::ServiceUnavailable));
    }

    #[test]
    fn test_reaccept_is_idempotent() {
        let mut conn = setup_db();
        seed_marketplace(&conn);

        let b1 = create_booking(&mut conn, "u1", new_booking("s1")).unwrap();
        let b2 = create_booking(&mut conn, "u2", new_booking("s1")).unwrap();
        update_status(&mut conn, &b1.id, "v1", BookingStatus::Accepted).unwrap();

        let again = update_status(&mut conn, &b1.id, "v1", BookingStatus::Accepted).unwrap();
        assert!(!again.changed);
        assert!(again.superseded.is_empty());
        assert_eq!(again.booking.status, BookingStatus::Accepted);
        assert_eq!(status_of(&conn, &b2.id), BookingStatus::Rejected);
    }

    #[test]
    fn test_vendor_transition_rules() {
        let mut conn = setup_db();
        seed_marketplace(&conn);
        seed_service(&conn, "s2");

        let b1 = create_booking(&mut conn, "u1", new_booking("s1")).unwrap();

        // pending -> completed is not allowed
        let err = update_status(&mut conn, &b1.id, "v1", BookingStatus::Completed).unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));

        update_status(&mut conn, &b1.id, "v1", BookingStatus::Accepted).unwrap();
        // accepted -> rejected is not allowed
        let err = update_status(&mut conn, &b1.id, "v1", BookingStatus::Rejected).unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));

        let done = update_status(&mut conn, &b1.id, "v1", BookingStatus::Completed).unwrap();
        assert_eq!(done.booking.status, BookingStatus::Completed);

        // completed is final, even for the same status
        for target in [
            BookingStatus::Completed,
            BookingStatus::Accepted,
            BookingStatus::Rejected,
        ] {
            let err = update_status(&mut conn, &b1.id, "v1", target).unwrap_err();
            assert!(matches!(err, BookingError::InvalidTransition { .. }));
        }

        // completing frees the service
        assert!(check_availability(&conn, "s1").unwrap().available);

        let b2 = create_booking(&mut conn, "u2", new_booking("s2")).unwrap();
        cancel_booking(&mut conn, &b2.id, "u2").unwrap();
        let err = update_status(&mut conn, &b2.id, "v1", BookingStatus::Accepted).unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));
    }

    #[test]
    fn test_update_status_rejects_unknown_target_and_foreign_vendor() {
        let mut conn = setup_db();
        seed_marketplace(&conn);
        seed_user(&conn, "v2", Role::Vendor);

        let b1 = create_booking(&mut conn, "u1", new_booking("s1")).unwrap();

        let err = update_status(&mut conn, &b1.id, "v1", BookingStatus::Cancelled).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        let err = update_status(&mut conn, &b1.id, "v2", BookingStatus::Accepted).unwrap_err();
        assert!(matches!(err, BookingError::NotFound));

        let err = update_status(&mut conn, "missing", "v1", BookingStatus::Accepted).unwrap_err();
        assert!(matches!(err, BookingError::NotFound));
        assert_eq!(status_of(&conn, &b1.id), BookingStatus::Pending);
    }

    #[test]
    fn test_cancel_only_from_pending() {
        let mut conn = setup_db();
        seed_marketplace(&conn);

        let b3 = create_booking(&mut conn, "u3", new_booking("s1")).unwrap();

        let err = cancel_booking(&mut conn, &b3.id, "u4").unwrap_err();
        assert!(matches!(err, BookingError::Forbidden));
        assert_eq!(status_of(&conn, &b3.id), BookingStatus::Pending);

        let cancelled = cancel_booking(&mut conn, &b3.id, "u3").unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let err = cancel_booking(&mut conn, &b3.id, "u3").unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));

        let err = cancel_booking(&mut conn, "missing", "u3").unwrap_err();
        assert!(matches!(err, BookingError::NotFound));
    }

    #[test]
    fn test_cannot_cancel_accepted_booking() {
        let mut conn = setup_db();
        seed_marketplace(&conn);

        let b1 = create_booking(&mut conn, "u1", new_booking("s1")).unwrap();
        update_status(&mut conn, &b1.id, "v1", BookingStatus::Accepted).unwrap();

        let err = cancel_booking(&mut conn, &b1.id, "u1").unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));
        assert_eq!(status_of(&conn, &b1.id), BookingStatus::Accepted);
    }

    #[test]
    fn test_check_availability() {
        let mut conn = setup_db();
        seed_marketplace(&conn);

        let open = check_availability(&conn, "s1").unwrap();
        assert!(open.available);
        assert!(open.blocking_booking.is_none());

        let b1 = create_booking(&mut conn, "u1", new_booking("s1")).unwrap();
        assert!(check_availability(&conn, "s1").unwrap().available);

        update_status(&mut conn, &b1.id, "v1", BookingStatus::Accepted).unwrap();
        let held = check_availability(&conn, "s1").unwrap();
        assert!(!held.available);
        assert_eq!(held.blocking_booking.unwrap().id, b1.id);

        assert!(matches!(
            check_availability(&conn, "missing").unwrap_err(),
            BookingError::ServiceNotFound
        ));
    }

    #[test]
    fn test_invariant_holds_across_operation_sequence() {
        let mut conn = setup_db();
        seed_marketplace(&conn);

        let mut ids = Vec::new();
        for user in ["u1", "u2", "u3", "u4"] {
            ids.push(create_booking(&mut conn, user, new_booking("s1")).unwrap().id);
        }
        let _ = cancel_booking(&mut conn, &ids[3], "u4");
        for id in &ids {
            let _ = update_status(&mut conn, id, "v1", BookingStatus::Accepted);
            assert!(accepted_count(&conn, "s1") <= 1);
        }
        let _ = update_status(&mut conn, &ids[0], "v1", BookingStatus::Completed);
        let b5 = create_booking(&mut conn, "u4", new_booking("s1")).unwrap();
        update_status(&mut conn, &b5.id, "v1", BookingStatus::Accepted).unwrap();
        assert_eq!(accepted_count(&conn, "s1"), 1);
    }

    #[test]
    fn test_parse_booking_date_formats() {
        let expected = parse_booking_date("2025-06-16 10:30:00").unwrap();
        assert_eq!(parse_booking_date("2025-06-16T10:30:00Z"), Some(expected));
        assert_eq!(parse_booking_date("2025-06-16T10:30"), Some(expected));
        assert_eq!(parse_booking_date("2025-06-16 10:30"), Some(expected));
        assert_eq!(
            parse_booking_date("2025-06-16"),
            parse_booking_date("2025-06-16 00:00")
        );
        assert_eq!(parse_booking_date("16/06/2025"), None);
    }
}
