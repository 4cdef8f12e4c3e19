use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, Dispute, DisputeStatus};
use crate::services::booking::BookingError;

#[derive(Debug, thiserror::Error)]
pub enum DisputeError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("dispute not found")]
    NotFound,

    #[error("an open dispute already exists for this booking")]
    AlreadyOpen,

    #[error("dispute is already resolved")]
    AlreadyResolved,
}

impl From<rusqlite::Error> for DisputeError {
    fn from(e: rusqlite::Error) -> Self {
        DisputeError::Booking(BookingError::Database(e))
    }
}

impl From<DisputeError> for AppError {
    fn from(e: DisputeError) -> Self {
        match e {
            DisputeError::Booking(e) => e.into(),
            DisputeError::NotFound => AppError::NotFound(e.to_string()),
            DisputeError::AlreadyOpen => AppError::Conflict(e.to_string()),
            DisputeError::AlreadyResolved => AppError::Validation(e.to_string()),
        }
    }
}

/// Opens a dispute on the user's accepted or completed booking and marks the
/// booking `disputed`, atomically.
pub fn raise_dispute(
    conn: &mut Connection,
    user_id: &str,
    booking_id: &str,
    reason: &str,
) -> Result<(Dispute, Booking), DisputeError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(BookingError::Validation("reason is required".to_string()).into());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let booking = queries::get_booking_by_id(&tx, booking_id)?.ok_or(BookingError::NotFound)?;
    if booking.user_id != user_id {
        return Err(BookingError::Forbidden.into());
    }
    if queries::has_open_dispute(&tx, &booking.id)? {
        return Err(DisputeError::AlreadyOpen);
    }
    if !matches!(
        booking.status,
        BookingStatus::Accepted | BookingStatus::Completed
    ) {
        return Err(BookingError::InvalidTransition {
            from: booking.status,
            to: BookingStatus::Disputed,
        }
        .into());
    }

    let dispute = Dispute {
        id: Uuid::new_v4().to_string(),
        booking_id: booking.id.clone(),
        user_id: user_id.to_string(),
        reason: reason.to_string(),
        status: DisputeStatus::Open,
        resolution: None,
        created_at: Utc::now().naive_utc(),
        resolved_at: None,
    };
    queries::insert_dispute(&tx, &dispute)?;
    queries::update_booking_status(&tx, &booking.id, BookingStatus::Disputed)?;
    let updated = queries::get_booking_by_id(&tx, &booking.id)?.ok_or(BookingError::NotFound)?;
    tx.commit()?;

    tracing::info!(dispute_id = %dispute.id, booking_id = %updated.id, "dispute opened");
    Ok((dispute, updated))
}

/// Closes an open dispute and settles its booking as `completed`.
pub fn resolve_dispute(
    conn: &mut Connection,
    dispute_id: &str,
    resolution: &str,
) -> Result<(Dispute, Booking), DisputeError> {
    let resolution = resolution.trim();
    if resolution.is_empty() {
        return Err(BookingError::Validation("resolution is required".to_string()).into());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let dispute = queries::get_dispute(&tx, dispute_id)?.ok_or(DisputeError::NotFound)?;
    if dispute.status == DisputeStatus::Resolved {
        return Err(DisputeError::AlreadyResolved);
    }

    queries::resolve_dispute(&tx, &dispute.id, resolution)?;
    let booking =
        queries::get_booking_by_id(&tx, &dispute.booking_id)?.ok_or(BookingError::NotFound)?;
    if booking.status == BookingStatus::Disputed {
        queries::update_booking_status(&tx, &booking.id, BookingStatus::Completed)?;
    }

    let dispute = queries::get_dispute(&tx, &dispute.id)?.ok_or(DisputeError::NotFound)?;
    let booking =
        queries::get_booking_by_id(&tx, &booking.id)?.ok_or(BookingError::NotFound)?;
    tx.commit()?;

    tracing::info!(dispute_id = %dispute.id, booking_id = %booking.id, "dispute resolved");
    Ok((dispute, booking))
}
