//! Best-effort email notifications. Everything here runs after the
//! triggering transaction has committed and never reports back to the caller.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::queries;
use crate::models::{Booking, BookingStatus};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> anyhow::Result<()>;
}

/// Writes emails to the log instead of delivering them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        tracing::info!(to = %email.to, subject = %email.subject, "email (log only)");
        Ok(())
    }
}

/// Sends `emails` on a detached task; failures are logged and dropped.
pub fn dispatch(mailer: Arc<dyn Mailer>, emails: Vec<Email>) {
    if emails.is_empty() {
        return;
    }
    tokio::spawn(async move {
        for email in emails {
            if let Err(e) = mailer.send(&email).await {
                tracing::warn!(to = %email.to, subject = %email.subject, error = %e, "email notification failed");
            }
        }
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    Created,
    Accepted,
    Rejected,
    /// Rejected because another booking on the same service was accepted.
    Superseded,
    Completed,
    Cancelled,
    Disputed,
    DisputeResolved,
}

impl BookingEvent {
    pub fn for_status(status: BookingStatus) -> Option<Self> {
        match status {
            BookingStatus::Accepted => Some(BookingEvent::Accepted),
            BookingStatus::Rejected => Some(BookingEvent::Rejected),
            BookingStatus::Completed => Some(BookingEvent::Completed),
            BookingStatus::Cancelled => Some(BookingEvent::Cancelled),
            BookingStatus::Disputed => Some(BookingEvent::Disputed),
            BookingStatus::Pending => None,
        }
    }

    fn notifies_vendor(&self) -> bool {
        matches!(
            self,
            BookingEvent::Created
                | BookingEvent::Cancelled
                | BookingEvent::Disputed
                | BookingEvent::DisputeResolved
        )
    }

    fn headline(&self) -> &'static str {
        match self {
            BookingEvent::Created => "New booking request",
            BookingEvent::Accepted => "Booking accepted",
            BookingEvent::Rejected => "Booking rejected",
            BookingEvent::Superseded => "Booking no longer available",
            BookingEvent::Completed => "Booking completed",
            BookingEvent::Cancelled => "Booking cancelled",
            BookingEvent::Disputed => "Booking disputed",
            BookingEvent::DisputeResolved => "Dispute resolved",
        }
    }
}

pub fn booking_emails(
    event: BookingEvent,
    booking: &Booking,
    service_name: &str,
    user_email: &str,
    vendor_email: Option<&str>,
) -> Vec<Email> {
    let subject = format!("{}: {service_name}", event.headline());
    let body = format!(
        "{}\n\nService: {service_name}\nDate: {}\nAddress: {}, {} {}\nAmount: {:.2}\nStatus: {}\nReference: {}\n",
        event.headline(),
        booking.booking_date.format("%Y-%m-%d %H:%M"),
        booking.address,
        booking.postal_code,
        booking.city,
        booking.amount,
        booking.status,
        booking.id,
    );

    let mut emails = vec![Email {
        to: user_email.to_string(),
        subject: subject.clone(),
        body: body.clone(),
    }];
    if event.notifies_vendor() {
        if let Some(vendor_email) = vendor_email {
            emails.push(Email {
                to: vendor_email.to_string(),
                subject,
                body,
            });
        }
    }
    emails
}

/// Looks up the parties of each booking and mails them in the background.
pub fn notify_bookings(state: &Arc<AppState>, events: Vec<(BookingEvent, Booking)>) {
    if events.is_empty() {
        return;
    }
    let state = Arc::clone(state);
    tokio::spawn(async move {
        let emails = match collect_booking_emails(&state, &events) {
            Ok(emails) => emails,
            Err(e) => {
                tracing::warn!(error = %e, "failed to prepare booking notifications");
                return;
            }
        };
        for email in emails {
            if let Err(e) = state.mailer.send(&email).await {
                tracing::warn!(to = %email.to, subject = %email.subject, error = %e, "email notification failed");
            }
        }
    });
}

fn collect_booking_emails(
    state: &AppState,
    events: &[(BookingEvent, Booking)],
) -> anyhow::Result<Vec<Email>> {
    let db = state
        .db
        .lock()
        .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;

    let mut emails = Vec::new();
    for (event, booking) in events {
        let Some(user) = queries::get_user_by_id(&db, &booking.user_id)? else {
            tracing::warn!(booking_id = %booking.id, "booking user missing, skipping notification");
            continue;
        };
        let vendor = queries::get_user_by_id(&db, &booking.vendor_id)?;
        let service_name = queries::get_service(&db, &booking.service_id)?
            .map(|s| s.name)
            .unwrap_or_else(|| "your service".to_string());

        emails.extend(booking_emails(
            *event,
            booking,
            &service_name,
            &user.email,
            vendor.as_ref().map(|v| v.email.as_str()),
        ));
    }
    Ok(emails)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn booking() -> Booking {
        let at = NaiveDateTime::parse_from_str("2025-06-16 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        Booking {
            id: "b1".to_string(),
            user_id: "u1".to_string(),
            vendor_id: "v1".to_string(),
            service_id: "s1".to_string(),
            booking_date: at,
            amount: 80.0,
            status: BookingStatus::Pending,
            address: "1 Main St".to_string(),
            postal_code: "10001".to_string(),
            city: "Springfield".to_string(),
            notes: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_created_notifies_both_parties() {
        let emails = booking_emails(
            BookingEvent::Created,
            &booking(),
            "Plumbing",
            "user@example.com",
            Some("vendor@example.com"),
        );
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].to, "user@example.com");
        assert_eq!(emails[1].to, "vendor@example.com");
        assert_eq!(emails[0].subject, "New booking request: Plumbing");
        assert!(emails[0].body.contains("2025-06-16 10:00"));
        assert!(emails[0].body.contains("Reference: b1"));
    }

    #[test]
    fn test_vendor_decisions_notify_user_only() {
        for event in [
            BookingEvent::Accepted,
            BookingEvent::Rejected,
            BookingEvent::Superseded,
            BookingEvent::Completed,
        ] {
            let emails = booking_emails(
                event,
                &booking(),
                "Plumbing",
                "user@example.com",
                Some("vendor@example.com"),
            );
            assert_eq!(emails.len(), 1, "{event:?}");
            assert_eq!(emails[0].to, "user@example.com");
        }
    }

    #[test]
    fn test_event_for_status() {
        assert_eq!(
            BookingEvent::for_status(BookingStatus::Accepted),
            Some(BookingEvent::Accepted)
        );
        assert_eq!(BookingEvent::for_status(BookingStatus::Pending), None);
    }
}
