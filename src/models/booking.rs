use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub vendor_id: String,
    pub service_id: String,
    pub booking_date: NaiveDateTime,
    pub amount: f64,
    pub status: BookingStatus,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A booking joined with the display names of its service and parties.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub service_name: String,
    pub user_name: String,
    pub vendor_name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Completed,
    Cancelled,
    Rejected,
    Disputed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Disputed => "disputed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "accepted" => Some(BookingStatus::Accepted),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "rejected" => Some(BookingStatus::Rejected),
            "disputed" => Some(BookingStatus::Disputed),
            _ => None,
        }
    }

    /// Statuses a vendor may request through a status update.
    pub fn is_vendor_target(&self) -> bool {
        matches!(
            self,
            BookingStatus::Accepted | BookingStatus::Rejected | BookingStatus::Completed
        )
    }

    /// Whether a vendor may move a booking from `self` to `target`.
    pub fn vendor_can_transition(&self, target: BookingStatus) -> bool {
        matches!(
            (self, target),
            (BookingStatus::Pending, BookingStatus::Accepted)
                | (BookingStatus::Pending, BookingStatus::Rejected)
                | (BookingStatus::Accepted, BookingStatus::Completed)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_status() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Accepted,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::Rejected,
            BookingStatus::Disputed,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse(" Accepted "), Some(BookingStatus::Accepted));
        assert_eq!(BookingStatus::parse("confirmed"), None);
    }

    #[test]
    fn test_vendor_transitions() {
        use BookingStatus::*;
        assert!(Pending.vendor_can_transition(Accepted));
        assert!(Pending.vendor_can_transition(Rejected));
        assert!(Accepted.vendor_can_transition(Completed));

        assert!(!Pending.vendor_can_transition(Completed));
        assert!(!Accepted.vendor_can_transition(Rejected));
        assert!(!Rejected.vendor_can_transition(Accepted));
        assert!(!Completed.vendor_can_transition(Accepted));
        assert!(!Cancelled.vendor_can_transition(Accepted));
        assert!(!Disputed.vendor_can_transition(Completed));
    }

    #[test]
    fn test_vendor_targets() {
        assert!(BookingStatus::Accepted.is_vendor_target());
        assert!(BookingStatus::Rejected.is_vendor_target());
        assert!(BookingStatus::Completed.is_vendor_target());
        assert!(!BookingStatus::Cancelled.is_vendor_target());
        assert!(!BookingStatus::Pending.is_vendor_target());
        assert!(!BookingStatus::Disputed.is_vendor_target());
    }
}
