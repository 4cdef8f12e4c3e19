use std::collections::BTreeMap;

use anyhow::Context;
use chrono::{Datelike, Months, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::models::Role;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_vendors: i64,
    pub total_services: i64,
    pub total_bookings: i64,
    pub bookings_by_status: BTreeMap<String, i64>,
    pub completed_revenue: f64,
    pub new_users_this_month: i64,
    pub new_users_last_month: i64,
    pub user_growth_percent: Option<f64>,
    pub new_bookings_this_month: i64,
    pub new_bookings_last_month: i64,
    pub booking_growth_percent: Option<f64>,
}

/// Month-over-month change. `None` when growth from zero is undefined.
pub fn growth_percentage(current: i64, previous: i64) -> Option<f64> {
    if previous == 0 {
        return if current == 0 { Some(0.0) } else { None };
    }
    let pct = (current - previous) as f64 / previous as f64 * 100.0;
    Some((pct * 100.0).round() / 100.0)
}

/// Start of last month, this month and next month.
fn month_bounds(now: NaiveDateTime) -> anyhow::Result<[NaiveDateTime; 3]> {
    let this_month = now
        .date()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid month start")?;
    let last_month = this_month
        .checked_sub_months(Months::new(1))
        .context("month underflow")?;
    let next_month = this_month
        .checked_add_months(Months::new(1))
        .context("month overflow")?;
    Ok([last_month, this_month, next_month])
}

pub fn dashboard_stats(conn: &Connection, now: NaiveDateTime) -> anyhow::Result<DashboardStats> {
    let [last_month, this_month, next_month] = month_bounds(now)?;

    let bookings_by_status = queries::booking_counts_by_status(conn)?;
    let total_bookings = bookings_by_status.values().sum();

    let new_users_this_month = queries::count_created_between(conn, "users", &this_month, &next_month)?;
    let new_users_last_month = queries::count_created_between(conn, "users", &last_month, &this_month)?;
    let new_bookings_this_month =
        queries::count_created_between(conn, "bookings", &this_month, &next_month)?;
    let new_bookings_last_month =
        queries::count_created_between(conn, "bookings", &last_month, &this_month)?;

    Ok(DashboardStats {
        total_users: queries::count_users_with_role(conn, Role::User)?,
        total_vendors: queries::count_users_with_role(conn, Role::Vendor)?,
        total_services: queries::count_services(conn)?,
        total_bookings,
        bookings_by_status,
        completed_revenue: queries::completed_revenue(conn)?,
        new_users_this_month,
        new_users_last_month,
        user_growth_percent: growth_percentage(new_users_this_month, new_users_last_month),
        new_bookings_this_month,
        new_bookings_last_month,
        booking_growth_percent: growth_percentage(new_bookings_this_month, new_bookings_last_month),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;
    use crate::services::booking::tests::{new_booking, seed_marketplace, setup_db};
    use crate::services::booking::{create_booking, update_status};

    #[test]
    fn test_growth_percentage_guards_zero() {
        assert_eq!(growth_percentage(0, 0), Some(0.0));
        assert_eq!(growth_percentage(5, 0), None);
        assert_eq!(growth_percentage(15, 10), Some(50.0));
        assert_eq!(growth_percentage(5, 10), Some(-50.0));
        assert_eq!(growth_percentage(1, 3), Some(-66.67));
    }

    #[test]
    fn test_month_bounds_wrap_year() {
        let now = NaiveDateTime::parse_from_str("2025-01-15 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let [last, this, next] = month_bounds(now).unwrap();
        assert_eq!(last.to_string(), "2024-12-01 00:00:00");
        assert_eq!(this.to_string(), "2025-01-01 00:00:00");
        assert_eq!(next.to_string(), "2025-02-01 00:00:00");
    }

    #[test]
    fn test_dashboard_counts() {
        let mut conn = setup_db();
        seed_marketplace(&conn);

        let b1 = create_booking(&mut conn, "u1", new_booking("s1")).unwrap();
        create_booking(&mut conn, "u2", new_booking("s1")).unwrap();
        update_status(&mut conn, &b1.id, "v1", BookingStatus::Accepted).unwrap();
        update_status(&mut conn, &b1.id, "v1", BookingStatus::Completed).unwrap();

        let stats = dashboard_stats(&conn, chrono::Utc::now().naive_utc()).unwrap();
        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.total_vendors, 1);
        assert_eq!(stats.total_services, 1);
        assert_eq!(stats.total_bookings, 2);
        assert_eq!(stats.bookings_by_status.get("completed"), Some(&1));
        assert_eq!(stats.bookings_by_status.get("rejected"), Some(&1));
        assert_eq!(stats.completed_revenue, 50.0);
        assert_eq!(stats.new_users_this_month, 5);
        assert_eq!(stats.new_users_last_month, 0);
        assert_eq!(stats.user_growth_percent, None);
        assert_eq!(stats.new_bookings_this_month, 2);
    }
}
