use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use super::{ok, ok_with_message, paginated, parse_filter, required, PageQuery};
use crate::db::queries::{self, BookingQuery};
use crate::errors::{AppError, AppResult};
use crate::models::{BookingStatus, Role};
use crate::services::auth;
use crate::services::booking::{self, NewBooking};
use crate::services::notifications::{self, BookingEvent};
use crate::state::AppState;

// POST /bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub service_id: Option<String>,
    pub vendor_id: Option<String>,
    pub booking_date: Option<String>,
    pub amount: Option<f64>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    claims.require(Role::User)?;

    let service_id = required(body.service_id.as_deref(), "service_id")?.to_string();
    let vendor_id = required(body.vendor_id.as_deref(), "vendor_id")?.to_string();
    let raw_date = required(body.booking_date.as_deref(), "booking_date")?;
    let booking_date = booking::parse_booking_date(raw_date)
        .ok_or_else(|| AppError::Validation(format!("invalid booking_date: {raw_date}")))?;
    let amount = body
        .amount
        .ok_or_else(|| AppError::Validation("amount is required".to_string()))?;

    let input = NewBooking {
        service_id,
        vendor_id,
        booking_date,
        amount,
        address: body.address.unwrap_or_default(),
        postal_code: body.postal_code.unwrap_or_default(),
        city: body.city.unwrap_or_default(),
        notes: body.notes,
    };

    let created = {
        let mut db = state.db()?;
        booking::create_booking(&mut db, &claims.user_id, input)?
    };

    notifications::notify_bookings(&state, vec![(BookingEvent::Created, created.clone())]);

    Ok((
        StatusCode::CREATED,
        ok_with_message("booking created", created),
    ))
}

#[derive(Deserialize)]
pub struct BookingListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl BookingListQuery {
    fn status(&self) -> AppResult<Option<BookingStatus>> {
        parse_filter(self.status.as_deref(), "status", BookingStatus::parse)
    }

    fn paging(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

// GET /bookings/user
pub async fn list_for_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    let page = query.paging().page();
    let filter = BookingQuery {
        user_id: Some(claims.user_id.as_str()),
        status: query.status()?,
        ..Default::default()
    };

    let (bookings, total) = {
        let db = state.db()?;
        queries::list_bookings(&db, &filter, page)?
    };
    Ok(paginated(bookings, total, page))
}

// GET /bookings/vendor
pub async fn list_for_vendor(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    claims.require(Role::Vendor)?;
    let page = query.paging().page();
    let filter = BookingQuery {
        vendor_id: Some(claims.user_id.as_str()),
        status: query.status()?,
        ..Default::default()
    };

    let (bookings, total) = {
        let db = state.db()?;
        queries::list_bookings(&db, &filter, page)?
    };
    Ok(paginated(bookings, total, page))
}

// GET /bookings/:id
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;

    let details = {
        let db = state.db()?;
        queries::get_booking_details(&db, &id)?
    }
    .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

    let booking = &details.booking;
    let visible = claims.is(Role::Admin)
        || booking.user_id == claims.user_id
        || booking.vendor_id == claims.user_id;
    if !visible {
        return Err(AppError::Forbidden(
            "you do not have access to this booking".to_string(),
        ));
    }
    Ok(ok(details))
}

// PUT /bookings/:id/status
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    claims.require(Role::Vendor)?;

    let raw = required(body.status.as_deref(), "status")?;
    let target = BookingStatus::parse(raw)
        .ok_or_else(|| AppError::Validation(format!("invalid status: {raw}")))?;

    let update = {
        let mut db = state.db()?;
        booking::update_status(&mut db, &id, &claims.user_id, target)?
    };

    if update.changed {
        let mut events = Vec::with_capacity(update.superseded.len() + 1);
        if let Some(event) = BookingEvent::for_status(update.booking.status) {
            events.push((event, update.booking.clone()));
        }
        events.extend(
            update
                .superseded
                .iter()
                .cloned()
                .map(|b| (BookingEvent::Superseded, b)),
        );
        notifications::notify_bookings(&state, events);
    }

    let message = if update.changed {
        format!("booking {}", update.booking.status)
    } else {
        format!("booking already {}", update.booking.status)
    };
    Ok(Json(serde_json::json!({
        "success": true,
        "message": message,
        "data": update.booking,
        "rejected_bookings": update.superseded.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(),
    })))
}

// PUT /bookings/:id/cancel
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;

    let cancelled = {
        let mut db = state.db()?;
        booking::cancel_booking(&mut db, &id, &claims.user_id)?
    };

    notifications::notify_bookings(&state, vec![(BookingEvent::Cancelled, cancelled.clone())]);
    Ok(ok_with_message("booking cancelled", cancelled))
}

// GET /bookings/availability/:service_id
pub async fn availability(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<String>,
) -> AppResult<Json<Value>> {
    let availability = {
        let db = state.db()?;
        booking::check_availability(&db, &service_id)?
    };
    Ok(ok(availability))
}
