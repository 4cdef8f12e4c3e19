use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use super::{ok_with_message, paginated, parse_filter, required, PageQuery};
use crate::db::queries;
use crate::errors::AppResult;
use crate::models::{DisputeStatus, Role};
use crate::services::auth;
use crate::services::disputes;
use crate::services::notifications::{self, BookingEvent};
use crate::state::AppState;

// POST /disputes
#[derive(Deserialize)]
pub struct CreateDisputeRequest {
    pub booking_id: Option<String>,
    pub reason: Option<String>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateDisputeRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    let booking_id = required(body.booking_id.as_deref(), "booking_id")?;
    let reason = required(body.reason.as_deref(), "reason")?;

    let (dispute, booking) = {
        let mut db = state.db()?;
        disputes::raise_dispute(&mut db, &claims.user_id, booking_id, reason)?
    };

    notifications::notify_bookings(&state, vec![(BookingEvent::Disputed, booking)]);
    Ok((
        StatusCode::CREATED,
        ok_with_message("dispute opened", dispute),
    ))
}

// GET /disputes
#[derive(Deserialize)]
pub struct DisputeListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DisputeListQuery>,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    let status = parse_filter(query.status.as_deref(), "status", DisputeStatus::parse)?;
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .page();

    // Admins see every dispute, everyone else only their own.
    let owner = (!claims.is(Role::Admin)).then_some(claims.user_id.as_str());
    let (items, total) = {
        let db = state.db()?;
        queries::list_disputes(&db, owner, status, page)?
    };
    Ok(paginated(items, total, page))
}

// PUT /disputes/:id/resolve
#[derive(Deserialize)]
pub struct ResolveDisputeRequest {
    pub resolution: Option<String>,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ResolveDisputeRequest>,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    claims.require(Role::Admin)?;
    let resolution = required(body.resolution.as_deref(), "resolution")?;

    let (dispute, booking) = {
        let mut db = state.db()?;
        disputes::resolve_dispute(&mut db, &id, resolution)?
    };

    notifications::notify_bookings(&state, vec![(BookingEvent::DisputeResolved, booking)]);
    Ok(ok_with_message("dispute resolved", dispute))
}
