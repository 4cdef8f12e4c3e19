use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use super::{ok, ok_with_message, paginated, parse_filter, required, PageQuery};
use crate::db::queries::{self, BookingQuery};
use crate::errors::{AppError, AppResult};
use crate::models::{BookingStatus, Role};
use crate::services::auth::{self, Claims};
use crate::services::dashboard;
use crate::state::AppState;

fn check_admin(state: &AppState, headers: &HeaderMap) -> AppResult<Claims> {
    let claims = auth::authenticate(headers, &state.config.jwt_secret)?;
    claims.require(Role::Admin)?;
    Ok(claims)
}

// GET /admin/users
#[derive(Deserialize)]
pub struct UsersQuery {
    pub q: Option<String>,
    pub role: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<UsersQuery>,
) -> AppResult<Json<Value>> {
    check_admin(&state, &headers)?;
    let role = parse_filter(query.role.as_deref(), "role", Role::parse)?;
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .page();

    let (users, total) = {
        let db = state.db()?;
        queries::list_users(&db, search, role, page)?
    };
    Ok(paginated(users, total, page))
}

// PUT /admin/users/:id/role
#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Option<String>,
}

pub async fn update_user_role(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateRoleRequest>,
) -> AppResult<Json<Value>> {
    let claims = check_admin(&state, &headers)?;
    let raw = required(body.role.as_deref(), "role")?;
    let role = Role::parse(raw).ok_or_else(|| AppError::Validation(format!("invalid role: {raw}")))?;
    if id == claims.user_id && role != Role::Admin {
        return Err(AppError::Validation(
            "admins cannot remove their own admin role".to_string(),
        ));
    }

    let user = {
        let db = state.db()?;
        if !queries::update_user_role(&db, &id, role)? {
            return Err(AppError::NotFound("user".to_string()));
        }
        queries::get_user_by_id(&db, &id)?
    }
    .ok_or_else(|| AppError::NotFound("user".to_string()))?;

    tracing::info!(user_id = %user.id, role = %role.as_str(), changed_by = %claims.user_id, "user role updated");
    Ok(ok_with_message("role updated", user))
}

// GET /admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> AppResult<Json<Value>> {
    check_admin(&state, &headers)?;
    let filter = BookingQuery {
        status: parse_filter(query.status.as_deref(), "status", BookingStatus::parse)?,
        ..Default::default()
    };
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .page();

    let (bookings, total) = {
        let db = state.db()?;
        queries::list_bookings(&db, &filter, page)?
    };
    Ok(paginated(bookings, total, page))
}

// GET /admin/reviews
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Value>> {
    check_admin(&state, &headers)?;
    let page = query.page();
    let (reviews, total) = {
        let db = state.db()?;
        queries::list_reviews(&db, None, page)?
    };
    Ok(paginated(reviews, total, page))
}

// DELETE /admin/reviews/:id
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let claims = check_admin(&state, &headers)?;
    let deleted = {
        let db = state.db()?;
        queries::delete_review(&db, &id)?
    };
    if !deleted {
        return Err(AppError::NotFound("review".to_string()));
    }

    tracing::info!(review_id = %id, deleted_by = %claims.user_id, "review removed by admin");
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "review deleted",
    })))
}

// GET /admin/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    check_admin(&state, &headers)?;
    let stats = {
        let db = state.db()?;
        dashboard::dashboard_stats(&db, Utc::now().naive_utc())?
    };
    Ok(ok(stats))
}
