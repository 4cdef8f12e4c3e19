use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use super::{ok, ok_with_message, paginated, PageQuery};
use crate::db::queries::{self, Page, ServiceQuery};
use crate::errors::{AppError, AppResult};
use crate::models::{Role, ServiceStatus, TimeSlot, VendorAvailability};
use crate::services::auth;
use crate::state::AppState;

// GET /vendors
#[derive(Deserialize)]
pub struct VendorListQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VendorListQuery>,
) -> AppResult<Json<Value>> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .page();
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let (vendors, total) = {
        let db = state.db()?;
        queries::list_vendors(&db, search, page)?
    };
    Ok(paginated(vendors, total, page))
}

// GET /vendors/:id
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let (vendor, services) = {
        let db = state.db()?;
        let vendor = queries::get_user_by_id(&db, &id)?
            .filter(|u| u.role == Role::Vendor)
            .ok_or_else(|| AppError::NotFound("vendor".to_string()))?;
        let filter = ServiceQuery {
            vendor_id: Some(vendor.id.as_str()),
            status: Some(ServiceStatus::Active),
            ..Default::default()
        };
        let (services, _) = queries::list_services(&db, &filter, Page::new(None, Some(100)))?;
        (vendor, services)
    };

    Ok(ok(serde_json::json!({
        "vendor": vendor,
        "services": services,
    })))
}

// GET /vendors/:id/availability
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let availability = {
        let db = state.db()?;
        if queries::get_user_by_id(&db, &id)?.map(|u| u.role) != Some(Role::Vendor) {
            return Err(AppError::NotFound("vendor".to_string()));
        }
        queries::get_vendor_availability(&db, &id)?.unwrap_or_default()
    };

    Ok(ok(serde_json::json!({
        "vendor_id": id,
        "slots": availability.slots,
        "summary": availability.to_human_readable(),
    })))
}

// PUT /vendors/availability
#[derive(Deserialize)]
pub struct AvailabilityRequest {
    pub slots: Vec<TimeSlot>,
}

pub async fn set_availability(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AvailabilityRequest>,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    claims.require(Role::Vendor)?;

    let availability = VendorAvailability { slots: body.slots };
    availability
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    {
        let db = state.db()?;
        queries::save_vendor_availability(&db, &claims.user_id, &availability)?;
    }

    tracing::info!(vendor_id = %claims.user_id, slots = availability.slots.len(), "availability updated");
    Ok(ok_with_message("availability updated", availability))
}
