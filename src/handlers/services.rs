use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{ok, ok_with_message, paginated, parse_filter, required, PageQuery};
use crate::db::queries::{self, ServiceQuery};
use crate::errors::{AppError, AppResult};
use crate::models::{Role, Service, ServiceStatus};
use crate::services::auth::{self, Claims};
use crate::state::AppState;

fn check_price(price: f64) -> AppResult<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation(
            "price must be a non-negative number".to_string(),
        ));
    }
    Ok(price)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Loads a service the caller may modify: its vendor or an admin.
fn owned_service(state: &AppState, claims: &Claims, id: &str) -> AppResult<Service> {
    let service = {
        let db = state.db()?;
        queries::get_service(&db, id)?
    }
    .ok_or_else(|| AppError::NotFound("service".to_string()))?;

    if service.vendor_id != claims.user_id && !claims.is(Role::Admin) {
        return Err(AppError::Forbidden(
            "you do not have permission to modify this service".to_string(),
        ));
    }
    Ok(service)
}

// GET /services
#[derive(Deserialize)]
pub struct ServiceListQuery {
    pub q: Option<String>,
    pub category_id: Option<String>,
    pub vendor_id: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ServiceListQuery>,
) -> AppResult<Json<Value>> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .page();
    let filter = ServiceQuery {
        search: query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()),
        category_id: query.category_id.as_deref().filter(|c| !c.is_empty()),
        vendor_id: query.vendor_id.as_deref().filter(|v| !v.is_empty()),
        status: Some(ServiceStatus::Active),
    };

    let (services, total) = {
        let db = state.db()?;
        queries::list_services(&db, &filter, page)?
    };
    Ok(paginated(services, total, page))
}

// GET /services/:id
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let listing = {
        let db = state.db()?;
        queries::get_service_listing(&db, &id)?
    };
    listing
        .map(ok)
        .ok_or_else(|| AppError::NotFound("service".to_string()))
}

// POST /services
#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub price: Option<f64>,
    pub location: Option<String>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateServiceRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    claims.require(Role::Vendor)?;

    let name = required(body.name.as_deref(), "name")?.to_string();
    let category_id = required(body.category_id.as_deref(), "category_id")?.to_string();
    let price = check_price(
        body.price
            .ok_or_else(|| AppError::Validation("price is required".to_string()))?,
    )?;

    let now = Utc::now().naive_utc();
    let service = Service {
        id: Uuid::new_v4().to_string(),
        name,
        description: non_blank(body.description),
        category_id,
        vendor_id: claims.user_id.clone(),
        price,
        location: non_blank(body.location),
        status: ServiceStatus::Active,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db()?;
        if queries::get_category(&db, &service.category_id)?.is_none() {
            return Err(AppError::Validation("category does not exist".to_string()));
        }
        queries::insert_service(&db, &service)?;
    }

    tracing::info!(service_id = %service.id, vendor_id = %service.vendor_id, "service created");
    Ok((
        StatusCode::CREATED,
        ok_with_message("service created", service),
    ))
}

// PUT /services/:id
#[derive(Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub price: Option<f64>,
    pub location: Option<String>,
    pub status: Option<String>,
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateServiceRequest>,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    let mut service = owned_service(&state, &claims, &id)?;

    if let Some(name) = body.name {
        service.name = required(Some(name.as_str()), "name")?.to_string();
    }
    if let Some(description) = body.description {
        service.description = non_blank(Some(description));
    }
    if let Some(location) = body.location {
        service.location = non_blank(Some(location));
    }
    if let Some(price) = body.price {
        service.price = check_price(price)?;
    }
    if let Some(status) = parse_filter(body.status.as_deref(), "status", ServiceStatus::parse)? {
        service.status = status;
    }
    let new_category = non_blank(body.category_id);
    service.updated_at = Utc::now().naive_utc();

    {
        let db = state.db()?;
        if let Some(category_id) = new_category {
            if queries::get_category(&db, &category_id)?.is_none() {
                return Err(AppError::Validation("category does not exist".to_string()));
            }
            service.category_id = category_id;
        }
        if !queries::update_service(&db, &service)? {
            return Err(AppError::NotFound("service".to_string()));
        }
    }

    tracing::info!(service_id = %service.id, "service updated");
    Ok(ok_with_message("service updated", service))
}

// DELETE /services/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    let service = owned_service(&state, &claims, &id)?;

    {
        let db = state.db()?;
        if queries::count_bookings_for_service(&db, &service.id)? > 0 {
            return Err(AppError::Conflict(
                "service has bookings and cannot be deleted; set it inactive instead".to_string(),
            ));
        }
        queries::delete_service(&db, &service.id)?;
    }

    tracing::info!(service_id = %service.id, "service deleted");
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "service deleted",
    })))
}
