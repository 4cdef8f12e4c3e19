use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{ok, ok_with_message, required};
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{Category, Role};
use crate::services::auth;
use crate::state::AppState;

fn duplicate_name(e: rusqlite::Error) -> AppError {
    if queries::is_unique_violation(&e) {
        AppError::Conflict("a category with this name already exists".to_string())
    } else {
        AppError::Database(e)
    }
}

// GET /categories
pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let categories = {
        let db = state.db()?;
        queries::list_categories(&db)?
    };
    Ok(ok(categories))
}

// GET /categories/:id
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let category = {
        let db = state.db()?;
        queries::get_category(&db, &id)?
    };
    category
        .map(ok)
        .ok_or_else(|| AppError::NotFound("category".to_string()))
}

#[derive(Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

// POST /categories
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CategoryRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    claims.require(Role::Admin)?;

    let category = Category {
        id: Uuid::new_v4().to_string(),
        name: required(body.name.as_deref(), "name")?.to_string(),
        description: body.description.filter(|d| !d.trim().is_empty()),
        created_at: Utc::now().naive_utc(),
    };

    {
        let db = state.db()?;
        queries::insert_category(&db, &category).map_err(duplicate_name)?;
    }

    tracing::info!(category_id = %category.id, name = %category.name, "category created");
    Ok((
        StatusCode::CREATED,
        ok_with_message("category created", category),
    ))
}

// PUT /categories/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<CategoryRequest>,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    claims.require(Role::Admin)?;

    let category = {
        let db = state.db()?;
        let mut category = queries::get_category(&db, &id)?
            .ok_or_else(|| AppError::NotFound("category".to_string()))?;
        if let Some(name) = body.name.as_deref() {
            category.name = required(Some(name), "name")?.to_string();
        }
        if let Some(description) = body.description {
            category.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        queries::update_category(&db, &category).map_err(duplicate_name)?;
        category
    };

    Ok(ok_with_message("category updated", category))
}

// DELETE /categories/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    claims.require(Role::Admin)?;

    {
        let db = state.db()?;
        if queries::count_services_in_category(&db, &id)? > 0 {
            return Err(AppError::Conflict(
                "category is still used by services".to_string(),
            ));
        }
        if !queries::delete_category(&db, &id)? {
            return Err(AppError::NotFound("category".to_string()));
        }
    }

    tracing::info!(category_id = %id, "category deleted");
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "category deleted",
    })))
}
