use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{ok_with_message, paginated, required, PageQuery};
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{BookingStatus, Review, Role};
use crate::services::auth;
use crate::state::AppState;

// POST /reviews
#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub booking_id: Option<String>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    let booking_id = required(body.booking_id.as_deref(), "booking_id")?;
    let rating = match body.rating {
        Some(r @ 1..=5) => r,
        _ => {
            return Err(AppError::Validation(
                "rating must be between 1 and 5".to_string(),
            ))
        }
    };

    let review = {
        let db = state.db()?;
        let booking = queries::get_booking_by_id(&db, booking_id)?
            .ok_or_else(|| AppError::NotFound("booking".to_string()))?;
        if booking.user_id != claims.user_id {
            return Err(AppError::Forbidden(
                "only the customer of a booking can review it".to_string(),
            ));
        }
        if booking.status != BookingStatus::Completed {
            return Err(AppError::Validation(
                "only completed bookings can be reviewed".to_string(),
            ));
        }
        if queries::review_exists_for_booking(&db, &booking.id)? {
            return Err(AppError::Conflict(
                "this booking has already been reviewed".to_string(),
            ));
        }

        let review = Review {
            id: Uuid::new_v4().to_string(),
            user_id: claims.user_id.clone(),
            service_id: booking.service_id,
            booking_id: booking.id,
            rating,
            comment: body.comment.filter(|c| !c.trim().is_empty()),
            created_at: Utc::now().naive_utc(),
        };
        queries::insert_review(&db, &review).map_err(|e| {
            if queries::is_unique_violation(&e) {
                AppError::Conflict("this booking has already been reviewed".to_string())
            } else {
                AppError::Database(e)
            }
        })?;
        review
    };

    tracing::info!(review_id = %review.id, service_id = %review.service_id, rating, "review created");
    Ok((
        StatusCode::CREATED,
        ok_with_message("review created", review),
    ))
}

// GET /reviews/service/:id
pub async fn list_for_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Value>> {
    let page = query.page();
    let (reviews, total) = {
        let db = state.db()?;
        if queries::get_service(&db, &service_id)?.is_none() {
            return Err(AppError::NotFound("service".to_string()));
        }
        queries::list_reviews(&db, Some(service_id.as_str()), page)?
    };
    Ok(paginated(reviews, total, page))
}

// DELETE /reviews/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;

    {
        let db = state.db()?;
        let review = queries::get_review(&db, &id)?
            .ok_or_else(|| AppError::NotFound("review".to_string()))?;
        if review.user_id != claims.user_id && !claims.is(Role::Admin) {
            return Err(AppError::Forbidden(
                "you can only delete your own reviews".to_string(),
            ));
        }
        queries::delete_review(&db, &review.id)?;
    }

    tracing::info!(review_id = %id, deleted_by = %claims.user_id, "review deleted");
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "review deleted",
    })))
}
