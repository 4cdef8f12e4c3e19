pub mod admin;
pub mod auth;
pub mod bookings;
pub mod categories;
pub mod chat;
pub mod disputes;
pub mod health;
pub mod reviews;
pub mod services;
pub mod vendors;

use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::queries::Page;
use crate::errors::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

pub fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(serde_json::json!({ "success": true, "data": data }))
}

pub fn ok_with_message<T: Serialize>(message: &str, data: T) -> Json<Value> {
    Json(serde_json::json!({ "success": true, "message": message, "data": data }))
}

pub fn paginated<T: Serialize>(items: Vec<T>, total: i64, page: Page) -> Json<Value> {
    Json(serde_json::json!({
        "success": true,
        "data": items,
        "pagination": {
            "page": page.page,
            "limit": page.limit,
            "total": total,
        },
    }))
}

/// Parses an optional enum-valued query parameter, rejecting unknown values.
pub fn parse_filter<T>(
    raw: Option<&str>,
    name: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => parse(value)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("invalid {name}: {value}"))),
    }
}

pub fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}
