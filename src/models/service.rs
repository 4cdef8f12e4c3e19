use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: String,
    pub vendor_id: String,
    pub price: f64,
    pub location: Option<String>,
    pub status: ServiceStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Active,
    Inactive,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Active => "active",
            ServiceStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(ServiceStatus::Active),
            "inactive" => Some(ServiceStatus::Inactive),
            _ => None,
        }
    }
}

/// Service enriched for listing pages.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceListing {
    #[serde(flatten)]
    pub service: Service,
    pub category_name: String,
    pub vendor_name: String,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}
