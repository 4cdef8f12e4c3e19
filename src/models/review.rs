use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: String,
    pub user_id: String,
    pub service_id: String,
    pub booking_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub user_name: String,
    pub service_name: String,
}
