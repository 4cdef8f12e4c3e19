pub mod auth;
pub mod booking;
pub mod chat_cache;
pub mod dashboard;
pub mod disputes;
pub mod notifications;
