use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub email_api_key: String,
    pub email_api_url: String,
    pub email_from: String,
    pub cors_origin: String,
}

pub const DEFAULT_JWT_SECRET: &str = "changeme";

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "skilllink.db".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            email_api_key: env::var("EMAIL_API_KEY").unwrap_or_default(),
            email_api_url: env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "SkillLink <no-reply@skilllink.app>".to_string()),
            cors_origin: env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
        }
    }
}
