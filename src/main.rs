use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use skilllink::app;
use skilllink::config::{AppConfig, DEFAULT_JWT_SECRET};
use skilllink::db;
use skilllink::services::notifications::http::HttpMailer;
use skilllink::services::notifications::{LogMailer, Mailer};
use skilllink::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    if config.jwt_secret == DEFAULT_JWT_SECRET {
        tracing::warn!("JWT_SECRET is not set; using the insecure default");
    }

    let conn = db::init_db(&config.database_url)?;

    let mailer: Arc<dyn Mailer> = if config.email_api_key.is_empty() {
        tracing::info!("EMAIL_API_KEY not set; emails will only be logged");
        Arc::new(LogMailer)
    } else {
        tracing::info!("sending email via {}", config.email_api_url);
        Arc::new(HttpMailer::new(
            config.email_api_url.clone(),
            config.email_api_key.clone(),
            config.email_from.clone(),
        ))
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::new(conn, config, mailer));
    let app = app::build_router(state)?;

    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
