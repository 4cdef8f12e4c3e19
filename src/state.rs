use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::ChatMessage;
use crate::services::chat_cache::ChatCache;
use crate::services::notifications::Mailer;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub mailer: Arc<dyn Mailer>,
    pub chat_cache: ChatCache,
    pub chat_tx: broadcast::Sender<ChatMessage>,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        let (chat_tx, _) = broadcast::channel(256);
        Self {
            db: Arc::new(Mutex::new(conn)),
            config,
            mailer,
            chat_cache: ChatCache::default(),
            chat_tx,
        }
    }

    /// Locks the connection. Never hold the guard across an `.await`.
    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("database lock poisoned")))
    }
}
