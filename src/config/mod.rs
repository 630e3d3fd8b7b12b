use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// Allowed origin for the admin dashboard (CORS)
    pub admin_origin: String,
}

/// Payment-confirmation webhook settings.
///
/// Delivery is best-effort: a missing endpoint disables notifications rather
/// than failing startup, since payout state transitions never depend on it.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    pub webhook_url: Option<String>,
    pub webhook_secret: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                admin_origin: env::var("ADMIN_ORIGIN")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            notifications: NotificationConfig {
                webhook_url: env::var("NOTIFICATION_WEBHOOK_URL").ok(),
                webhook_secret: env::var("NOTIFICATION_WEBHOOK_SECRET").map_err(|_| {
                    AppError::Configuration("NOTIFICATION_WEBHOOK_SECRET not set".to_string())
                })?,
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.workers == 0 {
            return Err(AppError::Configuration(
                "Server workers must be greater than 0".to_string(),
            ));
        }

        if self.notifications.webhook_secret.trim().is_empty() {
            return Err(AppError::Configuration(
                "Notification webhook secret must not be blank".to_string(),
            ));
        }

        Ok(())
    }
}
