use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

use crate::auth::RateLimitConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub jwt_secret: String,
    /// Mark gym licenses and trainer certifications verified on save
    pub auto_verify_documents: bool,
    pub auth_rate_limit: RateLimitConfig,
    pub token_purge_cron: String,
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {value:?}")),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("PORT", 3000u16)?;
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string());
        let auto_verify_documents = parse_var("AUTO_VERIFY_DOCUMENTS", true)?;

        let defaults = RateLimitConfig::default();
        let max_requests = parse_var("AUTH_RATE_LIMIT_MAX", defaults.max_requests)?;
        let window_secs = parse_var("AUTH_RATE_LIMIT_WINDOW_SECS", defaults.window_seconds)?;
        let trust_forwarded_headers =
            parse_var("AUTH_TRUST_FORWARDED_HEADERS", defaults.trust_forwarded_headers)?;

        let token_purge_cron =
            env::var("TOKEN_PURGE_CRON").unwrap_or_else(|_| "0 0 * * * *".to_string());

        let config = AppConfig {
            host,
            port,
            environment,
            log_level,
            jwt_secret,
            auto_verify_documents,
            auth_rate_limit: RateLimitConfig {
                max_requests,
                window_seconds: window_secs,
                trust_forwarded_headers,
            },
            token_purge_cron,
        };

        if config.is_production() && config.jwt_secret == "your-secret-key-change-in-production" {
            anyhow::bail!("JWT_SECRET must be set in production");
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            jwt_secret: "your-secret-key-change-in-production".to_string(),
            auto_verify_documents: true,
            auth_rate_limit: RateLimitConfig::default(),
            token_purge_cron: "0 0 * * * *".to_string(),
        }
    }
}
