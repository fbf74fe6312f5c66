//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup and passed into the web state,
//! so handlers never touch process environment directly.

use std::env;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

use crate::web::signature::{SignatureError, Webhook};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("CLERK_WEBHOOK_SECRET is not a valid signing secret: {0}")]
    InvalidSecret(#[source] SignatureError),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret used to verify inbound webhook signatures (`whsec_...`)
    pub webhook_secret: String,

    /// Maximum clock skew in seconds accepted for webhook timestamps
    pub webhook_tolerance_secs: u64,

    /// Postgres connection URL; the in-memory store is used when unset
    pub database_url: Option<String>,

    /// Maximum number of pooled database connections
    pub database_max_connections: u32,

    /// Auth provider publishable key exposed to descendant routes
    pub auth_publishable_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let webhook_secret = env::var("CLERK_WEBHOOK_SECRET")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("CLERK_WEBHOOK_SECRET"))?;

        let config = Config {
            port: parse_var("PORT", 8080),

            webhook_secret,

            webhook_tolerance_secs: parse_var("WEBHOOK_TOLERANCE_SECONDS", 300),

            database_url: optional_var("DATABASE_URL"),

            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5),

            auth_publishable_key: optional_var("CLERK_PUBLISHABLE_KEY"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that the webhook secret decodes to a signing key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Webhook::new(&self.webhook_secret, self.webhook_tolerance_secs)
            .map(|_| ())
            .map_err(ConfigError::InvalidSecret)
    }

    /// Configuration with defaults and the given webhook secret.
    pub fn with_secret(webhook_secret: impl Into<String>) -> Self {
        Config {
            port: 8080,
            webhook_secret: webhook_secret.into(),
            webhook_tolerance_secs: 300,
            database_url: None,
            database_max_connections: 5,
            auth_publishable_key: None,
        }
    }
}

/// Parse a variable into `T`, falling back to `default` when unset or invalid.
fn parse_var<T: FromStr + Copy>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Read a variable, treating blank values as unset.
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
