//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use nest_events::{event::EventConfig, store::StoreConfig};
use std::net::SocketAddr;

/// Minimum admin token length
pub const MIN_ADMIN_TOKEN_LEN: usize = 16;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: StoreConfig,
    /// Shared secret for admin-only commands
    pub admin_token: String,
    /// Defaults applied to new events
    pub event_defaults: EventDefaultsConfig,
    /// Prometheus exporter address, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Defaults for fields a create request may omit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDefaultsConfig {
    /// Rounds for Swiss events
    pub swiss_rounds: u32,
    /// Roster cap, 0 for unlimited
    pub participant_limit: u32,
}

impl Default for EventDefaultsConfig {
    fn default() -> Self {
        Self {
            swiss_rounds: EventConfig::DEFAULT_ROUNDS,
            participant_limit: 0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_addr("SERVER_BIND")?
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 6969))),
        };

        let development = StoreConfig::development();
        let database = StoreConfig {
            database_url: database_url_override
                .or_else(|| std::env::var("DATABASE_URL").ok())
                .unwrap_or(development.database_url),
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", development.max_connections),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", development.min_connections),
            connection_timeout_secs: parse_env_or(
                "DB_CONNECTION_TIMEOUT_SECS",
                development.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", development.idle_timeout_secs),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", development.max_lifetime_secs),
        };

        // Admin token (REQUIRED)
        let admin_token = std::env::var("ADMIN_TOKEN").map_err(|_| ConfigError::MissingRequired {
            var: "ADMIN_TOKEN".to_string(),
            hint: "Generate with: openssl rand -hex 16".to_string(),
        })?;

        let defaults = EventDefaultsConfig::default();
        let event_defaults = EventDefaultsConfig {
            swiss_rounds: parse_env_or("EVENT_DEFAULT_SWISS_ROUNDS", defaults.swiss_rounds),
            participant_limit: parse_env_or(
                "EVENT_DEFAULT_PARTICIPANT_LIMIT",
                defaults.participant_limit,
            ),
        };

        let metrics_bind = parse_env_addr("METRICS_BIND")?;

        Ok(ServerConfig {
            bind,
            database,
            admin_token,
            event_defaults,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin_token.len() < MIN_ADMIN_TOKEN_LEN {
            return Err(ConfigError::Invalid {
                var: "ADMIN_TOKEN".to_string(),
                reason: format!("Must be at least {MIN_ADMIN_TOKEN_LEN} characters"),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.event_defaults.swiss_rounds == 0 {
            return Err(ConfigError::Invalid {
                var: "EVENT_DEFAULT_SWISS_ROUNDS".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Optional socket address; a set but malformed value is an error
fn parse_env_addr(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{value}' is not a valid IP:PORT address"),
        }),
        Err(_) => Ok(None),
    }
}
