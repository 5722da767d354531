use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::observability::LogFormat;
use crate::storage::PoolSettings;

/// Governance service configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "govai")]
#[command(about = "Governance decision engine for generated answers")]
pub struct Config {
    /// HTTP server listen address
    #[arg(long, default_value = "0.0.0.0:8003", env = "GOVAI_LISTEN_ADDR")]
    pub listen_addr: String,

    /// Full database URL (overrides the individual POSTGRES_* settings)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, default_value = "govai", env = "POSTGRES_USER")]
    pub db_user: String,

    #[arg(long, default_value = "govai", env = "POSTGRES_PASSWORD", hide_env_values = true)]
    pub db_password: String,

    #[arg(long, default_value = "govai", env = "POSTGRES_DB")]
    pub db_name: String,

    #[arg(long, default_value = "localhost", env = "POSTGRES_HOST")]
    pub db_host: String,

    #[arg(long, default_value = "5432", env = "POSTGRES_PORT")]
    pub db_port: u16,

    /// Minimum pooled database connections
    #[arg(long, default_value = "1", env = "GOVAI_DB_MIN_CONNECTIONS")]
    pub db_min_connections: u32,

    /// Maximum pooled database connections
    #[arg(long, default_value = "10", env = "GOVAI_DB_MAX_CONNECTIONS")]
    pub db_max_connections: u32,

    /// Attempts to reach the database at startup before giving up
    #[arg(long, default_value = "15", env = "GOVAI_DB_CONNECT_ATTEMPTS")]
    pub db_connect_attempts: u32,

    /// Fixed delay between startup connection attempts, in seconds
    #[arg(long, default_value = "2", env = "GOVAI_DB_CONNECT_RETRY_SECS")]
    pub db_connect_retry_secs: u64,

    /// How long one connection attempt may wait, in seconds
    #[arg(long, default_value = "5", env = "GOVAI_DB_CONNECT_TIMEOUT_SECS")]
    pub db_connect_timeout_secs: u64,

    /// Confidence floor for the default REQUIRE_CONFIDENCE rule
    #[arg(long, default_value = "0.25", env = "POLICY_DEFAULT_CONFIDENCE")]
    pub default_confidence: f64,

    /// Include REQUIRE_CITATIONS in the default rule set
    #[arg(long, default_value = "true", action = ArgAction::Set, env = "POLICY_REQUIRE_CITATIONS")]
    pub require_citations: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "GOVAI_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Enable graceful shutdown
    #[arg(long, default_value = "true", action = ArgAction::Set, env = "GOVAI_GRACEFUL_SHUTDOWN")]
    pub graceful_shutdown: bool,
}

/// Settings for the built-in rule set used by tenants without policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyDefaults {
    pub default_confidence: f64,
    pub require_citations: bool,
}

impl Default for PolicyDefaults {
    fn default() -> Self {
        PolicyDefaults {
            default_confidence: 0.25,
            require_citations: true,
        }
    }
}

impl Config {
    /// Database URL, composed from the POSTGRES_* parts unless given in full.
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
            ),
        }
    }

    /// Get the startup retry delay as Duration.
    pub fn db_connect_retry_delay(&self) -> Duration {
        Duration::from_secs(self.db_connect_retry_secs)
    }

    /// Pool sizing and per-attempt timeout for the database connection.
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            min_connections: self.db_min_connections,
            max_connections: self.db_max_connections,
            connect_timeout: Duration::from_secs(self.db_connect_timeout_secs),
        }
    }

    pub fn policy_defaults(&self) -> PolicyDefaults {
        PolicyDefaults {
            default_confidence: self.default_confidence,
            require_citations: self.require_citations,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "0.0.0.0:8003".to_string(),
            database_url: None,
            db_user: "govai".to_string(),
            db_password: "govai".to_string(),
            db_name: "govai".to_string(),
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_min_connections: 1,
            db_max_connections: 10,
            db_connect_attempts: 15,
            db_connect_retry_secs: 2,
            db_connect_timeout_secs: 5,
            default_confidence: 0.25,
            require_citations: true,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            graceful_shutdown: true,
        }
    }
}
