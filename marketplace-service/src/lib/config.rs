use std::env;
use std::time::Duration;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub admin: AdminConfig,
    pub store: StoreConfig,
    pub reset: ResetConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

/// Argon2id work factor.
#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_cost_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

/// The singleton privileged account created at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    pub identifier: String,
    pub default_password: String,
    /// Startup attempts before giving up on an unreachable store
    pub bootstrap_attempts: u32,
    pub bootstrap_backoff_ms: u64,
}

impl AdminConfig {
    pub fn bootstrap_backoff(&self) -> Duration {
        Duration::from_millis(self.bootstrap_backoff_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub timeout_secs: u64,
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResetConfig {
    pub ttl_hours: i64,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}
