//! Application configuration management.

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Certificate tariffs.
    #[serde(default)]
    pub tariffs: TariffConfig,
    /// Balance engine tuning.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Certificate tariffs, in pesos.
///
/// Defaults are the 2026 motorcycle SOAT tariffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TariffConfig {
    /// Base value for motorcycles up to 99cc.
    #[serde(default = "default_low_displacement_base")]
    pub low_displacement_base: i64,
    /// Base value for motorcycles from 100cc to 200cc.
    #[serde(default = "default_mid_displacement_base")]
    pub mid_displacement_base: i64,
    /// Fixed commission added to every certificate.
    #[serde(default = "default_commission")]
    pub commission: i64,
}

fn default_low_displacement_base() -> i64 {
    256_200
}

fn default_mid_displacement_base() -> i64 {
    343_300
}

fn default_commission() -> i64 {
    30_000
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            low_displacement_base: default_low_displacement_base(),
            mid_displacement_base: default_mid_displacement_base(),
            commission: default_commission(),
        }
    }
}

/// Balance engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Attempts per mutation before reporting contention.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    5
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` if configuration cannot be loaded.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BOLSA").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment_with_defaults() {
        let config = temp_env::with_vars(
            [
                ("BOLSA__DATABASE__URL", Some("postgres://localhost/bolsa")),
                ("BOLSA__SERVER__HOST", Some("127.0.0.1")),
            ],
            AppConfig::load,
        )
        .unwrap();

        assert_eq!(config.database.url, "postgres://localhost/bolsa");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.tariffs, TariffConfig::default());
        assert_eq!(config.ledger.max_attempts, 5);
    }

    #[test]
    fn test_tariffs_overridable_from_environment() {
        let config = temp_env::with_vars(
            [
                ("BOLSA__DATABASE__URL", Some("postgres://localhost/bolsa")),
                ("BOLSA__TARIFFS__COMMISSION", Some("35000")),
                ("BOLSA__LEDGER__MAX_ATTEMPTS", Some("8")),
            ],
            AppConfig::load,
        )
        .unwrap();

        assert_eq!(config.tariffs.commission, 35_000);
        assert_eq!(config.tariffs.low_displacement_base, 256_200);
        assert_eq!(config.ledger.max_attempts, 8);
    }

    #[test]
    fn test_missing_database_url_fails() {
        let result = temp_env::with_vars_unset(["BOLSA__DATABASE__URL"], AppConfig::load);
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_malformed_value_is_a_configuration_error() {
        let result = temp_env::with_vars(
            [
                ("BOLSA__DATABASE__URL", Some("postgres://localhost/bolsa")),
                ("BOLSA__LEDGER__MAX_ATTEMPTS", Some("many")),
            ],
            AppConfig::load,
        );

        let err = result.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_default_tariffs() {
        let tariffs = TariffConfig::default();
        assert_eq!(tariffs.low_displacement_base, 256_200);
        assert_eq!(tariffs.mid_displacement_base, 343_300);
        assert_eq!(tariffs.commission, 30_000);
    }
}
