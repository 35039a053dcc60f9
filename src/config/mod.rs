//! Application configuration module
//!
//! This module provides type-safe configuration loading using the `config`
//! and `dotenvy` crates. Values come from an optional YAML file followed by
//! environment variables with the `BROKER_GATEWAY` prefix; nested values use
//! double underscores as separators.
//!
//! Broker addresses are a list of tables and are best kept in the file:
//!
//! ```yaml
//! broker:
//!   addresses:
//!     - { host: rabbit-1.internal, port: 61613, ssl: false }
//!     - { host: rabbit-2.internal, port: 61614, ssl: true }
//!   relay:
//!     system_login: relay
//!     system_passcode: secret
//! ```
//!
//! # Example
//!
//! ```no_run
//! use broker_gateway::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod broker;
mod error;
mod relay;
mod server;

pub use broker::{BrokerAddress, BrokerConfig};
pub use error::{ConfigError, ValidationError};
pub use relay::RelayConfig;
pub use server::{Environment, ServerConfig};

use std::path::Path;

use serde::Deserialize;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_VAR: &str = "BROKER_GATEWAY_CONFIG";

/// File looked up when `BROKER_GATEWAY_CONFIG` is unset (extension optional)
pub const DEFAULT_CONFIG_PATH: &str = "config/gateway";

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, endpoint)
    #[serde(default)]
    pub server: ServerConfig,

    /// Broker cluster and relay configuration
    #[serde(default)]
    pub broker: BrokerConfig,
}

impl AppConfig {
    /// Load configuration from the optional config file and the environment
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads the file named by `BROKER_GATEWAY_CONFIG` (default
    ///    `config/gateway.*`) if it exists
    /// 3. Overlays environment variables with `BROKER_GATEWAY` prefix, using
    ///    `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `BROKER_GATEWAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BROKER_GATEWAY__BROKER__RELAY__SYSTEM_LOGIN=relay` -> `broker.relay.system_login = relay`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::build(config::File::with_name(&path).required(false))
    }

    /// Load configuration from a required file, overlaid by the environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or cannot be parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::build(config::File::from(path).required(true))
    }

    fn build(
        file: config::File<config::FileSourceFile, config::FileFormat>,
    ) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::default()
                    .prefix("BROKER_GATEWAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// An empty broker list is fatal: the relay would have no upstream target.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.broker.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const CLUSTER_YAML: &str = r#"
broker:
  addresses:
    - host: rabbit-1.internal
      port: 61613
      ssl: false
    - host: rabbit-2.internal
      port: 61614
      ssl: true
  relay:
    system_login: relay
    system_passcode: s3cret
"#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    /// Helper to clear environment variables after testing
    fn clear_env() {
        env::remove_var("BROKER_GATEWAY__SERVER__PORT");
        env::remove_var("BROKER_GATEWAY__SERVER__ENVIRONMENT");
        env::remove_var("BROKER_GATEWAY__BROKER__RELAY__SYSTEM_LOGIN");
        env::remove_var(CONFIG_PATH_VAR);
    }

    #[test]
    fn test_load_from_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let file = write_config(CLUSTER_YAML);

        let config = AppConfig::load_from(file.path()).unwrap();

        assert_eq!(config.broker.addresses.len(), 2);
        assert_eq!(
            config.broker.addresses[1],
            BrokerAddress {
                host: "rabbit-2.internal".to_string(),
                port: 61614,
                ssl: true,
            }
        );
        assert_eq!(config.broker.relay.system_login, "relay");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_overrides_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let file = write_config(CLUSTER_YAML);
        env::set_var("BROKER_GATEWAY__SERVER__PORT", "3000");
        env::set_var("BROKER_GATEWAY__BROKER__RELAY__SYSTEM_LOGIN", "override");

        let result = AppConfig::load_from(file.path());
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.broker.relay.system_login, "override");
    }

    #[test]
    fn test_load_uses_config_path_variable() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let file = write_config(CLUSTER_YAML);
        env::set_var(CONFIG_PATH_VAR, file.path());

        let result = AppConfig::load();
        clear_env();

        assert_eq!(result.unwrap().broker.addresses.len(), 2);
    }

    #[test]
    fn test_missing_addresses_fail_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let file = write_config("server:\n  port: 9000\n");

        let config = AppConfig::load_from(file.path()).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.validate(), Err(ValidationError::NoBrokerAddresses));
    }

    #[test]
    fn test_out_of_range_port_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let file = write_config("broker:\n  addresses:\n    - { host: a, port: 70000 }\n");

        assert!(AppConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert!(AppConfig::load_from(Path::new("/nonexistent/gateway.yaml")).is_err());
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let file = write_config(CLUSTER_YAML);
        env::set_var("BROKER_GATEWAY__SERVER__ENVIRONMENT", "production");

        let result = AppConfig::load_from(file.path());
        clear_env();

        assert!(result.unwrap().is_production());
    }
}
