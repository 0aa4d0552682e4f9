//! Configuration for the graph simulator.
//!
//! Sources are layered with `figment`, lowest priority first:
//!
//! 1. Built-in defaults ([`GraphConfig::default`])
//! 2. An optional TOML file
//! 3. Environment variables prefixed with `FBGRAPH_` (`__` separates nested
//!    keys, e.g. `FBGRAPH_APP__SECRET`)

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "FBGRAPH_";

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A source could not be read or parsed.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A value is present but unusable.
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue {
        /// Dotted key of the offending value.
        key: String,
        /// Why the value was rejected.
        message: String,
    },
}

/// Top-level simulator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// The application the simulated graph belongs to.
    pub app: AppConfig,
    /// Host used when rendering connection URLs in object metadata.
    pub graph_host: String,
    /// Prefix of the cookie carrying the signed session arguments.
    pub cookie_prefix: String,
    /// Synthetic test user generation.
    pub test_users: TestUserConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            graph_host: "graph.facebook.com".to_string(),
            cookie_prefix: "fbs_".to_string(),
            test_users: TestUserConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Application identity and secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application identifier; also the graph object id of the application.
    pub id: String,
    /// Display name of the application object.
    pub name: String,
    /// Shared secret used to sign cookies and signed requests.
    pub secret: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            id: "app".to_string(),
            name: "app".to_string(),
            secret: String::new(),
        }
    }
}

/// Synthetic test user generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestUserConfig {
    /// Domain of generated e-mail addresses.
    pub email_domain: String,
    /// Seed for reproducible names and ids. Entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for TestUserConfig {
    fn default() -> Self {
        Self {
            email_domain: "tfbnw.net".to_string(),
            seed: None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `fbgraph_core=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl GraphConfig {
    /// Creates a configuration for the given application id and secret.
    #[must_use]
    pub fn for_app(app_id: &str, secret: &str) -> Self {
        Self {
            app: AppConfig {
                id: app_id.to_string(),
                name: app_id.to_string(),
                secret: secret.to_string(),
            },
            ..Self::default()
        }
    }

    /// Loads configuration from defaults, an optional TOML file and the environment.
    ///
    /// A missing file is not an error; figment simply skips it.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string layered over the defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration can drive a simulator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app.id.trim().is_empty() {
            return Err(invalid("app.id", "must not be empty"));
        }
        if self.app.id.contains('/') {
            return Err(invalid("app.id", "must not contain '/'"));
        }
        if self.app.secret.is_empty() {
            return Err(invalid("app.secret", "must not be empty"));
        }
        if self.test_users.email_domain.trim().is_empty() {
            return Err(invalid("test_users.email_domain", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
