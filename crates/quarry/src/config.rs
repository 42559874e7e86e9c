//! Connection settings.
//!
//! Settings come from the process environment through the [`EnvReader`]
//! trait, so tests can supply variables with [`MockEnv`] instead of touching
//! the real environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `QUARRY_DB_ADDRESS` | `127.0.0.1` |
//! | `QUARRY_DB_PORT` | `27017` |
//! | `QUARRY_DB_NAME` | unset |
//! | `QUARRY_DB_USERNAME` | empty |
//! | `QUARRY_DB_PASSWORD` | empty |

use std::collections::HashMap;

use crate::error::ConfigError;

pub const ENV_ADDRESS: &str = "QUARRY_DB_ADDRESS";
pub const ENV_PORT: &str = "QUARRY_DB_PORT";
pub const ENV_DATABASE: &str = "QUARRY_DB_NAME";
pub const ENV_USERNAME: &str = "QUARRY_DB_USERNAME";
pub const ENV_PASSWORD: &str = "QUARRY_DB_PASSWORD";

pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 27017;

/// Abstraction over environment variables.
pub trait EnvReader: Send + Sync {
    /// Get an environment variable value.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealEnv;

impl EnvReader for RealEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// In-memory environment for tests.
#[derive(Debug, Clone, Default)]
pub struct MockEnv {
    vars: HashMap<String, String>,
}

impl MockEnv {
    /// Create an empty mock environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvReader for MockEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Where and as whom to connect.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub address: String,
    pub port: u16,
    /// Default database for new queries; `None` until set.
    pub database: Option<String>,
    pub username: String,
    pub password: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            database: None,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Config {
    /// Loads settings from the process environment.
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_reader(&RealEnv)
    }

    /// Loads settings from any [`EnvReader`]. Blank values count as unset.
    pub fn from_reader(env: &dyn EnvReader) -> Result<Config, ConfigError> {
        let read = |name: &str| {
            env.var(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match read(ENV_PORT) {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidPort {
                var: ENV_PORT,
                value: value.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            address: read(ENV_ADDRESS).unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            port,
            database: read(ENV_DATABASE),
            username: read(ENV_USERNAME).unwrap_or_default(),
            password: read(ENV_PASSWORD).unwrap_or_default(),
        })
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the default database; an empty name clears it.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        let database = database.into();
        self.database = (!database.is_empty()).then_some(database);
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Renders the server URI, with credentials only when a username is set.
    pub fn connection_uri(&self) -> String {
        if self.username.is_empty() {
            format!("mongodb://{}:{}", self.address, self.port)
        } else {
            format!(
                "mongodb://{}:{}@{}:{}",
                self.username, self.password, self.address, self.port
            )
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .finish()
    }
}
