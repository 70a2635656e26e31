//! Connection settings, resolved once from explicit overrides falling back
//! to an external source such as the process environment.

use crate::error::ConnectionError;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DRIVER_VAR: &str = "DB_DRIVER";
pub const DSN_VAR: &str = "DSN";
pub const SERVER_VAR: &str = "SERVERNAME";
pub const DATABASE_VAR: &str = "DATABASENAME";
pub const USERNAME_VAR: &str = "DBUSERNAME";
pub const PASSWORD_VAR: &str = "DBUSERPASSWORD";

/// Somewhere named settings can be looked up.
pub trait ConfigSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads settings from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ProcessEnv {
    /// Loads a `.env` file from the current directory (or its parents) into the
    /// process environment first. A missing file is not an error.
    pub fn with_dotenv() -> Result<ProcessEnv, ConnectionError> {
        ProcessEnv::loaded(dotenvy::dotenv())
    }

    /// Like [`ProcessEnv::with_dotenv`], reading a specific file.
    pub fn with_dotenv_file(path: impl AsRef<Path>) -> Result<ProcessEnv, ConnectionError> {
        let path = path.as_ref();
        ProcessEnv::loaded(dotenvy::from_path(path).map(|_| path.to_path_buf()))
    }

    fn loaded(result: Result<PathBuf, dotenvy::Error>) -> Result<ProcessEnv, ConnectionError> {
        match result {
            Ok(path) => log::debug!("loaded environment from {}", path.display()),
            Err(e) if e.not_found() => log::debug!("no .env file found"),
            Err(e) => return Err(e.into()),
        }
        Ok(ProcessEnv)
    }
}

impl ConfigSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl ConfigSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Explicitly supplied settings. These win over the source, except when empty.
#[derive(Clone, Default)]
pub struct ConfigOverrides {
    driver: Option<String>,
    dsn: Option<String>,
    server: Option<String>,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl ConfigOverrides {
    pub fn new() -> ConfigOverrides {
        ConfigOverrides::default()
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn with_dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = Some(dsn.into());
        self
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

impl fmt::Debug for ConfigOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOverrides")
            .field("driver", &self.driver)
            .field("dsn", &self.dsn)
            .field("server", &self.server)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    driver: String,
    dsn: Option<String>,
    server: String,
    database: String,
    username: String,
    password: String,
}

impl ConnectionConfig {
    /// Resolves every setting from `overrides`, falling back to `source`.
    ///
    /// Driver, server, database, username and password are required; an
    /// absent or empty value fails with [`ConnectionError::MissingSetting`].
    pub fn resolve(
        overrides: &ConfigOverrides,
        source: &impl ConfigSource,
    ) -> Result<ConnectionConfig, ConnectionError> {
        let required = |value: &Option<String>, var: &'static str| {
            pick(value, source, var).ok_or(ConnectionError::MissingSetting(var))
        };

        let config = ConnectionConfig {
            driver: required(&overrides.driver, DRIVER_VAR)?,
            dsn: pick(&overrides.dsn, source, DSN_VAR),
            server: required(&overrides.server, SERVER_VAR)?,
            database: required(&overrides.database, DATABASE_VAR)?,
            username: required(&overrides.username, USERNAME_VAR)?,
            password: required(&overrides.password, PASSWORD_VAR)?,
        };

        log::debug!("resolved connection config: {:?}", config);
        Ok(config)
    }

    /// Loads `.env` if present and resolves everything from the process environment.
    pub fn from_env() -> Result<ConnectionConfig, ConnectionError> {
        let source = ProcessEnv::with_dotenv()?;
        ConnectionConfig::resolve(&ConfigOverrides::default(), &source)
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn dsn(&self) -> Option<&str> {
        self.dsn.as_deref()
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("driver", &self.driver)
            .field("dsn", &self.dsn)
            .field("server", &self.server)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

fn pick(explicit: &Option<String>, source: &impl ConfigSource, var: &str) -> Option<String> {
    explicit
        .clone()
        .filter(|v| !v.is_empty())
        .or_else(|| source.var(var))
        .filter(|v| !v.is_empty())
}
