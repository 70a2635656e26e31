use crate::config::{ConnectionConfig, DSN_VAR};
use crate::driver::Driver;
use crate::error::ConnectionError;
use arrow_odbc::odbc_api::Environment;
use std::fmt;

const REDACTED: &str = "***";

/// Holds a resolved configuration and the driver used to open connections with it.
pub struct ConnectionBuilder<D: Driver = Environment> {
    config: ConnectionConfig,
    driver: D,
}

impl ConnectionBuilder<Environment> {
    /// Resolves the configuration from the environment (and `.env`) and
    /// allocates a fresh ODBC environment as driver.
    pub fn from_env() -> Result<ConnectionBuilder<Environment>, ConnectionError> {
        let config = ConnectionConfig::from_env()?;
        let environment = Environment::new()?;
        Ok(ConnectionBuilder::new(config, environment))
    }
}

impl<D: Driver> ConnectionBuilder<D> {
    pub fn new(config: ConnectionConfig, driver: D) -> ConnectionBuilder<D> {
        ConnectionBuilder { config, driver }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Builds the connection string handed to the driver.
    ///
    /// Values are inserted as-is, without quoting.
    pub fn descriptor(&self) -> String {
        self.render(self.config.password())
    }

    /// Same as [`ConnectionBuilder::descriptor`] with the password masked, for logs and display.
    pub fn redacted_descriptor(&self) -> String {
        self.render(REDACTED)
    }

    fn render(&self, password: &str) -> String {
        format!(
            "DRIVER={};SERVER={};DATABASE={};UID={};PWD={};Trusted_Connection=yes;",
            self.config.driver(),
            self.config.server(),
            self.config.database(),
            self.config.username(),
            password,
        )
    }

    /// Opens a connection with the descriptor. The caller owns the returned
    /// handle; it is closed when dropped.
    pub fn connect(&self) -> Result<D::Connection<'_>, ConnectionError> {
        log::info!(
            "connecting to database {} on {} as {}",
            self.config.database(),
            self.config.server(),
            self.config.username()
        );
        log::debug!("connection string: {}", self.redacted_descriptor());

        self.driver.open(&self.descriptor()).map_err(|e| {
            log::error!("failed to connect to {}: {}", self.config.server(), e);
            e
        })
    }

    /// Opens a connection through the configured data source name instead of the descriptor.
    pub fn connect_dsn(&self) -> Result<D::Connection<'_>, ConnectionError> {
        let dsn = self
            .config
            .dsn()
            .ok_or(ConnectionError::MissingSetting(DSN_VAR))?;

        log::info!("connecting to data source {} as {}", dsn, self.config.username());

        self.driver
            .open_dsn(dsn, self.config.username(), self.config.password())
            .map_err(|e| {
                log::error!("failed to connect to data source {}: {}", dsn, e);
                e
            })
    }
}

impl<D: Driver> fmt::Debug for ConnectionBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOverrides;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Accepts any connection string naming `SERVER=reachable`, records every call.
    #[derive(Default)]
    struct MockDriver {
        calls: RefCell<Vec<String>>,
    }

    #[derive(Debug, PartialEq)]
    struct MockConnection<'d> {
        opened_with: &'d str,
    }

    impl Driver for MockDriver {
        type Connection<'d> = MockConnection<'d>;

        fn open(&self, connection_string: &str) -> Result<MockConnection<'_>, ConnectionError> {
            self.calls.borrow_mut().push(connection_string.to_string());
            if connection_string.contains("SERVER=reachable;") {
                Ok(MockConnection { opened_with: "connection string" })
            } else {
                Err(ConnectionError::DriverError(
                    "[08001] server does not exist or access denied".to_string(),
                ))
            }
        }

        fn open_dsn(
            &self,
            dsn: &str,
            username: &str,
            password: &str,
        ) -> Result<MockConnection<'_>, ConnectionError> {
            self.calls
                .borrow_mut()
                .push(format!("dsn:{}:{}:{}", dsn, username, password));
            Ok(MockConnection { opened_with: "dsn" })
        }
    }

    fn config(overrides: ConfigOverrides) -> ConnectionConfig {
        let source: HashMap<String, String> = [
            ("DB_DRIVER", "{ODBC Driver 18 for SQL Server}"),
            ("SERVERNAME", "reachable"),
            ("DATABASENAME", "sales"),
            ("DBUSERNAME", "reporter"),
            ("DBUSERPASSWORD", "s3cr3t"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        ConnectionConfig::resolve(&overrides, &source).unwrap()
    }

    fn builder(overrides: ConfigOverrides) -> ConnectionBuilder<MockDriver> {
        ConnectionBuilder::new(config(overrides), MockDriver::default())
    }

    #[test]
    fn test_descriptor_format() {
        let builder = builder(ConfigOverrides::new());
        assert_eq!(
            builder.descriptor(),
            "DRIVER={ODBC Driver 18 for SQL Server};SERVER=reachable;DATABASE=sales;\
             UID=reporter;PWD=s3cr3t;Trusted_Connection=yes;"
        );
    }

    #[test]
    fn test_descriptor_key_order() {
        let descriptor = builder(ConfigOverrides::new()).descriptor();
        let keys = [
            "DRIVER=",
            "SERVER=",
            "DATABASE=",
            "UID=",
            "PWD=",
            "Trusted_Connection=yes;",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|key| descriptor.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_descriptor_is_idempotent() {
        let builder = builder(ConfigOverrides::new());
        assert_eq!(builder.descriptor(), builder.descriptor());
    }

    #[test]
    fn test_redacted_descriptor_hides_password() {
        let builder = builder(ConfigOverrides::new());
        let redacted = builder.redacted_descriptor();
        assert!(redacted.contains("PWD=***;"));
        assert!(!redacted.contains("s3cr3t"));
        assert!(!format!("{:?}", builder).contains("s3cr3t"));
    }

    #[test]
    fn test_connect_passes_descriptor_to_driver() {
        let builder = builder(ConfigOverrides::new());
        let connection = builder.connect().unwrap();
        assert_eq!(connection, MockConnection { opened_with: "connection string" });
        assert_eq!(*builder.driver.calls.borrow(), vec![builder.descriptor()]);
    }

    #[test]
    fn test_connect_failure_is_an_error() {
        let builder = builder(ConfigOverrides::new().with_server("unreachable"));
        match builder.connect() {
            Err(ConnectionError::DriverError(msg)) => assert!(msg.contains("08001")),
            other => panic!("expected driver error, got {:?}", other),
        }
    }

    #[test]
    fn test_connect_dsn_uses_credentials() {
        let builder = builder(ConfigOverrides::new().with_dsn("warehouse"));
        let connection = builder.connect_dsn().unwrap();
        assert_eq!(connection.opened_with, "dsn");
        assert_eq!(*builder.driver.calls.borrow(), vec!["dsn:warehouse:reporter:s3cr3t".to_string()]);
    }

    #[test]
    fn test_connect_dsn_without_dsn() {
        let builder = builder(ConfigOverrides::new());
        let err = builder.connect_dsn().unwrap_err();
        assert!(matches!(err, ConnectionError::MissingSetting(DSN_VAR)));
        assert!(builder.driver.calls.borrow().is_empty());
    }

    #[test]
    fn test_override_values_reach_descriptor() {
        let builder = builder(
            ConfigOverrides::new()
                .with_server("10.0.0.5")
                .with_password("hunter2"),
        );
        let descriptor = builder.descriptor();
        assert!(descriptor.contains("SERVER=10.0.0.5;"));
        assert!(descriptor.contains("PWD=hunter2;"));
        assert_eq!(builder.config().server(), "10.0.0.5");
    }
}
