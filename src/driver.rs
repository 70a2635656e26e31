use crate::error::ConnectionError;
use arrow_odbc::odbc_api::{Connection, ConnectionOptions, Environment};

/// The driver-level connect call a [`crate::ConnectionBuilder`] delegates to.
///
/// Connections may borrow from the driver, as odbc-api connections borrow
/// their `Environment`.
pub trait Driver {
    type Connection<'d>
    where
        Self: 'd;

    fn open(&self, connection_string: &str) -> Result<Self::Connection<'_>, ConnectionError>;

    fn open_dsn(
        &self,
        dsn: &str,
        username: &str,
        password: &str,
    ) -> Result<Self::Connection<'_>, ConnectionError>;
}

impl Driver for Environment {
    type Connection<'d> = Connection<'d>;

    fn open(&self, connection_string: &str) -> Result<Connection<'_>, ConnectionError> {
        let connection = self
            .connect_with_connection_string(connection_string, ConnectionOptions::default())?;
        Ok(connection)
    }

    fn open_dsn(
        &self,
        dsn: &str,
        username: &str,
        password: &str,
    ) -> Result<Connection<'_>, ConnectionError> {
        let connection = self.connect(dsn, username, password, ConnectionOptions::default())?;
        Ok(connection)
    }
}
