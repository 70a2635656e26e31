use std::fmt;

#[derive(Debug)]
pub enum ConnectionError {
    /// A required setting was neither passed explicitly nor found in the source.
    /// Carries the name of the environment variable that would have supplied it.
    MissingSetting(&'static str),
    OdbcApiError(arrow_odbc::odbc_api::Error),
    /// Failure reported by a driver that is not backed by odbc-api.
    DriverError(String),
    DotenvError(dotenvy::Error),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::MissingSetting(var) => {
                write!(f, "missing connection setting, set {} or pass it explicitly", var)
            }
            ConnectionError::OdbcApiError(e) => write!(f, "odbc driver failed to connect: {}", e),
            ConnectionError::DriverError(msg) => write!(f, "driver failed to connect: {}", msg),
            ConnectionError::DotenvError(e) => write!(f, "failed to load .env file: {}", e),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectionError::OdbcApiError(e) => Some(e),
            ConnectionError::DotenvError(e) => Some(e),
            ConnectionError::MissingSetting(_) | ConnectionError::DriverError(_) => None,
        }
    }
}

impl From<arrow_odbc::odbc_api::Error> for ConnectionError {
    fn from(error: arrow_odbc::odbc_api::Error) -> Self {
        ConnectionError::OdbcApiError(error)
    }
}

impl From<dotenvy::Error> for ConnectionError {
    fn from(error: dotenvy::Error) -> Self {
        ConnectionError::DotenvError(error)
    }
}
