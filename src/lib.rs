pub mod config;
pub mod connection;
pub mod driver;
pub mod error;

pub use config::{ConfigOverrides, ConfigSource, ConnectionConfig, ProcessEnv};
pub use connection::ConnectionBuilder;
pub use driver::Driver;
pub use error::ConnectionError;
