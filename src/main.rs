use anyhow::Context;
use arrow_odbc::odbc_api::Environment;
use clap::{Args, Parser, Subcommand};
use odbc_connection_builder::{ConfigOverrides, ConnectionBuilder, ConnectionConfig, ProcessEnv};
use std::fmt;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    #[clap(flatten)]
    settings: Settings,
    /// Do not load a .env file before reading the environment
    #[clap(long)]
    no_dotenv: bool,
    #[clap(subcommand)]
    command: Commands,
}

// Explicit values; anything omitted is read from the environment.
#[derive(Args)]
struct Settings {
    #[clap(long)]
    driver: Option<String>,
    #[clap(long)]
    dsn: Option<String>,
    #[clap(long)]
    server: Option<String>,
    #[clap(long)]
    database: Option<String>,
    #[clap(long)]
    username: Option<String>,
    #[clap(long)]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the connection string
    Descriptor(DescriptorArgs),
    /// Open a connection and report the database system on the other end
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct DescriptorArgs {
    #[clap(long)]
    show_password: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Connect through the configured DSN instead of the connection string
    #[clap(long)]
    use_dsn: bool,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("driver", &self.driver)
            .field("dsn", &self.dsn)
            .field("server", &self.server)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl From<Settings> for ConfigOverrides {
    fn from(settings: Settings) -> Self {
        let mut overrides = ConfigOverrides::new();
        if let Some(driver) = settings.driver {
            overrides = overrides.with_driver(driver);
        }
        if let Some(dsn) = settings.dsn {
            overrides = overrides.with_dsn(dsn);
        }
        if let Some(server) = settings.server {
            overrides = overrides.with_server(server);
        }
        if let Some(database) = settings.database {
            overrides = overrides.with_database(database);
        }
        if let Some(username) = settings.username {
            overrides = overrides.with_username(username);
        }
        if let Some(password) = settings.password {
            overrides = overrides.with_password(password);
        }
        overrides
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"));

    let cli = Cli::parse();

    let source = if cli.no_dotenv {
        ProcessEnv
    } else {
        ProcessEnv::with_dotenv()?
    };
    let overrides = ConfigOverrides::from(cli.settings);
    let config = ConnectionConfig::resolve(&overrides, &source)
        .context("incomplete connection settings")?;

    let environment = Environment::new()
        .context("failed to create odbc environment")?;
    let builder = ConnectionBuilder::new(config, environment);

    match cli.command {
        Commands::Descriptor(args) => {
            if args.show_password {
                println!("{}", builder.descriptor());
            } else {
                println!("{}", builder.redacted_descriptor());
            }
        }
        Commands::Check(args) => {
            let connection = if args.use_dsn {
                builder.connect_dsn()?
            } else {
                builder.connect()?
            };
            let dbms = connection
                .database_management_system_name()
                .context("connected, but failed to query the dbms name")?;
            log::info!("connection established");
            println!("{}", dbms);
        }
    }

    Ok(())
}
