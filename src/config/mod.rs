// Configuration module entry point
// Layers defaults, config file, environment and command line flags

mod state;
mod types;

use std::net::SocketAddr;

use crate::cli::Cli;

// Re-export public types
pub use state::AppState;
pub use types::{Config, DataConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Environment variable prefix, e.g. `WHOAMI_SERVER__PORT`
const ENV_PREFIX: &str = "WHOAMI";

impl Config {
    /// Load configuration for the command line invocation
    ///
    /// Precedence, lowest first: defaults, config file, environment, flags.
    pub fn load(cli: &Cli) -> Result<Self, ::config::ConfigError> {
        let access_log = cli.access_log.then_some(true);
        let settings = Self::builder(&cli.config)?
            .set_override_option("server.host", cli.host.clone())?
            .set_override_option("server.port", cli.port.map(i64::from))?
            .set_override_option("server.workers", cli.workers.map(i64::from))?
            .set_override_option("logging.level", cli.log_level.clone())?
            .set_override_option("logging.format", cli.log_format.clone())?
            .set_override_option("logging.access_log", access_log)?
            .set_override_option(
                "logging.access_log_skip_paths",
                cli.access_log_skip_paths.clone(),
            )?
            .set_override_option("performance.read_timeout", cli.read_timeout.map(i64::from))?
            .set_override_option(
                "performance.read_header_timeout",
                cli.read_header_timeout.map(i64::from),
            )?
            .set_override_option("performance.write_timeout", cli.write_timeout.map(i64::from))?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from specified file path (extension optional)
    /// without command line overrides
    pub fn load_from(config_path: &str) -> Result<Self, ::config::ConfigError> {
        let cfg: Self = Self::builder(config_path)?.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn builder(
        config_path: &str,
    ) -> Result<::config::ConfigBuilder<::config::builder::DefaultState>, ::config::ConfigError>
    {
        Ok(::config::Config::builder()
            .add_source(::config::Config::try_from(&Self::default())?)
            .add_source(::config::File::with_name(config_path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("logging.access_log_skip_paths"),
            ))
    }

    fn validate(&self) -> Result<(), ::config::ConfigError> {
        self.logging
            .level
            .parse::<crate::logger::Level>()
            .map_err(::config::ConfigError::Message)?;
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(::config::ConfigError::Message(format!(
                "unknown log format: {} (expected text or json)",
                self.logging.format
            )));
        }
        if self.data.chunk_size == 0 {
            return Err(::config::ConfigError::Message(
                "data.chunk_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
