//! Configuration management

use clap::Parser;
use config::{Config as ConfigBuilder, ConfigError as BuilderError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),

    #[error("Invalid database configuration: {0}")]
    InvalidDatabase(String),

    #[error("Invalid logging configuration: {0}")]
    InvalidLogging(String),

    #[error("Invalid import configuration: {0}")]
    InvalidImport(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

impl From<BuilderError> for ConfigError {
    fn from(err: BuilderError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub import: ImportConfig,
}

impl Config {
    /// Load configuration with precedence: CLI args > Environment variables > Config file > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        Self::load_with_args(cli_args)
    }

    fn load_with_args(cli_args: CliArgs) -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?;

        // Load from config file if specified (medium priority)
        if let Some(config_path) = &cli_args.config {
            if !config_path.exists() {
                return Err(ConfigError::FileNotFound(
                    config_path.display().to_string(),
                ));
            }
            builder = builder.add_source(File::from(config_path.as_path()));
        }

        // Override with environment variables (higher priority).
        // Variables are prefixed with LIBRETTO_ and use __ for nesting,
        // e.g. LIBRETTO_SERVER__PORT=8080
        builder = builder.add_source(
            Environment::with_prefix("LIBRETTO")
                .separator("__")
                .try_parsing(true),
        );

        // Override with CLI arguments (highest priority)
        if let Some(host) = &cli_args.host {
            builder = builder.set_override("server.host", host.clone())?;
        }
        if let Some(port) = cli_args.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(db_path) = &cli_args.database {
            builder = builder.set_override("database.path", db_path.display().to_string())?;
        }
        if let Some(log_level) = &cli_args.log_level {
            builder = builder.set_override("logging.level", log_level.clone())?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let config: Config = Self::defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Build the default configuration values (lowest priority)
    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let builder = ConfigBuilder::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.allowed_origins", vec!["*"])?
            .set_default("database.path", "./data/libretto.db")?
            .set_default("database.connection_pool_size", 10)?
            .set_default("database.busy_timeout", 5000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("logging.output", "stdout")?
            .set_default(
                "import.base_url",
                "https://frappe.io/api/method/frappe-library",
            )?
            .set_default("import.request_timeout", 30)?;
        Ok(builder)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logging.validate()?;
        self.import.validate()?;
        Ok(())
    }
}

/// Command-line arguments for configuration override
#[derive(Debug, Parser)]
#[command(name = "libretto")]
#[command(about = "Libretto Library Backend Server", long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Server host address
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database file path
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidServer("host cannot be empty".into()));
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidServer("port cannot be 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub connection_pool_size: usize,
    /// Busy timeout in milliseconds
    pub busy_timeout: u64,
}

impl DatabaseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.connection_pool_size == 0 {
            return Err(ConfigError::InvalidDatabase(
                "connection_pool_size must be at least 1".into(),
            ));
        }
        if self.busy_timeout == 0 {
            return Err(ConfigError::InvalidDatabase(
                "busy_timeout must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// "json" or "text"
    pub format: String,
    /// "stdout" or "file"
    pub output: String,
    /// Log file path, required when output is "file"
    pub log_file: Option<PathBuf>,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.level.as_str() {
            "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::InvalidLogging(format!(
                    "unknown log level: {}",
                    other
                )))
            }
        }
        match self.format.as_str() {
            "json" | "text" => {}
            other => {
                return Err(ConfigError::InvalidLogging(format!(
                    "unknown log format: {}",
                    other
                )))
            }
        }
        match self.output.as_str() {
            "stdout" => {}
            "file" => {
                if self.log_file.is_none() {
                    return Err(ConfigError::InvalidLogging(
                        "log_file must be set when output is 'file'".into(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::InvalidLogging(format!(
                    "unknown log output: {}",
                    other
                )))
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Base URL of the external book catalog API
    pub base_url: String,
    /// Upstream request timeout in seconds
    pub request_timeout: u64,
}

impl ImportConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidImport(
                "base_url cannot be empty".into(),
            ));
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidImport(
                "request_timeout must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> Config {
        Config::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = default_config();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.connection_pool_size, 10);
        assert_eq!(config.logging.level, "info");
        assert!(config.import.base_url.starts_with("https://"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = default_config();
        config.logging.level = "verbose".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLogging(_))
        ));
    }

    #[test]
    fn test_file_output_requires_log_file() {
        let mut config = default_config();
        config.logging.output = "file".into();
        config.logging.log_file = None;
        assert!(config.validate().is_err());

        config.logging.log_file = Some(PathBuf::from("./logs/libretto.log"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let mut config = default_config();
        config.database.connection_pool_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDatabase(_))
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::from_file(Path::new("/nonexistent/libretto.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
