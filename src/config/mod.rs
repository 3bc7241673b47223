//! Server configuration: CLI flags layered over `hotserve.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section    # [serve] and [log]
//! ├── error      # ConfigError
//! ├── util       # config file lookup, name checks
//! └── mod.rs     # Config (this file)
//! ```
//!
//! Precedence: CLI flag > config file > built-in default. A missing config
//! file is not an error.

mod error;
mod section;
mod util;

pub use error::ConfigError;
pub use section::{LogConfig, ServeConfig};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::Cli;
use crate::logger;
use util::{find_config_file, is_plain_file_name};

/// Root configuration structure representing hotserve.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Config file that was loaded, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Served directory as given on the command line (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Development server settings
    pub serve: ServeConfig,

    /// Logging settings
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from CLI arguments.
    ///
    /// The config file is searched upward from the working directory.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(PathBuf::from("."), e))?;

        let mut config = match find_config_file(&cwd, &cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = Some(path);
                config
            }
            None => Self::default(),
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;

        if !ignored.is_empty() {
            logger::warn(
                "config",
                &format!("ignoring unknown fields in {}: {}", path.display(), ignored.join(", ")),
            );
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), toml::de::Error> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Override file values with the flags that were given.
    fn apply_cli(&mut self, cli: &Cli) {
        self.root = cli.root.clone();

        if let Some(interface) = cli.interface {
            self.serve.interface = interface;
        }
        if let Some(port) = cli.port {
            self.serve.port = port;
        }
        if let Some(index) = &cli.index {
            self.serve.index = index.clone();
        }
        if let Some(workers) = cli.workers {
            self.serve.workers = workers;
        }
        if cli.no_watch {
            self.serve.watch = false;
        }
        if cli.verbose {
            self.log.verbose = true;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.root.is_dir() {
            return Err(ConfigError::Validation(format!(
                "served root `{}` is not a directory",
                self.root.display()
            )));
        }
        if !is_plain_file_name(&self.serve.index) {
            return Err(ConfigError::Validation(format!(
                "serve.index `{}` must be a plain file name",
                self.serve.index
            )));
        }
        if self.serve.workers == 0 {
            return Err(ConfigError::Validation(
                "serve.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a config string in tests, panicking on error.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> Config {
    toml::from_str(content).unwrap()
}
