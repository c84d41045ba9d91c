//! Configuration management for the issue tracker server
//!
//! Settings are layered, lowest precedence first:
//! 1. Built-in defaults
//! 2. `ISSUETRACKER_*` environment variables
//! 3. An `issuetracker.yaml` file
//!
//! Command-line flags are applied on top by the CLI, which then calls
//! [`ServerConfig::validate`].

use crate::common::env_loader::EnvLoader;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "issuetracker.yaml";
const ENV_PREFIX: &str = "ISSUETRACKER";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATA_DIR: &str = "data/issues";
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file from disk
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        /// Path to the configuration file that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML content from a configuration file
    #[error("Invalid YAML syntax in {path}:\n{source}\n\nHint: Check for proper indentation and YAML formatting")]
    YamlParse {
        /// Path to the configuration file with invalid YAML content
        path: PathBuf,
        /// Underlying YAML parsing error
        #[source]
        source: serde_yaml::Error,
    },

    /// Invalid configuration value for a specific field
    #[error("Invalid configuration value for '{field}': {value}\n{hint}")]
    InvalidValue {
        /// Name of the configuration field that has an invalid value
        field: String,
        /// The invalid value that was provided
        value: String,
        /// Helpful hint about how to fix the issue
        hint: String,
    },
}

/// Which document store backs the issue collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Issues live in process memory and vanish on shutdown
    #[default]
    Memory,
    /// One JSON document per issue in `data_dir`
    Filesystem,
}

impl StorageBackend {
    /// The name used in config files, env vars and CLI flags
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Filesystem => "filesystem",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "filesystem" | "fs" | "file" => Ok(StorageBackend::Filesystem),
            other => Err(ConfigError::InvalidValue {
                field: "storage".to_string(),
                value: other.to_string(),
                hint: "storage must be one of: memory, filesystem".to_string(),
            }),
        }
    }
}

/// Settings for the HTTP server and its document store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    /// Interface to bind (default: 127.0.0.1)
    pub host: String,
    /// TCP port to bind; 0 picks an ephemeral port (default: 3000)
    pub port: u16,
    /// Storage backend (default: memory)
    pub storage: StorageBackend,
    /// Directory holding issue documents for the filesystem backend
    pub data_dir: PathBuf,
    /// Largest request body accepted, in bytes (default: 1 MiB)
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            storage: StorageBackend::Memory,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Load configuration from defaults, environment variables and YAML
    ///
    /// When `config_file` is given it must exist and parse. Otherwise the
    /// standard locations are searched and a broken discovered file is
    /// logged and skipped. The result is not validated; callers apply any
    /// overrides first and then call [`ServerConfig::validate`].
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_vars();

        let yaml = match config_file {
            Some(path) => Some(YamlConfig::load_from_file(path)?),
            None => match Self::find_yaml_config_file() {
                Some(path) => match YamlConfig::load_from_file(&path) {
                    Ok(yaml) => Some(yaml),
                    Err(e) => {
                        tracing::warn!(
                            "Failed to load YAML configuration, falling back to env vars and defaults: {}",
                            e
                        );
                        None
                    }
                },
                None => None,
            },
        };

        if let Some(yaml) = yaml {
            yaml.apply_to_config(&mut config);
        }

        Ok(config)
    }

    /// Apply `ISSUETRACKER_*` environment variables to this config
    fn apply_env_vars(&mut self) {
        let loader = EnvLoader::new(ENV_PREFIX);

        self.host = loader.load_string("HOST", &self.host);
        self.port = loader.load_parsed("PORT", self.port);
        self.storage = loader.load_parsed("STORAGE", self.storage);
        if let Some(dir) = loader.load_optional::<PathBuf>("DATA_DIR") {
            self.data_dir = dir;
        }
        self.max_body_bytes = loader.load_parsed("MAX_BODY_BYTES", self.max_body_bytes);
    }

    /// Find `issuetracker.yaml` in the standard locations
    ///
    /// Search order:
    /// 1. Current working directory
    /// 2. `~/.config/issuetracker/`
    /// 3. Home directory root
    pub fn find_yaml_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(CONFIG_FILE_NAME)];

        if let Some(home_dir) = dirs::home_dir() {
            search_paths.push(
                home_dir
                    .join(".config")
                    .join("issuetracker")
                    .join(CONFIG_FILE_NAME),
            );
            search_paths.push(home_dir.join(CONFIG_FILE_NAME));
        }

        for config_path in search_paths {
            if let Some(path) = Self::check_config_file(&config_path) {
                tracing::debug!("Found configuration file: {:?}", path);
                return Some(path);
            }
        }

        tracing::debug!("No {} configuration file found", CONFIG_FILE_NAME);
        None
    }

    /// Check if a configuration file exists and is readable
    pub fn check_config_file(config_path: &Path) -> Option<PathBuf> {
        match config_path.try_exists() {
            Ok(true) if config_path.is_file() => match std::fs::File::open(config_path) {
                Ok(_) => Some(config_path.to_path_buf()),
                Err(e) => {
                    tracing::warn!(
                        "Configuration file {:?} exists but cannot be read: {}",
                        config_path,
                        e
                    );
                    None
                }
            },
            Ok(true) => {
                tracing::debug!("Found {:?} but it is not a file", config_path);
                None
            }
            Ok(false) => None,
            Err(e) => {
                tracing::warn!(
                    "Error checking for configuration file {:?}: {}",
                    config_path,
                    e
                );
                None
            }
        }
    }

    /// Validate the current configuration settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "host".to_string(),
                value: self.host.clone(),
                hint: "host cannot be empty; use 127.0.0.1 or 0.0.0.0".to_string(),
            });
        }

        if self.storage == StorageBackend::Filesystem && self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "data_dir".to_string(),
                value: String::new(),
                hint: "data_dir is required when storage is 'filesystem'".to_string(),
            });
        }

        if self.max_body_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_body_bytes".to_string(),
                value: "0".to_string(),
                hint: "max_body_bytes must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// The `host:port` string handed to the TCP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Generate an example YAML configuration file content
    pub fn example_yaml_config() -> &'static str {
        r#"# issuetracker.yaml
# Configuration file for the issue tracker API server

# Interface and port to listen on
host: "127.0.0.1"
port: 3000

# Document store: "memory" or "filesystem"
storage: memory

# Directory for issue documents when storage is "filesystem"
data_dir: "data/issues"

# Largest accepted request body in bytes
max_body_bytes: 1048576
"#
    }
}

/// Configuration loaded from an `issuetracker.yaml` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct YamlConfig {
    /// Interface to bind
    pub host: Option<String>,
    /// TCP port to bind
    pub port: Option<u16>,
    /// Storage backend
    pub storage: Option<StorageBackend>,
    /// Directory for the filesystem backend
    pub data_dir: Option<PathBuf>,
    /// Largest accepted request body
    pub max_body_bytes: Option<usize>,
}

impl YamlConfig {
    /// Apply YAML values to an existing config; YAML values win
    pub fn apply_to_config(&self, config: &mut ServerConfig) {
        if let Some(ref host) = self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(storage) = self.storage {
            config.storage = storage;
        }
        if let Some(ref data_dir) = self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(max_body_bytes) = self.max_body_bytes {
            config.max_body_bytes = max_body_bytes;
        }
    }

    /// Load YAML configuration from a file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::info!("Loading YAML configuration from: {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        // A file with nothing but comments is a valid, empty configuration
        let has_content = content.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        });
        if !has_content {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
