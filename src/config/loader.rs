// src/config/loader.rs
//! Layered configuration loader
//!
//! Sources are merged in increasing precedence: built-in defaults, every
//! existing file from the search path, then `SPIKE_`-prefixed environment
//! variables. The merged document is validated before it is deserialized.

use crate::config::{constants::paths, schema_validator::SchemaValidator, SystemConfig, ValidationError};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Configuration loading errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration validation errors: {}", format_validation(.0))]
    ValidationError(Vec<ValidationError>),

    #[error("IO error: {0}")]
    IoError(String),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("\n  {}", e))
        .collect()
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Configuration loader
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    schema_validator: SchemaValidator,
    current_config: Arc<RwLock<SystemConfig>>,
}

impl ConfigLoader {
    /// Create a loader over the standard search path
    pub fn new() -> Self {
        Self::with_paths(Self::discover_config_paths())
    }

    /// Create loader with custom paths
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            schema_validator: SchemaValidator::new(),
            current_config: Arc::new(RwLock::new(SystemConfig::default())),
        }
    }

    /// Append an explicit file. It takes precedence over the search path and
    /// must exist.
    pub fn with_explicit_file<P: Into<PathBuf>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        self.config_paths.push(path);
        Ok(self)
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load system configuration with validation
    pub fn load_system_config(&mut self) -> Result<SystemConfig, ConfigError> {
        let config = self.load_and_merge_configs()?;
        *self.current_config.write() = config.clone();
        Ok(config)
    }

    /// Last successfully loaded configuration, defaults before the first load
    pub fn get_current_config(&self) -> SystemConfig {
        self.current_config.read().clone()
    }

    /// Parse and validate a single TOML document on top of the defaults
    pub fn from_toml_str(content: &str) -> Result<SystemConfig, ConfigError> {
        let value: toml::Value = toml::from_str(content)?;
        SchemaValidator::new()
            .validate_config(&value)
            .map_err(ConfigError::ValidationError)?;
        value
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))
    }

    /// Validate configuration without loading
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let value = self.load_config_file(path)?;
        self.schema_validator
            .validate_config(&value)
            .map_err(ConfigError::ValidationError)
    }

    /// Export current configuration to file
    pub fn export_config<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let config = self.get_current_config();
        let toml_content =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn load_and_merge_configs(&self) -> Result<SystemConfig, ConfigError> {
        let mut merged = toml::Value::try_from(SystemConfig::default())
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        for config_path in &self.config_paths {
            match self.load_config_file(config_path) {
                Ok(file_config) => {
                    debug!(path = %config_path.display(), "merging configuration file");
                    merge_toml_values(&mut merged, file_config);
                }
                // Search path entries are optional
                Err(ConfigError::FileNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        apply_environment_overrides(&mut merged, std::env::vars(), &self.schema_validator);

        self.schema_validator
            .validate_config(&merged)
            .map_err(ConfigError::ValidationError)?;

        merged.try_into().map_err(|e: toml::de::Error| {
            ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
        })
    }

    fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<toml::Value, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(paths::SYSTEM_CONFIG_PATH)];

        if let Some(home_dir) = home_dir() {
            paths.push(home_dir.join(paths::USER_CONFIG_DIR).join("config.toml"));
        }

        paths.push(PathBuf::from(paths::DEFAULT_CONFIG_FILE));
        paths.push(PathBuf::from(paths::LOCAL_CONFIG_FILE));

        paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("USERPROFILE").map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("HOME").map(PathBuf::from)
    }
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(base_value) => merge_toml_values(base_value, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

/// `SPIKE_SERIAL_READ_TIMEOUT_MS=20` sets `serial.read_timeout_ms`. The first
/// underscore after the prefix separates section from key. Fields the schema
/// declares as strings keep the raw value.
fn apply_environment_overrides<I>(config: &mut toml::Value, vars: I, schema: &SchemaValidator)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(paths::ENV_PREFIX) else {
            continue;
        };
        let rest = rest.to_lowercase();
        let Some((section, field)) = rest.split_once('_') else {
            continue;
        };

        if let toml::Value::Table(root) = config {
            let table = root
                .entry(section.to_string())
                .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
            if let toml::Value::Table(table) = table {
                debug!(section, field, "applying environment override");
                let value = if schema.expects_string(&format!("{}.{}", section, field)) {
                    toml::Value::String(value)
                } else {
                    parse_env_value(&value)
                };
                table.insert(field.to_string(), value);
            }
        }
    }
}

fn parse_env_value(value: &str) -> toml::Value {
    if let Ok(int_val) = value.parse::<i64>() {
        toml::Value::Integer(int_val)
    } else if let Ok(bool_val) = value.parse::<bool>() {
        toml::Value::Boolean(bool_val)
    } else {
        toml::Value::String(value.to_string())
    }
}
