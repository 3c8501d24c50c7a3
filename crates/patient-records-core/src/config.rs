//! Configuration loaded from TOML.
//!
//! ```toml
//! [storage]
//! backend = "sqlite"
//! path = "/var/lib/patients/patients.db"
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Every section is optional; the defaults store patients in
//! `patients.json` and log at `info`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{JsonFileStore, MemoryStore, RecordStore, SqliteStore, StoreResult};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Which backend holds the collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    Json { path: PathBuf },
    Sqlite { path: PathBuf },
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Json {
            path: PathBuf::from("patients.json"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `patient_records_core=debug`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RecordsConfig {
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from file
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

impl StorageConfig {
    /// Backing file, if the backend has one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            StorageConfig::Json { path } | StorageConfig::Sqlite { path } => Some(path),
            StorageConfig::Memory => None,
        }
    }

    /// Open the configured backend.
    pub fn open_store(&self) -> StoreResult<Box<dyn RecordStore>> {
        Ok(match self {
            StorageConfig::Json { path } => Box::new(JsonFileStore::open(path)?),
            StorageConfig::Sqlite { path } => Box::new(SqliteStore::open(path)?),
            StorageConfig::Memory => Box::new(MemoryStore::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RecordsConfig::from_toml_str("").unwrap();
        assert_eq!(config, RecordsConfig::default());
        assert_eq!(
            config.storage,
            StorageConfig::Json {
                path: PathBuf::from("patients.json")
            }
        );
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_sqlite_backend() {
        let config = RecordsConfig::from_toml_str(
            r#"
            [storage]
            backend = "sqlite"
            path = "data/patients.db"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.storage,
            StorageConfig::Sqlite {
                path: PathBuf::from("data/patients.db")
            }
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.storage.path(), Some(Path::new("data/patients.db")));
    }

    #[test]
    fn test_memory_backend_opens() {
        let config = RecordsConfig::from_toml_str("[storage]\nbackend = \"memory\"\n").unwrap();
        let store = config.storage.open_store().unwrap();
        assert!(store.load_all().unwrap().is_empty());
        assert!(config.storage.path().is_none());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let result = RecordsConfig::from_toml_str("[storage]\nbackend = \"postgres\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = RecordsConfig::load(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_from_file_opens_json_store() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("patients.json");
        let config_path = dir.path().join("records.toml");
        fs::write(
            &config_path,
            format!("[storage]\nbackend = \"json\"\npath = {:?}\n", data.display().to_string()),
        )
        .unwrap();

        let config = RecordsConfig::load(&config_path).unwrap();
        let store = config.storage.open_store().unwrap();
        assert!(store.load_all().unwrap().is_empty());
        assert!(data.exists());
    }
}
