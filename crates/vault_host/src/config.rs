//! Typed TOML configuration.

use std::{
    fs,
    marker::PhantomData,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::records::{SerialPolicy, SortOrder, DEFAULT_RECORDS_KEY};

/// Default config file name looked up next to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "grvault.toml";
/// Environment variable overriding the config path.
pub const CONFIG_ENV_VAR: &str = "GRVAULT_CONFIG";

#[derive(Debug, Error)]
/// Configuration failures.
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Config path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for the target type.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Config path, or `<inline>` for string input.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
    /// A value parsed but is not acceptable.
    #[error("invalid config value `{key}`: {message}")]
    Invalid {
        /// Dotted key.
        key: &'static str,
        /// Reason.
        message: String,
    },
}

/// Generic TOML-backed config loader.
///
/// Handles filesystem access and deserialization only; callers validate the typed value.
#[derive(Clone, Debug)]
pub struct ConfigLoader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> ConfigLoader<T>
where
    T: DeserializeOwned,
{
    /// Creates a loader for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// Loads and deserializes the file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(&self) -> Result<T, ConfigError> {
        let body = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        toml::from_str(&body).map_err(|err| ConfigError::Parse {
            path: self.path.clone(),
            message: err.to_string(),
        })
    }

    /// Loads the file, or returns `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns read errors other than "not found", and parse errors.
    pub fn load_optional(&self) -> Result<Option<T>, ConfigError> {
        if !self.path.exists() {
            return Ok(None);
        }
        self.load().map(Some)
    }

    /// Config path on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
/// Where records and bytes are persisted.
pub enum StorageBackend {
    /// Files under a data directory.
    #[default]
    Device,
    /// `window.localStorage`.
    Browser,
    /// Process memory.
    Memory,
}

impl StorageBackend {
    /// Stable lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Browser => "browser",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "device" => Ok(Self::Device),
            "browser" => Ok(Self::Browser),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "unknown storage backend `{other}` (expected device, browser or memory)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// `[storage]` section.
pub struct StorageConfig {
    /// Persistence backend.
    pub backend: StorageBackend,
    /// Directory holding one JSON file per key.
    pub data_dir: PathBuf,
    /// Record list key for the single-user device variant.
    pub metadata_key: String,
    /// Directory receiving uploaded bytes.
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Device,
            data_dir: PathBuf::from(".grvault/data"),
            metadata_key: DEFAULT_RECORDS_KEY.to_string(),
            upload_dir: PathBuf::from(".grvault/uploads"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// `[accounts]` section.
pub struct AccountsConfig {
    /// Seeds `Welcome.txt` into new accounts.
    pub seed_welcome_record: bool,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            seed_welcome_record: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
/// `[view]` section.
pub struct ViewConfig {
    /// Initial listing order.
    pub default_sort: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Top-level configuration. Every field has a default, so an empty file is valid.
pub struct VaultConfig {
    /// Persistence settings.
    pub storage: StorageConfig,
    /// Serial number formatting.
    pub serial: SerialPolicy,
    /// Account behavior.
    pub accounts: AccountsConfig,
    /// Listing defaults.
    pub view: ViewConfig,
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            serial: SerialPolicy::default(),
            accounts: AccountsConfig::default(),
            view: ViewConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

impl VaultConfig {
    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_toml_str(body: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(body).map_err(|err| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise returns defaults.
    ///
    /// # Errors
    ///
    /// Returns read, parse and validation errors.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        let config = ConfigLoader::<Self>::new(path)
            .load_optional()?
            .unwrap_or_else(|| {
                log::debug!("no config at {}, using defaults", path.display());
                Self::default()
            });
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = self.serial.prefix.trim();
        if prefix.is_empty() || !prefix.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(ConfigError::Invalid {
                key: "serial.prefix",
                message: format!("`{prefix}` must be one or more ASCII letters"),
            });
        }
        if !(1..=12).contains(&self.serial.width) {
            return Err(ConfigError::Invalid {
                key: "serial.width",
                message: format!("{} is outside 1..=12", self.serial.width),
            });
        }
        if self.storage.metadata_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "storage.metadata_key",
                message: "must not be empty".to_string(),
            });
        }
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid {
                key: "log_level",
                message: format!("`{}` is not one of {}", self.log_level, LOG_LEVELS.join(", ")),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use pretty_assertions::assert_eq;

    use super::*;

    fn unique_test_root() -> PathBuf {
        std::env::temp_dir().join(format!(
            "vault-config-test-{}-{}",
            std::process::id(),
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("time")
                .as_nanos()
        ))
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config = VaultConfig::from_toml_str("").expect("parse");
        assert_eq!(config, VaultConfig::default());
        assert_eq!(config.storage.metadata_key, "uploaded_files_metadata");
        assert_eq!(config.serial.prefix, "GR");
        assert_eq!(config.view.default_sort, SortOrder::Newest);
    }

    #[test]
    fn sections_override_individual_fields() {
        let config = VaultConfig::from_toml_str(
            r#"
log_level = "debug"

[storage]
backend = "memory"
upload_dir = "/srv/uploads"

[serial]
width = 6
timestamp_suffix = false

[accounts]
seed_welcome_record = false

[view]
default_sort = "size"
"#,
        )
        .expect("parse");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.upload_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(config.storage.data_dir, PathBuf::from(".grvault/data"));
        assert_eq!(config.serial.format(3, 0).as_str(), "GR-000003");
        assert!(!config.accounts.seed_welcome_record);
        assert_eq!(config.view.default_sort, SortOrder::Size);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn rejects_bad_values() {
        let err = VaultConfig::from_toml_str("[serial]\nprefix = \"G-R\"").expect_err("prefix");
        assert!(err.to_string().contains("serial.prefix"), "{err}");

        let err = VaultConfig::from_toml_str("log_level = \"loud\"").expect_err("level");
        assert!(err.to_string().contains("log_level"), "{err}");

        let err = VaultConfig::from_toml_str("[storage]\nbackend = \"cloud\"").expect_err("backend");
        assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
    }

    #[test]
    fn loader_reads_files_and_treats_missing_as_default() {
        let root = unique_test_root();
        fs::create_dir_all(&root).expect("create root");

        let missing = root.join("missing.toml");
        assert_eq!(
            VaultConfig::load_or_default(&missing).expect("defaults"),
            VaultConfig::default()
        );
        let err = ConfigLoader::<VaultConfig>::new(&missing)
            .load()
            .expect_err("missing file");
        assert!(err.to_string().contains("missing.toml"), "{err}");

        let path = root.join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[storage]\nmetadata_key = \"vault\"\n").expect("write");
        let config = VaultConfig::load_or_default(&path).expect("load");
        assert_eq!(config.storage.metadata_key, "vault");

        fs::write(&path, "storage = [").expect("write broken");
        let err = VaultConfig::load_or_default(&path).expect_err("broken");
        assert!(err.to_string().contains(DEFAULT_CONFIG_FILE), "{err}");

        let _ = fs::remove_dir_all(root);
    }
}
