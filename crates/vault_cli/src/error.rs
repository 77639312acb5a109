//! Structured CLI error type.

use std::fmt::{self, Display, Formatter};
use std::path::Path;

use vault_host::{CatalogError, ConfigError, CONFIG_ENV_VAR};

/// Coarse failure categories shown to the user.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CliErrorCategory {
    /// Invalid or unreadable configuration.
    Config,
    /// Bad arguments or a request that cannot be satisfied.
    Validation,
    /// The catalog or one of its stores failed.
    Storage,
    /// Local filesystem failure outside the stores.
    Io,
}

impl CliErrorCategory {
    /// Lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Validation => "validation",
            Self::Storage => "storage",
            Self::Io => "io",
        }
    }
}

/// CLI error with optional target and remediation hint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CliError {
    /// High-level category.
    pub category: CliErrorCategory,
    /// Human-readable message.
    pub message: String,
    /// Optional path target.
    pub target: Option<String>,
    /// Optional remediation hint.
    pub hint: Option<String>,
}

/// Result alias for CLI internals.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Creates an error with the given category and message.
    pub fn new(category: CliErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            target: None,
            hint: None,
        }
    }

    /// Configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(CliErrorCategory::Config, message)
    }

    /// Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(CliErrorCategory::Validation, message)
    }

    /// Storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(CliErrorCategory::Storage, message)
    }

    /// IO error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(CliErrorCategory::Io, message)
    }

    /// Attaches a target path.
    pub fn with_path(mut self, path: &Path) -> Self {
        self.target = Some(path.display().to_string());
        self
    }

    /// Attaches a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(target) = &self.target {
            write!(f, " [target: {target}]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " [hint: {hint}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        CliError::io(value.to_string())
    }
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        CliError::validation(value)
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        CliError::config(value.to_string()).with_hint(format!(
            "check the file named by `--config` or ${CONFIG_ENV_VAR}"
        ))
    }
}

impl From<CatalogError> for CliError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::NotFound(_) => CliError::validation(value.to_string())
                .with_hint("run `grvault list` to see record ids"),
            CatalogError::EmptyName => CliError::validation(value.to_string()),
            CatalogError::Store(_) | CatalogError::Blob(_) => CliError::storage(value.to_string()),
            CatalogError::SerialExhausted => CliError::storage(value.to_string())
                .with_hint("GR ordinals stop at 4294967295"),
        }
    }
}
