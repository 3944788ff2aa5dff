//! Configuration snapshot providers.
//!
//! The scheduler asks its [`ConfigProvider`] for a fresh [`MonitorConfig`]
//! at every cycle boundary. [`SettingsFile`] re-reads a JSON settings file
//! each time, so edits made by the settings dialog apply at the next cycle.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use sitewatch_core::config::MonitorConfig;
use sitewatch_core::error::CoreError;

/// Default settings file location.
const DEFAULT_SETTINGS_PATH: &str = "settings.json";

/// Error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Invalid(#[from] CoreError),
}

/// Supplies a configuration snapshot at the start of each cycle.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    async fn snapshot(&self) -> Result<MonitorConfig, ConfigError>;
}

/// A fixed snapshot.
#[async_trait]
impl ConfigProvider for MonitorConfig {
    async fn snapshot(&self) -> Result<MonitorConfig, ConfigError> {
        let config = self.clone().normalized();
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// SettingsFile
// ---------------------------------------------------------------------------

/// JSON settings file, re-read for every snapshot.
///
/// A missing file yields the built-in defaults.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Locate the settings file from the environment.
    ///
    /// | Variable             | Required | Default         |
    /// |----------------------|----------|-----------------|
    /// | `SITEWATCH_SETTINGS` | no       | `settings.json` |
    pub fn from_env() -> Self {
        let path = std::env::var("SITEWATCH_SETTINGS")
            .unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse settings text into a validated snapshot.
    pub fn parse(&self, text: &str) -> Result<MonitorConfig, ConfigError> {
        let config: MonitorConfig =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }
}

#[async_trait]
impl ConfigProvider for SettingsFile {
    async fn snapshot(&self) -> Result<MonitorConfig, ConfigError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => self.parse(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No settings file, using defaults");
                Ok(MonitorConfig::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
