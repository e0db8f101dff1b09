//! `fundraise.toml` settings and how they combine with command-line flags.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use fund_core::ApiConfig;
use fund_core::api::factory::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS};

/// Settings file read from the working directory when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "fundraise.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read settings file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Values from the settings file. Anything left out falls back to the
/// built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub backend: Option<String>,
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout_ms: Option<u64>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

/// Values given on the command line (or through their environment
/// variables). Set values win over the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub backend: Option<String>,
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    /// `RUST_LOG` is set. It beats a `log_level` from the file but not
    /// `--log-level`.
    pub env_log_filter: bool,
}

impl Settings {
    pub fn from_toml_str(
        path: &Path,
        text: &str,
    ) -> Result<Self, SettingsError> {
        toml::from_str(text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `explicit` if given (it must exist), otherwise
    /// [`DEFAULT_SETTINGS_FILE`] if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let path = explicit.unwrap_or(Path::new(DEFAULT_SETTINGS_FILE));
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return match explicit {
                    Some(path) => Err(SettingsError::NotFound(path.to_path_buf())),
                    None => {
                        debug!("no {DEFAULT_SETTINGS_FILE}, using defaults");
                        Ok(Self::default())
                    }
                };
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        debug!(path = %path.display(), "loaded settings");
        Self::from_toml_str(path, &text)
    }

    /// Layers command-line values over the file.
    pub fn merge(
        self,
        overrides: Overrides,
    ) -> Self {
        Self {
            backend: overrides.backend.or(self.backend),
            base_url: overrides.base_url.or(self.base_url),
            token: overrides.token.or(self.token),
            timeout_ms: self.timeout_ms,
            log_level: overrides
                .log_level
                .or(self.log_level.filter(|_| !overrides.env_log_filter)),
            log_file: overrides.log_file.or(self.log_file),
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        let token = self
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        ApiConfig {
            backend: self.backend.clone().unwrap_or_else(|| "http".to_string()),
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token,
            timeout_ms: self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        }
    }
}
