//! Application configuration from mindmark.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "mindmark.toml";

/// Environment variable overriding `backend.url`
pub const BACKEND_URL_ENV: &str = "MINDMARK_BACKEND_URL";

/// Environment variable overriding `backend.api_key`
pub const BACKEND_KEY_ENV: &str = "MINDMARK_BACKEND_KEY";

/// Shortest accepted save debounce
pub const MIN_DEBOUNCE_MS: u64 = 300;

/// Longest accepted save debounce
pub const MAX_DEBOUNCE_MS: u64 = 500;

/// Main configuration loaded from mindmark.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Hosted table backend
    pub backend: BackendConfig,

    /// Local fallback storage
    pub storage: StorageConfig,

    /// Editor behaviour
    pub editor: EditorConfig,

    /// Mindmap graph geometry
    pub layout: LayoutConfig,

    /// Rendered preview options
    pub preview: PreviewConfig,

    /// PIN gate and inactivity timeout
    pub session: SessionConfig,
}

/// Connection details for the hosted table backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend project (e.g. `https://xyz.example.co`)
    pub url: Option<String>,

    /// Anonymous API key sent with every request
    pub api_key: Option<String>,

    /// Table holding the documents
    pub table: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            table: "mindmaps".to_string(),
            timeout_secs: 10,
        }
    }
}

impl BackendConfig {
    /// The backend is usable only when both the URL and the key are set
    pub fn is_configured(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        present(&self.url) && present(&self.api_key)
    }
}

/// Where the local fallback mapping lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file standing in for browser local storage
    pub local_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_path: PathBuf::from("mindmark-local.json"),
        }
    }
}

/// Editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period after the last edit before the document is saved
    pub debounce_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { debounce_ms: 400 }
    }
}

impl EditorConfig {
    /// Debounce delay, clamped into the supported window
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS))
    }
}

/// Geometry of the mindmap graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Distance between sibling centres
    pub horizontal_spacing: f64,
    /// Distance between a parent row and its children
    pub vertical_spacing: f64,
    pub node_width: f64,
    pub node_height: f64,
    /// Horizontal centre of the first row
    pub origin_x: f64,
    /// Vertical position of the (undrawn) root
    pub origin_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_spacing: 250.0,
            vertical_spacing: 100.0,
            node_width: 180.0,
            node_height: 50.0,
            origin_x: 400.0,
            origin_y: 50.0,
        }
    }
}

/// Preview rendering options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Prepend a generated table of contents
    pub table_of_contents: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            table_of_contents: true,
        }
    }
}

/// Access gate settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Six-digit access code; the gate is open when unset
    pub pin: Option<String>,
    /// Minutes without activity before the session ends
    pub inactivity_minutes: u64,
    /// Minutes before the end at which a warning is raised
    pub warning_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pin: None,
            inactivity_minutes: 15,
            warning_minutes: 2,
        }
    }
}

impl SessionConfig {
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_minutes * 60)
    }

    /// Warning lead time, never longer than the timeout itself
    pub fn warning_lead(&self) -> Duration {
        Duration::from_secs(self.warning_minutes.min(self.inactivity_minutes) * 60)
    }
}

impl AppConfig {
    /// Load configuration from a mindmark.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - Successfully loaded configuration
    /// * `Err(ConfigError)` - Error reading or parsing the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file when it exists, otherwise fall back to defaults
    ///
    /// Backend environment overrides are applied in both cases.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = if path.as_ref().exists() {
            Self::load(&path)?
        } else {
            log::info!(
                "No configuration at {}, using defaults",
                path.as_ref().display()
            );
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Save configuration to a mindmark.toml file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Replace backend settings from environment lookups
    ///
    /// # Parameters
    /// * `lookup` - Returns the value of an environment variable, if set
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV) {
            self.backend.url = Some(url);
        }
        if let Some(key) = lookup(BACKEND_KEY_ENV) {
            self.backend.api_key = Some(key);
        }
    }
}

/// Errors that can occur when loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    SerializeError(#[from] toml::ser::Error),
}
