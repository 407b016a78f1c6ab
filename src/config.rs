//! TOML-based configuration system.
//!
//! Loads settings from a `config.toml` file, falling back to defaults. Every
//! struct implements `Default` and is `#[serde(default)]`, so a missing or
//! partial file behaves like the defaults for whatever it leaves out.
//!
//! ## Config file search order
//!
//! 1. `OMWEB_CONFIG` environment variable (explicit override)
//! 2. Next to the executable (`<exe_dir>/config.toml`)
//! 3. Platform config directory (`%APPDATA%\OMWeb\config.toml` on Windows,
//!    `$XDG_CONFIG_HOME/omweb/config.toml` elsewhere)
//! 4. Current working directory (`./config.toml`)
//! 5. No file found → `Config::default()`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::intent::{DEFAULT_SEARCH_ENDPOINT, SearchEngine};

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "OMWEB_CONFIG";

// ─────────────────────────────────────────────────────────────────────────────
// Config structs
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub window: WindowConfig,
    pub search: SearchConfig,
    pub servo: ServoConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Page loaded when no URL is given on the command line.
    pub default_url: String,
    /// Prefix of the window title; the address bar line follows it.
    pub window_title: String,
}

/// Window dimensions (logical pixels).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

/// Search engine used when address bar input is not a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// URL prefix; the percent-encoded query is appended to it.
    pub engine_url: String,
}

/// Servo engine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    /// Maximum layout threads. 0 = auto-detect from CPU count.
    pub layout_threads: i64,
    /// HTTP cache size.
    pub cache_size: i64,
    /// User-agent string. Empty = Servo's default.
    pub user_agent: String,
    /// Pre-cache GPU shaders at startup.
    pub precache_shaders: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_url: "https://example.com".to_string(),
            window_title: "OMWeb".to_string(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engine_url: DEFAULT_SEARCH_ENDPOINT.to_string(),
        }
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            layout_threads: 0,
            cache_size: 50_000,
            user_agent: String::new(),
            precache_shaders: true,
        }
    }
}

impl SearchConfig {
    pub fn engine(&self) -> SearchEngine {
        SearchEngine::new(self.engine_url.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config loading and saving
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Loads configuration from the first config file found. Never fails:
    /// returns defaults if no file is found or if parsing fails.
    pub fn load() -> Self {
        match find_config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                info!("No config file found, using defaults");
                Config::default()
            }
        }
    }

    /// Loads `path`, falling back to defaults on read or parse errors.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "Configuration loaded");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                    Config::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read config, using defaults");
                Config::default()
            }
        }
    }

    /// Saves configuration to the platform config directory and returns the
    /// path written. Creates the directory if it doesn't exist.
    pub fn save(&self) -> io::Result<PathBuf> {
        let path = save_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, content)?;
        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }
}

/// Searches for a config file in the standard locations.
fn find_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let p = PathBuf::from(path);
        if p.is_file() {
            return Some(p);
        }
        warn!(path = %p.display(), "{CONFIG_ENV_VAR} does not point at a file, ignoring");
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let p = dir.join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    if let Some(dir) = platform_config_dir() {
        let p = dir.join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    let p = PathBuf::from("config.toml");
    if p.is_file() {
        return Some(p);
    }

    None
}

/// Returns the platform-specific save path for the config file.
fn save_path() -> PathBuf {
    platform_config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join("OMWeb"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .or_else(|| std::env::var("HOME").ok().map(|h| format!("{h}/.config")))
            .map(|dir| PathBuf::from(dir).join("omweb"))
    }
}
