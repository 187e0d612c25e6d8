//! Configuration management for shellbridge.
//!
//! Handles persistence and loading of the server address, terminal behaviour
//! and dialog layout.

pub mod provider;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::protocol::Endpoint;
use crate::session::BridgeOptions;
use crate::surface::vt::SCROLLBACK_LINES;

pub use provider::{FixedProvider, HttpConfigProvider, WorkingDirectoryProvider};

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub terminal: TerminalConfig,

    #[serde(default)]
    pub dialog: DialogConfig,
}

impl Config {
    /// Load configuration from disk, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, or return default if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate();

        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not find config directory")?;

        Ok(config_dir.join("shellbridge").join("config.json"))
    }

    /// Clamp every section to its valid range
    pub fn validate(&mut self) {
        self.terminal.validate();
        self.dialog.validate();
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            host: self.server.host.clone(),
            secure: self.server.secure,
            path: self.server.endpoint_path.clone(),
        }
    }

    pub fn bridge_options(&self) -> BridgeOptions {
        BridgeOptions {
            send_resize: self.terminal.send_resize,
            connect_timeout: self.terminal.connect_timeout_secs.map(Duration::from_secs),
            ..BridgeOptions::new(self.endpoint())
        }
    }
}

/// Where the terminal server lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host and optional port, e.g. `localhost:8000`
    #[serde(default = "default_host")]
    pub host: String,

    /// Use `wss`/`https` instead of `ws`/`http`
    #[serde(default)]
    pub secure: bool,

    #[serde(default = "default_endpoint_path")]
    pub endpoint_path: String,

    /// Path of the JSON document holding the working directory
    #[serde(default = "default_config_path")]
    pub config_path: String,

    /// Key under `paths` in that document
    #[serde(default = "default_working_directory_key")]
    pub working_directory_key: String,

    /// Used when the lookup fails
    #[serde(default = "default_working_directory")]
    pub default_working_directory: String,
}

fn default_host() -> String {
    "localhost:8000".to_string()
}

fn default_endpoint_path() -> String {
    "ws/shell".to_string()
}

fn default_config_path() -> String {
    "api/config".to_string()
}

fn default_working_directory_key() -> String {
    "playbooks".to_string()
}

fn default_working_directory() -> String {
    "/app/playbooks".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            secure: false,
            endpoint_path: default_endpoint_path(),
            config_path: default_config_path(),
            working_directory_key: default_working_directory_key(),
            default_working_directory: default_working_directory(),
        }
    }
}

/// Terminal session behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Scrollback lines kept per session (0-100000)
    #[serde(default = "default_scrollback")]
    pub scrollback_lines: usize,

    /// Tell the server about local resizes
    #[serde(default)]
    pub send_resize: bool,

    /// Seconds to wait for the socket to open. Unset waits forever.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

fn default_scrollback() -> usize {
    SCROLLBACK_LINES
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            scrollback_lines: SCROLLBACK_LINES,
            send_resize: false,
            connect_timeout_secs: None,
        }
    }
}

impl TerminalConfig {
    pub fn validate(&mut self) {
        self.scrollback_lines = self.scrollback_lines.min(100_000);
    }
}

/// Dialog layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogConfig {
    /// Dialog width as percentage of the screen (10-100%)
    #[serde(default = "default_dialog_pct")]
    pub width_pct: u8,

    /// Dialog height as percentage of the screen (10-100%)
    #[serde(default = "default_dialog_pct")]
    pub height_pct: u8,

    /// Whether the instructions panel starts expanded
    #[serde(default = "default_true")]
    pub show_instructions: bool,
}

fn default_dialog_pct() -> u8 {
    90
}

fn default_true() -> bool {
    true
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            width_pct: 90,
            height_pct: 90,
            show_instructions: true,
        }
    }
}

impl DialogConfig {
    /// Validate and clamp dialog size to valid range (10-100%)
    pub fn validate(&mut self) {
        self.width_pct = self.width_pct.clamp(10, 100);
        self.height_pct = self.height_pct.clamp(10, 100);
    }
}
