//! Configuration handling for spl-gui
//!
//! This file defines the configuration structure and provides
//! functionality to load and save configuration from/to files.
//! Every field has a default, so a partial file is fine.

use crate::error::Result;
use crate::font::{FixedMetrics, Font, FontMetrics, FontStyle, FontdueMetrics};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Default sizing and behavior for new text areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextAreaConfig {
    pub rows: u32,
    pub columns: u32,
    pub line_wrap: bool,
}

impl Default for TextAreaConfig {
    fn default() -> Self {
        Self {
            rows: 10,
            columns: 40,
            line_wrap: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub family: String,
    pub size: f32,
    /// TTF/OTF file used for text metrics; built-in estimates when unset.
    pub path: Option<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "Monospaced".to_string(),
            size: 12.0,
            path: None,
        }
    }
}

impl FontConfig {
    pub fn font(&self) -> Font {
        Font {
            family: self.family.clone(),
            style: FontStyle::Plain,
            size: self.size,
        }
    }

    /// Metrics for the configured font, falling back to estimates if the
    /// font file cannot be used.
    pub fn metrics(&self) -> Box<dyn FontMetrics + Send> {
        if let Some(path) = &self.path {
            match FontdueMetrics::from_file(path, self.size) {
                Ok(metrics) => return Box::new(metrics),
                Err(e) => warn!("Failed to load font {}: {}", path.display(), e),
            }
        }
        Box::new(FixedMetrics::for_size(self.size))
    }
}

/// Configuration for the GUI runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiConfig {
    /// env_logger filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    pub worker_thread_name: String,
    /// Stop the event loop as soon as the worker's main returns.
    pub exit_on_worker_finish: bool,
    /// Upper bound on how long the event loop sleeps between wakeups.
    pub loop_timeout_ms: u64,
    pub text_area: TextAreaConfig,
    pub font: FontConfig,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            worker_thread_name: "student".to_string(),
            exit_on_worker_finish: true,
            loop_timeout_ms: 100,
            text_area: TextAreaConfig::default(),
            font: FontConfig::default(),
        }
    }
}

impl GuiConfig {
    /// Get the path to the configuration file
    pub fn get_config_path() -> PathBuf {
        let config_dir = if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("spl-gui")
        } else {
            PathBuf::from(".config/spl-gui")
        };

        config_dir.join("config.toml")
    }

    /// Load configuration from the default location, creating it if missing
    pub fn load_from_file() -> Result<Self> {
        Self::load_from_path(&Self::get_config_path())
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        match fs::read_to_string(config_path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // If the file doesn't exist, create it with default values
                let default_config = Self::default();
                default_config.save_to_path(config_path)?;
                Ok(default_config)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to the default location
    pub fn save_to_file(&self) -> Result<()> {
        self.save_to_path(&Self::get_config_path())
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        // Create the directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() && !Path::exists(parent) {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        Ok(())
    }
}
