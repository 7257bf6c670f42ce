//! Configuration system
//!
//! Viewer settings can be stored as TOML or RON; the format follows the file
//! extension. Every field has a default, so a partial file is valid.

pub use serde::{Deserialize, Serialize};

use crate::input::Key;
use crate::window::Window;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match Format::of(path)? {
            Format::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Format::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match Format::of(path)? {
            Format::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

enum Format {
    Toml,
    Ron,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Window creation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Title bar text
    pub title: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Start with vsync on
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Model Viewer".to_string(),
            width: Window::DEFAULT_WIDTH,
            height: Window::DEFAULT_HEIGHT,
            vsync: true,
        }
    }
}

/// Key bindings for the viewer actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Controls {
    /// Show the next model
    pub next: Key,
    /// Show the previous model
    pub prev: Key,
    /// Flip vsync
    pub toggle_vsync: Key,
    /// Close the window
    pub quit: Key,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            next: Key::N,
            prev: Key::P,
            toggle_vsync: Key::V,
            quit: Key::Escape,
        }
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Window settings
    pub window: WindowConfig,
    /// Model files shown in order
    pub models: Vec<PathBuf>,
    /// Directories tried, in order, for relative model paths
    pub search_paths: Vec<PathBuf>,
    /// Key bindings
    pub controls: Controls,
}

impl Config for ViewerConfig {}

impl ViewerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.title.is_empty() {
            return Err(ConfigError::Invalid("window title cannot be empty".to_string()));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }

        let bindings = [
            self.controls.next,
            self.controls.prev,
            self.controls.toggle_vsync,
            self.controls.quit,
        ];
        let unique: HashSet<_> = bindings.iter().collect();
        if unique.len() != bindings.len() {
            return Err(ConfigError::Invalid("each control needs its own key".to_string()));
        }

        Ok(())
    }

    /// Locate a model file
    ///
    /// Relative paths are tried under each search path in order. Falls back to
    /// the path as given, so a missing file surfaces as a load error later.
    pub fn resolve_model(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            for dir in &self.search_paths {
                let candidate = dir.join(path);
                if candidate.exists() {
                    return candidate;
                }
            }
        }
        path.to_path_buf()
    }

    /// All configured models, resolved against the search paths
    pub fn resolved_models(&self) -> Vec<PathBuf> {
        self.models.iter().map(|path| self.resolve_model(path)).collect()
    }
}
