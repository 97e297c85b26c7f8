//! Configuration structures and loading logic.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub font: FontConfig,
    pub atlas: AtlasConfig,
    pub window: WindowConfig,
    pub text: TextConfig,
}

/// Font face and rasterization size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font file to load. `None` searches well-known system locations.
    pub path: Option<PathBuf>,
    /// Pixels per em glyphs are rasterized at.
    pub em_texels: u32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: None,
            em_texels: 64,
        }
    }
}

/// Glyph atlas limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Largest side length the atlas may grow to. Clamped to the device's
    /// texture limit at runtime.
    pub max_size: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self { max_size: 8192 }
    }
}

/// Initial window size and title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 640,
            title: "ori_text".to_owned(),
        }
    }
}

/// What the demo draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Sample text; `\n` starts a new line.
    pub sample: String,
    /// On-screen pixels per em.
    pub scale: f32,
    /// Text color (RGBA, 0..1).
    pub color: [f32; 4],
    /// Color where coverage is zero. Keep alpha at 0 for clean edges over
    /// the clear color.
    pub background: [f32; 4],
    /// Draw the atlas texture next to the text.
    pub show_atlas: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            sample: "The quick brown fox\njumps over the lazy dog.\nAV To Wa 0123456789".to_owned(),
            scale: 48.0,
            color: [0.92, 0.92, 0.88, 1.0],
            background: [0.92, 0.92, 0.88, 0.0],
            show_atlas: true,
        }
    }
}

impl TextConfig {
    /// Returns `scale` clamped to a drawable range.
    pub fn effective_scale(&self) -> f32 {
        self.scale.clamp(1.0, 1024.0)
    }
}

/// Return the platform-specific configuration directory for `ori_text`.
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("ori_text");
        }
        PathBuf::from(".").join("ori_text")
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("ori_text");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config").join("ori_text");
        }
        PathBuf::from(".").join("ori_text")
    }
}

/// Return the path to the config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

impl Config {
    /// Load from [`config_path`], falling back to defaults when the file is
    /// missing or invalid.
    pub fn load() -> Self {
        let path = config_path();
        match Self::read(&path) {
            Ok(Some(cfg)) => {
                log::info!("config: loaded from {}", path.display());
                cfg
            }
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Load from [`config_path`], surfacing read and parse failures.
    /// `Ok(None)` means there is no config file.
    pub fn try_load() -> Result<Option<Self>> {
        Self::read(&config_path())
    }

    /// Parse the TOML file at `path`. `Ok(None)` if it does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Config(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        toml::from_str(&data)
            .map(Some)
            .map_err(|e| Error::Config(format!("parse error in {}: {e}", path.display())))
    }

    /// Write to [`config_path`] and return the path written.
    pub fn save(&self) -> Result<PathBuf> {
        let path = config_path();
        self.write(&path)?;
        Ok(path)
    }

    /// Write pretty TOML to `path`, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                Error::Config(format!("failed to create {}: {e}", dir.display()))
            })?;
        }
        let data = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("serialize error: {e}")))?;
        std::fs::write(path, data)
            .map_err(|e| Error::Config(format!("failed to write {}: {e}", path.display())))
    }
}
