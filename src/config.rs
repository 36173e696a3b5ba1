use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::controller::DEFAULT_DEBOUNCE;

/// Overrides `library_path` when set.
pub const LIBRARY_DIR_ENV: &str = "YOI_LIBRARY_DIR";

const DEFAULT_JPEG_QUALITY: u8 = 92;

#[derive(Debug, Default, Serialize, Deserialize)]
/// Persisted UI/application settings for YOI Photos.
pub struct AppConfig {
    pub window_width: Option<f32>,
    pub window_height: Option<f32>,
    /// Directory saved photos are written to.
    pub library_path: Option<PathBuf>,
    /// Directory holding the splash sound assets.
    pub sounds_dir: Option<PathBuf>,
    pub debounce_ms: Option<u64>,
    pub jpeg_quality: Option<u8>,
    pub last_open_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Returns the user config file path, if a config directory is available.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("yoi-photos").join("config.toml"))
    }

    /// Loads config from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Self {
        match toml::from_str(contents) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%err, "ignoring malformed config");
                Self::default()
            }
        }
    }

    /// Writes config to disk, ignoring filesystem/serialization errors.
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(s) = toml::to_string_pretty(self) {
            let _ = std::fs::write(&path, s);
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DEBOUNCE)
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
            .unwrap_or(DEFAULT_JPEG_QUALITY)
            .clamp(1, 100)
    }

    /// Where saved photos go: env override, then config, then `~/Pictures/YOI Photos`.
    pub fn library_dir(&self) -> PathBuf {
        if let Some(raw) = std::env::var_os(LIBRARY_DIR_ENV) {
            if !raw.is_empty() {
                return PathBuf::from(raw);
            }
        }
        self.library_path.clone().unwrap_or_else(default_library_dir)
    }

    pub fn sounds_dir(&self) -> PathBuf {
        self.sounds_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("assets").join("sounds"))
    }
}

fn default_library_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("YOI Photos")
}
