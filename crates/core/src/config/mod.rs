use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the application.
///
/// Persistence of this struct is handled by the host application; the core
/// only consumes the resulting values at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub window: WindowConfig,
    /// Index into the visualizer registry selecting the active renderer.
    pub visual_index: usize,
    pub palette: PaletteConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            window: WindowConfig::default(),
            visual_index: 0,
            palette: PaletteConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn live_defaults() -> Self {
        Self::default()
    }

    /// Parses a configuration from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration from a JSON file on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Serializes the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    /// Capture device selected by name; `None` uses the host default.
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            device: None,
        }
    }
}

/// Window parameters consumed at startup. The window itself is owned by the
/// host; transparency and on-top handling are OS-side concerns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub transparent: bool,
    pub always_on_top: bool,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            transparent: false,
            always_on_top: false,
            fullscreen: false,
        }
    }
}

/// Palette selection: a custom hex list wins over a named built-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub name: String,
    pub custom: Vec<String>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            name: "Rainbow".to_string(),
            custom: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_json() {
        let config = AppConfig::live_defaults();
        let json = config.to_json().unwrap();
        let parsed = AppConfig::from_json(&json).unwrap();

        assert_eq!(parsed.audio.sample_rate, 48_000);
        assert_eq!(parsed.window.width, 800);
        assert_eq!(parsed.visual_index, 0);
        assert_eq!(parsed.palette.name, "Rainbow");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed = AppConfig::from_json(r#"{"visual_index": 5}"#).unwrap();
        assert_eq!(parsed.visual_index, 5);
        assert_eq!(parsed.window.height, 600);
        assert!(parsed.palette.custom.is_empty());
    }
}
