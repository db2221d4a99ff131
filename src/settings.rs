//! Player settings and preferences
//!
//! Persisted in LocalStorage on the web; native builds use defaults.

use serde::{Deserialize, Serialize};

use crate::projection::Camera;
use crate::sim::engine::Speed;

/// Player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Playback speed restored on startup
    pub speed: Speed,
    /// Camera quarter turns (0..=3)
    pub camera_rotation: u8,

    // === Visual ===
    /// Stroke tile edges
    pub outlines: bool,

    // === Accessibility ===
    /// Reduced motion (no shake on blocked moves)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: Speed::X1,
            camera_rotation: 0,
            outlines: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Camera for the stored rotation
    pub fn camera(&self) -> Camera {
        Camera::new(self.camera_rotation)
    }

    /// Remember the current camera
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera_rotation = camera.rotation();
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse stored settings; unknown or missing fields fall back to defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.camera_rotation %= 4;
        Ok(settings)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "sapo_bot_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.speed, Speed::X1);
        assert!(settings.outlines);
        assert!(!settings.reduced_motion);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{"speed": "X3", "camera_rotation": 6}"#).unwrap();
        assert_eq!(settings.speed, Speed::X3);
        assert_eq!(settings.camera_rotation, 2);
        assert!(settings.outlines);
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = Settings::default();
        settings.reduced_motion = true;
        settings.set_camera(Camera::new(3));
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
        assert_eq!(settings.camera().rotation(), 3);
    }
}
