//! Player settings and preferences
//!
//! Persisted separately from progression under `arcade.settings`.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, keys};
use crate::platform::storage::KeyValueStore;

/// Player settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    // === Audio ===
    /// Tones on/off
    pub sound: bool,
    /// Master volume (0.0 - 1.0)
    pub volume: f32,

    // === Haptics ===
    pub haptics: bool,

    // === Accessibility ===
    /// Reduced motion (no particles, no lane flashes)
    pub reduced_motion: bool,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,
    /// Translation locale
    pub locale: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound: true,
            volume: 0.8,
            haptics: true,
            reduced_motion: false,
            show_fps: false,
            locale: "en".to_string(),
        }
    }
}

impl Settings {
    /// Whether tones should actually be played
    pub fn sound_active(&self) -> bool {
        self.sound && self.volume > 0.0
    }

    /// Particle effects (respects reduced_motion)
    pub fn effective_particles(&self) -> bool {
        !self.reduced_motion
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mut settings: Self = persistence::load(store, keys::SETTINGS);
        settings.volume = settings.volume.clamp(0.0, 1.0);
        settings
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        persistence::save_logged(store, keys::SETTINGS, self);
        log::info!("Settings saved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::storage::MemoryStore;

    #[test]
    fn test_settings_roundtrip() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.haptics = false;
        settings.set_volume(1.5);
        settings.save(&mut store);
        let loaded = Settings::load(&store);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.volume, 1.0);
    }

    #[test]
    fn test_corrupt_settings_default() {
        let mut store = MemoryStore::new();
        store.set("arcade.settings", "][").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_out_of_range_volume_clamped_on_load() {
        let mut store = MemoryStore::new();
        store.set("arcade.settings", r#"{"volume":7.0}"#).unwrap();
        let settings = Settings::load(&store);
        assert_eq!(settings.volume, 1.0);
        assert!(settings.sound);
    }
}
