//! Player preferences
//!
//! Persisted separately from the save records, under their own key.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, SETTINGS_KEY, Storage};
use crate::sim::battle::BattleOptions;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    // === Combat assists ===
    /// Cast ready skills automatically
    pub auto_cast: bool,
    /// Squad fires at the nearest enemy without input
    pub auto_shoot: bool,

    // === HUD ===
    /// Floating damage numbers on hits
    pub damage_numbers: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Accessibility ===
    /// Reduced motion (camera snaps instead of easing)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_cast: true,
            auto_shoot: true,

            damage_numbers: true,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Options the battle reads every frame
    pub fn battle_options(&self) -> BattleOptions {
        BattleOptions {
            auto_shoot: self.auto_shoot,
            auto_cast: self.auto_cast,
            damage_numbers: self.damage_numbers,
            reduced_motion: self.reduced_motion,
        }
    }

    /// Volume after mute and both sliders
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume.clamp(0.0, 1.0) * self.sfx_volume.clamp(0.0, 1.0)
        }
    }

    /// Keep volumes inside their slider range
    pub fn sanitize(&mut self) {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
    }

    /// Load settings from storage, defaulting on a missing or bad record
    pub fn load(storage: &dyn Storage) -> Self {
        match persistence::load_json::<Settings>(storage, SETTINGS_KEY) {
            Ok(Some(mut settings)) => {
                settings.sanitize();
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Using default settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) {
        match persistence::save_json(storage, SETTINGS_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_settings_round_trip() {
        let mut storage = MemoryStorage::new();
        let settings = Settings {
            auto_cast: false,
            muted: true,
            ..Default::default()
        };
        settings.save(&mut storage);
        assert_eq!(Settings::load(&storage), settings);
    }

    #[test]
    fn test_partial_record_fills_defaults() {
        let mut storage = MemoryStorage::new();
        storage
            .set(SETTINGS_KEY, r#"{"reducedMotion":true,"masterVolume":3.0}"#)
            .unwrap();
        let settings = Settings::load(&storage);
        assert!(settings.reduced_motion);
        assert!(settings.auto_shoot);
        assert_eq!(settings.master_volume, 1.0);
    }

    #[test]
    fn test_bad_record_defaults() {
        let mut storage = MemoryStorage::new();
        storage.set(SETTINGS_KEY, "[1,2").unwrap();
        assert_eq!(Settings::load(&storage), Settings::default());
    }

    #[test]
    fn test_battle_options_and_volume() {
        let settings = Settings {
            damage_numbers: false,
            master_volume: 0.5,
            sfx_volume: 0.5,
            ..Default::default()
        };
        let options = settings.battle_options();
        assert!(!options.damage_numbers);
        assert!(options.auto_cast);
        assert!((settings.effective_volume() - 0.25).abs() < 1e-6);
    }
}
