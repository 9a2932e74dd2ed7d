//! Save/load of meta progression
//!
//! Records are stored as JSON strings under fixed keys in a key-value
//! `Storage` (LocalStorage in the browser, a map in native builds and
//! tests). Every failure here is recoverable: callers log it and fall back
//! to defaults.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::sim::events::{NoticeKind, SimEvents};
use crate::sim::player::Progression;
use crate::upgrades::Upgrades;

pub const PROGRESS_KEY: &str = "tankAdventure_progress";
pub const SKILLS_KEY: &str = "tankAdventure_skills";
pub const UPGRADES_KEY: &str = "tankAdventure_upgrades";
pub const SETTINGS_KEY: &str = "tankAdventure_settings";

pub const ALL_KEYS: [&str; 4] = [PROGRESS_KEY, SKILLS_KEY, UPGRADES_KEY, SETTINGS_KEY];

/// Errors from the storage boundary.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backend refused a read or write.
    #[error("storage unavailable: {0}")]
    Storage(String),

    /// A record could not be encoded.
    #[error("failed to encode record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A stored record exists but does not parse.
    #[error("corrupt record under '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// String key-value backend
pub trait Storage {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> PersistenceResult<()>;
    fn remove(&mut self, key: &str) -> PersistenceResult<()>;
}

/// In-process storage for native runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> PersistenceResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PersistenceResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Encode `value` as JSON under `key`
pub fn save_json<T: Serialize>(
    storage: &mut dyn Storage,
    key: &str,
    value: &T,
) -> PersistenceResult<()> {
    let json = serde_json::to_string(value)?;
    storage.set(key, &json)
}

/// Decode the record under `key`, `None` if nothing is stored
pub fn load_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> PersistenceResult<Option<T>> {
    let Some(json) = storage.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|source| PersistenceError::Corrupt {
            key: key.to_string(),
            source,
        })
}

/// Everything that survives between sessions, apart from settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveData {
    pub progression: Progression,
    /// Passive skill id -> level
    pub passives: BTreeMap<String, u32>,
    pub upgrades: Upgrades,
}

impl SaveData {
    /// Load every record, defaulting the ones that are missing
    pub fn load(storage: &dyn Storage) -> PersistenceResult<Self> {
        let progression = load_json(storage, PROGRESS_KEY)?.unwrap_or_default();
        let passives = load_json(storage, SKILLS_KEY)?.unwrap_or_default();
        let upgrade_levels: BTreeMap<String, u32> =
            load_json(storage, UPGRADES_KEY)?.unwrap_or_default();
        Ok(Self {
            progression,
            passives,
            upgrades: Upgrades::from_levels(&upgrade_levels),
        })
    }

    /// Load, logging and defaulting on any failure
    pub fn load_or_default(storage: &dyn Storage) -> Self {
        match Self::load(storage) {
            Ok(data) => {
                log::info!(
                    "Loaded save: level {}, {} coins",
                    data.progression.level,
                    data.progression.coins
                );
                data
            }
            Err(e) => {
                log::warn!("Starting fresh, save unreadable: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> PersistenceResult<()> {
        save_json(storage, PROGRESS_KEY, &self.progression)?;
        save_json(storage, SKILLS_KEY, &self.passives)?;
        save_json(storage, UPGRADES_KEY, &self.upgrades.to_levels())?;
        log::debug!("Progress saved");
        Ok(())
    }
}

/// Wipe every stored record, settings included
pub fn reset_progress(storage: &mut dyn Storage, events: &mut SimEvents) -> PersistenceResult<()> {
    for key in ALL_KEYS {
        storage.remove(key)?;
    }
    log::info!("Progress reset");
    events.notify("Progress reset", NoticeKind::Info);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::SimEvent;
    use crate::upgrades::UpgradeKind;

    #[test]
    fn test_save_data_round_trip() {
        let mut storage = MemoryStorage::new();
        let mut data = SaveData::default();
        data.progression.level = 4;
        data.progression.coins = 1234;
        data.progression.best_wave = 7;
        data.passives.insert("armor_plating".to_string(), 2);

        let mut levels = BTreeMap::new();
        levels.insert("shield".to_string(), 3);
        data.upgrades = Upgrades::from_levels(&levels);

        data.save(&mut storage).unwrap();
        assert_eq!(storage.len(), 3);

        let loaded = SaveData::load(&storage).unwrap();
        assert_eq!(loaded, data);
        assert_eq!(loaded.upgrades.level(UpgradeKind::Shield), 3);
    }

    #[test]
    fn test_progress_uses_camel_case_keys() {
        let mut storage = MemoryStorage::new();
        save_json(&mut storage, PROGRESS_KEY, &Progression::default()).unwrap();
        let json = storage.get(PROGRESS_KEY).unwrap().unwrap();
        assert!(json.contains("\"experienceToNext\":100"));
        assert!(json.contains("\"bestWave\":0"));
    }

    #[test]
    fn test_missing_records_default() {
        let storage = MemoryStorage::new();
        let loaded = SaveData::load(&storage).unwrap();
        assert_eq!(loaded.progression, Progression::default());
        assert!(loaded.passives.is_empty());
    }

    #[test]
    fn test_corrupt_record_reports_key() {
        let mut storage = MemoryStorage::new();
        storage.set(SKILLS_KEY, "{not json").unwrap();

        match SaveData::load(&storage) {
            Err(PersistenceError::Corrupt { key, .. }) => assert_eq!(key, SKILLS_KEY),
            other => panic!("expected corrupt record, got {:?}", other),
        }
        assert_eq!(SaveData::load_or_default(&storage), SaveData::default());
    }

    #[test]
    fn test_reset_removes_everything() {
        let mut storage = MemoryStorage::new();
        for key in ALL_KEYS {
            storage.set(key, "{}").unwrap();
        }
        let mut events = SimEvents::new();
        reset_progress(&mut storage, &mut events).unwrap();

        assert!(storage.is_empty());
        assert_eq!(
            events.drain(),
            vec![SimEvent::Notify {
                message: "Progress reset".to_string(),
                kind: NoticeKind::Info,
            }]
        );
    }
}
