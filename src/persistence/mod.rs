//! Typed persistence over a string key-value store
//!
//! Values are JSON. A missing key yields the type's default; a key that
//! fails to parse is logged and also yields the default, so nothing here
//! ever fails into the simulation.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::platform::storage::{KeyValueStore, StoreError};

/// Storage key layout
pub mod keys {
    use crate::sim::GameKind;

    pub const PREFIX: &str = "arcade";
    pub const DAILY_CHALLENGE: &str = "arcade.dailyChallenge";
    pub const GLOBAL_ACHIEVEMENTS: &str = "arcade.achievements";
    pub const SETTINGS: &str = "arcade.settings";

    fn per_game(kind: GameKind, field: &str) -> String {
        format!("{PREFIX}.{}.{field}", kind.key())
    }

    pub fn high_score(kind: GameKind) -> String {
        per_game(kind, "highScore")
    }

    pub fn coins(kind: GameKind) -> String {
        per_game(kind, "coins")
    }

    pub fn owned_skills(kind: GameKind) -> String {
        per_game(kind, "ownedSkills")
    }

    pub fn active_skills(kind: GameKind) -> String {
        per_game(kind, "activeSkills")
    }

    pub fn unlocked_achievements(kind: GameKind) -> String {
        per_game(kind, "unlockedAchievements")
    }

    pub fn stats(kind: GameKind) -> String {
        per_game(kind, "stats")
    }
}

/// Load a value, falling back to `T::default()` on absence or corruption
pub fn load<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            log::warn!("Failed to read {key}: {e}; using defaults");
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Corrupt value under {key}: {e}; using defaults");
            T::default()
        }
    }
}

pub fn save<T: Serialize + ?Sized>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}

/// Fire-and-forget save: failures are logged, never returned
pub fn save_logged<T: Serialize + ?Sized>(store: &mut dyn KeyValueStore, key: &str, value: &T) {
    if let Err(e) = save(store, key, value) {
        log::warn!("Failed to persist {key}: {e}");
    }
}
