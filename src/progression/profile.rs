//! Per-game progression profile

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::shop::Skill;
use crate::persistence::{self, keys};
use crate::platform::storage::KeyValueStore;
use crate::sim::GameKind;

/// Lifetime statistics for one game, feeding achievement predicates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameStats {
    pub games_played: u32,
    pub wins: u32,
    pub best_score: u64,
    pub best_combo: u32,
    pub total_perfect: u32,
    pub total_coins_earned: u64,
}

/// The persisted cross-session record of one game
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub high_score: u64,
    pub coins: u64,
    pub owned_skills: BTreeSet<Skill>,
    pub active_skills: BTreeSet<Skill>,
    pub unlocked_achievements: BTreeSet<String>,
    pub stats: GameStats,
}

impl Profile {
    pub fn load(store: &dyn KeyValueStore, kind: GameKind) -> Self {
        Self {
            high_score: persistence::load(store, &keys::high_score(kind)),
            coins: persistence::load(store, &keys::coins(kind)),
            owned_skills: persistence::load(store, &keys::owned_skills(kind)),
            active_skills: persistence::load(store, &keys::active_skills(kind)),
            unlocked_achievements: persistence::load(store, &keys::unlocked_achievements(kind)),
            stats: persistence::load(store, &keys::stats(kind)),
        }
    }

    pub fn save_high_score(&self, store: &mut dyn KeyValueStore, kind: GameKind) {
        persistence::save_logged(store, &keys::high_score(kind), &self.high_score);
    }

    pub fn save_coins(&self, store: &mut dyn KeyValueStore, kind: GameKind) {
        persistence::save_logged(store, &keys::coins(kind), &self.coins);
    }

    pub fn save_skills(&self, store: &mut dyn KeyValueStore, kind: GameKind) {
        persistence::save_logged(store, &keys::owned_skills(kind), &self.owned_skills);
        persistence::save_logged(store, &keys::active_skills(kind), &self.active_skills);
    }

    pub fn save_achievements(&self, store: &mut dyn KeyValueStore, kind: GameKind) {
        persistence::save_logged(
            store,
            &keys::unlocked_achievements(kind),
            &self.unlocked_achievements,
        );
    }

    pub fn save_stats(&self, store: &mut dyn KeyValueStore, kind: GameKind) {
        persistence::save_logged(store, &keys::stats(kind), &self.stats);
    }

    pub fn is_active(&self, skill: Skill) -> bool {
        self.active_skills.contains(&skill)
    }
}
