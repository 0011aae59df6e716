//! Skill shop catalogue and errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{GameKind, Modifiers};

/// Speed scale applied by an active `SlowStart`
pub const SLOW_START_SCALE: f32 = 0.85;

/// Purchasable skills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    /// One extra life (only for games with lives)
    ExtraLife,
    /// Runs start at reduced speed
    SlowStart,
    /// Double coins at settlement
    CoinMagnet,
}

impl Skill {
    pub const ALL: [Skill; 3] = [Skill::ExtraLife, Skill::SlowStart, Skill::CoinMagnet];

    pub fn id(self) -> &'static str {
        match self {
            Skill::ExtraLife => "extra_life",
            Skill::SlowStart => "slow_start",
            Skill::CoinMagnet => "coin_magnet",
        }
    }

    pub fn from_id(id: &str) -> Result<Self, ShopError> {
        Self::ALL
            .into_iter()
            .find(|s| s.id() == id)
            .ok_or_else(|| ShopError::UnknownSkill(id.to_string()))
    }

    pub fn cost(self) -> u64 {
        match self {
            Skill::ExtraLife => 150,
            Skill::SlowStart => 100,
            Skill::CoinMagnet => 250,
        }
    }

    /// Whether the skill has any effect in `kind`
    pub fn available_for(self, kind: GameKind) -> bool {
        match self {
            Skill::ExtraLife => kind.uses_lives(),
            Skill::SlowStart => matches!(
                kind,
                GameKind::Stack | GameKind::Rhythm | GameKind::Runner | GameKind::Collector
            ),
            Skill::CoinMagnet => true,
        }
    }

    /// Skills offered in `kind`'s shop
    pub fn catalogue(kind: GameKind) -> impl Iterator<Item = Skill> {
        Self::ALL.into_iter().filter(move |s| s.available_for(kind))
    }
}

/// Errors returned by shop operations; state is unchanged on every error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    #[error("insufficient funds: need {cost}, have {coins}")]
    InsufficientFunds { cost: u64, coins: u64 },

    #[error("unknown skill: {0}")]
    UnknownSkill(String),

    #[error("skill already owned: {0:?}")]
    AlreadyOwned(Skill),

    #[error("skill not owned: {0:?}")]
    NotOwned(Skill),

    #[error("{skill:?} is not available in {kind:?}")]
    NotAvailable { skill: Skill, kind: GameKind },
}

/// Session modifiers granted by a set of active skills
pub fn modifiers_for<'a>(active: impl IntoIterator<Item = &'a Skill>, kind: GameKind) -> Modifiers {
    let mut modifiers = Modifiers::default();
    for &skill in active {
        if !skill.available_for(kind) {
            continue;
        }
        match skill {
            Skill::ExtraLife => modifiers.extra_lives += 1,
            Skill::SlowStart => modifiers.speed_scale = SLOW_START_SCALE,
            Skill::CoinMagnet => {}
        }
    }
    modifiers
}
