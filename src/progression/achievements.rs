//! Static achievement definitions and unlock predicates

use super::profile::GameStats;

/// Where an achievement's unlock is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Per-game unlocked set
    Game,
    /// Shared `arcade.achievements` set
    Global,
}

/// Unlock predicate over a [`StatsSnapshot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    GamesPlayed(u32),
    BestScore(u64),
    BestCombo(u32),
    TotalPerfect(u32),
    Wins(u32),
    /// Every variant played at least once
    AllVariantsPlayed,
    DailyStreak(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementDef {
    pub id: &'static str,
    pub scope: Scope,
    pub condition: Condition,
    /// Coins credited on unlock
    pub reward: u64,
}

/// Everything an achievement predicate may look at
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSnapshot {
    pub game: GameStats,
    pub variants_played: usize,
    pub variant_count: usize,
    pub daily_streak: u32,
}

impl Condition {
    pub fn holds(self, stats: &StatsSnapshot) -> bool {
        match self {
            Condition::GamesPlayed(n) => stats.game.games_played >= n,
            Condition::BestScore(n) => stats.game.best_score >= n,
            Condition::BestCombo(n) => stats.game.best_combo >= n,
            Condition::TotalPerfect(n) => stats.game.total_perfect >= n,
            Condition::Wins(n) => stats.game.wins >= n,
            Condition::AllVariantsPlayed => {
                stats.variant_count > 0 && stats.variants_played >= stats.variant_count
            }
            Condition::DailyStreak(n) => stats.daily_streak >= n,
        }
    }
}

pub const ALL_ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "first_game",
        scope: Scope::Game,
        condition: Condition::GamesPlayed(1),
        reward: 10,
    },
    AchievementDef {
        id: "score_1000",
        scope: Scope::Game,
        condition: Condition::BestScore(1000),
        reward: 50,
    },
    AchievementDef {
        id: "score_5000",
        scope: Scope::Game,
        condition: Condition::BestScore(5000),
        reward: 150,
    },
    AchievementDef {
        id: "combo_5",
        scope: Scope::Game,
        condition: Condition::BestCombo(5),
        reward: 25,
    },
    AchievementDef {
        id: "combo_10",
        scope: Scope::Game,
        condition: Condition::BestCombo(10),
        reward: 75,
    },
    AchievementDef {
        id: "perfect_ten",
        scope: Scope::Game,
        condition: Condition::TotalPerfect(10),
        reward: 50,
    },
    AchievementDef {
        id: "first_win",
        scope: Scope::Game,
        condition: Condition::Wins(1),
        reward: 100,
    },
    AchievementDef {
        id: "veteran",
        scope: Scope::Game,
        condition: Condition::GamesPlayed(25),
        reward: 100,
    },
    // Global
    AchievementDef {
        id: "explorer",
        scope: Scope::Global,
        condition: Condition::AllVariantsPlayed,
        reward: 200,
    },
    AchievementDef {
        id: "streak_keeper",
        scope: Scope::Global,
        condition: Condition::DailyStreak(3),
        reward: 150,
    },
];

pub fn find(id: &str) -> Option<&'static AchievementDef> {
    ALL_ACHIEVEMENTS.iter().find(|a| a.id == id)
}
