//! Cross-session progression
//!
//! One [`ProgressionStore`] is owned by the arcade host and handed the
//! outcome of every finished run. It keeps per-game profiles (high score,
//! coins, skills, achievements, lifetime stats), the shared daily challenge
//! and the global achievement set, and writes each change through to the
//! key-value store after the in-memory state has been updated.

pub mod achievements;
pub mod daily;
pub mod profile;
pub mod shop;

use std::collections::BTreeSet;

use crate::consts::COIN_DIVISOR;
use crate::persistence::{self, keys};
use crate::platform::storage::KeyValueStore;
use crate::sim::{GameKind, GameStatus, Modifiers, SessionStats};

pub use achievements::{AchievementDef, Scope, StatsSnapshot, ALL_ACHIEVEMENTS};
pub use daily::{Clock, DailyChallenge, FixedClock, SystemClock};
pub use profile::{GameStats, Profile};
pub use shop::{ShopError, Skill};

/// What a finished run hands to progression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOutcome {
    pub kind: GameKind,
    pub status: GameStatus,
    pub score: u64,
    pub best_combo: u32,
    pub stats: SessionStats,
}

/// Everything a settlement changed, for the UI
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settlement {
    pub coins_awarded: u64,
    pub new_high_score: bool,
    pub unlocked: Vec<&'static AchievementDef>,
    pub achievement_coins: u64,
    pub daily_reward: Option<u64>,
}

pub struct ProgressionStore<S: KeyValueStore> {
    store: S,
    clock: Box<dyn Clock>,
    profiles: Vec<Profile>,
    global_achievements: BTreeSet<String>,
    daily: Option<DailyChallenge>,
}

impl<S: KeyValueStore> ProgressionStore<S> {
    /// Load every profile from `store`; corrupt entries become defaults
    pub fn load(store: S, clock: Box<dyn Clock>) -> Self {
        let profiles = GameKind::ALL
            .iter()
            .map(|&kind| Profile::load(&store, kind))
            .collect();
        let global_achievements: BTreeSet<String> = persistence::load(&store, keys::GLOBAL_ACHIEVEMENTS);
        let daily: Option<DailyChallenge> = persistence::load(&store, keys::DAILY_CHALLENGE);
        log::info!(
            "Progression loaded ({} global achievements, daily: {})",
            global_achievements.len(),
            daily.as_ref().map_or("none", |d| d.date.as_str())
        );
        Self {
            store,
            clock,
            profiles,
            global_achievements,
            daily,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Shared store for non-progression data (settings)
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn profile(&self, kind: GameKind) -> &Profile {
        &self.profiles[kind.index()]
    }

    pub fn coins(&self, kind: GameKind) -> u64 {
        self.profile(kind).coins
    }

    pub fn high_score(&self, kind: GameKind) -> u64 {
        self.profile(kind).high_score
    }

    pub fn global_achievements(&self) -> &BTreeSet<String> {
        &self.global_achievements
    }

    pub fn modifiers(&self, kind: GameKind) -> Modifiers {
        shop::modifiers_for(&self.profile(kind).active_skills, kind)
    }

    // === Shop ===

    /// Buy `skill` for `kind`, debiting coins and granting ownership together
    ///
    /// Returns the remaining balance. On error nothing changes.
    pub fn purchase(&mut self, kind: GameKind, skill: Skill) -> Result<u64, ShopError> {
        let profile = &mut self.profiles[kind.index()];
        if !skill.available_for(kind) {
            return Err(ShopError::NotAvailable { skill, kind });
        }
        if profile.owned_skills.contains(&skill) {
            return Err(ShopError::AlreadyOwned(skill));
        }
        let cost = skill.cost();
        if profile.coins < cost {
            return Err(ShopError::InsufficientFunds {
                cost,
                coins: profile.coins,
            });
        }
        profile.coins -= cost;
        profile.owned_skills.insert(skill);

        profile.save_coins(&mut self.store, kind);
        profile.save_skills(&mut self.store, kind);
        log::info!(
            "Purchased {} for {} ({} coins left)",
            skill.id(),
            kind.key(),
            profile.coins
        );
        Ok(profile.coins)
    }

    pub fn purchase_by_id(&mut self, kind: GameKind, id: &str) -> Result<u64, ShopError> {
        let skill = Skill::from_id(id)?;
        self.purchase(kind, skill)
    }

    pub fn activate(&mut self, kind: GameKind, skill: Skill) -> Result<(), ShopError> {
        let profile = &mut self.profiles[kind.index()];
        if !profile.owned_skills.contains(&skill) {
            return Err(ShopError::NotOwned(skill));
        }
        if profile.active_skills.insert(skill) {
            profile.save_skills(&mut self.store, kind);
        }
        Ok(())
    }

    pub fn deactivate(&mut self, kind: GameKind, skill: Skill) -> Result<(), ShopError> {
        let profile = &mut self.profiles[kind.index()];
        if !profile.owned_skills.contains(&skill) {
            return Err(ShopError::NotOwned(skill));
        }
        if profile.active_skills.remove(&skill) {
            profile.save_skills(&mut self.store, kind);
        }
        Ok(())
    }

    // === Achievements ===

    pub fn snapshot(&self, kind: GameKind) -> StatsSnapshot {
        StatsSnapshot {
            game: self.profile(kind).stats,
            variants_played: self
                .profiles
                .iter()
                .filter(|p| p.stats.games_played > 0)
                .count(),
            variant_count: GameKind::ALL.len(),
            daily_streak: self.daily.as_ref().map_or(0, |d| d.streak),
        }
    }

    /// Unlock every not-yet-unlocked achievement whose condition holds
    ///
    /// Rewards are summed and credited to `kind` once. Already unlocked ids
    /// are skipped, so repeated calls with the same stats change nothing.
    pub fn evaluate_achievements(
        &mut self,
        kind: GameKind,
        stats: &StatsSnapshot,
    ) -> Vec<&'static AchievementDef> {
        let profile = &mut self.profiles[kind.index()];
        let mut unlocked = Vec::new();
        let mut reward = 0;
        for def in ALL_ACHIEVEMENTS {
            let set = match def.scope {
                Scope::Game => &mut profile.unlocked_achievements,
                Scope::Global => &mut self.global_achievements,
            };
            if set.contains(def.id) || !def.condition.holds(stats) {
                continue;
            }
            set.insert(def.id.to_string());
            reward += def.reward;
            unlocked.push(def);
            log::info!("Achievement unlocked: {} ({})", def.id, kind.key());
        }
        if unlocked.is_empty() {
            return unlocked;
        }

        profile.coins += reward;
        profile.save_achievements(&mut self.store, kind);
        profile.save_coins(&mut self.store, kind);
        if unlocked.iter().any(|d| d.scope == Scope::Global) {
            persistence::save_logged(
                &mut self.store,
                keys::GLOBAL_ACHIEVEMENTS,
                &self.global_achievements,
            );
        }
        unlocked
    }

    // === Daily challenge ===

    pub fn daily_challenge(&self) -> Option<&DailyChallenge> {
        self.daily.as_ref()
    }

    /// Make sure the stored challenge is today's, rotating it if needed
    pub fn refresh_daily(&mut self) -> &DailyChallenge {
        let today = self.clock.today();
        let current = match self.daily.take() {
            Some(daily) if daily.is_for(today) => daily,
            previous => {
                let next = DailyChallenge::for_date(today, previous.as_ref());
                log::info!(
                    "Daily challenge {}: {} >= {}",
                    next.date,
                    next.game_variant.key(),
                    next.target
                );
                persistence::save_logged(&mut self.store, keys::DAILY_CHALLENGE, &next);
                next
            }
        };
        self.daily.insert(current)
    }

    /// Complete today's challenge if `kind` matches and `score` reaches
    /// the target. Returns the reward credited, if any.
    pub fn complete_daily_challenge(&mut self, kind: GameKind, score: u64) -> Option<u64> {
        let today = self.clock.today();
        self.refresh_daily();
        let daily = self.daily.as_mut()?;
        if daily.game_variant != kind || daily.completed || score < daily.target {
            return None;
        }
        daily.streak = daily.next_streak(today);
        daily.completed = true;
        daily.last_completed_date = Some(daily::format_date(today));
        let reward = daily.reward;

        let profile = &mut self.profiles[kind.index()];
        profile.coins += reward;
        persistence::save_logged(&mut self.store, keys::DAILY_CHALLENGE, &*daily);
        profile.save_coins(&mut self.store, kind);
        log::info!(
            "Daily challenge complete (streak {}, +{} coins)",
            daily.streak,
            reward
        );
        Some(reward)
    }

    // === Settlement ===

    /// Apply a finished run: high score, coins, stats, daily challenge and
    /// achievements, in that order. Non-terminal outcomes are ignored.
    pub fn settle(&mut self, outcome: &SessionOutcome) -> Settlement {
        if !outcome.status.is_terminal() {
            return Settlement::default();
        }
        let kind = outcome.kind;
        let profile = &mut self.profiles[kind.index()];

        let mut coins = outcome.score / COIN_DIVISOR;
        if profile.is_active(Skill::CoinMagnet) {
            coins *= 2;
        }
        let new_high_score = outcome.score > profile.high_score;
        if new_high_score {
            profile.high_score = outcome.score;
        }
        profile.coins += coins;

        let stats = &mut profile.stats;
        stats.games_played += 1;
        if outcome.status == GameStatus::Won {
            stats.wins += 1;
        }
        stats.best_score = stats.best_score.max(outcome.score);
        stats.best_combo = stats.best_combo.max(outcome.best_combo);
        stats.total_perfect += outcome.stats.perfect;
        stats.total_coins_earned += coins;

        profile.save_high_score(&mut self.store, kind);
        profile.save_coins(&mut self.store, kind);
        profile.save_stats(&mut self.store, kind);
        log::info!(
            "Settled {} run: score {} (+{} coins{})",
            kind.key(),
            outcome.score,
            coins,
            if new_high_score { ", new high score" } else { "" }
        );

        let daily_reward = self.complete_daily_challenge(kind, outcome.score);
        let snapshot = self.snapshot(kind);
        let unlocked = self.evaluate_achievements(kind, &snapshot);
        let achievement_coins = unlocked.iter().map(|d| d.reward).sum();

        Settlement {
            coins_awarded: coins,
            new_high_score,
            unlocked,
            achievement_coins,
            daily_reward,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::storage::MemoryStore;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fresh() -> (ProgressionStore<MemoryStore>, FixedClock) {
        let clock = FixedClock::new(day(2026, 5, 10));
        let store = ProgressionStore::load(MemoryStore::new(), Box::new(clock.clone()));
        (store, clock)
    }

    fn with_coins(kind: GameKind, coins: u64) -> ProgressionStore<MemoryStore> {
        let mut mem = MemoryStore::new();
        persistence::save(&mut mem, &keys::coins(kind), &coins).unwrap();
        ProgressionStore::load(mem, Box::new(FixedClock::new(day(2026, 5, 10))))
    }

    fn outcome(kind: GameKind, status: GameStatus, score: u64) -> SessionOutcome {
        SessionOutcome {
            kind,
            status,
            score,
            best_combo: 0,
            stats: SessionStats::default(),
        }
    }

    #[test]
    fn test_purchase_debits_and_grants_together() {
        let mut progression = with_coins(GameKind::Rhythm, 200);
        assert_eq!(progression.purchase(GameKind::Rhythm, Skill::ExtraLife), Ok(50));
        assert!(progression.profile(GameKind::Rhythm).owned_skills.contains(&Skill::ExtraLife));
        assert_eq!(progression.store().raw("arcade.rhythm.coins"), Some("50"));
        assert_eq!(
            progression.store().raw("arcade.rhythm.ownedSkills"),
            Some("[\"extra_life\"]")
        );
    }

    #[test]
    fn test_purchase_insufficient_funds_leaves_state() {
        let mut progression = with_coins(GameKind::Runner, 99);
        let before = progression.profile(GameKind::Runner).clone();
        assert_eq!(
            progression.purchase(GameKind::Runner, Skill::SlowStart),
            Err(ShopError::InsufficientFunds { cost: 100, coins: 99 })
        );
        assert_eq!(progression.profile(GameKind::Runner), &before);
        assert_eq!(progression.store().raw("arcade.runner.ownedSkills"), None);
    }

    #[test]
    fn test_purchase_rejections() {
        let mut progression = with_coins(GameKind::Stack, 1000);
        assert_eq!(
            progression.purchase(GameKind::Stack, Skill::ExtraLife),
            Err(ShopError::NotAvailable {
                skill: Skill::ExtraLife,
                kind: GameKind::Stack
            })
        );
        assert_eq!(
            progression.purchase_by_id(GameKind::Stack, "warp"),
            Err(ShopError::UnknownSkill("warp".into()))
        );
        progression.purchase(GameKind::Stack, Skill::CoinMagnet).unwrap();
        assert_eq!(
            progression.purchase(GameKind::Stack, Skill::CoinMagnet),
            Err(ShopError::AlreadyOwned(Skill::CoinMagnet))
        );
        assert_eq!(progression.coins(GameKind::Stack), 750);
    }

    #[test]
    fn test_activate_requires_ownership() {
        let mut progression = with_coins(GameKind::Collector, 500);
        assert_eq!(
            progression.activate(GameKind::Collector, Skill::ExtraLife),
            Err(ShopError::NotOwned(Skill::ExtraLife))
        );
        progression.purchase(GameKind::Collector, Skill::ExtraLife).unwrap();
        progression.activate(GameKind::Collector, Skill::ExtraLife).unwrap();
        assert_eq!(progression.modifiers(GameKind::Collector).extra_lives, 1);
        progression.deactivate(GameKind::Collector, Skill::ExtraLife).unwrap();
        assert_eq!(progression.modifiers(GameKind::Collector).extra_lives, 0);
    }

    #[test]
    fn test_settlement_awards_floor_score_over_ten() {
        let (mut progression, _) = fresh();
        let settlement = progression.settle(&outcome(GameKind::Stack, GameStatus::GameOver, 57));
        assert_eq!(settlement.coins_awarded, 5);
        assert!(settlement.new_high_score);
        assert_eq!(progression.high_score(GameKind::Stack), 57);
        // first_game unlocks on the first settled run
        assert!(settlement.unlocked.iter().any(|d| d.id == "first_game"));
        assert_eq!(
            progression.coins(GameKind::Stack),
            5 + settlement.achievement_coins + settlement.daily_reward.unwrap_or(0)
        );
        assert_eq!(progression.store().raw("arcade.stack.highScore"), Some("57"));
    }

    #[test]
    fn test_won_settles_like_game_over() {
        let (mut progression, _) = fresh();
        let settlement = progression.settle(&outcome(GameKind::Maze, GameStatus::Won, 950));
        assert_eq!(settlement.coins_awarded, 95);
        assert_eq!(progression.profile(GameKind::Maze).stats.wins, 1);
        assert!(settlement.unlocked.iter().any(|d| d.id == "first_win"));
    }

    #[test]
    fn test_non_terminal_outcome_ignored() {
        let (mut progression, _) = fresh();
        let settlement = progression.settle(&outcome(GameKind::Maze, GameStatus::Playing, 950));
        assert_eq!(settlement, Settlement::default());
        assert_eq!(progression.profile(GameKind::Maze).stats.games_played, 0);
    }

    #[test]
    fn test_coin_magnet_doubles_award() {
        let mut progression = with_coins(GameKind::Merge, 250);
        progression.purchase(GameKind::Merge, Skill::CoinMagnet).unwrap();
        progression.activate(GameKind::Merge, Skill::CoinMagnet).unwrap();
        let settlement = progression.settle(&outcome(GameKind::Merge, GameStatus::GameOver, 123));
        assert_eq!(settlement.coins_awarded, 24);
    }

    #[test]
    fn test_achievements_idempotent() {
        let (mut progression, _) = fresh();
        progression.settle(&outcome(GameKind::Runner, GameStatus::GameOver, 1200));
        let snapshot = progression.snapshot(GameKind::Runner);
        let coins = progression.coins(GameKind::Runner);
        assert!(progression.evaluate_achievements(GameKind::Runner, &snapshot).is_empty());
        assert!(progression.evaluate_achievements(GameKind::Runner, &snapshot).is_empty());
        assert_eq!(progression.coins(GameKind::Runner), coins);
        let unlocked = &progression.profile(GameKind::Runner).unlocked_achievements;
        assert!(unlocked.contains("score_1000"));
    }

    #[test]
    fn test_explorer_unlocks_globally_once() {
        let (mut progression, _) = fresh();
        for kind in GameKind::ALL {
            progression.settle(&outcome(kind, GameStatus::GameOver, 0));
        }
        assert!(progression.global_achievements().contains("explorer"));
        let last = GameKind::ALL[GameKind::ALL.len() - 1];
        assert!(progression.coins(last) >= 200);
        let again = progression.settle(&outcome(GameKind::Stack, GameStatus::GameOver, 0));
        assert!(again.unlocked.iter().all(|d| d.id != "explorer"));
        assert!(progression.store().raw("arcade.achievements").is_some());
    }

    #[test]
    fn test_daily_streak_increments_next_day_and_resets_after_gap() {
        let (mut progression, clock) = fresh();

        let complete_today = |p: &mut ProgressionStore<MemoryStore>| {
            let daily = p.refresh_daily().clone();
            p.complete_daily_challenge(daily.game_variant, daily.target)
        };

        assert!(complete_today(&mut progression).is_some());
        assert_eq!(progression.daily_challenge().map(|d| d.streak), Some(1));

        clock.advance_days(1);
        assert!(complete_today(&mut progression).is_some());
        assert_eq!(progression.daily_challenge().map(|d| d.streak), Some(2));

        clock.advance_days(2);
        assert!(complete_today(&mut progression).is_some());
        assert_eq!(progression.daily_challenge().map(|d| d.streak), Some(1));
    }

    #[test]
    fn test_daily_noop_cases() {
        let (mut progression, _) = fresh();
        let daily = progression.refresh_daily().clone();
        let other = GameKind::ALL
            .into_iter()
            .find(|&k| k != daily.game_variant)
            .unwrap();
        assert_eq!(progression.complete_daily_challenge(other, u64::MAX), None);
        assert_eq!(
            progression.complete_daily_challenge(daily.game_variant, daily.target - 1),
            None
        );
        let coins = progression.coins(daily.game_variant);
        assert_eq!(
            progression.complete_daily_challenge(daily.game_variant, daily.target),
            Some(daily.reward)
        );
        assert_eq!(progression.coins(daily.game_variant), coins + daily.reward);
        assert_eq!(
            progression.complete_daily_challenge(daily.game_variant, daily.target),
            None
        );
    }

    #[test]
    fn test_streak_keeper_after_three_days() {
        let (mut progression, clock) = fresh();
        let mut unlocked = false;
        for _ in 0..3 {
            let daily = progression.refresh_daily().clone();
            let settlement = progression.settle(&outcome(
                daily.game_variant,
                GameStatus::GameOver,
                daily.target,
            ));
            unlocked |= settlement.unlocked.iter().any(|d| d.id == "streak_keeper");
            clock.advance_days(1);
        }
        assert!(unlocked);
    }

    #[test]
    fn test_reload_restores_everything() {
        let (mut progression, clock) = fresh();
        progression.settle(&outcome(GameKind::Collector, GameStatus::GameOver, 340));
        let daily = progression.refresh_daily().clone();
        let coins = progression.coins(GameKind::Collector);
        let mem = progression.store().clone();

        let reloaded = ProgressionStore::load(mem, Box::new(clock));
        assert_eq!(reloaded.coins(GameKind::Collector), coins);
        assert_eq!(reloaded.high_score(GameKind::Collector), 340);
        assert_eq!(reloaded.daily_challenge(), Some(&daily));
    }

    #[test]
    fn test_corrupt_storage_loads_defaults() {
        let mut mem = MemoryStore::new();
        mem.set("arcade.stack.coins", "NaN coins").unwrap();
        mem.set("arcade.dailyChallenge", "{\"id\":3}").unwrap();
        mem.set("arcade.achievements", "[1,2").unwrap();
        let progression = ProgressionStore::load(mem, Box::new(SystemClock));
        assert_eq!(progression.coins(GameKind::Stack), 0);
        assert!(progression.daily_challenge().is_none());
        assert!(progression.global_achievements().is_empty());
    }

    proptest! {
        #[test]
        fn prop_purchase_conserves_coins(coins in 0u64..400, pick in 0usize..3) {
            let kind = GameKind::Collector;
            let skill = Skill::ALL[pick];
            let mut progression = with_coins(kind, coins);
            let result = progression.purchase(kind, skill);
            if coins >= skill.cost() {
                prop_assert_eq!(result, Ok(coins - skill.cost()));
                prop_assert_eq!(progression.coins(kind), coins - skill.cost());
                prop_assert!(progression.profile(kind).owned_skills.contains(&skill));
            } else {
                prop_assert!(
                    matches!(result, Err(ShopError::InsufficientFunds { .. })),
                    "unexpected result {:?}",
                    result
                );
                prop_assert_eq!(progression.coins(kind), coins);
                prop_assert!(progression.profile(kind).owned_skills.is_empty());
            }
        }
    }
}
