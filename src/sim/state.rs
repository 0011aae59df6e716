//! Session state and core simulation types
//!
//! A [`GameSession`] is the generic half of every game: lifecycle status,
//! score, combo, lives, difficulty and the entity list. Variant-specific
//! rules mutate it only through the methods here, which enforce the
//! lifecycle invariants (score only grows, nothing changes once terminal,
//! entities are cleared on every terminal transition).

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId};
use super::timers::TickQueue;
use crate::tuning::DifficultyCurve;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Waiting for the first start
    Idle,
    /// Active gameplay
    Playing,
    /// Run ended in failure
    GameOver,
    /// Run ended in success
    Won,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::GameOver | GameStatus::Won)
    }

    /// Whether a start request is accepted from this status
    pub fn can_start(self) -> bool {
        self != GameStatus::Playing
    }
}

/// The seven game variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Stack,
    Rhythm,
    Runner,
    Collector,
    Match3,
    Maze,
    Merge,
}

impl GameKind {
    pub const ALL: [GameKind; 7] = [
        GameKind::Stack,
        GameKind::Rhythm,
        GameKind::Runner,
        GameKind::Collector,
        GameKind::Match3,
        GameKind::Maze,
        GameKind::Merge,
    ];

    /// Stable key used in storage keys and translation keys
    pub fn key(self) -> &'static str {
        match self {
            GameKind::Stack => "stack",
            GameKind::Rhythm => "rhythm",
            GameKind::Runner => "runner",
            GameKind::Collector => "collector",
            GameKind::Match3 => "match3",
            GameKind::Maze => "maze",
            GameKind::Merge => "merge",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&k| k == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }

    /// Whether losing a life is possible (more than one life per run)
    pub fn uses_lives(self) -> bool {
        matches!(self, GameKind::Rhythm | GameKind::Collector)
    }
}

/// Logical direction for keys and swipes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit step as (dx, dy) with y growing downward
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// A logical player intent, already mapped from raw input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Space/Enter or a tap with no positional meaning
    Primary,
    /// Pointer down at a playfield position
    Pointer { x: f32, y: f32 },
    /// Arrow keys, WASD or a swipe
    Direction(Direction),
    /// Rhythm lane key
    Lane(u8),
}

/// Something that happened during a step, consumed by the host for
/// feedback, settlement and logging
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Started,
    Scored { points: u64, total: u64 },
    Hit { perfect: bool },
    Miss,
    /// Input that hit nothing (light haptic pulse)
    EmptyTap,
    LifeLost { remaining: u32 },
    LevelUp { level: u32 },
    GameOver { score: u64 },
    Won { score: u64 },
}

/// Variant effects fired a fixed number of ticks later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Stack: next moving block enters
    SpawnBlock,
    /// Rhythm: lane highlight ends
    ClearFlash { lane: u8 },
}

/// Per-run hit accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub perfect: u32,
    pub good: u32,
    pub miss: u32,
}

impl SessionStats {
    /// Share of hits among all judged events (1.0 when nothing was judged)
    pub fn accuracy(&self) -> f32 {
        let total = self.perfect + self.good + self.miss;
        if total == 0 {
            1.0
        } else {
            (self.perfect + self.good) as f32 / total as f32
        }
    }
}

/// Adjustments applied at session start by active skills
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modifiers {
    pub extra_lives: u32,
    /// Multiplier on variant speeds (< 1 is slower)
    pub speed_scale: f32,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            extra_lives: 0,
            speed_scale: 1.0,
        }
    }
}

/// RNG state wrapper kept alongside the generator for reproducibility
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Generic state of one game run
#[derive(Debug, Clone)]
pub struct GameSession {
    pub kind: GameKind,
    pub status: GameStatus,
    pub score: u64,
    pub combo: u32,
    pub best_combo: u32,
    pub lives: u32,
    /// Difficulty level, starts at 1 and never decreases within a run
    pub difficulty: u32,
    /// Active entities (sorted by id for determinism)
    pub entities: Vec<Entity>,
    /// Simulation tick counter
    pub tick: u64,
    pub stats: SessionStats,
    pub modifiers: Modifiers,
    pub rng_state: RngState,
    pub rng: Pcg32,
    pub timers: TickQueue<Deferred>,
    next_id: u32,
}

impl GameSession {
    pub fn new(kind: GameKind, seed: u64) -> Self {
        let rng_state = RngState::new(seed);
        Self {
            kind,
            status: GameStatus::Idle,
            score: 0,
            combo: 0,
            best_combo: 0,
            lives: 1,
            difficulty: 1,
            entities: Vec::new(),
            tick: 0,
            stats: SessionStats::default(),
            modifiers: Modifiers::default(),
            rng_state,
            rng: rng_state.to_rng(),
            timers: TickQueue::new(),
            next_id: 1,
        }
    }

    /// Reset every counter for a new run and enter `Playing`
    pub fn begin(&mut self, seed: u64, lives: u32, modifiers: Modifiers) {
        self.rng_state = RngState::new(seed);
        self.rng = self.rng_state.to_rng();
        self.status = GameStatus::Playing;
        self.score = 0;
        self.combo = 0;
        self.best_combo = 0;
        self.lives = lives + modifiers.extra_lives;
        self.difficulty = 1;
        self.entities.clear();
        self.tick = 0;
        self.stats = SessionStats::default();
        self.modifiers = modifiers;
        self.timers.clear();
        self.next_id = 1;
    }

    pub fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add an entity built from a fresh id
    pub fn spawn(&mut self, build: impl FnOnce(EntityId) -> Entity) -> EntityId {
        let id = self.next_entity_id();
        self.entities.push(build(id));
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(index))
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.entities.sort_by_key(|e| e.id);
    }

    /// Add points (ignored unless playing)
    pub fn add_score(&mut self, points: u64, events: &mut Vec<GameEvent>) {
        if !self.is_playing() || points == 0 {
            return;
        }
        self.score = self.score.saturating_add(points);
        events.push(GameEvent::Scored {
            points,
            total: self.score,
        });
    }

    pub fn bump_combo(&mut self) -> u32 {
        if self.is_playing() {
            self.combo += 1;
            self.best_combo = self.best_combo.max(self.combo);
        }
        self.combo
    }

    pub fn set_combo(&mut self, combo: u32) {
        if self.is_playing() {
            self.combo = combo;
            self.best_combo = self.best_combo.max(combo);
        }
    }

    pub fn reset_combo(&mut self) {
        if self.is_playing() {
            self.combo = 0;
        }
    }

    /// Lose one life; ends the run when none remain
    ///
    /// Returns true if the session became terminal.
    pub fn lose_life(&mut self, events: &mut Vec<GameEvent>) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.lives = self.lives.saturating_sub(1);
        events.push(GameEvent::LifeLost {
            remaining: self.lives,
        });
        if self.lives == 0 {
            self.end(GameStatus::GameOver, events);
            true
        } else {
            false
        }
    }

    /// Terminal failure
    pub fn game_over(&mut self, events: &mut Vec<GameEvent>) {
        self.end(GameStatus::GameOver, events);
    }

    /// Terminal success
    pub fn win(&mut self, events: &mut Vec<GameEvent>) {
        self.end(GameStatus::Won, events);
    }

    fn end(&mut self, status: GameStatus, events: &mut Vec<GameEvent>) {
        if !self.is_playing() {
            return;
        }
        self.status = status;
        self.entities.clear();
        self.timers.clear();
        log::info!(
            "{} ended ({:?}) score={} best_combo={}",
            self.kind.key(),
            status,
            self.score,
            self.best_combo
        );
        events.push(match status {
            GameStatus::Won => GameEvent::Won { score: self.score },
            _ => GameEvent::GameOver { score: self.score },
        });
    }

    /// Raise the difficulty to the level `progress` reaches on `curve`
    pub fn update_difficulty(
        &mut self,
        curve: &DifficultyCurve,
        progress: u64,
        events: &mut Vec<GameEvent>,
    ) {
        if !self.is_playing() {
            return;
        }
        let level = curve.level_for(progress);
        if level > self.difficulty {
            self.difficulty = level;
            log::debug!("{} level up -> {}", self.kind.key(), level);
            events.push(GameEvent::LevelUp { level });
        }
    }

    /// Speed multiplier for the current level, including skill modifiers
    pub fn speed(&self, curve: &DifficultyCurve) -> f32 {
        curve.speed_multiplier(self.difficulty) * self.modifiers.speed_scale
    }

    /// Schedule a deferred effect relative to the current tick
    pub fn schedule(&mut self, delay: u64, event: Deferred) {
        self.timers.schedule(self.tick, delay, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{EntityKind, Shape};
    use glam::Vec2;
    use proptest::prelude::*;

    fn playing(lives: u32) -> GameSession {
        let mut s = GameSession::new(GameKind::Rhythm, 7);
        s.begin(7, lives, Modifiers::default());
        s
    }

    fn dot(id: EntityId) -> Entity {
        Entity::new(id, EntityKind::Particle, Vec2::ZERO, Shape::Circle { r: 1.0 })
    }

    #[test]
    fn test_new_session_is_idle() {
        let s = GameSession::new(GameKind::Stack, 1);
        assert_eq!(s.status, GameStatus::Idle);
        assert!(s.status.can_start());
        assert!(s.entities.is_empty());
    }

    #[test]
    fn test_score_ignored_outside_playing() {
        let mut s = GameSession::new(GameKind::Stack, 1);
        let mut events = Vec::new();
        s.add_score(50, &mut events);
        assert_eq!(s.score, 0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_lose_last_life_ends_run_and_clears() {
        let mut s = playing(2);
        let mut events = Vec::new();
        s.spawn(dot);
        s.schedule(10, Deferred::SpawnBlock);
        assert!(!s.lose_life(&mut events));
        assert!(s.lose_life(&mut events));
        assert_eq!(s.status, GameStatus::GameOver);
        assert!(s.entities.is_empty());
        assert!(s.timers.is_empty());
        assert_eq!(events.last(), Some(&GameEvent::GameOver { score: 0 }));

        // Frozen once terminal
        s.add_score(10, &mut events);
        s.bump_combo();
        assert_eq!(s.score, 0);
        assert_eq!(s.combo, 0);
    }

    #[test]
    fn test_extra_life_modifier() {
        let mut s = GameSession::new(GameKind::Collector, 1);
        s.begin(
            1,
            3,
            Modifiers {
                extra_lives: 1,
                speed_scale: 1.0,
            },
        );
        assert_eq!(s.lives, 4);
    }

    #[test]
    fn test_entity_ids_monotonic() {
        let mut s = playing(1);
        let a = s.spawn(dot);
        let b = s.spawn(dot);
        assert!(b > a);
        assert!(s.despawn(a).is_some());
        let c = s.spawn(dot);
        assert!(c > b);
    }

    #[test]
    fn test_difficulty_never_decreases() {
        let mut s = playing(1);
        let curve = DifficultyCurve::every(100, 5, 0.1, 2.0);
        let mut events = Vec::new();
        s.update_difficulty(&curve, 250, &mut events);
        assert_eq!(s.difficulty, 3);
        s.update_difficulty(&curve, 50, &mut events);
        assert_eq!(s.difficulty, 3);
        assert_eq!(events, vec![GameEvent::LevelUp { level: 3 }]);
    }

    #[test]
    fn test_accuracy() {
        let stats = SessionStats {
            perfect: 2,
            good: 1,
            miss: 1,
        };
        assert_eq!(stats.accuracy(), 0.75);
        assert_eq!(SessionStats::default().accuracy(), 1.0);
    }

    #[test]
    fn test_kind_keys_roundtrip() {
        for kind in GameKind::ALL {
            assert_eq!(GameKind::from_key(kind.key()), Some(kind));
            assert_eq!(GameKind::from_index(kind.index()), Some(kind));
        }
    }

    proptest! {
        #[test]
        fn prop_score_monotonic(ops in prop::collection::vec((0u8..4, 0u64..500), 0..60)) {
            let mut s = playing(3);
            let mut events = Vec::new();
            let mut last = s.score;
            for (op, points) in ops {
                match op {
                    0 => s.add_score(points, &mut events),
                    1 => { s.lose_life(&mut events); }
                    2 => s.reset_combo(),
                    _ => { s.bump_combo(); }
                }
                prop_assert!(s.score >= last);
                if s.status.is_terminal() {
                    prop_assert!(s.entities.is_empty());
                }
                last = s.score;
            }
        }
    }
}
