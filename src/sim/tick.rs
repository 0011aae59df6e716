//! Fixed timestep simulation tick
//!
//! Core game loop that advances a session deterministically.

use super::state::{Action, GameEvent, GameKind, GameSession, GameStatus, Modifiers};
use super::variants::Variant;
use crate::tuning::Tuning;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Actions in arrival order
    pub actions: Vec<Action>,
}

impl TickInput {
    pub fn with(action: Action) -> Self {
        Self {
            actions: vec![action],
        }
    }
}

/// One game: the generic session plus the variant's rules
#[derive(Debug, Clone)]
pub struct Game {
    pub session: GameSession,
    pub variant: Variant,
}

impl Game {
    pub fn new(kind: GameKind, tuning: &Tuning, seed: u64) -> Self {
        Self {
            session: GameSession::new(kind, seed),
            variant: Variant::new(kind, tuning),
        }
    }

    pub fn kind(&self) -> GameKind {
        self.session.kind
    }

    pub fn status(&self) -> GameStatus {
        self.session.status
    }

    /// Start (or restart) a run. Ignored while already playing.
    pub fn start(&mut self, seed: u64, modifiers: Modifiers) -> Vec<GameEvent> {
        if !self.session.status.can_start() {
            return Vec::new();
        }
        let lives = self.variant.rules().lives();
        self.session.begin(seed, lives, modifiers);
        self.variant.rules_mut().reset(&mut self.session);
        self.session.normalize_order();
        log::info!("{} started (seed {})", self.kind().key(), seed);
        vec![GameEvent::Started]
    }

    /// Apply one action immediately; invalid actions are silently ignored
    pub fn apply(&mut self, action: Action) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.session.is_playing() {
            self.variant
                .rules_mut()
                .apply(&mut self.session, action, &mut events);
            self.session.normalize_order();
        }
        events
    }

    /// Drop every pending effect and entity without settling the run
    pub fn teardown(&mut self) {
        self.session.timers.clear();
        self.session.entities.clear();
        if self.session.is_playing() {
            self.session.status = GameStatus::Idle;
        }
    }
}

/// Advance the game by one fixed timestep
pub fn tick(game: &mut Game, input: &TickInput, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if !game.session.is_playing() {
        return events;
    }
    let Game { session, variant } = game;
    let rules = variant.rules_mut();

    for &action in &input.actions {
        if !session.is_playing() {
            break;
        }
        rules.apply(session, action, &mut events);
    }

    session.tick += 1;
    for deferred in session.timers.drain_due(session.tick) {
        if !session.is_playing() {
            break;
        }
        rules.on_deferred(session, deferred, &mut events);
    }

    if session.is_playing() {
        rules.step(session, dt, &mut events);
    }
    session.normalize_order();
    events
}
