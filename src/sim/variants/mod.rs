//! Per-variant game rules
//!
//! Every variant drives the same [`GameSession`]; what differs is how it
//! populates the playfield, what a step does, and how it reads actions.

pub mod collector;
pub mod match3;
pub mod maze;
pub mod merge;
pub mod rhythm;
pub mod runner;
pub mod stack;

pub use collector::CollectorRules;
pub use match3::Match3Rules;
pub use maze::MazeRules;
pub use merge::MergeRules;
pub use rhythm::RhythmRules;
pub use runner::RunnerRules;
pub use stack::StackRules;

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::entity::{Entity, EntityKind, Shape};
use super::state::{Action, Deferred, GameEvent, GameKind, GameSession};
use crate::tuning::Tuning;

/// Rules for one game variant
pub trait Rules {
    /// Lives granted at the start of a run
    fn lives(&self) -> u32 {
        1
    }

    /// Populate the playfield for a fresh run (session is already `Playing`)
    fn reset(&mut self, session: &mut GameSession);

    /// Advance one fixed timestep
    fn step(&mut self, session: &mut GameSession, dt: f32, events: &mut Vec<GameEvent>);

    /// Handle a player action; only called while `Playing`.
    /// Actions that make no sense right now are ignored.
    fn apply(&mut self, session: &mut GameSession, action: Action, events: &mut Vec<GameEvent>);

    /// A deferred effect scheduled earlier came due
    fn on_deferred(
        &mut self,
        _session: &mut GameSession,
        _deferred: Deferred,
        _events: &mut Vec<GameEvent>,
    ) {
    }
}

/// Concrete rules for the active game
#[derive(Debug, Clone)]
pub enum Variant {
    Stack(StackRules),
    Rhythm(RhythmRules),
    Runner(RunnerRules),
    Collector(CollectorRules),
    Match3(Match3Rules),
    Maze(MazeRules),
    Merge(MergeRules),
}

impl Variant {
    pub fn new(kind: GameKind, tuning: &Tuning) -> Self {
        let field = tuning.field;
        match kind {
            GameKind::Stack => Variant::Stack(StackRules::new(field, tuning.stack.clone())),
            GameKind::Rhythm => Variant::Rhythm(RhythmRules::new(field, tuning.rhythm.clone())),
            GameKind::Runner => Variant::Runner(RunnerRules::new(field, tuning.runner.clone())),
            GameKind::Collector => {
                Variant::Collector(CollectorRules::new(field, tuning.collector.clone()))
            }
            GameKind::Match3 => Variant::Match3(Match3Rules::new(field, tuning.match3.clone())),
            GameKind::Maze => Variant::Maze(MazeRules::new(tuning.maze.clone())),
            GameKind::Merge => Variant::Merge(MergeRules::new(field, tuning.merge.clone())),
        }
    }

    pub fn kind(&self) -> GameKind {
        match self {
            Variant::Stack(_) => GameKind::Stack,
            Variant::Rhythm(_) => GameKind::Rhythm,
            Variant::Runner(_) => GameKind::Runner,
            Variant::Collector(_) => GameKind::Collector,
            Variant::Match3(_) => GameKind::Match3,
            Variant::Maze(_) => GameKind::Maze,
            Variant::Merge(_) => GameKind::Merge,
        }
    }

    pub fn rules(&self) -> &dyn Rules {
        match self {
            Variant::Stack(r) => r,
            Variant::Rhythm(r) => r,
            Variant::Runner(r) => r,
            Variant::Collector(r) => r,
            Variant::Match3(r) => r,
            Variant::Maze(r) => r,
            Variant::Merge(r) => r,
        }
    }

    pub fn rules_mut(&mut self) -> &mut dyn Rules {
        match self {
            Variant::Stack(r) => r,
            Variant::Rhythm(r) => r,
            Variant::Runner(r) => r,
            Variant::Collector(r) => r,
            Variant::Match3(r) => r,
            Variant::Maze(r) => r,
            Variant::Merge(r) => r,
        }
    }
}

/// Spawn a ring of cosmetic particles around `pos`
pub(crate) fn burst(session: &mut GameSession, pos: Vec2, count: usize, speed: f32, tag: u8) {
    for _ in 0..count {
        let angle = session.rng.random_range(0.0..TAU);
        let vel = Vec2::from_angle(angle) * speed * session.rng.random_range(0.5f32..1.0);
        session.spawn(|id| {
            Entity::new(id, EntityKind::Particle, pos, Shape::Circle { r: 3.0 })
                .with_velocity(vel)
                .with_tag(tag)
        });
    }
}
