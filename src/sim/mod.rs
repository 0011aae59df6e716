//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod entity;
pub mod physics;
pub mod state;
pub mod tick;
pub mod timers;
pub mod variants;

pub use entity::{Aabb, Entity, EntityId, EntityKind, Shape};
pub use state::{
    Action, Deferred, Direction, GameEvent, GameKind, GameSession, GameStatus, Modifiers,
    SessionStats,
};
pub use tick::{Game, TickInput, tick};
pub use variants::{Rules, Variant};
