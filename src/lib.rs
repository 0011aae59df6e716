//! Neon Arcade - deterministic mini-game engine
//!
//! Core modules:
//! - `arcade`: Host tying a game, progression, settings and feedback together
//! - `sim`: Deterministic simulation (entities, physics, collisions, game rules)
//! - `scheduler`: Frame loop lifecycle (one update + one render per frame)
//! - `progression`: Coins, skill shop, achievements, daily challenges
//! - `persistence`: Typed adapter over a key-value store
//! - `renderer`: Stateless full-redraw renderer onto a 2D surface
//! - `platform`: Browser/native platform abstraction (input, storage, web glue)
//! - `tuning`: Data-driven game balance

pub mod arcade;
pub mod feedback;
pub mod i18n;
pub mod persistence;
pub mod platform;
pub mod progression;
pub mod renderer;
pub mod scheduler;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use arcade::{Arcade, SessionReport};
pub use settings::Settings;
pub use sim::{GameKind, GameStatus};

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, the display rate the games were tuned for)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta fed into the accumulator (seconds)
    pub const MAX_FRAME_DELTA: f32 = 0.1;

    /// Coins awarded per point of terminal score (coins = floor(score / divisor))
    pub const COIN_DIVISOR: u64 = 10;

    /// Minimum travel (pixels) before a touch gesture counts as a swipe
    pub const SWIPE_MIN_DISTANCE: f32 = 30.0;

    /// Frames an achievement popup waits before being released to the UI
    pub const POPUP_DELAY_TICKS: u64 = 30;
}

/// Convert per-frame speeds (as tuned at 60 fps) into per-second speeds
#[inline]
pub fn per_frame(value: f32) -> f32 {
    value / consts::SIM_DT
}
