//! Entity model shared by every variant
//!
//! Entities are plain data. Position is always the shape's centre so
//! rectangles and circles share one coordinate convention.

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Distinct colour tags the renderer can tell apart
pub const COLOR_TAGS: u8 = 6;

/// Per-session monotonically increasing identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// What an entity represents (used by rules and the renderer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Placed stack block (static)
    Block,
    /// Stack block currently sliding back and forth
    MovingBlock,
    /// Trimmed overhang falling away
    Debris,
    /// Rhythm note travelling down a lane
    Note,
    /// Runner player
    Runner,
    /// Runner obstacle
    Obstacle,
    /// Collectible coin (runner)
    Coin,
    /// Falling ball to catch (collector)
    Drop,
    /// Collector paddle
    Catcher,
    /// Maze ball
    Ball,
    /// Maze gem
    Gem,
    /// Cosmetic particle
    Particle,
}

/// Collision shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rect { w: f32, h: f32 },
    Circle { r: f32 },
}

impl Shape {
    /// Half extents of the shape's bounding box
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Shape::Rect { w, h } => Vec2::new(w / 2.0, h / 2.0),
            Shape::Circle { r } => Vec2::splat(r),
        }
    }
}

bitflags! {
    /// Per-entity state bits read by the rules and the renderer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Flags: u8 {
        /// Runner is standing on the ground and may jump
        const GROUNDED = 1 << 0;
        /// Block was placed within the perfect window
        const PERFECT  = 1 << 1;
    }
}

/// Axis-aligned bounds (screen coordinates, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Aabb {
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            left: center.x - half.x,
            top: center.y - half.y,
            right: center.x + half.x,
            bottom: center.y + half.y,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }
}

/// A movable simulation object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub shape: Shape,
    pub flags: Flags,
    /// Lane or colour index, meaning depends on the variant
    pub tag: u8,
    /// Remaining life for particles (1.0 -> 0.0); 1.0 for everything else
    pub life: f32,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, pos: Vec2, shape: Shape) -> Self {
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            shape,
            flags: Flags::empty(),
            tag: 0,
            life: 1.0,
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_tag(mut self, tag: u8) -> Self {
        self.tag = tag;
        self
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, self.shape.half_extents())
    }

    /// Radius for circular entities, half-width otherwise
    pub fn radius(&self) -> f32 {
        match self.shape {
            Shape::Circle { r } => r,
            Shape::Rect { w, .. } => w / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.shape.half_extents().x * 2.0
    }

    pub fn is(&self, flag: Flags) -> bool {
        self.flags.contains(flag)
    }
}
