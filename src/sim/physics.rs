//! Velocity integration and boundary rules
//!
//! Each variant describes how its entities move with a [`Motion`]: optional
//! gravity, optional friction, and an independent boundary policy per axis.

use glam::Vec2;

use super::entity::Entity;

/// What happens when an entity reaches the edge of an axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisPolicy {
    /// No boundary on this axis
    Free,
    /// Leaving past one edge re-enters from beyond the opposite edge
    Wrap { min: f32, max: f32 },
    /// Clamp inside `[min, max]` (accounting for the shape) and reflect,
    /// scaling the reflected speed by `damping`
    Bounce { min: f32, max: f32, damping: f32 },
    /// Entity leaves the active set once fully outside `[min, max]`
    Remove { min: f32, max: f32 },
}

/// Movement description for a family of entities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Acceleration applied every step (pixels/s²), `Vec2::ZERO` for none
    pub gravity: Vec2,
    /// Multiplicative velocity decay per 60 Hz step (1.0 = none)
    pub friction: f32,
    pub x: AxisPolicy,
    pub y: AxisPolicy,
}

impl Motion {
    /// Plain ballistic motion with no boundaries
    pub const fn free() -> Self {
        Self {
            gravity: Vec2::ZERO,
            friction: 1.0,
            x: AxisPolicy::Free,
            y: AxisPolicy::Free,
        }
    }

    pub const fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub const fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub const fn with_x(mut self, policy: AxisPolicy) -> Self {
        self.x = policy;
        self
    }

    pub const fn with_y(mut self, policy: AxisPolicy) -> Self {
        self.y = policy;
        self
    }
}

/// Outcome of advancing an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Kept,
    /// Entity crossed a `Remove` boundary and should leave the session
    Removed,
    /// Entity bounced off a boundary this step
    Bounced,
}

/// Integrate one step and apply boundary rules
pub fn advance(entity: &mut Entity, motion: &Motion, dt: f32) -> Advance {
    entity.vel += motion.gravity * dt;
    if motion.friction < 1.0 {
        // Friction is tuned per 60 Hz frame; scale for other step sizes
        let decay = motion.friction.powf(dt * 60.0);
        entity.vel *= decay;
    }
    entity.pos += entity.vel * dt;

    let half = entity.shape.half_extents();
    let x = apply_axis(&mut entity.pos.x, &mut entity.vel.x, half.x, motion.x);
    let y = apply_axis(&mut entity.pos.y, &mut entity.vel.y, half.y, motion.y);

    if x == Advance::Removed || y == Advance::Removed {
        Advance::Removed
    } else if x == Advance::Bounced || y == Advance::Bounced {
        Advance::Bounced
    } else {
        Advance::Kept
    }
}

fn apply_axis(pos: &mut f32, vel: &mut f32, half: f32, policy: AxisPolicy) -> Advance {
    match policy {
        AxisPolicy::Free => Advance::Kept,
        AxisPolicy::Wrap { min, max } => {
            // Direction-aware so an entity re-entering from outside is not wrapped back
            if *pos > max && *vel >= 0.0 {
                *pos = min - (*pos - max);
            } else if *pos < min && *vel < 0.0 {
                *pos = max + (min - *pos);
            }
            Advance::Kept
        }
        AxisPolicy::Bounce { min, max, damping } => {
            if *pos - half < min {
                *pos = min + half;
                *vel = vel.abs() * damping;
                Advance::Bounced
            } else if *pos + half > max {
                *pos = max - half;
                *vel = -vel.abs() * damping;
                Advance::Bounced
            } else {
                Advance::Kept
            }
        }
        AxisPolicy::Remove { min, max } => {
            if *pos - half > max || *pos + half < min {
                Advance::Removed
            } else {
                Advance::Kept
            }
        }
    }
}

/// Advance every entity matching `filter`, dropping those that leave the set.
/// Returns the removed entities (in id order) so rules can react to them.
pub fn advance_all(
    entities: &mut Vec<Entity>,
    motion: &Motion,
    dt: f32,
    mut filter: impl FnMut(&Entity) -> bool,
) -> Vec<Entity> {
    let mut removed = Vec::new();
    entities.retain_mut(|e| {
        if !filter(e) {
            return true;
        }
        if advance(e, motion, dt) == Advance::Removed {
            removed.push(e.clone());
            false
        } else {
            true
        }
    });
    removed
}

/// Age particles and drop the dead ones
pub fn age_particles(entities: &mut Vec<Entity>, dt: f32, fade_per_sec: f32) {
    use super::entity::EntityKind;

    for e in entities.iter_mut().filter(|e| e.kind == EntityKind::Particle) {
        e.pos += e.vel * dt;
        e.vel *= 0.96;
        e.life -= fade_per_sec * dt;
    }
    entities.retain(|e| e.kind != EntityKind::Particle || e.life > 0.0);
}
