//! Collision detection and response for axis-aligned games
//!
//! Everything here is pure geometry over [`Entity`] shapes. Rect/rect uses a
//! strict AABB test (touching edges do not collide), circle/circle compares
//! centre distance against the radius sum, and circle/rect clamps the circle
//! centre onto the rectangle to find the closest point.

use glam::Vec2;

use super::entity::{Aabb, Entity, EntityId, Shape};

/// Overlap above this fraction of the moving block counts as a perfect placement
pub const PERFECT_OVERLAP: f32 = 0.95;

/// Result of a circle-vs-rect contact check
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// Surface normal pointing from the rectangle toward the circle
    pub normal: Vec2,
    /// Penetration depth along the normal (for position correction)
    pub penetration: f32,
}

/// Whether two entities overlap
pub fn detect_collision(a: &Entity, b: &Entity) -> bool {
    match (a.shape, b.shape) {
        (Shape::Rect { .. }, Shape::Rect { .. }) => aabb_overlap(&a.aabb(), &b.aabb()),
        (Shape::Circle { r: ra }, Shape::Circle { r: rb }) => {
            a.pos.distance_squared(b.pos) < (ra + rb) * (ra + rb)
        }
        (Shape::Circle { r }, Shape::Rect { .. }) => circle_rect_overlap(a.pos, r, &b.aabb()),
        (Shape::Rect { .. }, Shape::Circle { r }) => circle_rect_overlap(b.pos, r, &a.aabb()),
    }
}

/// Strict AABB test
pub fn aabb_overlap(a: &Aabb, b: &Aabb) -> bool {
    a.left < b.right && a.right > b.left && a.top < b.bottom && a.bottom > b.top
}

fn closest_point(center: Vec2, rect: &Aabb) -> Vec2 {
    Vec2::new(
        center.x.clamp(rect.left, rect.right),
        center.y.clamp(rect.top, rect.bottom),
    )
}

fn circle_rect_overlap(center: Vec2, radius: f32, rect: &Aabb) -> bool {
    center.distance_squared(closest_point(center, rect)) < radius * radius
}

/// Contact between a circle and a rectangle, if any
///
/// When the centre lies inside the rectangle the normal is taken along the
/// axis of least penetration so the circle gets pushed out the short way.
pub fn circle_rect_contact(center: Vec2, radius: f32, rect: &Aabb) -> Option<Contact> {
    let closest = closest_point(center, rect);
    let delta = center - closest;
    let dist_sq = delta.length_squared();

    if dist_sq > 0.0 {
        if dist_sq >= radius * radius {
            return None;
        }
        let dist = dist_sq.sqrt();
        return Some(Contact {
            normal: delta / dist,
            penetration: radius - dist,
        });
    }

    // Centre inside the rectangle
    let to_left = center.x - rect.left;
    let to_right = rect.right - center.x;
    let to_top = center.y - rect.top;
    let to_bottom = rect.bottom - center.y;
    let min = to_left.min(to_right).min(to_top).min(to_bottom);

    let (normal, depth) = if min == to_left {
        (Vec2::NEG_X, to_left)
    } else if min == to_right {
        (Vec2::X, to_right)
    } else if min == to_top {
        (Vec2::NEG_Y, to_top)
    } else {
        (Vec2::Y, to_bottom)
    };
    Some(Contact {
        normal,
        penetration: depth + radius,
    })
}

/// Push a circular entity out of a rectangle and reflect its velocity
///
/// Returns true if a contact was resolved.
pub fn resolve_circle_rect(entity: &mut Entity, rect: &Aabb, damping: f32) -> bool {
    let Some(contact) = circle_rect_contact(entity.pos, entity.radius(), rect) else {
        return false;
    };
    entity.pos += contact.normal * contact.penetration;
    // Only reflect when moving into the surface
    if entity.vel.dot(contact.normal) < 0.0 {
        entity.vel = reflect_velocity(entity.vel, contact.normal) * damping;
    }
    true
}

/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Pick the candidate with the smallest distance
///
/// `distance` is evaluated once per candidate; exact ties go to the lowest
/// entity id, so the result never depends on iteration order.
pub fn closest_by<'a, I, F>(candidates: I, mut distance: F) -> Option<&'a Entity>
where
    I: IntoIterator<Item = &'a Entity>,
    F: FnMut(&Entity) -> f32,
{
    let mut best: Option<(&Entity, f32)> = None;
    for e in candidates {
        let d = distance(e).abs();
        best = match best {
            None => Some((e, d)),
            Some((cur, cd)) if d < cd || (d == cd && e.id < cur.id) => Some((e, d)),
            keep => keep,
        };
    }
    best.map(|(e, _)| e)
}

/// Id of the closest candidate within `window` of a reference value
pub fn closest_within<'a, I, F>(candidates: I, window: f32, mut distance: F) -> Option<EntityId>
where
    I: IntoIterator<Item = &'a Entity>,
    F: FnMut(&Entity) -> f32,
{
    let in_window: Vec<&Entity> = candidates
        .into_iter()
        .filter(|e| distance(e).abs() < window)
        .collect();
    closest_by(in_window, &mut distance).map(|e| e.id)
}

/// Horizontal overlap of `moving` onto `base` as a fraction of the moving width
pub fn overlap_fraction(moving: &Aabb, base: &Aabb) -> f32 {
    let width = moving.width();
    if width <= 0.0 {
        return 0.0;
    }
    let overlap = moving.right.min(base.right) - moving.left.max(base.left);
    overlap.max(0.0) / width
}

/// How a block landed on the one below
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// No overlap at all
    Miss,
    /// Nearly aligned, width preserved
    Perfect,
    /// Partially overlapping; the overhang is trimmed
    Partial { fraction: f32 },
}

/// Classify an overlap fraction
pub fn classify_placement(fraction: f32) -> Placement {
    if fraction <= 0.0 {
        Placement::Miss
    } else if fraction > PERFECT_OVERLAP {
        Placement::Perfect
    } else {
        Placement::Partial { fraction }
    }
}
