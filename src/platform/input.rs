//! Raw input to logical actions
//!
//! Browser listeners hand over key codes, pointer positions and touch
//! start/end points; this module turns them into [`Action`]s for the
//! active game. Nothing here touches session state.

use glam::Vec2;

use crate::consts::SWIPE_MIN_DISTANCE;
use crate::sim::{Action, Direction, GameKind};

/// Rhythm lane keys, left to right
const LANE_KEYS: [&str; 4] = ["KeyD", "KeyF", "KeyJ", "KeyK"];

/// Raw input as delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer or touch down, already in playfield coordinates
    PointerDown { x: f32, y: f32 },
    /// `KeyboardEvent.code`
    Key(String),
    /// Finished touch gesture
    Swipe { dx: f32, dy: f32 },
}

/// Map one raw event for the given game; `None` means ignore
pub fn map_event(kind: GameKind, event: &InputEvent) -> Option<Action> {
    match event {
        InputEvent::PointerDown { x, y } => Some(Action::Pointer { x: *x, y: *y }),
        InputEvent::Key(code) => map_key(kind, code),
        InputEvent::Swipe { dx, dy } => classify_swipe(*dx, *dy).map(Action::Direction),
    }
}

pub fn map_key(kind: GameKind, code: &str) -> Option<Action> {
    if kind == GameKind::Rhythm
        && let Some(lane) = LANE_KEYS.iter().position(|&k| k == code)
    {
        return Some(Action::Lane(lane as u8));
    }
    let dir = match code {
        "Space" | "Enter" => return Some(Action::Primary),
        "ArrowUp" | "KeyW" => Direction::Up,
        "ArrowDown" | "KeyS" => Direction::Down,
        "ArrowLeft" | "KeyA" => Direction::Left,
        "ArrowRight" | "KeyD" => Direction::Right,
        _ => return None,
    };
    Some(Action::Direction(dir))
}

/// Dominant-axis swipe direction; short gestures are not swipes
pub fn classify_swipe(dx: f32, dy: f32) -> Option<Direction> {
    if dx.abs().max(dy.abs()) < SWIPE_MIN_DISTANCE {
        return None;
    }
    Some(if dx.abs() > dy.abs() {
        if dx > 0.0 { Direction::Right } else { Direction::Left }
    } else if dy > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    })
}

/// Tracks touch start points so touch end can be classified
#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    start: Option<Vec2>,
}

impl SwipeTracker {
    pub fn begin(&mut self, x: f32, y: f32) {
        self.start = Some(Vec2::new(x, y));
    }

    pub fn end(&mut self, x: f32, y: f32) -> Option<InputEvent> {
        let start = self.start.take()?;
        let delta = Vec2::new(x, y) - start;
        classify_swipe(delta.x, delta.y)?;
        Some(InputEvent::Swipe {
            dx: delta.x,
            dy: delta.y,
        })
    }

    pub fn cancel(&mut self) {
        self.start = None;
    }
}

/// Convert a client-space point into playfield coordinates
///
/// `rect` is the canvas bounding box as (left, top, width, height).
pub fn to_field(client: Vec2, rect: (f32, f32, f32, f32), field: Vec2) -> Vec2 {
    let (left, top, width, height) = rect;
    if width <= 0.0 || height <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(
        (client.x - left) / width * field.x,
        (client.y - top) / height * field.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swipe_below_threshold_ignored() {
        assert_eq!(classify_swipe(29.0, 0.0), None);
        assert_eq!(classify_swipe(-10.0, 20.0), None);
    }

    #[test]
    fn test_swipe_dominant_axis() {
        assert_eq!(classify_swipe(40.0, 10.0), Some(Direction::Right));
        assert_eq!(classify_swipe(-40.0, 39.0), Some(Direction::Left));
        assert_eq!(classify_swipe(5.0, 31.0), Some(Direction::Down));
        assert_eq!(classify_swipe(12.0, -80.0), Some(Direction::Up));
    }

    #[test]
    fn test_lane_keys_only_in_rhythm() {
        assert_eq!(map_key(GameKind::Rhythm, "KeyD"), Some(Action::Lane(0)));
        assert_eq!(map_key(GameKind::Rhythm, "KeyK"), Some(Action::Lane(3)));
        assert_eq!(
            map_key(GameKind::Maze, "KeyD"),
            Some(Action::Direction(Direction::Right))
        );
        assert_eq!(map_key(GameKind::Stack, "KeyJ"), None);
    }

    #[test]
    fn test_primary_keys() {
        assert_eq!(map_key(GameKind::Runner, "Space"), Some(Action::Primary));
        assert_eq!(map_key(GameKind::Stack, "Enter"), Some(Action::Primary));
    }

    #[test]
    fn test_tracker_emits_swipe_once() {
        let mut tracker = SwipeTracker::default();
        tracker.begin(100.0, 100.0);
        assert_eq!(
            tracker.end(100.0, 160.0),
            Some(InputEvent::Swipe { dx: 0.0, dy: 60.0 })
        );
        assert_eq!(tracker.end(100.0, 300.0), None);

        tracker.begin(0.0, 0.0);
        assert_eq!(tracker.end(5.0, 5.0), None);
    }

    #[test]
    fn test_to_field_scales() {
        let p = to_field(
            Vec2::new(150.0, 350.0),
            (50.0, 50.0, 200.0, 300.0),
            Vec2::new(400.0, 600.0),
        );
        assert_eq!(p, Vec2::new(200.0, 600.0));
    }
}
