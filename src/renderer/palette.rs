//! Neon color palette

use super::surface::Rgba;
use crate::sim::entity::COLOR_TAGS;

pub const BACKGROUND: Rgba = [0.02, 0.02, 0.05, 1.0];
pub const GRID: Rgba = [0.12, 0.12, 0.2, 1.0];
pub const WALL: Rgba = [0.3, 0.3, 0.4, 1.0];
pub const TEXT: Rgba = [0.95, 0.95, 1.0, 1.0];
pub const TEXT_DIM: Rgba = [0.6, 0.6, 0.75, 1.0];
pub const ACCENT: Rgba = [0.2, 0.8, 0.4, 1.0];
pub const GOLD: Rgba = [0.9, 0.85, 0.3, 1.0];
pub const DANGER: Rgba = [1.0, 0.4, 0.2, 1.0];
pub const OVERLAY: Rgba = [0.0, 0.0, 0.0, 0.6];

pub const BLOCK: Rgba = [0.4, 0.7, 1.0, 1.0];
pub const MOVING_BLOCK: Rgba = [0.6, 0.85, 1.0, 1.0];
pub const DEBRIS: Rgba = [0.7, 0.7, 0.8, 0.8];
pub const PLAYER: Rgba = [0.2, 0.8, 0.4, 1.0];
pub const OBSTACLE: Rgba = [1.0, 0.4, 0.2, 1.0];
pub const BALL: Rgba = [1.0, 1.0, 1.0, 1.0];
pub const EXIT_LOCKED: Rgba = [0.4, 0.2, 0.2, 1.0];
pub const EXIT_OPEN: Rgba = [0.2, 0.9, 0.5, 1.0];
pub const HIT_LINE: Rgba = [0.6, 0.2, 0.8, 1.0];

/// Colors for tagged entities and match-3 tiles, indexed by tag
const TAGS: [Rgba; COLOR_TAGS as usize] = [
    [1.0, 0.25, 0.45, 1.0],
    [0.25, 0.85, 1.0, 1.0],
    [1.0, 0.85, 0.2, 1.0],
    [0.45, 1.0, 0.35, 1.0],
    [0.75, 0.4, 1.0, 1.0],
    [1.0, 0.55, 0.15, 1.0],
];

pub fn tag_color(tag: u8) -> Rgba {
    TAGS[tag as usize % TAGS.len()]
}

/// Merge tile color: brighter and warmer as the value doubles
pub fn tile_color(value: u32) -> Rgba {
    if value == 0 {
        return GRID;
    }
    let t = ((value.max(2).ilog2() - 1) as f32 / 10.0).clamp(0.0, 1.0);
    [0.3 + 0.7 * t, 0.7 - 0.4 * t, 1.0 - 0.8 * t, 1.0]
}

pub fn with_alpha(color: Rgba, alpha: f32) -> Rgba {
    [color[0], color[1], color[2], color[3] * alpha.clamp(0.0, 1.0)]
}

/// Lighten toward white by `amount` (0..1)
pub fn lighten(color: Rgba, amount: f32) -> Rgba {
    let k = amount.clamp(0.0, 1.0);
    [
        color[0] + (1.0 - color[0]) * k,
        color[1] + (1.0 - color[1]) * k,
        color[2] + (1.0 - color[2]) * k,
        color[3],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_color_ramps() {
        assert_eq!(tile_color(0), GRID);
        let low = tile_color(2);
        let high = tile_color(2048);
        assert!(high[0] > low[0]);
        assert!(high[2] < low[2]);
    }

    #[test]
    fn test_tag_color_wraps() {
        assert_eq!(tag_color(0), tag_color(6));
    }
}
