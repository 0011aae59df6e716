//! Playfield drawing: per-variant backdrop, then every entity

use super::palette;
use super::surface::Surface;
use crate::sim::entity::{Entity, EntityKind, Flags, Shape};
use crate::sim::variants::{Match3Rules, MazeRules, MergeRules, RhythmRules, RunnerRules};
use crate::sim::{Game, GameSession, Variant};
use crate::tuning::Field;

/// Draw the variant backdrop and all entities
pub fn draw_playfield(surface: &mut dyn Surface, game: &Game, field: Field, particles: bool) {
    let session = &game.session;
    match &game.variant {
        Variant::Rhythm(rules) => draw_lanes(surface, rules, field),
        Variant::Runner(rules) => draw_ground(surface, rules, field),
        Variant::Match3(rules) => draw_board(surface, rules),
        Variant::Maze(rules) => draw_maze(surface, rules, session),
        Variant::Merge(rules) => draw_grid(surface, rules),
        Variant::Stack(_) | Variant::Collector(_) => {}
    }
    for entity in &session.entities {
        if entity.kind == EntityKind::Particle && !particles {
            continue;
        }
        draw_entity(surface, entity);
    }
}

pub fn draw_entity(surface: &mut dyn Surface, entity: &Entity) {
    let color = match entity.kind {
        EntityKind::Block => palette::BLOCK,
        EntityKind::MovingBlock => palette::MOVING_BLOCK,
        EntityKind::Debris => palette::DEBRIS,
        EntityKind::Note | EntityKind::Drop => palette::tag_color(entity.tag),
        EntityKind::Runner | EntityKind::Catcher => palette::PLAYER,
        EntityKind::Obstacle => palette::OBSTACLE,
        EntityKind::Coin | EntityKind::Gem => palette::GOLD,
        EntityKind::Ball => palette::BALL,
        EntityKind::Particle => {
            palette::with_alpha(palette::tag_color(entity.tag), entity.life)
        }
    };
    let color = if entity.is(Flags::PERFECT) {
        palette::lighten(color, 0.5)
    } else {
        color
    };
    match entity.shape {
        Shape::Rect { .. } => {
            let b = entity.aabb();
            surface.fill_rect(b.left, b.top, b.width(), b.height(), color);
        }
        Shape::Circle { r } => surface.fill_circle(entity.pos.x, entity.pos.y, r, color),
    }
}

fn draw_lanes(surface: &mut dyn Surface, rules: &RhythmRules, field: Field) {
    let w = rules.lane_width();
    for lane in 0..rules.lanes() {
        let x = lane as f32 * w;
        if rules.is_flashing(lane) {
            let flash = palette::with_alpha(palette::tag_color(lane), 0.25);
            surface.fill_rect(x, 0.0, w, field.height, flash);
        }
        if lane > 0 {
            surface.line(x, 0.0, x, field.height, 1.0, palette::GRID);
        }
    }
    let y = rules.hit_line();
    surface.line(0.0, y, field.width, y, 3.0, palette::HIT_LINE);
}

fn draw_ground(surface: &mut dyn Surface, rules: &RunnerRules, field: Field) {
    let y = rules.ground();
    surface.fill_rect(0.0, y, field.width, field.height - y, palette::GRID);
    surface.line(0.0, y, field.width, y, 2.0, palette::ACCENT);
}

fn draw_board(surface: &mut dyn Surface, rules: &Match3Rules) {
    let board = rules.board();
    let cell = rules.cell_size();
    let top = rules.origin_y();
    let gap = 2.0;
    for y in 0..board.size() {
        for x in 0..board.size() {
            let px = x as f32 * cell;
            let py = top + y as f32 * cell;
            surface.fill_rect(px, py, cell, cell, palette::GRID);
            if let Some(color) = board.get(x, y) {
                surface.fill_circle(
                    px + cell / 2.0,
                    py + cell / 2.0,
                    cell / 2.0 - gap * 2.0,
                    palette::tag_color(color),
                );
            }
        }
    }
    if let Some((x, y)) = rules.selected() {
        let px = x as f32 * cell;
        let py = top + y as f32 * cell;
        surface.stroke_rect(px + gap, py + gap, cell - gap * 2.0, cell - gap * 2.0, 3.0, palette::TEXT);
    }
    for i in 0..=board.size() {
        let offset = i as f32 * cell;
        let extent = board.size() as f32 * cell;
        surface.line(offset, top, offset, top + extent, 1.0, palette::BACKGROUND);
        surface.line(0.0, top + offset, extent, top + offset, 1.0, palette::BACKGROUND);
    }
}

fn draw_maze(surface: &mut dyn Surface, rules: &MazeRules, session: &GameSession) {
    let Some(layout) = rules.layout() else {
        return;
    };
    let cell = rules.cell();
    for y in 0..layout.rows {
        for x in 0..layout.cols {
            if layout.is_wall(x, y) {
                surface.fill_rect(x as f32 * cell, y as f32 * cell, cell, cell, palette::WALL);
            }
        }
    }
    let (ex, ey) = layout.exit;
    let exit = if rules.gems_left(session) == 0 {
        palette::EXIT_OPEN
    } else {
        palette::EXIT_LOCKED
    };
    surface.fill_rect(ex as f32 * cell + 4.0, ey as f32 * cell + 4.0, cell - 8.0, cell - 8.0, exit);
}

fn draw_grid(surface: &mut dyn Surface, rules: &MergeRules) {
    let grid = rules.grid();
    let cell = rules.cell_size();
    let top = rules.origin_y();
    let pad = 4.0;
    for y in 0..grid.size() {
        for x in 0..grid.size() {
            let value = grid.get(x, y);
            let px = x as f32 * cell + pad;
            let py = top + y as f32 * cell + pad;
            let side = cell - pad * 2.0;
            surface.fill_rect(px, py, side, side, palette::tile_color(value));
            if value > 0 {
                let size = if value >= 1024 { side * 0.3 } else { side * 0.4 };
                surface.text(
                    px + side / 2.0,
                    py + side / 2.0 + size / 3.0,
                    &value.to_string(),
                    size,
                    super::surface::Align::Center,
                    palette::BACKGROUND,
                );
            }
        }
    }
}
