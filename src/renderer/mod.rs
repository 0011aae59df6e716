//! Stateless full-redraw renderer
//!
//! Every frame clears the surface and draws the playfield, the HUD and
//! whatever overlay the session status calls for. Nothing is cached between
//! frames, so a render can never disagree with the session it reads.

pub mod palette;
pub mod scene;
pub mod surface;

pub use surface::{Align, DrawCmd, DrawList, Rgba, Surface};

use crate::arcade::{Arcade, Popup};
use crate::i18n::Translate;
use crate::platform::storage::KeyValueStore;
use crate::sim::{GameKind, GameStatus, Variant};

const HUD_SIZE: f32 = 16.0;
const TITLE_SIZE: f32 = 36.0;
const MARGIN: f32 = 12.0;

/// Draw one frame of `arcade` onto `surface`
pub fn render<S: KeyValueStore>(
    surface: &mut dyn Surface,
    arcade: &Arcade<S>,
    tr: &dyn Translate,
    fps: Option<f32>,
) {
    let field = arcade.tuning().field;
    surface.clear(palette::BACKGROUND);
    scene::draw_playfield(
        surface,
        arcade.game(),
        field,
        arcade.settings().effective_particles(),
    );
    draw_hud(surface, arcade, tr);

    match arcade.game().status() {
        GameStatus::Idle => draw_idle(surface, arcade.kind(), tr, field.width, field.height),
        GameStatus::GameOver | GameStatus::Won => draw_result(surface, arcade, tr),
        GameStatus::Playing => {}
    }
    draw_popups(surface, arcade, tr);

    if let Some(fps) = fps {
        surface.text(
            field.width - MARGIN,
            field.height - MARGIN,
            &format!("{} {:.0}", tr.t("hud.fps"), fps),
            12.0,
            Align::Right,
            palette::TEXT_DIM,
        );
    }
}

fn draw_hud<S: KeyValueStore>(surface: &mut dyn Surface, arcade: &Arcade<S>, tr: &dyn Translate) {
    let session = &arcade.game().session;
    let kind = arcade.kind();
    let width = arcade.tuning().field.width;
    let mut y = MARGIN + HUD_SIZE;

    surface.text(
        MARGIN,
        y,
        &format!("{}: {}", tr.t("hud.score"), session.score),
        HUD_SIZE,
        Align::Left,
        palette::TEXT,
    );
    surface.text(
        width - MARGIN,
        y,
        &format!("{}: {}", tr.t("hud.best"), arcade.progression().high_score(kind)),
        HUD_SIZE,
        Align::Right,
        palette::TEXT_DIM,
    );
    y += HUD_SIZE + 4.0;

    let mut left = Vec::new();
    if kind.uses_lives() {
        left.push(format!("{}: {}", tr.t("hud.lives"), session.lives));
    }
    match &arcade.game().variant {
        Variant::Match3(rules) => {
            left.push(format!("{}: {}", tr.t("hud.moves"), rules.moves_left()));
        }
        Variant::Maze(rules) => {
            left.push(format!("{}: {:.0}", tr.t("hud.time"), rules.time_left().ceil()));
            left.push(format!("{}: {}", tr.t("hud.gems"), rules.gems_left(session)));
        }
        _ => left.push(format!("{}: {}", tr.t("hud.level"), session.difficulty)),
    }
    surface.text(MARGIN, y, &left.join("  "), HUD_SIZE * 0.8, Align::Left, palette::TEXT_DIM);
    surface.text(
        width - MARGIN,
        y,
        &format!("{}: {}", tr.t("status.coins"), arcade.progression().coins(kind)),
        HUD_SIZE * 0.8,
        Align::Right,
        palette::GOLD,
    );

    if session.combo > 1 {
        surface.text(
            width / 2.0,
            y + HUD_SIZE + 8.0,
            &format!("{} x{}", tr.t("hud.combo"), session.combo),
            HUD_SIZE * 1.2,
            Align::Center,
            palette::ACCENT,
        );
    }
}

fn draw_idle(surface: &mut dyn Surface, kind: GameKind, tr: &dyn Translate, w: f32, h: f32) {
    surface.fill_rect(0.0, 0.0, w, h, palette::OVERLAY);
    surface.text(
        w / 2.0,
        h / 2.0 - TITLE_SIZE,
        &tr.t(&format!("game.{}", kind.key())),
        TITLE_SIZE,
        Align::Center,
        palette::TEXT,
    );
    surface.text(w / 2.0, h / 2.0 + 10.0, &tr.t("status.idle"), HUD_SIZE, Align::Center, palette::TEXT_DIM);
}

fn draw_result<S: KeyValueStore>(surface: &mut dyn Surface, arcade: &Arcade<S>, tr: &dyn Translate) {
    let field = arcade.tuning().field;
    let (cx, cy) = (field.width / 2.0, field.height / 2.0);
    surface.fill_rect(0.0, 0.0, field.width, field.height, palette::OVERLAY);

    let (title, color) = if arcade.game().status() == GameStatus::Won {
        (tr.t("status.won"), palette::ACCENT)
    } else {
        (tr.t("status.gameOver"), palette::DANGER)
    };
    surface.text(cx, cy - 80.0, &title, TITLE_SIZE, Align::Center, color);

    let score = arcade.game().session.score;
    surface.text(
        cx,
        cy - 30.0,
        &format!("{}: {}", tr.t("hud.score"), score),
        HUD_SIZE * 1.4,
        Align::Center,
        palette::TEXT,
    );

    if let Some(report) = arcade.report() {
        let settlement = &report.settlement;
        surface.text(
            cx,
            cy,
            &format!("+{} {}", settlement.coins_awarded, tr.t("status.coins")),
            HUD_SIZE,
            Align::Center,
            palette::GOLD,
        );
        if settlement.new_high_score && report.score > 0 {
            surface.text(cx, cy + 26.0, &tr.t("status.newHighScore"), HUD_SIZE, Align::Center, palette::ACCENT);
        }
    }
    surface.text(cx, cy + 70.0, &tr.t("status.restart"), HUD_SIZE, Align::Center, palette::TEXT_DIM);
}

fn draw_popups<S: KeyValueStore>(surface: &mut dyn Surface, arcade: &Arcade<S>, tr: &dyn Translate) {
    let width = arcade.tuning().field.width;
    let mut y = 110.0;
    for popup in arcade.popups() {
        let text = match popup {
            Popup::HighScore { score } => format!("{} {}", tr.t("status.newHighScore"), score),
            Popup::Achievement { id, reward } => format!(
                "{}: {} (+{})",
                tr.t("achievement.unlocked"),
                tr.t(&format!("achievement.{id}")),
                reward
            ),
            Popup::DailyComplete { reward } => format!("{} (+{})", tr.t("daily.complete"), reward),
        };
        surface.fill_rect(MARGIN, y - 22.0, width - MARGIN * 2.0, 32.0, palette::OVERLAY);
        surface.stroke_rect(MARGIN, y - 22.0, width - MARGIN * 2.0, 32.0, 2.0, palette::GOLD);
        surface.text(width / 2.0, y, &text, HUD_SIZE * 0.9, Align::Center, palette::GOLD);
        y += 40.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::NullFeedback;
    use crate::i18n::English;
    use crate::platform::storage::MemoryStore;
    use crate::progression::FixedClock;
    use crate::tuning::Tuning;
    use chrono::NaiveDate;

    fn arcade(kind: GameKind) -> Arcade<MemoryStore> {
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        let mut arcade = Arcade::new(
            MemoryStore::new(),
            Box::new(clock),
            Box::new(NullFeedback),
            Tuning::default(),
            11,
        );
        arcade.select(kind);
        arcade
    }

    #[test]
    fn test_idle_shows_title_and_prompt() {
        let arcade = arcade(GameKind::Runner);
        let mut list = DrawList::new();
        render(&mut list, &arcade, &English, None);
        assert!(matches!(list.commands[0], DrawCmd::Clear(_)));
        assert!(list.has_text("Endless Runner"));
        assert!(list.has_text("Tap to start"));
        assert!(!list.has_text("FPS"));
    }

    #[test]
    fn test_playing_hud_per_variant() {
        let mut maze = arcade(GameKind::Maze);
        maze.start();
        let mut list = DrawList::new();
        render(&mut list, &maze, &English, Some(59.6));
        assert!(list.has_text("Time: "));
        assert!(list.has_text("Gems: "));
        assert!(list.has_text("FPS 60"));
        assert!(!list.has_text("Tap to start"));

        let mut collector = arcade(GameKind::Collector);
        collector.start();
        render(&mut list, &collector, &English, None);
        assert!(list.has_text("Lives: 3"));
        assert!(!list.has_text("Time: "));
    }

    #[test]
    fn test_render_is_repeatable() {
        let mut arcade = arcade(GameKind::Merge);
        arcade.start();
        let mut first = DrawList::new();
        let mut second = DrawList::new();
        render(&mut first, &arcade, &English, None);
        render(&mut second, &arcade, &English, None);
        assert_eq!(first.commands, second.commands);
    }

    #[test]
    fn test_game_over_overlay() {
        let mut arcade = arcade(GameKind::Stack);
        arcade.start();
        // the first tap lands half off the base; keep tapping until the tower falls
        for i in 0..20_000 {
            if !arcade.is_playing() {
                break;
            }
            if i % 41 == 0 {
                arcade.handle_input(&crate::platform::input::InputEvent::Key("Space".into()));
            }
            arcade.update(1);
        }
        let mut list = DrawList::new();
        render(&mut list, &arcade, &English, None);
        assert!(list.has_text("Game Over"));
        assert!(list.has_text("Tap to play again"));
        assert!(list.has_text(" Coins"));
    }
}
