//! Display strings
//!
//! The engine never hardcodes user-facing text in the renderer; it asks a
//! [`Translate`] implementation for a key. English ships built in.

/// Translation lookup provided by the host
pub trait Translate {
    /// Display string for `key`, or `None` if unknown
    fn lookup(&self, key: &str) -> Option<String>;

    /// Display string for `key`, falling back to the key itself
    fn t(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_else(|| key.to_string())
    }
}

/// Built-in English strings
#[derive(Debug, Clone, Copy, Default)]
pub struct English;

impl English {
    fn text(key: &str) -> Option<&'static str> {
        Some(match key {
            "game.stack" => "Tower Stack",
            "game.rhythm" => "Rhythm Tapper",
            "game.runner" => "Endless Runner",
            "game.collector" => "Color Catch",
            "game.match3" => "Match 3",
            "game.maze" => "Labyrinth",
            "game.merge" => "2048",
            "hud.score" => "Score",
            "hud.best" => "Best",
            "hud.combo" => "Combo",
            "hud.lives" => "Lives",
            "hud.level" => "Level",
            "hud.moves" => "Moves",
            "hud.time" => "Time",
            "hud.gems" => "Gems",
            "hud.fps" => "FPS",
            "status.idle" => "Tap to start",
            "status.gameOver" => "Game Over",
            "status.won" => "You Win!",
            "status.restart" => "Tap to play again",
            "status.newHighScore" => "New high score!",
            "status.coins" => "Coins",
            "daily.title" => "Daily Challenge",
            "daily.complete" => "Challenge complete!",
            "achievement.unlocked" => "Achievement unlocked",
            "achievement.first_game" => "First Steps",
            "achievement.score_1000" => "Four Digits",
            "achievement.score_5000" => "High Roller",
            "achievement.combo_5" => "On a Roll",
            "achievement.combo_10" => "Unstoppable",
            "achievement.perfect_ten" => "Perfectionist",
            "achievement.first_win" => "Victory",
            "achievement.veteran" => "Veteran",
            "achievement.explorer" => "Explorer",
            "achievement.streak_keeper" => "Streak Keeper",
            "skill.extra_life" => "Extra Life",
            "skill.slow_start" => "Slow Start",
            "skill.coin_magnet" => "Coin Magnet",
            "shop.insufficientFunds" => "Not enough coins",
            _ => return None,
        })
    }
}

impl Translate for English {
    fn lookup(&self, key: &str) -> Option<String> {
        Self::text(key).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GameKind;

    #[test]
    fn test_every_game_has_a_title() {
        for kind in GameKind::ALL {
            assert!(English.lookup(&format!("game.{}", kind.key())).is_some());
        }
    }

    #[test]
    fn test_every_achievement_and_skill_has_a_name() {
        for def in crate::progression::ALL_ACHIEVEMENTS {
            assert!(English.lookup(&format!("achievement.{}", def.id)).is_some(), "{}", def.id);
        }
        for skill in crate::progression::Skill::ALL {
            assert!(English.lookup(&format!("skill.{}", skill.id())).is_some());
        }
    }

    #[test]
    fn test_unknown_key_falls_back_to_key() {
        assert_eq!(English.t("hud.combo"), "Combo");
        assert_eq!(English.t("no.such.key"), "no.such.key");
    }
}
