//! Game balance tables
//!
//! Speeds and accelerations are expressed per 60 Hz frame, which is how the
//! games were tuned. Rules convert them with [`crate::per_frame`].

use serde::{Deserialize, Serialize};

/// Playfield size shared by every variant (logical pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 600.0,
        }
    }
}

/// Monotonic difficulty levels stepped at fixed progress thresholds
///
/// Level 1 applies below the first threshold; each threshold reached adds a
/// level. The speed multiplier grows linearly with the level and is capped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyCurve {
    pub thresholds: Vec<u64>,
    pub speed_step: f32,
    pub max_speed: f32,
}

impl DifficultyCurve {
    /// A level every `step` points, up to `max_level`
    pub fn every(step: u64, max_level: u32, speed_step: f32, max_speed: f32) -> Self {
        let thresholds = (1..max_level.max(1) as u64).map(|i| i * step).collect();
        Self {
            thresholds,
            speed_step,
            max_speed,
        }
    }

    pub fn max_level(&self) -> u32 {
        self.thresholds.len() as u32 + 1
    }

    pub fn level_for(&self, progress: u64) -> u32 {
        1 + self.thresholds.iter().filter(|&&t| progress >= t).count() as u32
    }

    pub fn speed_multiplier(&self, level: u32) -> f32 {
        let level = level.clamp(1, self.max_level());
        (1.0 + (level - 1) as f32 * self.speed_step).min(self.max_speed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackTuning {
    pub block_height: f32,
    pub start_width: f32,
    /// Horizontal slide speed of the moving block (px/frame)
    pub slide_speed: f32,
    pub base_points: u64,
    pub perfect_bonus: u64,
    /// Minimum points for a partial placement
    pub min_partial_points: u64,
    /// Debris gravity (px/frame²)
    pub debris_gravity: f32,
    /// Ticks between a placement and the next block appearing
    pub next_block_delay: u64,
    /// Blocks kept visible below the top of the tower
    pub visible_blocks: usize,
    /// Progress is the tower height in blocks
    pub difficulty: DifficultyCurve,
}

impl Default for StackTuning {
    fn default() -> Self {
        Self {
            block_height: 24.0,
            start_width: 200.0,
            slide_speed: 3.0,
            base_points: 10,
            perfect_bonus: 5,
            min_partial_points: 1,
            debris_gravity: 0.5,
            next_block_delay: 12,
            visible_blocks: 16,
            difficulty: DifficultyCurve::every(5, 10, 0.15, 2.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmTuning {
    pub lanes: u8,
    /// Distance of the hit line above the bottom edge
    pub hit_line_offset: f32,
    pub hit_window: f32,
    pub perfect_window: f32,
    /// A note this far past the hit line is missed
    pub miss_distance: f32,
    pub perfect_points: u64,
    pub good_points: u64,
    pub note_width: f32,
    pub note_height: f32,
    /// Ticks between notes before the ramp starts
    pub base_interval: u64,
    pub min_interval: u64,
    /// Fall speed (px/frame) before the ramp starts
    pub base_speed: f32,
    pub max_speed: f32,
    /// Spawn rate and speed ramp once the score exceeds this
    pub ramp_after: u64,
    pub lives: u32,
    pub flash_ticks: u64,
    pub difficulty: DifficultyCurve,
}

impl Default for RhythmTuning {
    fn default() -> Self {
        Self {
            lanes: 4,
            hit_line_offset: 80.0,
            hit_window: 30.0,
            perfect_window: 10.0,
            miss_distance: 40.0,
            perfect_points: 100,
            good_points: 50,
            note_width: 80.0,
            note_height: 20.0,
            base_interval: 90,
            min_interval: 40,
            base_speed: 3.0,
            max_speed: 6.0,
            ramp_after: 100,
            lives: 3,
            flash_ticks: 8,
            difficulty: DifficultyCurve {
                thresholds: vec![100, 300, 500],
                speed_step: 0.0,
                max_speed: 1.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerTuning {
    pub player_width: f32,
    pub player_height: f32,
    pub player_x: f32,
    /// Ground line distance above the bottom edge
    pub ground_offset: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
    pub scroll_speed: f32,
    pub obstacle_width: f32,
    pub obstacle_height: f32,
    pub coin_radius: f32,
    /// Spawn probabilities per tick
    pub obstacle_chance: f64,
    pub coin_chance: f64,
    /// Minimum ticks between obstacles so every gap is jumpable
    pub obstacle_cooldown: u64,
    pub coin_points: u64,
    /// Distance (px) worth one point
    pub distance_per_point: f32,
    pub difficulty: DifficultyCurve,
}

impl Default for RunnerTuning {
    fn default() -> Self {
        Self {
            player_width: 20.0,
            player_height: 30.0,
            player_x: 60.0,
            ground_offset: 60.0,
            gravity: 0.6,
            jump_velocity: -12.0,
            scroll_speed: 5.0,
            obstacle_width: 20.0,
            obstacle_height: 40.0,
            coin_radius: 7.5,
            obstacle_chance: 0.02,
            coin_chance: 0.01,
            obstacle_cooldown: 45,
            coin_points: 5,
            distance_per_point: 100.0,
            difficulty: DifficultyCurve::every(50, 8, 0.1, 1.7),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorTuning {
    pub catcher_width: f32,
    pub catcher_height: f32,
    /// Catcher distance above the bottom edge
    pub catcher_offset: f32,
    /// Horizontal step for directional keys
    pub key_step: f32,
    pub drop_radius: f32,
    pub catch_points: u64,
    /// Drop speed is `level + speed_offset` px/frame
    pub speed_offset: f32,
    /// Spawn interval is `max(min_interval, base_interval - level / 2)` ticks
    pub base_interval: u64,
    pub min_interval: u64,
    pub lives: u32,
    pub difficulty: DifficultyCurve,
}

impl Default for CollectorTuning {
    fn default() -> Self {
        Self {
            catcher_width: 80.0,
            catcher_height: 16.0,
            catcher_offset: 40.0,
            key_step: 24.0,
            drop_radius: 12.0,
            catch_points: 10,
            speed_offset: 2.0,
            base_interval: 60,
            min_interval: 20,
            lives: 3,
            difficulty: DifficultyCurve::every(100, 10, 0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Match3Tuning {
    pub size: usize,
    pub moves: u32,
    pub colors: u8,
    /// One extra colour from this level on
    pub extra_color_level: u32,
    pub tile_points: u64,
    pub difficulty: DifficultyCurve,
}

impl Default for Match3Tuning {
    fn default() -> Self {
        Self {
            size: 8,
            moves: 30,
            colors: 5,
            extra_color_level: 3,
            tile_points: 10,
            difficulty: DifficultyCurve::every(500, 5, 0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeTuning {
    pub cell: f32,
    pub ball_radius: f32,
    pub gem_radius: f32,
    pub friction: f32,
    pub bounce_damping: f32,
    /// Tilt acceleration (px/frame²) at full tilt
    pub tilt_accel: f32,
    /// Speed cap (px/frame) so the ball cannot tunnel through a wall
    pub max_speed: f32,
    pub gem_points: u64,
    pub time_limit_secs: f32,
    pub bonus_base: u64,
    pub bonus_per_sec: u64,
}

impl Default for MazeTuning {
    fn default() -> Self {
        Self {
            cell: 40.0,
            ball_radius: 8.0,
            gem_radius: 6.0,
            friction: 0.98,
            bounce_damping: 0.8,
            tilt_accel: 0.5,
            max_speed: 8.0,
            gem_points: 50,
            time_limit_secs: 60.0,
            bonus_base: 1000,
            bonus_per_sec: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeTuning {
    pub size: usize,
    pub target: u32,
    /// Chance that a spawned tile is a 4, indexed by difficulty level - 1
    pub four_chance: Vec<f64>,
    pub difficulty: DifficultyCurve,
}

impl Default for MergeTuning {
    fn default() -> Self {
        Self {
            size: 4,
            target: 2048,
            four_chance: vec![0.1, 0.2, 0.25],
            difficulty: DifficultyCurve {
                thresholds: vec![2000, 8000],
                speed_step: 0.0,
                max_speed: 1.0,
            },
        }
    }
}

/// Every balance table in one place
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub field: Field,
    pub stack: StackTuning,
    pub rhythm: RhythmTuning,
    pub runner: RunnerTuning,
    pub collector: CollectorTuning,
    pub match3: Match3Tuning,
    pub maze: MazeTuning,
    pub merge: MergeTuning,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_every_builds_thresholds() {
        let curve = DifficultyCurve::every(100, 4, 0.5, 10.0);
        assert_eq!(curve.thresholds, vec![100, 200, 300]);
        assert_eq!(curve.max_level(), 4);
        assert_eq!(curve.level_for(0), 1);
        assert_eq!(curve.level_for(99), 1);
        assert_eq!(curve.level_for(100), 2);
        assert_eq!(curve.level_for(10_000), 4);
    }

    #[test]
    fn test_speed_multiplier_capped() {
        let curve = DifficultyCurve::every(10, 10, 0.5, 2.0);
        assert_eq!(curve.speed_multiplier(1), 1.0);
        assert_eq!(curve.speed_multiplier(2), 1.5);
        assert_eq!(curve.speed_multiplier(9), 2.0);
    }

    #[test]
    fn test_partial_tuning_json_fills_defaults() {
        let tuning: Tuning = serde_json::from_str(r#"{"maze":{"gem_points":75}}"#).unwrap();
        assert_eq!(tuning.maze.gem_points, 75);
        assert_eq!(tuning.maze.friction, 0.98);
        assert_eq!(tuning.rhythm.lanes, 4);
    }

    proptest! {
        #[test]
        fn prop_level_monotonic_and_capped(a in 0u64..5000, b in 0u64..5000) {
            let curve = StackTuning::default().difficulty;
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(curve.level_for(lo) <= curve.level_for(hi));
            prop_assert!(curve.level_for(hi) <= curve.max_level());
            prop_assert!(curve.speed_multiplier(curve.level_for(hi)) <= curve.max_speed);
        }
    }
}
