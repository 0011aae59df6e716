//! Four-lane rhythm tapping
//!
//! Notes fall toward a hit line. Tapping a lane hits the closest note in
//! that lane within the hit window; notes that fall too far past the line
//! cost a life.

use glam::Vec2;
use rand::Rng;

use super::{Rules, burst};
use crate::per_frame;
use crate::sim::collision::closest_within;
use crate::sim::entity::{Entity, EntityKind, Shape};
use crate::sim::physics::{Motion, advance_all, age_particles};
use crate::sim::state::{Action, Deferred, GameEvent, GameSession};
use crate::tuning::{Field, RhythmTuning};

#[derive(Debug, Clone)]
pub struct RhythmRules {
    field: Field,
    tuning: RhythmTuning,
    /// Ticks since the last note spawned
    spawn_timer: u64,
    spawn_interval: u64,
    /// Fall speed for newly spawned notes (px/frame)
    speed: f32,
    /// Lanes currently highlighted after a tap
    flash: Vec<bool>,
}

impl RhythmRules {
    pub fn new(field: Field, tuning: RhythmTuning) -> Self {
        let lanes = tuning.lanes as usize;
        Self {
            field,
            spawn_timer: 0,
            spawn_interval: tuning.base_interval,
            speed: tuning.base_speed,
            flash: vec![false; lanes],
            tuning,
        }
    }

    pub fn lanes(&self) -> u8 {
        self.tuning.lanes
    }

    pub fn lane_width(&self) -> f32 {
        self.field.width / self.tuning.lanes.max(1) as f32
    }

    /// Y coordinate of the hit line
    pub fn hit_line(&self) -> f32 {
        self.field.height - self.tuning.hit_line_offset
    }

    pub fn is_flashing(&self, lane: u8) -> bool {
        self.flash.get(lane as usize).copied().unwrap_or(false)
    }

    pub fn spawn_interval(&self) -> u64 {
        self.spawn_interval
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    fn lane_at(&self, x: f32) -> Option<u8> {
        if x < 0.0 || x >= self.field.width {
            return None;
        }
        Some((x / self.lane_width()) as u8)
    }

    fn spawn_note(&mut self, session: &mut GameSession) {
        let lane = session.rng.random_range(0..self.tuning.lanes);
        let x = (lane as f32 + 0.5) * self.lane_width();
        let vel = Vec2::new(0.0, per_frame(self.speed) * session.modifiers.speed_scale);
        let (w, h) = (self.tuning.note_width, self.tuning.note_height);
        session.spawn(|id| {
            Entity::new(id, EntityKind::Note, Vec2::new(x, -h), Shape::Rect { w, h })
                .with_velocity(vel)
                .with_tag(lane)
        });
    }

    /// Spawn cadence and speed ramp up once the score passes the threshold
    fn ramp(&mut self, score: u64) {
        if score > self.tuning.ramp_after {
            self.spawn_interval = self
                .tuning
                .base_interval
                .saturating_sub(score / 50)
                .max(self.tuning.min_interval);
            self.speed = (self.tuning.base_speed + score as f32 / 300.0).min(self.tuning.max_speed);
        }
    }

    fn tap(&mut self, session: &mut GameSession, lane: u8, events: &mut Vec<GameEvent>) {
        if lane >= self.tuning.lanes {
            return;
        }
        let hit_line = self.hit_line();
        let target = closest_within(
            session
                .entities
                .iter()
                .filter(|e| e.kind == EntityKind::Note && e.tag == lane),
            self.tuning.hit_window,
            |e| e.pos.y - hit_line,
        );
        let Some(note) = target.and_then(|id| session.despawn(id)) else {
            events.push(GameEvent::EmptyTap);
            return;
        };

        let distance = (note.pos.y - hit_line).abs();
        let perfect = distance < self.tuning.perfect_window;
        let base = if perfect {
            session.stats.perfect += 1;
            self.tuning.perfect_points
        } else {
            session.stats.good += 1;
            self.tuning.good_points
        };
        // Multiplier uses the combo before this hit
        let multiplier = 1.0 + (session.combo / 10) as f32 * 0.5;
        let points = (base as f32 * multiplier).floor() as u64;

        session.bump_combo();
        events.push(GameEvent::Hit { perfect });
        session.add_score(points, events);
        session.update_difficulty(&self.tuning.difficulty, session.score, events);
        burst(session, note.pos, 10, per_frame(3.0), lane);

        if let Some(flag) = self.flash.get_mut(lane as usize) {
            *flag = true;
        }
        session.schedule(self.tuning.flash_ticks, Deferred::ClearFlash { lane });
    }
}

impl Rules for RhythmRules {
    fn lives(&self) -> u32 {
        self.tuning.lives
    }

    fn reset(&mut self, _session: &mut GameSession) {
        self.spawn_timer = 0;
        self.spawn_interval = self.tuning.base_interval;
        self.speed = self.tuning.base_speed;
        self.flash = vec![false; self.tuning.lanes as usize];
    }

    fn step(&mut self, session: &mut GameSession, dt: f32, events: &mut Vec<GameEvent>) {
        self.spawn_timer += 1;
        if self.spawn_timer >= self.spawn_interval {
            self.spawn_note(session);
            self.spawn_timer = 0;
            self.ramp(session.score);
        }

        let motion = Motion::free();
        advance_all(&mut session.entities, &motion, dt, |e| e.kind == EntityKind::Note);
        age_particles(&mut session.entities, dt, 2.0);

        let limit = self.hit_line() + self.tuning.miss_distance;
        let missed: Vec<_> = session
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Note && e.pos.y > limit)
            .map(|e| e.id)
            .collect();
        for id in missed {
            session.despawn(id);
            session.stats.miss += 1;
            session.reset_combo();
            events.push(GameEvent::Miss);
            if session.lose_life(events) {
                return;
            }
        }
    }

    fn apply(&mut self, session: &mut GameSession, action: Action, events: &mut Vec<GameEvent>) {
        let lane = match action {
            Action::Lane(lane) => Some(lane),
            Action::Pointer { x, .. } => self.lane_at(x),
            Action::Primary | Action::Direction(_) => None,
        };
        if let Some(lane) = lane {
            self.tap(session, lane, events);
        }
    }

    fn on_deferred(
        &mut self,
        _session: &mut GameSession,
        deferred: Deferred,
        _events: &mut Vec<GameEvent>,
    ) {
        if let Deferred::ClearFlash { lane } = deferred {
            if let Some(flag) = self.flash.get_mut(lane as usize) {
                *flag = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::state::{GameKind, GameStatus, Modifiers};

    fn setup() -> (RhythmRules, GameSession) {
        let mut rules = RhythmRules::new(Field::default(), RhythmTuning::default());
        let mut session = GameSession::new(GameKind::Rhythm, 9);
        session.begin(9, rules.lives(), Modifiers::default());
        rules.reset(&mut session);
        (rules, session)
    }

    fn note_at(rules: &RhythmRules, session: &mut GameSession, lane: u8, y: f32) {
        let x = (lane as f32 + 0.5) * rules.lane_width();
        session.spawn(|id| {
            Entity::new(id, EntityKind::Note, Vec2::new(x, y), Shape::Rect { w: 80.0, h: 20.0 })
                .with_tag(lane)
        });
    }

    #[test]
    fn test_perfect_and_good_hits() {
        let (mut rules, mut session) = setup();
        let line = rules.hit_line();
        note_at(&rules, &mut session, 0, line + 4.0);
        note_at(&rules, &mut session, 1, line - 20.0);
        let mut events = Vec::new();

        rules.apply(&mut session, Action::Lane(0), &mut events);
        assert_eq!(session.score, 100);
        rules.apply(&mut session, Action::Lane(1), &mut events);
        assert_eq!(session.score, 150);
        assert_eq!(session.combo, 2);
        assert_eq!(session.stats.perfect, 1);
        assert_eq!(session.stats.good, 1);
        assert!(rules.is_flashing(0));
    }

    #[test]
    fn test_combo_multiplier() {
        let (mut rules, mut session) = setup();
        session.combo = 10;
        let line = rules.hit_line();
        note_at(&rules, &mut session, 2, line);
        let mut events = Vec::new();
        rules.apply(&mut session, Action::Lane(2), &mut events);
        assert_eq!(session.score, 150);
        assert_eq!(session.combo, 11);
    }

    #[test]
    fn test_empty_tap_has_no_penalty() {
        let (mut rules, mut session) = setup();
        session.combo = 4;
        let line = rules.hit_line();
        note_at(&rules, &mut session, 3, line - 100.0);
        let mut events = Vec::new();
        rules.apply(&mut session, Action::Lane(3), &mut events);
        assert_eq!(events, vec![GameEvent::EmptyTap]);
        assert_eq!(session.combo, 4);
        assert_eq!(session.lives, 3);
    }

    #[test]
    fn test_pointer_maps_to_lane() {
        let (mut rules, mut session) = setup();
        let line = rules.hit_line();
        note_at(&rules, &mut session, 1, line);
        let mut events = Vec::new();
        rules.apply(&mut session, Action::Pointer { x: 150.0, y: 10.0 }, &mut events);
        assert_eq!(session.score, 100);
    }

    #[test]
    fn test_two_taps_in_one_frame_hit_two_notes() {
        let (mut rules, mut session) = setup();
        let line = rules.hit_line();
        note_at(&rules, &mut session, 0, line);
        note_at(&rules, &mut session, 0, line + 15.0);
        let mut events = Vec::new();
        rules.apply(&mut session, Action::Lane(0), &mut events);
        rules.apply(&mut session, Action::Lane(0), &mut events);
        assert_eq!(session.stats.perfect + session.stats.good, 2);
        assert!(session.entities.iter().all(|e| e.kind != EntityKind::Note));
    }

    #[test]
    fn test_missed_notes_cost_lives_then_game_over() {
        let (mut rules, mut session) = setup();
        let line = rules.hit_line();
        let mut events = Vec::new();
        for lane in 0..3 {
            note_at(&rules, &mut session, lane, line + 41.0);
        }
        session.combo = 5;
        rules.step(&mut session, SIM_DT, &mut events);
        assert_eq!(session.status, GameStatus::GameOver);
        assert_eq!(session.lives, 0);
        assert_eq!(session.combo, 0);
        assert!(session.entities.is_empty());
    }

    #[test]
    fn test_ramp_after_threshold() {
        let (mut rules, _) = setup();
        rules.ramp(100);
        assert_eq!(rules.spawn_interval(), 90);
        rules.ramp(600);
        assert_eq!(rules.spawn_interval(), 78);
        assert!((rules.speed() - 5.0).abs() < 1e-5);
        rules.ramp(100_000);
        assert_eq!(rules.spawn_interval(), 40);
        assert_eq!(rules.speed(), 6.0);
    }

    #[test]
    fn test_notes_spawn_on_interval() {
        let (mut rules, mut session) = setup();
        let mut events = Vec::new();
        for _ in 0..90 {
            rules.step(&mut session, SIM_DT, &mut events);
        }
        assert_eq!(
            session.entities.iter().filter(|e| e.kind == EntityKind::Note).count(),
            1
        );
    }
}
