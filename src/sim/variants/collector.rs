//! Catch the falling drops
//!
//! A catcher slides along the bottom following the pointer or the arrow
//! keys. Every drop caught scores; every drop that reaches the floor costs
//! a life. Levels come every 100 points and speed up the drops.

use glam::Vec2;
use rand::Rng;

use super::{Rules, burst};
use crate::per_frame;
use crate::sim::collision::detect_collision;
use crate::sim::entity::{Entity, EntityId, EntityKind, Shape};
use crate::sim::physics::{AxisPolicy, Motion, advance_all, age_particles};
use crate::sim::state::{Action, Direction, GameEvent, GameSession};
use crate::tuning::{CollectorTuning, Field};

/// Number of drop colours (cosmetic)
const DROP_COLORS: u8 = 4;

#[derive(Debug, Clone)]
pub struct CollectorRules {
    field: Field,
    tuning: CollectorTuning,
    catcher: Option<EntityId>,
    spawn_timer: u64,
}

impl CollectorRules {
    pub fn new(field: Field, tuning: CollectorTuning) -> Self {
        Self {
            field,
            tuning,
            catcher: None,
            spawn_timer: 0,
        }
    }

    /// Ticks between drops at `level`
    pub fn spawn_interval(&self, level: u32) -> u64 {
        self.tuning
            .base_interval
            .saturating_sub(level as u64 / 2)
            .max(self.tuning.min_interval)
    }

    /// Drop fall speed at `level` (px/frame)
    pub fn drop_speed(&self, level: u32) -> f32 {
        level as f32 + self.tuning.speed_offset
    }

    fn move_catcher_to(&self, session: &mut GameSession, x: f32) {
        let half = self.tuning.catcher_width / 2.0;
        let width = self.field.width;
        if let Some(catcher) = self.catcher.and_then(|id| session.entity_mut(id)) {
            catcher.pos.x = x.clamp(half, width - half);
        }
    }

    fn catcher_x(&self, session: &GameSession) -> Option<f32> {
        self.catcher.and_then(|id| session.entity(id)).map(|e| e.pos.x)
    }

    fn spawn_drop(&self, session: &mut GameSession) {
        let r = self.tuning.drop_radius;
        let x = session.rng.random_range(r..self.field.width - r);
        let color = session.rng.random_range(0..DROP_COLORS);
        let vy = per_frame(self.drop_speed(session.difficulty)) * session.modifiers.speed_scale;
        session.spawn(|id| {
            Entity::new(id, EntityKind::Drop, Vec2::new(x, -r), Shape::Circle { r })
                .with_velocity(Vec2::new(0.0, vy))
                .with_tag(color)
        });
    }
}

impl Rules for CollectorRules {
    fn lives(&self) -> u32 {
        self.tuning.lives
    }

    fn reset(&mut self, session: &mut GameSession) {
        self.spawn_timer = 0;
        let (w, h) = (self.tuning.catcher_width, self.tuning.catcher_height);
        let pos = Vec2::new(
            self.field.width / 2.0,
            self.field.height - self.tuning.catcher_offset,
        );
        self.catcher = Some(session.spawn(|id| {
            Entity::new(id, EntityKind::Catcher, pos, Shape::Rect { w, h })
        }));
    }

    fn step(&mut self, session: &mut GameSession, dt: f32, events: &mut Vec<GameEvent>) {
        self.spawn_timer += 1;
        if self.spawn_timer > self.spawn_interval(session.difficulty) {
            self.spawn_drop(session);
            self.spawn_timer = 0;
        }

        let fall = Motion::free().with_y(AxisPolicy::Remove {
            min: f32::NEG_INFINITY,
            max: self.field.height,
        });
        let missed = advance_all(&mut session.entities, &fall, dt, |e| e.kind == EntityKind::Drop);
        age_particles(&mut session.entities, dt, 2.0);

        if let Some(catcher) = self.catcher.and_then(|id| session.entity(id)).cloned() {
            let caught: Vec<(EntityId, Vec2, u8)> = session
                .entities
                .iter()
                .filter(|e| e.kind == EntityKind::Drop && detect_collision(&catcher, e))
                .map(|e| (e.id, e.pos, e.tag))
                .collect();
            for (id, pos, tag) in caught {
                session.despawn(id);
                session.bump_combo();
                session.stats.good += 1;
                events.push(GameEvent::Hit { perfect: false });
                session.add_score(self.tuning.catch_points, events);
                burst(session, pos, 8, per_frame(2.5), tag);
            }
        }
        session.update_difficulty(&self.tuning.difficulty, session.score, events);

        for _ in missed {
            session.stats.miss += 1;
            session.reset_combo();
            events.push(GameEvent::Miss);
            if session.lose_life(events) {
                return;
            }
        }
    }

    fn apply(&mut self, session: &mut GameSession, action: Action, _events: &mut Vec<GameEvent>) {
        match action {
            Action::Pointer { x, .. } => self.move_catcher_to(session, x),
            Action::Direction(dir @ (Direction::Left | Direction::Right)) => {
                if let Some(x) = self.catcher_x(session) {
                    let step = dir.delta().0 as f32 * self.tuning.key_step;
                    self.move_catcher_to(session, x + step);
                }
            }
            Action::Primary | Action::Direction(_) | Action::Lane(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::state::{GameKind, GameStatus, Modifiers};

    fn setup() -> (CollectorRules, GameSession) {
        let mut rules = CollectorRules::new(Field::default(), CollectorTuning::default());
        let mut session = GameSession::new(GameKind::Collector, 5);
        session.begin(5, rules.lives(), Modifiers::default());
        rules.reset(&mut session);
        (rules, session)
    }

    fn drop_at(session: &mut GameSession, x: f32, y: f32) {
        session.spawn(|id| Entity::new(id, EntityKind::Drop, Vec2::new(x, y), Shape::Circle { r: 12.0 }));
    }

    #[test]
    fn test_catcher_clamped_to_field() {
        let (mut rules, mut session) = setup();
        let mut events = Vec::new();
        rules.apply(&mut session, Action::Pointer { x: -100.0, y: 0.0 }, &mut events);
        assert_eq!(rules.catcher_x(&session), Some(40.0));
        rules.apply(&mut session, Action::Direction(Direction::Right), &mut events);
        assert_eq!(rules.catcher_x(&session), Some(64.0));
        rules.apply(&mut session, Action::Pointer { x: 1000.0, y: 0.0 }, &mut events);
        assert_eq!(rules.catcher_x(&session), Some(360.0));
    }

    #[test]
    fn test_catch_scores_and_builds_combo() {
        let (mut rules, mut session) = setup();
        let y = 600.0 - 40.0;
        drop_at(&mut session, 200.0, y);
        drop_at(&mut session, 210.0, y);
        let mut events = Vec::new();
        rules.step(&mut session, SIM_DT, &mut events);
        assert_eq!(session.score, 20);
        assert_eq!(session.combo, 2);
    }

    #[test]
    fn test_level_up_every_hundred_points() {
        let (mut rules, mut session) = setup();
        session.score = 90;
        drop_at(&mut session, 200.0, 560.0);
        let mut events = Vec::new();
        rules.step(&mut session, SIM_DT, &mut events);
        assert_eq!(session.difficulty, 2);
        assert!(events.contains(&GameEvent::LevelUp { level: 2 }));
        assert_eq!(rules.spawn_interval(2), 59);
        assert_eq!(rules.drop_speed(2), 4.0);
        assert_eq!(rules.spawn_interval(10), 55);
    }

    #[test]
    fn test_missed_drops_cost_lives() {
        let (mut rules, mut session) = setup();
        session.combo = 3;
        let mut events = Vec::new();
        for x in [20.0, 100.0, 380.0] {
            drop_at(&mut session, x, 640.0);
        }
        rules.step(&mut session, SIM_DT, &mut events);
        assert_eq!(session.status, GameStatus::GameOver);
        assert_eq!(session.stats.miss, 3);
        assert!(session.entities.is_empty());
    }
}
