//! Endless runner
//!
//! The world scrolls left under a runner that can only jump while grounded.
//! Distance is score; coins add a bonus and build the combo. Touching an
//! obstacle ends the run.

use glam::Vec2;
use rand::Rng;

use super::{Rules, burst};
use crate::per_frame;
use crate::sim::collision::detect_collision;
use crate::sim::entity::{Entity, EntityId, EntityKind, Flags, Shape};
use crate::sim::physics::{AxisPolicy, Motion, advance, advance_all, age_particles};
use crate::sim::state::{Action, Direction, GameEvent, GameSession};
use crate::tuning::{Field, RunnerTuning};

#[derive(Debug, Clone)]
pub struct RunnerRules {
    field: Field,
    tuning: RunnerTuning,
    player: Option<EntityId>,
    /// Total distance scrolled (px)
    distance: f32,
    /// Distance points already credited
    distance_points: u64,
    /// Ticks since the last obstacle
    since_obstacle: u64,
}

impl RunnerRules {
    pub fn new(field: Field, tuning: RunnerTuning) -> Self {
        Self {
            field,
            tuning,
            player: None,
            distance: 0.0,
            distance_points: 0,
            since_obstacle: 0,
        }
    }

    pub fn ground(&self) -> f32 {
        self.field.height - self.tuning.ground_offset
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    fn scroll_speed(&self, session: &GameSession) -> f32 {
        per_frame(self.tuning.scroll_speed) * session.speed(&self.tuning.difficulty)
    }

    fn jump(&self, session: &mut GameSession) {
        let Some(player) = self.player.and_then(|id| session.entity_mut(id)) else {
            return;
        };
        if player.is(Flags::GROUNDED) {
            player.vel.y = per_frame(self.tuning.jump_velocity);
            player.flags.remove(Flags::GROUNDED);
        }
    }

    fn spawn_world(&mut self, session: &mut GameSession) {
        let x = self.field.width + self.tuning.obstacle_width;
        let ground = self.ground();
        self.since_obstacle += 1;

        if self.since_obstacle >= self.tuning.obstacle_cooldown
            && session.rng.random_bool(self.tuning.obstacle_chance)
        {
            let (w, h) = (self.tuning.obstacle_width, self.tuning.obstacle_height);
            session.spawn(|id| {
                Entity::new(id, EntityKind::Obstacle, Vec2::new(x, ground - h / 2.0), Shape::Rect { w, h })
            });
            self.since_obstacle = 0;
        }

        if session.rng.random_bool(self.tuning.coin_chance) {
            let lift = 50.0 + session.rng.random_range(0.0f32..50.0);
            let r = self.tuning.coin_radius;
            session.spawn(|id| {
                Entity::new(id, EntityKind::Coin, Vec2::new(x, ground - lift), Shape::Circle { r })
            });
        }
    }

    fn move_player(&self, session: &mut GameSession, dt: f32) {
        let motion = Motion::free().with_gravity(Vec2::new(
            0.0,
            per_frame(per_frame(self.tuning.gravity)),
        ));
        let ground = self.ground();
        let Some(player) = self.player.and_then(|id| session.entity_mut(id)) else {
            return;
        };
        if player.is(Flags::GROUNDED) {
            return;
        }
        advance(player, &motion, dt);
        let half = player.shape.half_extents().y;
        if player.pos.y + half >= ground {
            player.pos.y = ground - half;
            player.vel.y = 0.0;
            player.flags.insert(Flags::GROUNDED);
        }
    }

    fn credit_distance(&mut self, session: &mut GameSession, scrolled: f32, events: &mut Vec<GameEvent>) {
        self.distance += scrolled;
        let earned = (self.distance / self.tuning.distance_per_point) as u64;
        if earned > self.distance_points {
            session.add_score(earned - self.distance_points, events);
            self.distance_points = earned;
        }
    }
}

impl Rules for RunnerRules {
    fn reset(&mut self, session: &mut GameSession) {
        self.distance = 0.0;
        self.distance_points = 0;
        self.since_obstacle = 0;
        let (w, h) = (self.tuning.player_width, self.tuning.player_height);
        let pos = Vec2::new(self.tuning.player_x, self.ground() - h / 2.0);
        self.player = Some(session.spawn(|id| {
            let mut player = Entity::new(id, EntityKind::Runner, pos, Shape::Rect { w, h });
            player.flags.insert(Flags::GROUNDED);
            player
        }));
    }

    fn step(&mut self, session: &mut GameSession, dt: f32, events: &mut Vec<GameEvent>) {
        self.spawn_world(session);
        self.move_player(session, dt);

        let speed = self.scroll_speed(session);
        for e in session
            .entities
            .iter_mut()
            .filter(|e| matches!(e.kind, EntityKind::Obstacle | EntityKind::Coin))
        {
            e.vel.x = -speed;
        }
        let scroll = Motion::free().with_x(AxisPolicy::Remove {
            min: 0.0,
            max: f32::INFINITY,
        });
        let gone = advance_all(&mut session.entities, &scroll, dt, |e| {
            matches!(e.kind, EntityKind::Obstacle | EntityKind::Coin)
        });
        if gone.iter().any(|e| e.kind == EntityKind::Coin) {
            // A coin that scrolled away uncollected breaks the chain
            session.reset_combo();
        }
        age_particles(&mut session.entities, dt, 2.0);

        let Some(player) = self.player.and_then(|id| session.entity(id)).cloned() else {
            return;
        };
        if session
            .entities
            .iter()
            .any(|e| e.kind == EntityKind::Obstacle && detect_collision(&player, e))
        {
            session.stats.miss += 1;
            events.push(GameEvent::Miss);
            session.game_over(events);
            return;
        }

        let coins: Vec<(EntityId, Vec2)> = session
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Coin && detect_collision(&player, e))
            .map(|e| (e.id, e.pos))
            .collect();
        for (id, pos) in coins {
            session.despawn(id);
            session.bump_combo();
            session.stats.good += 1;
            events.push(GameEvent::Hit { perfect: false });
            session.add_score(self.tuning.coin_points, events);
            burst(session, pos, 6, per_frame(2.0), 2);
        }

        self.credit_distance(session, speed * dt, events);
        session.update_difficulty(&self.tuning.difficulty, session.score, events);
    }

    fn apply(&mut self, session: &mut GameSession, action: Action, _events: &mut Vec<GameEvent>) {
        match action {
            Action::Primary | Action::Pointer { .. } | Action::Direction(Direction::Up) => {
                self.jump(session)
            }
            Action::Direction(_) | Action::Lane(_) => {}
        }
    }
}
