//! Block stacking
//!
//! A block slides back and forth above the tower. Dropping it keeps only
//! the part that overlaps the block below; the overhang falls away as
//! debris. Nearly aligned drops keep the full width and grow the combo.

use glam::Vec2;

use super::{Rules, burst};
use crate::per_frame;
use crate::sim::collision::{Placement, classify_placement, overlap_fraction};
use crate::sim::entity::{Aabb, COLOR_TAGS, Entity, EntityId, EntityKind, Flags, Shape};
use crate::sim::physics::{AxisPolicy, Motion, advance, advance_all, age_particles};
use crate::sim::state::{Action, Deferred, GameEvent, GameSession};
use crate::tuning::{Field, StackTuning};

#[derive(Debug, Clone)]
pub struct StackRules {
    field: Field,
    tuning: StackTuning,
    /// Bounds of the block currently on top of the tower
    top: Aabb,
    /// Blocks placed on the base
    height: u32,
}

impl StackRules {
    pub fn new(field: Field, tuning: StackTuning) -> Self {
        let top = base_bounds(field, &tuning);
        Self {
            field,
            tuning,
            top,
            height: 0,
        }
    }

    /// Colour tag of the block at the current height
    fn tag(&self) -> u8 {
        (self.height % COLOR_TAGS as u32) as u8
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn top(&self) -> Aabb {
        self.top
    }

    fn slide_motion(&self) -> Motion {
        Motion::free().with_x(AxisPolicy::Bounce {
            min: 0.0,
            max: self.field.width,
            damping: 1.0,
        })
    }

    fn debris_motion(&self) -> Motion {
        Motion::free()
            .with_gravity(Vec2::new(0.0, per_frame(per_frame(self.tuning.debris_gravity))))
            .with_y(AxisPolicy::Remove {
                min: f32::NEG_INFINITY,
                max: self.field.height,
            })
    }

    fn spawn_moving(&mut self, session: &mut GameSession) {
        let width = self.top.width();
        let bh = self.tuning.block_height;
        let speed = per_frame(self.tuning.slide_speed) * session.speed(&self.tuning.difficulty);
        // Alternate the entry side so consecutive blocks do not always come from the left
        let (x, vx) = if self.height % 2 == 0 {
            (width / 2.0, speed)
        } else {
            (self.field.width - width / 2.0, -speed)
        };
        let y = self.top.center().y - bh;
        session.spawn(|id| {
            Entity::new(id, EntityKind::MovingBlock, Vec2::new(x, y), Shape::Rect { w: width, h: bh })
                .with_velocity(Vec2::new(vx, 0.0))
                .with_tag(self.tag())
        });
    }

    fn place(&mut self, session: &mut GameSession, events: &mut Vec<GameEvent>) {
        let Some(index) = session
            .entities
            .iter()
            .position(|e| e.kind == EntityKind::MovingBlock)
        else {
            // Between blocks
            return;
        };
        let moving = session.entities[index].aabb();
        let fraction = overlap_fraction(&moving, &self.top);

        match classify_placement(fraction) {
            Placement::Miss => {
                session.stats.miss += 1;
                events.push(GameEvent::Miss);
                session.game_over(events);
                return;
            }
            Placement::Perfect => {
                let combo = session.bump_combo();
                let points = self.tuning.base_points + self.tuning.perfect_bonus * combo as u64;
                session.stats.perfect += 1;
                let block = &mut session.entities[index];
                block.pos.x = self.top.center().x;
                block.vel = Vec2::ZERO;
                block.kind = EntityKind::Block;
                block.flags.insert(Flags::PERFECT);
                self.top = block.aabb();
                let center = block.pos;
                events.push(GameEvent::Hit { perfect: true });
                session.add_score(points, events);
                burst(session, center, 12, per_frame(4.0), 1);
            }
            Placement::Partial { fraction } => {
                let left = moving.left.max(self.top.left);
                let right = moving.right.min(self.top.right);
                let kept = right - left;
                let bh = self.tuning.block_height;
                let y = moving.center().y;

                let block = &mut session.entities[index];
                block.kind = EntityKind::Block;
                block.vel = Vec2::ZERO;
                block.shape = Shape::Rect { w: kept, h: bh };
                block.pos.x = (left + right) / 2.0;
                self.top = block.aabb();

                // Overhang on whichever side did not land
                let (d_left, d_right) = if moving.left < left {
                    (moving.left, left)
                } else {
                    (right, moving.right)
                };
                let tag = self.tag();
                session.spawn(|id| {
                    Entity::new(
                        id,
                        EntityKind::Debris,
                        Vec2::new((d_left + d_right) / 2.0, y),
                        Shape::Rect {
                            w: d_right - d_left,
                            h: bh,
                        },
                    )
                    .with_tag(tag)
                });

                let points = ((self.tuning.base_points as f32 * fraction).floor() as u64)
                    .max(self.tuning.min_partial_points);
                session.set_combo(1);
                session.stats.good += 1;
                events.push(GameEvent::Hit { perfect: false });
                session.add_score(points, events);
            }
        }

        self.height += 1;
        session.update_difficulty(&self.tuning.difficulty, self.height as u64, events);
        self.scroll(session);
        session.schedule(self.tuning.next_block_delay, Deferred::SpawnBlock);
    }

    /// Keep the top of the tower in the upper half of the field
    fn scroll(&mut self, session: &mut GameSession) {
        let bh = self.tuning.block_height;
        if self.top.top >= self.field.height * 0.5 {
            return;
        }
        for e in session
            .entities
            .iter_mut()
            .filter(|e| matches!(e.kind, EntityKind::Block | EntityKind::Debris))
        {
            e.pos.y += bh;
        }
        self.top.top += bh;
        self.top.bottom += bh;

        let floor = self.field.height;
        let keep = self.tuning.visible_blocks;
        // Newest first, so the blocks far below the top go
        let stale: Vec<EntityId> = session
            .entities
            .iter()
            .rev()
            .filter(|e| e.kind == EntityKind::Block)
            .enumerate()
            .filter(|(i, e)| *i >= keep || e.aabb().top >= floor)
            .map(|(_, e)| e.id)
            .collect();
        session.entities.retain(|e| !stale.contains(&e.id));
    }
}

fn base_bounds(field: Field, tuning: &StackTuning) -> Aabb {
    let center = Vec2::new(
        field.width / 2.0,
        field.height - tuning.block_height * 2.0,
    );
    Aabb::from_center(
        center,
        Vec2::new(tuning.start_width / 2.0, tuning.block_height / 2.0),
    )
}

impl Rules for StackRules {
    fn reset(&mut self, session: &mut GameSession) {
        self.top = base_bounds(self.field, &self.tuning);
        self.height = 0;
        let base = self.top;
        session.spawn(|id| {
            Entity::new(
                id,
                EntityKind::Block,
                base.center(),
                Shape::Rect {
                    w: base.width(),
                    h: base.height(),
                },
            )
        });
        self.spawn_moving(session);
    }

    fn step(&mut self, session: &mut GameSession, dt: f32, _events: &mut Vec<GameEvent>) {
        let slide = self.slide_motion();
        for e in session
            .entities
            .iter_mut()
            .filter(|e| e.kind == EntityKind::MovingBlock)
        {
            advance(e, &slide, dt);
        }
        let debris = self.debris_motion();
        advance_all(&mut session.entities, &debris, dt, |e| e.kind == EntityKind::Debris);
        age_particles(&mut session.entities, dt, 1.5);
    }

    fn apply(&mut self, session: &mut GameSession, action: Action, events: &mut Vec<GameEvent>) {
        match action {
            Action::Primary | Action::Pointer { .. } => self.place(session, events),
            Action::Direction(_) | Action::Lane(_) => {}
        }
    }

    fn on_deferred(
        &mut self,
        session: &mut GameSession,
        deferred: Deferred,
        _events: &mut Vec<GameEvent>,
    ) {
        if deferred == Deferred::SpawnBlock {
            self.spawn_moving(session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{GameKind, GameStatus, Modifiers};

    fn setup() -> (StackRules, GameSession) {
        let mut rules = StackRules::new(Field::default(), StackTuning::default());
        let mut session = GameSession::new(GameKind::Stack, 42);
        session.begin(42, rules.lives(), Modifiers::default());
        rules.reset(&mut session);
        (rules, session)
    }

    fn moving_mut(session: &mut GameSession) -> &mut Entity {
        session
            .entities
            .iter_mut()
            .find(|e| e.kind == EntityKind::MovingBlock)
            .expect("moving block")
    }

    #[test]
    fn test_reset_places_base_and_moving_block() {
        let (_, session) = setup();
        assert_eq!(session.entities.len(), 2);
        assert_eq!(session.entities[0].kind, EntityKind::Block);
        assert_eq!(session.entities[1].kind, EntityKind::MovingBlock);
    }

    #[test]
    fn test_perfect_on_combo_three_grants_bonus() {
        let (mut rules, mut session) = setup();
        session.combo = 3;
        let top = rules.top();
        // 0.98 overlap: shift by 2% of the width
        moving_mut(&mut session).pos.x = top.center().x + top.width() * 0.02;

        let mut events = Vec::new();
        rules.apply(&mut session, Action::Primary, &mut events);

        assert_eq!(session.combo, 4);
        assert_eq!(session.score, 10 + 5 * 4);
        assert_eq!(session.stats.perfect, 1);
        assert!(events.contains(&GameEvent::Hit { perfect: true }));
        // Width preserved and snapped over the base
        assert_eq!(rules.top().width(), top.width());
    }

    #[test]
    fn test_partial_trims_and_spawns_debris() {
        let (mut rules, mut session) = setup();
        session.combo = 6;
        let top = rules.top();
        moving_mut(&mut session).pos.x = top.center().x + top.width() * 0.5;

        let mut events = Vec::new();
        rules.apply(&mut session, Action::Primary, &mut events);

        assert_eq!(session.combo, 1);
        assert_eq!(session.score, 5);
        assert!((rules.top().width() - top.width() * 0.5).abs() < 1e-3);
        let debris: Vec<_> = session
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Debris)
            .collect();
        assert_eq!(debris.len(), 1);
        assert!((debris[0].width() - top.width() * 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_zero_overlap_ends_run_with_lives_unchanged() {
        let (mut rules, mut session) = setup();
        session.score = 57;
        let lives = session.lives;
        let top = rules.top();
        moving_mut(&mut session).pos.x = top.right + top.width();

        let mut events = Vec::new();
        rules.apply(&mut session, Action::Primary, &mut events);

        assert_eq!(session.status, GameStatus::GameOver);
        assert_eq!(session.lives, lives);
        assert_eq!(session.score, 57);
        assert!(session.entities.is_empty());
        assert!(events.contains(&GameEvent::GameOver { score: 57 }));
    }

    #[test]
    fn test_next_block_arrives_after_delay() {
        let (mut rules, mut session) = setup();
        let top = rules.top();
        moving_mut(&mut session).pos.x = top.center().x;
        let mut events = Vec::new();
        rules.apply(&mut session, Action::Primary, &mut events);

        // Tapping while waiting does nothing
        rules.apply(&mut session, Action::Primary, &mut events);
        assert_eq!(rules.height(), 1);

        let delay = StackTuning::default().next_block_delay;
        session.tick += delay;
        for due in session.timers.drain_due(session.tick) {
            rules.on_deferred(&mut session, due, &mut events);
        }
        assert!(session.entities.iter().any(|e| e.kind == EntityKind::MovingBlock));
    }

    #[test]
    fn test_moving_block_bounces_inside_field() {
        let (mut rules, mut session) = setup();
        let mut events = Vec::new();
        for _ in 0..600 {
            rules.step(&mut session, crate::consts::SIM_DT, &mut events);
            let b = moving_mut(&mut session).aabb();
            assert!(b.left >= -1e-3 && b.right <= 400.0 + 1e-3);
        }
    }

    #[test]
    fn test_block_tag_cycles_past_byte_range() {
        let (mut rules, mut session) = setup();
        session.entities.retain(|e| e.kind != EntityKind::MovingBlock);
        rules.height = 257;
        rules.spawn_moving(&mut session);
        let tag = moving_mut(&mut session).tag;
        assert_eq!(tag, (257 % COLOR_TAGS as u32) as u8);
        assert!(tag < COLOR_TAGS);
    }
}
