//! Tilt maze
//!
//! Tilting (arrow keys or pointer) accelerates a ball through a walled
//! maze. Collect every gem, then reach the exit before time runs out. An
//! early finish earns a time bonus.

use glam::Vec2;
use rand::Rng;

use super::{Rules, burst};
use crate::per_frame;
use crate::sim::collision::{detect_collision, resolve_circle_rect};
use crate::sim::entity::{Aabb, Entity, EntityId, EntityKind, Shape};
use crate::sim::physics::{AxisPolicy, Motion, advance, age_particles};
use crate::sim::state::{Action, GameEvent, GameSession};
use crate::tuning::MazeTuning;

/// `#` wall, `.` floor, `*` gem, `S` start, `E` exit
const LAYOUTS: [&str; 3] = [
    "##########
#S.......#
#.######.#
#.#*...#.#
#.#.##.#.#
#...#*...#
###.#.####
#*..#....#
#.###.##.#
#.....#*.#
#.#####..#
#...*....#
#.######.#
#.......E#
##########",
    "##########
#S..#...*#
##.##.##.#
#..*#..#.#
#.###.##.#
#.....#..#
#.###.#.##
#*#...#..#
#.#.####.#
#...#*...#
###.#.####
#*..#....#
#.####.#.#
#......#E#
##########",
    "##########
#S#*.....#
#.#.####.#
#.#.#..#.#
#...#*.#.#
###.##.#.#
#*#....#.#
#.####.#.#
#......#.#
#.######.#
#...*#...#
#.##.#.###
#.#..#...#
#*#.###.E#
##########",
];

/// Parsed maze grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub cols: usize,
    pub rows: usize,
    walls: Vec<bool>,
    pub start: (usize, usize),
    pub exit: (usize, usize),
    pub gems: Vec<(usize, usize)>,
}

impl Layout {
    pub fn parse(text: &str) -> Option<Self> {
        let lines: Vec<&str> = text.lines().map(str::trim_end).filter(|l| !l.is_empty()).collect();
        let rows = lines.len();
        let cols = lines.first()?.len();
        let mut walls = Vec::with_capacity(rows * cols);
        let (mut start, mut exit, mut gems) = (None, None, Vec::new());
        for (y, line) in lines.iter().enumerate() {
            if line.len() != cols {
                return None;
            }
            for (x, c) in line.chars().enumerate() {
                walls.push(c == '#');
                match c {
                    'S' => start = Some((x, y)),
                    'E' => exit = Some((x, y)),
                    '*' => gems.push((x, y)),
                    _ => {}
                }
            }
        }
        Some(Self {
            cols,
            rows,
            walls,
            start: start?,
            exit: exit?,
            gems,
        })
    }

    /// Built-in layout by index (wraps around)
    pub fn builtin(index: usize) -> Option<Self> {
        Self::parse(LAYOUTS[index % LAYOUTS.len()])
    }

    pub fn count() -> usize {
        LAYOUTS.len()
    }

    pub fn is_wall(&self, x: usize, y: usize) -> bool {
        x >= self.cols || y >= self.rows || self.walls[y * self.cols + x]
    }
}

#[derive(Debug, Clone)]
pub struct MazeRules {
    tuning: MazeTuning,
    layout: Option<Layout>,
    /// Fixed layout instead of a seeded pick
    forced_layout: Option<usize>,
    ball: Option<EntityId>,
    tilt: Vec2,
    elapsed: f32,
}

impl MazeRules {
    pub fn new(tuning: MazeTuning) -> Self {
        Self {
            tuning,
            layout: None,
            forced_layout: None,
            ball: None,
            tilt: Vec2::ZERO,
            elapsed: 0.0,
        }
    }

    /// Always play the given layout
    pub fn with_layout(mut self, index: usize) -> Self {
        self.forced_layout = Some(index);
        self
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn cell(&self) -> f32 {
        self.tuning.cell
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn time_left(&self) -> f32 {
        (self.tuning.time_limit_secs - self.elapsed).max(0.0)
    }

    pub fn tilt(&self) -> Vec2 {
        self.tilt
    }

    pub fn gems_left(&self, session: &GameSession) -> usize {
        session
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Gem)
            .count()
    }

    fn cell_center(&self, (x, y): (usize, usize)) -> Vec2 {
        let c = self.tuning.cell;
        Vec2::new((x as f32 + 0.5) * c, (y as f32 + 0.5) * c)
    }

    fn cell_bounds(&self, cell: (usize, usize)) -> Aabb {
        Aabb::from_center(self.cell_center(cell), Vec2::splat(self.tuning.cell / 2.0))
    }

    /// Score for finishing after `elapsed` seconds
    pub fn time_bonus(&self, elapsed: f32) -> u64 {
        let penalty = self.tuning.bonus_per_sec * elapsed.max(0.0).floor() as u64;
        self.tuning.bonus_base.saturating_sub(penalty)
    }

    fn resolve_walls(&self, ball: &mut Entity) {
        let Some(layout) = &self.layout else {
            return;
        };
        let c = self.tuning.cell;
        let bounds = ball.aabb();
        let x0 = (bounds.left / c).floor().max(0.0) as usize;
        let y0 = (bounds.top / c).floor().max(0.0) as usize;
        let x1 = ((bounds.right / c).floor().max(0.0) as usize).min(layout.cols - 1);
        let y1 = ((bounds.bottom / c).floor().max(0.0) as usize).min(layout.rows - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                if layout.is_wall(x, y) {
                    resolve_circle_rect(ball, &self.cell_bounds((x, y)), self.tuning.bounce_damping);
                }
            }
        }
    }
}

impl Rules for MazeRules {
    fn reset(&mut self, session: &mut GameSession) {
        let index = self
            .forced_layout
            .unwrap_or_else(|| session.rng.random_range(0..Layout::count()));
        self.layout = Layout::builtin(index);
        self.tilt = Vec2::ZERO;
        self.elapsed = 0.0;
        self.ball = None;

        let Some(layout) = self.layout.clone() else {
            log::warn!("maze layout {} failed to parse", index);
            return;
        };
        let r = self.tuning.ball_radius;
        let start = self.cell_center(layout.start);
        self.ball = Some(session.spawn(|id| {
            Entity::new(id, EntityKind::Ball, start, Shape::Circle { r })
        }));
        let gem_r = self.tuning.gem_radius;
        for gem in &layout.gems {
            let pos = self.cell_center(*gem);
            session.spawn(|id| Entity::new(id, EntityKind::Gem, pos, Shape::Circle { r: gem_r }));
        }
    }

    fn step(&mut self, session: &mut GameSession, dt: f32, events: &mut Vec<GameEvent>) {
        let Some((cols, rows, exit_cell)) = self.layout.as_ref().map(|l| (l.cols, l.rows, l.exit))
        else {
            return;
        };
        self.elapsed += dt;
        if self.elapsed >= self.tuning.time_limit_secs {
            session.game_over(events);
            return;
        }

        let width = cols as f32 * self.tuning.cell;
        let height = rows as f32 * self.tuning.cell;
        let exit = self.cell_bounds(exit_cell);
        let accel = per_frame(per_frame(self.tuning.tilt_accel)) * session.modifiers.speed_scale;
        let motion = Motion::free()
            .with_gravity(self.tilt * accel)
            .with_friction(self.tuning.friction)
            .with_x(AxisPolicy::Bounce {
                min: 0.0,
                max: width,
                damping: self.tuning.bounce_damping,
            })
            .with_y(AxisPolicy::Bounce {
                min: 0.0,
                max: height,
                damping: self.tuning.bounce_damping,
            });
        let max_speed = per_frame(self.tuning.max_speed);

        let Some(mut ball) = self.ball.and_then(|id| session.entity(id)).cloned() else {
            return;
        };
        advance(&mut ball, &motion, dt);
        ball.vel = ball.vel.clamp_length_max(max_speed);
        self.resolve_walls(&mut ball);
        if let Some(slot) = session.entity_mut(ball.id) {
            *slot = ball.clone();
        }
        age_particles(&mut session.entities, dt, 2.0);

        let gems: Vec<(EntityId, Vec2)> = session
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Gem && detect_collision(&ball, e))
            .map(|e| (e.id, e.pos))
            .collect();
        for (id, pos) in gems {
            session.despawn(id);
            session.bump_combo();
            session.stats.good += 1;
            events.push(GameEvent::Hit { perfect: false });
            session.add_score(self.tuning.gem_points, events);
            burst(session, pos, 8, per_frame(2.0), 3);
        }

        if self.gems_left(session) == 0 && exit.center().distance(ball.pos) < exit.width() / 2.0 {
            let bonus = self.time_bonus(self.elapsed);
            events.push(GameEvent::Hit { perfect: true });
            session.add_score(bonus, events);
            session.win(events);
        }
    }

    fn apply(&mut self, session: &mut GameSession, action: Action, _events: &mut Vec<GameEvent>) {
        match action {
            Action::Direction(dir) => {
                let (dx, dy) = dir.delta();
                self.tilt = Vec2::new(dx as f32, dy as f32);
            }
            Action::Pointer { x, y } => {
                if let Some(ball) = self.ball.and_then(|id| session.entity(id)) {
                    // Tilt toward the pointer, full strength at two cells away
                    let offset = (Vec2::new(x, y) - ball.pos) / (self.tuning.cell * 2.0);
                    self.tilt = offset.clamp_length_max(1.0);
                }
            }
            Action::Primary => self.tilt = Vec2::ZERO,
            Action::Lane(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::state::{Direction, GameKind, GameStatus, Modifiers};
    use std::collections::VecDeque;

    fn setup(layout: usize) -> (MazeRules, GameSession) {
        let mut rules = MazeRules::new(MazeTuning::default()).with_layout(layout);
        let mut session = GameSession::new(GameKind::Maze, 1);
        session.begin(1, rules.lives(), Modifiers::default());
        rules.reset(&mut session);
        (rules, session)
    }

    fn ball(rules: &MazeRules, session: &GameSession) -> Entity {
        rules.ball.and_then(|id| session.entity(id)).cloned().expect("ball")
    }

    #[test]
    fn test_layouts_are_solvable() {
        for index in 0..Layout::count() {
            let layout = Layout::builtin(index).expect("layout parses");
            let mut seen = vec![false; layout.cols * layout.rows];
            let mut queue = VecDeque::from([layout.start]);
            seen[layout.start.1 * layout.cols + layout.start.0] = true;
            while let Some((x, y)) = queue.pop_front() {
                for (nx, ny) in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
                    if !layout.is_wall(nx, ny) && !seen[ny * layout.cols + nx] {
                        seen[ny * layout.cols + nx] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }
            let reachable = |(x, y): (usize, usize)| seen[y * layout.cols + x];
            assert!(reachable(layout.exit), "layout {index} exit");
            assert!(layout.gems.iter().all(|&g| reachable(g)), "layout {index} gems");
        }
    }

    #[test]
    fn test_tilt_moves_ball_and_walls_contain_it() {
        let (mut rules, mut session) = setup(0);
        let start = ball(&rules, &session).pos;
        let mut events = Vec::new();
        rules.apply(&mut session, Action::Direction(Direction::Right), &mut events);
        for _ in 0..240 {
            rules.step(&mut session, SIM_DT, &mut events);
        }
        let b = ball(&rules, &session);
        assert!(b.pos.x > start.x + 40.0);
        // Row 1 is a corridor: the ball stays inside it
        assert!(b.pos.y > 40.0 && b.pos.y < 80.0);
        assert!(b.pos.x < 360.0);
    }

    #[test]
    fn test_gem_pickup_scores() {
        let (mut rules, mut session) = setup(0);
        let gem = session
            .entities
            .iter()
            .find(|e| e.kind == EntityKind::Gem)
            .map(|e| e.pos)
            .expect("gem");
        let id = rules.ball.expect("ball id");
        if let Some(b) = session.entity_mut(id) {
            b.pos = gem;
        }
        let mut events = Vec::new();
        rules.step(&mut session, SIM_DT, &mut events);
        assert_eq!(session.score, 50);
        assert_eq!(rules.gems_left(&session), 4);
    }

    #[test]
    fn test_exit_after_all_gems_wins_with_bonus() {
        let (mut rules, mut session) = setup(0);
        session.entities.retain(|e| e.kind != EntityKind::Gem);
        let exit = rules.cell_center(rules.layout().expect("layout").exit);
        let id = rules.ball.expect("ball id");
        if let Some(b) = session.entity_mut(id) {
            b.pos = exit;
        }
        rules.elapsed = 3.5;
        let mut events = Vec::new();
        rules.step(&mut session, SIM_DT, &mut events);
        assert_eq!(session.status, GameStatus::Won);
        assert_eq!(session.score, 700);
        assert!(session.entities.is_empty());
    }

    #[test]
    fn test_exit_locked_while_gems_remain() {
        let (mut rules, mut session) = setup(1);
        let exit = rules.cell_center(rules.layout().expect("layout").exit);
        let id = rules.ball.expect("ball id");
        if let Some(b) = session.entity_mut(id) {
            b.pos = exit;
        }
        let mut events = Vec::new();
        rules.step(&mut session, SIM_DT, &mut events);
        assert_eq!(session.status, GameStatus::Playing);
    }

    #[test]
    fn test_time_limit_ends_run() {
        let (mut rules, mut session) = setup(2);
        rules.elapsed = 59.99;
        let mut events = Vec::new();
        rules.step(&mut session, SIM_DT, &mut events);
        assert_eq!(session.status, GameStatus::GameOver);
    }

    #[test]
    fn test_time_bonus_floors_at_zero() {
        let rules = MazeRules::new(MazeTuning::default());
        assert_eq!(rules.time_bonus(0.5), 1000);
        assert_eq!(rules.time_bonus(2.0), 800);
        assert_eq!(rules.time_bonus(45.0), 0);
    }
}
