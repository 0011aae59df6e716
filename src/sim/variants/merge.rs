//! Sliding merge puzzle
//!
//! Every move slides all tiles one way; equal neighbours merge once per
//! move into their sum, which is added to the score. A new tile appears
//! after each move that changed the grid.

use rand::Rng;
use rand_pcg::Pcg32;

use super::Rules;
use crate::sim::physics::age_particles;
use crate::sim::state::{Action, Direction, GameEvent, GameSession};
use crate::tuning::{Field, MergeTuning};

/// Outcome of sliding the grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slide {
    pub moved: bool,
    /// Sum of all merged tile values
    pub gained: u64,
    pub merges: u32,
}

/// Square grid of tile values, 0 for empty, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<u32>,
}

impl Grid {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![0; size * size],
        }
    }

    pub fn from_rows(rows: &[&[u32]]) -> Self {
        Self {
            size: rows.len(),
            cells: rows.iter().flat_map(|r| r.iter().copied()).collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.cells[y * self.size + x]
    }

    pub fn max_tile(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Cell indices of one line, ordered from the edge tiles slide toward
    fn line(&self, dir: Direction, i: usize) -> Vec<usize> {
        let n = self.size;
        (0..n)
            .map(|j| match dir {
                Direction::Left => i * n + j,
                Direction::Right => i * n + (n - 1 - j),
                Direction::Up => j * n + i,
                Direction::Down => (n - 1 - j) * n + i,
            })
            .collect()
    }

    pub fn slide(&mut self, dir: Direction) -> Slide {
        let mut out = Slide::default();
        for i in 0..self.size {
            let idx = self.line(dir, i);
            let values: Vec<u32> = idx.iter().map(|&k| self.cells[k]).filter(|&v| v != 0).collect();
            let mut merged = Vec::with_capacity(self.size);
            let mut j = 0;
            while j < values.len() {
                if j + 1 < values.len() && values[j] == values[j + 1] {
                    let sum = values[j] * 2;
                    merged.push(sum);
                    out.gained += sum as u64;
                    out.merges += 1;
                    j += 2;
                } else {
                    merged.push(values[j]);
                    j += 1;
                }
            }
            merged.resize(self.size, 0);
            for (&k, &v) in idx.iter().zip(&merged) {
                if self.cells[k] != v {
                    out.moved = true;
                    self.cells[k] = v;
                }
            }
        }
        out
    }

    pub fn can_move(&self) -> bool {
        let n = self.size;
        (0..n).any(|y| {
            (0..n).any(|x| {
                let v = self.get(x, y);
                v == 0 || (x + 1 < n && self.get(x + 1, y) == v) || (y + 1 < n && self.get(x, y + 1) == v)
            })
        })
    }

    /// Place a 2 (or a 4 with `four_chance`) on a random empty cell
    pub fn spawn(&mut self, rng: &mut Pcg32, four_chance: f64) -> bool {
        let empty: Vec<usize> = (0..self.cells.len()).filter(|&k| self.cells[k] == 0).collect();
        if empty.is_empty() {
            return false;
        }
        let k = empty[rng.random_range(0..empty.len())];
        self.cells[k] = if rng.random_bool(four_chance.clamp(0.0, 1.0)) { 4 } else { 2 };
        true
    }
}

#[derive(Debug, Clone)]
pub struct MergeRules {
    field: Field,
    tuning: MergeTuning,
    grid: Grid,
}

impl MergeRules {
    pub fn new(field: Field, tuning: MergeTuning) -> Self {
        Self {
            field,
            grid: Grid::new(tuning.size),
            tuning,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn set_grid(&mut self, grid: Grid) {
        self.grid = grid;
    }

    /// Tile edge length in field pixels
    pub fn cell_size(&self) -> f32 {
        self.field.width / self.tuning.size as f32
    }

    pub fn origin_y(&self) -> f32 {
        (self.field.height - self.field.width).max(0.0) / 2.0
    }

    fn four_chance(&self, level: u32) -> f64 {
        let i = (level.max(1) - 1) as usize;
        self.tuning
            .four_chance
            .get(i)
            .or(self.tuning.four_chance.last())
            .copied()
            .unwrap_or(0.1)
    }

    fn shift(&mut self, session: &mut GameSession, dir: Direction, events: &mut Vec<GameEvent>) {
        let slide = self.grid.slide(dir);
        if !slide.moved {
            return;
        }
        if slide.merges > 0 {
            session.bump_combo();
            if slide.merges > 1 {
                session.stats.perfect += 1;
            } else {
                session.stats.good += 1;
            }
            events.push(GameEvent::Hit {
                perfect: slide.merges > 1,
            });
            session.add_score(slide.gained, events);
        } else {
            session.reset_combo();
        }
        session.update_difficulty(&self.tuning.difficulty, session.score, events);

        if self.grid.max_tile() >= self.tuning.target {
            session.win(events);
            return;
        }
        let chance = self.four_chance(session.difficulty);
        self.grid.spawn(&mut session.rng, chance);
        if !self.grid.can_move() {
            session.game_over(events);
        }
    }
}

impl Rules for MergeRules {
    fn reset(&mut self, session: &mut GameSession) {
        self.grid = Grid::new(self.tuning.size);
        let chance = self.four_chance(1);
        self.grid.spawn(&mut session.rng, chance);
        self.grid.spawn(&mut session.rng, chance);
    }

    fn step(&mut self, session: &mut GameSession, dt: f32, _events: &mut Vec<GameEvent>) {
        age_particles(&mut session.entities, dt, 2.0);
    }

    fn apply(&mut self, session: &mut GameSession, action: Action, events: &mut Vec<GameEvent>) {
        if let Action::Direction(dir) = action {
            self.shift(session, dir, events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{GameKind, GameStatus, Modifiers};
    use rand::SeedableRng;

    fn setup() -> (MergeRules, GameSession) {
        let mut rules = MergeRules::new(Field::default(), MergeTuning::default());
        let mut session = GameSession::new(GameKind::Merge, 2);
        session.begin(2, rules.lives(), Modifiers::default());
        rules.reset(&mut session);
        (rules, session)
    }

    #[test]
    fn test_slide_merges_once_per_pair() {
        let mut grid = Grid::from_rows(&[&[2, 2, 2, 2], &[4, 0, 4, 8], &[0, 0, 0, 0], &[2, 0, 0, 2]]);
        let slide = grid.slide(Direction::Left);
        assert!(slide.moved);
        assert_eq!(slide.merges, 4);
        assert_eq!(slide.gained, 4 + 4 + 8 + 4);
        assert_eq!(
            grid,
            Grid::from_rows(&[&[4, 4, 0, 0], &[8, 8, 0, 0], &[0, 0, 0, 0], &[4, 0, 0, 0]])
        );
    }

    #[test]
    fn test_slide_down() {
        let mut grid = Grid::from_rows(&[&[2, 0, 0, 0], &[2, 0, 0, 0], &[4, 0, 0, 0], &[0, 0, 0, 0]]);
        grid.slide(Direction::Down);
        assert_eq!(grid.get(0, 3), 4);
        assert_eq!(grid.get(0, 2), 4);
        assert_eq!(grid.get(0, 1), 0);
    }

    #[test]
    fn test_reset_spawns_two_tiles() {
        let (rules, _) = setup();
        let tiles = (0..4)
            .flat_map(|y| (0..4).map(move |x| (x, y)))
            .filter(|&(x, y)| rules.grid().get(x, y) != 0)
            .count();
        assert_eq!(tiles, 2);
    }

    #[test]
    fn test_noop_move_is_ignored() {
        let (mut rules, mut session) = setup();
        rules.set_grid(Grid::from_rows(&[&[2, 4, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]));
        session.combo = 2;
        let before = rules.grid().clone();
        let mut events = Vec::new();
        rules.apply(&mut session, Action::Direction(Direction::Left), &mut events);
        assert_eq!(rules.grid(), &before);
        assert_eq!(session.combo, 2);
        assert!(events.is_empty());
    }

    #[test]
    fn test_merging_moves_build_combo() {
        let (mut rules, mut session) = setup();
        rules.set_grid(Grid::from_rows(&[&[2, 2, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]));
        let mut events = Vec::new();
        rules.apply(&mut session, Action::Direction(Direction::Left), &mut events);
        assert_eq!(session.score, 4);
        assert_eq!(session.combo, 1);
    }

    #[test]
    fn test_reaching_target_wins() {
        let (mut rules, mut session) = setup();
        rules.set_grid(Grid::from_rows(&[&[1024, 1024, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]));
        let mut events = Vec::new();
        rules.apply(&mut session, Action::Direction(Direction::Left), &mut events);
        assert_eq!(session.status, GameStatus::Won);
        assert_eq!(session.score, 2048);
    }

    #[test]
    fn test_full_grid_without_merges_ends_run() {
        let (mut rules, mut session) = setup();
        // Sliding right opens only (0,0); a 2 or 4 there has no equal neighbour
        rules.set_grid(Grid::from_rows(&[
            &[8, 16, 32, 0],
            &[64, 128, 256, 512],
            &[8, 16, 32, 64],
            &[128, 256, 512, 1024],
        ]));
        let mut events = Vec::new();
        rules.apply(&mut session, Action::Direction(Direction::Right), &mut events);
        assert!(matches!(rules.grid().get(0, 0), 2 | 4));
        assert!(!rules.grid().can_move());
        assert_eq!(session.status, GameStatus::GameOver);
    }

    #[test]
    fn test_can_move_detects_locked_grid() {
        let grid = Grid::from_rows(&[&[2, 4, 2, 4], &[4, 2, 4, 2], &[2, 4, 2, 4], &[4, 2, 4, 2]]);
        assert!(!grid.can_move());
        let mut rng = Pcg32::seed_from_u64(1);
        let mut open = Grid::new(4);
        assert!(open.spawn(&mut rng, 0.0));
        assert!(open.can_move());
    }
}
