//! Match-3 puzzle
//!
//! Swap adjacent tiles to line up three or more of a colour. Matches clear,
//! tiles fall, new ones drop in, and any matches that produces cascade.
//! The run ends when the moves run out or no swap can make a match.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Rules, burst};
use crate::per_frame;
use crate::sim::physics::age_particles;
use crate::sim::state::{Action, Direction, GameEvent, GameSession};
use crate::tuning::{Field, Match3Tuning};

/// Fewest colours that can fill a board without starting matches
pub const MIN_COLORS: u8 = 3;

/// Rerolls before settling for a board without a possible move
const MAX_GENERATE_ATTEMPTS: u32 = 64;

/// Square grid of coloured tiles, row-major, `None` only mid-cascade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Option<u8>>,
}

impl Board {
    /// Random board with no initial matches and, unless every reroll
    /// failed, at least one possible move
    pub fn generate(size: usize, colors: u8, rng: &mut Pcg32) -> Self {
        let colors = colors.max(MIN_COLORS);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut board = Board {
                size,
                cells: vec![None; size * size],
            };
            for y in 0..size {
                for x in 0..size {
                    let color = loop {
                        let c = rng.random_range(0..colors);
                        let row = x >= 2
                            && board.get(x - 1, y) == Some(c)
                            && board.get(x - 2, y) == Some(c);
                        let col = y >= 2
                            && board.get(x, y - 1) == Some(c)
                            && board.get(x, y - 2) == Some(c);
                        if !row && !col {
                            break c;
                        }
                    };
                    board.set(x, y, color);
                }
            }
            if board.has_possible_move() {
                return board;
            }
            if attempt >= MAX_GENERATE_ATTEMPTS {
                log::warn!("No playable {}x{} board after {} attempts", size, size, attempt);
                return board;
            }
        }
    }

    /// Board from explicit colours (row-major)
    pub fn from_colors(size: usize, colors: &[u8]) -> Self {
        Board {
            size,
            cells: colors.iter().map(|&c| Some(c)).collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.size && y < self.size {
            self.cells[y * self.size + x]
        } else {
            None
        }
    }

    fn set(&mut self, x: usize, y: usize, color: u8) {
        self.cells[y * self.size + x] = Some(color);
    }

    fn swap(&mut self, a: (usize, usize), b: (usize, usize)) {
        self.cells.swap(a.1 * self.size + a.0, b.1 * self.size + b.0);
    }

    /// Mask of every tile that is part of a horizontal or vertical run of 3+
    pub fn find_matches(&self) -> Vec<bool> {
        let n = self.size;
        let mut mask = vec![false; n * n];
        for line in 0..n {
            // Rows then columns
            for horizontal in [true, false] {
                let at = |i: usize| if horizontal { (i, line) } else { (line, i) };
                let mut start = 0;
                while start < n {
                    let (sx, sy) = at(start);
                    let color = self.get(sx, sy);
                    let mut end = start + 1;
                    while end < n && color.is_some() && self.get(at(end).0, at(end).1) == color {
                        end += 1;
                    }
                    if color.is_some() && end - start >= 3 {
                        for i in start..end {
                            let (x, y) = at(i);
                            mask[y * n + x] = true;
                        }
                    }
                    start = end;
                }
            }
        }
        mask
    }

    pub fn has_match(&self) -> bool {
        self.find_matches().iter().any(|&m| m)
    }

    /// Whether any single adjacent swap produces a match
    pub fn has_possible_move(&self) -> bool {
        let mut trial = self.clone();
        for y in 0..self.size {
            for x in 0..self.size {
                for (nx, ny) in [(x + 1, y), (x, y + 1)] {
                    if nx >= self.size || ny >= self.size {
                        continue;
                    }
                    trial.swap((x, y), (nx, ny));
                    let found = trial.has_match();
                    trial.swap((x, y), (nx, ny));
                    if found {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Clear masked tiles, let the rest fall and refill from the top.
    /// Returns the number of tiles cleared.
    fn clear_and_refill(&mut self, mask: &[bool], colors: u8, rng: &mut Pcg32) -> usize {
        let n = self.size;
        let cleared = mask.iter().filter(|&&m| m).count();
        for (cell, &m) in self.cells.iter_mut().zip(mask) {
            if m {
                *cell = None;
            }
        }
        for x in 0..n {
            let column: Vec<u8> = (0..n).rev().filter_map(|y| self.get(x, y)).collect();
            for y in (0..n).rev() {
                let from_bottom = n - 1 - y;
                let color = match column.get(from_bottom) {
                    Some(&c) => c,
                    None => rng.random_range(0..colors),
                };
                self.set(x, y, color);
            }
        }
        cleared
    }
}

#[derive(Debug, Clone)]
pub struct Match3Rules {
    field: Field,
    tuning: Match3Tuning,
    board: Board,
    selected: Option<(usize, usize)>,
    moves_left: u32,
}

impl Match3Rules {
    pub fn new(field: Field, tuning: Match3Tuning) -> Self {
        let board = Board {
            size: tuning.size,
            cells: vec![None; tuning.size * tuning.size],
        };
        Self {
            field,
            moves_left: tuning.moves,
            tuning,
            board,
            selected: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn selected(&self) -> Option<(usize, usize)> {
        self.selected
    }

    pub fn moves_left(&self) -> u32 {
        self.moves_left
    }

    /// Tile edge length in field pixels
    pub fn cell_size(&self) -> f32 {
        self.field.width / self.tuning.size as f32
    }

    /// Top edge of the grid (grid is vertically centred)
    pub fn origin_y(&self) -> f32 {
        (self.field.height - self.field.width).max(0.0) / 2.0
    }

    fn colors(&self, level: u32) -> u8 {
        let base = self.tuning.colors.max(MIN_COLORS);
        if level >= self.tuning.extra_color_level {
            base + 1
        } else {
            base
        }
    }

    fn cell_at(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        let cell = self.cell_size();
        let y = y - self.origin_y();
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let (cx, cy) = ((x / cell) as usize, (y / cell) as usize);
        (cx < self.tuning.size && cy < self.tuning.size).then_some((cx, cy))
    }

    fn cell_center(&self, (x, y): (usize, usize)) -> Vec2 {
        let cell = self.cell_size();
        Vec2::new(
            (x as f32 + 0.5) * cell,
            self.origin_y() + (y as f32 + 0.5) * cell,
        )
    }

    /// Replace the board (used by tests and replays)
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    fn tap(&mut self, session: &mut GameSession, cell: (usize, usize), events: &mut Vec<GameEvent>) {
        match self.selected {
            None => self.selected = Some(cell),
            Some(sel) if sel == cell => self.selected = None,
            Some(sel) if sel.0.abs_diff(cell.0) + sel.1.abs_diff(cell.1) == 1 => {
                self.selected = None;
                self.try_swap(session, sel, cell, events);
            }
            Some(_) => self.selected = Some(cell),
        }
    }

    fn nudge(&mut self, session: &mut GameSession, dir: Direction, events: &mut Vec<GameEvent>) {
        let Some((x, y)) = self.selected else {
            return;
        };
        let (dx, dy) = dir.delta();
        let (nx, ny) = (x as i64 + dx as i64, y as i64 + dy as i64);
        let size = self.tuning.size as i64;
        if nx < 0 || ny < 0 || nx >= size || ny >= size {
            return;
        }
        self.selected = None;
        self.try_swap(session, (x, y), (nx as usize, ny as usize), events);
    }

    fn try_swap(
        &mut self,
        session: &mut GameSession,
        a: (usize, usize),
        b: (usize, usize),
        events: &mut Vec<GameEvent>,
    ) {
        self.board.swap(a, b);
        if !self.board.has_match() {
            self.board.swap(a, b);
            session.reset_combo();
            events.push(GameEvent::Miss);
            return;
        }

        self.moves_left = self.moves_left.saturating_sub(1);
        let mut depth = 0;
        loop {
            let mask = self.board.find_matches();
            if !mask.iter().any(|&m| m) {
                break;
            }
            depth += 1;
            let n = self.tuning.size;
            let centers: Vec<Vec2> = mask
                .iter()
                .enumerate()
                .filter(|(_, m)| **m)
                .map(|(i, _)| self.cell_center((i % n, i / n)))
                .collect();
            let colors = self.colors(session.difficulty);
            let cleared = self.board.clear_and_refill(&mask, colors, &mut session.rng);
            session.set_combo(depth);
            events.push(GameEvent::Hit { perfect: depth > 1 });
            session.add_score(cleared as u64 * self.tuning.tile_points, events);
            for pos in centers {
                burst(session, pos, 2, per_frame(2.0), 0);
            }
        }
        if depth > 1 {
            session.stats.perfect += 1;
        } else {
            session.stats.good += 1;
        }
        session.update_difficulty(&self.tuning.difficulty, session.score, events);

        if self.moves_left == 0 || !self.board.has_possible_move() {
            session.game_over(events);
        }
    }
}

impl Rules for Match3Rules {
    fn reset(&mut self, session: &mut GameSession) {
        self.board = Board::generate(self.tuning.size, self.tuning.colors, &mut session.rng);
        self.selected = None;
        self.moves_left = self.tuning.moves;
    }

    fn step(&mut self, session: &mut GameSession, dt: f32, _events: &mut Vec<GameEvent>) {
        age_particles(&mut session.entities, dt, 2.5);
    }

    fn apply(&mut self, session: &mut GameSession, action: Action, events: &mut Vec<GameEvent>) {
        match action {
            Action::Pointer { x, y } => {
                if let Some(cell) = self.cell_at(x, y) {
                    self.tap(session, cell, events);
                }
            }
            Action::Direction(dir) => self.nudge(session, dir, events),
            Action::Primary | Action::Lane(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{GameKind, GameStatus, Modifiers};
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn setup() -> (Match3Rules, GameSession) {
        let mut rules = Match3Rules::new(Field::default(), Match3Tuning::default());
        let mut session = GameSession::new(GameKind::Match3, 11);
        session.begin(11, rules.lives(), Modifiers::default());
        rules.reset(&mut session);
        (rules, session)
    }

    /// 8x8 board with a stripe pattern that has no matches, plus a set-up
    /// swap at (2,0)<->(2,1) that lines up three 0s in row 0
    fn staged_board() -> Board {
        let mut colors = Vec::new();
        for y in 0..8u8 {
            for x in 0..8u8 {
                colors.push((x / 2 + y) % 4 + 1);
            }
        }
        // Row 0: 0 0 _ ...; row 1 col 2 holds the third 0
        colors[0] = 0;
        colors[1] = 0;
        colors[8 + 2] = 0;
        Board::from_colors(8, &colors)
    }

    #[test]
    fn test_generated_board_has_no_matches() {
        let mut rng = Pcg32::seed_from_u64(99);
        for _ in 0..20 {
            let board = Board::generate(8, 5, &mut rng);
            assert!(!board.has_match());
            assert!(board.has_possible_move());
        }
    }

    #[test]
    fn test_find_matches_marks_runs() {
        let mut colors = vec![1u8; 16];
        for (i, c) in colors.iter_mut().enumerate() {
            *c = (i % 2) as u8 + (i / 4) as u8 * 2;
        }
        colors[0] = 9;
        colors[1] = 9;
        colors[2] = 9;
        let board = Board::from_colors(4, &colors);
        let mask = board.find_matches();
        assert_eq!(&mask[0..4], &[true, true, true, false]);
        assert_eq!(mask.iter().filter(|&&m| m).count(), 3);
    }

    #[test]
    fn test_valid_swap_scores_and_uses_move() {
        let (mut rules, mut session) = setup();
        let board = staged_board();
        assert!(!board.has_match());
        rules.set_board(board);
        let mut events = Vec::new();
        let cell = rules.cell_size();
        let top = rules.origin_y();
        rules.apply(&mut session, Action::Pointer { x: 2.5 * cell, y: top + 0.5 * cell }, &mut events);
        assert_eq!(rules.selected(), Some((2, 0)));
        rules.apply(&mut session, Action::Direction(Direction::Down), &mut events);

        assert_eq!(rules.moves_left(), 29);
        assert!(session.score >= 30);
        assert!(session.combo >= 1);
        assert!(!rules.board().has_match());
    }

    #[test]
    fn test_invalid_swap_reverts_without_using_move() {
        let (mut rules, mut session) = setup();
        let board = staged_board();
        rules.set_board(board.clone());
        session.combo = 3;
        let mut events = Vec::new();
        let cell = rules.cell_size();
        let top = rules.origin_y();
        // (5,5) <-> (6,5) makes nothing
        rules.apply(&mut session, Action::Pointer { x: 5.5 * cell, y: top + 5.5 * cell }, &mut events);
        rules.apply(&mut session, Action::Pointer { x: 6.5 * cell, y: top + 5.5 * cell }, &mut events);
        assert_eq!(rules.board(), &board);
        assert_eq!(rules.moves_left(), 30);
        assert_eq!(session.combo, 0);
        assert_eq!(session.score, 0);
    }

    #[test]
    fn test_out_of_moves_ends_run() {
        let (mut rules, mut session) = setup();
        rules.set_board(staged_board());
        rules.moves_left = 1;
        let mut events = Vec::new();
        rules.try_swap(&mut session, (2, 0), (2, 1), &mut events);
        assert_eq!(session.status, GameStatus::GameOver);
        assert_eq!(rules.moves_left(), 0);
    }

    #[test]
    fn test_pointer_outside_grid_ignored() {
        let (mut rules, mut session) = setup();
        let mut events = Vec::new();
        rules.apply(&mut session, Action::Pointer { x: 10.0, y: 5.0 }, &mut events);
        assert_eq!(rules.selected(), None);
    }

    proptest! {
        #[test]
        fn prop_refill_keeps_board_full(seed in 0u64..500) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut board = Board::generate(6, 5, &mut rng);
            let mask: Vec<bool> = (0..36).map(|i| i % 7 == 0).collect();
            let cleared = board.clear_and_refill(&mask, 5, &mut rng);
            prop_assert_eq!(cleared, 6);
            prop_assert!((0..6).all(|y| (0..6).all(|x| board.get(x, y).is_some())));
        }
    }

    #[test]
    fn test_generate_with_too_few_colors_terminates() {
        let mut rng = Pcg32::seed_from_u64(5);
        for colors in [0, 1, 2] {
            let board = Board::generate(8, colors, &mut rng);
            assert!(!board.has_match());
            for y in 0..8 {
                for x in 0..8 {
                    assert!(board.get(x, y).is_some_and(|c| c < MIN_COLORS));
                }
            }
        }
        // too small to ever hold a move; rerolls are bounded
        let tiny = Board::generate(2, 3, &mut rng);
        assert_eq!(tiny.size(), 2);
        assert!(!tiny.has_possible_move());
    }
}
