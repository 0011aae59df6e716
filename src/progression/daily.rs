//! Date-derived daily challenge
//!
//! Every player sees the same challenge on a given calendar day: the
//! variant and target come from an FNV-1a hash of the `YYYY-MM-DD` string.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::sim::GameKind;

const DATE_FORMAT: &str = "%Y-%m-%d";
const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Source of "today"
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Settable clock for tests and replays; clones share the same date
#[derive(Debug, Clone)]
pub struct FixedClock {
    date: Rc<Cell<NaiveDate>>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Rc::new(Cell::new(date)),
        }
    }

    pub fn advance_days(&self, days: u64) {
        let date = self.date.get();
        self.date.set(date.checked_add_days(Days::new(days)).unwrap_or(date));
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date.get()
    }
}

/// 32-bit FNV-1a
pub fn fnv1a(text: &str) -> u32 {
    text.bytes()
        .fold(FNV_OFFSET, |h, b| (h ^ b as u32).wrapping_mul(FNV_PRIME))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

/// Base score target per variant
fn base_target(kind: GameKind) -> u64 {
    match kind {
        GameKind::Stack => 150,
        GameKind::Rhythm => 1500,
        GameKind::Runner => 60,
        GameKind::Collector => 300,
        GameKind::Match3 => 1500,
        GameKind::Maze => 500,
        GameKind::Merge => 2000,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallenge {
    pub id: String,
    pub date: String,
    pub game_variant: GameKind,
    pub target: u64,
    pub reward: u64,
    pub completed: bool,
    pub streak: u32,
    pub last_completed_date: Option<String>,
}

impl DailyChallenge {
    /// Challenge for `date`, carrying the streak record of `previous`
    pub fn for_date(date: NaiveDate, previous: Option<&DailyChallenge>) -> Self {
        let date_str = format_date(date);
        let hash = fnv1a(&date_str);
        let game_variant = GameKind::ALL[hash as usize % GameKind::ALL.len()];
        let tier = (hash >> 8) % 3;
        let base = base_target(game_variant);
        Self {
            id: format!("daily-{date_str}"),
            date: date_str,
            game_variant,
            target: base + base * tier as u64 / 2,
            reward: 50 + 25 * tier as u64,
            completed: false,
            streak: previous.map_or(0, |p| p.streak),
            last_completed_date: previous.and_then(|p| p.last_completed_date.clone()),
        }
    }

    pub fn is_for(&self, date: NaiveDate) -> bool {
        self.date == format_date(date)
    }

    /// Streak after completing on `today`: +1 when the previous completion
    /// was the day before, otherwise a fresh streak of 1
    pub fn next_streak(&self, today: NaiveDate) -> u32 {
        let previous = self.last_completed_date.as_deref().and_then(parse_date);
        match previous {
            Some(prev) if prev.succ_opt() == Some(today) => self.streak + 1,
            Some(prev) if prev == today => self.streak.max(1),
            _ => 1,
        }
    }
}
