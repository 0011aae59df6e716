//! Arcade host
//!
//! Owns the active game, the injected progression store, settings and the
//! feedback channel. Input is queued and applied at the start of the next
//! fixed step; terminal transitions are settled exactly once; achievement
//! notices are released a fixed number of frames after settlement.

use crate::consts::{POPUP_DELAY_TICKS, SIM_DT};
use crate::feedback::{self, Feedback, Tone};
use crate::i18n::Translate;
use crate::platform::input::{InputEvent, map_event};
use crate::platform::storage::KeyValueStore;
use crate::progression::{Clock, ProgressionStore, SessionOutcome, Settlement, ShopError, Skill};
use crate::renderer::{self, Surface};
use crate::scheduler::{FrameContext, FrameHandler};
use crate::settings::Settings;
use crate::sim::timers::TickQueue;
use crate::sim::{Action, Game, GameEvent, GameKind, GameStatus, TickInput, tick};
use crate::tuning::Tuning;

/// Frames a released popup stays visible
pub const POPUP_VISIBLE_FRAMES: u64 = 120;

/// Notice shown after settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    HighScore { score: u64 },
    Achievement { id: &'static str, reward: u64 },
    DailyComplete { reward: u64 },
}

/// Summary of the last finished run
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub kind: GameKind,
    pub status: GameStatus,
    pub score: u64,
    pub best_combo: u32,
    pub accuracy: f32,
    pub settlement: Settlement,
}

pub struct Arcade<S: KeyValueStore> {
    tuning: Tuning,
    game: Game,
    progression: ProgressionStore<S>,
    settings: Settings,
    feedback: Box<dyn Feedback>,
    queued: Vec<Action>,
    popups: TickQueue<Popup>,
    visible: Vec<(Popup, u64)>,
    frame: u64,
    seed: u64,
    report: Option<SessionReport>,
}

impl<S: KeyValueStore> Arcade<S> {
    pub fn new(
        store: S,
        clock: Box<dyn Clock>,
        feedback: Box<dyn Feedback>,
        tuning: Tuning,
        seed: u64,
    ) -> Self {
        let settings = Settings::load(&store);
        let mut progression = ProgressionStore::load(store, clock);
        progression.refresh_daily();
        let game = Game::new(GameKind::Stack, &tuning, seed);
        Self {
            tuning,
            game,
            progression,
            settings,
            feedback,
            queued: Vec::new(),
            popups: TickQueue::new(),
            visible: Vec::new(),
            frame: 0,
            seed,
            report: None,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn kind(&self) -> GameKind {
        self.game.kind()
    }

    pub fn is_playing(&self) -> bool {
        self.game.session.is_playing()
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn progression(&self) -> &ProgressionStore<S> {
        &self.progression
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    /// Popups currently on screen
    pub fn popups(&self) -> impl Iterator<Item = &Popup> {
        self.visible.iter().map(|(p, _)| p)
    }

    pub fn has_pending_popups(&self) -> bool {
        !self.popups.is_empty() || !self.visible.is_empty()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Change settings and persist them
    pub fn update_settings(&mut self, change: impl FnOnce(&mut Settings)) {
        change(&mut self.settings);
        self.settings.set_volume(self.settings.volume);
        self.settings.save(self.progression.store_mut());
    }

    /// Drop the current run and every delayed effect tied to it
    pub fn teardown(&mut self) {
        self.game.teardown();
        self.queued.clear();
        self.popups.clear();
        self.visible.clear();
    }

    /// Switch to another game; the current one is torn down unsettled
    pub fn select(&mut self, kind: GameKind) {
        self.teardown();
        self.report = None;
        self.game = Game::new(kind, &self.tuning, self.seed);
        log::info!("Selected {}", kind.key());
    }

    /// Start a run of the selected game (ignored while one is running)
    pub fn start(&mut self) {
        if !self.game.status().can_start() {
            return;
        }
        self.popups.clear();
        self.visible.clear();
        self.queued.clear();
        self.report = None;
        self.seed = self.seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let modifiers = self.progression.modifiers(self.kind());
        let events = self.game.start(self.seed, modifiers);
        self.process(&events);
    }

    /// Route one raw input event; a tap while not playing starts a run
    pub fn handle_input(&mut self, event: &InputEvent) {
        let Some(action) = map_event(self.kind(), event) else {
            return;
        };
        if self.is_playing() {
            self.queued.push(action);
        } else if matches!(action, Action::Primary | Action::Pointer { .. }) {
            self.start();
        }
    }

    /// Run `steps` fixed simulation steps, then advance popup timing
    pub fn update(&mut self, steps: u32) {
        for _ in 0..steps {
            let input = TickInput {
                actions: std::mem::take(&mut self.queued),
            };
            let events = tick(&mut self.game, &input, SIM_DT);
            self.process(&events);
        }
        self.frame += 1;
        let frame = self.frame;
        for popup in self.popups.drain_due(frame) {
            log::debug!("Showing popup {:?}", popup);
            self.visible.push((popup, frame + POPUP_VISIBLE_FRAMES));
        }
        self.visible.retain(|&(_, until)| until > frame);
    }

    fn process(&mut self, events: &[GameEvent]) {
        if events.is_empty() {
            return;
        }
        feedback::emit(events, &self.settings, self.feedback.as_mut());
        if events
            .iter()
            .any(|e| matches!(e, GameEvent::GameOver { .. } | GameEvent::Won { .. }))
        {
            self.settle();
        }
    }

    fn settle(&mut self) {
        let session = &self.game.session;
        let outcome = SessionOutcome {
            kind: session.kind,
            status: session.status,
            score: session.score,
            best_combo: session.best_combo,
            stats: session.stats,
        };
        let accuracy = session.stats.accuracy();
        let settlement = self.progression.settle(&outcome);

        if settlement.new_high_score && outcome.score > 0 {
            if self.settings.sound_active() {
                self.feedback.play_tone(Tone::HighScore);
            }
            self.schedule_popup(Popup::HighScore {
                score: outcome.score,
            });
        }
        if let Some(reward) = settlement.daily_reward {
            self.schedule_popup(Popup::DailyComplete { reward });
        }
        for def in &settlement.unlocked {
            self.schedule_popup(Popup::Achievement {
                id: def.id,
                reward: def.reward,
            });
        }

        self.report = Some(SessionReport {
            kind: outcome.kind,
            status: outcome.status,
            score: outcome.score,
            best_combo: outcome.best_combo,
            accuracy,
            settlement,
        });
    }

    /// Popups are staggered so each gets its own delay
    fn schedule_popup(&mut self, popup: Popup) {
        let delay = POPUP_DELAY_TICKS * (self.popups.len() as u64 + 1);
        self.popups.schedule(self.frame, delay, popup);
    }

    // === Shop ===

    pub fn purchase(&mut self, skill: Skill) -> Result<u64, ShopError> {
        self.progression.purchase(self.game.kind(), skill)
    }

    pub fn activate(&mut self, skill: Skill) -> Result<(), ShopError> {
        self.progression.activate(self.game.kind(), skill)
    }

    pub fn deactivate(&mut self, skill: Skill) -> Result<(), ShopError> {
        self.progression.deactivate(self.game.kind(), skill)
    }
}

/// An arcade bound to a drawing surface, driven by the frame loop
pub struct Screen<S: KeyValueStore, D: Surface> {
    pub arcade: Arcade<S>,
    pub surface: D,
    translate: Box<dyn Translate>,
    fps: f32,
}

impl<S: KeyValueStore, D: Surface> Screen<S, D> {
    pub fn new(arcade: Arcade<S>, surface: D, translate: Box<dyn Translate>) -> Self {
        Self {
            arcade,
            surface,
            translate,
            fps: 60.0,
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Draw the current state (also used while the loop is stopped)
    pub fn redraw(&mut self) {
        let fps = self.arcade.settings().show_fps.then_some(self.fps);
        renderer::render(&mut self.surface, &self.arcade, self.translate.as_ref(), fps);
    }
}

impl<S: KeyValueStore, D: Surface> FrameHandler for Screen<S, D> {
    fn update(&mut self, ctx: &FrameContext) {
        if ctx.delta > 0.0 {
            self.fps = self.fps * 0.9 + (1.0 / ctx.delta) * 0.1;
        }
        self.arcade.update(ctx.steps);
    }

    fn render(&mut self, _ctx: &FrameContext) {
        self.redraw();
    }

    /// Frames continue while playing, and afterwards only until queued
    /// popups have been shown
    fn keep_running(&self) -> bool {
        self.arcade.is_playing() || self.arcade.has_pending_popups()
    }
}
