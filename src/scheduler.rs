//! Frame loop lifecycle
//!
//! A [`FrameLoop`] owns at most one pending frame request. Each delivered
//! frame runs one update (carrying the fixed-timestep substep count) and
//! one render, then asks for the next frame only while the handler is
//! still running. Starting again cancels the previous request first, and a
//! callback for any request other than the pending one is dropped, so two
//! loops can never tick the same game.

use crate::consts::{MAX_FRAME_DELTA, MAX_SUBSTEPS, SIM_DT};

/// Identifier of one frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

/// Host mechanism that delivers frame callbacks (requestAnimationFrame on
/// the web, a manual queue in tests)
pub trait FrameSource {
    fn request(&mut self, id: FrameId);
    fn cancel(&mut self, id: FrameId);
}

/// Timing handed to each update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Timestamp of this frame (seconds)
    pub now: f64,
    /// Clamped time since the previous frame (seconds)
    pub delta: f32,
    /// Fixed simulation steps to run this frame
    pub steps: u32,
    /// Leftover fraction of a step, for interpolation
    pub alpha: f32,
    /// Frames delivered since start
    pub frame: u64,
}

/// What the loop drives
pub trait FrameHandler {
    fn update(&mut self, ctx: &FrameContext);
    fn render(&mut self, ctx: &FrameContext);
    /// Whether another frame should be requested
    fn keep_running(&self) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct FrameLoop {
    next_id: u64,
    pending: Option<FrameId>,
    last_time: Option<f64>,
    accumulator: f32,
    frames: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<FrameId> {
        self.pending
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Request the first frame, cancelling any pending request
    pub fn start(&mut self, source: &mut dyn FrameSource) {
        self.stop(source);
        self.last_time = None;
        self.accumulator = 0.0;
        self.frames = 0;
        self.request(source);
        log::debug!("Frame loop started");
    }

    /// Cancel the pending request, if any
    pub fn stop(&mut self, source: &mut dyn FrameSource) {
        if let Some(id) = self.pending.take() {
            source.cancel(id);
            log::debug!("Frame loop stopped (cancelled {:?})", id);
        }
    }

    fn request(&mut self, source: &mut dyn FrameSource) {
        self.next_id += 1;
        let id = FrameId(self.next_id);
        self.pending = Some(id);
        source.request(id);
    }

    /// Split elapsed time into fixed steps
    fn advance_clock(&mut self, now: f64) -> FrameContext {
        let delta = match self.last_time {
            Some(last) => ((now - last) as f32).clamp(0.0, MAX_FRAME_DELTA),
            None => SIM_DT,
        };
        self.last_time = Some(now);
        self.accumulator += delta;

        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        if steps == MAX_SUBSTEPS {
            // Drop the backlog rather than spiral
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        self.frames += 1;
        FrameContext {
            now,
            delta,
            steps,
            alpha: self.accumulator / SIM_DT,
            frame: self.frames,
        }
    }

    /// Deliver a frame callback. Returns false if `id` was stale.
    pub fn on_frame(
        &mut self,
        id: FrameId,
        now: f64,
        source: &mut dyn FrameSource,
        handler: &mut dyn FrameHandler,
    ) -> bool {
        if self.pending != Some(id) {
            log::debug!("Ignoring stale frame {:?}", id);
            return false;
        }
        self.pending = None;

        let ctx = self.advance_clock(now);
        handler.update(&ctx);
        handler.render(&ctx);

        if handler.keep_running() {
            self.request(source);
        }
        true
    }
}

/// Frame source driven by hand (tests, headless runs)
#[derive(Debug, Clone, Default)]
pub struct ManualFrames {
    requested: Vec<FrameId>,
    cancelled: Vec<FrameId>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest request not yet delivered or cancelled
    pub fn next(&mut self) -> Option<FrameId> {
        if self.requested.is_empty() {
            None
        } else {
            Some(self.requested.remove(0))
        }
    }

    pub fn outstanding(&self) -> usize {
        self.requested.len()
    }

    pub fn cancelled(&self) -> &[FrameId] {
        &self.cancelled
    }
}

impl FrameSource for ManualFrames {
    fn request(&mut self, id: FrameId) {
        self.requested.push(id);
    }

    fn cancel(&mut self, id: FrameId) {
        self.requested.retain(|&r| r != id);
        self.cancelled.push(id);
    }
}

/// Run frames at a fixed interval until the handler stops or `max_frames`
/// frames were delivered. Returns the number delivered.
pub fn run_manual(
    frame_loop: &mut FrameLoop,
    frames: &mut ManualFrames,
    handler: &mut dyn FrameHandler,
    start_time: f64,
    interval: f64,
    max_frames: u64,
) -> u64 {
    let mut delivered = 0;
    let mut now = start_time;
    while delivered < max_frames {
        let Some(id) = frames.next() else { break };
        if frame_loop.on_frame(id, now, frames, handler) {
            delivered += 1;
        }
        now += interval;
    }
    delivered
}
