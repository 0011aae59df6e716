//! Haptic and audio feedback
//!
//! Fire-and-forget: implementations swallow platform failures so nothing
//! here can stop the simulation. On the web tones are synthesized with
//! Web Audio oscillators, no sound files needed.

use crate::settings::Settings;
use crate::sim::GameEvent;

/// Tone kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Hit,
    Perfect,
    Miss,
    Success,
    LevelUp,
    GameOver,
    HighScore,
}

/// Host feedback channel
pub trait Feedback {
    fn vibrate(&mut self, ms: u32);
    fn play_tone(&mut self, tone: Tone);
}

/// Discards everything (native headless runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFeedback;

impl Feedback for NullFeedback {
    fn vibrate(&mut self, _ms: u32) {}
    fn play_tone(&mut self, _tone: Tone) {}
}

/// One recorded feedback call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackCall {
    Vibrate(u32),
    Tone(Tone),
}

/// Keeps every call for inspection
#[derive(Debug, Clone, Default)]
pub struct RecordingFeedback {
    pub calls: Vec<FeedbackCall>,
}

impl Feedback for RecordingFeedback {
    fn vibrate(&mut self, ms: u32) {
        self.calls.push(FeedbackCall::Vibrate(ms));
    }

    fn play_tone(&mut self, tone: Tone) {
        self.calls.push(FeedbackCall::Tone(tone));
    }
}

/// Feedback for one game event: optional tone, optional vibration (ms)
pub fn cues_for(event: &GameEvent) -> (Option<Tone>, Option<u32>) {
    match event {
        GameEvent::Hit { perfect: true } => (Some(Tone::Perfect), Some(15)),
        GameEvent::Hit { perfect: false } => (Some(Tone::Hit), Some(10)),
        GameEvent::Miss => (Some(Tone::Miss), Some(30)),
        // light pulse so a tap on nothing still feels acknowledged
        GameEvent::EmptyTap => (None, Some(5)),
        GameEvent::LifeLost { .. } => (Some(Tone::Miss), Some(60)),
        GameEvent::LevelUp { .. } => (Some(Tone::LevelUp), None),
        GameEvent::GameOver { .. } => (Some(Tone::GameOver), Some(120)),
        GameEvent::Won { .. } => (Some(Tone::Success), Some(40)),
        GameEvent::Started | GameEvent::Scored { .. } => (None, None),
    }
}

/// Route game events to `feedback`, honoring sound and haptics settings
pub fn emit(events: &[GameEvent], settings: &Settings, feedback: &mut dyn Feedback) {
    for event in events {
        let (tone, buzz) = cues_for(event);
        if let Some(tone) = tone
            && settings.sound_active()
        {
            feedback.play_tone(tone);
        }
        if let Some(ms) = buzz
            && settings.haptics
        {
            feedback.vibrate(ms);
        }
    }
}

/// Duration to hand the host's vibrate call, if it should be made at all
///
/// Hosts without a vibration API must never be called: on the web the
/// binding throws instead of returning false.
pub fn vibration(supported: bool, ms: u32) -> Option<u32> {
    (supported && ms > 0).then_some(ms)
}

#[cfg(target_arch = "wasm32")]
pub use web::WebFeedback;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::JsValue;
    use web_sys::{AudioContext, GainNode, Navigator, OscillatorNode, OscillatorType};

    use super::{Feedback, Tone, vibration};

    /// Navigator, only if it exposes `navigator.vibrate` (Safari does not)
    fn vibrating_navigator() -> Option<Navigator> {
        let navigator = web_sys::window()?.navigator();
        js_sys::Reflect::has(&navigator, &JsValue::from_str("vibrate"))
            .unwrap_or(false)
            .then_some(navigator)
    }

    /// Web Audio tones plus `navigator.vibrate`
    pub struct WebFeedback {
        ctx: Option<AudioContext>,
        navigator: Option<Navigator>,
        volume: f32,
    }

    impl WebFeedback {
        pub fn new(volume: f32) -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            let navigator = vibrating_navigator();
            if navigator.is_none() {
                log::info!("Vibration API unavailable - haptics disabled");
            }
            Self {
                ctx,
                navigator,
                volume: volume.clamp(0.0, 1.0),
            }
        }

        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;
            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;
            Some((osc, gain))
        }

        /// Play `notes` one after another with a decaying envelope each
        fn arpeggio(
            ctx: &AudioContext,
            notes: &[f32],
            step: f64,
            length: f64,
            level: f32,
            osc_type: OscillatorType,
        ) {
            for (i, &freq) in notes.iter().enumerate() {
                let Some((osc, gain)) = Self::create_osc(ctx, freq, osc_type) else {
                    continue;
                };
                let t = ctx.current_time() + i as f64 * step;
                gain.gain().set_value_at_time(level, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + length)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + length + 0.05).ok();
            }
        }
    }

    impl Feedback for WebFeedback {
        fn vibrate(&mut self, ms: u32) {
            let Some(ms) = vibration(self.navigator.is_some(), ms) else {
                return;
            };
            if let Some(navigator) = &self.navigator {
                let _ = navigator.vibrate_with_duration(ms);
            }
        }

        fn play_tone(&mut self, tone: Tone) {
            if self.volume <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
            let vol = self.volume;
            match tone {
                Tone::Hit => Self::arpeggio(ctx, &[440.0], 0.0, 0.08, vol * 0.3, OscillatorType::Sine),
                Tone::Perfect => Self::arpeggio(
                    ctx,
                    &[660.0, 880.0],
                    0.05,
                    0.1,
                    vol * 0.3,
                    OscillatorType::Triangle,
                ),
                Tone::Miss => Self::arpeggio(ctx, &[150.0], 0.0, 0.15, vol * 0.4, OscillatorType::Sawtooth),
                Tone::Success => Self::arpeggio(
                    ctx,
                    &[400.0, 500.0, 600.0, 800.0],
                    0.1,
                    0.4,
                    vol * 0.3,
                    OscillatorType::Triangle,
                ),
                Tone::LevelUp => Self::arpeggio(
                    ctx,
                    &[500.0, 750.0],
                    0.08,
                    0.2,
                    vol * 0.3,
                    OscillatorType::Square,
                ),
                Tone::GameOver => Self::arpeggio(
                    ctx,
                    &[400.0, 350.0, 300.0, 200.0],
                    0.2,
                    0.3,
                    vol * 0.3,
                    OscillatorType::Sine,
                ),
                Tone::HighScore => Self::arpeggio(
                    ctx,
                    &[500.0, 600.0, 700.0, 800.0, 1000.0],
                    0.08,
                    0.25,
                    vol * 0.25,
                    OscillatorType::Triangle,
                ),
            }
        }
    }
}
