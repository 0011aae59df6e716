//! Neon Arcade entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, PointerEvent, TouchEvent};

    use neon_arcade::arcade::{Arcade, Screen};
    use neon_arcade::feedback::WebFeedback;
    use neon_arcade::i18n::English;
    use neon_arcade::platform::input::{InputEvent, SwipeTracker, to_field};
    use neon_arcade::platform::web::{BrowserFrames, CanvasSurface, LocalStorage};
    use neon_arcade::progression::SystemClock;
    use neon_arcade::scheduler::{FrameHandler, FrameId, FrameLoop};
    use neon_arcade::settings::Settings;
    use neon_arcade::sim::GameKind;
    use neon_arcade::tuning::Tuning;

    /// Everything the browser callbacks share
    struct App {
        frame_loop: FrameLoop,
        frames: BrowserFrames,
        screen: Screen<LocalStorage, CanvasSurface>,
        swipe: SwipeTracker,
    }

    impl App {
        fn on_frame(&mut self, id: FrameId, now: f64) {
            let Self {
                frame_loop,
                frames,
                screen,
                ..
            } = self;
            frame_loop.on_frame(id, now, frames, screen);
        }

        fn input(&mut self, event: InputEvent) {
            self.screen.arcade.handle_input(&event);
            if self.screen.keep_running() && !self.frame_loop.is_running() {
                self.frame_loop.start(&mut self.frames);
            }
        }

        fn select(&mut self, kind: GameKind) {
            self.frame_loop.stop(&mut self.frames);
            self.screen.arcade.select(kind);
            self.screen.redraw();
        }

        /// Client coordinates to playfield coordinates
        fn field_point(&self, x: f32, y: f32) -> Vec2 {
            let rect = self.screen.surface.canvas().get_bounding_client_rect();
            let field = self.screen.arcade.tuning().field;
            to_field(
                Vec2::new(x, y),
                (
                    rect.left() as f32,
                    rect.top() as f32,
                    rect.width() as f32,
                    rect.height() as f32,
                ),
                Vec2::new(field.width, field.height),
            )
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Neon Arcade starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let tuning = Tuning::default();
        let surface = CanvasSurface::new(canvas.clone(), tuning.field).ok_or("no 2d context")?;
        surface.resize(window.device_pixel_ratio());

        let store = LocalStorage::open();
        let volume = Settings::load(&store).volume;
        let seed = js_sys::Date::now() as u64;
        let arcade = Arcade::new(
            store,
            Box::new(SystemClock),
            Box::new(WebFeedback::new(volume)),
            tuning,
            seed,
        );
        log::info!("Arcade initialized with seed: {}", seed);

        let app = Rc::new_cyclic(|weak: &Weak<RefCell<App>>| {
            let weak = weak.clone();
            let handler: Rc<dyn Fn(FrameId, f64)> = Rc::new(move |id, now| {
                if let Some(app) = weak.upgrade() {
                    app.borrow_mut().on_frame(id, now);
                }
            });
            RefCell::new(App {
                frame_loop: FrameLoop::new(),
                frames: BrowserFrames::new(handler),
                screen: Screen::new(arcade, surface, Box::new(English)),
                swipe: SwipeTracker::default(),
            })
        });

        setup_input_handlers(&canvas, app.clone());
        app.borrow_mut().screen.redraw();

        log::info!("Neon Arcade running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        // Pointer down (mouse, pen and the first touch)
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let mut a = app.borrow_mut();
                let p = a.field_point(event.client_x() as f32, event.client_y() as f32);
                a.input(InputEvent::PointerDown { x: p.x, y: p.y });
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start (swipe origin)
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if let Some(touch) = event.touches().get(0) {
                    app.borrow_mut()
                        .swipe
                        .begin(touch.client_x() as f32, touch.client_y() as f32);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end (swipe)
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut a = app.borrow_mut();
                let Some(touch) = event.changed_touches().get(0) else {
                    a.swipe.cancel();
                    return;
                };
                if let Some(swipe) = a.swipe.end(touch.client_x() as f32, touch.client_y() as f32) {
                    a.input(swipe);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard (digits pick a game, everything else goes to the session)
        {
            let window = web_sys::window();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let code = event.code();
                let mut a = app.borrow_mut();
                let picked = code
                    .strip_prefix("Digit")
                    .and_then(|d| d.parse::<usize>().ok())
                    .and_then(|n| n.checked_sub(1))
                    .and_then(GameKind::from_index);
                match picked {
                    Some(kind) => a.select(kind),
                    None => {
                        if code == "Space" || code.starts_with("Arrow") {
                            event.prevent_default();
                        }
                        a.input(InputEvent::Key(code));
                    }
                }
            });
            if let Some(window) = window {
                let _ = window
                    .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            }
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_app::run() {
        log::error!("Failed to start: {:?}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Neon Arcade (native) starting...");
    log::info!("Native mode runs a headless demo - run with `trunk serve` for the web version");

    headless::run_all();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Plays every game with scripted random input against an in-memory store
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use neon_arcade::arcade::{Arcade, Screen};
    use neon_arcade::feedback::NullFeedback;
    use neon_arcade::i18n::English;
    use neon_arcade::platform::input::InputEvent;
    use neon_arcade::platform::storage::MemoryStore;
    use neon_arcade::progression::SystemClock;
    use neon_arcade::renderer::DrawList;
    use neon_arcade::scheduler::{FrameLoop, ManualFrames};
    use neon_arcade::sim::GameKind;
    use neon_arcade::tuning::Tuning;

    const MAX_FRAMES: u64 = 60 * 120;
    const KEYS: [&str; 8] = [
        "Space", "ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight", "KeyD", "KeyF", "KeyJ",
    ];

    fn random_event(rng: &mut Pcg32, width: f32, height: f32) -> InputEvent {
        match rng.random_range(0..3) {
            0 => InputEvent::PointerDown {
                x: rng.random_range(0.0..width),
                y: rng.random_range(0.0..height),
            },
            1 => InputEvent::Key(KEYS[rng.random_range(0..KEYS.len())].to_string()),
            _ => InputEvent::Swipe {
                dx: rng.random_range(-120.0..120.0),
                dy: rng.random_range(-120.0..120.0),
            },
        }
    }

    pub fn run_all() {
        let tuning = Tuning::default();
        let field = tuning.field;
        let mut arcade = Arcade::new(
            MemoryStore::new(),
            Box::new(SystemClock),
            Box::new(NullFeedback),
            tuning,
            42,
        );
        let mut rng = Pcg32::seed_from_u64(42);

        for kind in GameKind::ALL {
            arcade.select(kind);
            arcade.start();
            let mut screen = Screen::new(arcade, DrawList::new(), Box::new(English));
            let mut frame_loop = FrameLoop::new();
            let mut frames = ManualFrames::new();
            frame_loop.start(&mut frames);

            let mut now = 0.0;
            while let Some(id) = frames.next() {
                if frame_loop.frames() >= MAX_FRAMES {
                    frame_loop.stop(&mut frames);
                    break;
                }
                if screen.arcade.is_playing() && rng.random_bool(0.08) {
                    screen
                        .arcade
                        .handle_input(&random_event(&mut rng, field.width, field.height));
                }
                frame_loop.on_frame(id, now, &mut frames, &mut screen);
                now += 1.0 / 60.0;
            }

            match screen.arcade.report() {
                Some(report) => log::info!(
                    "{}: {:?} score={} combo={} accuracy={:.0}% coins=+{} unlocked={}",
                    kind.key(),
                    report.status,
                    report.score,
                    report.best_combo,
                    report.accuracy * 100.0,
                    report.settlement.coins_awarded,
                    report.settlement.unlocked.len()
                ),
                None => log::info!(
                    "{}: still playing after {} frames (score {})",
                    kind.key(),
                    frame_loop.frames(),
                    screen.arcade.game().session.score
                ),
            }
            log::debug!("Last frame drew {} commands", screen.surface.commands.len());
            arcade = screen.arcade;
        }

        let progression = arcade.progression();
        for kind in GameKind::ALL {
            println!(
                "{:<10} best {:>6}  coins {:>5}",
                kind.key(),
                progression.high_score(kind),
                progression.coins(kind)
            );
        }
        if let Some(daily) = progression.daily_challenge() {
            println!(
                "Daily {}: {} target {} (streak {})",
                daily.date,
                daily.game_variant.key(),
                daily.target,
                daily.streak
            );
        }
    }
}
