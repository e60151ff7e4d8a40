//! Stack Tower entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use stack_tower::platform::{self, MENU_URL};
    use stack_tower::renderer::RenderState;
    use stack_tower::sim::{
        BoxWorld, GameEvent, GamePhase, GameSession, InputResponse, LevelSelect, NullRenderer,
        RandomPilot,
    };
    use stack_tower::{Settings, Tuning};

    /// Game instance holding all state
    struct Game {
        session: GameSession<BoxWorld, RandomPilot>,
        render_state: Option<RenderState>,
        settings: Settings,
    }

    impl Game {
        fn new(level: u32, autopilot: bool, aspect: f32, seed: u64) -> Self {
            let tuning = Tuning::default();
            let world = BoxWorld::from_tuning(&tuning);
            let settings = Settings::load();
            let autopilot = autopilot || settings.autopilot;
            Self {
                session: GameSession::new(
                    world,
                    RandomPilot::new(seed),
                    tuning,
                    level,
                    autopilot,
                    aspect,
                ),
                render_state: None,
                settings,
            }
        }

        /// Run one frame and draw it
        fn update(&mut self, time: f64) {
            let Game {
                session,
                render_state,
                ..
            } = self;
            match render_state {
                Some(renderer) => session.advance(time, renderer),
                None => session.advance(time, &mut NullRenderer),
            };
        }

        /// Pointer press or split key
        fn press(&mut self) {
            if self.session.press() == InputResponse::ReturnToMenu {
                return_to_menu();
            }
        }

        fn select_level(&mut self, select: LevelSelect) {
            let level = self.session.select_level(select);
            replace_level_in_url(level);
            reset_hud(level);
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.session.resize(width, height);
            if let Some(ref mut render_state) = self.render_state {
                render_state.resize(width, height);
            }
        }

        /// Apply this frame's gameplay events to the DOM
        fn update_hud(&mut self) {
            let events = self.session.drain_events();
            if events.is_empty() {
                return;
            }
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            for event in events {
                match event {
                    GameEvent::ScoreChanged(score) => {
                        if let Some(el) = document.get_element_by_id("score") {
                            el.set_text_content(Some(&score.to_string()));
                        }
                    }
                    GameEvent::Missed { .. } | GameEvent::SlidOff => {
                        let menu = self.session.game_over_menu();
                        show(&document, "results", true);
                        show(&document, "prevLevelButton", menu.show_previous);
                        show(&document, "nextLevelButton", menu.show_next);
                    }
                    GameEvent::LevelComplete { .. } => show(&document, "nextLevel", true),
                    _ => {}
                }
            }
        }
    }

    /// Toggle an element between visible and the `hidden` class
    fn show(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    /// Put the HUD back into its start-of-session state
    fn reset_hud(level: u32) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        show(&document, "results", false);
        show(&document, "nextLevel", false);
        if let Some(el) = document.get_element_by_id("score") {
            el.set_text_content(Some("0"));
        }
        if let Some(el) = document.get_element_by_id("level") {
            el.set_text_content(Some(&format!("Level: {}", level)));
        }
    }

    fn replace_level_in_url(level: u32) {
        let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
            return;
        };
        let url = platform::level_url(level);
        if let Err(e) = history.replace_state_with_url(&JsValue::NULL, "", Some(&url)) {
            log::warn!("Could not update URL: {:?}", e);
        }
    }

    fn return_to_menu() {
        if let Some(window) = web_sys::window() {
            log::info!("Returning to level select");
            let _ = window.location().set_href(MENU_URL);
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Stack Tower starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr).max(1.0) as u32;
        let height = (canvas.client_height() as f64 * dpr).max(1.0) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let search = window.location().search().unwrap_or_default();
        let tuning = Tuning::default();
        let options = platform::parse_query(&search, tuning.level_count());

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(
            options.level,
            options.autopilot,
            width as f32 / height as f32,
            seed,
        )));
        reset_hud(options.level);

        log::info!(
            "Session at level {} (autopilot {}) with seed {}",
            options.level,
            options.autopilot,
            seed
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match RenderState::new(surface, &adapter, width, height, tuning.box_height).await {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            Err(e) => log::error!("Failed to create device: {}", e),
        }

        setup_input_handlers(game.clone());
        setup_resize_handler(&canvas, game.clone());
        setup_buttons(game.clone());

        request_animation_frame(game);

        log::info!("Stack Tower running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Pointer press anywhere splits
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().press();
            });
            let _ = window
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let key = event.key();
                let finished = g.session.state().phase == GamePhase::LevelComplete;
                if g.settings.is_autopilot_key(&key) && !finished {
                    let enabled = g.session.toggle_autopilot();
                    if g.settings.set_autopilot(enabled) {
                        g.settings.save();
                    }
                } else if finished || g.settings.is_split_key(&key) {
                    event.prevent_default();
                    g.press();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize_handler(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let dpr = window.device_pixel_ratio();
            let width = (canvas.client_width() as f64 * dpr) as u32;
            let height = (canvas.client_height() as f64 * dpr) as u32;
            if width == 0 || height == 0 {
                return;
            }
            canvas.set_width(width);
            canvas.set_height(height);
            game.borrow_mut().resize(width, height);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        let level_buttons = [
            ("returnButton", LevelSelect::Restart),
            ("prevLevelButton", LevelSelect::Previous),
            ("nextLevelButton", LevelSelect::Next),
        ];
        for (id, select) in level_buttons {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                    // Keep the click from reaching the window's split handler
                    event.stop_propagation();
                    game.borrow_mut().select_level(select);
                });
                let _ = btn
                    .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }

        for id in ["menuButton", "continueButton"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                    event.stop_propagation();
                    return_to_menu();
                });
                let _ = btn
                    .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Stack Tower (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let tuning = match args.next() {
        Some(path) => load_tuning(&path),
        None => stack_tower::Tuning::default(),
    };
    autopilot_demo(seed, tuning);
}

/// Read a tuning file, falling back to the defaults
#[cfg(not(target_arch = "wasm32"))]
fn load_tuning(path: &str) -> stack_tower::Tuning {
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| stack_tower::Tuning::from_json(&json).map_err(|e| e.to_string()));
    match parsed {
        Ok(tuning) => {
            log::info!("Loaded tuning from {}", path);
            tuning
        }
        Err(e) => {
            log::warn!("Using default tuning, {} is unusable: {}", path, e);
            stack_tower::Tuning::default()
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Let the autopilot play every level and report how each run ended
#[cfg(not(target_arch = "wasm32"))]
fn autopilot_demo(seed: u64, tuning: stack_tower::Tuning) {
    use stack_tower::sim::{BoxWorld, GameSession, LevelSelect, NullRenderer, RandomPilot};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const MAX_FRAMES: u32 = 60 * 60 * 5;

    let levels = tuning.level_count();
    let world = BoxWorld::from_tuning(&tuning);
    let mut session = GameSession::new(world, RandomPilot::new(seed), tuning, 1, true, 16.0 / 9.0);
    let mut renderer = NullRenderer;

    for level in 1..=levels {
        session.select_level(LevelSelect::Goto(level));
        let mut frames = 0;
        while session.state().is_playing() && frames < MAX_FRAMES {
            session.advance(frames as f64 * FRAME_MS, &mut renderer);
            frames += 1;
        }
        let state = session.state();
        log::info!(
            "Level {}: {:?} after {} frames, score {}, {} layers, {} overhangs",
            level,
            state.phase,
            frames,
            state.score,
            state.stack.len(),
            state.overhangs.len()
        );
    }
}
