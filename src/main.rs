//! Disc Shooter entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlDocument, KeyboardEvent, MouseEvent};

    use disc_shooter::leaderboard::{LeaderboardStore, RunEpoch, format_ms, resolve_rank};
    use disc_shooter::session::{CookieStore, Session};
    use disc_shooter::sim::{FrameInput, GameEvent, RunPhase, SimState, tick};

    /// Cookie jar backed by `document.cookie`
    struct DocumentCookies {
        doc: HtmlDocument,
    }

    impl DocumentCookies {
        fn new() -> Option<Self> {
            let doc: HtmlDocument = web_sys::window()?.document()?.dyn_into().ok()?;
            Some(Self { doc })
        }
    }

    impl CookieStore for DocumentCookies {
        fn get(&self, name: &str) -> Option<String> {
            let jar = self.doc.cookie().ok()?;
            for pair in jar.split(';') {
                let pair = pair.trim();
                if let Some(value) = pair.strip_prefix(name).and_then(|r| r.strip_prefix('=')) {
                    return Some(
                        js_sys::decode_uri_component(value)
                            .map(|s| s.as_string().unwrap_or_default())
                            .unwrap_or_else(|_| value.to_string()),
                    );
                }
            }
            None
        }

        fn set(&mut self, name: &str, value: &str, days: u32) {
            let encoded = js_sys::encode_uri_component(value);
            let max_age = days as u64 * 86_400;
            let cookie = format!("{name}={encoded}; max-age={max_age}; path=/; samesite=lax");
            let _ = self.doc.set_cookie(&cookie);
        }
    }

    /// Game instance holding all state
    struct Game {
        state: SimState,
        input: FrameInput,
        last_time: f64,
        /// Right-button drag in progress
        dragging: bool,
        board: LeaderboardStore,
        epoch: RunEpoch,
        session: Session,
        /// Guards against double-submitting a finished run
        submitted: bool,
    }

    impl Game {
        fn new(seed: u64, session: Session) -> Self {
            Self {
                state: SimState::new(seed),
                input: FrameInput::default(),
                last_time: 0.0,
                dragging: false,
                board: LeaderboardStore::load(),
                epoch: RunEpoch::new(),
                session,
                submitted: false,
            }
        }

        /// Run one frame of simulation and react to its events
        fn update(&mut self, dt: f32) {
            if self.input.reset {
                // Invalidate anything still in flight for the previous run
                self.epoch.advance();
                self.submitted = false;
            }

            let events = tick(&mut self.state, &self.input, dt);

            // Clear one-shot inputs after processing
            self.input.shoot = false;
            self.input.pickup = false;
            self.input.reset = false;
            self.input.orbit_dx = 0.0;
            self.input.orbit_dy = 0.0;

            for event in events {
                match event {
                    GameEvent::RunStarted => log::info!("Run started"),
                    GameEvent::RunFinished { elapsed_ms } => self.on_finish(elapsed_ms),
                    GameEvent::Scored { id, zone } => {
                        log::debug!("Disc {id} scored in zone {zone}");
                    }
                    _ => {}
                }
            }
        }

        /// Record a finished run and surface its rank
        fn on_finish(&mut self, elapsed_ms: u64) {
            if self.submitted {
                return;
            }
            self.submitted = true;

            let token = self.epoch.token();
            let name = prompt_name(&self.session.name);
            let receipt = self.board.submit_run(&name, elapsed_ms, js_sys::Date::now());
            self.board.save();

            // A reset during the prompt invalidates the result
            if !self.epoch.accepts(token) {
                log::info!("Discarding stale run result");
                return;
            }

            // Exact rank from the submission wins; otherwise count faster
            // rows in the cached mirror, re-reading storage as a last resort.
            let cached = self.board.ranked();
            let rank = resolve_rank(receipt.rank, &cached, receipt.time_ms, || {
                let reloaded = LeaderboardStore::load();
                (!reloaded.is_empty()).then(|| reloaded.ranked())
            });

            let time = format_ms(receipt.time_ms);
            match rank {
                Some(rank) => log::info!("Run finished in {time}, rank #{rank}"),
                None => log::info!("Run finished in {time}"),
            }
            show_finish_panel(&time, rank, &self.board);
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(el) = document.get_element_by_id("hud-score") {
                el.set_text_content(Some(&self.state.score.to_string()));
            }
            if let Some(el) = document.get_element_by_id("hud-inventory") {
                el.set_text_content(Some(&self.state.inventory.to_string()));
            }
            if let Some(el) = document.get_element_by_id("hud-timer") {
                let text = match self.state.phase {
                    RunPhase::NotStarted => "0:00.000".to_string(),
                    _ => format_ms(self.state.elapsed_ms()),
                };
                el.set_text_content(Some(&text));
            }

            if let Some(el) = document.get_element_by_id("finish-panel") {
                let hidden = self.state.phase != RunPhase::Finished;
                let _ = el.class_list().toggle_with_force("hidden", hidden);
            }
        }
    }

    /// Ask for a leaderboard name, defaulting to the session's
    fn prompt_name(default: &str) -> String {
        web_sys::window()
            .and_then(|w| {
                w.prompt_with_message_and_default("Name for the leaderboard?", default)
                    .ok()
                    .flatten()
            })
            .unwrap_or_else(|| default.to_string())
    }

    /// Fill in the finish panel with this run and the current top list
    fn show_finish_panel(time: &str, rank: Option<u32>, board: &LeaderboardStore) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(el) = document.get_element_by_id("finish-time") {
            el.set_text_content(Some(time));
        }
        if let Some(el) = document.get_element_by_id("finish-rank") {
            let text = match rank {
                Some(r) => format!("#{r}"),
                None => "—".to_string(),
            };
            el.set_text_content(Some(&text));
        }
        if let Some(el) = document.get_element_by_id("finish-top") {
            let rows: Vec<String> = board
                .top()
                .iter()
                .map(|r| format!("{} {}", r.username, format_ms(r.time_ms)))
                .collect();
            el.set_text_content(Some(&rows.join("\n")));
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Disc Shooter starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let now = js_sys::Date::now();
        let session = {
            let navigator = window.navigator();
            let user_agent = navigator.user_agent().unwrap_or_default();
            let platform = navigator.platform().unwrap_or_default();
            let mut cookies = DocumentCookies::new().expect("no document for cookies");
            let mut rng = {
                use rand::SeedableRng;
                rand_pcg::Pcg32::seed_from_u64(now as u64)
            };
            Session::load_or_create(&mut cookies, &mut rng, now as u64, &user_agent, &platform)
        };
        if session.first_visit {
            log::info!("First visit, uid {}", session.uid);
        }

        let seed = now as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, session)));
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Disc Shooter running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Held movement keys plus one-shot actions
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "w" | "W" | "ArrowUp" => g.input.forward = true,
                    "s" | "S" | "ArrowDown" => g.input.back = true,
                    "a" | "A" | "ArrowLeft" => g.input.left = true,
                    "d" | "D" | "ArrowRight" => g.input.right = true,
                    "e" | "E" => g.input.pickup = true,
                    "r" | "R" => g.input.reset = true,
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "w" | "W" | "ArrowUp" => g.input.forward = false,
                    "s" | "S" | "ArrowDown" => g.input.back = false,
                    "a" | "A" | "ArrowLeft" => g.input.left = false,
                    "d" | "D" | "ArrowRight" => g.input.right = false,
                    _ => {}
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Left click shoots, right button starts an orbit drag
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                match event.button() {
                    0 => g.input.shoot = true,
                    2 => g.dragging = true,
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if event.button() == 2 {
                    game.borrow_mut().dragging = false;
                }
            });
            let _ = window
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Accumulate drag deltas between frames
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                if g.dragging {
                    g.input.orbit_dx += event.movement_x() as f32;
                    g.input.orbit_dy += event.movement_y() as f32;
                }
            });
            let _ = window
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Right-drag owns the mouse; keep the context menu out of the way
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
            });
            let _ = document
                .add_event_listener_with_callback("contextmenu", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Release held keys when the tab loses focus, otherwise the player
        // keeps running until the key is pressed again
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                g.input.forward = false;
                g.input.back = false;
                g.input.left = false;
                g.input.right = false;
                g.dragging = false;
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Delta since the last frame; tick clamps the long ones
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                1.0 / 60.0
            };
            g.last_time = time;

            g.update(dt);
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
    env_logger::init();
    log::info!("Disc Shooter (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    run_headless_smoke();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted run exercising the full loop without a browser
#[cfg(not(target_arch = "wasm32"))]
fn run_headless_smoke() {
    use disc_shooter::leaderboard::{LeaderboardStore, format_ms};
    use disc_shooter::session::{MemoryCookies, Session};
    use disc_shooter::sim::{FrameInput, GameEvent, SimState, tick};
    use rand::SeedableRng;

    let mut cookies = MemoryCookies::new();
    let mut rng = rand_pcg::Pcg32::seed_from_u64(42);
    let session = Session::load_or_create(&mut cookies, &mut rng, 0, "headless", "Linux");
    log::info!("Session uid: {}", session.uid);

    let mut state = SimState::new(42);
    let mut board = LeaderboardStore::new();
    let dt = 1.0 / 60.0;

    // Run forward for a bit, turning now and then, throwing held discs
    let mut events = Vec::new();
    for frame in 0..600u32 {
        let input = FrameInput {
            forward: true,
            left: frame % 120 < 30,
            pickup: true,
            shoot: state.inventory > 0,
            ..FrameInput::default()
        };
        events.extend(tick(&mut state, &input, dt));
    }

    let collected = events
        .iter()
        .filter(|e| matches!(e, GameEvent::Collected { .. }))
        .count();
    let fired = events
        .iter()
        .filter(|e| matches!(e, GameEvent::ShotFired { .. }))
        .count();
    println!(
        "After 10s: score {}, inventory {}, {} collected, {} thrown, {} discs in play",
        state.score,
        state.inventory,
        collected,
        fired,
        state.discs_in_play()
    );

    let receipt = board.submit_run(&session.name, state.elapsed_ms(), 0.0);
    println!(
        "Recorded {} (rank {:?})",
        format_ms(receipt.time_ms),
        receipt.rank
    );
}
