//! World Painter entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, HtmlInputElement, KeyboardEvent, PointerEvent};

    use world_painter::RunController;
    use world_painter::audio::{TIMER_INTERVAL_MS, WebAudioBackend};
    use world_painter::input::{Tool, UiCommand, client_to_screen};
    use world_painter::palette;
    use world_painter::persistence::{LocalStorageStore, SAVE_KEY};
    use world_painter::renderer::CanvasRenderer;
    use world_painter::renderer::raster::css_rgb;
    use world_painter::settings::Settings;
    use world_painter::sim::{RunPhase, Variant};

    /// Arrow / WASD keys currently held
    #[derive(Default)]
    struct HeldKeys {
        left: bool,
        right: bool,
        up: bool,
        down: bool,
    }

    impl HeldKeys {
        /// Update from a key name; returns false for keys that don't steer
        fn set(&mut self, key: &str, held: bool) -> bool {
            let slot = match key {
                "ArrowLeft" | "a" | "A" => &mut self.left,
                "ArrowRight" | "d" | "D" => &mut self.right,
                "ArrowUp" | "w" | "W" => &mut self.up,
                "ArrowDown" | "s" | "S" => &mut self.down,
                _ => return false,
            };
            *slot = held;
            true
        }

        fn axes(&self) -> (f32, f32) {
            let axis = |neg: bool, pos: bool| pos as i32 as f32 - neg as i32 as f32;
            (axis(self.left, self.right), axis(self.up, self.down))
        }
    }

    /// Game instance holding all state
    struct Game {
        controller: RunController<Option<WebAudioBackend>>,
        renderer: CanvasRenderer,
        keys: HeldKeys,
        /// Palettes that currently have a button
        palette_buttons: u32,
    }

    impl Game {
        fn variant(&self) -> Variant {
            self.controller.state().variant
        }

        /// Start from the title card, reading the seed field
        fn start(&mut self) {
            let seed = read_seed_input();
            self.controller.start(seed.as_deref());
            set_hidden("title", true);
            set_hidden("hud", false);
        }

        fn key_down(&mut self, key: &str) {
            if self.controller.phase() == RunPhase::Title {
                if key == "Enter" {
                    self.start();
                }
                return;
            }

            if self.variant() == Variant::Collector && self.keys.set(key, true) {
                let (x, y) = self.keys.axes();
                self.controller.input_mut().set_axes(x, y);
                return;
            }

            match key {
                " " if self.variant() == Variant::Collector => {
                    self.controller.input_mut().action = true;
                }
                "Escape" => self.controller.toggle_pause(),
                "r" | "R" => self.controller.restart(),
                "e" | "E" => self.controller.apply(UiCommand::SelectTool(Tool::Erase)),
                "b" | "B" => self.controller.apply(UiCommand::SelectTool(Tool::Paint)),
                "u" | "U" => self.controller.apply(UiCommand::SelectTool(Tool::Pulse)),
                _ => {
                    if let Some(cmd) = UiCommand::from_key(key) {
                        self.controller.apply(cmd);
                    }
                }
            }
        }

        fn key_up(&mut self, key: &str) {
            if self.keys.set(key, false) {
                let (x, y) = self.keys.axes();
                self.controller.input_mut().set_axes(x, y);
            }
        }
    }

    fn document() -> Option<web_sys::Document> {
        web_sys::window()?.document()
    }

    fn set_hidden(id: &str, hidden: bool) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
        }
    }

    fn read_seed_input() -> Option<String> {
        document()?
            .get_element_by_id("seed")?
            .dyn_into::<HtmlInputElement>()
            .ok()
            .map(|input| input.value())
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("World Painter starting...");

        let Some(document) = document() else {
            log::error!("No document - nothing to draw on");
            return;
        };

        // Hide loading indicator
        set_hidden("loading", true);

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #canvas element");
            return;
        };

        let variant = match canvas.get_attribute("data-variant").as_deref() {
            Some("collector") => Variant::Collector,
            _ => Variant::Painter,
        };

        let store = Box::new(LocalStorageStore::new(SAVE_KEY));
        let audio = WebAudioBackend::new(0.0, js_sys::Date::now() as u64);
        let controller = RunController::new(variant, audio, store);

        let Some(renderer) = CanvasRenderer::new(&canvas, controller.settings()) else {
            log::error!("Canvas 2D context unavailable");
            return;
        };

        let game = Rc::new(RefCell::new(Game {
            controller,
            renderer,
            keys: HeldKeys::default(),
            palette_buttons: 0,
        }));

        log::info!("Game initialized ({:?})", variant);

        // Set up input handlers
        setup_input_handlers(&canvas, game.clone());

        // Set up start button
        setup_start_button(game.clone());

        // Settings panel, tools and palette row
        setup_controls(game.clone());

        // Set up auto-pause on visibility change
        setup_auto_pause(game.clone());

        // Music look-ahead timer
        setup_audio_timer(game.clone());

        set_hidden("title", false);

        // Start game loop
        request_animation_frame(game);

        log::info!("World Painter running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Pointer down / move map client coordinates into the 320x180 screen
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let rect = canvas_clone.get_bounding_client_rect();
                let (x, y) = client_to_screen(
                    event.client_x() as f32,
                    event.client_y() as f32,
                    rect.left() as f32,
                    rect.top() as f32,
                    rect.width() as f32,
                    rect.height() as f32,
                );
                let mut g = game.borrow_mut();
                if g.controller.phase() == RunPhase::Title {
                    g.start();
                    return;
                }
                g.controller.audio_mut().resume();
                g.controller.input_mut().pointer_down(x, y);
                event.prevent_default();
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let rect = canvas_clone.get_bounding_client_rect();
                let (x, y) = client_to_screen(
                    event.client_x() as f32,
                    event.client_y() as f32,
                    rect.left() as f32,
                    rect.top() as f32,
                    rect.width() as f32,
                    rect.height() as f32,
                );
                game.borrow_mut().controller.input_mut().pointer_move(x, y);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Releases anywhere end the stroke
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                game.borrow_mut().controller.input_mut().pointer_up();
            });
            let _ = window
                .add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                let key = event.key();
                if key == " " || key.starts_with("Arrow") {
                    event.prevent_default();
                }
                game.borrow_mut().key_down(&key);
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().key_up(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_start_button(game: Rc<RefCell<Game>>) {
        let Some(button) = document().and_then(|d| d.get_element_by_id("start")) else {
            log::warn!("No #start button; click the canvas to start");
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let mut g = game.borrow_mut();
            if g.controller.phase() == RunPhase::Title {
                g.start();
            } else {
                g.controller.restart();
            }
        });
        let _ = button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Click handler on an element by id
    fn on_click(id: &str, game: &Rc<RefCell<Game>>, cmd: UiCommand) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            on_element_click(&el, game, cmd);
        }
    }

    /// Checkbox mirroring a settings flag; `toggle` flips it
    fn bind_checkbox(
        id: &str,
        game: &Rc<RefCell<Game>>,
        read: fn(&Settings) -> bool,
        toggle: UiCommand,
    ) {
        let Some(input) = document()
            .and_then(|d| d.get_element_by_id(id))
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        input.set_checked(read(game.borrow().controller.settings()));

        let game = game.clone();
        let input_clone = input.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            if input_clone.checked() != read(g.controller.settings()) {
                g.controller.apply(toggle);
            }
        });
        let _ = input.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_controls(game: Rc<RefCell<Game>>) {
        bind_checkbox("perfMode", &game, |s| s.perf_mode, UiCommand::TogglePerfMode);
        bind_checkbox("scanlineMode", &game, |s| s.scanlines, UiCommand::ToggleScanlines);
        bind_checkbox("reducedMotion", &game, |s| s.reduced_motion, UiCommand::ToggleReducedMotion);
        bind_checkbox("highContrast", &game, |s| s.high_contrast, UiCommand::ToggleHighContrast);
        bind_checkbox("showFpsToggle", &game, |s| s.show_fps, UiCommand::ToggleFps);
        bind_checkbox("muteToggle", &game, |s| s.muted, UiCommand::ToggleMute);

        on_click("clearBtn", &game, UiCommand::ClearArt);
        on_click("toolPaint", &game, UiCommand::SelectTool(Tool::Paint));
        on_click("toolErase", &game, UiCommand::SelectTool(Tool::Erase));
        on_click("toolPulse", &game, UiCommand::SelectTool(Tool::Pulse));
        on_click("sizeDown", &game, UiCommand::BrushSmaller);
        on_click("sizeUp", &game, UiCommand::BrushLarger);

        // Volume slider (0 - 1)
        if let Some(slider) = document()
            .and_then(|d| d.get_element_by_id("volume"))
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            slider.set_value(&game.borrow().controller.settings().volume.to_string());
            let slider_clone = slider.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if let Ok(volume) = slider_clone.value().parse::<f32>() {
                    game.borrow_mut().controller.apply(UiCommand::SetVolume(volume));
                }
            });
            let _ = slider.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Rebuild the palette row: one button per unlocked palette
    fn render_palette_buttons(game: &Rc<RefCell<Game>>, unlocked: u32) {
        game.borrow_mut().palette_buttons = unlocked;
        let Some(document) = document() else {
            return;
        };
        let Some(row) = document.get_element_by_id("paletteRow") else {
            return;
        };
        row.set_inner_html("");
        for i in 0..unlocked as usize {
            let Ok(button) = document.create_element("button") else {
                return;
            };
            let _ = button.set_attribute("class", "colorBtn");
            let _ = button.set_attribute(
                "style",
                &format!("background:{}", css_rgb(palette::color(i, 0))),
            );
            let _ = button.set_attribute("title", palette::palette(i).name);
            on_element_click(&button, game, UiCommand::PickPalette(i));
            let _ = row.append_child(&button);
        }
    }

    fn on_element_click(el: &web_sys::Element, game: &Rc<RefCell<Game>>, cmd: UiCommand) {
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            game.borrow_mut().controller.apply(cmd);
        });
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_audio_timer(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut()>::new(move || {
            // Skip the beat rather than wait on a frame in progress
            if let Ok(mut g) = game.try_borrow_mut() {
                g.controller.audio_tick();
            }
        });
        if window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                TIMER_INTERVAL_MS,
            )
            .is_err()
        {
            log::warn!("Audio timer unavailable - music disabled");
        }
        closure.forget();
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
        let unlocked = {
            let g = &mut *game.borrow_mut();
            g.controller.frame(time / 1000.0, &mut g.renderer);
            let unlocked = g.controller.state().unlocks.count();
            (unlocked != g.palette_buttons).then_some(unlocked)
        };
        if let Some(unlocked) = unlocked {
            render_palette_buttons(&game, unlocked);
        }

        request_animation_frame(game);
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let (Some(window), Some(document)) = (web_sys::window(), document()) else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.controller.phase() == RunPhase::Playing {
                        g.controller.pause();
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.controller.phase() == RunPhase::Playing {
                    g.controller.pause();
                    g.keys = HeldKeys::default();
                    g.controller.input_mut().set_axes(0.0, 0.0);
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Headless run: `world-painter [painter|collector] [seed] [seconds]`
///
/// Drives the same run controller with a scripted input, a recording audio
/// backend and a file-backed save next to the working directory.
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use world_painter::RunController;
    use world_painter::audio::CommandRecorder;
    use world_painter::consts::FIXED_DT;
    use world_painter::persistence::{FileStore, SAVE_KEY};
    use world_painter::renderer::FrameLog;
    use world_painter::sim::Variant;

    env_logger::init();
    log::info!("World Painter (native) starting...");

    let mut args = std::env::args().skip(1);
    let variant = match args.next().as_deref() {
        Some("collector") => Variant::Collector,
        _ => Variant::Painter,
    };
    let seed = args.next();
    let seconds: f64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(10.0);

    let store = Box::new(FileStore::new(format!("{}.json", SAVE_KEY)));
    let mut controller = RunController::new(variant, CommandRecorder::new(), store);
    let mut renderer = FrameLog::new();
    controller.start(seed.as_deref());

    // Scripted input: sweep the pointer across the canvas, circle the player
    let frames = (seconds / FIXED_DT).ceil() as u64;
    for i in 0..frames {
        let now = i as f64 * FIXED_DT;
        let t = now as f32;
        {
            let input = controller.input_mut();
            match variant {
                Variant::Painter => {
                    let x = 64.0 + (t * 37.0) % 192.0;
                    let y = 18.0 + 72.0 + (t * 2.3).sin() * 60.0;
                    if i % 90 == 0 {
                        input.pointer_up();
                        input.pointer_down(x, y);
                    } else {
                        input.pointer_move(x, y);
                    }
                }
                Variant::Collector => {
                    input.set_axes((t * 0.7).cos(), (t * 1.1).sin());
                    input.action = i % 120 == 0;
                }
            }
        }
        controller.audio_mut().set_time(now);
        controller.audio_tick();
        controller.frame(now, &mut renderer);
    }
    controller.teardown();

    let state = controller.state();
    println!("seed        {} ({:#010x})", controller.seed_text(), state.seed);
    println!("ticks       {}", state.time_ticks);
    println!("frames      {}", renderer.frames.len());
    match variant {
        Variant::Painter => {
            println!("strokes     {}", state.counters.strokes);
            println!("painted     {}", state.canvas.painted_cells());
            println!("new cells   {}", state.counters.cells_painted);
        }
        Variant::Collector => {
            println!("score       {}", state.counters.score);
            println!("mood shifts {}", state.counters.mood_shifts);
        }
    }
    println!("gems        {}", state.counters.gems);
    println!("unlocked    {}", controller.record().unlocked_count);
    println!("best        {}", controller.record().best_score);
    println!("audio cmds  {}", controller.audio().commands().len());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
