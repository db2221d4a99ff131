//! SapoBot entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use glam::{IVec2, Vec2};
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use sapo_bot::consts::*;
    use sapo_bot::editor::{MapEditor, Tool};
    use sapo_bot::renderer::{IsoRenderer, RenderError, RenderState};
    use sapo_bot::sim::{GameEvent, LevelData, Session, TickInput, tick};
    use sapo_bot::{MedalBook, Program, Settings, levels};

    /// Level id used when play-testing the editor map
    const SANDBOX_ID: &str = "sandbox";

    thread_local! {
        /// Running game, reachable from the exported JS API
        static GAME: RefCell<Option<Rc<RefCell<Game>>>> = const { RefCell::new(None) };
    }

    /// Game instance holding all state
    struct Game {
        session: Session,
        settings: Settings,
        render_state: Option<RenderState>,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        level_index: usize,
        /// Map editor, open when `Some`
        editor: Option<MapEditor>,
        /// Editor tile under the mouse
        hover: Option<IVec2>,
        /// Canvas size in CSS pixels
        view_size: (f32, f32),
    }

    impl Game {
        fn new(session: Session, settings: Settings, view_size: (f32, f32)) -> Self {
            Self {
                session,
                settings,
                render_state: None,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                level_index: 0,
                editor: None,
                hover: None,
                view_size,
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= TICK_DT && substeps < MAX_SUBSTEPS {
                let input = std::mem::take(&mut self.input);
                let events = tick(&mut self.session, &input);
                self.accumulator -= TICK_DT;
                substeps += 1;

                if input.cycle_speed || input.rotate_left || input.rotate_right {
                    self.settings.speed = self.session.speed();
                    self.settings.set_camera(self.session.camera);
                    self.settings.save();
                }
                self.handle_events(&events);
            }
        }

        fn handle_events(&mut self, events: &[GameEvent]) {
            for event in events {
                match event {
                    GameEvent::MapSolved { executed, medal } => {
                        log::info!("Solved in {} instructions: {}", executed, medal.as_str());
                        save_medals(&self.session.book);
                        set_text("medal", medal.as_str());
                    }
                    GameEvent::ProgramFinished { executed } => {
                        log::info!("Program ended after {} instructions", executed);
                    }
                    _ => {}
                }
            }
            set_text("executed", &self.session.executed_count().to_string());
        }

        /// Render the current frame
        fn render(&mut self) {
            let (w, h) = self.view_size;
            let frame = match &self.editor {
                Some(editor) => editor.render(self.hover),
                None => IsoRenderer::for_session(&self.session, w, h)
                    .with_settings(&self.settings)
                    .render(&self.session.world, &self.session.snapshot()),
            };

            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&frame) {
                    Ok(_) => {}
                    Err(RenderError::Surface(wgpu::SurfaceError::Lost)) => {
                        render_state.resize(render_state.size.0, render_state.size.1, self.view_size);
                    }
                    Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        fn load_level(&mut self, index: usize) {
            let Some(id) = levels::id(index) else {
                log::warn!("No level {}", index);
                return;
            };
            match levels::load(index) {
                Some(Ok(level)) => match self.session.load_level(id, &level) {
                    Ok(()) => {
                        self.level_index = index;
                        set_text("level", id);
                        set_text("medal", self.session.book.best(id).as_str());
                        if let Some(m) = levels::medals(index) {
                            set_text(
                                "goal",
                                &format!("gold {} / silver {} / bronze {}", m.gold, m.silver, m.bronze),
                            );
                        }
                    }
                    Err(e) => log::error!("Level {} rejected: {}", id, e),
                },
                Some(Err(e)) => log::error!("Level {} is malformed: {}", id, e),
                None => {}
            }
        }

        fn editor_mouse_move(&mut self, screen: Vec2) {
            let Some(editor) = &self.editor else {
                return;
            };
            self.hover = editor.pick_tile(screen);
            match self.hover.and_then(|cell| editor.tile(cell).map(|t| (cell, t))) {
                Some((cell, tile)) => set_text(
                    "coords",
                    &format!(
                        "x: {}  y: {}  h: {}  t: {}",
                        cell.x,
                        cell.y,
                        tile.height,
                        if tile.is_lamp() { "l" } else { "b" }
                    ),
                ),
                None => set_text("coords", ""),
            }
        }

        /// Swap the editor map into the session and close the editor
        fn play_editor_map(&mut self) -> Result<(), JsValue> {
            let editor = self.editor.as_ref().ok_or("editor is not open")?;
            if !editor.is_publishable() {
                return Err("place at least one lamp first".into());
            }
            let level = editor
                .to_level_data()
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            self.session
                .load_level(SANDBOX_ID, &level)
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            self.editor = None;
            self.hover = None;
            set_text("level", SANDBOX_ID);
            Ok(())
        }
    }

    const MEDALS_KEY: &str = "sapo_bot_medals";

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }

    fn load_medals() -> MedalBook {
        storage()
            .and_then(|s| s.get_item(MEDALS_KEY).ok().flatten())
            .and_then(|json| MedalBook::from_json(&json).ok())
            .unwrap_or_default()
    }

    fn save_medals(book: &MedalBook) {
        if let (Some(storage), Ok(json)) = (storage(), book.to_json()) {
            let _ = storage.set_item(MEDALS_KEY, &json);
        }
    }

    fn set_text(id: &str, text: &str) {
        let el = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id));
        if let Some(el) = el {
            el.set_text_content(Some(text));
        }
    }

    fn with_game(f: impl FnOnce(&mut Game)) {
        GAME.with(|slot| {
            if let Some(game) = slot.borrow().as_ref() {
                f(&mut game.borrow_mut());
            }
        });
    }

    /// Queue a program given as JSON. Ignored while a run is in progress.
    #[wasm_bindgen]
    pub fn queue_program(json: &str) -> Result<(), JsValue> {
        let program = Program::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        with_game(|g| g.input.program = Some(program));
        Ok(())
    }

    /// Run button
    #[wasm_bindgen]
    pub fn toggle_run() {
        with_game(|g| g.input.run = true);
    }

    /// Speed button
    #[wasm_bindgen]
    pub fn cycle_speed() {
        with_game(|g| g.input.cycle_speed = true);
    }

    #[wasm_bindgen]
    pub fn rotate_camera(right: bool) {
        with_game(|g| {
            if right {
                g.input.rotate_right = true;
            } else {
                g.input.rotate_left = true;
            }
        });
    }

    #[wasm_bindgen]
    pub fn select_level(index: usize) {
        with_game(|g| g.load_level(index));
    }

    /// Open or close the map editor
    #[wasm_bindgen]
    pub fn show_editor(open: bool) {
        with_game(|g| {
            if open && g.editor.is_none() {
                let (w, h) = g.view_size;
                g.editor = Some(MapEditor::new(Vec2::new(w, h)));
            } else if !open {
                g.editor = None;
                g.hover = None;
            }
        });
    }

    /// Select an editor tool by its shortcut key ("1".."4")
    #[wasm_bindgen]
    pub fn editor_tool(key: &str) {
        let Some(tool) = Tool::from_key(key) else {
            return;
        };
        with_game(|g| {
            if let Some(editor) = g.editor.as_mut() {
                editor.tool = tool;
            }
        });
    }

    #[wasm_bindgen]
    pub fn editor_resize(cols: usize, rows: usize) {
        with_game(|g| {
            if let Some(editor) = g.editor.as_mut() {
                editor.resize(cols, rows);
                g.hover = None;
            }
        });
    }

    #[wasm_bindgen]
    pub fn editor_clear() {
        with_game(|g| {
            if let Some(editor) = g.editor.as_mut() {
                editor.clear();
            }
        });
    }

    #[wasm_bindgen]
    pub fn editor_rotate(right: bool) {
        with_game(|g| {
            if let Some(editor) = g.editor.as_mut() {
                if right {
                    editor.rotate_right();
                } else {
                    editor.rotate_left();
                }
                g.hover = None;
            }
        });
    }

    /// Editor map as level file JSON
    #[wasm_bindgen]
    pub fn editor_export() -> Result<String, JsValue> {
        let mut out = Err(JsValue::from_str("editor is not open"));
        with_game(|g| {
            if let Some(editor) = &g.editor {
                out = editor
                    .to_level_data()
                    .and_then(|level| level.to_json())
                    .map_err(|e| JsValue::from_str(&e.to_string()));
            }
        });
        out
    }

    /// Replace the editor map with level file JSON
    #[wasm_bindgen]
    pub fn editor_import(json: &str) -> Result<(), JsValue> {
        let level = LevelData::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let mut out = Err(JsValue::from_str("editor is not open"));
        with_game(|g| {
            if let Some(editor) = g.editor.as_mut() {
                out = editor
                    .load_level_data(&level)
                    .map_err(|e| JsValue::from_str(&e.to_string()));
                g.hover = None;
            }
        });
        out
    }

    /// Play the editor map
    #[wasm_bindgen]
    pub fn play_editor_map() -> Result<(), JsValue> {
        let mut out = Err(JsValue::from_str("game is not running"));
        with_game(|g| out = g.play_editor_map());
        out
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("SapoBot starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        let view_size = (client_w as f32, client_h as f32);

        // Initialize game
        let settings = Settings::load();
        let level = levels::load(0)
            .ok_or("level pack is empty")?
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let id = levels::id(0).unwrap_or("0");
        let mut session =
            Session::new(id, &level).map_err(|e| JsValue::from_str(&e.to_string()))?;
        session.engine.set_speed(settings.speed);
        session.camera = settings.camera();
        session.book = load_medals();

        let game = Rc::new(RefCell::new(Game::new(session, settings, view_size)));
        // Fills in the level HUD
        game.borrow_mut().load_level(0);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&RenderError::from(e).to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&RenderError::from(e).to_string()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = RenderState::new(surface, &adapter, width, height, view_size)
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        game.borrow_mut().render_state = Some(render_state);

        GAME.with(|slot| *slot.borrow_mut() = Some(game.clone()));

        setup_input_handlers(&canvas, game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("SapoBot running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Keyboard
        if let Some(window) = web_sys::window() {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                if let Some(editor) = g.editor.as_mut() {
                    let key = event.key();
                    if let Some(tool) = Tool::from_key(&key) {
                        editor.tool = tool;
                    }
                    match key.as_str() {
                        "q" | "Q" => editor.rotate_left(),
                        "e" | "E" => editor.rotate_right(),
                        _ => {}
                    }
                    return;
                }
                match event.key().as_str() {
                    " " | "Enter" => g.input.run = true,
                    "Escape" => g.input.stop = true,
                    "s" | "S" => g.input.cycle_speed = true,
                    "q" | "Q" => g.input.rotate_left = true,
                    "e" | "E" => g.input.rotate_right = true,
                    "n" | "N" => {
                        let next = (g.level_index + 1) % levels::count();
                        g.load_level(next);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Double click rotates the camera
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                if g.editor.is_none() {
                    g.input.rotate_right = true;
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("dblclick", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Editor painting
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let screen = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                if let Some(editor) = game.borrow_mut().editor.as_mut() {
                    if let Some(cell) = editor.click(screen) {
                        log::debug!("Painted {:?} with {:?}", cell, editor.tool);
                    }
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Editor hover
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let screen = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                game.borrow_mut().editor_mouse_move(screen);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.hover = None;
                set_text("coords", "");
            });
            let _ = canvas
                .add_event_listener_with_callback("mouseleave", closure.as_ref().unchecked_ref());
            closure.forget();
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

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                TICK_DT
            };
            g.last_time = time;

            g.update(dt);
            g.render();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run().await
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("SapoBot (native) starting...");
    log::info!("Native mode runs headless - serve the web build for the game view");

    let mut args = std::env::args().skip(1);
    let level_index: usize = args.next().and_then(|a| a.parse().ok()).unwrap_or(0);
    let program_path = args.next();

    if let Err(e) = run_headless(level_index, program_path.as_deref()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless run failure
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, thiserror::Error)]
enum HeadlessError {
    #[error("no level {0}")]
    NoLevel(usize),
    #[error("{path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Program(#[from] sapo_bot::ProgramError),
    #[error(transparent)]
    Map(#[from] sapo_bot::sim::MapError),
}

/// Play a program on a built-in level without rendering and report the result
#[cfg(not(target_arch = "wasm32"))]
fn run_headless(level_index: usize, program_path: Option<&str>) -> Result<(), HeadlessError> {
    use sapo_bot::levels;
    use sapo_bot::sim::{GameEvent, Session, TickInput, tick};
    use sapo_bot::{Instruction, Program};

    let id = levels::id(level_index).ok_or(HeadlessError::NoLevel(level_index))?;
    let level = levels::load(level_index).ok_or(HeadlessError::NoLevel(level_index))??;

    let program = match program_path {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|source| HeadlessError::Read {
                path: path.to_string(),
                source,
            })?;
            Program::from_json(&json)?
        }
        None => Program::new(vec![
            Instruction::Walk,
            Instruction::Walk,
            Instruction::ToggleLight,
        ]),
    };

    let mut session = Session::new(id, &level)?;
    let input = TickInput {
        program: Some(program),
        run: true,
        ..Default::default()
    };

    let mut events = tick(&mut session, &input);
    while session.engine.is_running() {
        events.extend(tick(&mut session, &TickInput::default()));
    }

    for event in &events {
        match event {
            GameEvent::InstructionStarted { action, animation } => {
                log::debug!("{} -> {}", action.as_str(), animation.name.as_str());
            }
            GameEvent::Blocked { action } => log::info!("{} blocked", action.as_str()),
            GameEvent::MapSolved { executed, medal } => {
                println!("Level {} solved in {} instructions: {}", id, executed, medal.as_str());
            }
            GameEvent::ProgramFinished { executed } => {
                println!(
                    "Level {} not solved: {} instructions, {}/{} lamps lit",
                    id,
                    executed,
                    session.world.lit_count(),
                    session.world.lamp_count()
                );
            }
            GameEvent::Tick => {}
        }
    }
    Ok(())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_headless_default_program_solves_first_level() {
        assert!(run_headless(0, None).is_ok());
    }

    #[test]
    fn test_headless_errors_are_typed() {
        assert!(matches!(run_headless(99, None), Err(HeadlessError::NoLevel(99))));
        assert!(matches!(
            run_headless(0, Some("/nonexistent/program.json")),
            Err(HeadlessError::Read { .. })
        ));
    }
}
