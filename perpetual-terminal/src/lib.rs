/// Terminal front end: frame loop, input and HUD
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue, terminal,
};
use perpetual_core::{
    AppConfig, AssetLoader, LightingPreset, OrbitControls, ParameterStore, Result, Rgba, Scene,
};
use std::cell::RefCell;
use std::io::{stdout, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub mod panel;
pub mod renderer;

pub use panel::Panel;
pub use renderer::{AsciiRenderer, CELL_ASPECT};

const HUD_FG: Rgba = Rgba::rgb(250, 220, 90);
const STATUS_FG: Rgba = Rgba::rgb(255, 110, 110);
const ORBIT_STEP: f32 = 0.1;
const ZOOM_STEP: f32 = 1.1;

/// Main application struct for the terminal pencil demo
pub struct TerminalApp {
    scene: Rc<RefCell<Scene>>,
    store: ParameterStore,
    panel: Panel,
    renderer: AsciiRenderer,
    target_frame_time: Duration,
    running: bool,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
    message: Option<String>,
}

impl TerminalApp {
    /// Build the scene from `store` and start loading the model.
    pub fn new(config: &AppConfig, mut store: ParameterStore) -> Result<Self> {
        let (width, height) = terminal::size()?;
        let (width, height) = (width as usize, height as usize);

        let asset = AssetLoader::spawn(config.model.source(), config.model.scale);
        let mut scene = Scene::new(
            store.scene_params()?,
            store.pencil_params()?,
            config.lighting,
            OrbitControls::new(config.auto_rotate, config.auto_rotate_speed),
            asset,
        );
        scene.set_viewport(width, height, CELL_ASPECT);

        let scene = Rc::new(RefCell::new(scene));
        let target = Rc::clone(&scene);
        store.subscribe("", move |change| target.borrow_mut().apply(change));

        let fps = config.target_fps.max(1);
        Ok(Self {
            scene,
            store,
            panel: Panel::new(),
            renderer: AsciiRenderer::new(width, height),
            target_frame_time: Duration::from_secs_f32(1.0 / fps as f32),
            running: true,
            last_fps_sample: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            message: None,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> Result<()> {
        info!("entering frame loop");
        let mut last_frame = Instant::now();

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            // Update
            let delta = frame_start.duration_since(last_frame).as_secs_f32();
            last_frame = frame_start;
            self.scene.borrow_mut().update(delta);

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.target_frame_time {
                std::thread::sleep(self.target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_fps_sample).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_fps_sample).as_secs_f32();
                self.frame_count = 0;
                self.last_fps_sample = now;
            }
        }

        info!("frame loop finished");
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press | KeyEventKind::Repeat,
                ..
            }) => self.handle_key(code),
            Event::Resize(width, height) => {
                let (width, height) = (width as usize, height as usize);
                self.renderer.resize(width, height);
                self.scene.borrow_mut().set_viewport(width, height, CELL_ASPECT);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match self.panel.handle_key(code, &mut self.store) {
            Ok(true) => {
                self.message = None;
                return;
            }
            Ok(false) => {}
            Err(err) => {
                warn!(error = %err, "panel edit rejected");
                self.message = Some(err.to_string());
                return;
            }
        }

        let mut scene = self.scene.borrow_mut();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('w') | KeyCode::Up => scene.controls_mut().rotate(0.0, -ORBIT_STEP),
            KeyCode::Char('s') | KeyCode::Down => scene.controls_mut().rotate(0.0, ORBIT_STEP),
            KeyCode::Char('a') | KeyCode::Left => scene.controls_mut().rotate(-ORBIT_STEP, 0.0),
            KeyCode::Char('d') | KeyCode::Right => scene.controls_mut().rotate(ORBIT_STEP, 0.0),
            KeyCode::Char('+') | KeyCode::Char('=') => scene.controls_mut().zoom(1.0 / ZOOM_STEP),
            KeyCode::Char('-') => scene.controls_mut().zoom(ZOOM_STEP),
            KeyCode::Char('l') => {
                let next = next_preset(scene.lighting());
                info!(preset = %next, "switching lighting");
                scene.set_lighting(next);
            }
            _ => {}
        }
    }

    fn render(&mut self) -> Result<()> {
        let (list, status, lighting) = {
            let scene = self.scene.borrow();
            (scene.draw_list(), scene.status(), scene.lighting())
        };

        self.renderer.render(&list);
        self.panel.render(&self.store, &mut self.renderer);

        // Draw UI overlay
        self.renderer.print_text(
            0,
            0,
            &format!(
                "Perpetual Pencil | FPS: {:.1} | light: {} | WASD/Arrows=Orbit +/-=Zoom L=Light Tab/[ ]/Space=Panel H=Hide Q=Quit",
                self.fps, lighting
            ),
            HUD_FG,
            None,
        );
        let bottom = self.renderer.height().saturating_sub(1);
        if let Some(text) = self.message.as_deref().or(status.as_deref()) {
            self.renderer.print_text(0, bottom, text, STATUS_FG, None);
        }

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;
        stdout.flush()?;
        Ok(())
    }
}

fn next_preset(current: LightingPreset) -> LightingPreset {
    let all = LightingPreset::ALL;
    let index = all.iter().position(|p| *p == current).unwrap_or(0);
    all[(index + 1) % all.len()]
}
