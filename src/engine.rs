use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use glam::{Vec2, Vec3};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::assets::ResourceManager;
use crate::camera::Camera;
use crate::config::{ArtConfig, Settings, TimeStep};
use crate::effects::EffectsPipeline;
use crate::effects::lighting::LightingManager;
use crate::effects::particles::Particle;
use crate::effects::post::PostProcessSettings;
use crate::error::Error;
use crate::game::GameSession;
use crate::input::{ActionMap, GameAction, InputState};
use crate::movement::MoveIntent;
use crate::renderer::Renderer;
use crate::scene::{Color, SceneGraph};

/// Upper bound on fixed-size ticks run in one frame. Any backlog beyond it is
/// dropped.
pub const MAX_FIXED_STEPS: u32 = 8;
/// Peak camera displacement for one detonation, in world units.
pub const EXPLOSION_SHAKE: f32 = 0.15;
const BEACON_HEIGHT: f32 = 2.0;
const SPARK_HEIGHT: f32 = 0.1;

// ── Render backend ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render surface lost")]
    SurfaceLost,
    #[error("render surface outdated")]
    SurfaceOutdated,
    #[error("graphics backend initialisation failed: {0}")]
    Init(String),
    #[error("render backend error: {0}")]
    Backend(String),
}

/// Everything a backend needs to draw one frame. Borrowed, read-only.
pub struct RenderFrame<'a> {
    pub scene: &'a SceneGraph,
    pub camera: &'a Camera,
    pub lighting: &'a LightingManager,
    pub particles: &'a [Particle],
    pub post: &'a PostProcessSettings,
    pub resources: &'a ResourceManager,
    pub frame: u64,
}

/// The drawing side of the scheduler. `Renderer` is the wgpu implementation;
/// tests substitute a recorder.
pub trait RenderBackend {
    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), RenderError>;

    /// The output surface changed size. Recreate size-dependent buffers.
    fn resize(&mut self, width: u32, height: u32);
}

/// What one scheduler iteration did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Simulation ticks run (always 1 in variable mode).
    pub ticks: u32,
    pub steps: u32,
    pub explosions: usize,
    pub rendered: bool,
}

// ── Engine ──────────────────────────────────────────────────────────────────

/// The frame scheduler. One call to [`Engine::frame`] per display refresh:
/// discrete input actions, then movement and fuses, then effects, then render.
pub struct Engine {
    session: GameSession,
    effects: EffectsPipeline,
    camera: Camera,
    resources: ResourceManager,
    /// Raw input, fed by the window layer (or a test).
    pub input: InputState,
    actions: ActionMap<GameAction>,
    time_step: TimeStep,
    accumulator: f32,
    viewport: (u32, u32),
    frame: u64,
}

impl Engine {
    /// Build the session on top of a loaded `resources`.
    ///
    /// Fails with [`crate::assets::AssetError::NotInitialized`] if
    /// `resources.load()` has not run.
    pub fn new(settings: Settings, resources: ResourceManager, width: u32, height: u32) -> Result<Self, Error> {
        let Settings { game, art } = settings;
        let seed = game.seed;
        let time_step = game.time_step;
        let session = GameSession::new(game, &resources)?;
        let camera = Camera::for_board(
            session.grid().size(),
            session.grid().cell_size(),
            width,
            height,
        );

        let mut effects = EffectsPipeline::new(&art, seed);
        let spawn = session.grid().to_world(session.spawn_cell()) + Vec3::Y * BEACON_HEIGHT;
        effects.beacon("spawn", spawn, Color::from_hex(0x4cc9f0));

        tracing::info!(
            grid = session.grid().size(),
            blocks = session.lifecycle().blocks().len(),
            ?time_step,
            "engine ready"
        );

        Ok(Self {
            session,
            effects,
            camera,
            resources,
            input: InputState::new(),
            actions: ActionMap::default_bindings(),
            time_step,
            accumulator: 0.0,
            viewport: (width.max(1), height.max(1)),
            frame: 0,
        })
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn builder() -> EngineBuilder { EngineBuilder::new() }

    pub fn session(&self) -> &GameSession { &self.session }
    pub fn session_mut(&mut self) -> &mut GameSession { &mut self.session }
    pub fn effects(&self) -> &EffectsPipeline { &self.effects }
    pub fn effects_mut(&mut self) -> &mut EffectsPipeline { &mut self.effects }
    pub fn camera(&self) -> &Camera { &self.camera }
    pub fn resources(&self) -> &ResourceManager { &self.resources }
    pub fn actions_mut(&mut self) -> &mut ActionMap<GameAction> { &mut self.actions }
    pub fn viewport(&self) -> (u32, u32) { self.viewport }
    pub fn frame_count(&self) -> u64 { self.frame }

    // ── Scheduler ──────────────────────────────────────────────────────────

    /// Run one scheduler iteration with `dt` seconds of elapsed time.
    ///
    /// Render failures are logged and never abort the frame.
    pub fn frame(&mut self, dt: f32, backend: &mut dyn RenderBackend) -> FrameReport {
        let mut report = FrameReport::default();
        self.handle_actions();

        let intent = self.actions.move_intent(&self.input);
        match self.time_step {
            TimeStep::Variable => self.step(dt, intent, &mut report),
            TimeStep::Fixed(step) => {
                self.accumulator += dt;
                while self.accumulator >= step && report.ticks < MAX_FIXED_STEPS {
                    self.step(step, intent, &mut report);
                    self.accumulator -= step;
                }
                if self.accumulator >= step {
                    tracing::debug!(backlog = self.accumulator, "dropping simulation backlog");
                    self.accumulator = 0.0;
                }
            }
        }

        self.camera.tick(dt);
        self.frame += 1;

        let frame = RenderFrame {
            scene: self.session.scene(),
            camera: &self.camera,
            lighting: &self.effects.lighting,
            particles: self.effects.particles.particles(),
            post: &self.effects.post,
            resources: &self.resources,
            frame: self.frame,
        };
        match backend.render(&frame) {
            Ok(()) => report.rendered = true,
            Err(RenderError::SurfaceLost | RenderError::SurfaceOutdated) => {
                backend.resize(self.viewport.0, self.viewport.1);
            }
            Err(e) => tracing::warn!(error = %e, "frame not rendered"),
        }

        self.input.clear_frame_state();
        report
    }

    /// One simulation tick: movement and fuses, then the visuals they cause.
    fn step(&mut self, dt: f32, intent: MoveIntent, report: &mut FrameReport) {
        let tick = self.session.tick(dt, intent);
        for explosion in &tick.explosions {
            self.effects.on_explosion(explosion, self.session.grid());
            self.camera.shake(EXPLOSION_SHAKE);
        }
        self.effects.update(dt);

        report.ticks += 1;
        report.steps += tick.steps.committed;
        report.explosions += tick.explosions.len();
    }

    fn handle_actions(&mut self) {
        if self.actions.is_pressed(GameAction::Reset, &self.input) {
            self.session.reset();
            self.effects.particles.clear();
        }
        if self.actions.is_pressed(GameAction::PlaceBomb, &self.input) && !self.session.place_bomb() {
            tracing::debug!(cell = ?self.session.player_cell(), "bomb placement rejected");
        }
        if self.actions.is_pressed(GameAction::Poke, &self.input) {
            let (w, h) = self.viewport;
            let cursor = Vec2::from(self.input.mouse_pos);
            if let Some(hit) = self.camera.ray_to_plane(cursor, Vec2::new(w as f32, h as f32), 0.0) {
                self.effects.spark(hit + Vec3::Y * SPARK_HEIGHT, Vec3::Y, 1.0);
            }
        }
    }

    /// The output surface changed size: re-derive the projection and let the
    /// backend recreate its full-screen buffers.
    pub fn viewport_changed(&mut self, width: u32, height: u32, backend: &mut dyn RenderBackend) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
        self.camera.resize(width, height);
        backend.resize(width, height);
    }

    /// Settings entry point: re-derive every dependent parameter from `art`.
    pub fn apply_art_config(&mut self, art: &ArtConfig) {
        if let Some(report) = self.resources.apply_config(art) {
            tracing::info!(loaded = report.loaded.len(), "textures reloaded");
        }
        self.effects.apply_config(art);
    }

    pub fn shutdown(&mut self) {
        self.effects.dispose();
    }
}

// ── EngineBuilder ───────────────────────────────────────────────────────────

pub struct EngineBuilder {
    title: String,
    width: u32,
    height: u32,
    settings: Settings,
    asset_root: PathBuf,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            title: "gridblast".into(),
            width: 1280,
            height: 720,
            settings: Settings::default(),
            asset_root: PathBuf::from("assets/textures"),
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self { Self::default() }
    pub fn with_title(mut self, title: &str) -> Self { self.title = title.into(); self }
    pub fn with_size(mut self, width: u32, height: u32) -> Self { self.width = width; self.height = height; self }
    pub fn with_settings(mut self, settings: Settings) -> Self { self.settings = settings; self }

    /// Directory scanned for material textures.
    pub fn with_asset_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.asset_root = path.into(); self
    }

    /// Load assets, build the engine and run the window event loop until the
    /// window closes.
    pub fn run(self) -> Result<(), Error> {
        let mut resources = ResourceManager::new(&self.asset_root, &self.settings.art);
        resources.load();
        let engine = Engine::new(self.settings, resources, self.width, self.height)?;

        let event_loop = EventLoop::new()?;
        let mut app = App {
            title: self.title,
            width: self.width,
            height: self.height,
            engine,
            renderer: None,
            last_instant: None,
            fatal: None,
        };
        event_loop.run_app(&mut app)?;
        match app.fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// ── App (winit ApplicationHandler) ──────────────────────────────────────────

struct App {
    title: String,
    width: u32,
    height: u32,
    engine: Engine,
    renderer: Option<Renderer>,
    last_instant: Option<Instant>,
    fatal: Option<Error>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title(&self.title)
                .with_inner_size(winit::dpi::PhysicalSize::new(self.width, self.height)),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.fatal = Some(RenderError::Init(e.to_string()).into());
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(Renderer::new(window)) {
            Ok(mut renderer) => {
                let size = renderer.window.inner_size();
                self.engine.viewport_changed(size.width, size.height, &mut renderer);
                self.renderer = Some(renderer);
            }
            Err(e) => {
                self.fatal = Some(e.into());
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = self.renderer.as_ref() {
            renderer.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(renderer) = self.renderer.as_mut() else { return };
        let engine = &mut self.engine;

        match event {
            WindowEvent::CloseRequested => {
                engine.shutdown();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                engine.viewport_changed(size.width, size.height, renderer);
            }

            WindowEvent::Focused(false) => engine.input.release_all(),

            WindowEvent::CursorMoved { position, .. } => {
                engine.input.mouse_pos = [position.x as f32, position.y as f32];
            }

            WindowEvent::MouseInput { button, state, .. } => match state {
                ElementState::Pressed => engine.input.press_mouse(button),
                ElementState::Released => engine.input.release_mouse(button),
            },

            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(code), state, repeat, .. },
                ..
            } => match state {
                ElementState::Pressed if !repeat => engine.input.press_key(code),
                ElementState::Pressed => {}
                ElementState::Released => engine.input.release_key(code),
            },

            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = match self.last_instant {
                    Some(prev) => now.duration_since(prev).as_secs_f32(),
                    None => 0.0,
                };
                self.last_instant = Some(now);
                engine.frame(dt, renderer);
            }

            _ => {}
        }
    }
}
