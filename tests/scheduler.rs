use gridblast::assets::{AssetError, ResourceManager};
use gridblast::config::{ArtConfig, GameConfig, Settings, TimeStep};
use gridblast::engine::{Engine, MAX_FIXED_STEPS, RenderBackend, RenderError, RenderFrame};
use gridblast::grid::GridCoord;
use gridblast::input::{KeyCode, MouseButton};
use gridblast::Error;

/// Headless backend that records what the scheduler hands it.
#[derive(Default)]
struct Recorder {
    frames: Vec<u64>,
    node_counts: Vec<usize>,
    particle_counts: Vec<usize>,
    resizes: Vec<(u32, u32)>,
    /// Errors returned by the next `render` calls, in order.
    fail_with: Vec<RenderError>,
}

impl RenderBackend for Recorder {
    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), RenderError> {
        if !self.fail_with.is_empty() {
            return Err(self.fail_with.remove(0));
        }
        self.frames.push(frame.frame);
        self.node_counts.push(frame.scene.len());
        self.particle_counts.push(frame.particles.len());
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.resizes.push((width, height));
    }
}

fn settings(time_step: TimeStep) -> Settings {
    Settings {
        game: GameConfig { seed: Some(11), time_step, ..GameConfig::default() },
        art: ArtConfig { enable_textures: false, ..ArtConfig::default() },
    }
}

fn engine(time_step: TimeStep) -> Engine {
    let settings = settings(time_step);
    let mut resources = ResourceManager::new("assets/textures", &settings.art);
    resources.load();
    Engine::new(settings, resources, 800, 600).expect("engine builds")
}

#[test]
fn engine_requires_loaded_resources() {
    let settings = settings(TimeStep::Variable);
    let resources = ResourceManager::new("assets/textures", &settings.art);
    let result = Engine::new(settings, resources, 800, 600);
    assert!(matches!(result, Err(Error::Asset(AssetError::NotInitialized))));
}

#[test]
fn every_frame_ticks_once_and_renders() {
    let mut engine = engine(TimeStep::Variable);
    let mut backend = Recorder::default();
    for _ in 0..3 {
        let report = engine.frame(1.0 / 60.0, &mut backend);
        assert_eq!(report.ticks, 1);
        assert!(report.rendered);
    }
    assert_eq!(backend.frames, vec![1, 2, 3]);
    assert_eq!(engine.frame_count(), 3);
}

#[test]
fn held_keys_move_the_player() {
    let mut engine = engine(TimeStep::Variable);
    let mut backend = Recorder::default();
    engine.input.press_key(KeyCode::KeyD);
    let report = engine.frame(1.0 / 8.0, &mut backend);
    assert_eq!(report.steps, 1);
    assert_eq!(engine.session().player_cell(), GridCoord::new(2, 1));

    // Held, not re-pressed: keeps walking.
    engine.frame(1.0 / 8.0, &mut backend);
    assert_eq!(engine.session().player_cell(), GridCoord::new(3, 1));

    engine.input.release_key(KeyCode::KeyD);
    engine.frame(1.0 / 8.0, &mut backend);
    assert_eq!(engine.session().player_cell(), GridCoord::new(3, 1));
}

#[test]
fn bomb_key_places_once_per_press_and_explodes() {
    let mut engine = engine(TimeStep::Variable);
    let mut backend = Recorder::default();

    engine.input.press_key(KeyCode::Space);
    engine.frame(0.0, &mut backend);
    assert_eq!(engine.session().lifecycle().bombs().len(), 1);
    let with_bomb = backend.node_counts[0];

    engine.frame(1.5, &mut backend);
    let report = engine.frame(1.5, &mut backend);
    assert_eq!(report.explosions, 1);
    assert!(engine.session().lifecycle().bombs().is_empty());
    assert_eq!(backend.node_counts[2], with_bomb - 1);
    assert!(backend.particle_counts[2] > 0, "the blast leaves particles");
}

#[test]
fn reset_key_clears_bombs_and_particles() {
    let mut engine = engine(TimeStep::Variable);
    let mut backend = Recorder::default();
    engine.input.press_key(KeyCode::Space);
    engine.frame(0.0, &mut backend);
    engine.input.release_key(KeyCode::Space);
    engine.frame(1.5, &mut backend);
    engine.frame(1.5, &mut backend);
    assert!(!engine.effects().particles.is_empty());

    engine.input.press_key(KeyCode::KeyR);
    engine.frame(0.0, &mut backend);
    assert!(engine.effects().particles.is_empty());
    assert_eq!(engine.session().player_cell(), GridCoord::new(1, 1));
}

#[test]
fn poke_sparks_where_the_pointer_meets_the_floor() {
    let mut engine = engine(TimeStep::Variable);
    let mut backend = Recorder::default();
    engine.input.mouse_pos = [400.0, 300.0];
    engine.input.press_mouse(MouseButton::Left);
    engine.frame(0.0, &mut backend);
    assert_eq!(engine.effects().particles.len(), 20);
}

#[test]
fn fixed_step_drains_the_accumulator() {
    let mut engine = engine(TimeStep::Fixed(0.125));
    let mut backend = Recorder::default();
    assert_eq!(engine.frame(0.3, &mut backend).ticks, 2);
    // 0.05 left over + 0.1 = one more tick.
    assert_eq!(engine.frame(0.1, &mut backend).ticks, 1);
    assert_eq!(engine.frame(0.0, &mut backend).ticks, 0);
    assert_eq!(backend.frames.len(), 3, "renders even without a tick");
}

#[test]
fn fixed_step_backlog_is_capped() {
    let mut engine = engine(TimeStep::Fixed(0.125));
    let mut backend = Recorder::default();
    assert_eq!(engine.frame(10.0, &mut backend).ticks, MAX_FIXED_STEPS);
    assert_eq!(engine.frame(0.0, &mut backend).ticks, 0, "backlog is dropped");
}

#[test]
fn viewport_change_reaches_camera_and_backend() {
    let mut engine = engine(TimeStep::Variable);
    let mut backend = Recorder::default();
    engine.viewport_changed(1000, 500, &mut backend);
    assert_eq!(engine.viewport(), (1000, 500));
    assert!((engine.camera().aspect() - 2.0).abs() < 1e-6);
    assert_eq!(backend.resizes, vec![(1000, 500)]);

    engine.viewport_changed(0, 500, &mut backend);
    assert_eq!(engine.viewport(), (1000, 500), "minimised windows are ignored");
    assert_eq!(backend.resizes.len(), 1);
}

#[test]
fn lost_surface_is_recreated_and_the_loop_continues() {
    let mut engine = engine(TimeStep::Variable);
    let mut backend = Recorder {
        fail_with: vec![RenderError::SurfaceLost, RenderError::Backend("device hiccup".into())],
        ..Recorder::default()
    };

    let report = engine.frame(0.016, &mut backend);
    assert!(!report.rendered);
    assert_eq!(backend.resizes, vec![(800, 600)]);

    let report = engine.frame(0.016, &mut backend);
    assert!(!report.rendered);
    assert_eq!(backend.resizes.len(), 1, "other errors are only logged");

    let report = engine.frame(0.016, &mut backend);
    assert!(report.rendered);
    assert_eq!(backend.frames, vec![3]);
}

#[test]
fn art_settings_propagate() {
    let mut engine = engine(TimeStep::Variable);
    let art = ArtConfig { enable_textures: false, enable_post_processing: false, ..ArtConfig::default() };
    engine.apply_art_config(&art);
    assert_eq!(engine.effects().post.active().count(), 0);
    assert_eq!(engine.effects().art(), &art);
}

#[test]
fn spawn_beacon_is_lit() {
    let engine = engine(TimeStep::Variable);
    assert!(engine.effects().lighting.find("spawn").is_some());
}
