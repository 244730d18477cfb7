pub mod lighting;
pub mod particles;
pub mod post;

use glam::Vec3;

use crate::config::ArtConfig;
use crate::grid::GridWorld;
use crate::lifecycle::Explosion;
use crate::scene::Color;

use lighting::{DEFAULT_PULSE_AMOUNT, DEFAULT_PULSE_SPEED, LightId, LightingManager, PointLight};
use particles::{EffectKind, ParticleConfig, ParticleSystem};
use post::PostProcessSettings;

/// Height above the floor at which blast particles start.
const BLAST_HEIGHT: f32 = 0.3;
/// Intensity of the fire burst on every cell a blast reaches.
const RAY_FIRE_INTENSITY: f32 = 0.6;

/// Purely visual consequences of gameplay: particles, transient lights and
/// full-screen effect parameters. Nothing here feeds back into the grid.
pub struct EffectsPipeline {
    pub particles: ParticleSystem,
    pub lighting: LightingManager,
    pub post: PostProcessSettings,
    art: ArtConfig,
}

impl EffectsPipeline {
    pub fn new(art: &ArtConfig, seed: Option<u64>) -> Self {
        Self {
            particles: ParticleSystem::new(seed),
            lighting: LightingManager::new(art),
            post: PostProcessSettings::from_config(art),
            art: art.clone(),
        }
    }

    pub fn art(&self) -> &ArtConfig {
        &self.art
    }

    /// Re-derive every dependent parameter from `art`.
    pub fn apply_config(&mut self, art: &ArtConfig) {
        if !art.enable_particles {
            self.particles.clear();
        }
        self.lighting.apply_config(art);
        self.post.apply_config(art);
        self.art = art.clone();
    }

    /// Table defaults for `kind` with the count scaled by quality and
    /// `intensity`.
    pub fn scaled(&self, kind: EffectKind, intensity: f32) -> ParticleConfig {
        let mut config = kind.defaults();
        config.count = self.art.particle_count_for(config.count, intensity);
        config
    }

    fn emit(&mut self, origin: Vec3, direction: Vec3, config: &ParticleConfig) -> usize {
        if !self.art.enable_particles {
            return 0;
        }
        self.particles.emit(origin, direction, config)
    }

    /// Fireball, smoke column and a fading flash light.
    pub fn explosion(&mut self, position: Vec3, intensity: f32) -> usize {
        let mut burst = self.scaled(EffectKind::Explosion, intensity);
        burst.speed *= intensity;
        burst.size *= intensity;
        let mut smoke = self.scaled(EffectKind::Smoke, intensity);
        smoke.size *= intensity;

        let spawned = self.emit(position, Vec3::Y, &burst) + self.emit(position, Vec3::Y, &smoke);
        self.lighting.explosion_flash(position, intensity);
        spawned
    }

    pub fn spark(&mut self, position: Vec3, direction: Vec3, intensity: f32) -> usize {
        let mut config = self.scaled(EffectKind::Spark, intensity);
        config.speed *= intensity;
        self.emit(position, direction, &config)
    }

    pub fn fire(&mut self, position: Vec3, intensity: f32) -> usize {
        let mut config = self.scaled(EffectKind::Fire, intensity);
        config.size *= intensity;
        self.emit(position, Vec3::Y, &config)
    }

    pub fn smoke(&mut self, position: Vec3, intensity: f32) -> usize {
        let mut config = self.scaled(EffectKind::Smoke, intensity);
        config.size *= intensity;
        self.emit(position, Vec3::Y, &config)
    }

    pub fn trail(&mut self, start: Vec3, end: Vec3) -> usize {
        if !self.art.enable_particles {
            return 0;
        }
        let config = self.scaled(EffectKind::Trail, 1.0);
        self.particles.emit_trail(start, end, &config)
    }

    /// Pulsing point light, e.g. a beacon over the spawn cell.
    pub fn beacon(&mut self, name: &str, position: Vec3, color: Color) -> Option<LightId> {
        let id = self
            .lighting
            .add_named_light(name, PointLight::new(position, color, 1.0, 6.0))?;
        self.lighting.pulse(id, DEFAULT_PULSE_SPEED, DEFAULT_PULSE_AMOUNT);
        Some(id)
    }

    /// Visuals for one detonation: the full explosion at the origin and a
    /// fire burst on every reached cell.
    pub fn on_explosion(&mut self, explosion: &Explosion, grid: &GridWorld) -> usize {
        let lift = Vec3::Y * BLAST_HEIGHT;
        let mut spawned = self.explosion(grid.to_world(explosion.origin) + lift, 1.0);
        for cell in &explosion.reached {
            spawned += self.fire(grid.to_world(*cell) + lift, RAY_FIRE_INTENSITY);
        }
        spawned
    }

    pub fn update(&mut self, dt: f32) {
        self.particles.update(dt);
        self.lighting.update(dt);
        self.post.update(dt);
    }

    pub fn dispose(&mut self) {
        self.particles.clear();
        self.lighting.dispose();
    }
}
