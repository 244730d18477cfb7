use std::f32::consts::{FRAC_PI_4, TAU};

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::assets::ParticleKind;
use crate::scene::Color;

/// Acceleration used by configs built with [`ParticleConfig::new`].
pub const STANDARD_GRAVITY: f32 = -9.8;

// ── EffectKind ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Explosion,
    Spark,
    Smoke,
    Fire,
    Trail,
}

/// How initial velocities are sampled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Emission {
    /// Random heading within `spread` radians, always upward-biased.
    Omni,
    /// Heading centred on a caller-supplied direction.
    Directional,
    /// Particles laid along a line segment, drifting down.
    Line,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParticleConfig {
    pub count: u32,
    /// Seconds.
    pub lifetime: f32,
    pub speed: f32,
    /// Radians.
    pub spread: f32,
    /// Vertical acceleration, negative is down.
    pub gravity: f32,
    pub size: f32,
    pub color: u32,
    pub material: ParticleKind,
    pub emission: Emission,
}

impl ParticleConfig {
    pub fn new(count: u32, lifetime: f32, color: u32) -> Self {
        Self {
            count,
            lifetime,
            speed: 1.0,
            spread: TAU,
            gravity: STANDARD_GRAVITY,
            size: 0.2,
            color,
            material: ParticleKind::Spark,
            emission: Emission::Omni,
        }
    }
}

struct EffectRow {
    kind: EffectKind,
    config: ParticleConfig,
}

const fn effect(
    kind: EffectKind,
    count: u32,
    lifetime: f32,
    speed: f32,
    spread: f32,
    gravity: f32,
    size: f32,
    color: u32,
    material: ParticleKind,
    emission: Emission,
) -> EffectRow {
    EffectRow {
        kind,
        config: ParticleConfig { count, lifetime, speed, spread, gravity, size, color, material, emission },
    }
}

const EFFECTS: [EffectRow; 5] = [
    effect(EffectKind::Explosion, 50, 2.0, 8.0, TAU, -15.0, 0.3, 0xff4500, ParticleKind::Explosion, Emission::Omni),
    effect(EffectKind::Spark, 20, 1.5, 5.0, FRAC_PI_4, -8.0, 0.15, 0xffff00, ParticleKind::Spark, Emission::Directional),
    effect(EffectKind::Smoke, 30, 3.0, 2.0, TAU, -2.0, 0.5, 0x696969, ParticleKind::Smoke, Emission::Omni),
    effect(EffectKind::Fire, 25, 1.8, 3.0, TAU, -5.0, 0.4, 0xffb703, ParticleKind::Explosion, Emission::Omni),
    effect(EffectKind::Trail, 15, 1.0, 0.0, 0.0, -2.0, 0.1, 0xffff00, ParticleKind::Spark, Emission::Line),
];

impl EffectKind {
    pub const ALL: [EffectKind; 5] = [
        EffectKind::Explosion,
        EffectKind::Spark,
        EffectKind::Smoke,
        EffectKind::Fire,
        EffectKind::Trail,
    ];

    /// Base parameters before quality scaling.
    pub fn defaults(self) -> ParticleConfig {
        let row = match self {
            EffectKind::Explosion => &EFFECTS[0],
            EffectKind::Spark => &EFFECTS[1],
            EffectKind::Smoke => &EFFECTS[2],
            EffectKind::Fire => &EFFECTS[3],
            EffectKind::Trail => &EFFECTS[4],
        };
        debug_assert_eq!(row.kind, self);
        row.config
    }
}

// ── Particle ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub gravity: f32,
    /// Seconds remaining.
    pub lifetime: f32,
    pub max_lifetime: f32,
    /// Size at spawn; `size` shrinks from this to zero.
    pub initial_size: f32,
    pub size: f32,
    pub opacity: f32,
    pub color: Color,
    pub material: ParticleKind,
}

impl Particle {
    /// Advance one tick. Returns `false` once the particle has expired.
    fn step(&mut self, dt: f32) -> bool {
        self.position += self.velocity * dt;
        self.velocity.y += self.gravity * dt;
        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            return false;
        }
        let ratio = self.lifetime / self.max_lifetime;
        self.size = self.initial_size * ratio;
        self.opacity = ratio;
        true
    }
}

// ── ParticleSystem ──────────────────────────────────────────────────────────

/// Fire-and-forget particle pool. Particles never touch game state.
pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: StdRng,
}

impl ParticleSystem {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { particles: Vec::new(), rng }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Burst of `config.count` particles around `origin`. `direction` biases
    /// directional emitters and is ignored otherwise.
    pub fn emit(&mut self, origin: Vec3, direction: Vec3, config: &ParticleConfig) -> usize {
        if config.lifetime <= 0.0 {
            return 0;
        }
        let color = Color::from_hex(config.color);
        self.particles.reserve(config.count as usize);
        for _ in 0..config.count {
            let velocity = match config.emission {
                Emission::Omni => self.omni_velocity(config),
                Emission::Directional => self.directional_velocity(config, direction),
                Emission::Line => Vec3::new(0.0, -1.0, 0.0),
            };
            let particle = self.spawn(origin, velocity, color, config);
            self.particles.push(particle);
        }
        config.count as usize
    }

    /// `config.count` particles spaced evenly from `start` to `end`.
    pub fn emit_trail(&mut self, start: Vec3, end: Vec3, config: &ParticleConfig) -> usize {
        if config.lifetime <= 0.0 || config.count == 0 {
            return 0;
        }
        let color = Color::from_hex(config.color);
        let last = (config.count - 1).max(1) as f32;
        for i in 0..config.count {
            let t = i as f32 / last;
            let jitter = Vec3::new(
                self.rng.gen_range(-0.1..0.1),
                self.rng.gen_range(-0.1..0.1),
                self.rng.gen_range(-0.1..0.1),
            );
            let particle = self.spawn(start.lerp(end, t) + jitter, Vec3::new(0.0, -1.0, 0.0), color, config);
            self.particles.push(particle);
        }
        config.count as usize
    }

    /// Insert a particle with an explicit initial state.
    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    /// Integrate every particle and drop the expired ones.
    pub fn update(&mut self, dt: f32) {
        self.particles.retain_mut(|p| p.step(dt));
    }

    fn spawn(&mut self, position: Vec3, velocity: Vec3, color: Color, config: &ParticleConfig) -> Particle {
        let size = config.size * (0.7 + self.rng.r#gen::<f32>() * 0.6);
        Particle {
            position,
            velocity,
            gravity: config.gravity,
            lifetime: config.lifetime,
            max_lifetime: config.lifetime,
            initial_size: size,
            size,
            opacity: 1.0,
            color,
            material: config.material,
        }
    }

    fn omni_velocity(&mut self, config: &ParticleConfig) -> Vec3 {
        let angle = self.rng.r#gen::<f32>() * config.spread;
        let speed = config.speed * (0.5 + self.rng.r#gen::<f32>() * 0.5);
        Vec3::new(
            angle.cos() * speed,
            self.rng.r#gen::<f32>() * speed * 0.5 + speed * 0.5,
            angle.sin() * speed,
        )
    }

    fn directional_velocity(&mut self, config: &ParticleConfig, direction: Vec3) -> Vec3 {
        let base = direction.z.atan2(direction.x);
        let angle = base + (self.rng.r#gen::<f32>() - 0.5) * config.spread;
        let speed = config.speed * (0.5 + self.rng.r#gen::<f32>() * 0.5);
        Vec3::new(
            angle.cos() * speed,
            self.rng.r#gen::<f32>() * speed * 0.3 + speed * 0.2,
            angle.sin() * speed,
        )
    }
}
