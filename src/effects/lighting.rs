use std::collections::{BTreeMap, HashMap};
use std::f32::consts::TAU;

use glam::Vec3;

use crate::config::ArtConfig;
use crate::scene::Color;

/// Seconds an explosion flash takes to fade from peak to dark.
pub const FLASH_DURATION: f32 = 0.5;
pub const DEFAULT_PULSE_SPEED: f32 = 2.0;
pub const DEFAULT_PULSE_AMOUNT: f32 = 0.3;

// ── Lights ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LightId(u32);

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    /// The light shines from here towards the origin.
    pub position: Vec3,
    pub shadow_map_size: u32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
    /// Distance at which the light reaches zero; 0 means unbounded.
    pub range: f32,
    pub decay: f32,
}

impl PointLight {
    pub fn new(position: Vec3, color: Color, intensity: f32, range: f32) -> Self {
        Self { position, color, intensity, range, decay: 2.0 }
    }
}

// ── Animations ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LightAnimationKind {
    /// `I = base·(1 + sin(t·speed)·amount)`; runs until removed.
    Pulse { base: f32, speed: f32, amount: f32 },
    /// Linear move; finishes at progress 1 leaving the light at `to`.
    Move { from: Vec3, to: Vec3, duration: f32 },
    /// `I = peak·max(0, 1 − t/FLASH_DURATION)`; removes its light at zero.
    Flash { peak: f32 },
    /// Sun orbit driving the ambient and directional lights.
    DayNight { duration: f32 },
}

#[derive(Clone, Debug)]
struct LightAnimation {
    target: Option<LightId>,
    kind: LightAnimationKind,
    /// Manager clock value when the animation began.
    started: f32,
    alive: bool,
    /// Held while advanced lighting is off; only pulses are ever paused.
    paused: bool,
}

// ── LightingManager ─────────────────────────────────────────────────────────

/// Scene lights plus every light animation, advanced once per frame.
///
/// Animations live in a single list and carry their own start time; each
/// one is dropped when it reports completion or when its light disappears.
/// After [`LightingManager::dispose`] nothing is advanced or created.
pub struct LightingManager {
    ambient: AmbientLight,
    directional: DirectionalLight,
    lights: BTreeMap<LightId, PointLight>,
    names: HashMap<String, LightId>,
    animations: Vec<LightAnimation>,
    clock: f32,
    next_id: u32,
    advanced: bool,
    disposed: bool,
}

impl LightingManager {
    pub fn new(art: &ArtConfig) -> Self {
        Self {
            ambient: AmbientLight { color: Color::from_hex(0x404040), intensity: 0.4 },
            directional: DirectionalLight {
                color: Color::WHITE,
                intensity: 0.8,
                position: Vec3::new(6.0, 10.0, 4.0),
                shadow_map_size: art.shadow_map_size(),
            },
            lights: BTreeMap::new(),
            names: HashMap::new(),
            animations: Vec::new(),
            clock: 0.0,
            next_id: 0,
            advanced: art.enable_advanced_lighting,
            disposed: false,
        }
    }

    pub fn ambient(&self) -> &AmbientLight {
        &self.ambient
    }

    pub fn directional(&self) -> &DirectionalLight {
        &self.directional
    }

    pub fn light(&self, id: LightId) -> Option<&PointLight> {
        self.lights.get(&id)
    }

    pub fn light_mut(&mut self, id: LightId) -> Option<&mut PointLight> {
        self.lights.get_mut(&id)
    }

    pub fn find(&self, name: &str) -> Option<LightId> {
        self.names.get(name).copied()
    }

    pub fn point_lights(&self) -> impl Iterator<Item = (LightId, &PointLight)> {
        self.lights.iter().map(|(id, l)| (*id, l))
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    pub fn active_animations(&self) -> usize {
        self.animations.iter().filter(|a| a.alive && !a.paused).count()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn advanced_enabled(&self) -> bool {
        self.advanced
    }

    /// Up to `max` point lights, brightest first.
    pub fn brightest(&self, max: usize) -> Vec<PointLight> {
        let mut lights: Vec<PointLight> =
            self.lights.values().copied().filter(|l| l.intensity > 0.0).collect();
        lights.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));
        lights.truncate(max);
        lights
    }

    pub fn add_light(&mut self, light: PointLight) -> Option<LightId> {
        if self.disposed {
            tracing::warn!("light added to a disposed lighting manager");
            return None;
        }
        let id = LightId(self.next_id);
        self.next_id += 1;
        self.lights.insert(id, light);
        Some(id)
    }

    /// Add a light addressable by `name`, replacing any light of that name.
    pub fn add_named_light(&mut self, name: &str, light: PointLight) -> Option<LightId> {
        if let Some(old) = self.names.remove(name) {
            self.remove_light(old);
        }
        let id = self.add_light(light)?;
        self.names.insert(name.to_string(), id);
        Some(id)
    }

    /// Remove a light and stop every animation that drives it.
    pub fn remove_light(&mut self, id: LightId) -> bool {
        for anim in &mut self.animations {
            if anim.target == Some(id) {
                anim.alive = false;
            }
        }
        self.names.retain(|_, v| *v != id);
        self.lights.remove(&id).is_some()
    }

    /// Transient orange flash at `position`, peak `2·intensity`.
    pub fn explosion_flash(&mut self, position: Vec3, intensity: f32) -> Option<LightId> {
        if !self.advanced {
            return None;
        }
        let peak = 2.0 * intensity;
        let mut light = PointLight::new(position, Color::from_hex(0xff4500), peak, 8.0);
        light.decay = 2.0;
        let id = self.add_light(light)?;
        self.start(Some(id), LightAnimationKind::Flash { peak });
        Some(id)
    }

    pub fn pulse(&mut self, id: LightId, speed: f32, amount: f32) -> bool {
        let Some(base) = self.lights.get(&id).map(|l| l.intensity) else { return false };
        self.advanced && self.start(Some(id), LightAnimationKind::Pulse { base, speed, amount })
    }

    pub fn move_light(&mut self, id: LightId, to: Vec3, duration: f32) -> bool {
        let Some(from) = self.lights.get(&id).map(|l| l.position) else { return false };
        self.advanced && self.start(Some(id), LightAnimationKind::Move { from, to, duration })
    }

    /// Start a day/night cycle of `duration` seconds; replaces a running one.
    pub fn start_day_night(&mut self, duration: f32) -> bool {
        if !self.advanced || duration <= 0.0 {
            return false;
        }
        for anim in &mut self.animations {
            if matches!(anim.kind, LightAnimationKind::DayNight { .. }) {
                anim.alive = false;
            }
        }
        self.start(None, LightAnimationKind::DayNight { duration })
    }

    fn start(&mut self, target: Option<LightId>, kind: LightAnimationKind) -> bool {
        if self.disposed {
            tracing::warn!(?kind, "animation refused: lighting manager disposed");
            return false;
        }
        self.animations.push(LightAnimation { target, kind, started: self.clock, alive: true, paused: false });
        true
    }

    /// Advance every live animation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.disposed {
            return;
        }
        self.clock += dt;
        let now = self.clock;

        let Self { ambient, directional, lights, animations, names, .. } = self;
        for anim in animations.iter_mut().filter(|a| a.alive && !a.paused) {
            let elapsed = now - anim.started;

            if let LightAnimationKind::DayNight { duration } = anim.kind {
                let cycle = (elapsed / duration).rem_euclid(1.0);
                let angle = cycle * TAU;
                let height = angle.sin();
                directional.position = Vec3::new(
                    angle.cos() * 10.0,
                    (height * 10.0 + 5.0).max(0.0),
                    angle.sin() * 10.0,
                );
                ambient.intensity = 0.2 + height.max(0.0) * 0.3;
                directional.intensity = height.max(0.0) * 0.8;
                continue;
            }

            let Some(id) = anim.target else {
                anim.alive = false;
                continue;
            };
            let Some(light) = lights.get_mut(&id) else {
                anim.alive = false;
                continue;
            };

            match anim.kind {
                LightAnimationKind::Pulse { base, speed, amount } => {
                    light.intensity = base * (1.0 + (elapsed * speed).sin() * amount);
                }
                LightAnimationKind::Move { from, to, duration } => {
                    let progress = if duration > 0.0 { (elapsed / duration).min(1.0) } else { 1.0 };
                    light.position = from.lerp(to, progress);
                    if progress >= 1.0 {
                        anim.alive = false;
                    }
                }
                LightAnimationKind::Flash { peak } => {
                    let intensity = peak * (1.0 - elapsed / FLASH_DURATION).max(0.0);
                    light.intensity = intensity;
                    if intensity <= 0.0 {
                        lights.remove(&id);
                        names.retain(|_, v| *v != id);
                        anim.alive = false;
                    }
                }
                LightAnimationKind::DayNight { .. } => {}
            }
        }
        animations.retain(|a| a.alive);
    }

    /// Re-derive shadow resolution and the advanced-lighting switch.
    ///
    /// Turning advanced lighting off removes flash lights, ends moves and the
    /// day/night cycle, and pauses pulses at their base intensity. Turning it
    /// back on resumes the paused pulses.
    pub fn apply_config(&mut self, art: &ArtConfig) {
        self.directional.shadow_map_size = art.shadow_map_size();
        match (self.advanced, art.enable_advanced_lighting) {
            (true, false) => self.suspend_animations(),
            (false, true) => {
                for anim in &mut self.animations {
                    anim.paused = false;
                }
            }
            _ => {}
        }
        self.advanced = art.enable_advanced_lighting;
    }

    fn suspend_animations(&mut self) {
        let Self { lights, names, animations, .. } = self;
        for anim in animations.iter_mut() {
            match (anim.kind, anim.target) {
                (LightAnimationKind::Pulse { base, .. }, Some(id)) => {
                    if let Some(light) = lights.get_mut(&id) {
                        light.intensity = base;
                    }
                    anim.paused = true;
                }
                (LightAnimationKind::Flash { .. }, Some(id)) => {
                    lights.remove(&id);
                    names.retain(|_, v| *v != id);
                    anim.alive = false;
                }
                _ => anim.alive = false,
            }
        }
        animations.retain(|a| a.alive);
        self.reset_sun();
    }

    fn reset_sun(&mut self) {
        self.ambient.intensity = 0.4;
        self.directional.intensity = 0.8;
        self.directional.position = Vec3::new(6.0, 10.0, 4.0);
    }

    /// Drop every light and animation and refuse further work.
    pub fn dispose(&mut self) {
        self.animations.clear();
        self.lights.clear();
        self.names.clear();
        self.disposed = true;
    }
}
