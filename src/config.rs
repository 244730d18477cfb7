use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ── Quality ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
}

impl Quality {
    /// Scale applied to every effect's base particle count.
    pub fn particle_multiplier(self) -> f32 {
        match self {
            Quality::Low => 0.5,
            Quality::Medium => 1.0,
            Quality::High => 1.5,
        }
    }

    /// Longest texture edge kept after loading, in pixels.
    pub fn max_texture_size(self) -> u32 {
        match self {
            Quality::Low => 128,
            Quality::Medium => 256,
            Quality::High => 512,
        }
    }

    pub fn shadow_map_size(self) -> u32 {
        match self {
            Quality::Low => 512,
            Quality::Medium => 1024,
            Quality::High => 2048,
        }
    }
}

// ── TimeStep ────────────────────────────────────────────────────────────────

/// How the scheduler turns measured frame time into simulation ticks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeStep {
    /// One tick per frame using the measured delta.
    #[default]
    Variable,
    /// Constant-size ticks drained from an accumulator.
    Fixed(f32),
}

// ── GameConfig ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub grid_size: u32,
    pub cell_size: f32,
    /// Seconds from placement to detonation.
    pub bomb_fuse: f32,
    /// Cells reached along each blast ray.
    pub blast_range: u32,
    /// Player speed in cells per second.
    pub move_speed: f32,
    pub spawn_cell: [i32; 2],
    /// Chance that a candidate cell receives a block.
    pub block_density: f64,
    /// Spacing between candidate block cells.
    pub block_stride: u32,
    /// Rows/columns left free along each edge.
    pub block_margin: u32,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub time_step: TimeStep,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 13,
            cell_size: 1.0,
            bomb_fuse: 3.0,
            blast_range: 2,
            move_speed: 8.0,
            spawn_cell: [1, 1],
            block_density: 0.7,
            block_stride: 2,
            block_margin: 2,
            seed: None,
            time_step: TimeStep::Variable,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::Invalid("gridSize must be at least 1".into()));
        }
        if self.cell_size <= 0.0 {
            return Err(ConfigError::Invalid("cellSize must be positive".into()));
        }
        if self.block_stride == 0 {
            return Err(ConfigError::Invalid("blockStride must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.block_density) {
            return Err(ConfigError::Invalid("blockDensity must be within [0, 1]".into()));
        }
        let n = self.grid_size as i32;
        let [sx, sy] = self.spawn_cell;
        if sx < 0 || sy < 0 || sx >= n || sy >= n {
            return Err(ConfigError::Invalid(format!(
                "spawnCell {:?} lies outside a {n}x{n} grid",
                self.spawn_cell
            )));
        }
        if let TimeStep::Fixed(dt) = self.time_step {
            if dt <= 0.0 {
                return Err(ConfigError::Invalid("fixed time step must be positive".into()));
            }
        }
        Ok(())
    }
}

// ── ArtConfig ───────────────────────────────────────────────────────────────

/// Visual settings the settings panel edits at runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArtConfig {
    pub enable_textures: bool,
    pub enable_particles: bool,
    pub enable_advanced_lighting: bool,
    pub enable_post_processing: bool,
    pub texture_quality: Quality,
    pub particle_count: Quality,
    pub shadow_quality: Quality,
}

impl Default for ArtConfig {
    fn default() -> Self {
        Self {
            enable_textures: true,
            enable_particles: true,
            enable_advanced_lighting: true,
            enable_post_processing: true,
            texture_quality: Quality::Medium,
            particle_count: Quality::Medium,
            shadow_quality: Quality::Medium,
        }
    }
}

impl ArtConfig {
    pub fn particle_multiplier(&self) -> f32 {
        self.particle_count.particle_multiplier()
    }

    /// `round(base × multiplier × intensity)`.
    pub fn particle_count_for(&self, base: u32, intensity: f32) -> u32 {
        (base as f32 * self.particle_multiplier() * intensity).round().max(0.0) as u32
    }

    pub fn max_texture_size(&self) -> u32 {
        self.texture_quality.max_texture_size()
    }

    pub fn shadow_map_size(&self) -> u32 {
        self.shadow_quality.shadow_map_size()
    }
}

// ── Settings file ───────────────────────────────────────────────────────────

/// On-disk settings: `{ "game": { ... }, "art": { ... } }`, both optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub game: GameConfig,
    pub art: ArtConfig,
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.game.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
