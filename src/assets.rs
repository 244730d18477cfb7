use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use image::imageops::FilterType;

use crate::config::ArtConfig;
use crate::scene::Color;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("assets requested before loading finished")]
    NotInitialized,
    #[error("texture not found under asset root: {0}")]
    Missing(String),
    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("texture loader thread panicked")]
    WorkerPanicked,
}

// ── MaterialKey ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GroundKind {
    Base,
    Tile1,
    Tile2,
    Grass,
    Concrete,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Brick,
    Stone,
    Wood,
    Metal,
    Cracked,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WallKind {
    Stone,
    Metal,
    Concrete,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FireKind {
    Flame,
    Smoke,
    Spark,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    Spark,
    Smoke,
    Explosion,
}

/// Every material the game can draw. Each variant owns exactly one row of
/// [`MATERIALS`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MaterialKey {
    Ground(GroundKind),
    Block(BlockKind),
    Wall(WallKind),
    Player,
    Bomb,
    Fire(FireKind),
    Particle(ParticleKind),
}

impl MaterialKey {
    pub fn spec(self) -> &'static MaterialSpec {
        &MATERIALS[self.row()]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Resolves a symbolic name such as `"stone"` or `"player"`.
    pub fn from_name(name: &str) -> Option<Self> {
        MATERIALS.iter().find(|s| s.name == name).map(|s| s.key)
    }

    pub fn all() -> impl Iterator<Item = MaterialKey> {
        MATERIALS.iter().map(|s| s.key)
    }

    fn row(self) -> usize {
        use MaterialKey::*;
        match self {
            Ground(GroundKind::Base) => 0,
            Ground(GroundKind::Tile1) => 1,
            Ground(GroundKind::Tile2) => 2,
            Ground(GroundKind::Grass) => 3,
            Ground(GroundKind::Concrete) => 4,
            Block(BlockKind::Brick) => 5,
            Block(BlockKind::Stone) => 6,
            Block(BlockKind::Wood) => 7,
            Block(BlockKind::Metal) => 8,
            Block(BlockKind::Cracked) => 9,
            Wall(WallKind::Stone) => 10,
            Wall(WallKind::Metal) => 11,
            Wall(WallKind::Concrete) => 12,
            Player => 13,
            Bomb => 14,
            Fire(FireKind::Flame) => 15,
            Fire(FireKind::Smoke) => 16,
            Fire(FireKind::Spark) => 17,
            Particle(ParticleKind::Spark) => 18,
            Particle(ParticleKind::Smoke) => 19,
            Particle(ParticleKind::Explosion) => 20,
        }
    }
}

// ── Material table ──────────────────────────────────────────────────────────

/// Static description of one material: where its texture lives and what
/// to draw when the texture is missing or disabled.
#[derive(Debug)]
pub struct MaterialSpec {
    pub key: MaterialKey,
    pub name: &'static str,
    /// Relative to the asset root, without extension.
    pub path: &'static str,
    /// Flat `0xRRGGBB` fallback color.
    pub color: u32,
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: u32,
    pub emissive_intensity: f32,
}

const fn row(
    key: MaterialKey,
    name: &'static str,
    path: &'static str,
    color: u32,
    roughness: f32,
    metalness: f32,
    emissive: u32,
    emissive_intensity: f32,
) -> MaterialSpec {
    MaterialSpec { key, name, path, color, roughness, metalness, emissive, emissive_intensity }
}

use self::MaterialKey as K;

pub const MATERIALS: [MaterialSpec; 21] = [
    row(K::Ground(GroundKind::Base), "ground", "ground/base", 0x1a2235, 0.8, 0.2, 0, 0.0),
    row(K::Ground(GroundKind::Tile1), "tile1", "ground/tile1", 0x243251, 0.9, 0.1, 0, 0.0),
    row(K::Ground(GroundKind::Tile2), "tile2", "ground/tile2", 0x1d2944, 0.9, 0.1, 0, 0.0),
    row(K::Ground(GroundKind::Grass), "grass", "ground/grass", 0x2d5a27, 0.9, 0.1, 0, 0.0),
    row(K::Ground(GroundKind::Concrete), "concrete", "ground/concrete", 0x8b8b8b, 0.9, 0.1, 0, 0.0),
    row(K::Block(BlockKind::Brick), "brick", "blocks/brick", 0x8b4513, 0.9, 0.1, 0, 0.0),
    row(K::Block(BlockKind::Stone), "stone", "blocks/stone", 0x5f6e91, 0.9, 0.1, 0, 0.0),
    row(K::Block(BlockKind::Wood), "wood", "blocks/wood", 0x8b4513, 0.8, 0.0, 0, 0.0),
    row(K::Block(BlockKind::Metal), "metal", "blocks/metal", 0x708090, 0.3, 0.8, 0, 0.0),
    row(K::Block(BlockKind::Cracked), "cracked", "blocks/cracked", 0x696969, 0.9, 0.1, 0, 0.0),
    row(K::Wall(WallKind::Stone), "wall", "walls/wall", 0x3a4a6f, 0.9, 0.1, 0, 0.0),
    row(K::Wall(WallKind::Metal), "wall_metal", "walls/metal", 0x708090, 0.3, 0.8, 0, 0.0),
    row(K::Wall(WallKind::Concrete), "wall_concrete", "walls/concrete", 0x8b8b8b, 0.9, 0.1, 0, 0.0),
    row(K::Player, "player", "player/player", 0x6ee7ff, 0.6, 0.3, 0x001122, 0.1),
    row(K::Bomb, "bomb", "bomb/bomb", 0x222831, 0.8, 0.2, 0x220000, 0.2),
    row(K::Fire(FireKind::Flame), "fire", "fire/fire", 0xff4500, 0.5, 0.0, 0xff2200, 0.5),
    row(K::Fire(FireKind::Smoke), "fire_smoke", "fire/smoke", 0x696969, 1.0, 0.0, 0, 0.0),
    row(K::Fire(FireKind::Spark), "fire_spark", "fire/spark", 0xffff00, 0.5, 0.0, 0xffff00, 0.8),
    row(K::Particle(ParticleKind::Spark), "spark", "particles/spark", 0xffff00, 1.0, 0.0, 0xffff00, 1.0),
    row(K::Particle(ParticleKind::Smoke), "smoke", "particles/smoke", 0x696969, 1.0, 0.0, 0, 0.0),
    row(K::Particle(ParticleKind::Explosion), "explosion", "particles/explosion", 0xff4500, 1.0, 0.0, 0xff4500, 1.0),
];

const TEXTURE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

// ── Material ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub enum Surface {
    Texture(Arc<RgbaImage>),
    /// Solid `base_color`; used when a texture failed or textures are off.
    Flat,
}

/// Resolved, drawable material.
#[derive(Clone, Debug)]
pub struct Material {
    pub key: Option<MaterialKey>,
    pub surface: Surface,
    pub base_color: Color,
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: Color,
    pub emissive_intensity: f32,
}

impl Material {
    fn from_spec(spec: &MaterialSpec, texture: Option<Arc<RgbaImage>>) -> Self {
        let (surface, base_color) = match texture {
            Some(img) => (Surface::Texture(img), Color::WHITE),
            None => (Surface::Flat, Color::from_hex(spec.color)),
        };
        Self {
            key: Some(spec.key),
            surface,
            base_color,
            roughness: spec.roughness,
            metalness: spec.metalness,
            emissive: Color::from_hex(spec.emissive),
            emissive_intensity: spec.emissive_intensity,
        }
    }

    /// Plain white surface for names with no table row.
    pub(crate) fn unknown() -> Self {
        Self {
            key: None,
            surface: Surface::Flat,
            base_color: Color::WHITE,
            roughness: 0.9,
            metalness: 0.1,
            emissive: Color::BLACK,
            emissive_intensity: 0.0,
        }
    }

    pub fn is_textured(&self) -> bool {
        matches!(self.surface, Surface::Texture(_))
    }
}

/// Which materials came from disk and which fell back to flat color.
#[derive(Clone, Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<MaterialKey>,
    pub fallback: Vec<MaterialKey>,
}

// ── ResourceManager ─────────────────────────────────────────────────────────

/// Session-scoped texture and material cache.
///
/// Constructed explicitly and passed to whoever needs materials. Every getter
/// fails with [`AssetError::NotInitialized`] until [`ResourceManager::load`]
/// has run once. Loading itself never fails: a texture that is missing or
/// undecodable is replaced by its flat table color and logged.
pub struct ResourceManager {
    root: PathBuf,
    textures_enabled: bool,
    max_texture_size: u32,
    ready: bool,
    materials: HashMap<MaterialKey, Material>,
    unknown: Material,
    /// Bumped whenever the resolved materials change.
    revision: u64,
}

impl ResourceManager {
    pub fn new(root: impl Into<PathBuf>, art: &ArtConfig) -> Self {
        Self {
            root: root.into(),
            textures_enabled: art.enable_textures,
            max_texture_size: art.max_texture_size(),
            ready: false,
            materials: HashMap::new(),
            unknown: Material::unknown(),
            revision: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn textures_enabled(&self) -> bool {
        self.textures_enabled
    }

    /// Load every texture in the table as one batch.
    ///
    /// Files are decoded on worker threads; the call returns only after all
    /// of them have finished, so the manager is never observed half-loaded.
    pub fn load(&mut self) -> LoadReport {
        let mut report = LoadReport::default();
        let mut materials = HashMap::with_capacity(MATERIALS.len());

        if self.textures_enabled {
            let index = index_textures(&self.root);
            let max = self.max_texture_size;
            let results: Vec<(MaterialKey, Result<RgbaImage, AssetError>)> =
                std::thread::scope(|scope| {
                    let jobs: Vec<_> = MATERIALS
                        .iter()
                        .map(|spec| {
                            let found = index.get(spec.path).cloned();
                            let handle = scope.spawn(move || match found {
                                Some(path) => decode_texture(&path, max),
                                None => Err(AssetError::Missing(spec.path.to_string())),
                            });
                            (spec.key, handle)
                        })
                        .collect();
                    jobs.into_iter()
                        .map(|(key, handle)| {
                            let result = handle.join().unwrap_or(Err(AssetError::WorkerPanicked));
                            (key, result)
                        })
                        .collect()
                });

            for (key, result) in results {
                let spec = key.spec();
                match result {
                    Ok(img) => {
                        materials.insert(key, Material::from_spec(spec, Some(Arc::new(img))));
                        report.loaded.push(key);
                    }
                    Err(e) => {
                        tracing::warn!(material = spec.name, error = %e, "using flat fallback color");
                        materials.insert(key, Material::from_spec(spec, None));
                        report.fallback.push(key);
                    }
                }
            }
        } else {
            for spec in &MATERIALS {
                materials.insert(spec.key, Material::from_spec(spec, None));
                report.fallback.push(spec.key);
            }
        }

        tracing::info!(
            loaded = report.loaded.len(),
            fallback = report.fallback.len(),
            root = %self.root.display(),
            "materials ready"
        );
        self.materials = materials;
        self.ready = true;
        self.revision += 1;
        report
    }

    /// Re-derive texture settings from `art`, reloading if they changed.
    pub fn apply_config(&mut self, art: &ArtConfig) -> Option<LoadReport> {
        let changed = self.textures_enabled != art.enable_textures
            || self.max_texture_size != art.max_texture_size();
        self.textures_enabled = art.enable_textures;
        self.max_texture_size = art.max_texture_size();
        (changed && self.ready).then(|| self.load())
    }

    pub fn material(&self, key: MaterialKey) -> Result<&Material, AssetError> {
        if !self.ready {
            return Err(AssetError::NotInitialized);
        }
        self.materials.get(&key).ok_or(AssetError::NotInitialized)
    }

    /// Resolve a symbolic name. Unknown names resolve to a plain white
    /// surface and log a warning.
    pub fn resolve(&self, name: &str) -> Result<&Material, AssetError> {
        match MaterialKey::from_name(name) {
            Some(key) => self.material(key),
            None if self.ready => {
                tracing::warn!(name, "unknown material name; using white fallback");
                Ok(&self.unknown)
            }
            None => Err(AssetError::NotInitialized),
        }
    }

    /// Materials backed by a decoded texture, in table order.
    pub fn textures(&self) -> Result<Vec<(MaterialKey, Arc<RgbaImage>)>, AssetError> {
        if !self.ready {
            return Err(AssetError::NotInitialized);
        }
        Ok(MATERIALS
            .iter()
            .filter_map(|spec| match &self.materials.get(&spec.key)?.surface {
                Surface::Texture(img) => Some((spec.key, Arc::clone(img))),
                Surface::Flat => None,
            })
            .collect())
    }
}

/// Map of `relative/path/without/extension` → file for every texture file
/// under `root`. The first file wins when two extensions share a stem.
fn index_textures(root: &Path) -> HashMap<String, PathBuf> {
    let mut index = HashMap::new();
    for entry in walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase);
        if !ext.is_some_and(|e| TEXTURE_EXTENSIONS.contains(&e.as_str())) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else { continue };
        let stem = relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        index.entry(stem).or_insert_with(|| path.to_path_buf());
    }
    index
}

fn decode_texture(path: &Path, max_size: u32) -> Result<RgbaImage, AssetError> {
    let img = image::open(path).map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let img = if img.width() > max_size || img.height() > max_size {
        img.resize(max_size, max_size, FilterType::Triangle)
    } else {
        img
    };
    Ok(img.to_rgba8())
}
