use std::path::Path;

use image::{Rgba, RgbaImage};

use gridblast::assets::{AssetError, BlockKind, GroundKind, MaterialKey, ResourceManager, Surface};
use gridblast::config::{ArtConfig, Quality};
use gridblast::scene::Color;

fn write_png(root: &Path, relative: &str, size: u32) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().expect("relative path has a parent")).expect("mkdir");
    RgbaImage::from_pixel(size, size, Rgba([200, 100, 50, 255]))
        .save(&path)
        .expect("write png");
}

#[test]
fn getters_fail_before_load() {
    let resources = ResourceManager::new("does/not/exist", &ArtConfig::default());
    assert!(!resources.is_ready());
    assert!(matches!(resources.material(MaterialKey::Bomb), Err(AssetError::NotInitialized)));
    assert!(matches!(resources.resolve("stone"), Err(AssetError::NotInitialized)));
    assert!(matches!(resources.textures(), Err(AssetError::NotInitialized)));
}

#[test]
fn found_textures_load_and_the_rest_fall_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_png(dir.path(), "blocks/stone.png", 8);
    write_png(dir.path(), "ground/grass.png", 8);

    let mut resources = ResourceManager::new(dir.path(), &ArtConfig::default());
    let report = resources.load();
    assert!(resources.is_ready());
    assert_eq!(resources.revision(), 1);
    assert_eq!(report.loaded.len(), 2);
    assert!(report.loaded.contains(&MaterialKey::Block(BlockKind::Stone)));
    assert_eq!(report.fallback.len(), 19);

    let stone = resources.material(MaterialKey::Block(BlockKind::Stone)).expect("loaded");
    assert!(stone.is_textured());
    assert_eq!(stone.base_color, Color::WHITE, "textured materials are not tinted");

    let brick = resources.material(MaterialKey::Block(BlockKind::Brick)).expect("fallback");
    assert!(matches!(brick.surface, Surface::Flat));
    assert_eq!(brick.base_color, Color::from_hex(0x8b4513));

    let textured: Vec<_> = resources.textures().expect("ready").into_iter().map(|(k, _)| k).collect();
    assert_eq!(textured, vec![MaterialKey::Ground(GroundKind::Grass), MaterialKey::Block(BlockKind::Stone)]);
}

#[test]
fn corrupt_texture_falls_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("bomb")).expect("mkdir");
    std::fs::write(dir.path().join("bomb/bomb.png"), b"not a png").expect("write");

    let mut resources = ResourceManager::new(dir.path(), &ArtConfig::default());
    let report = resources.load();
    assert!(report.fallback.contains(&MaterialKey::Bomb));
    assert!(!resources.material(MaterialKey::Bomb).expect("ready").is_textured());
}

#[test]
fn oversized_textures_are_downscaled() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_png(dir.path(), "player/player.png", 300);

    let art = ArtConfig { texture_quality: Quality::Low, ..ArtConfig::default() };
    let mut resources = ResourceManager::new(dir.path(), &art);
    resources.load();
    let textures = resources.textures().expect("ready");
    let (_, img) = &textures[0];
    assert_eq!((img.width(), img.height()), (128, 128));
}

#[test]
fn textures_disabled_uses_flat_colors() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_png(dir.path(), "blocks/stone.png", 8);

    let art = ArtConfig { enable_textures: false, ..ArtConfig::default() };
    let mut resources = ResourceManager::new(dir.path(), &art);
    let report = resources.load();
    assert!(report.loaded.is_empty());
    assert!(resources.textures().expect("ready").is_empty());
}

#[test]
fn config_change_triggers_a_reload() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_png(dir.path(), "blocks/stone.png", 8);

    let mut art = ArtConfig::default();
    let mut resources = ResourceManager::new(dir.path(), &art);
    resources.load();
    assert!(resources.apply_config(&art).is_none(), "unchanged settings do not reload");

    art.enable_textures = false;
    let report = resources.apply_config(&art).expect("reloaded");
    assert!(report.loaded.is_empty());
    assert_eq!(resources.revision(), 2);
}

#[test]
fn names_resolve_to_table_rows() {
    assert_eq!(MaterialKey::from_name("stone"), Some(MaterialKey::Block(BlockKind::Stone)));
    assert_eq!(MaterialKey::from_name("player"), Some(MaterialKey::Player));
    assert_eq!(MaterialKey::from_name("lava"), None);
    assert_eq!(MaterialKey::all().count(), 21);
    assert!(MaterialKey::all().all(|k| MaterialKey::from_name(k.name()) == Some(k)));
}

#[test]
fn unknown_name_resolves_to_white() {
    let art = ArtConfig { enable_textures: false, ..ArtConfig::default() };
    let mut resources = ResourceManager::new("unused", &art);
    resources.load();
    let material = resources.resolve("lava").expect("ready");
    assert_eq!(material.key, None);
    assert_eq!(material.base_color, Color::WHITE);
}
