use glam::{Vec2, Vec3};
use gridblast::assets::MaterialKey;
use gridblast::camera::Camera;
use gridblast::scene::{Color, MeshNode, SceneGraph, Shape};

fn node() -> MeshNode {
    MeshNode::new(Shape::Cube, MaterialKey::Bomb, Vec3::ZERO, Vec3::ONE)
}

// ── SceneGraph ──────────────────────────────────────────────────────────────

#[test]
fn insert_get_remove() {
    let mut scene = SceneGraph::new();
    let id = scene.insert(node());
    assert_eq!(scene.len(), 1);
    assert_eq!(scene.get(id).map(|n| n.shape), Some(Shape::Cube));
    assert!(scene.remove(id).is_some());
    assert!(scene.remove(id).is_none(), "double remove is a no-op");
    assert!(scene.is_empty());
}

#[test]
fn stale_handles_never_resolve() {
    let mut scene = SceneGraph::new();
    let old = scene.insert(node());
    scene.remove(old);
    let new = scene.insert(MeshNode::new(Shape::Sphere, MaterialKey::Player, Vec3::ZERO, Vec3::ONE));
    assert_eq!(old.index(), new.index(), "slot is reused");
    assert_ne!(old.generation(), new.generation());
    assert!(scene.get(old).is_none());
    assert!(scene.get_mut(old).is_none());
    assert!(scene.remove(old).is_none());
    assert!(scene.contains(new));
}

#[test]
fn clear_invalidates_everything() {
    let mut scene = SceneGraph::new();
    let ids: Vec<_> = (0..3).map(|_| scene.insert(node())).collect();
    scene.clear();
    assert!(scene.is_empty());
    assert!(ids.iter().all(|id| !scene.contains(*id)));
    assert_eq!(scene.iter().count(), 0);
}

#[test]
fn hex_colors_decode_to_linear() {
    assert_eq!(Color::from_hex(0xffffff), Color::WHITE);
    assert_eq!(Color::from_hex(0x000000), Color::BLACK);
    let mid = Color::from_hex(0x808080).0[0];
    assert!((mid - 0.2158).abs() < 1e-3, "sRGB 0.5 is about 0.216 linear, got {mid}");
}

// ── Camera ──────────────────────────────────────────────────────────────────

#[test]
fn board_camera_frames_the_origin() {
    let camera = Camera::for_board(13, 1.0, 1280, 720);
    assert_eq!(camera.target, Vec3::ZERO);
    assert!((camera.eye.y - (6.5 * 1.8 + 10.0)).abs() < 1e-4);
    assert!((camera.eye.z - 16.5).abs() < 1e-4);
    assert!((camera.aspect() - 1280.0 / 720.0).abs() < 1e-6);
}

#[test]
fn resize_updates_aspect() {
    let mut camera = Camera::for_board(13, 1.0, 800, 600);
    camera.resize(1000, 1000);
    assert!((camera.aspect() - 1.0).abs() < 1e-6);
    camera.resize(100, 0);
    assert!(camera.aspect().is_finite());
}

#[test]
fn centre_ray_hits_the_target() {
    let camera = Camera::for_board(13, 1.0, 800, 600);
    let hit = camera
        .ray_to_plane(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0), 0.0)
        .expect("camera looks down at the floor");
    assert!(hit.length() < 1e-3, "got {hit:?}");
}

#[test]
fn upper_screen_hits_further_away() {
    let camera = Camera::for_board(13, 1.0, 800, 600);
    let viewport = Vec2::new(800.0, 600.0);
    let near = camera.ray_to_plane(Vec2::new(400.0, 500.0), viewport, 0.0).expect("hit");
    let far = camera.ray_to_plane(Vec2::new(400.0, 100.0), viewport, 0.0).expect("hit");
    assert!(far.z < near.z);
}

#[test]
fn shake_decays_to_rest() {
    let mut camera = Camera::for_board(13, 1.0, 800, 600);
    let still = camera.build_uniform().eye;
    camera.shake(0.2);
    assert!(camera.is_shaking());
    camera.tick(0.1);
    assert!(camera.is_shaking());
    camera.tick(0.5);
    assert!(!camera.is_shaking());
    assert_eq!(camera.build_uniform().eye, still);
}

#[test]
fn camera_basis_is_orthonormal() {
    let camera = Camera::for_board(13, 1.0, 800, 600);
    let u = camera.build_uniform();
    let right = Vec3::from_slice(&u.right[..3]);
    let up = Vec3::from_slice(&u.up[..3]);
    assert!((right.length() - 1.0).abs() < 1e-5);
    assert!((up.length() - 1.0).abs() < 1e-5);
    assert!(right.dot(up).abs() < 1e-5);
    assert!(right.y.abs() < 1e-5, "no roll");
}
