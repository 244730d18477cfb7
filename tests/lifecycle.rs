use rand::SeedableRng;
use rand::rngs::StdRng;

use gridblast::assets::BlockKind;
use gridblast::config::GameConfig;
use gridblast::grid::{GridCoord, GridWorld};
use gridblast::lifecycle::{BombPhase, EntityLifecycle, Explosion};
use gridblast::scene::SceneGraph;

struct Board {
    grid: GridWorld,
    scene: SceneGraph,
    life: EntityLifecycle,
}

/// 7×7 board, fuse 3 s, blast range 2.
fn board() -> Board {
    let config = GameConfig { grid_size: 7, ..GameConfig::default() };
    Board {
        grid: GridWorld::new(config.grid_size, config.cell_size),
        scene: SceneGraph::new(),
        life: EntityLifecycle::new(&config),
    }
}

fn c(x: i32, y: i32) -> GridCoord {
    GridCoord::new(x, y)
}

// ── Placement ───────────────────────────────────────────────────────────────

#[test]
fn bomb_claims_its_cell_and_a_node() {
    let mut b = board();
    let bomb = b.life.place_bomb(c(3, 3), &mut b.grid, &mut b.scene).cloned();
    let bomb = bomb.expect("free cell accepts a bomb");
    assert_eq!(bomb.phase, BombPhase::Armed);
    assert!((bomb.timer - 3.0).abs() < 1e-6);
    assert!(b.grid.is_occupied(c(3, 3)));
    assert!(b.scene.contains(bomb.visual));
}

#[test]
fn occupied_or_off_grid_cells_reject_bombs() {
    let mut b = board();
    assert!(b.life.place_bomb(c(3, 3), &mut b.grid, &mut b.scene).is_some());
    assert!(b.life.place_bomb(c(3, 3), &mut b.grid, &mut b.scene).is_none());
    assert!(b.life.place_bomb(c(-1, 3), &mut b.grid, &mut b.scene).is_none());
    assert!(!b.life.place_block(c(3, 3), BlockKind::Stone, &mut b.grid, &mut b.scene));
    assert_eq!(b.life.bombs().len(), 1);
    assert_eq!(b.scene.len(), 1);
}

#[test]
fn spawn_blocks_fills_the_lattice_inside_the_margin() {
    let config = GameConfig { block_density: 1.0, ..GameConfig::default() };
    let mut grid = GridWorld::new(config.grid_size, config.cell_size);
    let mut scene = SceneGraph::new();
    let mut life = EntityLifecycle::new(&config);
    let mut rng = StdRng::seed_from_u64(7);

    // 13×13, margin 2, stride 2: x and y in {2, 4, 6, 8, 10}.
    let spawned = life.spawn_blocks(&mut grid, &mut scene, &mut rng, &[c(2, 2)]);
    assert_eq!(spawned, 24);
    assert!(life.block_at(c(2, 2)).is_none(), "reserved cell stays free");
    assert!(life.block_at(c(10, 10)).is_some());
    assert!(life.block_at(c(3, 2)).is_none());
    assert!(life.blocks().iter().all(|b| b.kind == BlockKind::Stone));
    assert_eq!(grid.occupied_count(), 24);
}

#[test]
fn zero_density_spawns_nothing() {
    let config = GameConfig { block_density: 0.0, ..GameConfig::default() };
    let mut grid = GridWorld::new(config.grid_size, config.cell_size);
    let mut scene = SceneGraph::new();
    let mut life = EntityLifecycle::new(&config);
    let mut rng = StdRng::seed_from_u64(7);
    assert_eq!(life.spawn_blocks(&mut grid, &mut scene, &mut rng, &[]), 0);
    assert!(scene.is_empty());
}

#[test]
fn spawn_layout_does_not_depend_on_reserved_cells() {
    let config = GameConfig { block_density: 0.5, ..GameConfig::default() };
    let spawn = |reserved: &[GridCoord]| {
        let mut grid = GridWorld::new(config.grid_size, config.cell_size);
        let mut scene = SceneGraph::new();
        let mut life = EntityLifecycle::new(&config);
        let mut rng = StdRng::seed_from_u64(11);
        life.spawn_blocks(&mut grid, &mut scene, &mut rng, reserved);
        life.blocks().iter().map(|b| b.cell).collect::<Vec<_>>()
    };

    let open = spawn(&[]);
    let reserved = spawn(&[c(4, 4), c(6, 6)]);
    let expected: Vec<_> = open.into_iter().filter(|&cell| cell != c(4, 4) && cell != c(6, 6)).collect();
    assert_eq!(reserved, expected);
}

// ── Detonation ──────────────────────────────────────────────────────────────

#[test]
fn fuse_runs_down_before_detonation() {
    let mut b = board();
    b.life.place_bomb(c(3, 3), &mut b.grid, &mut b.scene);
    assert!(b.life.tick(2.0, &mut b.grid, &mut b.scene).is_empty());
    assert!((b.life.bombs()[0].timer - 1.0).abs() < 1e-6);

    let explosions = b.life.tick(1.0, &mut b.grid, &mut b.scene);
    assert_eq!(explosions.len(), 1);
    assert!(b.life.bombs().is_empty());
    assert!(!b.grid.is_occupied(c(3, 3)), "origin is released");
    assert!(b.scene.is_empty(), "bomb node is removed");
}

#[test]
fn rays_cover_range_in_direction_order() {
    let mut b = board();
    b.life.place_bomb(c(3, 3), &mut b.grid, &mut b.scene);
    let explosions = b.life.tick(3.0, &mut b.grid, &mut b.scene);
    assert_eq!(
        explosions[0].reached,
        vec![c(3, 4), c(3, 5), c(3, 2), c(3, 1), c(4, 3), c(5, 3), c(2, 3), c(1, 3)]
    );
    assert!(explosions[0].destroyed.is_empty());
}

#[test]
fn ray_destroys_first_block_and_stops() {
    let mut b = board();
    b.life.place_block(c(3, 4), BlockKind::Stone, &mut b.grid, &mut b.scene);
    b.life.place_block(c(3, 5), BlockKind::Brick, &mut b.grid, &mut b.scene);
    b.life.place_bomb(c(3, 3), &mut b.grid, &mut b.scene);

    let explosion = b.life.tick(3.0, &mut b.grid, &mut b.scene).remove(0);
    assert_eq!(explosion.destroyed, vec![c(3, 4)]);
    assert!(explosion.reached.contains(&c(3, 4)));
    assert!(!explosion.reached.contains(&c(3, 5)), "the block behind is shielded");
    assert!(!b.grid.is_occupied(c(3, 4)));
    assert!(b.life.block_at(c(3, 5)).is_some());
    assert_eq!(b.life.blocks().len(), 1);
    assert_eq!(b.scene.len(), 1);
}

#[test]
fn rays_stop_at_the_board_edge() {
    let mut b = board();
    b.life.place_bomb(c(0, 0), &mut b.grid, &mut b.scene);
    let explosion = b.life.tick(3.0, &mut b.grid, &mut b.scene).remove(0);
    assert_eq!(explosion.reached, vec![c(0, 1), c(0, 2), c(1, 0), c(2, 0)]);
}

#[test]
fn bomb_in_a_ray_blocks_it_without_chaining() {
    let mut b = board();
    b.life.place_bomb(c(3, 3), &mut b.grid, &mut b.scene);
    b.life.tick(1.0, &mut b.grid, &mut b.scene);
    b.life.place_bomb(c(5, 3), &mut b.grid, &mut b.scene);

    let explosions = b.life.tick(2.0, &mut b.grid, &mut b.scene);
    assert_eq!(explosions.len(), 1);
    assert!(explosions[0].reached.contains(&c(4, 3)));
    assert!(!explosions[0].reached.contains(&c(5, 3)));

    let survivor = &b.life.bombs()[0];
    assert_eq!(survivor.cell, c(5, 3));
    assert!((survivor.timer - 1.0).abs() < 1e-5, "fuse is untouched");
    assert!(b.grid.is_occupied(c(5, 3)));
}

#[test]
fn simultaneous_expiry_resolves_newest_first() {
    let mut b = board();
    b.life.place_bomb(c(1, 1), &mut b.grid, &mut b.scene);
    b.life.place_bomb(c(5, 5), &mut b.grid, &mut b.scene);
    let explosions = b.life.tick(3.0, &mut b.grid, &mut b.scene);
    let origins: Vec<_> = explosions.iter().map(|e| e.origin).collect();
    assert_eq!(origins, vec![c(5, 5), c(1, 1)]);
    assert_eq!(b.grid.occupied_count(), 0);
}

#[test]
fn two_blasts_each_clear_their_own_blocks() {
    let mut b = board();
    for cell in [c(1, 2), c(1, 3), c(2, 1), c(5, 4), c(3, 5), c(3, 3), c(5, 6)] {
        assert!(b.life.place_block(cell, BlockKind::Stone, &mut b.grid, &mut b.scene));
    }
    b.life.place_bomb(c(1, 1), &mut b.grid, &mut b.scene);
    b.life.place_bomb(c(5, 5), &mut b.grid, &mut b.scene);

    let explosions = b.life.tick(3.0, &mut b.grid, &mut b.scene);
    assert_eq!(explosions.len(), 2);
    assert_eq!(explosions[0].origin, c(5, 5));
    assert_eq!(explosions[0].destroyed, vec![c(5, 6), c(5, 4), c(3, 5)]);
    assert_eq!(explosions[1].origin, c(1, 1));
    assert_eq!(explosions[1].destroyed, vec![c(1, 2), c(2, 1)]);

    // (1, 3) sits behind (1, 2); (3, 3) is outside both blasts.
    let mut survivors: Vec<_> = b.life.blocks().iter().map(|b| b.cell).collect();
    survivors.sort_by_key(|cell| (cell.x, cell.y));
    assert_eq!(survivors, vec![c(1, 3), c(3, 3)]);
    assert_eq!(b.grid.occupied_count(), 2);
    for gx in 0..7 {
        for gy in 0..7 {
            let cell = c(gx, gy);
            assert_eq!(b.grid.is_occupied(cell), survivors.contains(&cell), "occupancy at {cell:?}");
        }
    }
    assert_eq!(b.scene.len(), 2);
}

#[test]
fn empty_explosion_report() {
    let report = Explosion::default();
    assert_eq!(report.origin, c(0, 0));
    assert!(report.reached.is_empty() && report.destroyed.is_empty());
}

// ── Housekeeping ────────────────────────────────────────────────────────────

#[test]
fn bomb_glow_follows_the_pulse_curve() {
    let mut b = board();
    let visual = b.life.place_bomb(c(3, 3), &mut b.grid, &mut b.scene).map(|bomb| bomb.visual);
    let visual = visual.expect("bomb placed");

    b.life.pulse_bombs(&mut b.scene, 0.0);
    let glow = b.scene.get(visual).and_then(|n| n.emissive_override);
    assert!((glow.unwrap_or_default() - 0.2).abs() < 1e-5);

    b.life.pulse_bombs(&mut b.scene, std::f32::consts::PI / 20.0);
    let glow = b.scene.get(visual).and_then(|n| n.emissive_override);
    assert!((glow.unwrap_or_default() - 1.0).abs() < 1e-4);
}

#[test]
fn clear_releases_every_cell_and_node() {
    let mut b = board();
    b.life.place_bomb(c(1, 1), &mut b.grid, &mut b.scene);
    b.life.place_block(c(2, 2), BlockKind::Wood, &mut b.grid, &mut b.scene);
    b.life.clear(&mut b.grid, &mut b.scene);
    assert!(b.life.bombs().is_empty() && b.life.blocks().is_empty());
    assert_eq!(b.grid.occupied_count(), 0);
    assert!(b.scene.is_empty());
}
