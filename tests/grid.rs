use glam::Vec3;
use gridblast::grid::{GridCoord, GridWorld};

// ── Transform ───────────────────────────────────────────────────────────────

#[test]
fn board_is_centred_on_the_origin() {
    let grid = GridWorld::new(13, 1.0);
    let first = grid.to_world(GridCoord::new(0, 0));
    let last = grid.to_world(GridCoord::new(12, 12));
    assert!((first.x + 6.0).abs() < 1e-5 && (first.z + 6.0).abs() < 1e-5, "got {first:?}");
    assert!((last.x - 6.0).abs() < 1e-5 && (last.z - 6.0).abs() < 1e-5, "got {last:?}");
    assert_eq!(grid.to_world(GridCoord::new(6, 6)), Vec3::ZERO);
}

#[test]
fn cell_centres_round_trip() {
    let grid = GridWorld::new(8, 2.5);
    for c in [GridCoord::new(0, 0), GridCoord::new(3, 5), GridCoord::new(7, 7)] {
        assert_eq!(grid.to_grid(grid.to_world(c)), c);
    }
}

#[test]
fn to_grid_rounds_to_nearest_cell() {
    let grid = GridWorld::new(13, 1.0);
    let centre = grid.to_world(GridCoord::new(4, 4));
    assert_eq!(grid.to_grid(centre + Vec3::new(0.4, 3.0, -0.4)), GridCoord::new(4, 4));
    assert_eq!(grid.to_grid(centre + Vec3::new(0.6, 0.0, 0.0)), GridCoord::new(5, 4));
}

#[test]
fn to_grid_does_not_clamp() {
    let grid = GridWorld::new(5, 1.0);
    let outside = grid.to_grid(Vec3::new(-10.0, 0.0, 0.0));
    assert!(outside.x < 0);
    assert!(!grid.contains(outside));
    assert_eq!(grid.clamp(outside), GridCoord::new(0, outside.y.clamp(0, 4)));
}

// ── Occupancy ───────────────────────────────────────────────────────────────

#[test]
fn cells_start_free_in_row_major_order() {
    let grid = GridWorld::new(4, 1.0);
    assert_eq!(grid.cells().len(), 16);
    assert_eq!(grid.occupied_count(), 0);
    // Index y*N + x.
    let c = grid.cells()[2 * 4 + 1];
    assert_eq!((c.x, c.y), (1, 2));
}

#[test]
fn set_and_clear_occupancy() {
    let mut grid = GridWorld::new(4, 1.0);
    let c = GridCoord::new(2, 3);
    assert!(grid.set_occupied(c, true));
    assert!(grid.is_occupied(c));
    assert_eq!(grid.occupied_count(), 1);
    grid.clear();
    assert!(!grid.is_occupied(c));
}

#[test]
fn off_grid_reads_occupied_and_rejects_writes() {
    let mut grid = GridWorld::new(4, 1.0);
    for c in [GridCoord::new(-1, 0), GridCoord::new(0, 4), GridCoord::new(9, 9)] {
        assert!(grid.is_occupied(c), "{c:?} should read as occupied");
        assert!(!grid.set_occupied(c, false));
        assert!(grid.cell(c).is_none());
    }
    assert_eq!(grid.occupied_count(), 0);
}
