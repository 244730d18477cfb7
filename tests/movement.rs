use gridblast::grid::{GridCoord, GridWorld};
use gridblast::movement::{MoveIntent, MovementController};

fn grid() -> GridWorld {
    GridWorld::new(5, 1.0)
}

#[test]
fn one_eighth_second_at_speed_eight_is_one_step() {
    let grid = grid();
    let mut mover = MovementController::new(8.0);
    let mut cell = GridCoord::new(2, 2);
    let report = mover.update(1.0 / 8.0, MoveIntent::new(1, 0), &grid, &mut cell);
    assert_eq!(report.committed, 1);
    assert_eq!(cell, GridCoord::new(3, 2));
    assert!(mover.accumulator() < 1e-4);
}

#[test]
fn small_frames_accumulate_into_a_step() {
    let grid = grid();
    let mut mover = MovementController::new(8.0);
    let mut cell = GridCoord::new(2, 2);
    let mut committed = 0;
    for _ in 0..8 {
        committed += mover.update(1.0 / 64.0, MoveIntent::new(0, 1), &grid, &mut cell).committed;
    }
    assert_eq!(committed, 1);
    assert_eq!(cell, GridCoord::new(2, 3));
}

#[test]
fn no_step_until_a_whole_cell_has_accumulated() {
    let grid = grid();
    let mut mover = MovementController::new(8.0);
    let mut cell = GridCoord::new(2, 2);
    // 8 × 0.12499 = 0.99992: just short of a full cell.
    let report = mover.update(0.12499, MoveIntent::new(1, 0), &grid, &mut cell);
    assert_eq!(report.attempted, 0);
    assert_eq!(cell, GridCoord::new(2, 2));
    assert!(mover.accumulator() < 1.0);

    let report = mover.update(0.001, MoveIntent::new(1, 0), &grid, &mut cell);
    assert_eq!(report.committed, 1);
    assert_eq!(cell, GridCoord::new(3, 2));
}

#[test]
fn long_frame_takes_several_steps() {
    let grid = GridWorld::new(13, 1.0);
    let mut mover = MovementController::new(8.0);
    let mut cell = GridCoord::new(0, 6);
    let report = mover.update(0.5, MoveIntent::new(1, 0), &grid, &mut cell);
    assert_eq!(report.attempted, 4);
    assert_eq!(cell, GridCoord::new(4, 6));
}

#[test]
fn releasing_the_keys_drops_partial_progress() {
    let grid = grid();
    let mut mover = MovementController::new(8.0);
    let mut cell = GridCoord::new(2, 2);
    mover.update(0.0625, MoveIntent::new(1, 0), &grid, &mut cell);
    assert!((mover.accumulator() - 0.5).abs() < 1e-5);

    mover.update(0.016, MoveIntent::NONE, &grid, &mut cell);
    assert_eq!(mover.accumulator(), 0.0);
    assert_eq!(cell, GridCoord::new(2, 2));
}

#[test]
fn blocked_step_is_spent_without_moving() {
    let mut grid = grid();
    grid.set_occupied(GridCoord::new(3, 2), true);
    let mut mover = MovementController::new(8.0);
    let mut cell = GridCoord::new(2, 2);
    let report = mover.update(1.0 / 8.0, MoveIntent::new(1, 0), &grid, &mut cell);
    assert_eq!(report.attempted, 1);
    assert_eq!(report.committed, 0);
    assert_eq!(cell, GridCoord::new(2, 2));
    assert!(mover.accumulator() < 1e-4, "blocked step still consumes the accumulator");
}

#[test]
fn edge_of_board_clamps_in_place() {
    let grid = grid();
    let mut mover = MovementController::new(8.0);
    let mut cell = GridCoord::new(0, 0);
    let report = mover.update(1.0 / 8.0, MoveIntent::new(-1, -1), &grid, &mut cell);
    assert_eq!(report.committed, 0);
    assert_eq!(cell, GridCoord::new(0, 0));
}

#[test]
fn diagonal_moves_both_axes_in_one_step() {
    let grid = grid();
    let mut mover = MovementController::new(8.0);
    let mut cell = GridCoord::new(1, 1);
    mover.update(1.0 / 8.0, MoveIntent::new(1, 1), &grid, &mut cell);
    assert_eq!(cell, GridCoord::new(2, 2));
}

#[test]
fn intent_from_held_keys() {
    assert_eq!(MoveIntent::from_held(true, false, false, false), MoveIntent::new(0, -1));
    assert_eq!(MoveIntent::from_held(false, true, false, true), MoveIntent::new(1, 1));
    assert!(MoveIntent::from_held(true, true, true, true).is_idle());
    assert_eq!(MoveIntent::new(5, -3), MoveIntent { dx: 1, dy: -1 });
}
