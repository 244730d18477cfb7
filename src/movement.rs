use crate::grid::{GridCoord, GridWorld};

/// Held direction for one frame. Each axis is -1, 0 or 1.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub dx: i32,
    pub dy: i32,
}

impl MoveIntent {
    pub const NONE: Self = Self { dx: 0, dy: 0 };

    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx: dx.signum(), dy: dy.signum() }
    }

    /// Builds an intent from four held flags; opposite keys cancel.
    pub fn from_held(up: bool, down: bool, left: bool, right: bool) -> Self {
        Self {
            dx: right as i32 - left as i32,
            dy: down as i32 - up as i32,
        }
    }

    pub fn is_idle(self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Outcome of one [`MovementController::update`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub attempted: u32,
    pub committed: u32,
}

/// Converts continuous frame time into discrete single-cell steps.
///
/// Speed is in cells per second. The accumulator carries the fractional
/// remainder between frames and is dropped to zero as soon as no direction
/// is held.
#[derive(Clone, Debug)]
pub struct MovementController {
    base_speed: f32,
    accumulator: f32,
}

impl MovementController {
    pub fn new(base_speed: f32) -> Self {
        Self { base_speed, accumulator: 0.0 }
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Advance by `dt` seconds, moving `cell` through `grid`.
    ///
    /// Each whole step targets `cell + (dx, dy)` clamped to the board. The
    /// step is committed only if that cell is free; a blocked step still
    /// spends its unit of accumulator.
    pub fn update(
        &mut self,
        dt: f32,
        intent: MoveIntent,
        grid: &GridWorld,
        cell: &mut GridCoord,
    ) -> StepReport {
        let mut report = StepReport::default();

        if intent.is_idle() {
            self.accumulator = 0.0;
            return report;
        }

        self.accumulator += self.base_speed * dt;
        while self.accumulator >= 1.0 {
            report.attempted += 1;
            let target = grid.clamp(cell.offset(intent.dx, intent.dy));
            if target != *cell && !grid.is_occupied(target) {
                *cell = target;
                report.committed += 1;
            } else {
                tracing::debug!(?target, "move blocked");
            }
            self.accumulator -= 1.0;
        }
        report
    }
}
