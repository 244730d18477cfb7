use glam::Vec3;

// ── GridCoord ───────────────────────────────────────────────────────────────

/// Integer cell address. `x` runs along world +X, `y` along world +Z.
///
/// Coordinates are signed so that neighbour arithmetic (`x - 1` at the left
/// edge) produces an off-grid value instead of wrapping.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

impl From<[i32; 2]> for GridCoord {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

// ── GridCell ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub occupied: bool,
}

// ── GridWorld ───────────────────────────────────────────────────────────────

/// Fixed `N×N` occupancy map plus the affine transform between cell
/// addresses and world space.
///
/// The board is centred on the world origin: cell `(0, 0)` sits at
/// `-(N·cell)/2 + cell/2` on both X and Z. The world Y axis is "up" and is
/// never touched by the transform.
///
/// `GridWorld` does not clamp. Callers clamp with [`GridWorld::clamp`] before
/// they query; an off-grid coordinate reads as occupied and cannot be written.
#[derive(Clone, Debug)]
pub struct GridWorld {
    size: u32,
    cell_size: f32,
    cells: Vec<GridCell>,
}

impl GridWorld {
    pub fn new(size: u32, cell_size: f32) -> Self {
        let n = size as i32;
        let cells = (0..n)
            .flat_map(|y| (0..n).map(move |x| GridCell { x, y, occupied: false }))
            .collect();
        Self { size, cell_size, cells }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World-space offset of the board's minimum corner.
    fn origin(&self) -> f32 {
        -(self.size as f32 * self.cell_size) / 2.0
    }

    /// Row-major index (`y * N + x`), or `None` when off-grid.
    fn index(&self, c: GridCoord) -> Option<usize> {
        self.contains(c)
            .then(|| (c.y as usize) * self.size as usize + c.x as usize)
    }

    pub fn contains(&self, c: GridCoord) -> bool {
        let n = self.size as i32;
        c.x >= 0 && c.x < n && c.y >= 0 && c.y < n
    }

    pub fn clamp(&self, c: GridCoord) -> GridCoord {
        let max = self.size as i32 - 1;
        GridCoord { x: c.x.clamp(0, max), y: c.y.clamp(0, max) }
    }

    /// Nearest cell to a world position (rounds, does not clamp).
    pub fn to_grid(&self, world: Vec3) -> GridCoord {
        let shift = -self.origin() - self.cell_size / 2.0;
        GridCoord {
            x: ((world.x + shift) / self.cell_size).round() as i32,
            y: ((world.z + shift) / self.cell_size).round() as i32,
        }
    }

    /// Centre of a cell on the floor plane (`y = 0`).
    pub fn to_world(&self, c: GridCoord) -> Vec3 {
        let base = self.origin() + self.cell_size / 2.0;
        Vec3::new(
            c.x as f32 * self.cell_size + base,
            0.0,
            c.y as f32 * self.cell_size + base,
        )
    }

    pub fn cell(&self, c: GridCoord) -> Option<&GridCell> {
        self.index(c).map(|i| &self.cells[i])
    }

    pub fn is_occupied(&self, c: GridCoord) -> bool {
        self.cell(c).is_none_or(|cell| cell.occupied)
    }

    /// Returns `false` (and changes nothing) for off-grid coordinates.
    pub fn set_occupied(&mut self, c: GridCoord, occupied: bool) -> bool {
        match self.index(c) {
            Some(i) => {
                self.cells[i].occupied = occupied;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.occupied = false;
        }
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.occupied).count()
    }
}
