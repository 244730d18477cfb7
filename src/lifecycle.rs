use glam::Vec3;
use rand::Rng;

use crate::assets::{BlockKind, MaterialKey};
use crate::config::GameConfig;
use crate::grid::{GridCoord, GridWorld};
use crate::scene::{MeshNode, NodeId, SceneGraph, Shape};

/// Ray order for blast propagation: +y, -y, +x, -x.
pub const BLAST_DIRECTIONS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

const BOMB_RADIUS: f32 = 0.3;
const BLOCK_EDGE: f32 = 0.9;

// ── Entities ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BombPhase {
    Armed,
    /// Fuse ran out this tick; resolved and removed before `tick` returns.
    Exploding,
}

#[derive(Clone, Debug)]
pub struct Bomb {
    pub cell: GridCoord,
    pub visual: NodeId,
    /// Seconds until detonation.
    pub timer: f32,
    pub phase: BombPhase,
}

#[derive(Clone, Debug)]
pub struct Block {
    pub cell: GridCoord,
    pub visual: NodeId,
    pub kind: BlockKind,
}

/// Result of one bomb's detonation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Explosion {
    pub origin: GridCoord,
    /// Cells the blast reached along the four rays, in ray order. Includes
    /// cells whose block was destroyed; excludes the origin.
    pub reached: Vec<GridCoord>,
    pub destroyed: Vec<GridCoord>,
}

// ── EntityLifecycle ─────────────────────────────────────────────────────────

/// Owns every bomb and block.
///
/// Each live bomb or block holds exactly one grid cell; occupancy is claimed
/// on creation and released on removal. Scene nodes are created and removed
/// alongside.
pub struct EntityLifecycle {
    bombs: Vec<Bomb>,
    blocks: Vec<Block>,
    fuse: f32,
    blast_range: u32,
    block_density: f64,
    block_stride: u32,
    block_margin: u32,
}

impl EntityLifecycle {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            bombs: Vec::new(),
            blocks: Vec::new(),
            fuse: config.bomb_fuse,
            blast_range: config.blast_range,
            block_density: config.block_density,
            block_stride: config.block_stride,
            block_margin: config.block_margin,
        }
    }

    pub fn bombs(&self) -> &[Bomb] {
        &self.bombs
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block_at(&self, cell: GridCoord) -> Option<&Block> {
        self.blocks.iter().find(|b| b.cell == cell)
    }

    pub fn bomb_at(&self, cell: GridCoord) -> Option<&Bomb> {
        self.bombs.iter().find(|b| b.cell == cell)
    }

    /// Arm a bomb on `cell`. Returns `None` (and changes nothing) when the
    /// cell is occupied or off the board.
    pub fn place_bomb(
        &mut self,
        cell: GridCoord,
        grid: &mut GridWorld,
        scene: &mut SceneGraph,
    ) -> Option<&Bomb> {
        if grid.is_occupied(cell) {
            tracing::debug!(?cell, "bomb placement rejected");
            return None;
        }
        grid.set_occupied(cell, true);

        let position = grid.to_world(cell) + Vec3::Y * BOMB_RADIUS;
        let visual = scene.insert(MeshNode::new(
            Shape::Sphere,
            MaterialKey::Bomb,
            position,
            Vec3::splat(BOMB_RADIUS * 2.0),
        ));
        self.bombs.push(Bomb { cell, visual, timer: self.fuse, phase: BombPhase::Armed });
        self.bombs.last()
    }

    /// Put a block on a free cell.
    pub fn place_block(
        &mut self,
        cell: GridCoord,
        kind: BlockKind,
        grid: &mut GridWorld,
        scene: &mut SceneGraph,
    ) -> bool {
        if grid.is_occupied(cell) {
            return false;
        }
        grid.set_occupied(cell, true);

        let edge = BLOCK_EDGE * grid.cell_size();
        let position = grid.to_world(cell) + Vec3::Y * (edge / 2.0);
        let visual = scene.insert(MeshNode::new(
            Shape::Cube,
            MaterialKey::Block(kind),
            position,
            Vec3::splat(edge),
        ));
        self.blocks.push(Block { cell, visual, kind });
        true
    }

    /// Scatter stone blocks over the candidate lattice: every `stride`-th
    /// cell inside the margin, each kept with probability `density`.
    /// Cells in `reserved` are skipped.
    pub fn spawn_blocks<R: Rng + ?Sized>(
        &mut self,
        grid: &mut GridWorld,
        scene: &mut SceneGraph,
        rng: &mut R,
        reserved: &[GridCoord],
    ) -> usize {
        let n = grid.size() as i32;
        let margin = self.block_margin as i32;
        let stride = self.block_stride.max(1) as usize;
        let mut spawned = 0;

        for gx in (margin..n - margin).step_by(stride) {
            for gy in (margin..n - margin).step_by(stride) {
                let cell = GridCoord::new(gx, gy);
                // Draw for every lattice cell so the layout never depends on `reserved`.
                let keep = rng.gen_bool(self.block_density);
                if !keep || reserved.contains(&cell) {
                    continue;
                }
                if self.place_block(cell, BlockKind::Stone, grid, scene) {
                    spawned += 1;
                }
            }
        }
        spawned
    }

    /// Count every fuse down by `dt` and detonate the ones that ran out.
    ///
    /// Bombs expiring on the same tick resolve newest first. A bomb standing
    /// in another bomb's blast ray stops that ray and keeps its own fuse.
    pub fn tick(&mut self, dt: f32, grid: &mut GridWorld, scene: &mut SceneGraph) -> Vec<Explosion> {
        for bomb in &mut self.bombs {
            bomb.timer -= dt;
            if bomb.timer <= 0.0 {
                bomb.phase = BombPhase::Exploding;
            }
        }

        let mut explosions = Vec::new();
        while let Some(i) = self.bombs.iter().rposition(|b| b.phase == BombPhase::Exploding) {
            let bomb = self.bombs.remove(i);
            scene.remove(bomb.visual);
            let explosion = self.explode(bomb.cell, grid, scene);
            tracing::debug!(
                origin = ?explosion.origin,
                reached = explosion.reached.len(),
                destroyed = explosion.destroyed.len(),
                "bomb exploded"
            );
            explosions.push(explosion);
        }
        explosions
    }

    /// Free the origin, then walk four straight rays of `blast_range` cells.
    ///
    /// A ray stops at the board edge (exclusive) and at the first occupied
    /// cell. An occupied block cell is destroyed and counts as reached; any
    /// other occupant only stops the ray.
    fn explode(&mut self, origin: GridCoord, grid: &mut GridWorld, scene: &mut SceneGraph) -> Explosion {
        grid.set_occupied(origin, false);
        let mut explosion = Explosion { origin, ..Default::default() };

        for (dx, dy) in BLAST_DIRECTIONS {
            for step in 1..=self.blast_range as i32 {
                let cell = origin.offset(dx * step, dy * step);
                if !grid.contains(cell) {
                    break;
                }
                if grid.is_occupied(cell) {
                    if let Some(i) = self.blocks.iter().position(|b| b.cell == cell) {
                        let block = self.blocks.remove(i);
                        scene.remove(block.visual);
                        grid.set_occupied(cell, false);
                        explosion.reached.push(cell);
                        explosion.destroyed.push(cell);
                    }
                    break;
                }
                explosion.reached.push(cell);
            }
        }
        explosion
    }

    /// Drive the bomb glow: `0.2 + max(0, sin(10·t))·0.8`.
    pub fn pulse_bombs(&self, scene: &mut SceneGraph, time: f32) {
        let glow = 0.2 + (time * 10.0).sin().max(0.0) * 0.8;
        for bomb in &self.bombs {
            if let Some(node) = scene.get_mut(bomb.visual) {
                node.emissive_override = Some(glow);
            }
        }
    }

    /// Remove every bomb and block, releasing their cells and nodes.
    pub fn clear(&mut self, grid: &mut GridWorld, scene: &mut SceneGraph) {
        for bomb in self.bombs.drain(..) {
            grid.set_occupied(bomb.cell, false);
            scene.remove(bomb.visual);
        }
        for block in self.blocks.drain(..) {
            grid.set_occupied(block.cell, false);
            scene.remove(block.visual);
        }
    }
}
