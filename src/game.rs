use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::assets::{GroundKind, MaterialKey, ResourceManager, WallKind};
use crate::config::GameConfig;
use crate::error::Error;
use crate::grid::{GridCoord, GridWorld};
use crate::lifecycle::{EntityLifecycle, Explosion};
use crate::movement::{MoveIntent, MovementController, StepReport};
use crate::scene::{MeshNode, NodeId, SceneGraph, Shape};

pub const PLAYER_RADIUS: f32 = 0.35;

const TILE_HEIGHT: f32 = 0.05;
const WALL_HEIGHT: f32 = 1.5;
const WALL_THICKNESS: f32 = 0.5;

pub struct Player {
    /// Continuous world position; the grid cell is derived by rounding.
    pub position: Vec3,
    pub visual: NodeId,
}

/// What one simulation tick did.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub steps: StepReport,
    pub explosions: Vec<Explosion>,
}

/// One round of the game: board, player, bombs and blocks.
///
/// Holds the scene graph the renderer draws; gameplay types keep `NodeId`
/// back-references into it.
pub struct GameSession {
    config: GameConfig,
    grid: GridWorld,
    lifecycle: EntityLifecycle,
    movement: MovementController,
    player: Player,
    scene: SceneGraph,
    rng: StdRng,
    time: f32,
}

impl GameSession {
    /// Build the board and spawn the first set of blocks.
    ///
    /// Fails if `resources` has not finished loading.
    pub fn new(config: GameConfig, resources: &ResourceManager) -> Result<Self, Error> {
        config.validate()?;
        resources.material(MaterialKey::Player)?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let grid = GridWorld::new(config.grid_size, config.cell_size);
        let mut scene = SceneGraph::new();
        build_board(&grid, &mut scene);

        let spawn = GridCoord::from(config.spawn_cell);
        let position = grid.to_world(spawn) + Vec3::Y * PLAYER_RADIUS;
        let visual = scene.insert(MeshNode::new(
            Shape::Sphere,
            MaterialKey::Player,
            position,
            Vec3::splat(PLAYER_RADIUS * 2.0),
        ));

        let mut session = Self {
            lifecycle: EntityLifecycle::new(&config),
            movement: MovementController::new(config.move_speed),
            player: Player { position, visual },
            config,
            grid,
            scene,
            rng,
            time: 0.0,
        };
        session.spawn_blocks();
        Ok(session)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridWorld {
        &self.grid
    }

    pub fn lifecycle(&self) -> &EntityLifecycle {
        &self.lifecycle
    }

    pub fn movement(&self) -> &MovementController {
        &self.movement
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn spawn_cell(&self) -> GridCoord {
        GridCoord::from(self.config.spawn_cell)
    }

    pub fn player_cell(&self) -> GridCoord {
        self.grid.to_grid(self.player.position)
    }

    /// Seconds of simulated time since the session started.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Arm a bomb under the player. `false` if the cell is taken.
    pub fn place_bomb(&mut self) -> bool {
        let cell = self.player_cell();
        self.lifecycle.place_bomb(cell, &mut self.grid, &mut self.scene).is_some()
    }

    /// Clear bombs and blocks, respawn blocks and return the player to the
    /// spawn cell.
    pub fn reset(&mut self) {
        self.lifecycle.clear(&mut self.grid, &mut self.scene);
        self.grid.clear();
        self.movement.reset();
        self.set_player_cell(self.spawn_cell());
        self.spawn_blocks();
        tracing::info!(blocks = self.lifecycle.blocks().len(), "session reset");
    }

    /// Advance movement, then fuses, by `dt` seconds.
    pub fn tick(&mut self, dt: f32, intent: MoveIntent) -> TickReport {
        self.time += dt;

        let mut cell = self.player_cell();
        let steps = self.movement.update(dt, intent, &self.grid, &mut cell);
        if steps.committed > 0 {
            self.set_player_cell(cell);
        }

        let explosions = self.lifecycle.tick(dt, &mut self.grid, &mut self.scene);
        self.lifecycle.pulse_bombs(&mut self.scene, self.time);
        TickReport { steps, explosions }
    }

    fn spawn_blocks(&mut self) -> usize {
        let reserved = [self.spawn_cell()];
        self.lifecycle
            .spawn_blocks(&mut self.grid, &mut self.scene, &mut self.rng, &reserved)
    }

    fn set_player_cell(&mut self, cell: GridCoord) {
        self.player.position = self.grid.to_world(cell) + Vec3::Y * PLAYER_RADIUS;
        if let Some(node) = self.scene.get_mut(self.player.visual) {
            node.position = self.player.position;
        }
    }
}

/// Static geometry: ground slab, checkerboard tiles and four walls.
fn build_board(grid: &GridWorld, scene: &mut SceneGraph) {
    let cell = grid.cell_size();
    let extent = grid.size() as f32 * cell;
    let half = extent / 2.0;

    scene.insert(MeshNode::new(
        Shape::Cube,
        MaterialKey::Ground(GroundKind::Base),
        Vec3::new(0.0, -0.05, 0.0),
        Vec3::new(extent + 1.0, 0.1, extent + 1.0),
    ));

    let n = grid.size() as i32;
    for gx in 0..n {
        for gy in 0..n {
            let kind = if (gx + gy) % 2 == 0 { GroundKind::Grass } else { GroundKind::Tile2 };
            let centre = grid.to_world(GridCoord::new(gx, gy));
            scene.insert(MeshNode::new(
                Shape::Cube,
                MaterialKey::Ground(kind),
                centre + Vec3::Y * (TILE_HEIGHT / 2.0),
                Vec3::new(cell, TILE_HEIGHT, cell),
            ));
        }
    }

    let wall = MaterialKey::Wall(WallKind::Stone);
    let y = WALL_HEIGHT / 2.0;
    let offset = half + WALL_THICKNESS / 2.0;
    let long = Vec3::new(extent + 1.0, WALL_HEIGHT, WALL_THICKNESS);
    let side = Vec3::new(WALL_THICKNESS, WALL_HEIGHT, extent + 1.0);
    for (position, scale) in [
        (Vec3::new(0.0, y, -offset), long),
        (Vec3::new(0.0, y, offset), long),
        (Vec3::new(-offset, y, 0.0), side),
        (Vec3::new(offset, y, 0.0), side),
    ] {
        scene.insert(MeshNode::new(Shape::Cube, wall, position, scale));
    }
}
