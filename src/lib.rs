pub mod assets;
pub mod camera;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod game;
pub mod grid;
pub mod input;
pub mod lifecycle;
pub mod movement;
pub mod renderer;
pub mod scene;

pub use error::Error;
