//! Deterministic simulation module
//!
//! All puzzle logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - One instruction in flight at a time
//! - No rendering or platform dependencies

pub mod cursor;
pub mod engine;
pub mod map;
pub mod state;
pub mod tick;
pub mod world;

pub use cursor::Cursor;
pub use engine::{
    AnimationDescriptor, AnimationName, Engine, EngineEvent, ExecutionSnapshot, Mode, Speed,
};
pub use map::{CellData, Grid, LevelData, MapError, Position, Tile, TileCode, TileKind};
pub use state::{GameEvent, LevelInfo, Session};
pub use tick::{TickInput, tick};
pub use world::{Direction, Pose, Turn, World};
