//! SapoBot - a robot programming puzzle on an isometric tile map
//!
//! Core modules:
//! - `program`: Instruction values produced by the editor
//! - `sim`: Deterministic world model, execution engine and tick driver
//! - `projection`: Isometric projection and camera centering
//! - `renderer`: Depth-sorted display list and WebGPU pipeline
//! - `medals`: Medal tiers and the keep-best medal book
//! - `editor`: Map editor model (tools, picking, export)
//! - `levels`: Built-in level pack

pub mod editor;
pub mod levels;
pub mod medals;
pub mod program;
pub mod projection;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use medals::{Medal, MedalBook, MedalThresholds};
pub use program::{Action, Instruction, Program, ProgramError};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed tick rate of the animation clock (Hz)
    pub const TICK_RATE: u32 = 30;
    /// Fixed tick duration in seconds
    pub const TICK_DT: f32 = 1.0 / TICK_RATE as f32;
    /// Maximum ticks per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Tile edge length in world units
    pub const EDGE_LENGTH: f32 = 50.0;
    /// World height of one height step, as a fraction of the edge length
    pub const HEIGHT_SCALE: f32 = 0.5;

    /// Gap between the lowest ground corner and the canvas bottom (game view)
    pub const BOTTOM_MARGIN: f32 = 50.0;
    /// Editor map centre sits at this fraction of the canvas height
    pub const EDITOR_CENTER_Y: f32 = 0.55;

    /// Animation durations in ticks at x1 speed
    pub const WALK_TICKS: u32 = 15;
    pub const JUMP_TICKS: u32 = 20;
    pub const LIGHT_TICKS: u32 = 12;
    pub const TURN_TICKS: u32 = 10;
    pub const BLOCKED_TICKS: u32 = 8;

    /// Peak of the jump arc in height steps
    pub const JUMP_ARC: f32 = 0.8;
}

/// World-space point for a grid coordinate and a height in tile steps.
///
/// `col` maps to world x, `row` to world z; height becomes the vertical axis.
#[inline]
pub fn grid_to_world(col: f32, height: f32, row: f32) -> glam::Vec3 {
    use consts::{EDGE_LENGTH, HEIGHT_SCALE};
    glam::Vec3::new(
        col * EDGE_LENGTH,
        height * HEIGHT_SCALE * EDGE_LENGTH,
        row * EDGE_LENGTH,
    )
}
