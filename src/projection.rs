//! Isometric projection
//!
//! World space: `x` along columns, `z` along rows, `y` up (see
//! [`crate::grid_to_world`]). Screen space: pixels, origin top-left, y down.
//! The camera rotates the map in quarter turns about the world origin; the
//! projection offsets then re-centre the result on the canvas.

use glam::{IVec2, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::grid_to_world;
use crate::sim::map::Grid;

/// Screen x per world unit along x and z (cos 45°)
pub const ISO_X: f32 = 0.707;
/// Screen y per world unit along x and z
pub const ISO_Y: f32 = 0.321;
/// Screen y per world unit of height
pub const ISO_H: f32 = 0.891;

/// Camera rotation in quarter turns (0..=3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Camera {
    rotation: u8,
}

impl Camera {
    pub fn new(rotation: u8) -> Self {
        Self {
            rotation: rotation % 4,
        }
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn rotate_left(&mut self) {
        self.rotation = (self.rotation + 3) % 4;
    }

    pub fn rotate_right(&mut self) {
        self.rotation = (self.rotation + 1) % 4;
    }
}

/// Rotate a ground-plane point `(x, z)` by `r` quarter turns
#[inline]
pub fn rotate_quarter(x: f32, z: f32, r: u8) -> (f32, f32) {
    match r % 4 {
        0 => (x, z),
        1 => (z, -x),
        2 => (-x, -z),
        _ => (-z, x),
    }
}

/// Integer version of [`rotate_quarter`], for grid steps and normals
#[inline]
pub fn rotate_quarter_i(v: IVec2, r: u8) -> IVec2 {
    match r % 4 {
        0 => v,
        1 => IVec2::new(v.y, -v.x),
        2 => -v,
        _ => IVec2::new(-v.y, v.x),
    }
}

/// Canvas placement of the projected map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Projection {
    pub fn new(canvas_width: f32, canvas_height: f32, offset_x: f32, offset_y: f32) -> Self {
        Self {
            canvas_width,
            canvas_height,
            offset_x,
            offset_y,
        }
    }

    /// World point to screen pixels
    pub fn project(&self, p: Vec3, camera: Camera) -> Vec2 {
        let (x, z) = rotate_quarter(p.x, p.z, camera.rotation);
        Vec2::new(
            self.offset_x + ISO_X * x - ISO_X * z,
            self.canvas_height - (self.offset_y + ISO_Y * x + ISO_Y * z + ISO_H * p.y),
        )
    }

    /// Grid coordinate (cell units, height in steps) to screen pixels
    pub fn project_grid(&self, col: f32, height: f32, row: f32, camera: Camera) -> Vec2 {
        self.project(grid_to_world(col, height, row), camera)
    }

    /// Game view: spawn cell centred horizontally, lowest ground corner
    /// `BOTTOM_MARGIN` above the canvas bottom.
    pub fn for_game(grid: &Grid, spawn: IVec2, camera: Camera, width: f32, height: f32) -> Self {
        let centre = grid_to_world(spawn.x as f32 + 0.5, 0.0, spawn.y as f32 + 0.5);
        let (cx, cz) = rotate_quarter(centre.x, centre.z, camera.rotation);
        let offset_x = width / 2.0 - ISO_X * (cx - cz);

        let lowest = ground_corners(grid)
            .map(|(x, z)| {
                let (x, z) = rotate_quarter(x, z, camera.rotation);
                ISO_Y * (x + z)
            })
            .fold(f32::INFINITY, f32::min);
        let offset_y = BOTTOM_MARGIN - lowest;

        Self::new(width, height, offset_x, offset_y)
    }

    /// Editor view: map centre at `(width / 2, EDITOR_CENTER_Y * height)`
    pub fn for_editor(cols: usize, rows: usize, camera: Camera, width: f32, height: f32) -> Self {
        let centre = grid_to_world(cols as f32 / 2.0, 0.0, rows as f32 / 2.0);
        let (cx, cz) = rotate_quarter(centre.x, centre.z, camera.rotation);
        let offset_x = width / 2.0 - ISO_X * (cx - cz);
        let offset_y = (1.0 - EDITOR_CENTER_Y) * height - ISO_Y * (cx + cz);
        Self::new(width, height, offset_x, offset_y)
    }
}

/// The four outer ground corners of a grid in world units
fn ground_corners(grid: &Grid) -> impl Iterator<Item = (f32, f32)> {
    let w = grid.cols() as f32 * EDGE_LENGTH;
    let d = grid.rows() as f32 * EDGE_LENGTH;
    [(0.0, 0.0), (w, 0.0), (w, d), (0.0, d)].into_iter()
}

/// Even-odd point-in-polygon test
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
