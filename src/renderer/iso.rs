//! Depth-sorted isometric display list
//!
//! Builds a [`Frame`] from the world and the engine snapshot without touching
//! the GPU. Cells are painted far to near; the robot is slotted in right after
//! the cell it stands on, or after the cell it is leaving while it moves away
//! from the camera.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{IVec2, Vec2, Vec3};

use super::vertex::colors;
use crate::consts::*;
use crate::projection::{Camera, Projection, rotate_quarter, rotate_quarter_i};
use crate::settings::Settings;
use crate::sim::engine::{AnimationName, ExecutionSnapshot};
use crate::sim::map::{Tile, TileKind};
use crate::sim::state::Session;
use crate::sim::world::{Pose, World};

/// One painting instruction in screen pixels
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole canvas
    Clear { color: [f32; 4] },
    /// Convex polygon, optionally stroked
    Polygon {
        points: Vec<Vec2>,
        fill: [f32; 4],
        outline: Option<[f32; 4]>,
    },
    Disc {
        center: Vec2,
        radius: f32,
        color: [f32; 4],
    },
}

/// Logical object painted by a run of commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawItem {
    Background,
    Cell { x: i32, y: i32 },
    Robot,
    SpawnMarker,
}

/// Display list for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub commands: Vec<DrawCommand>,
    /// Items in paint order
    pub order: Vec<DrawItem>,
    /// Index of each item's first command
    starts: Vec<usize>,
}

impl Frame {
    /// New frame cleared to `background`
    pub fn new(background: [f32; 4]) -> Self {
        let mut frame = Self::default();
        frame.begin(DrawItem::Background);
        frame.commands.push(DrawCommand::Clear { color: background });
        frame
    }

    /// Start painting a new item
    pub fn begin(&mut self, item: DrawItem) {
        self.order.push(item);
        self.starts.push(self.commands.len());
    }

    pub fn polygon(&mut self, points: Vec<Vec2>, fill: [f32; 4], outline: Option<[f32; 4]>) {
        self.commands.push(DrawCommand::Polygon {
            points,
            fill,
            outline,
        });
    }

    pub fn disc(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        self.commands.push(DrawCommand::Disc {
            center,
            radius,
            color,
        });
    }

    /// Commands painted for the item at `index` in [`Frame::order`]
    pub fn commands_for(&self, index: usize) -> &[DrawCommand] {
        let Some(&start) = self.starts.get(index) else {
            return &[];
        };
        let end = self
            .starts
            .get(index + 1)
            .copied()
            .unwrap_or(self.commands.len());
        &self.commands[start..end]
    }

    pub fn position_of(&self, item: DrawItem) -> Option<usize> {
        self.order.iter().position(|&i| i == item)
    }
}

/// Vertical faces of a cell: outward normal in `(x, z)`, then the two ground
/// corners of the face in cell units.
const SIDES: [(IVec2, Vec2, Vec2); 4] = [
    (IVec2::new(-1, 0), Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0)),
    (IVec2::new(1, 0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)),
    (IVec2::new(0, -1), Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)),
    (IVec2::new(0, 1), Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0)),
];

/// Screen-space robot proportions, in height steps and cell units
const BODY_LIFT: f32 = 0.9;
const HEAD_LIFT: f32 = 1.8;
const BODY_RADIUS: f32 = 0.22;
const HEAD_RADIUS: f32 = 0.15;
const EYE_RADIUS: f32 = 0.05;
const SHAKE: f32 = 0.08;

/// Painter's-algorithm renderer for one camera placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsoRenderer {
    pub projection: Projection,
    pub camera: Camera,
    pub outlines: bool,
    pub reduced_motion: bool,
}

impl IsoRenderer {
    pub fn new(projection: Projection, camera: Camera) -> Self {
        Self {
            projection,
            camera,
            outlines: true,
            reduced_motion: false,
        }
    }

    /// Game view of a session at a canvas size
    pub fn for_session(session: &Session, width: f32, height: f32) -> Self {
        Self::new(session.projection(width, height), session.camera)
    }

    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.outlines = settings.outlines;
        self.reduced_motion = settings.reduced_motion;
        self
    }

    /// Grid point (cell units, height in steps) to screen
    fn screen(&self, col: f32, height: f32, row: f32) -> Vec2 {
        self.projection.project_grid(col, height, row, self.camera)
    }

    /// Screen y of a cell's ground centre; smaller is farther away
    pub fn depth_key(&self, cell: IVec2) -> f32 {
        self.screen(cell.x as f32 + 0.5, 0.0, cell.y as f32 + 0.5).y
    }

    /// Cells sorted far to near. Ties keep input order.
    pub fn draw_order(&self, cells: impl Iterator<Item = IVec2>) -> Vec<IVec2> {
        let mut keyed: Vec<(f32, IVec2)> = cells.map(|c| (self.depth_key(c), c)).collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        keyed.into_iter().map(|(_, c)| c).collect()
    }

    /// Projected corners of a cell's top face at `height` steps
    pub fn top_face(&self, cell: IVec2, height: f32) -> Vec<Vec2> {
        let (x, z) = (cell.x as f32, cell.y as f32);
        vec![
            self.screen(x, height, z),
            self.screen(x + 1.0, height, z),
            self.screen(x + 1.0, height, z + 1.0),
            self.screen(x, height, z + 1.0),
        ]
    }

    /// Paint one tile: ground quad, camera-facing sides and top
    pub fn draw_tile(&self, frame: &mut Frame, cell: IVec2, tile: &Tile) {
        let stroke = self.outlines.then_some(colors::OUTLINE);
        frame.polygon(self.top_face(cell, 0.0), colors::GROUND, stroke);
        if tile.height == 0 {
            return;
        }

        let h = tile.height as f32;
        let origin = cell.as_vec2();
        for (normal, a, b) in SIDES {
            let n = rotate_quarter_i(normal, self.camera.rotation());
            if n.x + n.y >= 0 {
                continue;
            }
            let fill = if n.y < 0 {
                colors::TILE_FRONT
            } else {
                colors::TILE_SIDE
            };
            let (a, b) = (origin + a, origin + b);
            let points = vec![
                self.screen(a.x, 0.0, a.y),
                self.screen(b.x, 0.0, b.y),
                self.screen(b.x, h, b.y),
                self.screen(a.x, h, a.y),
            ];
            frame.polygon(points, fill, stroke);
        }

        let top = match tile.kind {
            TileKind::Ground => colors::TILE_TOP,
            TileKind::Lamp { lit: false } => colors::LAMP_OFF,
            TileKind::Lamp { lit: true } => colors::LAMP_ON,
        };
        frame.polygon(self.top_face(cell, h), top, stroke);
    }

    /// Build the frame for a world and the engine's current animation
    pub fn render(&self, world: &World, snapshot: &ExecutionSnapshot) -> Frame {
        let mut frame = Frame::new(colors::BACKGROUND);
        let grid = world.grid();
        let order = self.draw_order(grid.cells().map(|(x, y, _)| IVec2::new(x, y)));
        let anchor = robot_anchor(world.pose(), snapshot, &order);

        for cell in &order {
            let Some(tile) = grid.get(cell.x, cell.y) else {
                continue;
            };
            frame.begin(DrawItem::Cell {
                x: cell.x,
                y: cell.y,
            });
            self.draw_tile(&mut frame, *cell, tile);

            if *cell == anchor {
                frame.begin(DrawItem::Robot);
                self.draw_robot(&mut frame, world, snapshot);
            }
        }

        frame
    }

    fn draw_robot(&self, frame: &mut Frame, world: &World, snapshot: &ExecutionSnapshot) {
        let pose = world.pose();
        let pos = self.robot_position(world, snapshot);
        let heading = robot_heading(pose, snapshot);
        let scale = EDGE_LENGTH * crate::projection::ISO_X;

        let body_color = match snapshot.animation {
            Some(anim) if anim.name == AnimationName::Light => {
                mix(colors::ROBOT_BODY, colors::ROBOT_FLASH, (snapshot.progress * PI).sin())
            }
            _ => colors::ROBOT_BODY,
        };

        let body = self.screen(pos.x, pos.y + BODY_LIFT, pos.z);
        frame.disc(body, BODY_RADIUS * scale, body_color);
        let head = self.screen(pos.x, pos.y + HEAD_LIFT, pos.z);
        frame.disc(head, HEAD_RADIUS * scale, body_color);

        // Eye only when the robot faces the viewer
        let (fx, fz) = (heading.cos(), heading.sin());
        let (rx, rz) = rotate_quarter(fx, fz, self.camera.rotation());
        if rx + rz < 0.0 {
            let eye = self.screen(
                pos.x + fx * HEAD_RADIUS,
                pos.y + HEAD_LIFT,
                pos.z + fz * HEAD_RADIUS,
            );
            frame.disc(eye, EYE_RADIUS * scale, colors::ROBOT_EYE);
        }
    }

    /// Robot centre in grid units (`x` col, `y` height steps, `z` row)
    fn robot_position(&self, world: &World, snapshot: &ExecutionSnapshot) -> Vec3 {
        let pose = world.pose();
        let h = world.height_at(pose.position).unwrap_or(0) as f32;
        let mut pos = Vec3::new(
            pose.position.x as f32 + 0.5,
            h,
            pose.position.y as f32 + 0.5,
        );

        let Some(anim) = snapshot.animation else {
            return pos;
        };
        let p = snapshot.progress;
        let back = 1.0 - p;

        if anim.moves() {
            pos -= Vec3::new(
                anim.delta.x as f32,
                anim.delta.z as f32,
                anim.delta.y as f32,
            ) * back;
            if anim.name.is_jump() {
                pos.y += JUMP_ARC * 4.0 * p * back;
            }
        } else if anim.name == AnimationName::Blocked && !self.reduced_motion {
            let f = pose.direction.forward().as_vec2();
            let shake = (p * PI * 4.0).sin() * SHAKE * back;
            pos.x += f.x * shake;
            pos.z += f.y * shake;
        }
        pos
    }
}

/// Cell the robot is painted after
fn robot_anchor(pose: Pose, snapshot: &ExecutionSnapshot, order: &[IVec2]) -> IVec2 {
    let committed = pose.position;
    let Some(anim) = snapshot.animation else {
        return committed;
    };
    if !anim.moves() || snapshot.progress >= 1.0 {
        return committed;
    }

    let source = committed - IVec2::new(anim.delta.x, anim.delta.y);
    let rank = |cell: IVec2| order.iter().position(|&c| c == cell);
    let moving_away = matches!((rank(committed), rank(source)), (Some(d), Some(s)) if d < s);
    let still_low = match anim.name {
        AnimationName::Walk => true,
        AnimationName::JumpUp | AnimationName::JumpDown => snapshot.progress <= 0.5,
        _ => false,
    };

    if moving_away && still_low {
        source
    } else {
        committed
    }
}

/// Facing angle in the `(x, z)` plane, interpolated during turns
fn robot_heading(pose: Pose, snapshot: &ExecutionSnapshot) -> f32 {
    let f = pose.direction.forward().as_vec2();
    let theta = f.y.atan2(f.x);
    let back = 1.0 - snapshot.progress;
    match snapshot.animation.map(|a| a.name) {
        Some(AnimationName::TurnLeft) => theta - FRAC_PI_2 * back,
        Some(AnimationName::TurnRight) => theta + FRAC_PI_2 * back,
        _ => theta,
    }
}

fn mix(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}
