//! Map editor model
//!
//! Tile painting with four tools, resize, camera rotation and export to the
//! level file format. Picking works in screen space against the projected
//! top faces, so it follows the camera.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::medals::MedalThresholds;
use crate::projection::{Camera, Projection, point_in_polygon};
use crate::renderer::iso::{DrawItem, Frame, IsoRenderer};
use crate::renderer::vertex::colors;
use crate::sim::map::{Grid, LevelData, MapError, Position, Tile};
use crate::sim::world::{Direction, Pose};

/// Smallest and largest editable map side
pub const MIN_SIZE: usize = 3;
pub const MAX_SIZE: usize = 12;
/// Starting map side
pub const DEFAULT_SIZE: usize = 8;

/// Editing tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tool {
    /// Raise by one step and make plain ground
    #[default]
    Block,
    /// Make a lamp, lifting flat tiles to one step
    Lamp,
    /// Move the spawn here, facing the chosen direction
    Spawn,
    /// Flatten to ground
    Erase,
}

impl Tool {
    /// Keyboard shortcut: 1 block, 2 lamp, 3 spawn, 4 erase
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "1" => Some(Tool::Block),
            "2" => Some(Tool::Lamp),
            "3" => Some(Tool::Spawn),
            "4" => Some(Tool::Erase),
            _ => None,
        }
    }
}

/// Editable map
#[derive(Debug, Clone, PartialEq)]
pub struct MapEditor {
    /// Render-ordered rows, `tiles[y][x]`
    tiles: Vec<Vec<Tile>>,
    spawn: Pose,
    pub tool: Tool,
    /// Heading given to the spawn by the Spawn tool
    pub spawn_direction: Direction,
    pub camera: Camera,
    /// Canvas size in pixels
    pub viewport: Vec2,
}

impl MapEditor {
    pub fn new(viewport: Vec2) -> Self {
        let mut editor = Self {
            tiles: Vec::new(),
            spawn: Pose::default(),
            tool: Tool::default(),
            spawn_direction: Direction::default(),
            camera: Camera::default(),
            viewport,
        };
        editor.reset_tiles(DEFAULT_SIZE, DEFAULT_SIZE);
        editor
    }

    /// Flat map of the given size with the spawn in the middle
    fn reset_tiles(&mut self, cols: usize, rows: usize) {
        self.tiles = vec![vec![Tile::ground(0); cols]; rows];
        self.spawn = Pose::new((cols / 2) as i32, (rows / 2) as i32, Direction::default());
    }

    pub fn cols(&self) -> usize {
        self.tiles.first().map(Vec::len).unwrap_or(0)
    }

    pub fn rows(&self) -> usize {
        self.tiles.len()
    }

    pub fn spawn(&self) -> Pose {
        self.spawn
    }

    pub fn tile(&self, cell: IVec2) -> Option<&Tile> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }
        self.tiles.get(cell.y as usize)?.get(cell.x as usize)
    }

    fn tile_mut(&mut self, cell: IVec2) -> Option<&mut Tile> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }
        self.tiles.get_mut(cell.y as usize)?.get_mut(cell.x as usize)
    }

    /// Start over with a flat map, sides clamped to `MIN_SIZE..=MAX_SIZE`
    pub fn resize(&mut self, cols: usize, rows: usize) {
        let cols = cols.clamp(MIN_SIZE, MAX_SIZE);
        let rows = rows.clamp(MIN_SIZE, MAX_SIZE);
        self.reset_tiles(cols, rows);
        log::info!("Editor map resized to {}x{}", cols, rows);
    }

    /// Flatten everything, keeping the size
    pub fn clear(&mut self) {
        let (cols, rows) = (self.cols(), self.rows());
        self.reset_tiles(cols, rows);
    }

    pub fn rotate_left(&mut self) {
        self.camera.rotate_left();
    }

    pub fn rotate_right(&mut self) {
        self.camera.rotate_right();
    }

    pub fn projection(&self) -> Projection {
        Projection::for_editor(
            self.cols(),
            self.rows(),
            self.camera,
            self.viewport.x,
            self.viewport.y,
        )
    }

    fn renderer(&self) -> IsoRenderer {
        IsoRenderer::new(self.projection(), self.camera)
    }

    fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.tiles.iter().enumerate().flat_map(|(y, row)| {
            (0..row.len()).map(move |x| IVec2::new(x as i32, y as i32))
        })
    }

    /// Tile under a screen point. Overlapping top faces resolve to the one
    /// painted last.
    pub fn pick_tile(&self, screen: Vec2) -> Option<IVec2> {
        let iso = self.renderer();
        let order = iso.draw_order(self.cells());
        order.into_iter().rev().find(|&cell| {
            self.tile(cell).is_some_and(|tile| {
                point_in_polygon(screen, &iso.top_face(cell, tile.height as f32))
            })
        })
    }

    /// Apply the current tool to a cell. Returns false off the map.
    pub fn apply(&mut self, cell: IVec2) -> bool {
        let tool = self.tool;
        let direction = self.spawn_direction;
        let Some(tile) = self.tile_mut(cell) else {
            return false;
        };
        match tool {
            Tool::Block => *tile = Tile::ground(tile.height.saturating_add(1)),
            Tool::Lamp => *tile = Tile::lamp(tile.height.max(1)),
            Tool::Erase => *tile = Tile::ground(0),
            Tool::Spawn => self.spawn = Pose::new(cell.x, cell.y, direction),
        }
        true
    }

    /// Pick and apply in one step, as a click does
    pub fn click(&mut self, screen: Vec2) -> Option<IVec2> {
        let cell = self.pick_tile(screen)?;
        self.apply(cell);
        Some(cell)
    }

    /// At least one lamp above the ground plane
    pub fn is_publishable(&self) -> bool {
        self.tiles.iter().flatten().any(|t| t.is_lamp() && t.height > 0)
    }

    /// Export in level file order (rows bottom-to-top). Medal limits are left
    /// at zero for the level author to fill in.
    pub fn to_level_data(&self) -> Result<LevelData, MapError> {
        let grid = Grid::from_rows(self.tiles.clone())?;
        Ok(LevelData {
            direction: self.spawn.direction.index(),
            position: Position {
                x: self.spawn.position.x,
                y: self.spawn.position.y,
            },
            map: grid.to_level_rows(),
            medals: MedalThresholds::default(),
        })
    }

    /// Replace the map with imported level data. On error nothing changes.
    pub fn load_level_data(&mut self, level: &LevelData) -> Result<(), MapError> {
        let grid = Grid::from_level_rows(&level.map)?;
        let direction =
            Direction::from_index(level.direction).ok_or(MapError::BadDirection(level.direction))?;
        let (x, y) = (level.position.x, level.position.y);
        if !grid.contains(x, y) {
            return Err(MapError::SpawnOutOfBounds {
                x,
                y,
                cols: grid.cols(),
                rows: grid.rows(),
            });
        }

        let mut tiles = vec![vec![Tile::ground(0); grid.cols()]; grid.rows()];
        for (cx, cy, tile) in grid.cells() {
            tiles[cy as usize][cx as usize] = *tile;
        }
        self.tiles = tiles;
        self.spawn = Pose::new(x, y, direction);
        self.spawn_direction = direction;
        log::info!("Editor loaded {}x{} map", self.cols(), self.rows());
        Ok(())
    }

    /// Display list: depth-sorted tiles, spawn marker, optional hover
    pub fn render(&self, hover: Option<IVec2>) -> Frame {
        let iso = self.renderer();
        let mut frame = Frame::new(colors::BACKGROUND);
        let spawn = self.spawn.position;

        for cell in iso.draw_order(self.cells()) {
            let Some(tile) = self.tile(cell) else {
                continue;
            };
            frame.begin(DrawItem::Cell {
                x: cell.x,
                y: cell.y,
            });
            iso.draw_tile(&mut frame, cell, tile);
            let h = tile.height as f32;
            if hover == Some(cell) {
                frame.polygon(iso.top_face(cell, h), colors::HOVER, None);
            }

            if cell == spawn {
                frame.begin(DrawItem::SpawnMarker);
                let centre = iso.projection.project_grid(
                    cell.x as f32 + 0.5,
                    h.max(1.0) + 0.4,
                    cell.y as f32 + 0.5,
                    self.camera,
                );
                frame.disc(centre, 6.0, colors::SPAWN_MARKER);
            }
        }

        frame
    }
}
