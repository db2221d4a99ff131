//! Level data and the tile grid
//!
//! Level files store rows bottom-to-top: `map[0]` is the row furthest from
//! the viewer. The grid keeps rows in render order, so `rows[y]` is
//! `map[len - 1 - y]`. Export applies the same flip in reverse.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::medals::MedalThresholds;

/// Malformed level data. A failed load never touches the current world.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("map has no tiles")]
    Empty,
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("spawn ({x}, {y}) is outside the {cols}x{rows} map")]
    SpawnOutOfBounds { x: i32, y: i32, cols: usize, rows: usize },
    #[error("spawn direction {0} is not in 0..=3")]
    BadDirection(u8),
    #[error("map has no lamps")]
    NoLamps,
    #[error("malformed level data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tile type code used by level files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileCode {
    #[default]
    #[serde(rename = "b")]
    Block,
    #[serde(rename = "l")]
    Lamp,
}

/// One cell as stored in a level file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellData {
    #[serde(default)]
    pub h: u32,
    #[serde(default)]
    pub t: TileCode,
}

/// Spawn cell in grid coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// A level as exchanged with the editor and the level pack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelData {
    /// Spawn heading index (0 = SE, 1 = NE, 2 = NW, 3 = SW)
    #[serde(default)]
    pub direction: u8,
    pub position: Position,
    pub map: Vec<Vec<CellData>>,
    #[serde(default)]
    pub medals: MedalThresholds,
}

impl LevelData {
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, MapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// What sits on a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Ground,
    Lamp {
        lit: bool,
    },
}

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tile {
    pub height: u32,
    pub kind: TileKind,
}

impl Tile {
    pub fn ground(height: u32) -> Self {
        Self {
            height,
            kind: TileKind::Ground,
        }
    }

    pub fn lamp(height: u32) -> Self {
        Self {
            height,
            kind: TileKind::Lamp { lit: false },
        }
    }

    pub fn is_lamp(&self) -> bool {
        matches!(self.kind, TileKind::Lamp { .. })
    }

    pub fn is_lit(&self) -> bool {
        matches!(self.kind, TileKind::Lamp { lit: true })
    }

    /// A lamp on the flat ground plane can never be drawn or reached;
    /// it loads as ground.
    fn from_cell(cell: &CellData) -> Self {
        match cell.t {
            TileCode::Lamp if cell.h > 0 => Tile::lamp(cell.h),
            _ => Tile::ground(cell.h),
        }
    }

    fn to_cell(self) -> CellData {
        CellData {
            h: self.height,
            t: if self.is_lamp() {
                TileCode::Lamp
            } else {
                TileCode::Block
            },
        }
    }
}

/// Rectangular tile grid, `rows[y][x]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cols: usize,
    rows: Vec<Vec<Tile>>,
}

impl Grid {
    /// Build from render-ordered rows. Rows must be non-empty and equal length;
    /// the widest row sets the expected width.
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Result<Self, MapError> {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        if cols == 0 {
            return Err(MapError::Empty);
        }
        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != cols)
            .map(|(i, r)| (i, r.len()))
        {
            return Err(MapError::RaggedRow {
                row,
                expected: cols,
                found,
            });
        }
        Ok(Self { cols, rows })
    }

    /// Build from level-file rows (bottom-to-top)
    pub fn from_level_rows(map: &[Vec<CellData>]) -> Result<Self, MapError> {
        let rows = map
            .iter()
            .rev()
            .map(|row| row.iter().map(Tile::from_cell).collect())
            .collect();
        Self::from_rows(rows)
    }

    /// Level-file rows (bottom-to-top)
    pub fn to_level_rows(&self) -> Vec<Vec<CellData>> {
        self.rows
            .iter()
            .rev()
            .map(|row| row.iter().map(|t| t.to_cell()).collect())
            .collect()
    }

    /// Number of columns (x extent)
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows (y extent)
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.cols && (y as usize) < self.rows.len()
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Tile> {
        if !self.contains(x, y) {
            return None;
        }
        self.rows.get(y as usize)?.get(x as usize)
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Tile> {
        if !self.contains(x, y) {
            return None;
        }
        self.rows.get_mut(y as usize)?.get_mut(x as usize)
    }

    /// All cells in row-major order as `(x, y, tile)`
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, &Tile)> {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, tile)| (x as i32, y as i32, tile))
        })
    }

    pub fn lamp_count(&self) -> usize {
        self.cells().filter(|(_, _, t)| t.is_lamp()).count()
    }

    pub fn lit_count(&self) -> usize {
        self.cells().filter(|(_, _, t)| t.is_lit()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(h: u32, t: TileCode) -> CellData {
        CellData { h, t }
    }

    #[test]
    fn test_level_rows_are_flipped() {
        let map = vec![
            vec![cell(3, TileCode::Block), cell(1, TileCode::Lamp)],
            vec![cell(0, TileCode::Block), cell(2, TileCode::Block)],
        ];
        let grid = Grid::from_level_rows(&map).unwrap();
        // Last file row becomes y = 0
        assert_eq!(grid.get(1, 0).unwrap().height, 2);
        assert_eq!(grid.get(0, 1).unwrap().height, 3);
        assert!(grid.get(1, 1).unwrap().is_lamp());
        assert_eq!(grid.to_level_rows(), map);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let map = vec![vec![cell(1, TileCode::Block)], vec![]];
        let err = Grid::from_level_rows(&map).unwrap_err();
        assert!(matches!(err, MapError::RaggedRow { .. }));
    }

    #[test]
    fn test_empty_row_reported_as_ragged() {
        // File row 1 is the bottom row, so it becomes y = 0
        let map = vec![vec![cell(1, TileCode::Block), cell(2, TileCode::Block)], vec![]];
        assert!(matches!(
            Grid::from_level_rows(&map),
            Err(MapError::RaggedRow {
                row: 0,
                expected: 2,
                found: 0,
            })
        ));

        let short = vec![vec![cell(1, TileCode::Block)], vec![cell(1, TileCode::Block); 3]];
        assert!(matches!(
            Grid::from_level_rows(&short),
            Err(MapError::RaggedRow {
                row: 1,
                expected: 3,
                found: 1,
            })
        ));
    }

    #[test]
    fn test_all_rows_empty_is_empty() {
        assert!(matches!(
            Grid::from_level_rows(&[vec![], vec![]]),
            Err(MapError::Empty)
        ));
    }

    #[test]
    fn test_empty_map_rejected() {
        assert!(matches!(Grid::from_level_rows(&[]), Err(MapError::Empty)));
    }

    #[test]
    fn test_ground_level_lamp_loads_as_ground() {
        let grid = Grid::from_level_rows(&[vec![cell(0, TileCode::Lamp)]]).unwrap();
        assert_eq!(grid.lamp_count(), 0);
    }

    #[test]
    fn test_out_of_bounds_lookup() {
        let grid = Grid::from_level_rows(&[vec![cell(1, TileCode::Block)]]).unwrap();
        assert!(grid.get(-1, 0).is_none());
        assert!(grid.get(0, 1).is_none());
        assert!(grid.get(0, 0).is_some());
    }

    #[test]
    fn test_level_json_shape() {
        let json = r#"{
            "direction": 1,
            "position": {"x": 0, "y": 0},
            "map": [[{"h": 1, "t": "b"}, {"h": 2, "t": "l"}]],
            "medals": {"gold": 3, "silver": 4, "bronze": 5}
        }"#;
        let level = LevelData::from_json(json).unwrap();
        assert_eq!(level.direction, 1);
        assert_eq!(level.map[0][1].t, TileCode::Lamp);
        assert_eq!(level.medals.silver, 4);
    }
}
