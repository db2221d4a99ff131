//! World model: grid, robot pose, lamps and the win predicate
//!
//! The world has no modes. The engine mutates it through the legality
//! checks below and everything else only reads it.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::map::{Grid, LevelData, MapError, Tile, TileKind};

/// Robot heading. Index order matches the level file `direction` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Se,
    Ne,
    Nw,
    Sw,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Se, Direction::Ne, Direction::Nw, Direction::Sw];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        match self {
            Direction::Se => 0,
            Direction::Ne => 1,
            Direction::Nw => 2,
            Direction::Sw => 3,
        }
    }

    /// Grid step for one move forward
    pub fn forward(self) -> IVec2 {
        match self {
            Direction::Ne => IVec2::new(1, 0),
            Direction::Nw => IVec2::new(0, 1),
            Direction::Sw => IVec2::new(-1, 0),
            Direction::Se => IVec2::new(0, -1),
        }
    }

    pub fn turned(self, turn: Turn) -> Self {
        let step = match turn {
            Turn::Left => 1,
            Turn::Right => 3,
        };
        Self::ALL[(self.index() as usize + step) % 4]
    }
}

/// A quarter turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
}

/// Robot position and heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: IVec2,
    pub direction: Direction,
}

impl Pose {
    pub fn new(x: i32, y: i32, direction: Direction) -> Self {
        Self {
            position: IVec2::new(x, y),
            direction,
        }
    }

    /// Cell directly ahead
    pub fn forward_cell(&self) -> IVec2 {
        self.position + self.direction.forward()
    }

    pub fn turn(&mut self, turn: Turn) {
        self.direction = self.direction.turned(turn);
    }
}

/// Mutable game world for one loaded level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    grid: Grid,
    /// Grid as loaded, used to restore lamp state on reset
    initial: Grid,
    spawn: Pose,
    pose: Pose,
}

impl World {
    /// Build a world from level data. Fails without side effects.
    pub fn load(level: &LevelData) -> Result<Self, MapError> {
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
        if grid.lamp_count() == 0 {
            return Err(MapError::NoLamps);
        }
        let spawn = Pose::new(x, y, direction);
        log::info!(
            "Loaded {}x{} map with {} lamps, spawn ({}, {}) facing {:?}",
            grid.cols(),
            grid.rows(),
            grid.lamp_count(),
            x,
            y,
            direction
        );
        Ok(Self {
            initial: grid.clone(),
            grid,
            spawn,
            pose: spawn,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn spawn(&self) -> Pose {
        self.spawn
    }

    /// Map size as `(cols, rows)`
    pub fn size(&self) -> (usize, usize) {
        (self.grid.cols(), self.grid.rows())
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.grid.get(x, y)
    }

    /// Cell ahead of `pose`, `None` off the grid
    pub fn forward_target(&self, pose: &Pose) -> Option<IVec2> {
        let cell = pose.forward_cell();
        self.grid.contains(cell.x, cell.y).then_some(cell)
    }

    pub fn height_at(&self, cell: IVec2) -> Option<i32> {
        self.grid.get(cell.x, cell.y).map(|t| t.height as i32)
    }

    /// Height change for stepping forward from `pose`, `None` off the grid
    pub fn forward_delta(&self, pose: &Pose) -> Option<i32> {
        let here = self.height_at(pose.position)?;
        let there = self.height_at(pose.forward_cell())?;
        Some(there - here)
    }

    /// Walk climbs or descends at most one step
    pub fn can_walk_forward(&self, pose: &Pose) -> bool {
        matches!(self.forward_delta(pose), Some(d) if d.abs() <= 1)
    }

    /// Jump reaches any in-bounds cell ahead, including every Walk target
    pub fn can_jump_forward(&self, pose: &Pose) -> bool {
        self.forward_delta(pose).is_some()
    }

    /// Switch on the lamp under `pose`. Lamps latch; a lit lamp stays lit
    /// and non-lamp tiles are ignored. Returns true if the tile is a lamp.
    pub fn toggle_light_at(&mut self, pose: &Pose) -> bool {
        match self.grid.get_mut(pose.position.x, pose.position.y) {
            Some(tile) if tile.is_lamp() => {
                tile.kind = TileKind::Lamp { lit: true };
                true
            }
            _ => false,
        }
    }

    /// Rotate the robot a quarter turn
    pub fn turn(&mut self, turn: Turn) {
        self.pose.turn(turn);
    }

    /// Place the robot on a cell. Callers check legality first.
    pub(crate) fn move_robot_to(&mut self, cell: IVec2) {
        debug_assert!(self.grid.contains(cell.x, cell.y));
        self.pose.position = cell;
    }

    /// Every lamp is lit
    pub fn is_solved(&self) -> bool {
        self.grid
            .cells()
            .filter(|(_, _, t)| t.is_lamp())
            .all(|(_, _, t)| t.is_lit())
    }

    /// Back to the spawn pose and the loaded lamp state
    pub fn reset(&mut self) {
        self.grid = self.initial.clone();
        self.pose = self.spawn;
    }

    pub fn lamp_count(&self) -> usize {
        self.grid.lamp_count()
    }

    pub fn lit_count(&self) -> usize {
        self.grid.lit_count()
    }

    /// Export the loaded level (initial lamp state) back to level data
    pub fn to_level_data(&self, medals: crate::medals::MedalThresholds) -> LevelData {
        LevelData {
            direction: self.spawn.direction.index(),
            position: super::map::Position {
                x: self.spawn.position.x,
                y: self.spawn.position.y,
            },
            map: self.initial.to_level_rows(),
            medals,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sim::map::{CellData, Position, TileCode};

    /// Level from render-ordered rows of `(height, is_lamp)`
    pub(crate) fn level(rows: &[&[(u32, bool)]], spawn: (i32, i32), direction: u8) -> LevelData {
        let map = rows
            .iter()
            .rev()
            .map(|row| {
                row.iter()
                    .map(|&(h, lamp)| CellData {
                        h,
                        t: if lamp { TileCode::Lamp } else { TileCode::Block },
                    })
                    .collect()
            })
            .collect();
        LevelData {
            direction,
            position: Position {
                x: spawn.0,
                y: spawn.1,
            },
            map,
            medals: Default::default(),
        }
    }

    #[test]
    fn test_direction_turns_wrap() {
        assert_eq!(Direction::Sw.turned(Turn::Left), Direction::Se);
        assert_eq!(Direction::Se.turned(Turn::Right), Direction::Sw);
        let mut d = Direction::Ne;
        for _ in 0..4 {
            d = d.turned(Turn::Left);
        }
        assert_eq!(d, Direction::Ne);
    }

    #[test]
    fn test_load_rejects_bad_maps() {
        let no_lamp = level(&[&[(1, false), (1, false)]], (0, 0), 0);
        assert!(matches!(World::load(&no_lamp), Err(MapError::NoLamps)));

        let off_grid = level(&[&[(1, true)]], (1, 0), 0);
        assert!(matches!(
            World::load(&off_grid),
            Err(MapError::SpawnOutOfBounds { .. })
        ));

        let bad_dir = level(&[&[(1, true)]], (0, 0), 4);
        assert!(matches!(World::load(&bad_dir), Err(MapError::BadDirection(4))));
    }

    #[test]
    fn test_walk_legality_by_height_delta() {
        let data = level(&[&[(1, false), (2, false), (4, true)]], (0, 0), 1);
        let mut world = World::load(&data).unwrap();
        let pose = world.pose();
        assert!(world.can_walk_forward(&pose));

        world.move_robot_to(IVec2::new(1, 0));
        let pose = world.pose();
        assert!(!world.can_walk_forward(&pose));
        assert!(world.can_jump_forward(&pose));

        world.move_robot_to(IVec2::new(2, 0));
        let pose = world.pose();
        assert!(!world.can_walk_forward(&pose));
        assert!(!world.can_jump_forward(&pose));
        assert_eq!(world.forward_target(&pose), None);
        assert_eq!(world.size(), (3, 1));
        assert_eq!(world.tile(2, 0).map(|t| t.height), Some(4));
    }

    #[test]
    fn test_toggle_light_latches_and_ignores_ground() {
        let data = level(&[&[(1, false), (1, true)]], (0, 0), 1);
        let mut world = World::load(&data).unwrap();
        let solved_before = world.is_solved();
        assert!(!world.toggle_light_at(&world.pose()));
        assert_eq!(world.is_solved(), solved_before);

        world.move_robot_to(IVec2::new(1, 0));
        assert!(world.toggle_light_at(&world.pose()));
        assert!(world.is_solved());
        world.toggle_light_at(&world.pose());
        assert!(world.is_solved());
    }

    #[test]
    fn test_reset_restores_loaded_state() {
        let data = level(&[&[(1, true), (1, true)]], (0, 0), 1);
        let mut world = World::load(&data).unwrap();
        let loaded = world.clone();

        world.toggle_light_at(&world.pose());
        world.move_robot_to(IVec2::new(1, 0));
        world.turn(Turn::Right);
        assert_ne!(world, loaded);

        world.reset();
        assert_eq!(world, loaded);
    }

    #[test]
    fn test_export_round_trips_level() {
        let data = level(&[&[(1, false), (2, true)], &[(0, false), (3, false)]], (1, 1), 2);
        let world = World::load(&data).unwrap();
        assert_eq!(world.to_level_data(data.medals), data);
    }
}
