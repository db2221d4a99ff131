//! Session state and game events
//!
//! A session is one loaded level plus everything that plays on it:
//! - the world and the engine running against it
//! - the camera rotation
//! - level id and medal limits
//! - the medal book across levels

use serde::{Deserialize, Serialize};

use super::engine::{AnimationDescriptor, Engine, ExecutionSnapshot, Speed};
use super::map::{LevelData, MapError};
use super::world::World;
use crate::medals::{Medal, MedalBook, MedalThresholds};
use crate::program::Action;
use crate::projection::{Camera, Projection};

/// Which level is loaded and how it is scored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub id: String,
    pub medals: MedalThresholds,
}

/// Events emitted by the session tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// An instruction began executing
    InstructionStarted {
        action: Action,
        animation: AnimationDescriptor,
    },
    /// A Walk or Jump could not move the robot
    Blocked { action: Action },
    /// Every lamp is lit
    MapSolved { executed: u32, medal: Medal },
    /// Program ran out without solving the map
    ProgramFinished { executed: u32 },
    /// One animation tick elapsed
    Tick,
}

/// One playable level with its engine, camera and medal book
#[derive(Debug, Clone)]
pub struct Session {
    pub world: World,
    pub engine: Engine,
    pub camera: Camera,
    pub level: LevelInfo,
    pub book: MedalBook,
    /// Medal of the last solved run, cleared when a new run starts
    last_medal: Option<Medal>,
}

impl Session {
    /// Start a session on a level
    pub fn new(id: impl Into<String>, level: &LevelData) -> Result<Self, MapError> {
        let world = World::load(level)?;
        Ok(Self {
            world,
            engine: Engine::new(),
            camera: Camera::default(),
            level: LevelInfo {
                id: id.into(),
                medals: level.medals,
            },
            book: MedalBook::new(),
            last_medal: None,
        })
    }

    /// Swap in another level. On error the current level stays loaded.
    pub fn load_level(&mut self, id: impl Into<String>, level: &LevelData) -> Result<(), MapError> {
        let world = World::load(level)?;
        self.world = world;
        let speed = self.engine.speed();
        self.engine = Engine::new();
        self.engine.set_speed(speed);
        self.level = LevelInfo {
            id: id.into(),
            medals: level.medals,
        };
        self.last_medal = None;
        Ok(())
    }

    /// Concrete instructions executed in the current run
    pub fn executed_count(&self) -> u32 {
        self.engine.executed_count()
    }

    /// Medal earned by the last solved run, if any
    pub fn current_medal(&self) -> Option<Medal> {
        self.last_medal
    }

    pub fn speed(&self) -> Speed {
        self.engine.speed()
    }

    pub fn snapshot(&self) -> ExecutionSnapshot {
        self.engine.snapshot()
    }

    /// Canvas placement for the game view at the current camera
    pub fn projection(&self, width: f32, height: f32) -> Projection {
        Projection::for_game(
            self.world.grid(),
            self.world.spawn().position,
            self.camera,
            width,
            height,
        )
    }

    pub(super) fn set_last_medal(&mut self, medal: Option<Medal>) {
        self.last_medal = medal;
    }
}
