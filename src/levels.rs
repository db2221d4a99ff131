//! Built-in level pack
//!
//! Levels are embedded JSON in the level file format and parsed on demand.

use crate::medals::MedalThresholds;
use crate::sim::map::{LevelData, MapError};

const LEVELS: [(&str, &str); 4] = [
    ("first-steps", include_str!("../levels/01_first_steps.json")),
    ("steps-up", include_str!("../levels/02_steps_up.json")),
    ("long-road", include_str!("../levels/03_long_road.json")),
    ("corner", include_str!("../levels/04_corner.json")),
];

/// Number of built-in levels
pub fn count() -> usize {
    LEVELS.len()
}

/// Stable id of a level, used as the medal book key
pub fn id(index: usize) -> Option<&'static str> {
    LEVELS.get(index).map(|(id, _)| *id)
}

/// Parse a level. `None` past the end of the pack.
pub fn load(index: usize) -> Option<Result<LevelData, MapError>> {
    LEVELS
        .get(index)
        .map(|(_, json)| LevelData::from_json(json))
}

/// Medal limits of a level
pub fn medals(index: usize) -> Option<MedalThresholds> {
    match load(index)? {
        Ok(level) => Some(level.medals),
        Err(e) => {
            log::warn!("Level {} is malformed: {}", index, e);
            None
        }
    }
}
