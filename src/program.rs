//! Program model
//!
//! Instructions are plain values handed over by the editor. Nothing in this
//! module executes anything; the engine walks the tree via `sim::cursor`.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while decoding a program from the editor
#[derive(Debug, Error)]
pub enum ProgramError {
    /// Unknown op, zero repeat count or broken JSON
    #[error("malformed program: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single concrete robot action (every instruction except `Repeat`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Walk,
    Jump,
    Light,
    TurnLeft,
    TurnRight,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Walk => "walk",
            Action::Jump => "jump",
            Action::Light => "light",
            Action::TurnLeft => "turnLeft",
            Action::TurnRight => "turnRight",
        }
    }
}

/// One program instruction.
///
/// Wire format is internally tagged: `{"op": "walk"}`,
/// `{"op": "repeat", "count": 3, "body": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Instruction {
    Walk,
    Jump,
    #[serde(rename = "light")]
    ToggleLight,
    TurnLeft,
    TurnRight,
    /// Runs `body` `count` times before moving on
    Repeat {
        count: NonZeroU32,
        #[serde(default)]
        body: Vec<Instruction>,
    },
}

impl Instruction {
    /// Build a repeat block
    pub fn repeat(count: NonZeroU32, body: Vec<Instruction>) -> Self {
        Instruction::Repeat { count, body }
    }

    /// The concrete action, or `None` for `Repeat`
    pub fn action(&self) -> Option<Action> {
        match self {
            Instruction::Walk => Some(Action::Walk),
            Instruction::Jump => Some(Action::Jump),
            Instruction::ToggleLight => Some(Action::Light),
            Instruction::TurnLeft => Some(Action::TurnLeft),
            Instruction::TurnRight => Some(Action::TurnRight),
            Instruction::Repeat { .. } => None,
        }
    }

    /// Number of concrete actions this instruction expands to
    pub fn expanded_len(&self) -> u64 {
        match self {
            Instruction::Repeat { count, body } => {
                let inner = body
                    .iter()
                    .fold(0u64, |acc, i| acc.saturating_add(i.expanded_len()));
                inner.saturating_mul(count.get() as u64)
            }
            _ => 1,
        }
    }

    /// Repeat nesting depth (0 for plain actions)
    pub fn depth(&self) -> usize {
        match self {
            Instruction::Repeat { body, .. } => {
                1 + body.iter().map(Instruction::depth).max().unwrap_or(0)
            }
            _ => 0,
        }
    }
}

impl From<Action> for Instruction {
    fn from(action: Action) -> Self {
        match action {
            Action::Walk => Instruction::Walk,
            Action::Jump => Instruction::Jump,
            Action::Light => Instruction::ToggleLight,
            Action::TurnLeft => Instruction::TurnLeft,
            Action::TurnRight => Instruction::TurnRight,
        }
    }
}

/// An ordered instruction list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Decode the editor's JSON instruction list
    pub fn from_json(json: &str) -> Result<Self, ProgramError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ProgramError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Top-level instruction count
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Concrete actions a full run executes (loops unrolled)
    pub fn expanded_len(&self) -> u64 {
        self.instructions
            .iter()
            .fold(0u64, |acc, i| acc.saturating_add(i.expanded_len()))
    }

    /// Deepest repeat nesting
    pub fn depth(&self) -> usize {
        self.instructions
            .iter()
            .map(Instruction::depth)
            .max()
            .unwrap_or(0)
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self::new(instructions)
    }
}

impl FromIterator<Instruction> for Program {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
