//! Resumable program cursor
//!
//! Walks a program tree with an explicit frame stack instead of recursion,
//! so a run can pause between ticks, resume mid-loop, or be dropped at any
//! point. Frame `k` addresses the list owned by the repeat that frame `k - 1`
//! points at; frame 0 addresses the program itself.

use crate::program::{Action, Instruction, Program};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    /// Position inside this frame's instruction list
    index: usize,
    /// Passes over the list still to run, including the current one
    remaining: u32,
}

/// Position of the next action inside a program tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    frames: Vec<Frame>,
}

impl Cursor {
    /// Cursor at the start of `program`
    pub fn new(program: &Program) -> Self {
        let mut cursor = Self {
            frames: vec![Frame {
                index: 0,
                remaining: 1,
            }],
        };
        cursor.settle(program);
        cursor
    }

    /// No actions left
    pub fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }

    /// Current loop nesting depth (0 at top level)
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    /// The action the next call to `advance` returns
    pub fn peek(&self, program: &Program) -> Option<Action> {
        let frame = self.frames.last()?;
        self.list(program, self.frames.len() - 1)?
            .get(frame.index)
            .and_then(Instruction::action)
    }

    /// Take the next action and move past it
    pub fn advance(&mut self, program: &Program) -> Option<Action> {
        let action = self.peek(program)?;
        if let Some(frame) = self.frames.last_mut() {
            frame.index += 1;
        }
        self.settle(program);
        Some(action)
    }

    /// Instruction list addressed by frame `level`
    fn list<'p>(&self, program: &'p Program, level: usize) -> Option<&'p [Instruction]> {
        let mut list = program.instructions();
        for frame in &self.frames[..level] {
            match list.get(frame.index)? {
                Instruction::Repeat { body, .. } => list = body,
                _ => return None,
            }
        }
        Some(list)
    }

    /// Move forward until the top frame points at a concrete action, or
    /// the stack empties. Loops that expand to nothing are stepped over.
    fn settle(&mut self, program: &Program) {
        while let Some(&frame) = self.frames.last() {
            let level = self.frames.len() - 1;
            let Some(list) = self.list(program, level) else {
                self.frames.clear();
                return;
            };

            match list.get(frame.index) {
                None => {
                    if frame.remaining > 1 {
                        if let Some(top) = self.frames.last_mut() {
                            top.index = 0;
                            top.remaining -= 1;
                        }
                    } else {
                        self.frames.pop();
                        if let Some(parent) = self.frames.last_mut() {
                            parent.index += 1;
                        }
                    }
                }
                Some(Instruction::Repeat { count, body }) => {
                    if body.iter().all(|i| i.expanded_len() == 0) {
                        if let Some(top) = self.frames.last_mut() {
                            top.index += 1;
                        }
                    } else {
                        self.frames.push(Frame {
                            index: 0,
                            remaining: count.get(),
                        });
                    }
                }
                Some(_) => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;

    fn rep(n: u32, body: Vec<Instruction>) -> Instruction {
        Instruction::repeat(NonZeroU32::new(n).unwrap(), body)
    }

    fn drain(program: &Program) -> Vec<Action> {
        let mut cursor = Cursor::new(program);
        std::iter::from_fn(|| cursor.advance(program)).collect()
    }

    #[test]
    fn test_flat_program_in_order() {
        let program = Program::new(vec![Instruction::Walk, Instruction::TurnLeft, Instruction::ToggleLight]);
        assert_eq!(drain(&program), vec![Action::Walk, Action::TurnLeft, Action::Light]);
    }

    #[test]
    fn test_nested_repeat_unrolls() {
        let program = Program::new(vec![
            rep(2, vec![Instruction::Walk, rep(2, vec![Instruction::Jump])]),
            Instruction::ToggleLight,
        ]);
        use Action::*;
        assert_eq!(drain(&program), vec![Walk, Jump, Jump, Walk, Jump, Jump, Light]);
    }

    #[test]
    fn test_empty_loops_are_skipped() {
        let program = Program::new(vec![
            rep(u32::MAX, vec![]),
            rep(1_000_000, vec![rep(3, vec![])]),
            Instruction::Walk,
        ]);
        assert_eq!(drain(&program), vec![Action::Walk]);
    }

    #[test]
    fn test_empty_program_is_exhausted() {
        let program = Program::default();
        let cursor = Cursor::new(&program);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_resume_mid_loop() {
        let program = Program::new(vec![rep(3, vec![Instruction::Walk, Instruction::TurnRight])]);
        let mut cursor = Cursor::new(&program);
        cursor.advance(&program);
        cursor.advance(&program);
        cursor.advance(&program);
        assert_eq!(cursor.depth(), 1);

        // Pausing is just holding on to the cursor
        let resumed = cursor.clone();
        let mut rest = resumed;
        let tail: Vec<_> = std::iter::from_fn(|| rest.advance(&program)).collect();
        assert_eq!(tail, vec![Action::TurnRight, Action::Walk, Action::TurnRight]);
        assert!(rest.is_exhausted());
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let mut instruction = Instruction::Walk;
        for _ in 0..200 {
            instruction = rep(1, vec![instruction]);
        }
        let program = Program::new(vec![instruction, Instruction::Jump]);
        assert_eq!(drain(&program), vec![Action::Walk, Action::Jump]);
    }
}
