//! Execution engine
//!
//! Runs one action at a time against the world. An action may only start
//! once the previous action's animation has fully played, so exactly one
//! instruction is ever in flight regardless of tick rate or speed.

use glam::IVec3;
use serde::{Deserialize, Serialize};

use super::cursor::Cursor;
use super::world::{Turn, World};
use crate::consts::*;
use crate::program::{Action, Program};

/// Engine mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// No active run; the program may be edited
    #[default]
    Idle,
    /// Advancing one action per completed animation
    Running,
}

/// Playback speed. Never changes what a program does, only how fast it plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Speed {
    #[default]
    X1,
    X2,
    X3,
}

impl Speed {
    pub fn multiplier(&self) -> f32 {
        match self {
            Speed::X1 => 1.0,
            Speed::X2 => 2.0,
            Speed::X3 => 3.0,
        }
    }

    /// Speed button order: x1 → x2 → x3 → x1
    pub fn next(&self) -> Self {
        match self {
            Speed::X1 => Speed::X2,
            Speed::X2 => Speed::X3,
            Speed::X3 => Speed::X1,
        }
    }

    pub fn from_multiplier(multiplier: f32) -> Option<Self> {
        match multiplier {
            m if m == 1.0 => Some(Speed::X1),
            m if m == 2.0 => Some(Speed::X2),
            m if m == 3.0 => Some(Speed::X3),
            _ => None,
        }
    }
}

/// Visual effect of one executed action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationName {
    Walk,
    JumpUp,
    JumpDown,
    Light,
    TurnLeft,
    TurnRight,
    /// A move that could not happen; the robot stays put
    Blocked,
}

impl AnimationName {
    pub fn duration_ticks(&self) -> u32 {
        match self {
            AnimationName::Walk => WALK_TICKS,
            AnimationName::JumpUp | AnimationName::JumpDown => JUMP_TICKS,
            AnimationName::Light => LIGHT_TICKS,
            AnimationName::TurnLeft | AnimationName::TurnRight => TURN_TICKS,
            AnimationName::Blocked => BLOCKED_TICKS,
        }
    }

    pub fn is_jump(&self) -> bool {
        matches!(self, AnimationName::JumpUp | AnimationName::JumpDown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationName::Walk => "walk",
            AnimationName::JumpUp => "jumpUp",
            AnimationName::JumpDown => "jumpDown",
            AnimationName::Light => "light",
            AnimationName::TurnLeft => "turnLeft",
            AnimationName::TurnRight => "turnRight",
            AnimationName::Blocked => "blocked",
        }
    }
}

/// What the renderer needs to animate one action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationDescriptor {
    pub name: AnimationName,
    pub duration_ticks: u32,
    /// Grid step taken: `x`, `y` (row) and `z` (height change)
    pub delta: IVec3,
}

impl AnimationDescriptor {
    pub fn new(name: AnimationName, delta: IVec3) -> Self {
        Self {
            name,
            duration_ticks: name.duration_ticks(),
            delta,
        }
    }

    pub fn still(name: AnimationName) -> Self {
        Self::new(name, IVec3::ZERO)
    }

    /// The robot changes cell during this animation
    pub fn moves(&self) -> bool {
        self.delta.x != 0 || self.delta.y != 0
    }
}

/// Read-only engine state handed to the renderer each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionSnapshot {
    pub mode: Mode,
    pub animation: Option<AnimationDescriptor>,
    /// Fraction of the current animation played, in [0, 1]
    pub progress: f32,
}

/// Something the engine did during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    /// An action was dispatched
    Started {
        action: Action,
        animation: AnimationDescriptor,
    },
    /// Every lamp is lit; the run ended
    Solved { executed: u32 },
    /// The program ran out without solving the map
    Finished { executed: u32 },
}

/// Step-synchronized interpreter
#[derive(Debug, Clone, Default)]
pub struct Engine {
    mode: Mode,
    program: Option<Program>,
    cursor: Option<Cursor>,
    animation: Option<AnimationDescriptor>,
    /// Ticks of the current animation played, scaled by speed
    elapsed: f32,
    speed: Speed,
    executed: u32,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.mode == Mode::Running
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    /// Takes effect from the next tick
    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
    }

    /// Speed button: x1 → x2 → x3 → x1
    pub fn cycle_speed(&mut self) -> Speed {
        self.speed = self.speed.next();
        self.speed
    }

    /// Concrete actions executed in the current run
    pub fn executed_count(&self) -> u32 {
        self.executed
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Fraction of the current animation played
    pub fn progress(&self) -> f32 {
        match self.animation {
            Some(anim) if anim.duration_ticks > 0 => {
                (self.elapsed / anim.duration_ticks as f32).min(1.0)
            }
            _ => 1.0,
        }
    }

    /// The previous action's animation has finished
    pub fn is_ready_for_next(&self) -> bool {
        self.progress() >= 1.0
    }

    /// The cursor still has actions to run
    pub fn has_next(&self) -> bool {
        self.cursor.as_ref().is_some_and(|c| !c.is_exhausted())
    }

    pub fn snapshot(&self) -> ExecutionSnapshot {
        ExecutionSnapshot {
            mode: self.mode,
            animation: self.animation,
            progress: self.progress(),
        }
    }

    /// Store a program and rewind the cursor. Ignored while running.
    pub fn queue(&mut self, program: Program) {
        if self.is_running() {
            log::debug!("queue ignored: engine is running");
            return;
        }
        self.rewind(&program);
        self.program = Some(program);
    }

    /// Start running the queued program. Ignored if already running or
    /// nothing is queued.
    pub fn execute(&mut self) {
        if self.is_running() {
            log::debug!("execute ignored: engine is already running");
            return;
        }
        let Some(program) = self.program.take() else {
            log::debug!("execute ignored: no program queued");
            return;
        };
        if self.cursor.is_none() {
            self.rewind(&program);
        }
        log::info!(
            "Running program: {} instructions, {} expanded",
            program.len(),
            program.expanded_len()
        );
        self.program = Some(program);
        self.mode = Mode::Running;
    }

    /// Fresh cursor and a zeroed run
    fn rewind(&mut self, program: &Program) {
        self.cursor = Some(Cursor::new(program));
        self.animation = None;
        self.elapsed = 0.0;
        self.executed = 0;
    }

    /// Abort any run and put the world back to its loaded state
    pub fn reset(&mut self, world: &mut World) {
        world.reset();
        self.mode = Mode::Idle;
        self.cursor = None;
        self.animation = None;
        self.elapsed = 0.0;
        self.executed = 0;
    }

    /// Stop button: same as [`Engine::reset`]
    pub fn stop(&mut self, world: &mut World) {
        if self.is_running() {
            log::info!("Run stopped after {} instructions", self.executed);
        }
        self.reset(world);
    }

    /// Advance one tick: dispatch the next action if the gate is open,
    /// then play the current animation forward.
    pub fn tick(&mut self, world: &mut World) -> Vec<EngineEvent> {
        let mut events = Vec::new();

        if self.is_running() && self.is_ready_for_next() {
            let next = match (self.cursor.as_mut(), self.program.as_ref()) {
                (Some(cursor), Some(program)) => cursor.advance(program),
                _ => None,
            };

            match next {
                Some(action) => {
                    let animation = dispatch(action, world);
                    self.animation = Some(animation);
                    self.elapsed = 0.0;
                    self.executed += 1;
                    events.push(EngineEvent::Started { action, animation });

                    if world.is_solved() {
                        log::info!("Map solved after {} instructions", self.executed);
                        self.mode = Mode::Idle;
                        self.cursor = None;
                        events.push(EngineEvent::Solved {
                            executed: self.executed,
                        });
                    }
                }
                None => {
                    log::info!("Program finished after {} instructions", self.executed);
                    self.mode = Mode::Idle;
                    self.cursor = None;
                    events.push(EngineEvent::Finished {
                        executed: self.executed,
                    });
                }
            }
        }

        if self.animation.is_some() && !self.is_ready_for_next() {
            self.elapsed += self.speed.multiplier();
        }

        events
    }
}

/// Apply one action to the world and describe how it looks
fn dispatch(action: Action, world: &mut World) -> AnimationDescriptor {
    let pose = world.pose();
    match action {
        Action::Walk => {
            if world.can_walk_forward(&pose) {
                step_forward(world, AnimationName::Walk)
            } else {
                log::debug!("walk blocked at {:?}", pose.position);
                AnimationDescriptor::still(AnimationName::Blocked)
            }
        }
        Action::Jump => match world.forward_delta(&pose) {
            Some(dh) if world.can_jump_forward(&pose) => {
                let name = if dh < 0 {
                    AnimationName::JumpDown
                } else {
                    AnimationName::JumpUp
                };
                step_forward(world, name)
            }
            _ => {
                log::debug!("jump blocked at {:?}", pose.position);
                AnimationDescriptor::still(AnimationName::Blocked)
            }
        },
        Action::Light => {
            world.toggle_light_at(&pose);
            AnimationDescriptor::still(AnimationName::Light)
        }
        Action::TurnLeft => {
            world.turn(Turn::Left);
            AnimationDescriptor::still(AnimationName::TurnLeft)
        }
        Action::TurnRight => {
            world.turn(Turn::Right);
            AnimationDescriptor::still(AnimationName::TurnRight)
        }
    }
}

fn step_forward(world: &mut World, name: AnimationName) -> AnimationDescriptor {
    let pose = world.pose();
    let step = pose.direction.forward();
    let dh = world.forward_delta(&pose).unwrap_or(0);
    world.move_robot_to(pose.forward_cell());
    AnimationDescriptor::new(name, IVec3::new(step.x, step.y, dh))
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use glam::IVec2;

    use super::*;
    use crate::program::Instruction;
    use crate::sim::world::tests::level;

    fn rep(n: u32, body: Vec<Instruction>) -> Instruction {
        Instruction::repeat(NonZeroU32::new(n).unwrap(), body)
    }

    fn corridor(len: usize) -> World {
        let row: Vec<(u32, bool)> = (0..len).map(|i| (1, i + 1 == len)).collect();
        World::load(&level(&[row.as_slice()], (0, 0), 1)).unwrap()
    }

    /// Tick until the engine goes idle, collecting events
    fn run(engine: &mut Engine, world: &mut World) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        for _ in 0..10_000 {
            events.extend(engine.tick(world));
            if !engine.is_running() {
                break;
            }
        }
        events
    }

    #[test]
    fn test_repeat_walk_corridor() {
        let mut world = corridor(4);
        let mut engine = Engine::new();
        engine.queue(Program::new(vec![rep(3, vec![Instruction::Walk])]));
        engine.execute();
        let events = run(&mut engine, &mut world);

        assert_eq!(world.pose().position, IVec2::new(3, 0));
        assert_eq!(engine.executed_count(), 3);
        assert!(matches!(events.last(), Some(EngineEvent::Finished { executed: 3 })));
    }

    #[test]
    fn test_execute_again_starts_a_new_count() {
        let mut world = corridor(6);
        let mut engine = Engine::new();
        engine.queue(Program::new(vec![Instruction::Walk, Instruction::Walk]));
        engine.execute();
        run(&mut engine, &mut world);
        assert_eq!(engine.executed_count(), 2);

        // Second run continues from where the robot stands
        engine.execute();
        assert_eq!(engine.executed_count(), 0);
        assert_eq!(engine.snapshot().animation, None);
        let events = run(&mut engine, &mut world);
        assert_eq!(engine.executed_count(), 2);
        assert!(matches!(events.last(), Some(EngineEvent::Finished { executed: 2 })));
        assert_eq!(world.pose().position, IVec2::new(4, 0));
    }

    #[test]
    fn test_queue_clears_previous_count() {
        let mut world = corridor(4);
        let mut engine = Engine::new();
        engine.queue(Program::new(vec![Instruction::Walk]));
        engine.execute();
        run(&mut engine, &mut world);
        assert_eq!(engine.executed_count(), 1);

        engine.queue(Program::new(vec![Instruction::TurnLeft]));
        assert_eq!(engine.executed_count(), 0);
        assert_eq!(engine.progress(), 1.0);
    }

    #[test]
    fn test_two_by_two_scenario_solves() {
        // Lamp at (1, 1); the robot starts beside it facing it
        let data = level(&[&[(1, false), (1, false)], &[(1, false), (1, true)]], (0, 1), 1);
        let mut world = World::load(&data).unwrap();
        let mut engine = Engine::new();
        engine.queue(Program::new(vec![
            Instruction::Walk,
            Instruction::Walk,
            Instruction::ToggleLight,
        ]));
        engine.execute();
        let events = run(&mut engine, &mut world);

        assert!(world.is_solved());
        assert_eq!(engine.executed_count(), 3);
        assert!(events.iter().any(|e| matches!(e, EngineEvent::Solved { executed: 3 })));
        assert_eq!(engine.mode(), Mode::Idle);
    }

    #[test]
    fn test_one_action_in_flight_per_animation() {
        let mut world = corridor(4);
        let mut engine = Engine::new();
        engine.queue(Program::new(vec![Instruction::Walk, Instruction::Walk]));
        engine.execute();

        let first = engine.tick(&mut world);
        assert_eq!(first.len(), 1);
        // Remaining ticks of the walk start nothing
        for _ in 1..WALK_TICKS {
            assert!(engine.tick(&mut world).is_empty());
        }
        let second = engine.tick(&mut world);
        assert!(matches!(second[0], EngineEvent::Started { action: Action::Walk, .. }));
    }

    #[test]
    fn test_speed_scales_time_not_outcome() {
        let program = Program::new(vec![rep(2, vec![Instruction::Walk, Instruction::TurnLeft, Instruction::TurnLeft]), Instruction::Jump]);

        let mut ticks = Vec::new();
        let mut poses = Vec::new();
        for speed in [Speed::X1, Speed::X2, Speed::X3] {
            let mut world = corridor(4);
            let mut engine = Engine::new();
            engine.set_speed(speed);
            engine.queue(program.clone());
            engine.execute();
            let mut n = 0;
            while engine.is_running() {
                engine.tick(&mut world);
                n += 1;
            }
            ticks.push(n);
            poses.push((world.pose(), engine.executed_count()));
        }
        assert!(ticks[0] > ticks[1] && ticks[1] > ticks[2]);
        assert!(poses.iter().all(|p| *p == poses[0]));
    }

    #[test]
    fn test_blocked_walk_does_not_move() {
        let data = level(&[&[(1, false), (3, true)]], (0, 0), 1);
        let mut world = World::load(&data).unwrap();
        let before = world.pose();
        let mut engine = Engine::new();
        engine.queue(Program::new(vec![Instruction::Walk]));
        engine.execute();
        let events = engine.tick(&mut world);

        assert_eq!(world.pose(), before);
        match events[0] {
            EngineEvent::Started { animation, .. } => {
                assert_eq!(animation.name, AnimationName::Blocked);
                assert!(!animation.moves());
            }
            _ => panic!("expected a started event"),
        }
    }

    #[test]
    fn test_jump_animation_by_height_sign() {
        let data = level(&[&[(1, false), (3, false), (0, false), (2, true)]], (0, 0), 1);
        let mut world = World::load(&data).unwrap();
        let mut engine = Engine::new();
        engine.queue(Program::new(vec![rep(3, vec![Instruction::Jump])]));
        engine.execute();
        let names: Vec<_> = run(&mut engine, &mut world)
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::Started { animation, .. } => Some((animation.name, animation.delta.z)),
                _ => None,
            })
            .collect();
        assert_eq!(
            names,
            vec![
                (AnimationName::JumpUp, 2),
                (AnimationName::JumpDown, -3),
                (AnimationName::JumpUp, 2)
            ]
        );
        assert_eq!(world.pose().position, IVec2::new(3, 0));
    }

    #[test]
    fn test_misuse_is_ignored() {
        let mut world = corridor(3);
        let mut engine = Engine::new();
        engine.execute();
        assert_eq!(engine.mode(), Mode::Idle);

        engine.queue(Program::new(vec![Instruction::Walk, Instruction::Walk]));
        engine.execute();
        engine.tick(&mut world);
        engine.queue(Program::new(vec![Instruction::TurnLeft]));
        engine.execute();
        run(&mut engine, &mut world);
        assert_eq!(world.pose().position, IVec2::new(2, 0));
    }

    #[test]
    fn test_reset_mid_loop_restores_world() {
        let data = level(&[&[(1, true), (1, true), (1, false)]], (0, 0), 1);
        let mut world = World::load(&data).unwrap();
        let loaded = world.clone();
        let mut engine = Engine::new();
        engine.queue(Program::new(vec![rep(5, vec![Instruction::ToggleLight, Instruction::Walk])]));
        engine.execute();
        for _ in 0..40 {
            engine.tick(&mut world);
        }
        assert_ne!(world, loaded);

        engine.reset(&mut world);
        assert_eq!(world, loaded);
        assert_eq!(engine.executed_count(), 0);
        assert_eq!(engine.snapshot().animation, None);
        assert!(!engine.has_next());

        // The stored program replays from the start
        engine.execute();
        assert!(engine.has_next());
    }

    #[test]
    fn test_speed_cycle() {
        assert_eq!(Speed::X1.next(), Speed::X2);
        assert_eq!(Speed::X3.next(), Speed::X1);
        assert_eq!(Speed::from_multiplier(2.0), Some(Speed::X2));
        assert_eq!(Speed::from_multiplier(1.5), None);
    }
}
