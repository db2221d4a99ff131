//! Fixed timestep session tick
//!
//! One call per 30 Hz tick: apply input, advance the engine, score a solve.

use super::engine::{AnimationName, EngineEvent};
use super::state::{GameEvent, Session};
use crate::program::Program;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Program from the editor, queued while idle
    pub program: Option<Program>,
    /// Run button: start from the spawn, or stop a run in progress
    pub run: bool,
    /// Stop and reset without starting
    pub stop: bool,
    /// Speed button (x1 → x2 → x3 → x1)
    pub cycle_speed: bool,
    pub rotate_left: bool,
    pub rotate_right: bool,
}

/// Advance the session by one tick
pub fn tick(session: &mut Session, input: &TickInput) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if input.rotate_left {
        session.camera.rotate_left();
    }
    if input.rotate_right {
        session.camera.rotate_right();
    }
    if input.cycle_speed {
        let speed = session.engine.cycle_speed();
        log::debug!("Speed x{}", speed.multiplier());
    }

    if input.stop {
        session.engine.stop(&mut session.world);
    }
    if let Some(program) = &input.program {
        session.engine.queue(program.clone());
    }
    if input.run {
        if session.engine.is_running() {
            session.engine.stop(&mut session.world);
        } else {
            session.engine.reset(&mut session.world);
            session.set_last_medal(None);
            session.engine.execute();
        }
    }

    for event in session.engine.tick(&mut session.world) {
        match event {
            EngineEvent::Started { action, animation } => {
                events.push(GameEvent::InstructionStarted { action, animation });
                if animation.name == AnimationName::Blocked {
                    events.push(GameEvent::Blocked { action });
                }
            }
            EngineEvent::Solved { executed } => {
                let medal = session.level.medals.award(executed);
                session.book.record(&session.level.id, medal, executed);
                session.set_last_medal(Some(medal));
                events.push(GameEvent::MapSolved { executed, medal });
            }
            EngineEvent::Finished { executed } => {
                events.push(GameEvent::ProgramFinished { executed });
            }
        }
    }

    events.push(GameEvent::Tick);
    events
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use proptest::prelude::*;

    use super::*;
    use crate::medals::{Medal, MedalThresholds};
    use crate::program::{Action, Instruction};
    use crate::sim::engine::{Mode, Speed};
    use crate::sim::world::tests::level;

    fn session() -> Session {
        let mut data = level(&[&[(1, false), (1, false), (1, true)]], (0, 0), 1);
        data.medals = MedalThresholds::new(3, 4, 5);
        Session::new("1", &data).unwrap()
    }

    fn walk_walk_light() -> Program {
        Program::new(vec![Instruction::Walk, Instruction::Walk, Instruction::ToggleLight])
    }

    fn run_to_idle(session: &mut Session) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..1_000_000 {
            events.extend(tick(session, &TickInput::default()));
            if !session.engine.is_running() {
                break;
            }
        }
        events
    }

    #[test]
    fn test_tick_run_solves_and_awards_gold() {
        let mut session = session();
        let input = TickInput {
            program: Some(walk_walk_light()),
            run: true,
            ..Default::default()
        };
        let mut events = tick(&mut session, &input);
        events.extend(run_to_idle(&mut session));

        assert!(events.contains(&GameEvent::MapSolved {
            executed: 3,
            medal: Medal::Gold
        }));
        assert_eq!(session.current_medal(), Some(Medal::Gold));
        assert_eq!(session.book.best("1"), Medal::Gold);
        assert_eq!(session.engine.mode(), Mode::Idle);
    }

    #[test]
    fn test_failed_rerun_clears_medal_but_keeps_best() {
        let mut session = session();
        let solve = TickInput {
            program: Some(walk_walk_light()),
            run: true,
            ..Default::default()
        };
        tick(&mut session, &solve);
        run_to_idle(&mut session);
        assert_eq!(session.current_medal(), Some(Medal::Gold));

        let fail = TickInput {
            program: Some(Program::new(vec![Instruction::Walk, Instruction::ToggleLight])),
            run: true,
            ..Default::default()
        };
        let mut events = tick(&mut session, &fail);
        assert_eq!(session.current_medal(), None);
        events.extend(run_to_idle(&mut session));

        assert!(events.contains(&GameEvent::ProgramFinished { executed: 2 }));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::MapSolved { .. })));
        assert_eq!(session.current_medal(), None);
        assert_eq!(session.executed_count(), 2);
        assert_eq!(session.book.best("1"), Medal::Gold);
    }

    #[test]
    fn test_tick_padded_program_earns_lower_medal() {
        let mut session = session();
        let program = Program::new(vec![
            Instruction::TurnLeft,
            Instruction::TurnRight,
            Instruction::Walk,
            Instruction::Walk,
            Instruction::ToggleLight,
        ]);
        tick(
            &mut session,
            &TickInput {
                program: Some(program),
                run: true,
                ..Default::default()
            },
        );
        let events = run_to_idle(&mut session);
        assert!(events.contains(&GameEvent::MapSolved {
            executed: 5,
            medal: Medal::Bronze
        }));
    }

    #[test]
    fn test_tick_run_toggle_stops() {
        let mut session = session();
        let start = TickInput {
            program: Some(walk_walk_light()),
            run: true,
            ..Default::default()
        };
        tick(&mut session, &start);
        for _ in 0..20 {
            tick(&mut session, &TickInput::default());
        }
        assert!(session.engine.is_running());

        let toggle = TickInput {
            run: true,
            ..Default::default()
        };
        tick(&mut session, &toggle);
        assert_eq!(session.engine.mode(), Mode::Idle);
        assert_eq!(session.world.pose(), session.world.spawn());
        assert_eq!(session.executed_count(), 0);

        // Running again replays the stored program from the spawn
        tick(&mut session, &toggle);
        assert!(session.engine.is_running());
        let events = run_to_idle(&mut session);
        assert!(events.iter().any(|e| matches!(e, GameEvent::MapSolved { .. })));
    }

    #[test]
    fn test_tick_reports_blocked_moves() {
        let mut session = session();
        let program = Program::new(vec![Instruction::TurnRight, Instruction::Walk]);
        tick(
            &mut session,
            &TickInput {
                program: Some(program),
                run: true,
                ..Default::default()
            },
        );
        let events = run_to_idle(&mut session);
        assert!(events.contains(&GameEvent::Blocked {
            action: Action::Walk
        }));
        assert!(events.contains(&GameEvent::ProgramFinished { executed: 2 }));
    }

    #[test]
    fn test_tick_speed_and_camera_input() {
        let mut session = session();
        let input = TickInput {
            cycle_speed: true,
            rotate_left: true,
            ..Default::default()
        };
        let events = tick(&mut session, &input);
        assert_eq!(events, vec![GameEvent::Tick]);
        assert_eq!(session.speed(), Speed::X2);
        assert_eq!(session.camera.rotation(), 3);
    }

    fn instruction(with_light: bool) -> impl Strategy<Value = Instruction> {
        let light = if with_light {
            Instruction::ToggleLight
        } else {
            Instruction::TurnLeft
        };
        let leaf = prop_oneof![
            Just(Instruction::Walk),
            Just(Instruction::Jump),
            Just(light),
            Just(Instruction::TurnLeft),
            Just(Instruction::TurnRight),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            (1u32..4, prop::collection::vec(inner, 0..3)).prop_map(|(n, body)| {
                Instruction::repeat(NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN), body)
            })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_executed_count_is_expanded_length(
            body in prop::collection::vec(instruction(false), 0..6),
            speed in 0usize..3,
        ) {
            // Without lights the map never solves, so every action runs
            let data = level(
                &[&[(1, false), (2, false), (1, false)], &[(0, false), (3, false), (1, true)]],
                (1, 0),
                0,
            );
            let mut session = Session::new("p", &data).unwrap();
            session.engine.set_speed([Speed::X1, Speed::X2, Speed::X3][speed]);
            let program = Program::new(body);
            let expected = program.expanded_len();
            tick(&mut session, &TickInput { program: Some(program), run: true, ..Default::default() });
            run_to_idle(&mut session);
            prop_assert_eq!(session.executed_count() as u64, expected);
        }

        #[test]
        fn prop_reset_restores_world(
            body in prop::collection::vec(instruction(true), 0..6),
            ticks in 0usize..200,
        ) {
            let mut session = session();
            let loaded = session.world.clone();
            tick(&mut session, &TickInput { program: Some(Program::new(body)), run: true, ..Default::default() });
            for _ in 0..ticks {
                tick(&mut session, &TickInput::default());
            }
            tick(&mut session, &TickInput { stop: true, ..Default::default() });
            prop_assert_eq!(&session.world, &loaded);
            prop_assert_eq!(session.executed_count(), 0);
        }
    }
}
