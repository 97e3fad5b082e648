#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that walks monsters along their routes.
//!
//! Every tick each monster is evaluated in a fixed order: pause, death,
//! arrival, waypoint snap, then a single-axis step toward the current
//! waypoint. Consecutive waypoints share an edge, so exactly one axis differs
//! between a monster and its target; anything else is a routing defect and is
//! reported as [`MovementError::NotAxisAligned`].

use grid_siege_core::{
    Command, Event, GridPoint, MonsterId, MonsterSnapshot, MonsterView, NodeCoord, RemovalCause,
    SimulationFlags,
};
use thiserror::Error;

/// Distance along each axis below which a monster snaps onto its waypoint.
pub const ARRIVAL_THRESHOLD: f32 = 0.1;

/// Speed multiplier applied while fast-forward is active.
pub const FAST_FORWARD_MULTIPLIER: f32 = 2.0;

/// Outcome of advancing a single monster by one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Advance {
    /// Nothing changes this tick.
    Hold,
    /// The monster moved or snapped onto a waypoint.
    Moved {
        /// Position after the tick.
        position: GridPoint,
        /// Waypoint cursor after the tick.
        cursor: usize,
    },
    /// The monster reached a terminal state and leaves play.
    Removed(RemovalCause),
}

/// Internal errors raised when a route contradicts the movement model.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum MovementError {
    /// The next waypoint differs from the monster position along both axes.
    #[error("monster {monster:?} at {position:?} cannot reach waypoint {target:?} along a single axis")]
    NotAxisAligned {
        /// Monster whose route is broken.
        monster: MonsterId,
        /// Position of the monster when the violation was detected.
        position: GridPoint,
        /// Waypoint the monster was heading to.
        target: NodeCoord,
    },
}

/// Advances one monster by a single tick.
///
/// Once the cursor rests on the final waypoint the monster is removed, so the
/// cursor never moves past the end of its route.
pub fn advance(
    monster: &MonsterSnapshot,
    flags: SimulationFlags,
) -> Result<Advance, MovementError> {
    if flags.paused {
        return Ok(Advance::Hold);
    }
    if monster.health.is_depleted() {
        return Ok(Advance::Removed(RemovalCause::Killed));
    }
    let Some(path) = monster.path.as_ref() else {
        return Ok(Advance::Hold);
    };
    if monster.cursor >= path.last_index() {
        return Ok(Advance::Removed(RemovalCause::Escaped));
    }

    let mut position = monster.position;
    let mut cursor = monster.cursor;
    let mut target = path.get(cursor).unwrap_or_else(|| path.last());

    let waypoint = target.to_grid_point();
    if (waypoint.row - position.row).abs() < ARRIVAL_THRESHOLD
        && (waypoint.column - position.column).abs() < ARRIVAL_THRESHOLD
    {
        position = waypoint;
        cursor += 1;
        target = path.get(cursor).unwrap_or_else(|| path.last());
    }

    let waypoint = target.to_grid_point();
    let row_delta = waypoint.row - position.row;
    let column_delta = waypoint.column - position.column;
    if row_delta != 0.0 && column_delta != 0.0 {
        return Err(MovementError::NotAxisAligned {
            monster: monster.id,
            position,
            target,
        });
    }

    let speed = if flags.fast_forward {
        monster.speed * FAST_FORWARD_MULTIPLIER
    } else {
        monster.speed
    };
    if row_delta != 0.0 {
        position.row += row_delta.signum() * speed.min(row_delta.abs());
    } else if column_delta != 0.0 {
        position.column += column_delta.signum() * speed.min(column_delta.abs());
    }

    Ok(Advance::Moved { position, cursor })
}

/// Pure system that reacts to clock events and emits movement commands.
#[derive(Debug, Default)]
pub struct Movement;

impl Movement {
    /// Consumes world events and the monster view to emit movement commands.
    ///
    /// Nothing is emitted unless the batch contains a [`Event::TimeAdvanced`].
    pub fn handle(
        &mut self,
        events: &[Event],
        flags: SimulationFlags,
        monsters: &MonsterView,
        out: &mut Vec<Command>,
    ) -> Result<(), MovementError> {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return Ok(());
        }

        for monster in monsters.iter() {
            match advance(monster, flags)? {
                Advance::Hold => {}
                Advance::Moved { position, cursor } => out.push(Command::MoveMonster {
                    monster: monster.id,
                    position,
                    cursor,
                }),
                Advance::Removed(cause) => {
                    tracing::debug!(monster = monster.id.get(), ?cause, "monster leaves play");
                    out.push(Command::RemoveMonster {
                        monster: monster.id,
                        cause,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_siege_core::{Health, Path, PixelPoint};

    fn walker(path: Path, speed: f32) -> MonsterSnapshot {
        MonsterSnapshot {
            id: MonsterId::new(0),
            position: path.first().to_grid_point(),
            screen: PixelPoint::default(),
            health: Health::new(10),
            max_health: Health::new(10),
            speed,
            path: Some(path),
            cursor: 0,
        }
    }

    fn apply(monster: &mut MonsterSnapshot, outcome: Advance) {
        if let Advance::Moved { position, cursor } = outcome {
            monster.position = position;
            monster.cursor = cursor;
        }
    }

    fn row_path(length: u32) -> Path {
        Path::new((0..length).map(|column| NodeCoord::new(0, column)).collect())
    }

    #[test]
    fn paused_monsters_hold_even_when_dead() {
        let mut monster = walker(row_path(3), 1.0);
        monster.health = Health::new(0);
        let flags = SimulationFlags {
            paused: true,
            fast_forward: false,
        };
        assert_eq!(advance(&monster, flags), Ok(Advance::Hold));
    }

    #[test]
    fn death_takes_precedence_over_arrival() {
        let mut monster = walker(row_path(2), 1.0);
        monster.cursor = 1;
        monster.health = Health::new(-3);
        assert_eq!(
            advance(&monster, SimulationFlags::default()),
            Ok(Advance::Removed(RemovalCause::Killed))
        );
    }

    #[test]
    fn idle_monsters_hold() {
        let mut monster = walker(row_path(2), 1.0);
        monster.path = None;
        assert_eq!(
            advance(&monster, SimulationFlags::default()),
            Ok(Advance::Hold)
        );
    }

    #[test]
    fn unit_speed_reaches_final_waypoint_after_len_minus_one_ticks() {
        let path = row_path(5);
        let mut monster = walker(path.clone(), 1.0);

        for _ in 0..path.len() - 1 {
            let outcome = advance(&monster, SimulationFlags::default()).expect("aligned route");
            apply(&mut monster, outcome);
        }

        assert_eq!(monster.cursor, path.last_index());
        assert_eq!(monster.position, path.last().to_grid_point());
        assert_eq!(monster.status(), grid_siege_core::MonsterStatus::Arrived);
        assert_eq!(
            advance(&monster, SimulationFlags::default()),
            Ok(Advance::Removed(RemovalCause::Escaped))
        );
    }

    #[test]
    fn arrival_is_idempotent() {
        let path = row_path(3);
        let mut monster = walker(path.clone(), 1.0);
        monster.cursor = path.last_index();
        monster.position = path.last().to_grid_point();

        for _ in 0..3 {
            let outcome = advance(&monster, SimulationFlags::default()).expect("aligned route");
            assert_eq!(outcome, Advance::Removed(RemovalCause::Escaped));
            apply(&mut monster, outcome);
            assert_eq!(monster.cursor, path.last_index());
            assert_eq!(monster.position, path.last().to_grid_point());
        }
    }

    #[test]
    fn fast_forward_doubles_the_step() {
        let monster = walker(row_path(4), 0.25);
        let normal = advance(&monster, SimulationFlags::default()).expect("aligned route");
        let fast = advance(
            &monster,
            SimulationFlags {
                paused: false,
                fast_forward: true,
            },
        )
        .expect("aligned route");

        assert_eq!(
            normal,
            Advance::Moved {
                position: GridPoint::new(0.0, 0.25),
                cursor: 1,
            }
        );
        assert_eq!(
            fast,
            Advance::Moved {
                position: GridPoint::new(0.0, 0.5),
                cursor: 1,
            }
        );
    }

    #[test]
    fn steps_never_overshoot_the_waypoint() {
        let monster = walker(row_path(2), 1.75);
        assert_eq!(
            advance(&monster, SimulationFlags::default()),
            Ok(Advance::Moved {
                position: GridPoint::new(0.0, 1.0),
                cursor: 1,
            })
        );
    }

    #[test]
    fn moves_along_rows_toward_lower_indices() {
        let path = Path::new(vec![NodeCoord::new(2, 0), NodeCoord::new(1, 0)]);
        let monster = walker(path, 0.5);
        assert_eq!(
            advance(&monster, SimulationFlags::default()),
            Ok(Advance::Moved {
                position: GridPoint::new(1.5, 0.0),
                cursor: 1,
            })
        );
    }

    #[test]
    fn diagonal_offsets_are_reported_as_errors() {
        let mut monster = walker(row_path(3), 0.5);
        monster.position = GridPoint::new(0.5, 0.5);

        let error = advance(&monster, SimulationFlags::default()).expect_err("diagonal offset");
        assert_eq!(
            error,
            MovementError::NotAxisAligned {
                monster: MonsterId::new(0),
                position: GridPoint::new(0.5, 0.5),
                target: NodeCoord::new(0, 0),
            }
        );
    }

    #[test]
    fn handle_ignores_batches_without_time_advance() {
        let view = MonsterView::from_snapshots(vec![walker(row_path(3), 1.0)]);
        let mut commands = Vec::new();
        Movement
            .handle(&[], SimulationFlags::default(), &view, &mut commands)
            .expect("no movement");
        assert!(commands.is_empty());
    }
}
