#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that lets engaged structures damage their targets.

use grid_siege_core::{Command, Event, MonsterView, SimulationFlags, StructureView};

/// Combat system that queues damage commands for ready structures.
#[derive(Debug, Default)]
pub struct Combat {
    scratch: Vec<Command>,
}

impl Combat {
    /// Creates a new combat system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::DamageMonster` for every ready structure with a live target.
    ///
    /// Targets are re-validated against the monster view so a structure never
    /// fires at a monster that already left play.
    pub fn handle(
        &mut self,
        events: &[Event],
        flags: SimulationFlags,
        structures: &StructureView,
        monsters: &MonsterView,
        out: &mut Vec<Command>,
    ) {
        if flags.paused
            || !events
                .iter()
                .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        self.scratch.clear();
        for structure in structures.iter() {
            if structure.ready_in > 0 {
                continue;
            }
            let Some(target) = structure.target else {
                continue;
            };
            if !monsters
                .get(target)
                .is_some_and(|monster| monster.is_alive())
            {
                continue;
            }

            self.scratch.push(Command::DamageMonster {
                monster: target,
                structure: structure.id,
                amount: structure.kind.damage(structure.level),
            });
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
