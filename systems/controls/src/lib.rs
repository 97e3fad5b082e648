#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that translates player actions into world commands.
//!
//! Adapters never build commands themselves; they report what the player did
//! as a [`PlayerAction`] and this system maps every variant exhaustively.

use grid_siege_core::{Command, NodeCoord, SimulationFlags, StructureId, StructureKind};
use serde::{Deserialize, Serialize};

/// Discrete actions a player can take through any input surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayerAction {
    /// Flips a node between open and barrier.
    ToggleBarrier {
        /// Node to edit.
        cell: NodeCoord,
    },
    /// Moves the start role to a node.
    SetStart {
        /// Node that becomes the start.
        cell: NodeCoord,
    },
    /// Moves the end role to a node.
    SetEnd {
        /// Node that becomes the end.
        cell: NodeCoord,
    },
    /// Clears a node back to open.
    Reset {
        /// Node to reset.
        cell: NodeCoord,
    },
    /// Constructs a structure on a node.
    Build {
        /// Structure to construct.
        kind: StructureKind,
        /// Node to build on.
        cell: NodeCoord,
    },
    /// Upgrades the structure standing on a node.
    Upgrade {
        /// Node holding the structure.
        cell: NodeCoord,
    },
    /// Starts a round.
    StartRound,
    /// Flips the pause flag.
    TogglePause,
    /// Flips the fast-forward flag.
    ToggleFastForward,
}

/// Controls system that turns player actions into commands.
#[derive(Debug, Default, Clone)]
pub struct Controls;

impl Controls {
    /// Creates a new controls system.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Emits the commands matching `actions` in order.
    ///
    /// `structure_at` mirrors a lookup of the structure anchored on a node so
    /// upgrades can be addressed by node. Toggles within one batch compound.
    pub fn handle<F>(
        &mut self,
        actions: &[PlayerAction],
        flags: SimulationFlags,
        mut structure_at: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(NodeCoord) -> Option<StructureId>,
    {
        let mut flags = flags;
        for action in actions {
            let command = match *action {
                PlayerAction::ToggleBarrier { cell } => Command::ToggleBarrier { cell },
                PlayerAction::SetStart { cell } => Command::SetStart { cell },
                PlayerAction::SetEnd { cell } => Command::SetEnd { cell },
                PlayerAction::Reset { cell } => Command::ResetNode { cell },
                PlayerAction::Build { kind, cell } => Command::PlaceStructure { kind, cell },
                PlayerAction::Upgrade { cell } => match structure_at(cell) {
                    Some(structure) => Command::UpgradeStructure { structure },
                    None => continue,
                },
                PlayerAction::StartRound => Command::BeginRound,
                PlayerAction::TogglePause => {
                    flags.paused = !flags.paused;
                    Command::SetPaused {
                        paused: flags.paused,
                    }
                }
                PlayerAction::ToggleFastForward => {
                    flags.fast_forward = !flags.fast_forward;
                    Command::SetFastForward {
                        enabled: flags.fast_forward,
                    }
                }
            };
            out.push(command);
        }
    }
}
