#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Grid Siege adapters.
//!
//! Scenes are plain data assembled from world snapshots. Backends only read
//! them; nothing in this crate can mutate the simulation.

use anyhow::Result as AnyResult;
use glam::Vec2;
use grid_siege_core::{
    BuildError, MonsterId, MonsterSnapshot, NodeCoord, NodeState, Resources, SoundCue,
    StructureId, StructureKind, StructureSnapshot,
};
use std::{error::Error, fmt};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Background used for open nodes.
pub const OPEN_COLOR: Color = Color::from_rgb_u8(25, 25, 25);

/// Color of the lines separating nodes.
pub const GRID_LINE_COLOR: Color = Color::from_rgb_u8(50, 50, 50);

/// Color each node state is drawn with.
#[must_use]
pub const fn node_color(state: NodeState) -> Color {
    match state {
        NodeState::Open => OPEN_COLOR,
        NodeState::Barrier => Color::from_rgb_u8(120, 120, 120),
        NodeState::Start => Color::from_rgb_u8(255, 165, 0),
        NodeState::End => Color::from_rgb_u8(64, 224, 208),
        NodeState::Visited => Color::from_rgb_u8(90, 40, 40),
        NodeState::OnPath => Color::from_rgb_u8(128, 0, 128),
    }
}

/// One node of the grid as it should be drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodePresentation {
    /// Node being drawn.
    pub cell: NodeCoord,
    /// State the color was derived from.
    pub state: NodeState,
    /// Fill color.
    pub color: Color,
}

/// Describes the node grid that adapters render.
#[derive(Clone, Debug, PartialEq)]
pub struct GridPresentation {
    /// Number of node rows.
    pub rows: u32,
    /// Number of node columns.
    pub columns: u32,
    /// Edge length of a node in pixels.
    pub cell_size: f32,
    /// Color used when drawing grid lines.
    pub line_color: Color,
    /// Nodes in row-major order.
    pub nodes: Vec<NodePresentation>,
}

impl GridPresentation {
    /// Creates a grid descriptor from row-major node states.
    ///
    /// Returns an error when `cell_size` is not positive or when the number
    /// of states does not match the dimensions.
    pub fn new<I>(
        rows: u32,
        columns: u32,
        cell_size: f32,
        states: I,
    ) -> std::result::Result<Self, RenderingError>
    where
        I: IntoIterator<Item = NodeState>,
    {
        if !(cell_size > 0.0) {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }

        let nodes: Vec<_> = states
            .into_iter()
            .enumerate()
            .map(|(index, state)| {
                let index = index as u32;
                NodePresentation {
                    cell: NodeCoord::new(index / columns.max(1), index % columns.max(1)),
                    state,
                    color: node_color(state),
                }
            })
            .collect();
        let expected = rows as usize * columns as usize;
        if nodes.len() != expected {
            return Err(RenderingError::NodeCountMismatch {
                expected,
                actual: nodes.len(),
            });
        }

        Ok(Self {
            rows,
            columns,
            cell_size,
            line_color: GRID_LINE_COLOR,
            nodes,
        })
    }

    /// Width of the grid in pixels.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    /// Height of the grid in pixels.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// Node drawn at the provided coordinate, if it exists.
    #[must_use]
    pub fn node(&self, cell: NodeCoord) -> Option<&NodePresentation> {
        if cell.row() >= self.rows || cell.column() >= self.columns {
            return None;
        }
        self.nodes
            .get(cell.row() as usize * self.columns as usize + cell.column() as usize)
    }

    /// Node containing the provided pixel position, if any.
    #[must_use]
    pub fn cell_at(&self, position: Vec2) -> Option<NodeCoord> {
        if position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        let column = (position.x / self.cell_size) as u32;
        let row = (position.y / self.cell_size) as u32;
        (row < self.rows && column < self.columns).then(|| NodeCoord::new(row, column))
    }
}

/// Monster drawn at its screen position with a health bar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonsterPresentation {
    /// Monster being drawn.
    pub id: MonsterId,
    /// Top-left corner in pixels.
    pub position: Vec2,
    /// Remaining health as a fraction of the maximum, clamped to 0.0..=1.0.
    pub health_fraction: f32,
}

impl MonsterPresentation {
    /// Derives the presentation from a monster snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &MonsterSnapshot) -> Self {
        let max = snapshot.max_health.get().max(1) as f32;
        Self {
            id: snapshot.id,
            position: Vec2::new(snapshot.screen.x, snapshot.screen.y),
            health_fraction: (snapshot.health.get() as f32 / max).clamp(0.0, 1.0),
        }
    }
}

/// Structure drawn with its range gizmo.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StructurePresentation {
    /// Structure being drawn.
    pub id: StructureId,
    /// Kind of structure.
    pub kind: StructureKind,
    /// Node the structure is anchored to.
    pub cell: NodeCoord,
    /// Top-left corner in pixels.
    pub position: Vec2,
    /// Current upgrade level.
    pub level: u32,
    /// Radius of the range gizmo in pixels.
    pub range_radius: f32,
    /// Whether the gizmo should be drawn in its engaged style.
    pub engaged: bool,
}

impl StructurePresentation {
    /// Derives the presentation from a structure snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &StructureSnapshot) -> Self {
        Self {
            id: snapshot.id,
            kind: snapshot.kind,
            cell: snapshot.cell,
            position: Vec2::new(snapshot.position.x, snapshot.position.y),
            level: snapshot.level,
            range_radius: snapshot.kind.range_radius_px() as f32,
            engaged: snapshot.target.is_some(),
        }
    }
}

/// Read-only status shown alongside the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HudPresentation {
    /// Current resource balance.
    pub resources: Resources,
    /// Whether the simulation is paused.
    pub paused: bool,
    /// Whether fast-forward is active.
    pub fast_forward: bool,
    /// Index of the latest tick.
    pub tick: u64,
    /// Outcome of the latest build or upgrade request.
    pub last_build: Option<Result<StructureId, BuildError>>,
}

/// Scene description combining the grid, its inhabitants and the HUD.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Node grid composing the play area.
    pub grid: GridPresentation,
    /// Monsters currently in play.
    pub monsters: Vec<MonsterPresentation>,
    /// Structures placed on the grid.
    pub structures: Vec<StructurePresentation>,
    /// Status shown alongside the grid.
    pub hud: HudPresentation,
}

/// Rendering backend capable of presenting Grid Siege scenes and sounds.
pub trait RenderingBackend {
    /// Draws a single frame.
    fn render_frame(&mut self, scene: &Scene) -> AnyResult<()>;

    /// Plays a sound cue requested by the simulation.
    fn play_sound(&mut self, cue: SoundCue) -> AnyResult<()>;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// The node edge length must be positive.
    InvalidCellSize {
        /// Provided cell size that failed validation.
        cell_size: f32,
    },
    /// The number of node states does not match the grid dimensions.
    NodeCountMismatch {
        /// Nodes implied by the dimensions.
        expected: usize,
        /// Node states supplied.
        actual: usize,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { cell_size } => {
                write!(f, "cell_size must be positive (received {cell_size})")
            }
            Self::NodeCountMismatch { expected, actual } => {
                write!(f, "expected {expected} node states, received {actual}")
            }
        }
    }
}

impl Error for RenderingError {}
