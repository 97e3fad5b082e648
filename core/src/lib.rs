#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Siege engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Grid Siege.";

/// Highest level a structure can be upgraded to.
pub const MAX_STRUCTURE_LEVEL: u32 = 3;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the grid with a fresh one of the provided dimensions.
    ConfigureGrid {
        /// Number of node rows.
        rows: u32,
        /// Number of node columns.
        columns: u32,
        /// Edge length of a single node measured in pixels.
        cell_size: f32,
    },
    /// Replaces the grid with the already-parsed level layout.
    LoadLevel {
        /// Level description supplied by the level loader.
        layout: LevelLayout,
    },
    /// Flips a node between `Open` and `Barrier`.
    ToggleBarrier {
        /// Node to edit.
        cell: NodeCoord,
    },
    /// Moves the start role to the provided node.
    SetStart {
        /// Node that becomes the route start.
        cell: NodeCoord,
    },
    /// Moves the end role to the provided node.
    SetEnd {
        /// Node that becomes the route end.
        cell: NodeCoord,
    },
    /// Returns a node to the `Open` state.
    ResetNode {
        /// Node to reset.
        cell: NodeCoord,
    },
    /// Freezes or resumes agent movement and detection.
    SetPaused {
        /// Whether the simulation should be paused.
        paused: bool,
    },
    /// Enables or disables the fast-forward movement modifier.
    SetFastForward {
        /// Whether fast-forward should be active.
        enabled: bool,
    },
    /// Requests a new round: neighbors are refreshed and a route is requested.
    BeginRound,
    /// Hands the outcome of a path search to the world.
    AssignRoute {
        /// Route produced by the search, or `None` when no path exists.
        route: Option<Path>,
        /// Nodes finalized by the search, used for visualization only.
        visited: Vec<NodeCoord>,
    },
    /// Spawns a monster at the first waypoint of the active route.
    SpawnMonster {
        /// Starting and maximum health of the monster.
        health: Health,
        /// Movement speed expressed in grid units per tick.
        speed: f32,
    },
    /// Commits a movement step computed by the movement system.
    MoveMonster {
        /// Monster that moved.
        monster: MonsterId,
        /// Position after the step, in grid units.
        position: GridPoint,
        /// Waypoint cursor after the step.
        cursor: usize,
    },
    /// Removes a monster from play.
    RemoveMonster {
        /// Monster to remove.
        monster: MonsterId,
        /// Why the monster left play.
        cause: RemovalCause,
    },
    /// Applies damage dealt by a structure.
    DamageMonster {
        /// Monster that was hit.
        monster: MonsterId,
        /// Structure that fired.
        structure: StructureId,
        /// Damage to subtract from the monster's health.
        amount: i32,
    },
    /// Records the engagement result for a structure this tick.
    EngageTarget {
        /// Structure whose target is being set.
        structure: StructureId,
        /// Monster currently overlapping the structure's range, if any.
        target: Option<MonsterId>,
    },
    /// Requests construction of a structure at the provided node.
    PlaceStructure {
        /// Type of structure to construct.
        kind: StructureKind,
        /// Node the structure is anchored to.
        cell: NodeCoord,
    },
    /// Requests an upgrade of an existing structure.
    UpgradeStructure {
        /// Structure to upgrade.
        structure: StructureId,
    },
    /// Advances the simulation by one discrete tick.
    Tick,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a new grid replaced the previous one.
    GridConfigured {
        /// Number of node rows.
        rows: u32,
        /// Number of node columns.
        columns: u32,
        /// Edge length of a node in pixels.
        cell_size: f32,
    },
    /// Reports a node state change.
    NodeChanged {
        /// Node that changed.
        cell: NodeCoord,
        /// State after the change.
        state: NodeState,
    },
    /// Reports that a grid edit was refused.
    GridEditRejected {
        /// Node targeted by the edit.
        cell: NodeCoord,
        /// Reason the edit was refused.
        reason: GridEditError,
    },
    /// Announces that the pause flag changed.
    PauseChanged {
        /// Whether the simulation is now paused.
        paused: bool,
    },
    /// Announces that the fast-forward flag changed.
    FastForwardChanged {
        /// Whether fast-forward is now active.
        enabled: bool,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Index of the tick that just elapsed.
        tick: u64,
    },
    /// Asks the pathfinding system for a route between the two role holders.
    RouteRequested {
        /// Node holding the start role.
        start: NodeCoord,
        /// Node holding the end role.
        end: NodeCoord,
    },
    /// Confirms that a route was stored for the round.
    RouteAssigned {
        /// Number of waypoints in the route.
        length: usize,
    },
    /// Reports that no route exists for the round.
    RouteUnavailable,
    /// Confirms that a monster entered play.
    MonsterSpawned {
        /// Identifier allocated to the monster.
        monster: MonsterId,
        /// Node the monster spawned on.
        cell: NodeCoord,
    },
    /// Confirms a committed movement step.
    MonsterMoved {
        /// Monster that moved.
        monster: MonsterId,
        /// Position after the step.
        position: GridPoint,
        /// Waypoint cursor after the step.
        cursor: usize,
    },
    /// Reports damage applied to a monster.
    MonsterDamaged {
        /// Monster that was hit.
        monster: MonsterId,
        /// Structure that dealt the damage.
        structure: StructureId,
        /// Health remaining after the hit.
        health: Health,
    },
    /// Reports that a monster was killed and the reward granted.
    MonsterKilled {
        /// Monster that was killed.
        monster: MonsterId,
        /// Resources granted for the kill.
        reward: Resources,
    },
    /// Reports that a monster reached the end and the penalty applied.
    MonsterEscaped {
        /// Monster that escaped.
        monster: MonsterId,
        /// Resources deducted for the escape.
        penalty: Resources,
    },
    /// Reports the resource counter after any mutation.
    ResourcesChanged {
        /// Current resources.
        resources: Resources,
    },
    /// Confirms that a structure was constructed.
    StructurePlaced {
        /// Identifier allocated to the structure.
        structure: StructureId,
        /// Type of structure constructed.
        kind: StructureKind,
        /// Node the structure is anchored to.
        cell: NodeCoord,
        /// Resources debited for the construction.
        cost: Resources,
    },
    /// Confirms that a structure was upgraded.
    StructureUpgraded {
        /// Structure that was upgraded.
        structure: StructureId,
        /// Level reached by the upgrade.
        level: u32,
        /// Resources debited for the upgrade.
        cost: Resources,
    },
    /// Reports that a build or upgrade request was refused.
    BuildRejected {
        /// Request that was refused.
        request: BuildRequest,
        /// Reason the request was refused.
        reason: BuildError,
    },
    /// Reports that a structure engaged a new target.
    TargetAcquired {
        /// Structure that engaged.
        structure: StructureId,
        /// Monster that is now targeted.
        monster: MonsterId,
    },
    /// Reports that a structure no longer has a target.
    TargetCleared {
        /// Structure whose target was cleared.
        structure: StructureId,
    },
    /// Asks the audio collaborator to play a sound.
    SoundRequested {
        /// Sound that should be played.
        cue: SoundCue,
    },
}

/// Sounds the audio collaborator knows how to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// A structure fired at its target.
    Fire,
    /// A structure was constructed or upgraded.
    Build,
    /// A control was pressed.
    Button,
    /// A monster died.
    Death,
}

/// Location of a single grid node expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeCoord {
    row: u32,
    column: u32,
}

impl NodeCoord {
    /// Creates a new node coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the node.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the node.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two node coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: NodeCoord) -> u32 {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column)
    }

    /// Reports whether the two coordinates share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: NodeCoord) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Grid-space point located exactly on this node.
    #[must_use]
    pub fn to_grid_point(self) -> GridPoint {
        GridPoint::new(self.row as f32, self.column as f32)
    }
}

/// Passability state and role of a grid node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeState {
    /// Traversable node without a role.
    #[default]
    Open,
    /// Impassable node.
    Barrier,
    /// Node holding the route start role.
    Start,
    /// Node holding the route end role.
    End,
    /// Open node finalized by the most recent search.
    Visited,
    /// Open node that lies on the active route.
    OnPath,
}

impl NodeState {
    /// Reports whether agents may traverse the node.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !matches!(self, Self::Barrier)
    }

    /// Reports whether the state is a render-only search marker.
    #[must_use]
    pub const fn is_marker(self) -> bool {
        matches!(self, Self::Visited | Self::OnPath)
    }
}

/// Ordered sequence of 4-connected waypoints from start to end inclusive.
///
/// Paths are immutable once produced. Every consecutive pair of waypoints
/// shares an edge, which the movement state machine relies on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    waypoints: Vec<NodeCoord>,
}

impl Path {
    /// Creates a path from the provided waypoints.
    ///
    /// # Panics
    ///
    /// Panics if `waypoints` is empty or if two consecutive waypoints are not
    /// 4-adjacent.
    #[must_use]
    pub fn new(waypoints: Vec<NodeCoord>) -> Self {
        assert!(!waypoints.is_empty(), "a path holds at least one waypoint");
        for pair in waypoints.windows(2) {
            assert!(
                pair[0].is_adjacent(pair[1]),
                "waypoints {:?} and {:?} are not 4-adjacent",
                pair[0],
                pair[1]
            );
        }
        Self { waypoints }
    }

    /// Waypoints in traversal order.
    #[must_use]
    pub fn waypoints(&self) -> &[NodeCoord] {
        &self.waypoints
    }

    /// Number of waypoints in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Paths are never empty; provided for API symmetry with collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoint at the provided cursor, if it exists.
    #[must_use]
    pub fn get(&self, cursor: usize) -> Option<NodeCoord> {
        self.waypoints.get(cursor).copied()
    }

    /// First waypoint (the start node).
    #[must_use]
    pub fn first(&self) -> NodeCoord {
        self.waypoints[0]
    }

    /// Last waypoint (the end node).
    #[must_use]
    pub fn last(&self) -> NodeCoord {
        self.waypoints[self.waypoints.len() - 1]
    }

    /// Index of the final waypoint.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.waypoints.len() - 1
    }
}

/// Continuous position expressed in fractional grid units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    /// Fractional row coordinate.
    pub row: f32,
    /// Fractional column coordinate.
    pub column: f32,
}

impl GridPoint {
    /// Creates a new grid-space point.
    #[must_use]
    pub const fn new(row: f32, column: f32) -> Self {
        Self { row, column }
    }

    /// Converts the point into screen space using the provided cell size.
    ///
    /// Columns map to the horizontal axis and rows to the vertical axis.
    #[must_use]
    pub fn to_pixels(self, cell_size: f32) -> PixelPoint {
        PixelPoint::new(self.column * cell_size, self.row * cell_size)
    }
}

/// Screen-space position measured in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Horizontal pixel offset, derived from the column.
    pub x: f32,
    /// Vertical pixel offset, derived from the row.
    pub y: f32,
}

impl PixelPoint {
    /// Creates a new screen-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Unique identifier assigned to a monster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonsterId(u32);

impl MonsterId {
    /// Creates a new monster identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(u32);

impl StructureId {
    /// Creates a new structure identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Hit points of a monster. May transiently drop below zero before removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Health(i32);

impl Health {
    /// Creates a new health value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Retrieves the raw health value.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Reports whether the monster has run out of health.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.0 <= 0
    }

    /// Health remaining after taking the provided damage.
    #[must_use]
    pub const fn damaged(self, amount: i32) -> Self {
        Self(self.0.saturating_sub(amount))
    }
}

/// Shared resource counter. Negative balances are permitted.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Resources(i64);

impl Resources {
    /// Zero resources.
    pub const ZERO: Self = Self(0);

    /// Creates a new resource amount.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Retrieves the raw amount.
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }

    /// Reports whether this balance can pay the provided cost.
    #[must_use]
    pub const fn covers(&self, cost: Resources) -> bool {
        self.0 >= cost.0
    }
}

impl Add for Resources {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Resources {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

/// Types of structures the player can construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureKind {
    /// Slow, hard-hitting structure with a wide range.
    Tower,
    /// Fast, light-hitting structure with a short range.
    Gem,
}

impl StructureKind {
    /// Resources required to construct the structure.
    #[must_use]
    pub const fn build_cost(self) -> Resources {
        match self {
            Self::Tower => Resources::new(100),
            Self::Gem => Resources::new(150),
        }
    }

    /// Resources required to upgrade a structure currently at `level`.
    #[must_use]
    pub const fn upgrade_cost(self, level: u32) -> Resources {
        let step = match self {
            Self::Tower => 50,
            Self::Gem => 75,
        };
        Resources::new(step * level as i64)
    }

    /// Damage dealt per attack at the provided level.
    #[must_use]
    pub const fn damage(self, level: u32) -> i32 {
        let bonus = level.saturating_sub(1) as i32;
        match self {
            Self::Tower => 10 + 5 * bonus,
            Self::Gem => 4 + 2 * bonus,
        }
    }

    /// Ticks that must elapse between two attacks.
    ///
    /// The tower attacks twice per second at the 60 Hz reference tick rate.
    #[must_use]
    pub const fn attack_interval_ticks(self) -> u32 {
        match self {
            Self::Tower => 30,
            Self::Gem => 10,
        }
    }

    /// Radius of the circular detection range in pixels.
    #[must_use]
    pub const fn range_radius_px(self) -> u32 {
        match self {
            Self::Tower => 96,
            Self::Gem => 64,
        }
    }
}

/// Build or upgrade request submitted to the economy gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildRequest {
    /// Construction of a new structure.
    Place {
        /// Type of structure requested.
        kind: StructureKind,
        /// Node the structure would be anchored to.
        cell: NodeCoord,
    },
    /// Upgrade of an existing structure.
    Upgrade {
        /// Structure targeted by the upgrade.
        structure: StructureId,
    },
}

/// Reasons a build or upgrade request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum BuildError {
    /// The shared counter cannot pay the cost.
    #[error("insufficient resources: need {required:?}, have {available:?}")]
    InsufficientFunds {
        /// Cost of the request.
        required: Resources,
        /// Resources available when the request was evaluated.
        available: Resources,
    },
    /// The requested node lies outside the grid.
    #[error("node {cell:?} lies outside the grid")]
    OutOfBounds {
        /// Node provided in the request.
        cell: NodeCoord,
    },
    /// Another structure already occupies the node.
    #[error("node {cell:?} already holds a structure")]
    Occupied {
        /// Node provided in the request.
        cell: NodeCoord,
    },
    /// No structure with the provided identifier exists.
    #[error("structure {structure:?} does not exist")]
    MissingStructure {
        /// Identifier provided in the request.
        structure: StructureId,
    },
    /// The structure already reached the maximum level.
    #[error("structure {structure:?} is already at the maximum level")]
    MaxLevel {
        /// Identifier provided in the request.
        structure: StructureId,
    },
}

/// Reasons a grid edit may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum GridEditError {
    /// Monsters are walking a route; the grid is frozen until they leave play.
    #[error("the grid cannot change while monsters follow a route")]
    RouteActive,
}

/// Why a monster left play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalCause {
    /// Health dropped to zero or below.
    Killed,
    /// The monster reached the final waypoint.
    Escaped,
}

/// Movement state of a monster derived from its snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MonsterStatus {
    /// No route assigned.
    Idle,
    /// Walking toward a waypoint before the final one.
    Following,
    /// Cursor rests on the final waypoint; removal happens on the next tick.
    Arrived,
    /// Health is depleted; removal happens on the next tick.
    Dead,
}

/// Flags that gate per-tick processing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SimulationFlags {
    /// Freezes movement and detection when set.
    pub paused: bool,
    /// Doubles movement speed when set.
    pub fast_forward: bool,
}

/// Immutable representation of a single monster's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct MonsterSnapshot {
    /// Unique identifier assigned to the monster.
    pub id: MonsterId,
    /// Position in fractional grid units.
    pub position: GridPoint,
    /// Position in screen space, derived from `position` and the cell size.
    pub screen: PixelPoint,
    /// Current health.
    pub health: Health,
    /// Health the monster spawned with.
    pub max_health: Health,
    /// Movement speed in grid units per tick.
    pub speed: f32,
    /// Route owned by the monster, if any.
    pub path: Option<Path>,
    /// Index of the waypoint the monster is heading to.
    pub cursor: usize,
}

impl MonsterSnapshot {
    /// Derives the movement state of the monster.
    #[must_use]
    pub fn status(&self) -> MonsterStatus {
        if self.health.is_depleted() {
            return MonsterStatus::Dead;
        }
        match &self.path {
            None => MonsterStatus::Idle,
            Some(path) if self.cursor >= path.last_index() => MonsterStatus::Arrived,
            Some(_) => MonsterStatus::Following,
        }
    }

    /// Reports whether the monster is still a valid engagement target.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.health.is_depleted()
    }
}

/// Read-only snapshot describing all monsters in play.
#[derive(Clone, Debug, Default)]
pub struct MonsterView {
    snapshots: Vec<MonsterSnapshot>,
}

impl MonsterView {
    /// Creates a new monster view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<MonsterSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured monster snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &MonsterSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a specific monster.
    #[must_use]
    pub fn get(&self, monster: MonsterId) -> Option<&MonsterSnapshot> {
        self.snapshots
            .binary_search_by_key(&monster, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of monsters in play.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no monsters are in play.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<MonsterSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single structure's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StructureSnapshot {
    /// Identifier allocated to the structure by the world.
    pub id: StructureId,
    /// Kind of structure that was constructed.
    pub kind: StructureKind,
    /// Node the structure is anchored to.
    pub cell: NodeCoord,
    /// Top-left corner of the anchoring node in screen space.
    pub position: PixelPoint,
    /// Current upgrade level, starting at one.
    pub level: u32,
    /// Monster engaged during the last detection pass, if any.
    pub target: Option<MonsterId>,
    /// Ticks left before the structure may attack again.
    pub ready_in: u32,
}

/// Read-only snapshot describing all structures placed on the grid.
#[derive(Clone, Debug, Default)]
pub struct StructureView {
    snapshots: Vec<StructureSnapshot>,
}

impl StructureView {
    /// Creates a new structure view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<StructureSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured structure snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &StructureSnapshot> {
        self.snapshots.iter()
    }

    /// Reports whether no structures exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<StructureSnapshot> {
        self.snapshots
    }
}

/// Structure placement listed in a level layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructurePlacement {
    /// Type of structure to construct.
    pub kind: StructureKind,
    /// Node the structure is anchored to.
    pub cell: NodeCoord,
}

/// Already-parsed level data handed over by the level loader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    /// Number of node rows.
    pub rows: u32,
    /// Number of node columns.
    pub columns: u32,
    /// Edge length of a node in pixels.
    pub cell_size: f32,
    /// Nodes that start out as barriers.
    #[serde(default)]
    pub barriers: Vec<NodeCoord>,
    /// Node holding the start role.
    pub start: Option<NodeCoord>,
    /// Node holding the end role.
    pub end: Option<NodeCoord>,
    /// Structures the level asks to construct.
    #[serde(default)]
    pub structures: Vec<StructurePlacement>,
}

impl LevelLayout {
    /// Checks the layout against the grid preconditions before it reaches the world.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(LevelError::EmptyGrid {
                rows: self.rows,
                columns: self.columns,
            });
        }
        if !(self.cell_size > 0.0) {
            return Err(LevelError::InvalidCellSize {
                cell_size: self.cell_size,
            });
        }

        let contains =
            |cell: NodeCoord| cell.row() < self.rows && cell.column() < self.columns;
        let referenced = self
            .barriers
            .iter()
            .copied()
            .chain(self.start)
            .chain(self.end)
            .chain(self.structures.iter().map(|placement| placement.cell));
        for cell in referenced {
            if !contains(cell) {
                return Err(LevelError::OutOfBounds { cell });
            }
        }

        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start == end {
                return Err(LevelError::SharedRole { cell: start });
            }
        }
        for barrier in &self.barriers {
            if Some(*barrier) == self.start || Some(*barrier) == self.end {
                return Err(LevelError::BarrierOnRole { cell: *barrier });
            }
        }

        Ok(())
    }
}

/// Reasons a level layout fails validation.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum LevelError {
    /// The grid would contain no nodes.
    #[error("grid dimensions {rows}x{columns} contain no nodes")]
    EmptyGrid {
        /// Requested row count.
        rows: u32,
        /// Requested column count.
        columns: u32,
    },
    /// The node edge length is not positive.
    #[error("cell size {cell_size} must be positive")]
    InvalidCellSize {
        /// Requested cell size.
        cell_size: f32,
    },
    /// A referenced node lies outside the grid.
    #[error("node {cell:?} lies outside the grid")]
    OutOfBounds {
        /// Offending node.
        cell: NodeCoord,
    },
    /// Start and end share a node.
    #[error("start and end both use node {cell:?}")]
    SharedRole {
        /// Offending node.
        cell: NodeCoord,
    },
    /// A barrier covers the start or end node.
    #[error("barrier placed on role node {cell:?}")]
    BarrierOnRole {
        /// Offending node.
        cell: NodeCoord,
    },
}
