#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Grid Siege.
//!
//! The world owns the grid, the monster arena, the structure registry and the
//! economy. Everything else observes it through [`query`] and changes it by
//! submitting [`Command`] values to [`apply`].
//!
//! The grid is frozen while any monster holds a route: edits submitted during
//! a round are rejected with [`GridEditError::RouteActive`]. A route therefore
//! never goes stale while it is being walked. An edit accepted between two
//! spawns, while no monster is in play, drops the assigned route and reports
//! [`Event::RouteUnavailable`], so no later spawn receives a stale copy.

pub mod economy;
pub mod grid;
mod monsters;
mod structures;

use grid_siege_core::{
    BuildError, BuildRequest, Command, Event, GridEditError, Health, LevelLayout, MonsterId,
    NodeCoord, Path, RemovalCause, Resources, SoundCue, StructureId, StructureKind,
    MAX_STRUCTURE_LEVEL, WELCOME_BANNER,
};

pub use economy::Economy;
pub use grid::{Grid, Node};

use monsters::MonsterRegistry;
use structures::StructureRegistry;

const DEFAULT_GRID_ROWS: u32 = 28;
const DEFAULT_GRID_COLUMNS: u32 = 45;
const DEFAULT_CELL_SIZE: f32 = 32.0;
const DEFAULT_STARTING_RESOURCES: Resources = Resources::new(300);
const DEFAULT_KILL_REWARD: Resources = Resources::new(10);
const DEFAULT_ESCAPE_PENALTY: Resources = Resources::new(25);

/// Tunables the world is constructed from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldConfig {
    /// Number of node rows in the initial grid.
    pub rows: u32,
    /// Number of node columns in the initial grid.
    pub columns: u32,
    /// Edge length of a node in pixels.
    pub cell_size: f32,
    /// Balance the economy starts with.
    pub starting_resources: Resources,
    /// Resources granted when a monster is killed.
    pub kill_reward: Resources,
    /// Resources deducted when a monster escapes.
    pub escape_penalty: Resources,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_GRID_ROWS,
            columns: DEFAULT_GRID_COLUMNS,
            cell_size: DEFAULT_CELL_SIZE,
            starting_resources: DEFAULT_STARTING_RESOURCES,
            kill_reward: DEFAULT_KILL_REWARD,
            escape_penalty: DEFAULT_ESCAPE_PENALTY,
        }
    }
}

/// Represents the authoritative Grid Siege world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    grid: Grid,
    economy: Economy,
    monsters: MonsterRegistry,
    structures: StructureRegistry,
    route: Option<Path>,
    paused: bool,
    fast_forward: bool,
    tick_index: u64,
    kill_reward: Resources,
    escape_penalty: Resources,
    last_build: Option<Result<StructureId, BuildError>>,
}

impl World {
    /// Creates a new world using the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&WorldConfig::default())
    }

    /// Creates a new world from the provided configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configured grid dimensions or cell size are not positive.
    #[must_use]
    pub fn with_config(config: &WorldConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            grid: Grid::new(config.rows, config.columns, config.cell_size),
            economy: Economy::new(config.starting_resources),
            monsters: MonsterRegistry::new(),
            structures: StructureRegistry::new(),
            route: None,
            paused: false,
            fast_forward: false,
            tick_index: 0,
            kill_reward: config.kill_reward,
            escape_penalty: config.escape_penalty,
            last_build: None,
        }
    }

    fn route_active(&self) -> bool {
        !self.monsters.is_empty()
    }

    fn replace_grid(&mut self, grid: Grid, out_events: &mut Vec<Event>) {
        self.grid = grid;
        self.monsters.clear();
        self.structures.clear();
        self.route = None;
        out_events.push(Event::GridConfigured {
            rows: self.grid.rows(),
            columns: self.grid.columns(),
            cell_size: self.grid.cell_size(),
        });
    }

    fn load_level(&mut self, layout: LevelLayout, out_events: &mut Vec<Event>) {
        if let Err(error) = layout.validate() {
            panic!("level layout rejected: {error}");
        }

        let mut grid = Grid::new(layout.rows, layout.columns, layout.cell_size);
        for barrier in &layout.barriers {
            grid.set_barrier(*barrier);
        }
        if let Some(start) = layout.start {
            grid.set_start(start);
        }
        if let Some(end) = layout.end {
            grid.set_end(end);
        }
        grid.refresh_neighbors();

        tracing::info!(
            rows = layout.rows,
            columns = layout.columns,
            barriers = layout.barriers.len(),
            "level loaded"
        );
        self.replace_grid(grid, out_events);
    }

    fn edit_grid<F>(&mut self, cell: NodeCoord, out_events: &mut Vec<Event>, edit: F)
    where
        F: FnOnce(&mut Grid),
    {
        if self.route_active() {
            tracing::warn!(?cell, "grid edit rejected while a route is active");
            out_events.push(Event::GridEditRejected {
                cell,
                reason: GridEditError::RouteActive,
            });
            return;
        }

        let before: Vec<_> = self.grid.nodes().map(Node::state).collect();
        edit(&mut self.grid);
        let mut changed = false;
        for (index, previous) in before.into_iter().enumerate() {
            let coord = self.grid.coord_at(index);
            let state = self.grid.state(coord);
            if state != previous {
                changed = true;
                out_events.push(Event::NodeChanged { cell: coord, state });
            }
        }

        // A stored route was computed for the previous grid; later spawns must not reuse it.
        if changed && self.route.take().is_some() {
            tracing::info!(?cell, "grid edit invalidated the assigned route");
            out_events.push(Event::RouteUnavailable);
        }
    }

    fn begin_round(&mut self, out_events: &mut Vec<Event>) {
        out_events.push(Event::SoundRequested {
            cue: SoundCue::Button,
        });

        self.grid.clear_markers();
        self.grid.refresh_neighbors();

        match (self.grid.start(), self.grid.end()) {
            (Some(start), Some(end)) => {
                tracing::info!(?start, ?end, "round requested");
                out_events.push(Event::RouteRequested { start, end });
            }
            _ => {
                tracing::warn!("round requested without both start and end nodes");
                self.route = None;
                out_events.push(Event::RouteUnavailable);
            }
        }
    }

    fn assign_route(
        &mut self,
        route: Option<Path>,
        visited: Vec<NodeCoord>,
        out_events: &mut Vec<Event>,
    ) {
        for cell in visited {
            self.grid.mark_visited(cell);
        }

        match route {
            Some(path) => {
                for cell in path.waypoints() {
                    self.grid.mark_on_path(*cell);
                }
                let length = path.len();
                self.route = Some(path);
                out_events.push(Event::RouteAssigned { length });
            }
            None => {
                self.route = None;
                out_events.push(Event::RouteUnavailable);
            }
        }
    }

    fn spawn_monster(&mut self, health: Health, speed: f32, out_events: &mut Vec<Event>) {
        let Some(route) = self.route.clone() else {
            tracing::debug!("spawn ignored without an assigned route");
            return;
        };

        let cell = route.first();
        let monster = self.monsters.spawn(route, health, speed);
        tracing::debug!(monster = monster.get(), ?cell, "monster spawned");
        out_events.push(Event::MonsterSpawned { monster, cell });
    }

    fn remove_monster(
        &mut self,
        monster: MonsterId,
        cause: RemovalCause,
        out_events: &mut Vec<Event>,
    ) {
        if self.monsters.remove(monster).is_none() {
            return;
        }

        for structure in self.structures.iter_mut() {
            if structure.target == Some(monster) {
                structure.target = None;
                out_events.push(Event::TargetCleared {
                    structure: structure.id,
                });
            }
        }

        match cause {
            RemovalCause::Killed => {
                self.economy.grant(self.kill_reward);
                out_events.push(Event::MonsterKilled {
                    monster,
                    reward: self.kill_reward,
                });
                out_events.push(Event::SoundRequested {
                    cue: SoundCue::Death,
                });
            }
            RemovalCause::Escaped => {
                self.economy.penalize(self.escape_penalty);
                out_events.push(Event::MonsterEscaped {
                    monster,
                    penalty: self.escape_penalty,
                });
            }
        }
        out_events.push(Event::ResourcesChanged {
            resources: self.economy.resources(),
        });
    }

    fn place_structure(
        &mut self,
        kind: StructureKind,
        cell: NodeCoord,
        out_events: &mut Vec<Event>,
    ) {
        let request = BuildRequest::Place { kind, cell };
        let outcome = self.try_place(kind, cell);
        self.last_build = Some(outcome);

        match outcome {
            Ok(structure) => {
                let cost = kind.build_cost();
                tracing::info!(structure = structure.get(), ?kind, ?cell, "structure placed");
                out_events.push(Event::StructurePlaced {
                    structure,
                    kind,
                    cell,
                    cost,
                });
                self.push_build_feedback(out_events);
            }
            Err(reason) => {
                tracing::warn!(?request, %reason, "build rejected");
                out_events.push(Event::BuildRejected { request, reason });
            }
        }
    }

    fn try_place(
        &mut self,
        kind: StructureKind,
        cell: NodeCoord,
    ) -> Result<StructureId, BuildError> {
        if !self.grid.contains(cell) {
            return Err(BuildError::OutOfBounds { cell });
        }
        if self.structures.at(cell).is_some() {
            return Err(BuildError::Occupied { cell });
        }

        self.economy.try_build(kind, kind.build_cost())?;
        let position = self.grid.pixel_position(cell);
        Ok(self.structures.insert(kind, cell, position))
    }

    fn upgrade_structure(&mut self, structure: StructureId, out_events: &mut Vec<Event>) {
        let request = BuildRequest::Upgrade { structure };
        let Some(entry) = self.structures.get_mut(structure) else {
            let reason = BuildError::MissingStructure { structure };
            self.last_build = Some(Err(reason));
            out_events.push(Event::BuildRejected { request, reason });
            return;
        };

        if entry.level >= MAX_STRUCTURE_LEVEL {
            let reason = BuildError::MaxLevel { structure };
            self.last_build = Some(Err(reason));
            out_events.push(Event::BuildRejected { request, reason });
            return;
        }

        let kind = entry.kind;
        let cost = kind.upgrade_cost(entry.level);
        if let Err(reason) = self.economy.try_build(kind, cost) {
            tracing::warn!(?request, %reason, "upgrade rejected");
            self.last_build = Some(Err(reason));
            out_events.push(Event::BuildRejected { request, reason });
            return;
        }

        let Some(entry) = self.structures.get_mut(structure) else {
            return;
        };
        entry.level += 1;
        let level = entry.level;
        self.last_build = Some(Ok(structure));
        tracing::info!(structure = structure.get(), level, "structure upgraded");
        out_events.push(Event::StructureUpgraded {
            structure,
            level,
            cost,
        });
        self.push_build_feedback(out_events);
    }

    fn push_build_feedback(&self, out_events: &mut Vec<Event>) {
        out_events.push(Event::ResourcesChanged {
            resources: self.economy.resources(),
        });
        out_events.push(Event::SoundRequested {
            cue: SoundCue::Build,
        });
    }

    fn damage_monster(
        &mut self,
        monster: MonsterId,
        structure: StructureId,
        amount: i32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(shooter) = self.structures.get_mut(structure) else {
            return;
        };
        let Some(victim) = self.monsters.get_mut(monster) else {
            return;
        };

        shooter.ready_in = shooter.kind.attack_interval_ticks();
        victim.health = victim.health.damaged(amount);
        out_events.push(Event::MonsterDamaged {
            monster,
            structure,
            health: victim.health,
        });
        out_events.push(Event::SoundRequested {
            cue: SoundCue::Fire,
        });
    }

    fn engage_target(
        &mut self,
        structure: StructureId,
        target: Option<MonsterId>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(entry) = self.structures.get_mut(structure) else {
            return;
        };
        if entry.target == target {
            return;
        }

        entry.target = target;
        match target {
            Some(monster) => {
                tracing::debug!(structure = structure.get(), monster = monster.get(), "target acquired");
                out_events.push(Event::TargetAcquired { structure, monster });
            }
            None => out_events.push(Event::TargetCleared { structure }),
        }
    }

    fn advance_clock(&mut self, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        if !self.paused {
            for structure in self.structures.iter_mut() {
                structure.ready_in = structure.ready_in.saturating_sub(1);
            }
        }
        out_events.push(Event::TimeAdvanced {
            tick: self.tick_index,
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// # Panics
///
/// Panics when a command references a node outside the grid or carries an
/// invalid level layout; both are precondition violations on the caller's side.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid {
            rows,
            columns,
            cell_size,
        } => world.replace_grid(Grid::new(rows, columns, cell_size), out_events),
        Command::LoadLevel { layout } => world.load_level(layout, out_events),
        Command::ToggleBarrier { cell } => {
            world.edit_grid(cell, out_events, |grid| {
                let _ = grid.toggle_barrier(cell);
            });
        }
        Command::SetStart { cell } => world.edit_grid(cell, out_events, |grid| grid.set_start(cell)),
        Command::SetEnd { cell } => world.edit_grid(cell, out_events, |grid| grid.set_end(cell)),
        Command::ResetNode { cell } => world.edit_grid(cell, out_events, |grid| grid.reset(cell)),
        Command::SetPaused { paused } => {
            if world.paused != paused {
                world.paused = paused;
                out_events.push(Event::PauseChanged { paused });
                out_events.push(Event::SoundRequested {
                    cue: SoundCue::Button,
                });
            }
        }
        Command::SetFastForward { enabled } => {
            if world.fast_forward != enabled {
                world.fast_forward = enabled;
                out_events.push(Event::FastForwardChanged { enabled });
                out_events.push(Event::SoundRequested {
                    cue: SoundCue::Button,
                });
            }
        }
        Command::BeginRound => world.begin_round(out_events),
        Command::AssignRoute { route, visited } => world.assign_route(route, visited, out_events),
        Command::SpawnMonster { health, speed } => world.spawn_monster(health, speed, out_events),
        Command::MoveMonster {
            monster,
            position,
            cursor,
        } => {
            if let Some(entry) = world.monsters.get_mut(monster) {
                entry.position = position;
                entry.cursor = cursor;
                out_events.push(Event::MonsterMoved {
                    monster,
                    position,
                    cursor,
                });
            }
        }
        Command::RemoveMonster { monster, cause } => {
            world.remove_monster(monster, cause, out_events);
        }
        Command::DamageMonster {
            monster,
            structure,
            amount,
        } => world.damage_monster(monster, structure, amount, out_events),
        Command::EngageTarget { structure, target } => {
            world.engage_target(structure, target, out_events);
        }
        Command::PlaceStructure { kind, cell } => world.place_structure(kind, cell, out_events),
        Command::UpgradeStructure { structure } => world.upgrade_structure(structure, out_events),
        Command::Tick => world.advance_clock(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use grid_siege_core::{
        BuildError, MonsterView, Path, Resources, SimulationFlags, StructureId, StructureView,
    };

    use super::{Grid, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Captures a read-only view of the monsters in play.
    #[must_use]
    pub fn monster_view(world: &World) -> MonsterView {
        let cell_size = world.grid.cell_size();
        MonsterView::from_snapshots(
            world
                .monsters
                .iter()
                .map(|monster| monster.snapshot(cell_size))
                .collect(),
        )
    }

    /// Captures a read-only view of the structures on the grid.
    #[must_use]
    pub fn structure_view(world: &World) -> StructureView {
        StructureView::from_snapshots(
            world
                .structures
                .iter()
                .map(|structure| structure.snapshot())
                .collect(),
        )
    }

    /// Current balance of the shared resource counter.
    #[must_use]
    pub fn resources(world: &World) -> Resources {
        world.economy.resources()
    }

    /// Pause and fast-forward flags gating per-tick processing.
    #[must_use]
    pub fn flags(world: &World) -> SimulationFlags {
        SimulationFlags {
            paused: world.paused,
            fast_forward: world.fast_forward,
        }
    }

    /// Route assigned for the current round, if any.
    #[must_use]
    pub fn route(world: &World) -> Option<&Path> {
        world.route.as_ref()
    }

    /// Reports whether monsters are currently walking a route.
    #[must_use]
    pub fn route_active(world: &World) -> bool {
        world.route_active()
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Outcome of the most recent build or upgrade request.
    #[must_use]
    pub fn last_build(world: &World) -> Option<Result<StructureId, BuildError>> {
        world.last_build
    }
}
