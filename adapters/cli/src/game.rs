//! Headless game loop that wires the world to every simulation system.

use anyhow::{Context, Result as AnyResult};
use grid_siege_core::{
    Command, Event, LevelLayout, NodeCoord, NodeState, StructureId, StructurePlacement,
    StructureView,
};
use grid_siege_rendering::{
    GridPresentation, HudPresentation, MonsterPresentation, RenderingBackend, Scene,
    StructurePresentation,
};
use grid_siege_system_combat::Combat;
use grid_siege_system_controls::{Controls, PlayerAction};
use grid_siege_system_detection::{CollisionMask, Detection};
use grid_siege_system_movement::Movement;
use grid_siege_system_pathfinding::Pathfinding;
use grid_siege_system_spawning::Spawning;
use grid_siege_world::{self as world, query, World};

use crate::config::{GameConfig, ScriptedAction};

/// Tally of what happened during a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SessionReport {
    pub(crate) ticks: u64,
    pub(crate) spawned: u32,
    pub(crate) killed: u32,
    pub(crate) escaped: u32,
    pub(crate) resources: i64,
}

/// Owns the world, the systems and the presentation backend.
pub(crate) struct Game<B> {
    world: World,
    controls: Controls,
    pathfinding: Pathfinding,
    spawning: Spawning,
    movement: Movement,
    detection: Detection,
    combat: Combat,
    script: Vec<ScriptedAction>,
    script_cursor: usize,
    backend: B,
    round_started: bool,
    report: SessionReport,
}

impl<B> Game<B>
where
    B: RenderingBackend,
{
    /// Builds a session from configuration and an optional level.
    ///
    /// Level structures are constructed through the regular build path, so
    /// their cost is debited from the starting balance.
    pub(crate) fn new(config: &GameConfig, level: Option<LevelLayout>, backend: B) -> Self {
        let mut script = config.script.clone();
        script.sort_by_key(|scripted| scripted.tick);

        let size = config.monsters.collision_size;
        let mut game = Self {
            world: World::with_config(&config.world_config()),
            controls: Controls::new(),
            pathfinding: Pathfinding,
            spawning: Spawning::new(config.spawning_config()),
            movement: Movement,
            detection: Detection::new(CollisionMask::filled(size, size)),
            combat: Combat::new(),
            script,
            script_cursor: 0,
            backend,
            round_started: false,
            report: SessionReport::default(),
        };

        let mut commands = Vec::new();
        if let Some(layout) = level {
            commands.extend(
                layout
                    .structures
                    .iter()
                    .map(|placement| Command::PlaceStructure {
                        kind: placement.kind,
                        cell: placement.cell,
                    }),
            );
            commands.insert(0, Command::LoadLevel { layout });
        }
        if config.simulation.fast_forward {
            commands.push(Command::SetFastForward { enabled: true });
        }

        let mut events = Vec::new();
        game.dispatch(&mut commands, &mut events);
        for event in &events {
            if let Event::BuildRejected { request, reason } = event {
                tracing::warn!(?request, %reason, "level structure could not be built");
            }
        }
        game
    }

    /// Tally of the session so far.
    pub(crate) fn report(&self) -> SessionReport {
        SessionReport {
            ticks: query::tick_index(&self.world),
            resources: query::resources(&self.world).get(),
            ..self.report
        }
    }

    /// Reports whether a started round has released and resolved every monster.
    pub(crate) fn round_finished(&self) -> bool {
        self.round_started
            && self.spawning.remaining() == 0
            && query::monster_view(&self.world).is_empty()
    }

    /// Captures the current grid and structures as a shareable level.
    pub(crate) fn layout(&self) -> LevelLayout {
        let grid = query::grid(&self.world);
        LevelLayout {
            rows: grid.rows(),
            columns: grid.columns(),
            cell_size: grid.cell_size(),
            barriers: grid
                .nodes()
                .filter(|node| node.state() == NodeState::Barrier)
                .map(|node| node.coord())
                .collect(),
            start: grid.start(),
            end: grid.end(),
            structures: query::structure_view(&self.world)
                .iter()
                .map(|structure| StructurePlacement {
                    kind: structure.kind,
                    cell: structure.cell,
                })
                .collect(),
        }
    }

    /// Runs one full simulation tick.
    ///
    /// Scripted actions due at the current tick are applied first, then the
    /// clock advances and spawning, movement, detection and combat react in
    /// that order. Every system observes the world as left by the previous one.
    pub(crate) fn step(&mut self) -> AnyResult<()> {
        let mut events = Vec::new();
        let mut commands = Vec::new();

        let due = self.due_actions(query::tick_index(&self.world));
        if !due.is_empty() {
            let flags = query::flags(&self.world);
            let structures = query::structure_view(&self.world);
            self.controls.handle(
                &due,
                flags,
                |cell| structure_at(&structures, cell),
                &mut commands,
            );
            self.dispatch(&mut commands, &mut events);
        }
        self.route(&mut events, &mut commands);

        world::apply(&mut self.world, Command::Tick, &mut events);
        let flags = query::flags(&self.world);

        self.spawning.handle(&events, flags, &mut commands);
        self.dispatch(&mut commands, &mut events);

        let monsters = query::monster_view(&self.world);
        self.movement
            .handle(&events, flags, &monsters, &mut commands)
            .context("movement step failed")?;
        self.dispatch(&mut commands, &mut events);

        let cell_size = query::grid(&self.world).cell_size();
        let monsters = query::monster_view(&self.world);
        let structures = query::structure_view(&self.world);
        self.detection.handle(
            &events,
            flags,
            cell_size,
            &structures,
            &monsters,
            &mut commands,
        );
        self.dispatch(&mut commands, &mut events);

        let structures = query::structure_view(&self.world);
        self.combat
            .handle(&events, flags, &structures, &monsters, &mut commands);
        self.dispatch(&mut commands, &mut events);

        self.observe(&events);
        self.emit_sounds(&events)
    }

    fn scene(&self) -> AnyResult<Scene> {
        let grid = query::grid(&self.world);
        let grid_presentation = GridPresentation::new(
            grid.rows(),
            grid.columns(),
            grid.cell_size(),
            grid.nodes().map(|node| node.state()),
        )?;

        let flags = query::flags(&self.world);
        Ok(Scene {
            grid: grid_presentation,
            monsters: query::monster_view(&self.world)
                .iter()
                .map(MonsterPresentation::from_snapshot)
                .collect(),
            structures: query::structure_view(&self.world)
                .iter()
                .map(StructurePresentation::from_snapshot)
                .collect(),
            hud: HudPresentation {
                resources: query::resources(&self.world),
                paused: flags.paused,
                fast_forward: flags.fast_forward,
                tick: query::tick_index(&self.world),
                last_build: query::last_build(&self.world),
            },
        })
    }

    /// Draws the current world state through the backend.
    pub(crate) fn render(&mut self) -> AnyResult<()> {
        let scene = self.scene()?;
        self.backend.render_frame(&scene)
    }

    fn due_actions(&mut self, tick: u64) -> Vec<PlayerAction> {
        let mut due = Vec::new();
        while let Some(scripted) = self.script.get(self.script_cursor) {
            if scripted.tick > tick {
                break;
            }
            due.push(scripted.action);
            self.script_cursor += 1;
        }
        due
    }

    fn dispatch(&mut self, commands: &mut Vec<Command>, events: &mut Vec<Event>) {
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, events);
        }
    }

    fn route(&mut self, events: &mut Vec<Event>, commands: &mut Vec<Command>) {
        self.pathfinding
            .handle(events, query::grid(&self.world), commands);
        self.dispatch(commands, events);
    }

    fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::RouteAssigned { length } => {
                    tracing::info!(length, "route assigned");
                    self.round_started = true;
                }
                Event::RouteUnavailable => tracing::warn!("no route between start and end"),
                Event::MonsterSpawned { .. } => self.report.spawned += 1,
                Event::MonsterKilled { monster, reward } => {
                    tracing::debug!(?monster, reward = reward.get(), "monster killed");
                    self.report.killed += 1;
                }
                Event::MonsterEscaped { monster, penalty } => {
                    tracing::debug!(?monster, penalty = penalty.get(), "monster escaped");
                    self.report.escaped += 1;
                }
                Event::BuildRejected { request, reason } => {
                    tracing::info!(?request, %reason, "build rejected");
                }
                Event::GridEditRejected { cell, reason } => {
                    tracing::info!(?cell, %reason, "grid edit rejected");
                }
                _ => {}
            }
        }
    }

    fn emit_sounds(&mut self, events: &[Event]) -> AnyResult<()> {
        for event in events {
            if let Event::SoundRequested { cue } = event {
                self.backend.play_sound(*cue)?;
            }
        }
        Ok(())
    }
}

fn structure_at(structures: &StructureView, cell: NodeCoord) -> Option<StructureId> {
    structures
        .iter()
        .find(|structure| structure.cell == cell)
        .map(|structure| structure.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_siege_core::{Resources, SoundCue, StructureKind};

    #[derive(Debug, Default)]
    struct RecordingBackend {
        frames: Vec<Scene>,
        sounds: Vec<SoundCue>,
    }

    impl RenderingBackend for RecordingBackend {
        fn render_frame(&mut self, scene: &Scene) -> AnyResult<()> {
            self.frames.push(scene.clone());
            Ok(())
        }

        fn play_sound(&mut self, cue: SoundCue) -> AnyResult<()> {
            self.sounds.push(cue);
            Ok(())
        }
    }

    fn corridor() -> LevelLayout {
        LevelLayout {
            rows: 3,
            columns: 8,
            cell_size: 32.0,
            barriers: Vec::new(),
            start: Some(NodeCoord::new(1, 0)),
            end: Some(NodeCoord::new(1, 7)),
            structures: Vec::new(),
        }
    }

    fn small_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.grid.rows = 3;
        config.grid.columns = 8;
        config.monsters.wave_size = 2;
        config.monsters.spawn_interval_ticks = 4;
        config.monsters.speed = 0.5;
        config
    }

    fn run_until_finished(game: &mut Game<RecordingBackend>, limit: u64) {
        for _ in 0..limit {
            game.step().expect("tick succeeds");
            if game.round_finished() {
                return;
            }
        }
        panic!("round did not finish within {limit} ticks");
    }

    #[test]
    fn undefended_wave_escapes_and_costs_resources() {
        let mut config = small_config();
        config.script = vec![ScriptedAction {
            tick: 0,
            action: PlayerAction::StartRound,
        }];
        let mut game = Game::new(&config, Some(corridor()), RecordingBackend::default());

        run_until_finished(&mut game, 200);

        let report = game.report();
        assert_eq!(report.spawned, 2);
        assert_eq!(report.escaped, 2);
        assert_eq!(report.killed, 0);
        assert_eq!(report.resources, 300 - 2 * 25);
        assert!(game.backend.sounds.contains(&SoundCue::Button));
    }

    #[test]
    fn level_structures_are_paid_for_and_defend_the_route() {
        let mut config = small_config();
        config.monsters.health = 1;
        config.script = vec![ScriptedAction {
            tick: 0,
            action: PlayerAction::StartRound,
        }];
        let mut level = corridor();
        level.structures.push(StructurePlacement {
            kind: StructureKind::Tower,
            cell: NodeCoord::new(0, 3),
        });
        let mut game = Game::new(&config, Some(level), RecordingBackend::default());
        let after_build = query::resources(&game.world);
        assert_eq!(
            after_build,
            Resources::new(300) - StructureKind::Tower.build_cost()
        );

        run_until_finished(&mut game, 200);

        let report = game.report();
        assert!(report.killed > 0);
        assert!(game.backend.sounds.contains(&SoundCue::Fire));
        assert!(game.backend.sounds.contains(&SoundCue::Build));
    }

    #[test]
    fn scripted_round_marks_the_route() {
        let mut config = small_config();
        config.script = vec![ScriptedAction {
            tick: 0,
            action: PlayerAction::StartRound,
        }];
        let mut game = Game::new(&config, Some(corridor()), RecordingBackend::default());

        game.step().expect("tick succeeds");

        assert!(query::route(&game.world).is_some());
        let on_path = query::grid(&game.world)
            .nodes()
            .filter(|node| node.state() == NodeState::OnPath)
            .count();
        assert_eq!(on_path, 6);
    }

    #[test]
    fn captured_layout_includes_edits_and_structures() {
        let mut config = small_config();
        config.script = vec![
            ScriptedAction {
                tick: 0,
                action: PlayerAction::ToggleBarrier {
                    cell: NodeCoord::new(0, 5),
                },
            },
            ScriptedAction {
                tick: 0,
                action: PlayerAction::Build {
                    kind: StructureKind::Tower,
                    cell: NodeCoord::new(2, 2),
                },
            },
        ];
        let mut game = Game::new(&config, Some(corridor()), RecordingBackend::default());
        game.step().expect("tick succeeds");

        let layout = game.layout();
        assert_eq!(layout.barriers, vec![NodeCoord::new(0, 5)]);
        assert_eq!(layout.start, Some(NodeCoord::new(1, 0)));
        assert_eq!(layout.end, Some(NodeCoord::new(1, 7)));
        assert_eq!(
            layout.structures,
            vec![StructurePlacement {
                kind: StructureKind::Tower,
                cell: NodeCoord::new(2, 2),
            }]
        );
        layout.validate().expect("captured layout is valid");
    }

    #[test]
    fn missing_end_never_starts_a_round() {
        let mut config = small_config();
        config.script = vec![ScriptedAction {
            tick: 0,
            action: PlayerAction::StartRound,
        }];
        let mut level = corridor();
        level.end = None;
        let mut game = Game::new(&config, Some(level), RecordingBackend::default());

        for _ in 0..20 {
            game.step().expect("tick succeeds");
        }

        assert!(!game.round_finished());
        assert_eq!(game.report().spawned, 0);
    }

    #[test]
    fn scenes_mirror_the_world() {
        let mut config = small_config();
        config.script = vec![ScriptedAction {
            tick: 0,
            action: PlayerAction::StartRound,
        }];
        let mut game = Game::new(&config, Some(corridor()), RecordingBackend::default());
        game.step().expect("tick succeeds");
        game.render().expect("frame renders");

        let frame = &game.backend.frames[0];
        assert_eq!(frame.grid.nodes.len(), 24);
        assert_eq!(frame.monsters.len(), 1);
        assert_eq!(frame.hud.tick, 1);
        assert_eq!(
            frame.grid.node(NodeCoord::new(1, 0)).map(|node| node.state),
            Some(NodeState::Start)
        );
    }

    #[test]
    fn sessions_replay_identically() {
        let mut config = small_config();
        config.script = vec![
            ScriptedAction {
                tick: 0,
                action: PlayerAction::StartRound,
            },
            ScriptedAction {
                tick: 3,
                action: PlayerAction::Build {
                    kind: StructureKind::Gem,
                    cell: NodeCoord::new(2, 4),
                },
            },
        ];

        let run = || {
            let mut game = Game::new(&config, Some(corridor()), RecordingBackend::default());
            for _ in 0..60 {
                game.step().expect("tick succeeds");
            }
            (game.report(), game.backend.sounds.clone())
        };

        assert_eq!(run(), run());
    }
}
