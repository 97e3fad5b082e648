use grid_siege_core::{Command, Event, Health, NodeCoord, Path, Resources};
use grid_siege_system_movement::Movement;
use grid_siege_world::{self as world, query, World, WorldConfig};

fn world_with_route(route: Path) -> World {
    let mut world = World::with_config(&WorldConfig {
        rows: 5,
        columns: 5,
        cell_size: 32.0,
        starting_resources: Resources::new(100),
        kill_reward: Resources::new(5),
        escape_penalty: Resources::new(20),
    });
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::AssignRoute {
            route: Some(route),
            visited: Vec::new(),
        },
        &mut events,
    );
    world
}

fn tick(world: &mut World, movement: &mut Movement) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::Tick, &mut events);

    let mut commands = Vec::new();
    movement
        .handle(
            &events,
            query::flags(world),
            &query::monster_view(world),
            &mut commands,
        )
        .expect("routes are 4-connected");

    let mut follow_up = Vec::new();
    for command in commands {
        world::apply(world, command, &mut follow_up);
    }
    follow_up
}

fn row_route() -> Path {
    Path::new((0..5).map(|column| NodeCoord::new(0, column)).collect())
}

#[test]
fn monster_escapes_after_walking_the_route() {
    let mut world = world_with_route(row_route());
    let mut movement = Movement::default();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SpawnMonster {
            health: Health::new(10),
            speed: 1.0,
        },
        &mut events,
    );

    for _ in 0..4 {
        let _ = tick(&mut world, &mut movement);
    }
    let monster = query::monster_view(&world)
        .into_vec()
        .pop()
        .expect("monster still in play");
    assert_eq!(monster.cursor, 4);
    assert_eq!(monster.screen.x, 128.0);

    let events = tick(&mut world, &mut movement);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::MonsterEscaped { penalty, .. } if *penalty == Resources::new(20)
    )));
    assert!(query::monster_view(&world).is_empty());
    assert_eq!(query::resources(&world), Resources::new(80));
}

#[test]
fn dead_monsters_are_removed_with_a_reward() {
    let mut world = world_with_route(row_route());
    let mut movement = Movement::default();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SpawnMonster {
            health: Health::new(0),
            speed: 1.0,
        },
        &mut events,
    );

    let events = tick(&mut world, &mut movement);

    assert!(events.iter().any(|event| matches!(
        event,
        Event::MonsterKilled { .. }
    )));
    assert_eq!(query::resources(&world), Resources::new(105));
}

#[test]
fn paused_world_freezes_monsters() {
    let mut world = world_with_route(row_route());
    let mut movement = Movement::default();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SpawnMonster {
            health: Health::new(10),
            speed: 1.0,
        },
        &mut events,
    );
    world::apply(&mut world, Command::SetPaused { paused: true }, &mut events);

    for _ in 0..3 {
        assert!(tick(&mut world, &mut movement).is_empty());
    }
    let monster = &query::monster_view(&world).into_vec()[0];
    assert_eq!(monster.cursor, 0);
}

#[test]
fn replaying_the_same_script_is_deterministic() {
    fn replay() -> Vec<Event> {
        let mut world = world_with_route(row_route());
        let mut movement = Movement::default();
        let mut log = Vec::new();
        world::apply(
            &mut world,
            Command::SpawnMonster {
                health: Health::new(10),
                speed: 0.125,
            },
            &mut log,
        );
        world::apply(
            &mut world,
            Command::SetFastForward { enabled: true },
            &mut log,
        );
        for _ in 0..40 {
            log.extend(tick(&mut world, &mut movement));
        }
        log
    }

    let first = replay();
    let second = replay();
    assert_eq!(first, second, "replay diverged between runs");
    assert!(first.iter().any(|event| matches!(
        event,
        Event::MonsterEscaped { .. }
    )));
    assert!(!first.iter().any(|event| matches!(
        event,
        Event::MonsterKilled { .. }
    )));
}
