//! Arena that owns every monster currently in play.

use std::collections::BTreeMap;

use grid_siege_core::{GridPoint, Health, MonsterId, MonsterSnapshot, Path};

/// Monster stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Monster {
    pub(crate) id: MonsterId,
    pub(crate) position: GridPoint,
    pub(crate) health: Health,
    pub(crate) max_health: Health,
    pub(crate) speed: f32,
    pub(crate) path: Path,
    pub(crate) cursor: usize,
}

impl Monster {
    pub(crate) fn snapshot(&self, cell_size: f32) -> MonsterSnapshot {
        MonsterSnapshot {
            id: self.id,
            position: self.position,
            screen: self.position.to_pixels(cell_size),
            health: self.health,
            max_health: self.max_health,
            speed: self.speed,
            path: Some(self.path.clone()),
            cursor: self.cursor,
        }
    }
}

/// Registry that stores monsters by identifier and allocates new identifiers.
///
/// Other components refer to monsters only through [`MonsterId`], so removing
/// an entry never leaves a dangling reference behind.
#[derive(Debug)]
pub(crate) struct MonsterRegistry {
    entries: BTreeMap<MonsterId, Monster>,
    next_monster_id: MonsterId,
}

impl MonsterRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_monster_id: MonsterId::new(0),
        }
    }

    /// Spawns a monster on the first waypoint of its own copy of `path`.
    pub(crate) fn spawn(&mut self, path: Path, health: Health, speed: f32) -> MonsterId {
        let id = self.next_monster_id;
        self.next_monster_id = MonsterId::new(id.get().wrapping_add(1));

        let monster = Monster {
            id,
            position: path.first().to_grid_point(),
            health,
            max_health: health,
            speed,
            path,
            cursor: 0,
        };
        let _ = self.entries.insert(id, monster);
        id
    }

    pub(crate) fn get_mut(&mut self, id: MonsterId) -> Option<&mut Monster> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: MonsterId) -> Option<Monster> {
        self.entries.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Monster> {
        self.entries.values()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_siege_core::NodeCoord;

    fn short_path() -> Path {
        Path::new(vec![NodeCoord::new(2, 3), NodeCoord::new(2, 4)])
    }

    #[test]
    fn spawn_places_monster_on_first_waypoint() {
        let mut registry = MonsterRegistry::new();
        let id = registry.spawn(short_path(), Health::new(10), 0.5);

        let monster = registry.get_mut(id).expect("monster spawned");
        assert_eq!(monster.position, GridPoint::new(2.0, 3.0));
        assert_eq!(monster.cursor, 0);
        assert_eq!(monster.max_health, Health::new(10));
    }

    #[test]
    fn identifiers_are_never_reused_after_removal() {
        let mut registry = MonsterRegistry::new();
        let first = registry.spawn(short_path(), Health::new(1), 1.0);
        assert!(registry.remove(first).is_some());
        let second = registry.spawn(short_path(), Health::new(1), 1.0);

        assert_ne!(first, second);
        assert!(registry.get_mut(first).is_none());
    }

    #[test]
    fn snapshot_tracks_screen_position() {
        let mut registry = MonsterRegistry::new();
        let id = registry.spawn(short_path(), Health::new(3), 1.0);
        let monster = registry.get_mut(id).expect("monster spawned");
        monster.position = GridPoint::new(2.0, 3.5);

        let snapshot = monster.snapshot(32.0);
        assert_eq!(snapshot.screen.x, 112.0);
        assert_eq!(snapshot.screen.y, 64.0);
    }
}
